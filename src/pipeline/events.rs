use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Usage measurement carried by a single metric event.
///
/// The pipeline emits these asynchronously while a session is live; payloads
/// are deltas, not totals, and are summed by the collector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageMetrics {
    /// LLM inference usage (token counts for one completion)
    Llm {
        prompt_tokens: u64,
        completion_tokens: u64,
    },
    /// Speech-to-text usage (seconds of audio transcribed)
    Stt { audio_seconds: f64 },
    /// Text-to-speech usage (characters synthesized)
    Tts { characters: u64 },
}

/// Event delivered by the pipeline event feed.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    /// A usage measurement was collected
    Metrics(UsageMetrics),
    /// The session finished naturally; emitted exactly once
    Closed,
}

/// Kind of a session history item.
///
/// Only `Message` items participate in transcript pairing; tool calls and
/// their outputs are skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Message,
    FunctionCall,
    FunctionCallOutput,
}

/// Speaker role of a history item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The voice agent (some pipelines label this "assistant")
    #[serde(alias = "assistant")]
    Agent,
    /// The human caller
    User,
    /// Anything else (system prompts, tool roles)
    Other,
}

/// A single turn in the session's message history.
///
/// Position in the history snapshot is significant: the slice is ordered
/// chronologically and never mutated in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageItem {
    pub kind: ItemKind,
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl MessageItem {
    /// An agent utterance, stamped now.
    pub fn agent(text: impl Into<String>) -> Self {
        Self {
            kind: ItemKind::Message,
            role: Role::Agent,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    /// A user utterance, stamped now.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            kind: ItemKind::Message,
            role: Role::User,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}
