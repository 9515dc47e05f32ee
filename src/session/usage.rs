use crate::pipeline::UsageMetrics;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Accumulated usage totals for one session.
///
/// All fields start at zero and only ever grow. A summary read from the
/// collector is an owned snapshot; later merges don't affect it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageSummary {
    /// LLM prompt tokens consumed
    pub llm_prompt_tokens: u64,

    /// LLM completion tokens generated
    pub llm_completion_tokens: u64,

    /// Seconds of audio sent through speech-to-text
    pub stt_audio_seconds: f64,

    /// Characters sent through text-to-speech
    pub tts_characters: u64,
}

impl UsageSummary {
    /// Combined prompt + completion token count (the flattened column the
    /// session record stores).
    pub fn llm_tokens(&self) -> u64 {
        self.llm_prompt_tokens + self.llm_completion_tokens
    }
}

/// Collects metric events into a running [`UsageSummary`].
///
/// Merging is pure addition, so events may arrive from any number of
/// callback registrations in any order; the totals converge to the same
/// values regardless of interleaving. The lock is held only for the
/// addition itself, never across an await point.
#[derive(Debug, Default)]
pub struct UsageCollector {
    totals: Mutex<UsageSummary>,
}

impl UsageCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one metric event into the running totals.
    pub fn collect(&self, metrics: UsageMetrics) {
        let mut totals = self.totals.lock().expect("usage totals lock poisoned");
        match metrics {
            UsageMetrics::Llm {
                prompt_tokens,
                completion_tokens,
            } => {
                totals.llm_prompt_tokens += prompt_tokens;
                totals.llm_completion_tokens += completion_tokens;
            }
            UsageMetrics::Stt { audio_seconds } => {
                totals.stt_audio_seconds += audio_seconds;
            }
            UsageMetrics::Tts { characters } => {
                totals.tts_characters += characters;
            }
        }
    }

    /// Snapshot of the current totals. Further merges continue unaffected.
    pub fn summary(&self) -> UsageSummary {
        *self.totals.lock().expect("usage totals lock poisoned")
    }
}
