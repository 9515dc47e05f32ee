use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Instructions used when the instruction table is empty or unreachable.
pub const DEFAULT_INSTRUCTIONS: &str = "You are a helpful multilingual assistant.";

/// Configuration for one agent session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Unique session identifier (e.g. "session_lobby_20260807_142501")
    pub session_id: String,

    /// Line spoken through TTS as soon as the session starts
    pub greeting: String,

    /// Directory for the raw history JSON export written at finalization.
    /// No export when unset.
    pub export_dir: Option<PathBuf>,

    /// Upper bound on the terminal storage write. The write is a single
    /// best-effort attempt; past this, finalization stops waiting for it.
    pub storage_timeout: Duration,
}

impl SessionConfig {
    /// Config for a session in a named room, with the id format the
    /// metrics tables key on.
    pub fn for_room(room: &str) -> Self {
        Self {
            session_id: format!("session_{}_{}", room, Utc::now().format("%Y%m%d_%H%M%S")),
            ..Self::default()
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_id: format!("session-{}", uuid::Uuid::new_v4()),
            greeting: "Hello! I'm ready to help. How can I assist you today?".to_string(),
            export_dir: None,
            storage_timeout: Duration::from_secs(5),
        }
    }
}
