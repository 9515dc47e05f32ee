use crate::db::SessionSink;
use crate::pipeline::{ItemKind, MessageItem, Role};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error};

/// One completed agent/user exchange.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptPair {
    pub session_id: String,
    pub agent_text: String,
    pub user_text: String,
    pub recorded_at: DateTime<Utc>,
}

/// Scans `history` in order and persists each completed (agent, user) pair.
///
/// Two single-slot latches track the pending halves of an exchange. An agent
/// line overwrites any unpaired agent line before it, so a multi-turn agent
/// monologue contributes only its last line; as soon as both slots hold text,
/// the pair is written and both slots reset. Items that aren't messages, or
/// whose role is neither agent nor user, are skipped. Text left in a slot at
/// the end of the scan is discarded.
///
/// A failed write is logged and the scan continues with the next items; the
/// returned count covers successful writes only. The failed pair is still
/// consumed, never retried or re-paired.
pub fn record_pairs(sink: &dyn SessionSink, session_id: &str, history: &[MessageItem]) -> usize {
    let mut pending_agent = String::new();
    let mut pending_user = String::new();
    let mut recorded = 0;

    for item in history {
        if item.kind != ItemKind::Message {
            continue;
        }

        match item.role {
            Role::Agent => pending_agent = item.text.clone(),
            Role::User => pending_user = item.text.clone(),
            Role::Other => continue,
        }

        if !pending_agent.is_empty() && !pending_user.is_empty() {
            let pair = TranscriptPair {
                session_id: session_id.to_string(),
                agent_text: std::mem::take(&mut pending_agent),
                user_text: std::mem::take(&mut pending_user),
                recorded_at: Utc::now(),
            };

            match sink.record_pair(&pair) {
                Ok(()) => recorded += 1,
                Err(e) => error!("failed to persist transcript pair: {}", e),
            }
        }
    }

    if !pending_agent.is_empty() || !pending_user.is_empty() {
        debug!(
            session_id,
            "discarding trailing unpaired text at end of history"
        );
    }

    recorded
}
