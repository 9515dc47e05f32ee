//! Parameterized SQL over the three voxmeter tables: `instruction`,
//! `session_record`, and `transcript_pair`.
//!
//! Every statement is parameterized; nothing here builds SQL out of user
//! input. No transaction spans more than one logical table.

use super::pool::DbPool;
use crate::session::cost::CostBreakdown;
use crate::session::transcript::TranscriptPair;
use crate::session::usage::UsageSummary;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use serde::Serialize;
use thiserror::Error;

/// Errors surfaced by the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No pooled connection available.
    #[error("database connection unavailable: {0}")]
    Pool(#[from] r2d2::Error),

    /// A SQL statement failed.
    #[error("sql statement failed: {0}")]
    Sql(#[from] rusqlite::Error),
}

/// Terminal per-session record: usage totals plus the derived costs.
/// Append-only; written exactly once per session at finalization.
#[derive(Debug, Clone, Serialize)]
pub struct SessionRecord {
    pub session_id: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub usage: UsageSummary,
    pub cost: CostBreakdown,
}

/// Storage seam the session core writes through.
///
/// `Store` is the SQLite implementation; tests substitute in-memory and
/// failure-injecting fakes.
pub trait SessionSink: Send + Sync {
    fn record_session(&self, record: &SessionRecord) -> Result<(), StoreError>;
    fn record_pair(&self, pair: &TranscriptPair) -> Result<(), StoreError>;
    fn latest_instruction(&self) -> Result<Option<String>, StoreError>;
}

/// A stored instruction row.
#[derive(Debug, Clone, Serialize)]
pub struct Instruction {
    pub id: i64,
    pub context: String,
}

/// A stored session record, as read back for the admin view.
#[derive(Debug, Clone, Serialize)]
pub struct SessionRow {
    pub id: i64,
    pub session_id: String,
    pub start_time: String,
    pub end_time: String,
    pub llm_tokens: u64,
    pub stt_seconds: f64,
    pub tts_characters: u64,
    pub llm_cost_usd: f64,
    pub stt_cost_usd: f64,
    pub tts_cost_usd: f64,
    pub total_cost_usd: f64,
}

/// A stored transcript pair, as read back for the admin view.
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptRow {
    pub id: i64,
    pub session_id: String,
    pub agent_text: String,
    pub user_text: String,
    pub recorded_at: String,
}

/// Optional filters for the transcript view. All active filters must match.
#[derive(Debug, Clone, Default)]
pub struct TranscriptFilter {
    /// Substring match against the user's text
    pub search: Option<String>,

    /// Substring match against the agent's text
    pub speaker: Option<String>,

    /// Exact session id
    pub session_id: Option<String>,
}

/// SQLite-backed store for sessions, transcripts, and instructions.
#[derive(Clone)]
pub struct Store {
    pool: DbPool,
}

impl Store {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Creates the three tables if they don't exist yet.
    pub fn init_schema(&self) -> Result<(), StoreError> {
        let conn = self.pool.get()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS instruction (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                context TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS session_record (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id TEXT NOT NULL,
                start_time TEXT NOT NULL,
                end_time TEXT NOT NULL,
                llm_tokens INTEGER NOT NULL,
                stt_seconds REAL NOT NULL,
                tts_characters INTEGER NOT NULL,
                llm_cost_usd REAL NOT NULL,
                stt_cost_usd REAL NOT NULL,
                tts_cost_usd REAL NOT NULL,
                total_cost_usd REAL NOT NULL
            );
            CREATE TABLE IF NOT EXISTS transcript_pair (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id TEXT NOT NULL,
                agent_text TEXT NOT NULL,
                user_text TEXT NOT NULL,
                recorded_at TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    // ========================================================================
    // Instructions
    // ========================================================================

    /// Inserts a new instruction and returns its id.
    pub fn add_instruction(&self, context: &str) -> Result<i64, StoreError> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO instruction (context) VALUES (?1)",
            params![context],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// All instructions, newest first.
    pub fn list_instructions(&self) -> Result<Vec<Instruction>, StoreError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare("SELECT id, context FROM instruction ORDER BY id DESC")?;
        let rows = stmt.query_map([], |row| {
            Ok(Instruction {
                id: row.get(0)?,
                context: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn get_instruction(&self, id: i64) -> Result<Option<Instruction>, StoreError> {
        let conn = self.pool.get()?;
        let instruction = conn
            .query_row(
                "SELECT id, context FROM instruction WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Instruction {
                        id: row.get(0)?,
                        context: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(instruction)
    }

    /// Updates an instruction; returns false if the id doesn't exist.
    pub fn update_instruction(&self, id: i64, context: &str) -> Result<bool, StoreError> {
        let conn = self.pool.get()?;
        let changed = conn.execute(
            "UPDATE instruction SET context = ?1 WHERE id = ?2",
            params![context, id],
        )?;
        Ok(changed > 0)
    }

    /// Deletes an instruction; returns false if the id doesn't exist.
    pub fn delete_instruction(&self, id: i64) -> Result<bool, StoreError> {
        let conn = self.pool.get()?;
        let changed = conn.execute("DELETE FROM instruction WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    /// The most recently added instruction context, if any.
    pub fn latest_instruction(&self) -> Result<Option<String>, StoreError> {
        let conn = self.pool.get()?;
        let context = conn
            .query_row(
                "SELECT context FROM instruction ORDER BY id DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(context)
    }

    // ========================================================================
    // Session records
    // ========================================================================

    pub fn insert_session_record(&self, record: &SessionRecord) -> Result<(), StoreError> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO session_record (
                session_id, start_time, end_time,
                llm_tokens, stt_seconds, tts_characters,
                llm_cost_usd, stt_cost_usd, tts_cost_usd, total_cost_usd
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                record.session_id,
                record.started_at.to_rfc3339(),
                record.ended_at.to_rfc3339(),
                record.usage.llm_tokens(),
                record.usage.stt_audio_seconds,
                record.usage.tts_characters,
                record.cost.llm_usd,
                record.cost.stt_usd,
                record.cost.tts_usd,
                record.cost.total_usd,
            ],
        )?;
        Ok(())
    }

    /// The most recent session records, newest first.
    pub fn recent_sessions(&self, limit: u32) -> Result<Vec<SessionRow>, StoreError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, session_id, start_time, end_time,
                    llm_tokens, stt_seconds, tts_characters,
                    llm_cost_usd, stt_cost_usd, tts_cost_usd, total_cost_usd
             FROM session_record ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], |row| {
            Ok(SessionRow {
                id: row.get(0)?,
                session_id: row.get(1)?,
                start_time: row.get(2)?,
                end_time: row.get(3)?,
                llm_tokens: row.get(4)?,
                stt_seconds: row.get(5)?,
                tts_characters: row.get(6)?,
                llm_cost_usd: row.get(7)?,
                stt_cost_usd: row.get(8)?,
                tts_cost_usd: row.get(9)?,
                total_cost_usd: row.get(10)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    // ========================================================================
    // Transcript pairs
    // ========================================================================

    pub fn insert_transcript_pair(&self, pair: &TranscriptPair) -> Result<(), StoreError> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO transcript_pair (session_id, agent_text, user_text, recorded_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                pair.session_id,
                pair.agent_text,
                pair.user_text,
                pair.recorded_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Transcript pairs matching `filter`, ordered oldest first.
    pub fn query_transcripts(
        &self,
        filter: &TranscriptFilter,
    ) -> Result<Vec<TranscriptRow>, StoreError> {
        let mut sql = String::from(
            "SELECT id, session_id, agent_text, user_text, recorded_at
             FROM transcript_pair WHERE 1=1",
        );
        let mut args: Vec<String> = Vec::new();

        if let Some(search) = &filter.search {
            sql.push_str(" AND user_text LIKE ?");
            args.push(format!("%{}%", search));
        }
        if let Some(speaker) = &filter.speaker {
            sql.push_str(" AND agent_text LIKE ?");
            args.push(format!("%{}%", speaker));
        }
        if let Some(session_id) = &filter.session_id {
            sql.push_str(" AND session_id = ?");
            args.push(session_id.clone());
        }

        sql.push_str(" ORDER BY recorded_at ASC");

        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(args.iter()), |row| {
            Ok(TranscriptRow {
                id: row.get(0)?,
                session_id: row.get(1)?,
                agent_text: row.get(2)?,
                user_text: row.get(3)?,
                recorded_at: row.get(4)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

impl SessionSink for Store {
    fn record_session(&self, record: &SessionRecord) -> Result<(), StoreError> {
        self.insert_session_record(record)
    }

    fn record_pair(&self, pair: &TranscriptPair) -> Result<(), StoreError> {
        self.insert_transcript_pair(pair)
    }

    fn latest_instruction(&self) -> Result<Option<String>, StoreError> {
        Store::latest_instruction(self)
    }
}
