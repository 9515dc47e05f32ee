#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use voxmeter::{SessionRecord, SessionSink, StoreError, TranscriptPair};

/// In-memory sink that records what the session core writes, with optional
/// failure injection for storage-error tests.
#[derive(Default)]
pub struct RecordingSink {
    pub sessions: Mutex<Vec<SessionRecord>>,
    pub pairs: Mutex<Vec<TranscriptPair>>,
    pub instruction: Mutex<Option<String>>,
    pair_failures: AtomicUsize,
    session_failure: AtomicBool,
}

impl RecordingSink {
    /// Make the next `n` pair writes fail.
    pub fn fail_next_pair_writes(&self, n: usize) {
        self.pair_failures.store(n, Ordering::SeqCst);
    }

    /// Make every session-record write fail.
    pub fn fail_session_writes(&self) {
        self.session_failure.store(true, Ordering::SeqCst);
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }

    pub fn pair_count(&self) -> usize {
        self.pairs.lock().unwrap().len()
    }

    fn injected_failure() -> StoreError {
        StoreError::Sql(rusqlite::Error::QueryReturnedNoRows)
    }
}

impl SessionSink for RecordingSink {
    fn record_session(&self, record: &SessionRecord) -> Result<(), StoreError> {
        if self.session_failure.load(Ordering::SeqCst) {
            return Err(Self::injected_failure());
        }
        self.sessions.lock().unwrap().push(record.clone());
        Ok(())
    }

    fn record_pair(&self, pair: &TranscriptPair) -> Result<(), StoreError> {
        let remaining = self.pair_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.pair_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(Self::injected_failure());
        }
        self.pairs.lock().unwrap().push(pair.clone());
        Ok(())
    }

    fn latest_instruction(&self) -> Result<Option<String>, StoreError> {
        Ok(self.instruction.lock().unwrap().clone())
    }
}
