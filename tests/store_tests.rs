// Integration tests for the SQLite store: schema bootstrap, instruction
// CRUD, session-record round trips, and the filtered transcript view.

use anyhow::Result;
use chrono::{TimeZone, Utc};
use tempfile::TempDir;
use voxmeter::{
    compute_cost, open_pool, PoolSettings, RateConfig, SessionRecord, SessionSink, Store,
    TranscriptFilter, TranscriptPair, UsageSummary,
};

fn test_store() -> Result<(TempDir, Store)> {
    let dir = TempDir::new()?;
    let path = dir.path().join("test.db");
    let pool = open_pool(path.to_str().expect("utf-8 temp path"), PoolSettings::default())?;
    let store = Store::new(pool);
    store.init_schema()?;
    Ok((dir, store))
}

fn sample_record(session_id: &str, hour: u32) -> SessionRecord {
    let usage = UsageSummary {
        llm_prompt_tokens: 2000,
        llm_completion_tokens: 1000,
        stt_audio_seconds: 120.0,
        tts_characters: 3000,
    };
    SessionRecord {
        session_id: session_id.to_string(),
        started_at: Utc.with_ymd_and_hms(2026, 8, 7, hour, 0, 0).unwrap(),
        ended_at: Utc.with_ymd_and_hms(2026, 8, 7, hour, 30, 0).unwrap(),
        usage,
        cost: compute_cost(&usage, &RateConfig::default()),
    }
}

fn sample_pair(session_id: &str, agent: &str, user: &str, minute: u32) -> TranscriptPair {
    TranscriptPair {
        session_id: session_id.to_string(),
        agent_text: agent.to_string(),
        user_text: user.to_string(),
        recorded_at: Utc.with_ymd_and_hms(2026, 8, 7, 12, minute, 0).unwrap(),
    }
}

#[test]
fn test_init_schema_is_idempotent() -> Result<()> {
    let (_dir, store) = test_store()?;
    store.init_schema()?;
    store.init_schema()?;
    Ok(())
}

#[test]
fn test_instruction_crud_round_trip() -> Result<()> {
    let (_dir, store) = test_store()?;

    assert!(store.latest_instruction()?.is_none());
    assert!(store.list_instructions()?.is_empty());

    let first = store.add_instruction("Be brief.")?;
    let second = store.add_instruction("Be thorough.")?;
    assert!(second > first);

    // Newest first
    let listed = store.list_instructions()?;
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].context, "Be thorough.");
    assert_eq!(listed[1].context, "Be brief.");

    // The session engine reads the newest row
    assert_eq!(store.latest_instruction()?.as_deref(), Some("Be thorough."));

    let fetched = store.get_instruction(first)?.expect("row should exist");
    assert_eq!(fetched.context, "Be brief.");

    assert!(store.update_instruction(first, "Be kind.")?);
    assert_eq!(
        store.get_instruction(first)?.expect("row should exist").context,
        "Be kind."
    );

    assert!(store.delete_instruction(first)?);
    assert!(store.get_instruction(first)?.is_none());

    // Unknown ids report not-found instead of erroring
    assert!(!store.update_instruction(9999, "nope")?);
    assert!(!store.delete_instruction(9999)?);

    Ok(())
}

#[test]
fn test_session_record_round_trip() -> Result<()> {
    let (_dir, store) = test_store()?;

    store.insert_session_record(&sample_record("session-one", 9))?;
    store.insert_session_record(&sample_record("session-two", 10))?;

    let rows = store.recent_sessions(20)?;
    assert_eq!(rows.len(), 2);

    // Newest insert first
    assert_eq!(rows[0].session_id, "session-two");
    assert_eq!(rows[1].session_id, "session-one");

    let row = &rows[1];
    assert_eq!(row.llm_tokens, 3000);
    assert!((row.stt_seconds - 120.0).abs() < 1e-9);
    assert_eq!(row.tts_characters, 3000);
    assert!((row.total_cost_usd - 0.0542).abs() < 1e-9);
    assert!(row.start_time.starts_with("2026-08-07T09:00:00"));

    // The limit caps the view
    assert_eq!(store.recent_sessions(1)?.len(), 1);

    Ok(())
}

#[test]
fn test_transcript_query_filters_and_ordering() -> Result<()> {
    let (_dir, store) = test_store()?;

    store.insert_transcript_pair(&sample_pair("s1", "how can I help", "book a cab", 5))?;
    store.insert_transcript_pair(&sample_pair("s1", "done", "thanks", 2))?;
    store.insert_transcript_pair(&sample_pair("s2", "hello", "weather tomorrow?", 8))?;

    // No filters: everything, oldest first
    let all = store.query_transcripts(&TranscriptFilter::default())?;
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].user_text, "thanks");
    assert_eq!(all[1].user_text, "book a cab");
    assert_eq!(all[2].user_text, "weather tomorrow?");

    // Substring over the user's text
    let cabs = store.query_transcripts(&TranscriptFilter {
        search: Some("cab".to_string()),
        ..Default::default()
    })?;
    assert_eq!(cabs.len(), 1);
    assert_eq!(cabs[0].agent_text, "how can I help");

    // Substring over the agent's text
    let hellos = store.query_transcripts(&TranscriptFilter {
        speaker: Some("hello".to_string()),
        ..Default::default()
    })?;
    assert_eq!(hellos.len(), 1);
    assert_eq!(hellos[0].session_id, "s2");

    // Exact session id
    let s1 = store.query_transcripts(&TranscriptFilter {
        session_id: Some("s1".to_string()),
        ..Default::default()
    })?;
    assert_eq!(s1.len(), 2);

    // Filters combine
    let none = store.query_transcripts(&TranscriptFilter {
        search: Some("cab".to_string()),
        session_id: Some("s2".to_string()),
        ..Default::default()
    })?;
    assert!(none.is_empty());

    Ok(())
}

#[test]
fn test_store_implements_the_session_sink_seam() -> Result<()> {
    let (_dir, store) = test_store()?;
    let sink: &dyn SessionSink = &store;

    sink.record_session(&sample_record("session-sink", 11))?;
    sink.record_pair(&sample_pair("session-sink", "agent line", "user line", 1))?;
    assert!(sink.latest_instruction()?.is_none());

    assert_eq!(store.recent_sessions(20)?.len(), 1);
    let pairs = store.query_transcripts(&TranscriptFilter {
        session_id: Some("session-sink".to_string()),
        ..Default::default()
    })?;
    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].agent_text, "agent line");

    Ok(())
}
