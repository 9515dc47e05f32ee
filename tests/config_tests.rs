// Tests for configuration loading: defaults with no file, and environment
// variable layering.

use std::sync::Mutex;
use voxmeter::Config;

// Process env is global and tests run in parallel, so every test that loads
// config takes this lock.
static ENV_LOCK: Mutex<()> = Mutex::new(());

#[test]
fn test_defaults_without_file_or_env() {
    let _guard = ENV_LOCK.lock().unwrap();
    let cfg = Config::load(None).expect("defaults should load");

    assert_eq!(cfg.service.name, "voxmeter");
    assert_eq!(cfg.service.http.port, 8080);
    assert_eq!(cfg.database.path, "voxmeter.db");
    assert_eq!(cfg.database.pool_size, 8);

    // Documented rate defaults
    assert!((cfg.rates.llm_prompt_per_1k - 0.0003).abs() < 1e-12);
    assert!((cfg.rates.llm_completion_per_1k - 0.0006).abs() < 1e-12);
    assert!((cfg.rates.stt_per_minute - 0.004).abs() < 1e-12);
    assert!((cfg.rates.tts_per_1k_chars - 0.015).abs() < 1e-12);
}

#[test]
fn test_environment_overrides_rates_and_database() {
    let _guard = ENV_LOCK.lock().unwrap();
    std::env::set_var("VOXMETER__RATES__LLM_PROMPT_PER_1K", "0.001");
    std::env::set_var("VOXMETER__DATABASE__PATH", "/tmp/override.db");

    let cfg = Config::load(None).expect("env-layered config should load");

    std::env::remove_var("VOXMETER__RATES__LLM_PROMPT_PER_1K");
    std::env::remove_var("VOXMETER__DATABASE__PATH");

    assert!((cfg.rates.llm_prompt_per_1k - 0.001).abs() < 1e-12);
    // Untouched rates keep their defaults
    assert!((cfg.rates.tts_per_1k_chars - 0.015).abs() < 1e-12);
    assert_eq!(cfg.database.path, "/tmp/override.db");
}
