use super::usage::UsageSummary;
use serde::{Deserialize, Serialize};

/// Per-unit billing rates, in USD.
///
/// Loaded once at startup (environment over config file over the defaults
/// below) and immutable for the life of the process.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateConfig {
    /// Cost per 1000 LLM prompt tokens
    #[serde(default = "default_llm_prompt_per_1k")]
    pub llm_prompt_per_1k: f64,

    /// Cost per 1000 LLM completion tokens
    #[serde(default = "default_llm_completion_per_1k")]
    pub llm_completion_per_1k: f64,

    /// Cost per minute of STT audio
    #[serde(default = "default_stt_per_minute")]
    pub stt_per_minute: f64,

    /// Cost per 1000 TTS characters
    #[serde(default = "default_tts_per_1k_chars")]
    pub tts_per_1k_chars: f64,
}

fn default_llm_prompt_per_1k() -> f64 {
    0.0003
}

fn default_llm_completion_per_1k() -> f64 {
    0.0006
}

fn default_stt_per_minute() -> f64 {
    0.004
}

fn default_tts_per_1k_chars() -> f64 {
    0.015
}

impl Default for RateConfig {
    fn default() -> Self {
        Self {
            llm_prompt_per_1k: default_llm_prompt_per_1k(),
            llm_completion_per_1k: default_llm_completion_per_1k(),
            stt_per_minute: default_stt_per_minute(),
            tts_per_1k_chars: default_tts_per_1k_chars(),
        }
    }
}

/// Estimated cost of one session, in USD.
///
/// `total_usd` is the sum of the three already-rounded components, so
/// `total_usd == llm_usd + stt_usd + tts_usd` holds exactly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub llm_usd: f64,
    pub stt_usd: f64,
    pub tts_usd: f64,
    pub total_usd: f64,
}

/// Rounds a dollar amount to 6 fractional digits, half away from zero
/// (the rounding `f64::round` implements).
fn round_usd(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}

/// Converts accumulated usage into a cost breakdown. Pure: no side effects,
/// identical inputs give identical outputs.
pub fn compute_cost(summary: &UsageSummary, rates: &RateConfig) -> CostBreakdown {
    let llm_usd = round_usd(
        (summary.llm_prompt_tokens as f64 / 1000.0) * rates.llm_prompt_per_1k
            + (summary.llm_completion_tokens as f64 / 1000.0) * rates.llm_completion_per_1k,
    );
    let stt_usd = round_usd((summary.stt_audio_seconds / 60.0) * rates.stt_per_minute);
    let tts_usd = round_usd((summary.tts_characters as f64 / 1000.0) * rates.tts_per_1k_chars);

    CostBreakdown {
        llm_usd,
        stt_usd,
        tts_usd,
        total_usd: llm_usd + stt_usd + tts_usd,
    }
}
