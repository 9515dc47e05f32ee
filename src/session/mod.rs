pub mod config;
pub mod cost;
pub mod session;
pub mod transcript;
pub mod usage;

pub use config::{SessionConfig, DEFAULT_INSTRUCTIONS};
pub use cost::{compute_cost, CostBreakdown, RateConfig};
pub use session::{AgentSession, SessionStats};
pub use transcript::{record_pairs, TranscriptPair};
pub use usage::{UsageCollector, UsageSummary};
