pub mod config;
pub mod db;
pub mod http;
pub mod pipeline;
pub mod session;

pub use config::Config;
pub use db::{
    open_pool, DbPool, Instruction, PoolSettings, SessionRecord, SessionRow, SessionSink, Store,
    StoreError, TranscriptFilter, TranscriptRow,
};
pub use http::{create_router, AppState};
pub use pipeline::{
    ChannelPipeline, ItemKind, MessageItem, PipelineEvent, PipelineSource, Role, UsageMetrics,
};
pub use session::{
    compute_cost, record_pairs, AgentSession, CostBreakdown, RateConfig, SessionConfig,
    SessionStats, TranscriptPair, UsageCollector, UsageSummary, DEFAULT_INSTRUCTIONS,
};
