pub mod events;
pub mod source;

pub use events::{ItemKind, MessageItem, PipelineEvent, Role, UsageMetrics};
pub use source::{ChannelPipeline, PipelineSource};
