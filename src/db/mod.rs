pub mod pool;
pub mod store;

pub use pool::{open_pool, DbPool, PoolError, PoolSettings};
pub use store::{
    Instruction, SessionRecord, SessionRow, SessionSink, Store, StoreError, TranscriptFilter,
    TranscriptRow,
};
