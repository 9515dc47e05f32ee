//! SQLite connection pooling.

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use thiserror::Error;

/// Pooled SQLite handle shared by the store.
pub type DbPool = Pool<SqliteConnectionManager>;

/// Connection pool tunables.
#[derive(Debug, Clone, Copy)]
pub struct PoolSettings {
    /// Maximum number of pooled connections
    pub max_size: u32,

    /// SQLite busy timeout, in milliseconds
    pub busy_timeout_ms: u64,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_size: 8,
            busy_timeout_ms: 5_000,
        }
    }
}

/// Errors from pool construction.
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("failed to build sqlite connection pool: {0}")]
    Init(#[from] r2d2::Error),
}

/// Opens a pooled SQLite database at `path` (`:memory:` works for tests).
///
/// Every connection comes up in WAL mode with foreign keys on and a busy
/// timeout, so admin reads don't collide with session finalization writes.
pub fn open_pool(path: &str, settings: PoolSettings) -> Result<DbPool, PoolError> {
    let busy_timeout_ms = settings.busy_timeout_ms;

    let manager = SqliteConnectionManager::file(path).with_init(move |conn| {
        // journal_mode returns a result row, so it can't go in the batch
        conn.query_row("PRAGMA journal_mode = WAL;", [], |_| Ok(()))?;
        conn.execute_batch(&format!(
            "PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = {};",
            busy_timeout_ms
        ))
    });

    let pool = Pool::builder().max_size(settings.max_size).build(manager)?;

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_in_memory_pool() {
        let settings = PoolSettings {
            max_size: 2,
            busy_timeout_ms: 1_500,
        };

        let pool = open_pool(":memory:", settings).expect("pool creation should succeed");
        let conn = pool.get().expect("should get a connection");

        let fk: i32 = conn
            .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
            .expect("should query foreign_keys");
        assert_eq!(fk, 1);

        let busy_timeout: i32 = conn
            .query_row("PRAGMA busy_timeout;", [], |row| row.get(0))
            .expect("should query busy_timeout");
        assert_eq!(busy_timeout, 1_500);

        assert_eq!(pool.max_size(), 2);
    }
}
