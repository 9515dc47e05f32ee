use crate::db::Store;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// SQLite-backed store behind the admin surface
    pub store: Store,
}

impl AppState {
    pub fn new(store: Store) -> Self {
        Self { store }
    }
}
