use super::handlers;
use super::state::AppState;
use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all admin routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Session metrics overview
        .route("/sessions", get(handlers::list_sessions))
        // Instruction CRUD
        .route(
            "/instructions",
            get(handlers::list_instructions).post(handlers::add_instruction),
        )
        .route(
            "/instructions/:id",
            get(handlers::get_instruction)
                .put(handlers::update_instruction)
                .delete(handlers::delete_instruction),
        )
        // Transcript pair view
        .route("/transcripts", get(handlers::list_transcripts))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
