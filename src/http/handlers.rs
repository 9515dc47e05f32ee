use super::state::AppState;
use crate::db::{Store, StoreError, TranscriptFilter};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use tracing::error;

/// How many session records the admin overview shows.
const RECENT_SESSION_LIMIT: u32 = 20;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct InstructionRequest {
    /// Instruction context for the voice agent
    pub context: String,
}

#[derive(Debug, Serialize)]
pub struct InstructionCreatedResponse {
    pub id: i64,
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct TranscriptQuery {
    /// Substring filter on the user's text
    pub search: Option<String>,

    /// Substring filter on the agent's text
    pub speaker: Option<String>,

    /// Exact session id filter
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ErrorReply = (StatusCode, Json<ErrorResponse>);

fn error_reply(status: StatusCode, error: impl Into<String>) -> ErrorReply {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
}

/// Runs a store query off the async runtime's worker threads.
async fn run_query<T, F>(state: &AppState, op: F) -> Result<T, ErrorReply>
where
    T: Send + 'static,
    F: FnOnce(&Store) -> Result<T, StoreError> + Send + 'static,
{
    let store = state.store.clone();
    match tokio::task::spawn_blocking(move || op(&store)).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => {
            error!("store query failed: {}", e);
            Err(error_reply(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("store query failed: {}", e),
            ))
        }
        Err(e) => {
            error!("store query task panicked: {}", e);
            Err(error_reply(
                StatusCode::INTERNAL_SERVER_ERROR,
                "store query task failed".to_string(),
            ))
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /sessions
/// Recent session usage/cost records, newest first
pub async fn list_sessions(State(state): State<AppState>) -> impl IntoResponse {
    match run_query(&state, |s| s.recent_sessions(RECENT_SESSION_LIMIT)).await {
        Ok(rows) => (StatusCode::OK, Json(rows)).into_response(),
        Err(reply) => reply.into_response(),
    }
}

/// GET /instructions
/// All agent instructions, newest first
pub async fn list_instructions(State(state): State<AppState>) -> impl IntoResponse {
    match run_query(&state, |s| s.list_instructions()).await {
        Ok(rows) => (StatusCode::OK, Json(rows)).into_response(),
        Err(reply) => reply.into_response(),
    }
}

/// POST /instructions
/// Add a new instruction; blank context is rejected
pub async fn add_instruction(
    State(state): State<AppState>,
    Json(req): Json<InstructionRequest>,
) -> impl IntoResponse {
    let context = req.context.trim().to_string();
    if context.is_empty() {
        return error_reply(StatusCode::BAD_REQUEST, "instruction context must not be blank")
            .into_response();
    }

    match run_query(&state, move |s| s.add_instruction(&context)).await {
        Ok(id) => (
            StatusCode::CREATED,
            Json(InstructionCreatedResponse {
                id,
                status: "created".to_string(),
            }),
        )
            .into_response(),
        Err(reply) => reply.into_response(),
    }
}

/// GET /instructions/:id
pub async fn get_instruction(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    match run_query(&state, move |s| s.get_instruction(id)).await {
        Ok(Some(instruction)) => (StatusCode::OK, Json(instruction)).into_response(),
        Ok(None) => {
            error_reply(StatusCode::NOT_FOUND, format!("instruction {} not found", id))
                .into_response()
        }
        Err(reply) => reply.into_response(),
    }
}

/// PUT /instructions/:id
pub async fn update_instruction(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<InstructionRequest>,
) -> impl IntoResponse {
    let context = req.context.trim().to_string();
    if context.is_empty() {
        return error_reply(StatusCode::BAD_REQUEST, "instruction context must not be blank")
            .into_response();
    }

    match run_query(&state, move |s| s.update_instruction(id, &context)).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => {
            error_reply(StatusCode::NOT_FOUND, format!("instruction {} not found", id))
                .into_response()
        }
        Err(reply) => reply.into_response(),
    }
}

/// DELETE /instructions/:id
pub async fn delete_instruction(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    match run_query(&state, move |s| s.delete_instruction(id)).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => {
            error_reply(StatusCode::NOT_FOUND, format!("instruction {} not found", id))
                .into_response()
        }
        Err(reply) => reply.into_response(),
    }
}

/// GET /transcripts?search=&speaker=&session_id=
/// Filtered transcript pairs, oldest first
pub async fn list_transcripts(
    State(state): State<AppState>,
    Query(query): Query<TranscriptQuery>,
) -> impl IntoResponse {
    let filter = TranscriptFilter {
        search: query.search.filter(|s| !s.trim().is_empty()),
        speaker: query.speaker.filter(|s| !s.trim().is_empty()),
        session_id: query.session_id.filter(|s| !s.trim().is_empty()),
    };

    match run_query(&state, move |s| s.query_transcripts(&filter)).await {
        Ok(rows) => (StatusCode::OK, Json(rows)).into_response(),
        Err(reply) => reply.into_response(),
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
