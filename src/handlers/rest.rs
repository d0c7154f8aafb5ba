/// REST API handlers for terminal session management
use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use crate::{
    api::dto::{HealthResponse, SessionSummary},
    app_state::AppState,
    protocol::AckPayload,
};

/// List active terminal sessions
pub async fn list_sessions(State(state): State<AppState>) -> impl IntoResponse {
    let sessions: Vec<SessionSummary> = state
        .sessions
        .list()
        .await
        .into_iter()
        .map(SessionSummary::from)
        .collect();

    (StatusCode::OK, Json(sessions))
}

/// Close a terminal session; same outcome as a `close_terminal` request
pub async fn close_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    info!("Closing terminal session over HTTP: {}", session_id);

    match state.sessions.close(&session_id).await {
        Ok(()) => (StatusCode::OK, Json(AckPayload::ok())),
        Err(e) if e.is_not_found() => (StatusCode::NOT_FOUND, Json(AckPayload::failed(e.to_string()))),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(AckPayload::failed(e.to_string())),
        ),
    }
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "healthy" }))
}
