//! # REST API for the Help Assistant

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use shared::SendChatMessageRequest;
use tracing::info;

use super::{error_response, Owner};
use crate::AppState;

pub async fn create_session(State(state): State<AppState>, owner: Owner) -> impl IntoResponse {
    info!("POST /api/assistant/sessions");

    let session = state.assistant_service.create_session(&owner).await;
    (StatusCode::CREATED, Json(session)).into_response()
}

pub async fn send_message(
    State(state): State<AppState>,
    owner: Owner,
    Path(session_id): Path<String>,
    Json(request): Json<SendChatMessageRequest>,
) -> impl IntoResponse {
    info!("POST /api/assistant/sessions/{}/messages", session_id);

    match state.assistant_service.send_message(&owner, &session_id, &request.message).await {
        Ok(reply) => (StatusCode::OK, Json(reply)).into_response(),
        Err(e) => error_response("Assistant request failed", e),
    }
}

pub async fn end_session(State(state): State<AppState>, owner: Owner, Path(session_id): Path<String>) -> impl IntoResponse {
    info!("DELETE /api/assistant/sessions/{}", session_id);

    match state.assistant_service.end_session(&owner, &session_id).await {
        Ok(()) => (StatusCode::NO_CONTENT, "").into_response(),
        Err(e) => error_response("Failed to end assistant session", e),
    }
}
