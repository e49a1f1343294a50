//! # REST API for the School Profile

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use shared::UpsertProfileRequest;
use tracing::info;

use super::{error_response, Owner};
use crate::AppState;

/// Get the school profile
pub async fn get_profile(State(state): State<AppState>, owner: Owner) -> impl IntoResponse {
    info!("GET /api/profile");

    match state.profile_service.get_profile(&owner).await {
        Ok(profile) => (StatusCode::OK, Json(profile)).into_response(),
        Err(e) => error_response("Failed to get profile", e),
    }
}

/// Create or replace the school profile
pub async fn upsert_profile(
    State(state): State<AppState>,
    owner: Owner,
    Json(request): Json<UpsertProfileRequest>,
) -> impl IntoResponse {
    info!("PUT /api/profile - request: {:?}", request);

    match state.profile_service.upsert_profile(&owner, request).await {
        Ok(profile) => (StatusCode::OK, Json(profile)).into_response(),
        Err(e) => error_response("Failed to save profile", e),
    }
}
