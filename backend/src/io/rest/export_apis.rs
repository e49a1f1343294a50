//! # REST API for Data Export and Import

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use tracing::info;

use super::{error_response, Owner};
use crate::domain::ExportDocument;
use crate::AppState;

/// Every table of the owner as raw rows
pub async fn export_data(State(state): State<AppState>, owner: Owner) -> impl IntoResponse {
    info!("GET /api/export");

    match state.export_service.export_all(&owner).await {
        Ok(document) => (StatusCode::OK, Json(document)).into_response(),
        Err(e) => error_response("Failed to export data", e),
    }
}

/// Load an export into the current owner's account
pub async fn import_data(
    State(state): State<AppState>,
    owner: Owner,
    Json(document): Json<ExportDocument>,
) -> impl IntoResponse {
    info!("POST /api/import - {} tables", document.len());

    match state.export_service.import_all(&owner, document).await {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(e) => error_response("Failed to import data", e),
    }
}
