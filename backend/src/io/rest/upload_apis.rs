use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use tracing::info;

use super::{error_response, Owner};
use crate::domain::UploadKind;
use crate::AppState;

/// Largest raw upload accepted before compression
pub const MAX_RAW_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Deserialize, Debug)]
pub struct UploadQuery {
    #[serde(default)]
    pub kind: String,
}

/// Compress the raw image body and store it under the owner's folder
pub async fn upload_image(
    State(state): State<AppState>,
    owner: Owner,
    Query(query): Query<UploadQuery>,
    body: Bytes,
) -> impl IntoResponse {
    info!("POST /api/uploads - kind: {:?}, {} bytes", query.kind, body.len());

    let kind = match query.kind.parse::<UploadKind>() {
        Ok(kind) => kind,
        Err(e) => return error_response("Invalid upload kind", e),
    };
    match state.image_service.upload(&owner, kind, body.to_vec()).await {
        Ok(response) => (StatusCode::CREATED, Json(response)).into_response(),
        Err(e) => error_response("Failed to store upload", e),
    }
}
