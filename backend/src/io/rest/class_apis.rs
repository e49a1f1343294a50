//! # REST API for Class Management
//!
//! Endpoints for creating, retrieving, updating and deleting classes, plus
//! the roll-number suggestion used by the admission form.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use shared::{CreateClassRequest, DeleteResponse, UpdateClassRequest};
use tracing::info;

use super::{error_response, Owner};
use crate::AppState;

/// Create a new class
pub async fn create_class(
    State(state): State<AppState>,
    owner: Owner,
    Json(request): Json<CreateClassRequest>,
) -> impl IntoResponse {
    info!("POST /api/classes - request: {:?}", request);

    match state.class_service.create_class(&owner, request).await {
        Ok(response) => (StatusCode::CREATED, Json(response)).into_response(),
        Err(e) => error_response("Failed to create class", e),
    }
}

/// Get a class by ID
pub async fn get_class(State(state): State<AppState>, owner: Owner, Path(class_id): Path<String>) -> impl IntoResponse {
    info!("GET /api/classes/{}", class_id);

    match state.class_service.get_class(&owner, &class_id).await {
        Ok(class) => (StatusCode::OK, Json(class)).into_response(),
        Err(e) => error_response("Failed to get class", e),
    }
}

/// List all classes
pub async fn list_classes(State(state): State<AppState>, owner: Owner) -> impl IntoResponse {
    info!("GET /api/classes");

    match state.class_service.list_classes(&owner).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => error_response("Failed to list classes", e),
    }
}

pub async fn update_class(
    State(state): State<AppState>,
    owner: Owner,
    Path(class_id): Path<String>,
    Json(request): Json<UpdateClassRequest>,
) -> impl IntoResponse {
    info!("PUT /api/classes/{} - request: {:?}", class_id, request);

    match state.class_service.update_class(&owner, &class_id, request).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => error_response("Failed to update class", e),
    }
}

pub async fn delete_class(State(state): State<AppState>, owner: Owner, Path(class_id): Path<String>) -> impl IntoResponse {
    info!("DELETE /api/classes/{}", class_id);

    match state.class_service.delete_class(&owner, &class_id).await {
        Ok(success_message) => (StatusCode::OK, Json(DeleteResponse { success_message })).into_response(),
        Err(e) => error_response("Failed to delete class", e),
    }
}

/// Next free roll number in the class
pub async fn suggest_roll_number(
    State(state): State<AppState>,
    owner: Owner,
    Path(class_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/classes/{}/roll-number", class_id);

    match state.student_service.suggest_roll_number(&owner, &class_id).await {
        Ok(suggestion) => (StatusCode::OK, Json(suggestion)).into_response(),
        Err(e) => error_response("Failed to suggest roll number", e),
    }
}
