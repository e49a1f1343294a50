//! # REST API for Transport Drivers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use shared::{CreateDriverRequest, DeleteResponse, UpdateDriverRequest};
use tracing::info;

use super::{error_response, Owner};
use crate::AppState;

pub async fn create_driver(
    State(state): State<AppState>,
    owner: Owner,
    Json(request): Json<CreateDriverRequest>,
) -> impl IntoResponse {
    info!("POST /api/drivers - request: {:?}", request);

    match state.transport_service.create_driver(&owner, request).await {
        Ok(driver) => (StatusCode::CREATED, Json(driver)).into_response(),
        Err(e) => error_response("Failed to create driver", e),
    }
}

pub async fn get_driver(State(state): State<AppState>, owner: Owner, Path(driver_id): Path<String>) -> impl IntoResponse {
    info!("GET /api/drivers/{}", driver_id);

    match state.transport_service.get_driver(&owner, &driver_id).await {
        Ok(driver) => (StatusCode::OK, Json(driver)).into_response(),
        Err(e) => error_response("Failed to get driver", e),
    }
}

pub async fn list_drivers(State(state): State<AppState>, owner: Owner) -> impl IntoResponse {
    info!("GET /api/drivers");

    match state.transport_service.list_drivers(&owner).await {
        Ok(drivers) => (StatusCode::OK, Json(drivers)).into_response(),
        Err(e) => error_response("Failed to list drivers", e),
    }
}

pub async fn update_driver(
    State(state): State<AppState>,
    owner: Owner,
    Path(driver_id): Path<String>,
    Json(request): Json<UpdateDriverRequest>,
) -> impl IntoResponse {
    info!("PUT /api/drivers/{} - request: {:?}", driver_id, request);

    match state.transport_service.update_driver(&owner, &driver_id, request).await {
        Ok(driver) => (StatusCode::OK, Json(driver)).into_response(),
        Err(e) => error_response("Failed to update driver", e),
    }
}

/// Delete a driver; their students lose the assignment
pub async fn delete_driver(State(state): State<AppState>, owner: Owner, Path(driver_id): Path<String>) -> impl IntoResponse {
    info!("DELETE /api/drivers/{}", driver_id);

    match state.transport_service.delete_driver(&owner, &driver_id).await {
        Ok(success_message) => (StatusCode::OK, Json(DeleteResponse { success_message })).into_response(),
        Err(e) => error_response("Failed to delete driver", e),
    }
}

pub async fn students_for_driver(
    State(state): State<AppState>,
    owner: Owner,
    Path(driver_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/drivers/{}/students", driver_id);

    match state.transport_service.students_for_driver(&owner, &driver_id).await {
        Ok(students) => (StatusCode::OK, Json(students)).into_response(),
        Err(e) => error_response("Failed to list driver's students", e),
    }
}
