//! # REST API for Student Management

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use shared::{AssignTransportRequest, CreateStudentRequest, DeleteResponse, UpdateStudentRequest};
use tracing::info;

use super::{error_response, Owner};
use crate::AppState;

#[derive(Deserialize, Debug)]
pub struct StudentListQuery {
    pub class_id: Option<String>,
}

/// Admit a new student
pub async fn create_student(
    State(state): State<AppState>,
    owner: Owner,
    Json(request): Json<CreateStudentRequest>,
) -> impl IntoResponse {
    info!("POST /api/students - request: {:?}", request);

    match state.student_service.create_student(&owner, request).await {
        Ok(response) => (StatusCode::CREATED, Json(response)).into_response(),
        Err(e) => error_response("Failed to create student", e),
    }
}

pub async fn get_student(State(state): State<AppState>, owner: Owner, Path(student_id): Path<String>) -> impl IntoResponse {
    info!("GET /api/students/{}", student_id);

    match state.student_service.get_student(&owner, &student_id).await {
        Ok(student) => (StatusCode::OK, Json(student)).into_response(),
        Err(e) => error_response("Failed to get student", e),
    }
}

/// List students, optionally for one class
pub async fn list_students(
    State(state): State<AppState>,
    owner: Owner,
    Query(query): Query<StudentListQuery>,
) -> impl IntoResponse {
    info!("GET /api/students - query: {:?}", query);

    match state.student_service.list_students(&owner, query.class_id.as_deref()).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => error_response("Failed to list students", e),
    }
}

pub async fn update_student(
    State(state): State<AppState>,
    owner: Owner,
    Path(student_id): Path<String>,
    Json(request): Json<UpdateStudentRequest>,
) -> impl IntoResponse {
    info!("PUT /api/students/{} - request: {:?}", student_id, request);

    match state.student_service.update_student(&owner, &student_id, request).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => error_response("Failed to update student", e),
    }
}

pub async fn delete_student(
    State(state): State<AppState>,
    owner: Owner,
    Path(student_id): Path<String>,
) -> impl IntoResponse {
    info!("DELETE /api/students/{}", student_id);

    match state.student_service.delete_student(&owner, &student_id).await {
        Ok(success_message) => (StatusCode::OK, Json(DeleteResponse { success_message })).into_response(),
        Err(e) => error_response("Failed to delete student", e),
    }
}

/// Put a student on a driver's route
pub async fn assign_transport(
    State(state): State<AppState>,
    owner: Owner,
    Path(student_id): Path<String>,
    Json(request): Json<AssignTransportRequest>,
) -> impl IntoResponse {
    info!("PUT /api/students/{}/transport - request: {:?}", student_id, request);

    match state.transport_service.assign_student(&owner, &student_id, request).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => error_response("Failed to assign transport", e),
    }
}

pub async fn unassign_transport(
    State(state): State<AppState>,
    owner: Owner,
    Path(student_id): Path<String>,
) -> impl IntoResponse {
    info!("DELETE /api/students/{}/transport", student_id);

    match state.transport_service.unassign_student(&owner, &student_id).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => error_response("Failed to remove transport", e),
    }
}
