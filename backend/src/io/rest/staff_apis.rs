//! # REST API for Staff and Salaries

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use shared::{CreateStaffRequest, DeleteResponse, RecordSalaryRequest, UpdateStaffRequest};
use tracing::info;

use super::{error_response, parse_period, require_period, Owner};
use crate::AppState;

#[derive(Deserialize, Debug)]
pub struct SalaryListQuery {
    pub staff_id: Option<String>,
    pub month: Option<String>,
    pub year: Option<i32>,
}

#[derive(Deserialize, Debug)]
pub struct PeriodQuery {
    pub month: Option<String>,
    pub year: Option<i32>,
}

pub async fn create_staff(
    State(state): State<AppState>,
    owner: Owner,
    Json(request): Json<CreateStaffRequest>,
) -> impl IntoResponse {
    info!("POST /api/staff - request: {:?}", request);

    match state.staff_service.create_staff(&owner, request).await {
        Ok(staff) => (StatusCode::CREATED, Json(staff)).into_response(),
        Err(e) => error_response("Failed to create staff member", e),
    }
}

pub async fn get_staff(State(state): State<AppState>, owner: Owner, Path(staff_id): Path<String>) -> impl IntoResponse {
    info!("GET /api/staff/{}", staff_id);

    match state.staff_service.get_staff(&owner, &staff_id).await {
        Ok(staff) => (StatusCode::OK, Json(staff)).into_response(),
        Err(e) => error_response("Failed to get staff member", e),
    }
}

pub async fn list_staff(State(state): State<AppState>, owner: Owner) -> impl IntoResponse {
    info!("GET /api/staff");

    match state.staff_service.list_staff(&owner).await {
        Ok(staff) => (StatusCode::OK, Json(staff)).into_response(),
        Err(e) => error_response("Failed to list staff", e),
    }
}

pub async fn update_staff(
    State(state): State<AppState>,
    owner: Owner,
    Path(staff_id): Path<String>,
    Json(request): Json<UpdateStaffRequest>,
) -> impl IntoResponse {
    info!("PUT /api/staff/{} - request: {:?}", staff_id, request);

    match state.staff_service.update_staff(&owner, &staff_id, request).await {
        Ok(staff) => (StatusCode::OK, Json(staff)).into_response(),
        Err(e) => error_response("Failed to update staff member", e),
    }
}

/// Delete a staff member together with their salary records
pub async fn delete_staff(State(state): State<AppState>, owner: Owner, Path(staff_id): Path<String>) -> impl IntoResponse {
    info!("DELETE /api/staff/{}", staff_id);

    match state.staff_service.delete_staff(&owner, &staff_id).await {
        Ok(success_message) => (StatusCode::OK, Json(DeleteResponse { success_message })).into_response(),
        Err(e) => error_response("Failed to delete staff member", e),
    }
}

pub async fn record_salary(
    State(state): State<AppState>,
    owner: Owner,
    Json(request): Json<RecordSalaryRequest>,
) -> impl IntoResponse {
    info!("POST /api/salaries - request: {:?}", request);

    match state.salary_service.record_salary(&owner, request).await {
        Ok(record) => (StatusCode::CREATED, Json(record)).into_response(),
        Err(e) => error_response("Failed to record salary", e),
    }
}

/// Salary records, by staff member and/or period
pub async fn list_salaries(
    State(state): State<AppState>,
    owner: Owner,
    Query(query): Query<SalaryListQuery>,
) -> impl IntoResponse {
    info!("GET /api/salaries - query: {:?}", query);

    let period = match parse_period(query.month.as_deref(), query.year) {
        Ok(period) => period,
        Err(e) => return error_response("Invalid salary query", e),
    };
    match state.salary_service.list_salaries(&owner, query.staff_id.as_deref(), period).await {
        Ok(records) => (StatusCode::OK, Json(records)).into_response(),
        Err(e) => error_response("Failed to list salaries", e),
    }
}

/// Staff not yet paid for a month
pub async fn unpaid_staff(
    State(state): State<AppState>,
    owner: Owner,
    Query(query): Query<PeriodQuery>,
) -> impl IntoResponse {
    info!("GET /api/salaries/unpaid - query: {:?}", query);

    let (month, year) = match require_period(query.month.as_deref(), query.year) {
        Ok(period) => period,
        Err(e) => return error_response("Invalid salary query", e),
    };
    match state.salary_service.unpaid_staff(&owner, month, year).await {
        Ok(staff) => (StatusCode::OK, Json(staff)).into_response(),
        Err(e) => error_response("Failed to list unpaid staff", e),
    }
}
