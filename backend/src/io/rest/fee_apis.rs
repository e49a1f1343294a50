//! # REST API for Fees and Dues
//!
//! Monthly payments, other fees, the opening balance, per-student dues and
//! the school-wide dues list (JSON or CSV).

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use shared::{AddOtherFeeRequest, RecordPaymentRequest, SettlePreviousDuesRequest};
use tracing::info;

use super::{dues_query, error_response, Owner};
use crate::AppState;

#[derive(Deserialize, Debug)]
pub struct DuesParams {
    pub as_of: Option<String>,
    pub since_admission: Option<bool>,
}

#[derive(Deserialize, Debug)]
pub struct DuesListParams {
    pub class_id: Option<String>,
    pub as_of: Option<String>,
    pub since_admission: Option<bool>,
}

/// Record a payment against one month of the ledger
pub async fn record_payment(
    State(state): State<AppState>,
    owner: Owner,
    Path(student_id): Path<String>,
    Json(request): Json<RecordPaymentRequest>,
) -> impl IntoResponse {
    info!("POST /api/students/{}/payments - request: {:?}", student_id, request);

    match state.fee_service.record_payment(&owner, &student_id, request).await {
        Ok(response) => (StatusCode::CREATED, Json(response)).into_response(),
        Err(e) => error_response("Failed to record payment", e),
    }
}

pub async fn payment_history(
    State(state): State<AppState>,
    owner: Owner,
    Path(student_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/students/{}/payments", student_id);

    match state.fee_service.payment_history(&owner, &student_id).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => error_response("Failed to load payment history", e),
    }
}

pub async fn add_other_fee(
    State(state): State<AppState>,
    owner: Owner,
    Path(student_id): Path<String>,
    Json(request): Json<AddOtherFeeRequest>,
) -> impl IntoResponse {
    info!("POST /api/students/{}/other-fees - request: {:?}", student_id, request);

    match state.fee_service.add_other_fee(&owner, &student_id, request).await {
        Ok(response) => (StatusCode::CREATED, Json(response)).into_response(),
        Err(e) => error_response("Failed to add other fee", e),
    }
}

pub async fn pay_other_fee(
    State(state): State<AppState>,
    owner: Owner,
    Path((student_id, index)): Path<(String, usize)>,
) -> impl IntoResponse {
    info!("POST /api/students/{}/other-fees/{}/pay", student_id, index);

    match state.fee_service.pay_other_fee(&owner, &student_id, index).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => error_response("Failed to pay other fee", e),
    }
}

pub async fn settle_previous_dues(
    State(state): State<AppState>,
    owner: Owner,
    Path(student_id): Path<String>,
    Json(request): Json<SettlePreviousDuesRequest>,
) -> impl IntoResponse {
    info!("POST /api/students/{}/previous-dues/settle - request: {:?}", student_id, request);

    match state.fee_service.settle_previous_dues(&owner, &student_id, request).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => error_response("Failed to settle previous dues", e),
    }
}

/// Month-by-month dues of one student
pub async fn student_dues(
    State(state): State<AppState>,
    owner: Owner,
    Path(student_id): Path<String>,
    Query(params): Query<DuesParams>,
) -> impl IntoResponse {
    info!("GET /api/students/{}/dues - query: {:?}", student_id, params);

    let query = match dues_query(params.as_of.as_deref(), params.since_admission) {
        Ok(query) => query,
        Err(e) => return error_response("Invalid dues query", e),
    };
    match state.fee_service.student_dues(&owner, &student_id, query).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => error_response("Failed to compute dues", e),
    }
}

/// Every student that owes something
pub async fn list_dues(
    State(state): State<AppState>,
    owner: Owner,
    Query(params): Query<DuesListParams>,
) -> impl IntoResponse {
    info!("GET /api/dues - query: {:?}", params);

    let query = match dues_query(params.as_of.as_deref(), params.since_admission) {
        Ok(query) => query,
        Err(e) => return error_response("Invalid dues query", e),
    };
    match state.fee_service.dues_list(&owner, params.class_id.as_deref(), query).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => error_response("Failed to list dues", e),
    }
}

pub async fn export_dues_csv(
    State(state): State<AppState>,
    owner: Owner,
    Query(params): Query<DuesListParams>,
) -> impl IntoResponse {
    info!("GET /api/dues/export.csv - query: {:?}", params);

    let query = match dues_query(params.as_of.as_deref(), params.since_admission) {
        Ok(query) => query,
        Err(e) => return error_response("Invalid dues query", e),
    };
    match state.fee_service.export_dues_csv(&owner, params.class_id.as_deref(), query).await {
        Ok(csv) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"dues-{}.csv\"", query.as_of.format("%Y-%m-%d")),
                ),
            ],
            csv,
        )
            .into_response(),
        Err(e) => error_response("Failed to export dues", e),
    }
}
