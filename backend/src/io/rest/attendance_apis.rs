//! # REST API for Attendance

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use shared::SubmitAttendanceRequest;
use tracing::info;

use super::{error_response, Owner};
use crate::domain::validation::{parse_date, required};
use crate::domain::{DateRange, SchoolResult};
use crate::AppState;

#[derive(Deserialize, Debug)]
pub struct AttendanceDayQuery {
    #[serde(default)]
    pub class_id: String,
    #[serde(default)]
    pub date: String,
}

#[derive(Deserialize, Debug)]
pub struct RangeQuery {
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
}

impl RangeQuery {
    fn range(&self) -> SchoolResult<DateRange> {
        DateRange::new(parse_date("from", &self.from)?, parse_date("to", &self.to)?)
    }
}

/// Attendance of one class on one day
pub async fn get_attendance(
    State(state): State<AppState>,
    owner: Owner,
    Query(query): Query<AttendanceDayQuery>,
) -> impl IntoResponse {
    info!("GET /api/attendance - query: {:?}", query);

    let class_id = match required("class_id", &query.class_id) {
        Ok(class_id) => class_id,
        Err(e) => return error_response("Invalid attendance query", e),
    };
    match state.attendance_service.get_attendance(&owner, &class_id, &query.date).await {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(e) => error_response("Failed to get attendance", e),
    }
}

/// Save the present set for a class and day, replacing any earlier submission
pub async fn submit_attendance(
    State(state): State<AppState>,
    owner: Owner,
    Json(request): Json<SubmitAttendanceRequest>,
) -> impl IntoResponse {
    info!("POST /api/attendance - class={}, date={}", request.class_id, request.date);

    match state.attendance_service.submit_attendance(&owner, request).await {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(e) => error_response("Failed to submit attendance", e),
    }
}

pub async fn student_summary(
    State(state): State<AppState>,
    owner: Owner,
    Path(student_id): Path<String>,
    Query(query): Query<RangeQuery>,
) -> impl IntoResponse {
    info!("GET /api/attendance/students/{}/summary - query: {:?}", student_id, query);

    let range = match query.range() {
        Ok(range) => range,
        Err(e) => return error_response("Invalid date range", e),
    };
    match state.attendance_service.student_summary(&owner, &student_id, range).await {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(e) => error_response("Failed to summarise attendance", e),
    }
}

pub async fn class_summary(
    State(state): State<AppState>,
    owner: Owner,
    Path(class_id): Path<String>,
    Query(query): Query<RangeQuery>,
) -> impl IntoResponse {
    info!("GET /api/attendance/classes/{}/summary - query: {:?}", class_id, query);

    let range = match query.range() {
        Ok(range) => range,
        Err(e) => return error_response("Invalid date range", e),
    };
    match state.attendance_service.class_summary(&owner, &class_id, range).await {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(e) => error_response("Failed to summarise attendance", e),
    }
}
