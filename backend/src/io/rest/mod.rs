//! # REST API Interface Layer
//!
//! One `*_apis` module per resource. Every handler logs the request, calls
//! a single service method and maps the outcome to a response. Errors come
//! back as the plain error message with the status from [`status_for`].

pub mod assistant_apis;
pub mod attendance_apis;
pub mod class_apis;
pub mod document_apis;
pub mod exam_apis;
pub mod expense_apis;
pub mod export_apis;
pub mod fee_apis;
pub mod logging_apis;
pub mod profile_apis;
pub mod realtime_apis;
pub mod report_apis;
pub mod session;
pub mod staff_apis;
pub mod student_apis;
pub mod transport_apis;
pub mod upload_apis;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use shared::Month;
use tracing::{error, warn};

use crate::domain::validation::parse_date;
use crate::domain::{DuesQuery, SchoolError, SchoolResult};

pub use session::Owner;

pub fn status_for(e: &SchoolError) -> StatusCode {
    match e {
        SchoolError::NotFound(_) => StatusCode::NOT_FOUND,
        SchoolError::Validation(_) => StatusCode::BAD_REQUEST,
        SchoolError::Conflict(_) => StatusCode::CONFLICT,
        SchoolError::Upload(_) => StatusCode::UNPROCESSABLE_ENTITY,
        SchoolError::Assistant(_) => StatusCode::BAD_GATEWAY,
        SchoolError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Log a failed operation and turn it into a response
pub fn error_response(context: &str, e: SchoolError) -> Response {
    let status = status_for(&e);
    if status.is_server_error() {
        error!("{}: {:?}", context, e);
    } else {
        warn!("{}: {}", context, e);
    }

    let message = match e {
        // Storage details stay in the log
        SchoolError::Storage(_) => format!("{}: internal error", context),
        other => other.to_string(),
    };
    (status, message).into_response()
}

/// Month given by name ("may") or number ("5")
pub fn parse_month(value: &str) -> SchoolResult<Month> {
    if let Ok(number) = value.trim().parse::<u32>() {
        return Month::from_number(number)
            .ok_or_else(|| SchoolError::validation(format!("Month must be between 1 and 12, got {}", number)));
    }
    value.parse::<Month>().map_err(|e| SchoolError::validation(e.to_string()))
}

/// Optional month/year filter; both parts or neither
pub fn parse_period(month: Option<&str>, year: Option<i32>) -> SchoolResult<Option<(Month, i32)>> {
    match (month, year) {
        (Some(month), Some(year)) => Ok(Some((parse_month(month)?, year))),
        (None, None) => Ok(None),
        _ => Err(SchoolError::validation("Month and year must be given together")),
    }
}

/// Required month/year pair
pub fn require_period(month: Option<&str>, year: Option<i32>) -> SchoolResult<(Month, i32)> {
    parse_period(month, year)?.ok_or_else(|| SchoolError::validation("Month and year are required"))
}

/// Dues window from query parameters; no date means today
pub fn dues_query(as_of: Option<&str>, since_admission: Option<bool>) -> SchoolResult<DuesQuery> {
    let mut query = DuesQuery::today();
    if let Some(value) = as_of.filter(|v| !v.trim().is_empty()) {
        query.as_of = parse_date("as_of", value)?;
    }
    query.since_admission = since_admission.unwrap_or(false);
    Ok(query)
}
