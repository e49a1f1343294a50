use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use tracing::info;

use super::{error_response, require_period, Owner};
use crate::AppState;

#[derive(Deserialize, Debug)]
pub struct ReportQuery {
    pub month: Option<String>,
    pub year: Option<i32>,
}

/// Income, expenses and salaries for one month
pub async fn monthly_report(
    State(state): State<AppState>,
    owner: Owner,
    Query(query): Query<ReportQuery>,
) -> impl IntoResponse {
    info!("GET /api/reports/monthly - query: {:?}", query);

    let (month, year) = match require_period(query.month.as_deref(), query.year) {
        Ok(period) => period,
        Err(e) => return error_response("Invalid report query", e),
    };
    match state.report_service.monthly_report(&owner, month, year).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => error_response("Failed to build monthly report", e),
    }
}
