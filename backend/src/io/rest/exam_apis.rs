//! # REST API for Exam Results

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use shared::RecordExamResultRequest;
use tracing::info;

use super::{error_response, Owner};
use crate::domain::validation::required;
use crate::AppState;

#[derive(Deserialize, Debug)]
pub struct ExamListQuery {
    pub student_id: Option<String>,
    pub exam_name: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct RankingQuery {
    #[serde(default)]
    pub class_id: String,
    #[serde(default)]
    pub exam_name: String,
}

pub async fn record_result(
    State(state): State<AppState>,
    owner: Owner,
    Json(request): Json<RecordExamResultRequest>,
) -> impl IntoResponse {
    info!("POST /api/exam-results - student={}, exam={}", request.student_id, request.exam_name);

    match state.exam_service.record_result(&owner, request).await {
        Ok(result) => (StatusCode::CREATED, Json(result)).into_response(),
        Err(e) => error_response("Failed to record exam result", e),
    }
}

pub async fn list_results(
    State(state): State<AppState>,
    owner: Owner,
    Query(query): Query<ExamListQuery>,
) -> impl IntoResponse {
    info!("GET /api/exam-results - query: {:?}", query);

    match state
        .exam_service
        .list_results(&owner, query.student_id.as_deref(), query.exam_name.as_deref())
        .await
    {
        Ok(results) => (StatusCode::OK, Json(results)).into_response(),
        Err(e) => error_response("Failed to list exam results", e),
    }
}

/// Totals, percentage and grade of one result
pub async fn result_summary(
    State(state): State<AppState>,
    owner: Owner,
    Path(result_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/exam-results/{}/summary", result_id);

    match state.exam_service.result_summary(&owner, &result_id).await {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(e) => error_response("Failed to summarise exam result", e),
    }
}

pub async fn class_ranking(
    State(state): State<AppState>,
    owner: Owner,
    Query(query): Query<RankingQuery>,
) -> impl IntoResponse {
    info!("GET /api/exam-results/ranking - query: {:?}", query);

    let class_id = match required("class_id", &query.class_id) {
        Ok(class_id) => class_id,
        Err(e) => return error_response("Invalid ranking query", e),
    };
    match state.exam_service.class_ranking(&owner, &class_id, &query.exam_name).await {
        Ok(ranking) => (StatusCode::OK, Json(ranking)).into_response(),
        Err(e) => error_response("Failed to rank class", e),
    }
}
