//! # REST API for Expenses

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use shared::{CreateExpenseRequest, DeleteResponse};
use tracing::info;

use super::{error_response, parse_period, Owner};
use crate::AppState;

#[derive(Deserialize, Debug)]
pub struct ExpenseListQuery {
    pub month: Option<String>,
    pub year: Option<i32>,
}

pub async fn create_expense(
    State(state): State<AppState>,
    owner: Owner,
    Json(request): Json<CreateExpenseRequest>,
) -> impl IntoResponse {
    info!("POST /api/expenses - request: {:?}", request);

    match state.expense_service.create_expense(&owner, request).await {
        Ok(expense) => (StatusCode::CREATED, Json(expense)).into_response(),
        Err(e) => error_response("Failed to create expense", e),
    }
}

pub async fn list_expenses(
    State(state): State<AppState>,
    owner: Owner,
    Query(query): Query<ExpenseListQuery>,
) -> impl IntoResponse {
    info!("GET /api/expenses - query: {:?}", query);

    let period = match parse_period(query.month.as_deref(), query.year) {
        Ok(period) => period,
        Err(e) => return error_response("Invalid expense query", e),
    };
    match state.expense_service.list_expenses(&owner, period).await {
        Ok(expenses) => (StatusCode::OK, Json(expenses)).into_response(),
        Err(e) => error_response("Failed to list expenses", e),
    }
}

pub async fn delete_expense(
    State(state): State<AppState>,
    owner: Owner,
    Path(expense_id): Path<String>,
) -> impl IntoResponse {
    info!("DELETE /api/expenses/{}", expense_id);

    match state.expense_service.delete_expense(&owner, &expense_id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(DeleteResponse { success_message: format!("Expense {} deleted", expense_id) }),
        )
            .into_response(),
        Err(e) => error_response("Failed to delete expense", e),
    }
}
