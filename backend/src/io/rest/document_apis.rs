//! # REST API for Printable Documents
//!
//! Each endpoint returns a plain-text attachment.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::info;

use super::{dues_query, error_response, Owner};
use crate::domain::{CertificateKind, Document};
use crate::AppState;

#[derive(Deserialize, Debug)]
pub struct BillQuery {
    pub as_of: Option<String>,
    pub since_admission: Option<bool>,
}

#[derive(Deserialize, Debug)]
pub struct CertificateQuery {
    #[serde(default)]
    pub kind: String,
}

fn attachment(document: Document) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", document.file_name)),
        ],
        document.content,
    )
        .into_response()
}

pub async fn id_card(State(state): State<AppState>, owner: Owner, Path(student_id): Path<String>) -> impl IntoResponse {
    info!("GET /api/documents/id-card/{}", student_id);

    match state.document_service.id_card(&owner, &student_id).await {
        Ok(document) => attachment(document),
        Err(e) => error_response("Failed to generate ID card", e),
    }
}

pub async fn fee_bill(
    State(state): State<AppState>,
    owner: Owner,
    Path(student_id): Path<String>,
    Query(query): Query<BillQuery>,
) -> impl IntoResponse {
    info!("GET /api/documents/bill/{} - query: {:?}", student_id, query);

    let dues = match dues_query(query.as_of.as_deref(), query.since_admission) {
        Ok(dues) => dues,
        Err(e) => return error_response("Invalid bill query", e),
    };
    match state.document_service.fee_bill(&owner, &student_id, dues).await {
        Ok(document) => attachment(document),
        Err(e) => error_response("Failed to generate fee bill", e),
    }
}

pub async fn certificate(
    State(state): State<AppState>,
    owner: Owner,
    Path(student_id): Path<String>,
    Query(query): Query<CertificateQuery>,
) -> impl IntoResponse {
    info!("GET /api/documents/certificate/{} - query: {:?}", student_id, query);

    let kind = match query.kind.parse::<CertificateKind>() {
        Ok(kind) => kind,
        Err(e) => return error_response("Invalid certificate kind", e),
    };
    match state.document_service.certificate(&owner, &student_id, kind).await {
        Ok(document) => attachment(document),
        Err(e) => error_response("Failed to generate certificate", e),
    }
}
