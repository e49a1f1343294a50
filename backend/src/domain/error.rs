//! Error type shared by every domain service.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchoolError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Upload(String),
    #[error("Assistant unavailable: {0}")]
    Assistant(String),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

pub type SchoolResult<T> = Result<T, SchoolError>;

impl SchoolError {
    pub fn not_found(what: &str, id: &str) -> Self {
        SchoolError::NotFound(format!("{} not found: {}", what, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        SchoolError::Validation(message.into())
    }
}

impl From<sqlx::Error> for SchoolError {
    fn from(e: sqlx::Error) -> Self {
        SchoolError::Storage(e.into())
    }
}

impl From<serde_json::Error> for SchoolError {
    fn from(e: serde_json::Error) -> Self {
        SchoolError::Storage(e.into())
    }
}
