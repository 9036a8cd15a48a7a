//! Error types for session operations

use thiserror::Error;

use crate::llm::LlmError;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("Session {0} not found")]
    NotFound(i64),

    #[error("Text generation failed: {0}")]
    Generation(#[from] LlmError),

    #[error("Database error: {0}")]
    Persistence(#[from] rusqlite::Error),
}

pub type ServiceResult<T> = Result<T, ServiceError>;
