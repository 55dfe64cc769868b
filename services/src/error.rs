//! Error taxonomy shared by every workflow service.

use sea_orm::DbErr;
use thiserror::Error;

/// Errors surfaced by the workflow services.
///
/// `NotFound` deliberately covers both "does not exist" and "exists but is
/// owned by someone else", so callers cannot probe for other users' resources.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("re-attempt blocked: {count} violation(s) reached the limit of {limit}")]
    Disqualified { count: u32, limit: u32 },

    #[error("a request between these accounts is already pending")]
    DuplicateRequest,

    #[error("{0}")]
    InvalidOperation(String),

    #[error("question generation failed: {0}")]
    Generation(String),

    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ServiceError::Validation(errors.to_string())
    }
}

impl ServiceError {
    pub fn not_found(what: impl Into<String>) -> Self {
        ServiceError::NotFound(what.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        ServiceError::Validation(msg.into())
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        ServiceError::InvalidOperation(msg.into())
    }
}
