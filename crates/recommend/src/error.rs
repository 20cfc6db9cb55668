//! Recommendation error types.

use reports::ReportError;
use store::StoreError;
use thiserror::Error;

/// Errors that can occur while producing recommendations.
#[derive(Debug, Error)]
pub enum RecommendError {
    /// The requested role is neither `client` nor `owner`.
    #[error("Invalid role")]
    InvalidRole(String),

    /// The generator could not be reached or answered with an error.
    #[error("AI service error: {0}")]
    ExternalService(String),

    /// An error occurred in the store.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl From<ReportError> for RecommendError {
    fn from(e: ReportError) -> Self {
        match e {
            ReportError::Store(e) => RecommendError::Store(e),
        }
    }
}

/// Result type for recommendation operations.
pub type Result<T> = std::result::Result<T, RecommendError>;
