//! Report error types.

use store::StoreError;
use thiserror::Error;

/// Errors that can occur while building a report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// An error occurred in the store.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Result type for report operations.
pub type Result<T> = std::result::Result<T, ReportError>;
