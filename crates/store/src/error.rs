use common::OrderId;
use thiserror::Error;

/// Errors that can occur when interacting with the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A row with the same primary key already exists.
    #[error("Duplicate {table} row: {id}")]
    Duplicate { table: &'static str, id: String },

    /// A stored value could not be mapped onto a record type.
    #[error("Corrupt {table} row: {reason}")]
    Corrupt { table: &'static str, reason: String },

    /// The backend is temporarily unable to serve the request.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Returns true for failures worth retrying: pool exhaustion, I/O,
    /// serialization failures and deadlocks.
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Unavailable(_) => true,
            StoreError::Database(sqlx::Error::PoolTimedOut | sqlx::Error::Io(_)) => true,
            StoreError::Database(sqlx::Error::Database(db_err)) => {
                matches!(db_err.code().as_deref(), Some("40001" | "40P01"))
            }
            _ => false,
        }
    }
}

/// Failure while writing an order header together with its lines.
#[derive(Debug, Error)]
pub enum OrderWriteError {
    /// Nothing was persisted; the whole write may be retried.
    #[error("Order was not written: {0}")]
    NotWritten(#[source] StoreError),

    /// The header exists but its lines do not.
    #[error("Order {order_id} header written without its lines: {source}")]
    Partial {
        order_id: OrderId,
        #[source]
        source: StoreError,
    },
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
