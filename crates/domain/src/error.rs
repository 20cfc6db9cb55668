//! Domain error types.

use common::{ItemId, OrderId, OrderStatus};
use store::{OrderWriteError, StoreError};
use thiserror::Error;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Input was rejected before anything was written.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The referenced record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The store failed and nothing was written.
    #[error("Persistence error: {0}")]
    Persistence(#[from] StoreError),

    /// The order header was written but its lines were not.
    #[error("Order {order_id} was only partially written: {source}")]
    PartialOrder {
        order_id: OrderId,
        #[source]
        source: StoreError,
    },

    /// The workflow has no edge between the two statuses.
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// Another writer changed the status first.
    #[error("Order {order_id} status changed concurrently to {actual}")]
    Conflict {
        order_id: OrderId,
        actual: OrderStatus,
    },

    /// A strict decrement asked for more than is on hand.
    #[error("Insufficient stock for item {item_id}: requested {requested}, available {available}")]
    InsufficientStock {
        item_id: ItemId,
        requested: u32,
        available: u32,
    },
}

impl DomainError {
    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        DomainError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Returns true when nothing was written and the same call may be repeated.
    ///
    /// A `PartialOrder` must be reconciled instead.
    pub fn is_retryable(&self) -> bool {
        match self {
            DomainError::Persistence(_) | DomainError::Conflict { .. } => true,
            DomainError::Validation(_)
            | DomainError::NotFound { .. }
            | DomainError::PartialOrder { .. }
            | DomainError::InvalidTransition { .. }
            | DomainError::InsufficientStock { .. } => false,
        }
    }
}

impl From<OrderWriteError> for DomainError {
    fn from(e: OrderWriteError) -> Self {
        match e {
            OrderWriteError::NotWritten(source) => DomainError::Persistence(source),
            OrderWriteError::Partial { order_id, source } => {
                DomainError::PartialOrder { order_id, source }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_order_is_not_retryable() {
        let err = DomainError::from(OrderWriteError::Partial {
            order_id: OrderId::new(),
            source: StoreError::Unavailable("lines".into()),
        });
        assert!(matches!(err, DomainError::PartialOrder { .. }));
        assert!(!err.is_retryable());
    }

    #[test]
    fn unwritten_order_is_retryable() {
        let err = DomainError::from(OrderWriteError::NotWritten(StoreError::Unavailable(
            "header".into(),
        )));
        assert!(matches!(err, DomainError::Persistence(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn validation_is_not_retryable() {
        assert!(!DomainError::Validation("empty cart".into()).is_retryable());
    }
}
