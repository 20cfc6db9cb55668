//! Order status workflow.

use store::{OrderRecord, OrderStore, StatusUpdate};

use crate::error::DomainError;

use super::TransitionOrder;

/// Applies status changes along the edges of
/// [`OrderStatus::can_transition_to`](common::OrderStatus::can_transition_to).
///
/// Each write is a compare-and-set against the status that was read, so of
/// two racing transitions only one can succeed.
#[derive(Clone)]
pub struct OrderWorkflow<S: OrderStore> {
    store: S,
}

impl<S: OrderStore> OrderWorkflow<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Moves an order to the requested status.
    ///
    /// Requesting the status the order already has is a no-op that returns
    /// the order unchanged.
    #[tracing::instrument(skip(self))]
    pub async fn transition(&self, cmd: TransitionOrder) -> Result<OrderRecord, DomainError> {
        let order = self
            .store
            .get_order(cmd.order_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Order", cmd.order_id))?;

        let from = order.status;
        if from == cmd.status {
            return Ok(order);
        }
        if !from.can_transition_to(cmd.status) {
            return Err(DomainError::InvalidTransition {
                from,
                to: cmd.status,
            });
        }

        match self.store.update_status(cmd.order_id, from, cmd.status).await? {
            StatusUpdate::Updated(order) => {
                metrics::counter!(
                    "order_transitions_total",
                    "from" => from.as_str(),
                    "to" => cmd.status.as_str()
                )
                .increment(1);
                tracing::info!(order_id = %order.id, %from, to = %order.status, "Order status changed");
                Ok(order)
            }
            StatusUpdate::Missing => Err(DomainError::not_found("Order", cmd.order_id)),
            StatusUpdate::Conflict { actual } => Err(DomainError::Conflict {
                order_id: cmd.order_id,
                actual,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use common::{ClientId, Money, OrderId, OrderStatus};
    use store::InMemoryStore;

    use super::*;

    async fn seeded(status: OrderStatus) -> (OrderWorkflow<InMemoryStore>, OrderId) {
        let store = InMemoryStore::new();
        let order = OrderRecord {
            id: OrderId::new(),
            client_id: ClientId::new(),
            status,
            total_amount: Money::from_cents(100),
            shipping_address: "1 Elm St".to_string(),
            created_at: Utc::now(),
        };
        store.insert_order(&order).await.unwrap();
        (OrderWorkflow::new(store), order.id)
    }

    #[tokio::test]
    async fn forward_path_to_delivered() {
        let (workflow, id) = seeded(OrderStatus::Pending).await;
        for status in [
            OrderStatus::Confirmed,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
        ] {
            let order = workflow
                .transition(TransitionOrder::new(id, status))
                .await
                .unwrap();
            assert_eq!(order.status, status);
        }
    }

    #[tokio::test]
    async fn terminal_states_reject_transitions() {
        for terminal in [OrderStatus::Delivered, OrderStatus::Cancelled] {
            let (workflow, id) = seeded(terminal).await;
            let err = workflow
                .transition(TransitionOrder::new(id, OrderStatus::Pending))
                .await
                .unwrap_err();
            assert!(matches!(err, DomainError::InvalidTransition { .. }));
        }
    }

    #[tokio::test]
    async fn skipping_and_backward_steps_are_rejected() {
        let (workflow, id) = seeded(OrderStatus::Confirmed).await;
        let back = workflow
            .transition(TransitionOrder::new(id, OrderStatus::Pending))
            .await;
        assert!(matches!(back, Err(DomainError::InvalidTransition { .. })));

        let skip = workflow
            .transition(TransitionOrder::new(id, OrderStatus::Delivered))
            .await;
        assert!(matches!(skip, Err(DomainError::InvalidTransition { .. })));
    }

    #[tokio::test]
    async fn cancel_from_shipped() {
        let (workflow, id) = seeded(OrderStatus::Shipped).await;
        let order = workflow
            .transition(TransitionOrder::cancel(id))
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Cancelled);
    }

    #[tokio::test]
    async fn same_status_is_a_no_op() {
        let (workflow, id) = seeded(OrderStatus::Delivered).await;
        let order = workflow
            .transition(TransitionOrder::new(id, OrderStatus::Delivered))
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Delivered);
    }

    #[tokio::test]
    async fn unknown_order_is_not_found() {
        let workflow = OrderWorkflow::new(InMemoryStore::new());
        let err = workflow
            .transition(TransitionOrder::new(OrderId::new(), OrderStatus::Confirmed))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }
}
