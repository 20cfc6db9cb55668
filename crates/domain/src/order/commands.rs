//! Order commands.

use common::{ClientId, OrderId, OrderStatus};

use crate::cart::Cart;

/// Command to turn a cart into a persisted order.
#[derive(Debug, Clone)]
pub struct PlaceOrder {
    /// The client placing the order.
    pub client_id: ClientId,

    /// The cart to check out, including the shipping address.
    pub cart: Cart,
}

impl PlaceOrder {
    /// Creates a new PlaceOrder command.
    pub fn new(client_id: ClientId, cart: Cart) -> Self {
        Self { client_id, cart }
    }
}

/// Command to move an order to another status.
#[derive(Debug, Clone, Copy)]
pub struct TransitionOrder {
    /// The order to update.
    pub order_id: OrderId,

    /// The requested status.
    pub status: OrderStatus,
}

impl TransitionOrder {
    /// Creates a new TransitionOrder command.
    pub fn new(order_id: OrderId, status: OrderStatus) -> Self {
        Self { order_id, status }
    }

    /// Creates a command that cancels the order.
    pub fn cancel(order_id: OrderId) -> Self {
        Self::new(order_id, OrderStatus::Cancelled)
    }
}
