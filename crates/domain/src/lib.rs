//! Order lifecycle and inventory consistency.
//!
//! This crate provides:
//! - [`Cart`], a session-scoped value with no I/O
//! - [`InventoryLedger`] for item records and atomic stock decrements
//! - [`OrderService`], which turns a cart into an order and decrements stock
//! - [`OrderWorkflow`] for status transitions
//! - [`OrderQueries`] for order listings with names resolved

pub mod cart;
pub mod error;
pub mod inventory;
pub mod order;
pub mod retry;

pub use cart::{Cart, CartLine};
pub use error::DomainError;
pub use inventory::{InventoryLedger, StockOutcome, StockPolicy, StockRequest, UnknownStockPolicy};
pub use order::{
    OrderLineView, OrderQueries, OrderService, OrderView, OrderWorkflow, PlaceOrder, PlacedOrder,
    TransitionOrder, UNKNOWN_ITEM,
};
pub use retry::RetryPolicy;
