//! Order placement, status workflow and read views.

mod commands;
mod service;
mod view;
mod workflow;

pub use commands::{PlaceOrder, TransitionOrder};
pub use service::{OrderService, PlacedOrder};
pub use view::{OrderLineView, OrderQueries, OrderView, UNKNOWN_ITEM};
pub use workflow::OrderWorkflow;
