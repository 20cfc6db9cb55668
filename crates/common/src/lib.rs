//! Shared types for the stockroom services.

pub mod ids;
pub mod money;
pub mod role;
pub mod status;

pub use ids::{ClientId, ItemId, OrderId, OrderLineId};
pub use money::Money;
pub use role::{CallerIdentity, Role};
pub use status::{OrderStatus, UnknownStatus};
