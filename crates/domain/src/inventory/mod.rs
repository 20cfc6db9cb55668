//! Inventory ledger and stock decrement types.

mod ledger;
mod stock;

pub use ledger::InventoryLedger;
pub use stock::{StockOutcome, StockPolicy, StockRequest, UnknownStockPolicy};
