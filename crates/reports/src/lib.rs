//! Decision-support reports derived from orders and inventory.
//!
//! Nothing here is persisted; every report is recomputed from the store.

pub mod dashboard;
pub mod error;
pub mod sales;
pub mod stock;
pub mod transactions;

pub use dashboard::{DashboardStats, InventoryStats, OrderStats, dashboard_stats};
pub use error::{ReportError, Result};
pub use sales::{
    ItemSales, SalesPipeline, SalesReport, SalesRow, UNKNOWN_CATEGORY, UNKNOWN_NAME, aggregate,
    rank,
};
pub use stock::StockStatus;
pub use transactions::{
    Transaction, TransactionLine, TransactionsReport, UNKNOWN_CLIENT, transactions_report,
};
