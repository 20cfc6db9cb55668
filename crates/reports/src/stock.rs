//! Stock health classification.

use serde::{Deserialize, Serialize};
use store::InventoryItem;

/// Health of an item's quantity relative to its minimum threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockStatus {
    OutOfStock,
    LowStock,
    Ok,
}

impl StockStatus {
    /// `OutOfStock` at zero, `LowStock` up to and including the threshold,
    /// `Ok` above it.
    pub fn classify(quantity: u32, threshold: u32) -> Self {
        if quantity == 0 {
            StockStatus::OutOfStock
        } else if quantity <= threshold {
            StockStatus::LowStock
        } else {
            StockStatus::Ok
        }
    }

    pub fn of(item: &InventoryItem) -> Self {
        Self::classify(item.quantity, item.minimum_stock_threshold)
    }

    /// Human-readable label used in text summaries.
    pub fn label(&self) -> &'static str {
        match self {
            StockStatus::OutOfStock => "OUT OF STOCK",
            StockStatus::LowStock => "LOW STOCK",
            StockStatus::Ok => "OK",
        }
    }
}

impl std::fmt::Display for StockStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
