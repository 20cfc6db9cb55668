use common::ItemId;
use serde::{Deserialize, Serialize};
use store::DecrementMode;
use thiserror::Error;

/// What the order engine does when a line asks for more than is on hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockPolicy {
    /// Refuse the decrement and flag the line as oversold.
    #[default]
    Strict,
    /// Floor the quantity at zero.
    Clamp,
}

impl StockPolicy {
    pub fn mode(&self) -> DecrementMode {
        match self {
            StockPolicy::Strict => DecrementMode::Strict,
            StockPolicy::Clamp => DecrementMode::Clamp,
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown stock policy: {0} (expected strict or clamp)")]
pub struct UnknownStockPolicy(pub String);

impl std::str::FromStr for StockPolicy {
    type Err = UnknownStockPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(StockPolicy::Strict),
            "clamp" => Ok(StockPolicy::Clamp),
            _ => Err(UnknownStockPolicy(s.to_string())),
        }
    }
}

/// One entry of a stock decrement batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRequest {
    pub item_id: ItemId,
    pub quantity: u32,
}

impl StockRequest {
    pub fn new(item_id: ItemId, quantity: u32) -> Self {
        Self { item_id, quantity }
    }
}

/// Per-request result of a decrement batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StockOutcome {
    /// Stock was decremented to `remaining`.
    Applied { item_id: ItemId, remaining: u32 },
    /// More was requested than available; stock was left untouched.
    Oversold {
        item_id: ItemId,
        requested: u32,
        available: u32,
    },
    /// The item no longer exists.
    Missing { item_id: ItemId },
    /// The store kept failing; the decrement may or may not be needed again.
    Failed { item_id: ItemId, error: String },
}

impl StockOutcome {
    pub fn item_id(&self) -> ItemId {
        match self {
            StockOutcome::Applied { item_id, .. }
            | StockOutcome::Oversold { item_id, .. }
            | StockOutcome::Missing { item_id }
            | StockOutcome::Failed { item_id, .. } => *item_id,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, StockOutcome::Applied { .. })
    }

    pub(crate) fn label(&self) -> &'static str {
        match self {
            StockOutcome::Applied { .. } => "applied",
            StockOutcome::Oversold { .. } => "oversold",
            StockOutcome::Missing { .. } => "missing",
            StockOutcome::Failed { .. } => "failed",
        }
    }
}
