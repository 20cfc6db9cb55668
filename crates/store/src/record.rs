//! Row types for the four logical tables.

use chrono::{DateTime, Utc};
use common::{ClientId, ItemId, Money, OrderId, OrderLineId, OrderStatus, Role};
use serde::{Deserialize, Serialize};

/// A row of `inventory_items`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: ItemId,
    pub name: String,
    pub description: String,
    /// Free-text grouping key.
    pub category: String,
    /// Quantity on hand.
    pub quantity: u32,
    pub price: Money,
    /// Used for stock classification only, never enforced as a floor.
    pub minimum_stock_threshold: u32,
}

/// Field values for a new inventory item, before an id is assigned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewInventoryItem {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    pub quantity: i64,
    pub price: Money,
    #[serde(default)]
    pub minimum_stock_threshold: i64,
}

/// Partial update of an inventory item. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItemPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub quantity: Option<u32>,
    pub price: Option<Money>,
    pub minimum_stock_threshold: Option<u32>,
}

impl InventoryItemPatch {
    /// Returns true if the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.quantity.is_none()
            && self.price.is_none()
            && self.minimum_stock_threshold.is_none()
    }

    /// Applies the set fields onto an item.
    pub fn apply_to(&self, item: &mut InventoryItem) {
        if let Some(name) = &self.name {
            item.name.clone_from(name);
        }
        if let Some(description) = &self.description {
            item.description.clone_from(description);
        }
        if let Some(category) = &self.category {
            item.category.clone_from(category);
        }
        if let Some(quantity) = self.quantity {
            item.quantity = quantity;
        }
        if let Some(price) = self.price {
            item.price = price;
        }
        if let Some(threshold) = self.minimum_stock_threshold {
            item.minimum_stock_threshold = threshold;
        }
    }
}

/// A row of `orders`.
///
/// Only `status` changes after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: OrderId,
    pub client_id: ClientId,
    pub status: OrderStatus,
    /// Computed once at creation, never recomputed.
    pub total_amount: Money,
    pub shipping_address: String,
    pub created_at: DateTime<Utc>,
}

/// A row of `order_items`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineRecord {
    pub id: OrderLineId,
    pub order_id: OrderId,
    pub item_id: ItemId,
    pub quantity: u32,
    /// Catalog price frozen at order time.
    pub unit_price: Money,
    pub created_at: DateTime<Utc>,
}

impl OrderLineRecord {
    /// Returns `unit_price * quantity`.
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// A row of `profiles`, owned by the auth subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: ClientId,
    pub email: String,
    pub full_name: Option<String>,
    pub role: Role,
}

impl Profile {
    /// Full name when it has visible characters, otherwise the email.
    pub fn display_name(&self) -> &str {
        match self.full_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.email,
        }
    }
}
