//! Session-scoped shopping cart.
//!
//! A cart is a plain value owned by one session and handed to
//! [`OrderService::place_order`](crate::OrderService::place_order) explicitly.
//! Nothing here performs I/O.

use common::{ItemId, Money};
use serde::{Deserialize, Serialize};
use store::InventoryItem;

/// An item snapshot together with the requested quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// The item as it looked when it was selected. Its price is the one
    /// frozen into the order line.
    pub item: InventoryItem,
    pub quantity: u32,
}

impl CartLine {
    /// Returns `price * quantity`.
    pub fn line_total(&self) -> Money {
        self.item.price.multiply(self.quantity)
    }
}

/// Cart contents plus a shipping destination.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
    shipping_address: String,
}

impl Cart {
    /// Creates an empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `quantity` of an item, merging with an existing line for the same id.
    ///
    /// A quantity of zero is treated as one.
    pub fn add(&mut self, item: InventoryItem, quantity: u32) {
        let quantity = quantity.max(1);
        if let Some(line) = self.lines.iter_mut().find(|l| l.item.id == item.id) {
            line.quantity = line.quantity.saturating_add(quantity);
        } else {
            self.lines.push(CartLine { item, quantity });
        }
    }

    /// Sets the quantity of a line. Zero removes the line.
    pub fn update_qty(&mut self, item_id: ItemId, quantity: u32) {
        if quantity == 0 {
            self.remove(item_id);
            return;
        }
        if let Some(line) = self.lines.iter_mut().find(|l| l.item.id == item_id) {
            line.quantity = quantity;
        }
    }

    /// Removes the line for an item, if present.
    pub fn remove(&mut self, item_id: ItemId) {
        self.lines.retain(|l| l.item.id != item_id);
    }

    /// Removes every line and resets the shipping address.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.shipping_address.clear();
    }

    pub fn set_shipping_address(&mut self, address: impl Into<String>) {
        self.shipping_address = address.into();
    }

    pub fn shipping_address(&self) -> &str {
        &self.shipping_address
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Σ(price × quantity) over all lines.
    pub fn total_amount(&self) -> Money {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Like [`total_amount`](Self::total_amount), but `None` if any product
    /// or the sum overflows.
    pub fn checked_total_amount(&self) -> Option<Money> {
        self.lines.iter().try_fold(Money::zero(), |acc, l| {
            acc.checked_add(l.item.price.checked_multiply(l.quantity)?)
        })
    }

    /// Σ quantity over all lines.
    pub fn total_count(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, cents: i64) -> InventoryItem {
        InventoryItem {
            id: ItemId::new(),
            name: name.to_string(),
            description: String::new(),
            category: "General".to_string(),
            quantity: 50,
            price: Money::from_cents(cents),
            minimum_stock_threshold: 5,
        }
    }

    #[test]
    fn totals_cover_all_lines() {
        let mut cart = Cart::new();
        cart.add(item("A", 1000), 2);
        cart.add(item("B", 550), 1);

        assert_eq!(cart.total_amount(), Money::from_cents(2550));
        assert_eq!(cart.total_count(), 3);
    }

    #[test]
    fn adding_same_item_merges_lines() {
        let mut cart = Cart::new();
        let widget = item("Widget", 1000);
        cart.add(widget.clone(), 1);
        cart.add(widget, 2);

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 3);
    }

    #[test]
    fn update_to_zero_removes_line() {
        let mut cart = Cart::new();
        let widget = item("Widget", 1000);
        let id = widget.id;
        cart.add(widget, 4);

        cart.update_qty(id, 2);
        assert_eq!(cart.lines()[0].quantity, 2);

        cart.update_qty(id, 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn clear_resets_shipping_address() {
        let mut cart = Cart::new();
        cart.add(item("Widget", 1000), 1);
        cart.set_shipping_address("123 Main St");

        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.shipping_address(), "");
        assert_eq!(cart.total_amount(), Money::zero());
    }

    #[test]
    fn zero_quantity_add_counts_as_one() {
        let mut cart = Cart::new();
        cart.add(item("Widget", 1000), 0);
        assert_eq!(cart.total_count(), 1);
    }
}
