//! Headline inventory and order figures.

use std::collections::HashSet;

use common::{Money, OrderStatus};
use serde::Serialize;
use store::{InventoryItem, OrderQuery, OrderRecord, Store};

use crate::Result;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InventoryStats {
    pub products: usize,
    pub total_units: u64,
    /// Items at or below their threshold, out-of-stock items included.
    pub low_stock: usize,
    pub out_of_stock: usize,
    pub categories: usize,
    /// Σ price × quantity.
    pub stock_value: Money,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrderStats {
    pub total: usize,
    pub pending: usize,
    pub revenue: Money,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub inventory: InventoryStats,
    pub orders: OrderStats,
}

pub fn inventory_stats(items: &[InventoryItem]) -> InventoryStats {
    let categories: HashSet<&str> = items.iter().map(|i| i.category.as_str()).collect();
    InventoryStats {
        products: items.len(),
        total_units: items.iter().map(|i| u64::from(i.quantity)).sum(),
        low_stock: items
            .iter()
            .filter(|i| i.quantity <= i.minimum_stock_threshold)
            .count(),
        out_of_stock: items.iter().filter(|i| i.quantity == 0).count(),
        categories: categories.len(),
        stock_value: items.iter().map(|i| i.price.multiply(i.quantity)).sum(),
    }
}

pub fn order_stats(orders: &[OrderRecord]) -> OrderStats {
    OrderStats {
        total: orders.len(),
        pending: orders
            .iter()
            .filter(|o| o.status == OrderStatus::Pending)
            .count(),
        revenue: orders.iter().map(|o| o.total_amount).sum(),
    }
}

#[tracing::instrument(skip(store))]
pub async fn dashboard_stats<S: Store>(store: &S) -> Result<DashboardStats> {
    let items = store.list_items().await?;
    let orders = store.list_orders(OrderQuery::new()).await?;
    Ok(DashboardStats {
        inventory: inventory_stats(&items),
        orders: order_stats(&orders),
    })
}

#[cfg(test)]
mod tests {
    use common::ItemId;

    use super::*;

    fn item(category: &str, quantity: u32, threshold: u32, cents: i64) -> InventoryItem {
        InventoryItem {
            id: ItemId::new(),
            name: format!("{category} item"),
            description: String::new(),
            category: category.to_string(),
            quantity,
            price: Money::from_cents(cents),
            minimum_stock_threshold: threshold,
        }
    }

    #[test]
    fn inventory_figures() {
        let stats = inventory_stats(&[
            item("Tools", 10, 2, 150),
            item("Tools", 2, 2, 1000),
            item("Garden", 0, 1, 500),
        ]);

        assert_eq!(stats.products, 3);
        assert_eq!(stats.total_units, 12);
        assert_eq!(stats.low_stock, 2);
        assert_eq!(stats.out_of_stock, 1);
        assert_eq!(stats.categories, 2);
        assert_eq!(stats.stock_value, Money::from_cents(3500));
    }

    #[test]
    fn empty_inventory_is_all_zero() {
        assert_eq!(inventory_stats(&[]), InventoryStats::default());
    }
}
