//! Text summaries of catalog and sales handed to the generator.
//!
//! Formatting is deterministic: the same store contents always produce the
//! same text. Each listing is capped at [`ContextLimits::max_lines`] entries
//! and the whole context at [`ContextLimits::max_chars`] characters.

use std::collections::HashMap;

use common::{ClientId, ItemId};
use reports::{SalesPipeline, SalesRow, StockStatus, UNKNOWN_CATEGORY, UNKNOWN_NAME, rank};
use store::{InventoryItem, OrderLineRecord, OrderQuery, Store};

use crate::Result;

pub const NO_PURCHASES: &str = "No previous purchases.";
pub const NO_SALES: &str = "No sales data yet.";
const TRUNCATED: &str = "\n[truncated]";

/// Size bounds for a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextLimits {
    /// Maximum entries per listing.
    pub max_lines: usize,
    /// Maximum characters in the whole context.
    pub max_chars: usize,
}

impl Default for ContextLimits {
    fn default() -> Self {
        Self {
            max_lines: 200,
            max_chars: 12_000,
        }
    }
}

/// Client context: the caller's purchase history and the full catalog.
pub fn format_client_context(
    history: &[OrderLineRecord],
    catalog: &[InventoryItem],
    limits: ContextLimits,
) -> String {
    let by_id: HashMap<ItemId, &InventoryItem> = catalog.iter().map(|i| (i.id, i)).collect();

    let purchases = if history.is_empty() {
        NO_PURCHASES.to_string()
    } else {
        let lines = history.iter().map(|line| {
            let item = by_id.get(&line.item_id);
            format!(
                "- {} ({}) x{} @ {}",
                item.map_or(UNKNOWN_NAME, |i| i.name.as_str()),
                item.map_or(UNKNOWN_CATEGORY, |i| i.category.as_str()),
                line.quantity,
                line.unit_price
            )
        });
        format!(
            "Customer's purchase history:\n{}",
            capped(lines, limits.max_lines)
        )
    };

    let listing = catalog.iter().map(|i| {
        let stock = if i.quantity == 0 {
            "OUT OF STOCK".to_string()
        } else {
            format!("{} in stock", i.quantity)
        };
        format!(
            "- [{}] {} ({}) - {} - \"{}\" - {}",
            i.id, i.name, i.category, i.price, i.description, stock
        )
    });

    bounded(
        format!(
            "{purchases}\n\nFull catalog (only recommend in-stock items):\n{}",
            capped(listing, limits.max_lines)
        ),
        limits.max_chars,
    )
}

/// Owner context: sales ranked by units sold and the inventory with stock health.
pub fn format_owner_context(
    sales: &[SalesRow],
    total_orders: usize,
    inventory: &[InventoryItem],
    limits: ContextLimits,
) -> String {
    let summary = if sales.is_empty() {
        NO_SALES.to_string()
    } else {
        let lines = sales.iter().map(|row| {
            format!(
                "- {} ({}): {} units sold, {} revenue",
                row.item_name, row.category, row.units_sold, row.revenue
            )
        });
        format!(
            "Sales breakdown (by units sold):\n{}\n\nTotal orders: {total_orders}",
            capped(lines, limits.max_lines)
        )
    };

    let stock = inventory.iter().map(|i| {
        format!(
            "- {} ({}): {} in stock (min: {}) [{}] @ {}",
            i.name,
            i.category,
            i.quantity,
            i.minimum_stock_threshold,
            StockStatus::of(i),
            i.price
        )
    });

    bounded(
        format!(
            "{summary}\n\nCurrent inventory:\n{}",
            capped(stock, limits.max_lines)
        ),
        limits.max_chars,
    )
}

fn capped(lines: impl ExactSizeIterator<Item = String>, max_lines: usize) -> String {
    let total = lines.len();
    let mut kept: Vec<String> = lines.take(max_lines).collect();
    if total > kept.len() {
        kept.push(format!("- ... and {} more", total - kept.len()));
    }
    kept.join("\n")
}

fn bounded(text: String, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text;
    }
    let marker = TRUNCATED.chars().count();
    if max_chars < marker {
        return text.chars().take(max_chars).collect();
    }
    let mut cut: String = text.chars().take(max_chars - marker).collect();
    cut.push_str(TRUNCATED);
    cut
}

/// Loads store data and formats contexts.
#[derive(Clone)]
pub struct ContextBuilder<S: Store> {
    store: S,
    limits: ContextLimits,
}

impl<S: Store> ContextBuilder<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            limits: ContextLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: ContextLimits) -> Self {
        self.limits = limits;
        self
    }

    #[tracing::instrument(skip(self))]
    pub async fn client_context(&self, client_id: ClientId) -> Result<String> {
        let orders = self
            .store
            .list_orders(OrderQuery::for_client(client_id))
            .await?;
        let order_ids: Vec<_> = orders.iter().map(|o| o.id).collect();

        let mut history = self.store.lines_for_orders(&order_ids).await?;
        history.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));

        let catalog = self.store.list_items().await?;
        Ok(format_client_context(&history, &catalog, self.limits))
    }

    #[tracing::instrument(skip(self))]
    pub async fn owner_context(&self) -> Result<String> {
        let summary = SalesPipeline::new(self.store.clone())
            .summarize_sales()
            .await?;
        let inventory = self.store.list_items().await?;
        let total_orders = self.store.list_orders(OrderQuery::new()).await?.len();

        let rows = rank(&summary, &inventory);
        Ok(format_owner_context(
            &rows,
            total_orders,
            &inventory,
            self.limits,
        ))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use common::{Money, OrderId, OrderLineId};

    use super::*;

    fn item(name: &str, quantity: u32) -> InventoryItem {
        InventoryItem {
            id: ItemId::new(),
            name: name.to_string(),
            description: format!("A fine {name}"),
            category: "Audio".to_string(),
            quantity,
            price: Money::from_cents(4999),
            minimum_stock_threshold: 2,
        }
    }

    fn bought(item_id: ItemId, quantity: u32) -> OrderLineRecord {
        OrderLineRecord {
            id: OrderLineId::new(),
            order_id: OrderId::new(),
            item_id,
            quantity,
            unit_price: Money::from_cents(4999),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn client_without_history_gets_marker() {
        let speaker = item("Speaker", 0);
        let text = format_client_context(&[], &[speaker.clone()], ContextLimits::default());

        assert!(text.starts_with(NO_PURCHASES));
        assert!(text.contains(&format!(
            "- [{}] Speaker (Audio) - $49.99 - \"A fine Speaker\" - OUT OF STOCK",
            speaker.id
        )));
    }

    #[test]
    fn client_history_lists_lines_and_unknown_items() {
        let speaker = item("Speaker", 3);
        let text = format_client_context(
            &[bought(speaker.id, 2), bought(ItemId::new(), 1)],
            &[speaker],
            ContextLimits::default(),
        );

        assert!(text.starts_with("Customer's purchase history:\n- Speaker (Audio) x2 @ $49.99\n- Unknown (?) x1 @ $49.99"));
        assert!(text.contains("- 3 in stock"));
    }

    #[test]
    fn owner_without_sales_gets_marker_and_inventory() {
        let inventory = [item("Cable", 1), item("Speaker", 9)];
        let text = format_owner_context(&[], 0, &inventory, ContextLimits::default());

        assert_eq!(
            text,
            "No sales data yet.\n\nCurrent inventory:\n\
             - Cable (Audio): 1 in stock (min: 2) [LOW STOCK] @ $49.99\n\
             - Speaker (Audio): 9 in stock (min: 2) [OK] @ $49.99"
        );
    }

    #[test]
    fn listings_are_capped() {
        let catalog: Vec<_> = (0..5).map(|i| item(&format!("Item {i}"), 1)).collect();
        let limits = ContextLimits {
            max_lines: 2,
            max_chars: 10_000,
        };
        let text = format_client_context(&[], &catalog, limits);

        assert!(text.contains("Item 1"));
        assert!(!text.contains("Item 2"));
        assert!(text.ends_with("- ... and 3 more"));
    }

    #[test]
    fn whole_context_is_bounded() {
        let catalog: Vec<_> = (0..50).map(|i| item(&format!("Item {i}"), 1)).collect();
        let limits = ContextLimits {
            max_lines: 200,
            max_chars: 300,
        };
        let text = format_client_context(&[], &catalog, limits);

        assert!(text.chars().count() <= 300);
        assert!(text.ends_with("[truncated]"));
    }

    #[test]
    fn tiny_budget_drops_the_marker() {
        let catalog = vec![item("Lamp", 3)];
        for max_chars in [0, 5, 11] {
            let limits = ContextLimits {
                max_lines: 200,
                max_chars,
            };
            let text = format_client_context(&[], &catalog, limits);
            assert_eq!(text.chars().count(), max_chars);
            assert!(NO_PURCHASES.starts_with(&text));
        }

        let text = bounded("a".repeat(40), TRUNCATED.chars().count());
        assert_eq!(text, TRUNCATED);
    }

    #[test]
    fn formatting_is_deterministic() {
        let catalog = [item("Cable", 1), item("Speaker", 9)];
        let history = [bought(catalog[0].id, 1)];
        let a = format_client_context(&history, &catalog, ContextLimits::default());
        let b = format_client_context(&history, &catalog, ContextLimits::default());
        assert_eq!(a, b);
    }
}
