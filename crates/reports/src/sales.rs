//! Sales aggregation over every order line.

use std::collections::HashMap;

use common::{ItemId, Money};
use futures_util::StreamExt;
use serde::Serialize;
use store::{InventoryItem, OrderLineRecord, OrderQuery, Store};

use crate::Result;
use crate::stock::StockStatus;

/// Name shown for items that no longer exist.
pub const UNKNOWN_NAME: &str = "Unknown";

/// Category shown for items that no longer exist.
pub const UNKNOWN_CATEGORY: &str = "?";

/// Units and revenue for one item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ItemSales {
    pub units_sold: u64,
    pub revenue: Money,
}

impl ItemSales {
    fn record(&mut self, line: &OrderLineRecord) {
        self.units_sold += u64::from(line.quantity);
        self.revenue += line.line_total();
    }
}

/// Folds lines into per-item totals.
pub fn aggregate<'a>(
    lines: impl IntoIterator<Item = &'a OrderLineRecord>,
) -> HashMap<ItemId, ItemSales> {
    let mut summary: HashMap<ItemId, ItemSales> = HashMap::new();
    for line in lines {
        summary.entry(line.item_id).or_default().record(line);
    }
    summary
}

/// One row of the sales report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SalesRow {
    pub item_id: ItemId,
    pub item_name: String,
    pub category: String,
    pub units_sold: u64,
    pub revenue: Money,
    /// Current quantity on hand; `None` when the item was deleted.
    pub quantity: Option<u32>,
    pub stock_status: Option<StockStatus>,
}

/// Joins per-item totals with the catalog, ordered by units sold descending.
///
/// Ties are broken by revenue, then by name.
pub fn rank(summary: &HashMap<ItemId, ItemSales>, items: &[InventoryItem]) -> Vec<SalesRow> {
    let catalog: HashMap<ItemId, &InventoryItem> = items.iter().map(|i| (i.id, i)).collect();

    let mut rows: Vec<SalesRow> = summary
        .iter()
        .map(|(item_id, sales)| {
            let item = catalog.get(item_id);
            SalesRow {
                item_id: *item_id,
                item_name: item.map_or(UNKNOWN_NAME, |i| i.name.as_str()).to_string(),
                category: item
                    .map_or(UNKNOWN_CATEGORY, |i| i.category.as_str())
                    .to_string(),
                units_sold: sales.units_sold,
                revenue: sales.revenue,
                quantity: item.map(|i| i.quantity),
                stock_status: item.map(|i| StockStatus::of(i)),
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.units_sold
            .cmp(&a.units_sold)
            .then(b.revenue.cmp(&a.revenue))
            .then_with(|| a.item_name.cmp(&b.item_name))
            .then(a.item_id.cmp(&b.item_id))
    });
    rows
}

/// Global sales figures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SalesReport {
    pub rows: Vec<SalesRow>,
    pub total_orders: usize,
    pub total_units: u64,
    pub total_revenue: Money,
}

impl SalesReport {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Summarizes historical orders into per-item sales.
///
/// Every order counts, whatever its status.
#[derive(Clone)]
pub struct SalesPipeline<S: Store> {
    store: S,
}

impl<S: Store> SalesPipeline<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Units sold and revenue per item across all order lines.
    #[tracing::instrument(skip(self))]
    pub async fn summarize_sales(&self) -> Result<HashMap<ItemId, ItemSales>> {
        let mut stream = self.store.stream_order_lines().await?;
        let mut summary: HashMap<ItemId, ItemSales> = HashMap::new();

        while let Some(line) = stream.next().await {
            let line = line?;
            summary.entry(line.item_id).or_default().record(&line);
        }

        tracing::debug!(items = summary.len(), "Sales summarized");
        Ok(summary)
    }

    /// The summary joined with the catalog plus order totals.
    #[tracing::instrument(skip(self))]
    pub async fn sales_report(&self) -> Result<SalesReport> {
        let summary = self.summarize_sales().await?;
        let items = self.store.list_items().await?;
        let total_orders = self.store.list_orders(OrderQuery::new()).await?.len();

        let rows = rank(&summary, &items);
        Ok(SalesReport {
            total_units: rows.iter().map(|r| r.units_sold).sum(),
            total_revenue: rows.iter().map(|r| r.revenue).sum(),
            total_orders,
            rows,
        })
    }
}
