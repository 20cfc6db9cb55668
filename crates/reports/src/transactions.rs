//! Every order with its client and lines, plus revenue totals.

use std::collections::HashMap;

use common::{ClientId, ItemId, Money, OrderStatus};
use serde::Serialize;
use store::{OrderLineRecord, OrderQuery, OrderRecord, Profile, Store};

use crate::Result;
use crate::sales::UNKNOWN_NAME;

/// Client label for orders whose profile is gone.
pub const UNKNOWN_CLIENT: &str = "Unknown client";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionLine {
    pub item_id: ItemId,
    pub item_name: String,
    pub quantity: u32,
    pub unit_price: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    #[serde(flatten)]
    pub order: OrderRecord,
    pub client_name: String,
    pub client_email: Option<String>,
    pub items: Vec<TransactionLine>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionsReport {
    /// Newest first.
    pub transactions: Vec<Transaction>,
    /// Σ total_amount over every order.
    pub total_revenue: Money,
    /// Σ total_amount over delivered orders.
    pub delivered_revenue: Money,
    pub pending_count: usize,
}

/// Builds the transactions report from the store.
#[tracing::instrument(skip(store))]
pub async fn transactions_report<S: Store>(store: &S) -> Result<TransactionsReport> {
    let orders = store.list_orders(OrderQuery::new()).await?;
    let order_ids: Vec<_> = orders.iter().map(|o| o.id).collect();
    let lines = store.lines_for_orders(&order_ids).await?;

    let names: HashMap<ItemId, String> = store
        .list_items()
        .await?
        .into_iter()
        .map(|i| (i.id, i.name))
        .collect();

    let mut client_ids: Vec<ClientId> = orders.iter().map(|o| o.client_id).collect();
    client_ids.sort();
    client_ids.dedup();
    let profiles: HashMap<ClientId, Profile> = store
        .get_profiles(&client_ids)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    Ok(build(orders, lines, &names, &profiles))
}

fn build(
    orders: Vec<OrderRecord>,
    lines: Vec<OrderLineRecord>,
    names: &HashMap<ItemId, String>,
    profiles: &HashMap<ClientId, Profile>,
) -> TransactionsReport {
    let mut lines_by_order: HashMap<_, Vec<TransactionLine>> = HashMap::new();
    for line in lines {
        lines_by_order
            .entry(line.order_id)
            .or_default()
            .push(TransactionLine {
                item_id: line.item_id,
                item_name: names
                    .get(&line.item_id)
                    .cloned()
                    .unwrap_or_else(|| UNKNOWN_NAME.to_string()),
                quantity: line.quantity,
                unit_price: line.unit_price,
            });
    }

    let total_revenue = orders.iter().map(|o| o.total_amount).sum();
    let delivered_revenue = orders
        .iter()
        .filter(|o| o.status == OrderStatus::Delivered)
        .map(|o| o.total_amount)
        .sum();
    let pending_count = orders
        .iter()
        .filter(|o| o.status == OrderStatus::Pending)
        .count();

    let transactions = orders
        .into_iter()
        .map(|order| {
            let profile = profiles.get(&order.client_id);
            Transaction {
                client_name: profile
                    .map_or(UNKNOWN_CLIENT, |p| p.display_name())
                    .to_string(),
                client_email: profile.map(|p| p.email.clone()),
                items: lines_by_order.remove(&order.id).unwrap_or_default(),
                order,
            }
        })
        .collect();

    TransactionsReport {
        transactions,
        total_revenue,
        delivered_revenue,
        pending_count,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use common::{OrderId, OrderLineId, Role};

    use super::*;

    fn order(status: OrderStatus, cents: i64, client_id: ClientId) -> OrderRecord {
        OrderRecord {
            id: OrderId::new(),
            client_id,
            status,
            total_amount: Money::from_cents(cents),
            shipping_address: "4 Mill Ln".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn totals_split_by_status() {
        let client = ClientId::new();
        let orders = vec![
            order(OrderStatus::Delivered, 1000, client),
            order(OrderStatus::Pending, 250, client),
            order(OrderStatus::Pending, 250, client),
            order(OrderStatus::Cancelled, 99, client),
        ];

        let report = build(orders, Vec::new(), &HashMap::new(), &HashMap::new());
        assert_eq!(report.total_revenue, Money::from_cents(1599));
        assert_eq!(report.delivered_revenue, Money::from_cents(1000));
        assert_eq!(report.pending_count, 2);
    }

    #[test]
    fn missing_profile_and_item_use_sentinels() {
        let known = ClientId::new();
        let first = order(OrderStatus::Pending, 500, known);
        let second = order(OrderStatus::Pending, 500, ClientId::new());
        let line = OrderLineRecord {
            id: OrderLineId::new(),
            order_id: first.id,
            item_id: ItemId::new(),
            quantity: 1,
            unit_price: Money::from_cents(500),
            created_at: Utc::now(),
        };
        let profiles = HashMap::from([(
            known,
            Profile {
                id: known,
                email: "kim@example.com".to_string(),
                full_name: Some("".to_string()),
                role: Role::Client,
            },
        )]);

        let report = build(vec![first, second], vec![line], &HashMap::new(), &profiles);
        assert_eq!(report.transactions[0].client_name, "kim@example.com");
        assert_eq!(report.transactions[0].items[0].item_name, UNKNOWN_NAME);
        assert_eq!(report.transactions[1].client_name, UNKNOWN_CLIENT);
        assert_eq!(report.transactions[1].client_email, None);
    }
}
