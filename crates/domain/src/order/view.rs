//! Read views over orders with item and client names resolved.

use std::collections::HashMap;

use common::{ClientId, ItemId};
use serde::Serialize;
use store::{OrderLineRecord, OrderQuery, OrderRecord, Profile, Store};

use crate::error::DomainError;

/// Label shown for lines whose item was deleted.
pub const UNKNOWN_ITEM: &str = "Unknown item";

/// An order line with the item's current name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderLineView {
    #[serde(flatten)]
    pub line: OrderLineRecord,
    pub item_name: String,
}

/// An order with its lines and, for back-office listings, the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderView {
    #[serde(flatten)]
    pub order: OrderRecord,
    pub items: Vec<OrderLineView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_email: Option<String>,
}

/// Order listings for clients and staff.
#[derive(Clone)]
pub struct OrderQueries<S: Store> {
    store: S,
}

impl<S: Store> OrderQueries<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// A client's own orders, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn orders_for_client(
        &self,
        client_id: ClientId,
    ) -> Result<Vec<OrderView>, DomainError> {
        let orders = self.store.list_orders(OrderQuery::for_client(client_id)).await?;
        self.enrich(orders).await
    }

    /// Every order, newest first, with the client's display name and email.
    #[tracing::instrument(skip(self))]
    pub async fn all_orders(&self) -> Result<Vec<OrderView>, DomainError> {
        let orders = self.store.list_orders(OrderQuery::new()).await?;
        let mut views = self.enrich(orders).await?;

        let mut client_ids: Vec<ClientId> = views.iter().map(|v| v.order.client_id).collect();
        client_ids.sort();
        client_ids.dedup();

        let profiles: HashMap<ClientId, Profile> = self
            .store
            .get_profiles(&client_ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        for view in &mut views {
            if let Some(profile) = profiles.get(&view.order.client_id) {
                view.client_name = Some(profile.display_name().to_string());
                view.client_email = Some(profile.email.clone());
            }
        }

        Ok(views)
    }

    async fn enrich(&self, orders: Vec<OrderRecord>) -> Result<Vec<OrderView>, DomainError> {
        if orders.is_empty() {
            return Ok(Vec::new());
        }

        let order_ids: Vec<_> = orders.iter().map(|o| o.id).collect();
        let mut lines_by_order: HashMap<_, Vec<OrderLineRecord>> = HashMap::new();
        for line in self.store.lines_for_orders(&order_ids).await? {
            lines_by_order.entry(line.order_id).or_default().push(line);
        }

        let names: HashMap<ItemId, String> = self
            .store
            .list_items()
            .await?
            .into_iter()
            .map(|i| (i.id, i.name))
            .collect();

        Ok(orders
            .into_iter()
            .map(|order| {
                let items = lines_by_order
                    .remove(&order.id)
                    .unwrap_or_default()
                    .into_iter()
                    .map(|line| OrderLineView {
                        item_name: names
                            .get(&line.item_id)
                            .cloned()
                            .unwrap_or_else(|| UNKNOWN_ITEM.to_string()),
                        line,
                    })
                    .collect();

                OrderView {
                    order,
                    items,
                    client_name: None,
                    client_email: None,
                }
            })
            .collect())
    }
}
