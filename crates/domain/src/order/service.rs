//! Order transaction engine.

use std::time::Instant;

use chrono::Utc;
use common::{ClientId, OrderId, OrderLineId, OrderStatus};
use serde::Serialize;
use store::{OrderLineRecord, OrderRecord, Store};

use crate::cart::Cart;
use crate::error::DomainError;
use crate::inventory::{InventoryLedger, StockOutcome, StockPolicy, StockRequest};
use crate::retry::RetryPolicy;

use super::PlaceOrder;

/// A freshly persisted order together with what happened to stock.
#[derive(Debug, Clone, Serialize)]
pub struct PlacedOrder {
    pub order: OrderRecord,
    pub lines: Vec<OrderLineRecord>,
    /// One outcome per line, in line order.
    pub stock: Vec<StockOutcome>,
}

impl PlacedOrder {
    pub fn order_id(&self) -> OrderId {
        self.order.id
    }

    /// Returns true if every line's stock was decremented.
    pub fn fully_stocked(&self) -> bool {
        self.stock.iter().all(StockOutcome::is_applied)
    }

    /// Lines whose decrement did not apply.
    pub fn stock_issues(&self) -> impl Iterator<Item = &StockOutcome> {
        self.stock.iter().filter(|o| !o.is_applied())
    }
}

/// Service that converts carts into orders.
///
/// The order header and lines are written through
/// [`OrderStore::create_order`](store::OrderStore::create_order); stock is
/// decremented afterwards, line by line, and never rolled back.
#[derive(Clone)]
pub struct OrderService<S: Store> {
    store: S,
    ledger: InventoryLedger<S>,
    policy: StockPolicy,
}

impl<S: Store> OrderService<S> {
    /// Creates a new order service with the strict stock policy.
    pub fn new(store: S) -> Self {
        Self {
            ledger: InventoryLedger::new(store.clone()),
            store,
            policy: StockPolicy::default(),
        }
    }

    /// Sets the policy used when a line asks for more than is on hand.
    pub fn with_stock_policy(mut self, policy: StockPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the retry policy for stock decrements.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.ledger = self.ledger.with_retry(retry);
        self
    }

    pub fn stock_policy(&self) -> StockPolicy {
        self.policy
    }

    pub fn ledger(&self) -> &InventoryLedger<S> {
        &self.ledger
    }

    /// Places an order from a cart.
    ///
    /// `Validation` and `Persistence` errors mean nothing was written.
    /// `PartialOrder` means a header exists without lines and needs
    /// reconciliation through [`partial_orders`](Self::partial_orders).
    #[tracing::instrument(skip(self, cmd), fields(client_id = %cmd.client_id, lines = cmd.cart.lines().len()))]
    pub async fn place_order(&self, cmd: PlaceOrder) -> Result<PlacedOrder, DomainError> {
        let started = Instant::now();
        let (order, lines) = build_records(&cmd.cart, cmd.client_id)?;

        if let Err(e) = self.store.create_order(&order, &lines).await {
            let err = DomainError::from(e);
            if let DomainError::PartialOrder { order_id, source } = &err {
                metrics::counter!("orders_partial_total").increment(1);
                tracing::error!(%order_id, error = %source, "Order header written without lines");
            }
            return Err(err);
        }

        let requests: Vec<StockRequest> = lines
            .iter()
            .map(|l| StockRequest::new(l.item_id, l.quantity))
            .collect();
        let stock = self.ledger.decrement_batch(&requests, self.policy).await;

        metrics::counter!("orders_placed_total").increment(1);
        metrics::histogram!("order_place_duration_seconds").record(started.elapsed().as_secs_f64());

        let placed = PlacedOrder { order, lines, stock };
        if placed.fully_stocked() {
            tracing::info!(order_id = %placed.order_id(), total = %placed.order.total_amount, "Order placed");
        } else {
            tracing::warn!(
                order_id = %placed.order_id(),
                issues = placed.stock_issues().count(),
                "Order placed with stock issues"
            );
        }

        Ok(placed)
    }

    /// Order headers that have no lines, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn partial_orders(&self) -> Result<Vec<OrderRecord>, DomainError> {
        Ok(self.store.orders_without_lines().await?)
    }
}

fn build_records(
    cart: &Cart,
    client_id: ClientId,
) -> Result<(OrderRecord, Vec<OrderLineRecord>), DomainError> {
    if cart.is_empty() {
        return Err(DomainError::Validation("Cart is empty".to_string()));
    }
    let shipping_address = cart.shipping_address().trim();
    if shipping_address.is_empty() {
        return Err(DomainError::Validation(
            "Shipping address is required".to_string(),
        ));
    }
    if client_id.is_nil() {
        return Err(DomainError::Validation("Client id is required".to_string()));
    }
    if let Some(line) = cart.lines().iter().find(|l| l.item.price.is_negative()) {
        return Err(DomainError::Validation(format!(
            "Item {} has a negative price",
            line.item.id
        )));
    }

    let total_amount = cart
        .checked_total_amount()
        .ok_or_else(|| DomainError::Validation("Order total is too large".to_string()))?;

    let created_at = Utc::now();
    let order = OrderRecord {
        id: OrderId::new(),
        client_id,
        status: OrderStatus::Pending,
        total_amount,
        shipping_address: shipping_address.to_string(),
        created_at,
    };

    let lines = cart
        .lines()
        .iter()
        .map(|l| OrderLineRecord {
            id: OrderLineId::new(),
            order_id: order.id,
            item_id: l.item.id,
            quantity: l.quantity,
            unit_price: l.item.price,
            created_at,
        })
        .collect();

    Ok((order, lines))
}
