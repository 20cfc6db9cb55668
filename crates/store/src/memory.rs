use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use common::{ClientId, ItemId, OrderId, OrderStatus};
use tokio::sync::RwLock;

use crate::{
    InventoryItem, InventoryItemPatch, OrderLineRecord, OrderQuery, OrderRecord, OrderWriteError,
    Profile, Result, StoreError,
    store::{
        DecrementMode, DecrementOutcome, InventoryStore, LineStream, OrderStore, ProfileStore,
        StatusUpdate,
    },
};

/// Failure injection switches used by tests.
#[derive(Debug, Default)]
struct Faults {
    fail_order_headers: bool,
    fail_order_lines: bool,
    transient_decrement_failures: u32,
}

#[derive(Debug, Default)]
struct MemoryState {
    items: HashMap<ItemId, InventoryItem>,
    orders: Vec<OrderRecord>,
    lines: Vec<OrderLineRecord>,
    profiles: HashMap<ClientId, Profile>,
    faults: Faults,
}

/// In-memory store implementation for testing and local runs.
///
/// Every operation takes the single state lock, so each write is atomic with
/// respect to every other write.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<MemoryState>>,
    non_transactional: bool,
}

impl InMemoryStore {
    /// Creates a new empty store whose order writes are all-or-nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that writes order headers and lines in two steps,
    /// like a backend without multi-row transactions.
    pub fn non_transactional() -> Self {
        Self {
            non_transactional: true,
            ..Self::default()
        }
    }

    /// Adds or replaces a profile.
    pub async fn put_profile(&self, profile: Profile) {
        self.state
            .write()
            .await
            .profiles
            .insert(profile.id, profile);
    }

    /// Makes every following order header insert fail.
    pub async fn set_fail_order_headers(&self, fail: bool) {
        self.state.write().await.faults.fail_order_headers = fail;
    }

    /// Makes every following order line insert fail.
    pub async fn set_fail_order_lines(&self, fail: bool) {
        self.state.write().await.faults.fail_order_lines = fail;
    }

    /// Makes the next `count` decrements fail with a transient error.
    pub async fn fail_next_decrements(&self, count: u32) {
        self.state.write().await.faults.transient_decrement_failures = count;
    }

    /// Returns the number of order headers stored.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    /// Returns the number of order lines stored.
    pub async fn line_count(&self) -> usize {
        self.state.read().await.lines.len()
    }

    /// Clears all records and faults.
    pub async fn clear(&self) {
        *self.state.write().await = MemoryState::default();
    }
}

fn write_header(state: &mut MemoryState, order: &OrderRecord) -> Result<()> {
    if state.faults.fail_order_headers {
        return Err(StoreError::Unavailable("order header insert failed".to_string()));
    }
    if state.orders.iter().any(|o| o.id == order.id) {
        return Err(StoreError::Duplicate {
            table: "orders",
            id: order.id.to_string(),
        });
    }
    state.orders.push(order.clone());
    Ok(())
}

fn write_lines(state: &mut MemoryState, lines: &[OrderLineRecord]) -> Result<()> {
    if state.faults.fail_order_lines {
        return Err(StoreError::Unavailable("order line insert failed".to_string()));
    }
    for line in lines {
        if !state.orders.iter().any(|o| o.id == line.order_id) {
            return Err(StoreError::Corrupt {
                table: "order_items",
                reason: format!("order {} does not exist", line.order_id),
            });
        }
    }
    state.lines.extend(lines.iter().cloned());
    Ok(())
}

#[async_trait]
impl InventoryStore for InMemoryStore {
    async fn list_items(&self) -> Result<Vec<InventoryItem>> {
        let state = self.state.read().await;
        let mut items: Vec<_> = state.items.values().cloned().collect();
        items.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(items)
    }

    async fn get_item(&self, id: ItemId) -> Result<Option<InventoryItem>> {
        Ok(self.state.read().await.items.get(&id).cloned())
    }

    async fn insert_item(&self, item: &InventoryItem) -> Result<()> {
        let mut state = self.state.write().await;
        if state.items.contains_key(&item.id) {
            return Err(StoreError::Duplicate {
                table: "inventory_items",
                id: item.id.to_string(),
            });
        }
        state.items.insert(item.id, item.clone());
        Ok(())
    }

    async fn update_item(
        &self,
        id: ItemId,
        patch: &InventoryItemPatch,
    ) -> Result<Option<InventoryItem>> {
        let mut state = self.state.write().await;
        Ok(state.items.get_mut(&id).map(|item| {
            patch.apply_to(item);
            item.clone()
        }))
    }

    async fn delete_item(&self, id: ItemId) -> Result<bool> {
        Ok(self.state.write().await.items.remove(&id).is_some())
    }

    async fn decrement_quantity(
        &self,
        id: ItemId,
        amount: u32,
        mode: DecrementMode,
    ) -> Result<DecrementOutcome> {
        let mut state = self.state.write().await;

        if state.faults.transient_decrement_failures > 0 {
            state.faults.transient_decrement_failures -= 1;
            return Err(StoreError::Unavailable("decrement timed out".to_string()));
        }

        let Some(item) = state.items.get_mut(&id) else {
            return Ok(DecrementOutcome::Missing);
        };

        match mode {
            DecrementMode::Clamp => {
                item.quantity = item.quantity.saturating_sub(amount);
            }
            DecrementMode::Strict => {
                if item.quantity < amount {
                    return Ok(DecrementOutcome::Insufficient {
                        available: item.quantity,
                    });
                }
                item.quantity -= amount;
            }
        }

        Ok(DecrementOutcome::Applied {
            remaining: item.quantity,
        })
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn insert_order(&self, order: &OrderRecord) -> Result<()> {
        write_header(&mut *self.state.write().await, order)
    }

    async fn insert_order_lines(&self, lines: &[OrderLineRecord]) -> Result<()> {
        write_lines(&mut *self.state.write().await, lines)
    }

    async fn create_order(
        &self,
        order: &OrderRecord,
        lines: &[OrderLineRecord],
    ) -> std::result::Result<(), OrderWriteError> {
        if self.non_transactional {
            self.insert_order(order)
                .await
                .map_err(OrderWriteError::NotWritten)?;
            return self
                .insert_order_lines(lines)
                .await
                .map_err(|source| OrderWriteError::Partial {
                    order_id: order.id,
                    source,
                });
        }

        // Check every failure condition before mutating anything.
        let mut state = self.state.write().await;
        if state.faults.fail_order_lines {
            return Err(OrderWriteError::NotWritten(StoreError::Unavailable(
                "order line insert failed".to_string(),
            )));
        }
        write_header(&mut state, order).map_err(OrderWriteError::NotWritten)?;
        state.lines.extend(lines.iter().cloned());
        Ok(())
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<OrderRecord>> {
        let state = self.state.read().await;
        Ok(state.orders.iter().find(|o| o.id == id).cloned())
    }

    async fn list_orders(&self, query: OrderQuery) -> Result<Vec<OrderRecord>> {
        let state = self.state.read().await;
        let mut orders: Vec<_> = state
            .orders
            .iter()
            .filter(|o| {
                if let Some(client_id) = query.client_id
                    && o.client_id != client_id
                {
                    return false;
                }
                if let Some(status) = query.status
                    && o.status != status
                {
                    return false;
                }
                true
            })
            .cloned()
            .collect();

        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));

        let offset = query.offset.unwrap_or(0);
        let orders = orders.into_iter().skip(offset);
        Ok(match query.limit {
            Some(limit) => orders.take(limit).collect(),
            None => orders.collect(),
        })
    }

    async fn lines_for_orders(&self, order_ids: &[OrderId]) -> Result<Vec<OrderLineRecord>> {
        let wanted: HashSet<OrderId> = order_ids.iter().copied().collect();
        let state = self.state.read().await;
        Ok(state
            .lines
            .iter()
            .filter(|l| wanted.contains(&l.order_id))
            .cloned()
            .collect())
    }

    async fn stream_order_lines(&self) -> Result<LineStream> {
        use futures_util::stream;

        let lines = self.state.read().await.lines.clone();
        Ok(Box::pin(stream::iter(lines.into_iter().map(Ok))))
    }

    async fn orders_without_lines(&self) -> Result<Vec<OrderRecord>> {
        let state = self.state.read().await;
        let with_lines: HashSet<OrderId> = state.lines.iter().map(|l| l.order_id).collect();
        let mut orders: Vec<_> = state
            .orders
            .iter()
            .filter(|o| !with_lines.contains(&o.id))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn update_status(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<StatusUpdate> {
        let mut state = self.state.write().await;
        let Some(order) = state.orders.iter_mut().find(|o| o.id == id) else {
            return Ok(StatusUpdate::Missing);
        };
        if order.status != from {
            return Ok(StatusUpdate::Conflict {
                actual: order.status,
            });
        }
        order.status = to;
        Ok(StatusUpdate::Updated(order.clone()))
    }
}

#[async_trait]
impl ProfileStore for InMemoryStore {
    async fn get_profiles(&self, ids: &[ClientId]) -> Result<Vec<Profile>> {
        let state = self.state.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.profiles.get(id).cloned())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::OrderStoreExt;
    use chrono::{Duration, Utc};
    use common::{Money, OrderLineId, Role};
    use futures_util::StreamExt;

    fn item(name: &str, quantity: u32) -> InventoryItem {
        InventoryItem {
            id: ItemId::new(),
            name: name.to_string(),
            description: String::new(),
            category: "General".to_string(),
            quantity,
            price: Money::from_cents(1000),
            minimum_stock_threshold: 1,
        }
    }

    fn order(client_id: ClientId, minutes_ago: i64) -> OrderRecord {
        OrderRecord {
            id: OrderId::new(),
            client_id,
            status: OrderStatus::Pending,
            total_amount: Money::from_cents(1000),
            shipping_address: "123 Main St".to_string(),
            created_at: Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    fn line(order_id: OrderId, item_id: ItemId) -> OrderLineRecord {
        OrderLineRecord {
            id: OrderLineId::new(),
            order_id,
            item_id,
            quantity: 1,
            unit_price: Money::from_cents(1000),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_list_items_sorted_by_name() {
        let store = InMemoryStore::new();
        store.insert_item(&item("Zebra lamp", 1)).await.unwrap();
        store.insert_item(&item("Anvil", 1)).await.unwrap();
        store.insert_item(&item("Monitor", 1)).await.unwrap();

        let names: Vec<_> = store
            .list_items()
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(names, vec!["Anvil", "Monitor", "Zebra lamp"]);
    }

    #[tokio::test]
    async fn test_duplicate_item_rejected() {
        let store = InMemoryStore::new();
        let widget = item("Widget", 1);
        store.insert_item(&widget).await.unwrap();
        let result = store.insert_item(&widget).await;
        assert!(matches!(result, Err(StoreError::Duplicate { .. })));
    }

    #[tokio::test]
    async fn test_clamp_decrement_floors_at_zero() {
        let store = InMemoryStore::new();
        let widget = item("Widget", 3);
        store.insert_item(&widget).await.unwrap();

        let outcome = store
            .decrement_quantity(widget.id, 5, DecrementMode::Clamp)
            .await
            .unwrap();
        assert_eq!(outcome, DecrementOutcome::Applied { remaining: 0 });
    }

    #[tokio::test]
    async fn test_strict_decrement_leaves_stock_untouched() {
        let store = InMemoryStore::new();
        let widget = item("Widget", 3);
        store.insert_item(&widget).await.unwrap();

        let outcome = store
            .decrement_quantity(widget.id, 5, DecrementMode::Strict)
            .await
            .unwrap();
        assert_eq!(outcome, DecrementOutcome::Insufficient { available: 3 });
        assert_eq!(store.get_item(widget.id).await.unwrap().unwrap().quantity, 3);
    }

    #[tokio::test]
    async fn test_decrement_missing_item() {
        let store = InMemoryStore::new();
        let outcome = store
            .decrement_quantity(ItemId::new(), 1, DecrementMode::Clamp)
            .await
            .unwrap();
        assert_eq!(outcome, DecrementOutcome::Missing);
    }

    #[tokio::test]
    async fn test_concurrent_decrements_do_not_lose_updates() {
        let store = InMemoryStore::new();
        let widget = item("Widget", 100);
        store.insert_item(&widget).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..40 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .decrement_quantity(widget.id, 2, DecrementMode::Clamp)
                    .await
                    .unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.get_item(widget.id).await.unwrap().unwrap().quantity, 20);
    }

    #[tokio::test]
    async fn test_injected_decrement_failures_are_transient() {
        let store = InMemoryStore::new();
        let widget = item("Widget", 5);
        store.insert_item(&widget).await.unwrap();
        store.fail_next_decrements(1).await;

        let err = store
            .decrement_quantity(widget.id, 1, DecrementMode::Strict)
            .await
            .unwrap_err();
        assert!(err.is_transient());

        let outcome = store
            .decrement_quantity(widget.id, 1, DecrementMode::Strict)
            .await
            .unwrap();
        assert_eq!(outcome, DecrementOutcome::Applied { remaining: 4 });
    }

    #[tokio::test]
    async fn test_transactional_create_order_writes_nothing_on_failure() {
        let store = InMemoryStore::new();
        store.set_fail_order_lines(true).await;

        let header = order(ClientId::new(), 0);
        let result = store
            .create_order(&header, &[line(header.id, ItemId::new())])
            .await;

        assert!(matches!(result, Err(OrderWriteError::NotWritten(_))));
        assert_eq!(store.order_count().await, 0);
        assert_eq!(store.line_count().await, 0);
    }

    #[tokio::test]
    async fn test_non_transactional_create_order_can_leave_partial_header() {
        let store = InMemoryStore::non_transactional();
        store.set_fail_order_lines(true).await;

        let header = order(ClientId::new(), 0);
        let result = store
            .create_order(&header, &[line(header.id, ItemId::new())])
            .await;

        assert!(matches!(result, Err(OrderWriteError::Partial { order_id, .. }) if order_id == header.id));
        assert_eq!(store.order_count().await, 1);
        assert_eq!(store.line_count().await, 0);

        let partial = store.orders_without_lines().await.unwrap();
        assert_eq!(partial.len(), 1);
        assert_eq!(partial[0].id, header.id);
    }

    #[tokio::test]
    async fn test_lines_require_existing_header() {
        let store = InMemoryStore::new();
        let result = store
            .insert_order_lines(&[line(OrderId::new(), ItemId::new())])
            .await;
        assert!(matches!(result, Err(StoreError::Corrupt { .. })));
    }

    #[tokio::test]
    async fn test_list_orders_newest_first_with_filters() {
        let store = InMemoryStore::new();
        let alice = ClientId::new();
        let bob = ClientId::new();

        let old = order(alice, 30);
        let new = order(alice, 1);
        let other = order(bob, 10);
        for o in [&old, &new, &other] {
            store.insert_order(o).await.unwrap();
        }

        let all = store.list_orders(OrderQuery::new()).await.unwrap();
        assert_eq!(
            all.iter().map(|o| o.id).collect::<Vec<_>>(),
            vec![new.id, other.id, old.id]
        );

        let alices = store.list_orders(OrderQuery::for_client(alice)).await.unwrap();
        assert_eq!(alices.len(), 2);
        assert_eq!(alices[0].id, new.id);

        let page = store
            .list_orders(OrderQuery::new().offset(1).limit(1))
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].id, other.id);
    }

    #[tokio::test]
    async fn test_update_status_is_compare_and_set() {
        let store = InMemoryStore::new();
        let header = order(ClientId::new(), 0);
        store.insert_order(&header).await.unwrap();

        let updated = store
            .update_status(header.id, OrderStatus::Pending, OrderStatus::Confirmed)
            .await
            .unwrap();
        assert!(matches!(updated, StatusUpdate::Updated(ref o) if o.status == OrderStatus::Confirmed));

        let stale = store
            .update_status(header.id, OrderStatus::Pending, OrderStatus::Cancelled)
            .await
            .unwrap();
        assert_eq!(
            stale,
            StatusUpdate::Conflict {
                actual: OrderStatus::Confirmed
            }
        );

        let missing = store
            .update_status(OrderId::new(), OrderStatus::Pending, OrderStatus::Confirmed)
            .await
            .unwrap();
        assert_eq!(missing, StatusUpdate::Missing);
    }

    #[tokio::test]
    async fn test_stream_and_lines_for_order() {
        let store = InMemoryStore::new();
        let header = order(ClientId::new(), 0);
        let item_id = ItemId::new();
        store
            .create_order(&header, &[line(header.id, item_id), line(header.id, item_id)])
            .await
            .unwrap();

        assert_eq!(store.lines_for_order(header.id).await.unwrap().len(), 2);
        assert!(store.order_exists(header.id).await.unwrap());

        let streamed: Vec<_> = store.stream_order_lines().await.unwrap().collect().await;
        assert_eq!(streamed.len(), 2);
        assert!(streamed.iter().all(|l| l.is_ok()));
    }

    #[tokio::test]
    async fn test_profiles_lookup_skips_unknown_ids() {
        let store = InMemoryStore::new();
        let id = ClientId::new();
        store
            .put_profile(Profile {
                id,
                email: "ana@example.com".to_string(),
                full_name: None,
                role: Role::Client,
            })
            .await;

        let profiles = store.get_profiles(&[id, ClientId::new()]).await.unwrap();
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].id, id);
    }
}
