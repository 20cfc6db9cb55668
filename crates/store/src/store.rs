use std::pin::Pin;

use async_trait::async_trait;
use common::{ClientId, ItemId, OrderId, OrderStatus};
use futures_core::Stream;

use crate::{
    InventoryItem, InventoryItemPatch, OrderLineRecord, OrderQuery, OrderRecord, OrderWriteError,
    Profile, Result,
};

/// How a decrement behaves when the requested amount exceeds the stock on hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecrementMode {
    /// Floor the quantity at zero.
    Clamp,
    /// Refuse the decrement and leave the quantity unchanged.
    #[default]
    Strict,
}

/// Result of a single atomic decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecrementOutcome {
    /// The decrement was applied; `remaining` is the new quantity.
    Applied { remaining: u32 },
    /// Strict mode only: the quantity was left at `available`.
    Insufficient { available: u32 },
    /// No item with that id exists.
    Missing,
}

/// Result of a compare-and-set status write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusUpdate {
    /// The status was changed; carries the updated header.
    Updated(OrderRecord),
    /// No order with that id exists.
    Missing,
    /// The order was not in the expected status.
    Conflict { actual: OrderStatus },
}

/// A stream of order lines.
pub type LineStream = Pin<Box<dyn Stream<Item = Result<OrderLineRecord>> + Send>>;

/// Storage for `inventory_items`.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Returns every item ordered by name ascending.
    async fn list_items(&self) -> Result<Vec<InventoryItem>>;

    /// Returns an item by id.
    async fn get_item(&self, id: ItemId) -> Result<Option<InventoryItem>>;

    /// Inserts a new item.
    async fn insert_item(&self, item: &InventoryItem) -> Result<()>;

    /// Applies a partial update in one atomic write.
    ///
    /// Returns the updated item, or `None` if it doesn't exist.
    async fn update_item(
        &self,
        id: ItemId,
        patch: &InventoryItemPatch,
    ) -> Result<Option<InventoryItem>>;

    /// Deletes an item. Returns false if it didn't exist.
    async fn delete_item(&self, id: ItemId) -> Result<bool>;

    /// Decrements the quantity of one item as a single read-modify-write.
    ///
    /// Concurrent decrements of the same item must never lose updates.
    async fn decrement_quantity(
        &self,
        id: ItemId,
        amount: u32,
        mode: DecrementMode,
    ) -> Result<DecrementOutcome>;
}

/// Storage for `orders` and `order_items`.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Inserts an order header.
    async fn insert_order(&self, order: &OrderRecord) -> Result<()>;

    /// Inserts order lines. The header must already exist.
    async fn insert_order_lines(&self, lines: &[OrderLineRecord]) -> Result<()>;

    /// Writes a header and its lines.
    ///
    /// The default writes the header first and the lines second, so a failure
    /// in between leaves a header without lines. Transactional backends
    /// override this to write both or nothing.
    async fn create_order(
        &self,
        order: &OrderRecord,
        lines: &[OrderLineRecord],
    ) -> std::result::Result<(), OrderWriteError> {
        self.insert_order(order)
            .await
            .map_err(OrderWriteError::NotWritten)?;

        self.insert_order_lines(lines)
            .await
            .map_err(|source| OrderWriteError::Partial {
                order_id: order.id,
                source,
            })
    }

    /// Returns an order header by id.
    async fn get_order(&self, id: OrderId) -> Result<Option<OrderRecord>>;

    /// Returns order headers matching a query, newest first.
    async fn list_orders(&self, query: OrderQuery) -> Result<Vec<OrderRecord>>;

    /// Returns all lines belonging to any of the given orders.
    async fn lines_for_orders(&self, order_ids: &[OrderId]) -> Result<Vec<OrderLineRecord>>;

    /// Streams every order line in the store.
    async fn stream_order_lines(&self) -> Result<LineStream>;

    /// Returns headers that have no lines at all, newest first.
    async fn orders_without_lines(&self) -> Result<Vec<OrderRecord>>;

    /// Sets the status to `to` only if it is currently `from`.
    async fn update_status(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<StatusUpdate>;
}

/// Read access to `profiles`.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Returns the profiles that exist among the given ids.
    async fn get_profiles(&self, ids: &[ClientId]) -> Result<Vec<Profile>>;
}

/// Extension trait providing convenience methods for order stores.
#[async_trait]
pub trait OrderStoreExt: OrderStore {
    /// Returns the lines of a single order.
    async fn lines_for_order(&self, order_id: OrderId) -> Result<Vec<OrderLineRecord>> {
        self.lines_for_orders(&[order_id]).await
    }

    /// Checks if an order header exists.
    async fn order_exists(&self, order_id: OrderId) -> Result<bool> {
        Ok(self.get_order(order_id).await?.is_some())
    }
}

// Blanket implementation for all OrderStore implementations
impl<T: OrderStore + ?Sized> OrderStoreExt for T {}

/// Everything the services need from one backend.
pub trait Store: InventoryStore + OrderStore + ProfileStore + Clone + 'static {}

impl<T> Store for T where T: InventoryStore + OrderStore + ProfileStore + Clone + 'static {}
