use common::{ItemId, Money};
use store::{
    DecrementMode, DecrementOutcome, InventoryItem, InventoryItemPatch, InventoryStore,
    NewInventoryItem,
};

use crate::error::DomainError;
use crate::retry::RetryPolicy;

use super::{StockOutcome, StockPolicy, StockRequest};

/// Item records and quantity on hand.
///
/// Order code changes quantities only through the decrement operations, each
/// of which is a single atomic update in the store.
#[derive(Clone)]
pub struct InventoryLedger<S: InventoryStore> {
    store: S,
    retry: RetryPolicy,
}

impl<S: InventoryStore> InventoryLedger<S> {
    /// Creates a ledger with the default retry policy.
    pub fn new(store: S) -> Self {
        Self {
            store,
            retry: RetryPolicy::default(),
        }
    }

    /// Replaces the retry policy used by batch decrements.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns every item ordered by name.
    #[tracing::instrument(skip(self))]
    pub async fn get_all(&self) -> Result<Vec<InventoryItem>, DomainError> {
        Ok(self.store.list_items().await?)
    }

    /// Returns one item.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, id: ItemId) -> Result<InventoryItem, DomainError> {
        self.store
            .get_item(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Item", id))
    }

    /// Validates and inserts a new item.
    #[tracing::instrument(skip(self, new_item), fields(name = %new_item.name))]
    pub async fn create(&self, new_item: NewInventoryItem) -> Result<InventoryItem, DomainError> {
        let item = validate_new(new_item)?;
        self.store.insert_item(&item).await?;
        tracing::info!(item_id = %item.id, "Inventory item created");
        Ok(item)
    }

    /// Applies a partial update in one store write.
    #[tracing::instrument(skip(self, patch))]
    pub async fn update(
        &self,
        id: ItemId,
        patch: InventoryItemPatch,
    ) -> Result<InventoryItem, DomainError> {
        let patch = validate_patch(patch)?;
        if patch.is_empty() {
            return self.get(id).await;
        }

        self.store
            .update_item(id, &patch)
            .await?
            .ok_or_else(|| DomainError::not_found("Item", id))
    }

    /// Deletes an item. Existing order lines keep pointing at the old id.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: ItemId) -> Result<(), DomainError> {
        if self.store.delete_item(id).await? {
            tracing::info!(item_id = %id, "Inventory item deleted");
            Ok(())
        } else {
            Err(DomainError::not_found("Item", id))
        }
    }

    /// Decrements stock, flooring at zero. Returns the new quantity.
    #[tracing::instrument(skip(self))]
    pub async fn decrement(&self, id: ItemId, amount: u32) -> Result<u32, DomainError> {
        self.decrement_once(id, amount, DecrementMode::Clamp).await
    }

    /// Decrements stock only if enough is on hand. Returns the new quantity.
    #[tracing::instrument(skip(self))]
    pub async fn decrement_strict(&self, id: ItemId, amount: u32) -> Result<u32, DomainError> {
        self.decrement_once(id, amount, DecrementMode::Strict).await
    }

    async fn decrement_once(
        &self,
        id: ItemId,
        amount: u32,
        mode: DecrementMode,
    ) -> Result<u32, DomainError> {
        if amount == 0 {
            return Err(DomainError::Validation(
                "Decrement quantity must be at least 1".to_string(),
            ));
        }

        match self.store.decrement_quantity(id, amount, mode).await? {
            DecrementOutcome::Applied { remaining } => {
                metrics::counter!("stock_decrements_total", "outcome" => "applied").increment(1);
                Ok(remaining)
            }
            DecrementOutcome::Insufficient { available } => {
                metrics::counter!("stock_oversold_total").increment(1);
                Err(DomainError::InsufficientStock {
                    item_id: id,
                    requested: amount,
                    available,
                })
            }
            DecrementOutcome::Missing => Err(DomainError::not_found("Item", id)),
        }
    }

    /// Decrements each requested item independently.
    ///
    /// Transient store failures are retried with backoff. One item failing
    /// never affects the others, and nothing is rolled back.
    #[tracing::instrument(skip(self, requests), fields(count = requests.len()))]
    pub async fn decrement_batch(
        &self,
        requests: &[StockRequest],
        policy: StockPolicy,
    ) -> Vec<StockOutcome> {
        let mut outcomes = Vec::with_capacity(requests.len());

        for request in requests {
            let outcome = self.decrement_with_retry(*request, policy.mode()).await;
            metrics::counter!("stock_decrements_total", "outcome" => outcome.label()).increment(1);

            match &outcome {
                StockOutcome::Applied { .. } => {}
                StockOutcome::Oversold {
                    item_id,
                    requested,
                    available,
                } => {
                    metrics::counter!("stock_oversold_total").increment(1);
                    tracing::warn!(%item_id, requested, available, "Decrement refused, stock too low");
                }
                StockOutcome::Missing { item_id } => {
                    tracing::warn!(%item_id, "Decrement skipped, item no longer exists");
                }
                StockOutcome::Failed { item_id, error } => {
                    tracing::error!(%item_id, %error, "Decrement failed after retries");
                }
            }

            outcomes.push(outcome);
        }

        outcomes
    }

    async fn decrement_with_retry(&self, request: StockRequest, mode: DecrementMode) -> StockOutcome {
        let item_id = request.item_id;
        if request.quantity == 0 {
            return StockOutcome::Failed {
                item_id,
                error: "quantity must be at least 1".to_string(),
            };
        }

        let result = self
            .retry
            .run(|| self.store.decrement_quantity(item_id, request.quantity, mode))
            .await;

        match result {
            Ok(DecrementOutcome::Applied { remaining }) => StockOutcome::Applied { item_id, remaining },
            Ok(DecrementOutcome::Insufficient { available }) => StockOutcome::Oversold {
                item_id,
                requested: request.quantity,
                available,
            },
            Ok(DecrementOutcome::Missing) => StockOutcome::Missing { item_id },
            Err(e) => StockOutcome::Failed {
                item_id,
                error: e.to_string(),
            },
        }
    }
}

fn non_blank(field: &str, value: &str) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::Validation(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}

/// Counts are stored in `INTEGER` columns.
const MAX_COUNT: u32 = i32::MAX as u32;

fn count(field: &str, value: i64) -> Result<u32, DomainError> {
    u32::try_from(value)
        .ok()
        .filter(|v| *v <= MAX_COUNT)
        .ok_or_else(|| DomainError::Validation(format!("{field} must be between 0 and {MAX_COUNT}")))
}

fn price(value: Money) -> Result<Money, DomainError> {
    if value.is_negative() {
        return Err(DomainError::Validation("price must not be negative".to_string()));
    }
    if value > Money::MAX_PRICE {
        return Err(DomainError::Validation(format!(
            "price must not exceed {}",
            Money::MAX_PRICE
        )));
    }
    Ok(value)
}

fn validate_new(fields: NewInventoryItem) -> Result<InventoryItem, DomainError> {
    Ok(InventoryItem {
        id: ItemId::new(),
        name: non_blank("name", &fields.name)?,
        description: fields.description.trim().to_string(),
        category: non_blank("category", &fields.category)?,
        quantity: count("quantity", fields.quantity)?,
        price: price(fields.price)?,
        minimum_stock_threshold: count("minimum_stock_threshold", fields.minimum_stock_threshold)?,
    })
}

fn validate_patch(mut patch: InventoryItemPatch) -> Result<InventoryItemPatch, DomainError> {
    if let Some(name) = &patch.name {
        patch.name = Some(non_blank("name", name)?);
    }
    if let Some(category) = &patch.category {
        patch.category = Some(non_blank("category", category)?);
    }
    if let Some(value) = patch.price {
        price(value)?;
    }
    if let Some(value) = patch.quantity {
        count("quantity", i64::from(value))?;
    }
    if let Some(value) = patch.minimum_stock_threshold {
        count("minimum_stock_threshold", i64::from(value))?;
    }
    Ok(patch)
}
