use async_trait::async_trait;
use common::{ClientId, ItemId, Money, OrderId, OrderLineId, OrderStatus, Role};
use sqlx::{
    PgPool, Postgres, Row, Transaction,
    postgres::{PgPoolOptions, PgRow},
};
use uuid::Uuid;

use crate::{
    InventoryItem, InventoryItemPatch, OrderLineRecord, OrderQuery, OrderRecord, OrderWriteError,
    Profile, Result, StoreError,
    store::{
        DecrementMode, DecrementOutcome, InventoryStore, LineStream, OrderStore, ProfileStore,
        StatusUpdate,
    },
};

const ITEM_COLUMNS: &str =
    "id, name, description, category, quantity, price_cents, minimum_stock_threshold";
const ORDER_COLUMNS: &str =
    "id, client_id, status, total_amount_cents, shipping_address, created_at";
const LINE_COLUMNS: &str = "id, order_id, item_id, quantity, unit_price_cents, created_at";

/// PostgreSQL-backed store implementation.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a pool against `url`.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_item(row: PgRow) -> Result<InventoryItem> {
        Ok(InventoryItem {
            id: ItemId::from_uuid(row.try_get::<Uuid, _>("id")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            category: row.try_get("category")?,
            quantity: non_negative("inventory_items", row.try_get("quantity")?)?,
            price: Money::from_cents(row.try_get("price_cents")?),
            minimum_stock_threshold: non_negative(
                "inventory_items",
                row.try_get("minimum_stock_threshold")?,
            )?,
        })
    }

    fn row_to_order(row: PgRow) -> Result<OrderRecord> {
        let status: String = row.try_get("status")?;
        let status = status.parse::<OrderStatus>().map_err(|e| StoreError::Corrupt {
            table: "orders",
            reason: e.to_string(),
        })?;

        Ok(OrderRecord {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            client_id: ClientId::from_uuid(row.try_get::<Uuid, _>("client_id")?),
            status,
            total_amount: Money::from_cents(row.try_get("total_amount_cents")?),
            shipping_address: row.try_get("shipping_address")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_line(row: PgRow) -> Result<OrderLineRecord> {
        Ok(OrderLineRecord {
            id: OrderLineId::from_uuid(row.try_get::<Uuid, _>("id")?),
            order_id: OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?),
            item_id: ItemId::from_uuid(row.try_get::<Uuid, _>("item_id")?),
            quantity: non_negative("order_items", row.try_get("quantity")?)?,
            unit_price: Money::from_cents(row.try_get("unit_price_cents")?),
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_profile(row: PgRow) -> Result<Profile> {
        let role: String = row.try_get("role")?;
        Ok(Profile {
            id: ClientId::from_uuid(row.try_get::<Uuid, _>("id")?),
            email: row.try_get("email")?,
            full_name: row.try_get("full_name")?,
            role: role.parse::<Role>().unwrap_or_default(),
        })
    }

    async fn insert_order_tx(tx: &mut Transaction<'_, Postgres>, order: &OrderRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO orders (id, client_id, status, total_amount_cents, shipping_address, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.client_id.as_uuid())
        .bind(order.status.as_str())
        .bind(order.total_amount.cents())
        .bind(&order.shipping_address)
        .bind(order.created_at)
        .execute(&mut **tx)
        .await
        .map_err(|e| duplicate_or("orders", order.id.to_string(), e))?;
        Ok(())
    }

    async fn insert_lines_tx(
        tx: &mut Transaction<'_, Postgres>,
        lines: &[OrderLineRecord],
    ) -> Result<()> {
        for line in lines {
            sqlx::query(
                r#"
                INSERT INTO order_items (id, order_id, item_id, quantity, unit_price_cents, created_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(line.id.as_uuid())
            .bind(line.order_id.as_uuid())
            .bind(line.item_id.as_uuid())
            .bind(to_i32("order_items", line.quantity)?)
            .bind(line.unit_price.cents())
            .bind(line.created_at)
            .execute(&mut **tx)
            .await
            .map_err(|e| duplicate_or("order_items", line.id.to_string(), e))?;
        }
        Ok(())
    }
}

fn non_negative(table: &'static str, value: i32) -> Result<u32> {
    u32::try_from(value).map_err(|_| StoreError::Corrupt {
        table,
        reason: format!("negative quantity {value}"),
    })
}

fn to_i32(table: &'static str, value: u32) -> Result<i32> {
    i32::try_from(value).map_err(|_| StoreError::Corrupt {
        table,
        reason: format!("quantity {value} out of range"),
    })
}

fn duplicate_or(table: &'static str, id: String, e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return StoreError::Duplicate { table, id };
    }
    StoreError::Database(e)
}

#[async_trait]
impl InventoryStore for PostgresStore {
    async fn list_items(&self) -> Result<Vec<InventoryItem>> {
        let rows = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM inventory_items ORDER BY name ASC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_item).collect()
    }

    async fn get_item(&self, id: ItemId) -> Result<Option<InventoryItem>> {
        let row = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM inventory_items WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_item).transpose()
    }

    async fn insert_item(&self, item: &InventoryItem) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO inventory_items
                (id, name, description, category, quantity, price_cents, minimum_stock_threshold)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(item.id.as_uuid())
        .bind(&item.name)
        .bind(&item.description)
        .bind(&item.category)
        .bind(to_i32("inventory_items", item.quantity)?)
        .bind(item.price.cents())
        .bind(to_i32("inventory_items", item.minimum_stock_threshold)?)
        .execute(&self.pool)
        .await
        .map_err(|e| duplicate_or("inventory_items", item.id.to_string(), e))?;

        Ok(())
    }

    async fn update_item(
        &self,
        id: ItemId,
        patch: &InventoryItemPatch,
    ) -> Result<Option<InventoryItem>> {
        let quantity = patch
            .quantity
            .map(|q| to_i32("inventory_items", q))
            .transpose()?;
        let threshold = patch
            .minimum_stock_threshold
            .map(|t| to_i32("inventory_items", t))
            .transpose()?;

        let row = sqlx::query(&format!(
            r#"
            UPDATE inventory_items SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                category = COALESCE($4, category),
                quantity = COALESCE($5, quantity),
                price_cents = COALESCE($6, price_cents),
                minimum_stock_threshold = COALESCE($7, minimum_stock_threshold)
            WHERE id = $1
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(id.as_uuid())
        .bind(patch.name.as_deref())
        .bind(patch.description.as_deref())
        .bind(patch.category.as_deref())
        .bind(quantity)
        .bind(patch.price.map(|p| p.cents()))
        .bind(threshold)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_item).transpose()
    }

    async fn delete_item(&self, id: ItemId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM inventory_items WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn decrement_quantity(
        &self,
        id: ItemId,
        amount: u32,
        mode: DecrementMode,
    ) -> Result<DecrementOutcome> {
        let amount = to_i32("inventory_items", amount)?;

        // Single-statement updates; the row lock serializes concurrent callers.
        let remaining: Option<i32> = match mode {
            DecrementMode::Clamp => {
                sqlx::query_scalar(
                    r#"
                    UPDATE inventory_items SET quantity = GREATEST(quantity - $2, 0)
                    WHERE id = $1
                    RETURNING quantity
                    "#,
                )
                .bind(id.as_uuid())
                .bind(amount)
                .fetch_optional(&self.pool)
                .await?
            }
            DecrementMode::Strict => {
                sqlx::query_scalar(
                    r#"
                    UPDATE inventory_items SET quantity = quantity - $2
                    WHERE id = $1 AND quantity >= $2
                    RETURNING quantity
                    "#,
                )
                .bind(id.as_uuid())
                .bind(amount)
                .fetch_optional(&self.pool)
                .await?
            }
        };

        if let Some(remaining) = remaining {
            return Ok(DecrementOutcome::Applied {
                remaining: non_negative("inventory_items", remaining)?,
            });
        }

        let available: Option<i32> =
            sqlx::query_scalar("SELECT quantity FROM inventory_items WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await?;

        match available {
            Some(available) => Ok(DecrementOutcome::Insufficient {
                available: non_negative("inventory_items", available)?,
            }),
            None => Ok(DecrementOutcome::Missing),
        }
    }
}

#[async_trait]
impl OrderStore for PostgresStore {
    async fn insert_order(&self, order: &OrderRecord) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        Self::insert_order_tx(&mut tx, order).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn insert_order_lines(&self, lines: &[OrderLineRecord]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        Self::insert_lines_tx(&mut tx, lines).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn create_order(
        &self,
        order: &OrderRecord,
        lines: &[OrderLineRecord],
    ) -> std::result::Result<(), OrderWriteError> {
        let write = async {
            let mut tx = self.pool.begin().await?;
            Self::insert_order_tx(&mut tx, order).await?;
            Self::insert_lines_tx(&mut tx, lines).await?;
            tx.commit().await?;
            Ok::<_, StoreError>(())
        };

        write.await.map_err(OrderWriteError::NotWritten)
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<OrderRecord>> {
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn list_orders(&self, query: OrderQuery) -> Result<Vec<OrderRecord>> {
        let mut sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE 1=1");
        let mut param_count = 0;

        if query.client_id.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND client_id = ${param_count}"));
        }
        if query.status.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND status = ${param_count}"));
        }

        sql.push_str(" ORDER BY created_at DESC, id ASC");

        if query.limit.is_some() {
            param_count += 1;
            sql.push_str(&format!(" LIMIT ${param_count}"));
        }
        if query.offset.is_some() {
            param_count += 1;
            sql.push_str(&format!(" OFFSET ${param_count}"));
        }

        let mut sqlx_query = sqlx::query(&sql);

        if let Some(client_id) = query.client_id {
            sqlx_query = sqlx_query.bind(client_id.as_uuid());
        }
        if let Some(status) = query.status {
            sqlx_query = sqlx_query.bind(status.as_str());
        }
        if let Some(limit) = query.limit {
            sqlx_query = sqlx_query.bind(limit as i64);
        }
        if let Some(offset) = query.offset {
            sqlx_query = sqlx_query.bind(offset as i64);
        }

        let rows = sqlx_query.fetch_all(&self.pool).await?;
        rows.into_iter().map(Self::row_to_order).collect()
    }

    async fn lines_for_orders(&self, order_ids: &[OrderId]) -> Result<Vec<OrderLineRecord>> {
        if order_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(&format!(
            "SELECT {LINE_COLUMNS} FROM order_items WHERE order_id = ANY($1) ORDER BY created_at ASC, id ASC"
        ))
        .bind(order_ids.iter().map(OrderId::as_uuid).collect::<Vec<Uuid>>())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_line).collect()
    }

    async fn stream_order_lines(&self) -> Result<LineStream> {
        use futures_util::StreamExt;

        let stream = sqlx::query(
            r#"
            SELECT id, order_id, item_id, quantity, unit_price_cents, created_at
            FROM order_items
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .fetch(&self.pool)
        .map(|result| match result {
            Ok(row) => Self::row_to_line(row),
            Err(e) => Err(StoreError::Database(e)),
        });

        Ok(Box::pin(stream))
    }

    async fn orders_without_lines(&self) -> Result<Vec<OrderRecord>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {ORDER_COLUMNS} FROM orders o
            WHERE NOT EXISTS (SELECT 1 FROM order_items l WHERE l.order_id = o.id)
            ORDER BY created_at DESC
            "#
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }

    async fn update_status(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<StatusUpdate> {
        let row = sqlx::query(&format!(
            "UPDATE orders SET status = $3 WHERE id = $1 AND status = $2 RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .bind(from.as_str())
        .bind(to.as_str())
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = row {
            return Ok(StatusUpdate::Updated(Self::row_to_order(row)?));
        }

        match self.get_order(id).await? {
            Some(order) => Ok(StatusUpdate::Conflict {
                actual: order.status,
            }),
            None => Ok(StatusUpdate::Missing),
        }
    }
}

#[async_trait]
impl ProfileStore for PostgresStore {
    async fn get_profiles(&self, ids: &[ClientId]) -> Result<Vec<Profile>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows =
            sqlx::query("SELECT id, email, full_name, role FROM profiles WHERE id = ANY($1)")
                .bind(ids.iter().map(ClientId::as_uuid).collect::<Vec<Uuid>>())
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(Self::row_to_profile).collect()
    }
}
