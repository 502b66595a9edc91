use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::{
    FulfillmentCommit, Money, Order, OrderId, Product, ProductId, Result, ShipmentLine,
    ShipmentLineId, StoreError, Warehouse, WarehouseId, store::WarehouseStore,
};

const UNIQUE_SHIPMENT_PER_ORDER: &str = "unique_shipment_per_order";

/// PostgreSQL-backed warehouse store.
///
/// Prices are `NUMERIC(25, 2)` columns; they cross the boundary as integer
/// cents so no floating point is involved.
#[derive(Clone)]
pub struct PostgresWarehouseStore {
    pool: PgPool,
}

impl PostgresWarehouseStore {
    /// Creates a new PostgreSQL warehouse store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
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

    fn row_to_order(row: PgRow) -> Result<Order> {
        Ok(Order {
            id: OrderId::new(row.try_get("id_order")?),
            product_id: ProductId::new(row.try_get("id_product")?),
            amount: row.try_get("amount")?,
            created_at: row.try_get("created_at")?,
            fulfilled_at: row.try_get("fulfilled_at")?,
        })
    }

    fn row_to_shipment_line(row: PgRow) -> Result<ShipmentLine> {
        Ok(ShipmentLine {
            id: ShipmentLineId::new(row.try_get("id_product_warehouse")?),
            warehouse_id: WarehouseId::new(row.try_get("id_warehouse")?),
            product_id: ProductId::new(row.try_get("id_product")?),
            order_id: OrderId::new(row.try_get("id_order")?),
            amount: row.try_get("amount")?,
            price: Money::from_cents(row.try_get("price_cents")?),
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl WarehouseStore for PostgresWarehouseStore {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        let row: Option<PgRow> = sqlx::query(
            r#"
            SELECT id_product, ROUND(price * 100)::BIGINT AS price_cents
            FROM product
            WHERE id_product = $1
            "#,
        )
        .bind(id.as_i32())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(Product {
                id: ProductId::new(row.try_get("id_product")?),
                price: Money::from_cents(row.try_get("price_cents")?),
            })),
            None => Ok(None),
        }
    }

    async fn get_warehouse(&self, id: WarehouseId) -> Result<Option<Warehouse>> {
        let found: Option<i32> =
            sqlx::query_scalar("SELECT id_warehouse FROM warehouse WHERE id_warehouse = $1")
                .bind(id.as_i32())
                .fetch_optional(&self.pool)
                .await?;

        Ok(found.map(Warehouse::new))
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        let row: Option<PgRow> = sqlx::query(
            r#"
            SELECT id_order, id_product, amount, created_at, fulfilled_at
            FROM "order"
            WHERE id_order = $1
            "#,
        )
        .bind(id.as_i32())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn find_order_by_product_and_amount(
        &self,
        product_id: ProductId,
        amount: i32,
    ) -> Result<Option<Order>> {
        let row: Option<PgRow> = sqlx::query(
            r#"
            SELECT o.id_order, o.id_product, o.amount, o.created_at, o.fulfilled_at
            FROM "order" o
            WHERE o.id_product = $1 AND o.amount = $2
            ORDER BY
                EXISTS (SELECT 1 FROM product_warehouse pw WHERE pw.id_order = o.id_order) ASC,
                o.id_order ASC
            LIMIT 1
            "#,
        )
        .bind(product_id.as_i32())
        .bind(amount)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn get_shipment_line_by_order(&self, order_id: OrderId) -> Result<Option<ShipmentLine>> {
        let row: Option<PgRow> = sqlx::query(
            r#"
            SELECT id_product_warehouse, id_warehouse, id_product, id_order, amount,
                   ROUND(price * 100)::BIGINT AS price_cents, created_at
            FROM product_warehouse
            WHERE id_order = $1
            "#,
        )
        .bind(order_id.as_i32())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_shipment_line).transpose()
    }

    async fn get_shipment_line(&self, id: ShipmentLineId) -> Result<Option<ShipmentLine>> {
        let row: Option<PgRow> = sqlx::query(
            r#"
            SELECT id_product_warehouse, id_warehouse, id_product, id_order, amount,
                   ROUND(price * 100)::BIGINT AS price_cents, created_at
            FROM product_warehouse
            WHERE id_product_warehouse = $1
            "#,
        )
        .bind(id.as_i32())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_shipment_line).transpose()
    }

    #[tracing::instrument(skip(self), fields(order_id = %commit.order_id))]
    async fn commit_fulfillment(&self, commit: FulfillmentCommit) -> Result<ShipmentLineId> {
        let order_id = commit.order_id;

        // Dropping `tx` on any early return (or cancellation) rolls it back.
        let mut tx = self.pool.begin().await?;

        // The row lock taken here serializes concurrent commits for one order;
        // the loser re-evaluates the predicate after the winner commits.
        let updated = sqlx::query(
            r#"
            UPDATE "order"
            SET fulfilled_at = $1
            WHERE id_order = $2 AND fulfilled_at IS NULL
            "#,
        )
        .bind(commit.created_at)
        .bind(order_id.as_i32())
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(StoreError::AlreadyFulfilled(order_id));
        }

        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO product_warehouse (id_warehouse, id_product, id_order, amount, price, created_at)
            VALUES ($1, $2, $3, $4, $5::BIGINT / 100.0, $6)
            RETURNING id_product_warehouse
            "#,
        )
        .bind(commit.warehouse_id.as_i32())
        .bind(commit.product_id.as_i32())
        .bind(order_id.as_i32())
        .bind(commit.amount)
        .bind(commit.price.cents())
        .bind(commit.created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some(UNIQUE_SHIPMENT_PER_ORDER)
            {
                return StoreError::AlreadyFulfilled(order_id);
            }
            StoreError::Database(e)
        })?;

        tx.commit().await?;
        tracing::debug!(shipment_line_id = id, "fulfillment committed");
        Ok(ShipmentLineId::new(id))
    }
}
