use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{OrderId, ProductId, UserId};
use domain::{
    BillingInfo, Cart, CartItem, Money, Order, OrderItem, OrderStatus, PaymentMethod, Product,
    StockChange, StockHistoryEntry,
};
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow, types::Json};
use uuid::Uuid;

use crate::{
    Result, StoreError,
    store::{Store, StoreTx},
};

/// PostgreSQL-backed store implementation.
///
/// Each [`StoreTx`] wraps one `sqlx` transaction; product reads lock the
/// row with `FOR UPDATE`, so the stock-sufficiency check and the
/// decrement that follows it are atomic with respect to concurrent
/// checkouts of the same product.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }
}

#[async_trait]
impl Store for PostgresStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PostgresTx { tx }))
    }
}

struct PostgresTx {
    tx: Transaction<'static, Postgres>,
}

fn row_to_product(row: PgRow) -> Result<Product> {
    Ok(Product {
        id: ProductId::from_uuid(row.try_get::<Uuid, _>("id")?),
        name: row.try_get("name")?,
        price: Money::from_cents(row.try_get("price_cents")?),
        current_stock: row.try_get::<i64, _>("current_stock")? as u32,
        min_stock: row.try_get::<i64, _>("min_stock")? as u32,
    })
}

fn row_to_order(row: PgRow) -> Result<Order> {
    let payment_method: PaymentMethod = row
        .try_get::<String, _>("payment_method")?
        .parse()
        .map_err(|e: domain::InvalidPaymentMethod| StoreError::Decode(e.to_string()))?;
    let status: OrderStatus = row
        .try_get::<String, _>("status")?
        .parse()
        .map_err(|e: domain::InvalidStatus| StoreError::Decode(e.to_string()))?;

    Ok(Order::from_parts(
        OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
        UserId::new(row.try_get::<String, _>("user_id")?),
        row.try_get::<Json<Vec<OrderItem>>, _>("items")?.0,
        Money::from_cents(row.try_get("total_cents")?),
        BillingInfo {
            full_name: row.try_get("full_name")?,
            email: row.try_get("email")?,
        },
        row.try_get("shipping_address")?,
        payment_method,
        status,
        row.try_get::<DateTime<Utc>, _>("created_at")?,
    ))
}

fn row_to_history(row: PgRow) -> Result<StockHistoryEntry> {
    let change: StockChange = row
        .try_get::<String, _>("change_type")?
        .parse()
        .map_err(StoreError::Decode)?;

    Ok(StockHistoryEntry {
        id: row.try_get("id")?,
        product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
        change,
        quantity: row.try_get::<i64, _>("quantity")? as u32,
        previous_stock: row.try_get::<i64, _>("previous_stock")? as u32,
        new_stock: row.try_get::<i64, _>("new_stock")? as u32,
        notes: row.try_get("notes")?,
        performed_by: UserId::new(row.try_get::<String, _>("performed_by")?),
        recorded_at: row.try_get::<DateTime<Utc>, _>("recorded_at")?,
    })
}

const PRODUCT_COLUMNS: &str = "id, name, price_cents, current_stock, min_stock";
const ORDER_COLUMNS: &str = "id, user_id, items, total_cents, full_name, email, \
                             shipping_address, payment_method, status, created_at";

#[async_trait]
impl StoreTx for PostgresTx {
    async fn product(&mut self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(row_to_product).transpose()
    }

    async fn save_product(&mut self, product: &Product) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, price_cents, current_stock, min_stock)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                price_cents = EXCLUDED.price_cents,
                current_stock = EXCLUDED.current_stock,
                min_stock = EXCLUDED.min_stock
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(product.price.cents())
        .bind(product.current_stock as i64)
        .bind(product.min_stock as i64)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn products(&mut self) -> Result<Vec<Product>> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name ASC"
        ))
        .fetch_all(&mut *self.tx)
        .await?;

        rows.into_iter().map(row_to_product).collect()
    }

    async fn low_stock_products(&mut self) -> Result<Vec<Product>> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE current_stock <= min_stock ORDER BY name ASC"
        ))
        .fetch_all(&mut *self.tx)
        .await?;

        rows.into_iter().map(row_to_product).collect()
    }

    async fn cart(&mut self, user: &UserId) -> Result<Option<Cart>> {
        let row = sqlx::query("SELECT user_id, items FROM carts WHERE user_id = $1")
            .bind(user.as_str())
            .fetch_optional(&mut *self.tx)
            .await?;

        match row {
            Some(row) => {
                let items = row.try_get::<Json<Vec<CartItem>>, _>("items")?.0;
                Ok(Some(Cart::from_parts(
                    UserId::new(row.try_get::<String, _>("user_id")?),
                    items,
                )))
            }
            None => Ok(None),
        }
    }

    async fn save_cart(&mut self, cart: &Cart) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO carts (user_id, items)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE SET items = EXCLUDED.items
            "#,
        )
        .bind(cart.user().as_str())
        .bind(Json(cart.items()))
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn order(&mut self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await?;

        row.map(row_to_order).transpose()
    }

    async fn save_order(&mut self, order: &Order) -> Result<()> {
        // Only the status is mutable after creation.
        sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, items, total_cents, full_name, email,
                                shipping_address, payment_method, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (id) DO UPDATE SET status = EXCLUDED.status
            "#,
        )
        .bind(order.id().as_uuid())
        .bind(order.user().as_str())
        .bind(Json(order.items()))
        .bind(order.total_price().cents())
        .bind(&order.billing().full_name)
        .bind(&order.billing().email)
        .bind(order.shipping_address())
        .bind(order.payment_method().as_str())
        .bind(order.status().as_str())
        .bind(order.created_at())
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn orders_for_user(&mut self, user: &UserId) -> Result<Vec<Order>> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders \
             WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user.as_str())
        .fetch_all(&mut *self.tx)
        .await?;

        rows.into_iter().map(row_to_order).collect()
    }

    async fn append_stock_history(&mut self, entry: &StockHistoryEntry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO stock_history (id, product_id, change_type, quantity,
                                       previous_stock, new_stock, notes,
                                       performed_by, recorded_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(entry.id)
        .bind(entry.product_id.as_uuid())
        .bind(entry.change.as_str())
        .bind(entry.quantity as i64)
        .bind(entry.previous_stock as i64)
        .bind(entry.new_stock as i64)
        .bind(&entry.notes)
        .bind(entry.performed_by.as_str())
        .bind(entry.recorded_at)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn stock_history_for_product(
        &mut self,
        product_id: ProductId,
    ) -> Result<Vec<StockHistoryEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, product_id, change_type, quantity, previous_stock,
                   new_stock, notes, performed_by, recorded_at
            FROM stock_history
            WHERE product_id = $1
            ORDER BY recorded_at ASC
            "#,
        )
        .bind(product_id.as_uuid())
        .fetch_all(&mut *self.tx)
        .await?;

        rows.into_iter().map(row_to_history).collect()
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
