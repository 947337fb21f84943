use async_trait::async_trait;
use common::{OrderId, ProductId, UserId};
use domain::{Cart, Order, Product, StockHistoryEntry};

use crate::Result;

/// Core trait for store implementations.
///
/// A store opens atomic multi-document transactions. All implementations
/// must be thread-safe (Send + Sync) and cheaply cloneable so they can be
/// shared across request handlers.
#[async_trait]
pub trait Store: Send + Sync {
    /// Opens a new transaction.
    ///
    /// Every read inside the transaction observes a snapshot consistent
    /// enough to make correct stock-sufficiency decisions; two
    /// transactions racing to decrement the same product either serialize
    /// or the later one observes the earlier one's committed write.
    async fn begin(&self) -> Result<Box<dyn StoreTx>>;
}

/// An open unit of work.
///
/// Writes are staged inside the transaction and become visible together
/// when [`commit`](StoreTx::commit) succeeds. Dropping the transaction
/// without committing discards every staged write, so an early `?` return
/// from orchestration code rolls back by construction.
#[async_trait]
pub trait StoreTx: Send {
    /// Reads a product by ID.
    ///
    /// Inside a mutating flow this is the live re-read that stock
    /// decisions must be based on; implementations lock the row (or
    /// serialize the whole transaction) so the value cannot go stale
    /// before the transaction ends.
    async fn product(&mut self, id: ProductId) -> Result<Option<Product>>;

    /// Inserts or updates a product.
    async fn save_product(&mut self, product: &Product) -> Result<()>;

    /// Lists the whole catalog.
    async fn products(&mut self) -> Result<Vec<Product>>;

    /// Lists products at or below their reorder threshold.
    async fn low_stock_products(&mut self) -> Result<Vec<Product>>;

    /// Reads a user's cart.
    async fn cart(&mut self, user: &UserId) -> Result<Option<Cart>>;

    /// Inserts or updates a cart.
    async fn save_cart(&mut self, cart: &Cart) -> Result<()>;

    /// Reads an order by ID.
    async fn order(&mut self, id: OrderId) -> Result<Option<Order>>;

    /// Inserts an order, or updates its status if it already exists.
    ///
    /// Everything except the status is an immutable snapshot; updates
    /// never touch the other columns.
    async fn save_order(&mut self, order: &Order) -> Result<()>;

    /// Lists a user's orders, newest first.
    async fn orders_for_user(&mut self, user: &UserId) -> Result<Vec<Order>>;

    /// Appends one row to the stock audit trail.
    ///
    /// History rows are append-only; there is no update or delete.
    async fn append_stock_history(&mut self, entry: &StockHistoryEntry) -> Result<()>;

    /// Lists a product's audit trail in recording order.
    async fn stock_history_for_product(
        &mut self,
        product_id: ProductId,
    ) -> Result<Vec<StockHistoryEntry>>;

    /// Publishes every staged write atomically.
    async fn commit(self: Box<Self>) -> Result<()>;
}
