use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{OrderId, ProductId, UserId};
use domain::{Cart, Order, Product, StockHistoryEntry};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{
    Result,
    store::{Store, StoreTx},
};

#[derive(Debug, Clone, Default)]
struct StoreState {
    products: HashMap<ProductId, Product>,
    carts: HashMap<UserId, Cart>,
    orders: HashMap<OrderId, Order>,
    stock_history: Vec<StockHistoryEntry>,
}

/// In-memory store implementation for testing and single-node use.
///
/// Transactions take ownership of a mutex guard over the whole state and
/// stage their writes on a working copy, so transactions serialize: the
/// second of two racing checkouts always observes the first one's
/// committed stock. This provides the same contract as the PostgreSQL
/// implementation.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a product directly, outside any transaction.
    ///
    /// Test seeding helper; production mutations go through [`Store::begin`].
    pub async fn insert_product(&self, product: Product) {
        self.state
            .lock()
            .await
            .products
            .insert(product.id, product);
    }

    /// Inserts a cart directly, outside any transaction.
    pub async fn insert_cart(&self, cart: Cart) {
        self.state
            .lock()
            .await
            .carts
            .insert(cart.user().clone(), cart);
    }

    /// Returns a product's current stock, if the product exists.
    pub async fn product_stock(&self, id: ProductId) -> Option<u32> {
        self.state
            .lock()
            .await
            .products
            .get(&id)
            .map(|p| p.current_stock)
    }

    /// Returns the total number of orders stored.
    pub async fn order_count(&self) -> usize {
        self.state.lock().await.orders.len()
    }

    /// Returns the total number of audit rows stored.
    pub async fn stock_history_count(&self) -> usize {
        self.state.lock().await.stock_history.len()
    }

    /// Clears all stored data.
    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        *state = StoreState::default();
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(InMemoryTx { guard, working }))
    }
}

/// An open transaction over the in-memory store.
///
/// Holds the state lock for its whole lifetime; `commit` swaps the
/// working copy in, dropping discards it.
struct InMemoryTx {
    guard: OwnedMutexGuard<StoreState>,
    working: StoreState,
}

#[async_trait]
impl StoreTx for InMemoryTx {
    async fn product(&mut self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.working.products.get(&id).cloned())
    }

    async fn save_product(&mut self, product: &Product) -> Result<()> {
        self.working.products.insert(product.id, product.clone());
        Ok(())
    }

    async fn products(&mut self) -> Result<Vec<Product>> {
        let mut products: Vec<_> = self.working.products.values().cloned().collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(products)
    }

    async fn low_stock_products(&mut self) -> Result<Vec<Product>> {
        let mut products: Vec<_> = self
            .working
            .products
            .values()
            .filter(|p| p.is_low_stock())
            .cloned()
            .collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(products)
    }

    async fn cart(&mut self, user: &UserId) -> Result<Option<Cart>> {
        Ok(self.working.carts.get(user).cloned())
    }

    async fn save_cart(&mut self, cart: &Cart) -> Result<()> {
        self.working
            .carts
            .insert(cart.user().clone(), cart.clone());
        Ok(())
    }

    async fn order(&mut self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.working.orders.get(&id).cloned())
    }

    async fn save_order(&mut self, order: &Order) -> Result<()> {
        self.working.orders.insert(order.id(), order.clone());
        Ok(())
    }

    async fn orders_for_user(&mut self, user: &UserId) -> Result<Vec<Order>> {
        let mut orders: Vec<_> = self
            .working
            .orders
            .values()
            .filter(|o| o.owned_by(user))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(orders)
    }

    async fn append_stock_history(&mut self, entry: &StockHistoryEntry) -> Result<()> {
        self.working.stock_history.push(entry.clone());
        Ok(())
    }

    async fn stock_history_for_product(
        &mut self,
        product_id: ProductId,
    ) -> Result<Vec<StockHistoryEntry>> {
        Ok(self
            .working
            .stock_history
            .iter()
            .filter(|e| e.product_id == product_id)
            .cloned()
            .collect())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let InMemoryTx { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{CartItem, Money, remove_stock};

    fn test_product(stock: u32) -> Product {
        Product::new("Milk", Money::from_cents(250), stock, 5)
    }

    #[tokio::test]
    async fn commit_makes_writes_visible() {
        let store = InMemoryStore::new();
        let product = test_product(5);
        let id = product.id;

        let mut tx = store.begin().await.unwrap();
        tx.save_product(&product).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(store.product_stock(id).await, Some(5));
    }

    #[tokio::test]
    async fn dropping_transaction_discards_staged_writes() {
        let store = InMemoryStore::new();
        let product = test_product(5);
        let id = product.id;
        store.insert_product(product).await;

        {
            let mut tx = store.begin().await.unwrap();
            let mut staged = tx.product(id).await.unwrap().unwrap();
            let entry =
                remove_stock(&mut staged, 2, None, &UserId::new("user-1")).unwrap();
            tx.save_product(&staged).await.unwrap();
            tx.append_stock_history(&entry).await.unwrap();
            // No commit.
        }

        assert_eq!(store.product_stock(id).await, Some(5));
        assert_eq!(store.stock_history_count().await, 0);
    }

    #[tokio::test]
    async fn sequential_transactions_observe_committed_state() {
        let store = InMemoryStore::new();
        let product = test_product(3);
        let id = product.id;
        store.insert_product(product).await;

        let mut tx1 = store.begin().await.unwrap();
        let mut p = tx1.product(id).await.unwrap().unwrap();
        p.current_stock -= 3;
        tx1.save_product(&p).await.unwrap();
        tx1.commit().await.unwrap();

        let mut tx2 = store.begin().await.unwrap();
        let p = tx2.product(id).await.unwrap().unwrap();
        assert_eq!(p.current_stock, 0);
    }

    #[tokio::test]
    async fn save_order_and_list_for_user() {
        use domain::{BillingInfo, OrderItem, PaymentMethod};

        let store = InMemoryStore::new();
        let user = UserId::new("user-1");

        let order = Order::new(
            user.clone(),
            vec![OrderItem::new(ProductId::new(), 1, Money::from_cents(100))],
            BillingInfo {
                full_name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
            },
            "12 Analytical Way",
            PaymentMethod::OnlinePayment,
        );
        let order_id = order.id();

        let mut tx = store.begin().await.unwrap();
        tx.save_order(&order).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        assert!(tx.order(order_id).await.unwrap().is_some());
        let mine = tx.orders_for_user(&user).await.unwrap();
        assert_eq!(mine.len(), 1);
        let theirs = tx.orders_for_user(&UserId::new("user-2")).await.unwrap();
        assert!(theirs.is_empty());
    }

    #[tokio::test]
    async fn cart_roundtrip() {
        let store = InMemoryStore::new();
        let user = UserId::new("user-1");

        let mut cart = Cart::new(user.clone());
        cart.add_item(CartItem::new(
            ProductId::new(),
            "Milk",
            2,
            Money::from_cents(250),
        ))
        .unwrap();

        let mut tx = store.begin().await.unwrap();
        assert!(tx.cart(&user).await.unwrap().is_none());
        tx.save_cart(&cart).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let loaded = tx.cart(&user).await.unwrap().unwrap();
        assert_eq!(loaded, cart);
    }

    #[tokio::test]
    async fn low_stock_listing() {
        let store = InMemoryStore::new();
        let healthy = Product::new("Rice", Money::from_cents(800), 50, 5);
        let low = Product::new("Milk", Money::from_cents(250), 2, 5);
        store.insert_product(healthy).await;
        store.insert_product(low.clone()).await;

        let mut tx = store.begin().await.unwrap();
        let flagged = tx.low_stock_products().await.unwrap();
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].id, low.id);
    }

    #[tokio::test]
    async fn stock_history_filtered_by_product() {
        let store = InMemoryStore::new();
        let mut product_a = test_product(10);
        let mut product_b = test_product(10);
        let user = UserId::new("user-1");

        let mut tx = store.begin().await.unwrap();
        let entry_a = remove_stock(&mut product_a, 1, None, &user).unwrap();
        let entry_b = remove_stock(&mut product_b, 2, None, &user).unwrap();
        tx.append_stock_history(&entry_a).await.unwrap();
        tx.append_stock_history(&entry_b).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let history = tx.stock_history_for_product(product_a.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].quantity, 1);
    }
}
