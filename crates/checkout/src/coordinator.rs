//! Coordinator for the order lifecycle transactions.

use std::time::Duration;

use common::{OrderId, ProductId, UserId};
use domain::{
    BillingInfo, Order, OrderItem, OrderStatus, PaymentMethod, Product, StockError,
    remove_stock, restore_stock,
};
use store::Store;
use tokio::time::timeout;

use crate::error::{CheckoutError, Result};
use crate::mail;
use crate::notifier::Notifier;

/// Audit note attached to checkout-time stock decrements.
pub const STOCK_REMOVED_NOTE: &str = "Stock removed for order";

/// Audit note attached to cancellation-time stock restorations.
pub const STOCK_RESTORED_NOTE: &str = "Stock restored due to order cancellation";

/// Upper bound on any single transaction; elapse aborts like any failure.
const TRANSACTION_TIMEOUT: Duration = Duration::from_secs(30);

/// The checkout form as submitted by the client.
///
/// `payment_method` arrives as a raw literal and is validated against the
/// accepted set before any stock is read.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub full_name: String,
    pub email: String,
    pub shipping_address: String,
    pub payment_method: String,
}

/// A validated checkout form.
struct CheckoutForm {
    full_name: String,
    email: String,
    shipping_address: String,
    payment_method: PaymentMethod,
}

impl CheckoutRequest {
    fn validate(self) -> Result<CheckoutForm> {
        if self.full_name.trim().is_empty() {
            return Err(CheckoutError::MissingField("fullName"));
        }
        if self.email.trim().is_empty() {
            return Err(CheckoutError::MissingField("email"));
        }
        if self.shipping_address.trim().is_empty() {
            return Err(CheckoutError::MissingField("shippingAddress"));
        }
        if self.payment_method.trim().is_empty() {
            return Err(CheckoutError::MissingField("paymentMethod"));
        }

        let payment_method: PaymentMethod = self.payment_method.parse()?;

        Ok(CheckoutForm {
            full_name: self.full_name,
            email: self.email,
            shipping_address: self.shipping_address,
            payment_method,
        })
    }
}

/// Orchestrates checkout, cancellation, status updates, and manual stock
/// adjustments as atomic transactions.
///
/// Every operation opens one transaction on the store, stages all of its
/// writes there, and commits once at the end; any early return drops the
/// transaction and with it every staged write. Notifications go out only
/// after a successful commit.
pub struct OrderCoordinator<S, N>
where
    S: Store,
    N: Notifier,
{
    store: S,
    notifier: N,
    admin_email: String,
}

impl<S, N> OrderCoordinator<S, N>
where
    S: Store,
    N: Notifier,
{
    /// Creates a new coordinator.
    pub fn new(store: S, notifier: N, admin_email: impl Into<String>) -> Self {
        Self {
            store,
            notifier,
            admin_email: admin_email.into(),
        }
    }

    /// Converts the user's cart into a pending order.
    ///
    /// Preconditions, each failing without any mutation: the cart exists
    /// and is non-empty, all four form fields are present, and the
    /// payment method is one of the accepted literals. Per cart line the
    /// product is re-read live inside the transaction; a missing product
    /// or insufficient stock aborts everything staged so far.
    ///
    /// Returns the new order's ID. For in-store payment, the
    /// confirmation and admin alert mails are dispatched after commit,
    /// best-effort.
    #[tracing::instrument(skip(self, request), fields(user = %user))]
    pub async fn checkout(&self, user: &UserId, request: CheckoutRequest) -> Result<OrderId> {
        metrics::counter!("checkout_total").increment(1);
        let started = std::time::Instant::now();

        let order = match timeout(TRANSACTION_TIMEOUT, self.checkout_tx(user, request)).await {
            Ok(Ok(order)) => order,
            Ok(Err(e)) => {
                metrics::counter!("checkout_failed").increment(1);
                return Err(e);
            }
            Err(_) => {
                metrics::counter!("checkout_failed").increment(1);
                return Err(CheckoutError::Timeout);
            }
        };

        // Online payments are confirmed by the payment capture flow, not
        // at order time.
        if order.payment_method() == PaymentMethod::InStorePayment {
            self.send_order_mails(&order).await;
        }

        metrics::histogram!("checkout_duration_seconds").record(started.elapsed().as_secs_f64());
        tracing::info!(
            order_id = %order.id(),
            total = %order.total_price(),
            items = order.items().len(),
            "checkout committed"
        );

        Ok(order.id())
    }

    async fn checkout_tx(&self, user: &UserId, request: CheckoutRequest) -> Result<Order> {
        let mut tx = self.store.begin().await?;

        let cart = match tx.cart(user).await? {
            Some(cart) if !cart.is_empty() => cart,
            _ => return Err(CheckoutError::EmptyCart),
        };

        let form = request.validate()?;

        let mut order_items = Vec::with_capacity(cart.item_count());
        for line in cart.items() {
            let mut product = tx
                .product(line.product_id)
                .await?
                .ok_or(CheckoutError::ProductNotFound(line.product_id))?;

            let entry = remove_stock(
                &mut product,
                line.quantity,
                Some(STOCK_REMOVED_NOTE.to_string()),
                user,
            )
            .map_err(|e| insufficient_stock(&product, e))?;

            tx.save_product(&product).await?;
            tx.append_stock_history(&entry).await?;

            // Price comes from the cart's snapshot, never re-fetched.
            order_items.push(OrderItem::new(line.product_id, line.quantity, line.unit_price));
        }

        let order = Order::new(
            user.clone(),
            order_items,
            BillingInfo {
                full_name: form.full_name,
                email: form.email,
            },
            form.shipping_address,
            form.payment_method,
        );
        tx.save_order(&order).await?;

        let mut cleared = cart;
        cleared.clear();
        tx.save_cart(&cleared).await?;

        tx.commit().await?;
        Ok(order)
    }

    /// Cancels a pending order, restoring every reserved quantity.
    ///
    /// Preconditions, each failing without any mutation: the order
    /// exists, the caller owns it, and its status is exactly `pending`.
    /// The order is retained with status `cancelled` so the audit trail
    /// keeps its subject.
    #[tracing::instrument(skip(self), fields(user = %user, order_id = %order_id))]
    pub async fn cancel_order(&self, user: &UserId, order_id: OrderId) -> Result<()> {
        match timeout(TRANSACTION_TIMEOUT, self.cancel_tx(user, order_id)).await {
            Ok(Ok(())) => {
                metrics::counter!("orders_cancelled").increment(1);
                tracing::info!("order cancelled, stock restored");
                Ok(())
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(CheckoutError::Timeout),
        }
    }

    async fn cancel_tx(&self, user: &UserId, order_id: OrderId) -> Result<()> {
        let mut tx = self.store.begin().await?;

        let mut order = tx
            .order(order_id)
            .await?
            .ok_or(CheckoutError::OrderNotFound(order_id))?;

        if !order.owned_by(user) {
            return Err(CheckoutError::NotOrderOwner(order_id));
        }

        if !order.status().can_cancel() {
            return Err(CheckoutError::NotCancellable {
                order_id,
                status: order.status(),
            });
        }

        for item in order.items() {
            let mut product = tx
                .product(item.product_id)
                .await?
                .ok_or(CheckoutError::ProductNotFound(item.product_id))?;

            let entry = restore_stock(
                &mut product,
                item.quantity,
                Some(STOCK_RESTORED_NOTE.to_string()),
                user,
            )?;

            tx.save_product(&product).await?;
            tx.append_stock_history(&entry).await?;
        }

        order.set_status(OrderStatus::Cancelled)?;
        tx.save_order(&order).await?;

        tx.commit().await?;
        Ok(())
    }

    /// Force-sets an order's status with no stock side effects.
    ///
    /// The caller's authority to do this is checked outside the core; the
    /// only validation here is the status lifecycle table.
    #[tracing::instrument(skip(self), fields(order_id = %order_id, status = %status))]
    pub async fn update_order_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<Order> {
        match timeout(TRANSACTION_TIMEOUT, self.update_status_tx(order_id, status)).await {
            Ok(result) => result,
            Err(_) => Err(CheckoutError::Timeout),
        }
    }

    async fn update_status_tx(&self, order_id: OrderId, status: OrderStatus) -> Result<Order> {
        let mut tx = self.store.begin().await?;

        let mut order = tx
            .order(order_id)
            .await?
            .ok_or(CheckoutError::OrderNotFound(order_id))?;

        order.set_status(status)?;
        tx.save_order(&order).await?;

        tx.commit().await?;
        tracing::info!("order status updated");
        Ok(order)
    }

    /// Sets a product's stock to an absolute level, with an `adjust`
    /// audit row.
    #[tracing::instrument(skip(self, notes), fields(user = %user, product_id = %product_id))]
    pub async fn adjust_stock(
        &self,
        user: &UserId,
        product_id: ProductId,
        new_level: u32,
        notes: Option<String>,
    ) -> Result<Product> {
        match timeout(
            TRANSACTION_TIMEOUT,
            self.adjust_stock_tx(user, product_id, new_level, notes),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(CheckoutError::Timeout),
        }
    }

    async fn adjust_stock_tx(
        &self,
        user: &UserId,
        product_id: ProductId,
        new_level: u32,
        notes: Option<String>,
    ) -> Result<Product> {
        let mut tx = self.store.begin().await?;

        let mut product = tx
            .product(product_id)
            .await?
            .ok_or(CheckoutError::ProductNotFound(product_id))?;

        let entry = domain::adjust_stock(&mut product, new_level, notes, user)?;
        tx.save_product(&product).await?;
        tx.append_stock_history(&entry).await?;

        tx.commit().await?;
        tracing::info!(new_level, "stock adjusted");
        Ok(product)
    }

    /// Loads an order, rejecting callers that do not own it.
    pub async fn get_order(&self, user: &UserId, order_id: OrderId) -> Result<Order> {
        let mut tx = self.store.begin().await?;

        let order = tx
            .order(order_id)
            .await?
            .ok_or(CheckoutError::OrderNotFound(order_id))?;

        if !order.owned_by(user) {
            return Err(CheckoutError::NotOrderOwner(order_id));
        }
        Ok(order)
    }

    /// Lists the caller's orders, newest first.
    pub async fn orders_for_user(&self, user: &UserId) -> Result<Vec<Order>> {
        let mut tx = self.store.begin().await?;
        Ok(tx.orders_for_user(user).await?)
    }

    /// Dispatches the post-commit order mails, best-effort.
    ///
    /// Failures are logged and counted; the order is already committed
    /// and stays committed.
    async fn send_order_mails(&self, order: &Order) {
        let mails = [
            mail::order_confirmation(order),
            mail::admin_alert(order, &self.admin_email),
        ];

        for mail in mails {
            if let Err(e) = self.notifier.send(mail).await {
                metrics::counter!("order_mail_failures").increment(1);
                tracing::warn!(order_id = %order.id(), error = %e, "order notification failed");
            }
        }
    }
}

fn insufficient_stock(product: &Product, err: StockError) -> CheckoutError {
    match err {
        StockError::InsufficientStock {
            requested,
            available,
            ..
        } => CheckoutError::InsufficientStock {
            product_id: product.id,
            name: product.name.clone(),
            requested,
            available,
        },
        other => CheckoutError::Stock(other),
    }
}
