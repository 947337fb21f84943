//! Error types for the order transaction core.

use common::{OrderId, ProductId};
use domain::{CartError, OrderError, OrderStatus, StockError};
use store::StoreError;
use thiserror::Error;

/// Errors that can occur during checkout, cancellation, or status updates.
///
/// Every variant before `Store`/`Timeout` is a classified client-visible
/// failure; the final two map to a generic "try again" at the HTTP layer.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The cart does not exist or holds no items.
    #[error("cart is empty")]
    EmptyCart,

    /// A required checkout form field is absent or blank.
    #[error("missing required checkout information: {0}")]
    MissingField(&'static str),

    /// The payment method literal is not one of the accepted values.
    #[error("{0}")]
    InvalidPaymentMethod(#[from] domain::InvalidPaymentMethod),

    /// A referenced product does not exist (or vanished mid-transaction).
    #[error("product not found: {0}")]
    ProductNotFound(ProductId),

    /// A product holds less stock than the cart requests.
    #[error("insufficient stock for product {name}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: ProductId,
        name: String,
        requested: u32,
        available: u32,
    },

    /// The order does not exist.
    #[error("order not found: {0}")]
    OrderNotFound(OrderId),

    /// The caller does not own the order.
    #[error("not authorized to access order {0}")]
    NotOrderOwner(OrderId),

    /// The order has left the `pending` state and can no longer be
    /// cancelled.
    #[error("order {order_id} cannot be cancelled: status is {status}")]
    NotCancellable {
        order_id: OrderId,
        status: OrderStatus,
    },

    /// The requested status change is not in the lifecycle table.
    #[error("{0}")]
    Status(#[from] OrderError),

    /// A cart mutation failed.
    #[error("{0}")]
    Cart(#[from] CartError),

    /// A stock mutation failed for a reason other than insufficiency.
    #[error("{0}")]
    Stock(#[from] StockError),

    /// The transaction exceeded its time bound and was aborted.
    #[error("transaction timed out")]
    Timeout,

    /// The persistence layer failed; the pre-transaction state is intact.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Convenience type alias for transaction core results.
pub type Result<T> = std::result::Result<T, CheckoutError>;
