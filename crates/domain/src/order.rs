//! Orders and their immutable snapshot data.

use chrono::{DateTime, Utc};
use common::{OrderId, ProductId, UserId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::money::Money;
use crate::status::OrderStatus;

/// An item in an order.
///
/// `unit_price` is the cart's price snapshot, carried into the order
/// unchanged at checkout time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: Money,
}

impl OrderItem {
    /// Creates a new order item.
    pub fn new(product_id: ProductId, quantity: u32, unit_price: Money) -> Self {
        Self {
            product_id,
            quantity,
            unit_price,
        }
    }

    /// Returns the total price for this item (quantity * unit_price).
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// Billing contact captured at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingInfo {
    pub full_name: String,
    pub email: String,
}

/// Error returned when parsing an unknown payment method literal.
#[derive(Debug, Clone, Error)]
#[error("invalid payment method: {0}")]
pub struct InvalidPaymentMethod(pub String);

/// How the customer pays for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentMethod {
    /// Paid online at checkout; confirmation mail is sent on capture,
    /// not at order time.
    OnlinePayment,

    /// Paid at the counter on pickup; confirmation and admin alert
    /// mails go out as soon as the order commits.
    InStorePayment,
}

impl PaymentMethod {
    /// Returns the payment method as its wire literal.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::OnlinePayment => "online-payment",
            PaymentMethod::InStorePayment => "in-store-payment",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = InvalidPaymentMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "online-payment" => Ok(PaymentMethod::OnlinePayment),
            "in-store-payment" => Ok(PaymentMethod::InStorePayment),
            other => Err(InvalidPaymentMethod(other.to_string())),
        }
    }
}

/// Errors that can occur when mutating an order.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The requested status change is not in the lifecycle table.
    #[error("cannot change order status from {from} to {to}")]
    InvalidStatusTransition {
        from: OrderStatus,
        to: OrderStatus,
    },
}

/// A placed order.
///
/// Everything except `status` is an immutable snapshot taken at
/// checkout; the product catalog is never re-read after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    user: UserId,
    items: Vec<OrderItem>,
    total_price: Money,
    billing: BillingInfo,
    shipping_address: String,
    payment_method: PaymentMethod,
    status: OrderStatus,
    created_at: DateTime<Utc>,
}

impl Order {
    /// Creates a new pending order, computing the total from its items.
    pub fn new(
        user: UserId,
        items: Vec<OrderItem>,
        billing: BillingInfo,
        shipping_address: impl Into<String>,
        payment_method: PaymentMethod,
    ) -> Self {
        let total_price = items
            .iter()
            .fold(Money::zero(), |total, item| total + item.line_total());

        Self {
            id: OrderId::new(),
            user,
            items,
            total_price,
            billing,
            shipping_address: shipping_address.into(),
            payment_method,
            status: OrderStatus::Pending,
            created_at: Utc::now(),
        }
    }

    /// Reassembles an order from persisted parts.
    ///
    /// The total is trusted as stored; it was computed once at creation
    /// and is never recomputed.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: OrderId,
        user: UserId,
        items: Vec<OrderItem>,
        total_price: Money,
        billing: BillingInfo,
        shipping_address: String,
        payment_method: PaymentMethod,
        status: OrderStatus,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user,
            items,
            total_price,
            billing,
            shipping_address,
            payment_method,
            status,
            created_at,
        }
    }

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn user(&self) -> &UserId {
        &self.user
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn total_price(&self) -> Money {
        self.total_price
    }

    pub fn billing(&self) -> &BillingInfo {
        &self.billing
    }

    pub fn shipping_address(&self) -> &str {
        &self.shipping_address
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns true if `user` owns this order.
    pub fn owned_by(&self, user: &UserId) -> bool {
        &self.user == user
    }

    /// Moves the order to `next`, enforcing the lifecycle table.
    pub fn set_status(&mut self, next: OrderStatus) -> Result<(), OrderError> {
        if !self.status.can_transition_to(next) {
            return Err(OrderError::InvalidStatusTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }
}
