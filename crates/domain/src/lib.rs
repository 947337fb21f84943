//! Domain layer for the commerce system.
//!
//! This crate provides the core domain types:
//! - Catalog products with stock counters
//! - Shopping carts with price snapshots taken at add time
//! - Orders with an explicit status lifecycle
//! - The append-only stock history audit trail and the helpers that
//!   pair every stock mutation with a consistent audit entry

pub mod cart;
pub mod money;
pub mod order;
pub mod product;
pub mod status;
pub mod stock;

pub use cart::{Cart, CartError, CartItem};
pub use money::Money;
pub use order::{BillingInfo, InvalidPaymentMethod, Order, OrderError, OrderItem, PaymentMethod};
pub use product::Product;
pub use status::{InvalidStatus, OrderStatus};
pub use stock::{StockChange, StockError, StockHistoryEntry, adjust_stock, remove_stock, restore_stock};
