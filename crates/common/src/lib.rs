//! Shared identifier types used across the commerce system.

mod types;

pub use types::{OrderId, ProductId, UserId};
