//! HTTP route handlers.

pub mod cart;
pub mod health;
pub mod metrics;
pub mod orders;
pub mod products;

use common::{OrderId, ProductId};

use crate::error::ApiError;

pub(crate) fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    uuid::Uuid::parse_str(id)
        .map(OrderId::from)
        .map_err(|e| ApiError::BadRequest(format!("Invalid order ID: {e}")))
}

pub(crate) fn parse_product_id(id: &str) -> Result<ProductId, ApiError> {
    uuid::Uuid::parse_str(id)
        .map(ProductId::from)
        .map_err(|e| ApiError::BadRequest(format!("Invalid product ID: {e}")))
}
