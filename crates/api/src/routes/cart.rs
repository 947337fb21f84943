//! Cart endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use domain::Cart;
use serde::{Deserialize, Serialize};
use store::Store;

use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::routes::{orders::AppState, parse_product_id};

// -- Request types --

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub product_id: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

#[derive(Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: u32,
}

// -- Response types --

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemResponse {
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub items: Vec<CartItemResponse>,
    pub subtotal_cents: i64,
}

impl CartResponse {
    fn from_cart(cart: &Cart) -> Self {
        Self {
            items: cart
                .items()
                .iter()
                .map(|item| CartItemResponse {
                    product_id: item.product_id.to_string(),
                    product_name: item.product_name.clone(),
                    quantity: item.quantity,
                    unit_price_cents: item.unit_price.cents(),
                    line_total_cents: item.line_total().cents(),
                })
                .collect(),
            subtotal_cents: cart.subtotal().cents(),
        }
    }
}

// -- Handlers --

/// GET /cart — the caller's cart (empty if none exists yet).
#[tracing::instrument(skip(state))]
pub async fn get_cart<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<CartResponse>, ApiError> {
    let cart = state.carts.cart(&user).await?;
    Ok(Json(CartResponse::from_cart(&cart)))
}

/// POST /cart/items — add a product to the cart at its current price.
#[tracing::instrument(skip(state, req))]
pub async fn add_item<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<AddItemRequest>,
) -> Result<(StatusCode, Json<CartResponse>), ApiError> {
    let product_id = parse_product_id(&req.product_id)?;
    let cart = state.carts.add_item(&user, product_id, req.quantity).await?;
    Ok((StatusCode::CREATED, Json(CartResponse::from_cart(&cart))))
}

/// PUT /cart/items/{product_id} — set a line's quantity.
#[tracing::instrument(skip(state, req))]
pub async fn update_item<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
    Path(product_id): Path<String>,
    Json(req): Json<UpdateItemRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    let product_id = parse_product_id(&product_id)?;
    let cart = state
        .carts
        .update_quantity(&user, product_id, req.quantity)
        .await?;
    Ok(Json(CartResponse::from_cart(&cart)))
}

/// DELETE /cart/items/{product_id} — remove a line from the cart.
#[tracing::instrument(skip(state))]
pub async fn remove_item<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
    Path(product_id): Path<String>,
) -> Result<Json<CartResponse>, ApiError> {
    let product_id = parse_product_id(&product_id)?;
    let cart = state.carts.remove_item(&user, product_id).await?;
    Ok(Json(CartResponse::from_cart(&cart)))
}
