//! Checkout and order lifecycle endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use checkout::{CartService, CheckoutRequest, InMemoryNotifier, OrderCoordinator};
use domain::{Order, OrderStatus};
use serde::{Deserialize, Serialize};
use store::Store;

use crate::auth::{Authorizer, CurrentUser};
use crate::error::ApiError;
use crate::routes::parse_order_id;

/// Shared application state accessible from all handlers.
pub struct AppState<S: Store> {
    pub coordinator: OrderCoordinator<S, InMemoryNotifier>,
    pub carts: CartService<S>,
    pub store: S,
    pub authorizer: Arc<dyn Authorizer>,
}

// -- Request types --

/// Checkout form body. Fields default to empty strings so that missing
/// keys surface as the core's missing-field errors instead of a body
/// rejection.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutApiRequest {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub shipping_address: String,
    #[serde(default)]
    pub payment_method: String,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

// -- Response types --

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemResponse {
    pub product_id: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: String,
    pub status: String,
    pub items: Vec<OrderItemResponse>,
    pub total_cents: i64,
    pub payment_method: String,
    pub shipping_address: String,
    pub full_name: String,
    pub email: String,
    pub created_at: String,
}

impl OrderResponse {
    pub fn from_order(order: &Order) -> Self {
        Self {
            id: order.id().to_string(),
            status: order.status().to_string(),
            items: order
                .items()
                .iter()
                .map(|item| OrderItemResponse {
                    product_id: item.product_id.to_string(),
                    quantity: item.quantity,
                    unit_price_cents: item.unit_price.cents(),
                })
                .collect(),
            total_cents: order.total_price().cents(),
            payment_method: order.payment_method().to_string(),
            shipping_address: order.shipping_address().to_string(),
            full_name: order.billing().full_name.clone(),
            email: order.billing().email.clone(),
            created_at: order.created_at().to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub message: String,
    pub order_id: String,
}

#[derive(Serialize)]
pub struct CancelResponse {
    pub message: String,
}

#[derive(Serialize)]
pub struct UpdateStatusResponse {
    pub message: String,
    pub order: OrderResponse,
}

// -- Handlers --

/// POST /checkout — place an order from the caller's cart.
#[tracing::instrument(skip(state, req))]
pub async fn checkout<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<CheckoutApiRequest>,
) -> Result<(StatusCode, Json<CheckoutResponse>), ApiError> {
    let order_id = state
        .coordinator
        .checkout(
            &user,
            CheckoutRequest {
                full_name: req.full_name,
                email: req.email,
                shipping_address: req.shipping_address,
                payment_method: req.payment_method,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CheckoutResponse {
            message: "Order placed successfully".to_string(),
            order_id: order_id.to_string(),
        }),
    ))
}

/// GET /orders — list the caller's orders, newest first.
#[tracing::instrument(skip(state))]
pub async fn list<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state.coordinator.orders_for_user(&user).await?;
    Ok(Json(orders.iter().map(OrderResponse::from_order).collect()))
}

/// GET /orders/{id} — load one of the caller's orders.
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state.coordinator.get_order(&user, order_id).await?;
    Ok(Json(OrderResponse::from_order(&order)))
}

/// POST /orders/{id}/cancel — cancel a pending order, restoring stock.
#[tracing::instrument(skip(state))]
pub async fn cancel<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<CancelResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    state.coordinator.cancel_order(&user, order_id).await?;

    Ok(Json(CancelResponse {
        message: "Order cancelled successfully".to_string(),
    }))
}

/// PATCH /orders/{id}/status — force-set an order's status (cashier).
#[tracing::instrument(skip(state, req))]
pub async fn update_status<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<UpdateStatusResponse>, ApiError> {
    if !state.authorizer.can_update_status(&user) {
        return Err(ApiError::Forbidden(
            "Not authorized to update order status".to_string(),
        ));
    }

    let order_id = parse_order_id(&id)?;
    let status: OrderStatus = req
        .status
        .parse()
        .map_err(|e: domain::InvalidStatus| ApiError::BadRequest(e.to_string()))?;

    let order = state.coordinator.update_order_status(order_id, status).await?;

    Ok(Json(UpdateStatusResponse {
        message: "Order status updated successfully".to_string(),
        order: OrderResponse::from_order(&order),
    }))
}
