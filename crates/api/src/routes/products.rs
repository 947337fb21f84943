//! Catalog and stock management endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use domain::Product;
use serde::{Deserialize, Serialize};
use store::Store;

use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::routes::{orders::AppState, parse_product_id};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub price_cents: i64,
    pub current_stock: u32,
    pub min_stock: u32,
    pub low_stock: bool,
}

impl ProductResponse {
    fn from_product(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            price_cents: product.price.cents(),
            current_stock: product.current_stock,
            min_stock: product.min_stock,
            low_stock: product.is_low_stock(),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustStockRequest {
    pub new_level: u32,
    pub notes: Option<String>,
}

/// GET /products — the catalog.
#[tracing::instrument(skip(state))]
pub async fn list<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let mut tx = state.store.begin().await?;
    let products = tx.products().await?;
    Ok(Json(
        products.iter().map(ProductResponse::from_product).collect(),
    ))
}

/// GET /products/low-stock — products at or below their reorder threshold.
#[tracing::instrument(skip(state))]
pub async fn low_stock<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let mut tx = state.store.begin().await?;
    let products = tx.low_stock_products().await?;
    Ok(Json(
        products.iter().map(ProductResponse::from_product).collect(),
    ))
}

/// PUT /products/{id}/stock — set an absolute stock level (storekeeper).
#[tracing::instrument(skip(state, req))]
pub async fn adjust_stock<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<AdjustStockRequest>,
) -> Result<Json<ProductResponse>, ApiError> {
    if !state.authorizer.can_adjust_stock(&user) {
        return Err(ApiError::Forbidden(
            "Not authorized to adjust stock".to_string(),
        ));
    }

    let product_id = parse_product_id(&id)?;
    let product = state
        .coordinator
        .adjust_stock(&user, product_id, req.new_level, req.notes)
        .await?;

    Ok(Json(ProductResponse::from_product(&product)))
}
