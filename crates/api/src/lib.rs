//! HTTP API server with observability for the commerce system.
//!
//! Provides REST endpoints for cart management, checkout, order
//! lifecycle, and stock management, with structured logging (tracing)
//! and Prometheus metrics.

pub mod auth;
pub mod config;
pub mod error;
pub mod monitor;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, patch, post, put};
use checkout::{CartService, InMemoryNotifier, OrderCoordinator};
use metrics_exporter_prometheus::PrometheusHandle;
use store::Store;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use auth::{Authorizer, RoleTable};
use config::Config;
use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: Store + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/checkout", post(routes::orders::checkout::<S>))
        .route("/orders", get(routes::orders::list::<S>))
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route("/orders/{id}/cancel", post(routes::orders::cancel::<S>))
        .route(
            "/orders/{id}/status",
            patch(routes::orders::update_status::<S>),
        )
        .route("/cart", get(routes::cart::get_cart::<S>))
        .route("/cart/items", post(routes::cart::add_item::<S>))
        .route(
            "/cart/items/{product_id}",
            put(routes::cart::update_item::<S>).delete(routes::cart::remove_item::<S>),
        )
        .route("/products", get(routes::products::list::<S>))
        .route("/products/low-stock", get(routes::products::low_stock::<S>))
        .route(
            "/products/{id}/stock",
            put(routes::products::adjust_stock::<S>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates application state with explicit collaborators.
pub fn create_state<S: Store + Clone + 'static>(
    store: S,
    notifier: InMemoryNotifier,
    authorizer: Arc<dyn Authorizer>,
    admin_email: impl Into<String>,
) -> Arc<AppState<S>> {
    let coordinator = OrderCoordinator::new(store.clone(), notifier, admin_email);
    let carts = CartService::new(store.clone());

    Arc::new(AppState {
        coordinator,
        carts,
        store,
        authorizer,
    })
}

/// Creates application state from the loaded configuration.
pub fn create_default_state<S: Store + Clone + 'static>(
    store: S,
    config: &Config,
) -> Arc<AppState<S>> {
    create_state(
        store,
        InMemoryNotifier::new(),
        Arc::new(RoleTable::from_config(config)),
        config.admin_email.clone(),
    )
}
