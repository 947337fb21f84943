//! Integration tests for the API server.

use std::sync::{Arc, OnceLock};

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use checkout::InMemoryNotifier;
use domain::{Money, Product};
use metrics_exporter_prometheus::PrometheusHandle;
use store::InMemoryStore;
use tower::ServiceExt;

const CASHIER: &str = "cashier@example.com";
const STOREKEEPER: &str = "keeper@example.com";
const ADMIN_EMAIL: &str = "admin@supermart.example";

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

struct TestApp {
    app: Router,
    store: InMemoryStore,
    notifier: InMemoryNotifier,
}

fn setup() -> TestApp {
    let store = InMemoryStore::new();
    let notifier = InMemoryNotifier::new();
    let authorizer = Arc::new(api::auth::RoleTable::new(
        vec![CASHIER.to_string()],
        vec![STOREKEEPER.to_string()],
    ));

    let state = api::create_state(store.clone(), notifier.clone(), authorizer, ADMIN_EMAIL);
    let app = api::create_app(state, get_metrics_handle());

    TestApp {
        app,
        store,
        notifier,
    }
}

async fn seed_product(store: &InMemoryStore, name: &str, price_cents: i64, stock: u32) -> String {
    let product = Product::new(name, Money::from_cents(price_cents), stock, 5);
    let id = product.id;
    store.insert_product(product).await;
    id.to_string()
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    user: Option<&str>,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header("x-user-id", user);
    }

    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn checkout_body() -> serde_json::Value {
    serde_json::json!({
        "fullName": "Ada Lovelace",
        "email": "ada@example.com",
        "shippingAddress": "12 Analytical Way",
        "paymentMethod": "in-store-payment"
    })
}

#[tokio::test]
async fn test_health_check() {
    let t = setup();
    let (status, json) = send(&t.app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_missing_identity_header_is_unauthorized() {
    let t = setup();
    let (status, json) = send(&t.app, "GET", "/cart", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(json["error"].as_str().unwrap().contains("x-user-id"));
}

#[tokio::test]
async fn test_cart_and_checkout_flow() {
    let t = setup();
    let product_id = seed_product(&t.store, "Milk", 1000, 5).await;

    // Add to cart.
    let (status, cart) = send(
        &t.app,
        "POST",
        "/cart/items",
        Some("user-1"),
        Some(serde_json::json!({ "productId": product_id, "quantity": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(cart["items"][0]["quantity"], 2);
    assert_eq!(cart["subtotalCents"], 2000);

    // Checkout.
    let (status, response) = send(
        &t.app,
        "POST",
        "/checkout",
        Some("user-1"),
        Some(checkout_body()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(response["message"], "Order placed successfully");
    let order_id = response["orderId"].as_str().unwrap().to_string();

    // Stock reserved, cart cleared, mails dispatched.
    let stock = t
        .store
        .product_stock(product_id.parse::<uuid::Uuid>().unwrap().into())
        .await;
    assert_eq!(stock, Some(3));
    let (_, cart) = send(&t.app, "GET", "/cart", Some("user-1"), None).await;
    assert!(cart["items"].as_array().unwrap().is_empty());
    assert_eq!(t.notifier.sent_count(), 2);
    assert!(t.notifier.sent_to("ada@example.com"));
    assert!(t.notifier.sent_to(ADMIN_EMAIL));

    // The order is visible to its owner only.
    let uri = format!("/orders/{order_id}");
    let (status, order) = send(&t.app, "GET", &uri, Some("user-1"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["status"], "pending");
    assert_eq!(order["totalCents"], 2000);

    let (status, _) = send(&t.app, "GET", &uri, Some("user-2"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_checkout_with_empty_cart_fails() {
    let t = setup();
    let (status, json) = send(
        &t.app,
        "POST",
        "/checkout",
        Some("user-1"),
        Some(checkout_body()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "cart is empty");
}

#[tokio::test]
async fn test_checkout_insufficient_stock_names_product() {
    let t = setup();
    let product_id = seed_product(&t.store, "Saffron", 9000, 1).await;

    send(
        &t.app,
        "POST",
        "/cart/items",
        Some("user-1"),
        Some(serde_json::json!({ "productId": product_id, "quantity": 3 })),
    )
    .await;

    let (status, json) = send(
        &t.app,
        "POST",
        "/checkout",
        Some("user-1"),
        Some(checkout_body()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("Saffron"));
}

#[tokio::test]
async fn test_checkout_invalid_payment_method() {
    let t = setup();
    let product_id = seed_product(&t.store, "Milk", 1000, 5).await;
    send(
        &t.app,
        "POST",
        "/cart/items",
        Some("user-1"),
        Some(serde_json::json!({ "productId": product_id })),
    )
    .await;

    let mut body = checkout_body();
    body["paymentMethod"] = serde_json::json!("bank-transfer");
    let (status, json) = send(&t.app, "POST", "/checkout", Some("user-1"), Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("bank-transfer"));
}

#[tokio::test]
async fn test_cancel_order_restores_stock() {
    let t = setup();
    let product_id = seed_product(&t.store, "Milk", 1000, 5).await;
    send(
        &t.app,
        "POST",
        "/cart/items",
        Some("user-1"),
        Some(serde_json::json!({ "productId": product_id, "quantity": 2 })),
    )
    .await;
    let (_, response) = send(
        &t.app,
        "POST",
        "/checkout",
        Some("user-1"),
        Some(checkout_body()),
    )
    .await;
    let order_id = response["orderId"].as_str().unwrap().to_string();

    let (status, json) = send(
        &t.app,
        "POST",
        &format!("/orders/{order_id}/cancel"),
        Some("user-1"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Order cancelled successfully");

    let stock = t
        .store
        .product_stock(product_id.parse::<uuid::Uuid>().unwrap().into())
        .await;
    assert_eq!(stock, Some(5));

    let (_, order) = send(
        &t.app,
        "GET",
        &format!("/orders/{order_id}"),
        Some("user-1"),
        None,
    )
    .await;
    assert_eq!(order["status"], "cancelled");
}

#[tokio::test]
async fn test_status_update_requires_cashier_role() {
    let t = setup();
    let product_id = seed_product(&t.store, "Milk", 1000, 5).await;
    send(
        &t.app,
        "POST",
        "/cart/items",
        Some("user-1"),
        Some(serde_json::json!({ "productId": product_id })),
    )
    .await;
    let (_, response) = send(
        &t.app,
        "POST",
        "/checkout",
        Some("user-1"),
        Some(checkout_body()),
    )
    .await;
    let order_id = response["orderId"].as_str().unwrap().to_string();
    let uri = format!("/orders/{order_id}/status");
    let body = serde_json::json!({ "status": "processing" });

    // The order's owner is not a cashier.
    let (status, _) = send(&t.app, "PATCH", &uri, Some("user-1"), Some(body.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // A cashier may force the transition.
    let (status, json) = send(&t.app, "PATCH", &uri, Some(CASHIER), Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["order"]["status"], "processing");

    // Unknown literals are rejected.
    let (status, _) = send(
        &t.app,
        "PATCH",
        &uri,
        Some(CASHIER),
        Some(serde_json::json!({ "status": "packed" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Transitions outside the lifecycle table conflict.
    let (status, _) = send(
        &t.app,
        "PATCH",
        &uri,
        Some(CASHIER),
        Some(serde_json::json!({ "status": "pending" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_stock_adjustment_requires_storekeeper_role() {
    let t = setup();
    let product_id = seed_product(&t.store, "Milk", 1000, 10).await;
    let uri = format!("/products/{product_id}/stock");
    let body = serde_json::json!({ "newLevel": 4, "notes": "recount" });

    let (status, _) = send(&t.app, "PUT", &uri, Some("user-1"), Some(body.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, json) = send(&t.app, "PUT", &uri, Some(STOREKEEPER), Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["currentStock"], 4);
    assert_eq!(json["lowStock"], true);
}

#[tokio::test]
async fn test_orders_list_is_scoped_to_caller() {
    let t = setup();
    let product_id = seed_product(&t.store, "Milk", 1000, 10).await;
    send(
        &t.app,
        "POST",
        "/cart/items",
        Some("user-1"),
        Some(serde_json::json!({ "productId": product_id, "quantity": 1 })),
    )
    .await;
    send(
        &t.app,
        "POST",
        "/checkout",
        Some("user-1"),
        Some(checkout_body()),
    )
    .await;

    let (status, mine) = send(&t.app, "GET", "/orders", Some("user-1"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine.as_array().unwrap().len(), 1);

    let (status, theirs) = send(&t.app, "GET", "/orders", Some("user-2"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(theirs.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_low_stock_listing() {
    let t = setup();
    seed_product(&t.store, "Milk", 1000, 2).await;
    seed_product(&t.store, "Rice", 800, 50).await;

    let (status, json) = send(&t.app, "GET", "/products/low-stock", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let products = json.as_array().unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["name"], "Milk");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let t = setup();
    let response = t
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
