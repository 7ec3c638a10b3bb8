//! Storefront against a scripted marketplace backend.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use bazaar_integration_tests::{FakeBackend, Reply, TestApp, location};
use reqwest::StatusCode;
use serde_json::{Value, json};

fn consumer_session() -> Reply {
    Reply::ok(json!({
        "token": "consumer-token",
        "consumer": { "id": 5, "name": "Ada", "email": "ada@example.com" }
    }))
}

fn tracked_order(status: &str) -> Value {
    json!({
        "id": 77,
        "trackingNumber": "BZR-0042",
        "status": status,
        "storeName": "Green Grocer",
        "items": [{ "productId": 10, "productName": "Mango", "unitPrice": "2.50", "quantity": 2 }],
        "subtotal": "5.00",
        "deliveryFee": "5.25",
        "total": "10.25",
        "address": { "id": 2, "recipientName": "Ada", "line1": "9 Elm Street", "city": "Shelbyville" },
        "createdAt": "2024-06-02T08:15:00Z"
    })
}

/// A signed-in consumer with one cart line, one address and two zones.
async fn checkout_ready() -> (FakeBackend, TestApp) {
    let backend = FakeBackend::start().await;
    backend.on("POST", "/api/consumers/login", consumer_session());
    backend.on(
        "GET",
        "/api/cart",
        Reply::ok(json!({
            "items": [{
                "id": 1, "productId": 10, "productName": "Mango", "storeId": 1,
                "storeName": "Green Grocer", "unitPrice": "2.50", "quantity": 2
            }]
        })),
    );
    backend.on(
        "GET",
        "/api/consumers/me/addresses",
        Reply::page(
            json!([{ "id": 2, "recipientName": "Ada", "line1": "9 Elm Street", "city": "Shelbyville", "zoneId": 4 }]),
            1,
            1,
        ),
    );
    backend.on(
        "GET",
        "/api/zones",
        Reply::page(
            json!([
                { "id": 3, "name": "Downtown", "deliveryFee": "3.00" },
                { "id": 4, "name": "Suburbs", "deliveryFee": "5.25", "estimatedDelivery": "2-3 hours" }
            ]),
            1,
            1,
        ),
    );

    let app = TestApp::storefront(&backend).await;
    app.sign_in("ada@example.com").await;
    (backend, app)
}

#[tokio::test]
async fn test_catalog_read_survives_transient_backend_failures() {
    let backend = FakeBackend::start().await;
    backend.on("GET", "/api/stores", Reply::error(503, "Service unavailable"));
    backend.on("GET", "/api/stores", Reply::error(502, "Bad gateway"));
    backend.on(
        "GET",
        "/api/stores",
        Reply::page(json!([{ "id": 1, "name": "Green Grocer", "slug": "green-grocer" }]), 1, 1),
    );
    let app = TestApp::storefront(&backend).await;

    let response = app.get("/stores").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.text().await.unwrap().contains("Green Grocer"));
    assert_eq!(backend.requests("GET", "/api/stores").len(), 3);
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let backend = FakeBackend::start().await;
    backend.on("GET", "/api/stores/closed-shop", Reply::error(404, "Store not found"));
    backend.on("GET", "/api/stores/closed-shop/products", Reply::page(json!([]), 1, 1));
    let app = TestApp::storefront(&backend).await;

    let response = app.get("/stores/closed-shop").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(backend.requests("GET", "/api/stores/closed-shop").len(), 1);
}

#[tokio::test]
async fn test_login_failure_shows_backend_message() {
    let backend = FakeBackend::start().await;
    backend.on(
        "POST",
        "/api/consumers/login",
        Reply::error(401, "Invalid email or password"),
    );
    let app = TestApp::storefront(&backend).await;

    let response = app
        .post_form("/login", &[("email", "ada@example.com"), ("password", "wrong")])
        .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.text().await.unwrap().contains("Invalid email or password"));
    let sent = backend.requests("POST", "/api/consumers/login");
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].body.as_ref().unwrap()["email"], "ada@example.com");
}

#[tokio::test]
async fn test_checkout_places_order_once_with_token() {
    let (backend, app) = checkout_ready().await;
    backend.on(
        "POST",
        "/api/orders",
        Reply::ok(tracked_order("pending")),
    );

    let response = app
        .post_form(
            "/checkout",
            &[("address_id", "2"), ("zone_id", "4"), ("notes", " Leave at the door ")],
        )
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/orders/77?placed=1");

    let placed = backend.requests("POST", "/api/orders");
    assert_eq!(placed.len(), 1);
    assert_eq!(placed[0].authorization.as_deref(), Some("Bearer consumer-token"));
    assert_eq!(
        placed[0].body,
        Some(json!({ "addressId": "2", "zoneId": "4", "notes": "Leave at the door" }))
    );
}

#[tokio::test]
async fn test_checkout_rejection_rerenders_with_message() {
    let (backend, app) = checkout_ready().await;
    backend.on(
        "POST",
        "/api/orders",
        Reply::error(422, "Green Grocer is closed for orders"),
    );

    let response = app
        .post_form("/checkout", &[("address_id", "2"), ("zone_id", "4")])
        .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(
        response
            .text()
            .await
            .unwrap()
            .contains("Green Grocer is closed for orders")
    );
    assert_eq!(backend.requests("POST", "/api/orders").len(), 1);
}

#[tokio::test]
async fn test_checkout_is_not_retried_on_server_error() {
    let (backend, app) = checkout_ready().await;
    backend.on("POST", "/api/orders", Reply::error(503, "Service unavailable"));

    let response = app
        .post_form("/checkout", &[("address_id", "2"), ("zone_id", "4")])
        .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(
        response
            .text()
            .await
            .unwrap()
            .contains("Something went wrong. Please try again.")
    );
    // Mutations are sent once.
    assert_eq!(backend.requests("POST", "/api/orders").len(), 1);
}

#[tokio::test]
async fn test_checkout_validates_before_calling_backend() {
    let (backend, app) = checkout_ready().await;

    let response = app
        .post_form("/checkout", &[("address_id", "2"), ("zone_id", "")])
        .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(backend.requests("POST", "/api/orders").is_empty());
}

#[tokio::test]
async fn test_expired_token_signs_consumer_out() {
    let backend = FakeBackend::start().await;
    backend.on("POST", "/api/consumers/login", consumer_session());
    backend.on("GET", "/api/orders", Reply::error(401, "Token expired"));
    let app = TestApp::storefront(&backend).await;
    app.sign_in("ada@example.com").await;

    let response = app.get("/orders").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login?expired=1");

    // The session no longer holds the consumer.
    let response = app.get("/cart").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login?next=%2Fcart");
}

#[tokio::test]
async fn test_expired_token_during_htmx_request_redirects_page() {
    let backend = FakeBackend::start().await;
    backend.on("POST", "/api/consumers/login", consumer_session());
    backend.on("POST", "/api/cart/items", Reply::error(401, "Token expired"));
    let app = TestApp::storefront(&backend).await;
    app.sign_in("ada@example.com").await;

    let response = app
        .htmx_post_form("/cart/add", &[("product_id", "10"), ("quantity", "1")])
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["HX-Redirect"], "/login?expired=1");
    assert_eq!(backend.requests("POST", "/api/cart/items").len(), 1);

    let response = app.get("/cart").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login?next=%2Fcart");
}

#[tokio::test]
async fn test_tracking_polls_until_order_is_final() {
    let backend = FakeBackend::start().await;
    backend.on("GET", "/api/orders/track/BZR-0042", Reply::ok(tracked_order("preparing")));
    backend.on("GET", "/api/orders/track/BZR-0042", Reply::ok(tracked_order("delivered")));
    let app = TestApp::storefront(&backend).await;

    let response = app.get("/track/BZR-0042").await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = response.text().await.unwrap();
    assert!(html.contains(r#"hx-get="/track/BZR-0042/status""#));
    assert!(html.contains(r#"hx-trigger="every 15s""#));
    assert!(!html.contains("9 Elm Street"), "tracking page must not show the address");

    let response = app.htmx_get("/track/BZR-0042/status").await;
    assert_eq!(response.status(), StatusCode::OK);
    let fragment = response.text().await.unwrap();
    assert!(fragment.contains("Delivered"));
    assert!(!fragment.contains("hx-trigger"));
}

#[tokio::test]
async fn test_unknown_tracking_number_is_not_found() {
    let backend = FakeBackend::start().await;
    backend.on("GET", "/api/orders/track/BZR-9999", Reply::error(404, "Order not found"));
    let app = TestApp::storefront(&backend).await;

    let response = app.get("/track/BZR-9999").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(
        response
            .text()
            .await
            .unwrap()
            .contains("No order matches that tracking number.")
    );
}
