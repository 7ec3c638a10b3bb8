//! Merchant dashboard against a scripted marketplace backend.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use bazaar_integration_tests::{FakeBackend, Reply, TestApp, location};
use reqwest::StatusCode;
use serde_json::{Value, json};

fn order(id: u32, status: &str, total: &str, quantity: u32) -> Value {
    json!({
        "id": id,
        "trackingNumber": format!("BZR-{id:04}"),
        "status": status,
        "customerName": "Noor",
        "items": [{ "productId": 7, "productName": "Wildflower Honey", "unitPrice": "8.00", "quantity": quantity }],
        "subtotal": total,
        "total": total,
        "createdAt": "2024-06-02T08:15:00Z"
    })
}

/// A dashboard with a signed-in merchant.
async fn signed_in() -> (FakeBackend, TestApp) {
    let backend = FakeBackend::start().await;
    backend.on(
        "POST",
        "/api/merchants/login",
        Reply::ok(json!({
            "token": "merchant-token",
            "merchant": { "id": 9, "name": "Hive & Co", "email": "hive@example.com", "storeId": 1 }
        })),
    );
    let app = TestApp::dashboard(&backend).await;
    app.sign_in("hive@example.com").await;
    (backend, app)
}

#[tokio::test]
async fn test_overview_shows_metrics_and_polls() {
    let (backend, app) = signed_in().await;
    backend.on(
        "GET",
        "/api/merchants/me/orders",
        Reply::page(
            json!([
                order(1, "pending", "8.00", 1),
                order(2, "delivered", "24.00", 3),
                order(3, "cancelled", "80.00", 10)
            ]),
            1,
            1,
        ),
    );
    backend.on(
        "GET",
        "/api/merchants/me/store",
        Reply::ok(json!({ "id": 1, "name": "Hive & Co", "slug": "hive", "isOpen": true })),
    );

    let response = app.get("/").await;

    assert_eq!(response.status(), StatusCode::OK);
    let html = response.text().await.unwrap();
    assert!(html.contains("$32.00"), "revenue leaves out the cancelled order");
    assert!(html.contains("$16.00"), "average order value");
    assert!(html.contains("Wildflower Honey"));
    assert!(html.contains(r#"hx-get="/metrics""#));
    assert!(html.contains(r#"hx-trigger="every 20s""#));

    let sent = backend.requests("GET", "/api/merchants/me/orders");
    assert_eq!(sent[0].query_param("limit").as_deref(), Some("100"));
    assert_eq!(sent[0].authorization.as_deref(), Some("Bearer merchant-token"));

    let fragment = app.htmx_get("/metrics").await;
    assert_eq!(fragment.status(), StatusCode::OK);
    let fragment = fragment.text().await.unwrap();
    assert!(fragment.contains(r#"<section id="metrics""#));
    assert!(!fragment.contains("<html"));
}

#[tokio::test]
async fn test_overview_survives_backend_outage() {
    let (backend, app) = signed_in().await;
    backend.on("GET", "/api/merchants/me/orders", Reply::error(503, "Down for maintenance"));
    backend.on("GET", "/api/merchants/me/store", Reply::error(503, "Down for maintenance"));

    let response = app.get("/").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.text().await.unwrap().contains("Something went wrong"));
    // Reads are retried before giving up.
    assert_eq!(backend.requests("GET", "/api/merchants/me/orders").len(), 3);
}

#[tokio::test]
async fn test_status_change_sends_patch_and_redirects() {
    let (backend, app) = signed_in().await;
    backend.on(
        "PATCH",
        "/api/merchants/me/orders/31/status",
        Reply::ok(order(31, "ready", "8.00", 1)),
    );

    let response = app.post_form("/orders/31/status", &[("status", "ready")]).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/orders/31?updated=1");
    let sent = backend.requests("PATCH", "/api/merchants/me/orders/31/status");
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].body, Some(json!({ "status": "ready" })));
}

#[tokio::test]
async fn test_refused_status_change_shows_backend_message() {
    let (backend, app) = signed_in().await;
    backend.on(
        "PATCH",
        "/api/merchants/me/orders/31/status",
        Reply::error(422, "Delivered orders cannot change status"),
    );
    backend.on(
        "GET",
        "/api/merchants/me/orders/31",
        Reply::ok(order(31, "delivered", "8.00", 1)),
    );

    let response = app.post_form("/orders/31/status", &[("status", "pending")]).await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(
        response
            .text()
            .await
            .unwrap()
            .contains("Delivered orders cannot change status")
    );
    assert_eq!(
        backend
            .requests("PATCH", "/api/merchants/me/orders/31/status")
            .len(),
        1
    );
}

#[tokio::test]
async fn test_unknown_status_is_rejected_locally() {
    let (backend, app) = signed_in().await;

    let response = app.post_form("/orders/31/status", &[("status", "teleported")]).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(
        backend
            .requests("PATCH", "/api/merchants/me/orders/31/status")
            .is_empty()
    );
}

#[tokio::test]
async fn test_invalid_product_never_reaches_backend() {
    let (backend, app) = signed_in().await;

    let response = app
        .post_form(
            "/products",
            &[("name", "Comb honey"), ("price", "-2"), ("stock", "3")],
        )
        .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(
        response
            .text()
            .await
            .unwrap()
            .contains("Price must be a number of zero or more.")
    );
    assert!(backend.requests("POST", "/api/merchants/me/products").is_empty());
}

#[tokio::test]
async fn test_product_create_sends_payload() {
    let (backend, app) = signed_in().await;
    backend.on(
        "POST",
        "/api/merchants/me/products",
        Reply::ok(json!({ "id": 40, "storeId": 1, "name": "Comb honey", "price": "12.50" })),
    );

    let response = app
        .post_form(
            "/products",
            &[
                ("name", "Comb honey"),
                ("price", "12.50"),
                ("stock", ""),
                ("is_available", "on"),
            ],
        )
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/products?saved=created");
    let sent = backend.requests("POST", "/api/merchants/me/products");
    let body = sent[0].body.as_ref().unwrap();
    assert_eq!(body["name"], "Comb honey");
    assert_eq!(body["price"], "12.50");
    assert_eq!(body["isAvailable"], true);
    assert!(body.get("stock").is_none());
}

#[tokio::test]
async fn test_expired_token_signs_merchant_out() {
    let (backend, app) = signed_in().await;
    backend.on("GET", "/api/merchants/me/orders", Reply::error(401, "Token expired"));

    let response = app.get("/orders").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login?expired=1");

    // Signed out now, so the fragment asks for a plain login.
    let response = app.htmx_get("/metrics").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["HX-Redirect"], "/login");
}

#[tokio::test]
async fn test_expired_token_during_metrics_poll_redirects_page() {
    let (backend, app) = signed_in().await;
    backend.on("GET", "/api/merchants/me/orders", Reply::error(401, "Token expired"));

    let response = app.htmx_get("/metrics").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["HX-Redirect"], "/login?expired=1");
    assert_eq!(backend.requests("GET", "/api/merchants/me/orders").len(), 1);

    let response = app.get("/orders").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login?next=%2Forders");
}
