//! Bazaar storefront library.
//!
//! The public marketplace site: store directory, product catalog, a cart
//! that spans several stores, checkout against delivery zones, and order
//! tracking. All marketplace data comes from the REST backend; `PostgreSQL`
//! only holds sessions.
//!
//! The router is built here so the binary and the integration tests serve
//! the same application.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::{Router, extract::State, http::StatusCode, routing::get};
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tower_sessions::{SessionManagerLayer, SessionStore};
use tracing::Span;

use crate::state::AppState;

/// Directory static assets are served from, relative to the workspace root.
pub const STATIC_DIR: &str = "crates/storefront/static";

/// Build the storefront application.
///
/// Layers, outermost first: Sentry, request tracing, request ID, CSP nonce,
/// security headers, session, session expiry.
pub fn build_router<S>(state: AppState, session_layer: SessionManagerLayer<S>) -> Router
where
    S: SessionStore + Clone,
{
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::routes())
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .layer(axum::middleware::from_fn(
            middleware::session_expiry_middleware,
        ))
        .layer(session_layer)
        .layer(axum::middleware::from_fn(
            middleware::security_headers_middleware,
        ))
        .layer(axum::middleware::from_fn(middleware::csp_nonce_middleware))
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies the session database and the marketplace backend are reachable.
/// Returns 503 Service Unavailable otherwise.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    let (database, backend) = tokio::join!(db::ping(state.pool()), state.marketplace().ping());

    if let Err(e) = &database {
        tracing::warn!(error = %e, "Readiness: database unreachable");
    }
    if let Err(e) = &backend {
        tracing::warn!(error = %e, "Readiness: marketplace backend unreachable");
    }

    if database.is_ok() && backend.is_ok() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;
    use tower_sessions::MemoryStore;

    use super::*;
    use crate::config::StorefrontConfig;

    fn app() -> Router {
        let config = StorefrontConfig::from_lookup(&|key: &str| match key {
            "STOREFRONT_DATABASE_URL" => Some("postgres://localhost/bazaar_test".to_string()),
            "STOREFRONT_BASE_URL" => Some("http://localhost:3000".to_string()),
            // Nothing listens here; handlers under test never reach the backend.
            "MARKETPLACE_API_URL" => Some("http://127.0.0.1:9/api/".to_string()),
            _ => None,
        })
        .unwrap();
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/bazaar_test")
            .unwrap();
        let state = AppState::new(config, pool).unwrap();
        build_router(state, middleware::session_layer(MemoryStore::default(), false))
    }

    #[tokio::test]
    async fn test_health_sets_security_headers() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers["x-frame-options"], "DENY");
        assert!(headers.contains_key("x-request-id"));
        let csp = headers["content-security-policy"].to_str().unwrap();
        assert!(csp.contains("'nonce-"));
        assert!(csp.contains("https://unpkg.com"));
    }

    #[tokio::test]
    async fn test_cart_requires_login() {
        let response = app()
            .oneshot(Request::get("/cart").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], "/login?next=%2Fcart");
    }

    #[tokio::test]
    async fn test_cart_count_is_zero_when_anonymous() {
        let response = app()
            .oneshot(Request::get("/cart/count").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(String::from_utf8_lossy(&body).contains(">0</span>"));
    }
}
