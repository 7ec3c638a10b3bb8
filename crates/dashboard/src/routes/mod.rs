//! HTTP route handlers for the dashboard.
//!
//! # Route Structure
//!
//! ```text
//! GET  /login                  - Login page
//! POST /login                  - Sign in (rate limited)
//! POST /logout                 - Sign out
//!
//! # Overview
//! GET  /                       - Metrics and recent orders
//! GET  /metrics                - Metrics fragment (HTMX polling)
//!
//! # Orders
//! GET  /orders                 - Order list (?status=, ?page=)
//! GET  /orders/{id}            - Order detail
//! POST /orders/{id}/status     - Change status
//!
//! # Products
//! GET  /products               - Product list (?q=, ?page=)
//! POST /products               - Create product
//! GET  /products/new           - New product form
//! POST /products/{id}          - Update product
//! GET  /products/{id}/edit     - Edit product form
//! POST /products/{id}/delete   - Delete product
//!
//! # Store
//! GET  /store                  - Store settings
//! POST /store                  - Save store settings
//!
//! # Zones
//! GET  /zones                  - Delivery zones (read-only)
//! ```

pub mod auth;
pub mod orders;
pub mod overview;
pub mod products;
pub mod store;
pub mod zones;

use axum::{
    Router,
    routing::{get, post},
};
use bazaar_core::api::Page;

use crate::backend::ApiError;
use crate::error::AppError;
use crate::middleware::login_rate_limiter;
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .layer(login_rate_limiter())
        .route("/logout", post(auth::logout))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}", get(orders::show))
        .route("/{id}/status", post(orders::update_status))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route("/new", get(products::new))
        .route("/{id}", post(products::update))
        .route("/{id}/edit", get(products::edit))
        .route("/{id}/delete", post(products::delete))
}

/// Create all routes for the dashboard.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(overview::index))
        .route("/metrics", get(overview::metrics))
        .nest("/orders", order_routes())
        .nest("/products", product_routes())
        .route("/store", get(store::show).post(store::update))
        .route("/zones", get(zones::index))
        .merge(auth_routes())
}

// =============================================================================
// Shared View Helpers
// =============================================================================

/// Previous/next links for a paginated list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationView {
    pub current: u32,
    pub total_pages: u32,
    pub prev_url: Option<String>,
    pub next_url: Option<String>,
}

impl PaginationView {
    /// Build links for `page`, keeping the non-empty `params` in each URL.
    #[must_use]
    pub fn new<T>(page: &Page<T>, path: &str, params: &[(&str, Option<&str>)]) -> Self {
        let link = |number: u32| {
            let mut query = url::form_urlencoded::Serializer::new(String::new());
            for (key, value) in params {
                if let Some(value) = value.filter(|v| !v.is_empty()) {
                    query.append_pair(key, value);
                }
            }
            if number > 1 {
                query.append_pair("page", &number.to_string());
            }
            let query = query.finish();
            if query.is_empty() {
                path.to_string()
            } else {
                format!("{path}?{query}")
            }
        };

        Self {
            current: page.page,
            total_pages: page.total_pages,
            prev_url: page.has_previous().then(|| link(page.page - 1)),
            next_url: page.has_next().then(|| link(page.page + 1)),
        }
    }

    #[must_use]
    pub const fn is_paginated(&self) -> bool {
        self.total_pages > 1
    }
}

/// Turn a backend failure into a message shown next to a form.
///
/// # Errors
///
/// Returns the error unchanged when it is `ApiError::Unauthorized`, so the
/// session expiry middleware can sign the merchant out.
pub fn inline_error(err: ApiError) -> Result<String, AppError> {
    if err.is_unauthorized() {
        return Err(err.into());
    }
    if err.is_transient() {
        tracing::warn!(error = %err, "Backend unavailable");
    }
    Ok(err.user_message())
}

/// Format a timestamp for display.
#[must_use]
pub fn format_datetime(at: &chrono::DateTime<chrono::Utc>) -> String {
    at.format("%b %-d, %Y %H:%M UTC").to_string()
}

/// Trimmed text, or `None` when blank.
#[must_use]
pub fn optional_text(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Validate an optional absolute `http(s)` URL.
///
/// # Errors
///
/// Returns a message naming `label` when the value is not such a URL.
pub fn optional_http_url(label: &str, value: &str) -> Result<Option<String>, String> {
    let Some(value) = optional_text(value) else {
        return Ok(None);
    };
    match url::Url::parse(&value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.host_str().is_some() => {
            Ok(Some(value))
        }
        _ => Err(format!("{label} must be a full http:// or https:// address")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_keeps_status_filter() {
        let page: Page<()> = Page {
            items: Vec::new(),
            page: 2,
            total_pages: 2,
            total: None,
        };
        let view = PaginationView::new(&page, "/orders", &[("status", Some("pending"))]);
        assert_eq!(view.prev_url.as_deref(), Some("/orders?status=pending"));
        assert_eq!(view.next_url, None);
    }

    #[test]
    fn test_optional_http_url() {
        assert_eq!(optional_http_url("Image URL", "  "), Ok(None));
        assert_eq!(
            optional_http_url("Image URL", "https://cdn.example/a.png"),
            Ok(Some("https://cdn.example/a.png".to_string()))
        );
        assert!(optional_http_url("Image URL", "ftp://cdn.example/a.png").is_err());
        assert!(optional_http_url("Image URL", "/relative.png").is_err());
        assert!(optional_http_url("Image URL", "javascript:alert(1)").is_err());
    }

    #[test]
    fn test_inline_error_propagates_unauthorized() {
        assert!(inline_error(ApiError::Unauthorized("expired".into())).is_err());
        assert_eq!(
            inline_error(ApiError::Api {
                status: 422,
                message: "Slug taken".into()
            })
            .ok()
            .as_deref(),
            Some("Slug taken")
        );
    }
}
