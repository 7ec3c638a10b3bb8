//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                          - Home: featured stores and products
//!
//! # Catalog
//! GET  /stores                    - Store directory (?q=, ?page=)
//! GET  /stores/{slug}             - Store page with its products
//! GET  /products                  - Product listing (?q=, ?category=, ?page=)
//! GET  /products/{id}             - Product detail
//!
//! # Cart (requires auth, HTMX fragments)
//! GET  /cart                      - Cart page grouped by store
//! POST /cart/add                  - Add product (returns count badge)
//! POST /cart/update               - Set quantity (returns cart items)
//! POST /cart/remove               - Remove line (returns cart items)
//! POST /cart/clear                - Empty the cart
//! GET  /cart/count                - Count badge (0 when anonymous)
//!
//! # Checkout (requires auth)
//! GET  /checkout                  - Address, zone and notes form
//! GET  /checkout/summary          - Totals fragment for ?zone_id=
//! POST /checkout                  - Place order
//!
//! # Orders (requires auth)
//! GET  /orders                    - Order history
//! GET  /orders/{id}               - Order detail
//! GET  /orders/{id}/status        - Status fragment (polled)
//!
//! # Tracking (public)
//! GET  /track                     - Lookup form
//! GET  /track/{tracking_number}   - Order status page
//! GET  /track/{tracking_number}/status - Status fragment (polled)
//!
//! # Account (requires auth)
//! GET  /account, POST /account    - Profile
//! GET  /account/addresses         - Address book
//! GET  /account/addresses/new     - New address form
//! POST /account/addresses         - Create address
//! GET  /account/addresses/{id}/edit - Edit address form
//! POST /account/addresses/{id}    - Update address
//! POST /account/addresses/{id}/delete - Delete address
//!
//! # Auth
//! GET  /login, POST /login        - Login (rate limited)
//! GET  /register, POST /register  - Registration (rate limited)
//! POST /logout                    - Logout
//!
//! # Newsletter
//! POST /newsletter                - Subscribe (HTMX fragment)
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod home;
pub mod newsletter;
pub mod orders;
pub mod products;
pub mod stores;
pub mod track;

use axum::{
    Router,
    routing::{get, post},
};
use bazaar_core::api::{ApiError, Page};

use crate::error::AppError;
use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// Create the auth routes router (rate limited).
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .layer(auth_rate_limiter())
        .route("/logout", post(auth::logout))
}

/// Create the catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/stores", get(stores::index))
        .route("/stores/{slug}", get(stores::show))
        .route("/products", get(products::index))
        .route("/products/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/count", get(cart::count))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::show).post(checkout::place_order))
        .route("/summary", get(checkout::summary))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}", get(orders::show))
        .route("/{id}/status", get(orders::status))
}

/// Create the public tracking routes router.
pub fn track_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(track::lookup))
        .route("/{tracking_number}", get(track::show))
        .route("/{tracking_number}/status", get(track::status))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(account::show).post(account::update))
        .route(
            "/addresses",
            get(account::addresses).post(account::create_address),
        )
        .route("/addresses/new", get(account::new_address))
        .route("/addresses/{id}", post(account::update_address))
        .route("/addresses/{id}/edit", get(account::edit_address))
        .route("/addresses/{id}/delete", post(account::delete_address))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .merge(catalog_routes())
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
        .nest("/orders", order_routes())
        .nest("/track", track_routes())
        .nest("/account", account_routes())
        .merge(auth_routes())
        .route("/newsletter", post(newsletter::subscribe))
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

    /// Whether there is more than one page.
    #[must_use]
    pub const fn is_paginated(&self) -> bool {
        self.total_pages > 1
    }
}

/// Turn a backend failure into a message shown next to a form.
///
/// An expired token still propagates so the session is cleared and the
/// consumer is sent to the login page.
///
/// # Errors
///
/// Returns the error unchanged when it is `ApiError::Unauthorized`.
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

#[cfg(test)]
mod tests {
    use super::*;

    fn page(current: u32, total_pages: u32) -> Page<()> {
        Page {
            items: Vec::new(),
            page: current,
            total_pages,
            total: None,
        }
    }

    #[test]
    fn test_pagination_links_keep_filters() {
        let view = PaginationView::new(
            &page(2, 3),
            "/products",
            &[("q", Some("rye bread")), ("category", None)],
        );
        assert_eq!(view.prev_url.as_deref(), Some("/products?q=rye+bread"));
        assert_eq!(view.next_url.as_deref(), Some("/products?q=rye+bread&page=3"));
        assert!(view.is_paginated());
    }

    #[test]
    fn test_pagination_single_page() {
        let view = PaginationView::new(&page(1, 1), "/stores", &[]);
        assert_eq!(view.prev_url, None);
        assert_eq!(view.next_url, None);
        assert!(!view.is_paginated());
    }

    #[test]
    fn test_inline_error() {
        let message = inline_error(ApiError::Rejected("Out of stock".to_string()));
        assert_eq!(message.ok().as_deref(), Some("Out of stock"));
        assert!(inline_error(ApiError::Unauthorized("expired".to_string())).is_err());
    }

    #[test]
    fn test_format_datetime() {
        let at = chrono::DateTime::parse_from_rfc3339("2024-05-01T09:05:00Z")
            .map(|d| d.with_timezone(&chrono::Utc))
            .ok();
        assert_eq!(at.map(|at| format_datetime(&at)).as_deref(), Some("May 1, 2024 09:05 UTC"));
    }
}
