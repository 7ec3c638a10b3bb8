//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use crate::backend::{CatalogQuery, Page};
use crate::filters;
use crate::middleware::PageContext;
use crate::routes::products::ProductCardView;
use crate::routes::stores::StoreCardView;
use crate::state::AppState;

/// Number of stores featured on the home page.
const FEATURED_STORES: usize = 6;

/// Number of products featured on the home page.
const FEATURED_PRODUCTS: usize = 8;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub page: PageContext,
    pub stores: Vec<StoreCardView>,
    pub products: Vec<ProductCardView>,
    /// Set when the catalog could not be loaded.
    pub unavailable: bool,
}

/// Display the home page.
///
/// Stores and products are fetched concurrently. A backend failure degrades
/// to empty sections rather than an error page.
#[instrument(skip(state, page))]
pub async fn home(State(state): State<AppState>, page: PageContext) -> impl IntoResponse {
    let marketplace = state.marketplace();
    let query = CatalogQuery::new(None, None, None);
    let (stores, products) = tokio::join!(marketplace.stores(&query), marketplace.products(&query));

    let unavailable = stores.is_err() && products.is_err();
    let stores = stores.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load featured stores");
        Page::empty()
    });
    let products = products.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load featured products");
        Page::empty()
    });

    let currency = state.currency();
    HomeTemplate {
        page,
        stores: stores
            .items
            .iter()
            .take(FEATURED_STORES)
            .map(StoreCardView::from)
            .collect(),
        products: products
            .items
            .iter()
            .take(FEATURED_PRODUCTS)
            .map(|p| ProductCardView::new(p, currency))
            .collect(),
        unavailable,
    }
}
