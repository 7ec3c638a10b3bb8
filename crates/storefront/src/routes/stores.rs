//! Store directory and store page route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use bazaar_core::Store;
use serde::Deserialize;
use tracing::instrument;

use crate::backend::CatalogQuery;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::PageContext;
use crate::routes::PaginationView;
use crate::routes::products::ProductCardView;
use crate::state::AppState;

/// Store display data for directory cards.
#[derive(Debug, Clone)]
pub struct StoreCardView {
    pub name: String,
    pub url: String,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub is_open: bool,
    pub rating: Option<String>,
}

impl From<&Store> for StoreCardView {
    fn from(store: &Store) -> Self {
        Self {
            name: store.name.clone(),
            url: format!("/stores/{}", urlencoding::encode(&store.slug)),
            description: store.description.clone().filter(|d| !d.is_empty()),
            logo_url: store.logo_url.clone(),
            is_open: store.is_open,
            rating: store.rating.map(|r| format!("{:.1}", r.round_dp(1))),
        }
    }
}

/// Store page header data.
#[derive(Debug, Clone)]
pub struct StoreDetailView {
    pub card: StoreCardView,
    pub banner_url: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
}

impl From<&Store> for StoreDetailView {
    fn from(store: &Store) -> Self {
        Self {
            card: StoreCardView::from(store),
            banner_url: store.banner_url.clone(),
            address: store.address.clone().filter(|a| !a.is_empty()),
            phone: store.phone.clone().filter(|p| !p.is_empty()),
        }
    }
}

/// Directory query parameters.
#[derive(Debug, Deserialize)]
pub struct StoresQuery {
    pub q: Option<String>,
    pub page: Option<u32>,
}

/// Store page query parameters.
#[derive(Debug, Deserialize)]
pub struct StoreQuery {
    pub page: Option<u32>,
}

/// Store directory template.
#[derive(Template, WebTemplate)]
#[template(path = "stores/index.html")]
pub struct StoresIndexTemplate {
    pub page: PageContext,
    pub stores: Vec<StoreCardView>,
    pub search: String,
    pub pagination: PaginationView,
}

/// Store page template.
#[derive(Template, WebTemplate)]
#[template(path = "stores/show.html")]
pub struct StoreShowTemplate {
    pub page: PageContext,
    pub store: StoreDetailView,
    pub products: Vec<ProductCardView>,
    pub pagination: PaginationView,
}

/// Display the store directory.
#[instrument(skip(state, page))]
pub async fn index(
    State(state): State<AppState>,
    page: PageContext,
    Query(query): Query<StoresQuery>,
) -> Result<impl IntoResponse> {
    let query = CatalogQuery::new(query.q.as_deref(), None, query.page);
    let stores = state.marketplace().stores(&query).await?;
    let pagination = PaginationView::new(&stores, "/stores", &[("q", query.search.as_deref())]);

    Ok(StoresIndexTemplate {
        page,
        stores: stores.items.iter().map(StoreCardView::from).collect(),
        search: query.search.unwrap_or_default(),
        pagination,
    })
}

/// Display a store and its products.
#[instrument(skip(state, page))]
pub async fn show(
    State(state): State<AppState>,
    page: PageContext,
    Path(slug): Path<String>,
    Query(query): Query<StoreQuery>,
) -> Result<impl IntoResponse> {
    let marketplace = state.marketplace();
    let page_number = query.page.unwrap_or(1).max(1);

    let (store, products) = tokio::join!(
        marketplace.store(&slug),
        marketplace.store_products(&slug, page_number)
    );

    let store = store.map_err(|e| {
        if e.is_not_found() {
            AppError::NotFound("that store".to_string())
        } else {
            e.into()
        }
    })?;
    let products = products?;

    let currency = state.currency();
    let path = format!("/stores/{}", urlencoding::encode(&slug));
    Ok(StoreShowTemplate {
        page,
        store: StoreDetailView::from(&store),
        products: products
            .items
            .iter()
            .map(|p| ProductCardView::new(p, currency))
            .collect(),
        pagination: PaginationView::new(&products, &path, &[]),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_store_card_view() {
        let store: Store = serde_json::from_str(
            r#"{"id": 4, "name": "Green Grocer", "slug": "green grocer", "description": "", "rating": "4.66"}"#,
        )
        .unwrap();
        let view = StoreCardView::from(&store);
        assert_eq!(view.url, "/stores/green%20grocer");
        assert_eq!(view.description, None);
        assert_eq!(view.rating.as_deref(), Some("4.7"));
        assert!(view.is_open);
    }
}
