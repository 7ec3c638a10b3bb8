//! Product listing and detail route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use bazaar_core::{CurrencyCode, Price, Product};
use serde::Deserialize;
use tracing::instrument;

use crate::backend::CatalogQuery;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::PageContext;
use crate::routes::PaginationView;
use crate::state::AppState;

/// Product display data for listing cards.
#[derive(Debug, Clone)]
pub struct ProductCardView {
    pub id: String,
    pub url: String,
    pub name: String,
    pub store_name: Option<String>,
    pub store_url: String,
    pub price: String,
    /// Shown struck through when above the price.
    pub compare_at_price: Option<String>,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub can_purchase: bool,
}

impl ProductCardView {
    /// Build the card for a product, formatting amounts in `currency`.
    #[must_use]
    pub fn new(product: &Product, currency: CurrencyCode) -> Self {
        Self {
            id: product.id.to_string(),
            url: format!("/products/{}", urlencoding::encode(product.id.as_str())),
            name: product.name.clone(),
            store_name: product.store_name.clone(),
            // The backend resolves stores by id as well as by slug.
            store_url: format!("/stores/{}", urlencoding::encode(product.store_id.as_str())),
            price: Price::new(product.price, currency).display(),
            compare_at_price: product
                .compare_at_price
                .filter(|compare| *compare > product.price)
                .map(|compare| Price::new(compare, currency).display()),
            image_url: product.primary_image().map(str::to_string),
            category: product.category.clone().filter(|c| !c.is_empty()),
            can_purchase: product.can_purchase(),
        }
    }
}

/// Product detail page data.
#[derive(Debug, Clone)]
pub struct ProductDetailView {
    pub card: ProductCardView,
    pub description: Option<String>,
    pub images: Vec<String>,
    /// Remaining stock when the backend tracks it and it is low.
    pub low_stock: Option<i64>,
}

/// Stock at or below this is called out on the product page.
const LOW_STOCK_THRESHOLD: i64 = 5;

impl ProductDetailView {
    #[must_use]
    pub fn new(product: &Product, currency: CurrencyCode) -> Self {
        let mut images = product.images.clone();
        if let Some(primary) = &product.image_url
            && !images.contains(primary)
        {
            images.insert(0, primary.clone());
        }

        Self {
            card: ProductCardView::new(product, currency),
            description: product.description.clone().filter(|d| !d.is_empty()),
            images,
            low_stock: product
                .stock
                .filter(|stock| (1..=LOW_STOCK_THRESHOLD).contains(stock)),
        }
    }
}

/// Listing query parameters.
#[derive(Debug, Deserialize)]
pub struct ProductsQuery {
    pub q: Option<String>,
    pub category: Option<String>,
    pub page: Option<u32>,
}

/// Product listing template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub page: PageContext,
    pub products: Vec<ProductCardView>,
    pub search: String,
    pub category: String,
    pub pagination: PaginationView,
}

/// Product detail template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub page: PageContext,
    pub product: ProductDetailView,
}

/// Display the product listing.
#[instrument(skip(state, page))]
pub async fn index(
    State(state): State<AppState>,
    page: PageContext,
    Query(query): Query<ProductsQuery>,
) -> Result<impl IntoResponse> {
    let query = CatalogQuery::new(query.q.as_deref(), query.category.as_deref(), query.page);
    let products = state.marketplace().products(&query).await?;
    let pagination = PaginationView::new(
        &products,
        "/products",
        &[
            ("q", query.search.as_deref()),
            ("category", query.category.as_deref()),
        ],
    );

    let currency = state.currency();
    Ok(ProductsIndexTemplate {
        page,
        products: products
            .items
            .iter()
            .map(|p| ProductCardView::new(p, currency))
            .collect(),
        search: query.search.unwrap_or_default(),
        category: query.category.unwrap_or_default(),
        pagination,
    })
}

/// Display a product.
#[instrument(skip(state, page))]
pub async fn show(
    State(state): State<AppState>,
    page: PageContext,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let product = state.marketplace().product(&id).await.map_err(|e| {
        if e.is_not_found() {
            AppError::NotFound("that product".to_string())
        } else {
            e.into()
        }
    })?;

    Ok(ProductShowTemplate {
        page,
        product: ProductDetailView::new(&product, state.currency()),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(json: &str) -> Product {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_card_hides_lower_compare_at_price() {
        let p = product(
            r#"{"id": 9, "storeId": 2, "name": "Mango", "price": "3.00", "compareAtPrice": "2.50"}"#,
        );
        let card = ProductCardView::new(&p, CurrencyCode::USD);
        assert_eq!(card.price, "$3.00");
        assert_eq!(card.compare_at_price, None);
        assert_eq!(card.url, "/products/9");
        assert_eq!(card.store_url, "/stores/2");
    }

    #[test]
    fn test_card_shows_sale_price() {
        let p = product(
            r#"{"id": 9, "storeId": 2, "name": "Mango", "price": 3, "compareAtPrice": 4.5}"#,
        );
        let card = ProductCardView::new(&p, CurrencyCode::EUR);
        assert_eq!(card.compare_at_price.as_deref(), Some("€4.50"));
    }

    #[test]
    fn test_detail_merges_images_and_low_stock() {
        let p = product(
            r#"{"id": 1, "storeId": 1, "name": "Tea", "price": 5, "imageUrl": "a.jpg",
                "images": ["b.jpg", "a.jpg"], "stock": 3}"#,
        );
        let detail = ProductDetailView::new(&p, CurrencyCode::USD);
        assert_eq!(detail.images, vec!["b.jpg", "a.jpg"]);
        assert_eq!(detail.low_stock, Some(3));

        let p = product(r#"{"id": 1, "storeId": 1, "name": "Tea", "price": 5, "imageUrl": "a.jpg", "stock": 40}"#);
        let detail = ProductDetailView::new(&p, CurrencyCode::USD);
        assert_eq!(detail.images, vec!["a.jpg"]);
        assert_eq!(detail.low_stock, None);
    }
}
