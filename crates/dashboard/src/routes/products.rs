//! Product management route handlers.
//!
//! Forms are checked here before anything is sent, so simple mistakes come
//! back with every problem listed at once. The backend may still refuse a
//! product (e.g. a duplicate name); its message is shown the same way.

use std::str::FromStr;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use bazaar_core::{CurrencyCode, Price, Product, ProductId};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use crate::backend::{ApiError, ProductInput};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{PageContext, RequireMerchant};
use crate::routes::{PaginationView, inline_error, optional_http_url, optional_text};
use crate::state::AppState;

/// Longest accepted product name, in characters.
pub const MAX_NAME_LENGTH: usize = 120;

// =============================================================================
// Form
// =============================================================================

/// Product form data, as submitted and as re-rendered.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub compare_at_price: String,
    #[serde(default)]
    pub stock: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub category: String,
    /// Checkbox; present when ticked.
    pub is_available: Option<String>,
}

impl ProductForm {
    /// Whether the availability box is ticked.
    #[must_use]
    pub const fn available(&self) -> bool {
        self.is_available.is_some()
    }

    /// Validate the form into a backend payload.
    ///
    /// # Errors
    ///
    /// Returns every problem found, in form order.
    pub fn to_input(&self) -> std::result::Result<ProductInput, Vec<String>> {
        let mut errors = Vec::new();

        let name = self.name.trim();
        if name.is_empty() {
            errors.push("Name is required.".to_string());
        } else if name.chars().count() > MAX_NAME_LENGTH {
            errors.push(format!(
                "Name must be at most {MAX_NAME_LENGTH} characters."
            ));
        }

        let price = match parse_amount(&self.price) {
            Some(Ok(price)) => Some(price),
            Some(Err(())) | None => {
                errors.push("Price must be a number of zero or more.".to_string());
                None
            }
        };

        let compare_at_price = match parse_amount(&self.compare_at_price) {
            None => None,
            Some(Ok(compare)) => {
                if price.is_some_and(|p| compare < p) {
                    errors.push(
                        "Compare-at price must not be lower than the price.".to_string(),
                    );
                }
                Some(compare)
            }
            Some(Err(())) => {
                errors.push("Compare-at price must be a number of zero or more.".to_string());
                None
            }
        };

        let stock = match optional_text(&self.stock) {
            None => None,
            Some(raw) => match raw.parse::<i64>() {
                Ok(stock) if stock >= 0 => Some(stock),
                _ => {
                    errors.push("Stock must be a whole number of zero or more.".to_string());
                    None
                }
            },
        };

        let image_url = optional_http_url("Image URL", &self.image_url).unwrap_or_else(|e| {
            errors.push(format!("{e}."));
            None
        });

        match price {
            Some(price) if errors.is_empty() => Ok(ProductInput {
                name: name.to_string(),
                description: optional_text(&self.description),
                price,
                compare_at_price,
                stock,
                image_url,
                category: optional_text(&self.category),
                is_available: self.available(),
            }),
            _ => Err(errors),
        }
    }
}

/// Parse an optional non-negative money amount.
///
/// `None` when blank, `Some(Err(()))` when not a non-negative number.
fn parse_amount(raw: &str) -> Option<std::result::Result<Decimal, ()>> {
    let raw = optional_text(raw)?;
    Some(
        Decimal::from_str(raw.trim_start_matches('$'))
            .ok()
            .filter(|amount| !amount.is_sign_negative() || amount.is_zero())
            .ok_or(()),
    )
}

impl From<&Product> for ProductForm {
    fn from(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone().unwrap_or_default(),
            price: product.price.to_string(),
            compare_at_price: product
                .compare_at_price
                .map(|p| p.to_string())
                .unwrap_or_default(),
            stock: product.stock.map(|s| s.to_string()).unwrap_or_default(),
            image_url: product.image_url.clone().unwrap_or_default(),
            category: product.category.clone().unwrap_or_default(),
            is_available: product.is_available.then(|| "on".to_string()),
        }
    }
}

// =============================================================================
// Views and Templates
// =============================================================================

/// One row of the product table.
#[derive(Debug, Clone)]
pub struct ProductRow {
    pub name: String,
    pub edit_url: String,
    pub delete_url: String,
    pub price: String,
    pub compare_at_price: Option<String>,
    pub stock: String,
    pub category: Option<String>,
    pub available: bool,
    pub image_url: Option<String>,
}

/// Path of one product, with the id percent-encoded.
fn product_url(id: &ProductId) -> String {
    format!("/products/{}", urlencoding::encode(id.as_str()))
}

impl ProductRow {
    #[must_use]
    pub fn new(product: &Product, currency: CurrencyCode) -> Self {
        let base = product_url(&product.id);
        Self {
            name: product.name.clone(),
            edit_url: format!("{base}/edit"),
            delete_url: format!("{base}/delete"),
            price: Price::new(product.price, currency).display(),
            compare_at_price: product
                .compare_at_price
                .map(|p| Price::new(p, currency).display()),
            stock: product
                .stock
                .map_or_else(|| "Untracked".to_string(), |s| s.to_string()),
            category: product.category.clone(),
            available: product.can_purchase(),
            image_url: product.primary_image().map(str::to_string),
        }
    }
}

/// Product list template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub page: PageContext,
    pub products: Vec<ProductRow>,
    pub query: String,
    pub pagination: PaginationView,
    pub notice: Option<&'static str>,
}

/// Product create/edit form template.
#[derive(Template, WebTemplate)]
#[template(path = "products/form.html")]
pub struct ProductFormTemplate {
    pub page: PageContext,
    /// Where the form posts.
    pub action: String,
    pub editing: bool,
    pub form: ProductForm,
    pub errors: Vec<String>,
    pub max_name: usize,
}

impl ProductFormTemplate {
    fn new(page: PageContext, id: Option<&ProductId>, form: ProductForm, errors: Vec<String>) -> Self {
        Self {
            page,
            action: id.map_or_else(|| "/products".to_string(), product_url),
            editing: id.is_some(),
            form,
            errors,
            max_name: MAX_NAME_LENGTH,
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Query parameters for the product list.
#[derive(Debug, Deserialize)]
pub struct ProductsQuery {
    pub q: Option<String>,
    pub page: Option<u32>,
    /// Set after a create, update or delete.
    pub saved: Option<String>,
}

/// List the merchant's products.
#[instrument(skip(state, page, merchant))]
pub async fn index(
    State(state): State<AppState>,
    page: PageContext,
    RequireMerchant(merchant): RequireMerchant,
    Query(query): Query<ProductsQuery>,
) -> Result<impl IntoResponse> {
    let search = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty());
    let products = state
        .marketplace()
        .my_products(&merchant.token, search, query.page.unwrap_or(1))
        .await?;

    let currency = state.currency();
    Ok(ProductsIndexTemplate {
        page,
        pagination: PaginationView::new(&products, "/products", &[("q", search)]),
        products: products
            .items
            .iter()
            .map(|p| ProductRow::new(p, currency))
            .collect(),
        query: search.unwrap_or_default().to_string(),
        notice: match query.saved.as_deref() {
            Some("created") => Some("Product created."),
            Some("updated") => Some("Product saved."),
            Some("deleted") => Some("Product deleted."),
            _ => None,
        },
    })
}

/// Display an empty product form.
#[instrument(skip(page, _merchant))]
pub async fn new(page: PageContext, RequireMerchant(_merchant): RequireMerchant) -> impl IntoResponse {
    let form = ProductForm {
        is_available: Some("on".to_string()),
        ..ProductForm::default()
    };
    ProductFormTemplate::new(page, None, form, Vec::new())
}

/// Create a product.
#[instrument(skip(state, page, merchant, form), fields(name = %form.name))]
pub async fn create(
    State(state): State<AppState>,
    page: PageContext,
    RequireMerchant(merchant): RequireMerchant,
    Form(form): Form<ProductForm>,
) -> Result<Response> {
    let input = match form.to_input() {
        Ok(input) => input,
        Err(errors) => return Ok(rerender(page, None, form, errors)),
    };

    match state
        .marketplace()
        .create_product(&merchant.token, &input)
        .await
    {
        Ok(product) => {
            tracing::info!(product_id = %product.id, "Product created");
            Ok(Redirect::to("/products?saved=created").into_response())
        }
        Err(e) => Ok(rerender(page, None, form, vec![inline_error(e)?])),
    }
}

/// Display the edit form for a product.
#[instrument(skip(state, page, merchant))]
pub async fn edit(
    State(state): State<AppState>,
    page: PageContext,
    RequireMerchant(merchant): RequireMerchant,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let id = ProductId::new(id);
    let product = state
        .marketplace()
        .my_product(&merchant.token, &id)
        .await
        .map_err(not_found)?;

    Ok(ProductFormTemplate::new(
        page,
        Some(&id),
        ProductForm::from(&product),
        Vec::new(),
    ))
}

/// Save changes to a product.
#[instrument(skip(state, page, merchant, form), fields(name = %form.name))]
pub async fn update(
    State(state): State<AppState>,
    page: PageContext,
    RequireMerchant(merchant): RequireMerchant,
    Path(id): Path<String>,
    Form(form): Form<ProductForm>,
) -> Result<Response> {
    let id = ProductId::new(id);
    let input = match form.to_input() {
        Ok(input) => input,
        Err(errors) => return Ok(rerender(page, Some(&id), form, errors)),
    };

    match state
        .marketplace()
        .update_product(&merchant.token, &id, &input)
        .await
    {
        Ok(_) => {
            tracing::info!(product_id = %id, "Product updated");
            Ok(Redirect::to("/products?saved=updated").into_response())
        }
        Err(e) if e.is_not_found() => Err(not_found(e)),
        Err(e) => Ok(rerender(page, Some(&id), form, vec![inline_error(e)?])),
    }
}

/// Delete a product.
#[instrument(skip(state, merchant))]
pub async fn delete(
    State(state): State<AppState>,
    RequireMerchant(merchant): RequireMerchant,
    Path(id): Path<String>,
) -> Result<Response> {
    let id = ProductId::new(id);
    state
        .marketplace()
        .delete_product(&merchant.token, &id)
        .await
        .map_err(not_found)?;

    tracing::info!(product_id = %id, "Product deleted");
    Ok(Redirect::to("/products?saved=deleted").into_response())
}

fn rerender(
    page: PageContext,
    id: Option<&ProductId>,
    form: ProductForm,
    errors: Vec<String>,
) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        ProductFormTemplate::new(page, id, form, errors),
    )
        .into_response()
}

fn not_found(err: ApiError) -> AppError {
    if err.is_not_found() {
        AppError::NotFound("that product".to_string())
    } else {
        err.into()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn form() -> ProductForm {
        ProductForm {
            name: "  Rye loaf ".to_string(),
            description: String::new(),
            price: "4.50".to_string(),
            compare_at_price: String::new(),
            stock: "10".to_string(),
            image_url: "https://cdn.example/rye.jpg".to_string(),
            category: "Bakery".to_string(),
            is_available: Some("on".to_string()),
        }
    }

    #[test]
    fn test_valid_form() {
        let input = form().to_input().unwrap();
        assert_eq!(input.name, "Rye loaf");
        assert_eq!(input.price, Decimal::new(450, 2));
        assert_eq!(input.stock, Some(10));
        assert_eq!(input.description, None);
        assert!(input.is_available);
    }

    #[test]
    fn test_optional_fields_blank() {
        let input = ProductForm {
            stock: " ".to_string(),
            image_url: String::new(),
            is_available: None,
            ..form()
        }
        .to_input()
        .unwrap();
        assert_eq!(input.stock, None);
        assert_eq!(input.image_url, None);
        assert!(!input.is_available);
    }

    #[test]
    fn test_name_rules() {
        let errors = ProductForm {
            name: "   ".to_string(),
            ..form()
        }
        .to_input()
        .unwrap_err();
        assert_eq!(errors, vec!["Name is required.".to_string()]);

        let errors = ProductForm {
            name: "x".repeat(MAX_NAME_LENGTH + 1),
            ..form()
        }
        .to_input()
        .unwrap_err();
        assert_eq!(errors, vec!["Name must be at most 120 characters.".to_string()]);

        assert!(
            ProductForm {
                name: "é".repeat(MAX_NAME_LENGTH),
                ..form()
            }
            .to_input()
            .is_ok()
        );
    }

    #[test]
    fn test_price_rules() {
        for bad in ["", "-1", "free"] {
            let errors = ProductForm {
                price: bad.to_string(),
                ..form()
            }
            .to_input()
            .unwrap_err();
            assert_eq!(errors, vec!["Price must be a number of zero or more.".to_string()]);
        }
        assert!(
            ProductForm {
                price: "0".to_string(),
                ..form()
            }
            .to_input()
            .is_ok()
        );
    }

    #[test]
    fn test_compare_at_price_must_not_undercut_price() {
        let errors = ProductForm {
            compare_at_price: "3.00".to_string(),
            ..form()
        }
        .to_input()
        .unwrap_err();
        assert_eq!(
            errors,
            vec!["Compare-at price must not be lower than the price.".to_string()]
        );

        let input = ProductForm {
            compare_at_price: "4.50".to_string(),
            ..form()
        }
        .to_input()
        .unwrap();
        assert_eq!(input.compare_at_price, Some(Decimal::new(450, 2)));
    }

    #[test]
    fn test_collects_every_error() {
        let errors = ProductForm {
            name: String::new(),
            price: "abc".to_string(),
            stock: "2.5".to_string(),
            image_url: "ftp://files.example/a.jpg".to_string(),
            ..form()
        }
        .to_input()
        .unwrap_err();
        assert_eq!(errors.len(), 4);
        assert_eq!(
            errors[3],
            "Image URL must be a full http:// or https:// address."
        );
    }

    #[test]
    fn test_form_from_product_round_trips() {
        let product: Product = serde_json::from_value(serde_json::json!({
            "id": 5, "storeId": 1, "name": "Figs", "price": "3.25",
            "compareAtPrice": "4.00", "stock": 0, "isAvailable": true
        }))
        .unwrap();
        let form = ProductForm::from(&product);
        assert_eq!(form.price, "3.25");
        assert_eq!(form.stock, "0");
        assert!(form.available());
        let input = form.to_input().unwrap();
        assert_eq!(input.compare_at_price, Some(Decimal::new(400, 2)));
    }

    #[test]
    fn test_product_row() {
        let product: Product = serde_json::from_value(serde_json::json!({
            "id": 5, "storeId": 1, "name": "Figs", "price": "3.25", "stock": 0
        }))
        .unwrap();
        let row = ProductRow::new(&product, CurrencyCode::USD);
        assert_eq!(row.edit_url, "/products/5/edit");
        assert_eq!(row.price, "$3.25");
        assert_eq!(row.stock, "0");
        assert!(!row.available);
    }

    #[test]
    fn test_product_links_encode_id() {
        let product: Product = serde_json::from_value(serde_json::json!({
            "id": "gid/5?x", "storeId": 1, "name": "Figs", "price": "3.25"
        }))
        .unwrap();
        let row = ProductRow::new(&product, CurrencyCode::USD);
        assert_eq!(row.edit_url, "/products/gid%2F5%3Fx/edit");
        assert_eq!(row.delete_url, "/products/gid%2F5%3Fx/delete");

        let page = ProductFormTemplate::new(
            PageContext::default(),
            Some(&product.id),
            ProductForm::from(&product),
            Vec::new(),
        );
        assert_eq!(page.action, "/products/gid%2F5%3Fx");
    }
}
