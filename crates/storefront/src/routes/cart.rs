//! Cart route handlers.
//!
//! The cart lives on the backend, keyed by the consumer's token. Mutations
//! are HTMX requests that swap the cart items fragment and fire a
//! `cart-updated` event so the count badge in the header refreshes itself.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::HeaderMap,
    response::{AppendHeaders, IntoResponse, Response},
};
use bazaar_core::{Cart, CartItemId, CurrencyCode, ProductId};
use serde::Deserialize;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::middleware::{OptionalConsumer, PageContext, RequireConsumer, is_htmx, redirect_browser};
use crate::routes::inline_error;
use crate::services::cart::{StoreGroup, line_total, summarize};
use crate::state::AppState;

/// Largest quantity accepted for one cart line.
pub const MAX_QUANTITY: u32 = 99;

/// Event HTMX listens for to refresh the count badge.
const CART_UPDATED: (&str, &str) = ("HX-Trigger", "cart-updated");

/// Cart line display data for templates.
#[derive(Debug, Clone)]
pub struct CartItemView {
    pub id: String,
    pub product_url: String,
    pub name: String,
    pub image_url: Option<String>,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
}

/// Lines of one store with its subtotal.
#[derive(Debug, Clone)]
pub struct CartGroupView {
    pub store_name: String,
    pub store_url: String,
    pub items: Vec<CartItemView>,
    pub subtotal: String,
}

/// Cart display data for templates.
#[derive(Debug, Clone)]
pub struct CartView {
    pub groups: Vec<CartGroupView>,
    pub item_count: u32,
    pub store_count: usize,
    pub subtotal: String,
    /// Problem with the last change, shown above the lines.
    pub error: Option<String>,
}

impl CartView {
    /// Build the view for a cart, formatting amounts in `currency`.
    #[must_use]
    pub fn new(cart: &Cart, currency: CurrencyCode) -> Self {
        let summary = summarize(cart, currency);
        Self {
            store_count: summary.store_count(),
            groups: summary
                .groups
                .iter()
                .map(|group| CartGroupView::new(group, currency))
                .collect(),
            item_count: summary.item_count,
            subtotal: summary.subtotal.display(),
            error: None,
        }
    }

    /// Attach an error message.
    #[must_use]
    pub fn with_error(mut self, error: Option<String>) -> Self {
        self.error = error;
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl CartGroupView {
    fn new(group: &StoreGroup, currency: CurrencyCode) -> Self {
        Self {
            store_name: group.store_name.clone(),
            store_url: format!("/stores/{}", urlencoding::encode(group.store_id.as_str())),
            items: group
                .items
                .iter()
                .map(|item| CartItemView {
                    id: item.id.to_string(),
                    product_url: format!(
                        "/products/{}",
                        urlencoding::encode(item.product_id.as_str())
                    ),
                    name: item.product_name.clone(),
                    image_url: item.image_url.clone(),
                    quantity: item.quantity,
                    unit_price: bazaar_core::Price::new(item.unit_price, currency).display(),
                    line_total: line_total(item, currency).display(),
                })
                .collect(),
            subtotal: group.subtotal.display(),
        }
    }
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
    pub quantity: Option<u32>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub item_id: String,
    pub quantity: u32,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub item_id: String,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub page: PageContext,
    pub cart: CartView,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

/// Inline error fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/form_error.html")]
pub struct FormErrorTemplate {
    pub message: String,
}

/// Clamp a requested quantity to what a cart line accepts.
#[must_use]
pub fn clamp_quantity(quantity: u32) -> u32 {
    quantity.clamp(1, MAX_QUANTITY)
}

/// Display cart page.
#[instrument(skip(state, page, consumer))]
pub async fn show(
    State(state): State<AppState>,
    page: PageContext,
    RequireConsumer(consumer): RequireConsumer,
) -> Result<impl IntoResponse> {
    let cart = state.marketplace().cart(&consumer.token).await?;

    Ok(CartShowTemplate {
        page,
        cart: CartView::new(&cart, state.currency()),
    })
}

/// Add item to cart (HTMX).
///
/// Returns the updated count badge. A refusal (out of stock, closed store)
/// is retargeted to the form's feedback element instead.
#[instrument(skip(state, consumer))]
pub async fn add(
    State(state): State<AppState>,
    RequireConsumer(consumer): RequireConsumer,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let quantity = clamp_quantity(form.quantity.unwrap_or(1));
    let product_id = ProductId::new(form.product_id);

    match state
        .marketplace()
        .add_to_cart(&consumer.token, &product_id, quantity)
        .await
    {
        Ok(cart) => Ok((
            AppendHeaders([CART_UPDATED]),
            CartCountTemplate {
                count: cart.item_count(),
            },
        )
            .into_response()),
        Err(e) => {
            let message = inline_error(e)?;
            Ok((
                AppendHeaders([("HX-Retarget", "#cart-feedback"), ("HX-Reswap", "innerHTML")]),
                FormErrorTemplate { message },
            )
                .into_response())
        }
    }
}

/// Update cart item quantity (HTMX).
///
/// A quantity of zero removes the line.
#[instrument(skip(state, consumer))]
pub async fn update(
    State(state): State<AppState>,
    RequireConsumer(consumer): RequireConsumer,
    Form(form): Form<UpdateCartForm>,
) -> Result<Response> {
    let marketplace = state.marketplace();
    let item_id = CartItemId::new(form.item_id);

    let result = if form.quantity == 0 {
        marketplace.remove_cart_item(&consumer.token, &item_id).await
    } else {
        marketplace
            .update_cart_item(&consumer.token, &item_id, clamp_quantity(form.quantity))
            .await
    };

    cart_items_response(&state, &consumer.token, result).await
}

/// Remove item from cart (HTMX).
#[instrument(skip(state, consumer))]
pub async fn remove(
    State(state): State<AppState>,
    RequireConsumer(consumer): RequireConsumer,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Response> {
    let item_id = CartItemId::new(form.item_id);
    let result = state
        .marketplace()
        .remove_cart_item(&consumer.token, &item_id)
        .await;

    cart_items_response(&state, &consumer.token, result).await
}

/// Empty the cart.
#[instrument(skip(state, consumer, headers))]
pub async fn clear(
    State(state): State<AppState>,
    RequireConsumer(consumer): RequireConsumer,
    headers: HeaderMap,
) -> Result<Response> {
    state.marketplace().clear_cart(&consumer.token).await?;

    if is_htmx(&headers) {
        return Ok((
            AppendHeaders([CART_UPDATED]),
            CartItemsTemplate {
                cart: CartView::new(&Cart::default(), state.currency()),
            },
        )
            .into_response());
    }
    Ok(redirect_browser(false, "/cart"))
}

/// Get cart count badge (HTMX).
///
/// Anonymous visitors and backend failures both show zero.
#[instrument(skip(state, consumer))]
pub async fn count(
    State(state): State<AppState>,
    OptionalConsumer(consumer): OptionalConsumer,
) -> impl IntoResponse {
    let count = match consumer {
        Some(consumer) => state
            .marketplace()
            .cart(&consumer.token)
            .await
            .map(|cart| cart.item_count())
            .unwrap_or_else(|e| {
                tracing::debug!(error = %e, "Cart count unavailable");
                0
            }),
        None => 0,
    };

    CartCountTemplate { count }
}

/// Render the cart items after a mutation.
///
/// On a refusal the current cart is fetched again and shown with the
/// backend's message.
async fn cart_items_response(
    state: &AppState,
    token: &bazaar_core::AuthToken,
    result: std::result::Result<Cart, bazaar_core::api::ApiError>,
) -> Result<Response> {
    let currency = state.currency();
    match result {
        Ok(cart) => Ok((
            AppendHeaders([CART_UPDATED]),
            CartItemsTemplate {
                cart: CartView::new(&cart, currency),
            },
        )
            .into_response()),
        Err(e) => {
            let message = inline_error(e)?;
            let cart = state.marketplace().cart(token).await?;
            Ok(CartItemsTemplate {
                cart: CartView::new(&cart, currency).with_error(Some(message)),
            }
            .into_response())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_quantity() {
        assert_eq!(clamp_quantity(0), 1);
        assert_eq!(clamp_quantity(3), 3);
        assert_eq!(clamp_quantity(500), MAX_QUANTITY);
    }

    #[test]
    fn test_cart_view_groups_and_totals() {
        let cart: Cart = serde_json::from_str(
            r#"{"items": [
                {"id": 1, "productId": 10, "productName": "Mango", "storeId": 1,
                 "storeName": "Fruit Co", "unitPrice": "2.50", "quantity": 2},
                {"id": 2, "productId": 20, "productName": "Bread", "storeId": 2,
                 "unitPrice": 4, "quantity": 1},
                {"id": 3, "productId": 11, "productName": "Kiwi", "storeId": 1,
                 "storeName": "Fruit Co", "unitPrice": "0.75", "quantity": 4}
            ]}"#,
        )
        .unwrap();

        let view = CartView::new(&cart, CurrencyCode::USD);
        assert_eq!(view.item_count, 7);
        assert_eq!(view.store_count, 2);
        assert_eq!(view.subtotal, "$12.00");
        assert_eq!(view.groups[0].store_name, "Fruit Co");
        assert_eq!(view.groups[0].subtotal, "$8.00");
        assert_eq!(view.groups[0].items[1].line_total, "$3.00");
        assert_eq!(view.groups[1].store_name, "Store 2");
        assert!(view.error.is_none());
    }

    #[test]
    fn test_empty_cart_view() {
        let view = CartView::new(&Cart::default(), CurrencyCode::USD);
        assert!(view.is_empty());
        assert_eq!(view.subtotal, "$0.00");
    }
}
