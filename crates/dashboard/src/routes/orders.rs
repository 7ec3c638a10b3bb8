//! Merchant order list, detail and status changes.
//!
//! The backend owns the order lifecycle. Every status is offered in the
//! status form; a transition the backend refuses is shown with its message.

use std::str::FromStr;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use bazaar_core::{AuthToken, CurrencyCode, Order, OrderId, OrderStatus, Price};
use serde::Deserialize;
use tracing::instrument;

use crate::backend::OrderFilter;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{PageContext, RequireMerchant};
use crate::routes::{PaginationView, format_datetime, inline_error};
use crate::state::AppState;

/// One row of an order table.
#[derive(Debug, Clone)]
pub struct OrderRow {
    pub id: String,
    pub url: String,
    /// Target of the status form.
    pub status_url: String,
    pub tracking_number: String,
    pub customer: String,
    pub placed_at: String,
    pub item_count: u32,
    pub total: String,
    pub status_label: &'static str,
    pub status_class: &'static str,
}

/// Path of one order, with the id percent-encoded.
fn order_url(id: &OrderId) -> String {
    format!("/orders/{}", urlencoding::encode(id.as_str()))
}

impl OrderRow {
    #[must_use]
    pub fn new(order: &Order, currency: CurrencyCode) -> Self {
        let badge = order.status.badge();
        let url = order_url(&order.id);
        Self {
            id: order.id.to_string(),
            status_url: format!("{url}/status"),
            url,
            tracking_number: order.tracking_number.to_string(),
            customer: order
                .customer_name
                .clone()
                .unwrap_or_else(|| "Guest".to_string()),
            placed_at: format_datetime(&order.created_at),
            item_count: order.item_count(),
            total: Price::new(order.total, currency).display(),
            status_label: badge.label,
            status_class: badge.css_class(),
        }
    }
}

/// An entry in a status `<select>`.
#[derive(Debug, Clone)]
pub struct StatusOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// Every known status, marking `current` as selected.
#[must_use]
pub fn status_options(current: Option<OrderStatus>) -> Vec<StatusOption> {
    OrderStatus::ALL
        .into_iter()
        .map(|status| StatusOption {
            value: status.as_str(),
            label: status.label(),
            selected: Some(status) == current,
        })
        .collect()
}

/// Order line display data.
#[derive(Debug, Clone)]
pub struct OrderLineView {
    pub name: String,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
}

/// Full order display data.
#[derive(Debug, Clone)]
pub struct OrderDetailView {
    pub row: OrderRow,
    pub lines: Vec<OrderLineView>,
    pub subtotal: String,
    pub delivery_fee: String,
    pub zone_name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub notes: Option<String>,
    pub updated_at: Option<String>,
    pub terminal: bool,
}

impl OrderDetailView {
    #[must_use]
    pub fn new(order: &Order, currency: CurrencyCode) -> Self {
        let price = |amount| Price::new(amount, currency).display();
        Self {
            row: OrderRow::new(order, currency),
            lines: order
                .items
                .iter()
                .map(|item| OrderLineView {
                    name: item.product_name.clone(),
                    quantity: item.quantity,
                    unit_price: price(item.unit_price),
                    line_total: price(item.line_total()),
                })
                .collect(),
            subtotal: price(order.subtotal),
            delivery_fee: price(order.delivery_fee),
            zone_name: order.zone_name.clone(),
            address: order
                .address
                .as_ref()
                .map(|a| format!("{}, {}", a.recipient_name, a.one_line())),
            phone: order.address.as_ref().and_then(|a| a.phone.clone()),
            notes: order.notes.clone().filter(|n| !n.trim().is_empty()),
            updated_at: order.updated_at.as_ref().map(format_datetime),
            terminal: order.status.is_terminal(),
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Order list template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/index.html")]
pub struct OrdersIndexTemplate {
    pub page: PageContext,
    pub orders: Vec<OrderRow>,
    pub statuses: Vec<StatusOption>,
    pub filtered: bool,
    pub pagination: PaginationView,
}

/// Order detail template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/show.html")]
pub struct OrderShowTemplate {
    pub page: PageContext,
    pub order: OrderDetailView,
    pub statuses: Vec<StatusOption>,
    pub error: Option<String>,
    pub updated: bool,
}

// =============================================================================
// Handlers
// =============================================================================

/// Query parameters for the order list.
#[derive(Debug, Deserialize)]
pub struct OrdersQuery {
    pub status: Option<String>,
    pub page: Option<u32>,
}

/// Query parameters for the order detail page.
#[derive(Debug, Deserialize)]
pub struct OrderShowQuery {
    pub updated: Option<u8>,
}

/// Status change form.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
}

/// List the store's orders, optionally filtered by status.
#[instrument(skip(state, page, merchant))]
pub async fn index(
    State(state): State<AppState>,
    page: PageContext,
    RequireMerchant(merchant): RequireMerchant,
    Query(query): Query<OrdersQuery>,
) -> Result<impl IntoResponse> {
    // An unrecognised filter value lists every order.
    let status = query
        .status
        .as_deref()
        .filter(|s| !s.is_empty())
        .and_then(|s| OrderStatus::from_str(s).ok());

    let orders = state
        .marketplace()
        .my_orders(
            &merchant.token,
            OrderFilter::new(status, query.page.unwrap_or(1)),
        )
        .await?;

    let currency = state.currency();
    Ok(OrdersIndexTemplate {
        page,
        pagination: PaginationView::new(
            &orders,
            "/orders",
            &[("status", status.map(OrderStatus::as_str))],
        ),
        orders: orders
            .items
            .iter()
            .map(|o| OrderRow::new(o, currency))
            .collect(),
        statuses: status_options(status),
        filtered: status.is_some(),
    })
}

/// Show one order with its status form.
#[instrument(skip(state, page, merchant))]
pub async fn show(
    State(state): State<AppState>,
    page: PageContext,
    RequireMerchant(merchant): RequireMerchant,
    Path(id): Path<String>,
    Query(query): Query<OrderShowQuery>,
) -> Result<impl IntoResponse> {
    let order = fetch_order(&state, &merchant.token, &OrderId::new(id)).await?;

    Ok(OrderShowTemplate {
        page,
        statuses: status_options(Some(order.status)),
        order: OrderDetailView::new(&order, state.currency()),
        error: None,
        updated: query.updated.is_some(),
    })
}

/// Change an order's status.
///
/// Redirects back to the order on success. A refused transition re-renders
/// the order with the backend's message.
#[instrument(skip(state, page, merchant, form), fields(status = %form.status))]
pub async fn update_status(
    State(state): State<AppState>,
    page: PageContext,
    RequireMerchant(merchant): RequireMerchant,
    Path(id): Path<String>,
    Form(form): Form<StatusForm>,
) -> Result<Response> {
    let id = OrderId::new(id);
    let status = OrderStatus::from_str(form.status.trim())
        .map_err(|_| AppError::BadRequest("Choose one of the listed statuses.".to_string()))?;

    let err = match state
        .marketplace()
        .update_order_status(&merchant.token, &id, status)
        .await
    {
        Ok(order) => {
            tracing::info!(order_id = %order.id, status = %order.status, "Order status changed");
            return Ok(Redirect::to(&format!("{}?updated=1", order_url(&id))).into_response());
        }
        Err(err) => err,
    };

    let message = inline_error(err)?;
    let order = fetch_order(&state, &merchant.token, &id).await?;
    Ok((
        StatusCode::UNPROCESSABLE_ENTITY,
        OrderShowTemplate {
            page,
            statuses: status_options(Some(status)),
            order: OrderDetailView::new(&order, state.currency()),
            error: Some(message),
            updated: false,
        },
    )
        .into_response())
}

async fn fetch_order(
    state: &AppState,
    token: &AuthToken,
    id: &OrderId,
) -> Result<Order> {
    state.marketplace().my_order(token, id).await.map_err(|e| {
        if e.is_not_found() {
            AppError::NotFound("that order".to_string())
        } else {
            e.into()
        }
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn order() -> Order {
        serde_json::from_value(serde_json::json!({
            "id": 31,
            "trackingNumber": "BZR-0031",
            "status": "ready",
            "customerName": "Noor",
            "items": [
                {"productId": 1, "productName": "Figs", "unitPrice": "3.00", "quantity": 2}
            ],
            "subtotal": "6.00",
            "deliveryFee": "2.00",
            "total": "8.00",
            "address": {
                "id": 1, "recipientName": "Noor", "phone": "555-0100",
                "line1": "4 Elm Row", "city": "Leeds"
            },
            "notes": "  ",
            "createdAt": "2024-06-02T08:15:00Z"
        }))
        .unwrap()
    }

    #[test]
    fn test_order_row() {
        let row = OrderRow::new(&order(), CurrencyCode::USD);
        assert_eq!(row.url, "/orders/31");
        assert_eq!(row.status_url, "/orders/31/status");
        assert_eq!(row.customer, "Noor");
        assert_eq!(row.total, "$8.00");
        assert_eq!(row.item_count, 2);
        assert_eq!(row.status_label, "Ready");
        assert_eq!(row.placed_at, "Jun 2, 2024 08:15 UTC");
    }

    #[test]
    fn test_order_links_encode_id() {
        let mut order = order();
        order.id = OrderId::new("ord/31?x".to_string());
        let row = OrderRow::new(&order, CurrencyCode::USD);
        assert_eq!(row.url, "/orders/ord%2F31%3Fx");
        assert_eq!(row.status_url, "/orders/ord%2F31%3Fx/status");
    }

    #[test]
    fn test_order_detail() {
        let detail = OrderDetailView::new(&order(), CurrencyCode::USD);
        assert_eq!(detail.lines[0].line_total, "$6.00");
        assert_eq!(detail.address.as_deref(), Some("Noor, 4 Elm Row, Leeds"));
        assert_eq!(detail.phone.as_deref(), Some("555-0100"));
        assert_eq!(detail.notes, None);
        assert!(!detail.terminal);
    }

    #[test]
    fn test_status_options_offer_every_status() {
        let options = status_options(Some(OrderStatus::Preparing));
        assert_eq!(options.len(), OrderStatus::ALL.len());
        let selected: Vec<_> = options.iter().filter(|o| o.selected).collect();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].value, "preparing");
        assert!(status_options(None).iter().all(|o| !o.selected));
    }
}
