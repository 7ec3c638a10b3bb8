//! Order history and order detail route handlers.
//!
//! Order pages embed a status fragment that HTMX re-requests every
//! `ORDER_POLL_INTERVAL_SECS` until the order reaches a terminal status.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use bazaar_core::{CurrencyCode, Order, OrderId, OrderStatus, Price};
use serde::Deserialize;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{PageContext, RequireConsumer};
use crate::routes::{PaginationView, format_datetime};
use crate::state::AppState;

/// Order status badge plus its polling instructions.
#[derive(Debug, Clone)]
pub struct StatusView {
    pub label: &'static str,
    pub css_class: &'static str,
    /// Polling stops once this is set.
    pub terminal: bool,
    /// URL of the status fragment.
    pub poll_url: String,
    pub poll_secs: u64,
}

impl StatusView {
    #[must_use]
    pub fn new(status: OrderStatus, poll_url: String, poll_secs: u64) -> Self {
        let badge = status.badge();
        Self {
            label: badge.label,
            css_class: badge.css_class(),
            terminal: status.is_terminal(),
            poll_url,
            poll_secs,
        }
    }

    /// Whether the fragment should keep polling.
    #[must_use]
    pub const fn polls(&self) -> bool {
        !self.terminal
    }
}

/// Order line display data.
#[derive(Debug, Clone)]
pub struct OrderItemView {
    pub name: String,
    pub product_url: String,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
}

/// Order display data for templates.
#[derive(Debug, Clone)]
pub struct OrderView {
    pub id: String,
    pub url: String,
    pub tracking_number: String,
    pub tracking_url: String,
    pub store_name: Option<String>,
    pub placed_at: String,
    pub item_count: u32,
    pub items: Vec<OrderItemView>,
    pub subtotal: String,
    pub delivery_fee: String,
    pub total: String,
    pub zone_name: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub status: StatusView,
}

impl OrderView {
    /// Build the view for an order; `status_url` is the polled fragment.
    #[must_use]
    pub fn new(order: &Order, currency: CurrencyCode, status_url: String, poll_secs: u64) -> Self {
        let money = |amount| Price::new(amount, currency).display();
        Self {
            id: order.id.to_string(),
            url: format!("/orders/{}", urlencoding::encode(order.id.as_str())),
            tracking_number: order.tracking_number.to_string(),
            tracking_url: tracking_url(order),
            store_name: order.store_name.clone(),
            placed_at: format_datetime(&order.created_at),
            item_count: order.item_count(),
            items: order
                .items
                .iter()
                .map(|item| OrderItemView {
                    name: item.product_name.clone(),
                    product_url: format!(
                        "/products/{}",
                        urlencoding::encode(item.product_id.as_str())
                    ),
                    quantity: item.quantity,
                    unit_price: money(item.unit_price),
                    line_total: money(item.line_total()),
                })
                .collect(),
            subtotal: money(order.subtotal),
            delivery_fee: money(order.delivery_fee),
            total: money(order.total),
            zone_name: order.zone_name.clone(),
            address: order.address.as_ref().map(bazaar_core::Address::one_line),
            notes: order.notes.clone().filter(|n| !n.is_empty()),
            status: StatusView::new(order.status, status_url, poll_secs),
        }
    }
}

/// Public tracking page for an order.
#[must_use]
pub fn tracking_url(order: &Order) -> String {
    format!(
        "/track/{}",
        urlencoding::encode(order.tracking_number.as_str())
    )
}

/// Order history query parameters.
#[derive(Debug, Deserialize)]
pub struct OrdersQuery {
    pub page: Option<u32>,
}

/// Order history template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/index.html")]
pub struct OrdersIndexTemplate {
    pub page: PageContext,
    pub orders: Vec<OrderView>,
    pub pagination: PaginationView,
}

/// Order detail template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/show.html")]
pub struct OrderShowTemplate {
    pub page: PageContext,
    pub order: OrderView,
    /// Set right after checkout.
    pub just_placed: bool,
}

/// Status fragment template (for HTMX polling).
#[derive(Template, WebTemplate)]
#[template(path = "partials/order_status.html")]
pub struct OrderStatusTemplate {
    pub status: StatusView,
}

/// Order detail query parameters.
#[derive(Debug, Deserialize)]
pub struct OrderQuery {
    pub placed: Option<u8>,
}

fn status_url(id: &OrderId) -> String {
    format!("/orders/{}/status", urlencoding::encode(id.as_str()))
}

fn not_found(err: bazaar_core::api::ApiError) -> AppError {
    if err.is_not_found() {
        AppError::NotFound("that order".to_string())
    } else {
        err.into()
    }
}

/// Display the order history.
#[instrument(skip(state, page, consumer))]
pub async fn index(
    State(state): State<AppState>,
    page: PageContext,
    RequireConsumer(consumer): RequireConsumer,
    Query(query): Query<OrdersQuery>,
) -> Result<impl IntoResponse> {
    let orders = state
        .marketplace()
        .orders(&consumer.token, query.page.unwrap_or(1))
        .await?;

    let currency = state.currency();
    let poll_secs = state.config().order_poll_interval_secs;
    Ok(OrdersIndexTemplate {
        page,
        pagination: PaginationView::new(&orders, "/orders", &[]),
        orders: orders
            .items
            .iter()
            .map(|order| OrderView::new(order, currency, status_url(&order.id), poll_secs))
            .collect(),
    })
}

/// Display one order with a live status badge.
#[instrument(skip(state, page, consumer))]
pub async fn show(
    State(state): State<AppState>,
    page: PageContext,
    RequireConsumer(consumer): RequireConsumer,
    Path(id): Path<String>,
    Query(query): Query<OrderQuery>,
) -> Result<impl IntoResponse> {
    let id = OrderId::new(id);
    let order = state
        .marketplace()
        .order(&consumer.token, &id)
        .await
        .map_err(not_found)?;

    Ok(OrderShowTemplate {
        page,
        order: OrderView::new(
            &order,
            state.currency(),
            status_url(&id),
            state.config().order_poll_interval_secs,
        ),
        just_placed: query.placed.is_some(),
    })
}

/// Status fragment for an order (HTMX polling).
#[instrument(skip(state, consumer))]
pub async fn status(
    State(state): State<AppState>,
    RequireConsumer(consumer): RequireConsumer,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let id = OrderId::new(id);
    let order = state
        .marketplace()
        .order(&consumer.token, &id)
        .await
        .map_err(not_found)?;

    Ok(OrderStatusTemplate {
        status: StatusView::new(
            order.status,
            status_url(&id),
            state.config().order_poll_interval_secs,
        ),
    })
}
