//! Overview page: store metrics and the latest orders.
//!
//! The metrics block is also served on its own at `/metrics`; the page
//! re-requests it every `DASHBOARD_REFRESH_INTERVAL_SECS`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use bazaar_core::{CurrencyCode, Order, Price, Store};
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use tracing::instrument;

use crate::backend::{ApiError, OrderFilter};
use crate::error::Result;
use crate::filters;
use crate::middleware::{PageContext, RequireMerchant};
use crate::models::CurrentMerchant;
use crate::routes::orders::OrderRow;
use crate::routes::inline_error;
use crate::services::analytics::{self, ANALYTICS_ORDER_LIMIT, DashboardMetrics};
use crate::state::AppState;

/// Orders listed under the metrics.
const RECENT_ORDER_COUNT: usize = 5;

/// One status in the breakdown.
#[derive(Debug, Clone)]
pub struct StatusRow {
    pub label: &'static str,
    pub css_class: &'static str,
    pub count: usize,
    pub url: String,
}

/// One best seller.
#[derive(Debug, Clone)]
pub struct TopProductRow {
    pub name: String,
    pub quantity: u64,
    pub revenue: String,
}

/// One bar of the revenue chart.
#[derive(Debug, Clone)]
pub struct DayRow {
    pub label: String,
    pub revenue: String,
    pub orders: usize,
    /// Bar length relative to the best day, 0 to 100.
    pub percent: u32,
}

/// Metrics formatted for display.
#[derive(Debug, Clone)]
pub struct MetricsView {
    pub order_count: usize,
    pub revenue: String,
    pub average_order_value: String,
    pub open_orders: usize,
    pub statuses: Vec<StatusRow>,
    pub top_products: Vec<TopProductRow>,
    pub days: Vec<DayRow>,
    pub refresh_secs: u64,
    pub refreshed_at: String,
    /// Set when the orders could not be loaded.
    pub error: Option<String>,
}

impl MetricsView {
    #[must_use]
    pub fn new(metrics: &DashboardMetrics, currency: CurrencyCode, refresh_secs: u64) -> Self {
        let price = |amount| Price::new(amount, currency).display();
        let best_day = metrics
            .daily_revenue
            .iter()
            .map(|d| d.revenue)
            .max()
            .unwrap_or(Decimal::ZERO);

        Self {
            order_count: metrics.order_count,
            revenue: price(metrics.revenue),
            average_order_value: price(metrics.average_order_value),
            open_orders: metrics.open_orders,
            statuses: metrics
                .status_counts
                .iter()
                .map(|c| {
                    let badge = c.status.badge();
                    StatusRow {
                        label: badge.label,
                        css_class: badge.css_class(),
                        count: c.count,
                        url: format!("/orders?status={}", c.status.as_str()),
                    }
                })
                .collect(),
            top_products: metrics
                .top_products
                .iter()
                .map(|p| TopProductRow {
                    name: p.name.clone(),
                    quantity: p.quantity,
                    revenue: price(p.revenue),
                })
                .collect(),
            days: metrics
                .daily_revenue
                .iter()
                .map(|d| DayRow {
                    label: d.date.format("%a %-d").to_string(),
                    revenue: price(d.revenue),
                    orders: d.orders,
                    percent: bar_percent(d.revenue, best_day),
                })
                .collect(),
            refresh_secs,
            refreshed_at: Utc::now().format("%H:%M UTC").to_string(),
            error: None,
        }
    }

    /// Empty metrics carrying an error message.
    #[must_use]
    pub fn unavailable(currency: CurrencyCode, refresh_secs: u64, message: String) -> Self {
        let empty = analytics::compute(&[], Utc::now().date_naive());
        Self {
            error: Some(message),
            ..Self::new(&empty, currency, refresh_secs)
        }
    }
}

/// Share of `best` that `value` represents, as a whole percentage.
fn bar_percent(value: Decimal, best: Decimal) -> u32 {
    if best <= Decimal::ZERO {
        return 0;
    }
    (value * Decimal::ONE_HUNDRED / best)
        .round()
        .to_u32()
        .unwrap_or(0)
        .min(100)
}

// =============================================================================
// Templates
// =============================================================================

/// Overview page template.
#[derive(Template, WebTemplate)]
#[template(path = "overview/index.html")]
pub struct OverviewTemplate {
    pub page: PageContext,
    pub store_name: Option<String>,
    pub store_open: bool,
    pub metrics: MetricsView,
    pub recent_orders: Vec<OrderRow>,
}

/// Metrics fragment template.
#[derive(Template, WebTemplate)]
#[template(path = "partials/metrics.html")]
pub struct MetricsTemplate {
    pub metrics: MetricsView,
}

// =============================================================================
// Handlers
// =============================================================================

/// Load recent orders and turn them into metrics.
///
/// A backend failure other than an expired token becomes an inline message.
async fn load_metrics(
    state: &AppState,
    merchant: &CurrentMerchant,
) -> Result<(MetricsView, Vec<Order>)> {
    let currency = state.currency();
    let refresh_secs = state.config().refresh_interval_secs;
    let filter = OrderFilter {
        limit: ANALYTICS_ORDER_LIMIT,
        ..OrderFilter::new(None, 1)
    };

    metrics_from(
        state.marketplace().my_orders(&merchant.token, filter).await.map(|p| p.items),
        currency,
        refresh_secs,
    )
}

fn metrics_from(
    orders: std::result::Result<Vec<Order>, ApiError>,
    currency: CurrencyCode,
    refresh_secs: u64,
) -> Result<(MetricsView, Vec<Order>)> {
    match orders {
        Ok(orders) => {
            let metrics = analytics::compute(&orders, Utc::now().date_naive());
            Ok((MetricsView::new(&metrics, currency, refresh_secs), orders))
        }
        Err(e) => {
            let message = inline_error(e)?;
            Ok((
                MetricsView::unavailable(currency, refresh_secs, message),
                Vec::new(),
            ))
        }
    }
}

/// Display the overview.
///
/// Orders and the store profile are fetched in parallel.
#[instrument(skip(state, page, merchant))]
pub async fn index(
    State(state): State<AppState>,
    page: PageContext,
    RequireMerchant(merchant): RequireMerchant,
) -> Result<impl IntoResponse> {
    let (metrics, store) = tokio::join!(
        load_metrics(&state, &merchant),
        state.marketplace().my_store(&merchant.token),
    );
    let (metrics, orders) = metrics?;

    let store: Option<Store> = match store {
        Ok(store) => Some(store),
        Err(e) if e.is_unauthorized() => return Err(e.into()),
        Err(e) => {
            tracing::warn!(error = %e, "Store profile unavailable for overview");
            None
        }
    };

    let currency = state.currency();
    Ok(OverviewTemplate {
        page,
        store_open: store.as_ref().is_some_and(|s| s.is_open),
        store_name: store.map(|s| s.name),
        metrics,
        recent_orders: orders
            .iter()
            .take(RECENT_ORDER_COUNT)
            .map(|o| OrderRow::new(o, currency))
            .collect(),
    })
}

/// Metrics fragment for HTMX polling.
#[instrument(skip(state, merchant))]
pub async fn metrics(
    State(state): State<AppState>,
    RequireMerchant(merchant): RequireMerchant,
) -> Result<impl IntoResponse> {
    let (metrics, _) = load_metrics(&state, &merchant).await?;
    Ok(MetricsTemplate { metrics })
}
