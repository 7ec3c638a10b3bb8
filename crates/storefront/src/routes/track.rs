//! Public order tracking route handlers.
//!
//! Anyone holding a tracking number can follow the order's status; the
//! delivery address is never shown here.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use bazaar_core::TrackingNumber;
use serde::Deserialize;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::PageContext;
use crate::routes::orders::{OrderStatusTemplate, OrderView, StatusView};
use crate::state::AppState;

/// Lookup form query parameters.
#[derive(Debug, Deserialize)]
pub struct TrackQuery {
    pub tracking_number: Option<String>,
}

/// Tracking lookup template.
#[derive(Template, WebTemplate)]
#[template(path = "track/lookup.html")]
pub struct TrackLookupTemplate {
    pub page: PageContext,
    pub tracking_number: String,
    pub error: Option<String>,
}

/// Tracking result template.
#[derive(Template, WebTemplate)]
#[template(path = "track/show.html")]
pub struct TrackShowTemplate {
    pub page: PageContext,
    pub order: OrderView,
}

fn status_url(tracking_number: &TrackingNumber) -> String {
    format!(
        "/track/{}/status",
        urlencoding::encode(tracking_number.as_str())
    )
}

fn parse(raw: &str) -> Result<TrackingNumber> {
    TrackingNumber::parse(raw).map_err(|_| AppError::NotFound("that tracking number".to_string()))
}

/// Display the lookup form, or jump to the order when a number is given.
#[instrument(skip(page))]
pub async fn lookup(page: PageContext, Query(query): Query<TrackQuery>) -> Response {
    let Some(raw) = query.tracking_number else {
        return TrackLookupTemplate {
            page,
            tracking_number: String::new(),
            error: None,
        }
        .into_response();
    };

    match TrackingNumber::parse(&raw) {
        Ok(tracking_number) => Redirect::to(&format!(
            "/track/{}",
            urlencoding::encode(tracking_number.as_str())
        ))
        .into_response(),
        Err(e) => TrackLookupTemplate {
            page,
            tracking_number: raw,
            error: Some(capitalize(&e.to_string())),
        }
        .into_response(),
    }
}

/// Display the order's status.
#[instrument(skip(state, page))]
pub async fn show(
    State(state): State<AppState>,
    page: PageContext,
    Path(raw): Path<String>,
) -> Result<Response> {
    let tracking_number = parse(&raw)?;

    match state.marketplace().track_order(&tracking_number).await {
        Ok(order) => {
            let mut view = OrderView::new(
                &order,
                state.currency(),
                status_url(&tracking_number),
                state.config().order_poll_interval_secs,
            );
            view.address = None;
            Ok(TrackShowTemplate { page, order: view }.into_response())
        }
        Err(e) if e.is_not_found() => Ok((
            axum::http::StatusCode::NOT_FOUND,
            TrackLookupTemplate {
                page,
                tracking_number: tracking_number.to_string(),
                error: Some("No order matches that tracking number.".to_string()),
            },
        )
            .into_response()),
        Err(e) => Err(e.into()),
    }
}

/// Status fragment for a tracked order (HTMX polling).
#[instrument(skip(state))]
pub async fn status(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<impl IntoResponse> {
    let tracking_number = parse(&raw)?;
    let order = state.marketplace().track_order(&tracking_number).await?;

    Ok(OrderStatusTemplate {
        status: StatusView::new(
            order.status,
            status_url(&tracking_number),
            state.config().order_poll_interval_secs,
        ),
    })
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    chars.next().map_or_else(String::new, |first| {
        format!("{}{}.", first.to_uppercase(), chars.as_str())
    })
}
