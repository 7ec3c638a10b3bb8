//! Checkout route handlers.
//!
//! The consumer picks a delivery address and zone; totals are recomputed in
//! a fragment whenever the zone changes. The order is validated locally
//! before it is sent to the backend.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use bazaar_core::{Address, AuthToken, Cart, CurrencyCode, Zone, ZoneId};
use serde::Deserialize;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::middleware::{PageContext, RequireConsumer};
use crate::routes::cart::CartView;
use crate::routes::inline_error;
use crate::services::cart::{CheckoutTotals, checkout_totals, summarize};
use crate::services::checkout::{self, CheckoutInput, MAX_NOTES_LENGTH, default_zone};
use crate::state::AppState;

/// Address choice on the checkout form.
#[derive(Debug, Clone)]
pub struct AddressOption {
    pub id: String,
    pub label: String,
    pub one_line: String,
    pub selected: bool,
}

/// Zone choice on the checkout form.
#[derive(Debug, Clone)]
pub struct ZoneOption {
    pub id: String,
    pub name: String,
    pub fee: String,
    pub estimated_delivery: Option<String>,
    pub selected: bool,
}

/// Formatted checkout totals.
#[derive(Debug, Clone)]
pub struct TotalsView {
    pub subtotal: String,
    pub delivery_fee: String,
    pub total: String,
    pub zone_name: Option<String>,
    pub estimated_delivery: Option<String>,
}

impl From<CheckoutTotals> for TotalsView {
    fn from(totals: CheckoutTotals) -> Self {
        Self {
            subtotal: totals.subtotal.display(),
            delivery_fee: totals.delivery_fee.display(),
            total: totals.total.display(),
            zone_name: totals.zone_name,
            estimated_delivery: totals.estimated_delivery,
        }
    }
}

impl TotalsView {
    #[must_use]
    pub const fn zone_selected(&self) -> bool {
        self.zone_name.is_some()
    }
}

/// Checkout form data.
#[derive(Debug, Default, Deserialize)]
pub struct CheckoutForm {
    pub address_id: Option<String>,
    pub zone_id: Option<String>,
    pub notes: Option<String>,
}

/// Totals fragment query parameters.
#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub zone_id: Option<String>,
}

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub page: PageContext,
    pub cart: CartView,
    pub addresses: Vec<AddressOption>,
    pub zones: Vec<ZoneOption>,
    pub totals: TotalsView,
    pub notes: String,
    pub max_notes: usize,
    pub error: Option<String>,
}

/// Totals fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/checkout_summary.html")]
pub struct CheckoutSummaryTemplate {
    pub totals: TotalsView,
}

/// Everything the checkout page is built from.
struct CheckoutData {
    cart: Cart,
    addresses: Vec<Address>,
    zones: Vec<Zone>,
}

impl CheckoutData {
    async fn load(state: &AppState, token: &AuthToken) -> Result<Self> {
        let marketplace = state.marketplace();
        let (cart, addresses, zones) = tokio::join!(
            marketplace.cart(token),
            marketplace.addresses(token),
            marketplace.zones()
        );

        Ok(Self {
            cart: cart?,
            addresses: addresses?,
            zones: zones?.into_iter().filter(|z| z.is_active).collect(),
        })
    }

    /// Render the form with the given selections.
    fn render(
        &self,
        page: PageContext,
        currency: CurrencyCode,
        form: &CheckoutForm,
        error: Option<String>,
    ) -> CheckoutTemplate {
        let address = form
            .address_id
            .as_deref()
            .and_then(|id| self.addresses.iter().find(|a| a.id.as_str() == id))
            .or_else(|| self.addresses.iter().find(|a| a.is_default))
            .or_else(|| self.addresses.first());

        let zone = form
            .zone_id
            .as_deref()
            .and_then(|id| self.zones.iter().find(|z| z.id.as_str() == id))
            .or_else(|| default_zone(address, &self.zones));

        let subtotal = summarize(&self.cart, currency).subtotal;

        CheckoutTemplate {
            page,
            cart: CartView::new(&self.cart, currency),
            addresses: self
                .addresses
                .iter()
                .map(|a| AddressOption {
                    id: a.id.to_string(),
                    label: a
                        .label
                        .clone()
                        .filter(|l| !l.is_empty())
                        .unwrap_or_else(|| a.recipient_name.clone()),
                    one_line: a.one_line(),
                    selected: address.is_some_and(|s| s.id == a.id),
                })
                .collect(),
            zones: self
                .zones
                .iter()
                .map(|z| ZoneOption {
                    id: z.id.to_string(),
                    name: z.name.clone(),
                    fee: bazaar_core::Price::new(z.delivery_fee, currency).display(),
                    estimated_delivery: z.estimated_delivery.clone(),
                    selected: zone.is_some_and(|s| s.id == z.id),
                })
                .collect(),
            totals: checkout_totals(subtotal, zone).into(),
            notes: form.notes.clone().unwrap_or_default(),
            max_notes: MAX_NOTES_LENGTH,
            error,
        }
    }
}

/// Display the checkout form.
#[instrument(skip(state, page, consumer))]
pub async fn show(
    State(state): State<AppState>,
    page: PageContext,
    RequireConsumer(consumer): RequireConsumer,
) -> Result<Response> {
    let data = CheckoutData::load(&state, &consumer.token).await?;
    if data.cart.is_empty() {
        return Ok(Redirect::to("/cart").into_response());
    }

    Ok(data
        .render(page, state.currency(), &CheckoutForm::default(), None)
        .into_response())
}

/// Totals for the selected zone (HTMX).
#[instrument(skip(state, consumer))]
pub async fn summary(
    State(state): State<AppState>,
    RequireConsumer(consumer): RequireConsumer,
    Query(query): Query<SummaryQuery>,
) -> Result<impl IntoResponse> {
    let marketplace = state.marketplace();
    let zone_id = query
        .zone_id
        .filter(|id| !id.trim().is_empty())
        .map(ZoneId::new);

    let (cart, zone) = match &zone_id {
        Some(zone_id) => {
            let (cart, zone) =
                tokio::join!(marketplace.cart(&consumer.token), marketplace.active_zone(zone_id));
            (cart?, zone?)
        }
        None => (marketplace.cart(&consumer.token).await?, None),
    };

    let subtotal = summarize(&cart, state.currency()).subtotal;
    Ok(CheckoutSummaryTemplate {
        totals: checkout_totals(subtotal, zone.as_ref()).into(),
    })
}

/// Place the order.
///
/// Validation failures and backend refusals re-render the form with the
/// message; success redirects to the new order's page.
#[instrument(skip(state, page, consumer, form))]
pub async fn place_order(
    State(state): State<AppState>,
    page: PageContext,
    RequireConsumer(consumer): RequireConsumer,
    Form(form): Form<CheckoutForm>,
) -> Result<Response> {
    let data = CheckoutData::load(&state, &consumer.token).await?;
    let currency = state.currency();

    let input = CheckoutInput {
        address_id: form.address_id.as_deref(),
        zone_id: form.zone_id.as_deref(),
        notes: form.notes.as_deref(),
    };

    let order = match checkout::validate(&data.cart, &data.addresses, &data.zones, &input) {
        Ok(order) => order,
        Err(e) => {
            tracing::debug!(error = %e, "Checkout rejected locally");
            let template = data.render(page, currency, &form, Some(e.to_string()));
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, template).into_response());
        }
    };

    match state
        .marketplace()
        .place_order(&consumer.token, &order)
        .await
    {
        Ok(placed) => {
            tracing::info!(order_id = %placed.id, tracking_number = %placed.tracking_number, "Order placed");
            Ok(Redirect::to(&format!(
                "/orders/{}?placed=1",
                urlencoding::encode(placed.id.as_str())
            ))
            .into_response())
        }
        Err(e) => {
            let message = inline_error(e)?;
            let template = data.render(page, currency, &form, Some(message));
            Ok((StatusCode::UNPROCESSABLE_ENTITY, template).into_response())
        }
    }
}
