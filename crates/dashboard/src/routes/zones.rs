//! Delivery zones, read-only.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use bazaar_core::{CurrencyCode, Price, Zone};
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::middleware::{PageContext, RequireMerchant};
use crate::state::AppState;

/// One row of the zone table.
#[derive(Debug, Clone)]
pub struct ZoneRow {
    pub name: String,
    pub fee: String,
    pub estimate: Option<String>,
    pub active: bool,
}

impl ZoneRow {
    #[must_use]
    pub fn new(zone: &Zone, currency: CurrencyCode) -> Self {
        Self {
            name: zone.name.clone(),
            fee: Price::new(zone.delivery_fee, currency).display(),
            estimate: zone.estimated_delivery.clone(),
            active: zone.is_active,
        }
    }
}

/// Zone list template.
#[derive(Template, WebTemplate)]
#[template(path = "zones/index.html")]
pub struct ZonesTemplate {
    pub page: PageContext,
    pub zones: Vec<ZoneRow>,
}

/// List the marketplace's delivery zones.
#[instrument(skip(state, page, _merchant))]
pub async fn index(
    State(state): State<AppState>,
    page: PageContext,
    RequireMerchant(_merchant): RequireMerchant,
) -> Result<impl IntoResponse> {
    let currency = state.currency();
    let mut zones: Vec<ZoneRow> = state
        .marketplace()
        .zones()
        .await?
        .iter()
        .map(|z| ZoneRow::new(z, currency))
        .collect();
    // Active zones first, then by name.
    zones.sort_by(|a, b| b.active.cmp(&a.active).then_with(|| a.name.cmp(&b.name)));

    Ok(ZonesTemplate { page, zones })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_row() {
        let zone: Zone = serde_json::from_value(serde_json::json!({
            "id": 2, "name": "Old Town", "deliveryFee": "3.5",
            "estimatedDelivery": "30-45 min", "isActive": false
        }))
        .unwrap();
        let row = ZoneRow::new(&zone, CurrencyCode::USD);
        assert_eq!(row.fee, "$3.50");
        assert_eq!(row.estimate.as_deref(), Some("30-45 min"));
        assert!(!row.active);
    }
}
