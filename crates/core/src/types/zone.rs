//! Delivery zones.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ZoneId;

/// A delivery-pricing region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    pub id: ZoneId,
    pub name: String,
    /// Flat fee added to an order delivered into this zone.
    pub delivery_fee: Decimal,
    #[serde(default)]
    pub estimated_delivery: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

const fn default_true() -> bool {
    true
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_defaults_to_active() {
        let zone: Zone =
            serde_json::from_str(r#"{"id": 3, "name": "Downtown", "deliveryFee": 4.5}"#).unwrap();
        assert_eq!(zone.id, ZoneId::new("3"));
        assert_eq!(zone.delivery_fee, Decimal::new(45, 1));
        assert!(zone.is_active);
        assert!(zone.estimated_delivery.is_none());
    }
}
