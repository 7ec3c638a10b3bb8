//! Order placement, history and public tracking.

use bazaar_core::api::{ApiError, Page};
use bazaar_core::{AddressId, AuthToken, Order, OrderId, TrackingNumber, ZoneId};
use serde::Serialize;
use tracing::instrument;

use super::Marketplace;

/// Orders shown per history page.
const ORDERS_PER_PAGE: u32 = 10;

/// Payload for placing an order from the consumer's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub address_id: AddressId,
    pub zone_id: ZoneId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Marketplace {
    /// Place an order for the cart's contents.
    ///
    /// Sent once; a failed placement is never retried automatically.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses the order.
    #[instrument(skip(self, token))]
    pub async fn place_order(&self, token: &AuthToken, order: &NewOrder) -> Result<Order, ApiError> {
        self.inner.api.post(&["orders"], order, Some(token)).await
    }

    /// The consumer's order history, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn orders(&self, token: &AuthToken, page: u32) -> Result<Page<Order>, ApiError> {
        self.inner
            .api
            .get_page(
                &["orders"],
                &[
                    ("page", page.max(1).to_string()),
                    ("limit", ORDERS_PER_PAGE.to_string()),
                ],
                Some(token),
            )
            .await
    }

    /// One of the consumer's orders.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the order does not belong to the consumer.
    #[instrument(skip(self, token))]
    pub async fn order(&self, token: &AuthToken, id: &OrderId) -> Result<Order, ApiError> {
        self.inner
            .api
            .get(&["orders", id.as_str()], &[], Some(token))
            .await
    }

    /// Look up an order by tracking number without authentication.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if no order carries this tracking number.
    #[instrument(skip(self))]
    pub async fn track_order(&self, tracking_number: &TrackingNumber) -> Result<Order, ApiError> {
        self.inner
            .api
            .get(&["orders", "track", tracking_number.as_str()], &[], None)
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_order_payload_shape() {
        let order = NewOrder {
            address_id: AddressId::new("12"),
            zone_id: ZoneId::new("3"),
            notes: None,
        };
        assert_eq!(
            serde_json::to_value(&order).unwrap(),
            serde_json::json!({"addressId": "12", "zoneId": "3"})
        );

        let with_notes = NewOrder {
            notes: Some("Ring twice".to_string()),
            ..order
        };
        assert_eq!(
            serde_json::to_value(&with_notes).unwrap()["notes"],
            "Ring twice"
        );
    }
}
