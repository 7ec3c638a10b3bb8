//! Orders as returned by the backend.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Address, OrderId, OrderStatus, ProductId, StoreId, TrackingNumber};

/// A placed order.
///
/// Totals are the backend's authoritative figures; the storefront only
/// computes its own totals before an order exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub tracking_number: TrackingNumber,
    pub status: OrderStatus,
    #[serde(default)]
    pub store_id: Option<StoreId>,
    #[serde(default)]
    pub store_name: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    pub subtotal: Decimal,
    #[serde(default)]
    pub delivery_fee: Decimal,
    pub total: Decimal,
    #[serde(default)]
    pub zone_name: Option<String>,
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// One line of a placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl OrderItem {
    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

impl Order {
    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_decodes_backend_payload() {
        let order: Order = serde_json::from_str(
            r#"{
                "id": 77,
                "trackingNumber": "BZR-0077",
                "status": "preparing",
                "storeName": "Green Grocer",
                "items": [
                    {"productId": 1, "productName": "Mango", "unitPrice": "2.50", "quantity": 4}
                ],
                "subtotal": 10,
                "deliveryFee": 3.5,
                "total": 13.5,
                "createdAt": "2024-05-01T10:00:00Z"
            }"#,
        )
        .unwrap();

        assert_eq!(order.status, OrderStatus::Preparing);
        assert_eq!(order.tracking_number.as_str(), "BZR-0077");
        assert_eq!(order.item_count(), 4);
        assert_eq!(order.items[0].line_total(), Decimal::new(10, 0));
        assert_eq!(order.total, Decimal::new(135, 1));
    }
}
