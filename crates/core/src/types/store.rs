//! Stores and their products.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{ProductId, StoreId};

/// A merchant's storefront.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    pub id: StoreId,
    pub name: String,
    /// URL-safe handle used in storefront links.
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub banner_url: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default = "default_true")]
    pub is_open: bool,
    #[serde(default)]
    pub rating: Option<Decimal>,
}

/// A product listed by a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub store_id: StoreId,
    #[serde(default)]
    pub store_name: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub compare_at_price: Option<Decimal>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub category: Option<String>,
    /// Units in stock, when the store tracks inventory.
    #[serde(default)]
    pub stock: Option<i64>,
    #[serde(default = "default_true")]
    pub is_available: bool,
}

impl Product {
    /// Whether a consumer can add this product to a cart.
    #[must_use]
    pub fn can_purchase(&self) -> bool {
        self.is_available && self.stock.is_none_or(|stock| stock > 0)
    }

    /// The image to show in listings: the primary image, else the first
    /// gallery image.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.image_url
            .as_deref()
            .or_else(|| self.images.first().map(String::as_str))
    }
}

const fn default_true() -> bool {
    true
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(json: &str) -> Product {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_product_minimal_payload() {
        let p = product(r#"{"id": 1, "storeId": "s1", "name": "Mango", "price": "2.50"}"#);
        assert!(p.is_available);
        assert!(p.images.is_empty());
        assert!(p.can_purchase());
        assert_eq!(p.primary_image(), None);
    }

    #[test]
    fn test_can_purchase_respects_stock() {
        let p = product(
            r#"{"id": 1, "storeId": 1, "name": "Mango", "price": 2.5, "stock": 0}"#,
        );
        assert!(!p.can_purchase());
        let p = product(
            r#"{"id": 1, "storeId": 1, "name": "Mango", "price": 2.5, "isAvailable": false}"#,
        );
        assert!(!p.can_purchase());
    }

    #[test]
    fn test_primary_image_falls_back_to_gallery() {
        let p = product(
            r#"{"id": 1, "storeId": 1, "name": "Mango", "price": 1, "images": ["a.jpg", "b.jpg"]}"#,
        );
        assert_eq!(p.primary_image(), Some("a.jpg"));
    }
}
