//! The merchant's product catalog.

use bazaar_core::api::{ApiError, Page};
use bazaar_core::{AuthToken, Product, ProductId};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::instrument;

use super::Marketplace;

/// Products shown per dashboard page.
pub const PRODUCTS_PER_PAGE: u32 = 20;

/// Product fields a merchant can set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compare_at_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub is_available: bool,
}

impl Marketplace {
    /// One page of the merchant's products, optionally filtered by a search term.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn my_products(
        &self,
        token: &AuthToken,
        search: Option<&str>,
        page: u32,
    ) -> Result<Page<Product>, ApiError> {
        let mut query = vec![
            ("page", page.max(1).to_string()),
            ("limit", PRODUCTS_PER_PAGE.to_string()),
        ];
        if let Some(term) = search.map(str::trim).filter(|t| !t.is_empty()) {
            query.push(("search", term.to_string()));
        }
        self.inner
            .api
            .get_page(&["merchants", "me", "products"], &query, Some(token))
            .await
    }

    /// One of the merchant's products.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the product is not the merchant's.
    #[instrument(skip(self, token))]
    pub async fn my_product(&self, token: &AuthToken, id: &ProductId) -> Result<Product, ApiError> {
        self.inner
            .api
            .get(&["merchants", "me", "products", id.as_str()], &[], Some(token))
            .await
    }

    /// Add a product to the merchant's store.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses the product.
    #[instrument(skip(self, token, input), fields(name = %input.name))]
    pub async fn create_product(
        &self,
        token: &AuthToken,
        input: &ProductInput,
    ) -> Result<Product, ApiError> {
        self.inner
            .api
            .post(&["merchants", "me", "products"], input, Some(token))
            .await
    }

    /// Replace a product's editable fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses the update.
    #[instrument(skip(self, token, input), fields(name = %input.name))]
    pub async fn update_product(
        &self,
        token: &AuthToken,
        id: &ProductId,
        input: &ProductInput,
    ) -> Result<Product, ApiError> {
        self.inner
            .api
            .put(
                &["merchants", "me", "products", id.as_str()],
                input,
                Some(token),
            )
            .await
    }

    /// Remove a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    #[instrument(skip(self, token))]
    pub async fn delete_product(&self, token: &AuthToken, id: &ProductId) -> Result<(), ApiError> {
        self.inner
            .api
            .delete(&["merchants", "me", "products", id.as_str()], Some(token))
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_input_payload() {
        let input = ProductInput {
            name: "Sourdough".to_string(),
            description: None,
            price: Decimal::new(650, 2),
            compare_at_price: None,
            stock: Some(12),
            image_url: None,
            category: Some("Bakery".to_string()),
            is_available: true,
        };
        assert_eq!(
            serde_json::to_value(&input).unwrap(),
            serde_json::json!({
                "name": "Sourdough",
                "price": "6.50",
                "stock": 12,
                "category": "Bakery",
                "isAvailable": true
            })
        );
    }
}
