//! Consumer cart operations. Every call carries the consumer's token.

use bazaar_core::api::ApiError;
use bazaar_core::{AuthToken, Cart, CartItemId, ProductId};
use serde::Serialize;
use tracing::instrument;

use super::Marketplace;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AddItem<'a> {
    product_id: &'a ProductId,
    quantity: u32,
}

#[derive(Serialize)]
struct SetQuantity {
    quantity: u32,
}

impl Marketplace {
    /// Get the consumer's cart.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` if the token has expired.
    #[instrument(skip(self, token))]
    pub async fn cart(&self, token: &AuthToken) -> Result<Cart, ApiError> {
        match self.inner.api.get(&["cart"], &[], Some(token)).await {
            Err(ApiError::MissingData) => Ok(Cart::default()),
            result => result,
        }
    }

    /// Add a product to the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the item (e.g. out of stock).
    #[instrument(skip(self, token))]
    pub async fn add_to_cart(
        &self,
        token: &AuthToken,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<Cart, ApiError> {
        self.inner
            .api
            .post(
                &["cart", "items"],
                &AddItem {
                    product_id,
                    quantity,
                },
                Some(token),
            )
            .await
    }

    /// Set the quantity of a cart line.
    ///
    /// # Errors
    ///
    /// Returns an error if the line does not exist or the quantity is refused.
    #[instrument(skip(self, token))]
    pub async fn update_cart_item(
        &self,
        token: &AuthToken,
        item_id: &CartItemId,
        quantity: u32,
    ) -> Result<Cart, ApiError> {
        self.inner
            .api
            .put(
                &["cart", "items", item_id.as_str()],
                &SetQuantity { quantity },
                Some(token),
            )
            .await
    }

    /// Remove a cart line and return the updated cart.
    ///
    /// # Errors
    ///
    /// Returns an error if either backend call fails.
    #[instrument(skip(self, token))]
    pub async fn remove_cart_item(
        &self,
        token: &AuthToken,
        item_id: &CartItemId,
    ) -> Result<Cart, ApiError> {
        self.inner
            .api
            .delete(&["cart", "items", item_id.as_str()], Some(token))
            .await?;
        self.cart(token).await
    }

    /// Remove every line from the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    #[instrument(skip(self, token))]
    pub async fn clear_cart(&self, token: &AuthToken) -> Result<(), ApiError> {
        self.inner.api.delete(&["cart"], Some(token)).await
    }
}
