//! The merchant's own store profile.

use bazaar_core::api::ApiError;
use bazaar_core::{AuthToken, Store};
use serde::Serialize;
use tracing::instrument;

use super::Marketplace;

/// Editable store fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreUpdate {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub is_open: bool,
}

impl Marketplace {
    /// The store the merchant manages.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the merchant has no store yet.
    #[instrument(skip(self, token))]
    pub async fn my_store(&self, token: &AuthToken) -> Result<Store, ApiError> {
        self.inner
            .api
            .get(&["merchants", "me", "store"], &[], Some(token))
            .await
    }

    /// Save the store profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses the update.
    #[instrument(skip(self, token, update), fields(name = %update.name))]
    pub async fn update_store(
        &self,
        token: &AuthToken,
        update: &StoreUpdate,
    ) -> Result<Store, ApiError> {
        self.inner
            .api
            .put(&["merchants", "me", "store"], update, Some(token))
            .await
    }
}
