//! Marketplace backend facade for the dashboard.
//!
//! Every call except login and the zone list is made with the merchant's
//! bearer token against the `/merchants/me` resources. Nothing is cached:
//! merchants expect their own edits to show up on the next page load.

mod auth;
mod orders;
mod products;
mod store;

use std::sync::Arc;

use bazaar_core::Zone;
use bazaar_core::api::ApiClient;
use tracing::instrument;

pub use bazaar_core::api::{ApiError, Page};
pub use orders::{ORDERS_PER_PAGE, OrderFilter};
pub use products::{PRODUCTS_PER_PAGE, ProductInput};
pub use store::StoreUpdate;

/// Client for the merchant side of the marketplace backend.
///
/// Cheap to clone; the HTTP client is shared.
#[derive(Clone)]
pub struct Marketplace {
    inner: Arc<MarketplaceInner>,
}

struct MarketplaceInner {
    api: ApiClient,
}

impl Marketplace {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self {
            inner: Arc::new(MarketplaceInner { api }),
        }
    }

    /// Every delivery zone, active or not.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn zones(&self) -> Result<Vec<Zone>, ApiError> {
        Ok(self.inner.api.get_page(&["zones"], &[], None).await?.items)
    }

    /// Check that the backend answers.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached.
    pub async fn ping(&self) -> Result<(), ApiError> {
        self.inner
            .api
            .get_page::<serde_json::Value>(&["zones"], &[], None)
            .await
            .map(|_| ())
    }
}
