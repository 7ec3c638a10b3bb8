//! Marketplace backend facade for the storefront.
//!
//! # Architecture
//!
//! - The marketplace REST API is the source of truth; nothing is stored
//!   locally except the session
//! - [`bazaar_core::api::ApiClient`] handles envelopes, bearer auth and the
//!   read retry policy
//! - Public catalog reads (stores, products, zones) are cached in `moka`;
//!   carts, orders and account data are per-consumer and never cached
//!
//! # Example
//!
//! ```rust,ignore
//! let marketplace = Marketplace::new(api, Duration::from_secs(60));
//!
//! let store = marketplace.store("green-grocer").await?;
//! let cart = marketplace.add_to_cart(&consumer.token, &product_id, 2).await?;
//! ```

mod cache;
mod cart;
mod catalog;
mod consumers;
mod newsletter;
mod orders;

use std::sync::Arc;
use std::time::Duration;

use bazaar_core::api::ApiClient;
use moka::future::Cache;

pub use bazaar_core::api::{ApiError, Page};
pub use catalog::{CatalogQuery, PRODUCTS_PER_PAGE, STORES_PER_PAGE};
pub use consumers::{ProfileUpdate, Registration};
pub use newsletter::SubscribeOutcome;
pub use orders::NewOrder;

use cache::{CacheKey, CacheValue};

/// Maximum number of cached catalog entries.
const CACHE_CAPACITY: u64 = 1000;

/// Client for the marketplace backend.
///
/// Cheap to clone; the HTTP client and cache are shared.
#[derive(Clone)]
pub struct Marketplace {
    inner: Arc<MarketplaceInner>,
}

struct MarketplaceInner {
    api: ApiClient,
    cache: Cache<CacheKey, CacheValue>,
}

impl Marketplace {
    /// Create a facade over an API client with the given catalog cache TTL.
    #[must_use]
    pub fn new(api: ApiClient, cache_ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(cache_ttl)
            .build();

        Self {
            inner: Arc::new(MarketplaceInner { api, cache }),
        }
    }

    /// Check that the backend answers.
    ///
    /// Bypasses the cache so readiness reflects the backend right now.
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
