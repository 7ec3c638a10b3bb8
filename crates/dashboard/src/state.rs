//! Application state shared across handlers.

use std::sync::Arc;

use bazaar_core::CurrencyCode;
use bazaar_core::api::ApiClient;
use sqlx::PgPool;

use crate::backend::{ApiError, Marketplace};
use crate::config::DashboardConfig;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: DashboardConfig,
    pool: PgPool,
    marketplace: Marketplace,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the marketplace API client cannot be built.
    pub fn new(config: DashboardConfig, pool: PgPool) -> Result<Self, ApiError> {
        let marketplace = Marketplace::new(ApiClient::new(config.client_options())?);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                marketplace,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &DashboardConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    #[must_use]
    pub fn marketplace(&self) -> &Marketplace {
        &self.inner.marketplace
    }

    /// Currency prices are displayed in.
    #[must_use]
    pub fn currency(&self) -> CurrencyCode {
        self.inner.config.currency
    }
}
