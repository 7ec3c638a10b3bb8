//! Marketplace backend checks.
//!
//! # Usage
//!
//! ```bash
//! bazaar backend ping
//! ```
//!
//! Reads the same `MARKETPLACE_*` variables as the web apps.

use bazaar_core::Zone;
use bazaar_core::api::{ApiClient, ApiError};
use bazaar_storefront::config::{ConfigError, MarketplaceConfig};
use thiserror::Error;

/// Errors that can occur while talking to the backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The `MARKETPLACE_*` settings are missing or invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The backend did not answer as expected.
    #[error("Backend error: {0}")]
    Api(#[from] ApiError),
}

/// Check that the backend answers, listing its delivery zones.
///
/// # Errors
///
/// Returns an error if the settings are invalid or the backend fails.
pub async fn ping() -> Result<(), BackendError> {
    dotenvy::dotenv().ok();

    let config = MarketplaceConfig::from_lookup(&|key: &str| std::env::var(key).ok())?;
    let api = ApiClient::new(config.client_options())?;

    tracing::info!(api_url = %config.api_url, "Pinging marketplace backend...");
    let zones = api.get_page::<Zone>(&["zones"], &[], None).await?;

    tracing::info!(zones = zones.items.len(), "Backend is reachable");
    for zone in &zones.items {
        tracing::info!(
            zone = %zone.name,
            fee = %zone.delivery_fee,
            active = zone.is_active,
            "Delivery zone"
        );
    }
    Ok(())
}
