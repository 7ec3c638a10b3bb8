//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string for sessions
//!   (falls back to `DATABASE_URL`)
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `MARKETPLACE_API_URL` - Root of the marketplace REST API
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_CACHE_TTL_SECS` - Catalog cache lifetime (default: 60)
//! - `MARKETPLACE_API_TIMEOUT_SECS` - Per-request timeout (default: 10)
//! - `MARKETPLACE_API_RETRY_ATTEMPTS` - Attempts per read (default: 3)
//! - `MARKETPLACE_API_RETRY_DELAY_MS` - Pause between attempts (default: 1000)
//! - `MARKETPLACE_CURRENCY` - ISO currency for prices (default: USD)
//! - `ORDER_POLL_INTERVAL_SECS` - Order status refresh interval (default: 30)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.1)
//! - `LOG_FORMAT` - `pretty` (default) or `json`

use std::fmt::Display;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use bazaar_core::CurrencyCode;
use bazaar_core::api::{ClientOptions, RetryPolicy};
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" | "" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("expected 'pretty' or 'json', got '{other}'")),
        }
    }
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Marketplace backend settings
    pub marketplace: MarketplaceConfig,
    /// Lifetime of cached catalog reads
    pub cache_ttl: Duration,
    /// Seconds between order status refreshes in the browser
    pub order_poll_interval_secs: u64,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
    /// Log output format
    pub log_format: LogFormat,
}

/// Marketplace REST API settings.
#[derive(Debug, Clone)]
pub struct MarketplaceConfig {
    /// Root of the REST API
    pub api_url: Url,
    /// Per-request timeout
    pub timeout: Duration,
    /// Retry policy for reads
    pub retry: RetryPolicy,
    /// Currency prices are displayed in
    pub currency: CurrencyCode,
}

impl MarketplaceConfig {
    /// Load the marketplace settings shared by both binaries.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the API URL is missing or a value is invalid.
    pub fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_url: Url = parse_required(lookup, "MARKETPLACE_API_URL")?;
        let timeout_secs: u64 = parse_or(lookup, "MARKETPLACE_API_TIMEOUT_SECS", 10)?;
        let max_attempts: u32 = parse_or(
            lookup,
            "MARKETPLACE_API_RETRY_ATTEMPTS",
            RetryPolicy::DEFAULT_ATTEMPTS,
        )?;
        let delay_ms: u64 = parse_or(lookup, "MARKETPLACE_API_RETRY_DELAY_MS", 1000)?;
        let currency: CurrencyCode = parse_or(lookup, "MARKETPLACE_CURRENCY", CurrencyCode::USD)?;

        Ok(Self {
            api_url,
            timeout: Duration::from_secs(timeout_secs),
            retry: RetryPolicy {
                max_attempts: max_attempts.max(1),
                delay: Duration::from_millis(delay_ms),
            },
            currency,
        })
    }

    /// Options for the shared API client.
    #[must_use]
    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            base_url: self.api_url.clone(),
            timeout: self.timeout,
            retry: self.retry,
            user_agent: concat!("bazaar-storefront/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(&|key: &str| std::env::var(key).ok())
    }

    /// Load configuration through a variable lookup function.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("STOREFRONT_DATABASE_URL")
            .or_else(|| lookup("DATABASE_URL"))
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar("STOREFRONT_DATABASE_URL".to_string()))?;
        let host = parse_or(lookup, "STOREFRONT_HOST", IpAddr::from([127, 0, 0, 1]))?;
        let port = parse_or(lookup, "STOREFRONT_PORT", 3000u16)?;
        let base_url = lookup("STOREFRONT_BASE_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("STOREFRONT_BASE_URL".to_string()))?;
        let marketplace = MarketplaceConfig::from_lookup(lookup)?;
        let cache_ttl_secs: u64 = parse_or(lookup, "STOREFRONT_CACHE_TTL_SECS", 60)?;
        let order_poll_interval_secs: u64 = parse_or(lookup, "ORDER_POLL_INTERVAL_SECS", 30)?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            marketplace,
            cache_ttl: Duration::from_secs(cache_ttl_secs),
            order_poll_interval_secs: order_poll_interval_secs.max(1),
            sentry_dsn: lookup("SENTRY_DSN").filter(|dsn| !dsn.is_empty()),
            sentry_environment: lookup("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_or(lookup, "SENTRY_SAMPLE_RATE", 1.0)?,
            sentry_traces_sample_rate: parse_or(lookup, "SENTRY_TRACES_SAMPLE_RATE", 0.1)?,
            log_format: parse_or(lookup, "LOG_FORMAT", LogFormat::Pretty)?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` flag.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse a required variable.
fn parse_required<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    let raw = lookup(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))?;
    raw.trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse an optional variable, falling back to `default` when unset.
fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        None => Ok(default),
    }
}
