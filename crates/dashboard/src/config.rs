//! Dashboard configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DASHBOARD_DATABASE_URL` - `PostgreSQL` connection string for sessions
//!   (falls back to `DATABASE_URL`)
//! - `DASHBOARD_BASE_URL` - Public URL for the dashboard
//! - `MARKETPLACE_API_URL` - Root of the marketplace REST API
//!
//! ## Optional
//! - `DASHBOARD_HOST` - Bind address (default: 127.0.0.1)
//! - `DASHBOARD_PORT` - Listen port (default: 3001)
//! - `DASHBOARD_REFRESH_INTERVAL_SECS` - Overview metrics refresh (default: 60)
//! - `MARKETPLACE_API_TIMEOUT_SECS` - Per-request timeout (default: 10)
//! - `MARKETPLACE_API_RETRY_ATTEMPTS` - Attempts per read (default: 3)
//! - `MARKETPLACE_API_RETRY_DELAY_MS` - Pause between attempts (default: 1000)
//! - `MARKETPLACE_CURRENCY` - ISO currency for prices (default: USD)
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`,
//!   `SENTRY_TRACES_SAMPLE_RATE` - Error tracking
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

/// Dashboard application configuration.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    pub host: IpAddr,
    pub port: u16,
    /// Public base URL for the dashboard
    pub base_url: String,
    /// Root of the marketplace REST API
    pub api_url: Url,
    pub api_timeout: Duration,
    /// Retry policy for backend reads
    pub retry: RetryPolicy,
    /// Currency prices are displayed in
    pub currency: CurrencyCode,
    /// Seconds between overview metric refreshes in the browser
    pub refresh_interval_secs: u64,
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
    pub sentry_sample_rate: f32,
    pub sentry_traces_sample_rate: f32,
    pub log_format: LogFormat,
}

impl DashboardConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(&|key: &str| std::env::var(key).ok())
    }

    /// Load configuration through a variable lookup function.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DASHBOARD_DATABASE_URL")
            .or_else(|| lookup("DATABASE_URL"))
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar("DASHBOARD_DATABASE_URL".to_string()))?;
        let base_url = lookup("DASHBOARD_BASE_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("DASHBOARD_BASE_URL".to_string()))?;
        let api_url: Url = parse_required(lookup, "MARKETPLACE_API_URL")?;
        let timeout_secs: u64 = parse_or(lookup, "MARKETPLACE_API_TIMEOUT_SECS", 10)?;
        let max_attempts: u32 = parse_or(
            lookup,
            "MARKETPLACE_API_RETRY_ATTEMPTS",
            RetryPolicy::DEFAULT_ATTEMPTS,
        )?;
        let delay_ms: u64 = parse_or(lookup, "MARKETPLACE_API_RETRY_DELAY_MS", 1000)?;
        let refresh_interval_secs: u64 = parse_or(lookup, "DASHBOARD_REFRESH_INTERVAL_SECS", 60)?;

        Ok(Self {
            database_url,
            host: parse_or(lookup, "DASHBOARD_HOST", IpAddr::from([127, 0, 0, 1]))?,
            port: parse_or(lookup, "DASHBOARD_PORT", 3001u16)?,
            base_url,
            api_url,
            api_timeout: Duration::from_secs(timeout_secs),
            retry: RetryPolicy {
                max_attempts: max_attempts.max(1),
                delay: Duration::from_millis(delay_ms),
            },
            currency: parse_or(lookup, "MARKETPLACE_CURRENCY", CurrencyCode::USD)?,
            refresh_interval_secs: refresh_interval_secs.max(5),
            sentry_dsn: lookup("SENTRY_DSN").filter(|dsn| !dsn.is_empty()),
            sentry_environment: lookup("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_or(lookup, "SENTRY_SAMPLE_RATE", 1.0)?,
            sentry_traces_sample_rate: parse_or(lookup, "SENTRY_TRACES_SAMPLE_RATE", 0.1)?,
            log_format: parse_or(lookup, "LOG_FORMAT", LogFormat::Pretty)?,
        })
    }

    /// Options for the marketplace API client.
    #[must_use]
    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            base_url: self.api_url.clone(),
            timeout: self.api_timeout,
            retry: self.retry,
            user_agent: concat!("bazaar-dashboard/", env!("CARGO_PKG_VERSION")).to_string(),
        }
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

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    lookup(key).map_or(Ok(default), |raw| {
        raw.trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("DASHBOARD_DATABASE_URL", "postgres://localhost/bazaar_dashboard"),
        ("DASHBOARD_BASE_URL", "http://localhost:3001"),
        ("MARKETPLACE_API_URL", "http://localhost:8080/api"),
    ];

    #[test]
    fn test_defaults() {
        let config = DashboardConfig::from_lookup(&lookup_from(&REQUIRED)).unwrap();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3001");
        assert_eq!(config.refresh_interval_secs, 60);
        assert_eq!(config.retry, RetryPolicy::default());
        assert_eq!(config.currency, CurrencyCode::USD);
        assert!(config.client_options().user_agent.starts_with("bazaar-dashboard/"));
    }

    #[test]
    fn test_refresh_interval_has_a_floor() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("DASHBOARD_REFRESH_INTERVAL_SECS", "1"));
        let config = DashboardConfig::from_lookup(&lookup_from(&pairs)).unwrap();
        assert_eq!(config.refresh_interval_secs, 5);
    }

    #[test]
    fn test_missing_base_url() {
        let err = DashboardConfig::from_lookup(&lookup_from(&[
            ("DATABASE_URL", "postgres://fly/db"),
            ("MARKETPLACE_API_URL", "http://localhost:8080"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(key) if key == "DASHBOARD_BASE_URL"));
    }

    #[test]
    fn test_invalid_port() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("DASHBOARD_PORT", "70000"));
        let err = DashboardConfig::from_lookup(&lookup_from(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "DASHBOARD_PORT"));
    }
}
