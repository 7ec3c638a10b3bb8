//! Session table migrations.
//!
//! Both web apps keep sessions in `PostgreSQL` through tower-sessions; this
//! creates the schema and table the session store expects. Running it twice
//! is harmless.
//!
//! # Usage
//!
//! ```bash
//! bazaar migrate storefront
//! bazaar migrate dashboard
//! bazaar migrate all
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` - Storefront session database
//! - `DASHBOARD_DATABASE_URL` - Dashboard session database
//! - `DATABASE_URL` - Fallback for either

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use thiserror::Error;
use tower_sessions_sqlx_store::PostgresStore;

use super::first_env;

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// No database URL is configured for the target.
    #[error("Missing environment variable: {0} (or DATABASE_URL)")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),
}

/// An application whose session table can be migrated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum App {
    Storefront,
    Dashboard,
}

impl App {
    const fn name(self) -> &'static str {
        match self {
            Self::Storefront => "storefront",
            Self::Dashboard => "dashboard",
        }
    }

    const fn database_url_var(self) -> &'static str {
        match self {
            Self::Storefront => "STOREFRONT_DATABASE_URL",
            Self::Dashboard => "DASHBOARD_DATABASE_URL",
        }
    }

    /// The app's database URL, falling back to `DATABASE_URL`.
    fn database_url(self) -> Result<SecretString, MigrationError> {
        first_env(&[self.database_url_var(), "DATABASE_URL"])
            .map(SecretString::from)
            .ok_or(MigrationError::MissingEnvVar(self.database_url_var()))
    }
}

/// Create the session table for `app`.
///
/// # Errors
///
/// Returns an error if no database URL is set or the database refuses.
pub async fn run(app: App) -> Result<(), MigrationError> {
    dotenvy::dotenv().ok();

    let database_url = app.database_url()?;

    tracing::info!(app = app.name(), "Connecting to session database...");
    let pool = PgPool::connect(database_url.expose_secret()).await?;

    tracing::info!(app = app.name(), "Creating session table...");
    PostgresStore::new(pool).migrate().await?;

    tracing::info!(app = app.name(), "Session table ready");
    Ok(())
}
