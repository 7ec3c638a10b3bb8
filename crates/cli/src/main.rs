//! Bazaar CLI - Session migrations and backend checks.
//!
//! # Usage
//!
//! ```bash
//! # Create the storefront session table
//! bazaar migrate storefront
//!
//! # Create the dashboard session table
//! bazaar migrate dashboard
//!
//! # Both
//! bazaar migrate all
//!
//! # Check the marketplace backend is reachable
//! bazaar backend ping
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

use crate::commands::migrate::App;

mod commands;

#[derive(Parser)]
#[command(name = "bazaar")]
#[command(author, version, about = "Bazaar CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create session tables
    Migrate {
        #[command(subcommand)]
        target: MigrateTarget,
    },
    /// Talk to the marketplace backend
    Backend {
        #[command(subcommand)]
        action: BackendAction,
    },
}

#[derive(Subcommand)]
enum MigrateTarget {
    /// Storefront session table
    Storefront,
    /// Dashboard session table
    Dashboard,
    /// Every session table
    All,
}

#[derive(Subcommand)]
enum BackendAction {
    /// Check the backend answers and list delivery zones
    Ping,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate { target } => match target {
            MigrateTarget::Storefront => commands::migrate::run(App::Storefront).await?,
            MigrateTarget::Dashboard => commands::migrate::run(App::Dashboard).await?,
            MigrateTarget::All => {
                commands::migrate::run(App::Storefront).await?;
                commands::migrate::run(App::Dashboard).await?;
            }
        },
        Commands::Backend { action } => match action {
            BackendAction::Ping => commands::backend::ping().await?,
        },
    }
    Ok(())
}
