//! SkateParadise CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! sp-cli migrate
//!
//! # Import the catalog from a JSON file
//! sp-cli import-products products.json
//!
//! # Grant or revoke staff access
//! sp-cli user promote alice
//! sp-cli user demote alice
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "sp-cli")]
#[command(author, version, about = "SkateParadise CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Create products listed in a JSON file, skipping existing names
    ImportProducts {
        /// Path to the JSON file (an array of products)
        file: PathBuf,
    },
    /// Manage user accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Grant staff access (catalog maintenance, order statuses)
    Promote {
        /// Account username
        username: String,
    },
    /// Revoke staff access
    Demote {
        /// Account username
        username: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::ImportProducts { file } => {
            commands::import::products(&file).await?;
        }
        Commands::User { action } => match action {
            UserAction::Promote { username } => commands::user::set_staff(&username, true).await?,
            UserAction::Demote { username } => commands::user::set_staff(&username, false).await?,
        },
    }
    Ok(())
}
