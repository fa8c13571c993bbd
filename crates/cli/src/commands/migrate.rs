//! Database migration command.
//!
//! Migrations live in `crates/storefront/migrations/` and are embedded in
//! the storefront library as [`MIGRATOR`].

use skateparadise_storefront::db::MIGRATOR;

use super::{CommandError, connect};

/// Run all pending migrations.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running storefront migrations...");
    MIGRATOR.run(&pool).await?;

    tracing::info!("Storefront migrations complete!");
    Ok(())
}
