//! Database migration command.

use tracing::info;

use super::CliError;

/// Run all pending migrations against `DATABASE_URL`.
pub async fn run() -> Result<(), CliError> {
    let store = super::connect().await?;

    info!("Running migrations...");
    codledger_store::run_migrations(store.pool()).await?;
    info!("Migrations complete");

    Ok(())
}
