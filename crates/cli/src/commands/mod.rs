//! CLI command implementations.

pub mod confirm;
pub mod cycles;
pub mod detect;
pub mod migrate;
pub mod pending;
pub mod report;

use secrecy::SecretString;
use thiserror::Error;

use codledger_engine::{EngineError, EngineSettings, SettlementService};
use codledger_store::PgSettlementStore;

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("repository error: {0}")]
    Repository(#[from] codledger_store::RepositoryError),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Connect to the database named by `DATABASE_URL`.
pub async fn connect() -> Result<PgSettlementStore, CliError> {
    dotenvy::dotenv().ok();

    let database_url: SecretString = std::env::var("DATABASE_URL")
        .map_err(|_| CliError::MissingEnvVar("DATABASE_URL"))?
        .into();

    let pool = codledger_store::create_pool(&database_url).await?;
    Ok(PgSettlementStore::new(pool))
}

/// Build the settlement service over the production store.
pub async fn service() -> Result<SettlementService<PgSettlementStore>, CliError> {
    Ok(SettlementService::new(
        connect().await?,
        EngineSettings::default(),
    ))
}
