//! CodLedger Store - `PostgreSQL` persistence.
//!
//! ## Tables
//!
//! - `order_lines` - Uploaded order snapshots, one row per line item per
//!   upload (history is cumulative; `ingest_seq` fixes snapshot order)
//! - `price_configs` - Per (dropshipper, product) unit cost and weight
//! - `shipping_rates` - Per (product, weight, carrier) flat rates
//! - `payout_log` - Immutable record of disbursed payouts
//! - `reconciliations` - Confirmed RTS/RTO reversal ledger
//! - `payment_cycles` - Per-dropshipper payout schedules
//!
//! Migrations live in `crates/store/migrations/` and run via:
//! ```bash
//! cargo run -p codledger-cli -- migrate
//! ```
//!
//! The crate exposes repository types per table plus [`PgSettlementStore`],
//! the `SettlementStore` implementation the engine's service runs against.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod ingest;
pub mod orders;
pub mod payment_cycles;
pub mod payout_log;
pub mod pricing;
pub mod reconciliations;
pub mod settlement;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use codledger_engine::StoreError;

pub use orders::OrderRepository;
pub use payment_cycles::PaymentCycleRepository;
pub use payout_log::PayoutLogRepository;
pub use pricing::PricingRepository;
pub use reconciliations::ReconciliationRepository;
pub use settlement::PgSettlementStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// A write targeted an entity that was not found.
    #[error("{entity} not found: {key}")]
    NotFound {
        entity: &'static str,
        key: String,
    },

    /// Constraint violation (e.g., duplicate reconciliation).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl From<RepositoryError> for StoreError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Database(e) => Self::Database(Box::new(e)),
            RepositoryError::DataCorruption(msg) => Self::Database(msg.into()),
            RepositoryError::NotFound { entity, key } => Self::NotFound { entity, key },
            RepositoryError::Conflict(msg) => Self::Conflict(msg),
        }
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Run all pending migrations.
///
/// # Errors
///
/// Returns `sqlx::migrate::MigrateError` if a migration fails.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
