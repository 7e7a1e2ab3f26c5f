//! Storage seam for the settlement service.
//!
//! The engine's calculators are pure functions; [`SettlementStore`] is the
//! single boundary through which [`crate::service::SettlementService`]
//! obtains their inputs and persists confirmed reconciliations. The
//! Postgres implementation lives in the store crate; tests supply an
//! in-memory one.

use thiserror::Error;

use codledger_core::{Email, OrderRef};

use crate::models::reconciliation::{
    NewReconciliation, PayoutLogEntry, ReconciliationRecord,
};
use crate::models::{OrderRecord, PaymentCycle, PriceConfig, ShippingRateConfig};

/// Errors surfaced by a store implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying storage failure (connection, query, decoding).
    #[error("storage failure: {0}")]
    Database(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A write targeted a row that does not exist. Reads that find nothing
    /// return typed absence instead of this variant.
    #[error("{entity} not found: {key}")]
    NotFound {
        entity: &'static str,
        key: String,
    },

    /// A uniqueness constraint rejected the write, e.g. confirming a
    /// reconciliation that already exists for the (order, product) pair.
    #[error("conflict: {0}")]
    Conflict(String),
}

/// Read/write access to the settlement data set.
///
/// All fetches return full, unwindowed data for the given scope; windowing
/// and filtering happen in the engine so every calculator sees the same
/// snapshot semantics. The only write is [`Self::insert_reconciliation`].
#[allow(async_fn_in_trait)]
pub trait SettlementStore: Send + Sync {
    /// Full order snapshot history, optionally scoped to one dropshipper.
    async fn fetch_orders(
        &self,
        dropshipper: Option<&str>,
    ) -> Result<Vec<OrderRecord>, StoreError>;

    /// All price configuration rows, optionally scoped to one dropshipper.
    async fn fetch_price_configs(
        &self,
        dropshipper: Option<&str>,
    ) -> Result<Vec<PriceConfig>, StoreError>;

    /// All shipping rate rows. Rates are global, not per dropshipper.
    async fn fetch_shipping_rates(&self) -> Result<Vec<ShippingRateConfig>, StoreError>;

    /// Payout log entries for the given order identifiers.
    async fn fetch_payout_log(
        &self,
        order_refs: &[OrderRef],
    ) -> Result<Vec<PayoutLogEntry>, StoreError>;

    /// Reconciliation ledger records for the given order identifiers.
    async fn fetch_reconciliations(
        &self,
        order_refs: &[OrderRef],
    ) -> Result<Vec<ReconciliationRecord>, StoreError>;

    /// Insert a confirmed reconciliation. Fails with
    /// [`StoreError::Conflict`] when one already exists for the
    /// (order, product) pair.
    async fn insert_reconciliation(
        &self,
        record: NewReconciliation,
    ) -> Result<ReconciliationRecord, StoreError>;

    /// Look up a dropshipper's payment cycle by name.
    async fn fetch_payment_cycle(
        &self,
        dropshipper: &Email,
        name: &str,
    ) -> Result<Option<PaymentCycle>, StoreError>;
}
