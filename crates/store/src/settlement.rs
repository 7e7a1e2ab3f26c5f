//! `SettlementStore` implementation backed by `PostgreSQL`.

use sqlx::PgPool;

use codledger_core::{Email, OrderRef};
use codledger_engine::models::reconciliation::{
    NewReconciliation, PayoutLogEntry, ReconciliationRecord,
};
use codledger_engine::models::{OrderRecord, PaymentCycle, PriceConfig, ShippingRateConfig};
use codledger_engine::{SettlementStore, StoreError};

use crate::{
    OrderRepository, PaymentCycleRepository, PayoutLogRepository, PricingRepository,
    ReconciliationRepository,
};

/// The production store: one connection pool, repositories per table.
#[derive(Clone)]
pub struct PgSettlementStore {
    pool: PgPool,
}

impl PgSettlementStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool, for operations outside the engine seam
    /// (ingest, config upserts, payout logging).
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl SettlementStore for PgSettlementStore {
    async fn fetch_orders(
        &self,
        dropshipper: Option<&str>,
    ) -> Result<Vec<OrderRecord>, StoreError> {
        Ok(OrderRepository::new(&self.pool)
            .fetch_orders(dropshipper)
            .await?)
    }

    async fn fetch_price_configs(
        &self,
        dropshipper: Option<&str>,
    ) -> Result<Vec<PriceConfig>, StoreError> {
        Ok(PricingRepository::new(&self.pool)
            .fetch_price_configs(dropshipper)
            .await?)
    }

    async fn fetch_shipping_rates(&self) -> Result<Vec<ShippingRateConfig>, StoreError> {
        Ok(PricingRepository::new(&self.pool)
            .fetch_shipping_rates()
            .await?)
    }

    async fn fetch_payout_log(
        &self,
        order_refs: &[OrderRef],
    ) -> Result<Vec<PayoutLogEntry>, StoreError> {
        Ok(PayoutLogRepository::new(&self.pool)
            .fetch_for_orders(order_refs)
            .await?)
    }

    async fn fetch_reconciliations(
        &self,
        order_refs: &[OrderRef],
    ) -> Result<Vec<ReconciliationRecord>, StoreError> {
        Ok(ReconciliationRepository::new(&self.pool)
            .fetch_for_orders(order_refs)
            .await?)
    }

    async fn insert_reconciliation(
        &self,
        record: NewReconciliation,
    ) -> Result<ReconciliationRecord, StoreError> {
        Ok(ReconciliationRepository::new(&self.pool)
            .insert(record)
            .await?)
    }

    async fn fetch_payment_cycle(
        &self,
        dropshipper: &Email,
        name: &str,
    ) -> Result<Option<PaymentCycle>, StoreError> {
        Ok(PaymentCycleRepository::new(&self.pool)
            .fetch(dropshipper, name)
            .await?)
    }
}
