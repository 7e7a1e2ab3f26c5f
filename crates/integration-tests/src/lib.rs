//! Shared fixtures for CodLedger integration tests.
//!
//! [`MemoryStore`] is a complete in-memory `SettlementStore` so the
//! settlement flows can be exercised end to end without `PostgreSQL`.
//! Builder helpers construct domain values with sensible defaults; tests
//! override only the fields they are about.

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::unwrap_used)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use codledger_core::{
    Carrier, CurrencyCode, Email, IngestSeq, OrderLineId, OrderRef, PayoutLogId, ProductUid,
    ReconciliationId, Waybill,
};
use codledger_engine::models::reconciliation::{
    NewReconciliation, PayoutLogEntry, ReconciliationRecord,
};
use codledger_engine::models::{
    OrderRecord, PaymentCycle, PriceConfig, ShippingRateConfig,
};
use codledger_engine::{SettlementStore, StoreError};

/// In-memory store over plain Vecs. Reads clone; the single write appends
/// under a mutex and enforces the (order, product) uniqueness the real
/// schema carries as an index.
#[derive(Default)]
pub struct MemoryStore {
    pub orders: Vec<OrderRecord>,
    pub prices: Vec<PriceConfig>,
    pub rates: Vec<ShippingRateConfig>,
    pub payout_log: Vec<PayoutLogEntry>,
    pub cycles: Vec<PaymentCycle>,
    ledger: Mutex<Vec<ReconciliationRecord>>,
    next_id: AtomicI64,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_orders(mut self, orders: Vec<OrderRecord>) -> Self {
        self.orders = orders;
        self
    }

    pub fn with_prices(mut self, prices: Vec<PriceConfig>) -> Self {
        self.prices = prices;
        self
    }

    pub fn with_rates(mut self, rates: Vec<ShippingRateConfig>) -> Self {
        self.rates = rates;
        self
    }

    pub fn with_payout_log(mut self, entries: Vec<PayoutLogEntry>) -> Self {
        self.payout_log = entries;
        self
    }

    pub fn with_cycles(mut self, cycles: Vec<PaymentCycle>) -> Self {
        self.cycles = cycles;
        self
    }
}

impl SettlementStore for MemoryStore {
    async fn fetch_orders(
        &self,
        dropshipper: Option<&str>,
    ) -> Result<Vec<OrderRecord>, StoreError> {
        Ok(self
            .orders
            .iter()
            .filter(|o| dropshipper.is_none_or(|d| o.dropshipper.matches(d)))
            .cloned()
            .collect())
    }

    async fn fetch_price_configs(
        &self,
        dropshipper: Option<&str>,
    ) -> Result<Vec<PriceConfig>, StoreError> {
        Ok(self
            .prices
            .iter()
            .filter(|p| dropshipper.is_none_or(|d| p.dropshipper.matches(d)))
            .cloned()
            .collect())
    }

    async fn fetch_shipping_rates(&self) -> Result<Vec<ShippingRateConfig>, StoreError> {
        Ok(self.rates.clone())
    }

    async fn fetch_payout_log(
        &self,
        order_refs: &[OrderRef],
    ) -> Result<Vec<PayoutLogEntry>, StoreError> {
        Ok(self
            .payout_log
            .iter()
            .filter(|e| order_refs.contains(&e.order_ref))
            .cloned()
            .collect())
    }

    async fn fetch_reconciliations(
        &self,
        order_refs: &[OrderRef],
    ) -> Result<Vec<ReconciliationRecord>, StoreError> {
        Ok(self
            .ledger
            .lock()
            .unwrap()
            .iter()
            .filter(|r| order_refs.contains(&r.order_ref))
            .cloned()
            .collect())
    }

    async fn insert_reconciliation(
        &self,
        record: NewReconciliation,
    ) -> Result<ReconciliationRecord, StoreError> {
        let mut ledger = self.ledger.lock().unwrap();
        if ledger
            .iter()
            .any(|r| r.order_ref == record.order_ref && r.product_uid == record.product_uid)
        {
            return Err(StoreError::Conflict(format!(
                "reconciliation already recorded for order {}",
                record.order_ref
            )));
        }

        let stored = ReconciliationRecord {
            id: ReconciliationId::new(self.next_id.fetch_add(1, Ordering::Relaxed) + 1),
            order_ref: record.order_ref,
            product_uid: record.product_uid,
            dropshipper: record.dropshipper,
            original_paid_amount: record.original_paid_amount,
            reversal_amount: record.reversal_amount,
            status: record.status,
            notes: record.notes,
            created_at: Utc::now(),
        };
        ledger.push(stored.clone());
        Ok(stored)
    }

    async fn fetch_payment_cycle(
        &self,
        dropshipper: &Email,
        name: &str,
    ) -> Result<Option<PaymentCycle>, StoreError> {
        Ok(self
            .cycles
            .iter()
            .find(|c| c.dropshipper == *dropshipper && c.name == name)
            .cloned())
    }
}

/// The default test dropshipper.
#[must_use]
pub fn seller() -> Email {
    Email::parse("seller@shop.com").unwrap()
}

/// The default test product, owned by [`seller`].
#[must_use]
pub fn belt() -> ProductUid {
    ProductUid::derive(&seller(), "Posture Belt")
}

#[must_use]
pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

/// An order line snapshot with test defaults: ordered 2024-03-10,
/// delivered 2024-03-15, COD, one unit, carried by Delhivery.
#[must_use]
pub fn order_line(order_ref: &str, status: &str, seq: i64, value: Decimal) -> OrderRecord {
    OrderRecord {
        id: OrderLineId::new(seq),
        order_ref: order_ref.into(),
        waybill: Some(Waybill::new(format!("WB-{seq}"))),
        dropshipper: seller(),
        product_uid: belt(),
        product_name: "Posture Belt".to_owned(),
        sku: None,
        quantity: 1,
        order_value: value,
        payment_mode: Some("COD".to_owned()),
        status: status.to_owned(),
        order_date: at(2024, 3, 10, 12, 0),
        delivered_date: Some(at(2024, 3, 15, 18, 0)),
        return_initiated_date: None,
        carrier: Carrier::new("Delhivery"),
        upload_batch: Uuid::nil(),
        ingest_seq: IngestSeq::new(seq),
    }
}

/// A price config for [`belt`] with the given unit cost and 0.5 kg weight.
#[must_use]
pub fn price_config(unit_cost: Decimal) -> PriceConfig {
    PriceConfig {
        dropshipper: seller(),
        product_uid: belt(),
        unit_cost,
        weight_kg: Some(Decimal::new(5, 1)),
        currency: CurrencyCode::INR,
        updated_at: Utc::now(),
    }
}

/// A Delhivery 0.5 kg rate row for [`belt`].
#[must_use]
pub fn rate_config(flat_rate: Decimal) -> ShippingRateConfig {
    ShippingRateConfig {
        product_uid: belt(),
        weight_kg: Decimal::new(5, 1),
        carrier: Carrier::new("Delhivery"),
        flat_rate,
        updated_at: Utc::now(),
    }
}

/// A payout log entry recording a past disbursement for an order.
#[must_use]
pub fn payout_entry(order_ref: &str, paid: Decimal) -> PayoutLogEntry {
    PayoutLogEntry {
        id: PayoutLogId::new(1),
        order_ref: order_ref.into(),
        waybill: None,
        dropshipper: seller(),
        product_uid: belt(),
        period_from: "2024-02-01".parse().unwrap(),
        period_to: "2024-02-29".parse().unwrap(),
        paid_amount: paid,
        breakdown: serde_json::json!({"source": "test"}),
        created_at: Utc::now(),
    }
}
