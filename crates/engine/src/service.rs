//! Settlement service: storage-backed entry points.
//!
//! [`SettlementService`] fetches calculator inputs through a
//! [`SettlementStore`] and delegates to the pure functions in [`payout`],
//! [`reconciliation`] and [`cycle`]. It holds no mutable state of its own,
//! so concurrent invocations against a consistent store snapshot are safe.

use chrono::NaiveDate;
use tracing::{info, instrument};

use codledger_core::{Email, OrderRef};

use crate::cycle;
use crate::error::EngineError;
use crate::models::reconciliation::{
    NewReconciliation, PendingReturn, ReconciliationRecord, ReversalSuggestion,
};
use crate::models::{DateWindow, PayoutReport, PayoutRequest, ReversalAdjustment};
use crate::payout;
use crate::reconciliation;
use crate::settings::EngineSettings;
use crate::store::SettlementStore;

/// The public face of the settlement engine.
pub struct SettlementService<S> {
    store: S,
    settings: EngineSettings,
}

impl<S: SettlementStore> SettlementService<S> {
    pub const fn new(store: S, settings: EngineSettings) -> Self {
        Self { store, settings }
    }

    /// Calculate payouts for a request window.
    ///
    /// `adjustments` are confirmed reversals the caller chooses to merge
    /// into this period's settlement; pass an empty Vec for a plain report.
    /// Read-only.
    #[instrument(skip(self, adjustments), fields(window = %request.order_window))]
    pub async fn calculate_payouts(
        &self,
        request: &PayoutRequest,
        adjustments: Vec<ReversalAdjustment>,
    ) -> Result<PayoutReport, EngineError> {
        let dropshipper = request.dropshipper.as_deref();
        let orders = self.store.fetch_orders(dropshipper).await?;
        let prices = self.store.fetch_price_configs(dropshipper).await?;
        let rates = self.store.fetch_shipping_rates().await?;

        let report = payout::calculate(
            &orders,
            &prices,
            &rates,
            request,
            adjustments,
            &self.settings,
        );
        info!(
            lines = report.summary.lines_considered,
            final_payable = %report.summary.final_payable,
            "payout calculation complete"
        );
        Ok(report)
    }

    /// Detect delivered-to-returned regressions and propose reversals.
    /// Read-only.
    #[instrument(skip(self), fields(window = %window))]
    pub async fn auto_detect_reconciliations(
        &self,
        window: &DateWindow,
        dropshipper: Option<&str>,
    ) -> Result<Vec<ReversalSuggestion>, EngineError> {
        let history = self.store.fetch_orders(dropshipper).await?;

        let refs = distinct_refs(&history);
        let payout_log = self.store.fetch_payout_log(&refs).await?;
        let ledger = self.store.fetch_reconciliations(&refs).await?;

        Ok(reconciliation::auto_detect(
            &history,
            &payout_log,
            &ledger,
            window,
            dropshipper,
            &self.settings,
        ))
    }

    /// Record a confirmed reconciliation. The single write in the engine.
    #[instrument(skip(self, record), fields(order_ref = %record.order_ref))]
    pub async fn confirm_reconciliation(
        &self,
        record: NewReconciliation,
    ) -> Result<ReconciliationRecord, EngineError> {
        let stored = self.store.insert_reconciliation(record).await?;
        info!(id = %stored.id, "reconciliation confirmed");
        Ok(stored)
    }

    /// List RTS/RTO orders that have no reconciliation record yet.
    /// Read-only.
    #[instrument(skip(self))]
    pub async fn pending_returns(
        &self,
        dropshipper: Option<&str>,
    ) -> Result<Vec<PendingReturn>, EngineError> {
        let history = self.store.fetch_orders(dropshipper).await?;
        let refs = distinct_refs(&history);
        let ledger = self.store.fetch_reconciliations(&refs).await?;

        Ok(reconciliation::pending_returns(
            &history,
            &ledger,
            dropshipper,
            &self.settings,
        ))
    }

    /// Resolve a dropshipper's named payment cycle to a concrete window.
    #[instrument(skip(self), fields(dropshipper = %dropshipper))]
    pub async fn resolve_cycle_window(
        &self,
        dropshipper: &Email,
        cycle_name: &str,
        as_of: NaiveDate,
    ) -> Result<DateWindow, EngineError> {
        let cycle = self
            .store
            .fetch_payment_cycle(dropshipper, cycle_name)
            .await?
            .ok_or_else(|| EngineError::CycleNotFound {
                dropshipper: dropshipper.normalized(),
                name: cycle_name.to_owned(),
            })?;

        Ok(cycle::resolve_window(&cycle, as_of))
    }

    /// Resolve a payment cycle and run the payout calculation over it.
    ///
    /// The cycle window bounds both the order date and the delivered date.
    #[instrument(skip(self), fields(dropshipper = %dropshipper))]
    pub async fn run_cycle(
        &self,
        dropshipper: &Email,
        cycle_name: &str,
        as_of: NaiveDate,
    ) -> Result<PayoutReport, EngineError> {
        let window = self
            .resolve_cycle_window(dropshipper, cycle_name, as_of)
            .await?;

        let request = PayoutRequest {
            order_window: window,
            delivery_window: window,
            dropshipper: Some(dropshipper.normalized()),
        };
        self.calculate_payouts(&request, Vec::new()).await
    }
}

fn distinct_refs(history: &[crate::models::OrderRecord]) -> Vec<OrderRef> {
    let mut refs: Vec<OrderRef> = history.iter().map(|r| r.order_ref.clone()).collect();
    refs.sort();
    refs.dedup();
    refs
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use uuid::Uuid;

    use codledger_core::{
        Carrier, IngestSeq, OrderLineId, ProductUid, ReconciliationId,
    };

    use crate::models::reconciliation::ReconciliationStatus;
    use crate::models::{OrderRecord, PaymentCycle, PriceConfig, ShippingRateConfig};
    use crate::store::StoreError;

    use super::*;

    #[derive(Default)]
    struct MemoryStore {
        orders: Vec<OrderRecord>,
        cycles: Vec<PaymentCycle>,
        ledger: Mutex<Vec<ReconciliationRecord>>,
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
            _dropshipper: Option<&str>,
        ) -> Result<Vec<PriceConfig>, StoreError> {
            Ok(Vec::new())
        }

        async fn fetch_shipping_rates(&self) -> Result<Vec<ShippingRateConfig>, StoreError> {
            Ok(Vec::new())
        }

        async fn fetch_payout_log(
            &self,
            _order_refs: &[OrderRef],
        ) -> Result<Vec<crate::models::reconciliation::PayoutLogEntry>, StoreError> {
            Ok(Vec::new())
        }

        async fn fetch_reconciliations(
            &self,
            _order_refs: &[OrderRef],
        ) -> Result<Vec<ReconciliationRecord>, StoreError> {
            Ok(self.ledger.lock().unwrap().clone())
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
                    "reconciliation exists for {}",
                    record.order_ref
                )));
            }
            let stored = ReconciliationRecord {
                id: ReconciliationId::new(i64::try_from(ledger.len()).unwrap() + 1),
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

    fn seller() -> Email {
        Email::parse("seller@shop.com").unwrap()
    }

    fn snapshot(order_ref: &str, status: &str, seq: i64) -> OrderRecord {
        let dropshipper = seller();
        let product_uid = ProductUid::derive(&dropshipper, "Posture Belt");
        OrderRecord {
            id: OrderLineId::new(seq),
            order_ref: order_ref.into(),
            waybill: None,
            dropshipper,
            product_uid,
            product_name: "Posture Belt".to_owned(),
            sku: None,
            quantity: 1,
            order_value: Decimal::new(500, 0),
            payment_mode: Some("COD".to_owned()),
            status: status.to_owned(),
            order_date: Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap(),
            delivered_date: Some(Utc.with_ymd_and_hms(2024, 3, 12, 10, 0, 0).unwrap()),
            return_initiated_date: None,
            carrier: Carrier::new("Delhivery"),
            upload_batch: Uuid::nil(),
            ingest_seq: IngestSeq::new(seq),
        }
    }

    fn march() -> DateWindow {
        DateWindow::new("2024-03-01".parse().unwrap(), "2024-03-31".parse().unwrap())
    }

    #[tokio::test]
    async fn test_detect_then_confirm_then_redetect_is_empty() {
        let store = MemoryStore {
            orders: vec![snapshot("O1", "Delivered", 1), snapshot("O1", "RTO", 2)],
            ..MemoryStore::default()
        };
        let service = SettlementService::new(store, EngineSettings::default());

        let first = service
            .auto_detect_reconciliations(&march(), None)
            .await
            .unwrap();
        assert_eq!(first.len(), 1);

        let suggestion = &first[0];
        service
            .confirm_reconciliation(NewReconciliation {
                order_ref: suggestion.order_ref.clone(),
                product_uid: suggestion.product_uid.clone(),
                dropshipper: suggestion.dropshipper.clone(),
                original_paid_amount: suggestion.prior_paid_amount,
                reversal_amount: suggestion.suggested_reversal,
                status: ReconciliationStatus::Processed,
                notes: None,
            })
            .await
            .unwrap();

        let second = service
            .auto_detect_reconciliations(&march(), None)
            .await
            .unwrap();
        assert!(second.is_empty());
    }

    #[tokio::test]
    async fn test_double_confirm_conflicts() {
        let store = MemoryStore::default();
        let service = SettlementService::new(store, EngineSettings::default());

        let record = NewReconciliation {
            order_ref: "O2".into(),
            product_uid: ProductUid::derive(&seller(), "Belt"),
            dropshipper: seller(),
            original_paid_amount: None,
            reversal_amount: Decimal::new(100, 0),
            status: ReconciliationStatus::Processed,
            notes: None,
        };
        service.confirm_reconciliation(record.clone()).await.unwrap();

        let err = service.confirm_reconciliation(record).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Store(StoreError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_run_cycle_unknown_cycle_is_not_found() {
        let store = MemoryStore::default();
        let service = SettlementService::new(store, EngineSettings::default());

        let err = service
            .run_cycle(&seller(), "weekly-default", "2024-03-15".parse().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::CycleNotFound { .. }));
    }

    #[tokio::test]
    async fn test_run_cycle_produces_report() {
        let cycle = PaymentCycle {
            id: codledger_core::PaymentCycleId::new(1),
            dropshipper: seller(),
            name: "weekly-default".to_owned(),
            kind: crate::models::CycleKind::Weekly,
            offset_days: 0,
            updated_at: Utc::now(),
        };
        let store = MemoryStore {
            orders: vec![snapshot("O3", "Delivered", 1)],
            cycles: vec![cycle],
            ..MemoryStore::default()
        };
        let service = SettlementService::new(store, EngineSettings::default());

        let report = service
            .run_cycle(&seller(), "weekly-default", "2024-03-15".parse().unwrap())
            .await
            .unwrap();
        assert_eq!(report.summary.cod_total, Decimal::new(500, 0));
    }
}
