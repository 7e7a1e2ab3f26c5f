//! Order line item model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use codledger_core::{
    Carrier, Email, IngestSeq, OrderLineId, OrderRef, PaymentModeClass, ProductUid, StatusClass,
    Waybill,
};

/// One line item within one uploaded order snapshot.
///
/// An order may span multiple line items sharing the same [`OrderRef`], and
/// the same order appears once per upload: successive uploads are status
/// snapshots over time, never duplicates. The engine must not deduplicate
/// across uploads - history is cumulative, and [`OrderRecord::ingest_seq`]
/// fixes the chronological order of snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRecord {
    /// Storage row ID.
    pub id: OrderLineId,
    /// Order identifier - grouping key, not unique on its own.
    pub order_ref: OrderRef,
    /// Carrier tracking / waybill number, when known.
    pub waybill: Option<Waybill>,
    /// Owning dropshipper.
    pub dropshipper: Email,
    /// Deterministic product identity (dropshipper email + product name).
    pub product_uid: ProductUid,
    /// Product display name as uploaded.
    pub product_name: String,
    /// Stock keeping unit, when the sheet carries one.
    pub sku: Option<String>,
    /// Units on this line. Always positive.
    pub quantity: i32,
    /// Monetary value associated with the line. For COD lines this is the
    /// amount the carrier collects; it already accounts for quantity.
    pub order_value: Decimal,
    /// Raw payment mode text ("COD", "Prepaid", blank...).
    pub payment_mode: Option<String>,
    /// Raw lifecycle status text as uploaded.
    pub status: String,
    /// When the order was placed.
    pub order_date: DateTime<Utc>,
    /// When the shipment was delivered, once status reaches delivered.
    pub delivered_date: Option<DateTime<Utc>>,
    /// When a return was initiated, if ever.
    pub return_initiated_date: Option<DateTime<Utc>>,
    /// Carrier handling the shipment.
    pub carrier: Carrier,
    /// Upload batch this snapshot arrived in. Provenance only; never
    /// affects calculation.
    pub upload_batch: Uuid,
    /// Monotonic snapshot sequence assigned at ingest.
    pub ingest_seq: IngestSeq,
}

impl OrderRecord {
    /// Classify this line's lifecycle status.
    #[must_use]
    pub fn status_class(&self) -> StatusClass {
        StatusClass::classify(&self.status, self.return_initiated_date.is_some())
    }

    /// Classify this line's payment mode.
    #[must_use]
    pub fn payment_mode_class(&self) -> PaymentModeClass {
        PaymentModeClass::classify(self.payment_mode.as_deref())
    }
}
