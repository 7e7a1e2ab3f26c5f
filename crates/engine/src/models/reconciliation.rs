//! Payout log and RTS/RTO reconciliation models.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use codledger_core::{
    Email, OrderRef, PayoutLogId, ProductUid, ReconciliationId, Waybill,
};

/// An immutable record of a payout actually disbursed.
///
/// Created only by the payout-confirmation workflow; the detector reads it
/// to decide whether a reversal is owed and for how much.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutLogEntry {
    pub id: PayoutLogId,
    pub order_ref: OrderRef,
    pub waybill: Option<Waybill>,
    pub dropshipper: Email,
    pub product_uid: ProductUid,
    /// Period the disbursement covered.
    pub period_from: NaiveDate,
    pub period_to: NaiveDate,
    /// Amount actually paid out.
    pub paid_amount: Decimal,
    /// Free-form calculation breakdown captured at disbursement time.
    pub breakdown: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Lifecycle of a confirmed reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReconciliationStatus {
    #[default]
    Pending,
    Processed,
    Disputed,
}

impl ReconciliationStatus {
    /// Stable string form used in storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processed => "processed",
            Self::Disputed => "disputed",
        }
    }
}

impl std::str::FromStr for ReconciliationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processed" => Ok(Self::Processed),
            "disputed" => Ok(Self::Disputed),
            _ => Err(format!("invalid reconciliation status: {s}")),
        }
    }
}

/// A confirmed RTS/RTO adjustment.
///
/// One conceptual record exists per (order, product); its presence in the
/// ledger is what stops the detector from re-suggesting the order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationRecord {
    pub id: ReconciliationId,
    pub order_ref: OrderRef,
    pub product_uid: ProductUid,
    pub dropshipper: Email,
    /// What was originally paid out, when known.
    pub original_paid_amount: Option<Decimal>,
    /// Computed reversal amount.
    pub reversal_amount: Decimal,
    pub status: ReconciliationStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for confirming a reconciliation.
///
/// Confirmation is a pure insert - there are no update or merge semantics;
/// each confirmation produces a new immutable record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReconciliation {
    pub order_ref: OrderRef,
    pub product_uid: ProductUid,
    pub dropshipper: Email,
    pub original_paid_amount: Option<Decimal>,
    pub reversal_amount: Decimal,
    pub status: ReconciliationStatus,
    pub notes: Option<String>,
}

/// Detector confidence in a reversal suggestion.
///
/// Ordering matters: suggestions sort by confidence descending, then by
/// reversal amount descending.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

/// A proposed payout reversal for an order whose status regressed to
/// RTS/RTO after it was (possibly) paid out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReversalSuggestion {
    pub order_ref: OrderRef,
    pub product_uid: ProductUid,
    pub dropshipper: Email,
    pub waybill: Option<Waybill>,
    /// COD value on the returned snapshot line.
    pub cod_amount: Decimal,
    /// Prior disbursement found in the payout log, if any.
    pub prior_paid_amount: Option<Decimal>,
    /// Proposed reversal, floored at zero.
    pub suggested_reversal: Decimal,
    pub confidence: Confidence,
    /// Whether a delivered snapshot precedes the returned one in history.
    pub transition_detected: bool,
    /// Medium-confidence suggestions (payout without an observed
    /// transition) are flagged for manual verification.
    pub needs_manual_review: bool,
}

/// An RTS/RTO order awaiting reconciliation, listed unconditionally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingReturn {
    pub order_ref: OrderRef,
    pub product_uid: ProductUid,
    pub dropshipper: Email,
    pub waybill: Option<Waybill>,
    pub status: String,
    pub order_value: Decimal,
    pub order_date: DateTime<Utc>,
    pub return_initiated_date: Option<DateTime<Utc>>,
}
