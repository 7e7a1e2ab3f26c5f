//! RTS/RTO detection and payout reversal suggestions.
//!
//! Uploaded sheets are snapshots: the same order identifier reappears
//! across uploads with a progressing status. The detector replays that
//! snapshot history in ingestion order to find orders that were observed
//! delivered and later regressed to RTS/RTO, cross-references the payout
//! log, and ranks reversal suggestions by confidence.
//!
//! Absence of history, payout log, or price data is not an error anywhere
//! in this module; every branch has a defined degraded output.

use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;
use tracing::debug;

use codledger_core::{OrderRef, StatusClass};

use crate::models::reconciliation::{
    Confidence, PayoutLogEntry, PendingReturn, ReconciliationRecord, ReversalSuggestion,
};
use crate::models::{DateWindow, OrderRecord};
use crate::settings::EngineSettings;

/// Scan full order history for delivered-to-returned regressions and
/// propose payout reversals.
///
/// `history` must be the full (unwindowed) snapshot history for the scope:
/// transitions are invisible in a windowed slice. `window` bounds only the
/// order date of the current returned snapshot. Orders already present in
/// the reconciliation `ledger` are never re-suggested.
#[must_use]
pub fn auto_detect(
    history: &[OrderRecord],
    payout_log: &[PayoutLogEntry],
    ledger: &[ReconciliationRecord],
    window: &DateWindow,
    dropshipper: Option<&str>,
    settings: &EngineSettings,
) -> Vec<ReversalSuggestion> {
    let resolved: HashSet<&OrderRef> = ledger.iter().map(|r| &r.order_ref).collect();

    let mut paid: HashMap<&OrderRef, &PayoutLogEntry> = HashMap::new();
    for entry in payout_log {
        paid.entry(&entry.order_ref).or_insert(entry);
    }

    let mut suggestions = Vec::new();
    for (order_ref, snapshots) in snapshot_groups(history, dropshipper, settings) {
        if resolved.contains(order_ref) {
            continue;
        }

        // The latest snapshot is the order's current state.
        let Some(current) = snapshots.last() else {
            continue;
        };
        if !current.status_class().is_return() || !window.contains(current.order_date) {
            continue;
        }

        let transition_detected = has_delivered_before_return(&snapshots);
        let prior = paid.get(order_ref).copied();
        let cod_amount = current.order_value;

        let (confidence, suggested_reversal, needs_manual_review) =
            match (transition_detected, prior) {
                (true, Some(entry)) => (Confidence::High, entry.paid_amount, false),
                (true, None) => (
                    Confidence::High,
                    estimate_reversal(cod_amount, settings),
                    false,
                ),
                (false, Some(entry)) => (Confidence::Medium, entry.paid_amount, true),
                (false, None) => (
                    Confidence::Low,
                    estimate_reversal(cod_amount, settings),
                    false,
                ),
            };

        suggestions.push(ReversalSuggestion {
            order_ref: current.order_ref.clone(),
            product_uid: current.product_uid.clone(),
            dropshipper: current.dropshipper.clone(),
            waybill: current.waybill.clone(),
            cod_amount,
            prior_paid_amount: prior.map(|entry| entry.paid_amount),
            suggested_reversal,
            confidence,
            transition_detected,
            needs_manual_review,
        });
    }

    suggestions.sort_by(|a, b| {
        b.confidence
            .cmp(&a.confidence)
            .then(b.suggested_reversal.cmp(&a.suggested_reversal))
    });

    debug!(suggestions = suggestions.len(), "auto-detect complete");
    suggestions
}

/// List current RTS/RTO orders that have no reconciliation record yet.
///
/// A plain listing, independent of the confidence heuristics: no payout
/// log lookup, no transition scan, no date window.
#[must_use]
pub fn pending_returns(
    history: &[OrderRecord],
    ledger: &[ReconciliationRecord],
    dropshipper: Option<&str>,
    settings: &EngineSettings,
) -> Vec<PendingReturn> {
    let resolved: HashSet<&OrderRef> = ledger.iter().map(|r| &r.order_ref).collect();

    let mut pending = Vec::new();
    for (order_ref, snapshots) in snapshot_groups(history, dropshipper, settings) {
        if resolved.contains(order_ref) {
            continue;
        }
        let Some(current) = snapshots.last() else {
            continue;
        };
        if !current.status_class().is_return() {
            continue;
        }

        pending.push(PendingReturn {
            order_ref: current.order_ref.clone(),
            product_uid: current.product_uid.clone(),
            dropshipper: current.dropshipper.clone(),
            waybill: current.waybill.clone(),
            status: current.status.clone(),
            order_value: current.order_value,
            order_date: current.order_date,
            return_initiated_date: current.return_initiated_date,
        });
    }

    pending.sort_by(|a, b| a.order_ref.cmp(&b.order_ref));
    pending
}

/// Reversal estimate when no payout log entry exists: COD minus a flat
/// shipping estimate minus an assumed product-cost share, floored at zero.
/// A heuristic placeholder, not a rate-book resolution.
#[must_use]
pub fn estimate_reversal(cod_amount: Decimal, settings: &EngineSettings) -> Decimal {
    let estimate = cod_amount
        - settings.reversal_shipping_estimate
        - cod_amount * settings.reversal_product_cost_fraction;
    estimate.max(Decimal::ZERO)
}

/// Group snapshots by order identifier, each group ordered by ingestion
/// sequence, with deny-list and dropshipper filtering applied.
fn snapshot_groups<'a>(
    history: &'a [OrderRecord],
    dropshipper: Option<&str>,
    settings: &EngineSettings,
) -> HashMap<&'a OrderRef, Vec<&'a OrderRecord>> {
    let mut groups: HashMap<&OrderRef, Vec<&OrderRecord>> = HashMap::new();
    for record in history {
        if settings.is_denied(record.dropshipper.as_str()) {
            continue;
        }
        if let Some(filter) = dropshipper
            && !record.dropshipper.matches(filter)
        {
            continue;
        }
        groups.entry(&record.order_ref).or_default().push(record);
    }
    for snapshots in groups.values_mut() {
        snapshots.sort_by_key(|r| r.ingest_seq);
    }
    groups
}

/// Whether a delivered snapshot precedes a later returned snapshot.
/// First delivered occurrence wins; the pair need not be adjacent.
fn has_delivered_before_return(snapshots: &[&OrderRecord]) -> bool {
    let Some(delivered_at) = snapshots
        .iter()
        .position(|r| matches!(r.status_class(), StatusClass::Delivered))
    else {
        return false;
    };
    snapshots[delivered_at + 1..]
        .iter()
        .any(|r| r.status_class().is_return())
}
