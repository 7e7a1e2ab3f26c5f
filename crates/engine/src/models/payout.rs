//! Payout calculation request and result models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use codledger_core::{
    CurrencyCode, OrderRef, PaymentModeClass, ProductUid, StatusClass, Waybill,
};

use super::cycle::DateWindow;

/// A payout calculation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutRequest {
    /// Window the order date must fall in for shipping-cost accrual.
    pub order_window: DateWindow,
    /// Window the delivered date must fall in for COD / product-cost
    /// accrual. Inclusive through end-of-day on the upper bound.
    pub delivery_window: DateWindow,
    /// Restrict the calculation to one dropshipper (case-insensitive
    /// exact email match). `None` computes across all dropshippers.
    pub dropshipper: Option<String>,
}

/// Where a shipping rate came from in the fallback ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateSource {
    /// Exact (product, weight, carrier) match.
    Exact,
    /// Same product and carrier, any configured weight.
    AnyWeight,
    /// Hardcoded per-carrier default.
    CarrierDefault,
    /// Global default for unrecognized carriers.
    GlobalDefault,
}

/// One line of the reconciliation ledger emitted alongside the summary.
///
/// Cost computation is per line item, not per order, so mixed-product
/// orders keep line-level granularity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutRow {
    pub order_ref: OrderRef,
    pub waybill: Option<Waybill>,
    pub dropshipper: String,
    pub product_uid: ProductUid,
    pub product_name: String,
    pub quantity: i32,
    pub status_class: StatusClass,
    pub payment_mode: PaymentModeClass,
    /// COD collected for this line, when delivered in window and COD.
    pub cod_received: Decimal,
    /// Shipping charge for this line (`qty x flat rate`); zero for
    /// cancelled lines regardless of configuration.
    pub shipping_cost: Decimal,
    /// Product cost for this line (`qty x unit cost`) when delivered in
    /// window, COD or prepaid alike.
    pub product_cost: Decimal,
    /// `cod_received - shipping_cost - product_cost`. No cross-order
    /// netting happens at the row level.
    pub payable: Decimal,
    /// Which rung of the fallback ladder supplied the shipping rate, when
    /// a shipping charge applied at all.
    pub rate_source: Option<RateSource>,
}

/// Why a configuration lookup degraded to a default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigGapKind {
    /// No unit cost configured for (dropshipper, product).
    MissingUnitCost,
    /// No configured rate row; a carrier or global default was used.
    MissingShippingRate,
    /// No configured weight; the default lookup weight was used.
    MissingWeight,
}

/// A configuration gap encountered during a calculation.
///
/// Never fatal: the affected value degrades to zero or a default, and the
/// gap is surfaced here for the missing-configuration report.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigGap {
    pub kind: ConfigGapKind,
    pub dropshipper: String,
    pub product_uid: ProductUid,
}

/// A confirmed reversal merged into a payout report by the caller.
///
/// The aggregation engine never searches for reversals itself; the
/// RTS/RTO detector proposes them and confirmed records are handed in
/// explicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReversalAdjustment {
    pub order_ref: OrderRef,
    pub product_uid: ProductUid,
    /// Signed amount added to the payable total (reversals are negative).
    pub amount: Decimal,
    pub note: Option<String>,
}

/// Aggregate totals for a payout calculation.
///
/// All totals are raw accumulations; only [`PayoutSummary::final_payable`]
/// is rounded, once, at the aggregate level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutSummary {
    /// COD collected across delivered-in-window COD lines.
    pub cod_total: Decimal,
    /// Shipping charges across non-cancelled lines ordered in window.
    pub shipping_total: Decimal,
    /// Product cost across delivered-in-window lines, any payment mode.
    pub product_cost_total: Decimal,
    /// Sum of merged reversal adjustments (typically negative).
    pub reversal_total: Decimal,
    /// `round(cod_total - shipping_total - product_cost_total + reversal_total)`.
    pub final_payable: Decimal,
    /// Distinct orders that accrued COD.
    pub orders_with_cod: usize,
    /// Distinct orders with a strictly positive shipping charge. A zero or
    /// unconfigured rate never inflates this count.
    pub orders_with_shipping_charges: usize,
    /// Distinct delivered orders that accrued product cost.
    pub orders_with_product_amount: usize,
    /// Line items inspected (after deny-list and dropshipper filtering).
    pub lines_considered: usize,
    /// Configuration gaps encountered, deduplicated.
    pub config_gaps: Vec<ConfigGap>,
    /// Currency the totals are denominated in.
    pub currency: CurrencyCode,
}

/// Full result of a payout calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutReport {
    pub summary: PayoutSummary,
    pub rows: Vec<PayoutRow>,
    pub adjustments: Vec<ReversalAdjustment>,
}
