//! Domain models for the settlement engine.
//!
//! These are transient in-memory projections of the persistent store;
//! calculation code never mutates stored rows through them.

pub mod cycle;
pub mod order;
pub mod payout;
pub mod pricing;
pub mod reconciliation;

pub use cycle::{CycleKind, DateWindow, PaymentCycle};
pub use order::OrderRecord;
pub use payout::{
    ConfigGap, ConfigGapKind, PayoutReport, PayoutRequest, PayoutRow, PayoutSummary, RateSource,
    ReversalAdjustment,
};
pub use pricing::{PriceConfig, ShippingRateConfig};
pub use reconciliation::{
    Confidence, NewReconciliation, PayoutLogEntry, PendingReturn, ReconciliationRecord,
    ReconciliationStatus, ReversalSuggestion,
};
