//! CodLedger Engine - payout calculation and RTS/RTO reconciliation.
//!
//! The engine turns uploaded order snapshots plus two pricing tables into
//! periodic dropshipper payouts:
//!
//! - [`pricing`] resolves per-unit product cost and flat shipping charges
//!   under a cascading fallback policy (missing configuration never aborts
//!   a batch).
//! - [`payout`] is the aggregation engine: a single fold over classified,
//!   window-filtered order lines producing a financial summary plus a
//!   line-level reconciliation ledger.
//! - [`reconciliation`] detects delivered-to-returned status regressions
//!   across upload snapshots and proposes payout reversals with a
//!   confidence rating.
//! - [`cycle`] translates payment-cycle definitions into concrete date
//!   windows.
//! - [`service`] wires the pure calculators to a [`store::SettlementStore`]
//!   implementation.
//!
//! All calculation entry points are pure functions over in-memory
//! projections; the only write in the whole crate is reconciliation
//! confirmation, performed through the store trait. Callers may run
//! calculations concurrently against a consistent snapshot without locking.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cycle;
pub mod error;
pub mod models;
pub mod payout;
pub mod pricing;
pub mod reconciliation;
pub mod service;
pub mod settings;
pub mod store;

pub use error::EngineError;
pub use service::SettlementService;
pub use settings::EngineSettings;
pub use store::{SettlementStore, StoreError};
