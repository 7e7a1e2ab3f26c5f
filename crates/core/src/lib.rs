//! CodLedger Core - Shared types library.
//!
//! This crate provides common types used across all CodLedger components:
//! - `engine` - Payout calculation and RTS/RTO reconciliation
//! - `store` - PostgreSQL persistence for orders, pricing and ledgers
//! - `cli` - Command-line tools for reports and migrations
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! database access. This keeps it lightweight and allows it to be used
//! anywhere, including inside the classification hot loop of the payout
//! engine.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, money, emails, and
//!   order/product references
//! - [`classify`] - Status and payment-mode classification shared by every
//!   downstream aggregator

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod classify;
pub mod types;

pub use classify::*;
pub use types::*;
