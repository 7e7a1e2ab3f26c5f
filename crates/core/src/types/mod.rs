//! Core types for CodLedger.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod keys;
pub mod money;
pub mod refs;

pub use email::{Email, EmailError};
pub use id::*;
pub use keys::{PriceKey, RateKey};
pub use money::{CurrencyCode, Money, round_whole};
pub use refs::{Carrier, OrderRef, ProductUid, Waybill};
