//! Engine error type.

use thiserror::Error;

use crate::store::StoreError;

/// Errors returned by the settlement service.
///
/// Calculation itself never fails; degraded inputs produce degraded
/// outputs. Errors here come from storage or from addressing entities
/// that do not exist.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The named payment cycle is not configured for the dropshipper.
    #[error("no payment cycle named {name:?} for {dropshipper}")]
    CycleNotFound { dropshipper: String, name: String },
}
