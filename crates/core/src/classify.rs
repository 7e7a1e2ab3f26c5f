//! Order status and payment-mode classification.
//!
//! Uploaded sheets carry status and payment mode as free text; different
//! carriers and sellers spell them every way imaginable ("Delivered",
//! "DELIVERED - OK", "rto initiated", "CANCELLED by seller"). Every
//! aggregator in the system classifies through these two functions so the
//! substring heuristics live in exactly one place.

use serde::{Deserialize, Serialize};

/// Canonical lifecycle category for an order line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusClass {
    /// Shipment reached the customer.
    Delivered,
    /// Order was cancelled before or during fulfilment.
    Cancelled,
    /// RTS/RTO: the shipment is on its way back to the seller.
    ReturnInProgress,
    /// Anything else (in transit, pending, unknown).
    Other,
}

impl StatusClass {
    /// Classify a raw status string.
    ///
    /// Matching is case-insensitive substring matching. Cancellation is
    /// checked first and short-circuits: real sheets contain statuses like
    /// "Cancelled after delivery attempt" that would otherwise match the
    /// delivered or return patterns. A present return-initiated date
    /// classifies as [`StatusClass::ReturnInProgress`] even when the status
    /// text says nothing about a return.
    #[must_use]
    pub fn classify(raw_status: &str, return_initiated: bool) -> Self {
        let status = raw_status.trim().to_lowercase();

        if status.contains("cancel") {
            return Self::Cancelled;
        }
        if status.contains("delivered") {
            return Self::Delivered;
        }
        if status.contains("rts") || status.contains("rto") || return_initiated {
            return Self::ReturnInProgress;
        }
        Self::Other
    }

    /// True for the RTS/RTO category.
    #[must_use]
    pub const fn is_return(self) -> bool {
        matches!(self, Self::ReturnInProgress)
    }
}

/// Canonical payment mode for an order line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentModeClass {
    /// Cash on delivery - collected by the carrier, remitted upstream.
    Cod,
    /// Anything prepaid-equivalent; excluded from COD totals.
    Prepaid,
}

impl PaymentModeClass {
    /// Classify a raw payment mode string.
    ///
    /// Blank or missing modes classify as COD: unspecified payment mode
    /// means COD in this business, it is not a data error. Any other
    /// non-empty value is treated as prepaid-equivalent.
    #[must_use]
    pub fn classify(raw_mode: Option<&str>) -> Self {
        match raw_mode {
            None => Self::Cod,
            Some(raw) => {
                let mode = raw.trim().to_lowercase();
                if mode.is_empty() || mode == "cod" || mode.contains("cash on delivery") {
                    Self::Cod
                } else {
                    Self::Prepaid
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_delivered_variants() {
        assert_eq!(
            StatusClass::classify("Delivered", false),
            StatusClass::Delivered
        );
        assert_eq!(
            StatusClass::classify("DELIVERED - OK", false),
            StatusClass::Delivered
        );
        assert_eq!(
            StatusClass::classify(" delivered to customer ", false),
            StatusClass::Delivered
        );
    }

    #[test]
    fn test_classify_cancelled_variants() {
        assert_eq!(
            StatusClass::classify("Cancelled", false),
            StatusClass::Cancelled
        );
        assert_eq!(
            StatusClass::classify("CANCEL", false),
            StatusClass::Cancelled
        );
        assert_eq!(
            StatusClass::classify("cancelled by seller", false),
            StatusClass::Cancelled
        );
    }

    #[test]
    fn test_cancel_short_circuits_delivered() {
        // Both patterns present: cancellation wins.
        assert_eq!(
            StatusClass::classify("Cancelled after delivered attempt", false),
            StatusClass::Cancelled
        );
        assert_eq!(
            StatusClass::classify("RTO cancelled", true),
            StatusClass::Cancelled
        );
    }

    #[test]
    fn test_classify_returns() {
        assert_eq!(
            StatusClass::classify("RTO Initiated", false),
            StatusClass::ReturnInProgress
        );
        assert_eq!(
            StatusClass::classify("rts", false),
            StatusClass::ReturnInProgress
        );
        assert_eq!(
            StatusClass::classify("RTO Dispatched", false),
            StatusClass::ReturnInProgress
        );
    }

    #[test]
    fn test_return_date_forces_return_class() {
        assert_eq!(
            StatusClass::classify("In Transit", true),
            StatusClass::ReturnInProgress
        );
    }

    #[test]
    fn test_classify_other() {
        assert_eq!(StatusClass::classify("In Transit", false), StatusClass::Other);
        assert_eq!(StatusClass::classify("", false), StatusClass::Other);
    }

    #[test]
    fn test_payment_mode_blank_defaults_to_cod() {
        assert_eq!(PaymentModeClass::classify(None), PaymentModeClass::Cod);
        assert_eq!(PaymentModeClass::classify(Some("")), PaymentModeClass::Cod);
        assert_eq!(
            PaymentModeClass::classify(Some("   ")),
            PaymentModeClass::Cod
        );
    }

    #[test]
    fn test_payment_mode_cod_variants() {
        assert_eq!(
            PaymentModeClass::classify(Some("COD")),
            PaymentModeClass::Cod
        );
        assert_eq!(
            PaymentModeClass::classify(Some("Cash On Delivery")),
            PaymentModeClass::Cod
        );
    }

    #[test]
    fn test_payment_mode_prepaid() {
        assert_eq!(
            PaymentModeClass::classify(Some("Prepaid")),
            PaymentModeClass::Prepaid
        );
        assert_eq!(
            PaymentModeClass::classify(Some("UPI")),
            PaymentModeClass::Prepaid
        );
        assert_eq!(
            PaymentModeClass::classify(Some("card")),
            PaymentModeClass::Prepaid
        );
    }
}
