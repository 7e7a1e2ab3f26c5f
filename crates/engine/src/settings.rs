//! Injectable engine tuning.
//!
//! Everything here used to be a literal buried in calculation code: the
//! deny-list of internal accounts, the per-carrier default rate table, the
//! default lookup weight, and the reversal estimate constants. They are
//! hoisted into one injected struct so callers can override them and tests
//! can pin them.

use std::collections::HashMap;

use rust_decimal::Decimal;

use codledger_core::CurrencyCode;

/// Engine-wide tuning knobs.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Dropshipper emails excluded from every calculation, regardless of
    /// caller-supplied filters. Matched case-insensitively.
    pub denied_accounts: Vec<String>,
    /// Flat default shipping rate per carrier (lowercased carrier name),
    /// used when no rate row matches at all.
    pub carrier_default_rates: HashMap<String, Decimal>,
    /// Default rate for carriers absent from the table above.
    pub global_default_rate: Decimal,
    /// Lookup weight (kg) assumed when a product has no configured weight.
    pub default_weight_kg: Decimal,
    /// Flat shipping estimate used by the reversal estimator when no
    /// payout log entry exists. Heuristic placeholder, not a rate lookup.
    pub reversal_shipping_estimate: Decimal,
    /// Product cost assumed by the reversal estimator, as a fraction of
    /// the COD amount. Heuristic placeholder pending real cost resolution.
    pub reversal_product_cost_fraction: Decimal,
    /// Currency payout summaries are denominated in.
    pub currency: CurrencyCode,
}

impl EngineSettings {
    /// Whether a dropshipper is on the deny-list.
    #[must_use]
    pub fn is_denied(&self, dropshipper: &str) -> bool {
        self.denied_accounts
            .iter()
            .any(|denied| denied.eq_ignore_ascii_case(dropshipper.trim()))
    }

    /// Default shipping rate for a carrier (already-lowercased name).
    #[must_use]
    pub fn carrier_default(&self, carrier_normalized: &str) -> Decimal {
        self.carrier_default_rates
            .get(carrier_normalized)
            .copied()
            .unwrap_or(self.global_default_rate)
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        let carrier_default_rates = HashMap::from([
            ("delhivery".to_owned(), Decimal::new(45, 0)),
            ("xpressbees".to_owned(), Decimal::new(40, 0)),
            ("shadowfax".to_owned(), Decimal::new(38, 0)),
            ("ecom express".to_owned(), Decimal::new(48, 0)),
            ("bluedart".to_owned(), Decimal::new(70, 0)),
        ]);

        Self {
            denied_accounts: vec![
                "ops@codledger.internal".to_owned(),
                "qa@codledger.internal".to_owned(),
                "demo@codledger.internal".to_owned(),
            ],
            carrier_default_rates,
            global_default_rate: Decimal::new(50, 0),
            default_weight_kg: Decimal::new(5, 1), // 0.5 kg
            reversal_shipping_estimate: Decimal::new(50, 0),
            reversal_product_cost_fraction: Decimal::new(30, 2), // 0.30
            currency: CurrencyCode::INR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deny_list_case_insensitive() {
        let settings = EngineSettings::default();
        assert!(settings.is_denied("OPS@CodLedger.Internal"));
        assert!(settings.is_denied(" ops@codledger.internal "));
        assert!(!settings.is_denied("seller@example.com"));
    }

    #[test]
    fn test_carrier_default_known() {
        let settings = EngineSettings::default();
        assert_eq!(settings.carrier_default("bluedart"), Decimal::new(70, 0));
    }

    #[test]
    fn test_carrier_default_unknown_uses_global() {
        let settings = EngineSettings::default();
        assert_eq!(
            settings.carrier_default("unknown courier"),
            settings.global_default_rate
        );
    }
}
