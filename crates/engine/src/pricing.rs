//! Rate and price resolution.
//!
//! The resolver is a pure lookup structure built once per calculation from
//! the two configuration tables. Missing configuration is the expected
//! steady state during dropshipper onboarding, so nothing here fails: a
//! missing unit cost resolves to zero and a missing rate walks a fallback
//! ladder down to a per-carrier default. Every degradation is reported to
//! the caller as a [`ConfigGap`] so it can surface in the
//! missing-configuration report.

use std::collections::HashMap;

use rust_decimal::Decimal;

use codledger_core::{Carrier, Email, PriceKey, ProductUid, RateKey};

use crate::models::payout::{ConfigGap, ConfigGapKind, RateSource};
use crate::models::{PriceConfig, ShippingRateConfig};
use crate::settings::EngineSettings;

/// A resolved shipping quote: the flat per-shipment rate plus which rung
/// of the fallback ladder supplied it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShippingQuote {
    pub flat_rate: Decimal,
    pub source: RateSource,
}

/// Lookup book over price and shipping-rate configuration.
pub struct RateBook<'a> {
    prices: HashMap<PriceKey, &'a PriceConfig>,
    exact_rates: HashMap<RateKey, Decimal>,
    /// First configured rate per (product, carrier) in table iteration
    /// order, for the any-weight fallback rung.
    any_weight_rates: HashMap<(ProductUid, String), Decimal>,
    settings: &'a EngineSettings,
}

impl<'a> RateBook<'a> {
    /// Build the book from configuration rows.
    #[must_use]
    pub fn new(
        prices: &'a [PriceConfig],
        rates: &'a [ShippingRateConfig],
        settings: &'a EngineSettings,
    ) -> Self {
        let prices = prices.iter().map(|p| (p.key(), p)).collect();

        let mut exact_rates = HashMap::new();
        let mut any_weight_rates = HashMap::new();
        for rate in rates {
            exact_rates.entry(rate.key()).or_insert(rate.flat_rate);
            any_weight_rates
                .entry((rate.product_uid.clone(), rate.carrier.normalized()))
                .or_insert(rate.flat_rate);
        }

        Self {
            prices,
            exact_rates,
            any_weight_rates,
            settings,
        }
    }

    /// Resolve the configured per-unit product cost.
    ///
    /// Absence is not an error; it resolves to zero and records a gap for
    /// the missing-configuration report.
    pub fn unit_cost(
        &self,
        dropshipper: &Email,
        product_uid: &ProductUid,
        gaps: &mut Vec<ConfigGap>,
    ) -> Decimal {
        let key = PriceKey::new(dropshipper, product_uid.clone());
        self.prices.get(&key).map_or_else(
            || {
                gaps.push(ConfigGap {
                    kind: ConfigGapKind::MissingUnitCost,
                    dropshipper: dropshipper.normalized(),
                    product_uid: product_uid.clone(),
                });
                Decimal::ZERO
            },
            |config| config.unit_cost,
        )
    }

    /// Resolve the flat shipping rate for one shipment of a product.
    ///
    /// The lookup weight is the product's configured weight from its price
    /// config, defaulting when absent - a rate lookup cannot be evaluated
    /// independently of that weight. The fallback ladder is:
    ///
    /// 1. exact (product, weight, carrier) match
    /// 2. any configured rate for (product, carrier), first in table order
    /// 3. the per-carrier default table, or the global default for an
    ///    unrecognized carrier
    ///
    /// A missing weight-specific rate must never abort the batch.
    pub fn shipping_quote(
        &self,
        dropshipper: &Email,
        product_uid: &ProductUid,
        carrier: &Carrier,
        gaps: &mut Vec<ConfigGap>,
    ) -> ShippingQuote {
        let weight = self.lookup_weight(dropshipper, product_uid, gaps);

        let exact_key = RateKey::new(product_uid.clone(), weight, carrier);
        if let Some(&rate) = self.exact_rates.get(&exact_key) {
            return ShippingQuote {
                flat_rate: rate,
                source: RateSource::Exact,
            };
        }

        let carrier_normalized = carrier.normalized();
        if let Some(&rate) = self
            .any_weight_rates
            .get(&(product_uid.clone(), carrier_normalized.clone()))
        {
            return ShippingQuote {
                flat_rate: rate,
                source: RateSource::AnyWeight,
            };
        }

        gaps.push(ConfigGap {
            kind: ConfigGapKind::MissingShippingRate,
            dropshipper: dropshipper.normalized(),
            product_uid: product_uid.clone(),
        });

        let known_carrier = self
            .settings
            .carrier_default_rates
            .contains_key(&carrier_normalized);
        ShippingQuote {
            flat_rate: self.settings.carrier_default(&carrier_normalized),
            source: if known_carrier {
                RateSource::CarrierDefault
            } else {
                RateSource::GlobalDefault
            },
        }
    }

    /// The weight used for rate lookups: the product's configured weight,
    /// or the default when no config (or no weight) exists.
    fn lookup_weight(
        &self,
        dropshipper: &Email,
        product_uid: &ProductUid,
        gaps: &mut Vec<ConfigGap>,
    ) -> Decimal {
        let key = PriceKey::new(dropshipper, product_uid.clone());
        match self.prices.get(&key).and_then(|config| config.weight_kg) {
            Some(weight) => weight,
            None => {
                gaps.push(ConfigGap {
                    kind: ConfigGapKind::MissingWeight,
                    dropshipper: dropshipper.normalized(),
                    product_uid: product_uid.clone(),
                });
                self.settings.default_weight_kg
            }
        }
    }
}
