//! Pricing configuration models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use codledger_core::{Carrier, CurrencyCode, Email, PriceKey, ProductUid, RateKey};

/// Per-dropshipper product cost configuration.
///
/// Keyed by (dropshipper, product). The weight participates only in
/// shipping-rate lookups; the cost itself is per unit regardless of weight.
/// Unparseable uploads coerce cost to `0` and weight to `None` rather than
/// rejecting the row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceConfig {
    /// Owning dropshipper.
    pub dropshipper: Email,
    /// Product identity.
    pub product_uid: ProductUid,
    /// Cost charged to the platform per unit.
    pub unit_cost: Decimal,
    /// Product weight in kilograms, used to disambiguate rate lookups.
    pub weight_kg: Option<Decimal>,
    /// Currency the cost is denominated in.
    pub currency: CurrencyCode,
    /// When the row was last upserted.
    pub updated_at: DateTime<Utc>,
}

impl PriceConfig {
    /// Lookup key for this row.
    #[must_use]
    pub fn key(&self) -> PriceKey {
        PriceKey::new(&self.dropshipper, self.product_uid.clone())
    }
}

/// Flat shipping rate configuration.
///
/// Keyed by (product, weight, carrier). The charge is per shipment -
/// `qty x rate`, never `weight x rate` - the weight in the key only
/// disambiguates which rate row applies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingRateConfig {
    /// Product identity.
    pub product_uid: ProductUid,
    /// Product weight in kilograms this rate row is keyed under.
    pub weight_kg: Decimal,
    /// Carrier this rate applies to.
    pub carrier: Carrier,
    /// Flat charge per shipment.
    pub flat_rate: Decimal,
    /// When the row was last upserted.
    pub updated_at: DateTime<Utc>,
}

impl ShippingRateConfig {
    /// Lookup key for this row.
    #[must_use]
    pub fn key(&self) -> RateKey {
        RateKey::new(self.product_uid.clone(), self.weight_kg, &self.carrier)
    }
}
