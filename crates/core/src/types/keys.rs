//! Structural lookup keys for the pricing tables.
//!
//! Earlier revisions keyed these tables with delimiter-joined strings,
//! which collides when a product identity contains the delimiter. The keys
//! here are plain structs with value equality instead.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Carrier, Email, ProductUid};

/// Key for per-dropshipper product cost configuration.
///
/// At most one active price config row exists per key; upserts replace the
/// non-key fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PriceKey {
    /// Canonical (lowercased) dropshipper email.
    pub dropshipper: String,
    /// Product identity.
    pub product_uid: ProductUid,
}

impl PriceKey {
    /// Build a key, normalizing the dropshipper email.
    #[must_use]
    pub fn new(dropshipper: &Email, product_uid: ProductUid) -> Self {
        Self {
            dropshipper: dropshipper.normalized(),
            product_uid,
        }
    }
}

/// Key for flat shipping rate configuration.
///
/// The weight participates only to disambiguate rate rows; the charge
/// itself is per shipment, never per kilogram.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RateKey {
    /// Product identity.
    pub product_uid: ProductUid,
    /// Product weight in kilograms, normalized so `0.5` and `0.50`
    /// produce the same key.
    pub weight_kg: Decimal,
    /// Canonical (lowercased) carrier name.
    pub carrier: String,
}

impl RateKey {
    /// Build a key, normalizing weight scale and carrier case.
    #[must_use]
    pub fn new(product_uid: ProductUid, weight_kg: Decimal, carrier: &Carrier) -> Self {
        Self {
            product_uid,
            weight_kg: weight_kg.normalize(),
            carrier: carrier.normalized(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_price_key_normalizes_email() {
        let uid = ProductUid::new("seller@shop.com::belt");
        let a = PriceKey::new(&Email::parse("Seller@Shop.com").unwrap(), uid.clone());
        let b = PriceKey::new(&Email::parse("seller@shop.com").unwrap(), uid);
        assert_eq!(a, b);
    }

    #[test]
    fn test_rate_key_weight_scale_insensitive() {
        let uid = ProductUid::new("seller@shop.com::belt");
        let carrier = Carrier::new("Delhivery");
        let a = RateKey::new(uid.clone(), Decimal::new(5, 1), &carrier);
        let b = RateKey::new(uid, Decimal::new(50, 2), &carrier);
        assert_eq!(a, b);
    }

    #[test]
    fn test_rate_key_no_delimiter_collision() {
        // A product name containing the old "|" delimiter cannot collide
        // with a differently-split key.
        let a = RateKey::new(
            ProductUid::new("a@shop.com::x|y"),
            Decimal::ONE,
            &Carrier::new("z"),
        );
        let b = RateKey::new(
            ProductUid::new("a@shop.com::x"),
            Decimal::ONE,
            &Carrier::new("y|z"),
        );
        assert_ne!(a, b);
    }
}
