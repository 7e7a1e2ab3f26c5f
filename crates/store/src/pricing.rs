//! Database operations for price and shipping rate configuration.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use codledger_core::{Carrier, CurrencyCode, Email, ProductUid};
use codledger_engine::models::{PriceConfig, ShippingRateConfig};

use crate::RepositoryError;

/// Internal row type for price config queries.
#[derive(Debug, sqlx::FromRow)]
struct PriceConfigRow {
    dropshipper: Email,
    product_uid: ProductUid,
    unit_cost: Decimal,
    weight_kg: Option<Decimal>,
    currency: String,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PriceConfigRow> for PriceConfig {
    type Error = RepositoryError;

    fn try_from(row: PriceConfigRow) -> Result<Self, Self::Error> {
        let currency = CurrencyCode::from_code(&row.currency).ok_or_else(|| {
            RepositoryError::DataCorruption(format!("unknown currency code: {}", row.currency))
        })?;
        Ok(Self {
            dropshipper: row.dropshipper,
            product_uid: row.product_uid,
            unit_cost: row.unit_cost,
            weight_kg: row.weight_kg,
            currency,
            updated_at: row.updated_at,
        })
    }
}

/// Internal row type for shipping rate queries.
#[derive(Debug, sqlx::FromRow)]
struct ShippingRateRow {
    product_uid: ProductUid,
    weight_kg: Decimal,
    carrier: Carrier,
    flat_rate: Decimal,
    updated_at: DateTime<Utc>,
}

impl From<ShippingRateRow> for ShippingRateConfig {
    fn from(row: ShippingRateRow) -> Self {
        Self {
            product_uid: row.product_uid,
            weight_kg: row.weight_kg,
            carrier: row.carrier,
            flat_rate: row.flat_rate,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for pricing configuration.
pub struct PricingRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PricingRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Upsert the unit cost and weight for a (dropshipper, product) pair.
    /// Repeated uploads of the same config sheet converge to one row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert_price_config(
        &self,
        config: &PriceConfig,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO price_configs (
                dropshipper, product_uid, unit_cost, weight_kg, currency, updated_at
            )
            VALUES (lower($1), $2, $3, $4, $5, now())
            ON CONFLICT (dropshipper, product_uid) DO UPDATE SET
                unit_cost = EXCLUDED.unit_cost,
                weight_kg = EXCLUDED.weight_kg,
                currency = EXCLUDED.currency,
                updated_at = now()
            ",
        )
        .bind(config.dropshipper.as_str())
        .bind(&config.product_uid)
        .bind(config.unit_cost)
        .bind(config.weight_kg)
        .bind(config.currency.code())
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Upsert the flat rate for a (product, weight, carrier) triple.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert_shipping_rate(
        &self,
        rate: &ShippingRateConfig,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO shipping_rates (
                product_uid, weight_kg, carrier, flat_rate, updated_at
            )
            VALUES ($1, $2, lower($3), $4, now())
            ON CONFLICT (product_uid, weight_kg, carrier) DO UPDATE SET
                flat_rate = EXCLUDED.flat_rate,
                updated_at = now()
            ",
        )
        .bind(&rate.product_uid)
        .bind(rate.weight_kg)
        .bind(rate.carrier.as_str())
        .bind(rate.flat_rate)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// All price configs, optionally scoped to one dropshipper.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` for an unknown stored currency.
    pub async fn fetch_price_configs(
        &self,
        dropshipper: Option<&str>,
    ) -> Result<Vec<PriceConfig>, RepositoryError> {
        let rows: Vec<PriceConfigRow> = sqlx::query_as(
            r"
            SELECT dropshipper, product_uid, unit_cost, weight_kg, currency, updated_at
            FROM price_configs
            WHERE ($1::text IS NULL OR dropshipper = lower($1))
            ORDER BY dropshipper, product_uid
            ",
        )
        .bind(dropshipper.map(str::trim))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// All shipping rate rows, in stable table order. The resolver's
    /// any-weight fallback picks the first row per (product, carrier), so
    /// the ordering here is part of the contract.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn fetch_shipping_rates(&self) -> Result<Vec<ShippingRateConfig>, RepositoryError> {
        let rows: Vec<ShippingRateRow> = sqlx::query_as(
            r"
            SELECT product_uid, weight_kg, carrier, flat_rate, updated_at
            FROM shipping_rates
            ORDER BY product_uid, carrier, id ASC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
