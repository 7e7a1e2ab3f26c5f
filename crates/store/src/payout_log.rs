//! Database operations for the payout disbursement log.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use codledger_core::{Email, OrderRef, PayoutLogId, ProductUid, Waybill};
use codledger_engine::models::reconciliation::PayoutLogEntry;

use crate::RepositoryError;

/// Input for recording a disbursed payout.
#[derive(Debug, Clone)]
pub struct NewPayoutLogEntry {
    pub order_ref: OrderRef,
    pub waybill: Option<Waybill>,
    pub dropshipper: Email,
    pub product_uid: ProductUid,
    pub period_from: NaiveDate,
    pub period_to: NaiveDate,
    pub paid_amount: Decimal,
    pub breakdown: serde_json::Value,
}

/// Internal row type for payout log queries.
#[derive(Debug, sqlx::FromRow)]
struct PayoutLogRow {
    id: i64,
    order_ref: OrderRef,
    waybill: Option<Waybill>,
    dropshipper: Email,
    product_uid: ProductUid,
    period_from: NaiveDate,
    period_to: NaiveDate,
    paid_amount: Decimal,
    breakdown: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl From<PayoutLogRow> for PayoutLogEntry {
    fn from(row: PayoutLogRow) -> Self {
        Self {
            id: PayoutLogId::new(row.id),
            order_ref: row.order_ref,
            waybill: row.waybill,
            dropshipper: row.dropshipper,
            product_uid: row.product_uid,
            period_from: row.period_from,
            period_to: row.period_to,
            paid_amount: row.paid_amount,
            breakdown: row.breakdown,
            created_at: row.created_at,
        }
    }
}

/// Repository for the payout log. Insert-only; entries are never updated.
pub struct PayoutLogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PayoutLogRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Record a disbursed payout.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn insert(
        &self,
        entry: NewPayoutLogEntry,
    ) -> Result<PayoutLogEntry, RepositoryError> {
        let row: PayoutLogRow = sqlx::query_as(
            r"
            INSERT INTO payout_log (
                order_ref, waybill, dropshipper, product_uid,
                period_from, period_to, paid_amount, breakdown
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING
                id, order_ref, waybill, dropshipper, product_uid,
                period_from, period_to, paid_amount, breakdown, created_at
            ",
        )
        .bind(entry.order_ref)
        .bind(entry.waybill)
        .bind(entry.dropshipper)
        .bind(entry.product_uid)
        .bind(entry.period_from)
        .bind(entry.period_to)
        .bind(entry.paid_amount)
        .bind(entry.breakdown)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Payout log entries for the given order identifiers.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn fetch_for_orders(
        &self,
        order_refs: &[OrderRef],
    ) -> Result<Vec<PayoutLogEntry>, RepositoryError> {
        let refs: Vec<String> = order_refs
            .iter()
            .map(|r| r.as_str().to_owned())
            .collect();
        let rows: Vec<PayoutLogRow> = sqlx::query_as(
            r"
            SELECT
                id, order_ref, waybill, dropshipper, product_uid,
                period_from, period_to, paid_amount, breakdown, created_at
            FROM payout_log
            WHERE order_ref = ANY($1)
            ORDER BY created_at ASC, id ASC
            ",
        )
        .bind(refs)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
