//! Database operations for the reconciliation ledger.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use codledger_core::{Email, OrderRef, ProductUid, ReconciliationId};
use codledger_engine::models::reconciliation::{
    NewReconciliation, ReconciliationRecord, ReconciliationStatus,
};

use crate::RepositoryError;

/// Unique index backing one-reconciliation-per-(order, product).
const UNIQUE_ORDER_PRODUCT: &str = "idx_reconciliations_order_product";

/// Internal row type for reconciliation queries.
#[derive(Debug, sqlx::FromRow)]
struct ReconciliationRow {
    id: i64,
    order_ref: OrderRef,
    product_uid: ProductUid,
    dropshipper: Email,
    original_paid_amount: Option<Decimal>,
    reversal_amount: Decimal,
    status: String,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ReconciliationRow> for ReconciliationRecord {
    type Error = RepositoryError;

    fn try_from(row: ReconciliationRow) -> Result<Self, Self::Error> {
        let status: ReconciliationStatus = row
            .status
            .parse()
            .map_err(RepositoryError::DataCorruption)?;
        Ok(Self {
            id: ReconciliationId::new(row.id),
            order_ref: row.order_ref,
            product_uid: row.product_uid,
            dropshipper: row.dropshipper,
            original_paid_amount: row.original_paid_amount,
            reversal_amount: row.reversal_amount,
            status,
            notes: row.notes,
            created_at: row.created_at,
        })
    }
}

/// Repository for confirmed reconciliations. Insert-only; each
/// confirmation is a new immutable record.
pub struct ReconciliationRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReconciliationRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a confirmed reconciliation.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if a record already exists for
    /// the (order, product) pair, `RepositoryError::Database` otherwise.
    pub async fn insert(
        &self,
        record: NewReconciliation,
    ) -> Result<ReconciliationRecord, RepositoryError> {
        let row: ReconciliationRow = sqlx::query_as(
            r"
            INSERT INTO reconciliations (
                order_ref, product_uid, dropshipper,
                original_paid_amount, reversal_amount, status, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING
                id, order_ref, product_uid, dropshipper,
                original_paid_amount, reversal_amount, status, notes,
                created_at
            ",
        )
        .bind(record.order_ref.as_str().to_owned())
        .bind(record.product_uid)
        .bind(record.dropshipper)
        .bind(record.original_paid_amount)
        .bind(record.reversal_amount)
        .bind(record.status.as_str())
        .bind(record.notes)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some(UNIQUE_ORDER_PRODUCT)
            {
                return RepositoryError::Conflict(format!(
                    "reconciliation already recorded for order {}",
                    record.order_ref
                ));
            }
            RepositoryError::Database(e)
        })?;

        row.try_into()
    }

    /// Ledger records for the given order identifiers.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` for an unknown stored status.
    pub async fn fetch_for_orders(
        &self,
        order_refs: &[OrderRef],
    ) -> Result<Vec<ReconciliationRecord>, RepositoryError> {
        let refs: Vec<String> = order_refs
            .iter()
            .map(|r| r.as_str().to_owned())
            .collect();
        let rows: Vec<ReconciliationRow> = sqlx::query_as(
            r"
            SELECT
                id, order_ref, product_uid, dropshipper,
                original_paid_amount, reversal_amount, status, notes,
                created_at
            FROM reconciliations
            WHERE order_ref = ANY($1)
            ORDER BY created_at ASC, id ASC
            ",
        )
        .bind(refs)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}
