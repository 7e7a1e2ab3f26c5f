//! Database operations for payment cycle schedules.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use codledger_core::{Email, PaymentCycleId};
use codledger_engine::models::{CycleKind, PaymentCycle};

use crate::RepositoryError;

/// Input for creating or replacing a payment cycle.
#[derive(Debug, Clone)]
pub struct UpsertCycleInput {
    pub dropshipper: Email,
    pub name: String,
    pub kind: CycleKind,
    pub offset_days: i64,
}

/// Internal row type for payment cycle queries.
#[derive(Debug, sqlx::FromRow)]
struct PaymentCycleRow {
    id: i64,
    dropshipper: Email,
    name: String,
    kind: String,
    offset_days: i64,
    updated_at: DateTime<Utc>,
}

impl From<PaymentCycleRow> for PaymentCycle {
    fn from(row: PaymentCycleRow) -> Self {
        Self {
            id: PaymentCycleId::new(row.id),
            dropshipper: row.dropshipper,
            name: row.name,
            kind: CycleKind::parse(&row.kind),
            offset_days: row.offset_days,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for payment cycle schedules.
pub struct PaymentCycleRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PaymentCycleRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create or replace a dropshipper's named cycle.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(&self, input: &UpsertCycleInput) -> Result<PaymentCycle, RepositoryError> {
        let row: PaymentCycleRow = sqlx::query_as(
            r"
            INSERT INTO payment_cycles (dropshipper, name, kind, offset_days, updated_at)
            VALUES (lower($1), $2, $3, $4, now())
            ON CONFLICT (dropshipper, name) DO UPDATE SET
                kind = EXCLUDED.kind,
                offset_days = EXCLUDED.offset_days,
                updated_at = now()
            RETURNING id, dropshipper, name, kind, offset_days, updated_at
            ",
        )
        .bind(input.dropshipper.as_str())
        .bind(&input.name)
        .bind(input.kind.to_string())
        .bind(input.offset_days)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Update an existing cycle by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the cycle does not exist;
    /// updates never create rows implicitly.
    pub async fn update(
        &self,
        id: PaymentCycleId,
        kind: &CycleKind,
        offset_days: i64,
    ) -> Result<PaymentCycle, RepositoryError> {
        let row: Option<PaymentCycleRow> = sqlx::query_as(
            r"
            UPDATE payment_cycles
            SET kind = $2, offset_days = $3, updated_at = now()
            WHERE id = $1
            RETURNING id, dropshipper, name, kind, offset_days, updated_at
            ",
        )
        .bind(id.as_i64())
        .bind(kind.to_string())
        .bind(offset_days)
        .fetch_optional(self.pool)
        .await?;

        row.map(Into::into).ok_or(RepositoryError::NotFound {
            entity: "payment cycle",
            key: id.to_string(),
        })
    }

    /// Look up a dropshipper's cycle by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn fetch(
        &self,
        dropshipper: &Email,
        name: &str,
    ) -> Result<Option<PaymentCycle>, RepositoryError> {
        let row: Option<PaymentCycleRow> = sqlx::query_as(
            r"
            SELECT id, dropshipper, name, kind, offset_days, updated_at
            FROM payment_cycles
            WHERE dropshipper = lower($1) AND name = $2
            ",
        )
        .bind(dropshipper.as_str())
        .bind(name)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// List all cycles, optionally scoped to one dropshipper.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        dropshipper: Option<&str>,
    ) -> Result<Vec<PaymentCycle>, RepositoryError> {
        let rows: Vec<PaymentCycleRow> = sqlx::query_as(
            r"
            SELECT id, dropshipper, name, kind, offset_days, updated_at
            FROM payment_cycles
            WHERE ($1::text IS NULL OR dropshipper = lower($1))
            ORDER BY dropshipper, name
            ",
        )
        .bind(dropshipper.map(str::trim))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
