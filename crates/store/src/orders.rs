//! Database operations for order snapshot lines.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, QueryBuilder};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, instrument};
use uuid::Uuid;

use codledger_core::{Carrier, Email, IngestSeq, OrderLineId, OrderRef, ProductUid, Waybill};
use codledger_engine::models::OrderRecord;

use crate::RepositoryError;
use crate::ingest::NewOrderLine;

/// Rows per INSERT statement.
const BATCH_SIZE: usize = 500;
/// Insert batches allowed in flight at once.
const MAX_BATCHES_IN_FLIGHT: usize = 4;

/// Receipt for one completed upload.
#[derive(Debug, Clone, Copy)]
pub struct IngestReceipt {
    /// Batch identifier stamped on every inserted row.
    pub upload_batch: Uuid,
    /// Rows inserted.
    pub lines_inserted: usize,
}

/// Internal row type for order line queries.
#[derive(Debug, sqlx::FromRow)]
struct OrderLineRow {
    id: i64,
    order_ref: OrderRef,
    waybill: Option<Waybill>,
    dropshipper: Email,
    product_uid: ProductUid,
    product_name: String,
    sku: Option<String>,
    quantity: i32,
    order_value: Decimal,
    payment_mode: Option<String>,
    status: String,
    order_date: DateTime<Utc>,
    delivered_date: Option<DateTime<Utc>>,
    return_initiated_date: Option<DateTime<Utc>>,
    carrier: Carrier,
    upload_batch: Uuid,
    ingest_seq: i64,
}

impl From<OrderLineRow> for OrderRecord {
    fn from(row: OrderLineRow) -> Self {
        Self {
            id: OrderLineId::new(row.id),
            order_ref: row.order_ref,
            waybill: row.waybill,
            dropshipper: row.dropshipper,
            product_uid: row.product_uid,
            product_name: row.product_name,
            sku: row.sku,
            quantity: row.quantity,
            order_value: row.order_value,
            payment_mode: row.payment_mode,
            status: row.status,
            order_date: row.order_date,
            delivered_date: row.delivered_date,
            return_initiated_date: row.return_initiated_date,
            carrier: row.carrier,
            upload_batch: row.upload_batch,
            ingest_seq: IngestSeq::new(row.ingest_seq),
        }
    }
}

/// Repository for order line database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert an upload as one batch of snapshot lines.
    ///
    /// Sequence numbers are reserved up front so snapshot order follows
    /// the upload's row order even though batches insert concurrently
    /// (bounded at [`MAX_BATCHES_IN_FLIGHT`]).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any batch fails; earlier
    /// batches may already be committed (re-upload is the recovery path).
    #[instrument(skip(self, lines), fields(lines = lines.len()))]
    pub async fn ingest(&self, lines: Vec<NewOrderLine>) -> Result<IngestReceipt, RepositoryError> {
        let upload_batch = Uuid::new_v4();
        if lines.is_empty() {
            return Ok(IngestReceipt {
                upload_batch,
                lines_inserted: 0,
            });
        }

        let seqs = self.reserve_sequence(lines.len()).await?;

        let semaphore = Arc::new(Semaphore::new(MAX_BATCHES_IN_FLIGHT));
        let mut join_set = JoinSet::new();

        let mut batch = Vec::with_capacity(BATCH_SIZE);
        for (line, seq) in lines.into_iter().zip(seqs) {
            batch.push((line, seq));
            if batch.len() == BATCH_SIZE {
                spawn_insert(
                    &mut join_set,
                    self.pool.clone(),
                    Arc::clone(&semaphore),
                    upload_batch,
                    std::mem::replace(&mut batch, Vec::with_capacity(BATCH_SIZE)),
                );
            }
        }
        if !batch.is_empty() {
            spawn_insert(
                &mut join_set,
                self.pool.clone(),
                Arc::clone(&semaphore),
                upload_batch,
                batch,
            );
        }

        let mut lines_inserted = 0;
        while let Some(joined) = join_set.join_next().await {
            let inserted = joined
                .map_err(|e| RepositoryError::DataCorruption(format!("insert task failed: {e}")))??;
            lines_inserted += inserted;
        }

        info!(%upload_batch, lines_inserted, "upload ingested");
        Ok(IngestReceipt {
            upload_batch,
            lines_inserted,
        })
    }

    /// Full snapshot history, optionally scoped to one dropshipper.
    ///
    /// Ordered by `ingest_seq` so callers replay snapshots chronologically.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn fetch_orders(
        &self,
        dropshipper: Option<&str>,
    ) -> Result<Vec<OrderRecord>, RepositoryError> {
        let rows: Vec<OrderLineRow> = sqlx::query_as(
            r"
            SELECT
                id, order_ref, waybill, dropshipper, product_uid,
                product_name, sku, quantity, order_value, payment_mode,
                status, order_date, delivered_date, return_initiated_date,
                carrier, upload_batch, ingest_seq
            FROM order_lines
            WHERE ($1::text IS NULL OR lower(dropshipper) = lower($1))
            ORDER BY ingest_seq ASC
            ",
        )
        .bind(dropshipper.map(str::trim))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Reserve a contiguous block of ingest sequence numbers.
    async fn reserve_sequence(&self, count: usize) -> Result<Vec<i64>, RepositoryError> {
        let count = i64::try_from(count)
            .map_err(|_| RepositoryError::DataCorruption("upload too large".to_owned()))?;
        let seqs = sqlx::query_scalar(
            "SELECT nextval('order_ingest_seq') FROM generate_series(1, $1)",
        )
        .bind(count)
        .fetch_all(self.pool)
        .await?;
        Ok(seqs)
    }
}

fn spawn_insert(
    join_set: &mut JoinSet<Result<usize, RepositoryError>>,
    pool: PgPool,
    semaphore: Arc<Semaphore>,
    upload_batch: Uuid,
    batch: Vec<(NewOrderLine, i64)>,
) {
    join_set.spawn(async move {
        let _permit = semaphore
            .acquire()
            .await
            .map_err(|e| RepositoryError::DataCorruption(format!("semaphore closed: {e}")))?;
        insert_batch(&pool, upload_batch, batch).await
    });
}

async fn insert_batch(
    pool: &PgPool,
    upload_batch: Uuid,
    batch: Vec<(NewOrderLine, i64)>,
) -> Result<usize, RepositoryError> {
    let count = batch.len();
    let mut builder = QueryBuilder::new(
        "INSERT INTO order_lines (
            order_ref, waybill, dropshipper, product_uid, product_name,
            sku, quantity, order_value, payment_mode, status, order_date,
            delivered_date, return_initiated_date, carrier, upload_batch,
            ingest_seq
        ) ",
    );
    builder.push_values(batch, |mut b, (line, seq)| {
        b.push_bind(line.order_ref)
            .push_bind(line.waybill)
            .push_bind(line.dropshipper)
            .push_bind(line.product_uid)
            .push_bind(line.product_name)
            .push_bind(line.sku)
            .push_bind(line.quantity)
            .push_bind(line.order_value)
            .push_bind(line.payment_mode)
            .push_bind(line.status)
            .push_bind(line.order_date)
            .push_bind(line.delivered_date)
            .push_bind(line.return_initiated_date)
            .push_bind(line.carrier)
            .push_bind(upload_batch)
            .push_bind(seq);
    });

    builder.build().execute(pool).await?;
    Ok(count)
}
