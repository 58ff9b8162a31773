//! # Batch Repository
//!
//! The batch ledger: stock arrives through [`BatchRepository::stock_in`] and
//! leaves through conditional decrements.
//!
//! ## Stock-in Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │   1. find-or-create medicine by (name, brand)                           │
//! │   2. batch with same (medicine, batch_number, purchase_price, expiry)?  │
//! │        ├── yes → quantity += n, received += n, weighted unit cost       │
//! │        └── no  → new batch, unit_cost = purchase_price / n              │
//! │   3. stock_receipts += (batch, n, purchase_price)                       │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Deplete
//! `UPDATE batches SET quantity = quantity - n WHERE id = ? AND quantity >= n`
//! is the only way stock leaves a batch, so two sales racing for the same
//! units can never push a batch below zero.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use remedy_core::ledger::{correct_lot, merge_delivery, unit_cost_for_lot};
use remedy_core::validation::{validate_batch_update, validate_stock_in};
use remedy_core::{Batch, BatchUpdate, CoreError, Money, StockIn, StockInOutcome, StockReceipt, ValidationError};

use super::generate_id;
use super::medicine::find_or_create_in;
use crate::error::{DbError, DbResult};

const BATCH_COLUMNS: &str = r#"
    id, medicine_id, batch_number, purchase_price_cents, quantity,
    received_quantity, unit_cost_cents, expiry_date, created_at, updated_at
"#;

/// Repository for the batch ledger.
#[derive(Debug, Clone)]
pub struct BatchRepository {
    pool: SqlitePool,
}

impl BatchRepository {
    /// Creates a new BatchRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BatchRepository { pool }
    }

    /// Receives a delivery.
    ///
    /// ## Returns
    /// The medicine, the created or merged batch, and whether a merge happened.
    ///
    /// ## Errors
    /// * `DbError::Domain(Validation)` - zero/negative quantity or price,
    ///   missing name/brand/batch number. Nothing is written.
    pub async fn stock_in(&self, request: &StockIn) -> DbResult<StockInOutcome> {
        self.stock_in_at(request, Utc::now()).await
    }

    /// Receives a delivery stamped with `now`.
    pub async fn stock_in_at(&self, request: &StockIn, now: DateTime<Utc>) -> DbResult<StockInOutcome> {
        validate_stock_in(request)?;

        let fields = request.medicine.normalized();
        let batch_number = request.batch_number.trim().to_string();
        let price = Money::from_cents(request.purchase_price_cents);

        let mut tx = self.pool.begin().await?;

        let medicine = find_or_create_in(&mut *tx, &fields, now).await?;

        let sql = format!(
            r#"
            SELECT {BATCH_COLUMNS} FROM batches
            WHERE medicine_id = ?1 AND batch_number = ?2
              AND purchase_price_cents = ?3 AND expiry_date = ?4
            "#
        );
        let existing = sqlx::query_as::<_, Batch>(&sql)
            .bind(&medicine.id)
            .bind(&batch_number)
            .bind(request.purchase_price_cents)
            .bind(request.expiry_date)
            .fetch_optional(&mut *tx)
            .await?;

        let (batch_id, merged) = match existing {
            Some(batch) => {
                let merge = merge_delivery(&batch, price, request.quantity);
                debug!(
                    batch_id = %batch.id,
                    incoming = request.quantity,
                    quantity = merge.quantity,
                    unit_cost = %merge.unit_cost,
                    "Merging delivery into batch"
                );

                sqlx::query(
                    r#"
                    UPDATE batches SET
                        quantity = quantity + ?2,
                        received_quantity = received_quantity + ?2,
                        unit_cost_cents = ?3,
                        updated_at = ?4
                    WHERE id = ?1
                    "#,
                )
                .bind(&batch.id)
                .bind(request.quantity)
                .bind(merge.unit_cost.cents())
                .bind(now)
                .execute(&mut *tx)
                .await?;

                (batch.id, true)
            }
            None => {
                let id = generate_id();
                let unit_cost = unit_cost_for_lot(price, request.quantity);
                debug!(batch_id = %id, quantity = request.quantity, unit_cost = %unit_cost, "Creating batch");

                sqlx::query(
                    r#"
                    INSERT INTO batches (
                        id, medicine_id, batch_number, purchase_price_cents, quantity,
                        received_quantity, unit_cost_cents, expiry_date, created_at, updated_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?5, ?6, ?7, ?8, ?8)
                    "#,
                )
                .bind(&id)
                .bind(&medicine.id)
                .bind(&batch_number)
                .bind(request.purchase_price_cents)
                .bind(request.quantity)
                .bind(unit_cost.cents())
                .bind(request.expiry_date)
                .bind(now)
                .execute(&mut *tx)
                .await?;

                (id, false)
            }
        };

        insert_receipt_in(
            &mut *tx,
            &batch_id,
            &medicine.id,
            request.quantity,
            request.purchase_price_cents,
            now,
        )
        .await?;

        let batch = get_in(&mut *tx, &batch_id).await?;

        tx.commit().await?;

        info!(
            medicine = %medicine.name,
            batch_number = %batch.batch_number,
            quantity = request.quantity,
            merged,
            "Stock received"
        );

        Ok(StockInOutcome {
            medicine,
            batch,
            merged,
        })
    }

    /// Gets a batch by ID, failing with `NotFound` when it doesn't exist.
    pub async fn get(&self, id: &str) -> DbResult<Batch> {
        let mut conn = self.pool.acquire().await?;
        get_in(&mut conn, id).await
    }

    /// Sale-eligible batches of a medicine (quantity > 0) in depletion order.
    ///
    /// Every call re-reads the ledger.
    pub async fn eligible_batches(&self, medicine_id: &str) -> DbResult<Vec<Batch>> {
        let mut conn = self.pool.acquire().await?;
        eligible_in(&mut conn, medicine_id).await
    }

    /// Every batch of a medicine, including empty ones, by expiry.
    pub async fn for_medicine(&self, medicine_id: &str) -> DbResult<Vec<Batch>> {
        let sql = format!(
            "SELECT {BATCH_COLUMNS} FROM batches WHERE medicine_id = ?1 ORDER BY expiry_date, created_at, id"
        );
        let batches = sqlx::query_as::<_, Batch>(&sql)
            .bind(medicine_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(batches)
    }

    /// Removes `amount` units from a batch, atomically.
    ///
    /// ## Errors
    /// * `CoreError::InsufficientStock` - fewer than `amount` units remain
    /// * `CoreError::BatchNotFound` - no such batch
    /// * `ValidationError::MustBePositive` - `amount <= 0`
    pub async fn deplete(&self, batch_id: &str, amount: i64) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        deplete_in(&mut conn, batch_id, amount, Utc::now()).await
    }

    /// Applies an admin correction to a batch.
    ///
    /// The cost basis follows [`correct_lot`]. When the correction raises the
    /// received quantity, the difference is recorded as a stock receipt so
    /// stock-in totals stay in step with the ledger.
    pub async fn update(&self, batch_id: &str, update: &BatchUpdate) -> DbResult<Batch> {
        validate_batch_update(update)?;
        let batch_number = update.batch_number.trim().to_string();
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        let current = get_in(&mut *tx, batch_id).await?;
        let correction = correct_lot(&current, update);

        debug!(
            batch_id = %batch_id,
            quantity = update.quantity,
            received = correction.received_quantity,
            unit_cost = %correction.unit_cost,
            "Correcting batch"
        );

        sqlx::query(
            r#"
            UPDATE batches SET
                batch_number = ?2,
                purchase_price_cents = ?3,
                quantity = ?4,
                received_quantity = ?5,
                unit_cost_cents = ?6,
                expiry_date = ?7,
                updated_at = ?8
            WHERE id = ?1
            "#,
        )
        .bind(batch_id)
        .bind(&batch_number)
        .bind(update.purchase_price_cents)
        .bind(update.quantity)
        .bind(correction.received_quantity)
        .bind(correction.unit_cost.cents())
        .bind(update.expiry_date)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let added = correction.received_quantity - current.received_quantity;
        if added > 0 {
            insert_receipt_in(
                &mut *tx,
                batch_id,
                &current.medicine_id,
                added,
                update.purchase_price_cents,
                now,
            )
            .await?;
        }

        let batch = get_in(&mut *tx, batch_id).await?;
        tx.commit().await?;

        Ok(batch)
    }

    /// Stock receipts of a batch, oldest first.
    pub async fn receipts(&self, batch_id: &str) -> DbResult<Vec<StockReceipt>> {
        let receipts = sqlx::query_as::<_, StockReceipt>(
            r#"
            SELECT id, batch_id, medicine_id, quantity, purchase_price_cents, created_at
            FROM stock_receipts
            WHERE batch_id = ?1
            ORDER BY created_at, id
            "#,
        )
        .bind(batch_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(receipts)
    }
}

// =============================================================================
// Connection-level helpers (shared with the checkout transaction)
// =============================================================================

pub(crate) async fn get_in(conn: &mut SqliteConnection, id: &str) -> DbResult<Batch> {
    let sql = format!("SELECT {BATCH_COLUMNS} FROM batches WHERE id = ?1");
    sqlx::query_as::<_, Batch>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Batch", id))
}

pub(crate) async fn eligible_in(conn: &mut SqliteConnection, medicine_id: &str) -> DbResult<Vec<Batch>> {
    let sql = format!(
        r#"
        SELECT {BATCH_COLUMNS} FROM batches
        WHERE medicine_id = ?1 AND quantity > 0
        ORDER BY expiry_date, created_at, id
        "#
    );
    let batches = sqlx::query_as::<_, Batch>(&sql)
        .bind(medicine_id)
        .fetch_all(&mut *conn)
        .await?;

    Ok(batches)
}

/// Conditional decrement. Succeeds only when the batch still holds `amount`.
pub(crate) async fn deplete_in(
    conn: &mut SqliteConnection,
    batch_id: &str,
    amount: i64,
    now: DateTime<Utc>,
) -> DbResult<()> {
    if amount <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "amount".to_string(),
        }
        .into());
    }

    let result = sqlx::query(
        r#"
        UPDATE batches SET
            quantity = quantity - ?2,
            updated_at = ?3
        WHERE id = ?1 AND quantity >= ?2
        "#,
    )
    .bind(batch_id)
    .bind(amount)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 1 {
        return Ok(());
    }

    let current: Option<(i64, String)> = sqlx::query_as(
        r#"
        SELECT b.quantity, m.name
        FROM batches b
        JOIN medicines m ON m.id = b.medicine_id
        WHERE b.id = ?1
        "#,
    )
    .bind(batch_id)
    .fetch_optional(&mut *conn)
    .await?;

    match current {
        None => Err(CoreError::BatchNotFound(batch_id.to_string()).into()),
        Some((available, medicine)) => Err(CoreError::InsufficientStock {
            medicine,
            available,
            requested: amount,
        }
        .into()),
    }
}

async fn insert_receipt_in(
    conn: &mut SqliteConnection,
    batch_id: &str,
    medicine_id: &str,
    quantity: i64,
    purchase_price_cents: i64,
    now: DateTime<Utc>,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO stock_receipts (
            id, batch_id, medicine_id, quantity, purchase_price_cents, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(generate_id())
    .bind(batch_id)
    .bind(medicine_id)
    .bind(quantity)
    .bind(purchase_price_cents)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
