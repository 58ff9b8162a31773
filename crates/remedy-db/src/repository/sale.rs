//! # Sale Repository
//!
//! Checkout and sale history.
//!
//! ## Checkout Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │   1. INSERT sale header (totals 0)        ← takes the write lock first  │
//! │   2. for each requested item, in order:                                 │
//! │        load medicine            → MedicineNotFound                      │
//! │        read eligible batches    (sees earlier items' decrements)        │
//! │        plan_depletion()         → InsufficientStock                     │
//! │        conditional decrement per slice                                  │
//! │   3. INSERT line items, UPDATE header totals                            │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Any error → the transaction is dropped → ROLLBACK: no batch of any     │
//! │  medicine in the request moves and no sale row survives.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use remedy_core::depletion::plan_depletion;
use remedy_core::pagination::{Page, PageRequest, SaleFilter};
use remedy_core::sale::assemble_sale;
use remedy_core::validation::validate_checkout;
use remedy_core::{CheckoutItem, CoreError, Sale, SaleLineItem};

use super::batch::{deplete_in, eligible_in};
use super::medicine::find_by_id_in;
use super::{generate_id, like_pattern};
use crate::error::{DbError, DbResult};

const LINE_COLUMNS: &str = r#"
    id, sale_id, position, medicine_id, medicine_name, category, brand,
    batch_id, batch_number, quantity, unit_cost_cents, selling_price_cents,
    profit_cents, created_at
"#;

/// Repository for sales.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Records a checkout stamped with the current time.
    pub async fn checkout(&self, items: &[CheckoutItem]) -> DbResult<Sale> {
        self.checkout_at(items, Utc::now()).await
    }

    /// Records a checkout stamped with `now`.
    ///
    /// ## Errors
    /// * `CoreError::Validation` / `CheckoutTooLarge` - malformed request, nothing touched
    /// * `CoreError::MedicineNotFound` - unknown medicine id, everything rolled back
    /// * `CoreError::InsufficientStock` - names the first short medicine, everything rolled back
    pub async fn checkout_at(&self, items: &[CheckoutItem], now: DateTime<Utc>) -> DbResult<Sale> {
        validate_checkout(items)?;

        debug!(lines = items.len(), "Starting checkout");

        match self.record_checkout(items, now).await {
            Ok(sale) => {
                info!(
                    sale_id = %sale.id,
                    line_items = sale.item_count,
                    total_profit = %sale.total_profit(),
                    "Checkout recorded"
                );
                Ok(sale)
            }
            Err(err) => {
                warn!(error = %err, "Checkout rolled back");
                Err(err)
            }
        }
    }

    async fn record_checkout(&self, items: &[CheckoutItem], now: DateTime<Utc>) -> DbResult<Sale> {
        let sale_id = generate_id();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO sales (id, total_profit_cents, item_count, created_at) VALUES (?1, 0, 0, ?2)",
        )
        .bind(&sale_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let mut plans = Vec::with_capacity(items.len());
        for item in items {
            let medicine = find_by_id_in(&mut *tx, &item.medicine_id)
                .await?
                .ok_or_else(|| CoreError::MedicineNotFound(item.medicine_id.clone()))?;

            let batches = eligible_in(&mut *tx, &medicine.id).await?;
            let plan = plan_depletion(&medicine, &batches, item.quantity, item.selling_price())?;

            for slice in &plan.slices {
                deplete_in(&mut *tx, &slice.batch_id, slice.quantity, now).await?;
            }

            debug!(
                medicine = %plan.medicine_name,
                quantity = plan.quantity(),
                batches = plan.slices.len(),
                "Depleted stock"
            );
            plans.push(plan);
        }

        let sale = assemble_sale(&sale_id, now, &plans, generate_id);

        for line in &sale.items {
            insert_line_in(&mut *tx, line).await?;
        }

        sqlx::query("UPDATE sales SET total_profit_cents = ?2, item_count = ?3 WHERE id = ?1")
            .bind(&sale.id)
            .bind(sale.total_profit_cents)
            .bind(sale.item_count)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(sale)
    }

    /// Gets a sale with its line items.
    pub async fn get(&self, id: &str) -> DbResult<Sale> {
        let mut conn = self.pool.acquire().await?;

        let mut sale = sqlx::query_as::<_, Sale>(
            "SELECT id, total_profit_cents, item_count, created_at FROM sales WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| CoreError::SaleNotFound(id.to_string()))?;

        sale.items = lines_in(&mut conn, &sale.id).await?;
        Ok(sale)
    }

    /// Lists sales newest first, with their line items.
    ///
    /// A sale matches when any one of its line items matches every given
    /// filter (case-insensitive substrings).
    pub async fn list(&self, filter: &SaleFilter, page: PageRequest) -> DbResult<Page<Sale>> {
        let name = like_pattern(filter.name.as_deref());
        let brand = like_pattern(filter.brand.as_deref());
        let category = like_pattern(filter.category.as_deref());
        let batch_number = like_pattern(filter.batch_number.as_deref());

        const WHERE: &str = r#"
            WHERE EXISTS (
                SELECT 1 FROM sale_line_items li
                WHERE li.sale_id = s.id
                  AND (?1 IS NULL OR li.medicine_name LIKE ?1 ESCAPE '\')
                  AND (?2 IS NULL OR li.brand LIKE ?2 ESCAPE '\')
                  AND (?3 IS NULL OR li.category LIKE ?3 ESCAPE '\')
                  AND (?4 IS NULL OR li.batch_number LIKE ?4 ESCAPE '\')
            )
        "#;

        let mut conn = self.pool.acquire().await?;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM sales s {WHERE}"))
            .bind(&name)
            .bind(&brand)
            .bind(&category)
            .bind(&batch_number)
            .fetch_one(&mut *conn)
            .await?;

        let sql = format!(
            r#"
            SELECT s.id, s.total_profit_cents, s.item_count, s.created_at
            FROM sales s
            {WHERE}
            ORDER BY s.created_at DESC, s.id
            LIMIT ?5 OFFSET ?6
            "#
        );
        let mut sales = sqlx::query_as::<_, Sale>(&sql)
            .bind(&name)
            .bind(&brand)
            .bind(&category)
            .bind(&batch_number)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&mut *conn)
            .await?;

        for sale in &mut sales {
            sale.items = lines_in(&mut conn, &sale.id).await?;
        }

        Ok(Page::new(sales, page, total))
    }

    /// Counts recorded sales.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

async fn insert_line_in(conn: &mut SqliteConnection, line: &SaleLineItem) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sale_line_items (
            id, sale_id, position, medicine_id, medicine_name, category, brand,
            batch_id, batch_number, quantity, unit_cost_cents, selling_price_cents,
            profit_cents, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
        "#,
    )
    .bind(&line.id)
    .bind(&line.sale_id)
    .bind(line.position)
    .bind(&line.medicine_id)
    .bind(&line.medicine_name)
    .bind(&line.category)
    .bind(&line.brand)
    .bind(&line.batch_id)
    .bind(&line.batch_number)
    .bind(line.quantity)
    .bind(line.unit_cost_cents)
    .bind(line.selling_price_cents)
    .bind(line.profit_cents)
    .bind(line.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn lines_in(conn: &mut SqliteConnection, sale_id: &str) -> DbResult<Vec<SaleLineItem>> {
    let sql = format!("SELECT {LINE_COLUMNS} FROM sale_line_items WHERE sale_id = ?1 ORDER BY position");
    let lines = sqlx::query_as::<_, SaleLineItem>(&sql)
        .bind(sale_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(DbError::from)?;

    Ok(lines)
}

// =============================================================================
// Unit Tests
// =============================================================================
