//! # Medicine Repository
//!
//! Catalogue operations. A medicine is identified by its UUID and, for
//! stock-in, by the (name, brand) natural key.
//!
//! ## Find-or-Create
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  StockIn(name = "Panadol", brand = "GSK", ...)                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  INSERT INTO medicines (...) ON CONFLICT (name, brand) DO NOTHING       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SELECT ... WHERE name = ? AND brand = ?                                │
//! │       │                                                                 │
//! │       └── always exactly one row, no matter how many stock-ins race    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! An existing medicine keeps its catalogue fields; later stock-ins only add
//! batches.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use tracing::debug;

use remedy_core::pagination::{MedicineFilter, Page, PageRequest};
use remedy_core::validation::validate_new_medicine;
use remedy_core::{Medicine, MedicineStock, NewMedicine};

use super::{generate_id, like_pattern};
use crate::error::{DbError, DbResult};

const MEDICINE_COLUMNS: &str = r#"
    m.id, m.name, m.brand, m.description, m.price_cents, m.image,
    m.category, m.manufacturer, m.created_at, m.updated_at
"#;

#[derive(Debug, FromRow)]
struct MedicineStockRow {
    #[sqlx(flatten)]
    medicine: Medicine,
    quantity: i64,
}

impl From<MedicineStockRow> for MedicineStock {
    fn from(row: MedicineStockRow) -> Self {
        MedicineStock {
            medicine: row.medicine,
            quantity: row.quantity,
        }
    }
}

/// Repository for the medicine catalogue.
#[derive(Debug, Clone)]
pub struct MedicineRepository {
    pool: SqlitePool,
}

impl MedicineRepository {
    /// Creates a new MedicineRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MedicineRepository { pool }
    }

    /// Gets a medicine by ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Medicine))` - Medicine found
    /// * `Ok(None)` - Medicine not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Medicine>> {
        let mut conn = self.pool.acquire().await?;
        find_by_id_in(&mut conn, id).await
    }

    /// Gets a medicine by ID, failing with `NotFound` when it doesn't exist.
    pub async fn get(&self, id: &str) -> DbResult<Medicine> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Medicine", id))
    }

    /// Gets a medicine by its (name, brand) natural key.
    pub async fn get_by_key(&self, name: &str, brand: &str) -> DbResult<Option<Medicine>> {
        let sql = format!("SELECT {MEDICINE_COLUMNS} FROM medicines m WHERE m.name = ?1 AND m.brand = ?2");
        let medicine = sqlx::query_as::<_, Medicine>(&sql)
            .bind(name.trim())
            .bind(brand.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(medicine)
    }

    /// Lists medicines newest first, each with its total remaining stock.
    ///
    /// Filters are case-insensitive substrings; blank filters are ignored.
    pub async fn list(&self, filter: &MedicineFilter, page: PageRequest) -> DbResult<Page<MedicineStock>> {
        let name = like_pattern(filter.name.as_deref());
        let brand = like_pattern(filter.brand.as_deref());
        let category = like_pattern(filter.category.as_deref());
        let description = like_pattern(filter.description.as_deref());

        debug!(?filter, page = page.page, limit = page.limit, "Listing medicines");

        const WHERE: &str = r#"
            WHERE (?1 IS NULL OR m.name LIKE ?1 ESCAPE '\')
              AND (?2 IS NULL OR m.brand LIKE ?2 ESCAPE '\')
              AND (?3 IS NULL OR m.category LIKE ?3 ESCAPE '\')
              AND (?4 IS NULL OR m.description LIKE ?4 ESCAPE '\')
        "#;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM medicines m {WHERE}"))
            .bind(&name)
            .bind(&brand)
            .bind(&category)
            .bind(&description)
            .fetch_one(&self.pool)
            .await?;

        let sql = format!(
            r#"
            SELECT {MEDICINE_COLUMNS},
                   COALESCE((SELECT SUM(b.quantity) FROM batches b WHERE b.medicine_id = m.id), 0) AS quantity
            FROM medicines m
            {WHERE}
            ORDER BY m.created_at DESC, m.id
            LIMIT ?5 OFFSET ?6
            "#
        );
        let rows = sqlx::query_as::<_, MedicineStockRow>(&sql)
            .bind(&name)
            .bind(&brand)
            .bind(&category)
            .bind(&description)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok(Page::new(rows.into_iter().map(MedicineStock::from).collect(), page, total))
    }

    /// Replaces the catalogue fields of a medicine.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - Medicine doesn't exist
    /// * `Err(DbError::UniqueViolation)` - Another medicine already has this (name, brand)
    pub async fn update(&self, id: &str, fields: &NewMedicine) -> DbResult<Medicine> {
        validate_new_medicine(fields)?;
        let fields = fields.normalized();
        let now = Utc::now();

        debug!(id = %id, name = %fields.name, "Updating medicine");

        let result = sqlx::query(
            r#"
            UPDATE medicines SET
                name = ?2,
                brand = ?3,
                description = ?4,
                price_cents = ?5,
                image = ?6,
                category = ?7,
                manufacturer = ?8,
                updated_at = ?9
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&fields.name)
        .bind(&fields.brand)
        .bind(&fields.description)
        .bind(fields.price_cents)
        .bind(&fields.image)
        .bind(&fields.category)
        .bind(&fields.manufacturer)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => {
                DbError::duplicate("medicine", format!("{} / {}", fields.name, fields.brand))
            }
            other => other,
        })?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Medicine", id));
        }

        self.get(id).await
    }

    /// Deletes a medicine and, by cascade, all of its batches.
    ///
    /// Sale history and stock receipts are kept.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting medicine");

        let result = sqlx::query("DELETE FROM medicines WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Medicine", id));
        }

        Ok(())
    }

    /// Counts catalogue entries.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM medicines")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Loads a medicine on an existing connection or transaction.
pub(crate) async fn find_by_id_in(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Medicine>> {
    let sql = format!("SELECT {MEDICINE_COLUMNS} FROM medicines m WHERE m.id = ?1");
    let medicine = sqlx::query_as::<_, Medicine>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(medicine)
}

/// Resolves a medicine by (name, brand), creating it when missing.
///
/// `fields` must already be normalized and validated.
pub(crate) async fn find_or_create_in(
    conn: &mut SqliteConnection,
    fields: &NewMedicine,
    now: DateTime<Utc>,
) -> DbResult<Medicine> {
    let inserted = sqlx::query(
        r#"
        INSERT INTO medicines (
            id, name, brand, description, price_cents, image,
            category, manufacturer, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
        ON CONFLICT (name, brand) DO NOTHING
        "#,
    )
    .bind(generate_id())
    .bind(&fields.name)
    .bind(&fields.brand)
    .bind(&fields.description)
    .bind(fields.price_cents)
    .bind(&fields.image)
    .bind(&fields.category)
    .bind(&fields.manufacturer)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    if inserted.rows_affected() > 0 {
        debug!(name = %fields.name, brand = %fields.brand, "Created medicine");
    }

    let sql = format!("SELECT {MEDICINE_COLUMNS} FROM medicines m WHERE m.name = ?1 AND m.brand = ?2");
    let medicine = sqlx::query_as::<_, Medicine>(&sql)
        .bind(&fields.name)
        .bind(&fields.brand)
        .fetch_one(&mut *conn)
        .await?;

    Ok(medicine)
}

// =============================================================================
// Unit Tests
// =============================================================================
