//! # Report Repository
//!
//! Read-only aggregations over the ledger and sale history.
//!
//! Queries pull the raw rows or sums; bucketing, labelling and valuation math
//! live in `remedy_core::reporting`. Every window is computed by the
//! repository's [`ReportClock`] and bound as a half-open `[start, end)`
//! range on the RFC 3339 `created_at` column.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use remedy_core::pagination::{ExpiryFilter, Page, PageRequest};
use remedy_core::period::{ReportClock, TimeWindow};
use remedy_core::reporting::{
    bucket_by_hour, bucket_trend, expiry_entries, expiry_horizon, merge_stock_flows, value_available_stock, value_stock,
    AvailableStockValuation, DailyMovement, ExpiryEntry, ExpiryKind, ExpiryRow, HourlyProfit, MedicineLabel,
    MonthlyProfit, ProfitEntry, ProfitLoss, ProfitSummary, StockAvailability, StockSummary, StockValuation,
    TrendBucket, TrendKind, ValuationRow,
};
use remedy_core::Money;

use crate::error::DbResult;

/// Profit by hour for one local day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HourlyProfitReport {
    pub date: NaiveDate,
    pub hours: Vec<HourlyProfit>,
}

/// Units received and sold during one local day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyStockMovement {
    pub date: NaiveDate,
    pub movements: Vec<DailyMovement>,
}

/// Repository for reports.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
    clock: ReportClock,
}

impl ReportRepository {
    /// Creates a new ReportRepository evaluating windows with `clock`.
    pub fn new(pool: SqlitePool, clock: ReportClock) -> Self {
        ReportRepository { pool, clock }
    }

    pub fn clock(&self) -> ReportClock {
        self.clock
    }

    // =========================================================================
    // Profit
    // =========================================================================

    /// Profit and loss for today, this month and all time.
    pub async fn profit_summary(&self, now: DateTime<Utc>) -> DbResult<ProfitSummary> {
        let today = self.clock.today(now);
        let month = self.clock.this_month(now)?;

        let mut conn = self.pool.acquire().await?;
        let summary = ProfitSummary {
            today: split_in(&mut conn, Some(today)).await?,
            this_month: split_in(&mut conn, Some(month)).await?,
            overall: split_in(&mut conn, None).await?,
        };

        debug!(
            today = summary.today.net_cents(),
            this_month = summary.this_month.net_cents(),
            overall = summary.overall.net_cents(),
            "Profit summary"
        );
        Ok(summary)
    }

    /// Profit and loss for one calendar month.
    ///
    /// ## Errors
    /// * `ValidationError::OutOfRange` - month outside 1-12
    /// * `CoreError::InvalidPeriod` - unrepresentable year
    pub async fn profit_by_month(&self, year: i32, month: u32) -> DbResult<MonthlyProfit> {
        let window = self.clock.month_window(year, month)?;

        let mut conn = self.pool.acquire().await?;
        let split = split_in(&mut conn, Some(window)).await?;

        Ok(MonthlyProfit::new(year, month, split))
    }

    /// Today's profit bucketed by local hour.
    pub async fn profit_by_hour(&self, now: DateTime<Utc>) -> DbResult<HourlyProfitReport> {
        let window = self.clock.today(now);

        let mut conn = self.pool.acquire().await?;
        let entries = entries_in(&mut conn, window).await?;

        Ok(HourlyProfitReport {
            date: self.clock.local_date(now),
            hours: bucket_by_hour(&entries, &self.clock),
        })
    }

    /// Daily buckets over the current month, or monthly buckets over the
    /// current year.
    pub async fn profit_trend(&self, kind: TrendKind, now: DateTime<Utc>) -> DbResult<Vec<TrendBucket>> {
        let window = match kind {
            TrendKind::Daily => self.clock.this_month(now)?,
            TrendKind::Monthly => self.clock.this_year(now)?,
        };

        let mut conn = self.pool.acquire().await?;
        let entries = entries_in(&mut conn, window).await?;

        Ok(bucket_trend(&entries, &self.clock, kind))
    }

    // =========================================================================
    // Stock
    // =========================================================================

    /// Units ever received against units ever sold, per medicine.
    pub async fn stock_availability(&self) -> DbResult<Vec<StockAvailability>> {
        let mut conn = self.pool.acquire().await?;

        let stock_in = received_in(&mut conn, None).await?;
        let stock_out = sold_in(&mut conn, None).await?;
        let labels = labels_in(&mut conn).await?;

        Ok(merge_stock_flows(&stock_in, &stock_out, &labels))
    }

    /// Store-wide totals, including stock expiring within `window_days`
    /// and stock already expired.
    pub async fn stock_summary(&self, now: DateTime<Utc>, window_days: i64) -> DbResult<StockSummary> {
        let today = self.clock.local_date(now);

        let mut conn = self.pool.acquire().await?;

        let total_stock_in: i64 = sqlx::query_scalar("SELECT COALESCE(SUM(quantity), 0) FROM stock_receipts")
            .fetch_one(&mut *conn)
            .await?;
        let total_stock_out: i64 = sqlx::query_scalar("SELECT COALESCE(SUM(quantity), 0) FROM sale_line_items")
            .fetch_one(&mut *conn)
            .await?;

        let rows = expiry_rows_in(&mut conn, None, None).await?;
        let remaining_in = |kind: ExpiryKind| -> i64 {
            rows.iter()
                .filter(|r| kind.includes(r.expiry_date, today))
                .map(|r| r.quantity)
                .sum()
        };

        Ok(StockSummary {
            total_stock_in,
            total_stock_out,
            total_available_stock: total_stock_in - total_stock_out,
            total_short_expiry: remaining_in(ExpiryKind::ShortExpiry { window_days }),
            total_expired: remaining_in(ExpiryKind::Expired),
        })
    }

    /// Medicines with stock expiring between today and `today + window_days`,
    /// soonest first.
    pub async fn short_expiry(
        &self,
        now: DateTime<Utc>,
        window_days: i64,
        filter: &ExpiryFilter,
        page: PageRequest,
    ) -> DbResult<Page<ExpiryEntry>> {
        let today = self.clock.local_date(now);
        let horizon = expiry_horizon(today, window_days);

        let mut conn = self.pool.acquire().await?;
        let rows = expiry_rows_in(&mut conn, Some(today), Some(horizon)).await?;

        let entries = expiry_entries(&rows, ExpiryKind::ShortExpiry { window_days }, today, filter);
        Ok(Page::from_vec(entries, page))
    }

    /// Medicines with stock past its expiry date, most recently expired first.
    pub async fn expired(&self, now: DateTime<Utc>, filter: &ExpiryFilter, page: PageRequest) -> DbResult<Page<ExpiryEntry>> {
        let today = self.clock.local_date(now);
        let yesterday = today.pred_opt();

        let mut conn = self.pool.acquire().await?;
        let rows = match yesterday {
            Some(last) => expiry_rows_in(&mut conn, None, Some(last)).await?,
            None => Vec::new(),
        };

        let entries = expiry_entries(&rows, ExpiryKind::Expired, today, filter);
        Ok(Page::from_vec(entries, page))
    }

    // =========================================================================
    // Valuation
    // =========================================================================

    /// Remaining stock valued at unit cost.
    pub async fn stock_value(&self) -> DbResult<StockValuation> {
        let mut conn = self.pool.acquire().await?;
        let rows = valuation_rows_in(&mut conn).await?;

        Ok(value_stock(&rows))
    }

    /// Purchase value scaled by the available share, alongside the exact
    /// remaining value.
    pub async fn available_stock_value(&self) -> DbResult<AvailableStockValuation> {
        let mut conn = self.pool.acquire().await?;
        let rows = valuation_rows_in(&mut conn).await?;

        // Only units sold out of batches that still exist; the purchase side
        // of the ratio loses deleted batches too.
        let total_stock_out: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(li.quantity), 0)
            FROM sale_line_items li
            WHERE EXISTS (SELECT 1 FROM batches b WHERE b.id = li.batch_id)
            "#,
        )
        .fetch_one(&mut *conn)
        .await?;

        Ok(value_available_stock(&rows, total_stock_out))
    }

    /// Units received and sold per medicine during the local day of `now`.
    pub async fn daily_movement(&self, now: DateTime<Utc>) -> DbResult<DailyStockMovement> {
        let window = self.clock.today(now);

        let mut conn = self.pool.acquire().await?;
        let stock_in = received_in(&mut conn, Some(window)).await?;
        let stock_out = sold_in(&mut conn, Some(window)).await?;
        let labels = labels_in(&mut conn).await?;

        Ok(DailyStockMovement {
            date: self.clock.local_date(now),
            movements: merge_stock_flows(&stock_in, &stock_out, &labels)
                .into_iter()
                .map(DailyMovement::from)
                .collect(),
        })
    }
}

// =============================================================================
// Queries
// =============================================================================

fn bounds(window: Option<TimeWindow>) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
    match window {
        Some(w) => (Some(w.start), Some(w.end)),
        None => (None, None),
    }
}

async fn split_in(conn: &mut SqliteConnection, window: Option<TimeWindow>) -> DbResult<ProfitLoss> {
    let (start, end) = bounds(window);

    let (profit_cents, loss_cents): (i64, i64) = sqlx::query_as(
        r#"
        SELECT
            COALESCE(SUM(CASE WHEN profit_cents > 0 THEN profit_cents ELSE 0 END), 0),
            COALESCE(SUM(CASE WHEN profit_cents < 0 THEN -profit_cents ELSE 0 END), 0)
        FROM sale_line_items
        WHERE (?1 IS NULL OR created_at >= ?1) AND (?2 IS NULL OR created_at < ?2)
        "#,
    )
    .bind(start)
    .bind(end)
    .fetch_one(&mut *conn)
    .await?;

    Ok(ProfitLoss {
        profit_cents,
        loss_cents,
    })
}

async fn entries_in(conn: &mut SqliteConnection, window: TimeWindow) -> DbResult<Vec<ProfitEntry>> {
    let rows: Vec<(DateTime<Utc>, i64)> = sqlx::query_as(
        "SELECT created_at, profit_cents FROM sale_line_items WHERE created_at >= ?1 AND created_at < ?2",
    )
    .bind(window.start)
    .bind(window.end)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(created_at, profit)| ProfitEntry {
            created_at,
            profit: Money::from_cents(profit),
        })
        .collect())
}

async fn received_in(conn: &mut SqliteConnection, window: Option<TimeWindow>) -> DbResult<Vec<(String, i64)>> {
    let (start, end) = bounds(window);

    let rows: Vec<(String, i64)> = sqlx::query_as(
        r#"
        SELECT medicine_id, SUM(quantity) FROM stock_receipts
        WHERE (?1 IS NULL OR created_at >= ?1) AND (?2 IS NULL OR created_at < ?2)
        GROUP BY medicine_id
        "#,
    )
    .bind(start)
    .bind(end)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows)
}

async fn sold_in(conn: &mut SqliteConnection, window: Option<TimeWindow>) -> DbResult<Vec<(String, i64)>> {
    let (start, end) = bounds(window);

    let rows: Vec<(String, i64)> = sqlx::query_as(
        r#"
        SELECT medicine_id, SUM(quantity) FROM sale_line_items
        WHERE (?1 IS NULL OR created_at >= ?1) AND (?2 IS NULL OR created_at < ?2)
        GROUP BY medicine_id
        "#,
    )
    .bind(start)
    .bind(end)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows)
}

async fn labels_in(conn: &mut SqliteConnection) -> DbResult<HashMap<String, MedicineLabel>> {
    let rows: Vec<(String, String, String)> = sqlx::query_as("SELECT id, name, category FROM medicines")
        .fetch_all(&mut *conn)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(id, name, category)| (id, MedicineLabel { name, category }))
        .collect())
}

/// Batches with remaining stock, optionally bounded by expiry (inclusive).
async fn expiry_rows_in(
    conn: &mut SqliteConnection,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> DbResult<Vec<ExpiryRow>> {
    let rows = sqlx::query_as::<_, ExpiryRow>(
        r#"
        SELECT b.medicine_id, m.name, m.category, b.expiry_date, b.quantity
        FROM batches b
        JOIN medicines m ON m.id = b.medicine_id
        WHERE b.quantity > 0
          AND (?1 IS NULL OR b.expiry_date >= ?1)
          AND (?2 IS NULL OR b.expiry_date <= ?2)
        "#,
    )
    .bind(from)
    .bind(to)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows)
}

async fn valuation_rows_in(conn: &mut SqliteConnection) -> DbResult<Vec<ValuationRow>> {
    let rows = sqlx::query_as::<_, ValuationRow>(
        r#"
        SELECT m.category, b.quantity, b.received_quantity, b.unit_cost_cents
        FROM batches b
        JOIN medicines m ON m.id = b.medicine_id
        "#,
    )
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::pool::{Database, DbConfig};
    use chrono::TimeZone;
    use remedy_core::{CheckoutItem, CoreError, Medicine, NewMedicine, StockIn, ValidationError};

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// 15:00 local (+05:00) on 2026-03-10.
    fn now() -> DateTime<Utc> {
        at(2026, 3, 10, 10, 0)
    }

    struct Store {
        db: Database,
        amoxil: Medicine,
        panadol: Medicine,
    }

    async fn receive(
        db: &Database,
        name: &str,
        category: &str,
        lot: &str,
        price: i64,
        expiry: NaiveDate,
        when: DateTime<Utc>,
    ) -> Medicine {
        db.batches()
            .stock_in_at(
                &StockIn {
                    medicine: NewMedicine {
                        name: name.into(),
                        brand: "Generic".into(),
                        description: String::new(),
                        price_cents: 0,
                        image: None,
                        category: category.into(),
                        manufacturer: String::new(),
                    },
                    batch_number: lot.into(),
                    purchase_price_cents: price,
                    quantity: 10,
                    expiry_date: expiry,
                },
                when,
            )
            .await
            .unwrap()
            .medicine
    }

    async fn sell(db: &Database, medicine: &Medicine, quantity: i64, price: i64, when: DateTime<Utc>) {
        db.sales()
            .checkout_at(
                &[CheckoutItem {
                    medicine_id: medicine.id.clone(),
                    quantity,
                    selling_price_cents: price,
                }],
                when,
            )
            .await
            .unwrap();
    }

    /// Batches after setup:
    /// - Amoxil A1: 6 left @ 100, expires 2026-03-25 (short expiry)
    /// - Panadol P1: 7 left @ 50, expired 2026-03-01
    /// - Panadol P2: 10 left @ 60, expires 2027-01-01
    async fn store() -> Store {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let amoxil = receive(&db, "Amoxil", "Antibiotic", "A1", 1000, date(2026, 3, 25), now()).await;
        let feb = at(2026, 2, 1, 6, 0);
        let panadol = receive(&db, "Panadol", "Analgesic", "P1", 500, date(2026, 3, 1), feb).await;
        receive(&db, "Panadol", "Analgesic", "P2", 600, date(2027, 1, 1), feb).await;

        sell(&db, &panadol, 2, 80, at(2026, 2, 15, 12, 0)).await; // +60, last month
        sell(&db, &amoxil, 1, 90, at(2026, 3, 2, 5, 0)).await; // -10, this month
        sell(&db, &panadol, 1, 100, at(2026, 3, 9, 19, 30)).await; // +50, 00:30 local today
        sell(&db, &amoxil, 2, 150, at(2026, 3, 10, 4, 30)).await; // +100, 09:30 local
        sell(&db, &amoxil, 1, 80, at(2026, 3, 10, 8, 10)).await; // -20, 13:10 local

        Store { db, amoxil, panadol }
    }

    fn reports(db: &Database) -> ReportRepository {
        db.reports(ReportClock::from_offset_minutes(300).unwrap())
    }

    #[tokio::test]
    async fn test_profit_summary_windows() {
        let s = store().await;
        let summary = reports(&s.db).profit_summary(now()).await.unwrap();

        assert_eq!(summary.today, ProfitLoss { profit_cents: 150, loss_cents: 20 });
        assert_eq!(summary.this_month, ProfitLoss { profit_cents: 150, loss_cents: 30 });
        assert_eq!(summary.overall, ProfitLoss { profit_cents: 210, loss_cents: 30 });
    }

    #[tokio::test]
    async fn test_profit_by_hour_matches_today() {
        let s = store().await;
        let report = reports(&s.db).profit_by_hour(now()).await.unwrap();

        assert_eq!(report.date, date(2026, 3, 10));
        let labels: Vec<&str> = report.hours.iter().map(|h| h.label.as_str()).collect();
        assert_eq!(labels, vec!["0:00", "9:00", "13:00"]);
        assert_eq!(report.hours[2].net_cents, -20);

        let profit: i64 = report.hours.iter().map(|h| h.profit_cents).sum();
        let today = reports(&s.db).profit_summary(now()).await.unwrap().today;
        assert_eq!(profit, today.profit_cents);
    }

    #[tokio::test]
    async fn test_profit_by_month() {
        let s = store().await;
        let feb = reports(&s.db).profit_by_month(2026, 2).await.unwrap();
        assert_eq!(feb.month_name, "February");
        assert_eq!((feb.profit_cents, feb.loss_cents), (60, 0));

        let err = reports(&s.db).profit_by_month(2026, 13).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));
    }

    #[tokio::test]
    async fn test_profit_trend() {
        let s = store().await;

        let daily = reports(&s.db).profit_trend(TrendKind::Daily, now()).await.unwrap();
        let labels: Vec<&str> = daily.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["2026-03-02", "2026-03-10"]);
        assert_eq!(daily[1].net_cents, 130);

        let monthly = reports(&s.db).profit_trend(TrendKind::Monthly, now()).await.unwrap();
        let labels: Vec<&str> = monthly.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["2026-02", "2026-03"]);
        assert_eq!(monthly[0].profit_cents, 60);
    }

    #[tokio::test]
    async fn test_stock_availability_and_deleted_medicine() {
        let s = store().await;

        let rows = reports(&s.db).stock_availability().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "Amoxil");
        assert_eq!((rows[0].stock_in, rows[0].stock_out, rows[0].available_stock), (10, 4, 6));
        assert_eq!((rows[1].stock_in, rows[1].stock_out, rows[1].available_stock), (20, 3, 17));

        s.db.medicines().delete(&s.panadol.id).await.unwrap();
        let rows = reports(&s.db).stock_availability().await.unwrap();
        let gone = rows.iter().find(|r| r.medicine_id == s.panadol.id).unwrap();
        assert_eq!(gone.name, "Unknown");
        assert_eq!(gone.available_stock, 17);
    }

    #[tokio::test]
    async fn test_stock_summary() {
        let s = store().await;
        let summary = reports(&s.db).stock_summary(now(), 30).await.unwrap();

        assert_eq!(
            summary,
            StockSummary {
                total_stock_in: 30,
                total_stock_out: 7,
                total_available_stock: 23,
                total_short_expiry: 6,
                total_expired: 7,
            }
        );
    }

    #[tokio::test]
    async fn test_expiry_listings() {
        let s = store().await;
        let repo = reports(&s.db);

        let short = repo
            .short_expiry(now(), 30, &ExpiryFilter::default(), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(short.total, 1);
        assert_eq!(short.items[0].medicine_id, s.amoxil.id);
        assert_eq!(short.items[0].expiry_date, date(2026, 3, 25));
        assert_eq!(short.items[0].total_quantity, 6);

        let none = repo
            .short_expiry(now(), 10, &ExpiryFilter::default(), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(none.total, 0);

        let expired = repo.expired(now(), &ExpiryFilter::default(), PageRequest::default()).await.unwrap();
        assert_eq!(expired.total, 1);
        assert_eq!(expired.items[0].name, "Panadol");
        assert_eq!(expired.items[0].total_quantity, 7);

        let filter = ExpiryFilter {
            name: None,
            category: Some("ANTI".into()),
        };
        let filtered = repo.expired(now(), &filter, PageRequest::default()).await.unwrap();
        assert!(filtered.items.is_empty());
    }

    #[tokio::test]
    async fn test_stock_value() {
        let s = store().await;
        let value = reports(&s.db).stock_value().await.unwrap();

        assert_eq!(value.total_value_cents, 1550);
        assert_eq!(value.total_items, 23);
        assert_eq!(value.categories[0].category, "Analgesic");
        assert_eq!(value.categories[0].value_cents, 950);
        assert_eq!(value.categories[1].value_cents, 600);
    }

    #[tokio::test]
    async fn test_available_stock_value_estimate_and_exact() {
        let s = store().await;
        let value = reports(&s.db).available_stock_value().await.unwrap();

        assert_eq!(value.total_stock_in, 30);
        assert_eq!(value.total_stock_out, 7);
        assert_eq!(value.total_purchase_value_cents, 2100);
        // floor(2100 * 23 / 30)
        assert_eq!(value.estimated_available_value_cents, 1610);
        assert_eq!(value.exact_available_value_cents, 1550);
    }

    #[tokio::test]
    async fn test_daily_movement() {
        let s = store().await;
        let movement = reports(&s.db).daily_movement(now()).await.unwrap();

        assert_eq!(movement.date, date(2026, 3, 10));
        assert_eq!(movement.movements.len(), 2);
        let amoxil = &movement.movements[0];
        assert_eq!((amoxil.name.as_str(), amoxil.stock_in, amoxil.stock_out), ("Amoxil", 10, 3));
        let panadol = &movement.movements[1];
        assert_eq!((panadol.stock_in, panadol.stock_out), (0, 1));

        let quiet = reports(&s.db).daily_movement(at(2026, 1, 5, 12, 0)).await.unwrap();
        assert!(quiet.movements.is_empty());
    }

    #[tokio::test]
    async fn test_reports_on_empty_store() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = reports(&db);

        assert_eq!(repo.profit_summary(now()).await.unwrap(), ProfitSummary::default());
        assert_eq!(repo.stock_summary(now(), 30).await.unwrap(), StockSummary::default());
        let value = repo.available_stock_value().await.unwrap();
        assert_eq!(value.estimated_available_value_cents, 0);
        assert!(repo.stock_availability().await.unwrap().is_empty());
    }
}
