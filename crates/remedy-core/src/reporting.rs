//! # Reporting Math
//!
//! Pure aggregations behind every report. The database layer fetches flat
//! rows (sale lines, batches with their medicine's label); this module turns
//! them into profit/loss splits, time buckets, stock flows, expiry listings
//! and valuations.
//!
//! ## Report Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  sale_line_items ──┬──► ProfitLoss (today / month / all time)           │
//! │                    ├──► HourlyProfit  (local hour buckets, today)       │
//! │                    ├──► TrendBucket   (daily in month / monthly in year)│
//! │                    └──► stock out per medicine ─┐                       │
//! │                                                 ▼                       │
//! │  stock_receipts ───────► stock in per medicine ─► StockAvailability     │
//! │                                                                         │
//! │  batches ──────────┬──► ExpiryEntry (short expiry / expired)            │
//! │                    ├──► StockValuation (exact Σ unit_cost × remaining)  │
//! │                    └──► AvailableStockValuation (ratio estimate + exact)│
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Datelike, NaiveDate, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::period::{month_name, ReportClock};
use crate::types::category_label;
use crate::UNKNOWN;

// =============================================================================
// Profit / Loss
// =============================================================================

/// Positive profit and absolute loss, kept apart.
///
/// A line sold above cost adds to `profit_cents`; a line sold below cost
/// adds its absolute value to `loss_cents`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProfitLoss {
    pub profit_cents: i64,
    pub loss_cents: i64,
}

impl ProfitLoss {
    pub fn from_profits<I: IntoIterator<Item = Money>>(profits: I) -> Self {
        let mut split = ProfitLoss::default();
        for p in profits {
            split.record(p);
        }
        split
    }

    pub fn record(&mut self, profit: Money) {
        if profit.is_positive() {
            self.profit_cents = self.profit_cents.saturating_add(profit.cents());
        } else if profit.is_negative() {
            self.loss_cents = self.loss_cents.saturating_add(profit.abs().cents());
        }
    }

    #[inline]
    pub fn net_cents(&self) -> i64 {
        self.profit_cents - self.loss_cents
    }
}

/// Profit entry for time bucketing: when a line was sold and what it made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfitEntry {
    pub created_at: DateTime<Utc>,
    pub profit: Money,
}

/// Today / this month / all time, computed together.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProfitSummary {
    pub today: ProfitLoss,
    pub this_month: ProfitLoss,
    pub overall: ProfitLoss,
}

/// Profit/loss of one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MonthlyProfit {
    pub month: u32,
    pub month_name: String,
    pub year: i32,
    pub profit_cents: i64,
    pub loss_cents: i64,
}

impl MonthlyProfit {
    pub fn new(year: i32, month: u32, split: ProfitLoss) -> Self {
        MonthlyProfit {
            month,
            month_name: month_name(month).to_string(),
            year,
            profit_cents: split.profit_cents,
            loss_cents: split.loss_cents,
        }
    }
}

/// One local hour of today's sales.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct HourlyProfit {
    /// Local hour-of-day, 0-23.
    pub hour: u32,
    /// `"14:00"` style label.
    pub label: String,
    pub profit_cents: i64,
    pub loss_cents: i64,
    pub net_cents: i64,
}

/// Buckets entries by local hour. Only hours with sales appear, ascending.
pub fn bucket_by_hour(entries: &[ProfitEntry], clock: &ReportClock) -> Vec<HourlyProfit> {
    let mut hours: BTreeMap<u32, ProfitLoss> = BTreeMap::new();
    for entry in entries {
        hours
            .entry(clock.local_hour(entry.created_at))
            .or_default()
            .record(entry.profit);
    }
    hours
        .into_iter()
        .map(|(hour, split)| HourlyProfit {
            hour,
            label: format!("{hour}:00"),
            profit_cents: split.profit_cents,
            loss_cents: split.loss_cents,
            net_cents: split.net_cents(),
        })
        .collect()
}

/// Granularity of the profit trend report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum TrendKind {
    /// One bucket per local day of the current month.
    Daily,
    /// One bucket per month of the current year.
    Monthly,
}

impl FromStr for TrendKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(TrendKind::Daily),
            "monthly" => Ok(TrendKind::Monthly),
            _ => Err(ValidationError::NotAllowed {
                field: "type".to_string(),
                allowed: vec!["daily".to_string(), "monthly".to_string()],
            }),
        }
    }
}

/// One bucket of the profit trend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TrendBucket {
    /// `"2026-03-10"` for daily buckets, `"2026-03"` for monthly ones.
    pub label: String,
    pub profit_cents: i64,
    pub loss_cents: i64,
    pub net_cents: i64,
}

/// Buckets entries by local day or month, ascending, skipping empty buckets.
pub fn bucket_trend(entries: &[ProfitEntry], clock: &ReportClock, kind: TrendKind) -> Vec<TrendBucket> {
    let mut buckets: BTreeMap<String, ProfitLoss> = BTreeMap::new();
    for entry in entries {
        let date = clock.local_date(entry.created_at);
        let label = match kind {
            TrendKind::Daily => date.format("%Y-%m-%d").to_string(),
            TrendKind::Monthly => format!("{:04}-{:02}", date.year(), date.month()),
        };
        buckets.entry(label).or_default().record(entry.profit);
    }
    buckets
        .into_iter()
        .map(|(label, split)| TrendBucket {
            label,
            profit_cents: split.profit_cents,
            loss_cents: split.loss_cents,
            net_cents: split.net_cents(),
        })
        .collect()
}

// =============================================================================
// Stock Flows
// =============================================================================

/// Name and category of a medicine for report rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MedicineLabel {
    pub name: String,
    pub category: String,
}

/// Units received vs sold for one medicine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockAvailability {
    pub medicine_id: String,
    pub name: String,
    pub category: String,
    pub stock_in: i64,
    pub stock_out: i64,
    pub available_stock: i64,
}

/// Units moved in and out for one medicine during a day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DailyMovement {
    pub medicine_id: String,
    pub name: String,
    pub category: String,
    pub stock_in: i64,
    pub stock_out: i64,
}

/// Outer-joins per-medicine stock in and stock out.
///
/// Medicines missing from `labels` (deleted since) are reported as
/// `"Unknown"`. Rows are ordered by name, then id.
pub fn merge_stock_flows(
    stock_in: &[(String, i64)],
    stock_out: &[(String, i64)],
    labels: &HashMap<String, MedicineLabel>,
) -> Vec<StockAvailability> {
    let mut flows: HashMap<&str, (i64, i64)> = HashMap::new();
    for (id, qty) in stock_in {
        flows.entry(id.as_str()).or_default().0 += qty;
    }
    for (id, qty) in stock_out {
        flows.entry(id.as_str()).or_default().1 += qty;
    }

    let mut rows: Vec<StockAvailability> = flows
        .into_iter()
        .map(|(id, (stock_in, stock_out))| {
            let (name, category) = match labels.get(id) {
                Some(label) => (label_or_unknown(&label.name), label_or_unknown(&label.category)),
                None => (UNKNOWN.to_string(), UNKNOWN.to_string()),
            };
            StockAvailability {
                medicine_id: id.to_string(),
                name,
                category,
                stock_in,
                stock_out,
                available_stock: stock_in - stock_out,
            }
        })
        .collect();
    rows.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.medicine_id.cmp(&b.medicine_id)));
    rows
}

fn label_or_unknown(value: &str) -> String {
    if value.trim().is_empty() {
        UNKNOWN.to_string()
    } else {
        value.to_string()
    }
}

impl From<StockAvailability> for DailyMovement {
    fn from(row: StockAvailability) -> Self {
        DailyMovement {
            medicine_id: row.medicine_id,
            name: row.name,
            category: row.category,
            stock_in: row.stock_in,
            stock_out: row.stock_out,
        }
    }
}

/// Store-wide stock totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockSummary {
    pub total_stock_in: i64,
    pub total_stock_out: i64,
    pub total_available_stock: i64,
    /// Remaining units expiring between today and today + window.
    pub total_short_expiry: i64,
    /// Remaining units whose expiry is before today.
    pub total_expired: i64,
}

// =============================================================================
// Expiry
// =============================================================================

/// A batch with remaining stock, labelled with its medicine.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ExpiryRow {
    pub medicine_id: String,
    pub name: String,
    pub category: String,
    pub expiry_date: NaiveDate,
    pub quantity: i64,
}

/// Which expiry listing to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryKind {
    /// `today <= expiry <= today + window_days`, soonest first.
    ShortExpiry { window_days: i64 },
    /// `expiry < today`, most recently expired first.
    Expired,
}

impl ExpiryKind {
    pub fn includes(&self, expiry: NaiveDate, today: NaiveDate) -> bool {
        match self {
            ExpiryKind::ShortExpiry { window_days } => {
                today <= expiry && expiry <= expiry_horizon(today, *window_days)
            }
            ExpiryKind::Expired => expiry < today,
        }
    }
}

/// Last day of a short-expiry window. Saturates at `NaiveDate::MAX`.
pub fn expiry_horizon(today: NaiveDate, window_days: i64) -> NaiveDate {
    TimeDelta::try_days(window_days)
        .and_then(|window| today.checked_add_signed(window))
        .unwrap_or(NaiveDate::MAX)
}

/// Per-medicine aggregate of batches in an expiry window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ExpiryEntry {
    pub medicine_id: String,
    pub name: String,
    pub category: String,
    /// Earliest expiry for short-expiry listings, latest for expired ones.
    #[ts(as = "String")]
    pub expiry_date: NaiveDate,
    pub total_quantity: i64,
    pub batch_count: i64,
}

/// Groups rows by medicine, applying the window, the filter and the sort.
///
/// Rows with no remaining quantity are ignored.
pub fn expiry_entries(
    rows: &[ExpiryRow],
    kind: ExpiryKind,
    today: NaiveDate,
    filter: &crate::pagination::ExpiryFilter,
) -> Vec<ExpiryEntry> {
    let mut grouped: HashMap<&str, ExpiryEntry> = HashMap::new();
    for row in rows {
        if row.quantity <= 0 || !kind.includes(row.expiry_date, today) {
            continue;
        }
        if !filter.matches(&row.name, &row.category) {
            continue;
        }
        let entry = grouped.entry(row.medicine_id.as_str()).or_insert_with(|| ExpiryEntry {
            medicine_id: row.medicine_id.clone(),
            name: row.name.clone(),
            category: row.category.clone(),
            expiry_date: row.expiry_date,
            total_quantity: 0,
            batch_count: 0,
        });
        entry.total_quantity += row.quantity;
        entry.batch_count += 1;
        entry.expiry_date = match kind {
            ExpiryKind::ShortExpiry { .. } => entry.expiry_date.min(row.expiry_date),
            ExpiryKind::Expired => entry.expiry_date.max(row.expiry_date),
        };
    }

    let mut entries: Vec<ExpiryEntry> = grouped.into_values().collect();
    match kind {
        ExpiryKind::ShortExpiry { .. } => entries.sort_by(|a, b| {
            a.expiry_date
                .cmp(&b.expiry_date)
                .then_with(|| a.name.cmp(&b.name))
                .then_with(|| a.medicine_id.cmp(&b.medicine_id))
        }),
        ExpiryKind::Expired => entries.sort_by(|a, b| {
            b.expiry_date
                .cmp(&a.expiry_date)
                .then_with(|| a.name.cmp(&b.name))
                .then_with(|| a.medicine_id.cmp(&b.medicine_id))
        }),
    }
    entries
}

// =============================================================================
// Valuation
// =============================================================================

/// Cost counters of one batch, labelled with its medicine's category.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ValuationRow {
    pub category: String,
    pub quantity: i64,
    pub received_quantity: i64,
    pub unit_cost_cents: i64,
}

impl ValuationRow {
    fn unit_cost(&self) -> Money {
        Money::from_cents(self.unit_cost_cents.max(0))
    }

    fn remaining_value(&self) -> Money {
        self.unit_cost().multiply_quantity(self.quantity.max(0))
    }

    fn received_value(&self) -> Money {
        self.unit_cost().multiply_quantity(self.received_quantity.max(0))
    }
}

/// Value of one category's remaining stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CategoryValue {
    pub category: String,
    pub value_cents: i64,
    pub items: i64,
}

/// Σ unit_cost × remaining over batches with stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockValuation {
    pub total_value_cents: i64,
    pub total_items: i64,
    /// Sorted by value, highest first.
    pub categories: Vec<CategoryValue>,
}

/// Values remaining stock at cost, with a per-category breakdown.
pub fn value_stock(rows: &[ValuationRow]) -> StockValuation {
    let mut by_category: HashMap<String, (Money, i64)> = HashMap::new();
    let mut total = Money::zero();
    let mut items = 0;
    for row in rows.iter().filter(|r| r.quantity > 0) {
        let value = row.remaining_value();
        total += value;
        items += row.quantity;
        let slot = by_category
            .entry(category_label(&row.category).to_string())
            .or_default();
        slot.0 += value;
        slot.1 += row.quantity;
    }

    let mut categories: Vec<CategoryValue> = by_category
        .into_iter()
        .map(|(category, (value, items))| CategoryValue {
            category,
            value_cents: value.cents(),
            items,
        })
        .collect();
    categories.sort_by(|a, b| b.value_cents.cmp(&a.value_cents).then_with(|| a.category.cmp(&b.category)));

    StockValuation {
        total_value_cents: total.cents(),
        total_items: items,
        categories,
    }
}

/// One category of the available-value report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AvailableCategoryValue {
    pub category: String,
    /// Units ever received.
    pub total_quantity: i64,
    /// Ratio estimate: `floor(total_quantity × available / stock_in)`.
    pub available_quantity: i64,
    /// Units actually on hand.
    pub remaining_quantity: i64,
    /// Cost of every unit ever received.
    pub total_value_cents: i64,
    /// Ratio estimate: `floor(total_value × available / stock_in)`.
    pub available_value_cents: i64,
    /// Σ unit_cost × remaining.
    pub exact_available_value_cents: i64,
}

/// Ratio estimate of the value still on hand, next to the exact figure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AvailableStockValuation {
    pub total_stock_in: i64,
    pub total_stock_out: i64,
    pub total_available_stock: i64,
    pub total_purchase_value_cents: i64,
    /// `floor(total_purchase_value × available / stock_in)`.
    pub estimated_available_value_cents: i64,
    /// Σ unit_cost × remaining.
    pub exact_available_value_cents: i64,
    /// Sorted by total value, highest first.
    pub categories: Vec<AvailableCategoryValue>,
}

/// Builds the available-value report.
///
/// `total_stock_out` is the number of units ever sold. The availability
/// ratio is clamped to `[0, 1]` so a deleted medicine's sales cannot push
/// the estimate negative or above the purchase value.
pub fn value_available_stock(rows: &[ValuationRow], total_stock_out: i64) -> AvailableStockValuation {
    let total_stock_in: i64 = rows.iter().map(|r| r.received_quantity.max(0)).sum();
    let total_available_stock = total_stock_in - total_stock_out;
    let ratio_num = total_available_stock.clamp(0, total_stock_in.max(0));
    let ratio_den = total_stock_in;

    #[derive(Default)]
    struct Acc {
        total_quantity: i64,
        remaining_quantity: i64,
        total_value: Money,
        exact_value: Money,
    }

    let mut by_category: HashMap<String, Acc> = HashMap::new();
    let mut total_purchase_value = Money::zero();
    let mut exact_total = Money::zero();
    for row in rows {
        let acc = by_category
            .entry(category_label(&row.category).to_string())
            .or_default();
        acc.total_quantity += row.received_quantity.max(0);
        acc.remaining_quantity += row.quantity.max(0);
        acc.total_value += row.received_value();
        acc.exact_value += row.remaining_value();
        total_purchase_value += row.received_value();
        exact_total += row.remaining_value();
    }

    let scale_quantity = |q: i64| -> i64 {
        if ratio_den <= 0 {
            0
        } else {
            ((q as i128 * ratio_num as i128) / ratio_den as i128) as i64
        }
    };

    let mut categories: Vec<AvailableCategoryValue> = by_category
        .into_iter()
        .map(|(category, acc)| AvailableCategoryValue {
            category,
            total_quantity: acc.total_quantity,
            available_quantity: scale_quantity(acc.total_quantity),
            remaining_quantity: acc.remaining_quantity,
            total_value_cents: acc.total_value.cents(),
            available_value_cents: acc.total_value.scale_floor(ratio_num, ratio_den).cents(),
            exact_available_value_cents: acc.exact_value.cents(),
        })
        .collect();
    categories.sort_by(|a, b| {
        b.total_value_cents
            .cmp(&a.total_value_cents)
            .then_with(|| a.category.cmp(&b.category))
    });

    AvailableStockValuation {
        total_stock_in,
        total_stock_out,
        total_available_stock,
        total_purchase_value_cents: total_purchase_value.cents(),
        estimated_available_value_cents: total_purchase_value.scale_floor(ratio_num, ratio_den).cents(),
        exact_available_value_cents: exact_total.cents(),
        categories,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
