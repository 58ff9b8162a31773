//! # Report Commands
//!
//! Profit and loss over the sale history. "Today" and "this month" are
//! evaluated in the configured UTC offset.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use remedy_core::reporting::{HourlyProfit, MonthlyProfit, ProfitSummary, TrendBucket, TrendKind};

use crate::response::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MonthQuery {
    pub month: u32,
    pub year: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TrendQuery {
    /// `daily` or `monthly`
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfitSummaryPayload {
    pub today_profit_cents: i64,
    pub today_loss_cents: i64,
    pub monthly_profit_cents: i64,
    pub monthly_loss_cents: i64,
    pub overall_profit_cents: i64,
    pub overall_loss_cents: i64,
}

impl From<ProfitSummary> for ProfitSummaryPayload {
    fn from(s: ProfitSummary) -> Self {
        ProfitSummaryPayload {
            today_profit_cents: s.today.profit_cents,
            today_loss_cents: s.today.loss_cents,
            monthly_profit_cents: s.this_month.profit_cents,
            monthly_loss_cents: s.this_month.loss_cents,
            overall_profit_cents: s.overall.profit_cents,
            overall_loss_cents: s.overall.loss_cents,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthPayload {
    #[serde(flatten)]
    pub month: MonthlyProfit,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyPayload {
    pub date: NaiveDate,
    pub hours: Vec<HourlyProfit>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPayload {
    #[serde(rename = "type")]
    pub kind: TrendKind,
    pub buckets: Vec<TrendBucket>,
}

/// Profit and loss for today, this month and all time.
pub async fn profit_summary(state: &AppState) -> ApiResult<ProfitSummaryPayload> {
    let summary = state.reports().profit_summary(Utc::now()).await?;
    Ok(ApiResponse::ok("Profit summary", summary.into()))
}

/// Profit and loss for one calendar month.
pub async fn profit_by_month(state: &AppState, query: MonthQuery) -> ApiResult<MonthPayload> {
    let month = state.reports().profit_by_month(query.year, query.month).await?;
    Ok(ApiResponse::ok("Monthly profit", MonthPayload { month }))
}

/// Today's profit by local hour.
pub async fn profit_by_hour(state: &AppState) -> ApiResult<HourlyPayload> {
    let report = state.reports().profit_by_hour(Utc::now()).await?;
    Ok(ApiResponse::ok(
        "Hourly profit",
        HourlyPayload {
            date: report.date,
            hours: report.hours,
        },
    ))
}

/// Daily buckets for this month or monthly buckets for this year.
pub async fn profit_trend(state: &AppState, query: TrendQuery) -> ApiResult<TrendPayload> {
    let kind: TrendKind = query.kind.parse()?;
    let buckets = state.reports().profit_trend(kind, Utc::now()).await?;
    Ok(ApiResponse::ok("Profit trend", TrendPayload { kind, buckets }))
}

// =============================================================================
// Unit Tests
// =============================================================================
