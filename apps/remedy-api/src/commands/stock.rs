//! # Stock Commands
//!
//! Availability, expiry listings, valuation and daily movement.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use remedy_core::pagination::{filter_value, ExpiryFilter};
use remedy_core::reporting::{
    AvailableStockValuation, DailyMovement, ExpiryEntry, StockAvailability, StockSummary, StockValuation,
};

use super::page_request;
use crate::response::{ApiResponse, ApiResult, Paged};
use crate::state::AppState;

/// Expiry listing query.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExpiryQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub name: Option<String>,
    pub category: Option<String>,
}

impl ExpiryQuery {
    fn filter(&self) -> ExpiryFilter {
        ExpiryFilter {
            name: filter_value(self.name.as_deref()),
            category: filter_value(self.category.as_deref()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AvailabilityPayload {
    pub stock: Vec<StockAvailability>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryPayload {
    #[serde(flatten)]
    pub summary: StockSummary,
    pub short_expiry_days: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpiryList {
    pub medicines: Vec<ExpiryEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValuePayload {
    #[serde(flatten)]
    pub valuation: StockValuation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AvailableValuePayload {
    #[serde(flatten)]
    pub valuation: AvailableStockValuation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovementPayload {
    pub date: NaiveDate,
    pub movements: Vec<DailyMovement>,
}

/// Received vs sold per medicine.
pub async fn stock_availability(state: &AppState) -> ApiResult<AvailabilityPayload> {
    let stock = state.reports().stock_availability().await?;
    Ok(ApiResponse::ok("Stock availability", AvailabilityPayload { stock }))
}

/// Store-wide stock totals.
pub async fn stock_summary(state: &AppState) -> ApiResult<SummaryPayload> {
    let days = state.config().short_expiry_days;
    let summary = state.reports().stock_summary(Utc::now(), days).await?;
    Ok(ApiResponse::ok(
        "Stock summary",
        SummaryPayload {
            summary,
            short_expiry_days: days,
        },
    ))
}

/// Medicines expiring within the configured window, soonest first.
pub async fn short_expiry(state: &AppState, query: ExpiryQuery) -> ApiResult<Paged<ExpiryList>> {
    let page = page_request(state, query.page, query.limit)?;
    let days = state.config().short_expiry_days;

    let result = state
        .reports()
        .short_expiry(Utc::now(), days, &query.filter(), page)
        .await?;

    Ok(ApiResponse::ok(
        "Short expiry medicines",
        Paged {
            page: result.page,
            total_pages: result.total_pages,
            total: result.total,
            items: ExpiryList {
                medicines: result.items,
            },
        },
    ))
}

/// Medicines with expired stock, most recent first.
pub async fn expired(state: &AppState, query: ExpiryQuery) -> ApiResult<Paged<ExpiryList>> {
    let page = page_request(state, query.page, query.limit)?;

    let result = state.reports().expired(Utc::now(), &query.filter(), page).await?;

    Ok(ApiResponse::ok(
        "Expired medicines",
        Paged {
            page: result.page,
            total_pages: result.total_pages,
            total: result.total,
            items: ExpiryList {
                medicines: result.items,
            },
        },
    ))
}

/// Remaining stock at cost.
pub async fn total_value(state: &AppState) -> ApiResult<ValuePayload> {
    let valuation = state.reports().stock_value().await?;
    Ok(ApiResponse::ok("Stock value", ValuePayload { valuation }))
}

/// Estimated and exact value of the available stock.
pub async fn available_value(state: &AppState) -> ApiResult<AvailableValuePayload> {
    let valuation = state.reports().available_stock_value().await?;
    Ok(ApiResponse::ok("Available stock value", AvailableValuePayload { valuation }))
}

/// Units received and sold today.
pub async fn daily_movement(state: &AppState) -> ApiResult<MovementPayload> {
    let report = state.reports().daily_movement(Utc::now()).await?;
    Ok(ApiResponse::ok(
        "Daily stock movement",
        MovementPayload {
            date: report.date,
            movements: report.movements,
        },
    ))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::medicine::{add_medicine, AddMedicineRequest};
    use crate::commands::sale::{sell_medicine, SellItem, SellRequest};
    use chrono::Duration;

    async fn receive(state: &AppState, name: &str, category: &str, expiry: NaiveDate) -> String {
        let request = AddMedicineRequest {
            name: name.into(),
            brand: "Getz".into(),
            category: category.into(),
            batch_number: format!("{name}-1"),
            purchase_price_cents: 2000,
            quantity: 20,
            expiry_date: expiry.format("%Y-%m-%d").to_string(),
            ..Default::default()
        };
        add_medicine(state, request).await.unwrap().data.medicine.id
    }

    async fn store() -> AppState {
        let state = AppState::in_memory().await.unwrap();
        let today = Utc::now().date_naive();

        let fresh = receive(&state, "Risek", "Antacid", today + Duration::days(400)).await;
        receive(&state, "Softin", "Antihistamine", today + Duration::days(12)).await;
        receive(&state, "Flagyl", "Antibiotic", today - Duration::days(20)).await;

        sell_medicine(
            &state,
            SellRequest::Single(SellItem {
                medicine_id: fresh,
                quantity: 5,
                selling_price_cents: 150,
            }),
        )
        .await
        .unwrap();

        state
    }

    #[tokio::test]
    async fn test_availability_and_summary() {
        let state = store().await;

        let availability = stock_availability(&state).await.unwrap();
        let risek = availability.data.stock.iter().find(|r| r.name == "Risek").unwrap();
        assert_eq!(risek.available_stock, 15);

        let summary = stock_summary(&state).await.unwrap();
        assert_eq!(summary.data.summary.total_stock_in, 60);
        assert_eq!(summary.data.summary.total_stock_out, 5);
        assert_eq!(summary.data.summary.total_short_expiry, 20);
        assert_eq!(summary.data.summary.total_expired, 20);

        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["shortExpiryDays"], 30);
        assert_eq!(value["total_available_stock"], 55);
    }

    #[tokio::test]
    async fn test_expiry_listings() {
        let state = store().await;

        let short = short_expiry(&state, ExpiryQuery::default()).await.unwrap();
        assert_eq!(short.data.total, 1);
        assert_eq!(short.data.items.medicines[0].name, "Softin");

        let gone = expired(&state, ExpiryQuery::default()).await.unwrap();
        assert_eq!(gone.data.items.medicines[0].name, "Flagyl");

        let query = ExpiryQuery {
            name: Some("soft".into()),
            ..Default::default()
        };
        assert_eq!(expired(&state, query).await.unwrap().data.total, 0);
    }

    #[tokio::test]
    async fn test_valuation() {
        let state = store().await;

        // 55 units left at 100 each
        let value = total_value(&state).await.unwrap();
        assert_eq!(value.data.valuation.total_value_cents, 5500);

        let available = available_value(&state).await.unwrap();
        assert_eq!(available.data.valuation.total_purchase_value_cents, 6000);
        assert_eq!(available.data.valuation.estimated_available_value_cents, 5500);
        assert_eq!(available.data.valuation.exact_available_value_cents, 5500);
    }

    #[tokio::test]
    async fn test_daily_movement() {
        let state = store().await;

        let movement = daily_movement(&state).await.unwrap();
        assert_eq!(movement.data.movements.len(), 3);
        let risek = movement.data.movements.iter().find(|m| m.name == "Risek").unwrap();
        assert_eq!((risek.stock_in, risek.stock_out), (20, 5));
    }
}
