//! # Sale Commands
//!
//! Checkout and sale history.
//!
//! ## Checkout Flow
//! ```text
//! sell_medicine { medicineId, quantity, sellingPriceCents }        (single)
//! sell_medicine { items: [{ medicineId, quantity, ... }, ...] }    (multi)
//!      │
//!      ▼
//! validate every line (nothing touched on failure)
//!      │
//!      ▼
//! one transaction: deplete earliest-expiry batches per line, write sale
//!      │
//!      ├── all lines filled → sale + total profit
//!      └── any line short   → 409, every line rolled back
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use remedy_core::pagination::{filter_value, SaleFilter};
use remedy_core::{CheckoutItem, Sale};

use super::{check_id, page_request};
use crate::response::{ApiResponse, ApiResult, Paged};
use crate::state::AppState;

// =============================================================================
// Request DTOs
// =============================================================================

/// One requested line.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellItem {
    pub medicine_id: String,
    pub quantity: i64,
    /// Price charged per unit, in cents.
    pub selling_price_cents: i64,
}

impl From<SellItem> for CheckoutItem {
    fn from(item: SellItem) -> Self {
        CheckoutItem {
            medicine_id: item.medicine_id.trim().to_string(),
            quantity: item.quantity,
            selling_price_cents: item.selling_price_cents,
        }
    }
}

/// A checkout: either a bare line or a list of lines.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SellRequest {
    Many { items: Vec<SellItem> },
    Single(SellItem),
}

impl SellRequest {
    pub fn into_items(self) -> Vec<CheckoutItem> {
        match self {
            SellRequest::Many { items } => items.into_iter().map(CheckoutItem::from).collect(),
            SellRequest::Single(item) => vec![item.into()],
        }
    }
}

/// Sales listing query.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SaleQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub name: Option<String>,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub batch_number: Option<String>,
}

// =============================================================================
// Response Payloads
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalePayload {
    pub sale: Sale,
    pub total_profit_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaleList {
    pub sales: Vec<Sale>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleCount {
    pub total_sales_no: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaleDetail {
    pub sale: Sale,
}

// =============================================================================
// Commands
// =============================================================================

/// Records a checkout of one or more medicines.
pub async fn sell_medicine(state: &AppState, request: SellRequest) -> ApiResult<SalePayload> {
    let items = request.into_items();
    debug!(lines = items.len(), "sell_medicine command");

    let sale = state.db().sales().checkout(&items).await?;

    Ok(ApiResponse::ok(
        "Sale recorded",
        SalePayload {
            total_profit_cents: sale.total_profit_cents,
            sale,
        },
    ))
}

/// Lists sales, newest first.
pub async fn list_sales(state: &AppState, query: SaleQuery) -> ApiResult<Paged<SaleList>> {
    let page = page_request(state, query.page, query.limit)?;
    let filter = SaleFilter {
        name: filter_value(query.name.as_deref()),
        brand: filter_value(query.brand.as_deref()),
        category: filter_value(query.category.as_deref()),
        batch_number: filter_value(query.batch_number.as_deref()),
    };

    let result = state.db().sales().list(&filter, page).await?;

    Ok(ApiResponse::ok(
        "Sales fetched",
        Paged {
            page: result.page,
            total_pages: result.total_pages,
            total: result.total,
            items: SaleList { sales: result.items },
        },
    ))
}

/// Number of recorded sales.
pub async fn count_sales(state: &AppState) -> ApiResult<SaleCount> {
    let total_sales_no = state.db().sales().count().await?;
    Ok(ApiResponse::ok("Sales counted", SaleCount { total_sales_no }))
}

pub async fn get_sale(state: &AppState, id: &str) -> ApiResult<SaleDetail> {
    let id = check_id(id)?;
    let sale = state.db().sales().get(&id).await?;
    Ok(ApiResponse::ok("Sale fetched", SaleDetail { sale }))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::medicine::{add_medicine, get_medicine, AddMedicineRequest};
    use crate::error::ErrorCode;
    use serde_json::json;

    async fn stocked(state: &AppState, name: &str, quantity: i64) -> String {
        let request = AddMedicineRequest {
            name: name.into(),
            brand: "Haleon".into(),
            category: "Analgesic".into(),
            batch_number: format!("{name}-1"),
            purchase_price_cents: 100 * quantity,
            quantity,
            expiry_date: "2027-01-31".into(),
            ..Default::default()
        };
        add_medicine(state, request).await.unwrap().data.medicine.id
    }

    #[test]
    fn test_sell_request_shapes() {
        let single: SellRequest =
            serde_json::from_value(json!({ "medicineId": "m1", "quantity": 2, "sellingPriceCents": 150 })).unwrap();
        assert_eq!(single.into_items().len(), 1);

        let many: SellRequest = serde_json::from_value(json!({
            "items": [
                { "medicineId": "m1", "quantity": 2, "sellingPriceCents": 150 },
                { "medicineId": "m2", "quantity": 1, "sellingPriceCents": 90 }
            ]
        }))
        .unwrap();
        let items = many.into_items();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].medicine_id, "m2");
    }

    #[tokio::test]
    async fn test_sell_and_fetch() {
        let state = AppState::in_memory().await.unwrap();
        let panadol = stocked(&state, "Panadol", 10).await;

        let request = SellRequest::Single(SellItem {
            medicine_id: panadol.clone(),
            quantity: 4,
            selling_price_cents: 150,
        });
        let sold = sell_medicine(&state, request).await.unwrap();
        assert_eq!(sold.data.total_profit_cents, 200);

        let value = serde_json::to_value(&sold).unwrap();
        assert_eq!(value["status"], true);
        assert_eq!(value["totalProfitCents"], 200);

        let fetched = get_sale(&state, &sold.data.sale.id).await.unwrap();
        assert_eq!(fetched.data.sale.items.len(), 1);

        let count = count_sales(&state).await.unwrap();
        assert_eq!(count.data.total_sales_no, 1);

        let detail = get_medicine(&state, &panadol).await.unwrap();
        assert_eq!(detail.data.batches[0].quantity, 6);
    }

    #[tokio::test]
    async fn test_short_line_rolls_back_checkout() {
        let state = AppState::in_memory().await.unwrap();
        let panadol = stocked(&state, "Panadol", 10).await;
        let brufen = stocked(&state, "Brufen", 2).await;

        let request = SellRequest::Many {
            items: vec![
                SellItem {
                    medicine_id: panadol.clone(),
                    quantity: 5,
                    selling_price_cents: 150,
                },
                SellItem {
                    medicine_id: brufen,
                    quantity: 3,
                    selling_price_cents: 150,
                },
            ],
        };
        let err = sell_medicine(&state, request).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(err.http_status(), 409);

        let detail = get_medicine(&state, &panadol).await.unwrap();
        assert_eq!(detail.data.batches[0].quantity, 10);
        assert_eq!(count_sales(&state).await.unwrap().data.total_sales_no, 0);
    }

    #[tokio::test]
    async fn test_empty_and_unknown_checkouts() {
        let state = AppState::in_memory().await.unwrap();

        let err = sell_medicine(&state, SellRequest::Many { items: vec![] }).await.unwrap_err();
        assert_eq!(err.http_status(), 400);

        let request = SellRequest::Single(SellItem {
            medicine_id: "550e8400-e29b-41d4-a716-446655440000".into(),
            quantity: 1,
            selling_price_cents: 100,
        });
        assert_eq!(sell_medicine(&state, request).await.unwrap_err().http_status(), 404);
    }

    #[tokio::test]
    async fn test_list_sales_filters() {
        let state = AppState::in_memory().await.unwrap();
        let panadol = stocked(&state, "Panadol", 10).await;
        let brufen = stocked(&state, "Brufen", 10).await;

        for id in [&panadol, &panadol, &brufen] {
            let request = SellRequest::Single(SellItem {
                medicine_id: id.clone(),
                quantity: 1,
                selling_price_cents: 150,
            });
            sell_medicine(&state, request).await.unwrap();
        }

        let query = SaleQuery {
            name: Some("PANA".into()),
            ..Default::default()
        };
        let listed = list_sales(&state, query).await.unwrap();
        assert_eq!(listed.data.total, 2);
        assert_eq!(listed.data.total_pages, 1);

        let query = SaleQuery {
            limit: Some(0),
            ..Default::default()
        };
        assert_eq!(list_sales(&state, query).await.unwrap_err().http_status(), 400);
    }
}
