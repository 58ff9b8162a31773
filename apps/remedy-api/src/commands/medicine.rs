//! # Medicine Commands
//!
//! Stock-in, catalogue CRUD and batch corrections.
//!
//! ## Stock-in Flow
//! ```text
//! add_medicine { name, brand, ..., batchNumber, purchasePriceCents, quantity, expiryDate }
//!      │
//!      ▼
//! (name, brand) known? ── no ──► create medicine
//!      │ yes
//!      ▼
//! same batch number + purchase price + expiry? ── yes ──► merge units into it
//!      │ no
//!      ▼
//! new batch, unit cost = purchase price / quantity
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use remedy_core::pagination::{filter_value, MedicineFilter};
use remedy_core::{Batch, BatchUpdate, Medicine, MedicineStock, NewMedicine, StockIn};

use super::{check_id, page_request, parse_date};
use crate::response::{ApiResponse, ApiResult, Paged};
use crate::state::AppState;

// =============================================================================
// Request DTOs
// =============================================================================

/// Stock-in request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AddMedicineRequest {
    pub name: String,
    pub brand: String,
    pub description: String,
    pub price_cents: i64,
    pub image: Option<String>,
    pub category: String,
    pub manufacturer: String,
    pub batch_number: String,
    /// Total paid for the delivery, in cents.
    pub purchase_price_cents: i64,
    pub quantity: i64,
    pub expiry_date: String,
}

/// Catalogue listing query.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MedicineQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub name: Option<String>,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
}

/// Partial medicine edit. Missing fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MedicinePatch {
    pub name: Option<String>,
    pub brand: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub image: Option<String>,
    pub category: Option<String>,
    pub manufacturer: Option<String>,
}

impl MedicinePatch {
    fn apply(self, current: Medicine) -> NewMedicine {
        NewMedicine {
            name: self.name.unwrap_or(current.name),
            brand: self.brand.unwrap_or(current.brand),
            description: self.description.unwrap_or(current.description),
            price_cents: self.price_cents.unwrap_or(current.price_cents),
            image: self.image.or(current.image),
            category: self.category.unwrap_or(current.category),
            manufacturer: self.manufacturer.unwrap_or(current.manufacturer),
        }
    }
}

/// Batch correction request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateBatchRequest {
    pub batch_number: String,
    pub purchase_price_cents: i64,
    pub quantity: i64,
    pub expiry_date: String,
}

// =============================================================================
// Response Payloads
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockInPayload {
    pub medicine: Medicine,
    pub batch: Batch,
    pub merged: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MedicineList {
    pub medicines: Vec<MedicineStock>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MedicineDetail {
    pub medicine: Medicine,
    /// Batches in depletion order.
    pub batches: Vec<Batch>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MedicinePayload {
    pub medicine: Medicine,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchPayload {
    pub batch: Batch,
}

// =============================================================================
// Commands
// =============================================================================

/// Receives a delivery, creating the medicine and/or batch as needed.
pub async fn add_medicine(state: &AppState, request: AddMedicineRequest) -> ApiResult<StockInPayload> {
    debug!(name = %request.name, batch_number = %request.batch_number, "add_medicine command");

    let stock_in = StockIn {
        expiry_date: parse_date("expiryDate", &request.expiry_date)?,
        medicine: NewMedicine {
            name: request.name,
            brand: request.brand,
            description: request.description,
            price_cents: request.price_cents,
            image: request.image,
            category: request.category,
            manufacturer: request.manufacturer,
        },
        batch_number: request.batch_number,
        purchase_price_cents: request.purchase_price_cents,
        quantity: request.quantity,
    };

    let outcome = state.db().batches().stock_in(&stock_in).await?;

    let msg = if outcome.merged {
        "Stock added to existing batch"
    } else {
        "Medicine stock added"
    };
    Ok(ApiResponse::ok(
        msg,
        StockInPayload {
            medicine: outcome.medicine,
            batch: outcome.batch,
            merged: outcome.merged,
        },
    ))
}

/// Lists the catalogue, newest first, with total remaining stock.
pub async fn list_medicines(state: &AppState, query: MedicineQuery) -> ApiResult<Paged<MedicineList>> {
    let page = page_request(state, query.page, query.limit)?;
    let filter = MedicineFilter {
        name: filter_value(query.name.as_deref()),
        brand: filter_value(query.brand.as_deref()),
        category: filter_value(query.category.as_deref()),
        description: filter_value(query.description.as_deref()),
    };

    let result = state.db().medicines().list(&filter, page).await?;

    Ok(ApiResponse::ok(
        "Medicines fetched",
        Paged {
            page: result.page,
            total_pages: result.total_pages,
            total: result.total,
            items: MedicineList {
                medicines: result.items,
            },
        },
    ))
}

/// Gets a medicine with its batches.
pub async fn get_medicine(state: &AppState, id: &str) -> ApiResult<MedicineDetail> {
    let id = check_id(id)?;

    let medicine = state.db().medicines().get(&id).await?;
    let batches = state.db().batches().for_medicine(&id).await?;

    Ok(ApiResponse::ok("Medicine fetched", MedicineDetail { medicine, batches }))
}

/// Edits catalogue fields of a medicine.
pub async fn edit_medicine(state: &AppState, id: &str, patch: MedicinePatch) -> ApiResult<MedicinePayload> {
    let id = check_id(id)?;
    debug!(id = %id, "edit_medicine command");

    let current = state.db().medicines().get(&id).await?;
    let medicine = state.db().medicines().update(&id, &patch.apply(current)).await?;

    Ok(ApiResponse::ok("Medicine updated", MedicinePayload { medicine }))
}

/// Deletes a medicine and its batches. Sale history is kept.
pub async fn delete_medicine(state: &AppState, id: &str) -> ApiResult<MedicinePayload> {
    let id = check_id(id)?;

    let medicine = state.db().medicines().get(&id).await?;
    state.db().medicines().delete(&id).await?;

    info!(id = %id, name = %medicine.name, "Medicine deleted");
    Ok(ApiResponse::ok("Medicine deleted", MedicinePayload { medicine }))
}

/// Corrects a batch's number, price, quantity or expiry.
pub async fn update_batch(state: &AppState, id: &str, request: UpdateBatchRequest) -> ApiResult<BatchPayload> {
    let id = check_id(id)?;

    let update = BatchUpdate {
        expiry_date: parse_date("expiryDate", &request.expiry_date)?,
        batch_number: request.batch_number,
        purchase_price_cents: request.purchase_price_cents,
        quantity: request.quantity,
    };

    let batch = state.db().batches().update(&id, &update).await?;

    info!(batch_id = %batch.id, quantity = batch.quantity, "Batch updated");
    Ok(ApiResponse::ok("Batch updated", BatchPayload { batch }))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn delivery(name: &str, lot: &str, price: i64, quantity: i64) -> AddMedicineRequest {
        AddMedicineRequest {
            name: name.into(),
            brand: "GSK".into(),
            category: "Antibiotic".into(),
            batch_number: lot.into(),
            purchase_price_cents: price,
            quantity,
            expiry_date: "2027-06-30".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_add_then_merge() {
        let state = AppState::in_memory().await.unwrap();

        let first = add_medicine(&state, delivery("Amoxil", "A1", 1000, 10)).await.unwrap();
        assert!(!first.data.merged);
        assert_eq!(first.data.batch.unit_cost_cents, 100);

        let second = add_medicine(&state, delivery("Amoxil", "A1", 1000, 10)).await.unwrap();
        assert!(second.data.merged);
        assert_eq!(second.msg, "Stock added to existing batch");
        assert_eq!(second.data.batch.quantity, 20);
        assert_eq!(second.data.medicine.id, first.data.medicine.id);
    }

    #[tokio::test]
    async fn test_add_rejects_bad_input() {
        let state = AppState::in_memory().await.unwrap();

        let err = add_medicine(&state, delivery("Amoxil", "A1", 1000, 0)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let mut bad_date = delivery("Amoxil", "A1", 1000, 5);
        bad_date.expiry_date = "soon".into();
        assert_eq!(add_medicine(&state, bad_date).await.unwrap_err().http_status(), 400);

        let listed = list_medicines(&state, MedicineQuery::default()).await.unwrap();
        assert_eq!(listed.data.total, 0);
    }

    #[tokio::test]
    async fn test_list_get_edit_delete() {
        let state = AppState::in_memory().await.unwrap();
        let added = add_medicine(&state, delivery("Amoxil", "A1", 1000, 10)).await.unwrap();
        add_medicine(&state, delivery("Panadol", "P1", 500, 5)).await.unwrap();
        let id = added.data.medicine.id.clone();

        let query = MedicineQuery {
            name: Some("amox".into()),
            ..Default::default()
        };
        let listed = list_medicines(&state, query).await.unwrap();
        assert_eq!(listed.data.total, 1);
        assert_eq!(listed.data.items.medicines[0].quantity, 10);

        let detail = get_medicine(&state, &id).await.unwrap();
        assert_eq!(detail.data.batches.len(), 1);

        let patch = MedicinePatch {
            price_cents: Some(1500),
            ..Default::default()
        };
        let edited = edit_medicine(&state, &id, patch).await.unwrap();
        assert_eq!(edited.data.medicine.price_cents, 1500);
        assert_eq!(edited.data.medicine.name, "Amoxil");

        let deleted = delete_medicine(&state, &id).await.unwrap();
        assert_eq!(deleted.data.medicine.id, id);
        let err = get_medicine(&state, &id).await.unwrap_err();
        assert_eq!(err.http_status(), 404);
    }

    #[tokio::test]
    async fn test_edit_onto_existing_key_conflicts() {
        let state = AppState::in_memory().await.unwrap();
        add_medicine(&state, delivery("Amoxil", "A1", 1000, 10)).await.unwrap();
        let panadol = add_medicine(&state, delivery("Panadol", "P1", 500, 5)).await.unwrap();

        let patch = MedicinePatch {
            name: Some("Amoxil".into()),
            ..Default::default()
        };
        let err = edit_medicine(&state, &panadol.data.medicine.id, patch).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Conflict);
    }

    #[tokio::test]
    async fn test_update_batch() {
        let state = AppState::in_memory().await.unwrap();
        let added = add_medicine(&state, delivery("Amoxil", "A1", 1000, 10)).await.unwrap();

        let request = UpdateBatchRequest {
            batch_number: "A1-FIXED".into(),
            purchase_price_cents: 2000,
            quantity: 12,
            expiry_date: "2027-07-31".into(),
        };
        let updated = update_batch(&state, &added.data.batch.id, request).await.unwrap();
        assert_eq!(updated.data.batch.batch_number, "A1-FIXED");
        assert_eq!(updated.data.batch.quantity, 12);
        assert_eq!(updated.data.batch.unit_cost_cents, 200);
    }
}
