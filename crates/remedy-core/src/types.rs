//! # Domain Types
//!
//! Core domain types used throughout Remedy Pharmacy.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐ 1   * ┌─────────────────┐        ┌──────────────┐ │
//! │  │    Medicine     │───────│      Batch      │◄───────│ StockReceipt │ │
//! │  │  ─────────────  │       │  ─────────────  │        │ (audit, one  │ │
//! │  │  id (UUID)      │       │  id (UUID)      │        │ per stock-in)│ │
//! │  │  name + brand   │       │  batch_number   │        └──────────────┘ │
//! │  │  (natural key)  │       │  quantity ≥ 0   │                         │
//! │  │  category       │       │  unit_cost      │                         │
//! │  └─────────────────┘       │  expiry_date    │                         │
//! │                            └────────┬────────┘                         │
//! │                                     │ depleted by                      │
//! │  ┌─────────────────┐ 1   * ┌────────▼────────┐                         │
//! │  │      Sale       │───────│  SaleLineItem   │  one per batch touched  │
//! │  │  total_profit   │       │  frozen name,   │                         │
//! │  │  created_at     │       │  category, cost │                         │
//! │  └─────────────────┘       └─────────────────┘                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Every entity has a UUID v4 `id`. Medicines additionally have the
//! (name, brand) natural key used to find-or-create them on stock-in.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Medicine
// =============================================================================

/// A catalogued medicine. Stock lives in its [`Batch`]es.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Medicine {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name. Together with `brand`, the natural key.
    pub name: String,

    /// Brand / marketing company.
    pub brand: String,

    pub description: String,

    /// List price in cents. Informational; checkout carries its own price.
    pub price_cents: i64,

    /// Image reference (URL or storage key) produced by the upload service.
    pub image: Option<String>,

    /// Category used for report breakdowns. May be empty.
    pub category: String,

    pub manufacturer: String,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Medicine {
    /// Returns the list price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Category label for reports (`"Uncategorized"` when blank).
    pub fn category_label(&self) -> &str {
        category_label(&self.category)
    }
}

/// Maps a blank category to the `"Uncategorized"` bucket.
pub fn category_label(category: &str) -> &str {
    if category.trim().is_empty() {
        crate::UNCATEGORIZED
    } else {
        category
    }
}

/// Medicine fields supplied by a stock-in or an edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewMedicine {
    pub name: String,
    pub brand: String,
    pub description: String,
    pub price_cents: i64,
    pub image: Option<String>,
    pub category: String,
    pub manufacturer: String,
}

impl NewMedicine {
    /// Returns a copy with surrounding whitespace removed from every text field.
    pub fn normalized(&self) -> NewMedicine {
        NewMedicine {
            name: self.name.trim().to_string(),
            brand: self.brand.trim().to_string(),
            description: self.description.trim().to_string(),
            price_cents: self.price_cents,
            image: self
                .image
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            category: self.category.trim().to_string(),
            manufacturer: self.manufacturer.trim().to_string(),
        }
    }
}

/// A medicine together with its total remaining stock across all batches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MedicineStock {
    #[serde(flatten)]
    pub medicine: Medicine,

    /// Σ remaining quantity over the medicine's batches.
    pub quantity: i64,
}

// =============================================================================
// Batch
// =============================================================================

/// One purchase lot of a medicine.
///
/// ## Invariants
/// - `quantity >= 0` (also a CHECK constraint in storage)
/// - `quantity <= received_quantity`
/// - a batch with `quantity == 0` is kept but never sale-eligible
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Batch {
    /// Unique identifier (UUID v4).
    pub id: String,

    pub medicine_id: String,

    /// Supplier lot identifier (free text).
    pub batch_number: String,

    /// Total price paid for the lot, in cents.
    pub purchase_price_cents: i64,

    /// Remaining units. Decremented by sales, incremented by stock-in.
    pub quantity: i64,

    /// Units ever received into this batch.
    pub received_quantity: i64,

    /// Cost basis of one unit, in cents.
    pub unit_cost_cents: i64,

    #[ts(as = "String")]
    pub expiry_date: NaiveDate,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Batch {
    /// Returns the per-unit cost basis. Negative stored values count as zero.
    #[inline]
    pub fn unit_cost(&self) -> Money {
        Money::from_cents(self.unit_cost_cents.max(0))
    }

    /// Returns the lot purchase price as Money.
    #[inline]
    pub fn purchase_price(&self) -> Money {
        Money::from_cents(self.purchase_price_cents)
    }

    /// A batch can be sold from when it still has stock.
    #[inline]
    pub fn is_eligible(&self) -> bool {
        self.quantity > 0
    }

    /// Expired means the expiry date lies strictly before `today`.
    #[inline]
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expiry_date < today
    }

    /// Value of the units still on hand at cost.
    #[inline]
    pub fn remaining_value(&self) -> Money {
        self.unit_cost().multiply_quantity(self.quantity.max(0))
    }
}

/// A stock arrival: medicine identity plus the lot being received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockIn {
    pub medicine: NewMedicine,
    pub batch_number: String,
    /// Total price paid for this delivery of the lot, in cents.
    pub purchase_price_cents: i64,
    pub quantity: i64,
    #[ts(as = "String")]
    pub expiry_date: NaiveDate,
}

/// Result of a stock-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockInOutcome {
    pub medicine: Medicine,
    pub batch: Batch,
    /// True when the units were merged into an existing batch.
    pub merged: bool,
}

/// Admin correction of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BatchUpdate {
    pub batch_number: String,
    pub purchase_price_cents: i64,
    pub quantity: i64,
    #[ts(as = "String")]
    pub expiry_date: NaiveDate,
}

/// Audit row written for every stock-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StockReceipt {
    pub id: String,
    pub batch_id: String,
    pub medicine_id: String,
    pub quantity: i64,
    pub purchase_price_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Sales
// =============================================================================

/// One requested line of a checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CheckoutItem {
    pub medicine_id: String,
    pub quantity: i64,
    /// Price charged per unit, in cents.
    pub selling_price_cents: i64,
}

impl CheckoutItem {
    /// Returns the unit selling price as Money.
    #[inline]
    pub fn selling_price(&self) -> Money {
        Money::from_cents(self.selling_price_cents)
    }
}

/// A slice of a sale drawn from exactly one batch.
///
/// Name, category, brand and batch number are frozen at sale time so the
/// line stays readable after the medicine is edited or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleLineItem {
    pub id: String,
    pub sale_id: String,
    /// Zero-based order of the line within its sale.
    pub position: i64,
    pub medicine_id: String,
    pub medicine_name: String,
    pub category: String,
    pub brand: String,
    pub batch_id: String,
    pub batch_number: String,
    pub quantity: i64,
    pub unit_cost_cents: i64,
    pub selling_price_cents: i64,
    /// `(selling_price - unit_cost) × quantity`. Negative for a loss.
    pub profit_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl SaleLineItem {
    #[inline]
    pub fn profit(&self) -> Money {
        Money::from_cents(self.profit_cents)
    }

    /// Revenue of the line.
    #[inline]
    pub fn revenue(&self) -> Money {
        Money::from_cents(self.selling_price_cents).multiply_quantity(self.quantity)
    }
}

/// One recorded checkout. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: String,
    /// Σ line item profit.
    pub total_profit_cents: i64,
    /// Number of line items.
    pub item_count: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    /// Line items in depletion order.
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    pub items: Vec<SaleLineItem>,
}

impl Sale {
    #[inline]
    pub fn total_profit(&self) -> Money {
        Money::from_cents(self.total_profit_cents)
    }

    /// Total units sold across every line.
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(quantity: i64, unit_cost_cents: i64) -> Batch {
        let now = Utc::now();
        Batch {
            id: "b1".into(),
            medicine_id: "m1".into(),
            batch_number: "B1".into(),
            purchase_price_cents: 1000,
            quantity,
            received_quantity: 10,
            unit_cost_cents,
            expiry_date: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_batch_eligibility() {
        assert!(batch(1, 100).is_eligible());
        assert!(!batch(0, 100).is_eligible());
    }

    #[test]
    fn test_batch_expiry_is_strictly_before_today() {
        let b = batch(5, 100);
        assert!(!b.is_expired(NaiveDate::from_ymd_opt(2030, 1, 1).unwrap()));
        assert!(b.is_expired(NaiveDate::from_ymd_opt(2030, 1, 2).unwrap()));
    }

    #[test]
    fn test_negative_unit_cost_counts_as_zero() {
        assert_eq!(batch(5, -40).unit_cost(), Money::zero());
        assert_eq!(batch(5, 40).remaining_value().cents(), 200);
    }

    #[test]
    fn test_category_label() {
        assert_eq!(category_label(""), "Uncategorized");
        assert_eq!(category_label("  "), "Uncategorized");
        assert_eq!(category_label("Analgesic"), "Analgesic");
    }

    #[test]
    fn test_new_medicine_normalized() {
        let m = NewMedicine {
            name: "  Panadol ".into(),
            brand: "GSK ".into(),
            description: String::new(),
            price_cents: 100,
            image: Some("   ".into()),
            category: " Analgesic".into(),
            manufacturer: "GSK".into(),
        }
        .normalized();
        assert_eq!(m.name, "Panadol");
        assert_eq!(m.brand, "GSK");
        assert_eq!(m.image, None);
        assert_eq!(m.category, "Analgesic");
    }
}
