//! # Depletion Planning
//!
//! FIFO-by-expiry selection of the batches a sale is drawn from.
//!
//! ## Algorithm
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Sell 7 units of Amoxil                                                 │
//! │                                                                         │
//! │  Eligible batches (quantity > 0), earliest expiry first:               │
//! │                                                                         │
//! │   B1 exp 2026-01  [5] ──► take 5, still need 2                          │
//! │   B2 exp 2026-03  [5] ──► take 2, still need 0  ── stop                 │
//! │   B3 exp 2026-08  [5]     untouched                                     │
//! │                                                                         │
//! │  Plan: [(B1, 5), (B2, 2)]                                               │
//! │  Each slice: profit = (selling_price - B.unit_cost) × slice_quantity    │
//! │                                                                         │
//! │  Σ eligible < requested?  → InsufficientStock, empty-handed:           │
//! │  the plan is computed BEFORE anything is written, so no batch moves.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The database layer feeds [`plan_depletion`] a fresh snapshot of the
//! eligible batches inside the checkout transaction and then applies each
//! slice with a conditional decrement.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{Batch, Medicine};

// =============================================================================
// Plan Types
// =============================================================================

/// Units taken from one batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepletionSlice {
    pub batch_id: String,
    pub batch_number: String,
    pub quantity: i64,
    pub unit_cost: Money,
    pub selling_price: Money,
    pub profit: Money,
}

/// Every slice needed to satisfy one requested medicine quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepletionPlan {
    pub medicine_id: String,
    pub medicine_name: String,
    pub category: String,
    pub brand: String,
    pub requested: i64,
    pub slices: Vec<DepletionSlice>,
}

impl DepletionPlan {
    /// Σ slice profit for this medicine.
    pub fn profit(&self) -> Money {
        self.slices.iter().map(|s| s.profit).sum()
    }

    /// Σ slice quantity. Always equals `requested` for a successful plan.
    pub fn quantity(&self) -> i64 {
        self.slices.iter().map(|s| s.quantity).sum()
    }
}

// =============================================================================
// Planning
// =============================================================================

/// Profit of selling `quantity` units at `selling_price` that cost `unit_cost`.
///
/// A negative unit cost is treated as zero. The result may be negative.
#[inline]
pub fn line_profit(selling_price: Money, unit_cost: Money, quantity: i64) -> Money {
    let unit_cost = if unit_cost.is_negative() { Money::zero() } else { unit_cost };
    (selling_price - unit_cost).multiply_quantity(quantity)
}

/// Depletion order: expiry ascending, then creation time, then id.
pub fn depletion_order(a: &Batch, b: &Batch) -> Ordering {
    a.expiry_date
        .cmp(&b.expiry_date)
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

/// Filters `batches` to the sale-eligible lots of `medicine_id` in depletion order.
pub fn eligible_in_order<'a>(batches: &'a [Batch], medicine_id: &str) -> Vec<&'a Batch> {
    let mut eligible: Vec<&Batch> = batches
        .iter()
        .filter(|b| b.medicine_id == medicine_id && b.is_eligible())
        .collect();
    eligible.sort_by(|a, b| depletion_order(a, b));
    eligible
}

/// Plans the depletion of `requested` units of `medicine`.
///
/// ## Arguments
/// * `medicine` - The medicine being sold (name/category/brand are frozen into the plan)
/// * `batches` - Current batches; ineligible or foreign rows are ignored
/// * `requested` - Units to sell, must be positive
/// * `selling_price` - Unit selling price
///
/// ## Errors
/// * `ValidationError::MustBePositive` when `requested <= 0`
/// * `CoreError::InsufficientStock` when the eligible total is short
///
/// ## Example
/// ```rust,ignore
/// let plan = plan_depletion(&medicine, &batches, 7, Money::from_cents(1500))?;
/// assert_eq!(plan.quantity(), 7);
/// ```
pub fn plan_depletion(
    medicine: &Medicine,
    batches: &[Batch],
    requested: i64,
    selling_price: Money,
) -> CoreResult<DepletionPlan> {
    if requested <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        }
        .into());
    }

    let eligible = eligible_in_order(batches, &medicine.id);
    let available: i64 = eligible.iter().map(|b| b.quantity).sum();
    if available < requested {
        return Err(CoreError::InsufficientStock {
            medicine: medicine.name.clone(),
            available,
            requested,
        });
    }

    let mut still_needed = requested;
    let mut slices = Vec::new();
    for batch in eligible {
        if still_needed == 0 {
            break;
        }
        let take = batch.quantity.min(still_needed);
        let unit_cost = batch.unit_cost();
        slices.push(DepletionSlice {
            batch_id: batch.id.clone(),
            batch_number: batch.batch_number.clone(),
            quantity: take,
            unit_cost,
            selling_price,
            profit: line_profit(selling_price, unit_cost, take),
        });
        still_needed -= take;
    }

    Ok(DepletionPlan {
        medicine_id: medicine.id.clone(),
        medicine_name: medicine.name.clone(),
        category: medicine.category.clone(),
        brand: medicine.brand.clone(),
        requested,
        slices,
    })
}

/// Applies a plan to an in-memory batch list.
///
/// Every slice is checked first; on failure nothing is modified.
pub fn apply_plan(batches: &mut [Batch], plan: &DepletionPlan) -> CoreResult<()> {
    for slice in &plan.slices {
        let batch = batches
            .iter()
            .find(|b| b.id == slice.batch_id)
            .ok_or_else(|| CoreError::BatchNotFound(slice.batch_id.clone()))?;
        if batch.quantity < slice.quantity {
            return Err(CoreError::InsufficientStock {
                medicine: plan.medicine_name.clone(),
                available: batch.quantity,
                requested: slice.quantity,
            });
        }
    }

    for slice in &plan.slices {
        if let Some(batch) = batches.iter_mut().find(|b| b.id == slice.batch_id) {
            batch.quantity -= slice.quantity;
        }
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, TimeZone, Utc};

    fn medicine() -> Medicine {
        let now = Utc::now();
        Medicine {
            id: "med-1".into(),
            name: "Amoxil 250mg".into(),
            brand: "GSK".into(),
            description: String::new(),
            price_cents: 1500,
            image: None,
            category: "Antibiotic".into(),
            manufacturer: "GSK".into(),
            created_at: now,
            updated_at: now,
        }
    }

    fn batch(id: &str, expiry: NaiveDate, quantity: i64, unit_cost: i64) -> Batch {
        let created = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        Batch {
            id: id.into(),
            medicine_id: "med-1".into(),
            batch_number: id.to_uppercase(),
            purchase_price_cents: unit_cost * quantity,
            quantity,
            received_quantity: quantity,
            unit_cost_cents: unit_cost,
            expiry_date: expiry,
            created_at: created,
            updated_at: created,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_sells_earliest_expiry_first() {
        // Supplied out of order on purpose
        let batches = vec![
            batch("b3", date(2026, 8, 1), 5, 100),
            batch("b1", date(2026, 1, 1), 5, 100),
            batch("b2", date(2026, 3, 1), 5, 100),
        ];
        let plan = plan_depletion(&medicine(), &batches, 7, Money::from_cents(150)).unwrap();

        assert_eq!(plan.slices.len(), 2);
        assert_eq!(plan.slices[0].batch_id, "b1");
        assert_eq!(plan.slices[0].quantity, 5);
        assert_eq!(plan.slices[1].batch_id, "b2");
        assert_eq!(plan.slices[1].quantity, 2);

        let mut batches = batches;
        apply_plan(&mut batches, &plan).unwrap();
        let remaining = |id: &str| batches.iter().find(|b| b.id == id).unwrap().quantity;
        assert_eq!(remaining("b1"), 0);
        assert_eq!(remaining("b2"), 3);
        assert_eq!(remaining("b3"), 5);
    }

    #[test]
    fn test_profit_uses_each_batch_cost() {
        let batches = vec![
            batch("b1", date(2026, 1, 1), 2, 100),
            batch("b2", date(2026, 2, 1), 10, 140),
        ];
        let plan = plan_depletion(&medicine(), &batches, 5, Money::from_cents(150)).unwrap();

        assert_eq!(plan.slices[0].profit.cents(), 2 * 50);
        assert_eq!(plan.slices[1].profit.cents(), 3 * 10);
        assert_eq!(plan.profit().cents(), 130);
        assert_eq!(plan.quantity(), 5);
    }

    #[test]
    fn test_selling_below_cost_is_a_loss() {
        let batches = vec![batch("b1", date(2026, 1, 1), 10, 200)];
        let plan = plan_depletion(&medicine(), &batches, 3, Money::from_cents(150)).unwrap();
        assert_eq!(plan.profit().cents(), -150);
    }

    #[test]
    fn test_insufficient_stock_reports_available() {
        let batches = vec![
            batch("b1", date(2026, 1, 1), 5, 100),
            batch("b2", date(2026, 2, 1), 4, 100),
        ];
        let err = plan_depletion(&medicine(), &batches, 12, Money::from_cents(150)).unwrap_err();
        match err {
            CoreError::InsufficientStock {
                available,
                requested,
                ..
            } => {
                assert_eq!(available, 9);
                assert_eq!(requested, 12);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_and_foreign_batches_are_skipped() {
        let mut foreign = batch("other", date(2025, 1, 1), 50, 1);
        foreign.medicine_id = "med-2".into();
        let batches = vec![
            batch("empty", date(2025, 6, 1), 0, 100),
            foreign,
            batch("b1", date(2026, 1, 1), 5, 100),
        ];
        let plan = plan_depletion(&medicine(), &batches, 5, Money::from_cents(150)).unwrap();
        assert_eq!(plan.slices.len(), 1);
        assert_eq!(plan.slices[0].batch_id, "b1");
    }

    #[test]
    fn test_expiry_ties_break_on_creation_time() {
        let mut older = batch("z-older", date(2026, 1, 1), 5, 100);
        older.created_at = older.created_at - Duration::days(1);
        let newer = batch("a-newer", date(2026, 1, 1), 5, 100);
        let plan = plan_depletion(&medicine(), &[newer, older], 3, Money::from_cents(150)).unwrap();
        assert_eq!(plan.slices[0].batch_id, "z-older");
    }

    #[test]
    fn test_non_positive_quantity_rejected() {
        let batches = vec![batch("b1", date(2026, 1, 1), 5, 100)];
        assert!(matches!(
            plan_depletion(&medicine(), &batches, 0, Money::from_cents(150)),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn test_apply_plan_is_all_or_nothing() {
        let mut batches = vec![
            batch("b1", date(2026, 1, 1), 5, 100),
            batch("b2", date(2026, 2, 1), 5, 100),
        ];
        let plan = plan_depletion(&medicine(), &batches, 8, Money::from_cents(150)).unwrap();
        // Someone else sold from b2 in the meantime
        batches[1].quantity = 1;
        assert!(apply_plan(&mut batches, &plan).is_err());
        assert_eq!(batches[0].quantity, 5);
        assert_eq!(batches[1].quantity, 1);
    }

    #[test]
    fn test_line_profit_clamps_negative_cost() {
        assert_eq!(
            line_profit(Money::from_cents(100), Money::from_cents(-50), 2).cents(),
            200
        );
    }
}
