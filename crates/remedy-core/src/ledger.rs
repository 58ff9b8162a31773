//! # Lot Costing
//!
//! Pure cost-basis rules for the batch ledger.
//!
//! ## Stock-in Resolution
//! ```text
//! StockIn(name, brand, batchNumber, purchasePrice, quantity, expiry)
//!      │
//!      ▼
//! Batch with same (medicine, batchNumber, purchasePrice, expiry)?
//!      │
//!      ├── NO  → new lot:   unit_cost = purchasePrice / quantity
//!      │
//!      └── YES → merge:     quantity          += incoming
//!                           received_quantity += incoming
//!                           unit_cost = (unit_cost × remaining + purchasePrice)
//!                                       / (remaining + incoming)
//! ```
//!
//! The merge keeps a weighted average over the units still on hand, so a
//! repeated delivery never rewrites the cost basis of units already in the
//! batch. Two identical deliveries of 10 units for 100 keep a unit cost of 10.

use crate::money::{div_round_half_away, Money};
use crate::types::{Batch, BatchUpdate};

/// Cost of one unit of a freshly received lot.
///
/// A non-positive quantity has no meaningful unit cost and yields zero;
/// callers validate quantities before reaching this point.
pub fn unit_cost_for_lot(purchase_price: Money, quantity: i64) -> Money {
    purchase_price.per_unit(quantity).unwrap_or_default()
}

/// Weighted-average unit cost after merging a delivery into a batch.
///
/// ## Example
/// ```rust
/// use remedy_core::ledger::merged_unit_cost;
/// use remedy_core::money::Money;
///
/// // 10 on hand at 10.00, another 10 arrive for 300.00 → 20 at 20.00
/// let cost = merged_unit_cost(Money::from_cents(1000), 10, Money::from_cents(30_000), 10);
/// assert_eq!(cost.cents(), 2000);
/// ```
pub fn merged_unit_cost(
    current_unit_cost: Money,
    remaining: i64,
    incoming_price: Money,
    incoming_quantity: i64,
) -> Money {
    let remaining = remaining.max(0);
    let units = remaining as i128 + incoming_quantity as i128;
    if units <= 0 {
        return current_unit_cost;
    }
    let on_hand_value = current_unit_cost.cents().max(0) as i128 * remaining as i128;
    let total = on_hand_value + incoming_price.cents() as i128;
    Money::from_cents(div_round_half_away(total, units))
}

/// New counters for a batch after a delivery is merged into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LotMerge {
    pub quantity: i64,
    pub received_quantity: i64,
    pub unit_cost: Money,
}

/// Computes the merged state of `batch` after receiving `incoming_quantity`
/// units for `incoming_price`.
pub fn merge_delivery(batch: &Batch, incoming_price: Money, incoming_quantity: i64) -> LotMerge {
    LotMerge {
        quantity: batch.quantity + incoming_quantity,
        received_quantity: batch.received_quantity + incoming_quantity,
        unit_cost: merged_unit_cost(batch.unit_cost(), batch.quantity, incoming_price, incoming_quantity),
    }
}

/// Counters for a batch after an admin correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LotCorrection {
    pub received_quantity: i64,
    pub unit_cost: Money,
}

/// Applies a [`BatchUpdate`] to the cost counters of `batch`.
///
/// - `received_quantity` never drops below the corrected remaining quantity.
/// - A changed purchase price rescales the unit cost by `new / old`, which
///   keeps merged batches consistent; an unchanged price keeps the cost basis.
pub fn correct_lot(batch: &Batch, update: &BatchUpdate) -> LotCorrection {
    let received_quantity = batch.received_quantity.max(update.quantity);

    let unit_cost = if update.purchase_price_cents == batch.purchase_price_cents {
        batch.unit_cost()
    } else if batch.purchase_price_cents > 0 {
        let scaled = batch.unit_cost().cents() as i128 * update.purchase_price_cents as i128;
        Money::from_cents(div_round_half_away(scaled, batch.purchase_price_cents as i128))
    } else {
        unit_cost_for_lot(Money::from_cents(update.purchase_price_cents), received_quantity)
    };

    LotCorrection {
        received_quantity,
        unit_cost,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn lot(quantity: i64, received: i64, price: i64, unit_cost: i64) -> Batch {
        let now = Utc::now();
        Batch {
            id: "b".into(),
            medicine_id: "m".into(),
            batch_number: "B1".into(),
            purchase_price_cents: price,
            quantity,
            received_quantity: received,
            unit_cost_cents: unit_cost,
            expiry_date: NaiveDate::from_ymd_opt(2030, 6, 1).unwrap(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_unit_cost_for_lot() {
        assert_eq!(unit_cost_for_lot(Money::from_cents(100), 10).cents(), 10);
        assert_eq!(unit_cost_for_lot(Money::from_cents(1000), 3).cents(), 333);
        assert_eq!(unit_cost_for_lot(Money::from_cents(1000), 0), Money::zero());
    }

    #[test]
    fn test_identical_delivery_keeps_unit_cost() {
        let batch = lot(10, 10, 100, 10);
        let merged = merge_delivery(&batch, Money::from_cents(100), 10);
        assert_eq!(merged.quantity, 20);
        assert_eq!(merged.received_quantity, 20);
        assert_eq!(merged.unit_cost.cents(), 10);
    }

    #[test]
    fn test_merge_after_partial_sale_weights_remaining_units() {
        // 4 of 10 left at 10, 10 more arrive for 100 (10 each) → still 10
        let batch = lot(4, 10, 100, 10);
        let merged = merge_delivery(&batch, Money::from_cents(100), 10);
        assert_eq!(merged.quantity, 14);
        assert_eq!(merged.received_quantity, 20);
        assert_eq!(merged.unit_cost.cents(), 10);
    }

    #[test]
    fn test_merge_into_empty_batch_takes_incoming_cost() {
        let batch = lot(0, 10, 100, 10);
        let merged = merge_delivery(&batch, Money::from_cents(250), 10);
        assert_eq!(merged.quantity, 10);
        assert_eq!(merged.unit_cost.cents(), 25);
    }

    #[test]
    fn test_correct_lot_keeps_cost_when_price_unchanged() {
        let batch = lot(10, 10, 100, 10);
        let update = BatchUpdate {
            batch_number: "B1-fixed".into(),
            purchase_price_cents: 100,
            quantity: 8,
            expiry_date: batch.expiry_date,
        };
        let corrected = correct_lot(&batch, &update);
        assert_eq!(corrected.unit_cost.cents(), 10);
        assert_eq!(corrected.received_quantity, 10);
    }

    #[test]
    fn test_correct_lot_rescales_cost_on_price_change() {
        let batch = lot(20, 20, 100, 10);
        let update = BatchUpdate {
            batch_number: "B1".into(),
            purchase_price_cents: 150,
            quantity: 20,
            expiry_date: batch.expiry_date,
        };
        let corrected = correct_lot(&batch, &update);
        assert_eq!(corrected.unit_cost.cents(), 15);
    }

    #[test]
    fn test_correct_lot_raises_received_quantity() {
        let batch = lot(5, 10, 100, 10);
        let update = BatchUpdate {
            batch_number: "B1".into(),
            purchase_price_cents: 100,
            quantity: 12,
            expiry_date: batch.expiry_date,
        };
        assert_eq!(correct_lot(&batch, &update).received_quantity, 12);
    }
}
