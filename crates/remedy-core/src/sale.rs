//! # Sale Assembly
//!
//! Turns the depletion plans of one checkout into a single [`Sale`].
//!
//! ```text
//! Checkout [Panadol × 7, Amoxil × 2]
//!      │
//!      ▼
//! plan_depletion() per item, in request order
//!      │
//!      ▼
//! assemble_sale()  ← THIS MODULE
//!      │   flat line list: [Panadol/B1, Panadol/B2, Amoxil/B7]
//!      │   total_profit  = Σ line profit
//!      ▼
//! Sale (persisted by remedy-db in the same transaction as the decrements)
//! ```

use chrono::{DateTime, Utc};

use crate::depletion::DepletionPlan;
use crate::money::Money;
use crate::types::{Sale, SaleLineItem};

/// Sums line profits. An overflowing accumulation is coerced to zero.
pub fn total_profit<'a, I>(profits: I) -> Money
where
    I: IntoIterator<Item = &'a Money>,
{
    profits
        .into_iter()
        .try_fold(Money::zero(), |acc, p| acc.checked_add(*p))
        .unwrap_or_default()
}

/// Builds the sale record for a checkout.
///
/// Lines keep the order of `plans`, and within a plan the depletion order.
/// `next_id` supplies a fresh id for every line item.
pub fn assemble_sale(
    sale_id: &str,
    created_at: DateTime<Utc>,
    plans: &[DepletionPlan],
    mut next_id: impl FnMut() -> String,
) -> Sale {
    let mut items = Vec::new();
    for plan in plans {
        for slice in &plan.slices {
            items.push(SaleLineItem {
                id: next_id(),
                sale_id: sale_id.to_string(),
                position: items.len() as i64,
                medicine_id: plan.medicine_id.clone(),
                medicine_name: plan.medicine_name.clone(),
                category: plan.category.clone(),
                brand: plan.brand.clone(),
                batch_id: slice.batch_id.clone(),
                batch_number: slice.batch_number.clone(),
                quantity: slice.quantity,
                unit_cost_cents: slice.unit_cost.cents(),
                selling_price_cents: slice.selling_price.cents(),
                profit_cents: slice.profit.cents(),
                created_at,
            });
        }
    }

    let profits: Vec<Money> = items.iter().map(SaleLineItem::profit).collect();
    Sale {
        id: sale_id.to_string(),
        total_profit_cents: total_profit(&profits).cents(),
        item_count: items.len() as i64,
        created_at,
        items,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
