//! Depletion and profit properties
//!
//! Properties checked against the pure planner:
//! - Remaining stock never goes negative
//! - A plan covers exactly the requested quantity, earliest expiry first
//! - Insufficient stock leaves every batch untouched
//! - Sale total profit equals the sum of its line profits

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use proptest::prelude::*;
use remedy_core::depletion::{apply_plan, line_profit, plan_depletion};
use remedy_core::reporting::ProfitLoss;
use remedy_core::sale::assemble_sale;
use remedy_core::{Batch, CoreError, Medicine, Money};

fn medicine() -> Medicine {
    let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
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

fn batches(lots: &[(i64, i64, i64)]) -> Vec<Batch> {
    let base = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
    let created = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    lots.iter()
        .enumerate()
        .map(|(i, &(quantity, unit_cost, expiry_offset))| Batch {
            id: format!("b{i:02}"),
            medicine_id: "med-1".into(),
            batch_number: format!("LOT-{i}"),
            purchase_price_cents: unit_cost * quantity.max(1),
            quantity,
            received_quantity: quantity,
            unit_cost_cents: unit_cost,
            expiry_date: base + Duration::days(expiry_offset),
            created_at: created,
            updated_at: created,
        })
        .collect()
}

/// (remaining quantity, unit cost in cents, expiry offset in days)
fn lot_strategy() -> impl Strategy<Value = (i64, i64, i64)> {
    (0i64..=50, 0i64..=5_000, 0i64..=365)
}

fn price_strategy() -> impl Strategy<Value = i64> {
    0i64..=10_000
}

#[test]
fn test_three_lots_of_five_sell_seven() {
    let mut lots = batches(&[(5, 100, 10), (5, 100, 20), (5, 100, 30)]);
    let plan = plan_depletion(&medicine(), &lots, 7, Money::from_cents(150)).unwrap();
    apply_plan(&mut lots, &plan).unwrap();

    let remaining: Vec<i64> = lots.iter().map(|b| b.quantity).collect();
    assert_eq!(remaining, vec![0, 3, 5]);
    assert_eq!(plan.profit(), Money::from_cents(350));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Selling up to the eligible total never leaves a negative batch and
    /// removes exactly the requested units.
    #[test]
    fn prop_depletion_never_goes_negative(
        lots in prop::collection::vec(lot_strategy(), 1..8),
        fraction in 1i64..=100,
        price in price_strategy()
    ) {
        let mut stock = batches(&lots);
        let available: i64 = stock.iter().map(|b| b.quantity).sum();
        prop_assume!(available > 0);
        let requested = (available * fraction / 100).max(1);

        let plan = plan_depletion(&medicine(), &stock, requested, Money::from_cents(price)).unwrap();
        prop_assert_eq!(plan.quantity(), requested);

        apply_plan(&mut stock, &plan).unwrap();
        prop_assert!(stock.iter().all(|b| b.quantity >= 0));
        let left: i64 = stock.iter().map(|b| b.quantity).sum();
        prop_assert_eq!(left, available - requested);
    }

    /// Slices are taken in expiry order and only the last slice may be partial.
    #[test]
    fn prop_depletion_is_earliest_expiry_first(
        lots in prop::collection::vec(lot_strategy(), 1..8),
        fraction in 1i64..=100
    ) {
        let stock = batches(&lots);
        let available: i64 = stock.iter().map(|b| b.quantity).sum();
        prop_assume!(available > 0);
        let requested = (available * fraction / 100).max(1);

        let plan = plan_depletion(&medicine(), &stock, requested, Money::from_cents(100)).unwrap();
        let touched: Vec<&Batch> = plan
            .slices
            .iter()
            .map(|s| stock.iter().find(|b| b.id == s.batch_id).unwrap())
            .collect();

        for pair in touched.windows(2) {
            prop_assert!(pair[0].expiry_date <= pair[1].expiry_date);
        }
        for (slice, batch) in plan.slices.iter().zip(&touched).rev().skip(1) {
            prop_assert_eq!(slice.quantity, batch.quantity);
        }
        prop_assert!(plan.slices.iter().all(|s| s.quantity > 0));
    }

    /// Asking for more than is eligible fails and moves nothing.
    #[test]
    fn prop_insufficient_stock_leaves_batches_untouched(
        lots in prop::collection::vec(lot_strategy(), 0..8),
        extra in 1i64..=50
    ) {
        let stock = batches(&lots);
        let available: i64 = stock.iter().map(|b| b.quantity).sum();
        let before = stock.clone();

        let result = plan_depletion(&medicine(), &stock, available + extra, Money::from_cents(100));
        match result {
            Err(CoreError::InsufficientStock { available: reported, requested, .. }) => {
                prop_assert_eq!(reported, available);
                prop_assert_eq!(requested, available + extra);
            }
            other => prop_assert!(false, "expected InsufficientStock, got {:?}", other),
        }
        prop_assert_eq!(stock, before);
    }

    /// Sale total is the sum of line profits, and the profit/loss split
    /// nets back to that total.
    #[test]
    fn prop_sale_total_matches_lines(
        lots in prop::collection::vec(lot_strategy(), 1..8),
        fraction in 1i64..=100,
        price in price_strategy()
    ) {
        let stock = batches(&lots);
        let available: i64 = stock.iter().map(|b| b.quantity).sum();
        prop_assume!(available > 0);
        let requested = (available * fraction / 100).max(1);

        let plan = plan_depletion(&medicine(), &stock, requested, Money::from_cents(price)).unwrap();
        let sale = assemble_sale("sale-1", Utc::now(), std::slice::from_ref(&plan), || "line".into());

        let line_sum: i64 = sale.items.iter().map(|i| i.profit_cents).sum();
        prop_assert_eq!(sale.total_profit_cents, line_sum);
        prop_assert_eq!(sale.total_quantity(), requested);

        for item in &sale.items {
            let expected = line_profit(
                Money::from_cents(item.selling_price_cents),
                Money::from_cents(item.unit_cost_cents),
                item.quantity,
            );
            prop_assert_eq!(item.profit(), expected);
        }

        let split = ProfitLoss::from_profits(sale.items.iter().map(|i| i.profit()));
        prop_assert_eq!(split.net_cents(), sale.total_profit_cents);
    }
}
