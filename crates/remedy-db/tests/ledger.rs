//! Ledger integration tests
//!
//! Storage-level properties of the batch ledger and checkout:
//! - Received units equal eligible units before any sale
//! - Availability is received minus sold
//! - Racing checkouts never oversell a batch

use chrono::NaiveDate;
use remedy_core::period::ReportClock;
use remedy_core::{CheckoutItem, CoreError, Medicine, NewMedicine, StockIn};
use remedy_db::{Database, DbConfig, DbError};
use tempfile::TempDir;

fn delivery(lot: &str, price: i64, quantity: i64, expiry: NaiveDate) -> StockIn {
    StockIn {
        medicine: NewMedicine {
            name: "Augmentin 625mg".into(),
            brand: "GSK".into(),
            description: "Co-amoxiclav".into(),
            price_cents: 45_000,
            image: None,
            category: "Antibiotic".into(),
            manufacturer: "GSK".into(),
        },
        batch_number: lot.into(),
        purchase_price_cents: price,
        quantity,
        expiry_date: expiry,
    }
}

fn expiry(month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2027, month, 1).unwrap()
}

fn sell(medicine: &Medicine, quantity: i64) -> Vec<CheckoutItem> {
    vec![CheckoutItem {
        medicine_id: medicine.id.clone(),
        quantity,
        selling_price_cents: 500,
    }]
}

#[tokio::test]
async fn test_received_units_are_all_eligible() {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();

    let deliveries = [
        delivery("L1", 1_000, 10, expiry(3)),
        delivery("L1", 1_000, 10, expiry(3)),
        delivery("L2", 2_400, 12, expiry(1)),
        delivery("L1", 900, 9, expiry(3)),
        delivery("L3", 50_000, 250, expiry(6)),
    ];

    let mut medicine = None;
    for d in &deliveries {
        medicine = Some(db.batches().stock_in(d).await.unwrap().medicine);
    }
    let medicine = medicine.unwrap();

    let received: i64 = deliveries.iter().map(|d| d.quantity).sum();
    let eligible = db.batches().eligible_batches(&medicine.id).await.unwrap();
    assert_eq!(eligible.iter().map(|b| b.quantity).sum::<i64>(), received);

    // L1 @ 1000 merged, L1 @ 900 kept apart
    assert_eq!(eligible.len(), 4);
    assert_eq!(eligible[0].batch_number, "L2");
}

#[tokio::test]
async fn test_availability_is_received_minus_sold() {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let medicine = db
        .batches()
        .stock_in(&delivery("L1", 10_000, 100, expiry(3)))
        .await
        .unwrap()
        .medicine;

    db.sales().checkout(&sell(&medicine, 30)).await.unwrap();

    let rows = db.reports(ReportClock::utc()).stock_availability().await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].stock_in, 100);
    assert_eq!(rows[0].stock_out, 30);
    assert_eq!(rows[0].available_stock, 70);
}

#[tokio::test]
async fn test_sale_profit_is_sum_of_lines() {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let medicine = db
        .batches()
        .stock_in(&delivery("L1", 3_000, 10, expiry(1)))
        .await
        .unwrap()
        .medicine;
    db.batches()
        .stock_in(&delivery("L2", 4_500, 10, expiry(2)))
        .await
        .unwrap();

    let sale = db.sales().checkout(&sell(&medicine, 15)).await.unwrap();

    // 10 × (500 - 300) + 5 × (500 - 450)
    assert_eq!(sale.total_profit_cents, 2_250);
    let lines: i64 = sale.items.iter().map(|i| i.profit_cents).sum();
    assert_eq!(lines, sale.total_profit_cents);

    let summary = db.reports(ReportClock::utc()).profit_summary(sale.created_at).await.unwrap();
    assert_eq!(summary.overall.net_cents(), 2_250);
}

#[tokio::test]
async fn test_racing_checkouts_never_oversell() {
    let temp_dir = TempDir::new().unwrap();
    let config = DbConfig::new(temp_dir.path().join("remedy.db")).max_connections(4);
    let db = Database::new(config).await.unwrap();

    let medicine = db
        .batches()
        .stock_in(&delivery("L1", 1_000, 10, expiry(3)))
        .await
        .unwrap()
        .medicine;

    let mut handles = Vec::new();
    for _ in 0..4 {
        let sales = db.sales();
        let items = sell(&medicine, 6);
        handles.push(tokio::spawn(async move { sales.checkout(&items).await }));
    }

    let mut succeeded = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => succeeded += 1,
            Err(DbError::Domain(CoreError::InsufficientStock { .. })) => {}
            Err(DbError::TransactionFailed(_)) => {}
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(succeeded, 1);
    let batches = db.batches().for_medicine(&medicine.id).await.unwrap();
    assert_eq!(batches[0].quantity, 4);
    assert_eq!(db.sales().count().await.unwrap(), 1);

    db.close().await;
}
