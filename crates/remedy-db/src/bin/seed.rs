//! # Seed Data Generator
//!
//! Populates the database with demo medicines, batches and sales for
//! development.
//!
//! ## Usage
//! ```bash
//! # Generate 200 medicines (default)
//! cargo run -p remedy-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p remedy-db --bin seed -- --count 500
//!
//! # Specify database path
//! cargo run -p remedy-db --bin seed -- --db ./data/remedy.db
//! ```
//!
//! ## Generated Data
//! - Medicines across categories (antibiotics, analgesics, ...), each in
//!   one of several strengths
//! - 1-3 batches per medicine with expiry dates spread from two months ago
//!   to eighteen months ahead, so the expiry reports have something to show
//! - One sample checkout for every fourth medicine

use chrono::{Duration, Utc};
use std::env;
use tracing_subscriber::EnvFilter;

use remedy_core::{CheckoutItem, NewMedicine, StockIn};
use remedy_db::{Database, DbConfig};

/// (category, manufacturer, medicine names)
const CATEGORIES: &[(&str, &str, &[&str])] = &[
    (
        "Antibiotic",
        "GSK",
        &[
            "Amoxil",
            "Augmentin",
            "Zithromax",
            "Ciproxin",
            "Flagyl",
            "Klaricid",
            "Velosef",
            "Doxycycline",
        ],
    ),
    (
        "Analgesic",
        "Haleon",
        &[
            "Panadol",
            "Panadol Extra",
            "Brufen",
            "Disprin",
            "Ponstan",
            "Arinac",
            "Voltral",
            "Caflam",
        ],
    ),
    (
        "Antacid",
        "Abbott",
        &["Mucaine", "Gaviscon", "Risek", "Nexum", "Zantac", "Motilium"],
    ),
    (
        "Antihistamine",
        "Sanofi",
        &["Softin", "Telfast", "Zyrtec", "Avil", "Phenergan", "Claritek"],
    ),
    (
        "Vitamin",
        "Getz Pharma",
        &["Surbex Z", "Cac-1000", "Neurobion", "Qalsan D", "Ferosoft", "Osnate D"],
    ),
    (
        "Cardiac",
        "Pfizer",
        &["Norvasc", "Lipitor", "Concor", "Loprin", "Tenormin", "Exforge"],
    ),
];

/// Strength variants with a price addon in cents
const STRENGTHS: &[(&str, i64)] = &[
    ("125mg", 0),
    ("250mg", 1_500),
    ("500mg", 3_000),
    ("1g", 6_000),
    ("Syrup 60ml", 2_000),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,remedy=debug,sqlx=warn")),
        )
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 200;
    let mut db_path = String::from("./remedy_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(200);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Remedy Pharmacy Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of medicines to generate (default: 200)");
                println!("  -d, --db <PATH>    Database file path (default: ./remedy_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Remedy Pharmacy Seed Data Generator");
    println!("======================================");
    println!("Database:  {}", db_path);
    println!("Medicines: {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.medicines().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} medicines", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Receiving stock...");

    let start = std::time::Instant::now();
    let mut medicine_ids = Vec::new();
    let mut batches = 0;

    'outer: for (category, manufacturer, names) in CATEGORIES {
        for name in names.iter() {
            for (strength, price_addon) in STRENGTHS {
                if medicine_ids.len() >= count {
                    break 'outer;
                }
                let seed = medicine_ids.len();

                let mut medicine_id = None;
                for lot in 0..(1 + seed % 3) {
                    let delivery = generate_delivery(category, manufacturer, name, strength, *price_addon, seed, lot);
                    match db.batches().stock_in(&delivery).await {
                        Ok(outcome) => {
                            medicine_id = Some(outcome.medicine.id);
                            batches += 1;
                        }
                        Err(e) => eprintln!("Failed to receive {} {}: {}", name, strength, e),
                    }
                }

                if let Some(id) = medicine_id {
                    medicine_ids.push(id);
                }

                if medicine_ids.len() % 50 == 0 {
                    println!("  Received {} medicines...", medicine_ids.len());
                }
            }
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!(
        "✓ Received {} medicines in {} batches in {:?}",
        medicine_ids.len(),
        batches,
        elapsed
    );

    println!();
    println!("Recording sample sales...");

    let mut sales = 0;
    for (seed, chunk) in medicine_ids.chunks(4).enumerate() {
        let items: Vec<CheckoutItem> = chunk
            .iter()
            .take(1 + seed % 3)
            .enumerate()
            .map(|(n, id)| CheckoutItem {
                medicine_id: id.clone(),
                quantity: 1 + ((seed + n) % 5) as i64,
                selling_price_cents: 2_500 + ((seed * 13 + n * 7) % 40) as i64 * 100,
            })
            .collect();

        match db.sales().checkout(&items).await {
            Ok(_) => sales += 1,
            Err(e) => eprintln!("Sample sale {} failed: {}", seed, e),
        }
    }

    println!("✓ Recorded {} sales", sales);
    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Builds one delivery with deterministic but varied numbers.
fn generate_delivery(
    category: &str,
    manufacturer: &str,
    name: &str,
    strength: &str,
    price_addon: i64,
    seed: usize,
    lot: usize,
) -> StockIn {
    let today = Utc::now().date_naive();

    // Retail price: 20.00-99.00 + strength addon
    let price_cents = 2_000 + ((seed * 17) % 80) as i64 * 100 + price_addon;

    // 20-119 units bought at 55-75% of retail
    let quantity = 20 + ((seed * 31 + lot * 7) % 100) as i64;
    let cost_pct = 55 + ((seed + lot) % 21) as i64;
    let purchase_price_cents = (price_cents * cost_pct / 100).max(1) * quantity;

    // -60 to +480 days from today
    let expiry_offset = ((seed * 37 + lot * 113) % 541) as i64 - 60;

    StockIn {
        medicine: NewMedicine {
            name: format!("{} {}", name, strength),
            brand: manufacturer.to_string(),
            description: format!("{} {}", category, strength),
            price_cents,
            image: None,
            category: category.to_string(),
            manufacturer: manufacturer.to_string(),
        },
        batch_number: format!("{}-{:04}-{}", &name.replace(' ', "")[..3].to_uppercase(), seed, lot + 1),
        purchase_price_cents,
        quantity,
        expiry_date: today + Duration::days(expiry_offset),
    }
}
