//! # Repository Module
//!
//! Database repository implementations for Remedy Pharmacy.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  remedy-api command                                                     │
//! │       │                                                                 │
//! │       │  db.sales().checkout(&items)                                   │
//! │       ▼                                                                 │
//! │  Repositories                                                          │
//! │  ├── MedicineRepository  catalogue CRUD, listing with stock totals     │
//! │  ├── BatchRepository     stock-in, eligible batches, deplete, update   │
//! │  ├── SaleRepository      checkout transaction, sale history            │
//! │  └── ReportRepository    profit, stock flow, expiry, valuation         │
//! │       │                                                                 │
//! │       │  SQL                                                            │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Operations that must share a transaction (stock-in, checkout) are built
//! from `*_in(conn, ..)` helpers taking `&mut SqliteConnection`, so the same
//! SQL runs against the pool or inside an open transaction.

pub mod batch;
pub mod medicine;
pub mod report;
pub mod sale;

use uuid::Uuid;

/// Generates a new entity id.
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Builds a `LIKE` pattern for a case-insensitive substring filter.
///
/// Blank filters become `None` (match everything). `%`, `_` and `\` in the
/// user's text are escaped; queries pair this with `ESCAPE '\'`.
pub(crate) fn like_pattern(value: Option<&str>) -> Option<String> {
    remedy_core::pagination::filter_value(value).map(|v| {
        let escaped = v
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        format!("%{escaped}%")
    })
}
