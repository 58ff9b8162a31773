//! # remedy-db: Database Layer for Remedy Pharmacy
//!
//! SQLite storage for the pharmacy's catalogue, batch ledger and sale
//! history, using sqlx for async access.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Remedy Data Flow                                 │
//! │                                                                         │
//! │  remedy-api command (sell_medicine)                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    remedy-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ MedicineRepo  │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ BatchRepo     │    │ 001_initial  │  │   │
//! │  │   │ WAL, FKs on   │    │ SaleRepo      │    │   _schema    │  │   │
//! │  │   │               │    │ ReportRepo    │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (remedy.db)                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Medicines, batches, sales and reports
//!
//! ## Usage
//!
//! ```rust,ignore
//! use remedy_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("remedy.db")).await?;
//!
//! let outcome = db.batches().stock_in(&delivery).await?;
//! let sale = db.sales().checkout(&items).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::batch::BatchRepository;
pub use repository::medicine::MedicineRepository;
pub use repository::report::{DailyStockMovement, HourlyProfitReport, ReportRepository};
pub use repository::sale::SaleRepository;
