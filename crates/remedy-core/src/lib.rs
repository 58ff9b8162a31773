//! # remedy-core: Pure Business Logic for Remedy Pharmacy
//!
//! This crate holds the pharmacy's business rules as pure functions with
//! zero I/O dependencies: lot costing, FIFO-by-expiry depletion planning,
//! sale assembly and every report calculation.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Remedy Pharmacy Architecture                        │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 HTTP router (external)                          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 remedy-api commands                             │   │
//! │  │    add_medicine, sell_medicine, profit_summary, expired, ...    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ remedy-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌────────┐ ┌─────────┐  │   │
//! │  │   │  types  │ │  money  │ │ depletion│ │  sale  │ │reporting│  │   │
//! │  │   │Medicine │ │  Money  │ │  FIFO    │ │ totals │ │ profit  │  │   │
//! │  │   │ Batch   │ │ per-unit│ │ planner  │ │        │ │ stock   │  │   │
//! │  │   └─────────┘ └─────────┘ └──────────┘ └────────┘ └─────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 remedy-db (Database Layer)                      │   │
//! │  │       SQLite ledger, checkout transaction, report queries       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Medicine, Batch, Sale, line items)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`ledger`] - Lot costing for stock-in and batch merges
//! - [`depletion`] - FIFO-by-expiry depletion planning
//! - [`sale`] - Sale assembly and profit rollup
//! - [`period`] - Report windows in the pharmacy's local time
//! - [`reporting`] - Profit/loss, availability, expiry and valuation math
//! - [`pagination`] - Page requests and paged results
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Example Usage
//!
//! ```rust
//! use remedy_core::ledger::unit_cost_for_lot;
//! use remedy_core::money::Money;
//!
//! // A lot of 30 strips bought for 1,000.00
//! let unit_cost = unit_cost_for_lot(Money::from_cents(100_000), 30);
//! assert_eq!(unit_cost.cents(), 3333);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod depletion;
pub mod error;
pub mod ledger;
pub mod money;
pub mod pagination;
pub mod period;
pub mod reporting;
pub mod sale;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum line entries allowed in a single checkout request.
pub const MAX_CHECKOUT_ITEMS: usize = 100;

/// Maximum units of one medicine in a single checkout line.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 10000 instead of 100).
pub const MAX_LINE_QUANTITY: i64 = 100_000;

/// Maximum units accepted by a single stock-in.
pub const MAX_STOCK_IN_QUANTITY: i64 = 10_000_000;

/// Maximum price in cents (selling, list or lot purchase price).
///
/// Keeps `price × MAX_LINE_QUANTITY` for every line of a full checkout,
/// and the sale total, well inside `i64`.
pub const MAX_PRICE_CENTS: i64 = 10_000_000_000;

/// Days ahead of today that count as "short expiry".
pub const DEFAULT_SHORT_EXPIRY_DAYS: i64 = 30;

/// Longest short-expiry window a store may configure.
pub const MAX_EXPIRY_WINDOW_DAYS: i64 = 3650;

/// Label used when a medicine has no category.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Label used when a sold or received medicine no longer exists.
pub const UNKNOWN: &str = "Unknown";
