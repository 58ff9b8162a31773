//! # Commands Module
//!
//! One async function per endpoint. The HTTP router deserializes the
//! request into the command's DTO, calls the command with the shared
//! [`AppState`](crate::state::AppState), and writes back the serialized
//! [`ApiResponse`](crate::response::ApiResponse) or
//! [`ApiError`](crate::error::ApiError) with `ApiError::http_status()`.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs       ◄─── You are here (shared request helpers)
//! ├── medicine.rs  ◄─── Stock-in, catalogue CRUD, batch corrections
//! ├── sale.rs      ◄─── Checkout and sale history
//! ├── stock.rs     ◄─── Availability, expiry, valuation, daily movement
//! └── report.rs    ◄─── Profit summaries and trends
//! ```

pub mod medicine;
pub mod report;
pub mod sale;
pub mod stock;

use chrono::{DateTime, NaiveDate};

use remedy_core::pagination::PageRequest;
use remedy_core::validation::validate_uuid;
use remedy_core::ValidationError;

use crate::error::ApiError;
use crate::state::AppState;

/// Parses `YYYY-MM-DD`, or the date part of an RFC 3339 timestamp.
pub(crate) fn parse_date(field: &str, value: &str) -> Result<NaiveDate, ApiError> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(value).map(|dt| dt.date_naive()))
        .map_err(|_| {
            ValidationError::InvalidFormat {
                field: field.to_string(),
                reason: "expected YYYY-MM-DD".to_string(),
            }
            .into()
        })
}

/// Page request with the configured default limit.
pub(crate) fn page_request(state: &AppState, page: Option<u32>, limit: Option<u32>) -> Result<PageRequest, ApiError> {
    Ok(PageRequest::from_query(page, limit, state.config().default_page_limit)?)
}

/// Rejects ids that cannot name a stored record.
pub(crate) fn check_id(id: &str) -> Result<String, ApiError> {
    validate_uuid(id)?;
    Ok(id.trim().to_string())
}
