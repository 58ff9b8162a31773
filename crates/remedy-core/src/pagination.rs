//! # Pagination & Filters
//!
//! Page requests, paged results and the case-insensitive substring filters
//! used by the medicine, sales and expiry listings.
//!
//! ```text
//! 25 items, limit 10
//!   page 1 → items  1-10 ┐
//!   page 2 → items 11-20 ├─ total_pages = ceil(25 / 10) = 3
//!   page 3 → items 21-25 ┘
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::validation::ValidationResult;

/// Default page size for listings.
pub const DEFAULT_PAGE_LIMIT: u32 = 10;

/// Largest page size a caller may ask for.
pub const MAX_PAGE_LIMIT: u32 = 100;

// =============================================================================
// Page Request
// =============================================================================

/// A 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl PageRequest {
    /// Builds a request, rejecting page 0 and limits outside 1-100.
    pub fn new(page: u32, limit: u32) -> ValidationResult<Self> {
        if page == 0 {
            return Err(ValidationError::MustBePositive {
                field: "page".to_string(),
            });
        }
        if limit == 0 || limit > MAX_PAGE_LIMIT {
            return Err(ValidationError::OutOfRange {
                field: "limit".to_string(),
                min: 1,
                max: i64::from(MAX_PAGE_LIMIT),
            });
        }
        Ok(PageRequest { page, limit })
    }

    /// Builds a request from optional query values, falling back to
    /// page 1 and `default_limit`.
    pub fn from_query(
        page: Option<u32>,
        limit: Option<u32>,
        default_limit: u32,
    ) -> ValidationResult<Self> {
        PageRequest::new(page.unwrap_or(1), limit.unwrap_or(default_limit))
    }

    /// Rows to skip.
    #[inline]
    pub fn offset(&self) -> i64 {
        (i64::from(self.page) - 1) * i64::from(self.limit)
    }

    #[inline]
    pub fn limit(&self) -> i64 {
        i64::from(self.limit)
    }
}

/// `ceil(total / limit)`, zero when there is nothing to show.
pub fn total_pages(total: i64, limit: u32) -> i64 {
    if total <= 0 || limit == 0 {
        return 0;
    }
    let limit = i64::from(limit);
    (total + limit - 1) / limit
}

// =============================================================================
// Page
// =============================================================================

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    /// Wraps a page already cut by the storage layer.
    pub fn new(items: Vec<T>, request: PageRequest, total: i64) -> Self {
        Page {
            items,
            page: request.page,
            limit: request.limit,
            total,
            total_pages: total_pages(total, request.limit),
        }
    }

    /// Cuts a page out of a fully materialized list.
    pub fn from_vec(all: Vec<T>, request: PageRequest) -> Self {
        let total = all.len() as i64;
        let items = all
            .into_iter()
            .skip(request.offset() as usize)
            .take(request.limit as usize)
            .collect();
        Page::new(items, request, total)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            limit: self.limit,
            total: self.total,
            total_pages: self.total_pages,
        }
    }
}

// =============================================================================
// Filters
// =============================================================================

/// Normalizes an optional filter value: trimmed, `None` when blank.
pub fn filter_value(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Case-insensitive substring match. A missing needle matches everything.
pub fn matches_filter(haystack: &str, needle: Option<&str>) -> bool {
    match needle {
        None => true,
        Some(n) => haystack.to_lowercase().contains(&n.to_lowercase()),
    }
}

/// Filters for the medicine catalogue listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicineFilter {
    pub name: Option<String>,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
}

/// Filters for the sales listing, matched against line items.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleFilter {
    pub name: Option<String>,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub batch_number: Option<String>,
}

/// Filters for the short-expiry and expired listings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiryFilter {
    pub name: Option<String>,
    pub category: Option<String>,
}

impl ExpiryFilter {
    pub fn matches(&self, name: &str, category: &str) -> bool {
        matches_filter(name, self.name.as_deref()) && matches_filter(category, self.category.as_deref())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
