//! # Error Types
//!
//! Domain-specific error types for remedy-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  remedy-core errors (this file)                                        │
//! │  ├── CoreError        - Domain failures (stock, missing records)       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  remedy-db errors (separate crate)                                     │
//! │  └── DbError          - Storage failures, wraps CoreError              │
//! │                                                                         │
//! │  remedy-api errors (app)                                               │
//! │  └── ApiError         - What the HTTP client sees (serialized)         │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Medicine id does not exist (or was deleted).
    #[error("Medicine not found: {0}")]
    MedicineNotFound(String),

    /// Batch id does not exist.
    #[error("Batch not found: {0}")]
    BatchNotFound(String),

    /// Sale id does not exist.
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// Not enough sale-eligible stock to cover a request.
    ///
    /// ## User Workflow
    /// ```text
    /// Checkout: Panadol × 12
    ///      │
    ///      ▼
    /// Eligible batches: [5, 4]  → available = 9
    ///      │
    ///      ▼
    /// InsufficientStock { medicine: "Panadol", available: 9, requested: 12 }
    ///      │
    ///      ▼
    /// No batch is touched, no sale is written
    /// ```
    #[error("Insufficient stock for {medicine}: available {available}, requested {requested}")]
    InsufficientStock {
        medicine: String,
        available: i64,
        requested: i64,
    },

    /// Checkout has more lines than allowed.
    #[error("Checkout cannot have more than {max} items")]
    CheckoutTooLarge { max: usize },

    /// A report window could not be built (e.g. month 13).
    #[error("Invalid report period: {reason}")]
    InvalidPeriod { reason: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// True for the "record does not exist" family of errors.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CoreError::MedicineNotFound(_) | CoreError::BatchNotFound(_) | CoreError::SaleNotFound(_)
        )
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any mutation so a rejected request never leaves a trace.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            medicine: "Panadol".to_string(),
            available: 9,
            requested: 12,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Panadol: available 9, requested 12"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "batchNumber".to_string(),
        };
        assert_eq!(err.to_string(), "batchNumber is required");

        let err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        assert_eq!(err.to_string(), "quantity must be positive");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "name".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert!(!core_err.is_not_found());
    }

    #[test]
    fn test_not_found_family() {
        assert!(CoreError::MedicineNotFound("m".into()).is_not_found());
        assert!(CoreError::BatchNotFound("b".into()).is_not_found());
        assert!(CoreError::SaleNotFound("s".into()).is_not_found());
    }
}
