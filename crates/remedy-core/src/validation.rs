//! # Validation Module
//!
//! Business rule validation for Remedy Pharmacy inputs.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Request decoding (remedy-api)                                │
//! │  ├── Type validation (serde deserialization)                           │
//! │  └── Query parameter parsing                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                   │
//! │  ├── Required fields, lengths                                          │
//! │  └── Positive quantities and prices, checkout size                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (quantity >= 0)                                             │
//! │  ├── UNIQUE (name, brand)                                              │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every validator runs before any write, so a rejected request leaves the
//! ledger untouched.
//!
//! ## Usage
//! ```rust
//! use remedy_core::validation::{validate_stock_quantity, validate_medicine_name};
//!
//! validate_medicine_name("Panadol 500mg").unwrap();
//! assert!(validate_stock_quantity(0).is_err());
//! ```

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::{BatchUpdate, CheckoutItem, NewMedicine, StockIn};
use crate::{MAX_CHECKOUT_ITEMS, MAX_LINE_QUANTITY, MAX_PRICE_CENTS, MAX_STOCK_IN_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_NAME_LEN: usize = 200;
const MAX_TEXT_LEN: usize = 100;
const MAX_DESCRIPTION_LEN: usize = 2000;
const MAX_BATCH_NUMBER_LEN: usize = 64;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a required text field: non-blank and at most `max` characters.
pub fn validate_required(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates a medicine name.
///
/// ## Example
/// ```rust
/// use remedy_core::validation::validate_medicine_name;
///
/// assert!(validate_medicine_name("Amoxil 250mg").is_ok());
/// assert!(validate_medicine_name("  ").is_err());
/// ```
pub fn validate_medicine_name(name: &str) -> ValidationResult<()> {
    validate_required("name", name, MAX_NAME_LEN)
}

fn validate_optional(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    if value.trim().chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }
    Ok(())
}

/// Validates the medicine fields of a stock-in or an edit.
///
/// Name and brand form the natural key and are required. Category may be
/// blank (reported as "Uncategorized").
pub fn validate_new_medicine(medicine: &NewMedicine) -> ValidationResult<()> {
    validate_medicine_name(&medicine.name)?;
    validate_required("brand", &medicine.brand, MAX_TEXT_LEN)?;
    validate_optional("category", &medicine.category, MAX_TEXT_LEN)?;
    validate_optional("manufacturer", &medicine.manufacturer, MAX_TEXT_LEN)?;
    validate_optional("description", &medicine.description, MAX_DESCRIPTION_LEN)?;
    validate_price_cents(medicine.price_cents)?;
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a price in cents against `0..=MAX_PRICE_CENTS`.
fn validate_price_range(field: &str, cents: i64) -> ValidationResult<()> {
    if !(0..=MAX_PRICE_CENTS).contains(&cents) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }

    Ok(())
}

/// Validates a price in cents. Zero is allowed.
///
/// ## Example
/// ```rust
/// use remedy_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(0).is_ok());
/// assert!(validate_price_cents(-100).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    validate_price_range("price", cents)
}

/// Validates a lot purchase price. Must be positive.
pub fn validate_purchase_price(cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "purchasePrice".to_string(),
        });
    }

    validate_price_range("purchasePrice", cents)
}

/// Validates a stock-in quantity.
///
/// ## Rules
/// - Must be positive (a zero quantity has no unit cost)
/// - Must not exceed MAX_STOCK_IN_QUANTITY
pub fn validate_stock_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_STOCK_IN_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_STOCK_IN_QUANTITY,
        });
    }

    Ok(())
}

fn validate_batch_number(batch_number: &str) -> ValidationResult<()> {
    validate_required("batchNumber", batch_number, MAX_BATCH_NUMBER_LEN)
}

/// Validates a full stock-in request.
pub fn validate_stock_in(stock_in: &StockIn) -> ValidationResult<()> {
    validate_new_medicine(&stock_in.medicine)?;
    validate_batch_number(&stock_in.batch_number)?;
    validate_purchase_price(stock_in.purchase_price_cents)?;
    validate_stock_quantity(stock_in.quantity)?;
    Ok(())
}

/// Validates an admin batch correction. Quantity may drop to zero.
pub fn validate_batch_update(update: &BatchUpdate) -> ValidationResult<()> {
    validate_batch_number(&update.batch_number)?;
    validate_purchase_price(update.purchase_price_cents)?;

    if update.quantity < 0 || update.quantity > MAX_STOCK_IN_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 0,
            max: MAX_STOCK_IN_QUANTITY,
        });
    }

    Ok(())
}

// =============================================================================
// Checkout
// =============================================================================

/// Validates a checkout request.
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Checkout: [Panadol × 7 @ 15.00, Amoxil × 2 @ 40.00]                    │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_checkout() ← THIS FUNCTION                                    │
/// │       │                                                                 │
/// │       ├── empty?           → Required("items")                          │
/// │       ├── > 100 lines?     → CheckoutTooLarge                           │
/// │       ├── quantity <= 0?   → MustBePositive("quantity")                 │
/// │       ├── bad price?       → OutOfRange("sellingPrice")                 │
/// │       │                                                                 │
/// │       └── OK → open the checkout transaction                           │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_checkout(items: &[CheckoutItem]) -> CoreResult<()> {
    if items.is_empty() {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        }
        .into());
    }

    if items.len() > MAX_CHECKOUT_ITEMS {
        return Err(CoreError::CheckoutTooLarge {
            max: MAX_CHECKOUT_ITEMS,
        });
    }

    for item in items {
        validate_required("medicineId", &item.medicine_id, 64)?;

        if item.quantity <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "quantity".to_string(),
            }
            .into());
        }
        if item.quantity > MAX_LINE_QUANTITY {
            return Err(ValidationError::OutOfRange {
                field: "quantity".to_string(),
                min: 1,
                max: MAX_LINE_QUANTITY,
            }
            .into());
        }
        validate_price_range("sellingPrice", item.selling_price_cents)?;
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string.
///
/// ## Example
/// ```rust
/// use remedy_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id.trim()).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
