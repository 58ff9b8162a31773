//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Lot of 3 bought for 10.00, unit cost in floats: 3.3333333333333335     │
//! │  Profit sums drift every time that number is multiplied and added.     │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units                                      │
//! │    Unit cost is rounded ONCE when it is derived from the lot price:    │
//! │    1000 / 3 = 333 (half away from zero)                                │
//! │    Every profit after that is exact integer arithmetic.                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use remedy_core::money::Money;
//!
//! let selling = Money::from_cents(1500);
//! let cost = Money::from_cents(1000);
//! let profit = (selling - cost) * 4_i64;
//! assert_eq!(profit.cents(), 2000);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit ("cents").
///
/// ## Design Decisions
/// - **i64 (signed)**: Losses are negative profit
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Serialized as the bare integer**: `1099`, never `10.99`
///
/// ## Where Money Flows
/// ```text
/// Batch.purchase_price_cents ──► unit_cost_for_lot() ──► Batch.unit_cost_cents
///                                                              │
/// CheckoutItem.selling_price_cents ─────────────┐              │
///                                               ▼              ▼
///                                   (selling - unit_cost) × quantity
///                                               │
///                                               ▼
///                            SaleLineItem.profit_cents ──► Sale.total_profit
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use remedy_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units.
    ///
    /// For negative amounts, only the major unit should be negative:
    /// `from_major_minor(-5, 50)` is -5.50.
    ///
    /// ## Example
    /// ```rust
    /// use remedy_core::money::Money;
    ///
    /// assert_eq!(Money::from_major_minor(10, 99).cents(), 1099);
    /// assert_eq!(Money::from_major_minor(-5, 50).cents(), -550);
    /// ```
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use remedy_core::money::Money;
    ///
    /// let unit_cost = Money::from_cents(299);
    /// assert_eq!(unit_cost.multiply_quantity(3).cents(), 897);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Adds two values, returning `None` on overflow.
    #[inline]
    pub const fn checked_add(self, other: Money) -> Option<Money> {
        match self.0.checked_add(other.0) {
            Some(v) => Some(Money(v)),
            None => None,
        }
    }

    /// Splits the amount evenly over `units`, rounding half away from zero.
    ///
    /// Returns `None` when `units` is not positive.
    ///
    /// ## Example
    /// ```rust
    /// use remedy_core::money::Money;
    ///
    /// // 10.00 over 3 units = 3.333.. → 3.33
    /// assert_eq!(Money::from_cents(1000).per_unit(3), Some(Money::from_cents(333)));
    /// // 10.00 over 6 units = 1.666.. → 1.67
    /// assert_eq!(Money::from_cents(1000).per_unit(6), Some(Money::from_cents(167)));
    /// assert_eq!(Money::from_cents(1000).per_unit(0), None);
    /// ```
    pub fn per_unit(&self, units: i64) -> Option<Money> {
        if units <= 0 {
            return None;
        }
        Some(Money(div_round_half_away(self.0 as i128, units as i128)))
    }

    /// Scales the amount by `numerator / denominator`, rounding down.
    ///
    /// Used for ratio estimates such as "value of the share still on hand".
    /// A non-positive denominator yields zero.
    ///
    /// ## Example
    /// ```rust
    /// use remedy_core::money::Money;
    ///
    /// // 70 of 100 units remain: 999.99 × 0.7 = 699.993 → 699.99
    /// let value = Money::from_cents(99_999).scale_floor(70, 100);
    /// assert_eq!(value.cents(), 69_999);
    /// ```
    pub fn scale_floor(&self, numerator: i64, denominator: i64) -> Money {
        if denominator <= 0 {
            return Money::zero();
        }
        let scaled = (self.0 as i128 * numerator as i128).div_euclid(denominator as i128);
        Money(scaled.clamp(i64::MIN as i128, i64::MAX as i128) as i64)
    }
}

/// Integer division rounding half away from zero.
///
/// `divisor` must be positive.
pub(crate) fn div_round_half_away(dividend: i128, divisor: i128) -> i64 {
    let half = divisor / 2;
    let rounded = if dividend >= 0 {
        (dividend + half) / divisor
    } else {
        (dividend - half) / divisor
    };
    rounded.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Shows money as `12.50` / `-5.50`. Currency symbols belong to the client.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor_part())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

/// Multiplication by a unit count.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
