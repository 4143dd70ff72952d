//! # Money Module
//!
//! Provides the `Money` type for rounded monetary values.
//!
//! ## Two Representations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  FULL PRECISION (Decimal)              ROUNDED (Money, integer cents)  │
//! │                                                                         │
//! │  subtotal × 12.5% = 2.34375     ───►   234 cents  ($2.34)              │
//! │  2.34375 × 0.11   = 0.2578125   ───►    26 cents  ($0.26)              │
//! │                                                                         │
//! │  Every pricing step works on Decimal so rounding error never           │
//! │  compounds. Money only appears at the display/submission boundary.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use rust_decimal::Decimal;
//! use storefront_core::money::Money;
//!
//! let taxable = Money::from_cents(2000) - Money::from_cents(300);
//! assert_eq!(taxable.to_string(), "$17.00");
//!
//! // Rounding is half away from zero: 2.345 → 2.35
//! let rounded = Money::from_decimal(Decimal::new(2345, 3)).unwrap();
//! assert_eq!(rounded.cents(), 235);
//! ```

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};

/// Number of fractional digits kept when an amount is rounded for display.
pub const CURRENCY_DECIMAL_PLACES: u32 = 2;

/// Rounds a full-precision amount to currency precision.
///
/// Uses half-away-from-zero: `0.125 → 0.13`, `-0.125 → -0.13`.
#[inline]
pub fn round_currency(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(
        CURRENCY_DECIMAL_PLACES,
        RoundingStrategy::MidpointAwayFromZero,
    )
}

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value rounded to the smallest currency unit (cents).
///
/// Serializes as a bare integer number of cents, so submission payloads
/// never carry floats. Signed, because a displayed discount row is negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// ## Example
    /// ```rust
    /// use storefront_core::money::Money;
    ///
    /// let shipping = Money::from_cents(750);
    /// assert_eq!(shipping.to_string(), "$7.50");
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Rounds a full-precision amount to cents.
    ///
    /// ## Errors
    /// `CoreError::AmountOverflow` if the rounded amount doesn't fit in i64 cents.
    pub fn from_decimal(amount: Decimal) -> CoreResult<Self> {
        round_currency(amount)
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|cents| cents.to_i64())
            .map(Money)
            .ok_or_else(|| CoreError::AmountOverflow(amount.to_string()))
    }

    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// `None` instead of wrapping past the `i64` range.
    #[inline]
    pub const fn checked_add(self, other: Money) -> Option<Money> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Magnitude of the amount. `i64::MIN` cents saturates to `i64::MAX`.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.saturating_abs())
    }

    /// Absolute difference, used to compare a claimed amount with a computed one.
    ///
    /// Defined for any pair of amounts; a gap wider than `i64::MAX` cents
    /// saturates.
    #[inline]
    pub fn distance(&self, other: Money) -> Money {
        let gap = self.0.abs_diff(other.0);
        Money(i64::try_from(gap).unwrap_or(i64::MAX))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Renders `$X.XX`, the format the order and quotation summaries show.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let magnitude = self.0.unsigned_abs();
        if self.0 < 0 {
            f.write_str("-")?;
        }
        write!(f, "${}.{:02}", magnitude / 100, magnitude % 100)
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Money(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(2220).to_string(), "$22.20");
        assert_eq!(Money::from_cents(8500).to_string(), "$85.00");
        assert_eq!(Money::from_cents(0).to_string(), "$0.00");
        assert_eq!(Money::from_cents(-1500).to_string(), "-$15.00");
        assert_eq!(Money::from_cents(-7).to_string(), "-$0.07");
        assert_eq!(Money::from_cents(i64::MIN).to_string(), "-$92233720368547758.08");
    }

    #[test]
    fn test_rounding_is_half_away_from_zero() {
        assert_eq!(Money::from_decimal(dec!(0.125)).unwrap().cents(), 13);
        assert_eq!(Money::from_decimal(dec!(0.135)).unwrap().cents(), 14);
        assert_eq!(Money::from_decimal(dec!(-0.125)).unwrap().cents(), -13);
        assert_eq!(Money::from_decimal(dec!(2.344999)).unwrap().cents(), 234);
        assert_eq!(Money::from_decimal(dec!(22.2)).unwrap().cents(), 2220);
    }

    #[test]
    fn test_overflow_is_reported() {
        let result = Money::from_decimal(Decimal::MAX);
        assert!(matches!(result, Err(CoreError::AmountOverflow(_))));
    }

    #[test]
    fn test_totals_arithmetic() {
        let subtotal = Money::from_cents(2000);
        let discount = Money::from_cents(300);
        let tax = Money::from_cents(187);

        let taxable = subtotal - discount;
        assert_eq!(taxable + tax, Money::from_cents(1887));
        assert_eq!(-discount, Money::from_cents(-300));

        let lines: Money = [Money::from_cents(1250), Money::from_cents(750)]
            .into_iter()
            .sum();
        assert_eq!(lines, subtotal);

        let mut running = Money::zero();
        running += subtotal;
        running -= discount;
        assert_eq!(running, taxable);
    }

    #[test]
    fn test_distance() {
        let claimed = Money::from_cents(4399);
        let computed = Money::from_cents(4400);
        assert_eq!(claimed.distance(computed), Money::from_cents(1));
        assert_eq!(computed.distance(claimed), Money::from_cents(1));
        assert!(Money::from_cents(-100).is_negative());
        assert!(Money::default().is_zero());
    }

    #[test]
    fn test_distance_at_the_extremes() {
        let computed = Money::from_cents(4400);
        assert_eq!(
            Money::from_cents(i64::MIN).distance(computed),
            Money::from_cents(i64::MAX)
        );
        assert_eq!(
            Money::from_cents(i64::MAX).distance(Money::from_cents(i64::MIN)),
            Money::from_cents(i64::MAX)
        );
        assert_eq!(
            Money::from_cents(i64::MAX).distance(computed),
            Money::from_cents(i64::MAX - 4400)
        );
        assert_eq!(Money::from_cents(i64::MIN).abs(), Money::from_cents(i64::MAX));
        assert_eq!(Money::from_cents(i64::MAX).checked_add(Money::from_cents(1)), None);
    }
}
