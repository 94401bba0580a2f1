//! Whole-unit money.
//!
//! Menu prices, discounts and bill totals are whole currency units; nothing
//! in a restaurant bill here carries paise or cents. Tax is the one place a
//! fraction appears, and [`crate::billing`] rounds it back to whole units
//! once, when the bill is generated.
//!
//! ```rust
//! use dine_core::money::Money;
//!
//! let price = Money::from_units(100);
//! let line_total = price.multiply_quantity(2);
//! assert_eq!(line_total.units(), 200);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

/// A monetary amount in whole currency units.
///
/// Newtype over `i64`, so it serializes as a bare integer: `"subtotal": 240`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from whole currency units.
    #[inline]
    pub const fn from_units(units: i64) -> Self {
        Money(units)
    }

    /// Returns the value in whole currency units.
    #[inline]
    pub const fn units(&self) -> i64 {
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

    /// Multiplies a unit price by a quantity, saturating at the `i64` bounds.
    ///
    /// ## Example
    /// ```rust
    /// use dine_core::money::Money;
    ///
    /// let unit_price = Money::from_units(40);
    /// assert_eq!(unit_price.multiply_quantity(3).units(), 120);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// `None` instead of overflowing.
    #[inline]
    pub const fn checked_multiply_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(units) => Some(Money(units)),
            None => None,
        }
    }

    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(units) => Some(Money(units)),
            None => None,
        }
    }

    /// Clamps negative amounts to zero.
    #[inline]
    pub const fn non_negative(self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            self
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arithmetic() {
        let a = Money::from_units(1000);
        let b = Money::from_units(500);

        assert_eq!((a + b).units(), 1500);
        assert_eq!((a - b).units(), 500);
        assert_eq!((a * 3).units(), 3000);
    }

    #[test]
    fn test_sum_of_line_totals() {
        let total: Money = [Money::from_units(200), Money::from_units(40)]
            .into_iter()
            .sum();
        assert_eq!(total.units(), 240);
    }

    #[test]
    fn test_checked_arithmetic_reports_overflow() {
        let huge = Money::from_units(i64::MAX / 2);
        assert_eq!(huge.checked_multiply_quantity(3), None);
        assert_eq!(huge.checked_add(huge).map(|m| m.units()), Some(i64::MAX - 1));
        assert_eq!(huge.checked_add(Money::from_units(i64::MAX)), None);
        assert_eq!(
            Money::from_units(40).checked_multiply_quantity(3),
            Some(Money::from_units(120))
        );
    }

    #[test]
    fn test_non_negative_clamp() {
        assert_eq!(Money::from_units(-5).non_negative(), Money::zero());
        assert_eq!(Money::from_units(5).non_negative().units(), 5);
    }

    #[test]
    fn test_serializes_as_bare_integer() {
        let json = serde_json::to_string(&Money::from_units(240)).unwrap();
        assert_eq!(json, "240");
    }
}
