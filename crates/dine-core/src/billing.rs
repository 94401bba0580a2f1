//! # Billing Calculator
//!
//! Derives the payable total of a bill from its subtotal, an absolute
//! discount and a tax rate.
//!
//! ```text
//! taxable = subtotal - discount
//! total   = round(taxable + taxable × rate)
//! tax     = total - taxable
//! ```
//!
//! Rounding is half-up to the nearest whole unit and happens exactly once,
//! on the total, so `taxable + tax == total` always holds.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::TaxRate;

/// Basis points in 100%.
const BPS_SCALE: i128 = 10_000;

/// The figures fixed on an order when its bill is generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BillTotals {
    pub subtotal: Money,
    pub discount: Money,
    pub taxable: Money,
    pub tax_amount: Money,
    pub total: Money,
}

/// Computes discount, tax and total for a bill.
///
/// The caller validates `0 <= discount <= subtotal`; a discount larger than
/// the subtotal is clamped so the total is never negative.
///
/// ## Example
/// ```rust
/// use dine_core::billing::compute_bill;
/// use dine_core::money::Money;
/// use dine_core::types::TaxRate;
///
/// let bill = compute_bill(Money::from_units(240), Money::from_units(40), TaxRate::from_bps(1000));
/// assert_eq!(bill.tax_amount.units(), 20);
/// assert_eq!(bill.total.units(), 220);
/// ```
pub fn compute_bill(subtotal: Money, discount: Money, tax_rate: TaxRate) -> BillTotals {
    let taxable = (subtotal - discount).non_negative();
    let bps = i128::from(tax_rate.bps());

    let scaled = i128::from(taxable.units()) * (BPS_SCALE + bps);
    let rounded = (scaled + BPS_SCALE / 2) / BPS_SCALE;
    // Subtotals are capped at MAX_ORDER_SUBTOTAL, so this only saturates on
    // hand-built inputs
    let total = Money::from_units(i64::try_from(rounded).unwrap_or(i64::MAX));

    BillTotals {
        subtotal,
        discount,
        taxable,
        tax_amount: total - taxable,
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bill(subtotal: i64, discount: i64, bps: u32) -> BillTotals {
        compute_bill(
            Money::from_units(subtotal),
            Money::from_units(discount),
            TaxRate::from_bps(bps),
        )
    }

    #[test]
    fn test_discount_then_tax() {
        let b = bill(240, 40, 1000);
        assert_eq!(b.taxable.units(), 200);
        assert_eq!(b.tax_amount.units(), 20);
        assert_eq!(b.total.units(), 220);
    }

    #[test]
    fn test_no_discount_no_tax() {
        let b = bill(240, 0, 0);
        assert_eq!(b.total.units(), 240);
        assert!(b.tax_amount.is_zero());
    }

    #[test]
    fn test_rounds_half_up() {
        // 105 × 5% = 5.25 → 110.25 → 110
        assert_eq!(bill(105, 0, 500).total.units(), 110);
        // 150 × 5% = 7.5 → 157.5 → 158
        assert_eq!(bill(150, 0, 500).total.units(), 158);
        // 99 × 2.5% = 2.475 → 101.475 → 101
        assert_eq!(bill(99, 0, 250).total.units(), 101);
    }

    #[test]
    fn test_full_discount() {
        let b = bill(240, 240, 1800);
        assert!(b.total.is_zero());
        assert!(b.tax_amount.is_zero());
    }

    #[test]
    fn test_oversized_discount_never_negative() {
        let b = bill(100, 150, 1000);
        assert!(b.total.is_zero());
        assert!(!b.tax_amount.is_negative());
    }

    #[test]
    fn test_largest_subtotal_at_full_tax() {
        let b = bill(crate::MAX_ORDER_SUBTOTAL, 0, 10_000);
        assert_eq!(b.total.units(), crate::MAX_ORDER_SUBTOTAL * 2);
        assert_eq!(b.taxable + b.tax_amount, b.total);
    }

    #[test]
    fn test_parts_add_up() {
        for (subtotal, discount, bps) in [(999, 13, 1800), (1, 0, 500), (12345, 345, 1250)] {
            let b = bill(subtotal, discount, bps);
            assert_eq!(b.taxable + b.tax_amount, b.total);
        }
    }
}
