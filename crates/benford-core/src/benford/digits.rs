//! Leading-digit and mantissa extraction.
//!
//! Digits are read from the shortest decimal representation of a value when
//! `rust_decimal` can hold it exactly, so that binary-float noise (0.3 stored
//! as 0.29999...) does not shift a value into the wrong digit group. Values
//! outside that range fall back to the logarithmic formula.

use std::f64::consts::LN_10;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

use crate::types::{DigitGroup, Proportion};

/// Magnitudes in this range round-trip through `Decimal` without losing
/// significant digits.
const DECIMAL_EXACT_MIN: f64 = 1e-12;
const DECIMAL_EXACT_MAX: f64 = 1e15;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// `10^exp` as an integer, `None` on overflow.
pub(crate) fn pow10(exp: u32) -> Option<u64> {
    10u64.checked_pow(exp)
}

/// Smallest and largest digit group for `number_of_digits`.
pub(crate) fn group_bounds(number_of_digits: u32) -> (DigitGroup, DigitGroup) {
    let lo = pow10(number_of_digits.saturating_sub(1)).unwrap_or(u64::MAX);
    let hi = pow10(number_of_digits).map_or(u64::MAX, |p| p - 1);
    (lo, hi)
}

fn decimal_leading_digits(value: Decimal, number_of_digits: u32) -> Option<DigitGroup> {
    let repr = value.abs().normalize().to_string();
    let mut group: DigitGroup = 0;
    let mut taken = 0u32;
    for ch in repr.chars() {
        let Some(d) = ch.to_digit(10) else {
            continue;
        };
        if taken == 0 && d == 0 {
            continue;
        }
        group = group.checked_mul(10)?.checked_add(u64::from(d))?;
        taken += 1;
        if taken == number_of_digits {
            break;
        }
    }
    if taken == 0 {
        return None;
    }
    // Short representations are zero-padded: 7 with k = 3 is group 700.
    group.checked_mul(pow10(number_of_digits - taken)?)
}

fn float_leading_digits(magnitude: f64, number_of_digits: u32) -> DigitGroup {
    let (lo, hi) = group_bounds(number_of_digits);
    let (lo_f, hi_f) = (lo as f64, hi as f64);
    // Subnormals: scaling by a power of ten keeps the leading digits and
    // keeps 10^(e - k + 1) in the normal range.
    let magnitude = if magnitude < 1e-290 {
        magnitude * 1e300
    } else {
        magnitude
    };
    let k = number_of_digits as i32;
    let scale_for = |exponent: i32| 10f64.powi(exponent - k + 1);

    let mut exponent = magnitude.log10().floor() as i32;
    let mut scale = scale_for(exponent);
    // log10 can misplace the exponent by one next to a power of ten. A value
    // that lands outside the group range on both sides sits on 10^e itself.
    if magnitude / scale < lo_f {
        exponent -= 1;
        scale = scale_for(exponent);
        if magnitude / scale >= hi_f + 1.0 {
            return lo;
        }
    } else if magnitude / scale >= hi_f + 1.0 {
        exponent += 1;
        scale = scale_for(exponent);
        if magnitude / scale < lo_f {
            return lo;
        }
    }

    let mut group = (magnitude / scale).floor().clamp(lo_f, hi_f);
    // Keep group * scale <= magnitude < (group + 1) * scale.
    if group * scale > magnitude && group > lo_f {
        group -= 1.0;
    } else if (group + 1.0) * scale <= magnitude && group < hi_f {
        group += 1.0;
    }
    group as DigitGroup
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// First `number_of_digits` significant digits of `|value|` as an integer.
///
/// Returns `None` for zero, NaN and infinities, which have no leading digit.
pub fn leading_digits(value: f64, number_of_digits: u32) -> Option<DigitGroup> {
    let magnitude = value.abs();
    if number_of_digits == 0 || !magnitude.is_finite() || magnitude == 0.0 {
        return None;
    }
    if (DECIMAL_EXACT_MIN..DECIMAL_EXACT_MAX).contains(&magnitude) {
        if let Some(group) = Decimal::from_f64(magnitude)
            .filter(|d| !d.is_zero())
            .and_then(|d| decimal_leading_digits(d, number_of_digits))
        {
            return Some(group);
        }
    }
    Some(float_leading_digits(magnitude, number_of_digits))
}

/// Fractional part of `log10(|value|)`, in `[0, 1)`.
pub fn mantissa(value: f64) -> Option<f64> {
    let magnitude = value.abs();
    if !magnitude.is_finite() || magnitude == 0.0 {
        return None;
    }
    let log = magnitude.log10();
    let m = log - log.floor();
    Some(if m >= 1.0 { 0.0 } else { m })
}

/// Benford probability of a leading digit sequence: `log10(1 + 1/d)`.
pub fn p_these_digits(digits: DigitGroup) -> Option<Proportion> {
    if digits == 0 {
        return None;
    }
    Some((1.0 / digits as f64).ln_1p() / LN_10)
}

/// Last position summed exactly. From position 8 on every digit is within
/// 2e-8 of 0.1, while the exact sum needs 9 * 10^(position - 2) terms.
pub const MAX_EXACT_POSITION: u32 = 7;

/// Probability that `digit` appears at significant position `position`
/// (1-based). The first position cannot hold a zero.
///
/// Positions past [`MAX_EXACT_POSITION`] return the uniform limit 0.1.
pub fn p_this_digit_at_n(digit: u32, position: u32) -> Option<Proportion> {
    if digit > 9 || position == 0 {
        return None;
    }
    if position == 1 {
        return p_these_digits(u64::from(digit));
    }
    if position > MAX_EXACT_POSITION {
        return Some(0.1);
    }
    let start = pow10(position - 2)?;
    let end = pow10(position - 1)?;
    let d = u64::from(digit);
    let mut total = 0.0;
    for prefix in start..end {
        total += p_these_digits(prefix * 10 + d)?;
    }
    Some(total)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() < eps
    }

    #[test]
    fn test_first_digit_integers() {
        assert_eq!(leading_digits(100.0, 1), Some(1));
        assert_eq!(leading_digits(999.0, 1), Some(9));
        assert_eq!(leading_digits(250.0, 1), Some(2));
    }

    #[test]
    fn test_two_digits() {
        assert_eq!(leading_digits(4_231.7, 2), Some(42));
        assert_eq!(leading_digits(10.0, 2), Some(10));
        assert_eq!(leading_digits(99.99, 2), Some(99));
    }

    #[test]
    fn test_short_values_are_padded() {
        assert_eq!(leading_digits(7.0, 3), Some(700));
        assert_eq!(leading_digits(1.5, 2), Some(15));
    }

    #[test]
    fn test_decimal_amounts() {
        use rust_decimal::prelude::ToPrimitive;
        use rust_decimal_macros::dec;

        for (amount, expected) in [(dec!(0.0304), 30), (dec!(1999.99), 19), (dec!(0.7), 70)] {
            let v = amount.to_f64().unwrap();
            assert_eq!(leading_digits(v, 2), Some(expected), "{amount}");
        }
    }

    #[test]
    fn test_fractional_values() {
        assert_eq!(leading_digits(0.3, 1), Some(3));
        assert_eq!(leading_digits(0.0042, 2), Some(42));
        assert_eq!(leading_digits(0.000_123, 3), Some(123));
    }

    #[test]
    fn test_sign_is_ignored() {
        assert_eq!(leading_digits(-512.0, 2), Some(51));
    }

    #[test]
    fn test_no_leading_digit() {
        assert_eq!(leading_digits(0.0, 1), None);
        assert_eq!(leading_digits(f64::NAN, 1), None);
        assert_eq!(leading_digits(f64::INFINITY, 1), None);
        assert_eq!(leading_digits(5.0, 0), None);
    }

    #[test]
    fn test_float_path_large_values() {
        assert_eq!(leading_digits(3.7e20, 2), Some(37));
        assert_eq!(leading_digits(1e30, 1), Some(1));
    }

    #[test]
    fn test_float_path_tiny_values() {
        assert_eq!(leading_digits(4.56e-20, 2), Some(45));
        assert_eq!(leading_digits(7.2e-310, 1), Some(7));
    }

    #[test]
    fn test_float_path_digit_boundaries() {
        assert_eq!(leading_digits(1.9999999999995e20, 1), Some(1));
        assert_eq!(leading_digits(2.0000000000005e20, 1), Some(2));
        assert_eq!(leading_digits(2.9999999999997e-15, 1), Some(2));
        assert_eq!(leading_digits(3.0000000000003e-15, 1), Some(3));
        assert_eq!(leading_digits(9.9999999999e21, 2), Some(99));
        assert_eq!(leading_digits(1e22, 1), Some(1));
        assert_eq!(leading_digits(1e22, 3), Some(100));
    }

    #[test]
    fn test_mantissa_range() {
        assert!(approx_eq(mantissa(100.0).unwrap(), 0.0, 1e-12));
        assert!(approx_eq(mantissa(200.0).unwrap(), 2f64.log10(), 1e-12));
        assert!(approx_eq(mantissa(-0.5).unwrap(), 5f64.log10(), 1e-12));
        assert_eq!(mantissa(0.0), None);
    }

    #[test]
    fn test_p_these_digits() {
        assert!(approx_eq(p_these_digits(1).unwrap(), 0.30103, 1e-5));
        assert!(approx_eq(p_these_digits(9).unwrap(), 0.04576, 1e-5));
        assert_eq!(p_these_digits(0), None);
    }

    #[test]
    fn test_second_position_distribution() {
        let total: f64 = (0..=9).map(|d| p_this_digit_at_n(d, 2).unwrap()).sum();
        assert!(approx_eq(total, 1.0, 1e-9));
        assert!(approx_eq(p_this_digit_at_n(0, 2).unwrap(), 0.11968, 1e-5));
    }

    #[test]
    fn test_far_positions_are_uniform() {
        let exact = p_this_digit_at_n(0, MAX_EXACT_POSITION).unwrap();
        assert!(approx_eq(exact, 0.1, 1e-6));
        assert_eq!(p_this_digit_at_n(0, MAX_EXACT_POSITION + 1), Some(0.1));
        assert_eq!(p_this_digit_at_n(9, 25), Some(0.1));
        assert_eq!(p_this_digit_at_n(3, u32::MAX), Some(0.1));
    }

    #[test]
    fn test_first_position_rejects_zero() {
        assert_eq!(p_this_digit_at_n(0, 1), None);
        assert_eq!(p_this_digit_at_n(10, 2), None);
    }
}
