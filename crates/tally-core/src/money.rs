//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Summing report totals in floating point:                               │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ depends on iteration order       │
//! │                                                                         │
//! │  OUR SOLUTION: Integer hundredths                                       │
//! │    Every wire value is converted ONCE, at the edge, into i64            │
//! │    hundredths. Sums are then exact and order independent.               │
//! │                                                                         │
//! │  Splitting 100.00 across 3 payments:                                   │
//! │    33.33 + 33.33 + 33.34 = 100.00 (remainder goes to the last share)   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tally_core::money::Money;
//!
//! // From hundredths (preferred)
//! let price = Money::from_cents(150_000_00);
//!
//! // From a backend decimal string
//! let subtotal = Money::parse_decimal("150000.00").unwrap();
//! assert_eq!(price, subtotal);
//!
//! // Split by weights, summing exactly to the original
//! let parts = Money::from_cents(10_000).allocate(&[Money::from_cents(60), Money::from_cents(40)]);
//! assert_eq!(parts, vec![Money::from_cents(6_000), Money::from_cents(4_000)]);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use ts_rs::TS;

/// Basis points in one whole (100%).
pub const BPS_SCALE: i64 = 10_000;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in hundredths of the currency unit.
///
/// ## Design Decisions
/// - **i64 (signed)**: Discounts and negative adjustments are legal
/// - **Single field tuple struct**: Serializes as a bare integer
/// - **No float constructor from user code**: floats only enter through
///   [`Money::from_major_f64`], which the wire coercion layer uses for JSON
///   numbers, rounding once to the nearest hundredth
///
/// ## Where Money flows
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  wire "150000.00" ──► coerce ──► Order.subtotal ──► net_revenue()      │
/// │                                                        │               │
/// │                   RevenueSummary / DailySales ◄────────┘               │
/// │                                                                         │
/// │  EVERY monetary value in a report flows through this type              │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from hundredths.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // 10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from whole currency units.
    #[inline]
    pub const fn from_major(major: i64) -> Self {
        Money(major.saturating_mul(100))
    }

    /// Converts a floating point amount in whole units, rounding to the
    /// nearest hundredth (half away from zero).
    ///
    /// Returns `None` for NaN, infinities and values outside the i64 range.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// assert_eq!(Money::from_major_f64(12.34), Some(Money::from_cents(1234)));
    /// assert_eq!(Money::from_major_f64(f64::NAN), None);
    /// ```
    pub fn from_major_f64(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        let scaled = (value * 100.0).round();
        // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive
        if scaled >= i64::MAX as f64 || scaled < i64::MIN as f64 {
            return None;
        }
        Some(Money(scaled as i64))
    }

    /// Parses a plain decimal string ("150000", "-12.5", "0.125") exactly.
    ///
    /// Digits past the second decimal place round half away from zero.
    /// Exponents, separators and currency symbols are rejected; the coercion
    /// layer handles those through a float fallback.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// assert_eq!(Money::parse_decimal("12.50"), Some(Money::from_cents(1250)));
    /// assert_eq!(Money::parse_decimal(" 0.125 "), Some(Money::from_cents(13)));
    /// assert_eq!(Money::parse_decimal("12,50"), None);
    /// ```
    pub fn parse_decimal(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));

        if whole.is_empty() && fraction.is_empty() {
            return None;
        }
        if !whole.bytes().all(|b| b.is_ascii_digit()) || !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        let major: i64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
        let mut minor_digits = fraction.bytes().map(|b| i64::from(b - b'0'));
        let tenths = minor_digits.next().unwrap_or(0);
        let hundredths = minor_digits.next().unwrap_or(0);
        let round_up = minor_digits.next().is_some_and(|d| d >= 5);

        let cents = major
            .checked_mul(100)?
            .checked_add(tenths * 10 + hundredths + i64::from(round_up))?;
        Some(Money(if negative { -cents } else { cents }))
    }

    /// Returns the value in hundredths.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the whole-unit portion (truncated toward zero).
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the hundredths portion (always 0-99).
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

    /// Formats as a plain decimal string with two places ("1250.50").
    ///
    /// This is the shape the backend accepts for amounts in request bodies.
    pub fn to_decimal_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{}{}.{:02}", sign, self.major().abs(), self.minor_part())
    }

    /// Returns `bps` basis points of this amount, rounded half away from zero.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// let order = Money::from_cents(20_000); // 200.00
    /// assert_eq!(order.percentage(1_000).cents(), 2_000); // 10%
    /// ```
    pub fn percentage(&self, bps: i64) -> Money {
        Money(round_div(i128::from(self.0) * i128::from(bps), i128::from(BPS_SCALE)))
    }

    /// Applies a percentage discount and returns the discounted amount.
    ///
    /// ## Arguments
    /// * `discount_bps` - Discount in basis points (1000 = 10%)
    pub fn apply_percentage_discount(&self, discount_bps: i64) -> Money {
        *self - self.percentage(discount_bps)
    }

    /// Divides by a count, rounding half away from zero.
    ///
    /// A zero divisor yields zero instead of panicking; report averages over
    /// an empty period are zero by definition.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(1000).div_round(3).cents(), 333);
    /// assert_eq!(Money::from_cents(1000).div_round(0), Money::zero());
    /// ```
    pub fn div_round(&self, divisor: i64) -> Money {
        if divisor == 0 {
            return Money::zero();
        }
        Money(round_div(i128::from(self.0), i128::from(divisor)))
    }

    /// Splits this amount proportionally to `weights`.
    ///
    /// ## Allocation Rules
    /// ```text
    /// ┌─────────────────────────────────────────────────────────────────────┐
    /// │  share[i]   = round(self × weight[i] / Σweights)  for i < last      │
    /// │  share[last]= self − Σ earlier shares   (absorbs rounding)          │
    /// │                                                                     │
    /// │  Σweights ≤ 0  →  every share is zero                               │
    /// └─────────────────────────────────────────────────────────────────────┘
    /// ```
    ///
    /// The returned vector has the same length as `weights`.
    pub fn allocate(&self, weights: &[Money]) -> Vec<Money> {
        let total: i128 = weights.iter().map(|w| i128::from(w.0)).sum();
        if total <= 0 {
            return vec![Money::zero(); weights.len()];
        }

        let mut shares = Vec::with_capacity(weights.len());
        let mut assigned = Money::zero();
        for (index, weight) in weights.iter().enumerate() {
            let share = if index + 1 == weights.len() {
                *self - assigned
            } else {
                let raw = round_div(i128::from(self.0) * i128::from(weight.0), total);
                Money(raw)
            };
            assigned += share;
            shares.push(share);
        }
        shares
    }

    /// Percentage (0-100 scale) that `self` represents of `whole`.
    ///
    /// Returns 0.0 when `whole` is zero.
    pub fn percent_of(&self, whole: Money) -> f64 {
        if whole.is_zero() {
            return 0.0;
        }
        self.0 as f64 / whole.0 as f64 * 100.0
    }
}

/// Integer division rounding half away from zero, saturating into i64.
fn round_div(numerator: i128, denominator: i128) -> i64 {
    let quotient = numerator / denominator;
    let remainder = numerator % denominator;
    let adjusted = if remainder.abs() * 2 >= denominator.abs() {
        if (numerator < 0) == (denominator < 0) {
            quotient + 1
        } else {
            quotient - 1
        }
    } else {
        quotient
    };
    adjusted.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows two decimal places without a currency symbol and honors
/// width and alignment flags.
///
/// Localized formatting belongs to whatever renders the report.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.to_decimal_string())
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        *self = *self - other;
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(self.0.saturating_neg())
    }
}

/// Multiplication by a quantity.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.major(), 10);
        assert_eq!(money.minor_part(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1250050).to_string(), "12500.50");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
        assert_eq!(Money::from_cents(-5).to_string(), "-0.05");
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(Money::parse_decimal("150000.00"), Some(Money::from_cents(15_000_000)));
        assert_eq!(Money::parse_decimal("150000"), Some(Money::from_cents(15_000_000)));
        assert_eq!(Money::parse_decimal("12.5"), Some(Money::from_cents(1250)));
        assert_eq!(Money::parse_decimal(".75"), Some(Money::from_cents(75)));
        assert_eq!(Money::parse_decimal("-3.10"), Some(Money::from_cents(-310)));
        assert_eq!(Money::parse_decimal("+3"), Some(Money::from_cents(300)));
    }

    #[test]
    fn test_parse_decimal_rounds_third_place() {
        assert_eq!(Money::parse_decimal("0.125"), Some(Money::from_cents(13)));
        assert_eq!(Money::parse_decimal("0.124"), Some(Money::from_cents(12)));
        assert_eq!(Money::parse_decimal("-0.125"), Some(Money::from_cents(-13)));
    }

    #[test]
    fn test_parse_decimal_rejects_garbage() {
        assert_eq!(Money::parse_decimal(""), None);
        assert_eq!(Money::parse_decimal("."), None);
        assert_eq!(Money::parse_decimal("abc"), None);
        assert_eq!(Money::parse_decimal("1e3"), None);
        assert_eq!(Money::parse_decimal("1,000"), None);
        assert_eq!(Money::parse_decimal("99999999999999999999"), None);
    }

    #[test]
    fn test_from_major_f64() {
        assert_eq!(Money::from_major_f64(0.1 + 0.2), Some(Money::from_cents(30)));
        assert_eq!(Money::from_major_f64(-1.005), Some(Money::from_cents(-100)));
        assert_eq!(Money::from_major_f64(f64::INFINITY), None);
        assert_eq!(Money::from_major_f64(1e300), None);
    }

    #[test]
    fn test_percentage_and_discount() {
        let subtotal = Money::from_cents(10000);
        assert_eq!(subtotal.percentage(1000), Money::from_cents(1000));
        assert_eq!(subtotal.apply_percentage_discount(1000), Money::from_cents(9000));
        // 8.25% of 10.00 = 0.825 → 0.83
        assert_eq!(Money::from_cents(1000).percentage(825), Money::from_cents(83));
    }

    #[test]
    fn test_div_round() {
        assert_eq!(Money::from_cents(1000).div_round(3), Money::from_cents(333));
        assert_eq!(Money::from_cents(2000).div_round(3), Money::from_cents(667));
        assert_eq!(Money::from_cents(-2000).div_round(3), Money::from_cents(-667));
        assert_eq!(Money::from_cents(5).div_round(0), Money::zero());
    }

    #[test]
    fn test_allocate_proportional() {
        let parts = Money::from_cents(10_000)
            .allocate(&[Money::from_cents(6_000), Money::from_cents(4_000)]);
        assert_eq!(parts, vec![Money::from_cents(6_000), Money::from_cents(4_000)]);
    }

    #[test]
    fn test_allocate_remainder_goes_to_last() {
        let weights = [Money::from_cents(1), Money::from_cents(1), Money::from_cents(1)];
        let parts = Money::from_cents(10_000).allocate(&weights);
        assert_eq!(
            parts,
            vec![Money::from_cents(3_333), Money::from_cents(3_333), Money::from_cents(3_334)]
        );
        assert_eq!(parts.iter().sum::<Money>(), Money::from_cents(10_000));
    }

    #[test]
    fn test_allocate_zero_weights() {
        let parts = Money::from_cents(10_000).allocate(&[Money::zero(), Money::zero()]);
        assert_eq!(parts, vec![Money::zero(), Money::zero()]);
        assert!(Money::from_cents(10).allocate(&[]).is_empty());
    }

    #[test]
    fn test_percent_of_guards_zero() {
        assert_eq!(Money::from_cents(50).percent_of(Money::zero()), 0.0);
        assert!((Money::from_cents(25).percent_of(Money::from_cents(100)) - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);
        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((-a).cents(), -1000);
        assert_eq!((a * 3).cents(), 3000);
        let mut c = a;
        c += b;
        c -= Money::from_cents(100);
        assert_eq!(c.cents(), 1400);
        assert_eq!([a, b].iter().sum::<Money>(), Money::from_cents(1500));
    }
}
