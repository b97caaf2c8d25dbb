//! # Money Module
//!
//! Provides the `Money` type for buying and selling prices.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  The inventory API sends prices as JSON numbers: "selling_price": 2.3  │
//! │  As f64: 2.3 * 3 = 6.8999999999999995  ❌                               │
//! │                                                                         │
//! │  OUR SOLUTION: parse the decimal TEXT straight into integer cents      │
//! │    "2.3"  → 230 cents                                                  │
//! │    230 * 3 = 690 cents  ✅                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tillpoint_core::money::Money;
//!
//! let price = Money::parse_decimal("10.99").unwrap();
//! assert_eq!(price.cents(), 1099);
//! assert_eq!(price.to_string(), "$10.99");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul, Sub};
use ts_rs::TS;

use crate::error::ValidationError;

/// A monetary value in the smallest currency unit (cents).
///
/// Signed so that margins (`selling - buying`) can go negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns zero.
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

    /// Multiplies by a quantity (line totals).
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Parses a decimal string ("12", "12.5", "-0.99") into exact cents.
    ///
    /// ## Rules
    /// - Optional leading `-` or `+`
    /// - At least one digit before or after the point
    /// - At most two significant fractional digits; extra trailing zeros
    ///   ("12.500") are accepted because JSON serializers emit them
    /// - No exponents, no thousands separators
    ///
    /// ## Example
    /// ```rust
    /// use tillpoint_core::money::Money;
    ///
    /// assert_eq!(Money::parse_decimal("2.3").unwrap().cents(), 230);
    /// assert_eq!(Money::parse_decimal("-0.05").unwrap().cents(), -5);
    /// assert!(Money::parse_decimal("1.999").is_err());
    /// assert!(Money::parse_decimal("1e3").is_err());
    /// ```
    pub fn parse_decimal(input: &str) -> Result<Money, ValidationError> {
        let invalid = |reason: &str| ValidationError::InvalidAmount {
            value: input.to_string(),
            reason: reason.to_string(),
        };

        let text = input.trim();
        let (negative, unsigned) = match text.as_bytes().first() {
            Some(b'-') => (true, &text[1..]),
            Some(b'+') => (false, &text[1..]),
            Some(_) => (false, text),
            None => return Err(invalid("empty")),
        };

        let (whole, fraction) = match unsigned.split_once('.') {
            Some((w, f)) => (w, f),
            None => (unsigned, ""),
        };

        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid("no digits"));
        }
        if !whole.bytes().all(|b| b.is_ascii_digit()) || !fraction.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid("not a plain decimal number"));
        }

        let significant = fraction.trim_end_matches('0');
        if significant.len() > 2 {
            return Err(invalid("more than two decimal places"));
        }

        let whole_value: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid("out of range"))?
        };
        let mut minor: i64 = 0;
        for (i, digit) in significant.bytes().enumerate() {
            let weight = if i == 0 { 10 } else { 1 };
            minor += i64::from(digit - b'0') * weight;
        }

        let cents = whole_value
            .checked_mul(100)
            .and_then(|c| c.checked_add(minor))
            .ok_or_else(|| invalid("out of range"))?;

        Ok(Money(if negative { -cents } else { cents }))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}${}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decimal_forms() {
        assert_eq!(Money::parse_decimal("12").unwrap().cents(), 1200);
        assert_eq!(Money::parse_decimal("12.5").unwrap().cents(), 1250);
        assert_eq!(Money::parse_decimal("12.05").unwrap().cents(), 1205);
        assert_eq!(Money::parse_decimal("0.99").unwrap().cents(), 99);
        assert_eq!(Money::parse_decimal(".5").unwrap().cents(), 50);
        assert_eq!(Money::parse_decimal("7.").unwrap().cents(), 700);
        assert_eq!(Money::parse_decimal(" 3.10 ").unwrap().cents(), 310);
        assert_eq!(Money::parse_decimal("1500.0").unwrap().cents(), 150000);
        assert_eq!(Money::parse_decimal("4.500").unwrap().cents(), 450);
        assert_eq!(Money::parse_decimal("-5.50").unwrap().cents(), -550);
        assert_eq!(Money::parse_decimal("+1").unwrap().cents(), 100);
    }

    #[test]
    fn test_parse_decimal_rejects() {
        for bad in ["", "   ", "-", ".", "abc", "1,000", "1e3", "1.234", "1..2", "--1"] {
            assert!(Money::parse_decimal(bad).is_err(), "accepted {:?}", bad);
        }
        assert!(Money::parse_decimal("99999999999999999999").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "$10.99");
        assert_eq!(Money::from_cents(500).to_string(), "$5.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-$5.50");
        assert_eq!(Money::from_cents(-5).to_string(), "-$0.05");
        assert_eq!(Money::zero().to_string(), "$0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(1250);

        assert_eq!((a + b).cents(), 2250);
        assert!((a - b).is_negative());
        assert_eq!((a * 3).cents(), 3000);
        assert_eq!(Money::from_cents(230).multiply_quantity(3).cents(), 690);
    }
}
