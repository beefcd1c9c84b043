//! Arbitrary-precision decimal numbers.
//!
//! A number is an exact rational paired with the count of decimal places it
//! keeps. Additions, subtractions and comparisons are exact; multiplications
//! and divisions are rounded to the destination's precision before they are
//! stored, never before.

use std::cmp::Ordering;
use std::fmt;

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{Signed, Zero};
use thiserror::Error;

/// Decimal places kept when a number is declared without an explicit
/// precision.
pub const DEFAULT_PRECISION: u32 = 6;

/// Precision carried by literal constants so that nothing is lost before the
/// value is rounded into its destination.
pub const UNLIMITED_PRECISION: u32 = 1000;

/// A malformed numeric literal, like `1.2.3`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid number: {0}")]
pub struct InvalidNumberError(pub String);

/// An exact rational with a fixed decimal precision.
#[derive(Debug, Clone, PartialEq)]
pub struct Number {
    rat: BigRational,
    precision: u32,
}

impl Number {
    pub fn zero(precision: u32) -> Number {
        Number {
            rat: BigRational::zero(),
            precision,
        }
    }

    pub fn from_integer(value: i64, precision: u32) -> Number {
        Number {
            rat: BigRational::from_integer(BigInt::from(value)),
            precision,
        }
    }

    /// Parses a decimal literal with an optional leading minus, like `12`,
    /// `-1.23` or `0.5`.
    pub fn parse(s: &str, precision: u32) -> Result<Number, InvalidNumberError> {
        let err = || InvalidNumberError(s.to_string());
        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, ""));
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(err());
        }
        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(int_part) || !all_digits(frac_part) {
            return Err(err());
        }

        let scale = scale_of(frac_part.len() as u32);
        let int: BigInt = if int_part.is_empty() {
            BigInt::zero()
        } else {
            int_part.parse().map_err(|_| err())?
        };
        let frac: BigInt = if frac_part.is_empty() {
            BigInt::zero()
        } else {
            frac_part.parse().map_err(|_| err())?
        };
        let mut numer = int * &scale + frac;
        if negative {
            numer = -numer;
        }
        Ok(Number {
            rat: BigRational::new(numer, scale),
            precision,
        })
    }

    pub fn precision(&self) -> u32 {
        self.precision
    }

    pub fn is_zero(&self) -> bool {
        self.rat.is_zero()
    }

    /// Exact rational comparison; precision plays no part.
    pub fn cmp(&self, other: &Number) -> Ordering {
        self.rat.cmp(&other.rat)
    }

    /// The value rounded to `precision` decimal places, with halves rounded
    /// away from zero.
    pub fn rounded(&self, precision: u32) -> Number {
        let scale = BigRational::from_integer(scale_of(precision));
        Number {
            rat: (&self.rat * &scale).round() / scale,
            precision,
        }
    }

    /// Exact sum, kept at the destination's precision.
    pub fn sum(a: &Number, b: &Number, precision: u32) -> Number {
        Number {
            rat: &a.rat + &b.rat,
            precision,
        }
    }

    /// Exact difference `a - b`, kept at the destination's precision.
    pub fn difference(a: &Number, b: &Number, precision: u32) -> Number {
        Number {
            rat: &a.rat - &b.rat,
            precision,
        }
    }

    /// Product rounded to the destination's precision, so no higher-precision
    /// digits survive the store.
    pub fn product(a: &Number, b: &Number, precision: u32) -> Number {
        Number {
            rat: &a.rat * &b.rat,
            precision,
        }
        .rounded(precision)
    }

    /// Quotient `a / b`, rounded like [`Number::product`]. `None` when `b` is
    /// zero.
    pub fn quotient(a: &Number, b: &Number, precision: u32) -> Option<Number> {
        if b.rat.is_zero() {
            return None;
        }
        Some(
            Number {
                rat: &a.rat / &b.rat,
                precision,
            }
            .rounded(precision),
        )
    }

    /// The fixed-point rendering at this number's full precision, before any
    /// trimming.
    fn decimal_string(&self) -> String {
        let scale = scale_of(self.precision);
        let scaled = (&self.rat * BigRational::from_integer(scale.clone()))
            .round()
            .to_integer();
        let sign = if scaled.is_negative() { "-" } else { "" };
        let magnitude = scaled.abs();
        let int_part = &magnitude / &scale;
        if self.precision == 0 {
            return format!("{sign}{int_part}");
        }
        let frac_digits = (&magnitude % &scale).to_string();
        let padding = "0".repeat(self.precision as usize - frac_digits.len());
        format!("{sign}{int_part}.{padding}{frac_digits}")
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = self.decimal_string();
        // Trim trailing zeros after the decimal point, then a bare trailing
        // point so that integers render without one.
        if self.precision > 0 {
            while s.ends_with('0') {
                s.pop();
            }
            if s.ends_with('.') {
                s.pop();
            }
        }
        f.write_str(&s)
    }
}

fn scale_of(precision: u32) -> BigInt {
    num_traits::pow(BigInt::from(10), precision as usize)
}
