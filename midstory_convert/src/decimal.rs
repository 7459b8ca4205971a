// Copyright 2026 the Midstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A fixed-point decimal value type.

use core::fmt;
use core::str::FromStr;

/// Scaling factor: nine fractional digits.
const SCALE: i128 = 1_000_000_000;

/// A fixed-point decimal number with nine fractional digits.
///
/// Stored as an `i128` count of billionths, which gives exact decimal
/// semantics for binding scenarios (currency, percentages) where binary
/// floats would drift. Equality and ordering are exact.
///
/// # Example
///
/// ```rust
/// use midstory_convert::Decimal;
///
/// let price: Decimal = "19.99".parse().unwrap();
/// assert_eq!(price.to_string(), "19.99");
/// assert_eq!(price.trunc_i64(), Some(19));
/// ```
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Decimal(i128);

impl Decimal {
    /// Zero.
    pub const ZERO: Self = Self(0);

    /// Creates a decimal from an integer.
    #[must_use]
    pub const fn from_i64(value: i64) -> Self {
        Self(value as i128 * SCALE)
    }

    /// Creates a decimal from an unsigned integer.
    #[must_use]
    pub const fn from_u64(value: u64) -> Self {
        Self(value as i128 * SCALE)
    }

    /// Creates a decimal from a float, rounding to nine fractional digits.
    ///
    /// Returns `None` for non-finite inputs or values outside the
    /// representable range.
    #[must_use]
    pub fn from_f64(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        let scaled = value * SCALE as f64;
        // Keep a comfortable margin below i128 range; floats this large
        // have no fractional precision left anyway.
        if scaled.abs() >= 1e38 {
            return None;
        }
        #[expect(
            clippy::cast_possible_truncation,
            reason = "range checked above; cast truncates toward zero as intended"
        )]
        Some(Self(libm_round(scaled) as i128))
    }

    /// Returns the integer part, truncating toward zero.
    ///
    /// Returns `None` if the integer part does not fit in an `i64`.
    #[must_use]
    pub fn trunc_i64(self) -> Option<i64> {
        i64::try_from(self.0 / SCALE).ok()
    }

    /// Converts to a float, with the usual loss of precision for values
    /// beyond 2^53.
    #[must_use]
    pub fn to_f64(self) -> f64 {
        self.0 as f64 / SCALE as f64
    }

    /// Returns `true` if this decimal is an exact integer.
    #[must_use]
    pub fn is_integer(self) -> bool {
        self.0 % SCALE == 0
    }
}

impl From<i64> for Decimal {
    fn from(value: i64) -> Self {
        Self::from_i64(value)
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 < 0 {
            write!(f, "-")?;
        }
        let abs = self.0.unsigned_abs();
        let int = abs / SCALE as u128;
        let frac = abs % SCALE as u128;
        if frac == 0 {
            write!(f, "{int}")
        } else {
            let mut frac = frac;
            let mut digits = 9;
            while frac % 10 == 0 {
                frac /= 10;
                digits -= 1;
            }
            write!(f, "{int}.{frac:0digits$}")
        }
    }
}

/// An error parsing a [`Decimal`] from text.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ParseDecimalError;

impl fmt::Display for ParseDecimalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("invalid decimal literal")
    }
}

impl core::error::Error for ParseDecimalError {}

impl FromStr for Decimal {
    type Err = ParseDecimalError;

    /// Parses a plain decimal literal such as `-12.5`.
    ///
    /// Fractional digits beyond the ninth are truncated. Exponents and
    /// digit separators are not accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (negative, rest) = match s.as_bytes().first() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            _ => (false, s),
        };
        let (int_part, frac_part) = match rest.split_once('.') {
            Some((i, f)) => (i, f),
            None => (rest, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(ParseDecimalError);
        }
        if !int_part.bytes().all(|b| b.is_ascii_digit())
            || !frac_part.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(ParseDecimalError);
        }

        let mut units: i128 = 0;
        for b in int_part.bytes() {
            units = units
                .checked_mul(10)
                .and_then(|u| u.checked_add(i128::from(b - b'0')))
                .ok_or(ParseDecimalError)?;
        }
        units = units.checked_mul(SCALE).ok_or(ParseDecimalError)?;

        let mut place = SCALE / 10;
        for b in frac_part.bytes().take(9) {
            units = units
                .checked_add(i128::from(b - b'0') * place)
                .ok_or(ParseDecimalError)?;
            place /= 10;
        }

        Ok(Self(if negative { -units } else { units }))
    }
}

/// Round-half-away-from-zero without `std`.
fn libm_round(value: f64) -> f64 {
    if value >= 0.0 {
        let t = value + 0.5;
        let i = t as i128 as f64;
        if i > t { i - 1.0 } else { i }
    } else {
        let t = value - 0.5;
        let i = t as i128 as f64;
        if i < t { i + 1.0 } else { i }
    }
}
