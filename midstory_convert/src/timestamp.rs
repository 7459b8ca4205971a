// Copyright 2026 the Midstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A calendar timestamp with millisecond precision.

use core::fmt;
use core::str::FromStr;

const MILLIS_PER_DAY: i64 = 86_400_000;

/// A point in time, stored as milliseconds since the Unix epoch (UTC).
///
/// Timestamps convert to and from ISO 8601 text
/// (`2026-08-29T12:30:00.250Z`) and nothing else; there is no implicit
/// numeric representation exposed to the conversion layer.
///
/// # Example
///
/// ```rust
/// use midstory_convert::Timestamp;
///
/// let t: Timestamp = "2026-08-29T12:30:00Z".parse().unwrap();
/// assert_eq!(t.to_string(), "2026-08-29T12:30:00Z");
/// ```
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(i64);

impl Timestamp {
    /// The Unix epoch, 1970-01-01T00:00:00Z.
    pub const UNIX_EPOCH: Self = Self(0);

    /// Creates a timestamp from milliseconds since the Unix epoch.
    #[must_use]
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns milliseconds since the Unix epoch.
    #[must_use]
    pub const fn as_millis(self) -> i64 {
        self.0
    }
}

/// Days since the epoch for a civil date (Howard Hinnant's algorithm).
fn days_from_civil(year: i64, month: u32, day: u32) -> i64 {
    let y = if month <= 2 { year - 1 } else { year };
    let era = y.div_euclid(400);
    let yoe = y.rem_euclid(400);
    let mp = i64::from((month + 9) % 12);
    let doy = (153 * mp + 2) / 5 + i64::from(day) - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

/// Civil date for days since the epoch (the inverse of [`days_from_civil`]).
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "month and day components are bounded by the calendar"
)]
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = if mp < 10 { mp + 3 } else { mp - 9 } as u32;
    let year = era * 400 + yoe + i64::from(month <= 2);
    (year, month, day)
}

fn is_leap_year(year: i64) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

fn days_in_month(year: i64, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => 0,
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let days = self.0.div_euclid(MILLIS_PER_DAY);
        let rem = self.0.rem_euclid(MILLIS_PER_DAY);
        let (year, month, day) = civil_from_days(days);
        let second = rem / 1000;
        let milli = rem % 1000;
        let (hour, minute, second) = (second / 3600, second / 60 % 60, second % 60);
        write!(f, "{year:04}-{month:02}-{day:02}T{hour:02}:{minute:02}:{second:02}")?;
        if milli != 0 {
            write!(f, ".{milli:03}")?;
        }
        f.write_str("Z")
    }
}

/// An error parsing a [`Timestamp`] from text.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ParseTimestampError;

impl fmt::Display for ParseTimestampError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("invalid timestamp literal")
    }
}

impl core::error::Error for ParseTimestampError {}

fn parse_fixed(s: &str, range: core::ops::Range<usize>) -> Result<i64, ParseTimestampError> {
    let digits = s.get(range).ok_or(ParseTimestampError)?;
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseTimestampError);
    }
    digits.parse().map_err(|_| ParseTimestampError)
}

impl FromStr for Timestamp {
    type Err = ParseTimestampError;

    /// Parses `YYYY-MM-DDTHH:MM:SS[.fff]Z`.
    ///
    /// The offset designator must be `Z`; fractional seconds carry at most
    /// three digits.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() < 20
            || bytes[4] != b'-'
            || bytes[7] != b'-'
            || bytes[10] != b'T'
            || bytes[13] != b':'
            || bytes[16] != b':'
            || *bytes.last().ok_or(ParseTimestampError)? != b'Z'
        {
            return Err(ParseTimestampError);
        }

        let year = parse_fixed(s, 0..4)?;
        let month = parse_fixed(s, 5..7)?;
        let day = parse_fixed(s, 8..10)?;
        let hour = parse_fixed(s, 11..13)?;
        let minute = parse_fixed(s, 14..16)?;
        let second = parse_fixed(s, 17..19)?;

        let milli = match &s[19..s.len() - 1] {
            "" => 0,
            frac => {
                let digits = frac.strip_prefix('.').ok_or(ParseTimestampError)?;
                if digits.is_empty() || digits.len() > 3 {
                    return Err(ParseTimestampError);
                }
                // "2" means 200 ms, "25" means 250 ms.
                let place = match digits.len() {
                    1 => 100,
                    2 => 10,
                    _ => 1,
                };
                parse_fixed(digits, 0..digits.len())? * place
            }
        };

        #[expect(clippy::cast_possible_truncation, reason = "two-digit fields")]
        let (month, day) = (month as u32, day as u32);
        if !(1..=12).contains(&month)
            || day < 1
            || day > days_in_month(year, month)
            || hour > 23
            || minute > 59
            || second > 59
        {
            return Err(ParseTimestampError);
        }

        let days = days_from_civil(year, month, day);
        Ok(Self(
            days * MILLIS_PER_DAY + (hour * 3600 + minute * 60 + second) * 1000 + milli,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn epoch_formats() {
        assert_eq!(Timestamp::UNIX_EPOCH.to_string(), "1970-01-01T00:00:00Z");
    }

    #[test]
    fn parse_and_display_round_trip() {
        for text in [
            "2026-08-29T12:30:00Z",
            "2026-08-29T12:30:00.250Z",
            "2000-02-29T23:59:59Z",
            "1969-12-31T23:59:59Z",
        ] {
            let t: Timestamp = text.parse().unwrap();
            assert_eq!(t.to_string(), text);
        }
    }

    #[test]
    fn millis_are_exact() {
        let t: Timestamp = "1970-01-02T00:00:00Z".parse().unwrap();
        assert_eq!(t.as_millis(), 86_400_000);

        let t: Timestamp = "1970-01-01T00:00:00.5Z".parse().unwrap();
        assert_eq!(t.as_millis(), 500);
    }

    #[test]
    fn pre_epoch_dates_work() {
        let t: Timestamp = "1969-12-31T23:59:59Z".parse().unwrap();
        assert_eq!(t.as_millis(), -1000);
    }

    #[test]
    fn parse_rejects_invalid_dates() {
        assert!("2026-02-29T00:00:00Z".parse::<Timestamp>().is_err()); // not a leap year
        assert!("2026-13-01T00:00:00Z".parse::<Timestamp>().is_err());
        assert!("2026-00-01T00:00:00Z".parse::<Timestamp>().is_err());
        assert!("2026-04-31T00:00:00Z".parse::<Timestamp>().is_err());
        assert!("2026-08-29T24:00:00Z".parse::<Timestamp>().is_err());
    }

    #[test]
    fn parse_rejects_malformed_text() {
        assert!("".parse::<Timestamp>().is_err());
        assert!("2026-08-29".parse::<Timestamp>().is_err());
        assert!("2026-08-29T12:30:00".parse::<Timestamp>().is_err()); // no Z
        assert!("2026-08-29T12:30:00.1234Z".parse::<Timestamp>().is_err());
        assert!("2026-08-29 12:30:00Z".parse::<Timestamp>().is_err());
    }

    #[test]
    fn ordering_follows_time() {
        let a: Timestamp = "2026-08-29T12:00:00Z".parse().unwrap();
        let b: Timestamp = "2026-08-29T12:00:01Z".parse().unwrap();
        assert!(a < b);
    }
}
