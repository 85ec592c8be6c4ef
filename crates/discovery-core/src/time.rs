//! Lightweight UTC timestamps (no chrono dependency).
//!
//! Uses Howard Hinnant's civil_from_days / days_from_civil algorithms for
//! Unix-to-date conversion in both directions.

use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

const MILLIS_PER_DAY: u64 = 86_400_000;

/// A point in time as Unix milliseconds, UTC.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(u64);

impl Timestamp {
    pub fn from_unix_millis(millis: u64) -> Self {
        Self(millis)
    }

    pub fn from_unix_secs(secs: u64) -> Self {
        Self(secs * 1000)
    }

    /// Current UTC time.
    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        Self(millis as u64)
    }

    pub fn unix_millis(self) -> u64 {
        self.0
    }

    /// ISO-8601 UTC with millisecond precision, e.g. `2026-10-15T09:30:00.000Z`.
    pub fn to_iso8601(self) -> String {
        let days = (self.0 / MILLIS_PER_DAY) as i64;
        let ms_of_day = self.0 % MILLIS_PER_DAY;
        let hours = ms_of_day / 3_600_000;
        let minutes = (ms_of_day % 3_600_000) / 60_000;
        let seconds = (ms_of_day % 60_000) / 1000;
        let millis = ms_of_day % 1000;

        let (y, m, d) = civil_from_days(days);
        format!("{y:04}-{m:02}-{d:02}T{hours:02}:{minutes:02}:{seconds:02}.{millis:03}Z")
    }

    /// Whole seconds elapsed from `self` until `later`, zero if `later` is earlier.
    pub fn secs_until(self, later: Timestamp) -> u64 {
        later.0.saturating_sub(self.0) / 1000
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampError(String);

impl fmt::Display for TimestampError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid ISO-8601 timestamp: {}", self.0)
    }
}

impl std::error::Error for TimestampError {}

impl FromStr for Timestamp {
    type Err = TimestampError;

    /// Parses `YYYY-MM-DDTHH:MM:SS[.fff]Z`. Only UTC is accepted; fractions
    /// longer than milliseconds are truncated.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || TimestampError(s.to_string());

        let body = s.strip_suffix('Z').ok_or_else(err)?;
        let (date, time) = body.split_once('T').ok_or_else(err)?;

        let mut date_parts = date.splitn(3, '-');
        let year: i64 = parse_field(date_parts.next(), 4).ok_or_else(err)?;
        let month: u64 = parse_field(date_parts.next(), 2).ok_or_else(err)?;
        let day: u64 = parse_field(date_parts.next(), 2).ok_or_else(err)?;

        let (clock, fraction) = match time.split_once('.') {
            Some((clock, fraction)) => (clock, Some(fraction)),
            None => (time, None),
        };
        let mut clock_parts = clock.splitn(3, ':');
        let hours: u64 = parse_field(clock_parts.next(), 2).ok_or_else(err)?;
        let minutes: u64 = parse_field(clock_parts.next(), 2).ok_or_else(err)?;
        let seconds: u64 = parse_field(clock_parts.next(), 2).ok_or_else(err)?;

        let millis = match fraction {
            None => 0,
            Some(f) if !f.is_empty() && f.bytes().all(|b| b.is_ascii_digit()) => {
                let digits: String = f.chars().chain("00".chars()).take(3).collect();
                digits.parse::<u64>().map_err(|_| err())?
            }
            Some(_) => return Err(err()),
        };

        if !(1..=12).contains(&month)
            || !(1..=days_in_month(year, month)).contains(&day)
            || hours > 23
            || minutes > 59
            || seconds > 59
        {
            return Err(err());
        }

        let days = days_from_civil(year, month, day);
        if days < 0 {
            return Err(err());
        }

        Ok(Timestamp(
            days as u64 * MILLIS_PER_DAY
                + hours * 3_600_000
                + minutes * 60_000
                + seconds * 1000
                + millis,
        ))
    }
}

fn parse_field<T: FromStr>(part: Option<&str>, width: usize) -> Option<T> {
    let part = part?;
    if part.len() != width || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

fn days_in_month(year: i64, month: u64) -> u64 {
    match month {
        2 if (year % 4 == 0 && year % 100 != 0) || year % 400 == 0 => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

/// Howard Hinnant's civil_from_days: Unix epoch days → (year, month, day).
fn civil_from_days(days: i64) -> (i64, u64, u64) {
    let z = days + 719468;
    let era = if z >= 0 { z } else { z - 146096 } / 146097;
    let doe = (z - era * 146097) as u64;
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365;
    let y = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = doy - (153 * mp + 2) / 5 + 1;
    let m = if mp < 10 { mp + 3 } else { mp - 9 };
    let y = if m <= 2 { y + 1 } else { y };
    (y, m, d)
}

/// Howard Hinnant's days_from_civil: (year, month, day) → Unix epoch days.
fn days_from_civil(year: i64, month: u64, day: u64) -> i64 {
    let y = if month <= 2 { year - 1 } else { year };
    let era = if y >= 0 { y } else { y - 399 } / 400;
    let yoe = (y - era * 400) as u64;
    let mp = if month > 2 { month - 3 } else { month + 9 };
    let doy = (153 * mp + 2) / 5 + day - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146097 + doe as i64 - 719468
}

/// Human-readable age of `then` relative to `now`.
pub fn time_ago(then: Timestamp, now: Timestamp) -> String {
    let seconds = then.secs_until(now);
    match seconds {
        0..60 => "a few seconds ago".to_string(),
        60..3600 => format!("{} minutes ago", seconds / 60),
        3600..86400 => format!("{} hours ago", seconds / 3600),
        _ => format!("{} days ago", seconds / 86400),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unix_epoch() {
        assert_eq!(
            Timestamp::from_unix_secs(0).to_iso8601(),
            "1970-01-01T00:00:00.000Z"
        );
    }

    #[test]
    fn test_known_date() {
        // 2026-02-21T00:00:00Z = 1771632000
        assert_eq!(
            Timestamp::from_unix_secs(1771632000).to_iso8601(),
            "2026-02-21T00:00:00.000Z"
        );
    }

    #[test]
    fn test_millis_rendered() {
        let ts = Timestamp::from_unix_millis(1771632000_123);
        assert_eq!(ts.to_iso8601(), "2026-02-21T00:00:00.123Z");
    }

    #[test]
    fn test_parse_roundtrip() {
        let ts = Timestamp::from_unix_millis(1_791_000_123_456);
        let parsed: Timestamp = ts.to_iso8601().parse().unwrap();
        assert_eq!(parsed, ts);
    }

    #[test]
    fn test_parse_without_fraction() {
        let ts: Timestamp = "2026-02-21T00:00:00Z".parse().unwrap();
        assert_eq!(ts, Timestamp::from_unix_secs(1771632000));
    }

    #[test]
    fn test_parse_truncates_long_fraction() {
        let ts: Timestamp = "2026-02-21T00:00:00.1239Z".parse().unwrap();
        assert_eq!(ts.unix_millis(), 1771632000_123);
    }

    #[test]
    fn test_parse_leap_day() {
        assert!("2028-02-29T12:00:00Z".parse::<Timestamp>().is_ok());
        assert!("2026-02-29T12:00:00Z".parse::<Timestamp>().is_err());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in [
            "",
            "not a date",
            "2026-02-21",
            "2026-02-21T00:00:00",
            "2026-13-01T00:00:00Z",
            "2026-02-21T24:00:00Z",
            "2026-02-21T00:00:00.Z",
            "2026-2-21T00:00:00Z",
        ] {
            assert!(bad.parse::<Timestamp>().is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn test_now_is_recent() {
        let ts = Timestamp::now().to_iso8601();
        assert!(ts.starts_with("20"), "timestamp should be this century: {ts}");
    }

    #[test]
    fn test_time_ago_buckets() {
        let base = Timestamp::from_unix_secs(1_000_000);
        let at = |secs: u64| Timestamp::from_unix_secs(1_000_000 + secs);

        assert_eq!(time_ago(base, at(0)), "a few seconds ago");
        assert_eq!(time_ago(base, at(59)), "a few seconds ago");
        assert_eq!(time_ago(base, at(60)), "1 minutes ago");
        assert_eq!(time_ago(base, at(3599)), "59 minutes ago");
        assert_eq!(time_ago(base, at(7200)), "2 hours ago");
        assert_eq!(time_ago(base, at(86400 * 3 + 5)), "3 days ago");
    }

    #[test]
    fn test_time_ago_future_is_recent() {
        let now = Timestamp::from_unix_secs(100);
        let later = Timestamp::from_unix_secs(500);
        assert_eq!(time_ago(later, now), "a few seconds ago");
    }
}
