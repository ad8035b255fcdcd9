//! Time utilities for parkbot
//!
//! Provides wall-clock types for requested parking windows, calendar helpers
//! for monthly budgeting, and a `now()` that can be mocked in debug builds.
//!
//! # Mock Time for Development
//!
//! In debug builds, the `PARKBOT_MOCK_TIME` environment variable overrides the
//! system time, e.g. to dry-run a plan as if it were the last day of a month.
//!
//! Format: `YYYY-MM-DD HH:MM:SS` (e.g., `2025-02-28 08:15:00`)

use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::ParkError;

/// Environment variable name for mock time (debug builds only)
pub const MOCK_TIME_ENV_VAR: &str = "PARKBOT_MOCK_TIME";

const MOCK_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Offset between the mock time and the real time at process start
static MOCK_TIME_OFFSET: OnceLock<Option<chrono::Duration>> = OnceLock::new();

#[allow(clippy::disallowed_methods)]
fn mock_time_offset() -> Option<chrono::Duration> {
    *MOCK_TIME_OFFSET.get_or_init(|| {
        if !cfg!(debug_assertions) {
            return None;
        }
        let raw = std::env::var(MOCK_TIME_ENV_VAR).ok()?;
        let parsed = NaiveDateTime::parse_from_str(&raw, MOCK_TIME_FORMAT)
            .ok()
            .and_then(|naive| Local.from_local_datetime(&naive).single());
        match parsed {
            Some(mock_dt) => {
                let offset = mock_dt.signed_duration_since(chrono::Local::now());
                tracing::info!(mock_time = %raw, offset_secs = offset.num_seconds(), "Mock time enabled");
                Some(offset)
            }
            None => {
                tracing::warn!(
                    mock_time = %raw,
                    expected_format = MOCK_TIME_FORMAT,
                    "Ignoring invalid mock time"
                );
                None
            }
        }
    })
}

/// Returns whether mock time is currently active.
pub fn is_mock_time_active() -> bool {
    mock_time_offset().is_some()
}

/// Get the current local time, respecting `PARKBOT_MOCK_TIME` in debug builds.
#[allow(clippy::disallowed_methods)]
pub fn now() -> DateTime<Local> {
    let real_now = chrono::Local::now();
    match mock_time_offset() {
        Some(offset) => real_now + offset,
        None => real_now,
    }
}

/// Number of days in the calendar month containing `date`
pub fn days_in_month(date: NaiveDate) -> u32 {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first_of_next| first_of_next.pred_opt())
        .map(|last| last.day())
        .unwrap_or(31)
}

/// Wall-clock time of day with minute precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WallClock {
    pub hour: u8,
    pub minute: u8,
}

impl WallClock {
    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(Self { hour, minute })
        } else {
            None
        }
    }

    /// Build from minutes since midnight; `None` past 23:59
    pub fn from_minutes(minutes: u32) -> Option<Self> {
        let hour = u8::try_from(minutes / 60).ok()?;
        Self::new(hour, (minutes % 60) as u8)
    }

    pub fn minutes_from_midnight(&self) -> u32 {
        (self.hour as u32) * 60 + (self.minute as u32)
    }
}

impl PartialOrd for WallClock {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for WallClock {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.minutes_from_midnight()
            .cmp(&other.minutes_from_midnight())
    }
}

impl fmt::Display for WallClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for WallClock {
    type Err = ParkError;

    /// Parse `HH:MM` (24-hour clock, single-digit hour allowed)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (hour, minute) = s
            .split_once(':')
            .ok_or_else(|| ParkError::invalid_range(format!("'{}': expected HH:MM", s)))?;

        let hour: u8 = hour
            .parse()
            .map_err(|_| ParkError::invalid_range(format!("'{}': invalid hour", s)))?;
        if minute.len() != 2 {
            return Err(ParkError::invalid_range(format!("'{}': minutes must have two digits", s)));
        }
        let minute: u8 = minute
            .parse()
            .map_err(|_| ParkError::invalid_range(format!("'{}': invalid minute", s)))?;

        Self::new(hour, minute).ok_or_else(|| {
            ParkError::invalid_range(format!("'{}': hour must be 0-23 and minute 0-59", s))
        })
    }
}

impl TryFrom<String> for WallClock {
    type Error = ParkError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<WallClock> for String {
    fn from(value: WallClock) -> Self {
        value.to_string()
    }
}

/// A same-day window `[start, end)`; overnight ranges are not supported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeRange {
    start: WallClock,
    end: WallClock,
}

impl TimeRange {
    /// Create a range; fails unless `end > start`
    pub fn new(start: WallClock, end: WallClock) -> crate::Result<Self> {
        if end <= start {
            return Err(ParkError::invalid_range(format!(
                "end {} must be after start {}",
                end, start
            )));
        }
        Ok(Self { start, end })
    }

    /// Create a range from minutes since midnight
    pub fn from_minutes(start: u32, end: u32) -> crate::Result<Self> {
        let start = WallClock::from_minutes(start)
            .ok_or_else(|| ParkError::invalid_range(format!("{} minutes is past midnight", start)))?;
        let end = WallClock::from_minutes(end)
            .ok_or_else(|| ParkError::invalid_range(format!("{} minutes is past midnight", end)))?;
        Self::new(start, end)
    }

    pub fn start(&self) -> WallClock {
        self.start
    }

    pub fn end(&self) -> WallClock {
        self.end
    }

    pub fn duration_minutes(&self) -> u32 {
        self.end.minutes_from_midnight() - self.start.minutes_from_midnight()
    }

    /// Whether this range shares any minute with `other`
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Whether `other` lies entirely within this range
    pub fn contains_range(&self, other: &TimeRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

impl FromStr for TimeRange {
    type Err = ParkError;

    /// Parse `HH:MM-HH:MM`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = s.split_once('-').ok_or_else(|| {
            ParkError::invalid_range(format!("'{}': time range must look like 13:00-14:00", s))
        })?;
        Self::new(start.parse()?, end.parse()?)
    }
}

impl TryFrom<String> for TimeRange {
    type Error = ParkError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeRange> for String {
    fn from(value: TimeRange) -> Self {
        value.to_string()
    }
}

/// Format a signed duration as hours with one decimal, e.g. `+3.5h`
pub fn format_signed_hours(d: chrono::Duration) -> String {
    let hours = d.num_minutes() as f64 / 60.0;
    format!("{:+.1}h", hours)
}

/// Format a non-negative duration as hours with one decimal, e.g. `37.5h`
pub fn format_hours(d: chrono::Duration) -> String {
    let hours = d.num_minutes() as f64 / 60.0;
    format!("{:.1}h", hours)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wall_clock_ordering() {
        let morning = WallClock::new(8, 0).unwrap();
        let noon = WallClock::new(12, 0).unwrap();
        let evening = WallClock::new(18, 30).unwrap();

        assert!(morning < noon);
        assert!(noon < evening);
        assert!(morning < evening);
    }

    #[test]
    fn test_wall_clock_parse() {
        assert_eq!("13:05".parse::<WallClock>().unwrap(), WallClock::new(13, 5).unwrap());
        assert_eq!("9:30".parse::<WallClock>().unwrap(), WallClock::new(9, 30).unwrap());
        assert_eq!(" 00:00 ".parse::<WallClock>().unwrap(), WallClock::new(0, 0).unwrap());

        assert!("24:00".parse::<WallClock>().is_err());
        assert!("12:60".parse::<WallClock>().is_err());
        assert!("12:5".parse::<WallClock>().is_err());
        assert!("noon".parse::<WallClock>().is_err());
    }

    #[test]
    fn test_wall_clock_minutes_roundtrip() {
        let clock = WallClock::from_minutes(13 * 60 + 55).unwrap();
        assert_eq!(clock.to_string(), "13:55");
        assert_eq!(clock.minutes_from_midnight(), 835);
        assert!(WallClock::from_minutes(24 * 60).is_none());
    }

    #[test]
    fn test_time_range_parse() {
        let range: TimeRange = "13:00-14:00".parse().unwrap();
        assert_eq!(range.start(), WallClock::new(13, 0).unwrap());
        assert_eq!(range.end(), WallClock::new(14, 0).unwrap());
        assert_eq!(range.duration_minutes(), 60);
        assert_eq!(range.to_string(), "13:00-14:00");

        let spaced: TimeRange = "13:00 - 14:00".parse().unwrap();
        assert_eq!(spaced, range);
    }

    #[test]
    fn test_time_range_rejects_overnight_and_empty() {
        assert!(matches!(
            "22:00-02:00".parse::<TimeRange>(),
            Err(ParkError::InvalidRange(_))
        ));
        assert!(matches!(
            "13:00-13:00".parse::<TimeRange>(),
            Err(ParkError::InvalidRange(_))
        ));
        assert!("13:00".parse::<TimeRange>().is_err());
    }

    #[test]
    fn test_time_range_overlap() {
        let a = TimeRange::from_minutes(600, 610).unwrap();
        let b = TimeRange::from_minutes(610, 620).unwrap();
        let c = TimeRange::from_minutes(605, 615).unwrap();

        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(c.overlaps(&b));

        let outer = TimeRange::from_minutes(600, 620).unwrap();
        assert!(outer.contains_range(&a));
        assert!(outer.contains_range(&b));
        assert!(!a.contains_range(&outer));
    }

    #[test]
    fn test_time_range_serializes_as_string() {
        let range: TimeRange = "08:30-09:15".parse().unwrap();
        let json = serde_json::to_string(&range).unwrap();
        assert_eq!(json, "\"08:30-09:15\"");

        let parsed: TimeRange = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, range);

        assert!(serde_json::from_str::<TimeRange>("\"09:15-08:30\"").is_err());
    }

    #[test]
    fn test_days_in_month() {
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
        assert_eq!(days_in_month(d(2025, 1, 15)), 31);
        assert_eq!(days_in_month(d(2025, 2, 1)), 28);
        assert_eq!(days_in_month(d(2024, 2, 29)), 29);
        assert_eq!(days_in_month(d(2025, 4, 30)), 30);
        assert_eq!(days_in_month(d(2025, 12, 31)), 31);
    }

    #[test]
    fn test_format_hours() {
        assert_eq!(format_hours(chrono::Duration::minutes(90)), "1.5h");
        assert_eq!(format_signed_hours(chrono::Duration::minutes(-210)), "-3.5h");
        assert_eq!(format_signed_hours(chrono::Duration::minutes(60)), "+1.0h");
    }

    #[test]
    fn test_now_returns_time() {
        let t = now();
        assert!(t.year() >= 2020);
        assert!(t.year() <= 2100);
    }

    #[test]
    fn test_mock_time_format() {
        assert!(NaiveDateTime::parse_from_str("2025-02-28 08:15:00", MOCK_TIME_FORMAT).is_ok());
        assert!(NaiveDateTime::parse_from_str("2025-02-28T08:15:00", MOCK_TIME_FORMAT).is_err());
        assert!(NaiveDateTime::parse_from_str("08:15:00", MOCK_TIME_FORMAT).is_err());
    }
}
