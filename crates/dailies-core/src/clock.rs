//! Calendar-day keys derived from wall-clock instants.
//!
//! Every task list is bucketed under a [`DayKey`] (`YYYY-MM-DD`). The mapping
//! from an instant to a key depends on two settings:
//!
//! - the configured zone, a fixed UTC offset such as `+09:00`;
//! - `day_start_hour`, which moves the day boundary later than midnight. With
//!   `day_start_hour = 4`, 02:30 local time still belongs to the previous day.
//!
//! All functions are pure; callers pass `now` explicitly.

use std::fmt;
use std::str::FromStr;

use chrono::{
    DateTime, Datelike, Days, FixedOffset, NaiveDate, Offset, TimeDelta, Utc, Weekday,
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{DailiesError, ErrorCode, Result};

/// Number of days covered by a weekly report window.
pub const WEEK_LEN: usize = 7;

/// Canonical `YYYY-MM-DD` bucket for one user's tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DayKey(NaiveDate);

impl DayKey {
    #[must_use]
    pub const fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    #[must_use]
    pub const fn date(self) -> NaiveDate {
        self.0
    }

    /// The calendar day before this one.
    #[must_use]
    pub fn pred(self) -> Self {
        Self(self.0.pred_opt().unwrap_or(self.0))
    }

    /// The calendar day `days` before this one.
    #[must_use]
    pub fn minus_days(self, days: u64) -> Self {
        Self(self.0.checked_sub_days(Days::new(days)).unwrap_or(self.0))
    }

    /// Human-readable label, e.g. `Oct 18 (Sun)`.
    #[must_use]
    pub fn label(self) -> String {
        self.0.format("%b %-d (%a)").to_string()
    }

    #[must_use]
    pub fn weekday(self) -> Weekday {
        self.0.weekday()
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for DayKey {
    type Err = DailiesError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        // Strict width so `2024-3-9` is rejected and keys stay sortable as text.
        if trimmed.len() != 10 {
            return Err(invalid_day_key(s));
        }
        NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .map(Self)
            .map_err(|_| invalid_day_key(s))
    }
}

fn invalid_day_key(raw: &str) -> DailiesError {
    DailiesError::validation(
        ErrorCode::InvalidDayKey,
        format!("'{raw}' is not a YYYY-MM-DD day key"),
    )
}

impl Serialize for DayKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DayKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Parse a zone identifier: `UTC`, `Z`, `+HH:MM`, `-HH:MM`, or `+HHMM`.
///
/// # Errors
///
/// Returns a validation error when the identifier is not a fixed offset
/// within ±23:59.
pub fn parse_timezone(raw: &str) -> Result<FixedOffset> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("utc") || trimmed == "Z" {
        return Ok(utc_offset());
    }

    let invalid = || {
        DailiesError::validation(
            ErrorCode::InvalidSetting,
            format!("timezone '{raw}' must be UTC or a fixed offset like +09:00"),
        )
    };

    let (sign, rest) = match trimmed.as_bytes().first() {
        Some(b'+') => (1, &trimmed[1..]),
        Some(b'-') => (-1, &trimmed[1..]),
        _ => return Err(invalid()),
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let hours: i32 = digits[..2].parse().map_err(|_| invalid())?;
    let minutes: i32 = digits[2..].parse().map_err(|_| invalid())?;
    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

fn utc_offset() -> FixedOffset {
    Utc.fix()
}

/// Maps wall-clock instants to day keys for one installation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayClock {
    offset: FixedOffset,
    day_start_hour: u8,
}

impl DayClock {
    /// `day_start_hour` is clamped to 0..=23.
    #[must_use]
    pub fn new(offset: FixedOffset, day_start_hour: u8) -> Self {
        Self {
            offset,
            day_start_hour: day_start_hour.min(23),
        }
    }

    /// A midnight-boundary clock in UTC.
    #[must_use]
    pub fn utc() -> Self {
        Self::new(utc_offset(), 0)
    }

    #[must_use]
    pub const fn offset(&self) -> FixedOffset {
        self.offset
    }

    #[must_use]
    pub const fn day_start_hour(&self) -> u8 {
        self.day_start_hour
    }

    /// Day key the instant falls into.
    #[must_use]
    pub fn day_of(&self, instant: DateTime<Utc>) -> DayKey {
        let local = instant.with_timezone(&self.offset);
        let shifted = local - TimeDelta::hours(i64::from(self.day_start_hour));
        DayKey(shifted.date_naive())
    }

    #[must_use]
    pub fn today(&self, now: DateTime<Utc>) -> DayKey {
        self.day_of(now)
    }

    #[must_use]
    pub fn yesterday(&self, now: DateTime<Utc>) -> DayKey {
        self.today(now).pred()
    }

    /// Weekday of the current day bucket, used to decide report days.
    #[must_use]
    pub fn weekday(&self, now: DateTime<Utc>) -> Weekday {
        self.today(now).weekday()
    }
}

impl Default for DayClock {
    fn default() -> Self {
        Self::utc()
    }
}

/// Human-readable label for a day key.
#[must_use]
pub fn label(day: DayKey) -> String {
    day.label()
}

/// Seven consecutive day keys ending at `reference`, oldest first.
#[must_use]
pub fn week_window(reference: DayKey) -> [DayKey; WEEK_LEN] {
    let mut window = [reference; WEEK_LEN];
    for (slot, back) in window.iter_mut().zip((0..WEEK_LEN as u64).rev()) {
        *slot = reference.minus_days(back);
    }
    window
}
