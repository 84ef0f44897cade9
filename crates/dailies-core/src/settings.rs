//! Per-installation settings persisted as TOML.
//!
//! ```toml
//! day_start_hour = 0      # 0..=23
//! weekly_report_day = 0   # 0..=6, Sunday = 0
//! timezone = "+09:00"     # UTC or a fixed offset
//! ```
//!
//! Reading is forgiving: every key is looked up on its own, so one bad value
//! falls back to its default without discarding the others. Writing is
//! strict: a patch is validated as a whole before anything is merged.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::clock::{DayClock, parse_timezone};
use crate::error::{DailiesError, ErrorCode, Result};
use crate::store::write_atomically;

pub const SETTINGS_FILE: &str = "settings.toml";
pub const DEFAULT_TIMEZONE: &str = "+09:00";
pub const MAX_DAY_START_HOUR: i64 = 23;
pub const MAX_WEEKDAY: i64 = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub day_start_hour: u8,
    /// Weekday the weekly report is sent, Sunday = 0.
    #[serde(default)]
    pub weekly_report_day: u8,
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            day_start_hour: 0,
            weekly_report_day: 0,
            timezone: default_timezone(),
        }
    }
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

impl Settings {
    /// Day clock for these settings. A timezone that no longer parses falls
    /// back to [`DEFAULT_TIMEZONE`].
    #[must_use]
    pub fn clock(&self) -> DayClock {
        let offset = parse_timezone(&self.timezone).unwrap_or_else(|err| {
            warn!(timezone = %self.timezone, %err, "using default timezone");
            parse_timezone(DEFAULT_TIMEZONE).unwrap_or_else(|_| DayClock::utc().offset())
        });
        DayClock::new(offset, self.day_start_hour)
    }

    #[must_use]
    pub fn weekly_report_weekday(&self) -> Weekday {
        weekday_from_sunday(self.weekly_report_day)
    }

    fn from_table(table: &toml::Table) -> Self {
        let defaults = Self::default();
        let day_start_hour = read_key(table, &["day_start_hour", "dayStartHour"], |value| {
            value
                .as_integer()
                .filter(|hour| (0..=MAX_DAY_START_HOUR).contains(hour))
                .and_then(|hour| u8::try_from(hour).ok())
        })
        .unwrap_or(defaults.day_start_hour);
        let weekly_report_day = read_key(table, &["weekly_report_day", "weeklyReportDay"], |value| {
            value
                .as_integer()
                .filter(|day| (0..=MAX_WEEKDAY).contains(day))
                .and_then(|day| u8::try_from(day).ok())
        })
        .unwrap_or(defaults.weekly_report_day);
        let timezone = read_key(table, &["timezone"], |value| {
            value
                .as_str()
                .filter(|tz| parse_timezone(tz).is_ok())
                .map(str::to_string)
        })
        .unwrap_or(defaults.timezone);

        Self {
            day_start_hour,
            weekly_report_day,
            timezone,
        }
    }
}

fn read_key<T>(
    table: &toml::Table,
    names: &[&'static str],
    convert: impl Fn(&toml::Value) -> Option<T>,
) -> Option<T> {
    let (name, value) = names
        .iter()
        .find_map(|name| table.get(*name).map(|value| (*name, value)))?;
    let converted = convert(value);
    if converted.is_none() {
        warn!(key = name, value = %value, "ignoring invalid setting; using default");
    }
    converted
}

/// Sunday-based weekday number (0..=6) as a [`Weekday`]; larger values wrap.
#[must_use]
pub fn weekday_from_sunday(day: u8) -> Weekday {
    match day % 7 {
        0 => Weekday::Sun,
        1 => Weekday::Mon,
        2 => Weekday::Tue,
        3 => Weekday::Wed,
        4 => Weekday::Thu,
        5 => Weekday::Fri,
        _ => Weekday::Sat,
    }
}

/// Fields to change; `None` keeps the stored value.
///
/// Numbers are kept wide so out-of-range input is reported as a validation
/// error rather than failing to parse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsPatch {
    pub day_start_hour: Option<i64>,
    pub weekly_report_day: Option<i64>,
    pub timezone: Option<String>,
}

impl SettingsPatch {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.day_start_hour.is_none() && self.weekly_report_day.is_none() && self.timezone.is_none()
    }

    /// Validate every field, then merge into `base`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorCode::InvalidSetting`] for the first invalid field;
    /// `base` is not consulted or changed in that case.
    pub fn apply_to(&self, base: &Settings) -> Result<Settings> {
        let day_start_hour = self
            .day_start_hour
            .map(|hour| bounded("day_start_hour", hour, MAX_DAY_START_HOUR))
            .transpose()?;
        let weekly_report_day = self
            .weekly_report_day
            .map(|day| bounded("weekly_report_day", day, MAX_WEEKDAY))
            .transpose()?;
        let timezone = self
            .timezone
            .as_deref()
            .map(|tz| parse_timezone(tz).map(|_| tz.trim().to_string()))
            .transpose()?;

        Ok(Settings {
            day_start_hour: day_start_hour.unwrap_or(base.day_start_hour),
            weekly_report_day: weekly_report_day.unwrap_or(base.weekly_report_day),
            timezone: timezone.unwrap_or_else(|| base.timezone.clone()),
        })
    }
}

fn bounded(field: &str, value: i64, max: i64) -> Result<u8> {
    if !(0..=max).contains(&value) {
        return Err(DailiesError::validation(
            ErrorCode::InvalidSetting,
            format!("{field} must be between 0 and {max}, got {value}"),
        ));
    }
    u8::try_from(value).map_err(|_| {
        DailiesError::validation(ErrorCode::InvalidSetting, format!("{field} is out of range"))
    })
}

#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(SETTINGS_FILE))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persisted settings merged over defaults. Never fails.
    #[must_use]
    pub fn load(&self) -> Settings {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Settings::default(),
            Err(err) => {
                warn!(path = %self.path.display(), %err, "cannot read settings; using defaults");
                return Settings::default();
            }
        };
        match content.parse::<toml::Table>() {
            Ok(table) => Settings::from_table(&table),
            Err(err) => {
                warn!(path = %self.path.display(), %err, "malformed settings; using defaults");
                Settings::default()
            }
        }
    }

    /// Merge `patch` into the stored settings and write the full result.
    ///
    /// # Errors
    ///
    /// Returns a validation error (nothing written) when a field is out of
    /// range, or a persistence error when the file cannot be written.
    pub fn save(&self, patch: &SettingsPatch) -> Result<Settings> {
        let merged = patch.apply_to(&self.load())?;
        let content = toml::to_string_pretty(&merged).map_err(|err| {
            DailiesError::persistence(
                ErrorCode::SettingsWriteFailed,
                "serialize",
                &self.path,
                io::Error::new(io::ErrorKind::InvalidData, err),
            )
        })?;
        write_atomically(&self.path, content.as_bytes(), ErrorCode::SettingsWriteFailed)?;
        debug!(path = %self.path.display(), ?merged, "saved settings");
        Ok(merged)
    }
}
