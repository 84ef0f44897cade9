pub mod add;
pub mod carry;
pub mod completions;
pub mod delete;
pub mod done;
pub mod health;
pub mod jobs;
pub mod list;
pub mod report;
pub mod settings;
pub mod thread;
pub mod yesterday;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use dailies_core::config::DataPaths;
use dailies_core::settings::SettingsStore;
use dailies_core::store::LedgerStore;
use dailies_core::{DailiesError, DayClock, DayKey, ErrorCode, TaskRecord};
use serde::Serialize;

use crate::identity;
use crate::output::{CliError, OutputMode, render_error};

/// A day given on the command line: `today`, `yesterday`, or `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaySpec {
    Today,
    Yesterday,
    On(DayKey),
}

impl DaySpec {
    pub fn resolve(self, clock: &DayClock, now: DateTime<Utc>) -> DayKey {
        match self {
            Self::Today => clock.today(now),
            Self::Yesterday => clock.yesterday(now),
            Self::On(day) => day,
        }
    }
}

impl FromStr for DaySpec {
    type Err = DailiesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "today" => Ok(Self::Today),
            "yesterday" => Ok(Self::Yesterday),
            other => other.parse().map(Self::On).map_err(|_| {
                DailiesError::validation(
                    ErrorCode::InvalidDayKey,
                    format!("'{s}' is not today, yesterday, or a YYYY-MM-DD date"),
                )
            }),
        }
    }
}

impl fmt::Display for DaySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Today => f.write_str("today"),
            Self::Yesterday => f.write_str("yesterday"),
            Self::On(day) => write!(f, "{day}"),
        }
    }
}

/// Everything a per-user command needs: who, which clock, and where.
pub struct Session {
    pub user: String,
    pub clock: DayClock,
    pub now: DateTime<Utc>,
    pub store: LedgerStore,
}

impl Session {
    /// Resolve the user (rendering an error if missing) and load settings.
    pub fn open(
        user_flag: Option<&str>,
        output: OutputMode,
        paths: &DataPaths,
    ) -> anyhow::Result<Self> {
        let user = match identity::require_user(user_flag) {
            Ok(user) => user,
            Err(e) => {
                render_error(
                    output,
                    &CliError::with_details(
                        &e.message,
                        format!("Set --user or {}", identity::USER_ENV),
                        e.code,
                    ),
                )?;
                anyhow::bail!("{}", e.message);
            }
        };
        let clock = SettingsStore::new(&paths.settings).load().clock();
        Ok(Self {
            user,
            clock,
            now: Utc::now(),
            store: LedgerStore::new(&paths.ledger),
        })
    }

    pub fn day(&self, spec: Option<DaySpec>) -> DayKey {
        spec.unwrap_or(DaySpec::Today).resolve(&self.clock, self.now)
    }
}

/// One task as shown to users, with its current position.
#[derive(Debug, Clone, Serialize)]
pub struct TaskView {
    pub position: usize,
    pub id: String,
    pub text: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl TaskView {
    pub fn new(position: usize, task: &TaskRecord) -> Self {
        Self {
            position,
            id: task.id().to_string(),
            text: task.text().to_string(),
            completed: task.is_completed(),
            created_at: task.created_at(),
            completed_at: task.completed_at(),
        }
    }

    pub const fn status_mark(&self) -> &'static str {
        if self.completed { "✅" } else { "⬜" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_spec_parses_keywords_and_dates() {
        assert_eq!("Today".parse::<DaySpec>().expect("today"), DaySpec::Today);
        assert_eq!(
            "yesterday".parse::<DaySpec>().expect("yesterday"),
            DaySpec::Yesterday
        );
        let on: DaySpec = "2024-03-10".parse().expect("date");
        assert_eq!(on.to_string(), "2024-03-10");

        let err = "tomorrow".parse::<DaySpec>().expect_err("unsupported");
        assert_eq!(err.code(), ErrorCode::InvalidDayKey);
    }

    #[test]
    fn day_spec_resolves_against_clock() {
        let clock = DayClock::utc();
        let now = DateTime::parse_from_rfc3339("2024-03-10T12:00:00Z")
            .expect("ts")
            .with_timezone(&Utc);
        assert_eq!(DaySpec::Today.resolve(&clock, now).to_string(), "2024-03-10");
        assert_eq!(
            DaySpec::Yesterday.resolve(&clock, now).to_string(),
            "2024-03-09"
        );
    }
}
