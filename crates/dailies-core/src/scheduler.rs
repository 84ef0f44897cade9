//! Scheduled batch jobs: closing yesterday's threads and weekly reports.
//!
//! Both jobs walk every user independently. A failure for one user is logged
//! and recorded in the [`BatchOutcome`], and the batch moves on to the next
//! user. Neither job mutates the ledger.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info};

use crate::clock::DayKey;
use crate::error::{DailiesError, ErrorCode};
use crate::model::Ledger;
use crate::notify::{Notification, Notifier};
use crate::report::weekly_report;
use crate::settings::Settings;
use crate::thread::{ThreadCollaborator, thread_ref};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Job {
    DailyCleanup,
    WeeklyReport,
}

impl Job {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DailyCleanup => "cleanup",
            Self::WeeklyReport => "weekly",
        }
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Job {
    type Err = DailiesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cleanup" | "daily" | "daily-cleanup" => Ok(Self::DailyCleanup),
            "weekly" | "report" | "weekly-report" => Ok(Self::WeeklyReport),
            other => Err(DailiesError::validation(
                ErrorCode::UnknownJob,
                format!("unknown job '{other}' (expected cleanup or weekly)"),
            )),
        }
    }
}

/// Jobs a once-a-day trigger should run at `now`.
///
/// Cleanup is always due; the weekly report only when the current day falls
/// on the configured report weekday.
#[must_use]
pub fn due_jobs(settings: &Settings, now: DateTime<Utc>) -> Vec<Job> {
    let mut jobs = vec![Job::DailyCleanup];
    if settings.clock().weekday(now) == settings.weekly_report_weekday() {
        jobs.push(Job::WeeklyReport);
    }
    jobs
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserFailure {
    pub user: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchOutcome {
    pub job: Job,
    pub succeeded: Vec<String>,
    pub failed: Vec<UserFailure>,
    /// Users the job had nothing to do for.
    pub skipped: Vec<String>,
}

impl BatchOutcome {
    const fn new(job: Job) -> Self {
        Self {
            job,
            succeeded: Vec::new(),
            failed: Vec::new(),
            skipped: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    fn record(&mut self, user: &str, result: Result<(), DailiesError>) {
        match result {
            Ok(()) => self.succeeded.push(user.to_string()),
            Err(err) => {
                error!(job = %self.job, user, error = %err, "job failed for user; continuing");
                self.failed.push(UserFailure {
                    user: user.to_string(),
                    error: err.to_string(),
                });
            }
        }
    }
}

/// Archive each user's thread for `closed_day`.
pub fn run_daily_cleanup(
    ledger: &Ledger,
    closed_day: DayKey,
    collaborator: &mut dyn ThreadCollaborator,
) -> BatchOutcome {
    let mut outcome = BatchOutcome::new(Job::DailyCleanup);
    for user in ledger.user_ids() {
        match thread_ref(ledger, user, closed_day) {
            Some(reference) => outcome.record(user, collaborator.archive_thread(reference)),
            None => outcome.skipped.push(user.to_string()),
        }
    }
    info!(
        day = %closed_day,
        archived = outcome.succeeded.len(),
        failed = outcome.failed.len(),
        "daily cleanup finished"
    );
    outcome
}

/// Build and deliver the week ending at `reference` for every user.
pub fn run_weekly_reports(
    ledger: &Ledger,
    reference: DayKey,
    notifier: &mut dyn Notifier,
) -> BatchOutcome {
    let mut outcome = BatchOutcome::new(Job::WeeklyReport);
    for user in ledger.user_ids() {
        let report = weekly_report(ledger, user, reference);
        outcome.record(user, notifier.deliver(&Notification::WeeklyReport { report }));
    }
    info!(
        reference = %reference,
        delivered = outcome.succeeded.len(),
        failed = outcome.failed.len(),
        "weekly reports finished"
    );
    outcome
}
