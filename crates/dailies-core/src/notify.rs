//! Outbound notifications handed to the chat layer.

use serde::Serialize;

use crate::clock::DayKey;
use crate::error::Result;
use crate::model::TaskRecord;
use crate::report::WeeklyReport;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    /// Tasks were added to a day list; posted into the day's thread.
    TasksAdded {
        user: String,
        day: DayKey,
        thread_ref: Option<String>,
        tasks: Vec<String>,
    },
    /// Scheduled weekly summary for one user.
    WeeklyReport { report: WeeklyReport },
}

impl Notification {
    #[must_use]
    pub fn tasks_added(
        user: &str,
        day: DayKey,
        thread_ref: Option<&str>,
        tasks: &[TaskRecord],
    ) -> Self {
        Self::TasksAdded {
            user: user.to_string(),
            day,
            thread_ref: thread_ref.map(str::to_string),
            tasks: tasks.iter().map(|task| task.text().to_string()).collect(),
        }
    }

    /// User the notification is addressed to.
    #[must_use]
    pub fn user(&self) -> &str {
        match self {
            Self::TasksAdded { user, .. } => user,
            Self::WeeklyReport { report } => &report.user,
        }
    }
}

pub trait Notifier {
    /// Deliver one notification.
    ///
    /// # Errors
    ///
    /// Returns a collaborator error when delivery fails. Callers must not
    /// undo already-saved ledger changes because of it.
    fn deliver(&mut self, notification: &Notification) -> Result<()>;
}
