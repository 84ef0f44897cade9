//! Weekly completion report over a rolling 7-day window.

use serde::Serialize;

use crate::clock::{DayKey, WEEK_LEN, week_window};
use crate::model::{Ledger, TaskRecord};

/// Completed task texts shown per day before collapsing into `+N more`.
pub const COMPLETED_PREVIEW_LIMIT: usize = 5;

/// One day with at least one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DaySummary {
    pub day: DayKey,
    pub label: String,
    pub completed: usize,
    pub total: usize,
    /// Every completed task's text, in list order.
    pub completed_texts: Vec<String>,
}

impl DaySummary {
    /// Display lines for completed tasks: at most
    /// [`COMPLETED_PREVIEW_LIMIT`] texts, then `+N more` when truncated.
    #[must_use]
    pub fn completed_preview(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .completed_texts
            .iter()
            .take(COMPLETED_PREVIEW_LIMIT)
            .cloned()
            .collect();
        let hidden = self
            .completed_texts
            .len()
            .saturating_sub(COMPLETED_PREVIEW_LIMIT);
        if hidden > 0 {
            lines.push(format!("+{hidden} more"));
        }
        lines
    }
}

/// Per-day detail, or an explicit marker for a week without any task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "days", rename_all = "snake_case")]
pub enum WeekActivity {
    NoActivity,
    Active(Vec<DaySummary>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeeklyReport {
    pub user: String,
    /// First (oldest) day of the window.
    pub start: DayKey,
    /// Reference day; last day of the window.
    pub end: DayKey,
    pub total_tasks: usize,
    pub total_completed: usize,
    /// Percentage rounded to the nearest integer; 0 when there are no tasks.
    pub completion_rate: u32,
    pub activity: WeekActivity,
}

impl WeeklyReport {
    #[must_use]
    pub const fn has_activity(&self) -> bool {
        matches!(self.activity, WeekActivity::Active(_))
    }

    /// Day summaries; empty for a week with no activity.
    #[must_use]
    pub fn days(&self) -> &[DaySummary] {
        match &self.activity {
            WeekActivity::NoActivity => &[],
            WeekActivity::Active(days) => days,
        }
    }
}

/// `round(100 * completed / total)`, half up, and 0 for an empty window.
#[must_use]
pub fn completion_rate(completed: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    let completed = completed.min(total) as u128;
    let total = total as u128;
    let rounded = (200 * completed + total) / (2 * total);
    u32::try_from(rounded).unwrap_or(100)
}

/// Aggregate `user`'s seven days ending at `reference`.
#[must_use]
pub fn weekly_report(ledger: &Ledger, user: &str, reference: DayKey) -> WeeklyReport {
    let window: [DayKey; WEEK_LEN] = week_window(reference);
    let mut total_tasks = 0;
    let mut total_completed = 0;
    let mut days = Vec::new();

    for day in window {
        let Some(record) = ledger.day(user, day) else {
            continue;
        };
        let completed = record.completed_count();
        total_tasks += record.len();
        total_completed += completed;

        if record.is_empty() {
            continue;
        }
        days.push(DaySummary {
            day,
            label: day.label(),
            completed,
            total: record.len(),
            completed_texts: record
                .tasks()
                .iter()
                .filter(|task| task.is_completed())
                .map(TaskRecord::text)
                .map(str::to_string)
                .collect(),
        });
    }

    let activity = if days.is_empty() {
        WeekActivity::NoActivity
    } else {
        WeekActivity::Active(days)
    };

    WeeklyReport {
        user: user.to_string(),
        start: window[0],
        end: reference,
        total_tasks,
        total_completed,
        completion_rate: completion_rate(total_completed, total_tasks),
        activity,
    }
}
