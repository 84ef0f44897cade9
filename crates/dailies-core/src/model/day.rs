use serde::{Deserialize, Serialize};

use super::task::TaskRecord;

/// One user's list for one day bucket.
///
/// Task order is insertion order; the user-facing number of a task is its
/// index plus one and shifts when an earlier task is deleted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayRecord {
    #[serde(default)]
    pub(crate) external_thread_ref: Option<String>,
    #[serde(default)]
    pub(crate) tasks: Vec<TaskRecord>,
}

impl DayRecord {
    #[must_use]
    pub fn tasks(&self) -> &[TaskRecord] {
        &self.tasks
    }

    #[must_use]
    pub fn external_thread_ref(&self) -> Option<&str> {
        self.external_thread_ref.as_deref()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.is_completed()).count()
    }

    /// Incomplete tasks in their original relative order.
    pub fn incomplete(&self) -> impl Iterator<Item = &TaskRecord> {
        self.tasks.iter().filter(|t| !t.is_completed())
    }
}
