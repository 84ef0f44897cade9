use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Prefix of ids issued by [`crate::ids::IdGenerator`].
pub const TASK_ID_PREFIX: &str = "t-";

/// Opaque, never-reused task identifier.
///
/// Never shown as the user-facing task number; that is always `index + 1`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub(crate) fn from_sequence(value: u64) -> Self {
        Self(format!("{TASK_ID_PREFIX}{value}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Sequence value for ids issued by this crate; `None` for legacy ids.
    #[must_use]
    pub fn sequence(&self) -> Option<u64> {
        self.0.strip_prefix(TASK_ID_PREFIX)?.parse().ok()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for TaskId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Older snapshots stored fractional millisecond timestamps as numbers.
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Int(u64),
            Float(f64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(text) => Self(text),
            RawId::Int(value) => Self(value.to_string()),
            RawId::Float(value) => Self(value.to_string()),
        })
    }
}

/// One to-do item inside a day's list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    id: TaskId,
    text: String,
    #[serde(default)]
    completed: bool,
    created_at: DateTime<Utc>,
    #[serde(default)]
    completed_at: Option<DateTime<Utc>>,
}

impl TaskRecord {
    pub(crate) const fn new(id: TaskId, text: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            text,
            completed: false,
            created_at,
            completed_at: None,
        }
    }

    #[must_use]
    pub const fn id(&self) -> &TaskId {
        &self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub const fn is_completed(&self) -> bool {
        self.completed
    }

    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub const fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Mark complete. `completed_at` is only stamped on the false → true
    /// transition, so repeating the call keeps the first timestamp.
    pub(crate) fn mark_completed(&mut self, now: DateTime<Utc>) -> bool {
        if self.completed {
            return false;
        }
        self.completed = true;
        self.completed_at = Some(now);
        true
    }

    /// Restore `completed_at.is_some() == completed` on records read from disk.
    ///
    /// Returns true when the record was changed.
    pub(crate) fn normalize(&mut self) -> bool {
        match (self.completed, self.completed_at) {
            (true, None) => {
                self.completed_at = Some(self.created_at);
                true
            }
            (false, Some(_)) => {
                self.completed_at = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(raw: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(raw)
            .expect("timestamp")
            .with_timezone(&Utc)
    }

    #[test]
    fn json_uses_camel_case_and_nullable_completed_at() {
        let task = TaskRecord::new(
            TaskId::from_sequence(7),
            "buy milk".into(),
            ts("2024-03-09T10:00:00Z"),
        );
        let json = serde_json::to_value(&task).expect("serialize");
        assert_eq!(json["id"], "t-7");
        assert_eq!(json["text"], "buy milk");
        assert_eq!(json["completed"], false);
        assert!(json["createdAt"].is_string());
        assert!(json["completedAt"].is_null());
    }

    #[test]
    fn legacy_numeric_ids_are_accepted() {
        let raw = r#"{"id": 1710000000000.5, "text": "x", "completed": false,
                      "createdAt": "2024-03-09T10:00:00.000Z"}"#;
        let task: TaskRecord = serde_json::from_str(raw).expect("parse");
        assert_eq!(task.id().as_str(), "1710000000000.5");
        assert_eq!(task.id().sequence(), None);
        assert!(task.completed_at().is_none());
    }

    #[test]
    fn mark_completed_only_stamps_once() {
        let mut task = TaskRecord::new(
            TaskId::from_sequence(1),
            "a".into(),
            ts("2024-03-09T10:00:00Z"),
        );
        assert!(task.mark_completed(ts("2024-03-09T11:00:00Z")));
        assert!(!task.mark_completed(ts("2024-03-09T12:00:00Z")));
        assert!(task.is_completed());
        assert_eq!(task.completed_at(), Some(ts("2024-03-09T11:00:00Z")));
    }

    #[test]
    fn normalize_repairs_completion_invariant() {
        let raw = r#"{"id": "t-1", "text": "x", "completed": true,
                      "createdAt": "2024-03-09T10:00:00Z"}"#;
        let mut task: TaskRecord = serde_json::from_str(raw).expect("parse");
        assert!(task.normalize());
        assert_eq!(task.completed_at(), Some(task.created_at()));
        assert!(!task.normalize());
    }
}
