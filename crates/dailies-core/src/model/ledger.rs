//! The full multi-user, multi-day task collection.
//!
//! A [`Ledger`] is the explicit snapshot every core operation reads and
//! mutates. It is loaded and saved as one unit by [`crate::store`].
//!
//! # On-disk format
//!
//! ```json
//! { "version": 1,
//!   "users": { "<user id>": { "2024-03-09": { "externalThreadRef": null,
//!                                             "tasks": [ ... ] } } } }
//! ```
//!
//! Two older shapes are accepted on read and rewritten in the current shape
//! on the next save:
//!
//! - a bare `user → day → record` map without the version wrapper;
//! - a bare `user → [task]` map with no day buckets, where each task is
//!   filed under the UTC day of its `createdAt`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::day::DayRecord;
use super::task::{TaskId, TaskRecord};
use crate::clock::{DayClock, DayKey};
use crate::ids::IdGenerator;

/// Current on-disk schema version.
pub const LEDGER_VERSION: u32 = 1;

type UserDays = BTreeMap<DayKey, DayRecord>;

#[derive(Debug, Clone, Default)]
pub struct Ledger {
    users: BTreeMap<String, UserDays>,
    ids: IdGenerator,
}

impl PartialEq for Ledger {
    fn eq(&self, other: &Self) -> bool {
        self.users == other.users
    }
}

impl Eq for Ledger {}

impl Ledger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn from_users(users: BTreeMap<String, UserDays>) -> Self {
        let ids = IdGenerator::seeded(
            users
                .values()
                .flat_map(BTreeMap::values)
                .flat_map(|day| day.tasks.iter().map(TaskRecord::id)),
        );
        Self { users, ids }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// User ids in stable (sorted) order.
    pub fn user_ids(&self) -> impl Iterator<Item = &str> {
        self.users.keys().map(String::as_str)
    }

    #[must_use]
    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    #[must_use]
    pub fn day_count(&self) -> usize {
        self.users.values().map(BTreeMap::len).sum()
    }

    #[must_use]
    pub fn task_count(&self) -> usize {
        self.users
            .values()
            .flat_map(BTreeMap::values)
            .map(DayRecord::len)
            .sum()
    }

    /// Existing record for `(user, day)`; never creates one.
    #[must_use]
    pub fn day(&self, user: &str, day: DayKey) -> Option<&DayRecord> {
        self.users.get(user)?.get(&day)
    }

    /// All of one user's days, oldest first.
    pub fn days(&self, user: &str) -> impl Iterator<Item = (DayKey, &DayRecord)> {
        self.users
            .get(user)
            .into_iter()
            .flat_map(|days| days.iter().map(|(key, record)| (*key, record)))
    }

    /// Record for `(user, day)`, created empty on first reference.
    pub fn day_mut(&mut self, user: &str, day: DayKey) -> &mut DayRecord {
        self.users
            .entry(user.to_string())
            .or_default()
            .entry(day)
            .or_default()
    }

    /// Existing record for `(user, day)`, mutably; never creates one.
    pub fn existing_day_mut(&mut self, user: &str, day: DayKey) -> Option<&mut DayRecord> {
        self.users.get_mut(user)?.get_mut(&day)
    }

    /// Lazily created day record plus the id generator, borrowed together.
    pub(crate) fn day_with_ids(
        &mut self,
        user: &str,
        day: DayKey,
    ) -> (&mut DayRecord, &mut IdGenerator) {
        let record = self
            .users
            .entry(user.to_string())
            .or_default()
            .entry(day)
            .or_default();
        (record, &mut self.ids)
    }

    /// Repair records that violate `completed_at.is_some() == completed`.
    ///
    /// Returns the number of records changed.
    pub fn normalize(&mut self) -> usize {
        self.users
            .values_mut()
            .flat_map(BTreeMap::values_mut)
            .flat_map(|day| day.tasks.iter_mut())
            .map(TaskRecord::normalize)
            .filter(|changed| *changed)
            .count()
    }

    /// Serialize in the current on-disk shape.
    ///
    /// # Errors
    ///
    /// Returns the serializer error; with string keys this does not happen
    /// in practice.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&LedgerFileOut {
            version: LEDGER_VERSION,
            users: &self.users,
        })
    }

    /// Parse any accepted on-disk shape.
    ///
    /// # Errors
    ///
    /// Returns the parse error when the text matches none of the shapes.
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::new());
        }
        let users = match serde_json::from_str::<LedgerFileIn>(raw)? {
            LedgerFileIn::Versioned { version, users } => {
                if version > LEDGER_VERSION {
                    tracing::warn!(
                        version,
                        supported = LEDGER_VERSION,
                        "ledger written by a newer version; unknown fields are ignored"
                    );
                }
                users
            }
            LedgerFileIn::Unversioned(users) => users
                .into_iter()
                .map(|(user, entry)| (user, entry.into_days()))
                .collect(),
        };
        Ok(Self::from_users(users))
    }

    /// Every task id in the snapshot.
    pub fn task_ids(&self) -> impl Iterator<Item = &TaskId> {
        self.users
            .values()
            .flat_map(BTreeMap::values)
            .flat_map(|day| day.tasks.iter().map(TaskRecord::id))
    }
}

#[derive(Serialize)]
struct LedgerFileOut<'a> {
    version: u32,
    users: &'a BTreeMap<String, UserDays>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LedgerFileIn {
    Versioned {
        version: u32,
        #[serde(default)]
        users: BTreeMap<String, UserDays>,
    },
    Unversioned(BTreeMap<String, UserEntry>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum UserEntry {
    Days(UserDays),
    Flat(Vec<TaskRecord>),
}

impl UserEntry {
    fn into_days(self) -> UserDays {
        match self {
            Self::Days(days) => days,
            Self::Flat(tasks) => {
                let clock = DayClock::utc();
                let mut days = UserDays::new();
                for task in tasks {
                    days.entry(clock.day_of(task.created_at()))
                        .or_default()
                        .tasks
                        .push(task);
                }
                days
            }
        }
    }
}

/// Fresh incomplete task with a newly issued id.
pub(crate) fn new_task(ids: &mut IdGenerator, text: String, now: DateTime<Utc>) -> TaskRecord {
    TaskRecord::new(ids.next_id(now), text, now)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> DayKey {
        s.parse().expect("day key")
    }

    #[test]
    fn day_mut_creates_lazily_and_day_does_not() {
        let mut ledger = Ledger::new();
        assert!(ledger.day("u1", key("2024-03-09")).is_none());
        assert!(ledger.is_empty());

        ledger.day_mut("u1", key("2024-03-09"));
        assert!(ledger.day("u1", key("2024-03-09")).is_some());
        assert_eq!(ledger.day_count(), 1);
    }

    #[test]
    fn empty_text_loads_as_empty_ledger() {
        let ledger = Ledger::from_json("  \n").expect("parse");
        assert!(ledger.is_empty());
    }

    #[test]
    fn versioned_round_trip_is_stable() {
        let mut ledger = Ledger::new();
        let now = Utc::now();
        let (day, ids) = ledger.day_with_ids("u1", key("2024-03-09"));
        day.tasks.push(new_task(ids, "a".into(), now));
        day.external_thread_ref = Some("thread-9".into());

        let first = ledger.to_json_pretty().expect("serialize");
        let reloaded = Ledger::from_json(&first).expect("parse");
        assert_eq!(reloaded, ledger);
        assert_eq!(reloaded.to_json_pretty().expect("serialize"), first);
    }

    #[test]
    fn unversioned_day_map_is_accepted() {
        let raw = r#"{ "u1": { "2024-03-09": { "externalThreadRef": null, "tasks": [
            {"id": "t-5", "text": "a", "completed": false,
             "createdAt": "2024-03-09T01:00:00Z", "completedAt": null} ] } } }"#;
        let mut ledger = Ledger::from_json(raw).expect("parse");
        assert_eq!(ledger.task_count(), 1);
        let next = ledger.ids.next_id(DateTime::UNIX_EPOCH);
        assert_eq!(next.sequence(), Some(6));
    }

    #[test]
    fn flat_user_lists_are_bucketed_by_creation_day() {
        let raw = r#"{ "u1": [
            {"id": 1709942400000.1, "text": "a", "completed": true,
             "createdAt": "2024-03-09T01:00:00.000Z"},
            {"id": 1710028800000.2, "text": "b", "completed": false,
             "createdAt": "2024-03-10T01:00:00.000Z"} ] }"#;
        let mut ledger = Ledger::from_json(raw).expect("parse");
        assert_eq!(ledger.day_count(), 2);
        assert_eq!(ledger.normalize(), 1);
        let first = ledger.day("u1", key("2024-03-09")).expect("day");
        assert_eq!(first.tasks()[0].text(), "a");
        assert!(first.tasks()[0].completed_at().is_some());
    }

    #[test]
    fn garbage_is_a_parse_error() {
        assert!(Ledger::from_json("[1, 2, 3]").is_err());
        assert!(Ledger::from_json("{ not json").is_err());
    }
}
