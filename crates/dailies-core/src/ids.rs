//! Collision-free task id generation.
//!
//! Ids are `t-<n>` where `n` starts from the current time in microseconds and
//! is strictly increasing: each issued value is `max(now_us, last + 1)`. Bulk
//! inserts inside the same microsecond therefore get consecutive values
//! without sleeping, and a generator seeded from a loaded ledger never
//! re-issues an id already on disk.

use chrono::{DateTime, Utc};

use crate::model::task::TaskId;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdGenerator {
    last: u64,
}

impl IdGenerator {
    #[must_use]
    pub const fn new() -> Self {
        Self { last: 0 }
    }

    /// Generator that will only issue ids above every id in `existing`.
    pub fn seeded<'a>(existing: impl IntoIterator<Item = &'a TaskId>) -> Self {
        let last = existing
            .into_iter()
            .filter_map(TaskId::sequence)
            .max()
            .unwrap_or(0);
        Self { last }
    }

    pub fn next_id(&mut self, now: DateTime<Utc>) -> TaskId {
        let now_us = u64::try_from(now.timestamp_micros()).unwrap_or(0);
        let next = now_us.max(self.last.saturating_add(1));
        self.last = next;
        TaskId::from_sequence(next)
    }
}
