//! Add, list, complete, and delete on a single user-day list.
//!
//! The per-day functions (`add_many`, `list`, `complete`, `delete`) work on a
//! [`DayRecord`] directly. The `*_task(s)` wrappers resolve the record inside
//! a [`Ledger`] snapshot, creating it lazily only for `add_tasks`.
//!
//! Positions are 1-based views over the current order and are never stored.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::clock::DayKey;
use crate::error::{DailiesError, ErrorCode, Result};
use crate::ids::IdGenerator;
use crate::model::ledger::new_task;
use crate::model::{DayRecord, Ledger, TaskRecord};

/// Separator between tasks in a single add command.
pub const TASK_SEPARATOR: char = ',';

/// Split raw input on commas, trim, and drop empty segments.
#[must_use]
pub fn split_task_text(raw: &str) -> Vec<String> {
    raw.split(TASK_SEPARATOR)
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_task_text(raw: &str) -> Result<Vec<String>> {
    let segments = split_task_text(raw);
    if segments.is_empty() {
        return Err(DailiesError::validation(
            ErrorCode::EmptyTaskText,
            "enter at least one task (separate several with commas)",
        ));
    }
    Ok(segments)
}

/// Append one task per non-empty comma-separated segment of `raw`.
///
/// Returns the added tasks in input order.
///
/// # Errors
///
/// Returns a validation error, leaving `day` untouched, when no segment
/// survives trimming.
pub fn add_many(
    day: &mut DayRecord,
    ids: &mut IdGenerator,
    raw: &str,
    now: DateTime<Utc>,
) -> Result<Vec<TaskRecord>> {
    let segments = parse_task_text(raw)?;
    Ok(append(day, ids, segments, now))
}

fn append(
    day: &mut DayRecord,
    ids: &mut IdGenerator,
    texts: Vec<String>,
    now: DateTime<Utc>,
) -> Vec<TaskRecord> {
    let start = day.tasks.len();
    day.tasks
        .extend(texts.into_iter().map(|text| new_task(ids, text, now)));
    day.tasks[start..].to_vec()
}

/// `(position, task)` pairs with 1-based positions.
#[must_use]
pub fn list(day: &DayRecord) -> Vec<(usize, &TaskRecord)> {
    day.tasks
        .iter()
        .enumerate()
        .map(|(index, task)| (index + 1, task))
        .collect()
}

fn index_of(day: &DayRecord, position: usize) -> Result<usize> {
    if position == 0 || position > day.tasks.len() {
        return Err(DailiesError::Range {
            position,
            len: day.tasks.len(),
        });
    }
    Ok(position - 1)
}

/// Mark the task at `position` complete and return it.
///
/// Completing an already-completed task is a no-op that keeps the original
/// `completed_at`.
///
/// # Errors
///
/// Returns a range error when `position` is outside `1..=len`.
pub fn complete(day: &mut DayRecord, position: usize, now: DateTime<Utc>) -> Result<TaskRecord> {
    let index = index_of(day, position)?;
    let task = &mut day.tasks[index];
    if !task.mark_completed(now) {
        debug!(position, id = %task.id(), "task already completed");
    }
    Ok(task.clone())
}

/// Remove and return the task at `position`; later tasks shift down by one.
///
/// # Errors
///
/// Returns a range error when `position` is outside `1..=len`.
pub fn delete(day: &mut DayRecord, position: usize) -> Result<TaskRecord> {
    let index = index_of(day, position)?;
    Ok(day.tasks.remove(index))
}

/// Add comma-separated tasks to `(user, day)`, creating the day on first use.
///
/// # Errors
///
/// Returns a validation error when `text` has no non-empty segment. The
/// ledger is not touched in that case, not even to create the day.
pub fn add_tasks(
    ledger: &mut Ledger,
    user: &str,
    day: DayKey,
    text: &str,
    now: DateTime<Utc>,
) -> Result<Vec<TaskRecord>> {
    let segments = parse_task_text(text)?;
    let (record, ids) = ledger.day_with_ids(user, day);
    let added = append(record, ids, segments, now);
    debug!(user, %day, count = added.len(), "added tasks");
    Ok(added)
}

/// Numbered tasks for `(user, day)`; empty when the day has no record.
#[must_use]
pub fn list_tasks<'a>(ledger: &'a Ledger, user: &str, day: DayKey) -> Vec<(usize, &'a TaskRecord)> {
    ledger.day(user, day).map(list).unwrap_or_default()
}

/// Complete the task numbered `position` in `(user, day)`.
///
/// # Errors
///
/// Returns a range error when the day has no such task.
pub fn complete_task(
    ledger: &mut Ledger,
    user: &str,
    day: DayKey,
    position: usize,
    now: DateTime<Utc>,
) -> Result<TaskRecord> {
    let record = ledger
        .existing_day_mut(user, day)
        .ok_or(DailiesError::Range { position, len: 0 })?;
    let task = complete(record, position, now)?;
    debug!(user, %day, position, id = %task.id(), "completed task");
    Ok(task)
}

/// Delete the task numbered `position` in `(user, day)`.
///
/// # Errors
///
/// Returns a range error when the day has no such task.
pub fn delete_task(
    ledger: &mut Ledger,
    user: &str,
    day: DayKey,
    position: usize,
) -> Result<TaskRecord> {
    let record = ledger
        .existing_day_mut(user, day)
        .ok_or(DailiesError::Range { position, len: 0 })?;
    let task = delete(record, position)?;
    debug!(user, %day, position, id = %task.id(), "deleted task");
    Ok(task)
}
