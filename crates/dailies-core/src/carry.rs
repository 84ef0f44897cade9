//! Carry-over of unfinished tasks from an earlier day.
//!
//! Positions in a [`CarrySelector`] number the source day's *incomplete*
//! tasks only: with `[a ✅, b ⬜, c ⬜]`, position 1 is `b` and 2 is `c`.
//! The source day is never modified; each selected task is copied into the
//! destination with a fresh id and a `[carried] ` prefix.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::clock::DayKey;
use crate::error::{DailiesError, ErrorCode, Result};
use crate::model::ledger::new_task;
use crate::model::{DayRecord, Ledger, TaskRecord};

/// Lineage marker prepended to carried task text.
pub const CARRIED_PREFIX: &str = "[carried] ";

/// Which incomplete tasks to carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CarrySelector {
    All,
    /// 1-based positions into the incomplete subset, in request order.
    /// Values below 1 are kept so they can be reported as skipped.
    Positions(Vec<i64>),
}

impl fmt::Display for CarrySelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Positions(positions) => {
                let joined: Vec<String> = positions.iter().map(ToString::to_string).collect();
                f.write_str(&joined.join(","))
            }
        }
    }
}

impl FromStr for CarrySelector {
    type Err = DailiesError;

    /// Accepts `all` or numbers separated by commas and/or whitespace.
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("all") || trimmed == "*" {
            return Ok(Self::All);
        }

        let tokens: Vec<&str> = trimmed
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|token| !token.is_empty())
            .collect();
        if tokens.is_empty() {
            return Err(invalid_selector(s));
        }

        let mut positions = Vec::with_capacity(tokens.len());
        for token in tokens {
            let position: i64 = token.parse().map_err(|_| invalid_selector(s))?;
            if !positions.contains(&position) {
                positions.push(position);
            }
        }
        Ok(Self::Positions(positions))
    }
}

fn invalid_selector(raw: &str) -> DailiesError {
    DailiesError::validation(
        ErrorCode::InvalidSelector,
        format!("'{raw}' is neither `all` nor a list of task numbers"),
    )
}

/// Result of a successful carry-over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Carried {
    /// Newly created destination tasks, in selection order.
    pub tasks: Vec<TaskRecord>,
    /// Requested positions that did not name an incomplete task.
    pub skipped: Vec<i64>,
}

/// Incomplete tasks of `source` picked by `selector`, plus skipped positions.
#[must_use]
pub fn select<'a>(source: &'a DayRecord, selector: &CarrySelector) -> (Vec<&'a TaskRecord>, Vec<i64>) {
    let incomplete: Vec<&TaskRecord> = source.incomplete().collect();
    match selector {
        CarrySelector::All => (incomplete, Vec::new()),
        CarrySelector::Positions(positions) => {
            let mut selected = Vec::new();
            let mut skipped = Vec::new();
            for &position in positions {
                let task = usize::try_from(position)
                    .ok()
                    .and_then(|p| p.checked_sub(1))
                    .and_then(|index| incomplete.get(index));
                match task {
                    Some(task) => selected.push(*task),
                    None => skipped.push(position),
                }
            }
            (selected, skipped)
        }
    }
}

/// Copy selected unfinished tasks of `(user, from)` into `(user, to)`.
///
/// # Errors
///
/// - validation error when `from == to`;
/// - validation error ("no valid items to carry") when the selection is
///   empty, including when `from` has no record or no incomplete tasks.
///
/// On error neither day is created or modified.
pub fn carry_over(
    ledger: &mut Ledger,
    user: &str,
    from: DayKey,
    to: DayKey,
    selector: &CarrySelector,
    now: DateTime<Utc>,
) -> Result<Carried> {
    if from == to {
        return Err(DailiesError::validation(
            ErrorCode::CarryIntoSameDay,
            format!("cannot carry {from} into itself"),
        ));
    }

    let (texts, skipped) = match ledger.day(user, from) {
        Some(source) => {
            let (selected, skipped) = select(source, selector);
            let texts: Vec<String> = selected
                .iter()
                .map(|task| format!("{CARRIED_PREFIX}{}", task.text()))
                .collect();
            (texts, skipped)
        }
        None => (Vec::new(), Vec::new()),
    };

    if texts.is_empty() {
        return Err(DailiesError::validation(
            ErrorCode::NothingToCarry,
            format!("no valid items to carry from {from}"),
        ));
    }

    let (destination, ids) = ledger.day_with_ids(user, to);
    let start = destination.tasks.len();
    destination
        .tasks
        .extend(texts.into_iter().map(|text| new_task(ids, text, now)));
    let tasks = destination.tasks[start..].to_vec();

    debug!(user, %from, %to, carried = tasks.len(), skipped = skipped.len(), "carried tasks");
    Ok(Carried { tasks, skipped })
}
