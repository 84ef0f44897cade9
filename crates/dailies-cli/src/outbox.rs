//! Append-only JSON-lines outbox consumed by the chat adapter.
//!
//! Each thread request or notification becomes one line in
//! `<data dir>/outbox.jsonl`. The adapter tails the file, performs the
//! platform calls, and is the only component that talks to the network.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use dailies_core::notify::{Notification, Notifier};
use dailies_core::thread::ThreadCollaborator;
use dailies_core::{DailiesError, DayKey, Result};
use serde::Serialize;
use serde_json::json;

const COLLABORATOR: &str = "outbox";

#[derive(Debug, Clone)]
pub struct Outbox {
    path: PathBuf,
    now: DateTime<Utc>,
}

#[derive(Serialize)]
struct Envelope<'a> {
    at: String,
    #[serde(flatten)]
    body: &'a serde_json::Value,
}

impl Outbox {
    pub fn new(path: impl Into<PathBuf>, now: DateTime<Utc>) -> Self {
        Self {
            path: path.into(),
            now,
        }
    }

    #[cfg(test)]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reference the adapter uses for the thread of `(user, day)`.
    pub fn thread_ref_for(user: &str, day: DayKey) -> String {
        format!("thread:{user}:{day}")
    }

    fn append(&self, body: &serde_json::Value) -> Result<()> {
        let line = serde_json::to_string(&Envelope {
            at: self.now.to_rfc3339_opts(SecondsFormat::Secs, true),
            body,
        })
        .map_err(|err| DailiesError::collaborator(COLLABORATOR, err.to_string()))?;

        open_append(&self.path)
            .and_then(|mut file| writeln!(file, "{line}"))
            .map_err(|err| {
                DailiesError::collaborator(
                    COLLABORATOR,
                    format!("cannot append to {}: {err}", self.path.display()),
                )
            })?;
        tracing::debug!(path = %self.path.display(), "queued outbox entry");
        Ok(())
    }
}

fn open_append(path: &Path) -> std::io::Result<fs::File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

impl ThreadCollaborator for Outbox {
    fn open_thread(&mut self, user: &str, day: DayKey, title: &str) -> Result<String> {
        let thread_ref = Self::thread_ref_for(user, day);
        self.append(&json!({
            "kind": "open_thread",
            "user": user,
            "day": day,
            "title": title,
            "thread_ref": thread_ref,
        }))?;
        Ok(thread_ref)
    }

    fn archive_thread(&mut self, thread_ref: &str) -> Result<()> {
        self.append(&json!({ "kind": "archive_thread", "thread_ref": thread_ref }))
    }
}

impl Notifier for Outbox {
    fn deliver(&mut self, notification: &Notification) -> Result<()> {
        let body = serde_json::to_value(notification)
            .map_err(|err| DailiesError::collaborator(COLLABORATOR, err.to_string()))?;
        self.append(&body)
    }
}
