//! Durable storage for the [`Ledger`].
//!
//! The ledger lives in one JSON file. Saves write a sibling temp file, fsync
//! it, and rename it over the target, so a crash leaves either the previous
//! or the new snapshot on disk and never a torn one.
//!
//! Read-only loading never fails: a missing, unreadable, or malformed file
//! reads as an empty ledger. A write cycle is stricter. Before it treats a
//! bad file as empty it copies the file to `<name>.corrupt-<timestamp>`, and
//! it refuses to go on when that copy cannot be made.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::error::{DailiesError, ErrorCode, Result};
use crate::lock::{DEFAULT_LOCK_TIMEOUT, LedgerLock};
use crate::model::Ledger;

pub const LEDGER_FILE: &str = "todos.json";
pub const LOCK_FILE: &str = "todos.lock";
pub const QUARANTINE_SUFFIX: &str = "corrupt";

const QUARANTINE_STAMP: &str = "%Y%m%dT%H%M%S%.3fZ";
const QUARANTINE_ATTEMPTS: usize = 100;

/// What [`LedgerStore::inspect`] found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerState {
    /// No ledger file yet.
    Missing,
    /// Parsed cleanly.
    Healthy {
        users: usize,
        days: usize,
        tasks: usize,
    },
    /// Present but unusable; loading would start from empty.
    Corrupt { reason: String },
}

#[derive(Debug, Clone)]
pub struct LedgerStore {
    path: PathBuf,
    lock_path: PathBuf,
}

enum ReadOutcome {
    Missing,
    Parsed(Ledger),
    Failed(String),
}

impl LedgerStore {
    /// Store backed by `path`, locking through a sibling `todos.lock`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let lock_path = path.with_file_name(LOCK_FILE);
        Self { path, lock_path }
    }

    /// Store using the default file names inside `dir`.
    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(LEDGER_FILE))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File-name prefix shared by every quarantined copy of this ledger.
    #[must_use]
    pub fn quarantine_prefix(&self) -> String {
        let name = self
            .path
            .file_name()
            .map_or_else(|| LEDGER_FILE.into(), |name| name.to_string_lossy());
        format!("{name}.{QUARANTINE_SUFFIX}-")
    }

    fn quarantine_candidate(&self, stamp: &str, attempt: usize) -> PathBuf {
        let name = if attempt == 0 {
            format!("{}{stamp}", self.quarantine_prefix())
        } else {
            format!("{}{stamp}-{attempt}", self.quarantine_prefix())
        };
        self.path.with_file_name(name)
    }

    fn read(&self) -> ReadOutcome {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return ReadOutcome::Missing,
            Err(err) => return ReadOutcome::Failed(format!("read failed: {err}")),
        };
        match Ledger::from_json(&raw) {
            Ok(ledger) => ReadOutcome::Parsed(ledger),
            Err(err) => ReadOutcome::Failed(format!("parse failed: {err}")),
        }
    }

    /// Current ledger snapshot; empty when nothing usable is on disk.
    ///
    /// Tasks whose completion timestamp disagrees with their completion flag
    /// are repaired in the returned snapshot. Nothing is written, so a bad
    /// file stays where it is.
    #[must_use]
    pub fn load(&self) -> Ledger {
        match self.read() {
            ReadOutcome::Missing => {
                debug!(path = %self.path.display(), "no ledger yet; starting empty");
                Ledger::new()
            }
            ReadOutcome::Parsed(ledger) => normalized(ledger),
            ReadOutcome::Failed(reason) => {
                warn!(path = %self.path.display(), reason, "ledger unusable; reading as empty");
                Ledger::new()
            }
        }
    }

    /// Snapshot for a write cycle that will replace the file.
    ///
    /// A bad file is first copied to a fresh `<name>.corrupt-<timestamp>`.
    ///
    /// # Errors
    ///
    /// Returns a persistence error with [`ErrorCode::LedgerReadFailed`] when
    /// that copy cannot be made, so the caller never overwrites the only copy.
    pub fn load_for_write(&self, now: DateTime<Utc>) -> Result<Ledger> {
        match self.read() {
            ReadOutcome::Missing => Ok(Ledger::new()),
            ReadOutcome::Parsed(ledger) => Ok(normalized(ledger)),
            ReadOutcome::Failed(reason) => {
                let copy = self.quarantine(now)?;
                warn!(
                    path = %self.path.display(),
                    copy = %copy.display(),
                    reason,
                    "ledger unusable; starting empty and keeping a copy"
                );
                Ok(Ledger::new())
            }
        }
    }

    fn quarantine(&self, now: DateTime<Utc>) -> Result<PathBuf> {
        let stamp = now.format(QUARANTINE_STAMP).to_string();
        for attempt in 0..QUARANTINE_ATTEMPTS {
            let target = self.quarantine_candidate(&stamp, attempt);
            let mut copy = match OpenOptions::new().write(true).create_new(true).open(&target) {
                Ok(file) => file,
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(err) => return Err(quarantine_failed(&target, err)),
            };
            let copied = File::open(&self.path)
                .and_then(|mut source| io::copy(&mut source, &mut copy))
                .and_then(|_| copy.sync_all());
            return match copied {
                Ok(()) => Ok(target),
                Err(err) => {
                    drop(copy);
                    let _ = fs::remove_file(&target);
                    Err(quarantine_failed(&self.path, err))
                }
            };
        }
        Err(quarantine_failed(
            &self.path,
            io::Error::new(io::ErrorKind::AlreadyExists, "no free quarantine file name"),
        ))
    }

    /// Read-only check of the on-disk ledger; never quarantines.
    #[must_use]
    pub fn inspect(&self) -> LedgerState {
        match self.read() {
            ReadOutcome::Missing => LedgerState::Missing,
            ReadOutcome::Parsed(ledger) => LedgerState::Healthy {
                users: ledger.user_count(),
                days: ledger.day_count(),
                tasks: ledger.task_count(),
            },
            ReadOutcome::Failed(reason) => LedgerState::Corrupt { reason },
        }
    }

    /// Durably replace the stored snapshot with `ledger`.
    ///
    /// # Errors
    ///
    /// Returns a persistence error when the file cannot be written. The
    /// previous snapshot is left in place in that case.
    pub fn save(&self, ledger: &Ledger) -> Result<()> {
        let json = ledger.to_json_pretty().map_err(|err| {
            DailiesError::persistence(
                ErrorCode::LedgerWriteFailed,
                "serialize",
                &self.path,
                io::Error::new(io::ErrorKind::InvalidData, err),
            )
        })?;
        write_atomically(&self.path, json.as_bytes(), ErrorCode::LedgerWriteFailed)?;
        debug!(path = %self.path.display(), tasks = ledger.task_count(), "saved ledger");
        Ok(())
    }

    /// Exclusive lock for a read-modify-write cycle.
    ///
    /// # Errors
    ///
    /// Returns a persistence error with [`ErrorCode::LockContention`] when
    /// another writer holds the lock past the configured timeout.
    pub fn lock(&self) -> Result<LedgerLock> {
        Ok(LedgerLock::acquire(&self.lock_path, DEFAULT_LOCK_TIMEOUT)?)
    }

    /// Load, apply `mutate`, and save only if it succeeds, all under the lock.
    ///
    /// An error from `mutate` discards the modified snapshot, so a failed
    /// operation never leaves a partial mutation on disk.
    ///
    /// # Errors
    ///
    /// Propagates lock, quarantine, mutation, and save errors.
    pub fn transact<T>(&self, mutate: impl FnOnce(&mut Ledger) -> Result<T>) -> Result<T> {
        let _lock = self.lock()?;
        let mut ledger = self.load_for_write(Utc::now())?;
        let value = mutate(&mut ledger)?;
        self.save(&ledger)?;
        Ok(value)
    }
}

fn quarantine_failed(path: &Path, err: io::Error) -> DailiesError {
    DailiesError::persistence(ErrorCode::LedgerReadFailed, "quarantine", path, err)
}

fn normalized(mut ledger: Ledger) -> Ledger {
    let repaired = ledger.normalize();
    if repaired > 0 {
        info!(repaired, "normalized completion timestamps");
    }
    ledger
}

/// Write `bytes` to `path` through a fsynced temp file and a rename.
///
/// # Errors
///
/// Returns a persistence error tagged with `code`; the temp file is removed
/// on failure.
pub fn write_atomically(path: &Path, bytes: &[u8], code: ErrorCode) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|err| DailiesError::persistence(code, "create directory", parent, err))?;
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp = PathBuf::from(tmp_name);

    let written = File::create(&tmp).and_then(|mut file| {
        file.write_all(bytes)?;
        file.sync_all()
    });
    if let Err(err) = written {
        let _ = fs::remove_file(&tmp);
        return Err(DailiesError::persistence(code, "write", &tmp, err));
    }

    fs::rename(&tmp, path).map_err(|err| {
        let _ = fs::remove_file(&tmp);
        DailiesError::persistence(code, "replace", path, err)
    })
}
