//! Advisory file lock serializing ledger read-modify-write cycles.
//!
//! Every mutating command holds [`LedgerLock`] from load until save, so two
//! processes acting on the same data directory never interleave their
//! snapshots. Readers that do not save skip the lock.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use fs2::FileExt;

use crate::error::{DailiesError, ErrorCode};

/// How long a writer waits for a competing writer by default.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

const RETRY_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug)]
pub enum LockError {
    Timeout { path: PathBuf, waited: Duration },
    Io { path: PathBuf, source: io::Error },
}

impl LockError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Timeout { .. } => ErrorCode::LockContention,
            Self::Io { .. } => ErrorCode::LedgerWriteFailed,
        }
    }
}

impl fmt::Display for LockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout { path, waited } => write!(
                f,
                "{}: ledger lock at {} still held after {waited:?}",
                self.code().code(),
                path.display()
            ),
            Self::Io { path, source } => write!(
                f,
                "{}: cannot open lock file {}: {source}",
                self.code().code(),
                path.display()
            ),
        }
    }
}

impl std::error::Error for LockError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Timeout { .. } => None,
            Self::Io { source, .. } => Some(source),
        }
    }
}

impl From<LockError> for DailiesError {
    fn from(err: LockError) -> Self {
        let code = err.code();
        match err {
            LockError::Timeout { path, waited } => Self::persistence(
                code,
                "lock",
                path,
                io::Error::new(
                    io::ErrorKind::WouldBlock,
                    format!("another writer held the lock for {waited:?}"),
                ),
            ),
            LockError::Io { path, source } => Self::persistence(code, "lock", path, source),
        }
    }
}

/// RAII exclusive lock on the ledger's lock file. Released on drop.
#[derive(Debug)]
pub struct LedgerLock {
    file: File,
    path: PathBuf,
}

impl LedgerLock {
    /// Acquire the lock, retrying until `timeout` elapses.
    ///
    /// # Errors
    ///
    /// [`LockError::Timeout`] when another holder keeps the lock past
    /// `timeout`, or [`LockError::Io`] when the lock file cannot be opened.
    pub fn acquire(path: &Path, timeout: Duration) -> Result<Self, LockError> {
        let io_err = |source| LockError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)
            .map_err(io_err)?;

        let start = Instant::now();
        while file.try_lock_exclusive().is_err() {
            if start.elapsed() >= timeout {
                return Err(LockError::Timeout {
                    path: path.to_path_buf(),
                    waited: start.elapsed(),
                });
            }
            thread::sleep(RETRY_INTERVAL);
        }

        tracing::trace!(path = %path.display(), "acquired ledger lock");
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release now instead of at end of scope.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for LedgerLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};

    fn lock_path(dir: &tempfile::TempDir) -> PathBuf {
        dir.path().join("nested").join("todos.lock")
    }

    #[test]
    fn acquire_creates_parent_and_releases() -> Result<(), LockError> {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = lock_path(&dir);
        let lock = LedgerLock::acquire(&path, Duration::from_millis(50))?;
        assert_eq!(lock.path(), path.as_path());
        lock.release();

        let _again = LedgerLock::acquire(&path, Duration::from_millis(50))?;
        Ok(())
    }

    #[test]
    fn second_writer_times_out_with_contention_code() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = lock_path(&dir);
        let _held = LedgerLock::acquire(&path, Duration::from_millis(50)).expect("first");

        let err = LedgerLock::acquire(&path, Duration::from_millis(20)).expect_err("contended");
        assert!(matches!(&err, LockError::Timeout { path: p, .. } if *p == path));

        let err: DailiesError = err.into();
        assert_eq!(err.code(), ErrorCode::LockContention);
    }

    #[test]
    fn waiter_proceeds_once_holder_releases() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = lock_path(&dir);
        let held = Arc::new(Barrier::new(2));

        let holder_path = path.clone();
        let holder_held = Arc::clone(&held);
        let holder = thread::spawn(move || {
            let _lock = LedgerLock::acquire(&holder_path, Duration::from_secs(1)).expect("holder");
            holder_held.wait();
            thread::sleep(Duration::from_millis(30));
        });

        held.wait();
        let waiter = LedgerLock::acquire(&path, Duration::from_secs(2));
        holder.join().expect("join");
        assert!(waiter.is_ok());
    }
}
