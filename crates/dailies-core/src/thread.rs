//! Binding between a user-day and the chat thread that displays it.
//!
//! The ledger only stores an opaque reference per [`DayRecord`]; opening and
//! archiving threads is done by a [`ThreadCollaborator`] supplied by the
//! caller.
//!
//! [`DayRecord`]: crate::model::DayRecord

use tracing::debug;

use crate::clock::DayKey;
use crate::error::{DailiesError, ErrorCode, Result};
use crate::model::Ledger;
use crate::store::LedgerStore;

/// External service that owns the actual threads.
pub trait ThreadCollaborator {
    /// Open a thread titled `title` for `(user, day)` and return its reference.
    ///
    /// # Errors
    ///
    /// Returns a collaborator error when the thread cannot be created.
    fn open_thread(&mut self, user: &str, day: DayKey, title: &str) -> Result<String>;

    /// Archive a previously opened thread.
    ///
    /// # Errors
    ///
    /// Returns a collaborator error when the thread cannot be archived.
    fn archive_thread(&mut self, thread_ref: &str) -> Result<()>;
}

/// Title used when opening the thread for `day`.
#[must_use]
pub fn thread_title(day: DayKey) -> String {
    format!("{} to-dos", day.label())
}

/// Stored reference for `(user, day)`, if any. Never creates the day.
#[must_use]
pub fn thread_ref<'a>(ledger: &'a Ledger, user: &str, day: DayKey) -> Option<&'a str> {
    ledger.day(user, day)?.external_thread_ref()
}

/// Store `thread_ref` for `(user, day)`, creating the day if needed.
///
/// Returns the reference it replaced.
///
/// # Errors
///
/// Returns a validation error for a blank reference.
pub fn bind_thread(
    ledger: &mut Ledger,
    user: &str,
    day: DayKey,
    thread_ref: &str,
) -> Result<Option<String>> {
    let trimmed = thread_ref.trim();
    if trimmed.is_empty() {
        return Err(DailiesError::validation(
            ErrorCode::InvalidThreadRef,
            "thread reference must not be empty",
        ));
    }
    let previous = ledger
        .day_mut(user, day)
        .external_thread_ref
        .replace(trimmed.to_string());
    debug!(user, %day, thread_ref = trimmed, ?previous, "bound thread");
    Ok(previous)
}

/// The thread for `(user, day)`, opening one on first use.
///
/// The collaborator is only asked to open a thread after the saved ledger
/// shows none, and never while the write lock is held. The new reference is
/// then bound in its own short write cycle through [`adopt_thread`].
///
/// # Errors
///
/// Propagates the collaborator's error, leaving the ledger unchanged, and
/// any error from the binding write cycle.
pub fn ensure_thread(
    store: &LedgerStore,
    user: &str,
    day: DayKey,
    collaborator: &mut dyn ThreadCollaborator,
) -> Result<String> {
    if let Some(existing) = thread_ref(&store.load(), user, day) {
        return Ok(existing.to_string());
    }
    let opened = collaborator.open_thread(user, day, &thread_title(day))?;
    store.transact(|ledger| adopt_thread(ledger, user, day, &opened))
}

/// Bind a freshly opened thread unless the day already has one.
///
/// Returns the reference now in effect for the day.
///
/// # Errors
///
/// Returns a validation error for a blank reference.
pub fn adopt_thread(ledger: &mut Ledger, user: &str, day: DayKey, opened: &str) -> Result<String> {
    if let Some(existing) = thread_ref(ledger, user, day) {
        debug!(user, %day, existing, opened, "day already has a thread; keeping it");
        return Ok(existing.to_string());
    }
    bind_thread(ledger, user, day, opened)?;
    Ok(opened.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> DayKey {
        s.parse().expect("day key")
    }

    #[derive(Default)]
    struct FakeThreads {
        opened: Vec<String>,
        fail: bool,
    }

    impl ThreadCollaborator for FakeThreads {
        fn open_thread(&mut self, user: &str, day: DayKey, title: &str) -> Result<String> {
            if self.fail {
                return Err(DailiesError::collaborator("threads", "gateway unavailable"));
            }
            self.opened.push(title.to_string());
            Ok(format!("{user}/{day}"))
        }

        fn archive_thread(&mut self, _thread_ref: &str) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn lookup_never_creates_and_bind_returns_previous() {
        let mut ledger = Ledger::new();
        let day = key("2024-03-10");
        assert_eq!(thread_ref(&ledger, "u", day), None);
        assert!(ledger.is_empty());

        assert_eq!(bind_thread(&mut ledger, "u", day, "t1").expect("bind"), None);
        assert_eq!(
            bind_thread(&mut ledger, "u", day, " t2 ").expect("rebind"),
            Some("t1".to_string())
        );
        assert_eq!(thread_ref(&ledger, "u", day), Some("t2"));
    }

    #[test]
    fn blank_reference_is_rejected() {
        let mut ledger = Ledger::new();
        let err = bind_thread(&mut ledger, "u", key("2024-03-10"), "   ").expect_err("blank");
        assert_eq!(err.code(), ErrorCode::InvalidThreadRef);
        assert!(ledger.is_empty());
    }

    #[test]
    fn ensure_opens_once_then_reuses() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = LedgerStore::in_dir(dir.path());
        let mut threads = FakeThreads::default();
        let day = key("2024-03-10");

        let first = ensure_thread(&store, "u", day, &mut threads).expect("open");
        let second = ensure_thread(&store, "u", day, &mut threads).expect("reuse");
        assert_eq!(first, "u/2024-03-10");
        assert_eq!(first, second);
        assert_eq!(threads.opened, vec!["Mar 10 (Sun) to-dos"]);
        assert_eq!(thread_ref(&store.load(), "u", day), Some("u/2024-03-10"));
    }

    #[test]
    fn collaborator_failure_writes_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = LedgerStore::in_dir(dir.path());
        let mut threads = FakeThreads {
            fail: true,
            ..FakeThreads::default()
        };
        let err = ensure_thread(&store, "u", key("2024-03-10"), &mut threads)
            .expect_err("gateway down");
        assert_eq!(err.code(), ErrorCode::CollaboratorFailed);
        assert!(!store.path().exists());
    }

    #[test]
    fn adopt_keeps_a_thread_bound_in_the_meantime() {
        let mut ledger = Ledger::new();
        let day = key("2024-03-10");
        bind_thread(&mut ledger, "u", day, "first").expect("bind");

        assert_eq!(adopt_thread(&mut ledger, "u", day, "second").expect("adopt"), "first");
        assert_eq!(thread_ref(&ledger, "u", day), Some("first"));
        assert_eq!(adopt_thread(&mut ledger, "u", key("2024-03-11"), " new ").expect("adopt"), "new");
    }
}
