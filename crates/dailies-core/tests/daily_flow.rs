//! End-to-end flows through the store and the core operations, plus
//! compatibility with ledger files written by earlier versions.
//!
//! Fixture files under `tests/fixtures/` are never modified once committed.

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, TimeDelta, Utc};
use dailies_core::carry::{CarrySelector, carry_over};
use dailies_core::report::{WeekActivity, weekly_report};
use dailies_core::settings::{SettingsPatch, SettingsStore};
use dailies_core::store::LedgerStore;
use dailies_core::tasks::{add_tasks, complete_task, delete_task, list_tasks};
use dailies_core::thread::thread_ref;
use dailies_core::{DayKey, ErrorCode, Ledger, TaskRecord};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn key(raw: &str) -> DayKey {
    raw.parse().expect("day key")
}

fn at(rfc3339: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(rfc3339)
        .expect("timestamp")
        .with_timezone(&Utc)
}

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn texts(ledger: &Ledger, user: &str, day: DayKey) -> Vec<String> {
    list_tasks(ledger, user, day)
        .into_iter()
        .map(|(_, task)| task.text().to_string())
        .collect()
}

// ---------------------------------------------------------------------------
// Flows
// ---------------------------------------------------------------------------

#[test]
fn a_day_then_carry_then_report() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = LedgerStore::in_dir(dir.path());
    let settings = SettingsStore::in_dir(dir.path());
    settings
        .save(&SettingsPatch {
            timezone: Some("+09:00".into()),
            ..SettingsPatch::default()
        })
        .expect("settings");
    let clock = settings.load().clock();

    // Saturday 2024-03-09, 09:00 local.
    let saturday = at("2024-03-09T00:00:00Z");
    let yesterday = clock.today(saturday);
    assert_eq!(yesterday, key("2024-03-09"));

    store
        .transact(|ledger| add_tasks(ledger, "U1", yesterday, "homework, groceries, workout", saturday))
        .expect("add");
    store
        .transact(|ledger| complete_task(ledger, "U1", yesterday, 1, saturday + TimeDelta::hours(3)))
        .expect("complete");

    // Sunday 00:30 local is already the next day.
    let sunday = at("2024-03-09T15:30:00Z");
    let today = clock.today(sunday);
    assert_eq!(today, key("2024-03-10"));
    assert_eq!(clock.yesterday(sunday), yesterday);

    let carried = store
        .transact(|ledger| {
            carry_over(ledger, "U1", yesterday, today, &"all".parse::<CarrySelector>()?, sunday)
        })
        .expect("carry");
    assert_eq!(carried.tasks.len(), 2);

    let ledger = store.load();
    assert_eq!(
        texts(&ledger, "U1", today),
        vec!["[carried] groceries", "[carried] workout"]
    );
    assert_eq!(texts(&ledger, "U1", yesterday).len(), 3);

    let report = weekly_report(&ledger, "U1", today);
    assert_eq!(report.total_tasks, 5);
    assert_eq!(report.total_completed, 1);
    assert_eq!(report.completion_rate, 20);
    assert_eq!(report.days().len(), 2);
}

#[test]
fn failed_operations_do_not_touch_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = LedgerStore::in_dir(dir.path());
    let now = Utc::now();

    let err = store
        .transact(|ledger| add_tasks(ledger, "U1", key("2024-03-10"), " , ", now))
        .expect_err("blank");
    assert_eq!(err.code(), ErrorCode::EmptyTaskText);
    assert!(!store.path().exists());

    store
        .transact(|ledger| add_tasks(ledger, "U1", key("2024-03-10"), "a", now))
        .expect("add");
    let err = store
        .transact(|ledger| delete_task(ledger, "U1", key("2024-03-10"), 2))
        .expect_err("range");
    assert!(err.is_range());
    assert_eq!(texts(&store.load(), "U1", key("2024-03-10")), vec!["a"]);
}

#[test]
fn users_do_not_see_each_other() {
    let mut ledger = Ledger::new();
    let day = key("2024-03-10");
    let now = Utc::now();
    add_tasks(&mut ledger, "alice", day, "a1, a2", now).expect("add");
    add_tasks(&mut ledger, "bob", day, "b1", now).expect("add");

    delete_task(&mut ledger, "bob", day, 1).expect("delete");
    assert_eq!(texts(&ledger, "alice", day), vec!["a1", "a2"]);
    assert!(texts(&ledger, "bob", day).is_empty());
    assert_eq!(
        weekly_report(&ledger, "bob", day).activity,
        WeekActivity::NoActivity
    );
}

// ---------------------------------------------------------------------------
// Format compatibility
// ---------------------------------------------------------------------------

#[test]
fn v1_fixture_loads_and_rewrites_stably() {
    let raw = fs::read_to_string(fixture("v1_ledger.json")).expect("fixture");
    let dir = tempfile::tempdir().expect("tempdir");
    let store = LedgerStore::in_dir(dir.path());
    fs::write(store.path(), &raw).expect("copy fixture");

    let ledger = store.load();
    assert_eq!(ledger.user_count(), 2);
    assert_eq!(
        thread_ref(&ledger, "U123", key("2024-03-09")),
        Some("thread:U123:2024-03-09")
    );
    // Empty day records survive a round trip.
    assert!(ledger.day("U456", key("2024-03-10")).is_some_and(|d| d.is_empty()));

    store.save(&ledger).expect("save");
    assert_eq!(store.load(), ledger);
}

#[test]
fn legacy_flat_fixture_is_bucketed_and_never_reuses_ids() {
    let raw = fs::read_to_string(fixture("legacy_flat.json")).expect("fixture");
    let mut ledger = Ledger::from_json(&raw).expect("legacy ledger");
    assert_eq!(ledger.normalize(), 1);

    assert_eq!(
        texts(&ledger, "U123", key("2024-03-09")),
        vec!["homework", "groceries"]
    );
    let workout: Vec<&TaskRecord> = list_tasks(&ledger, "U123", key("2024-03-10"))
        .into_iter()
        .map(|(_, task)| task)
        .collect();
    assert_eq!(workout[0].completed_at(), Some(workout[0].created_at()));

    let legacy_ids: Vec<String> = ledger.task_ids().map(ToString::to_string).collect();
    let added = add_tasks(&mut ledger, "U123", key("2024-03-10"), "new", Utc::now()).expect("add");
    assert!(!legacy_ids.contains(&added[0].id().to_string()));
    assert!(added[0].id().as_str().starts_with("t-"));
}
