use std::collections::HashSet;

use chrono::{DateTime, TimeDelta, Utc};
use dailies_core::carry::{CarrySelector, carry_over};
use dailies_core::report::weekly_report;
use dailies_core::store::LedgerStore;
use dailies_core::tasks::{add_tasks, complete_task, delete_task, list_tasks, split_task_text};
use dailies_core::{DayKey, Ledger, TaskRecord};
use proptest::prelude::*;

fn day(offset: u64) -> DayKey {
    let base: DayKey = "2024-03-10".parse().expect("day key");
    base.minus_days(offset)
}

fn base_time() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-03-10T09:00:00Z")
        .expect("timestamp")
        .with_timezone(&Utc)
}

/// Comma-joined segments, some of them blank or padded.
fn arb_task_input() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            3 => "[a-z][a-z ]{0,10}".prop_map(|s| format!(" {s} ")),
            1 => Just("   ".to_string()),
            1 => Just(String::new()),
        ],
        1..8,
    )
    .prop_map(|segments| segments.join(","))
}

#[derive(Debug, Clone)]
enum Op {
    Add(u64, String),
    Complete(u64, usize),
    Delete(u64, usize),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..3_u64, arb_task_input()).prop_map(|(d, text)| Op::Add(d, text)),
        (0..3_u64, 0..6_usize).prop_map(|(d, p)| Op::Complete(d, p)),
        (0..3_u64, 0..6_usize).prop_map(|(d, p)| Op::Delete(d, p)),
    ]
}

fn apply(ledger: &mut Ledger, ops: &[Op]) {
    for (step, op) in ops.iter().enumerate() {
        let now = base_time() + TimeDelta::seconds(i64::try_from(step).unwrap_or(0));
        // Errors are part of the sequence; they must just leave state valid.
        let _ = match op {
            Op::Add(d, text) => add_tasks(ledger, "u", day(*d), text, now).map(|_| ()),
            Op::Complete(d, p) => complete_task(ledger, "u", day(*d), *p, now).map(|_| ()),
            Op::Delete(d, p) => delete_task(ledger, "u", day(*d), *p).map(|_| ()),
        };
    }
}

fn all_tasks(ledger: &Ledger) -> Vec<&TaskRecord> {
    ledger
        .days("u")
        .flat_map(|(_, record)| record.tasks().iter())
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn add_appends_one_task_per_nonblank_segment(input in arb_task_input()) {
        let mut ledger = Ledger::new();
        let expected = split_task_text(&input);
        let result = add_tasks(&mut ledger, "u", day(0), &input, base_time());

        if expected.is_empty() {
            prop_assert!(result.is_err());
            prop_assert!(ledger.is_empty());
        } else {
            let added = result.expect("non-empty input");
            prop_assert_eq!(added.len(), expected.len());
            let texts: Vec<&str> = added.iter().map(TaskRecord::text).collect();
            prop_assert_eq!(texts, expected.iter().map(String::as_str).collect::<Vec<_>>());
        }
    }

    #[test]
    fn ids_stay_unique_and_completion_stays_consistent(ops in prop::collection::vec(arb_op(), 0..40)) {
        let mut ledger = Ledger::new();
        apply(&mut ledger, &ops);

        let tasks = all_tasks(&ledger);
        let ids: HashSet<_> = tasks.iter().map(|t| t.id()).collect();
        prop_assert_eq!(ids.len(), tasks.len());
        for task in tasks {
            prop_assert_eq!(task.completed_at().is_some(), task.is_completed());
        }
    }

    #[test]
    fn delete_shifts_later_positions_down(count in 1..10_usize, pick in 1..10_usize) {
        let position = pick.min(count);
        let mut ledger = Ledger::new();
        let input: Vec<String> = (0..count).map(|i| format!("task {i}")).collect();
        add_tasks(&mut ledger, "u", day(0), &input.join(","), base_time()).expect("add");

        let before: Vec<String> = list_tasks(&ledger, "u", day(0))
            .into_iter()
            .map(|(_, t)| t.text().to_string())
            .collect();
        delete_task(&mut ledger, "u", day(0), position).expect("delete");
        let after: Vec<(usize, String)> = list_tasks(&ledger, "u", day(0))
            .into_iter()
            .map(|(n, t)| (n, t.text().to_string()))
            .collect();

        prop_assert_eq!(after.len(), count - 1);
        for (n, text) in after {
            let original = if n < position { n } else { n + 1 };
            prop_assert_eq!(&text, &before[original - 1]);
        }
    }

    #[test]
    fn carry_all_adds_exactly_the_incomplete_count(
        count in 1..8_usize,
        done in prop::collection::vec(any::<bool>(), 8),
    ) {
        let mut ledger = Ledger::new();
        let input: Vec<String> = (0..count).map(|i| format!("t{i}")).collect();
        add_tasks(&mut ledger, "u", day(1), &input.join(","), base_time()).expect("add");
        for (index, flag) in done.iter().take(count).enumerate() {
            if *flag {
                complete_task(&mut ledger, "u", day(1), index + 1, base_time()).expect("complete");
            }
        }
        let incomplete = ledger.day("u", day(1)).expect("source").incomplete().count();
        let source_before = ledger.day("u", day(1)).cloned();

        let result = carry_over(&mut ledger, "u", day(1), day(0), &CarrySelector::All, base_time());
        if incomplete == 0 {
            prop_assert!(result.is_err());
            prop_assert!(ledger.day("u", day(0)).is_none());
        } else {
            prop_assert_eq!(result.expect("carry").tasks.len(), incomplete);
            prop_assert_eq!(ledger.day("u", day(0)).expect("dest").len(), incomplete);
        }
        prop_assert_eq!(ledger.day("u", day(1)).cloned(), source_before);
    }

    #[test]
    fn weekly_rate_is_bounded(ops in prop::collection::vec(arb_op(), 0..40)) {
        let mut ledger = Ledger::new();
        apply(&mut ledger, &ops);
        let report = weekly_report(&ledger, "u", day(0));
        prop_assert!(report.completion_rate <= 100);
        prop_assert!(report.total_completed <= report.total_tasks);
        prop_assert_eq!(report.total_tasks, ledger.task_count());
    }

    #[test]
    fn save_of_load_is_a_no_op(ops in prop::collection::vec(arb_op(), 0..25)) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = LedgerStore::in_dir(dir.path());
        let mut ledger = Ledger::new();
        apply(&mut ledger, &ops);
        store.save(&ledger).expect("save");

        let first = std::fs::read_to_string(store.path()).expect("read");
        let reloaded = store.load();
        prop_assert_eq!(&reloaded, &ledger);
        store.save(&reloaded).expect("save again");
        let second = std::fs::read_to_string(store.path()).expect("read");
        prop_assert_eq!(first, second);
    }
}
