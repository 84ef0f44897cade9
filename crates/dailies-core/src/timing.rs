//! Opt-in per-operation latency samples for `--timing` / `DAILIES_TIMING`.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;

pub const TIMING_ENV: &str = "DAILIES_TIMING";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimingReport {
    pub operations: Vec<OpTiming>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpTiming {
    pub name: String,
    pub count: usize,
    #[serde(rename = "total_us", serialize_with = "as_micros")]
    pub total: Duration,
    #[serde(rename = "max_us", serialize_with = "as_micros")]
    pub max: Duration,
}

fn as_micros<S: serde::Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(duration.as_micros()).unwrap_or(u64::MAX))
}

thread_local! {
    static SAMPLES: RefCell<Vec<(String, Duration)>> = const { RefCell::new(Vec::new()) };
}

static ENABLED: AtomicBool = AtomicBool::new(false);

/// True when `DAILIES_TIMING` is `1`, `true`, `yes`, or `on`.
#[must_use]
pub fn timing_enabled_from_env() -> bool {
    std::env::var(TIMING_ENV).is_ok_and(|value| {
        ["1", "true", "yes", "on"]
            .iter()
            .any(|truthy| value.trim().eq_ignore_ascii_case(truthy))
    })
}

pub fn set_timing_enabled(enabled: bool) {
    ENABLED.store(enabled, Ordering::Relaxed);
    if !enabled {
        SAMPLES.with(|samples| samples.borrow_mut().clear());
    }
}

#[must_use]
pub fn is_timing_enabled() -> bool {
    ENABLED.load(Ordering::Relaxed)
}

/// Run `f`, recording its wall time under `name` when timing is enabled.
pub fn timed<R>(name: &str, f: impl FnOnce() -> R) -> R {
    if !is_timing_enabled() {
        return f();
    }
    let started = Instant::now();
    let result = f();
    let elapsed = started.elapsed();
    SAMPLES.with(|samples| samples.borrow_mut().push((name.to_string(), elapsed)));
    result
}

/// Drain this thread's samples into a report grouped by name.
#[must_use]
pub fn collect_report() -> TimingReport {
    let samples = SAMPLES.with(|samples| std::mem::take(&mut *samples.borrow_mut()));
    let mut grouped: BTreeMap<String, OpTiming> = BTreeMap::new();
    for (name, elapsed) in samples {
        let entry = grouped.entry(name.clone()).or_insert(OpTiming {
            name,
            count: 0,
            total: Duration::ZERO,
            max: Duration::ZERO,
        });
        entry.count += 1;
        entry.total += elapsed;
        entry.max = entry.max.max(elapsed);
    }
    TimingReport {
        operations: grouped.into_values().collect(),
    }
}

impl TimingReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    #[must_use]
    pub fn display_table(&self) -> String {
        if self.operations.is_empty() {
            return "No timing samples recorded.".to_string();
        }
        let mut out = String::new();
        let _ = writeln!(out, "{:<24} {:>6} {:>10} {:>10}", "operation", "count", "total", "max");
        for op in &self.operations {
            let _ = writeln!(
                out,
                "{:<24} {:>6} {:>10} {:>10}",
                op.name,
                op.count,
                format!("{:?}", op.total),
                format!("{:?}", op.max)
            );
        }
        out
    }
}
