//! `dly carry`: copy unfinished tasks from an earlier day.
//!
//! Numbers in the selector refer to the source day's *unfinished* tasks in
//! order, not to the full list shown by `dly list`. `dly yesterday` prints
//! that numbering.

use std::io::Write;

use clap::Args;
use dailies_core::carry::{CarrySelector, carry_over};
use dailies_core::config::DataPaths;
use dailies_core::{DailiesError, DayKey};
use serde::Serialize;

use super::{DaySpec, Session, TaskView};
use crate::output::{OutputMode, render_mode, report_error};

#[derive(Args, Debug)]
pub struct CarryArgs {
    /// `all`, or unfinished-task numbers such as `1,3`.
    #[arg(default_value = "all")]
    pub selector: String,

    /// Source day (default: yesterday).
    #[arg(long)]
    pub from: Option<DaySpec>,

    /// Destination day (default: today).
    #[arg(long)]
    pub to: Option<DaySpec>,
}

#[derive(Debug, Serialize)]
struct CarryOutput {
    user: String,
    from: DayKey,
    to: DayKey,
    carried: Vec<TaskView>,
    skipped: Vec<i64>,
}

pub fn run_carry(
    args: &CarryArgs,
    user_flag: Option<&str>,
    output: OutputMode,
    paths: &DataPaths,
) -> anyhow::Result<()> {
    let session = Session::open(user_flag, output, paths)?;
    let from = args
        .from
        .unwrap_or(DaySpec::Yesterday)
        .resolve(&session.clock, session.now);
    let to = session.day(args.to);
    let selector: CarrySelector = args
        .selector
        .parse()
        .map_err(|err: DailiesError| report_error(output, err))?;

    let (carried, destination_len) = session
        .store
        .transact(|ledger| {
            let carried = carry_over(ledger, &session.user, from, to, &selector, session.now)?;
            let len = ledger.day(&session.user, to).map_or(0, |d| d.len());
            Ok((carried, len))
        })
        .map_err(|err| report_error(output, err))?;

    let first = destination_len + 1 - carried.tasks.len();
    let result = CarryOutput {
        user: session.user,
        from,
        to,
        carried: carried
            .tasks
            .iter()
            .enumerate()
            .map(|(offset, task)| TaskView::new(first + offset, task))
            .collect(),
        skipped: carried.skipped,
    };
    render_mode(output, &result, render_carry_text, render_carry_pretty)
}

fn render_carry_text(out: &CarryOutput, w: &mut dyn Write) -> std::io::Result<()> {
    for task in &out.carried {
        writeln!(w, "{}\t{}\t{}", task.position, task.id, task.text)?;
    }
    for position in &out.skipped {
        writeln!(w, "skipped\t{position}")?;
    }
    Ok(())
}

fn render_carry_pretty(out: &CarryOutput, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(
        w,
        "↪ Carried {} task(s) from {} to {}:",
        out.carried.len(),
        out.from.label(),
        out.to.label()
    )?;
    for task in &out.carried {
        writeln!(w, "  {}. {}", task.position, task.text)?;
    }
    if !out.skipped.is_empty() {
        let skipped: Vec<String> = out.skipped.iter().map(ToString::to_string).collect();
        writeln!(w, "Skipped (not an unfinished task): {}", skipped.join(", "))?;
    }
    Ok(())
}
