//! `dly yesterday`: unfinished tasks of an earlier day, numbered the way
//! `dly carry` counts them.

use std::io::Write;

use clap::Args;
use dailies_core::DayKey;
use dailies_core::carry::{CarrySelector, select};
use dailies_core::config::DataPaths;
use serde::Serialize;

use super::{DaySpec, Session, TaskView};
use crate::output::{OutputMode, render_mode};

#[derive(Args, Debug, Default)]
pub struct YesterdayArgs {
    /// Day to inspect (default: yesterday).
    #[arg(long)]
    pub from: Option<DaySpec>,
}

#[derive(Debug, Serialize)]
struct UnfinishedOutput {
    user: String,
    day: DayKey,
    label: String,
    tasks: Vec<TaskView>,
}

pub fn run_yesterday(
    args: &YesterdayArgs,
    user_flag: Option<&str>,
    output: OutputMode,
    paths: &DataPaths,
) -> anyhow::Result<()> {
    let session = Session::open(user_flag, output, paths)?;
    let day = args
        .from
        .unwrap_or(DaySpec::Yesterday)
        .resolve(&session.clock, session.now);
    let ledger = session.store.load();

    let tasks = ledger
        .day(&session.user, day)
        .map(|source| {
            let (unfinished, _) = select(source, &CarrySelector::All);
            unfinished
                .into_iter()
                .enumerate()
                .map(|(index, task)| TaskView::new(index + 1, task))
                .collect()
        })
        .unwrap_or_default();

    let result = UnfinishedOutput {
        user: session.user,
        day,
        label: day.label(),
        tasks,
    };
    render_mode(output, &result, render_unfinished_text, render_unfinished_pretty)
}

fn render_unfinished_text(out: &UnfinishedOutput, w: &mut dyn Write) -> std::io::Result<()> {
    for task in &out.tasks {
        writeln!(w, "{}\t{}", task.position, task.text)?;
    }
    Ok(())
}

fn render_unfinished_pretty(out: &UnfinishedOutput, w: &mut dyn Write) -> std::io::Result<()> {
    if out.tasks.is_empty() {
        return writeln!(w, "🎉 Nothing left unfinished on {}.", out.label);
    }
    writeln!(w, "⏳ Unfinished on {} ({}):\n", out.label, out.tasks.len())?;
    for task in &out.tasks {
        writeln!(w, "{}. ⬜ {}", task.position, task.text)?;
    }
    writeln!(w, "\nCarry them with `dly carry` or pick numbers, e.g. `dly carry 1,3`.")
}
