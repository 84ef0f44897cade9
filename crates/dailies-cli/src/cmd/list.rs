//! `dly list`: show a day's numbered task list.

use std::io::Write;

use clap::Args;
use dailies_core::DayKey;
use dailies_core::config::DataPaths;
use dailies_core::tasks::list_tasks;
use serde::Serialize;

use super::{DaySpec, Session, TaskView};
use crate::output::{OutputMode, render_mode};

#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Day to show: today (default), yesterday, or YYYY-MM-DD.
    #[arg(long)]
    pub day: Option<DaySpec>,
}

#[derive(Debug, Serialize)]
struct ListOutput {
    user: String,
    day: DayKey,
    label: String,
    completed: usize,
    tasks: Vec<TaskView>,
}

pub fn run_list(
    args: &ListArgs,
    user_flag: Option<&str>,
    output: OutputMode,
    paths: &DataPaths,
) -> anyhow::Result<()> {
    let session = Session::open(user_flag, output, paths)?;
    let day = session.day(args.day);
    let ledger = session.store.load();

    let tasks: Vec<TaskView> = list_tasks(&ledger, &session.user, day)
        .into_iter()
        .map(|(position, task)| TaskView::new(position, task))
        .collect();
    let result = ListOutput {
        user: session.user,
        day,
        label: day.label(),
        completed: tasks.iter().filter(|t| t.completed).count(),
        tasks,
    };

    render_mode(output, &result, render_list_text, render_list_pretty)
}

fn render_list_text(out: &ListOutput, w: &mut dyn Write) -> std::io::Result<()> {
    for task in &out.tasks {
        let state = if task.completed { "done" } else { "open" };
        writeln!(w, "{}\t{state}\t{}", task.position, task.text)?;
    }
    Ok(())
}

fn render_list_pretty(out: &ListOutput, w: &mut dyn Write) -> std::io::Result<()> {
    if out.tasks.is_empty() {
        return writeln!(w, "📝 No tasks for {}.", out.label);
    }
    writeln!(
        w,
        "📋 {} ({}/{} done)\n",
        out.label,
        out.completed,
        out.tasks.len()
    )?;
    for task in &out.tasks {
        writeln!(w, "{}. {} {}", task.position, task.status_mark(), task.text)?;
    }
    Ok(())
}
