//! `dly done`: mark a task complete by its list number.

use clap::Args;
use dailies_core::config::DataPaths;
use dailies_core::tasks::complete_task;
use serde::Serialize;

use super::{DaySpec, Session, TaskView};
use crate::output::{OutputMode, render, report_error};

#[derive(Args, Debug)]
pub struct DoneArgs {
    /// Task number as shown by `dly list`.
    pub position: usize,

    /// Day of the list: today (default), yesterday, or YYYY-MM-DD.
    #[arg(long)]
    pub day: Option<DaySpec>,
}

#[derive(Debug, Serialize)]
struct DoneOutput {
    user: String,
    day: String,
    task: TaskView,
}

pub fn run_done(
    args: &DoneArgs,
    user_flag: Option<&str>,
    output: OutputMode,
    paths: &DataPaths,
) -> anyhow::Result<()> {
    let session = Session::open(user_flag, output, paths)?;
    let day = session.day(args.day);

    let task = session
        .store
        .transact(|ledger| complete_task(ledger, &session.user, day, args.position, session.now))
        .map_err(|err| report_error(output, err))?;

    let result = DoneOutput {
        user: session.user,
        day: day.to_string(),
        task: TaskView::new(args.position, &task),
    };
    render(output, &result, |r, w| {
        writeln!(w, "✅ Completed #{}: {}", r.task.position, r.task.text)
    })
}
