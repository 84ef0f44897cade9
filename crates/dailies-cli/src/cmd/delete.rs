//! `dly delete`: remove a task by its list number; later tasks move up.

use clap::Args;
use dailies_core::config::DataPaths;
use dailies_core::tasks::delete_task;
use serde::Serialize;

use super::{DaySpec, Session, TaskView};
use crate::output::{OutputMode, render, report_error};

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Task number as shown by `dly list`.
    pub position: usize,

    /// Day of the list: today (default), yesterday, or YYYY-MM-DD.
    #[arg(long)]
    pub day: Option<DaySpec>,
}

#[derive(Debug, Serialize)]
struct DeleteOutput {
    user: String,
    day: String,
    deleted: TaskView,
    remaining: usize,
}

pub fn run_delete(
    args: &DeleteArgs,
    user_flag: Option<&str>,
    output: OutputMode,
    paths: &DataPaths,
) -> anyhow::Result<()> {
    let session = Session::open(user_flag, output, paths)?;
    let day = session.day(args.day);

    let (deleted, remaining) = session
        .store
        .transact(|ledger| {
            let deleted = delete_task(ledger, &session.user, day, args.position)?;
            let remaining = ledger.day(&session.user, day).map_or(0, |d| d.len());
            Ok((deleted, remaining))
        })
        .map_err(|err| report_error(output, err))?;

    let result = DeleteOutput {
        user: session.user,
        day: day.to_string(),
        deleted: TaskView::new(args.position, &deleted),
        remaining,
    };
    render(output, &result, |r, w| {
        writeln!(w, "🗑️ Deleted #{}: {}", r.deleted.position, r.deleted.text)
    })
}
