//! `dly thread`: inspect or set the chat thread bound to a day.

use std::io::Write;

use anyhow::Result;
use clap::{Args, Subcommand};
use dailies_core::DayKey;
use dailies_core::config::DataPaths;
use dailies_core::thread::{bind_thread, ensure_thread, thread_ref};
use serde::Serialize;

use super::{DaySpec, Session};
use crate::outbox::Outbox;
use crate::output::{OutputMode, render, report_error};

#[derive(Args, Debug)]
pub struct ThreadArgs {
    #[command(subcommand)]
    command: ThreadCommand,
}

#[derive(Subcommand, Debug)]
enum ThreadCommand {
    /// Print the thread reference bound to a day, if any
    Get(DayArg),
    /// Bind an existing thread reference to a day
    Set(SetArgs),
    /// Open the day's thread unless one is already bound
    Open(DayArg),
}

#[derive(Args, Debug)]
struct DayArg {
    /// Day: today (default), yesterday, or YYYY-MM-DD.
    #[arg(long)]
    day: Option<DaySpec>,
}

#[derive(Args, Debug)]
struct SetArgs {
    /// Opaque reference issued by the chat platform.
    thread_ref: String,

    #[command(flatten)]
    day: DayArg,
}

#[derive(Debug, Serialize)]
struct ThreadOutput {
    user: String,
    day: DayKey,
    thread_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    replaced: Option<String>,
}

pub fn run_thread(
    args: &ThreadArgs,
    user_flag: Option<&str>,
    output: OutputMode,
    paths: &DataPaths,
) -> Result<()> {
    let session = Session::open(user_flag, output, paths)?;
    let user = session.user.as_str();

    let (day, current, replaced) = match &args.command {
        ThreadCommand::Get(arg) => {
            let day = session.day(arg.day);
            let ledger = session.store.load();
            (day, thread_ref(&ledger, user, day).map(str::to_string), None)
        }
        ThreadCommand::Set(set) => {
            let day = session.day(set.day.day);
            let replaced = session
                .store
                .transact(|ledger| bind_thread(ledger, user, day, &set.thread_ref))
                .map_err(|err| report_error(output, err))?;
            (day, Some(set.thread_ref.trim().to_string()), replaced)
        }
        ThreadCommand::Open(arg) => {
            let day = session.day(arg.day);
            let mut outbox = Outbox::new(&paths.outbox, session.now);
            let opened = ensure_thread(&session.store, user, day, &mut outbox)
                .map_err(|err| report_error(output, err))?;
            (day, Some(opened), None)
        }
    };

    let result = ThreadOutput {
        user: session.user.clone(),
        day,
        thread_ref: current,
        replaced,
    };
    render(output, &result, render_thread_human)
}

fn render_thread_human(out: &ThreadOutput, w: &mut dyn Write) -> std::io::Result<()> {
    match &out.thread_ref {
        Some(reference) => writeln!(w, "{}\t{reference}", out.day)?,
        None => writeln!(w, "{}\t(no thread)", out.day)?,
    }
    if let Some(previous) = &out.replaced {
        writeln!(w, "replaced\t{previous}")?;
    }
    Ok(())
}
