//! `dly add`: add one or more comma-separated tasks to a day.
//!
//! With `--notify`, the day's thread is opened on first use and the added
//! tasks are queued for posting there. The tasks are saved before the thread
//! is opened or any notification is attempted; a failure in either is
//! reported alongside the result and never undoes the add.

use std::io::Write;

use clap::Args;
use dailies_core::config::DataPaths;
use dailies_core::notify::{Notification, Notifier};
use dailies_core::tasks::add_tasks;
use dailies_core::thread::ensure_thread;
use dailies_core::{DayKey, TaskRecord};
use serde::Serialize;
use tracing::warn;

use super::{DaySpec, Session, TaskView};
use crate::outbox::Outbox;
use crate::output::{OutputMode, render_mode, report_error};

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Task text; separate several tasks with commas.
    #[arg(required = true, num_args = 1..)]
    pub text: Vec<String>,

    /// Day to add to: today (default), yesterday, or YYYY-MM-DD.
    #[arg(long)]
    pub day: Option<DaySpec>,

    /// Post the added tasks to the day's thread.
    #[arg(long)]
    pub notify: bool,
}

#[derive(Debug, Serialize)]
struct AddOutput {
    user: String,
    day: DayKey,
    label: String,
    added: Vec<TaskView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thread_ref: Option<String>,
    notified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    notify_error: Option<String>,
}

pub fn run_add(
    args: &AddArgs,
    user_flag: Option<&str>,
    output: OutputMode,
    paths: &DataPaths,
) -> anyhow::Result<()> {
    let session = Session::open(user_flag, output, paths)?;
    let day = session.day(args.day);
    let text = args.text.join(" ");
    let mut outbox = Outbox::new(&paths.outbox, session.now);

    let (added, day_len) = session
        .store
        .transact(|ledger| {
            let added = add_tasks(ledger, &session.user, day, &text, session.now)?;
            let day_len = ledger.day(&session.user, day).map_or(0, |d| d.len());
            Ok((added, day_len))
        })
        .map_err(|err| report_error(output, err))?;

    // The thread is opened only once the tasks are on disk; its failure is
    // reported next to the result and never undoes the add.
    let thread = args
        .notify
        .then(|| ensure_thread(&session.store, &session.user, day, &mut outbox));

    let mut result = AddOutput {
        user: session.user.clone(),
        day,
        label: day.label(),
        added: views(&added, day_len),
        thread_ref: None,
        notified: false,
        notify_error: None,
    };

    match thread {
        None => {}
        Some(Err(err)) => result.notify_error = Some(err.to_string()),
        Some(Ok(reference)) => {
            let notification =
                Notification::tasks_added(&session.user, day, Some(&reference), &added);
            result.thread_ref = Some(reference);
            match outbox.deliver(&notification) {
                Ok(()) => result.notified = true,
                Err(err) => result.notify_error = Some(err.to_string()),
            }
        }
    }
    if let Some(err) = &result.notify_error {
        warn!(user = %session.user, %day, error = %err, "tasks saved but notification failed");
    }

    render_mode(output, &result, render_add_text, render_add_pretty)
}

/// Views for the tasks just appended; they occupy the last positions.
fn views(added: &[TaskRecord], day_len: usize) -> Vec<TaskView> {
    let first = day_len + 1 - added.len();
    added
        .iter()
        .enumerate()
        .map(|(offset, task)| TaskView::new(first + offset, task))
        .collect()
}

fn render_add_text(out: &AddOutput, w: &mut dyn Write) -> std::io::Result<()> {
    for task in &out.added {
        writeln!(w, "{}\t{}\t{}", task.position, task.id, task.text)?;
    }
    if let Some(err) = &out.notify_error {
        writeln!(w, "notify-error\t{err}")?;
    }
    Ok(())
}

fn render_add_pretty(out: &AddOutput, w: &mut dyn Write) -> std::io::Result<()> {
    match out.added.as_slice() {
        [single] => writeln!(w, "✅ Added to {}: {}", out.label, single.text)?,
        many => {
            writeln!(w, "✅ Added {} tasks to {}:", many.len(), out.label)?;
            for task in many {
                writeln!(w, "  {}. {}", task.position, task.text)?;
            }
        }
    }
    if out.notified {
        writeln!(w, "Posted to {}", out.thread_ref.as_deref().unwrap_or("the day thread"))?;
    }
    if let Some(err) = &out.notify_error {
        writeln!(w, "⚠ Saved, but the notification failed: {err}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: AddArgs,
    }

    #[test]
    fn add_args_join_words_and_parse_day() {
        let w = Wrapper::parse_from(["test", "buy", "milk,", "call", "mom", "--day", "yesterday"]);
        assert_eq!(w.args.text.join(" "), "buy milk, call mom");
        assert_eq!(w.args.day, Some(DaySpec::Yesterday));
        assert!(!w.args.notify);
    }

    #[test]
    fn add_args_require_text() {
        assert!(Wrapper::try_parse_from(["test"]).is_err());
    }

    #[test]
    fn pretty_output_singular_and_plural() {
        let day: DayKey = "2024-03-10".parse().expect("day");
        let mk = |n: usize, text: &str| TaskView {
            position: n,
            id: format!("t-{n}"),
            text: text.into(),
            completed: false,
            created_at: chrono::Utc::now(),
            completed_at: None,
        };
        let mut out = AddOutput {
            user: "u".into(),
            day,
            label: day.label(),
            added: vec![mk(1, "homework")],
            thread_ref: None,
            notified: false,
            notify_error: None,
        };
        let mut buf = Vec::new();
        render_add_pretty(&out, &mut buf).expect("render");
        assert_eq!(
            String::from_utf8(buf).expect("utf8"),
            "✅ Added to Mar 10 (Sun): homework\n"
        );

        out.added.push(mk(2, "groceries"));
        out.notify_error = Some("outbox: disk full".into());
        let mut buf = Vec::new();
        render_add_pretty(&out, &mut buf).expect("render");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.starts_with("✅ Added 2 tasks to Mar 10 (Sun):"));
        assert!(text.contains("  2. groceries"));
        assert!(text.contains("notification failed"));
    }
}
