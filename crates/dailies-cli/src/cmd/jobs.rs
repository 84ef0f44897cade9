//! `dly jobs run`: scheduled batch work, meant to be triggered once a day.
//!
//! `cleanup` archives every user's thread for yesterday. `weekly` delivers
//! each user's report for the week ending today. `due` (the default) runs
//! cleanup plus the weekly report when today is the configured report day.

use std::io::Write;

use anyhow::Result;
use chrono::Utc;
use clap::{Args, Subcommand, ValueEnum};
use dailies_core::config::DataPaths;
use dailies_core::scheduler::{BatchOutcome, Job, due_jobs, run_daily_cleanup, run_weekly_reports};
use dailies_core::settings::SettingsStore;
use dailies_core::store::LedgerStore;
use serde::Serialize;

use crate::outbox::Outbox;
use crate::output::{CliError, OutputMode, render_error, render_mode};

#[derive(Args, Debug)]
pub struct JobsArgs {
    #[command(subcommand)]
    command: JobsCommand,
}

#[derive(Subcommand, Debug)]
enum JobsCommand {
    /// Run scheduled jobs for all users
    Run(RunArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Which job to run.
    #[arg(long, value_enum, default_value_t = JobSelection::Due)]
    job: JobSelection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum JobSelection {
    Due,
    Cleanup,
    Weekly,
}

#[derive(Debug, Serialize)]
struct JobsOutput {
    outcomes: Vec<BatchOutcome>,
}

impl JobsOutput {
    fn failures(&self) -> usize {
        self.outcomes.iter().map(|o| o.failed.len()).sum()
    }
}

pub fn run_jobs(args: &JobsArgs, output: OutputMode, paths: &DataPaths) -> Result<()> {
    let JobsCommand::Run(run) = &args.command;
    let now = Utc::now();
    let settings = SettingsStore::new(&paths.settings).load();
    let clock = settings.clock();

    let jobs = match run.job {
        JobSelection::Due => due_jobs(&settings, now),
        JobSelection::Cleanup => vec![Job::DailyCleanup],
        JobSelection::Weekly => vec![Job::WeeklyReport],
    };
    tracing::info!(?jobs, "running scheduled jobs");

    let ledger = LedgerStore::new(&paths.ledger).load();
    let mut outbox = Outbox::new(&paths.outbox, now);
    let outcomes = jobs
        .into_iter()
        .map(|job| match job {
            Job::DailyCleanup => run_daily_cleanup(&ledger, clock.yesterday(now), &mut outbox),
            Job::WeeklyReport => run_weekly_reports(&ledger, clock.today(now), &mut outbox),
        })
        .collect();

    let result = JobsOutput { outcomes };
    render_mode(output, &result, render_jobs_text, render_jobs_pretty)?;

    let failures = result.failures();
    if failures > 0 {
        render_error(
            output,
            &CliError::with_details(
                format!("{failures} user(s) failed; other users were processed"),
                "check the log for per-user errors and re-run the job",
                "job_partial_failure",
            ),
        )?;
        anyhow::bail!("{failures} user(s) failed");
    }
    Ok(())
}

fn render_jobs_text(out: &JobsOutput, w: &mut dyn Write) -> std::io::Result<()> {
    for outcome in &out.outcomes {
        writeln!(
            w,
            "{}\t{}\t{}\t{}",
            outcome.job,
            outcome.succeeded.len(),
            outcome.failed.len(),
            outcome.skipped.len()
        )?;
    }
    Ok(())
}

fn render_jobs_pretty(out: &JobsOutput, w: &mut dyn Write) -> std::io::Result<()> {
    for outcome in &out.outcomes {
        let mark = if outcome.is_success() { "✓" } else { "⚠" };
        writeln!(
            w,
            "{mark} {}: {} ok, {} failed, {} skipped",
            outcome.job,
            outcome.succeeded.len(),
            outcome.failed.len(),
            outcome.skipped.len()
        )?;
        for failure in &outcome.failed {
            writeln!(w, "    {}: {}", failure.user, failure.error)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use dailies_core::scheduler::UserFailure;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: JobsArgs,
    }

    #[test]
    fn run_defaults_to_due_jobs() {
        let w = Wrapper::parse_from(["test", "run"]);
        let JobsCommand::Run(run) = w.args.command;
        assert_eq!(run.job, JobSelection::Due);

        let w = Wrapper::parse_from(["test", "run", "--job", "weekly"]);
        let JobsCommand::Run(run) = w.args.command;
        assert_eq!(run.job, JobSelection::Weekly);
    }

    #[test]
    fn pretty_output_lists_failed_users() {
        let out = JobsOutput {
            outcomes: vec![BatchOutcome {
                job: Job::DailyCleanup,
                succeeded: vec!["a".into()],
                failed: vec![UserFailure {
                    user: "b".into(),
                    error: "outbox unavailable".into(),
                }],
                skipped: Vec::new(),
            }],
        };
        assert_eq!(out.failures(), 1);
        let mut buf = Vec::new();
        render_jobs_pretty(&out, &mut buf).expect("render");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.contains("⚠ cleanup: 1 ok, 1 failed, 0 skipped"));
        assert!(text.contains("    b: outbox unavailable"));
    }
}
