//! `dly report`: weekly completion summary for the seven days ending today.

use std::io::Write;

use clap::Args;
use dailies_core::config::DataPaths;
use dailies_core::report::{WeeklyReport, weekly_report};
use serde::Serialize;

use super::{DaySpec, Session};
use crate::output::{OutputMode, pretty_rule, render_mode};

#[derive(Args, Debug, Default)]
pub struct ReportArgs {
    /// Last day of the week window: today (default), yesterday, or YYYY-MM-DD.
    #[arg(long)]
    pub date: Option<DaySpec>,

    /// Report every user in the ledger instead of only the current one.
    #[arg(long)]
    pub all_users: bool,
}

#[derive(Debug, Serialize)]
#[serde(transparent)]
struct ReportOutput {
    reports: Vec<WeeklyReport>,
}

pub fn run_report(
    args: &ReportArgs,
    user_flag: Option<&str>,
    output: OutputMode,
    paths: &DataPaths,
) -> anyhow::Result<()> {
    let session = Session::open(user_flag, output, paths)?;
    let reference = session.day(args.date);
    let ledger = session.store.load();

    let reports = if args.all_users {
        ledger
            .user_ids()
            .map(|user| weekly_report(&ledger, user, reference))
            .collect()
    } else {
        vec![weekly_report(&ledger, &session.user, reference)]
    };

    render_mode(
        output,
        &ReportOutput { reports },
        |out, w| {
            for report in &out.reports {
                render_report_text(report, w)?;
            }
            Ok(())
        },
        |out, w| {
            for (index, report) in out.reports.iter().enumerate() {
                if index > 0 {
                    writeln!(w)?;
                }
                render_report_pretty(report, w)?;
            }
            Ok(())
        },
    )
}

fn render_report_text(report: &WeeklyReport, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(
        w,
        "{}\t{}\t{}\t{}\t{}\t{}%",
        report.user,
        report.start,
        report.end,
        report.total_completed,
        report.total_tasks,
        report.completion_rate
    )?;
    for day in report.days() {
        writeln!(w, "{}\t{}\t{}", day.day, day.completed, day.total)?;
    }
    Ok(())
}

fn render_report_pretty(report: &WeeklyReport, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(
        w,
        "📊 Weekly report for {}: {} to {}",
        report.user,
        report.start.label(),
        report.end.label()
    )?;
    pretty_rule(w)?;
    if !report.has_activity() {
        return writeln!(w, "No tasks recorded this week.");
    }
    for day in report.days() {
        writeln!(w, "{}  {}/{}", day.label, day.completed, day.total)?;
        for line in day.completed_preview() {
            writeln!(w, "  ✅ {line}")?;
        }
    }
    pretty_rule(w)?;
    writeln!(
        w,
        "Completed {}/{} ({}%)",
        report.total_completed, report.total_tasks, report.completion_rate
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use dailies_core::Ledger;
    use dailies_core::tasks::{add_tasks, complete_task};

    fn report_for(texts: &str, complete: &[usize]) -> WeeklyReport {
        let day = "2024-03-10".parse().expect("day");
        let mut ledger = Ledger::new();
        if !texts.is_empty() {
            add_tasks(&mut ledger, "u", day, texts, Utc::now()).expect("add");
        }
        for &position in complete {
            complete_task(&mut ledger, "u", day, position, Utc::now()).expect("complete");
        }
        weekly_report(&ledger, "u", day)
    }

    #[test]
    fn report_args_parse() {
        use clap::Parser;

        #[derive(Parser)]
        struct Wrapper {
            #[command(flatten)]
            args: ReportArgs,
        }
        let w = Wrapper::parse_from(["test", "--date", "2024-03-10", "--all-users"]);
        assert!(w.args.all_users);
        assert!(w.args.date.is_some());
    }

    #[test]
    fn pretty_report_shows_days_and_rate() {
        let report = report_for("a, b, c", &[1, 3]);
        let mut buf = Vec::new();
        render_report_pretty(&report, &mut buf).expect("render");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.contains("Mar 4 (Mon) to Mar 10 (Sun)"));
        assert!(text.contains("Mar 10 (Sun)  2/3"));
        assert!(text.contains("  ✅ a"));
        assert!(text.contains("Completed 2/3 (67%)"));
    }

    #[test]
    fn empty_week_says_no_activity() {
        let report = report_for("", &[]);
        let mut buf = Vec::new();
        render_report_pretty(&report, &mut buf).expect("render");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.contains("No tasks recorded this week."));
        assert!(!text.contains("Completed"));
    }
}
