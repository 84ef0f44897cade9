//! `dly health`: check the data directory without changing it.

use std::io::Write;
use std::path::Path;

use clap::Args;
use dailies_core::config::DataPaths;
use dailies_core::settings::SettingsStore;
use dailies_core::store::{LedgerState, LedgerStore};
use serde::Serialize;

use crate::output::{CliError, OutputMode, render, render_error};

/// Arguments for `dly health`.
#[derive(Args, Debug, Default)]
pub struct HealthArgs {}

#[derive(Debug, Serialize)]
struct HealthOutput {
    data_dir: String,
    ledger: &'static str,
    users: usize,
    days: usize,
    tasks: usize,
    settings_file: bool,
    timezone: String,
    outbox_file: bool,
}

/// Execute `dly health`.
pub fn run_health(_args: &HealthArgs, output: OutputMode, paths: &DataPaths) -> anyhow::Result<()> {
    let store = LedgerStore::new(&paths.ledger);
    let (ledger, users, days, tasks) = match store.inspect() {
        LedgerState::Missing => ("missing", 0, 0, 0),
        LedgerState::Healthy { users, days, tasks } => ("ok", users, days, tasks),
        LedgerState::Corrupt { reason } => {
            render_error(
                output,
                &CliError::with_details(
                    format!("ledger {} is unreadable: {reason}", store.path().display()),
                    format!(
                        "the next write starts an empty ledger after copying the file to {}<timestamp>",
                        store.quarantine_prefix()
                    ),
                    "ledger_corrupt",
                ),
            )?;
            anyhow::bail!("ledger is corrupt");
        }
    };

    let settings = SettingsStore::new(&paths.settings).load();
    let payload = HealthOutput {
        data_dir: paths.root.display().to_string(),
        ledger,
        users,
        days,
        tasks,
        settings_file: exists(&paths.settings),
        timezone: settings.timezone,
        outbox_file: exists(&paths.outbox),
    };

    render(output, &payload, render_health_human)
}

fn exists(path: &Path) -> bool {
    path.try_exists().unwrap_or(false)
}

fn render_health_human(report: &HealthOutput, w: &mut dyn Write) -> std::io::Result<()> {
    let present = |found: bool| if found { "✓ present" } else { "◐ defaults" };

    writeln!(w, "Data directory: {}", report.data_dir)?;
    writeln!(w, "{:<24} {:>12}  Status", "Check", "Value")?;
    writeln!(w, "{}", "-".repeat(52))?;
    writeln!(
        w,
        "{:<24} {:>12}  {}",
        "Ledger",
        report.ledger,
        if report.ledger == "ok" { "✓ readable" } else { "◐ not created yet" }
    )?;
    writeln!(w, "{:<24} {:>12}", "Users", report.users)?;
    writeln!(w, "{:<24} {:>12}", "Days", report.days)?;
    writeln!(w, "{:<24} {:>12}", "Tasks", report.tasks)?;
    writeln!(
        w,
        "{:<24} {:>12}  {}",
        "Settings",
        report.timezone,
        present(report.settings_file)
    )?;
    writeln!(
        w,
        "{:<24} {:>12}  {}",
        "Outbox",
        if report.outbox_file { "yes" } else { "no" },
        if report.outbox_file { "✓ present" } else { "◐ empty" }
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn human_table_has_rows() {
        let report = HealthOutput {
            data_dir: "/tmp/d".into(),
            ledger: "ok",
            users: 2,
            days: 3,
            tasks: 7,
            settings_file: false,
            timezone: "+09:00".into(),
            outbox_file: false,
        };
        let mut buf = Vec::new();
        render_health_human(&report, &mut buf).expect("render");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.contains("Ledger"));
        assert!(text.contains("✓ readable"));
        assert!(text.contains("+09:00  ◐ defaults"));
        assert!(text.lines().any(|l| l.starts_with("Tasks") && l.ends_with('7')));
    }
}
