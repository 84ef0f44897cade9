//! `dly settings`: show or change the day boundary, report day, and timezone.

use std::io::Write;

use anyhow::Result;
use clap::{Args, Subcommand};
use dailies_core::config::DataPaths;
use dailies_core::settings::{Settings, SettingsPatch, SettingsStore};
use serde::Serialize;

use crate::output::{CliError, OutputMode, pretty_kv, pretty_section, render_error, render_mode, report_error};

#[derive(Args, Debug)]
pub struct SettingsArgs {
    #[command(subcommand)]
    command: SettingsCommand,
}

#[derive(Subcommand, Debug)]
enum SettingsCommand {
    /// Show the effective settings
    Show,
    /// Change one or more settings
    Set(SetArgs),
}

#[derive(Args, Debug)]
struct SetArgs {
    /// Hour (0-23) at which a new day starts.
    #[arg(long, allow_negative_numbers = true)]
    day_start_hour: Option<i64>,

    /// Weekday the weekly report is sent, 0 = Sunday through 6 = Saturday.
    #[arg(long, allow_negative_numbers = true)]
    weekly_report_day: Option<i64>,

    /// `UTC` or a fixed offset such as `+09:00`.
    #[arg(long, allow_hyphen_values = true)]
    timezone: Option<String>,
}

impl SetArgs {
    fn patch(&self) -> SettingsPatch {
        SettingsPatch {
            day_start_hour: self.day_start_hour,
            weekly_report_day: self.weekly_report_day,
            timezone: self.timezone.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct SettingsOutput {
    path: String,
    #[serde(flatten)]
    settings: Settings,
}

pub fn run_settings(args: &SettingsArgs, output: OutputMode, paths: &DataPaths) -> Result<()> {
    let store = SettingsStore::new(&paths.settings);
    let settings = match &args.command {
        SettingsCommand::Show => store.load(),
        SettingsCommand::Set(set) => {
            let patch = set.patch();
            if patch.is_empty() {
                render_error(
                    output,
                    &CliError::with_details(
                        "nothing to change",
                        "pass --day-start-hour, --weekly-report-day, or --timezone",
                        "empty_patch",
                    ),
                )?;
                anyhow::bail!("nothing to change");
            }
            paths.ensure_root()?;
            store.save(&patch).map_err(|err| report_error(output, err))?
        }
    };

    let result = SettingsOutput {
        path: store.path().display().to_string(),
        settings,
    };
    render_mode(output, &result, render_settings_text, render_settings_pretty)
}

fn render_settings_text(out: &SettingsOutput, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(w, "day_start_hour\t{}", out.settings.day_start_hour)?;
    writeln!(w, "weekly_report_day\t{}", out.settings.weekly_report_day)?;
    writeln!(w, "timezone\t{}", out.settings.timezone)
}

fn render_settings_pretty(out: &SettingsOutput, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, "Settings")?;
    pretty_kv(w, "Day starts at", format!("{:02}:00", out.settings.day_start_hour))?;
    pretty_kv(
        w,
        "Weekly report",
        format!("{}", out.settings.weekly_report_weekday()),
    )?;
    pretty_kv(w, "Timezone", &out.settings.timezone)?;
    pretty_kv(w, "File", &out.path)
}
