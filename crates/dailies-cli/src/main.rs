#![forbid(unsafe_code)]

mod cmd;
mod identity;
mod outbox;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use dailies_core::config::{DataPaths, resolve_data_dir};
use dailies_core::timing;
use output::{OutputMode, resolve_output_mode};
use std::env;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "dailies: per-user daily to-do lists",
    long_about = None
)]
struct Cli {
    /// Log debug detail to stderr unless DAILIES_LOG overrides the filter.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print per-operation latency to stderr when the command finishes.
    #[arg(long, global = true)]
    timing: bool,

    /// Shorthand for `--format json`.
    #[arg(long, global = true, hide = true)]
    json: bool,

    /// Output format (default: pretty on a terminal, text when piped).
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Act as this user (skips env resolution).
    #[arg(long, global = true)]
    user: Option<String>,

    /// Data directory holding the ledger and settings.
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn output_mode(&self) -> OutputMode {
        resolve_output_mode(self.format, self.json)
    }

    fn user_flag(&self) -> Option<&str> {
        self.user.as_deref()
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Tasks",
        about = "Add tasks to a day",
        long_about = "Add one or more tasks to a day. Separate several tasks with commas.",
        after_help = "EXAMPLES:\n    # Add one task for today\n    dly add \"review PR\"\n\n    # Add several at once\n    dly add \"homework, groceries, call mom\"\n\n    # Add to yesterday and post to the day's thread\n    dly add \"write notes\" --day yesterday --notify"
    )]
    Add(cmd::add::AddArgs),

    #[command(
        next_help_heading = "Tasks",
        about = "Show a day's tasks",
        long_about = "Show the numbered task list for a day. Numbers are used by done and delete.",
        after_help = "EXAMPLES:\n    # Today's list\n    dly list\n\n    # A specific day as JSON\n    dly list --day 2024-03-10 --format json"
    )]
    List(cmd::list::ListArgs),

    #[command(
        next_help_heading = "Tasks",
        about = "Mark a task complete",
        long_about = "Mark the task at a list number complete. Completing twice keeps the first time.",
        after_help = "EXAMPLES:\n    # Complete task 2 from today's list\n    dly done 2"
    )]
    Done(cmd::done::DoneArgs),

    #[command(
        next_help_heading = "Tasks",
        about = "Delete a task",
        long_about = "Delete the task at a list number. Later tasks move up one place.",
        after_help = "EXAMPLES:\n    # Delete task 1 from yesterday\n    dly delete 1 --day yesterday"
    )]
    Delete(cmd::delete::DeleteArgs),

    #[command(
        next_help_heading = "Tasks",
        about = "Carry unfinished tasks forward",
        long_about = "Copy unfinished tasks from one day into another. Selector numbers count unfinished tasks only.",
        after_help = "EXAMPLES:\n    # Carry everything unfinished from yesterday to today\n    dly carry\n\n    # Carry the first and third unfinished task\n    dly carry 1,3\n\n    # Between explicit days\n    dly carry all --from 2024-03-08 --to 2024-03-10"
    )]
    Carry(cmd::carry::CarryArgs),

    #[command(
        next_help_heading = "Tasks",
        about = "Show unfinished tasks from yesterday",
        long_about = "List an earlier day's unfinished tasks, numbered the way carry counts them.",
        after_help = "EXAMPLES:\n    # What is left from yesterday?\n    dly yesterday\n\n    # Then carry the second one\n    dly carry 2\n\n    # Look further back\n    dly yesterday --from 2024-03-08"
    )]
    Yesterday(cmd::yesterday::YesterdayArgs),

    #[command(
        next_help_heading = "Reports",
        about = "Weekly completion report",
        long_about = "Summarize the seven days ending at a date: tasks per day, completions, and the overall rate.",
        after_help = "EXAMPLES:\n    # This week\n    dly report\n\n    # Every user, as JSON\n    dly report --all-users --format json"
    )]
    Report(cmd::report::ReportArgs),

    #[command(
        next_help_heading = "Configuration",
        about = "Show or change settings",
        long_about = "Show or change the day start hour, weekly report day, and timezone.",
        after_help = "EXAMPLES:\n    # Show settings\n    dly settings show\n\n    # Start days at 04:00 in UTC-5\n    dly settings set --day-start-hour 4 --timezone -05:00"
    )]
    Settings(cmd::settings::SettingsArgs),

    #[command(
        next_help_heading = "Integration",
        about = "Inspect or bind a day's chat thread",
        long_about = "Get, set, or open the chat thread bound to a user's day.",
        after_help = "EXAMPLES:\n    # Which thread is today's?\n    dly thread get\n\n    # Bind a known thread\n    dly thread set C042/1710000000.000100\n\n    # Open one if needed\n    dly thread open --day yesterday"
    )]
    Thread(cmd::thread::ThreadArgs),

    #[command(
        next_help_heading = "Integration",
        about = "Run scheduled jobs",
        long_about = "Run the daily thread cleanup and the weekly report for all users.",
        after_help = "EXAMPLES:\n    # Whatever is due today (from cron)\n    dly jobs run\n\n    # Force the weekly report\n    dly jobs run --job weekly"
    )]
    Jobs(cmd::jobs::JobsArgs),

    #[command(
        next_help_heading = "Maintenance",
        about = "Check the data directory",
        long_about = "Report whether the ledger and settings are readable, without changing anything.",
        after_help = "EXAMPLES:\n    # Check health\n    dly health\n\n    # Emit machine-readable output\n    dly health --json"
    )]
    Health(cmd::health::HealthArgs),

    #[command(
        next_help_heading = "Maintenance",
        about = "Print a shell completion script for dly",
        long_about = "Print a completion script for bash, zsh, fish, elvish, or PowerShell to stdout.",
        after_help = "EXAMPLES:\n    # Generate bash completions\n    dly completions bash\n\n    # Generate zsh completions\n    dly completions zsh"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

impl Commands {
    /// Commands that may write into the data directory.
    const fn writes(&self) -> bool {
        matches!(
            self,
            Self::Add(_)
                | Self::Done(_)
                | Self::Delete(_)
                | Self::Carry(_)
                | Self::Thread(_)
                | Self::Jobs(_)
        )
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("DAILIES_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "dailies=debug,info"
        } else {
            "dailies=info,warn"
        })
    });

    let format = env::var("DAILIES_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let timing_enabled = cli.timing || timing::timing_enabled_from_env();
    timing::set_timing_enabled(timing_enabled);

    if cli.verbose {
        info!("debug logging on");
    }

    let output = cli.output_mode();
    let paths = DataPaths::new(resolve_data_dir(cli.data_dir.as_deref()));
    if cli.command.writes() {
        paths.ensure_root()?;
    }
    let user = cli.user_flag();

    let command_result = match cli.command {
        Commands::Add(ref args) => {
            timing::timed("cmd.add", || cmd::add::run_add(args, user, output, &paths))
        }
        Commands::List(ref args) => {
            timing::timed("cmd.list", || cmd::list::run_list(args, user, output, &paths))
        }
        Commands::Done(ref args) => {
            timing::timed("cmd.done", || cmd::done::run_done(args, user, output, &paths))
        }
        Commands::Delete(ref args) => timing::timed("cmd.delete", || {
            cmd::delete::run_delete(args, user, output, &paths)
        }),
        Commands::Carry(ref args) => {
            timing::timed("cmd.carry", || cmd::carry::run_carry(args, user, output, &paths))
        }
        Commands::Yesterday(ref args) => timing::timed("cmd.yesterday", || {
            cmd::yesterday::run_yesterday(args, user, output, &paths)
        }),
        Commands::Report(ref args) => timing::timed("cmd.report", || {
            cmd::report::run_report(args, user, output, &paths)
        }),
        Commands::Settings(ref args) => timing::timed("cmd.settings", || {
            cmd::settings::run_settings(args, output, &paths)
        }),
        Commands::Thread(ref args) => timing::timed("cmd.thread", || {
            cmd::thread::run_thread(args, user, output, &paths)
        }),
        Commands::Jobs(ref args) => {
            timing::timed("cmd.jobs", || cmd::jobs::run_jobs(args, output, &paths))
        }
        Commands::Health(ref args) => timing::timed("cmd.health", || {
            cmd::health::run_health(args, output, &paths)
        }),
        Commands::Completions(ref args) => timing::timed("cmd.completions", || {
            let mut command = Cli::command();
            cmd::completions::run_completions(args.shell, &mut command)
        }),
    };

    if timing_enabled {
        let report = timing::collect_report();
        if report.is_empty() {
            eprintln!("timing report: nothing was measured");
        } else {
            eprintln!("timing report:");
            eprintln!("{}", report.display_table());
            eprintln!("timing report (json):");
            eprintln!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    command_result
}
