//! How `dly` writes results and failures.
//!
//! Handlers build a serializable result and pass it here together with the
//! human renderers. JSON always goes through serde so scripts get the same
//! field names regardless of which command produced them. Failures go to
//! stderr wrapped as `{"error": {...}}` so stdout stays parseable.
//!
//! The mode is picked from, in order: `--format` (or the hidden `--json`),
//! then the `FORMAT` environment variable, then whether stdout is a terminal.

use std::io::{self, IsTerminal, Write};

use clap::ValueEnum;
use dailies_core::DailiesError;
use serde::Serialize;

const RULE_WIDTH: usize = 48;
const KEY_WIDTH: usize = 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    /// Headings, emoji status marks, and day labels.
    Pretty,
    /// One record per line, tab-separated.
    Text,
    /// Pretty-printed JSON.
    Json,
}

impl OutputMode {
    pub const fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }

    /// Parse a `FORMAT` value; anything unrecognised yields `None`.
    fn from_env_value(raw: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(raw.trim(), true).ok()
    }
}

/// Inputs that decide the output mode, gathered before any I/O decision.
#[derive(Debug, Clone, Copy)]
struct ModeInputs<'a> {
    flag: Option<OutputMode>,
    json: bool,
    env: Option<&'a str>,
    terminal: bool,
}

impl ModeInputs<'_> {
    fn pick(self) -> OutputMode {
        self.flag
            .or_else(|| self.json.then_some(OutputMode::Json))
            .or_else(|| self.env.and_then(OutputMode::from_env_value))
            .unwrap_or(if self.terminal {
                OutputMode::Pretty
            } else {
                OutputMode::Text
            })
    }
}

pub fn resolve_output_mode(format_flag: Option<OutputMode>, json_flag: bool) -> OutputMode {
    let env = std::env::var("FORMAT").ok();
    ModeInputs {
        flag: format_flag,
        json: json_flag,
        env: env.as_deref(),
        terminal: io::stdout().is_terminal(),
    }
    .pick()
}

fn write_json<T: Serialize + ?Sized>(out: &mut dyn Write, value: &T) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    out.write_all(b"\n")?;
    Ok(())
}

/// Print `value` to stdout, using separate renderers for text and pretty.
pub fn render_mode<T: Serialize>(
    mode: OutputMode,
    value: &T,
    text: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
    pretty: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let mut stdout = io::stdout().lock();
    match mode {
        OutputMode::Json => write_json(&mut stdout, value)?,
        OutputMode::Text => text(value, &mut stdout)?,
        OutputMode::Pretty => pretty(value, &mut stdout)?,
    }
    stdout.flush()?;
    Ok(())
}

/// Print `value` to stdout when text and pretty look the same.
pub fn render<T: Serialize>(
    mode: OutputMode,
    value: &T,
    human: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let mut stdout = io::stdout().lock();
    if mode.is_json() {
        write_json(&mut stdout, value)?;
    } else {
        human(value, &mut stdout)?;
    }
    stdout.flush()?;
    Ok(())
}

pub fn pretty_rule(w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "{}", "-".repeat(RULE_WIDTH))
}

pub fn pretty_section(w: &mut dyn Write, title: &str) -> io::Result<()> {
    writeln!(w, "{title}")?;
    pretty_rule(w)
}

pub fn pretty_kv(w: &mut dyn Write, label: &str, value: impl AsRef<str>) -> io::Result<()> {
    let label = format!("{label}:");
    writeln!(w, "{label:<KEY_WIDTH$} {}", value.as_ref())
}

/// Failure payload shown to the caller.
///
/// `error_code` is either a core code such as `E1001` or one of the
/// CLI-level codes (`missing_user`, `empty_patch`, `job_partial_failure`,
/// `ledger_corrupt`).
#[derive(Debug, Serialize)]
pub struct CliError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl CliError {
    pub fn with_details(
        message: impl Into<String>,
        hint: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            suggestion: Some(hint.into()),
            error_code: Some(code.into()),
        }
    }

    fn write_to(&self, mode: OutputMode, out: &mut dyn Write) -> anyhow::Result<()> {
        if mode.is_json() {
            return write_json(out, &serde_json::json!({ "error": self }));
        }
        writeln!(out, "error: {}", self.message)?;
        if let Some(hint) = &self.suggestion {
            writeln!(out, "  suggestion: {hint}")?;
        }
        Ok(())
    }
}

impl From<&DailiesError> for CliError {
    fn from(err: &DailiesError) -> Self {
        Self::with_details(err.to_string(), err.suggestion(), err.error_code().to_string())
    }
}

/// Write `error` to stderr.
pub fn render_error(mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    let mut stderr = io::stderr().lock();
    error.write_to(mode, &mut stderr)
}

/// Show a core error on stderr, then return it for `?`.
pub fn report_error(mode: OutputMode, err: DailiesError) -> anyhow::Error {
    if let Err(write_err) = render_error(mode, &CliError::from(&err)) {
        tracing::warn!(error = %write_err, "could not write error to stderr");
    }
    anyhow::Error::new(err)
}
