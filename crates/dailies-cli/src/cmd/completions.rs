use anyhow::Result;
use clap::Args;
use clap_complete::{Shell, generate};

/// Arguments for `dly completions`.
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Write the completion script for `shell` to stdout.
///
/// # Errors
///
/// Currently infallible; the signature matches the other commands.
pub fn run_completions(shell: Shell, command: &mut clap::Command) -> Result<()> {
    let mut out = std::io::stdout();
    generate(shell, command, "dly", &mut out);
    Ok(())
}
