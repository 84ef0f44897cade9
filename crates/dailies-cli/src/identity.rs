//! User identity resolution for CLI commands.
//!
//! The resolution chain: `--user` flag > `DAILIES_USER` env > `USER` env (TTY only).
//! Every command that reads or writes a user's lists needs an identity.

use std::env;

pub const USER_ENV: &str = "DAILIES_USER";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityError {
    pub message: String,
    pub code: &'static str,
}

impl std::fmt::Display for IdentityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for IdentityError {}

/// Environment reader trait for dependency injection in tests.
trait EnvReader {
    fn get(&self, key: &str) -> Option<String>;
    fn is_tty(&self) -> bool;
}

struct RealEnv;

impl EnvReader for RealEnv {
    fn get(&self, key: &str) -> Option<String> {
        env::var(key).ok().filter(|v| !v.trim().is_empty())
    }

    fn is_tty(&self) -> bool {
        use std::io::IsTerminal;
        std::io::stdin().is_terminal()
    }
}

fn resolve_user_with(cli_flag: Option<&str>, env: &dyn EnvReader) -> Option<String> {
    if let Some(user) = cli_flag.map(str::trim).filter(|user| !user.is_empty()) {
        return Some(user.to_string());
    }
    if let Some(val) = env.get(USER_ENV) {
        return Some(val.trim().to_string());
    }
    // A login name is only a safe default for interactive use; scripts and
    // chat adapters must say who they act for.
    if env.is_tty() {
        return env.get("USER");
    }
    None
}

/// Resolve the acting user, or explain how to set one.
pub fn require_user(cli_flag: Option<&str>) -> Result<String, IdentityError> {
    resolve_user_with(cli_flag, &RealEnv).ok_or_else(|| IdentityError {
        message: format!("User identity required. Set --user or {USER_ENV}."),
        code: "missing_user",
    })
}
