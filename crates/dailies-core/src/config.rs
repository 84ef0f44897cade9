use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};

use crate::settings::SETTINGS_FILE;
use crate::store::{LEDGER_FILE, LOCK_FILE};

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "DAILIES_HOME";

/// Directory name under the platform data dir, and the last-resort
/// `./.dailies` fallback.
pub const APP_DIR: &str = "dailies";

pub const OUTBOX_FILE: &str = "outbox.jsonl";

/// Every file the tool keeps under one data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub root: PathBuf,
    pub ledger: PathBuf,
    pub lock: PathBuf,
    pub settings: PathBuf,
    pub outbox: PathBuf,
}

impl DataPaths {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            ledger: root.join(LEDGER_FILE),
            lock: root.join(LOCK_FILE),
            settings: root.join(SETTINGS_FILE),
            outbox: root.join(OUTBOX_FILE),
            root,
        }
    }

    /// Create the root directory if needed.
    pub fn ensure_root(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root)
            .with_context(|| format!("Failed to create data directory {}", self.root.display()))
    }
}

/// Resolve the data directory: flag, then `DAILIES_HOME`, then the platform
/// data dir, then `./.dailies`.
#[must_use]
pub fn resolve_data_dir(flag: Option<&Path>) -> PathBuf {
    resolve_data_dir_inner(flag, env::var(DATA_DIR_ENV).ok(), dirs::data_dir())
}

fn resolve_data_dir_inner(
    flag: Option<&Path>,
    env_dir: Option<String>,
    platform_dir: Option<PathBuf>,
) -> PathBuf {
    if let Some(dir) = flag {
        return dir.to_path_buf();
    }
    if let Some(dir) = env_dir.filter(|dir| !dir.trim().is_empty()) {
        return PathBuf::from(dir);
    }
    match platform_dir {
        Some(base) => base.join(APP_DIR),
        None => PathBuf::from(format!(".{APP_DIR}")),
    }
}
