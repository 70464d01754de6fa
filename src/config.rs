//! Configuration loading.
//!
//! Settings live in `config.toml` inside the data directory. Every key is
//! optional; a missing or broken file means defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::fields::{Status, ViewMode};

pub const CONFIG_FILE: &str = "config.toml";
const DATA_DIR_NAME: &str = ".deck";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Refuse new tasks without a due date.
    #[serde(default)]
    pub require_due_date: bool,

    /// Layout the interactive view opens in.
    #[serde(default)]
    pub default_view: ViewMode,

    /// Status filter the list view opens with.
    #[serde(default = "default_filter")]
    pub default_filter: Status,
}

fn default_filter() -> Status {
    Status::Backlog
}

impl Default for Config {
    fn default() -> Self {
        Self {
            require_due_date: false,
            default_view: ViewMode::default(),
            default_filter: default_filter(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load `config.toml` from the data directory, or return defaults.
    pub fn load_from_dir(dir: &Path) -> Self {
        let path = dir.join(CONFIG_FILE);
        if !path.exists() {
            return Self::default();
        }
        match Self::load(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %e, path = %path.display(), "ignoring invalid config");
                Self::default()
            }
        }
    }
}

/// Data directory: the override, else `$HOME/.deck`, else `./.deck`.
pub fn data_dir(override_dir: Option<&Path>) -> PathBuf {
    if let Some(dir) = override_dir {
        return dir.to_path_buf();
    }
    match std::env::var_os("HOME") {
        Some(home) if !home.is_empty() => PathBuf::from(home).join(DATA_DIR_NAME),
        _ => PathBuf::from(DATA_DIR_NAME),
    }
}
