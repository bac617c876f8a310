use crate::index::types::IndexConfig;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const APP_NAME: &str = "tally";
const CONFIG_FILE: &str = "config.json";
const DB_FILE: &str = "index.db";

/// Application configuration stored in the app data directory
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Index database; defaults to `index.db` in the app data directory
    #[serde(default)]
    pub db_path: Option<PathBuf>,

    #[serde(default)]
    pub index: IndexConfig,
}

impl AppConfig {
    /// Load config from the app data directory, or return default if not found
    pub fn load() -> Result<Self> {
        Self::load_from(&get_config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = fs::read_to_string(config_path)
                .with_context(|| format!("Failed to read config file {}", config_path.display()))?;
            let config: AppConfig = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file {}", config_path.display()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Database location after applying defaults
    pub fn resolve_db_path(&self) -> Result<PathBuf> {
        match &self.db_path {
            Some(path) => Ok(path.clone()),
            None => default_db_path(),
        }
    }
}

/// Get the path to the config file
pub fn get_config_path() -> Result<PathBuf> {
    let app_dir = get_app_data_dir()?;
    Ok(app_dir.join(CONFIG_FILE))
}

pub fn default_db_path() -> Result<PathBuf> {
    Ok(get_app_data_dir()?.join(DB_FILE))
}

/// `tally` under the per-user local data directory, created on first use.
///
/// `$XDG_DATA_HOME` (or `~/.local/share`) on Linux, `~/Library/Application
/// Support` on macOS, `%LOCALAPPDATA%` on Windows.
pub fn get_app_data_dir() -> Result<PathBuf> {
    let app_dir = dirs::data_local_dir()
        .context("No local data directory for this user")?
        .join(APP_NAME);
    fs::create_dir_all(&app_dir)
        .with_context(|| format!("Failed to create {}", app_dir.display()))?;
    Ok(app_dir)
}
