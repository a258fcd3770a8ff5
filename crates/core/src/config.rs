//! Application configuration.
//!
//! Values come from built-in defaults, then `config.toml` under the user's
//! config directory, then `RECORDS_*` environment variables.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::storage::DEFAULT_RECORDS_FILE;

/// Directory name used under the platform config and data directories.
pub const APP_DIR: &str = "records";
/// File name of the configuration file.
pub const CONFIG_FILE: &str = "config.toml";

/// Runtime settings for the record manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// JSON document holding all records.
    pub data_file: PathBuf,
    /// Directory for `records.log`.
    pub log_dir: PathBuf,
    /// Save after every change instead of on demand.
    pub autosave: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        let data_root = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR);
        Self {
            data_file: data_root.join(DEFAULT_RECORDS_FILE),
            log_dir: data_root.join("logs"),
            autosave: true,
        }
    }
}

impl AppConfig {
    /// Load from the default config file location and the environment.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path())
    }

    /// Load using `path` as the config file; a missing file is not an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        let defaults = Self::default();
        let settings = Config::builder()
            .set_default("data_file", defaults.data_file.to_string_lossy().into_owned())?
            .set_default("log_dir", defaults.log_dir.to_string_lossy().into_owned())?
            .set_default("autosave", defaults.autosave)?
            .add_source(File::from(path).format(FileFormat::Toml).required(false))
            .add_source(Environment::with_prefix("RECORDS").try_parsing(true))
            .build()
            .with_context(|| format!("failed to read configuration from {}", path.display()))?;
        settings
            .try_deserialize()
            .context("invalid configuration values")
    }
}

/// Default location of the configuration file.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join(CONFIG_FILE)
}

/// Write a default config file if none exists and return its path.
pub fn ensure_default_config() -> Result<PathBuf> {
    let path = config_path();
    write_default_config(&path)?;
    Ok(path)
}

fn write_default_config(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, default_config_contents(&AppConfig::default()))
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), "Wrote default configuration");
    Ok(())
}

fn default_config_contents(config: &AppConfig) -> String {
    format!(
        "# Record manager settings. RECORDS_DATA_FILE, RECORDS_LOG_DIR and\n\
         # RECORDS_AUTOSAVE override these values.\n\
         data_file = '{}'\n\
         log_dir = '{}'\n\
         # Set to false to save only with Ctrl-S.\n\
         autosave = {}\n",
        config.data_file.display(),
        config.log_dir.display(),
        config.autosave
    )
}
