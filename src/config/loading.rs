//! Configuration loading.
//!
//! Resolves the config file location, creates a default file on first run,
//! parses and validates TOML, and reloads settings into a [`SharedSettings`]
//! snapshot.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use super::validation::validate_config;
use super::{Config, ScheduleConfig, SharedSettings};
use crate::common::utils::private_path;

pub const CONFIG_FILE_NAME: &str = "nightshift.toml";

/// Explicit config file given on the command line, set once at startup
static CONFIG_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Use `path` instead of the default location for the rest of the process.
/// Returns an error if a path was already set.
pub fn set_config_path(path: PathBuf) -> Result<()> {
    CONFIG_PATH
        .set(path)
        .map_err(|_| anyhow::anyhow!("Configuration path already set"))
}

/// Path of the active configuration file.
///
/// An explicit `--config` path wins; otherwise
/// `$XDG_CONFIG_HOME/nightshift/nightshift.toml`.
pub fn get_config_path() -> Result<PathBuf> {
    if let Some(path) = CONFIG_PATH.get() {
        return Ok(path.clone());
    }
    default_config_path()
}

/// `$XDG_CONFIG_HOME/nightshift/nightshift.toml`, ignoring any explicit path.
pub fn default_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().context("Could not determine config directory")?;
    Ok(config_dir.join("nightshift").join(CONFIG_FILE_NAME))
}

/// Load configuration from the active path, creating a default file if none exists.
pub fn load() -> Result<Config> {
    let config_path = get_config_path()?;

    if !config_path.exists() {
        super::builder::create_default_config(&config_path)
            .context("Failed to create default config during load")?;
    }

    load_from_path(&config_path).with_context(|| {
        format!(
            "Failed to load configuration from {}",
            private_path(&config_path)
        )
    })
}

/// Load and validate configuration from a specific path.
///
/// Unlike [`load`], a missing file is an error rather than a prompt to create one.
pub fn load_from_path(path: &Path) -> Result<Config> {
    if !path.exists() {
        anyhow::bail!(
            "Configuration file not found at {}",
            private_path(path)
        );
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", private_path(path)))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config from {}", private_path(path)))?;

    validate_config(&config)?;

    Ok(config)
}

/// Reload `path` and swap the resulting snapshot into `settings`.
///
/// On any error the previous snapshot stays in place.
pub fn reload_into(path: &Path, settings: &SharedSettings) -> Result<ScheduleConfig> {
    let config = load_from_path(path)?;
    let snapshot = config.to_schedule_config()?;
    settings.replace(snapshot.clone());
    Ok(snapshot)
}
