//! Default configuration file creation.
//!
//! Writes a commented `nightshift.toml` whose values come from
//! `common::constants`, with comments aligned into one column.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::common::constants::*;
use crate::common::utils::private_path;

/// Create a default config file at `path`, including parent directories.
pub fn create_default_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    fs::write(path, default_config_content())
        .with_context(|| format!("Failed to write default config to {}", private_path(path)))?;

    log_block_start!("Created default config: {}", private_path(path));
    log_indented!("Edit it to set your location and switch to schedule_mode = \"solar\"");

    Ok(())
}

/// The commented default configuration as written on first run.
pub fn default_config_content() -> String {
    let content = ConfigBuilder::new()
        .add_section("Schedule")
        .add_setting("enabled", "true", "Master switch for the schedule")
        .add_setting(
            "schedule_mode",
            &format!("\"{DEFAULT_SCHEDULE_MODE}\""),
            "\"solar\" (sunrise/sunset) or \"custom\" (fixed times)",
        )
        .add_setting(
            "day_start",
            &format!("\"{DEFAULT_DAY_START}\""),
            "Start of the day phase (HH:MM[:SS])",
        )
        .add_setting(
            "night_start",
            &format!("\"{DEFAULT_NIGHT_START}\""),
            "Start of the night phase (HH:MM[:SS])",
        )
        .add_setting(
            "transition_duration",
            &DEFAULT_TRANSITION_DURATION.to_string(),
            &format!(
                "Transition length in minutes ({MINIMUM_TRANSITION_DURATION}-{MAXIMUM_TRANSITION_DURATION})"
            ),
        )
        .add_setting(
            "update_interval",
            &DEFAULT_UPDATE_INTERVAL.to_string(),
            &format!(
                "Seconds between updates during transitions ({MINIMUM_UPDATE_INTERVAL}-{MAXIMUM_UPDATE_INTERVAL})"
            ),
        )
        .add_section("Color values")
        .add_setting(
            "day_temp",
            &DEFAULT_DAY_TEMP.to_string(),
            &format!("Color temperature during day ({MINIMUM_TEMP}-{MAXIMUM_TEMP}) Kelvin"),
        )
        .add_setting(
            "night_temp",
            &DEFAULT_NIGHT_TEMP.to_string(),
            &format!("Color temperature during night ({MINIMUM_TEMP}-{MAXIMUM_TEMP}) Kelvin"),
        )
        .add_setting(
            "day_brightness",
            &DEFAULT_DAY_BRIGHTNESS.to_string(),
            &format!("Brightness during day ({MINIMUM_BRIGHTNESS}-{MAXIMUM_BRIGHTNESS}%)"),
        )
        .add_setting(
            "night_brightness",
            &DEFAULT_NIGHT_BRIGHTNESS.to_string(),
            &format!("Brightness during night ({MINIMUM_BRIGHTNESS}-{MAXIMUM_BRIGHTNESS}%)"),
        )
        .add_section("Location")
        .add_commented_setting("latitude", "40.7128", "Geographic latitude (solar mode)")
        .add_commented_setting(
            "longitude",
            "-74.0060",
            "Geographic longitude, positive east (solar mode)",
        )
        .add_section("Output")
        .add_setting(
            "backend",
            &format!("\"{DEFAULT_BACKEND}\""),
            "\"log\" or \"command\"",
        )
        .add_commented_setting(
            "apply_command",
            "\"my-gamma-tool -t {temperature} -b {brightness}\"",
            "Run for every applied value (command backend)",
        )
        .add_commented_setting(
            "reset_command",
            "\"my-gamma-tool --reset\"",
            "Run when the schedule stops (command backend)",
        )
        .add_setting(
            "demo_duration",
            &DEFAULT_DEMO_DURATION.to_string(),
            &format!(
                "Seconds for one demo cycle ({MINIMUM_DEMO_DURATION}-{MAXIMUM_DEMO_DURATION})"
            ),
        )
        .build();

    format!("{content}\n")
}

/// Builder for configuration files with aligned trailing comments.
///
/// Comment alignment is computed from the longest setting line, so changing a
/// default in `constants.rs` keeps the file tidy.
struct ConfigBuilder {
    entries: Vec<ConfigEntry>,
}

enum ConfigEntry {
    Section(String),
    Setting { line: String, comment: String },
}

impl ConfigBuilder {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    fn add_section(mut self, title: &str) -> Self {
        self.entries.push(ConfigEntry::Section(format!("#[{title}]")));
        self
    }

    fn add_setting(mut self, key: &str, value: &str, comment: &str) -> Self {
        self.entries.push(ConfigEntry::Setting {
            line: format!("{key} = {value}"),
            comment: format!("# {comment}"),
        });
        self
    }

    /// A setting written commented out, for optional keys without a default.
    fn add_commented_setting(mut self, key: &str, value: &str, comment: &str) -> Self {
        self.entries.push(ConfigEntry::Setting {
            line: format!("#{key} = {value}"),
            comment: format!("# {comment}"),
        });
        self
    }

    fn build(self) -> String {
        let max_width = self
            .entries
            .iter()
            .filter_map(|entry| match entry {
                ConfigEntry::Setting { line, .. } => Some(line.len()),
                ConfigEntry::Section(_) => None,
            })
            .max()
            .unwrap_or(0)
            + 1;

        let mut result = Vec::new();
        let mut first_section = true;

        for entry in self.entries {
            match entry {
                ConfigEntry::Section(title) => {
                    if !first_section {
                        result.push(String::new());
                    }
                    result.push(title);
                    first_section = false;
                }
                ConfigEntry::Setting { line, comment } => {
                    let padding = " ".repeat(max_width - line.len());
                    result.push(format!("{line}{padding}{comment}"));
                }
            }
        }

        result.join("\n")
    }
}
