//! Configuration system for nightshift.
//!
//! Settings live in a TOML file, `nightshift.toml`, looked up in
//! `$XDG_CONFIG_HOME/nightshift/` unless a path is given with `--config`.
//! A commented default file is written on first run.
//!
//! ```toml
//! #[Schedule]
//! enabled = true                # Master switch for the schedule
//! schedule_mode = "custom"      # "solar" (sunrise/sunset) or "custom" (fixed times)
//! day_start = "07:00:00"        # Start of the day phase in custom mode (HH:MM[:SS])
//! night_start = "20:00:00"      # Start of the night phase in custom mode (HH:MM[:SS])
//! transition_duration = 30      # Length of each transition in minutes (1-720)
//!
//! #[Color values]
//! day_temp = 6500               # Color temperature during day (1000-20000) Kelvin
//! night_temp = 3300             # Color temperature during night (1000-20000) Kelvin
//! day_brightness = 100          # Brightness percentage during day (10-100%)
//! night_brightness = 90         # Brightness percentage during night (10-100%)
//!
//! #[Location]
//! latitude = 40.7128            # Geographic latitude (required for solar mode)
//! longitude = -74.0060          # Geographic longitude, positive east
//! ```
//!
//! The file is parsed into [`Config`], where every field is optional, then
//! validated (see [`validation`]) and turned into an immutable
//! [`ScheduleConfig`] snapshot for the schedule engine. [`SharedSettings`]
//! publishes the current snapshot to the engine, and the watcher in
//! [`watcher`] swaps it when the file changes on disk.

pub mod builder;
pub mod loading;
pub mod validation;
pub mod watcher;

use anyhow::{Context, Result};
use chrono::{NaiveTime, Timelike};
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use crate::common::constants::*;
use crate::core::period::ColorValue;

pub use builder::create_default_config;
pub use loading::{get_config_path, load, load_from_path, reload_into};
pub use watcher::ConfigWatcher;

/// How the day and night boundaries are chosen.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleMode {
    /// Day starts at sunrise and night at sunset for the configured location.
    Solar,
    /// Day and night start at fixed times of day.
    #[default]
    Custom,
}

impl ScheduleMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleMode::Solar => "solar",
            ScheduleMode::Custom => "custom",
        }
    }
}

impl fmt::Display for ScheduleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output backend selection.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Log every applied value; nothing touches the display.
    #[default]
    Log,
    /// Run user-supplied shell commands to apply and reset values.
    Command,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Log => "log",
            Backend::Command => "command",
        }
    }
}

/// Raw settings as read from `nightshift.toml`.
///
/// Every field is optional; missing values fall back to the defaults in
/// `common::constants` when the file is converted with
/// [`Config::to_schedule_config`].
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct Config {
    pub enabled: Option<bool>,
    pub schedule_mode: Option<ScheduleMode>,
    pub day_temp: Option<u32>,
    pub night_temp: Option<u32>,
    pub day_brightness: Option<f32>,
    pub night_brightness: Option<f32>,
    pub transition_duration: Option<u32>, // minutes
    pub day_start: Option<String>,        // HH:MM or HH:MM:SS
    pub night_start: Option<String>,      // HH:MM or HH:MM:SS
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub update_interval: Option<u64>, // seconds
    pub demo_duration: Option<u64>,   // seconds
    pub backend: Option<Backend>,
    pub apply_command: Option<String>,
    pub reset_command: Option<String>,
}

/// Immutable schedule settings consumed by one evaluation.
///
/// `transition_minutes` must be at least 1. The settings boundary guarantees
/// this; the core only asserts it in debug builds and treats smaller values
/// as 1 minute (see [`ScheduleConfig::effective_transition_minutes`]).
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleConfig {
    pub enabled: bool,
    pub schedule_mode: ScheduleMode,
    pub day_value: ColorValue,
    pub night_value: ColorValue,
    pub transition_minutes: u32,
    /// Minute of day, 0..1440
    pub custom_day_start: u32,
    /// Minute of day, 0..1440
    pub custom_night_start: u32,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub update_interval_secs: u64,
    pub demo_duration_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            schedule_mode: ScheduleMode::Custom,
            day_value: ColorValue::new(DEFAULT_DAY_TEMP, DEFAULT_DAY_BRIGHTNESS),
            night_value: ColorValue::new(DEFAULT_NIGHT_TEMP, DEFAULT_NIGHT_BRIGHTNESS),
            transition_minutes: DEFAULT_TRANSITION_DURATION,
            custom_day_start: 7 * 60,
            custom_night_start: 20 * 60,
            latitude: None,
            longitude: None,
            update_interval_secs: DEFAULT_UPDATE_INTERVAL,
            demo_duration_secs: DEFAULT_DEMO_DURATION,
        }
    }
}

impl ScheduleConfig {
    /// Transition length used by the resolver, never below one minute.
    pub fn effective_transition_minutes(&self) -> u32 {
        debug_assert!(
            self.transition_minutes >= MINIMUM_TRANSITION_DURATION,
            "transition_minutes must be at least {MINIMUM_TRANSITION_DURATION}"
        );
        self.transition_minutes.max(MINIMUM_TRANSITION_DURATION)
    }
}

/// Read-only access to the current settings snapshot.
///
/// Change notification is out of band: whoever swaps the settings posts
/// `EngineMessage::SettingsChanged` to the engine.
pub trait SettingsSource: Send + Sync {
    fn snapshot(&self) -> ScheduleConfig;
}

/// Thread-safe, swappable settings snapshot shared by the engine, the config
/// watcher and the signal handler.
#[derive(Debug, Clone)]
pub struct SharedSettings {
    inner: Arc<RwLock<ScheduleConfig>>,
}

impl SharedSettings {
    pub fn new(config: ScheduleConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    /// Replace the current snapshot.
    pub fn replace(&self, config: ScheduleConfig) {
        match self.inner.write() {
            Ok(mut guard) => *guard = config,
            // A panicked writer cannot leave a half-written ScheduleConfig behind
            Err(poisoned) => *poisoned.into_inner() = config,
        }
    }
}

impl SettingsSource for SharedSettings {
    fn snapshot(&self) -> ScheduleConfig {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

/// Parse a time of day (`HH:MM` or `HH:MM:SS`) into whole minutes since midnight.
///
/// Seconds are accepted for convenience and truncated.
pub fn parse_time_of_day(value: &str) -> Result<u32> {
    let value = value.trim();
    let time = NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .with_context(|| format!("Invalid time '{value}', expected HH:MM or HH:MM:SS"))?;
    Ok(time.hour() * 60 + time.minute())
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self> {
        load()
    }

    /// Load configuration from a specific file.
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        load_from_path(path)
    }

    pub fn schedule_mode(&self) -> ScheduleMode {
        self.schedule_mode.unwrap_or_default()
    }

    pub fn backend(&self) -> Backend {
        self.backend.unwrap_or_default()
    }

    /// Convert into the snapshot the schedule engine evaluates.
    ///
    /// Expects a validated config. A transition duration outside 1..=720
    /// minutes is clamped into range with a warning rather than rejected.
    pub fn to_schedule_config(&self) -> Result<ScheduleConfig> {
        let requested = self
            .transition_duration
            .unwrap_or(DEFAULT_TRANSITION_DURATION);
        let transition_minutes =
            requested.clamp(MINIMUM_TRANSITION_DURATION, MAXIMUM_TRANSITION_DURATION);
        if transition_minutes != requested {
            log_warning!(
                "transition_duration ({requested} minutes) is outside {MINIMUM_TRANSITION_DURATION}-{MAXIMUM_TRANSITION_DURATION}, using {transition_minutes}"
            );
        }

        let day_start = parse_time_of_day(self.day_start.as_deref().unwrap_or(DEFAULT_DAY_START))
            .context("Invalid day_start")?;
        let night_start =
            parse_time_of_day(self.night_start.as_deref().unwrap_or(DEFAULT_NIGHT_START))
                .context("Invalid night_start")?;

        Ok(ScheduleConfig {
            enabled: self.enabled.unwrap_or(true),
            schedule_mode: self.schedule_mode(),
            day_value: ColorValue::new(
                self.day_temp.unwrap_or(DEFAULT_DAY_TEMP),
                self.day_brightness.unwrap_or(DEFAULT_DAY_BRIGHTNESS),
            ),
            night_value: ColorValue::new(
                self.night_temp.unwrap_or(DEFAULT_NIGHT_TEMP),
                self.night_brightness.unwrap_or(DEFAULT_NIGHT_BRIGHTNESS),
            ),
            transition_minutes,
            custom_day_start: day_start,
            custom_night_start: night_start,
            latitude: self.latitude,
            longitude: self.longitude,
            update_interval_secs: self.update_interval.unwrap_or(DEFAULT_UPDATE_INTERVAL),
            demo_duration_secs: self.demo_duration.unwrap_or(DEFAULT_DEMO_DURATION),
        })
    }

    pub fn log_config(&self, source: &str) {
        log_block_start!("Loaded configuration from {}", source);

        if !self.enabled.unwrap_or(true) {
            log_indented!("Schedule: disabled");
        }
        log_indented!("Backend: {}", self.backend().as_str());

        match self.schedule_mode() {
            ScheduleMode::Solar => {
                log_indented!("Mode: Solar (sunrise/sunset)");
                if let (Some(lat), Some(lon)) = (self.latitude, self.longitude) {
                    let lat_dir = if lat >= 0.0 { "N" } else { "S" };
                    let lon_dir = if lon >= 0.0 { "E" } else { "W" };
                    log_indented!(
                        "Location: {:.3}°{}, {:.3}°{}",
                        lat.abs(),
                        lat_dir,
                        lon.abs(),
                        lon_dir
                    );
                }
            }
            ScheduleMode::Custom => {
                log_indented!("Mode: Custom");
                log_indented!(
                    "Day starts: {}",
                    self.day_start.as_deref().unwrap_or(DEFAULT_DAY_START)
                );
                log_indented!(
                    "Night starts: {}",
                    self.night_start.as_deref().unwrap_or(DEFAULT_NIGHT_START)
                );
            }
        }

        log_indented!(
            "Transition duration: {} minutes",
            self.transition_duration
                .unwrap_or(DEFAULT_TRANSITION_DURATION)
        );
        log_indented!(
            "Day: {}K @ {}% brightness",
            self.day_temp.unwrap_or(DEFAULT_DAY_TEMP),
            self.day_brightness.unwrap_or(DEFAULT_DAY_BRIGHTNESS)
        );
        log_indented!(
            "Night: {}K @ {}% brightness",
            self.night_temp.unwrap_or(DEFAULT_NIGHT_TEMP),
            self.night_brightness.unwrap_or(DEFAULT_NIGHT_BRIGHTNESS)
        );
        log_indented!(
            "Update interval: {} seconds",
            self.update_interval.unwrap_or(DEFAULT_UPDATE_INTERVAL)
        );
    }
}
