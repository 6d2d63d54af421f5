//! Published schedule state and its observers.
//!
//! [`ScheduleState`] is the only externally observable artifact of the
//! engine. A fresh snapshot is built on every tick and every override update
//! and sent to subscribers through the [`StateBroadcaster`] wrapped in a
//! [`ScheduleEvent`].

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::ScheduleConfig;
use crate::core::period::{ColorValue, Resolution, SchedulePhase};

pub mod broadcast;
pub mod events;

pub use broadcast::StateBroadcaster;
pub use events::ScheduleEvent;

/// Which override, if any, currently owns the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideKind {
    #[default]
    None,
    ManualPreview,
    DemoPlayback,
}

impl fmt::Display for OverrideKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OverrideKind::None => "none",
            OverrideKind::ManualPreview => "manual preview",
            OverrideKind::DemoPlayback => "demo playback",
        };
        f.write_str(name)
    }
}

/// Immutable snapshot of the schedule, replaced wholesale on every publish.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleState {
    pub enabled: bool,
    pub phase: SchedulePhase,
    /// Progress through the current transition, if transitioning
    pub progress: Option<f64>,
    /// Value the output should be showing right now
    pub current: ColorValue,
    pub day_value: ColorValue,
    pub night_value: ColorValue,
    /// Absent in Custom mode and when a polar day forced the custom fallback
    pub sunrise: Option<DateTime<FixedOffset>>,
    pub sunset: Option<DateTime<FixedOffset>>,
    /// Absent while the schedule is disabled
    pub next_boundary: Option<DateTime<FixedOffset>>,
    pub active_override: OverrideKind,
    /// False when the output sink rejected `current`
    pub output_applied: bool,
}

impl ScheduleState {
    /// Snapshot for a resolved schedule showing `current`.
    ///
    /// `current` is the resolved value during normal operation and the
    /// override's value while one is active.
    pub fn from_resolution(
        config: &ScheduleConfig,
        resolution: &Resolution,
        current: ColorValue,
        active_override: OverrideKind,
    ) -> Self {
        Self {
            enabled: config.enabled,
            phase: resolution.phase,
            progress: resolution.progress,
            current,
            day_value: config.day_value,
            night_value: config.night_value,
            sunrise: resolution.solar.as_ref().map(|s| s.sunrise),
            sunset: resolution.solar.as_ref().map(|s| s.sunset),
            next_boundary: Some(resolution.next_boundary),
            active_override,
            output_applied: true,
        }
    }

    /// Snapshot for a stopped engine: output at the neutral baseline and
    /// nothing scheduled, whatever the configuration says.
    pub fn stopped(config: &ScheduleConfig, resolution: &Resolution) -> Self {
        Self {
            next_boundary: None,
            ..Self::from_resolution(
                config,
                resolution,
                ColorValue::neutral(),
                OverrideKind::None,
            )
        }
    }

    /// Snapshot for a disabled schedule.
    pub fn disabled(config: &ScheduleConfig, resolution: &Resolution) -> Self {
        Self {
            enabled: false,
            ..Self::stopped(config, resolution)
        }
    }

    pub fn with_output_applied(mut self, applied: bool) -> Self {
        self.output_applied = applied;
        self
    }
}
