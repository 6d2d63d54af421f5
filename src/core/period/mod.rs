//! Phase resolution for the day/night schedule.
//!
//! This module answers one question for the engine: given an instant and a
//! settings snapshot, which phase is the schedule in, what color value does
//! that imply, and when does the current phase end?
//!
//! ## Key Functionality
//! - **Boundary selection**: solar sunrise/sunset in Solar mode, configured
//!   times in Custom mode, and the custom times as a fallback on polar days
//! - **Classification**: four arcs on the day ring, wrapping at midnight
//!   (see [`calculations::ScheduleArcs`])
//! - **Interpolation**: smoothstep blending between the day and night values
//!   inside transition arcs
//! - **Scheduling**: the absolute instant of the next phase boundary

pub mod calculations;
pub mod clock;

pub use calculations::{Classification, ScheduleArcs};

use chrono::{DateTime, Duration, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::common::constants::{NEUTRAL_BRIGHTNESS, NEUTRAL_TEMP};
use crate::common::utils::{interpolate_f32, interpolate_u32};
use crate::config::{ScheduleConfig, ScheduleMode};
use crate::geo::solar::{self, PolarCondition, SolarEvent, SolarTimes};

/// Classification of the schedule cycle at an instant.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulePhase {
    /// Day value applies unchanged
    Day,
    /// Blending from the day value towards the night value
    TransitioningToNight,
    /// Night value applies unchanged
    Night,
    /// Blending from the night value towards the day value
    TransitioningToDay,
}

impl fmt::Display for SchedulePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl SchedulePhase {
    /// Returns true if this is a transitioning phase.
    pub fn is_transitioning(&self) -> bool {
        matches!(self, Self::TransitioningToNight | Self::TransitioningToDay)
    }

    /// Returns the display name for this phase.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Day => "Day",
            Self::TransitioningToNight => "Sunset transition",
            Self::Night => "Night",
            Self::TransitioningToDay => "Sunrise transition",
        }
    }

    /// Returns the phase that follows this one in the cycle.
    pub fn next_phase(&self) -> Self {
        match self {
            Self::Day => Self::TransitioningToNight,
            Self::TransitioningToNight => Self::Night,
            Self::Night => Self::TransitioningToDay,
            Self::TransitioningToDay => Self::Day,
        }
    }
}

/// A target display color: temperature in Kelvin plus brightness in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorValue {
    pub temperature: u32,
    pub brightness: f32,
}

impl ColorValue {
    pub const fn new(temperature: u32, brightness: f32) -> Self {
        Self {
            temperature,
            brightness,
        }
    }

    /// The no-shift baseline the output returns to when disengaged.
    pub const fn neutral() -> Self {
        Self::new(NEUTRAL_TEMP, NEUTRAL_BRIGHTNESS)
    }

    /// Smoothstep blend from `self` to `target`; exact at `progress` 0 and 1.
    pub fn blend(self, target: ColorValue, progress: f64) -> ColorValue {
        ColorValue {
            temperature: interpolate_u32(self.temperature, target.temperature, progress),
            brightness: interpolate_f32(self.brightness, target.brightness, progress),
        }
    }
}

impl fmt::Display for ColorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}K @ {:.1}%", self.temperature, self.brightness)
    }
}

/// Everything the engine needs from one evaluation of the schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub phase: SchedulePhase,
    /// Linear progress through the current transition, if transitioning
    pub progress: Option<f64>,
    pub value: ColorValue,
    /// First instant at or after `now` where the current phase ends
    pub next_boundary: DateTime<FixedOffset>,
    /// Today's solar events; `None` in Custom mode and on polar days
    pub solar: Option<SolarTimes>,
    /// Set when Solar mode fell back to custom times because of a polar day or night
    pub polar: Option<PolarCondition>,
    /// Set when Solar mode fell back to custom times for lack of coordinates
    pub missing_coordinates: bool,
    pub arcs: ScheduleArcs,
}

/// Boundaries chosen for an evaluation before classification.
struct Boundaries {
    day_start: f64,
    night_start: f64,
    solar: Option<SolarTimes>,
    polar: Option<PolarCondition>,
    missing_coordinates: bool,
}

/// Round fractional minutes to whole seconds so arcs line up with reported instants.
fn to_second_precision(minutes: f64) -> f64 {
    (minutes * 60.0).round() / 60.0
}

fn select_boundaries(now: DateTime<FixedOffset>, config: &ScheduleConfig) -> Boundaries {
    let custom = Boundaries {
        day_start: config.custom_day_start as f64,
        night_start: config.custom_night_start as f64,
        solar: None,
        polar: None,
        missing_coordinates: false,
    };

    if config.schedule_mode != ScheduleMode::Solar {
        return custom;
    }

    let (Some(latitude), Some(longitude)) = (config.latitude, config.longitude) else {
        return Boundaries {
            missing_coordinates: true,
            ..custom
        };
    };

    match solar::calculate_for(now, latitude, longitude) {
        Ok(SolarEvent::Times(times)) => Boundaries {
            day_start: to_second_precision(times.sunrise_minutes),
            night_start: to_second_precision(times.sunset_minutes),
            solar: Some(times),
            polar: None,
            missing_coordinates: false,
        },
        Ok(SolarEvent::NoEvent(condition)) => Boundaries {
            polar: Some(condition),
            ..custom
        },
        Err(e) => {
            log_warning!("Solar calculation failed ({e}), using custom day/night times");
            custom
        }
    }
}

/// Resolve the schedule at `now`.
///
/// In Solar mode the day starts at today's sunrise and the night at today's
/// sunset. When the sun does not rise or set (polar conditions), or in Custom
/// mode, the configured day/night start times are used and no solar instants
/// are reported. Transitions end exactly on the day/night boundaries.
pub fn resolve(now: DateTime<FixedOffset>, config: &ScheduleConfig) -> Resolution {
    let boundaries = select_boundaries(now, config);
    let arcs = ScheduleArcs::new(
        boundaries.day_start,
        boundaries.night_start,
        config.effective_transition_minutes() as f64,
    );

    let t = clock::minute_of_day(&now);
    let classification = arcs.classify(t);

    let value = match (classification.phase, classification.progress) {
        (SchedulePhase::Day, _) => config.day_value,
        (SchedulePhase::Night, _) => config.night_value,
        (SchedulePhase::TransitioningToNight, progress) => config
            .day_value
            .blend(config.night_value, progress.unwrap_or(0.0)),
        (SchedulePhase::TransitioningToDay, progress) => config
            .night_value
            .blend(config.day_value, progress.unwrap_or(0.0)),
    };

    // Arcs are half-open, so the end is strictly ahead of t (wrapping to tomorrow if needed)
    let remaining_minutes = clock::forward_distance(t, classification.arc_end);
    let next_boundary = now + Duration::milliseconds((remaining_minutes * 60_000.0).round() as i64);

    Resolution {
        phase: classification.phase,
        progress: classification.progress,
        value,
        next_boundary,
        solar: boundaries.solar,
        polar: boundaries.polar,
        missing_coordinates: boundaries.missing_coordinates,
        arcs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::constants::test_constants::*;
    use chrono::{TimeZone, Timelike};

    fn custom_config(day_start: u32, night_start: u32, transition: u32) -> ScheduleConfig {
        ScheduleConfig {
            schedule_mode: ScheduleMode::Custom,
            custom_day_start: day_start,
            custom_night_start: night_start,
            transition_minutes: transition,
            day_value: ColorValue::new(TEST_DAY_TEMP, TEST_DAY_BRIGHTNESS),
            night_value: ColorValue::new(TEST_NIGHT_TEMP, TEST_NIGHT_BRIGHTNESS),
            ..ScheduleConfig::default()
        }
    }

    fn at(h: u32, m: u32, s: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(3600)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 5, h, m, s)
            .unwrap()
    }

    #[test]
    fn test_custom_day_and_night_values() {
        let config = custom_config(420, 1200, 20);

        let day = resolve(at(12, 0, 0), &config);
        assert_eq!(day.phase, SchedulePhase::Day);
        assert_eq!(day.value, config.day_value);
        assert_eq!(day.progress, None);
        assert!(day.solar.is_none());
        // Day ends when the sunset transition begins at 19:40
        assert_eq!(day.next_boundary, at(19, 40, 0));

        let night = resolve(at(23, 0, 0), &config);
        assert_eq!(night.phase, SchedulePhase::Night);
        assert_eq!(night.value, config.night_value);
        // Night ends at 06:40 tomorrow
        assert_eq!(night.next_boundary, at(6, 40, 0) + Duration::days(1));
    }

    #[test]
    fn test_transition_midpoint_blends_values() {
        let config = custom_config(420, 1200, 20);

        let mid = resolve(at(19, 50, 0), &config);
        assert_eq!(mid.phase, SchedulePhase::TransitioningToNight);
        assert_eq!(mid.progress, Some(0.5));
        assert_eq!(mid.value.temperature, (TEST_DAY_TEMP + TEST_NIGHT_TEMP) / 2);
        assert!((mid.value.brightness - 90.0).abs() < 1e-4);
        assert_eq!(mid.next_boundary, at(20, 0, 0));
    }

    #[test]
    fn test_boundary_instants_belong_to_the_next_phase() {
        let config = custom_config(420, 1200, 20);
        assert_eq!(resolve(at(7, 0, 0), &config).phase, SchedulePhase::Day);
        assert_eq!(resolve(at(20, 0, 0), &config).phase, SchedulePhase::Night);
        assert_eq!(
            resolve(at(6, 59, 0), &config).phase,
            SchedulePhase::TransitioningToDay
        );
        // Transition start gives exactly the outgoing value
        let start = resolve(at(19, 40, 0), &config);
        assert_eq!(start.progress, Some(0.0));
        assert_eq!(start.value, config.day_value);
    }

    #[test]
    fn test_solar_mode_uses_sunrise_and_sunset() {
        let config = ScheduleConfig {
            schedule_mode: ScheduleMode::Solar,
            latitude: Some(41.10),
            longitude: Some(-74.01),
            ..custom_config(0, 720, 30)
        };
        let edt = FixedOffset::west_opt(4 * 3600).unwrap();
        let noon = edt.with_ymd_and_hms(2024, 6, 21, 12, 0, 0).unwrap();

        let resolution = resolve(noon, &config);
        assert_eq!(resolution.phase, SchedulePhase::Day);
        let solar = resolution.solar.expect("solar times");
        assert_eq!(solar.sunrise.hour(), 5);
        assert_eq!(solar.sunset.hour(), 20);
        // Day lasts until 30 minutes before sunset
        assert_eq!(
            (resolution.next_boundary - solar.sunset).num_seconds().abs() / 60,
            30
        );
        assert!(resolution.polar.is_none());
    }

    #[test]
    fn test_polar_night_falls_back_to_custom_times() {
        let config = ScheduleConfig {
            schedule_mode: ScheduleMode::Solar,
            latitude: Some(69.65),
            longitude: Some(18.96),
            ..custom_config(480, 1080, 30)
        };
        let cet = FixedOffset::east_opt(3600).unwrap();
        let now = cet.with_ymd_and_hms(2024, 12, 21, 12, 0, 0).unwrap();

        let resolution = resolve(now, &config);
        assert_eq!(resolution.polar, Some(PolarCondition::PolarNight));
        assert!(resolution.solar.is_none());
        assert_eq!(resolution.phase, SchedulePhase::Day);
        assert_eq!(resolution.arcs.day_start, 480.0);
        assert_eq!(resolution.arcs.night_start, 1080.0);
    }

    #[test]
    fn test_solar_mode_without_coordinates_uses_custom() {
        let config = ScheduleConfig {
            schedule_mode: ScheduleMode::Solar,
            latitude: None,
            longitude: None,
            ..custom_config(420, 1200, 20)
        };
        let resolution = resolve(at(21, 0, 0), &config);
        assert_eq!(resolution.phase, SchedulePhase::Night);
        assert!(resolution.solar.is_none());
        assert!(resolution.missing_coordinates);
        assert!(!resolve(at(21, 0, 0), &custom_config(420, 1200, 20)).missing_coordinates);
    }

    #[test]
    fn test_next_boundary_is_never_in_the_past() {
        let config = custom_config(420, 1200, 20);
        for minute in (0..1440).step_by(7) {
            let now = at(0, 0, 0) + Duration::minutes(minute);
            let resolution = resolve(now, &config);
            assert!(resolution.next_boundary > now);
            assert!(resolution.next_boundary <= now + Duration::days(1));
        }
    }

    #[test]
    fn test_phase_cycle_order() {
        let mut phase = SchedulePhase::Day;
        for _ in 0..4 {
            phase = phase.next_phase();
        }
        assert_eq!(phase, SchedulePhase::Day);
        assert!(SchedulePhase::TransitioningToDay.is_transitioning());
        assert!(!SchedulePhase::Night.is_transitioning());
    }
}
