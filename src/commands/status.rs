//! Status command: resolve the schedule once and print the result.
//!
//! Nothing is applied to the output. The state printed is what a running
//! schedule would show at the chosen instant, in JSON or human-readable form.

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};

use crate::config::{self, ScheduleConfig};
use crate::core::period::resolve;
use crate::state::{OverrideKind, ScheduleState};
use crate::time::source::{FixedTimeSource, RealTimeSource, TimeSource, parse_datetime};

/// Handle `nightshift status [--json] [--at "YYYY-MM-DD HH:MM:SS"]`.
pub fn handle_status_command(json: bool, at: Option<&str>) -> Result<()> {
    let time_source: Box<dyn TimeSource> = match at {
        Some(at) => Box::new(FixedTimeSource::new(parse_datetime(at)?)),
        None => Box::new(RealTimeSource),
    };

    let config = config::load().context("Failed to load configuration")?;
    let schedule = config.to_schedule_config()?;

    let now = time_source.now();
    let state = status_snapshot(&schedule, now);

    if json {
        println!("{}", serde_json::to_string_pretty(&state)?);
    } else {
        display_human_readable(&state, now, time_source.is_simulated());
    }
    Ok(())
}

/// The state a running schedule would publish at `now`.
///
/// `output_applied` is always false since status never touches the output.
pub fn status_snapshot(config: &ScheduleConfig, now: DateTime<FixedOffset>) -> ScheduleState {
    let resolution = resolve(now, config);
    if resolution.missing_coordinates {
        log_warning!("Solar schedule has no coordinates, using custom day/night times");
    }
    let state = if config.enabled {
        ScheduleState::from_resolution(config, &resolution, resolution.value, OverrideKind::None)
    } else {
        ScheduleState::disabled(config, &resolution)
    };
    state.with_output_applied(false)
}

fn display_human_readable(state: &ScheduleState, now: DateTime<FixedOffset>, pinned: bool) {
    if pinned {
        println!("          Time: {}", now.format("%Y-%m-%d %H:%M:%S %:z"));
    }

    if !state.enabled {
        println!("      Schedule: disabled");
        println!("   Temperature: {}K", state.current.temperature);
        println!("    Brightness: {:.1}%", state.current.brightness);
        return;
    }

    match state.progress {
        Some(progress) => println!(
            "Current period: {} ({:.1}%)",
            state.phase.display_name(),
            progress * 100.0
        ),
        None => println!("Current period: {}", state.phase.display_name()),
    }
    println!("   Temperature: {}K", state.current.temperature);
    println!("    Brightness: {:.1}%", state.current.brightness);

    if let (Some(sunrise), Some(sunset)) = (state.sunrise, state.sunset) {
        println!("       Sunrise: {}", sunrise.format("%H:%M:%S"));
        println!("        Sunset: {}", sunset.format("%H:%M:%S"));
    }

    if let Some(next) = state.next_boundary {
        let remaining = (next - now).num_seconds().max(0) as u64;
        println!(
            "   Next period: {} at {} (in {})",
            state.phase.next_phase().display_name(),
            next.format("%H:%M:%S"),
            format_duration(remaining)
        );
    }
}

/// Compact duration such as "2h15m", "7m" or "42s".
fn format_duration(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        if minutes > 0 {
            format!("{}h{}m", hours, minutes)
        } else {
            format!("{}h", hours)
        }
    } else if minutes > 0 {
        format!("{}m", minutes)
    } else {
        format!("{}s", seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::period::{ColorValue, SchedulePhase};
    use crate::time::source::parse_datetime_with_offset;

    fn at(s: &str) -> DateTime<FixedOffset> {
        parse_datetime_with_offset(s, FixedOffset::east_opt(0).unwrap()).unwrap()
    }

    #[test]
    fn test_snapshot_during_day() {
        let config = ScheduleConfig::default();
        let state = status_snapshot(&config, at("2024-03-10 12:00:00"));

        assert!(state.enabled);
        assert_eq!(state.phase, SchedulePhase::Day);
        assert_eq!(state.current, config.day_value);
        assert_eq!(state.active_override, OverrideKind::None);
        assert!(!state.output_applied);
        assert_eq!(state.next_boundary, Some(at("2024-03-10 19:30:00")));
    }

    #[test]
    fn test_snapshot_when_disabled() {
        let config = ScheduleConfig {
            enabled: false,
            ..Default::default()
        };
        let state = status_snapshot(&config, at("2024-03-10 23:00:00"));

        assert!(!state.enabled);
        assert_eq!(state.current, ColorValue::neutral());
        assert_eq!(state.next_boundary, None);
    }

    #[test]
    fn test_snapshot_serializes_phase_in_snake_case() {
        let config = ScheduleConfig::default();
        let state = status_snapshot(&config, at("2024-03-10 19:45:00"));
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["phase"], "transitioning_to_night");
        assert_eq!(json["active_override"], "none");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(42), "42s");
        assert_eq!(format_duration(7 * 60 + 5), "7m");
        assert_eq!(format_duration(3600), "1h");
        assert_eq!(format_duration(2 * 3600 + 15 * 60), "2h15m");
    }
}
