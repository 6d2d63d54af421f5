//! Configuration validation.
//!
//! Rejects settings the schedule cannot honour: out-of-range color values,
//! invalid coordinates, unparseable or identical day/night start times and a
//! solar schedule without a location. Transition durations are not rejected
//! here; [`super::Config::to_schedule_config`] clamps them.

use anyhow::{Context, Result};

use super::{Backend, Config, ScheduleMode, parse_time_of_day};
use crate::common::constants::*;

/// Validate a parsed configuration before it is turned into a snapshot.
pub fn validate_config(config: &Config) -> Result<()> {
    validate_temperature("day_temp", config.day_temp)?;
    validate_temperature("night_temp", config.night_temp)?;
    validate_brightness("day_brightness", config.day_brightness)?;
    validate_brightness("night_brightness", config.night_brightness)?;

    if let Some(lat) = config.latitude
        && !(-90.0..=90.0).contains(&lat)
    {
        anyhow::bail!("latitude must be between -90 and 90 degrees (got {})", lat);
    }

    if let Some(lon) = config.longitude
        && !(-180.0..=180.0).contains(&lon)
    {
        anyhow::bail!(
            "longitude must be between -180 and 180 degrees (got {})",
            lon
        );
    }

    if let Some(interval) = config.update_interval
        && !(MINIMUM_UPDATE_INTERVAL..=MAXIMUM_UPDATE_INTERVAL).contains(&interval)
    {
        anyhow::bail!(
            "update_interval ({} seconds) must be between {} and {} seconds",
            interval,
            MINIMUM_UPDATE_INTERVAL,
            MAXIMUM_UPDATE_INTERVAL
        );
    }

    if let Some(duration) = config.demo_duration
        && !(MINIMUM_DEMO_DURATION..=MAXIMUM_DEMO_DURATION).contains(&duration)
    {
        anyhow::bail!(
            "demo_duration ({} seconds) must be between {} and {} seconds",
            duration,
            MINIMUM_DEMO_DURATION,
            MAXIMUM_DEMO_DURATION
        );
    }

    let day_start = parse_time_of_day(config.day_start.as_deref().unwrap_or(DEFAULT_DAY_START))
        .context("Invalid day_start time format")?;
    let night_start =
        parse_time_of_day(config.night_start.as_deref().unwrap_or(DEFAULT_NIGHT_START))
            .context("Invalid night_start time format")?;

    match config.schedule_mode() {
        ScheduleMode::Custom => {
            if day_start == night_start {
                anyhow::bail!(
                    "day_start and night_start cannot be the same time ({:02}:{:02})",
                    day_start / 60,
                    day_start % 60
                );
            }
        }
        ScheduleMode::Solar => {
            if config.latitude.is_none() || config.longitude.is_none() {
                anyhow::bail!(
                    "schedule_mode = \"solar\" requires both latitude and longitude to be set"
                );
            }
            // Custom times still serve as the polar-day fallback
            if day_start == night_start {
                anyhow::bail!(
                    "day_start and night_start are the fallback for polar days and cannot be equal"
                );
            }
        }
    }

    if config.backend() == Backend::Command && config.apply_command.is_none() {
        anyhow::bail!("backend = \"command\" requires apply_command to be set");
    }

    Ok(())
}

fn validate_temperature(field: &str, value: Option<u32>) -> Result<()> {
    if let Some(temp) = value
        && !(MINIMUM_TEMP..=MAXIMUM_TEMP).contains(&temp)
    {
        anyhow::bail!(
            "{} ({}) must be between {} and {} Kelvin",
            field,
            temp,
            MINIMUM_TEMP,
            MAXIMUM_TEMP
        );
    }
    Ok(())
}

fn validate_brightness(field: &str, value: Option<f32>) -> Result<()> {
    if let Some(brightness) = value
        && !(MINIMUM_BRIGHTNESS..=MAXIMUM_BRIGHTNESS).contains(&brightness)
    {
        anyhow::bail!(
            "{} ({}%) must be between {}% and {}%",
            field,
            brightness,
            MINIMUM_BRIGHTNESS,
            MAXIMUM_BRIGHTNESS
        );
    }
    Ok(())
}
