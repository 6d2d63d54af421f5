//! Sunrise, sunset and solar noon from date and coordinates.
//!
//! Implements the NOAA solar calculator equations (Meeus, "Astronomical
//! Algorithms"), accurate to about a minute for latitudes within ±72°. The sun
//! is taken to rise or set when its centre crosses the refraction-corrected
//! horizon at a zenith of 90.833°.
//!
//! Nothing here is cached: every call derives the day's events from scratch,
//! so callers can never observe yesterday's sunrise after midnight.

use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone};
use serde::{Deserialize, Serialize};

use crate::common::constants::{
    DAYS_PER_JULIAN_CENTURY, JULIAN_DAY_J2000, JULIAN_DAY_UNIX_EPOCH_NOON, SOLAR_ZENITH_DEGREES,
};

/// Solar events of one calendar day, anchored to local midnight of that day.
///
/// Instants may fall outside the calendar day for extreme longitude/offset
/// combinations; the raw minute values keep the same anchor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolarTimes {
    pub sunrise: DateTime<FixedOffset>,
    pub sunset: DateTime<FixedOffset>,
    pub solar_noon: DateTime<FixedOffset>,
    /// Minutes from local midnight to sunrise
    pub sunrise_minutes: f64,
    /// Minutes from local midnight to sunset
    pub sunset_minutes: f64,
}

impl SolarTimes {
    /// Length of daylight in minutes.
    pub fn day_length_minutes(&self) -> f64 {
        self.sunset_minutes - self.sunrise_minutes
    }
}

/// Why a day has no sunrise or sunset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolarCondition {
    /// The sun stays above the horizon all day.
    PolarDay,
    /// The sun stays below the horizon all day.
    PolarNight,
}

impl std::fmt::Display for PolarCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PolarCondition::PolarDay => write!(f, "polar day"),
            PolarCondition::PolarNight => write!(f, "polar night"),
        }
    }
}

/// Outcome of a solar calculation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SolarEvent {
    Times(SolarTimes),
    /// No sunrise/sunset on this date at this location. Not an error.
    NoEvent(PolarCondition),
}

impl SolarEvent {
    pub fn times(&self) -> Option<&SolarTimes> {
        match self {
            SolarEvent::Times(times) => Some(times),
            SolarEvent::NoEvent(_) => None,
        }
    }
}

/// Sun position quantities needed for rise/set, for one instant.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SolarGeometry {
    /// Solar declination in degrees
    pub declination: f64,
    /// Equation of time in minutes (apparent minus mean solar time)
    pub equation_of_time: f64,
}

/// Julian day number of `date` at 12:00 UTC.
pub(crate) fn julian_day_at_noon(date: NaiveDate) -> f64 {
    let unix_epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or(NaiveDate::MIN);
    let days = date.signed_duration_since(unix_epoch).num_days();
    JULIAN_DAY_UNIX_EPOCH_NOON + days as f64
}

/// Julian centuries since J2000.0.
pub(crate) fn julian_century(julian_day: f64) -> f64 {
    (julian_day - JULIAN_DAY_J2000) / DAYS_PER_JULIAN_CENTURY
}

pub(crate) fn solar_geometry(t: f64) -> SolarGeometry {
    // Geometric mean longitude and anomaly of the sun (degrees)
    let mean_longitude = (280.46646 + t * (36000.76983 + t * 0.0003032)).rem_euclid(360.0);
    let mean_anomaly = 357.52911 + t * (35999.05029 - 0.0001537 * t);
    let eccentricity = 0.016708634 - t * (0.000042037 + 0.0000001267 * t);

    let m = mean_anomaly.to_radians();
    let equation_of_center = m.sin() * (1.914602 - t * (0.004817 + 0.000014 * t))
        + (2.0 * m).sin() * (0.019993 - 0.000101 * t)
        + (3.0 * m).sin() * 0.000289;

    let true_longitude = mean_longitude + equation_of_center;
    let omega = (125.04 - 1934.136 * t).to_radians();
    let apparent_longitude = true_longitude - 0.00569 - 0.00478 * omega.sin();

    let seconds = 21.448 - t * (46.815 + t * (0.00059 - t * 0.001813));
    let mean_obliquity = 23.0 + (26.0 + seconds / 60.0) / 60.0;
    let obliquity = mean_obliquity + 0.00256 * omega.cos();

    let declination = (obliquity.to_radians().sin() * apparent_longitude.to_radians().sin())
        .asin()
        .to_degrees();

    let y = (obliquity.to_radians() / 2.0).tan().powi(2);
    let l0 = mean_longitude.to_radians();
    let e = eccentricity;
    let equation_of_time = 4.0
        * (y * (2.0 * l0).sin() - 2.0 * e * m.sin() + 4.0 * e * y * m.sin() * (2.0 * l0).cos()
            - 0.5 * y * y * (4.0 * l0).sin()
            - 1.25 * e * e * (2.0 * m).sin())
        .to_degrees();

    SolarGeometry {
        declination,
        equation_of_time,
    }
}

/// Cosine of the sunrise hour angle; outside `[-1, 1]` means no event.
fn cos_hour_angle(latitude: f64, declination: f64) -> f64 {
    let lat = latitude.to_radians();
    let decl = declination.to_radians();
    SOLAR_ZENITH_DEGREES.to_radians().cos() / (lat.cos() * decl.cos()) - lat.tan() * decl.tan()
}

/// Calculate sunrise, sunset and solar noon for a date and location.
///
/// # Arguments
/// * `date` - Local calendar date
/// * `latitude` - Degrees, positive north (-90 to 90)
/// * `longitude` - Degrees, positive east (-180 to 180)
/// * `utc_offset_minutes` - Local offset from UTC valid on `date`, DST included
///
/// # Errors
/// Only for invalid coordinates or offsets. Polar day/night is reported as
/// `SolarEvent::NoEvent`.
pub fn calculate(
    date: NaiveDate,
    latitude: f64,
    longitude: f64,
    utc_offset_minutes: i32,
) -> Result<SolarEvent> {
    if !(-90.0..=90.0).contains(&latitude) {
        anyhow::bail!("Latitude must be between -90 and 90 degrees (got {latitude})");
    }
    if !(-180.0..=180.0).contains(&longitude) {
        anyhow::bail!("Longitude must be between -180 and 180 degrees (got {longitude})");
    }
    let offset = FixedOffset::east_opt(utc_offset_minutes * 60)
        .with_context(|| format!("UTC offset of {utc_offset_minutes} minutes is out of range"))?;

    let t = julian_century(julian_day_at_noon(date));
    let geometry = solar_geometry(t);

    let cos_h = cos_hour_angle(latitude, geometry.declination);
    if cos_h > 1.0 {
        return Ok(SolarEvent::NoEvent(PolarCondition::PolarNight));
    }
    if cos_h < -1.0 {
        return Ok(SolarEvent::NoEvent(PolarCondition::PolarDay));
    }
    let hour_angle = cos_h.acos().to_degrees();

    let noon_minutes =
        720.0 - 4.0 * longitude - geometry.equation_of_time + utc_offset_minutes as f64;
    let sunrise_minutes = noon_minutes - 4.0 * hour_angle;
    let sunset_minutes = noon_minutes + 4.0 * hour_angle;

    let midnight = offset
        .from_local_datetime(&date.and_time(NaiveTime::MIN))
        .single()
        .with_context(|| format!("Local midnight of {date} is not representable"))?;
    let at = |minutes: f64| midnight + Duration::seconds((minutes * 60.0).round() as i64);

    Ok(SolarEvent::Times(SolarTimes {
        sunrise: at(sunrise_minutes),
        sunset: at(sunset_minutes),
        solar_noon: at(noon_minutes),
        sunrise_minutes,
        sunset_minutes,
    }))
}

/// Calculate solar events for the calendar date of `now`, using its offset.
pub fn calculate_for(now: DateTime<FixedOffset>, latitude: f64, longitude: f64) -> Result<SolarEvent> {
    let offset_minutes = now.offset().local_minus_utc() / 60;
    calculate(now.date_naive(), latitude, longitude, offset_minutes)
}

/// Log a one-line summary of today's solar events.
pub fn log_solar_debug_info(now: DateTime<FixedOffset>, latitude: f64, longitude: f64) {
    match calculate_for(now, latitude, longitude) {
        Ok(SolarEvent::Times(times)) => {
            log_debug!(
                "Solar events for {} at {:.4}°, {:.4}°:",
                now.date_naive(),
                latitude,
                longitude
            );
            log_indented!("Sunrise:    {}", times.sunrise.format("%H:%M:%S"));
            log_indented!("Solar noon: {}", times.solar_noon.format("%H:%M:%S"));
            log_indented!("Sunset:     {}", times.sunset.format("%H:%M:%S"));
            let daylight = times.day_length_minutes().round() as i64;
            log_indented!("Daylight:   {}h {:02}m", daylight / 60, daylight % 60);
        }
        Ok(SolarEvent::NoEvent(condition)) => {
            log_debug!(
                "No sunrise or sunset on {} (day of year {}): {}",
                now.date_naive(),
                now.ordinal(),
                condition
            );
        }
        Err(e) => log_warning!("Solar calculation failed: {e}"),
    }
}
