//! Application-wide constants and default values.

// # Default color values
pub const DEFAULT_DAY_TEMP: u32 = 6500; // Kelvin
pub const DEFAULT_NIGHT_TEMP: u32 = 3300; // Kelvin
pub const DEFAULT_DAY_BRIGHTNESS: f32 = 100.0; // percent
pub const DEFAULT_NIGHT_BRIGHTNESS: f32 = 90.0; // percent

/// Values the output is restored to when the schedule disengages.
pub const NEUTRAL_TEMP: u32 = 6500;
pub const NEUTRAL_BRIGHTNESS: f32 = 100.0;

// # Schedule defaults
pub const DEFAULT_SCHEDULE_MODE: &str = "custom";
pub const DEFAULT_DAY_START: &str = "07:00:00";
pub const DEFAULT_NIGHT_START: &str = "20:00:00";
pub const DEFAULT_TRANSITION_DURATION: u32 = 30; // minutes
pub const DEFAULT_UPDATE_INTERVAL: u64 = 15; // seconds
pub const DEFAULT_DEMO_DURATION: u64 = 10; // seconds
pub const DEFAULT_BACKEND: &str = "log";

// # Validation limits
pub const MINIMUM_TEMP: u32 = 1000;
pub const MAXIMUM_TEMP: u32 = 20000;
pub const MINIMUM_BRIGHTNESS: f32 = 10.0;
pub const MAXIMUM_BRIGHTNESS: f32 = 100.0;
pub const MINIMUM_TRANSITION_DURATION: u32 = 1; // minutes
pub const MAXIMUM_TRANSITION_DURATION: u32 = 720; // minutes
pub const MINIMUM_UPDATE_INTERVAL: u64 = 1; // seconds
pub const MAXIMUM_UPDATE_INTERVAL: u64 = 300; // seconds
pub const MINIMUM_DEMO_DURATION: u64 = 1; // seconds
pub const MAXIMUM_DEMO_DURATION: u64 = 600; // seconds

// # Clock
pub const MINUTES_PER_DAY: i64 = 1440;

// # Solar calculation
/// Zenith of the refraction-corrected horizon, in degrees.
pub const SOLAR_ZENITH_DEGREES: f64 = 90.833;
/// Julian day of the J2000.0 epoch (2000-01-01T12:00 UTC).
pub const JULIAN_DAY_J2000: f64 = 2451545.0;
/// Julian day of 1970-01-01T12:00 UTC.
pub const JULIAN_DAY_UNIX_EPOCH_NOON: f64 = 2440588.0;
pub const DAYS_PER_JULIAN_CENTURY: f64 = 36525.0;

// # Demo playback
/// Frame interval of demo playback (~60 Hz).
pub const DEMO_FRAME_INTERVAL_MS: u64 = 16;

// # Config watching
pub const CONFIG_RELOAD_DEBOUNCE_MS: u64 = 500;

// # Exit codes
pub const EXIT_FAILURE: i32 = 1;

#[cfg(test)]
pub mod test_constants {
    pub const TEST_DAY_TEMP: u32 = 6500;
    pub const TEST_NIGHT_TEMP: u32 = 3300;
    pub const TEST_DAY_BRIGHTNESS: f32 = 100.0;
    pub const TEST_NIGHT_BRIGHTNESS: f32 = 80.0;
}
