//! Geographic calculations.
//!
//! The `solar` module turns a date plus latitude/longitude into sunrise,
//! sunset and solar noon. Location acquisition itself is not handled here:
//! coordinates arrive through the configuration snapshot.

pub mod solar;

#[cfg(test)]
mod tests;

pub use solar::{PolarCondition, SolarEvent, SolarTimes, log_solar_debug_info};
