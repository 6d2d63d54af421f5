//! Time source abstraction for supporting both real time and controlled time.
//!
//! The engine never calls `Local::now()` itself. It asks the `TimeSource` it
//! was constructed with, so tests (and the `status --at` command) can pin the
//! clock to any instant and advance it deterministically.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration as ChronoDuration, FixedOffset, Local, NaiveDateTime, TimeZone};
use std::sync::Mutex;

/// Trait for abstracting time operations.
pub trait TimeSource: Send + Sync {
    /// Current local time, carrying the UTC offset valid at that instant.
    fn now(&self) -> DateTime<FixedOffset>;

    /// Check if this is a controlled (non wall-clock) time source
    fn is_simulated(&self) -> bool {
        false
    }
}

/// Real-time implementation that uses the system clock and local timezone.
pub struct RealTimeSource;

impl TimeSource for RealTimeSource {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// A clock that only moves when told to.
pub struct FixedTimeSource {
    current: Mutex<DateTime<FixedOffset>>,
}

impl FixedTimeSource {
    pub fn new(start: DateTime<FixedOffset>) -> Self {
        Self {
            current: Mutex::new(start),
        }
    }

    /// Jump to an absolute instant.
    pub fn set(&self, instant: DateTime<FixedOffset>) {
        if let Ok(mut guard) = self.current.lock() {
            *guard = instant;
        }
    }

    /// Move the clock forward (or backward, for negative durations).
    pub fn advance(&self, by: ChronoDuration) {
        if let Ok(mut guard) = self.current.lock() {
            *guard += by;
        }
    }
}

impl TimeSource for FixedTimeSource {
    fn now(&self) -> DateTime<FixedOffset> {
        match self.current.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    fn is_simulated(&self) -> bool {
        true
    }
}

/// Parse a datetime string in the format "YYYY-MM-DD HH:MM:SS" as local time.
pub fn parse_datetime(s: &str) -> Result<DateTime<FixedOffset>> {
    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .with_context(|| format!("Invalid datetime format '{s}'. Use YYYY-MM-DD HH:MM:SS"))?;

    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.fixed_offset())
        .with_context(|| format!("'{s}' does not exist in the local timezone"))
}

/// Parse a datetime string in the format "YYYY-MM-DD HH:MM:SS" at a fixed UTC offset.
pub fn parse_datetime_with_offset(s: &str, offset: FixedOffset) -> Result<DateTime<FixedOffset>> {
    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .with_context(|| format!("Invalid datetime format '{s}'. Use YYYY-MM-DD HH:MM:SS"))?;

    offset
        .from_local_datetime(&naive)
        .single()
        .with_context(|| format!("'{s}' is not representable at offset {offset}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offset(hours: i32) -> FixedOffset {
        FixedOffset::east_opt(hours * 3600).unwrap()
    }

    #[test]
    fn test_fixed_time_source_advances() {
        let start = parse_datetime_with_offset("2024-06-21 12:00:00", offset(2)).unwrap();
        let source = FixedTimeSource::new(start);

        assert_eq!(source.now(), start);
        assert!(source.is_simulated());

        source.advance(ChronoDuration::seconds(90));
        assert_eq!(source.now(), start + ChronoDuration::seconds(90));

        source.set(start);
        assert_eq!(source.now(), start);
    }

    #[test]
    fn test_parse_datetime_with_offset_keeps_offset() {
        let dt = parse_datetime_with_offset("2024-01-02 03:04:05", offset(-5)).unwrap();
        assert_eq!(dt.offset().local_minus_utc(), -5 * 3600);
        assert_eq!(dt.format("%H:%M:%S").to_string(), "03:04:05");
    }

    #[test]
    fn test_parse_datetime_rejects_garbage() {
        assert!(parse_datetime("yesterday at noon").is_err());
        assert!(parse_datetime_with_offset("2024-13-01 00:00:00", offset(0)).is_err());
    }

    #[test]
    fn test_real_time_source_is_not_simulated() {
        assert!(!RealTimeSource.is_simulated());
    }
}
