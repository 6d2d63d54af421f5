//! Backend that only logs the values it is asked to apply.

use anyhow::Result;

use super::OutputSink;
use crate::common::constants::{NEUTRAL_BRIGHTNESS, NEUTRAL_TEMP};

/// Logs every value and remembers the last one.
#[derive(Debug, Default)]
pub struct LogBackend {
    last_applied: Option<(u32, f32)>,
}

impl LogBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_applied(&self) -> Option<(u32, f32)> {
        self.last_applied
    }
}

impl OutputSink for LogBackend {
    fn apply(&mut self, temperature: u32, brightness: f32) -> Result<()> {
        // Skip repeats so per-tick logging stays quiet during stable phases
        if self.last_applied != Some((temperature, brightness)) {
            log_decorated!("Output: {}K @ {:.1}% brightness", temperature, brightness);
        }
        self.last_applied = Some((temperature, brightness));
        Ok(())
    }

    fn reset(&mut self) -> Result<()> {
        log_decorated!(
            "Output reset to {}K @ {:.1}% brightness",
            NEUTRAL_TEMP,
            NEUTRAL_BRIGHTNESS
        );
        self.last_applied = None;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "Log"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_backend_tracks_last_value() {
        let mut backend = LogBackend::new();
        assert_eq!(backend.last_applied(), None);

        backend.apply(4500, 85.0).unwrap();
        assert_eq!(backend.last_applied(), Some((4500, 85.0)));

        backend.reset().unwrap();
        assert_eq!(backend.last_applied(), None);
    }
}
