//! Demo playback: a compressed day→night→day cycle.
//!
//! Progress advances linearly by one frame per demo tick. The first half of
//! playback blends from the day value to the night value, the second half
//! back again. Real sunrise and sunset play no part in it.

use std::time::Duration;

use crate::common::constants::DEMO_FRAME_INTERVAL_MS;
use crate::core::period::ColorValue;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DemoPlayback {
    frame: u64,
    total_frames: u64,
}

impl DemoPlayback {
    /// Playback lasting roughly `duration` at the demo frame rate.
    pub fn new(duration: Duration) -> Self {
        let total_frames = (duration.as_millis() as u64 / DEMO_FRAME_INTERVAL_MS).max(1);
        Self {
            frame: 0,
            total_frames,
        }
    }

    /// Linear progress in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        self.frame as f64 / self.total_frames as f64
    }

    /// Move one frame forward. Returns true once playback has completed.
    pub fn advance(&mut self) -> bool {
        self.frame = (self.frame + 1).min(self.total_frames);
        self.is_complete()
    }

    pub fn is_complete(&self) -> bool {
        self.frame >= self.total_frames
    }

    pub fn value(&self, day: ColorValue, night: ColorValue) -> ColorValue {
        demo_value(self.progress(), day, night)
    }
}

/// Value shown at `progress` through a demo cycle.
pub fn demo_value(progress: f64, day: ColorValue, night: ColorValue) -> ColorValue {
    if progress < 0.5 {
        day.blend(night, progress * 2.0)
    } else {
        night.blend(day, (progress - 0.5) * 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: ColorValue = ColorValue::new(6500, 100.0);
    const NIGHT: ColorValue = ColorValue::new(3300, 80.0);

    #[test]
    fn test_demo_value_shape() {
        assert_eq!(demo_value(0.0, DAY, NIGHT), DAY);
        assert_eq!(demo_value(0.5, DAY, NIGHT), NIGHT);
        assert_eq!(demo_value(1.0, DAY, NIGHT), DAY);

        let quarter = demo_value(0.25, DAY, NIGHT);
        assert_eq!(quarter.temperature, 4900);
        let three_quarters = demo_value(0.75, DAY, NIGHT);
        assert_eq!(three_quarters.temperature, 4900);
    }

    #[test]
    fn test_playback_completes_after_expected_frames() {
        // 160 ms at 16 ms per frame is 10 frames
        let mut demo = DemoPlayback::new(Duration::from_millis(160));
        let mut frames = 0;
        while !demo.advance() {
            frames += 1;
            assert!(frames < 100, "playback never completed");
        }
        assert_eq!(frames + 1, 10);
        assert_eq!(demo.progress(), 1.0);
    }

    #[test]
    fn test_progress_is_monotonic_and_bounded() {
        let mut demo = DemoPlayback::new(Duration::from_secs(1));
        let mut last = demo.progress();
        while !demo.advance() {
            assert!(demo.progress() > last);
            last = demo.progress();
        }
        assert!(demo.progress() <= 1.0);
    }

    #[test]
    fn test_zero_duration_completes_in_one_frame() {
        let mut demo = DemoPlayback::new(Duration::ZERO);
        assert!(demo.advance());
    }
}
