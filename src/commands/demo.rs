//! Demo command: play one compressed day/night cycle and exit.

use anyhow::Result;
use std::time::Duration;

use crate::Nightshift;

/// Handle `nightshift demo [seconds]`.
///
/// Runs the schedule against the configured backend just long enough to play
/// one demo cycle. SIGINT stops playback early and restores neutral output.
pub fn handle_demo_command(duration_secs: Option<u64>, debug_enabled: bool) -> Result<()> {
    Nightshift::new(debug_enabled)
        .demo_once(duration_secs.map(Duration::from_secs))
        .run()
}
