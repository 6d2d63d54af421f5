//! Application coordinator that manages the complete lifecycle of nightshift.
//!
//! This module acquires everything the engine needs and wires it together:
//! - Configuration loading and the shared settings snapshot
//! - Output backend creation
//! - Signal handler and config watcher setup
//! - The engine message loop, until shutdown
//!
//! The `Nightshift` struct uses a builder pattern for the different startup
//! contexts:
//! - Normal startup: `Nightshift::new(debug_enabled).run()`
//! - One demo cycle: `Nightshift::new(debug_enabled).demo_once(duration).run()`

use anyhow::{Context, Result};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};

use crate::{
    backend::create_backend,
    common::utils::private_path,
    config::{self, ConfigWatcher, ScheduleMode, SharedSettings},
    core::{self, EngineMessage, EngineParams, ScheduleEngine, scheduler::ThreadScheduler},
    geo::log_solar_debug_info,
    io::signals::setup_signal_handler,
    state::{OverrideKind, ScheduleEvent, StateBroadcaster},
    time::source::{RealTimeSource, TimeSource},
};

/// Builder for configuring and running the nightshift application.
///
/// ```no_run
/// use nightshift::Nightshift;
/// use std::time::Duration;
///
/// # fn main() -> anyhow::Result<()> {
/// // Follow the schedule until SIGINT/SIGTERM
/// Nightshift::new(false).run()?;
///
/// // Play one 20 second demo cycle, then exit
/// Nightshift::new(false)
///     .demo_once(Some(Duration::from_secs(20)))
///     .run()?;
/// # Ok(())
/// # }
/// ```
pub struct Nightshift {
    debug_enabled: bool,
    watch_config: bool,
    demo_once: Option<Option<Duration>>,
}

impl Nightshift {
    /// Create a new runner with defaults matching normal run
    pub fn new(debug_enabled: bool) -> Self {
        Self {
            debug_enabled,
            watch_config: true,
            demo_once: None,
        }
    }

    /// Play a single demo cycle and exit once it completes. `None` uses the
    /// configured `demo_duration`.
    pub fn demo_once(mut self, duration: Option<Duration>) -> Self {
        self.demo_once = Some(duration);
        self.watch_config = false;
        self
    }

    /// Execute the application until shutdown.
    pub fn run(self) -> Result<()> {
        log_version!();
        if self.debug_enabled {
            log_pipe!();
            log_debug!("Debug mode enabled, showing detailed schedule operations");
        }

        let config_path = config::get_config_path()?;
        let config = config::load()?;
        config.log_config(&private_path(&config_path));

        let schedule = config.to_schedule_config()?;
        if self.debug_enabled
            && schedule.schedule_mode == ScheduleMode::Solar
            && let (Some(latitude), Some(longitude)) = (schedule.latitude, schedule.longitude)
        {
            log_solar_debug_info(RealTimeSource.now(), latitude, longitude);
        }

        let demo_duration = self
            .demo_once
            .map(|d| d.unwrap_or(Duration::from_secs(schedule.demo_duration_secs)));
        let settings = SharedSettings::new(schedule);

        let output = create_backend(&config)?;

        let (engine_tx, engine_rx) = mpsc::channel();
        let broadcaster = StateBroadcaster::new();

        let signals =
            setup_signal_handler(engine_tx.clone(), config_path.clone(), settings.clone())?;

        if self.watch_config {
            let watcher =
                ConfigWatcher::new(config_path.clone(), settings.clone(), engine_tx.clone());
            if let Err(e) = watcher.start() {
                log_warning!("Config hot reload unavailable: {:#}", e);
                log_indented!("Send SIGHUP to reload the configuration manually");
            }
        }

        if let Some(duration) = demo_duration {
            exit_after_demo(broadcaster.subscribe(), engine_tx.clone(), duration)?;
            engine_tx
                .send(EngineMessage::StartDemo(Some(duration)))
                .context("Failed to queue demo playback")?;
        }

        let engine = ScheduleEngine::new(EngineParams {
            settings: Arc::new(settings),
            output,
            scheduler: Box::new(ThreadScheduler::new(engine_tx.clone())),
            time_source: Arc::new(RealTimeSource),
            broadcaster,
        });
        drop(engine_tx);

        let result = core::run(engine, engine_rx);

        signals.close();
        log_end!();
        result
    }
}

/// Send `Shutdown` once demo playback has started and ended.
///
/// Gives up after twice the playback length so a demo that never starts
/// (for example because the schedule refused it) cannot hang the process.
fn exit_after_demo(
    events: Receiver<ScheduleEvent>,
    engine_sender: Sender<EngineMessage>,
    duration: Duration,
) -> Result<()> {
    thread::Builder::new()
        .name("demo-exit".into())
        .spawn(move || {
            let deadline = Instant::now() + duration * 2 + Duration::from_secs(1);
            let mut started = false;

            loop {
                let remaining = deadline.saturating_duration_since(Instant::now());
                match events.recv_timeout(remaining) {
                    Ok(ScheduleEvent::OverrideChanged {
                        from_override,
                        to_override,
                    }) => {
                        if to_override == OverrideKind::DemoPlayback {
                            started = true;
                        } else if started && from_override == OverrideKind::DemoPlayback {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(_) => {
                        if !started {
                            log_warning!("Demo playback did not start");
                        }
                        break;
                    }
                }
            }

            let _ = engine_sender.send(EngineMessage::Shutdown);
        })
        .context("Failed to spawn demo watcher thread")?;
    Ok(())
}
