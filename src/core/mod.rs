//! The schedule engine.
//!
//! [`ScheduleEngine`] is the single owner of all runtime state: whether the
//! schedule is running, which override (if any) owns the output, and the
//! tokens of the timers it has armed. Everything that can change that state
//! arrives as an [`EngineMessage`] on one channel and is handled on one
//! thread by [`run`]:
//!
//! - periodic schedule ticks and demo frames from the [`scheduler::Scheduler`]
//! - settings changes from the config watcher and SIGHUP
//! - preview and demo requests from signals or embedding code
//! - shutdown
//!
//! While an override is active the periodic tick never touches the output.
//! Releasing an override re-evaluates the schedule immediately rather than
//! waiting for the next tick.

pub mod demo;
pub mod period;
pub mod scheduler;

use anyhow::Result;
use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::time::Duration;

use crate::backend::OutputSink;
use crate::common::constants::DEMO_FRAME_INTERVAL_MS;
use crate::config::{ScheduleConfig, SettingsSource};
use crate::geo::PolarCondition;
use crate::state::{OverrideKind, ScheduleEvent, ScheduleState, StateBroadcaster};
use crate::time::source::TimeSource;

use demo::DemoPlayback;
use period::{ColorValue, Resolution, SchedulePhase, resolve};
use scheduler::{Scheduler, TimerKind, TimerToken};

/// Everything the engine reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineMessage {
    /// A timer fired
    Timer(TimerToken),
    /// The settings snapshot was replaced
    SettingsChanged,
    StartPreview(ColorValue),
    UpdatePreview(ColorValue),
    StopPreview,
    /// Start demo playback; `None` uses the configured demo duration
    StartDemo(Option<Duration>),
    StopDemo,
    ToggleDemo,
    Shutdown,
}

/// Whether the engine is driving the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
}

/// The override currently bypassing the schedule, if any.
///
/// Holding a single value makes manual preview and demo playback mutually
/// exclusive by construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OverrideState {
    None,
    ManualPreview { value: ColorValue },
    DemoPlayback(DemoPlayback),
}

impl OverrideState {
    pub fn kind(&self) -> OverrideKind {
        match self {
            OverrideState::None => OverrideKind::None,
            OverrideState::ManualPreview { .. } => OverrideKind::ManualPreview,
            OverrideState::DemoPlayback(_) => OverrideKind::DemoPlayback,
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, OverrideState::None)
    }
}

/// Collaborators handed to a new engine.
pub struct EngineParams {
    pub settings: Arc<dyn SettingsSource>,
    pub output: Box<dyn OutputSink>,
    pub scheduler: Box<dyn Scheduler>,
    pub time_source: Arc<dyn TimeSource>,
    pub broadcaster: StateBroadcaster,
}

pub struct ScheduleEngine {
    settings: Arc<dyn SettingsSource>,
    output: Box<dyn OutputSink>,
    scheduler: Box<dyn Scheduler>,
    time_source: Arc<dyn TimeSource>,
    broadcaster: StateBroadcaster,

    run_state: RunState,
    override_state: OverrideState,
    schedule_timer: Option<(TimerToken, Duration)>,
    demo_timer: Option<TimerToken>,

    last_phase: Option<SchedulePhase>,
    last_state: Option<ScheduleState>,
    last_polar: Option<PolarCondition>,
    last_missing_coordinates: bool,
    warned_capped_transition: bool,
    /// True only while the last call that reached the sink was a successful reset
    output_at_baseline: bool,
}

impl ScheduleEngine {
    pub fn new(params: EngineParams) -> Self {
        Self {
            settings: params.settings,
            output: params.output,
            scheduler: params.scheduler,
            time_source: params.time_source,
            broadcaster: params.broadcaster,
            run_state: RunState::Idle,
            override_state: OverrideState::None,
            schedule_timer: None,
            demo_timer: None,
            last_phase: None,
            last_state: None,
            last_polar: None,
            last_missing_coordinates: false,
            warned_capped_transition: false,
            output_at_baseline: false,
        }
    }

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    pub fn override_state(&self) -> &OverrideState {
        &self.override_state
    }

    /// The most recently published state.
    pub fn last_state(&self) -> Option<&ScheduleState> {
        self.last_state.as_ref()
    }

    /// Start driving the output: evaluate now, then tick periodically.
    pub fn start(&mut self) -> Result<()> {
        if self.run_state == RunState::Running {
            log_debug!("Schedule engine already running");
            return Ok(());
        }

        log_block_start!("Starting schedule with {} output", self.output.name());
        self.run_state = RunState::Running;

        let config = self.settings.snapshot();
        self.evaluate(&config);
        self.arm_schedule_timer(&config)
    }

    /// Stop all timers, drop any override and return the output to neutral.
    pub fn stop(&mut self) {
        if self.run_state == RunState::Idle {
            return;
        }

        if let Some((token, _)) = self.schedule_timer.take() {
            self.scheduler.disarm(token);
        }
        self.disarm_demo_timer();
        self.set_override(OverrideState::None);

        let applied = self.reset_output();
        self.run_state = RunState::Idle;
        self.last_phase = None;

        let config = self.settings.snapshot();
        let resolution = resolve(self.time_source.now(), &config);
        let state = ScheduleState::stopped(&config, &resolution).with_output_applied(applied);
        self.publish_state(state);
        log_block_start!("Schedule stopped, output restored to neutral");
    }

    /// Periodic schedule evaluation.
    pub fn tick(&mut self) {
        if self.run_state == RunState::Idle || self.override_state.is_active() {
            return;
        }
        let config = self.settings.snapshot();
        self.evaluate(&config);
    }

    /// Show `value` directly, bypassing the schedule until released.
    pub fn start_preview(&mut self, value: ColorValue) {
        if self.run_state == RunState::Idle {
            log_warning!("Ignoring preview request while the schedule is stopped");
            return;
        }

        self.disarm_demo_timer();
        self.set_override(OverrideState::ManualPreview { value });
        self.apply_override_value(value);
    }

    /// Change the previewed value. Does nothing unless a preview is active.
    pub fn update_preview(&mut self, value: ColorValue) {
        let OverrideState::ManualPreview { value: current } = &mut self.override_state else {
            log_debug!("Ignoring preview update without an active preview");
            return;
        };
        *current = value;
        self.apply_override_value(value);
    }

    /// Release the preview and restore the scheduled value immediately.
    pub fn stop_preview(&mut self) {
        if !matches!(self.override_state, OverrideState::ManualPreview { .. }) {
            return;
        }
        self.set_override(OverrideState::None);
        self.tick();
    }

    /// Play a compressed day→night→day cycle over `duration`.
    ///
    /// Does nothing if a demo is already playing. Replaces an active preview.
    pub fn start_demo(&mut self, duration: Duration) -> Result<()> {
        if self.run_state == RunState::Idle {
            log_warning!("Ignoring demo request while the schedule is stopped");
            return Ok(());
        }
        if matches!(self.override_state, OverrideState::DemoPlayback(_)) {
            log_debug!("Demo already playing");
            return Ok(());
        }

        let token = self.scheduler.arm(
            TimerKind::Demo,
            Duration::from_millis(DEMO_FRAME_INTERVAL_MS),
        )?;
        self.demo_timer = Some(token);

        log_block_start!("Playing demo cycle over {:.1} seconds", duration.as_secs_f64());
        let playback = DemoPlayback::new(duration);
        self.set_override(OverrideState::DemoPlayback(playback));

        let config = self.settings.snapshot();
        self.apply_override_value(playback.value(config.day_value, config.night_value));
        Ok(())
    }

    /// Advance demo playback by one frame, stopping it when complete.
    pub fn demo_tick(&mut self) {
        let OverrideState::DemoPlayback(playback) = &mut self.override_state else {
            return;
        };

        if playback.advance() {
            log_decorated!("Demo cycle complete");
            self.stop_demo();
            return;
        }

        let playback = *playback;
        let config = self.settings.snapshot();
        self.apply_override_value(playback.value(config.day_value, config.night_value));
    }

    /// End demo playback and restore the scheduled value immediately.
    pub fn stop_demo(&mut self) {
        if !matches!(self.override_state, OverrideState::DemoPlayback(_)) {
            return;
        }
        self.disarm_demo_timer();
        self.set_override(OverrideState::None);
        self.tick();
    }

    /// Re-read settings and re-evaluate unless an override owns the output.
    pub fn settings_changed(&mut self) -> Result<()> {
        if self.run_state == RunState::Idle {
            return Ok(());
        }

        let config = self.settings.snapshot();
        self.warned_capped_transition = false;

        let interval = schedule_interval(&config);
        if self.schedule_timer.map(|(_, current)| current) != Some(interval) {
            if let Some((token, _)) = self.schedule_timer.take() {
                self.scheduler.disarm(token);
            }
            self.arm_schedule_timer(&config)?;
        }

        if self.override_state.is_active() {
            log_debug!(
                "Settings changed during {}, schedule re-evaluates when it ends",
                self.override_state.kind()
            );
            return Ok(());
        }

        self.evaluate(&config);
        Ok(())
    }

    /// Dispatch one message. Returns false when the engine should shut down.
    pub fn handle_message(&mut self, message: EngineMessage) -> bool {
        let result = match message {
            EngineMessage::Timer(token) => {
                self.handle_timer(token);
                Ok(())
            }
            EngineMessage::SettingsChanged => self.settings_changed(),
            EngineMessage::StartPreview(value) => {
                self.start_preview(value);
                Ok(())
            }
            EngineMessage::UpdatePreview(value) => {
                self.update_preview(value);
                Ok(())
            }
            EngineMessage::StopPreview => {
                self.stop_preview();
                Ok(())
            }
            EngineMessage::StartDemo(duration) => {
                let duration = duration.unwrap_or_else(|| self.configured_demo_duration());
                self.start_demo(duration)
            }
            EngineMessage::StopDemo => {
                self.stop_demo();
                Ok(())
            }
            EngineMessage::ToggleDemo => {
                if matches!(self.override_state, OverrideState::DemoPlayback(_)) {
                    self.stop_demo();
                    Ok(())
                } else {
                    let duration = self.configured_demo_duration();
                    self.start_demo(duration)
                }
            }
            EngineMessage::Shutdown => return false,
        };

        if let Err(e) = result {
            log_error!("{:#}", e);
        }
        true
    }

    fn handle_timer(&mut self, token: TimerToken) {
        match token.kind {
            TimerKind::Schedule if self.schedule_timer.map(|(t, _)| t) == Some(token) => {
                self.tick()
            }
            TimerKind::Demo if self.demo_timer == Some(token) => self.demo_tick(),
            // Fired before its timer was disarmed
            _ => log_debug!("Dropping stale {:?} timer event", token.kind),
        }
    }

    fn configured_demo_duration(&self) -> Duration {
        Duration::from_secs(self.settings.snapshot().demo_duration_secs)
    }

    fn arm_schedule_timer(&mut self, config: &ScheduleConfig) -> Result<()> {
        let interval = schedule_interval(config);
        let token = self.scheduler.arm(TimerKind::Schedule, interval)?;
        self.schedule_timer = Some((token, interval));
        Ok(())
    }

    fn disarm_demo_timer(&mut self) {
        if let Some(token) = self.demo_timer.take() {
            self.scheduler.disarm(token);
        }
    }

    fn set_override(&mut self, next: OverrideState) {
        let from = self.override_state.kind();
        let to = next.kind();
        self.override_state = next;

        if from != to {
            log_debug!("Override: {} -> {}", from, to);
            self.broadcaster
                .publish(ScheduleEvent::override_changed(from, to));
        }
    }

    /// Push an override value to the output and publish it.
    fn apply_override_value(&mut self, value: ColorValue) {
        let config = self.settings.snapshot();
        let resolution = resolve(self.time_source.now(), &config);
        let applied = self.apply_output(value);
        let state = ScheduleState::from_resolution(
            &config,
            &resolution,
            value,
            self.override_state.kind(),
        )
        .with_output_applied(applied);
        self.publish_state(state);
    }

    /// Resolve the schedule for now and drive the output accordingly.
    fn evaluate(&mut self, config: &ScheduleConfig) {
        let now = self.time_source.now();
        let resolution = resolve(now, config);
        self.log_resolution_notes(config, &resolution);

        if !config.enabled {
            let applied = if self.output_at_baseline {
                true
            } else {
                log_block_start!("Schedule disabled, output restored to neutral");
                self.reset_output()
            };

            self.last_phase = None;
            self.publish_state(ScheduleState::disabled(config, &resolution).with_output_applied(applied));
            return;
        }

        if let Some(previous) = self.last_phase
            && previous != resolution.phase
        {
            log_block_start!(
                "Entering {} ({})",
                resolution.phase.display_name(),
                resolution.value
            );
            self.broadcaster
                .publish(ScheduleEvent::phase_changed(previous, resolution.phase));
        } else if self.last_phase.is_none() {
            log_block_start!(
                "Current phase: {} ({})",
                resolution.phase.display_name(),
                resolution.value
            );
            log_indented!(
                "Next change at {}",
                resolution.next_boundary.format("%H:%M:%S")
            );
        }
        self.last_phase = Some(resolution.phase);

        let applied = self.apply_output(resolution.value);
        let state =
            ScheduleState::from_resolution(config, &resolution, resolution.value, OverrideKind::None)
                .with_output_applied(applied);
        self.publish_state(state);
    }

    fn log_resolution_notes(&mut self, config: &ScheduleConfig, resolution: &Resolution) {
        if resolution.missing_coordinates != self.last_missing_coordinates {
            if resolution.missing_coordinates {
                log_warning!("Solar schedule has no coordinates, using custom day/night times");
            }
            self.last_missing_coordinates = resolution.missing_coordinates;
        }

        if resolution.polar != self.last_polar {
            if let Some(condition) = resolution.polar {
                log_warning!(
                    "No sunrise or sunset today ({}), using custom day/night times",
                    condition
                );
            }
            self.last_polar = resolution.polar;
        }

        let requested = config.effective_transition_minutes() as f64;
        if !self.warned_capped_transition && resolution.arcs.transition_was_capped(requested) {
            log_warning!(
                "Transition of {} minutes does not fit between day and night, using {:.0} minutes",
                config.transition_minutes,
                resolution.arcs.transition_minutes
            );
            self.warned_capped_transition = true;
        }
    }

    /// Returns whether the sink accepted the value. Failures are logged and
    /// left for the next tick to retry.
    fn apply_output(&mut self, value: ColorValue) -> bool {
        self.output_at_baseline = false;
        match self.output.apply(value.temperature, value.brightness) {
            Ok(()) => true,
            Err(e) => {
                log_error!(
                    "Failed to apply {} to {} output: {}",
                    value,
                    self.output.name(),
                    e
                );
                false
            }
        }
    }

    /// Returns whether the sink accepted the reset.
    fn reset_output(&mut self) -> bool {
        match self.output.reset() {
            Ok(()) => {
                self.output_at_baseline = true;
                true
            }
            Err(e) => {
                log_error!("Failed to reset {} output: {}", self.output.name(), e);
                self.output_at_baseline = false;
                false
            }
        }
    }

    fn publish_state(&mut self, state: ScheduleState) {
        self.last_state = Some(state.clone());
        self.broadcaster.publish(ScheduleEvent::state_applied(state));
    }
}

fn schedule_interval(config: &ScheduleConfig) -> Duration {
    Duration::from_secs(config.update_interval_secs.max(1))
}

/// Drive `engine` from `messages` until shutdown or until every sender is gone.
pub fn run(mut engine: ScheduleEngine, messages: Receiver<EngineMessage>) -> Result<()> {
    engine.start()?;

    for message in messages {
        if !engine.handle_message(message) {
            break;
        }
    }

    engine.stop();
    Ok(())
}

#[cfg(test)]
mod tests;
