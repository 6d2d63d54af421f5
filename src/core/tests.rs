use super::scheduler::ManualScheduler;
use super::*;
use crate::backend::MockOutputSink;
use crate::common::constants::test_constants::*;
use crate::config::SharedSettings;
use crate::time::source::FixedTimeSource;
use chrono::{DateTime, FixedOffset, TimeZone};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq)]
enum SinkCall {
    Apply(u32, f32),
    Reset,
}

/// Output sink that records every call.
#[derive(Clone, Default)]
struct RecordingSink {
    calls: Arc<Mutex<Vec<SinkCall>>>,
}

impl RecordingSink {
    fn calls(&self) -> Vec<SinkCall> {
        self.calls.lock().unwrap().clone()
    }

    fn last(&self) -> Option<SinkCall> {
        self.calls.lock().unwrap().last().copied()
    }

    fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }
}

impl OutputSink for RecordingSink {
    fn apply(&mut self, temperature: u32, brightness: f32) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(SinkCall::Apply(temperature, brightness));
        Ok(())
    }

    fn reset(&mut self) -> Result<()> {
        self.calls.lock().unwrap().push(SinkCall::Reset);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "Recording"
    }
}

const DAY: ColorValue = ColorValue::new(TEST_DAY_TEMP, TEST_DAY_BRIGHTNESS);
const NIGHT: ColorValue = ColorValue::new(TEST_NIGHT_TEMP, TEST_NIGHT_BRIGHTNESS);

fn test_config() -> ScheduleConfig {
    ScheduleConfig {
        day_value: DAY,
        night_value: NIGHT,
        custom_day_start: 420,
        custom_night_start: 1200,
        transition_minutes: 20,
        ..ScheduleConfig::default()
    }
}

fn at(h: u32, m: u32) -> DateTime<FixedOffset> {
    FixedOffset::east_opt(0)
        .unwrap()
        .with_ymd_and_hms(2024, 3, 5, h, m, 0)
        .unwrap()
}

fn apply_of(value: ColorValue) -> SinkCall {
    SinkCall::Apply(value.temperature, value.brightness)
}

struct Harness {
    engine: ScheduleEngine,
    sink: RecordingSink,
    scheduler: ManualScheduler,
    clock: Arc<FixedTimeSource>,
    settings: SharedSettings,
    broadcaster: StateBroadcaster,
    events: mpsc::Receiver<ScheduleEvent>,
}

impl Harness {
    fn new(now: DateTime<FixedOffset>) -> Self {
        Self::with_output(now, None)
    }

    fn with_output(now: DateTime<FixedOffset>, output: Option<Box<dyn OutputSink>>) -> Self {
        let sink = RecordingSink::default();
        let scheduler = ManualScheduler::new();
        let clock = Arc::new(FixedTimeSource::new(now));
        let settings = SharedSettings::new(test_config());
        let broadcaster = StateBroadcaster::new();
        let events = broadcaster.subscribe();

        let engine = ScheduleEngine::new(EngineParams {
            settings: Arc::new(settings.clone()),
            output: output.unwrap_or_else(|| Box::new(sink.clone())),
            scheduler: Box::new(scheduler.clone()),
            time_source: clock.clone(),
            broadcaster: broadcaster.clone(),
        });

        Self {
            engine,
            sink,
            scheduler,
            clock,
            settings,
            broadcaster,
            events,
        }
    }

    fn started_disabled(now: DateTime<FixedOffset>) -> Self {
        let mut harness = Self::new(now);
        harness.settings.replace(ScheduleConfig {
            enabled: false,
            ..test_config()
        });
        harness.engine.start().unwrap();
        harness
    }

    fn started(now: DateTime<FixedOffset>) -> Self {
        let mut harness = Self::new(now);
        harness.engine.start().unwrap();
        harness
    }

    fn fire(&mut self, kind: TimerKind) {
        let token = self
            .scheduler
            .armed(kind)
            .unwrap_or_else(|| panic!("{kind:?} timer not armed"));
        assert!(self.engine.handle_message(EngineMessage::Timer(token)));
    }

    fn drain_events(&self) -> Vec<ScheduleEvent> {
        self.events.try_iter().collect()
    }
}

#[test]
fn test_start_evaluates_immediately_and_arms_tick() {
    let harness = Harness::started(at(12, 0));

    assert_eq!(harness.engine.run_state(), RunState::Running);
    assert_eq!(harness.sink.calls(), vec![apply_of(DAY)]);
    assert_eq!(harness.scheduler.armed_count(TimerKind::Schedule), 1);
    assert_eq!(
        harness.scheduler.interval(TimerKind::Schedule),
        Some(Duration::from_secs(test_config().update_interval_secs))
    );

    let state = harness.engine.last_state().unwrap();
    assert_eq!(state.phase, SchedulePhase::Day);
    assert_eq!(state.current, DAY);
    assert!(state.output_applied);
}

#[test]
fn test_start_twice_arms_one_timer() {
    let mut harness = Harness::started(at(12, 0));
    harness.engine.start().unwrap();

    assert_eq!(harness.scheduler.timers().arm_calls, 1);
    assert_eq!(harness.sink.calls().len(), 1);
}

#[test]
fn test_tick_follows_the_clock() {
    let mut harness = Harness::started(at(12, 0));

    harness.clock.set(at(19, 50));
    harness.fire(TimerKind::Schedule);

    let expected = DAY.blend(NIGHT, 0.5);
    assert_eq!(harness.sink.last(), Some(apply_of(expected)));
    assert_eq!(expected.temperature, 4900);

    let state = harness.engine.last_state().unwrap();
    assert_eq!(state.phase, SchedulePhase::TransitioningToNight);
    assert_eq!(state.progress, Some(0.5));
    assert_eq!(state.next_boundary, Some(at(20, 0)));
}

#[test]
fn test_phase_change_is_broadcast() {
    let mut harness = Harness::started(at(19, 39));
    harness.drain_events();

    harness.clock.set(at(19, 41));
    harness.fire(TimerKind::Schedule);

    let events = harness.drain_events();
    assert!(events.contains(&ScheduleEvent::phase_changed(
        SchedulePhase::Day,
        SchedulePhase::TransitioningToNight
    )));
    assert!(
        events
            .iter()
            .any(|e| matches!(e, ScheduleEvent::StateApplied { .. }))
    );
}

#[test]
fn test_stop_disarms_and_resets_output() {
    let mut harness = Harness::started(at(12, 0));
    let stale = harness.scheduler.armed(TimerKind::Schedule).unwrap();

    harness.engine.stop();

    assert_eq!(harness.engine.run_state(), RunState::Idle);
    assert_eq!(harness.scheduler.armed_count(TimerKind::Schedule), 0);
    assert_eq!(harness.sink.last(), Some(SinkCall::Reset));

    // A tick that was already queued must not re-assert a value
    harness.sink.clear();
    harness.engine.handle_message(EngineMessage::Timer(stale));
    assert!(harness.sink.calls().is_empty());
}

#[test]
fn test_stop_publishes_neutral_state() {
    let mut harness = Harness::started(at(19, 50));
    harness.engine.start_preview(ColorValue::new(2000, 50.0));

    harness.engine.stop();

    let latest = harness.broadcaster.latest().unwrap();
    assert_eq!(latest.current, ColorValue::neutral());
    assert_eq!(latest.active_override, OverrideKind::None);
    assert_eq!(latest.next_boundary, None);
    assert!(latest.output_applied);
    assert!(latest.enabled);
    assert_eq!(harness.engine.last_state(), Some(&latest));
}

#[test]
fn test_stop_reports_failed_reset() {
    let mut output = MockOutputSink::new();
    output.expect_name().return_const("Mock");
    output.expect_apply().returning(|_, _| Ok(()));
    output
        .expect_reset()
        .returning(|| Err(anyhow::anyhow!("display went away")));

    let mut harness = Harness::with_output(at(12, 0), Some(Box::new(output)));
    harness.engine.start().unwrap();
    harness.engine.stop();

    let latest = harness.broadcaster.latest().unwrap();
    assert_eq!(latest.current, ColorValue::neutral());
    assert!(!latest.output_applied);
}

#[test]
fn test_preview_scenario_restores_scheduled_value() {
    let mut harness = Harness::started(at(12, 0));
    let v1 = ColorValue::new(2000, 50.0);
    let v2 = ColorValue::new(2500, 60.0);

    harness.engine.start_preview(v1);
    assert_eq!(harness.sink.last(), Some(apply_of(v1)));

    harness.engine.update_preview(v2);
    assert_eq!(harness.sink.last(), Some(apply_of(v2)));

    harness.engine.stop_preview();
    assert_eq!(harness.sink.last(), Some(apply_of(DAY)));
    assert_eq!(*harness.engine.override_state(), OverrideState::None);
}

#[test]
fn test_tick_does_not_overwrite_preview() {
    let mut harness = Harness::started(at(12, 0));
    let preview = ColorValue::new(2000, 50.0);
    harness.engine.start_preview(preview);
    harness.sink.clear();

    harness.clock.set(at(22, 0));
    harness.fire(TimerKind::Schedule);

    assert!(harness.sink.calls().is_empty());
    assert_eq!(
        harness.engine.last_state().unwrap().active_override,
        OverrideKind::ManualPreview
    );
}

#[test]
fn test_update_preview_without_preview_is_ignored() {
    let mut harness = Harness::started(at(12, 0));
    harness.sink.clear();

    harness.engine.update_preview(ColorValue::new(2000, 50.0));
    harness.engine.stop_preview();

    assert!(harness.sink.calls().is_empty());
}

#[test]
fn test_start_demo_twice_is_a_no_op() {
    let mut harness = Harness::started(at(12, 0));

    harness.engine.start_demo(Duration::from_secs(2)).unwrap();
    let arm_calls = harness.scheduler.timers().arm_calls;
    harness.engine.start_demo(Duration::from_secs(2)).unwrap();

    assert_eq!(harness.scheduler.timers().arm_calls, arm_calls);
    assert_eq!(harness.scheduler.armed_count(TimerKind::Demo), 1);
    assert_eq!(
        harness.scheduler.interval(TimerKind::Demo),
        Some(Duration::from_millis(DEMO_FRAME_INTERVAL_MS))
    );
}

#[test]
fn test_stop_demo_before_first_frame_restores_schedule() {
    let mut harness = Harness::started(at(22, 0));

    harness.engine.start_demo(Duration::from_secs(2)).unwrap();
    harness.engine.stop_demo();

    assert_eq!(harness.sink.last(), Some(apply_of(NIGHT)));
    assert_eq!(harness.scheduler.armed_count(TimerKind::Demo), 0);
    assert_eq!(*harness.engine.override_state(), OverrideState::None);
}

#[test]
fn test_demo_plays_to_completion_then_restores_schedule() {
    let mut harness = Harness::started(at(12, 0));
    // 10 frames of 16 ms
    harness.engine.start_demo(Duration::from_millis(160)).unwrap();

    for _ in 0..5 {
        harness.fire(TimerKind::Demo);
    }
    // Halfway through the cycle the night value is showing
    assert_eq!(harness.sink.last(), Some(apply_of(NIGHT)));

    for _ in 0..5 {
        harness.fire(TimerKind::Demo);
    }

    assert_eq!(*harness.engine.override_state(), OverrideState::None);
    assert_eq!(harness.scheduler.armed_count(TimerKind::Demo), 0);
    assert_eq!(harness.sink.last(), Some(apply_of(DAY)));
}

#[test]
fn test_demo_replaces_preview_and_preview_replaces_demo() {
    let mut harness = Harness::started(at(12, 0));
    harness.engine.start_preview(ColorValue::new(2000, 50.0));
    harness.drain_events();

    harness.engine.start_demo(Duration::from_secs(1)).unwrap();
    assert!(matches!(
        harness.engine.override_state(),
        OverrideState::DemoPlayback(_)
    ));
    assert!(harness.drain_events().contains(&ScheduleEvent::override_changed(
        OverrideKind::ManualPreview,
        OverrideKind::DemoPlayback
    )));

    harness.engine.start_preview(ColorValue::new(3000, 70.0));
    assert_eq!(harness.scheduler.armed_count(TimerKind::Demo), 0);
    assert_eq!(
        harness.engine.last_state().unwrap().active_override,
        OverrideKind::ManualPreview
    );
}

#[test]
fn test_overrides_are_ignored_while_idle() {
    let mut harness = Harness::new(at(12, 0));

    harness.engine.start_preview(ColorValue::new(2000, 50.0));
    harness.engine.start_demo(Duration::from_secs(1)).unwrap();

    assert!(harness.sink.calls().is_empty());
    assert_eq!(*harness.engine.override_state(), OverrideState::None);
    assert_eq!(harness.scheduler.timers().arm_calls, 0);
}

#[test]
fn test_disabled_settings_reset_output_once() {
    let mut harness = Harness::started(at(12, 0));
    harness.sink.clear();

    harness.settings.replace(ScheduleConfig {
        enabled: false,
        ..test_config()
    });
    harness.engine.settings_changed().unwrap();

    assert_eq!(harness.sink.calls(), vec![SinkCall::Reset]);
    let state = harness.engine.last_state().unwrap();
    assert!(!state.enabled);
    assert_eq!(state.current, ColorValue::neutral());
    assert_eq!(state.next_boundary, None);

    // Later ticks keep publishing without resetting again
    harness.fire(TimerKind::Schedule);
    assert_eq!(harness.sink.calls(), vec![SinkCall::Reset]);

    harness.settings.replace(test_config());
    harness.engine.settings_changed().unwrap();
    assert_eq!(harness.sink.last(), Some(apply_of(DAY)));
}

#[test]
fn test_preview_release_while_disabled_resets_output() {
    let mut harness = Harness::started_disabled(at(12, 0));
    assert_eq!(harness.sink.calls(), vec![SinkCall::Reset]);

    let preview = ColorValue::new(2000, 50.0);
    harness.engine.start_preview(preview);
    assert_eq!(harness.sink.last(), Some(apply_of(preview)));
    harness.sink.clear();

    harness.engine.stop_preview();

    assert_eq!(harness.sink.calls(), vec![SinkCall::Reset]);
    let state = harness.engine.last_state().unwrap();
    assert!(!state.enabled);
    assert_eq!(state.current, ColorValue::neutral());
    assert!(state.output_applied);

    // Back at the baseline, ticks stay quiet again
    harness.fire(TimerKind::Schedule);
    assert_eq!(harness.sink.calls(), vec![SinkCall::Reset]);
}

#[test]
fn test_demo_completion_while_disabled_resets_output() {
    let mut harness = Harness::started_disabled(at(12, 0));
    harness.engine.start_demo(Duration::from_millis(160)).unwrap();

    for _ in 0..10 {
        harness.fire(TimerKind::Demo);
    }

    assert_eq!(*harness.engine.override_state(), OverrideState::None);
    assert_eq!(harness.sink.last(), Some(SinkCall::Reset));
    assert_eq!(
        harness.engine.last_state().unwrap().current,
        ColorValue::neutral()
    );
}

#[test]
fn test_settings_change_during_override_waits_for_release() {
    let mut harness = Harness::started(at(12, 0));
    harness.engine.start_preview(ColorValue::new(2000, 50.0));
    harness.sink.clear();

    let brighter_day = ColorValue::new(6000, 95.0);
    harness.settings.replace(ScheduleConfig {
        day_value: brighter_day,
        ..test_config()
    });
    harness.engine.settings_changed().unwrap();
    assert!(harness.sink.calls().is_empty());

    harness.engine.stop_preview();
    assert_eq!(harness.sink.last(), Some(apply_of(brighter_day)));
}

#[test]
fn test_interval_change_rearms_and_drops_stale_ticks() {
    let mut harness = Harness::started(at(12, 0));
    let old = harness.scheduler.armed(TimerKind::Schedule).unwrap();

    harness.settings.replace(ScheduleConfig {
        update_interval_secs: 60,
        ..test_config()
    });
    harness.engine.settings_changed().unwrap();

    let new = harness.scheduler.armed(TimerKind::Schedule).unwrap();
    assert_ne!(old, new);
    assert_eq!(
        harness.scheduler.interval(TimerKind::Schedule),
        Some(Duration::from_secs(60))
    );

    harness.sink.clear();
    harness.engine.handle_message(EngineMessage::Timer(old));
    assert!(harness.sink.calls().is_empty());
}

#[test]
fn test_redundant_settings_notifications_are_idempotent() {
    let mut harness = Harness::started(at(12, 0));
    harness.engine.settings_changed().unwrap();
    harness.engine.settings_changed().unwrap();

    assert_eq!(harness.scheduler.timers().arm_calls, 1);
    assert!(
        harness
            .sink
            .calls()
            .iter()
            .all(|call| *call == apply_of(DAY))
    );
}

#[test]
fn test_output_failure_is_reported_and_retried() {
    let mut output = MockOutputSink::new();
    output.expect_name().return_const("Mock");
    output
        .expect_apply()
        .times(2)
        .returning(|_, _| Err(anyhow::anyhow!("display denied the gamma change")));
    output.expect_reset().returning(|| Ok(()));

    let mut harness = Harness::with_output(at(12, 0), Some(Box::new(output)));
    harness.engine.start().unwrap();

    let state = harness.engine.last_state().unwrap();
    assert!(!state.output_applied);
    // The intended value is still published
    assert_eq!(state.current, DAY);

    harness.fire(TimerKind::Schedule);
    assert_eq!(harness.engine.run_state(), RunState::Running);
}

#[test]
fn test_toggle_demo_starts_and_stops_playback() {
    let mut harness = Harness::started(at(12, 0));

    assert!(harness.engine.handle_message(EngineMessage::ToggleDemo));
    assert!(matches!(
        harness.engine.override_state(),
        OverrideState::DemoPlayback(_)
    ));

    assert!(harness.engine.handle_message(EngineMessage::ToggleDemo));
    assert_eq!(*harness.engine.override_state(), OverrideState::None);
    assert_eq!(harness.sink.last(), Some(apply_of(DAY)));
}

#[test]
fn test_run_processes_messages_until_shutdown() {
    let harness = Harness::new(at(12, 0));
    let sink = harness.sink.clone();
    let (tx, rx) = mpsc::channel();

    tx.send(EngineMessage::StartPreview(ColorValue::new(2000, 50.0)))
        .unwrap();
    tx.send(EngineMessage::Shutdown).unwrap();
    tx.send(EngineMessage::StopPreview).unwrap();

    run(harness.engine, rx).unwrap();

    assert_eq!(
        sink.calls(),
        vec![
            apply_of(DAY),
            SinkCall::Apply(2000, 50.0),
            SinkCall::Reset
        ]
    );
}
