//! Fan-out of schedule events to any number of subscribers.
//!
//! Each subscriber gets its own channel. A subscriber that drops its receiver
//! is pruned on the next publish. The latest published state is kept so that
//! late subscribers and one-shot queries can read it without waiting.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard};

use super::{ScheduleEvent, ScheduleState};

#[derive(Default)]
struct Subscribers {
    senders: Vec<Sender<ScheduleEvent>>,
    latest: Option<ScheduleState>,
}

/// Cloneable handle; all clones share the same subscriber list.
#[derive(Clone, Default)]
pub struct StateBroadcaster {
    inner: Arc<Mutex<Subscribers>>,
}

impl StateBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Subscribers> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a new observer.
    pub fn subscribe(&self) -> Receiver<ScheduleEvent> {
        let (tx, rx) = mpsc::channel();
        self.lock().senders.push(tx);
        rx
    }

    /// Deliver `event` to every live subscriber.
    pub fn publish(&self, event: ScheduleEvent) {
        let mut subscribers = self.lock();

        if let ScheduleEvent::StateApplied { ref state } = event {
            subscribers.latest = Some(state.clone());
        }

        let before = subscribers.senders.len();
        subscribers
            .senders
            .retain(|sender| sender.send(event.clone()).is_ok());

        let pruned = before - subscribers.senders.len();
        if pruned > 0 {
            log_debug!(
                "Dropped {} disconnected subscriber(s), {} remaining",
                pruned,
                subscribers.senders.len()
            );
        }
    }

    /// Most recently published state, if any.
    pub fn latest(&self) -> Option<ScheduleState> {
        self.lock().latest.clone()
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().senders.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::period::SchedulePhase;

    #[test]
    fn test_every_subscriber_receives_events() {
        let broadcaster = StateBroadcaster::new();
        let first = broadcaster.subscribe();
        let second = broadcaster.subscribe();

        broadcaster.publish(ScheduleEvent::phase_changed(
            SchedulePhase::Night,
            SchedulePhase::TransitioningToDay,
        ));

        assert!(matches!(first.try_recv(), Ok(ScheduleEvent::PhaseChanged { .. })));
        assert!(matches!(second.try_recv(), Ok(ScheduleEvent::PhaseChanged { .. })));
    }

    #[test]
    fn test_dropped_subscribers_are_pruned() {
        let broadcaster = StateBroadcaster::new();
        let kept = broadcaster.subscribe();
        drop(broadcaster.subscribe());
        assert_eq!(broadcaster.subscriber_count(), 2);

        broadcaster.publish(ScheduleEvent::phase_changed(
            SchedulePhase::Day,
            SchedulePhase::TransitioningToNight,
        ));

        assert_eq!(broadcaster.subscriber_count(), 1);
        assert!(kept.try_recv().is_ok());
    }

    #[test]
    fn test_clones_share_subscribers() {
        let broadcaster = StateBroadcaster::new();
        let handle = broadcaster.clone();
        let rx = handle.subscribe();

        broadcaster.publish(ScheduleEvent::phase_changed(
            SchedulePhase::Day,
            SchedulePhase::TransitioningToNight,
        ));
        assert!(rx.try_recv().is_ok());
        assert!(handle.latest().is_none());
    }
}
