//! Typed events delivered to state subscribers.

use serde::{Deserialize, Serialize};

use super::{OverrideKind, ScheduleState};
use crate::core::period::SchedulePhase;

/// Everything a subscriber can be told about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum ScheduleEvent {
    /// A new state snapshot was published, whether or not the output accepted it.
    StateApplied {
        #[serde(flatten)]
        state: ScheduleState,
    },

    /// The scheduled phase moved on. Only emitted for schedule evaluations,
    /// never for demo playback.
    PhaseChanged {
        from_phase: SchedulePhase,
        to_phase: SchedulePhase,
    },

    /// An override was entered, replaced or released.
    OverrideChanged {
        from_override: OverrideKind,
        to_override: OverrideKind,
    },
}

impl ScheduleEvent {
    pub fn state_applied(state: ScheduleState) -> Self {
        ScheduleEvent::StateApplied { state }
    }

    pub fn phase_changed(from: SchedulePhase, to: SchedulePhase) -> Self {
        ScheduleEvent::PhaseChanged {
            from_phase: from,
            to_phase: to,
        }
    }

    pub fn override_changed(from: OverrideKind, to: OverrideKind) -> Self {
        ScheduleEvent::OverrideChanged {
            from_override: from,
            to_override: to,
        }
    }
}
