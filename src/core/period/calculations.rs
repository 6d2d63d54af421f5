//! Phase arcs on the day ring and classification of a minute into a phase.

use super::SchedulePhase;
use super::clock::{forward_distance, in_arc, normalize_f64, progress};

/// The four arcs of one schedule cycle, as minutes of day.
///
/// Going forward from `day_start` the boundaries always appear in the order
/// `day_start → night_transition_start → night_start → day_transition_start`,
/// so the arcs
///
/// - `[day_start, night_transition_start)` Day
/// - `[night_transition_start, night_start)` TransitioningToNight
/// - `[night_start, day_transition_start)` Night
/// - `[day_transition_start, day_start)` TransitioningToDay
///
/// partition the ring: their lengths sum to 1440 and none overlaps. That order
/// holds because the transition length is capped at the shorter of the day and
/// night spans.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduleArcs {
    pub day_start: f64,
    pub night_transition_start: f64,
    pub night_start: f64,
    pub day_transition_start: f64,
    /// Transition length actually used, after capping
    pub transition_minutes: f64,
}

/// Where a minute of day falls within the cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub phase: SchedulePhase,
    /// Linear progress through a transition arc, `None` for Day and Night
    pub progress: Option<f64>,
    /// Minute of day at which the current arc ends
    pub arc_end: f64,
}

impl ScheduleArcs {
    /// Build the arcs for a day start, night start and requested transition length.
    pub fn new(day_start: f64, night_start: f64, transition_minutes: f64) -> Self {
        let day_start = normalize_f64(day_start);
        let night_start = normalize_f64(night_start);

        let day_span = forward_distance(day_start, night_start);
        let night_span = forward_distance(night_start, day_start);
        let transition = transition_minutes.max(0.0).min(day_span).min(night_span);

        Self {
            day_start,
            night_transition_start: normalize_f64(night_start - transition),
            night_start,
            day_transition_start: normalize_f64(day_start - transition),
            transition_minutes: transition,
        }
    }

    /// Whether the requested transition had to be shortened to fit.
    pub fn transition_was_capped(&self, requested: f64) -> bool {
        self.transition_minutes < requested
    }

    /// Classify a minute of day. Precedence: Day, TransitioningToNight, Night,
    /// then TransitioningToDay for everything else.
    pub fn classify(&self, t: f64) -> Classification {
        let t = normalize_f64(t);

        if in_arc(t, self.day_start, self.night_transition_start) {
            Classification {
                phase: SchedulePhase::Day,
                progress: None,
                arc_end: self.night_transition_start,
            }
        } else if in_arc(t, self.night_transition_start, self.night_start) {
            Classification {
                phase: SchedulePhase::TransitioningToNight,
                progress: Some(progress(
                    t,
                    self.night_transition_start,
                    self.transition_minutes,
                )),
                arc_end: self.night_start,
            }
        } else if in_arc(t, self.night_start, self.day_transition_start) {
            Classification {
                phase: SchedulePhase::Night,
                progress: None,
                arc_end: self.day_transition_start,
            }
        } else {
            Classification {
                phase: SchedulePhase::TransitioningToDay,
                progress: Some(progress(
                    t,
                    self.day_transition_start,
                    self.transition_minutes,
                )),
                arc_end: self.day_start,
            }
        }
    }

    /// The four arcs as `(phase, from, to)`, in cycle order.
    pub fn arcs(&self) -> [(SchedulePhase, f64, f64); 4] {
        [
            (SchedulePhase::Day, self.day_start, self.night_transition_start),
            (
                SchedulePhase::TransitioningToNight,
                self.night_transition_start,
                self.night_start,
            ),
            (SchedulePhase::Night, self.night_start, self.day_transition_start),
            (
                SchedulePhase::TransitioningToDay,
                self.day_transition_start,
                self.day_start,
            ),
        ]
    }
}
