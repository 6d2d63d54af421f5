//! Arithmetic on the 1440-minute day ring.
//!
//! Every schedule boundary is a minute of the local day, so membership and
//! progress checks have to wrap through midnight uniformly: a sunrise
//! transition that starts at 23:50 and ends at 00:10 is one contiguous arc.
//! Minutes are `f64` so that seconds carry through; the integer `normalize`
//! exists for whole-minute settings.

use chrono::{DateTime, TimeZone, Timelike};

use crate::common::constants::MINUTES_PER_DAY;

const RING: f64 = MINUTES_PER_DAY as f64;

/// Wrap a whole-minute value onto `[0, 1440)`.
pub fn normalize(minutes: i64) -> i64 {
    minutes.rem_euclid(MINUTES_PER_DAY)
}

/// Wrap a fractional minute value onto `[0, 1440)`.
pub fn normalize_f64(minutes: f64) -> f64 {
    let wrapped = minutes.rem_euclid(RING);
    // rem_euclid can round up to the modulus for tiny negative inputs
    if wrapped >= RING { 0.0 } else { wrapped }
}

/// Whether `t` lies in the half-open arc `[from, to)` going forward around the ring.
///
/// `from > to` means the arc wraps through midnight. `from == to` is the empty arc.
pub fn in_arc(t: f64, from: f64, to: f64) -> bool {
    if from <= to {
        t >= from && t < to
    } else {
        t >= from || t < to
    }
}

/// Fraction of the arc `[from, from + length)` elapsed at `t`, clamped to 1.
pub fn progress(t: f64, from: f64, length: f64) -> f64 {
    (normalize_f64(t - from) / length.max(1.0)).min(1.0)
}

/// Forward distance in minutes from `from` to `to` around the ring.
pub fn forward_distance(from: f64, to: f64) -> f64 {
    normalize_f64(to - from)
}

/// Minutes since local midnight, with sub-minute precision.
pub fn minute_of_day<Tz: TimeZone>(instant: &DateTime<Tz>) -> f64 {
    let seconds = instant.num_seconds_from_midnight() as f64
        + instant.nanosecond().min(999_999_999) as f64 / 1e9;
    seconds / 60.0
}
