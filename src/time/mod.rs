//! Time handling: the clock the scheduler reads "now" from.

pub mod source;
