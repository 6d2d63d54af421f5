//! Command-line command handlers for nightshift.
//!
//! One-shot commands live here, each in its own submodule. The long-running
//! `run` command is the [`crate::Nightshift`] coordinator itself.

pub mod demo;
pub mod status;
