//! # nightshift library
//!
//! Internal library for the nightshift binary: a day/night display color
//! schedule that maps wall-clock time and location to a color temperature
//! and brightness, blending smoothly between a day and a night value.
//!
//! This library exists to enable testing of the schedule internals and to
//! keep CLI dispatch (main.rs) separate from application logic.
//!
//! ## Architecture
//!
//! - **Core**: `core` holds the `ScheduleEngine` message loop, timers, demo
//!   playback, and the phase resolver (`core::period`)
//! - **Geographic**: `geo::solar` computes sunrise, sunset and solar noon
//! - **Configuration**: `config` for TOML settings, validation and hot reload
//! - **Backends**: `backend` output sinks that realise color values
//! - **State**: `state` published snapshots, events and the broadcaster
//! - **Commands**: `commands` for CLI subcommands (status, demo)
//! - **Infrastructure**: signal handling, time sources, logging, utilities

// Import macros from logger module for use in all submodules
#[macro_use]
pub mod common;

pub mod args;
pub mod backend;
pub mod commands;
pub mod config;
pub mod core;
pub mod geo;
pub mod io;
pub mod state;
pub mod time;

mod nightshift;

// Re-export for binary
pub use nightshift::Nightshift;
