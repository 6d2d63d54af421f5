//! Output backends that realise color values on the display.
//!
//! The schedule engine only talks to an [`OutputSink`]. How a temperature and
//! brightness actually reach the screen is up to the backend:
//!
//! - **Log backend** (default): records every applied value through the
//!   logger; useful for dry runs and for driving other tools from logs
//! - **Command backend**: runs a user-configured shell command for every
//!   value, with `{temperature}` and `{brightness}` placeholders
//!
//! Failures are reported as errors; the engine logs them and carries on.

use anyhow::Result;

use crate::config::{Backend, Config};

pub mod command;
pub mod log;

pub use command::CommandBackend;
pub use log::LogBackend;

/// A device that can display a color temperature and brightness.
#[cfg_attr(test, mockall::automock)]
pub trait OutputSink: Send {
    /// Apply a color temperature (Kelvin) and brightness (percent).
    fn apply(&mut self, temperature: u32, brightness: f32) -> Result<()>;

    /// Return the output to its neutral, unshifted state.
    fn reset(&mut self) -> Result<()>;

    /// Human-readable backend name for logging.
    fn name(&self) -> &'static str;
}

/// Create the output backend selected in `config`.
pub fn create_backend(config: &Config) -> Result<Box<dyn OutputSink>> {
    match config.backend() {
        Backend::Log => Ok(Box::new(LogBackend::new())),
        Backend::Command => {
            let Some(apply_command) = config.apply_command.clone() else {
                anyhow::bail!("backend = \"command\" requires apply_command to be set");
            };
            Ok(Box::new(CommandBackend::new(
                apply_command,
                config.reset_command.clone(),
            )))
        }
    }
}
