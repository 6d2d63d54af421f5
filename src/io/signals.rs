//! Unix signal handling.
//!
//! Signals are turned into engine messages on a dedicated thread:
//!
//! - **SIGINT / SIGTERM**: shut down, restoring the output to neutral
//! - **SIGHUP**: reload the configuration file, then re-evaluate
//! - **SIGUSR1**: start or stop demo playback

use anyhow::{Context, Result};
use signal_hook::{
    consts::signal::{SIGHUP, SIGINT, SIGTERM, SIGUSR1},
    iterator::{Handle, Signals},
};
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};

use crate::config::{SharedSettings, reload_into};
use crate::core::EngineMessage;

/// What a received signal asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalAction {
    Shutdown,
    Reload,
    ToggleDemo,
}

/// Map a signal number to its action.
pub fn action_for(signal: i32) -> Option<SignalAction> {
    match signal {
        SIGINT | SIGTERM => Some(SignalAction::Shutdown),
        SIGHUP => Some(SignalAction::Reload),
        SIGUSR1 => Some(SignalAction::ToggleDemo),
        _ => None,
    }
}

/// Running signal thread. Dropping it leaves the thread running; call
/// [`SignalHandler::close`] to stop listening.
pub struct SignalHandler {
    handle: Handle,
    thread: JoinHandle<()>,
}

impl SignalHandler {
    /// Stop listening for signals and wait for the thread to exit.
    pub fn close(self) {
        self.handle.close();
        if self.thread.join().is_err() {
            log_warning!("Signal handler thread panicked");
        }
    }
}

/// Register handlers and forward signals to the engine.
///
/// SIGHUP reloads `config_path` into `settings` before notifying the engine;
/// an invalid file is logged and the current settings are kept.
pub fn setup_signal_handler(
    engine_sender: Sender<EngineMessage>,
    config_path: PathBuf,
    settings: SharedSettings,
) -> Result<SignalHandler> {
    let mut signals = Signals::new([SIGINT, SIGTERM, SIGHUP, SIGUSR1])
        .context("failed to register signal handlers")?;
    let handle = signals.handle();

    let thread = thread::Builder::new()
        .name("signals".into())
        .spawn(move || {
            for signal in signals.forever() {
                let Some(action) = action_for(signal) else {
                    continue;
                };

                let message = match action {
                    SignalAction::Shutdown => {
                        log_pipe!();
                        log_info!("Received shutdown signal");
                        Some(EngineMessage::Shutdown)
                    }
                    SignalAction::Reload => {
                        log_pipe!();
                        log_info!("Received reload signal");
                        match reload_into(&config_path, &settings) {
                            Ok(_) => Some(EngineMessage::SettingsChanged),
                            Err(e) => {
                                log_error!("Failed to reload config: {:#}", e);
                                log_indented!("Continuing with previous configuration");
                                None
                            }
                        }
                    }
                    SignalAction::ToggleDemo => Some(EngineMessage::ToggleDemo),
                };

                if let Some(message) = message
                    && engine_sender.send(message).is_err()
                {
                    break;
                }
            }
        })
        .context("Failed to spawn signal handler thread")?;

    Ok(SignalHandler { handle, thread })
}
