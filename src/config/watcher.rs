//! Hot reloading of the configuration file.
//!
//! Watches the directory containing `nightshift.toml` (editors often replace
//! the file rather than write it in place), waits for changes to settle,
//! reloads and validates the file, swaps the shared snapshot and tells the
//! engine with `EngineMessage::SettingsChanged`. An invalid edit is logged and
//! the previous snapshot stays active.

use anyhow::{Context, Result};
use notify::{
    Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher,
};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use super::{SharedSettings, reload_into};
use crate::common::constants::CONFIG_RELOAD_DEBOUNCE_MS;
use crate::common::utils::private_path;
use crate::core::EngineMessage;

/// Configuration file watcher that reloads settings and notifies the engine.
pub struct ConfigWatcher {
    config_path: PathBuf,
    settings: SharedSettings,
    engine_sender: Sender<EngineMessage>,
}

impl ConfigWatcher {
    pub fn new(
        config_path: PathBuf,
        settings: SharedSettings,
        engine_sender: Sender<EngineMessage>,
    ) -> Self {
        Self {
            config_path,
            settings,
            engine_sender,
        }
    }

    /// Start watching on a background thread.
    ///
    /// The thread exits once the engine channel is closed.
    pub fn start(self) -> Result<()> {
        let watch_dir = self
            .config_path
            .parent()
            .map(Path::to_path_buf)
            .context("Config path has no parent directory")?;

        let (tx, rx) = mpsc::channel();

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| {
                if let Ok(event) = res {
                    match event.kind {
                        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => {
                            let _ = tx.send(event);
                        }
                        _ => {}
                    }
                }
            },
            NotifyConfig::default(),
        )
        .context("Failed to create file watcher")?;

        watcher
            .watch(&watch_dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch directory: {}", private_path(&watch_dir)))?;

        log_debug!(
            "Watching {} for configuration changes",
            private_path(&self.config_path)
        );

        thread::Builder::new()
            .name("config-watcher".into())
            .spawn(move || {
                // The watcher must live as long as the thread
                let _watcher = watcher;
                self.run(rx);
            })
            .context("Failed to spawn config watcher thread")?;

        Ok(())
    }

    fn run(self, rx: Receiver<Event>) {
        let debounce = Duration::from_millis(CONFIG_RELOAD_DEBOUNCE_MS);

        while let Ok(event) = rx.recv() {
            if !affects_file(&event, &self.config_path) {
                continue;
            }

            // Wait until writes have been quiet for the debounce period
            loop {
                match rx.recv_timeout(debounce) {
                    Ok(_) => continue,
                    Err(RecvTimeoutError::Timeout) => break,
                    Err(RecvTimeoutError::Disconnected) => return,
                }
            }

            if !self.reload() {
                break;
            }
        }

        log_debug!("Config watcher thread exiting");
    }

    /// Returns false once the engine is gone.
    fn reload(&self) -> bool {
        log_pipe!();
        log_info!("Configuration file change detected");

        if !self.config_path.exists() {
            log_warning!("Configuration file was removed, keeping current settings");
            return true;
        }

        match reload_into(&self.config_path, &self.settings) {
            Ok(_) => {
                log_indented!("Reloaded configuration");
                self.engine_sender
                    .send(EngineMessage::SettingsChanged)
                    .is_ok()
            }
            Err(e) => {
                log_error!("Keeping previous settings: {:#}", e);
                true
            }
        }
    }
}

/// Whether a filesystem event touches `path`.
fn affects_file(event: &Event, path: &Path) -> bool {
    let Some(name) = path.file_name() else {
        return false;
    };
    event
        .paths
        .iter()
        .any(|p| p == path || p.file_name() == Some(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, ModifyKind};

    #[test]
    fn test_event_filter_matches_config_file_only() {
        let config = PathBuf::from("/tmp/nightshift/nightshift.toml");

        let write = Event::new(EventKind::Modify(ModifyKind::Any))
            .add_path(PathBuf::from("/tmp/nightshift/nightshift.toml"));
        assert!(affects_file(&write, &config));

        let other = Event::new(EventKind::Create(CreateKind::File))
            .add_path(PathBuf::from("/tmp/nightshift/.nightshift.toml.swp"));
        assert!(!affects_file(&other, &config));
    }
}
