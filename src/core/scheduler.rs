//! Cancellable periodic timers for the engine.
//!
//! A timer never calls into the engine directly. Each firing is posted to the
//! engine's channel as `EngineMessage::Timer(token)`, so every callback is
//! serialized with external events on the engine thread. Disarming a
//! [`ThreadScheduler`] timer wakes its thread and joins it, so no new firing
//! can be produced afterwards; firings already queued carry a token the
//! engine no longer holds and are dropped there.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::EngineMessage;

/// Which of the engine's timers a token belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Periodic schedule evaluation
    Schedule,
    /// Demo playback frames
    Demo,
}

/// Identifies one arming of a timer. Re-arming always yields a new token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken {
    pub kind: TimerKind,
    pub generation: u64,
}

/// Source of periodic engine ticks.
pub trait Scheduler: Send {
    /// Start a periodic timer firing every `interval`.
    fn arm(&mut self, kind: TimerKind, interval: Duration) -> Result<TimerToken>;

    /// Stop a timer. Unknown or already disarmed tokens are ignored.
    fn disarm(&mut self, token: TimerToken);
}

struct TimerThread {
    cancel: Sender<()>,
    handle: JoinHandle<()>,
}

/// Scheduler backed by one sleeping thread per armed timer.
pub struct ThreadScheduler {
    engine_sender: Sender<EngineMessage>,
    next_generation: u64,
    timers: HashMap<TimerToken, TimerThread>,
}

impl ThreadScheduler {
    pub fn new(engine_sender: Sender<EngineMessage>) -> Self {
        Self {
            engine_sender,
            next_generation: 0,
            timers: HashMap::new(),
        }
    }
}

impl Scheduler for ThreadScheduler {
    fn arm(&mut self, kind: TimerKind, interval: Duration) -> Result<TimerToken> {
        self.next_generation += 1;
        let token = TimerToken {
            kind,
            generation: self.next_generation,
        };

        let (cancel_tx, cancel_rx) = mpsc::channel::<()>();
        let sender = self.engine_sender.clone();

        let handle = thread::Builder::new()
            .name(format!("timer-{kind:?}-{}", token.generation).to_lowercase())
            .spawn(move || {
                loop {
                    match cancel_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {
                            if sender.send(EngineMessage::Timer(token)).is_err() {
                                break;
                            }
                        }
                        // Cancelled, or the scheduler went away
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            })
            .context("Failed to spawn timer thread")?;

        self.timers.insert(
            token,
            TimerThread {
                cancel: cancel_tx,
                handle,
            },
        );
        Ok(token)
    }

    fn disarm(&mut self, token: TimerToken) {
        if let Some(timer) = self.timers.remove(&token) {
            let _ = timer.cancel.send(());
            if timer.handle.join().is_err() {
                log_warning!("Timer thread for {:?} panicked", token.kind);
            }
        }
    }
}

impl Drop for ThreadScheduler {
    fn drop(&mut self) {
        let tokens: Vec<TimerToken> = self.timers.keys().copied().collect();
        for token in tokens {
            self.disarm(token);
        }
    }
}

#[cfg(any(test, feature = "testing-support"))]
pub use manual::{ManualScheduler, ManualTimers};

#[cfg(any(test, feature = "testing-support"))]
mod manual {
    use super::*;
    use std::sync::{Arc, Mutex, MutexGuard};

    /// Record of what a [`ManualScheduler`] has been asked to do.
    #[derive(Debug, Default)]
    pub struct ManualTimers {
        pub armed: Vec<(TimerToken, Duration)>,
        pub arm_calls: usize,
        pub disarm_calls: usize,
        next_generation: u64,
    }

    /// Scheduler that never fires on its own. Tests inspect which timers are
    /// armed and deliver `EngineMessage::Timer` themselves.
    #[derive(Clone, Default)]
    pub struct ManualScheduler {
        timers: Arc<Mutex<ManualTimers>>,
    }

    impl ManualScheduler {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn timers(&self) -> MutexGuard<'_, ManualTimers> {
            self.timers
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
        }

        /// The currently armed token of `kind`, if any.
        pub fn armed(&self, kind: TimerKind) -> Option<TimerToken> {
            self.timers()
                .armed
                .iter()
                .find(|(token, _)| token.kind == kind)
                .map(|(token, _)| *token)
        }

        pub fn armed_count(&self, kind: TimerKind) -> usize {
            self.timers()
                .armed
                .iter()
                .filter(|(token, _)| token.kind == kind)
                .count()
        }

        pub fn interval(&self, kind: TimerKind) -> Option<Duration> {
            self.timers()
                .armed
                .iter()
                .find(|(token, _)| token.kind == kind)
                .map(|(_, interval)| *interval)
        }
    }

    impl Scheduler for ManualScheduler {
        fn arm(&mut self, kind: TimerKind, interval: Duration) -> Result<TimerToken> {
            let mut timers = self.timers();
            timers.next_generation += 1;
            timers.arm_calls += 1;
            let token = TimerToken {
                kind,
                generation: timers.next_generation,
            };
            timers.armed.push((token, interval));
            Ok(token)
        }

        fn disarm(&mut self, token: TimerToken) {
            let mut timers = self.timers();
            timers.disarm_calls += 1;
            timers.armed.retain(|(armed, _)| *armed != token);
        }
    }
}
