//! Structured logging system with visual formatting.
//!
//! Every line the scheduler prints goes through this module so that the output
//! keeps one consistent box-drawing layout: a block opens with `┣`, details hang
//! off a `┃` pipe, and semantic levels use a coloured `[LEVEL]` tag.
//!
//! The logger can be silenced at runtime (tests, one-shot commands that print
//! JSON), debug lines are only shown once `Log::set_debug(true)` was called,
//! and output can be redirected to a file on a background writer thread.

use std::io::Write;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Sender, channel};

static LOGGING_ENABLED: AtomicBool = AtomicBool::new(true);
static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);

// Channel for routing output to file when --log is active
static LOG_CHANNEL: Mutex<Option<Sender<LogMessage>>> = Mutex::new(None);

enum LogMessage {
    Formatted(String),
    Shutdown,
}

/// Visual style of a single log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    /// `┣ message`, part of an open block.
    Decorated,
    /// `┃   message`, nested detail.
    Indented,
    /// Lone `┃` spacer.
    Pipe,
    /// `┃` spacer followed by `┣ message`.
    BlockStart,
    /// `┏ nightshift vX.Y.Z ━━╸` header.
    Version,
    /// `╹` terminator.
    End,
    Info,
    Warning,
    Error,
    Critical,
    /// Only emitted when debug output is enabled.
    Debug,
}

/// Main logging interface.
///
/// ## Logging Conventions
///
/// - **`log_block_start!`** opens a new conceptual block (phase change, config
///   reload, override entered). Follow-up lines use `log_decorated!` or
///   `log_indented!`.
/// - **`log_decorated!`** continues a block or prints a single status line.
/// - **`log_indented!`** lists details belonging to the previous line.
/// - **`log_pipe!`** inserts vertical spacing, mainly before a semantic
///   `log_warning!`/`log_error!`/`log_info!`/`log_debug!` that starts its own block.
/// - **`log_version!`** / **`log_end!`** frame the whole run.
pub struct Log;

impl Log {
    /// Enable or disable logging temporarily.
    pub fn set_enabled(enabled: bool) {
        LOGGING_ENABLED.store(enabled, Ordering::SeqCst);
    }

    /// Check if logging is currently enabled.
    pub fn is_enabled() -> bool {
        LOGGING_ENABLED.load(Ordering::SeqCst)
    }

    /// Show or hide `log_debug!` output.
    pub fn set_debug(enabled: bool) {
        DEBUG_ENABLED.store(enabled, Ordering::SeqCst);
    }

    pub fn is_debug() -> bool {
        DEBUG_ENABLED.load(Ordering::SeqCst)
    }

    /// Whether a line of the given style would currently be written.
    pub fn accepts(style: Style) -> bool {
        Self::is_enabled() && (style != Style::Debug || Self::is_debug())
    }

    /// Start file logging to the specified path.
    ///
    /// Output is written by a dedicated thread until the returned guard is dropped.
    pub fn start_file_logging(file_path: String) -> anyhow::Result<LoggerGuard> {
        let (tx, rx) = channel();

        {
            let mut slot = LOG_CHANNEL
                .lock()
                .map_err(|_| anyhow::anyhow!("Logger channel lock poisoned"))?;
            if slot.is_some() {
                anyhow::bail!("File logging already active");
            }
            *slot = Some(tx.clone());
        }

        let handle = std::thread::spawn(move || {
            let mut file = std::fs::File::create(&file_path)?;

            loop {
                match rx.recv() {
                    Ok(LogMessage::Formatted(text)) => {
                        file.write_all(text.as_bytes())?;
                    }
                    Ok(LogMessage::Shutdown) | Err(_) => {
                        file.flush()?;
                        break;
                    }
                }
            }

            Ok::<(), anyhow::Error>(())
        });

        Ok(LoggerGuard {
            tx,
            handle: Some(handle),
        })
    }
}

/// Guard for file logging that ensures clean shutdown.
pub struct LoggerGuard {
    tx: Sender<LogMessage>,
    handle: Option<std::thread::JoinHandle<anyhow::Result<()>>>,
}

impl Drop for LoggerGuard {
    fn drop(&mut self) {
        if let Ok(mut slot) = LOG_CHANNEL.lock() {
            *slot = None;
        }
        let _ = self.tx.send(LogMessage::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Render one log line (including the trailing newline) for a style.
pub fn format_line(style: Style, message: &str) -> String {
    match style {
        Style::Decorated => format!("┣ {message}\n"),
        Style::Indented => format!("┃   {message}\n"),
        Style::Pipe => "┃\n".to_string(),
        Style::BlockStart => format!("┃\n┣ {message}\n"),
        Style::Version => format!("┏ {message} ━━╸\n"),
        Style::End => "╹\n".to_string(),
        Style::Info => format!("┣[\x1b[32mINFO\x1b[0m] {message}\n"),
        Style::Warning => format!("┣[\x1b[33mWARNING\x1b[0m] {message}\n"),
        Style::Error => format!("┣[\x1b[31mERROR\x1b[0m] {message}\n"),
        Style::Critical => format!("┣[\x1b[31mCRITICAL\x1b[0m] {message}\n"),
        Style::Debug => format!("┣[\x1b[32mDEBUG\x1b[0m] {message}\n"),
    }
}

/// Format and route a message if the style is currently accepted.
pub fn emit(style: Style, message: &str) {
    if Log::accepts(style) {
        write_output(&format_line(style, message));
    }
}

// Helper function to strip ANSI color codes from text
fn strip_ansi_codes(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\x1b' && chars.peek() == Some(&'[') {
            chars.next();
            // Skip until the terminating 'm'
            for ch in chars.by_ref() {
                if ch == 'm' {
                    break;
                }
            }
        } else {
            result.push(ch);
        }
    }

    result
}

/// Route formatted text to the log file if active, stdout otherwise.
pub fn write_output(text: &str) {
    let file_sender = LOG_CHANNEL.lock().ok().and_then(|slot| slot.clone());
    if let Some(tx) = file_sender {
        let clean_text = strip_ansi_codes(text);
        let stamped = format!("[{}] {clean_text}", chrono::Local::now().format("%H:%M:%S"));
        let _ = tx.send(LogMessage::Formatted(stamped));
    } else {
        print!("{text}");
        let _ = std::io::stdout().flush();
    }
}

// # Logging Macros

#[doc(hidden)]
#[macro_export]
macro_rules! __log_with_style {
    ($style:ident, $fmt:literal $($arg:tt)*) => {{
        use $crate::common::logger::{Log, Style};
        if Log::accepts(Style::$style) {
            $crate::common::logger::emit(Style::$style, &format!($fmt $($arg)*));
        }
    }};
    ($style:ident, $expr:expr) => {{
        use $crate::common::logger::{Log, Style};
        if Log::accepts(Style::$style) {
            let expr = $expr;
            $crate::common::logger::emit(Style::$style, &format!("{}", expr));
        }
    }};
}

/// Log a decorated message, typically as part of an existing block.
#[macro_export]
macro_rules! log_decorated {
    ($($arg:tt)+) => { $crate::__log_with_style!(Decorated, $($arg)+) };
}

/// Log an indented message for sub-items or details within a block.
#[macro_export]
macro_rules! log_indented {
    ($($arg:tt)+) => { $crate::__log_with_style!(Indented, $($arg)+) };
}

/// Log a visual pipe separator for vertical spacing.
#[macro_export]
macro_rules! log_pipe {
    () => { $crate::common::logger::emit($crate::common::logger::Style::Pipe, "") };
}

/// Log a block start message, initiating a new conceptual block of information.
#[macro_export]
macro_rules! log_block_start {
    ($($arg:tt)+) => { $crate::__log_with_style!(BlockStart, $($arg)+) };
}

/// Log the application version header.
#[macro_export]
macro_rules! log_version {
    () => {
        $crate::common::logger::emit(
            $crate::common::logger::Style::Version,
            concat!("nightshift v", env!("CARGO_PKG_VERSION")),
        )
    };
}

/// Log the final termination marker.
#[macro_export]
macro_rules! log_end {
    () => { $crate::common::logger::emit($crate::common::logger::Style::End, "") };
}

/// Log an informational message.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)+) => { $crate::__log_with_style!(Info, $($arg)+) };
}

/// Log a warning message with yellow-colored tag.
#[macro_export]
macro_rules! log_warning {
    ($($arg:tt)+) => { $crate::__log_with_style!(Warning, $($arg)+) };
}

/// Log an error message with red-colored tag.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)+) => { $crate::__log_with_style!(Error, $($arg)+) };
}

/// Log a critical message with red-colored tag.
#[macro_export]
macro_rules! log_critical {
    ($($arg:tt)+) => { $crate::__log_with_style!(Critical, $($arg)+) };
}

/// Log a debug message; hidden unless debug output is enabled.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)+) => { $crate::__log_with_style!(Debug, $($arg)+) };
}
