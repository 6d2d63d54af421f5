//! Command-line argument parsing and processing.
//!
//! This module handles parsing of command-line arguments and provides a clean
//! interface for the main application logic. Subcommands (`run`, `status`,
//! `demo`) may appear anywhere among the flags; the first non-flag argument
//! names the command and `run` is implied when none is given.

/// Options shared by every command.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommonOptions {
    pub debug_enabled: bool,
    /// Explicit configuration file (`--config <path>`)
    pub config_path: Option<String>,
    /// Write log output to this file instead of stdout (`--log <file>`)
    pub log_file: Option<String>,
}

/// Represents the parsed command-line arguments and their intended actions.
#[derive(Debug, PartialEq)]
pub enum CliAction {
    /// Run the schedule until shut down
    Run(CommonOptions),
    /// Resolve the schedule once and print it
    Status {
        options: CommonOptions,
        json: bool,
        /// Resolve at this local time instead of now ("YYYY-MM-DD HH:MM:SS")
        at: Option<String>,
    },
    /// Play one demo cycle against the configured backend and exit
    Demo {
        options: CommonOptions,
        /// Playback length; the configured `demo_duration` when absent
        duration_secs: Option<u64>,
    },

    /// Display help information and exit
    ShowHelp,
    /// Display version information and exit
    ShowVersion,
    /// Show help due to unknown or malformed arguments and exit
    ShowHelpDueToError,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Command {
    Run,
    Status,
    Demo,
}

impl Command {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "run" => Some(Command::Run),
            "status" | "s" => Some(Command::Status),
            "demo" | "d" => Some(Command::Demo),
            _ => None,
        }
    }
}

/// Result of parsing command-line arguments.
pub struct ParsedArgs {
    pub action: CliAction,
}

impl ParsedArgs {
    /// Parse command-line arguments into a structured result.
    ///
    /// The first element is the program name and is skipped. Version takes
    /// precedence over help, and help over everything else. Any unknown or
    /// incomplete argument yields [`CliAction::ShowHelpDueToError`].
    pub fn parse<I, S>(args: I) -> ParsedArgs
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args_vec: Vec<String> = args
            .into_iter()
            .skip(1)
            .map(|s| s.as_ref().to_string())
            .collect();

        let mut options = CommonOptions::default();
        let mut display_help = false;
        let mut display_version = false;
        let mut unknown_arg_found = false;
        let mut json = false;
        let mut at: Option<String> = None;
        let mut command: Option<Command> = None;
        let mut positionals: Vec<String> = Vec::new();

        // Flags that consume the following argument
        let take_value = |i: &mut usize, flag: &str, usage: &str| -> Option<String> {
            match args_vec.get(*i + 1) {
                Some(value) if !value.starts_with('-') => {
                    *i += 1;
                    Some(value.clone())
                }
                _ => {
                    log_warning!("Missing value for {}. Usage: {}", flag, usage);
                    None
                }
            }
        };

        let mut i = 0;
        while i < args_vec.len() {
            let arg = args_vec[i].as_str();
            match arg {
                "--help" | "-h" => display_help = true,
                "--version" | "-V" | "-v" => display_version = true,
                "--debug" | "-d" => options.debug_enabled = true,
                "--json" | "-j" => json = true,
                "--config" | "-c" => {
                    match take_value(&mut i, "--config", "--config <path>") {
                        Some(path) => options.config_path = Some(path),
                        None => unknown_arg_found = true,
                    }
                }
                "--log" | "-l" => match take_value(&mut i, "--log", "--log <file>") {
                    Some(path) => options.log_file = Some(path),
                    None => unknown_arg_found = true,
                },
                "--at" => match take_value(&mut i, "--at", "--at \"YYYY-MM-DD HH:MM:SS\"") {
                    Some(datetime) => at = Some(datetime),
                    None => unknown_arg_found = true,
                },
                _ if arg.starts_with('-') => {
                    log_warning!("Unknown option: {}", arg);
                    unknown_arg_found = true;
                }
                _ => {
                    if command.is_none() {
                        match Command::from_name(arg) {
                            Some(cmd) => command = Some(cmd),
                            None => {
                                log_warning!("Unknown command: {}", arg);
                                unknown_arg_found = true;
                            }
                        }
                    } else {
                        positionals.push(arg.to_string());
                    }
                }
            }
            i += 1;
        }

        if display_version {
            return ParsedArgs {
                action: CliAction::ShowVersion,
            };
        }
        if display_help {
            return ParsedArgs {
                action: CliAction::ShowHelp,
            };
        }
        if unknown_arg_found {
            return ParsedArgs {
                action: CliAction::ShowHelpDueToError,
            };
        }

        let command = command.unwrap_or(Command::Run);

        if command != Command::Status && (json || at.is_some()) {
            log_warning!("--json and --at are only valid with the status command");
            return ParsedArgs {
                action: CliAction::ShowHelpDueToError,
            };
        }

        let action = match command {
            Command::Run => {
                if let Some(extra) = positionals.first() {
                    log_warning!("Unexpected argument: {}", extra);
                    CliAction::ShowHelpDueToError
                } else {
                    CliAction::Run(options)
                }
            }
            Command::Status => {
                if let Some(extra) = positionals.first() {
                    log_warning!("Unexpected argument: {}", extra);
                    CliAction::ShowHelpDueToError
                } else {
                    CliAction::Status { options, json, at }
                }
            }
            Command::Demo => match positionals.as_slice() {
                [] => CliAction::Demo {
                    options,
                    duration_secs: None,
                },
                [seconds] => match seconds.parse::<u64>() {
                    Ok(secs) if secs > 0 => CliAction::Demo {
                        options,
                        duration_secs: Some(secs),
                    },
                    _ => {
                        log_warning!(
                            "Invalid demo duration: {}. Usage: nightshift demo [seconds]",
                            seconds
                        );
                        CliAction::ShowHelpDueToError
                    }
                },
                [_, extra, ..] => {
                    log_warning!("Unexpected argument: {}", extra);
                    CliAction::ShowHelpDueToError
                }
            },
        };

        ParsedArgs { action }
    }

    /// Convenience method to parse from std::env::args()
    pub fn from_env() -> ParsedArgs {
        Self::parse(std::env::args())
    }
}

/// Displays version information using custom logging style.
pub fn display_version_info() {
    log_version!();
    log_pipe!();
    println!("┗ {}", env!("CARGO_PKG_DESCRIPTION"));
}

/// Displays custom help message using logger methods.
pub fn display_help() {
    log_version!();
    log_block_start!(env!("CARGO_PKG_DESCRIPTION"));
    log_block_start!("Usage:");
    log_indented!("nightshift [OPTIONS] [COMMAND]");
    log_block_start!("Options:");
    log_indented!("-c, --config <path>    Use a specific configuration file");
    log_indented!("-d, --debug            Enable detailed debug output");
    log_indented!("-l, --log <file>       Write log output to <file> instead of stdout");
    log_indented!("-h, --help             Print help information");
    log_indented!("-V, --version          Print version information");
    log_block_start!("Commands:");
    log_indented!("run                    Follow the schedule until stopped (default)");
    log_indented!("status, s [--json] [--at \"YYYY-MM-DD HH:MM:SS\"]");
    log_indented!("                       Print the resolved schedule state once");
    log_indented!("demo, d [seconds]      Play a compressed day/night cycle and exit");
    log_block_start!("Signals:");
    log_indented!("SIGHUP                 Reload the configuration file");
    log_indented!("SIGUSR1                Start or stop demo playback");
    log_end!();
}
