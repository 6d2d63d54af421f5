//! Main application entry point.
//!
//! Parses the command line, applies the process-wide options (debug output,
//! log file, config path) and dispatches to the chosen command:
//!
//! - `run` (default): follow the schedule until SIGINT/SIGTERM
//! - `status`: resolve the schedule once and print it
//! - `demo`: play one compressed day/night cycle and exit

use anyhow::Result;
use std::path::PathBuf;

use nightshift::Nightshift;
use nightshift::args::{self, CliAction, CommonOptions, ParsedArgs};
use nightshift::commands;
use nightshift::common::constants::EXIT_FAILURE;
use nightshift::common::logger::{Log, LoggerGuard};
use nightshift::config;
use nightshift::{log_critical, log_end};

fn main() -> Result<()> {
    let parsed_args = ParsedArgs::from_env();

    match parsed_args.action {
        CliAction::ShowVersion => {
            args::display_version_info();
            Ok(())
        }
        CliAction::ShowHelp => {
            args::display_help();
            Ok(())
        }
        CliAction::ShowHelpDueToError => {
            args::display_help();
            std::process::exit(EXIT_FAILURE);
        }
        CliAction::Run(options) => {
            let _log_guard = apply_common_options(&options)?;
            report_failure(Nightshift::new(options.debug_enabled).run())
        }
        CliAction::Status { options, json, at } => {
            // Keep stdout clean for machine-readable output
            if json {
                Log::set_enabled(false);
            }
            let _log_guard = apply_common_options(&options)?;
            report_failure(commands::status::handle_status_command(json, at.as_deref()))
        }
        CliAction::Demo {
            options,
            duration_secs,
        } => {
            let _log_guard = apply_common_options(&options)?;
            report_failure(commands::demo::handle_demo_command(
                duration_secs,
                options.debug_enabled,
            ))
        }
    }
}

/// Apply debug, config path and log file options. The returned guard keeps
/// file logging alive and must be held until the command finishes.
fn apply_common_options(options: &CommonOptions) -> Result<Option<LoggerGuard>> {
    Log::set_debug(options.debug_enabled);

    if let Some(path) = &options.config_path {
        config::loading::set_config_path(PathBuf::from(path))?;
    }

    options
        .log_file
        .as_ref()
        .map(|file| Log::start_file_logging(file.clone()))
        .transpose()
}

/// Log a failed command with its full error chain and exit non-zero.
fn report_failure(result: Result<()>) -> Result<()> {
    if let Err(e) = result {
        if Log::is_enabled() {
            log_critical!("{:#}", e);
            log_end!();
        } else {
            eprintln!("Error: {:#}", e);
        }
        std::process::exit(EXIT_FAILURE);
    }
    Ok(())
}
