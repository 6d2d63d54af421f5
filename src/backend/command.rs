//! Backend that runs user-configured shell commands.
//!
//! `apply_command` is run through `sh -c` after substituting `{temperature}`
//! (integer Kelvin) and `{brightness}` (percent, one decimal). A non-zero exit
//! status is reported as a failure together with the command's stderr.

use anyhow::{Context, Result};
use std::process::Command;

use super::OutputSink;

pub struct CommandBackend {
    apply_command: String,
    reset_command: Option<String>,
}

impl CommandBackend {
    pub fn new(apply_command: String, reset_command: Option<String>) -> Self {
        Self {
            apply_command,
            reset_command,
        }
    }

    /// The apply command with placeholders filled in.
    pub fn render(&self, temperature: u32, brightness: f32) -> String {
        self.apply_command
            .replace("{temperature}", &temperature.to_string())
            .replace("{brightness}", &format!("{brightness:.1}"))
    }
}

fn run_shell(command_line: &str) -> Result<()> {
    let output = Command::new("sh")
        .arg("-c")
        .arg(command_line)
        .output()
        .with_context(|| format!("Failed to run '{command_line}'"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!(
            "'{}' exited with {}: {}",
            command_line,
            output.status,
            stderr.trim()
        );
    }

    Ok(())
}

impl OutputSink for CommandBackend {
    fn apply(&mut self, temperature: u32, brightness: f32) -> Result<()> {
        run_shell(&self.render(temperature, brightness))
    }

    fn reset(&mut self) -> Result<()> {
        match &self.reset_command {
            Some(command) => run_shell(command),
            None => Ok(()),
        }
    }

    fn name(&self) -> &'static str {
        "Command"
    }
}
