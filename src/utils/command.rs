//! Process invocation primitives with consistent error handling.

use std::path::PathBuf;
use std::process::{Command, Output};

use serde::Serialize;

use crate::error::{CommandFailedDetails, Error, Result};

/// A single external program invocation. The child inherits this process's environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,
}

impl Invocation {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            working_dir: None,
        }
    }

    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Program and arguments joined for display.
    pub fn display(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

/// Captured result of a finished process.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandOutput {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stdout: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stderr: String,
    pub success: bool,
    pub exit_code: i32,
}

impl CommandOutput {
    /// Convert a non-zero exit into a `command.failed` error.
    pub fn require_success(self, invocation: &Invocation) -> Result<CommandOutput> {
        if self.success {
            return Ok(self);
        }

        Err(Error::command_failed(CommandFailedDetails {
            command: invocation.display(),
            exit_code: self.exit_code,
            stdout: self.stdout.trim().to_string(),
            stderr: self.stderr.trim().to_string(),
            working_dir: invocation
                .working_dir
                .as_ref()
                .map(|dir| dir.to_string_lossy().to_string()),
        }))
    }
}

/// Blocking process execution facility used by step bodies.
pub trait ProcessRunner {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput>;
}

/// Runs programs directly with `std::process::Command` (no shell).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProcessRunner;

impl ProcessRunner for SystemProcessRunner {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args);

        if let Some(dir) = &invocation.working_dir {
            cmd.current_dir(dir);
        }

        let output = cmd.output().map_err(|e| {
            Error::internal_io(
                format!("Failed to run {}: {}", invocation.program, e),
                Some(invocation.display()),
            )
        })?;

        Ok(to_command_output(&output))
    }
}

fn to_command_output(output: &Output) -> CommandOutput {
    CommandOutput {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        success: output.status.success(),
        // Signal-terminated processes have no code.
        exit_code: output.status.code().unwrap_or(-1),
    }
}
