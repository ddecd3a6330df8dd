//! Claude CLI subprocess runner
//!
//! Every call to the external `claude` binary goes through [`ClaudeCli::run`],
//! which passes arguments directly (no shell) and bounds the call with a
//! timeout. The child is killed if the timeout elapses.

use std::ffi::{OsStr, OsString};
use std::io;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::debug;

use crate::error::{Result, StudioError};

pub const DEFAULT_BINARY: &str = "claude";

/// Captured output of a finished command
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// Exit code (`None` when killed by a signal)
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Best description of a failure: stderr, then stdout, then the exit code
    pub fn failure_text(&self) -> String {
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return stderr.to_string();
        }
        let stdout = self.stdout.trim();
        if !stdout.is_empty() {
            return stdout.to_string();
        }
        match self.code {
            Some(code) => format!("exit status {code}"),
            None => "terminated by signal".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClaudeCli {
    binary: String,
}

impl Default for ClaudeCli {
    fn default() -> Self {
        Self::new(DEFAULT_BINARY)
    }
}

impl ClaudeCli {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    /// Check availability with `claude --version`
    pub async fn is_available(&self) -> bool {
        matches!(
            self.run(["--version"], Duration::from_secs(10)).await,
            Ok(output) if output.success()
        )
    }

    /// Run the binary with `args`.
    ///
    /// # Errors
    /// * `ClaudeNotFound` - the binary is not on PATH
    /// * `ClaudeTimeout` - the process did not finish within `timeout`
    /// * `ClaudeExecutionFailed` - spawning or waiting failed otherwise
    ///
    /// A non-zero exit is not an error; inspect [`CommandOutput::success`].
    pub async fn run<I, S>(&self, args: I, timeout: Duration) -> Result<CommandOutput>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let args: Vec<OsString> = args.into_iter().map(|a| a.as_ref().to_owned()).collect();
        let command = self.describe(&args);
        debug!(%command, "Running claude CLI");

        let child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|e| StudioError::ClaudeExecutionFailed {
                message: format!("Execution failed: {}", e),
            })?,
            Err(_) => {
                return Err(StudioError::ClaudeTimeout {
                    command,
                    secs: timeout.as_secs(),
                })
            }
        };

        let output = CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };
        debug!(%command, code = ?output.code, "claude CLI finished");
        Ok(output)
    }

    fn describe(&self, args: &[OsString]) -> String {
        let mut command = self.binary.clone();
        for arg in args {
            command.push(' ');
            command.push_str(&arg.to_string_lossy());
        }
        command
    }

    fn spawn_error(&self, error: io::Error) -> StudioError {
        if error.kind() == io::ErrorKind::NotFound {
            StudioError::ClaudeNotFound {
                binary: self.binary.clone(),
            }
        } else {
            StudioError::ClaudeExecutionFailed {
                message: format!("Failed to spawn {}: {}", self.binary, error),
            }
        }
    }
}
