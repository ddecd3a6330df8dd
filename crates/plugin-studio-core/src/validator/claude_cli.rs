//! External layer: `claude plugin validate <path>`
//!
//! The CLI has no structured output, so results are read heuristically:
//! a line is an error when it mentions an error marker and does not mention
//! "valid". This is best-effort and can over- or under-report. It is kept
//! behind [`ExternalValidator`] so a structured protocol can replace it.

use std::ffi::OsStr;
use std::future::Future;
use std::path::Path;
use std::time::Duration;

use tracing::{debug, warn};

use crate::claude::{ClaudeCli, CommandOutput};
use crate::error::StudioError;
use crate::types::{ValidationError, ValidationResult};

pub const VALIDATE_TIMEOUT: Duration = Duration::from_secs(30);

const ERROR_MARKERS: &[&str] = &[
    "error", "Error", "invalid", "Invalid", "missing", "Missing", "failed", "Failed",
];
const SUCCESS_MARKERS: &[&str] = &["valid", "Valid"];

/// Result of an external validation. `skipped` is set when the tool could
/// not be consulted; the result is then always valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalValidation {
    pub result: ValidationResult,
    pub skipped: bool,
}

impl ExternalValidation {
    pub fn skipped() -> Self {
        Self {
            result: ValidationResult::ok(),
            skipped: true,
        }
    }

    pub fn checked(result: ValidationResult) -> Self {
        Self {
            result,
            skipped: false,
        }
    }
}

/// Deep validation performed outside this process. Implementations must
/// never fail: problems running the tool degrade to a skipped result.
pub trait ExternalValidator: Send + Sync {
    fn validate(&self, path: &Path) -> impl Future<Output = ExternalValidation> + Send;
}

#[derive(Debug, Clone)]
pub struct ClaudeCliValidator {
    cli: ClaudeCli,
    timeout: Duration,
}

impl Default for ClaudeCliValidator {
    fn default() -> Self {
        Self::new(ClaudeCli::default(), VALIDATE_TIMEOUT)
    }
}

impl ClaudeCliValidator {
    pub fn new(cli: ClaudeCli, timeout: Duration) -> Self {
        Self { cli, timeout }
    }

    pub fn build_validate_command(&self, path: &Path) -> String {
        format!("{} plugin validate \"{}\"", self.cli.binary(), path.display())
    }
}

impl ExternalValidator for ClaudeCliValidator {
    async fn validate(&self, path: &Path) -> ExternalValidation {
        let args = [OsStr::new("plugin"), OsStr::new("validate"), path.as_os_str()];

        match self.cli.run(args, self.timeout).await {
            Ok(output) => ExternalValidation::checked(interpret_output(&output)),
            Err(StudioError::ClaudeNotFound { binary }) => {
                debug!(%binary, "claude CLI not installed, skipping deep validation");
                ExternalValidation::skipped()
            }
            Err(e @ StudioError::ClaudeTimeout { .. }) => {
                ExternalValidation::checked(ValidationResult::failed(ValidationError::claude_cli(
                    e.to_string(),
                )))
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "claude plugin validate could not run, skipping");
                ExternalValidation::skipped()
            }
        }
    }
}

/// Turn a finished `claude plugin validate` run into a result
pub fn interpret_output(output: &CommandOutput) -> ValidationResult {
    let errors = parse_output(&output.stdout, &output.stderr);
    if output.success() || !errors.is_empty() {
        return ValidationResult::from_errors(errors);
    }

    let stderr = output.stderr.trim();
    let message = if stderr.is_empty() {
        match output.code {
            Some(code) => format!("Validation failed (exit status {code})"),
            None => "Validation failed".to_string(),
        }
    } else {
        stderr.to_string()
    };
    ValidationResult::failed(ValidationError::claude_cli(message))
}

/// Scan stdout then stderr for error-looking lines
pub fn parse_output(stdout: &str, stderr: &str) -> Vec<ValidationError> {
    stdout
        .lines()
        .chain(stderr.lines())
        .map(str::trim)
        .filter(|line| is_error_line(line))
        .map(ValidationError::claude_cli)
        .collect()
}

fn is_error_line(line: &str) -> bool {
    !line.is_empty()
        && !SUCCESS_MARKERS.iter().any(|m| line.contains(m))
        && ERROR_MARKERS.iter().any(|m| line.contains(m))
}
