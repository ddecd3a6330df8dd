//! User-facing console output
//!
//! Diagnostics go through `tracing`; this is what the user reads while
//! `cps` runs. Every line starts with a `[HH:MM:SS]` timestamp.

use std::path::Path;

use chrono::Local;
use colored::Colorize;

use plugin_studio_core::ValidationError;

/// Output level chosen by `-q` / `-v`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
}

impl Verbosity {
    /// `--quiet` wins over `--verbose`
    pub fn from_flags(verbose: bool, quiet: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        }
    }

    /// Default `tracing` filter when `RUST_LOG` is unset
    pub fn tracing_filter(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "error",
            Verbosity::Normal => "warn",
            Verbosity::Verbose => "debug",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Logger {
    verbosity: Verbosity,
}

const INDENT: &str = "           ";

impl Logger {
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    fn shows_info(&self) -> bool {
        self.verbosity != Verbosity::Quiet
    }

    fn shows_debug(&self) -> bool {
        self.verbosity == Verbosity::Verbose
    }

    pub fn debug(&self, message: &str) {
        if self.shows_debug() {
            println!("{} {}", timestamp(), message.dimmed());
        }
    }

    pub fn info(&self, message: &str) {
        if self.shows_info() {
            println!("{} {}", timestamp(), message);
        }
    }

    /// Empty line, hidden in quiet mode
    pub fn blank(&self) {
        if self.shows_info() {
            println!();
        }
    }

    pub fn success(&self, message: &str) {
        if self.shows_info() {
            println!("{} {} {}", timestamp(), "✓".green(), message);
        }
    }

    pub fn warn(&self, message: &str) {
        if self.shows_info() {
            println!("{} {} {}", timestamp(), "⚠".yellow(), message);
        }
    }

    /// Always shown
    pub fn error(&self, message: &str) {
        eprintln!("{} {} {}", timestamp(), "✗".red(), message);
    }

    /// Always shown
    pub fn validation_errors(&self, errors: &[ValidationError]) {
        eprintln!("{} {} Validation failed:", timestamp(), "✗".red());
        for error in errors {
            eprintln!("{}{} {}", INDENT, "-".red(), format_validation_error(error));
        }
        eprintln!(
            "{} {} Sync blocked until errors are fixed",
            timestamp(),
            "⏸".yellow()
        );
    }

    pub fn change(&self, relative: &Path) {
        if self.shows_info() {
            println!(
                "{} {} {}",
                timestamp(),
                "Change detected:".cyan(),
                relative.display()
            );
        }
    }

    pub fn command(&self, command: &str) {
        if self.shows_debug() {
            println!("{} {} {}", timestamp(), "Running:".dimmed(), command);
        }
    }
}

fn timestamp() -> String {
    format!("[{}]", Local::now().format("%H:%M:%S"))
        .bright_black()
        .to_string()
}

/// `[layer] message (at path)`
pub fn format_validation_error(error: &ValidationError) -> String {
    match &error.path {
        Some(path) => format!("[{}] {} (at {})", error.layer, error.message, path),
        None => format!("[{}] {}", error.layer, error.message),
    }
}
