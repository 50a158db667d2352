//! Error handling for the uicheck CLI.
//!
//! Errors are split by where they come from:
//! - **Top-level errors** (`CliError`) are what commands return
//! - **Domain errors** (`ConfigError`, plus `ScenarioError` and
//!   `BrowserError` from the library crates) carry the detail
//! - **Conversion** into `CliError` is automatic via `#[from]`
//!
//! Messages that the user can act on end with a `Hint:` line.
//!
//! # Example
//!
//! ```rust,no_run
//! use uicheck_cli::error::{Result, ResultExt};
//! use std::path::Path;
//!
//! fn read_report(path: &Path) -> Result<String> {
//!     std::fs::read_to_string(path)
//!         .with_path(path)
//!         .context("Failed to read previous report")
//! }
//! ```

pub mod diagnostic;

use std::path::PathBuf;
use thiserror::Error;
use uicheck_chrome::BrowserError;
use uicheck_core::ScenarioError;

pub use diagnostic::cli_error_to_miette;

/// Top-level CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration-related errors (file not found, invalid values, etc.)
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A scenario file failed to load or validate
    #[error("Scenario error: {0}")]
    Scenario(#[from] ScenarioError),

    /// Chrome could not be launched or driven
    #[error("Browser error: {0}")]
    Browser(#[from] BrowserError),

    /// Scenarios ran, but not all of them passed
    #[error("{failed} of {total} scenario(s) did not pass")]
    ScenariosFailed {
        /// Scenarios that failed, timed out or were cancelled
        failed: usize,
        /// Scenarios that ran
        total: usize,
    },

    /// Invalid command-line arguments or options
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// File or directory not found
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// I/O errors from file system operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with custom messages
    #[error("{0}")]
    Custom(String),
}

/// Configuration-specific errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file doesn't exist at the given location
    #[error("Config file not found: {}\n\nHint: Run 'uicheck init' to create uicheck.config.toml or pass an existing --config <path>", .0.display())]
    NotFound(PathBuf),

    /// Config file extension is not recognised
    #[error("Unsupported config file: {}\n\nHint: Use a .toml or .json file", .0.display())]
    UnsupportedFormat(PathBuf),

    /// Sources could not be merged into a configuration
    #[error("Invalid configuration: {0}\n\nHint: Run 'uicheck schema' to see every option and its type")]
    Extract(String),

    /// Mutually exclusive or inconsistent options
    #[error("Conflicting options: {0}\n\nHint: Check the timeouts in your config, environment and flags")]
    ConflictingOptions(String),

    /// Invalid value for a configuration option
    #[error("Invalid value for '{field}': {value}\n\nHint: {hint}")]
    InvalidValue {
        /// Name of the field with invalid value
        field: String,
        /// The invalid value
        value: String,
        /// Helpful hint for correct values
        hint: String,
    },
}

/// Result type alias using `CliError` as the default error type.
pub type Result<T, E = CliError> = std::result::Result<T, E>;

/// Extension trait for adding context to `Result` types.
pub trait ResultExt<T> {
    /// Turns a not-found I/O error into [`CliError::FileNotFound`] for `path`.
    fn with_path(self, path: impl AsRef<std::path::Path>) -> Result<T>;

    /// Appends a `Hint:` line to the error message.
    fn with_hint(self, hint: impl std::fmt::Display) -> Result<T>;

    /// Prefixes the error message with `msg`.
    fn context(self, msg: impl std::fmt::Display) -> Result<T>;
}

impl<T, E: Into<CliError>> ResultExt<T> for std::result::Result<T, E> {
    fn with_path(self, path: impl AsRef<std::path::Path>) -> Result<T> {
        self.map_err(|e| {
            let err: CliError = e.into();
            match err {
                CliError::Io(io_err) if io_err.kind() == std::io::ErrorKind::NotFound => {
                    CliError::FileNotFound(path.as_ref().to_path_buf())
                }
                other => other,
            }
        })
    }

    fn with_hint(self, hint: impl std::fmt::Display) -> Result<T> {
        self.map_err(|e| {
            let err: CliError = e.into();
            CliError::Custom(format!("{}\n\nHint: {}", err, hint))
        })
    }

    fn context(self, msg: impl std::fmt::Display) -> Result<T> {
        self.map_err(|e| {
            let err: CliError = e.into();
            CliError::Custom(format!("{}: {}", msg, err))
        })
    }
}
