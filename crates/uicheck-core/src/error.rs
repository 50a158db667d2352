//! Error types for scenario execution.
//!
//! There are three layers, each with its own enum:
//!
//! - [`SurfaceError`]: what a page backend reports for a single operation
//!   (navigation, probe, click). These are often transient; the polling
//!   layers retry through them.
//! - [`Failure`]: why a step, and therefore a scenario, failed. Failures are
//!   serializable because they end up verbatim in reports.
//! - [`ScenarioError`]: problems loading or validating scenario definitions,
//!   raised before anything runs.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Error reported by a [`PageSurface`](crate::PageSurface) implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SurfaceError {
    /// The page failed to load.
    #[error("navigation to '{url}' failed: {reason}")]
    Navigation {
        /// The URL that failed to load
        url: String,
        /// Backend-specific reason
        reason: String,
    },

    /// An immediate operation needed an element and none matched.
    #[error("no element matches `{0}`")]
    NotFound(String),

    /// Script evaluation inside the page failed.
    #[error("script execution failed: {0}")]
    Script(String),

    /// The page or its browser was already closed.
    #[error("page is already closed")]
    Closed,

    /// The backend does not implement this optional operation.
    #[error("operation not supported by this page: {0}")]
    Unsupported(&'static str),

    /// Any other backend failure.
    #[error("{0}")]
    Backend(String),
}

/// Why a step failed.
///
/// Every variant carries enough context (locator, expected, actual) to
/// diagnose the failure from the report alone.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Failure {
    /// A setup step failed, so no scenario step ran.
    #[error(
        "setup failed{}: {cause}",
        .step.map(|s| format!(" at step {s}")).unwrap_or_default()
    )]
    SetupFailure {
        /// Index of the failing setup step, or `None` when the page itself
        /// could not be opened
        step: Option<usize>,
        /// The underlying failure
        cause: Box<Failure>,
    },

    /// An interaction target never reached the state the action needs.
    #[error(
        "action on `{locator}` timed out after {timeout_ms}ms waiting for it to be {expected} (last state: {last_state})"
    )]
    ActionTimeout {
        /// Canonical rendering of the target locator
        locator: String,
        /// The state the action waited for
        expected: String,
        /// The timeout that elapsed
        timeout_ms: u64,
        /// Last observed element state
        last_state: String,
    },

    /// An expected condition never held.
    #[error(
        "expected `{locator}` {expected} within {timeout_ms}ms, last observed: {}",
        .actual.as_deref().unwrap_or("nothing")
    )]
    AssertionTimeout {
        /// Canonical rendering of the asserted locator
        locator: String,
        /// Human-readable expectation
        expected: String,
        /// Last observed actual value, if any was observed
        actual: Option<String>,
        /// The timeout that elapsed
        timeout_ms: u64,
    },

    /// A page failed to load.
    #[error("navigation to '{url}' failed: {reason}")]
    NavigationFailure {
        /// The URL that failed
        url: String,
        /// Reason reported by the backend
        reason: String,
    },

    /// A backend error outside any polling loop, or a caught panic.
    #[error("internal error: {message}")]
    Internal {
        /// Description of the error
        message: String,
    },
}

impl Failure {
    /// Creates an internal failure from any displayable error.
    pub fn internal(message: impl ToString) -> Self {
        Self::Internal {
            message: message.to_string(),
        }
    }

    /// Short machine-friendly name of the failure kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SetupFailure { .. } => "setup_failure",
            Self::ActionTimeout { .. } => "action_timeout",
            Self::AssertionTimeout { .. } => "assertion_timeout",
            Self::NavigationFailure { .. } => "navigation_failure",
            Self::Internal { .. } => "internal",
        }
    }

    /// Peels `SetupFailure` wrappers and returns the underlying failure.
    #[must_use]
    pub fn root_cause(&self) -> &Failure {
        match self {
            Self::SetupFailure { cause, .. } => cause.root_cause(),
            other => other,
        }
    }

    /// The expectation this failure was checking, when there was one.
    #[must_use]
    pub fn expected(&self) -> Option<&str> {
        match self.root_cause() {
            Self::AssertionTimeout { expected, .. } => Some(expected),
            Self::ActionTimeout { expected, .. } => Some(expected),
            _ => None,
        }
    }

    /// The last observed actual value, when there was one.
    #[must_use]
    pub fn actual(&self) -> Option<&str> {
        match self.root_cause() {
            Self::AssertionTimeout { actual, .. } => actual.as_deref(),
            Self::ActionTimeout { last_state, .. } => Some(last_state),
            Self::NavigationFailure { reason, .. } => Some(reason),
            Self::Internal { message } => Some(message),
            Self::SetupFailure { .. } => None,
        }
    }
}

/// Errors raised while loading or validating scenario definitions.
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// The scenario file could not be read.
    #[error("failed to read scenario file {}: {source}", .path.display())]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for a scenario.
    #[error("invalid TOML scenario in {}: {source}", .path.display())]
    Toml {
        /// File that failed
        path: PathBuf,
        /// Parser error
        #[source]
        source: toml::de::Error,
    },

    /// The file is not valid JSON for a scenario.
    #[error("invalid JSON scenario in {}: {source}", .path.display())]
    Json {
        /// File that failed
        path: PathBuf,
        /// Parser error
        #[source]
        source: serde_json::Error,
    },

    /// The file extension is neither `.toml` nor `.json`.
    #[error("unsupported scenario file: {} (expected .toml or .json)", .0.display())]
    UnsupportedFormat(PathBuf),

    /// The scenario parsed but is structurally invalid.
    #[error("scenario '{scenario}' is invalid: {reason}")]
    Invalid {
        /// Scenario name
        scenario: String,
        /// What is wrong
        reason: String,
    },

    /// A `${name}` placeholder has no value.
    #[error("scenario '{scenario}' references unknown parameter '{name}'")]
    UnknownParam {
        /// Scenario name
        scenario: String,
        /// Placeholder name
        name: String,
    },
}
