//! Error types for the Chrome backend.
//!
//! [`BrowserError`] covers browser lifecycle and CDP failures. The engine
//! only sees [`SurfaceError`], so every variant maps onto one.

use std::time::Duration;
use thiserror::Error;
use uicheck_core::SurfaceError;

/// Errors raised while driving Chrome.
#[derive(Debug, Error)]
pub enum BrowserError {
    /// Failed to launch the browser process.
    ///
    /// This typically occurs when Chrome/Chromium is not installed,
    /// or when there are permission issues with the executable.
    #[error("failed to launch browser: {reason}")]
    LaunchFailed {
        /// Human-readable reason for the launch failure
        reason: String,
        /// Optional underlying error that caused the failure
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Failed to open a target or browser context over CDP.
    #[error("CDP connection failed: {0}")]
    ConnectionFailed(String),

    /// Navigation to a URL failed.
    #[error("navigation to '{url}' failed: {reason}")]
    NavigationFailed {
        /// The URL that failed to load
        url: String,
        /// Reason for the navigation failure
        reason: String,
    },

    /// The document never reached `readyState == "complete"`.
    #[error("'{url}' did not finish loading within {timeout:?}")]
    LoadTimeout {
        /// The URL being loaded
        url: String,
        /// How long we waited
        timeout: Duration,
    },

    /// JavaScript execution in the page context failed.
    #[error("JavaScript execution failed: {0}")]
    ScriptExecutionFailed(String),

    /// An operation was attempted on a closed browser or page.
    #[error("browser instance is already closed")]
    AlreadyClosed,

    /// Wraps errors from the chromiumoxide library.
    #[error("chromiumoxide error: {0}")]
    ChromiumOxide(#[from] chromiumoxide::error::CdpError),
}

/// A specialized Result type for browser operations.
pub type Result<T> = std::result::Result<T, BrowserError>;

impl From<BrowserError> for SurfaceError {
    fn from(err: BrowserError) -> Self {
        match err {
            BrowserError::NavigationFailed { url, reason } => Self::Navigation { url, reason },
            BrowserError::LoadTimeout { ref url, .. } => Self::Navigation {
                url: url.clone(),
                reason: err.to_string(),
            },
            BrowserError::ScriptExecutionFailed(message) => Self::Script(message),
            BrowserError::AlreadyClosed => Self::Closed,
            other => Self::Backend(other.to_string()),
        }
    }
}
