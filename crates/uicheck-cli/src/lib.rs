//! uicheck CLI - declarative UI checks against headless Chrome.
//!
//! This crate wires the scenario engine (`uicheck-core`) to the Chrome
//! backend (`uicheck-chrome`) behind a command-line interface.
//!
//! # Architecture
//!
//! - [`cli`] - clap argument definitions
//! - [`commands`] - `run`, `check`, `init` and `schema`
//! - [`config`] - layered configuration (defaults, file, environment, flags)
//! - [`error`] - error types with actionable hints
//! - [`logger`] - tracing subscriber setup
//! - [`ui`] - status messages, spinners and the run summary
//!
//! # Example
//!
//! ```rust,no_run
//! use uicheck_cli::{error::Result, logger};
//!
//! fn main() -> Result<()> {
//!     logger::init_logger(false, false, false);
//!     // CLI command implementations...
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logger;
pub mod ui;

pub use config::UicheckConfig;
pub use error::{CliError, ConfigError, Result, ResultExt};
