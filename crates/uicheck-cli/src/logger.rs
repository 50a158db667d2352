//! Logging infrastructure for the uicheck CLI.
//!
//! Sets up the `tracing` subscriber that the engine and the Chrome backend
//! log through. Logs go to stderr so stdout stays clean for `uicheck schema`.
//!
//! # Example
//!
//! ```rust,no_run
//! use uicheck_cli::logger::init_logger;
//! use tracing::{info, debug};
//!
//! init_logger(false, false, false);
//!
//! info!("Running scenarios");
//! debug!("Loaded scenario: {}", "checkout");
//! ```

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter for `--verbose`.
pub const VERBOSE_FILTER: &str = "uicheck_core=debug,uicheck_chrome=debug,uicheck_cli=debug";

/// Filter for `--quiet`.
pub const QUIET_FILTER: &str = "uicheck_core=error,uicheck_chrome=error,uicheck_cli=error";

/// Filter used when neither flag nor `RUST_LOG` is set.
pub const DEFAULT_FILTER: &str = "uicheck_core=info,uicheck_chrome=warn,uicheck_cli=info";

/// Picks the filter directives for the given flags.
///
/// The logging level is determined in this order:
/// 1. `--verbose` flag: DEBUG for uicheck crates
/// 2. `--quiet` flag: ERROR only
/// 3. `RUST_LOG` environment variable: custom filter
/// 4. Default: INFO for the engine and CLI, WARN for the browser backend
pub fn build_filter(verbose: bool, quiet: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else if quiet {
        EnvFilter::new(QUIET_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    }
}

/// Initialize the tracing subscriber.
///
/// Call once at the start of the program, before any logging occurs.
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool) {
    init_logger_with_filter(build_filter(verbose, quiet), no_color);
}

/// Initialize logger with a custom environment filter.
pub fn init_logger_with_filter(filter: EnvFilter, no_color: bool) {
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color)
        .compact();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}
