//! Command-line interface definition for uicheck.
//!
//! # Command Structure
//!
//! - `uicheck run` - Run scenarios against headless Chrome
//! - `uicheck check` - Validate scenario files without a browser
//! - `uicheck init` - Write an example config and checkout scenario
//! - `uicheck schema` - Print the JSON schema of the config file

mod commands;
mod validation;

use clap::Parser;
use std::path::PathBuf;

pub use commands::{CheckArgs, Command, InitArgs, RunArgs, SchemaArgs};
pub use validation::{parse_jobs, parse_param};

/// uicheck - declarative UI checks with explicit waiting
#[derive(Parser, Debug)]
#[command(
    name = "uicheck",
    version,
    about = "Run declarative UI check scenarios against headless Chrome",
    long_about = "uicheck runs scenarios of user-intent steps (navigate, click, assert) against\n\
                  a real browser. Every action waits for its target to be attached, visible and\n\
                  stable, every assertion polls until it holds or times out, and every run ends\n\
                  in a structured report with expected and actual values."
)]
pub struct Cli {
    /// Enable verbose logging (debug level)
    ///
    /// Shows every poll decision, page lifecycle event and step timing.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Config file (default: uicheck.config.toml or uicheck.config.json)
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}
