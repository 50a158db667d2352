use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::cli::validation::{parse_jobs, parse_param};

/// Available uicheck subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run scenarios in headless Chrome
    ///
    /// Loads every scenario file under the given paths, runs them with the
    /// configured concurrency, prints a summary and writes a JSON report.
    /// Exits non-zero if any scenario did not pass.
    Run(RunArgs),

    /// Validate scenario files without launching a browser
    Check(CheckArgs),

    /// Create an example config and checkout scenario
    Init(InitArgs),

    /// Print the JSON schema of the config file
    Schema(SchemaArgs),
}

/// Arguments for the run command
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Scenario files or directories (searched recursively)
    ///
    /// Examples:
    ///   uicheck run scenarios/
    ///   uicheck run scenarios/checkout.toml scenarios/search.json
    #[arg(required = true, value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    /// Number of scenarios to run concurrently
    #[arg(short, long, value_parser = parse_jobs, value_name = "N")]
    pub jobs: Option<usize>,

    /// Base URL for relative navigation targets
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Timeout for each action and assertion, in milliseconds
    #[arg(long, value_name = "MS")]
    pub timeout: Option<u64>,

    /// Wall-clock budget for one scenario, in milliseconds
    #[arg(long, value_name = "MS")]
    pub scenario_timeout: Option<u64>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Chrome executable to launch
    #[arg(long, value_name = "PATH")]
    pub chrome_path: Option<PathBuf>,

    /// Directory for screenshots and the report
    #[arg(long, value_name = "DIR")]
    pub artifacts_dir: Option<PathBuf>,

    /// Do not capture screenshots of failing scenarios
    #[arg(long)]
    pub no_screenshots: bool,

    /// Where to write the JSON report (default: <artifactsDir>/report.json)
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Only run scenarios carrying one of these tags
    #[arg(short, long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,

    /// Set a scenario parameter, overriding its [params] value
    ///
    /// Examples:
    ///   --param product="Ceramic Modern Coffee Mug" --param colour=Red
    #[arg(short, long = "param", value_parser = parse_param, value_name = "NAME=VALUE")]
    pub params: Vec<(String, String)>,
}

/// Arguments for the check command
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Scenario files or directories (searched recursively)
    #[arg(required = true, value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    /// Set a scenario parameter, overriding its [params] value
    #[arg(short, long = "param", value_parser = parse_param, value_name = "NAME=VALUE")]
    pub params: Vec<(String, String)>,
}

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Directory to initialise
    #[arg(default_value = ".", value_name = "DIR")]
    pub dir: PathBuf,

    /// Overwrite existing files
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the schema command
#[derive(Args, Debug)]
pub struct SchemaArgs {
    /// Write the schema to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}
