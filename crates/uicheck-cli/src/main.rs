//! uicheck - run declarative UI check scenarios.
//!
//! Parses arguments, initialises logging and colors, and dispatches to the
//! command implementations.

use clap::Parser;
use miette::Result;
use uicheck_cli::{cli, commands, error, logger, ui};

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    logger::init_logger(args.verbose, args.quiet, args.no_color);
    ui::init_colors(args.no_color);

    let result = match args.command {
        cli::Command::Run(run_args) => {
            commands::run_execute(run_args, args.config.as_deref()).await
        }
        cli::Command::Check(check_args) => commands::check_execute(check_args).await,
        cli::Command::Init(init_args) => commands::init_execute(init_args).await,
        cli::Command::Schema(schema_args) => commands::schema_execute(schema_args).await,
    };

    result.map_err(error::cli_error_to_miette)
}
