//! Init command implementation.
//!
//! Writes an example config and the checkout scenario.

use crate::cli::InitArgs;
use crate::commands::templates;
use crate::error::{CliError, Result, ResultExt};
use crate::ui;
use std::fs;
use std::path::Path;

/// Config file written by `uicheck init`.
pub const CONFIG_FILE: &str = "uicheck.config.toml";

/// Scenario file written by `uicheck init`, relative to the target dir.
pub const SCENARIO_FILE: &str = "scenarios/checkout.toml";

/// Execute the init command.
///
/// # Errors
///
/// Refuses to overwrite existing files unless `--force` is given, and
/// returns I/O errors from writing.
pub async fn execute(args: InitArgs) -> Result<()> {
    let dir = args.dir.as_path();
    let files = [
        (dir.join(CONFIG_FILE), templates::CONFIG_TEMPLATE),
        (dir.join(SCENARIO_FILE), templates::CHECKOUT_SCENARIO),
    ];

    if !args.force {
        if let Some((existing, _)) = files.iter().find(|(path, _)| path.exists()) {
            return Err(CliError::InvalidArgument(format!(
                "{} already exists\n\nHint: Use --force to overwrite it",
                existing.display()
            )));
        }
    }

    for (path, contents) in &files {
        write_file(path, contents)?;
        ui::success(&format!("Created {}", path.display()));
    }

    print_next_steps(dir);
    Ok(())
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_path(parent)?;
    }
    fs::write(path, contents).with_path(path)
}

fn print_next_steps(dir: &Path) {
    ui::info("Next steps:");
    if dir != Path::new(".") {
        eprintln!("  cd {}", dir.display());
    }
    eprintln!("  # point baseUrl in {} at your site", CONFIG_FILE);
    eprintln!("  uicheck check scenarios/");
    eprintln!("  uicheck run scenarios/");
}
