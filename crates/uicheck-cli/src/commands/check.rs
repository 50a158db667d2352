//! Check command implementation.
//!
//! Validates scenario files without launching a browser.

use crate::cli::CheckArgs;
use crate::commands::load_scenarios;
use crate::error::Result;
use crate::ui;

/// Execute the check command.
///
/// Every file is parsed, structurally validated and has its `${name}`
/// placeholders bound, exactly as `uicheck run` would, so a clean check
/// means the run can only fail in the browser.
///
/// # Errors
///
/// Returns the first scenario that fails to load.
pub async fn execute(args: CheckArgs) -> Result<()> {
    ui::info("Checking scenarios...");

    let scenarios = load_scenarios(&args.paths, &args.params)?;
    for scenario in &scenarios {
        ui::success(&format!(
            "  {} ({} setup, {} steps)",
            scenario.name,
            scenario.setup.len(),
            scenario.steps.len()
        ));
    }

    ui::success(&format!("{} scenario(s) are valid", scenarios.len()));
    Ok(())
}
