//! Miette diagnostic conversion for CLI errors.

use crate::error::CliError;
use miette::Report;
use uicheck_chrome::BrowserError;
use uicheck_core::ScenarioError;

/// Convert CliError to miette Report
pub fn cli_error_to_miette(err: CliError) -> Report {
    match err {
        CliError::Scenario(e) => scenario_error_to_miette(e),
        CliError::Browser(e) => browser_error_to_miette(e),
        CliError::ScenariosFailed { failed, total } => {
            miette::miette!(
                "{} of {} scenario(s) did not pass\n\nHint: See the report for expected and actual values of the failing step",
                failed,
                total
            )
        }
        _ => miette::miette!("{}", err),
    }
}

fn scenario_error_to_miette(err: ScenarioError) -> Report {
    match err {
        ScenarioError::UnknownParam { scenario, name } => miette::miette!(
            "Scenario '{}' references unknown parameter '{}'\n\nHint: Declare it under [params] or pass --param {}=<value>",
            scenario,
            name,
            name
        ),
        other => miette::miette!(
            "{}\n\nHint: Run 'uicheck check <path>' to validate scenario files",
            other
        ),
    }
}

fn browser_error_to_miette(err: BrowserError) -> Report {
    match err {
        BrowserError::LaunchFailed { .. } => miette::miette!(
            "{}\n\nHint: Install Chrome or Chromium, or point chromePath / UICHECK_CHROME_PATH at the executable",
            err
        ),
        other => miette::miette!("{}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_param_suggests_flag() {
        let report = cli_error_to_miette(CliError::Scenario(ScenarioError::UnknownParam {
            scenario: "checkout".into(),
            name: "product".into(),
        }));
        assert!(report.to_string().contains("--param product=<value>"));
    }

    #[test]
    fn launch_failure_suggests_chrome_path() {
        let report = cli_error_to_miette(CliError::Browser(BrowserError::LaunchFailed {
            reason: "no executable".into(),
            source: None,
        }));
        assert!(report.to_string().contains("chromePath"));
    }
}
