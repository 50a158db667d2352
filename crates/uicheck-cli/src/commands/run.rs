//! Run command implementation.
//!
//! Loads scenarios, launches Chrome, runs everything and reports.

use crate::cli::RunArgs;
use crate::commands::load_scenarios;
use crate::config::{ConfigOverrides, UicheckConfig};
use crate::error::{CliError, Result, ResultExt};
use crate::ui;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uicheck_chrome::ChromeBrowser;
use uicheck_core::{PageFactory, RunResult, Scenario, ScenarioRunner, SuiteReport};

/// Execute the run command.
///
/// # Process
///
/// 1. Resolve configuration (file, environment, flags)
/// 2. Load, validate and bind scenarios; apply `--tag`
/// 3. Launch Chrome and run scenarios with the configured concurrency
/// 4. Print the summary and write the JSON report
///
/// Ctrl-C cancels the running scenarios; their pages are still closed and
/// the report is still written.
///
/// # Errors
///
/// Returns configuration, scenario and browser errors, and
/// [`CliError::ScenariosFailed`] when any scenario did not pass.
pub async fn execute(args: RunArgs, config_path: Option<&Path>) -> Result<()> {
    let config = UicheckConfig::load(config_path, &ConfigOverrides::from(&args))?;
    debug!("Resolved configuration: {:?}", config);

    let scenarios = select_by_tags(load_scenarios(&args.paths, &args.params)?, &args.tags);
    if scenarios.is_empty() {
        ui::warning("No scenario matches the given tags");
        return Ok(());
    }

    let spinner = ui::Spinner::new("Launching Chrome...");
    let browser = match ChromeBrowser::launch(config.chrome_config()).await {
        Ok(browser) => browser,
        Err(e) => {
            spinner.fail("Could not launch Chrome");
            return Err(e.into());
        }
    };
    spinner.finish("Chrome launched");

    let cancel = CancellationToken::new();
    let interrupt = spawn_interrupt_handler(cancel.clone());

    let report = run_scenarios(&scenarios, &browser, &config, &cancel).await;

    interrupt.abort();
    if let Err(e) = browser.close().await {
        warn!("Failed to close Chrome: {}", e);
    }

    finish(&report, args.report.unwrap_or_else(|| config.report_path())).await
}

/// Keeps scenarios that carry at least one of `tags`; all of them when
/// `tags` is empty.
pub fn select_by_tags(scenarios: Vec<Scenario>, tags: &[String]) -> Vec<Scenario> {
    if tags.is_empty() {
        return scenarios;
    }
    scenarios
        .into_iter()
        .filter(|scenario| scenario.tags.iter().any(|tag| tags.contains(tag)))
        .collect()
}

/// Runs `scenarios` on pages from `factory` and builds the suite report.
pub async fn run_scenarios(
    scenarios: &[Scenario],
    factory: &dyn PageFactory,
    config: &UicheckConfig,
    cancel: &CancellationToken,
) -> SuiteReport {
    let runner = ScenarioRunner::new(config.runner_config());
    let spinner = ui::Spinner::new(&format!(
        "Running {} scenario(s) with {} job(s)...",
        scenarios.len(),
        config.jobs
    ));

    let started = Instant::now();
    let results: Vec<RunResult> = runner
        .run_all(scenarios, factory, config.jobs, cancel)
        .await;
    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    spinner.clear();

    SuiteReport::new(&results, elapsed_ms)
}

/// Prints the summary, writes the report and turns failures into an error.
pub async fn finish(report: &SuiteReport, report_path: PathBuf) -> Result<()> {
    ui::print_summary(report);

    write_report(report, &report_path).await?;
    ui::info(&format!("Report written to {}", report_path.display()));

    if report.success() {
        Ok(())
    } else {
        Err(CliError::ScenariosFailed {
            failed: report.total - report.passed,
            total: report.total,
        })
    }
}

async fn write_report(report: &SuiteReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_path(parent)
            .context("Failed to create report directory")?;
    }
    tokio::fs::write(path, report.to_json()?)
        .await
        .with_path(path)
        .context("Failed to write report")
}

fn spawn_interrupt_handler(cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ui::warning("Interrupted, cancelling running scenarios...");
            cancel.cancel();
        }
    })
}
