//! Formatting of durations and the end-of-run summary.

use owo_colors::OwoColorize;
use std::time::Duration;
use uicheck_core::{RunStatus, ScenarioReport, SuiteReport};

/// Format duration in human-readable format.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use uicheck_cli::ui::format_duration;
///
/// assert_eq!(format_duration(Duration::from_millis(50)), "50ms");
/// assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
/// assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let total_ms = duration.as_millis();

    if total_ms < 1000 {
        format!("{}ms", total_ms)
    } else if total_ms < 60_000 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        let secs = duration.as_secs();
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

fn symbol(status: RunStatus) -> &'static str {
    match status {
        RunStatus::Passed => "✓",
        RunStatus::Failed => "✗",
        RunStatus::TimedOut => "⏱",
        RunStatus::Cancelled => "⊘",
    }
}

fn detail_lines(scenario: &ScenarioReport) -> Vec<String> {
    let mut lines = Vec::new();

    if let Some(step) = scenario.steps.iter().find(|step| !step.passed) {
        lines.push(format!("{} {}: {}", step.phase, step.index, step.description));
        if let Some(expected) = &step.expected {
            lines.push(format!("expected: {}", expected));
        }
        if let Some(actual) = &step.actual {
            lines.push(format!("actual:   {}", actual));
        }
    }
    if let Some(summary) = &scenario.summary {
        lines.push(summary.clone());
    }
    for artifact in &scenario.artifacts {
        lines.push(format!("screenshot: {}", artifact.display()));
    }
    if !scenario.console_errors.is_empty() {
        lines.push(format!(
            "{} console error(s), first: {}",
            scenario.console_errors.len(),
            scenario.console_errors[0]
        ));
    }
    lines
}

fn totals_line(report: &SuiteReport) -> String {
    let mut parts = vec![format!("{} passed", report.passed)];
    if report.failed > 0 {
        parts.push(format!("{} failed", report.failed));
    }
    if report.timed_out > 0 {
        parts.push(format!("{} timed out", report.timed_out));
    }
    if report.cancelled > 0 {
        parts.push(format!("{} cancelled", report.cancelled));
    }
    format!(
        "{} scenario(s): {} in {}",
        report.total,
        parts.join(", "),
        format_duration(Duration::from_millis(report.elapsed_ms))
    )
}

/// The summary as plain text lines, one block per scenario plus a totals
/// line.
pub fn summary_lines(report: &SuiteReport) -> Vec<String> {
    let mut lines = Vec::new();
    for scenario in &report.scenarios {
        lines.push(format!(
            "{} {} ({})",
            symbol(scenario.status),
            scenario.name,
            format_duration(Duration::from_millis(scenario.elapsed_ms))
        ));
        lines.extend(
            detail_lines(scenario)
                .into_iter()
                .map(|line| format!("    {}", line)),
        );
    }
    lines.push(String::new());
    lines.push(totals_line(report));
    lines
}

/// Print the end-of-run summary to stderr.
pub fn print_summary(report: &SuiteReport) {
    if !super::colors_enabled() {
        for line in summary_lines(report) {
            eprintln!("{}", line);
        }
        return;
    }

    for scenario in &report.scenarios {
        let elapsed = format_duration(Duration::from_millis(scenario.elapsed_ms));
        let mark = symbol(scenario.status);
        match scenario.status {
            RunStatus::Passed => eprintln!("{} {} {}", mark.green().bold(), scenario.name, elapsed.dimmed()),
            RunStatus::Failed => eprintln!("{} {} {}", mark.red().bold(), scenario.name.red(), elapsed.dimmed()),
            RunStatus::TimedOut | RunStatus::Cancelled => {
                eprintln!("{} {} {}", mark.yellow().bold(), scenario.name.yellow(), elapsed.dimmed())
            }
        }
        for line in detail_lines(scenario) {
            eprintln!("    {}", line.dimmed());
        }
    }

    eprintln!();
    let totals = totals_line(report);
    if report.success() {
        eprintln!("{}", totals.green().bold());
    } else {
        eprintln!("{}", totals.red().bold());
    }
}
