//! Serializable reports built from run results.
//!
//! Conversion is pure: no I/O, no clock. Writing the JSON somewhere is the
//! caller's business.

use crate::error::Failure;
use crate::runner::{Phase, RunResult, RunStatus, StepOutcome, StepRef};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One step line of a scenario report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepReport {
    pub phase: Phase,
    pub index: usize,
    pub description: String,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
    pub elapsed_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&StepOutcome> for StepReport {
    fn from(outcome: &StepOutcome) -> Self {
        Self {
            phase: outcome.phase,
            index: outcome.index,
            description: outcome.description.clone(),
            passed: outcome.passed,
            expected: outcome.expected.clone(),
            actual: outcome.actual.clone(),
            elapsed_ms: outcome.elapsed_ms,
            error: outcome.failure.as_ref().map(ToString::to_string),
        }
    }
}

/// Report for one scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioReport {
    pub name: String,
    pub status: RunStatus,
    pub elapsed_ms: u64,
    /// One-line description of why the run did not pass.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Machine-friendly failure kind, e.g. `action_timeout` or
    /// `setup_failure`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_kind: Option<String>,
    /// Kind of the underlying failure when `failure_kind` wraps one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_step: Option<StepRef>,
    pub steps: Vec<StepReport>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<PathBuf>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub console_errors: Vec<String>,
}

impl From<&RunResult> for ScenarioReport {
    fn from(result: &RunResult) -> Self {
        let summary = match (result.status, &result.failure, result.failed_step) {
            (RunStatus::Passed, _, _) => None,
            (_, Some(failure), _) => Some(failure.to_string()),
            (RunStatus::TimedOut, None, Some(step)) => {
                Some(format!("scenario timed out during {step}"))
            }
            (RunStatus::TimedOut, None, None) => Some("scenario timed out".to_string()),
            (RunStatus::Cancelled, None, Some(step)) => {
                Some(format!("scenario cancelled during {step}"))
            }
            (_, None, _) => Some("scenario cancelled".to_string()),
        };

        Self {
            name: result.scenario.clone(),
            status: result.status,
            elapsed_ms: result.elapsed_ms,
            summary,
            failure_kind: result.failure.as_ref().map(|f| f.kind().to_string()),
            root_kind: result
                .failure
                .as_ref()
                .filter(|f| matches!(f, Failure::SetupFailure { .. }))
                .map(|f| f.root_cause().kind().to_string()),
            failed_step: result.failed_step,
            steps: result
                .setup
                .iter()
                .chain(&result.steps)
                .map(StepReport::from)
                .collect(),
            artifacts: result.artifacts.clone(),
            console_errors: result.console_errors.clone(),
        }
    }
}

/// Report for a whole run of scenarios, in execution order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiteReport {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub timed_out: usize,
    pub cancelled: usize,
    pub elapsed_ms: u64,
    pub scenarios: Vec<ScenarioReport>,
}

impl SuiteReport {
    /// Builds the suite report. `elapsed_ms` is the wall-clock time of the
    /// whole run, which is less than the sum when scenarios overlap.
    #[must_use]
    pub fn new(results: &[RunResult], elapsed_ms: u64) -> Self {
        let count = |status: RunStatus| results.iter().filter(|r| r.status == status).count();

        Self {
            total: results.len(),
            passed: count(RunStatus::Passed),
            failed: count(RunStatus::Failed),
            timed_out: count(RunStatus::TimedOut),
            cancelled: count(RunStatus::Cancelled),
            elapsed_ms,
            scenarios: results.iter().map(ScenarioReport::from).collect(),
        }
    }

    /// True when every scenario passed.
    #[must_use]
    pub fn success(&self) -> bool {
        self.passed == self.total
    }

    /// Pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl From<&[RunResult]> for SuiteReport {
    fn from(results: &[RunResult]) -> Self {
        let elapsed_ms = results.iter().map(|r| r.elapsed_ms).max().unwrap_or_default();
        Self::new(results, elapsed_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(index: usize, passed: bool, failure: Option<Failure>) -> StepOutcome {
        StepOutcome {
            phase: Phase::Steps,
            index,
            description: format!("step {index}"),
            passed,
            expected: failure.as_ref().and_then(|f| f.expected().map(str::to_string)),
            actual: failure.as_ref().and_then(|f| f.actual().map(str::to_string)),
            elapsed_ms: 5,
            failure,
        }
    }

    fn result(name: &str, status: RunStatus) -> RunResult {
        RunResult {
            scenario: name.to_string(),
            status,
            setup: Vec::new(),
            steps: vec![outcome(0, true, None)],
            failure: None,
            failed_step: None,
            elapsed_ms: 20,
            artifacts: Vec::new(),
            console_errors: Vec::new(),
        }
    }

    #[test]
    fn failed_scenario_report_carries_diagnostics() {
        let failure = Failure::ActionTimeout {
            locator: r#"role=link[name="€9.99 €999.99"]"#.to_string(),
            expected: "attached, visible and stable".to_string(),
            timeout_ms: 5000,
            last_state: "not attached".to_string(),
        };
        let mut run = result("checkout", RunStatus::Failed);
        run.steps.push(outcome(1, false, Some(failure.clone())));
        run.failure = Some(failure);
        run.failed_step = Some(StepRef {
            phase: Phase::Steps,
            index: 1,
        });

        let report = ScenarioReport::from(&run);
        assert_eq!(report.failure_kind.as_deref(), Some("action_timeout"));
        assert_eq!(report.root_kind, None);
        assert!(report.summary.unwrap().contains("€9.99 €999.99"));
        assert_eq!(report.steps[1].actual.as_deref(), Some("not attached"));
        assert_eq!(
            report.steps[1].expected.as_deref(),
            Some("attached, visible and stable")
        );
    }

    #[test]
    fn setup_failure_keeps_its_kind() {
        let failure = Failure::SetupFailure {
            step: Some(0),
            cause: Box::new(Failure::NavigationFailure {
                url: "http://shop.test/".to_string(),
                reason: "net::ERR_CONNECTION_REFUSED".to_string(),
            }),
        };
        let mut run = result("checkout", RunStatus::Failed);
        run.steps.clear();
        run.setup.push(outcome(0, false, Some(failure.clone())));
        run.failure = Some(failure);

        let report = ScenarioReport::from(&run);
        assert_eq!(report.failure_kind.as_deref(), Some("setup_failure"));
        assert_eq!(report.root_kind.as_deref(), Some("navigation_failure"));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["failureKind"], "setup_failure");
        assert_eq!(json["rootKind"], "navigation_failure");
    }

    #[test]
    fn timed_out_summary_names_step() {
        let mut run = result("checkout", RunStatus::TimedOut);
        run.failed_step = Some(StepRef {
            phase: Phase::Setup,
            index: 2,
        });
        let report = ScenarioReport::from(&run);
        assert_eq!(report.summary.as_deref(), Some("scenario timed out during setup 2"));
        assert!(report.failure_kind.is_none());
    }

    #[test]
    fn suite_totals_per_status() {
        let results = vec![
            result("a", RunStatus::Passed),
            result("b", RunStatus::Failed),
            result("c", RunStatus::Cancelled),
            result("d", RunStatus::Passed),
        ];
        let suite = SuiteReport::new(&results, 42);
        assert_eq!(suite.total, 4);
        assert_eq!(suite.passed, 2);
        assert_eq!(suite.failed, 1);
        assert_eq!(suite.cancelled, 1);
        assert_eq!(suite.timed_out, 0);
        assert!(!suite.success());
        assert_eq!(
            suite.scenarios.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(),
            vec!["a", "b", "c", "d"]
        );
    }

    #[test]
    fn json_uses_camel_case_and_skips_empty_fields() {
        let suite = SuiteReport::from(&[result("a", RunStatus::Passed)][..]);
        assert!(suite.success());

        let json: serde_json::Value = serde_json::from_str(&suite.to_json().unwrap()).unwrap();
        assert_eq!(json["timedOut"], 0);
        assert_eq!(json["scenarios"][0]["status"], "passed");
        assert_eq!(json["scenarios"][0]["elapsedMs"], 20);
        assert!(json["scenarios"][0].get("summary").is_none());
        assert!(json["scenarios"][0].get("artifacts").is_none());
    }

    #[test]
    fn empty_suite_is_successful() {
        assert!(SuiteReport::new(&[], 0).success());
    }
}
