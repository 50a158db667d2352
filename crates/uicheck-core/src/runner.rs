//! Scenario execution.
//!
//! One run walks a small state machine:
//!
//! ```text
//! Idle -> SettingUp(i) -> Running(i) -> Passed | Failed | TimedOut | Cancelled
//! ```
//!
//! Opening the page counts as setup. The first failing step ends the run.
//! A global budget bounds the whole run and a cancellation token aborts it;
//! either way the in-flight wait is dropped and the page is closed. Panics in
//! step execution are caught and reported as internal failures.

use crate::action::ActionExecutor;
use crate::assertion::AssertionEngine;
use crate::config::RunnerConfig;
use crate::error::Failure;
use crate::scenario::{Action, Scenario, Step};
use crate::surface::{PageFactory, PageSurface};
use crate::wait::millis;
use futures::{FutureExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Where a step was declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Setup,
    Steps,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Setup => f.write_str("setup"),
            Self::Steps => f.write_str("step"),
        }
    }
}

/// A step position within a scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRef {
    pub phase: Phase,
    pub index: usize,
}

impl fmt::Display for StepRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.phase, self.index)
    }
}

/// Progress of a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    SettingUp(usize),
    Running(usize),
    Passed,
    Failed(StepRef),
    TimedOut,
    Cancelled,
}

impl RunState {
    /// The step being executed, if any.
    #[must_use]
    pub fn in_flight(&self) -> Option<StepRef> {
        match *self {
            Self::SettingUp(index) => Some(StepRef {
                phase: Phase::Setup,
                index,
            }),
            Self::Running(index) => Some(StepRef {
                phase: Phase::Steps,
                index,
            }),
            _ => None,
        }
    }
}

/// Terminal status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Passed,
    Failed,
    TimedOut,
    Cancelled,
}

impl RunStatus {
    #[must_use]
    pub fn is_passed(self) -> bool {
        self == Self::Passed
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::TimedOut => "timed out",
            Self::Cancelled => "cancelled",
        })
    }
}

/// Result of one executed step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub phase: Phase,
    pub index: usize,
    pub description: String,
    pub passed: bool,
    pub expected: Option<String>,
    pub actual: Option<String>,
    pub elapsed_ms: u64,
    pub failure: Option<Failure>,
}

/// Everything known about one scenario execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    pub scenario: String,
    pub status: RunStatus,
    pub setup: Vec<StepOutcome>,
    pub steps: Vec<StepOutcome>,
    pub failure: Option<Failure>,
    /// The step that failed, or that was in flight when the run timed out
    /// or was cancelled.
    pub failed_step: Option<StepRef>,
    pub elapsed_ms: u64,
    /// Screenshots written for this run.
    pub artifacts: Vec<PathBuf>,
    pub console_errors: Vec<String>,
}

impl RunResult {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.status.is_passed()
    }
}

#[derive(Debug)]
struct Progress {
    state: RunState,
    setup: Vec<StepOutcome>,
    steps: Vec<StepOutcome>,
    failure: Option<Failure>,
}

impl Progress {
    fn new() -> Self {
        Self {
            state: RunState::Idle,
            setup: Vec::new(),
            steps: Vec::new(),
            failure: None,
        }
    }
}

enum Interruption {
    Completed,
    TimedOut,
    Cancelled,
    Panicked(String),
}

/// Executes scenarios against pages from a [`PageFactory`].
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    config: RunnerConfig,
}

impl ScenarioRunner {
    #[must_use]
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Runs one scenario to completion.
    pub async fn run(&self, scenario: &Scenario, factory: &dyn PageFactory) -> RunResult {
        self.run_with_cancel(scenario, factory, &CancellationToken::new())
            .await
    }

    /// Runs one scenario, aborting promptly when `cancel` fires.
    pub async fn run_with_cancel(
        &self,
        scenario: &Scenario,
        factory: &dyn PageFactory,
        cancel: &CancellationToken,
    ) -> RunResult {
        let start = Instant::now();
        let budget = scenario.timeout().unwrap_or(self.config.scenario_timeout);
        let deadline = start + budget;
        info!("Running scenario '{}'", scenario.name);

        let opened = tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            opened = tokio::time::timeout_at(deadline, factory.open_page()) => Some(opened),
        };
        let page = match opened {
            None => {
                return self.finish_without_page(scenario, start, RunStatus::Cancelled, None);
            }
            Some(Err(_)) => {
                return self.finish_without_page(scenario, start, RunStatus::TimedOut, None);
            }
            Some(Ok(Err(err))) => {
                let failure = Failure::SetupFailure {
                    step: None,
                    cause: Box::new(Failure::internal(format!("could not open page: {err}"))),
                };
                return self.finish_without_page(scenario, start, RunStatus::Failed, Some(failure));
            }
            Some(Ok(Ok(page))) => page,
        };

        let mut progress = Progress::new();
        let interruption = tokio::select! {
            biased;
            () = cancel.cancelled() => Interruption::Cancelled,
            driven = tokio::time::timeout_at(
                deadline,
                AssertUnwindSafe(self.drive(scenario, page.as_ref(), &mut progress)).catch_unwind(),
            ) => match driven {
                Err(_) => Interruption::TimedOut,
                Ok(Err(payload)) => Interruption::Panicked(panic_message(payload.as_ref())),
                Ok(Ok(())) => Interruption::Completed,
            },
        };

        let in_flight = progress.state.in_flight();
        let (status, failure, failed_step) = match interruption {
            Interruption::Completed => match progress.state {
                RunState::Failed(step) => (RunStatus::Failed, progress.failure.take(), Some(step)),
                _ => (RunStatus::Passed, None, None),
            },
            Interruption::TimedOut => {
                warn!(
                    "Scenario '{}' timed out after {}ms",
                    scenario.name,
                    millis(budget)
                );
                (RunStatus::TimedOut, None, in_flight)
            }
            Interruption::Cancelled => (RunStatus::Cancelled, None, in_flight),
            Interruption::Panicked(message) => {
                let cause = Failure::internal(format!("step panicked: {message}"));
                let failure = match in_flight {
                    Some(StepRef {
                        phase: Phase::Setup,
                        index,
                    }) => Failure::SetupFailure {
                        step: Some(index),
                        cause: Box::new(cause),
                    },
                    _ => cause,
                };
                (RunStatus::Failed, Some(failure), in_flight)
            }
        };

        let console_errors = page.console_errors();
        let mut artifacts = Vec::new();
        if matches!(status, RunStatus::Failed | RunStatus::TimedOut) {
            if let Some(path) = self.capture(scenario, page.as_ref(), failed_step).await {
                artifacts.push(path);
            }
        }

        if let Err(err) = page.close().await {
            warn!("Failed to close page for '{}': {}", scenario.name, err);
        }

        let result = RunResult {
            scenario: scenario.name.clone(),
            status,
            setup: progress.setup,
            steps: progress.steps,
            failure,
            failed_step,
            elapsed_ms: millis(start.elapsed()),
            artifacts,
            console_errors,
        };
        info!(
            "Scenario '{}' {} in {}ms",
            result.scenario, result.status, result.elapsed_ms
        );
        result
    }

    /// Runs scenarios concurrently, at most `jobs` at a time, each on its
    /// own page. Results come back in input order.
    pub async fn run_all(
        &self,
        scenarios: &[Scenario],
        factory: &dyn PageFactory,
        jobs: usize,
        cancel: &CancellationToken,
    ) -> Vec<RunResult> {
        futures::stream::iter(scenarios)
            .map(|scenario| self.run_with_cancel(scenario, factory, cancel))
            .buffered(jobs.max(1))
            .collect()
            .await
    }

    async fn drive(&self, scenario: &Scenario, page: &dyn PageSurface, progress: &mut Progress) {
        for (index, step) in scenario.setup.iter().enumerate() {
            progress.state = RunState::SettingUp(index);
            let outcome = self.execute(page, Phase::Setup, index, step).await;
            let failure = outcome.failure.clone();
            progress.setup.push(outcome);

            if let Some(cause) = failure {
                progress.failure = Some(Failure::SetupFailure {
                    step: Some(index),
                    cause: Box::new(cause),
                });
                progress.state = RunState::Failed(StepRef {
                    phase: Phase::Setup,
                    index,
                });
                return;
            }
        }

        for (index, step) in scenario.steps.iter().enumerate() {
            progress.state = RunState::Running(index);
            let outcome = self.execute(page, Phase::Steps, index, step).await;
            let failure = outcome.failure.clone();
            progress.steps.push(outcome);

            if let Some(cause) = failure {
                progress.failure = Some(cause);
                progress.state = RunState::Failed(StepRef {
                    phase: Phase::Steps,
                    index,
                });
                return;
            }
        }

        progress.state = RunState::Passed;
    }

    async fn execute(
        &self,
        page: &dyn PageSurface,
        phase: Phase,
        index: usize,
        step: &Step,
    ) -> StepOutcome {
        let start = Instant::now();
        debug!("{phase} {index}: {step}");

        let actions = ActionExecutor::new(page, &self.config);
        let result = match step {
            Step::Navigate { url } => actions
                .navigate(url)
                .await
                .map(|()| (None, Some(self.config.url(url)))),
            Step::Interact { locator, action } => match action {
                Action::Click => actions.click(locator).await.map(|()| (None, None)),
                Action::WaitFor => actions.wait_for(locator).await.map(|()| (None, None)),
                Action::ClickIfVisible => actions.click_if_visible(locator).await.map(|clicked| {
                    let actual = if clicked {
                        "clicked"
                    } else {
                        "not visible, skipped"
                    };
                    (None, Some(actual.to_string()))
                }),
            },
            Step::Assert { locator, expect } => AssertionEngine::new(page, &self.config)
                .evaluate(locator, expect)
                .await
                .map(|result| (Some(result.expected), result.actual)),
        };

        let elapsed_ms = millis(start.elapsed());
        match result {
            Ok((expected, actual)) => StepOutcome {
                phase,
                index,
                description: step.to_string(),
                passed: true,
                expected,
                actual,
                elapsed_ms,
                failure: None,
            },
            Err(failure) => {
                debug!("{phase} {index} failed: {failure}");
                StepOutcome {
                    phase,
                    index,
                    description: step.to_string(),
                    passed: false,
                    expected: failure.expected().map(str::to_string),
                    actual: failure.actual().map(str::to_string),
                    elapsed_ms,
                    failure: Some(failure),
                }
            }
        }
    }

    /// Writes a screenshot into the artifacts directory. Capture problems
    /// are logged, never reported as step failures.
    async fn capture(
        &self,
        scenario: &Scenario,
        page: &dyn PageSurface,
        step: Option<StepRef>,
    ) -> Option<PathBuf> {
        if !self.config.screenshot_on_failure {
            return None;
        }
        let dir = self.config.artifacts_dir.as_ref()?;

        let bytes = match page.screenshot().await {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!("Could not capture screenshot for '{}': {}", scenario.name, err);
                return None;
            }
        };

        let file_name = match step {
            Some(StepRef {
                phase: Phase::Setup,
                index,
            }) => format!("{}-setup{index}.png", scenario.slug()),
            Some(StepRef {
                phase: Phase::Steps,
                index,
            }) => format!("{}-step{index}.png", scenario.slug()),
            None => format!("{}.png", scenario.slug()),
        };
        let path = dir.join(file_name);

        let written = async {
            tokio::fs::create_dir_all(dir).await?;
            tokio::fs::write(&path, bytes).await
        }
        .await;
        match written {
            Ok(()) => {
                debug!("Screenshot saved to {}", path.display());
                Some(path)
            }
            Err(err) => {
                warn!("Could not write screenshot {}: {}", path.display(), err);
                None
            }
        }
    }

    fn finish_without_page(
        &self,
        scenario: &Scenario,
        start: Instant,
        status: RunStatus,
        failure: Option<Failure>,
    ) -> RunResult {
        if let Some(failure) = &failure {
            warn!("Scenario '{}' could not start: {}", scenario.name, failure);
        }
        RunResult {
            scenario: scenario.name.clone(),
            status,
            setup: Vec::new(),
            steps: Vec::new(),
            failure,
            failed_step: None,
            elapsed_ms: millis(start.elapsed()),
            artifacts: Vec::new(),
            console_errors: Vec::new(),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::{Locator, LocatorHandle};
    use crate::testing::{FakeElement, FakeFactory, FakePage, Mutation};
    use std::time::Duration;
    use tempfile::TempDir;

    fn config() -> RunnerConfig {
        RunnerConfig::new("http://shop.test")
            .with_default_timeout(Duration::from_secs(1))
            .with_poll_interval(Duration::from_millis(100))
    }

    fn accept() -> Locator {
        Locator::role_named("button", "Accept all")
    }

    fn add_to_cart() -> Locator {
        Locator::role_named("button", "Add to cart")
    }

    fn cart() -> Locator {
        Locator::css("#cart-summary")
    }

    fn shop() -> FakePage {
        FakePage::new()
            .with_element(&accept(), FakeElement::visible("Accept all"))
            .on_click(&accept(), Mutation::remove(&accept()))
            .with_element(&add_to_cart(), FakeElement::visible("Add to cart"))
            .on_click(&add_to_cart(), Mutation::show(&cart(), FakeElement::visible("1 item")))
    }

    fn scenario() -> Scenario {
        Scenario::new("add to cart")
            .setup(Step::navigate("/"))
            .setup(Step::click_if_visible(accept()))
            .step(Step::click(add_to_cart()))
            .step(Step::expect_visible(cart()))
            .step(Step::expect_text(cart(), "1 item"))
    }

    #[tokio::test(start_paused = true)]
    async fn passing_scenario_records_every_step_in_order() {
        let factory = FakeFactory::new(shop);
        let result = ScenarioRunner::new(config()).run(&scenario(), &factory).await;

        assert_eq!(result.status, RunStatus::Passed);
        assert!(result.failure.is_none());
        assert_eq!(result.setup.len(), 2);
        assert_eq!(result.setup[1].actual.as_deref(), Some("clicked"));
        assert_eq!(
            result.steps.iter().map(|s| s.index).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        assert!(result.steps.iter().all(|s| s.passed));
        assert_eq!(result.steps[2].actual.as_deref(), Some("1 item"));
        assert!(factory.all_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn first_failure_stops_the_run() {
        let scenario = Scenario::new("missing price")
            .setup(Step::navigate("/"))
            .step(Step::click(Locator::role_named("link", "€9.99 €999.99")))
            .step(Step::expect_visible(cart()));
        let factory = FakeFactory::new(shop);

        let result = ScenarioRunner::new(config()).run(&scenario, &factory).await;

        assert_eq!(result.status, RunStatus::Failed);
        assert_eq!(result.steps.len(), 1);
        assert_eq!(
            result.failed_step,
            Some(StepRef {
                phase: Phase::Steps,
                index: 0
            })
        );
        assert!(matches!(result.failure, Some(Failure::ActionTimeout { .. })));
        assert_eq!(result.steps[0].actual.as_deref(), Some("not attached"));
        assert!(factory.all_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn setup_failure_skips_all_steps() {
        let factory = FakeFactory::new(|| FakePage::new().failing_navigation("http://shop.test/"));
        let result = ScenarioRunner::new(config()).run(&scenario(), &factory).await;

        assert_eq!(result.status, RunStatus::Failed);
        assert!(result.steps.is_empty());
        assert_eq!(result.setup.len(), 1);
        match result.failure {
            Some(Failure::SetupFailure { step, ref cause }) => {
                assert_eq!(step, Some(0));
                assert!(matches!(**cause, Failure::NavigationFailure { .. }));
            }
            ref other => panic!("unexpected failure: {other:?}"),
        }
        assert!(factory.all_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn unavailable_browser_is_a_setup_failure() {
        let factory = FakeFactory::failing();
        let result = ScenarioRunner::new(config()).run(&scenario(), &factory).await;

        assert_eq!(result.status, RunStatus::Failed);
        assert!(matches!(
            result.failure,
            Some(Failure::SetupFailure { step: None, .. })
        ));
        assert!(result.setup.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn global_timeout_records_in_flight_step() {
        let config = config().with_default_timeout(Duration::from_secs(30));
        let scenario = scenario()
            .step(Step::expect_visible(Locator::css("#never")))
            .with_timeout(Duration::from_secs(5));
        let factory = FakeFactory::new(shop);

        let start = Instant::now();
        let result = ScenarioRunner::new(config).run(&scenario, &factory).await;

        assert_eq!(start.elapsed(), Duration::from_secs(5));
        assert_eq!(result.status, RunStatus::TimedOut);
        assert_eq!(
            result.failed_step,
            Some(StepRef {
                phase: Phase::Steps,
                index: 3
            })
        );
        assert_eq!(result.steps.len(), 3);
        assert!(factory.all_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn conditional_dismiss_without_banner_adds_no_delay() {
        let factory = FakeFactory::new(|| {
            FakePage::new().with_element(&cart(), FakeElement::visible("0 items"))
        });
        let scenario = Scenario::new("no banner")
            .setup(Step::click_if_visible(accept()))
            .step(Step::expect_visible(cart()));

        let start = Instant::now();
        let result = ScenarioRunner::new(config()).run(&scenario, &factory).await;

        assert!(result.passed());
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(result.setup[0].actual.as_deref(), Some("not visible, skipped"));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_closes_the_page() {
        let factory = FakeFactory::new(shop);
        let scenario = scenario().step(Step::expect_visible(Locator::css("#never")));
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            trigger.cancel();
        });

        let start = Instant::now();
        let result = ScenarioRunner::new(config())
            .run_with_cancel(&scenario, &factory, &cancel)
            .await;

        assert_eq!(result.status, RunStatus::Cancelled);
        assert!(start.elapsed() < Duration::from_secs(1));
        assert!(result.artifacts.is_empty());
        assert!(factory.all_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn already_cancelled_run_never_opens_a_page() {
        let factory = FakeFactory::new(shop);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = ScenarioRunner::new(config())
            .run_with_cancel(&scenario(), &factory, &cancel)
            .await;

        assert_eq!(result.status, RunStatus::Cancelled);
        assert!(factory.opened().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn panic_is_reported_and_page_closed() {
        let factory = FakeFactory::new(|| shop().panicking_on_click(&add_to_cart()));
        let result = ScenarioRunner::new(config()).run(&scenario(), &factory).await;

        assert_eq!(result.status, RunStatus::Failed);
        match &result.failure {
            Some(Failure::Internal { message }) => assert!(message.contains("scripted panic")),
            other => panic!("unexpected failure: {other:?}"),
        }
        assert_eq!(
            result.failed_step,
            Some(StepRef {
                phase: Phase::Steps,
                index: 0
            })
        );
        assert!(factory.all_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn failure_captures_screenshot_and_console_errors() {
        let dir = TempDir::new().unwrap();
        let config = config().with_artifacts_dir(dir.path());
        let factory =
            FakeFactory::new(|| shop().with_console_error("Uncaught TypeError: cart is undefined"));
        let scenario = scenario().step(Step::expect_text(cart(), "2 items"));

        let result = ScenarioRunner::new(config).run(&scenario, &factory).await;

        assert_eq!(result.status, RunStatus::Failed);
        assert_eq!(result.artifacts, vec![dir.path().join("add-to-cart-step3.png")]);
        assert!(result.artifacts[0].exists());
        assert_eq!(
            result.console_errors,
            vec!["Uncaught TypeError: cart is undefined"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn is_visible_is_idempotent_on_unchanged_page() {
        let page = shop();
        let handle = LocatorHandle::new(&page, accept());
        assert_eq!(handle.is_visible().await, handle.is_visible().await);
        assert!(handle.is_visible().await);
    }

    #[tokio::test(start_paused = true)]
    async fn run_all_isolates_pages_and_keeps_order() {
        let factory = FakeFactory::new(shop);
        let scenarios = vec![
            scenario(),
            Scenario::new("slow failure")
                .step(Step::expect_visible(Locator::css("#never"))),
            Scenario::new("fresh page")
                .setup(Step::navigate("/"))
                .step(Step::expect_visible(accept())),
        ];

        let start = Instant::now();
        let results = ScenarioRunner::new(config())
            .run_all(&scenarios, &factory, 3, &CancellationToken::new())
            .await;

        assert!(start.elapsed() < Duration::from_secs(2));
        let names: Vec<_> = results.iter().map(|r| r.scenario.as_str()).collect();
        assert_eq!(names, vec!["add to cart", "slow failure", "fresh page"]);
        assert_eq!(
            results.iter().map(|r| r.status).collect::<Vec<_>>(),
            vec![RunStatus::Passed, RunStatus::Failed, RunStatus::Passed]
        );
        assert_eq!(factory.opened().len(), 3);
        assert!(factory.all_closed());
    }

    #[test]
    fn run_result_serializes_status_snake_case() {
        let result = RunResult {
            scenario: "checkout".into(),
            status: RunStatus::TimedOut,
            setup: Vec::new(),
            steps: Vec::new(),
            failure: None,
            failed_step: None,
            elapsed_ms: 10,
            artifacts: Vec::new(),
            console_errors: Vec::new(),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "timed_out");
    }
}
