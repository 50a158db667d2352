//! # uicheck-core
//!
//! The scenario engine behind `uicheck`. It drives ordered user-intent steps
//! against a page through the [`PageSurface`] trait, waits explicitly instead
//! of relying on a browser library's implicit auto-waiting, and turns every
//! run into a structured, serializable result.
//!
//! ## Architecture
//!
//! - **Locator**: typed, declarative element queries, resolved lazily
//! - **ActionExecutor**: navigate, click, wait-for and conditional click
//! - **AssertionEngine**: visibility and text containment with polling
//! - **ScenarioRunner**: setup, ordered steps, global timeout, cancellation
//! - **Reporter**: pure conversion of run results into reports
//!
//! Backends (headless Chrome in `uicheck-chrome`, the in-memory
//! [`testing::FakePage`]) only implement immediate probes and dispatch. All
//! waiting happens here, bounded by [`RunnerConfig`].
//!
//! ## Example
//!
//! ```ignore
//! use uicheck_core::{Locator, RunnerConfig, Scenario, ScenarioRunner, Step};
//!
//! let scenario = Scenario::new("cookie banner")
//!     .setup(Step::navigate("/"))
//!     .step(Step::click_if_visible(Locator::role_named("button", "Accept all")))
//!     .step(Step::expect_visible(Locator::css("#cart-summary")));
//!
//! let runner = ScenarioRunner::new(RunnerConfig::default());
//! let result = runner.run(&scenario, &factory).await;
//! assert!(result.status.is_passed());
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod action;
pub mod assertion;
pub mod config;
pub mod error;
pub mod locator;
pub mod report;
pub mod runner;
pub mod scenario;
pub mod surface;
pub mod wait;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use action::ActionExecutor;
pub use assertion::{AssertionEngine, AssertionResult};
pub use config::{DEFAULT_SCENARIO_TIMEOUT, RunnerConfig};
pub use error::{Failure, ScenarioError, SurfaceError};
pub use locator::{Locator, LocatorHandle, Segment, Selector};
pub use report::{ScenarioReport, StepReport, SuiteReport};
pub use runner::{Phase, RunResult, RunState, RunStatus, ScenarioRunner, StepOutcome, StepRef};
pub use scenario::{Action, Expectation, Scenario, Step, discover, load_all};
pub use surface::{ElementProbe, PageFactory, PageSurface, Rect};
pub use wait::{DEFAULT_POLL_INTERVAL, DEFAULT_TIMEOUT, WaitConfig, WaitTimeout, poll_until};
