//! Polling assertions.
//!
//! Assertions re-probe at the poll interval until the condition holds or the
//! default timeout elapses. A failed assertion reports the last value it
//! actually saw, which is usually the fastest way to diagnose it.

use crate::config::RunnerConfig;
use crate::error::{Failure, SurfaceError};
use crate::locator::{Locator, contains_text};
use crate::scenario::Expectation;
use crate::surface::{ElementProbe, PageSurface};
use crate::wait::{millis, poll_until};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Outcome of an assertion that passed. Kept for reporting only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionResult {
    pub passed: bool,
    pub expected: String,
    pub actual: Option<String>,
    /// Probes taken before the condition held.
    pub attempts: u32,
}

/// Evaluates expectations against one page.
pub struct AssertionEngine<'a> {
    page: &'a dyn PageSurface,
    config: &'a RunnerConfig,
}

impl<'a> AssertionEngine<'a> {
    #[must_use]
    pub fn new(page: &'a dyn PageSurface, config: &'a RunnerConfig) -> Self {
        Self { page, config }
    }

    /// Waits until the first match is visible.
    ///
    /// # Errors
    ///
    /// Returns [`Failure::AssertionTimeout`] when it never becomes visible.
    pub async fn expect_visible(&self, locator: &Locator) -> Result<AssertionResult, Failure> {
        self.evaluate(locator, &Expectation::Visible).await
    }

    /// Waits until the text of the first match contains `expected`
    /// (whitespace-normalized, case-sensitive).
    ///
    /// # Errors
    ///
    /// Returns [`Failure::AssertionTimeout`] with the last observed text.
    pub async fn expect_contains_text(
        &self,
        locator: &Locator,
        expected: &str,
    ) -> Result<AssertionResult, Failure> {
        self.evaluate(locator, &Expectation::ContainsText(expected.to_string()))
            .await
    }

    /// Polls until `expectation` holds for `locator`.
    ///
    /// # Errors
    ///
    /// Returns [`Failure::AssertionTimeout`] when the timeout elapses first.
    pub async fn evaluate(
        &self,
        locator: &Locator,
        expectation: &Expectation,
    ) -> Result<AssertionResult, Failure> {
        let mut attempts = 0;
        let outcome = poll_until(
            self.config.wait(),
            || self.page.probe(locator),
            |observed| {
                attempts += 1;
                match observed {
                    Ok(probe) if holds(expectation, probe) => Some(actual(expectation, probe)),
                    _ => None,
                }
            },
        )
        .await;

        match outcome {
            Ok(actual) => {
                debug!(%locator, expected = %expectation, "assertion passed");
                Ok(AssertionResult {
                    passed: true,
                    expected: expectation.to_string(),
                    actual,
                    attempts,
                })
            }
            Err(timeout) => {
                debug!(
                    %locator,
                    expected = %expectation,
                    attempts = timeout.attempts,
                    "assertion timed out"
                );
                Err(Failure::AssertionTimeout {
                    locator: locator.to_string(),
                    expected: expectation.to_string(),
                    actual: last_actual(expectation, &timeout.last),
                    timeout_ms: millis(self.config.default_timeout),
                })
            }
        }
    }
}

fn holds(expectation: &Expectation, probe: &ElementProbe) -> bool {
    match expectation {
        Expectation::Visible => probe.visible,
        Expectation::ContainsText(expected) => probe
            .text
            .as_deref()
            .is_some_and(|text| contains_text(text, expected)),
    }
}

fn actual(expectation: &Expectation, probe: &ElementProbe) -> Option<String> {
    match expectation {
        Expectation::Visible => Some(probe.to_string()),
        Expectation::ContainsText(_) if probe.attached() => probe.text.clone(),
        Expectation::ContainsText(_) => None,
    }
}

fn last_actual(
    expectation: &Expectation,
    observed: &Result<ElementProbe, SurfaceError>,
) -> Option<String> {
    match observed {
        Ok(probe) => actual(expectation, probe),
        Err(err) => Some(format!("probe failed: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeElement, FakePage, Mutation};
    use std::time::Duration;
    use tokio::time::Instant;

    fn config() -> RunnerConfig {
        RunnerConfig::new("http://shop.test")
            .with_default_timeout(Duration::from_millis(1000))
            .with_poll_interval(Duration::from_millis(100))
    }

    #[tokio::test(start_paused = true)]
    async fn visible_passes_immediately() {
        let entry = Locator::text("Ceramic Modern Coffee Mug");
        let page = FakePage::new().with_element(&entry, FakeElement::visible("Ceramic Modern Coffee Mug"));
        let config = config();

        let result = AssertionEngine::new(&page, &config)
            .expect_visible(&entry)
            .await
            .unwrap();
        assert!(result.passed);
        assert_eq!(result.attempts, 1);
        assert_eq!(result.actual.as_deref(), Some("visible"));
    }

    #[tokio::test(start_paused = true)]
    async fn text_containment_normalizes_whitespace() {
        let total = Locator::css("#total");
        let page = FakePage::new().with_element(&total, FakeElement::visible("Total:\n   €494.14 "));
        let config = config();

        let result = AssertionEngine::new(&page, &config)
            .expect_contains_text(&total, "€494.14")
            .await
            .unwrap();
        assert_eq!(result.actual.as_deref(), Some("Total:\n   €494.14 "));
    }

    #[tokio::test(start_paused = true)]
    async fn text_containment_is_case_sensitive() {
        let colour = Locator::css("td");
        let page = FakePage::new().with_element(&colour, FakeElement::visible("red"));
        let config = config();

        let failure = AssertionEngine::new(&page, &config)
            .expect_contains_text(&colour, "Red")
            .await
            .unwrap_err();
        assert!(matches!(
            failure,
            Failure::AssertionTimeout { actual: Some(ref a), .. } if a == "red"
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_is_bounded_by_one_poll_interval() {
        let missing = Locator::css("#never");
        let page = FakePage::new();
        let config = config();

        let start = Instant::now();
        let failure = AssertionEngine::new(&page, &config)
            .expect_visible(&missing)
            .await
            .unwrap_err();
        let elapsed = start.elapsed();

        assert!(elapsed >= config.default_timeout);
        assert!(elapsed <= config.default_timeout + config.poll_interval);
        match failure {
            Failure::AssertionTimeout {
                locator,
                expected,
                actual,
                timeout_ms,
            } => {
                assert_eq!(locator, "css=#never");
                assert_eq!(expected, "to be visible");
                assert_eq!(actual.as_deref(), Some("not attached"));
                assert_eq!(timeout_ms, 1000);
            }
            other => panic!("unexpected failure: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn missing_element_reports_no_text() {
        let page = FakePage::new();
        let config = config();

        let failure = AssertionEngine::new(&page, &config)
            .expect_contains_text(&Locator::css("#total"), "€494.14")
            .await
            .unwrap_err();
        assert!(matches!(failure, Failure::AssertionTimeout { actual: None, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn passes_once_page_catches_up() {
        let total = Locator::css("#total");
        let page = FakePage::new().with_element(&total, FakeElement::visible("€0.00"));
        let config = config();

        let updater = page.clone();
        let target = total.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(350)).await;
            updater.mutate(Mutation::show(&target, FakeElement::visible("€494.14")));
        });

        let result = AssertionEngine::new(&page, &config)
            .expect_contains_text(&total, "€494.14")
            .await
            .unwrap();
        assert!(result.attempts > 1);
    }
}
