//! Interactions with built-in auto-waiting.
//!
//! A click only fires once its target is *actionable*: attached, visible and
//! stable, meaning two consecutive probes report the same bounding box. The
//! executor polls for that state up to the default timeout and retries
//! failed dispatches (the element may detach between probe and click) within
//! the same budget.

use crate::config::RunnerConfig;
use crate::error::{Failure, SurfaceError};
use crate::locator::{Locator, LocatorHandle};
use crate::surface::{ElementProbe, PageSurface, Rect};
use crate::wait::{WaitConfig, millis, poll_until};
use tokio::time::{Instant, sleep};
use tracing::debug;

/// What `click` waits for.
pub const ACTIONABLE: &str = "attached, visible and stable";

/// What `wait_for` waits for.
pub const ATTACHED: &str = "attached";

/// Performs navigations and element interactions against one page.
pub struct ActionExecutor<'a> {
    page: &'a dyn PageSurface,
    config: &'a RunnerConfig,
}

impl<'a> ActionExecutor<'a> {
    #[must_use]
    pub fn new(page: &'a dyn PageSurface, config: &'a RunnerConfig) -> Self {
        Self { page, config }
    }

    /// Lazily binds `locator` to the page.
    #[must_use]
    pub fn locate(&self, locator: &Locator) -> LocatorHandle<'a> {
        LocatorHandle::new(self.page, locator.clone())
    }

    /// Loads `target` (joined to the base URL when relative) and waits for
    /// the load to complete.
    ///
    /// # Errors
    ///
    /// Returns [`Failure::NavigationFailure`] when the page does not load.
    pub async fn navigate(&self, target: &str) -> Result<(), Failure> {
        let url = self.config.url(target);
        debug!(%url, "navigating");

        self.page.goto(&url).await.map_err(|err| match err {
            SurfaceError::Navigation { url, reason } => Failure::NavigationFailure { url, reason },
            other => Failure::NavigationFailure {
                url: url.clone(),
                reason: other.to_string(),
            },
        })
    }

    /// Waits until the first match is actionable, then clicks it.
    ///
    /// # Errors
    ///
    /// Returns [`Failure::ActionTimeout`] with the last observed state when
    /// the element never becomes actionable or every dispatch fails.
    pub async fn click(&self, locator: &Locator) -> Result<(), Failure> {
        let wait = self.config.wait();
        let deadline = Instant::now() + wait.timeout;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if let Err(last_state) = self
                .wait_actionable(locator, WaitConfig::new(remaining, wait.poll_interval))
                .await
            {
                return Err(self.action_timeout(locator, ACTIONABLE, last_state));
            }

            match self.page.click(locator).await {
                Ok(()) => {
                    debug!(%locator, "clicked");
                    return Ok(());
                }
                Err(err) => {
                    debug!(%locator, error = %err, "click dispatch failed, retrying");
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        return Err(self.action_timeout(
                            locator,
                            ACTIONABLE,
                            format!("click dispatch failed: {err}"),
                        ));
                    }
                    sleep(wait.poll_interval.min(remaining)).await;
                }
            }
        }
    }

    /// Waits until at least one element matches.
    ///
    /// # Errors
    ///
    /// Returns [`Failure::ActionTimeout`] when nothing ever matches.
    pub async fn wait_for(&self, locator: &Locator) -> Result<(), Failure> {
        poll_until(
            self.config.wait(),
            || self.page.probe(locator),
            |observed| matches!(observed, Ok(probe) if probe.attached()).then_some(()),
        )
        .await
        .map_err(|timeout| self.action_timeout(locator, ATTACHED, describe(&timeout.last, false)))
    }

    /// Clicks `locator` only if it is visible right now.
    ///
    /// The existence probe uses the probe timeout (a single check by
    /// default), so an absent element costs next to nothing. Returns whether
    /// a click happened.
    ///
    /// # Errors
    ///
    /// Returns [`Failure::ActionTimeout`] when the element was visible but
    /// never became clickable.
    pub async fn click_if_visible(&self, locator: &Locator) -> Result<bool, Failure> {
        let visible = poll_until(
            self.config.probe_wait(),
            || self.page.probe(locator),
            |observed| matches!(observed, Ok(probe) if probe.visible).then_some(()),
        )
        .await
        .is_ok();

        if !visible {
            debug!(%locator, "not visible, skipping conditional click");
            return Ok(false);
        }
        self.click(locator).await.map(|()| true)
    }

    /// Polls until the first match is attached, visible and stable. Returns
    /// the last observed state on timeout.
    async fn wait_actionable(&self, locator: &Locator, wait: WaitConfig) -> Result<(), String> {
        let mut previous: Option<Rect> = None;

        poll_until(
            wait,
            || self.page.probe(locator),
            |observed| match observed {
                Ok(probe) if probe.attached() && probe.visible => {
                    let stable = match (probe.bounds, previous) {
                        (None, _) => true,
                        (Some(now), Some(before)) => now == before,
                        (Some(_), None) => false,
                    };
                    previous = probe.bounds;
                    stable.then_some(())
                }
                _ => {
                    previous = None;
                    None
                }
            },
        )
        .await
        .map_err(|timeout| describe(&timeout.last, true))
    }

    fn action_timeout(&self, locator: &Locator, expected: &str, last_state: String) -> Failure {
        Failure::ActionTimeout {
            locator: locator.to_string(),
            expected: expected.to_string(),
            timeout_ms: millis(self.config.default_timeout),
            last_state,
        }
    }
}

fn describe(observed: &Result<ElementProbe, SurfaceError>, needs_stability: bool) -> String {
    match observed {
        Ok(probe) if needs_stability && probe.visible => format!("{probe} but not stable"),
        Ok(probe) => probe.to_string(),
        Err(err) => format!("probe failed: {err}"),
    }
}
