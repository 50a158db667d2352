//! Bounded polling, the building block of every wait in the engine.
//!
//! Page state changes asynchronously, so actions and assertions re-check
//! their condition at a fixed interval until it holds or a timeout elapses.
//! Polling is split in two halves:
//!
//! - an async `observe` closure that takes an immediate snapshot, and
//! - a synchronous `decide` closure that turns the snapshot into a value or
//!   keeps waiting. `decide` may carry state between polls (for example the
//!   previous bounding box when checking that an element stopped moving).
//!
//! The last observation is returned on timeout so callers can report what
//! they actually saw. The final sleep is clamped to the remaining budget,
//! which bounds the overshoot to one probe.

use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, sleep};

/// Default timeout for actions and assertions (5 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default poll interval for checking conditions (100ms).
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Configuration for a single wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitConfig {
    /// Maximum time to wait for the condition.
    pub timeout: Duration,

    /// How often to check if the condition is satisfied.
    pub poll_interval: Duration,
}

impl WaitConfig {
    /// Creates a new wait configuration.
    #[must_use]
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout,
            poll_interval,
        }
    }

    /// Creates a config with custom timeout and default poll interval.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new(timeout, DEFAULT_POLL_INTERVAL)
    }

    /// A wait that checks exactly once.
    #[must_use]
    pub fn immediate() -> Self {
        Self::new(Duration::ZERO, DEFAULT_POLL_INTERVAL)
    }
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT, DEFAULT_POLL_INTERVAL)
    }
}

/// A wait that ran out of time.
#[derive(Debug, Clone, PartialEq)]
pub struct WaitTimeout<O> {
    /// The last snapshot taken before giving up.
    pub last: O,
    /// How long the wait actually took.
    pub elapsed: Duration,
    /// How many snapshots were taken.
    pub attempts: u32,
}

/// Polls `observe` until `decide` accepts an observation or the timeout
/// elapses.
///
/// The condition is always checked at least once, even with a zero timeout.
///
/// # Errors
///
/// Returns [`WaitTimeout`] carrying the last observation when the timeout
/// elapses first.
///
/// # Example
///
/// ```ignore
/// let visible = poll_until(
///     WaitConfig::default(),
///     || page.probe(&locator),
///     |probe| matches!(probe, Ok(p) if p.visible).then_some(()),
/// )
/// .await;
/// ```
pub async fn poll_until<O, T, F, Fut, D>(
    config: WaitConfig,
    mut observe: F,
    mut decide: D,
) -> Result<T, WaitTimeout<O>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = O>,
    D: FnMut(&O) -> Option<T>,
{
    let start = Instant::now();
    let mut attempts = 0;

    loop {
        let observation = observe().await;
        attempts += 1;

        if let Some(value) = decide(&observation) {
            return Ok(value);
        }

        let elapsed = start.elapsed();
        if elapsed >= config.timeout {
            return Err(WaitTimeout {
                last: observation,
                elapsed,
                attempts,
            });
        }

        sleep(config.poll_interval.min(config.timeout - elapsed)).await;
    }
}

/// Waits for a boolean condition, ignoring the observation on timeout.
///
/// # Errors
///
/// Returns the elapsed time when the condition never held.
pub async fn wait_for<F, Fut>(condition: F, config: WaitConfig) -> Result<(), Duration>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    poll_until(config, condition, |ready| ready.then_some(()))
        .await
        .map_err(|timeout| timeout.elapsed)
}

/// Whole milliseconds, saturating, for reports.
pub(crate) fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
