//! Runner configuration.
//!
//! File, environment and CLI layering happens in `uicheck-cli`; this is the
//! resolved form the engine consumes.

use crate::wait::{DEFAULT_POLL_INTERVAL, DEFAULT_TIMEOUT, WaitConfig};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Default global budget for one scenario (60 seconds).
pub const DEFAULT_SCENARIO_TIMEOUT: Duration = Duration::from_secs(60);

/// Settings shared by every scenario a runner executes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Base for relative navigation targets.
    pub base_url: String,

    /// Timeout for each action and assertion.
    pub default_timeout: Duration,

    /// Interval between polls.
    pub poll_interval: Duration,

    /// Budget of the existence probe in conditional clicks. Zero means a
    /// single immediate check.
    pub probe_timeout: Duration,

    /// Wall-clock budget of a whole scenario, setup included.
    pub scenario_timeout: Duration,

    /// Capture a screenshot when a scenario does not pass.
    pub screenshot_on_failure: bool,

    /// Where screenshots go. Nothing is written when unset.
    pub artifacts_dir: Option<PathBuf>,
}

impl RunnerConfig {
    /// Defaults with the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    #[must_use]
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_scenario_timeout(mut self, timeout: Duration) -> Self {
        self.scenario_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_artifacts_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifacts_dir = Some(dir.into());
        self
    }

    /// Wait used by actions and assertions.
    #[must_use]
    pub fn wait(&self) -> WaitConfig {
        WaitConfig::new(self.default_timeout, self.poll_interval)
    }

    /// Wait used by the existence probe of conditional clicks.
    #[must_use]
    pub fn probe_wait(&self) -> WaitConfig {
        WaitConfig::new(self.probe_timeout, self.poll_interval)
    }

    /// Resolves a navigation target against the base URL the way a browser
    /// resolves a link: absolute URLs pass through, `/path` replaces the
    /// base path, `path` is relative to the base directory.
    ///
    /// ```ignore
    /// let config = RunnerConfig::new("https://shop.test/app/");
    /// assert_eq!(config.url("/en-ie/mug"), "https://shop.test/en-ie/mug");
    /// assert_eq!(config.url("cart"), "https://shop.test/app/cart");
    /// ```
    ///
    /// An unparseable base leaves the target as given; the navigation then
    /// fails with the backend's reason.
    #[must_use]
    pub fn url(&self, target: &str) -> String {
        Url::parse(&self.base_url)
            .and_then(|base| base.join(target))
            .map_or_else(|_| target.to_string(), String::from)
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            default_timeout: DEFAULT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            probe_timeout: Duration::ZERO,
            scenario_timeout: DEFAULT_SCENARIO_TIMEOUT,
            screenshot_on_failure: true,
            artifacts_dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joining() {
        let config = RunnerConfig::new("http://localhost:3000");
        assert_eq!(config.url("/app"), "http://localhost:3000/app");
        assert_eq!(config.url("app"), "http://localhost:3000/app");
        assert_eq!(config.url("/"), "http://localhost:3000/");

        let with_slash = RunnerConfig::new("http://localhost:3000/");
        assert_eq!(with_slash.url("/app"), "http://localhost:3000/app");
    }

    #[test]
    fn url_resolution_follows_base_path() {
        let config = RunnerConfig::new("https://shop.test/app/");
        assert_eq!(config.url("/x"), "https://shop.test/x");
        assert_eq!(config.url("x"), "https://shop.test/app/x");
        assert_eq!(config.url("../x"), "https://shop.test/x");

        let no_slash = RunnerConfig::new("https://shop.test/app");
        assert_eq!(no_slash.url("x"), "https://shop.test/x");
    }

    #[test]
    fn absolute_urls_pass_through() {
        let config = RunnerConfig::new("http://localhost:3000");
        assert_eq!(config.url("https://shop.test/cart"), "https://shop.test/cart");
        assert_eq!(config.url("about:blank"), "about:blank");
        assert_eq!(
            config.url("data:text/html,hi"),
            "data:text/html,hi"
        );
    }

    #[test]
    fn relative_path_with_colon_is_joined() {
        let config = RunnerConfig::new("http://localhost:3000");
        assert_eq!(config.url("/search?q=a:b"), "http://localhost:3000/search?q=a:b");
    }

    #[test]
    fn waits_follow_settings() {
        let config = RunnerConfig::default()
            .with_default_timeout(Duration::from_secs(2))
            .with_poll_interval(Duration::from_millis(50));
        assert_eq!(config.wait().timeout, Duration::from_secs(2));
        assert_eq!(config.wait().poll_interval, Duration::from_millis(50));
        assert_eq!(config.probe_wait().timeout, Duration::ZERO);
    }
}
