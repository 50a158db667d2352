//! Configuration system for uicheck with multi-source loading.
//!
//! Merges settings from CLI args, environment variables, and config files.
//! Priority: CLI > Environment > File > Defaults

mod loading;
mod tests;
mod validation;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use uicheck_chrome::ChromeConfig;
use uicheck_core::RunnerConfig;

pub use loading::{ConfigOverrides, DEFAULT_CONFIG_FILES};

/// uicheck configuration - loaded from uicheck.config.toml / .json,
/// `UICHECK_*` environment variables and CLI flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct UicheckConfig {
    /// Base URL that relative `navigate` targets are resolved against
    pub base_url: String,

    /// Timeout for each action and assertion, in milliseconds
    #[schemars(range(min = 1))]
    pub default_timeout_ms: u64,

    /// Interval between polls while waiting, in milliseconds
    #[schemars(range(min = 1))]
    pub poll_interval_ms: u64,

    /// How long `click_if_visible` looks for its target before skipping it,
    /// in milliseconds (0 = a single immediate check)
    pub probe_timeout_ms: u64,

    /// Wall-clock budget for one scenario, setup included, in milliseconds
    #[schemars(range(min = 1))]
    pub scenario_timeout_ms: u64,

    /// Number of scenarios to run concurrently
    #[schemars(range(min = 1))]
    pub jobs: usize,

    /// Capture a screenshot when a scenario does not pass
    pub screenshot_on_failure: bool,

    /// Directory for screenshots and the JSON report
    pub artifacts_dir: PathBuf,

    /// Run Chrome without a window
    pub headless: bool,

    /// Chrome executable (auto-detected when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chrome_path: Option<PathBuf>,

    /// Browser window width in pixels
    #[schemars(range(min = 1))]
    pub window_width: u32,

    /// Browser window height in pixels
    #[schemars(range(min = 1))]
    pub window_height: u32,
}

impl Default for UicheckConfig {
    fn default() -> Self {
        let runner = RunnerConfig::default();
        Self {
            base_url: runner.base_url,
            default_timeout_ms: millis(runner.default_timeout),
            poll_interval_ms: millis(runner.poll_interval),
            probe_timeout_ms: millis(runner.probe_timeout),
            scenario_timeout_ms: millis(runner.scenario_timeout),
            jobs: 1,
            screenshot_on_failure: runner.screenshot_on_failure,
            artifacts_dir: PathBuf::from("uicheck-results"),
            headless: true,
            chrome_path: None,
            window_width: 1920,
            window_height: 1080,
        }
    }
}

impl UicheckConfig {
    /// Generate JSON Schema for the config file.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn json_schema() -> Result<serde_json::Value, serde_json::Error> {
        let schema = schemars::schema_for!(UicheckConfig);
        serde_json::to_value(schema)
    }

    /// Engine settings.
    #[must_use]
    pub fn runner_config(&self) -> RunnerConfig {
        RunnerConfig {
            base_url: self.base_url.clone(),
            default_timeout: Duration::from_millis(self.default_timeout_ms),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            probe_timeout: Duration::from_millis(self.probe_timeout_ms),
            scenario_timeout: Duration::from_millis(self.scenario_timeout_ms),
            screenshot_on_failure: self.screenshot_on_failure,
            artifacts_dir: Some(self.artifacts_dir.clone()),
        }
    }

    /// Browser launch settings.
    #[must_use]
    pub fn chrome_config(&self) -> ChromeConfig {
        let mut config =
            ChromeConfig::default().with_window_size(self.window_width, self.window_height);
        if !self.headless {
            config = config.visible();
        }
        if let Some(path) = &self.chrome_path {
            config = config.with_chrome_path(path);
        }
        config
    }

    /// Where `uicheck run` writes its report unless `--report` says otherwise.
    #[must_use]
    pub fn report_path(&self) -> PathBuf {
        self.artifacts_dir.join("report.json")
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
