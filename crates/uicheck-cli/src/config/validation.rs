use crate::config::UicheckConfig;
use crate::error::{ConfigError, Result};

/// Validate that a base URL is absolute http(s).
pub fn validate_base_url(url: &str) -> Result<()> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));
    match rest {
        Some(host) if !host.is_empty() => Ok(()),
        _ => Err(ConfigError::InvalidValue {
            field: "baseUrl".to_string(),
            value: url.to_string(),
            hint: "Must be an absolute http:// or https:// URL".to_string(),
        }
        .into()),
    }
}

fn non_zero(field: &str, value: u64) -> Result<()> {
    if value == 0 {
        return Err(ConfigError::InvalidValue {
            field: field.to_string(),
            value: "0".to_string(),
            hint: "Must be greater than zero".to_string(),
        }
        .into());
    }
    Ok(())
}

impl UicheckConfig {
    /// Validate configuration for logical consistency.
    pub fn validate(&self) -> Result<()> {
        validate_base_url(&self.base_url)?;

        non_zero("defaultTimeoutMs", self.default_timeout_ms)?;
        non_zero("pollIntervalMs", self.poll_interval_ms)?;
        non_zero("scenarioTimeoutMs", self.scenario_timeout_ms)?;
        non_zero("jobs", self.jobs as u64)?;
        non_zero("windowWidth", u64::from(self.window_width))?;
        non_zero("windowHeight", u64::from(self.window_height))?;

        if self.poll_interval_ms > self.default_timeout_ms {
            return Err(ConfigError::ConflictingOptions(format!(
                "pollIntervalMs ({}) is greater than defaultTimeoutMs ({})",
                self.poll_interval_ms, self.default_timeout_ms
            ))
            .into());
        }

        Ok(())
    }
}
