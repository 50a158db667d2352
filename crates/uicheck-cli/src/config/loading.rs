use crate::config::UicheckConfig;
use crate::error::{ConfigError, Result};
use figment::{
    Figment,
    providers::{Env, Format as _, Json, Serialized, Toml},
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Config files picked up from the working directory, in order of preference.
pub const DEFAULT_CONFIG_FILES: &[&str] = &["uicheck.config.toml", "uicheck.config.json"];

/// Settings given on the command line. Only the fields that are set
/// override the other sources.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_timeout_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenario_timeout_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jobs: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot_on_failure: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifacts_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headless: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chrome_path: Option<PathBuf>,
}

impl From<&crate::cli::RunArgs> for ConfigOverrides {
    fn from(args: &crate::cli::RunArgs) -> Self {
        Self {
            base_url: args.base_url.clone(),
            default_timeout_ms: args.timeout,
            scenario_timeout_ms: args.scenario_timeout,
            jobs: args.jobs,
            screenshot_on_failure: args.no_screenshots.then_some(false),
            artifacts_dir: args.artifacts_dir.clone(),
            headless: args.headed.then_some(false),
            chrome_path: args.chrome_path.clone(),
        }
    }
}

impl UicheckConfig {
    /// Load configuration from multiple sources and validate it.
    /// Priority: CLI args > environment variables > config file > defaults
    ///
    /// # Errors
    ///
    /// Fails when an explicit config file is missing or has an unknown
    /// extension, when a source has invalid fields, or when validation fails.
    pub fn load(config_path: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));

        let config_file = match config_path {
            Some(path) if !path.exists() => {
                return Err(ConfigError::NotFound(path.to_path_buf()).into());
            }
            Some(path) => Some(path.to_path_buf()),
            None => DEFAULT_CONFIG_FILES
                .iter()
                .map(Path::new)
                .find(|path| path.exists())
                .map(Path::to_path_buf),
        };

        if let Some(path) = config_file {
            debug!("Loading config from {}", path.display());
            figment = match path.extension().and_then(|ext| ext.to_str()) {
                Some("toml") => figment.merge(Toml::file(path)),
                Some("json") => figment.merge(Json::file(path)),
                _ => return Err(ConfigError::UnsupportedFormat(path).into()),
            };
        }

        // UICHECK_DEFAULT_TIMEOUT_MS -> defaultTimeoutMs
        figment = figment.merge(
            Env::prefixed("UICHECK_")
                .lowercase(false)
                .map(|key| env_key_to_field(key.as_str()).into()),
        );

        figment = figment.merge(Serialized::defaults(overrides));

        let config: Self = figment
            .extract()
            .map_err(|e| ConfigError::Extract(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

/// Maps an environment variable suffix such as `DEFAULT_TIMEOUT_MS` to the
/// camelCase field name `defaultTimeoutMs`.
pub(crate) fn env_key_to_field(key: &str) -> String {
    let mut field = String::with_capacity(key.len());
    for (index, word) in key
        .split('_')
        .filter(|word| !word.is_empty())
        .enumerate()
    {
        let word = word.to_ascii_lowercase();
        if index == 0 {
            field.push_str(&word);
            continue;
        }
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            field.push(first.to_ascii_uppercase());
            field.push_str(chars.as_str());
        }
    }
    field
}
