#[cfg(test)]
mod tests {
    use crate::config::loading::env_key_to_field;
    use crate::config::*;
    use crate::error::{CliError, ConfigError};
    use figment::Jail;
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    #[test]
    fn test_defaults_match_the_engine() {
        let config = UicheckConfig::default();
        config.validate().unwrap();

        let runner = config.runner_config();
        assert_eq!(runner.base_url, "http://localhost:3000");
        assert_eq!(runner.default_timeout, Duration::from_secs(5));
        assert_eq!(runner.poll_interval, Duration::from_millis(100));
        assert_eq!(runner.probe_timeout, Duration::ZERO);
        assert_eq!(runner.scenario_timeout, Duration::from_secs(60));
        assert_eq!(runner.artifacts_dir, Some(PathBuf::from("uicheck-results")));
        assert_eq!(config.report_path(), Path::new("uicheck-results/report.json"));
    }

    #[test]
    fn test_serialization() {
        let json_val = serde_json::to_value(UicheckConfig::default()).unwrap();

        // camelCase field names
        assert!(json_val.get("defaultTimeoutMs").is_some());
        assert!(json_val.get("default_timeout_ms").is_none());

        // skip_serializing_if
        assert!(json_val.get("chromePath").is_none());
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let err = serde_json::from_str::<UicheckConfig>(r#"{ "timeout": 5000 }"#).unwrap_err();
        assert!(err.to_string().contains("unknown field"));
    }

    #[test]
    fn test_validation() {
        assert!(
            UicheckConfig {
                base_url: "localhost:3000".to_string(),
                ..UicheckConfig::default()
            }
            .validate()
            .is_err()
        );

        assert!(
            UicheckConfig {
                base_url: "https://www.example-shop.ie".to_string(),
                ..UicheckConfig::default()
            }
            .validate()
            .is_ok()
        );

        assert!(
            UicheckConfig {
                jobs: 0,
                ..UicheckConfig::default()
            }
            .validate()
            .is_err()
        );

        // A zero probe timeout means "check once" and is fine
        assert!(
            UicheckConfig {
                probe_timeout_ms: 0,
                ..UicheckConfig::default()
            }
            .validate()
            .is_ok()
        );

        let err = UicheckConfig {
            default_timeout_ms: 50,
            poll_interval_ms: 100,
            ..UicheckConfig::default()
        }
        .validate()
        .unwrap_err();
        assert!(matches!(
            err,
            CliError::Config(ConfigError::ConflictingOptions(_))
        ));
    }

    #[test]
    fn test_env_key_to_field() {
        assert_eq!(env_key_to_field("DEFAULT_TIMEOUT_MS"), "defaultTimeoutMs");
        assert_eq!(env_key_to_field("JOBS"), "jobs");
        assert_eq!(env_key_to_field("base_url"), "baseUrl");
    }

    #[test]
    fn test_chrome_config() {
        let chrome = UicheckConfig {
            headless: false,
            chrome_path: Some(PathBuf::from("/usr/bin/chromium")),
            window_width: 1280,
            window_height: 720,
            ..UicheckConfig::default()
        }
        .chrome_config();

        assert!(!chrome.headless);
        assert_eq!(chrome.window_size, (1280, 720));
        assert_eq!(chrome.chrome_path, Some(PathBuf::from("/usr/bin/chromium")));
    }

    #[test]
    fn test_load_layers_file_env_and_cli() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "uicheck.config.toml",
                r#"
                baseUrl = "https://shop.test"
                defaultTimeoutMs = 8000
                jobs = 2
                "#,
            )?;
            jail.set_env("UICHECK_JOBS", 3);

            let config = UicheckConfig::load(None, &ConfigOverrides::default()).unwrap();
            assert_eq!(config.base_url, "https://shop.test");
            assert_eq!(config.default_timeout_ms, 8000);
            assert_eq!(config.jobs, 3);

            let overrides = ConfigOverrides {
                jobs: Some(4),
                headless: Some(false),
                ..ConfigOverrides::default()
            };
            let config = UicheckConfig::load(None, &overrides).unwrap();
            assert_eq!(config.jobs, 4);
            assert!(!config.headless);
            assert_eq!(config.default_timeout_ms, 8000);
            Ok(())
        });
    }

    #[test]
    fn test_load_json_config() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "settings.json",
                r#"{ "baseUrl": "http://127.0.0.1:8080", "screenshotOnFailure": false }"#,
            )?;

            let config =
                UicheckConfig::load(Some(Path::new("settings.json")), &ConfigOverrides::default())
                    .unwrap();
            assert_eq!(config.base_url, "http://127.0.0.1:8080");
            assert!(!config.screenshot_on_failure);
            Ok(())
        });
    }

    #[test]
    fn test_load_errors() {
        Jail::expect_with(|jail| {
            let err = UicheckConfig::load(Some(Path::new("missing.toml")), &ConfigOverrides::default())
                .unwrap_err();
            assert!(matches!(err, CliError::Config(ConfigError::NotFound(_))));

            jail.create_file("uicheck.yaml", "jobs: 2")?;
            let err = UicheckConfig::load(Some(Path::new("uicheck.yaml")), &ConfigOverrides::default())
                .unwrap_err();
            assert!(matches!(err, CliError::Config(ConfigError::UnsupportedFormat(_))));

            jail.create_file("uicheck.config.toml", "jobs = \"many\"")?;
            let err = UicheckConfig::load(None, &ConfigOverrides::default()).unwrap_err();
            assert!(matches!(err, CliError::Config(ConfigError::Extract(_))));
            Ok(())
        });
    }

    #[test]
    fn test_loaded_config_is_validated() {
        Jail::expect_with(|jail| {
            jail.set_env("UICHECK_BASE_URL", "ftp://shop.test");
            let err = UicheckConfig::load(None, &ConfigOverrides::default()).unwrap_err();
            assert!(err.to_string().contains("baseUrl"));
            Ok(())
        });
    }

    #[test]
    fn test_schema_lists_options() {
        let schema = UicheckConfig::json_schema().unwrap();
        let properties = schema.get("properties").unwrap();
        for field in ["baseUrl", "defaultTimeoutMs", "probeTimeoutMs", "jobs", "chromePath"] {
            assert!(properties.get(field).is_some(), "missing {field}");
        }
    }
}
