//! Scenario definitions and loading.
//!
//! A scenario is data: setup steps, ordered steps and optional parameters.
//! Files are TOML or JSON, chosen by extension:
//!
//! ```toml
//! name = "checkout"
//!
//! [params]
//! product = "Ceramic Modern Coffee Mug"
//!
//! [[setup]]
//! kind = "navigate"
//! url = "/en-ie/ceramicmoderncoffeemug"
//!
//! [[steps]]
//! kind = "interact"
//! action = "click"
//! locator = { role = "link", name = "Red" }
//!
//! [[steps]]
//! kind = "assert"
//! locator = { text = "${product}" }
//! expect = "visible"
//! ```

use crate::error::ScenarioError;
use crate::locator::{Locator, Selector};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use walkdir::WalkDir;

/// What to do with an interaction target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Wait until actionable, then click.
    Click,
    /// Click only if visible right now; skip otherwise.
    ClickIfVisible,
    /// Wait until attached.
    WaitFor,
}

/// What an assertion expects of its target.
///
/// Written as `expect = "visible"` or `expect = { contains_text = "100" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expectation {
    Visible,
    ContainsText(String),
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Visible => f.write_str("to be visible"),
            Self::ContainsText(text) => write!(f, "to contain text \"{text}\""),
        }
    }
}

/// One user-intent step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Step {
    Navigate { url: String },
    Interact { locator: Locator, action: Action },
    Assert { locator: Locator, expect: Expectation },
}

impl Step {
    pub fn navigate(url: impl Into<String>) -> Self {
        Self::Navigate { url: url.into() }
    }

    #[must_use]
    pub fn click(locator: Locator) -> Self {
        Self::Interact {
            locator,
            action: Action::Click,
        }
    }

    #[must_use]
    pub fn click_if_visible(locator: Locator) -> Self {
        Self::Interact {
            locator,
            action: Action::ClickIfVisible,
        }
    }

    #[must_use]
    pub fn wait_for(locator: Locator) -> Self {
        Self::Interact {
            locator,
            action: Action::WaitFor,
        }
    }

    #[must_use]
    pub fn expect_visible(locator: Locator) -> Self {
        Self::Assert {
            locator,
            expect: Expectation::Visible,
        }
    }

    pub fn expect_text(locator: Locator, text: impl Into<String>) -> Self {
        Self::Assert {
            locator,
            expect: Expectation::ContainsText(text.into()),
        }
    }

    /// The element this step targets, if any.
    #[must_use]
    pub fn locator(&self) -> Option<&Locator> {
        match self {
            Self::Navigate { .. } => None,
            Self::Interact { locator, .. } | Self::Assert { locator, .. } => Some(locator),
        }
    }

    /// Every string a `${name}` placeholder may appear in.
    fn texts_mut(&mut self) -> Vec<&mut String> {
        match self {
            Self::Navigate { url } => vec![url],
            Self::Interact { locator, .. } => locator_texts_mut(locator),
            Self::Assert { locator, expect } => {
                let mut texts = locator_texts_mut(locator);
                if let Expectation::ContainsText(text) = expect {
                    texts.push(text);
                }
                texts
            }
        }
    }
}

fn locator_texts_mut(locator: &mut Locator) -> Vec<&mut String> {
    let mut texts = Vec::new();
    for segment in locator.segments_mut() {
        match &mut segment.selector {
            Selector::Role { role, name, .. } => {
                texts.push(role);
                texts.extend(name.as_mut());
            }
            Selector::Text { text, .. } => texts.push(text),
            Selector::Css { css } => texts.push(css),
            Selector::TestId { test_id } => texts.push(test_id),
        }
        texts.extend(segment.has_text.as_mut());
    }
    texts
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Navigate { url } => write!(f, "navigate to {url}"),
            Self::Interact { locator, action } => match action {
                Action::Click => write!(f, "click {locator}"),
                Action::ClickIfVisible => write!(f, "click {locator} if visible"),
                Action::WaitFor => write!(f, "wait for {locator}"),
            },
            Self::Assert { locator, expect } => write!(f, "expect {locator} {expect}"),
        }
    }
}

/// A named sequence of steps with its preconditions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Scenario {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Default values for `${name}` placeholders.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, String>,

    /// Runs before the steps on every execution.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub setup: Vec<Step>,

    #[serde(default)]
    pub steps: Vec<Step>,

    /// Overrides the runner's scenario timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl Scenario {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            tags: Vec::new(),
            params: BTreeMap::new(),
            setup: Vec::new(),
            steps: Vec::new(),
            timeout_ms: None,
        }
    }

    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    #[must_use]
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn setup(mut self, step: Step) -> Self {
        self.setup.push(step);
        self
    }

    #[must_use]
    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Per-scenario timeout override.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// File-name friendly form of the name.
    #[must_use]
    pub fn slug(&self) -> String {
        let slug = self
            .name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_lowercase()
                } else {
                    '-'
                }
            })
            .collect::<String>();
        let slug = slug
            .split('-')
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("-");
        if slug.is_empty() {
            "scenario".to_string()
        } else {
            slug
        }
    }

    /// Parses a TOML scenario without validating it.
    ///
    /// # Errors
    ///
    /// Returns the parser error.
    pub fn from_toml_str(source: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(source)
    }

    /// Parses a JSON scenario without validating it.
    ///
    /// # Errors
    ///
    /// Returns the parser error.
    pub fn from_json_str(source: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(source)
    }

    /// Reads, parses and validates a scenario file.
    ///
    /// # Errors
    ///
    /// Returns a [`ScenarioError`] naming the file on any failure.
    pub fn from_file(path: &Path) -> Result<Self, ScenarioError> {
        let source = std::fs::read_to_string(path).map_err(|source| ScenarioError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let scenario = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_str(&source).map_err(|source| ScenarioError::Toml {
                path: path.to_path_buf(),
                source,
            })?,
            Some("json") => Self::from_json_str(&source).map_err(|source| ScenarioError::Json {
                path: path.to_path_buf(),
                source,
            })?,
            _ => return Err(ScenarioError::UnsupportedFormat(path.to_path_buf())),
        };

        scenario.validate()?;
        Ok(scenario)
    }

    /// Checks structural rules that parsing alone cannot.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::Invalid`] describing the first problem.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        let invalid = |reason: String| ScenarioError::Invalid {
            scenario: self.name.clone(),
            reason,
        };

        if self.name.trim().is_empty() {
            return Err(invalid("name must not be empty".to_string()));
        }
        if self.steps.is_empty() {
            return Err(invalid("at least one step is required".to_string()));
        }
        if self.timeout_ms == Some(0) {
            return Err(invalid("timeoutMs must be greater than zero".to_string()));
        }

        let all = self
            .setup
            .iter()
            .enumerate()
            .map(|(index, step)| ("setup", index, step))
            .chain(
                self.steps
                    .iter()
                    .enumerate()
                    .map(|(index, step)| ("step", index, step)),
            );
        for (phase, index, step) in all {
            match step {
                Step::Navigate { url } if url.trim().is_empty() => {
                    return Err(invalid(format!("{phase} {index}: navigation URL is empty")));
                }
                Step::Assert {
                    expect: Expectation::ContainsText(text),
                    ..
                } if text.is_empty() => {
                    return Err(invalid(format!("{phase} {index}: expected text is empty")));
                }
                _ => {}
            }
            if step.locator().is_some_and(Locator::is_empty) {
                return Err(invalid(format!("{phase} {index}: locator has no segments")));
            }
        }
        Ok(())
    }

    /// Substitutes `${name}` placeholders, with `overrides` taking precedence
    /// over the scenario's own `params`.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::UnknownParam`] for a placeholder with no
    /// value and [`ScenarioError::Invalid`] for an unterminated one.
    pub fn bind(&self, overrides: &BTreeMap<String, String>) -> Result<Self, ScenarioError> {
        let mut bound = self.clone();
        bound
            .params
            .extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));

        let params = bound.params.clone();
        for step in bound.setup.iter_mut().chain(bound.steps.iter_mut()) {
            for text in step.texts_mut() {
                let value = substitute(text, &params, &self.name)?;
                *text = value;
            }
        }
        Ok(bound)
    }
}

fn substitute(
    input: &str,
    params: &BTreeMap<String, String>,
    scenario: &str,
) -> Result<String, ScenarioError> {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            return Err(ScenarioError::Invalid {
                scenario: scenario.to_string(),
                reason: format!("unterminated placeholder in \"{input}\""),
            });
        };
        let name = after[..end].trim();
        let value = params.get(name).ok_or_else(|| ScenarioError::UnknownParam {
            scenario: scenario.to_string(),
            name: name.to_string(),
        })?;
        out.push_str(value);
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    Ok(out)
}

fn is_scenario_file(path: &Path) -> bool {
    let is_config = path
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with("uicheck.config."));
    let has_extension = matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("toml" | "json")
    );
    has_extension && !is_config
}

/// Expands files and directories into scenario file paths.
///
/// Directories are walked recursively in file-name order; hidden entries
/// and `uicheck.config.*` files are skipped. Explicit file paths are kept
/// as given.
///
/// # Errors
///
/// Returns [`ScenarioError::Io`] when a path cannot be read.
pub fn discover(paths: &[PathBuf]) -> Result<Vec<PathBuf>, ScenarioError> {
    let mut found = Vec::new();

    for path in paths {
        if path.is_file() {
            found.push(path.clone());
            continue;
        }

        let walker = WalkDir::new(path)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0 || !entry.file_name().to_string_lossy().starts_with('.')
            });
        for entry in walker {
            let entry = entry.map_err(|err| ScenarioError::Io {
                path: err.path().map_or_else(|| path.clone(), Path::to_path_buf),
                source: err
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("filesystem loop")),
            })?;
            if entry.file_type().is_file() && is_scenario_file(entry.path()) {
                found.push(entry.into_path());
            }
        }
    }

    Ok(found)
}

/// Discovers and loads every scenario under `paths`.
///
/// # Errors
///
/// Stops at the first file that fails to load.
pub fn load_all(paths: &[PathBuf]) -> Result<Vec<Scenario>, ScenarioError> {
    discover(paths)?
        .iter()
        .map(|path| Scenario::from_file(path))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const CHECKOUT: &str = r#"
name = "checkout"
description = "Add a red mug to the cart"
tags = ["smoke"]

[params]
product = "Ceramic Modern Coffee Mug"

[[setup]]
kind = "navigate"
url = "/en-ie/ceramicmoderncoffeemug"

[[setup]]
kind = "interact"
action = "click_if_visible"
locator = { role = "button", name = "Accept all" }

[[steps]]
kind = "interact"
action = "click"
locator = { role = "link", name = "Red" }

[[steps]]
kind = "assert"
locator = [{ text = "${product}" }, { role = "row", name = "Print run" }, { css = "td", nth = 1 }]
expect = { contains_text = "100" }
"#;

    #[test]
    fn parses_toml_scenario() {
        let scenario = Scenario::from_toml_str(CHECKOUT).unwrap();
        assert_eq!(scenario.name, "checkout");
        assert_eq!(scenario.tags, vec!["smoke"]);
        assert_eq!(scenario.setup.len(), 2);
        assert_eq!(
            scenario.setup[1],
            Step::click_if_visible(Locator::role_named("button", "Accept all"))
        );
        assert_eq!(
            scenario.steps[1],
            Step::expect_text(
                Locator::text("${product}")
                    .locator(Locator::role_named("row", "Print run"))
                    .locator(Locator::css("td"))
                    .nth(1),
                "100"
            )
        );
        scenario.validate().unwrap();
    }

    #[test]
    fn parses_json_scenario() {
        let json = r##"{
            "name": "banner",
            "steps": [
                { "kind": "navigate", "url": "/" },
                { "kind": "interact", "action": "wait_for", "locator": { "css": "#cart-summary" } },
                { "kind": "assert", "locator": { "testId": "total" }, "expect": "visible" }
            ]
        }"##;
        let scenario = Scenario::from_json_str(json).unwrap();
        assert_eq!(scenario.steps[1], Step::wait_for(Locator::css("#cart-summary")));
        assert_eq!(scenario.steps[2], Step::expect_visible(Locator::test_id("total")));
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = Scenario::from_toml_str("name = \"x\"\nstep = []\n").unwrap_err();
        assert!(err.to_string().contains("step"));
    }

    #[test]
    fn step_descriptions() {
        assert_eq!(Step::navigate("/").to_string(), "navigate to /");
        assert_eq!(
            Step::click_if_visible(Locator::role_named("button", "Accept all")).to_string(),
            r#"click role=button[name="Accept all"] if visible"#
        );
        assert_eq!(
            Step::expect_text(Locator::css("#total"), "€494.14").to_string(),
            "expect css=#total to contain text \"€494.14\""
        );
    }

    #[test]
    fn validation_rules() {
        let empty = Scenario::new("empty");
        assert!(matches!(empty.validate(), Err(ScenarioError::Invalid { .. })));

        let blank_url = Scenario::new("blank").step(Step::navigate("  "));
        let err = blank_url.validate().unwrap_err();
        assert!(err.to_string().contains("step 0: navigation URL is empty"));

        let bad_setup = Scenario::new("setup")
            .setup(Step::navigate("/"))
            .setup(Step::expect_text(Locator::css("h1"), ""))
            .step(Step::navigate("/"));
        let err = bad_setup.validate().unwrap_err();
        assert!(err.to_string().contains("setup 1: expected text is empty"));
    }

    #[test]
    fn bind_substitutes_params_with_overrides() {
        let scenario = Scenario::from_toml_str(CHECKOUT).unwrap();
        let overrides = BTreeMap::from([("product".to_string(), "Tote Bag".to_string())]);

        let bound = scenario.bind(&overrides).unwrap();
        assert_eq!(
            bound.steps[1].locator().unwrap().segments()[0].selector,
            Selector::Text {
                text: "Tote Bag".into(),
                exact: false
            }
        );

        let defaults = scenario.bind(&BTreeMap::new()).unwrap();
        assert!(
            defaults.steps[1]
                .to_string()
                .starts_with(r#"expect text="Ceramic Modern Coffee Mug""#)
        );
    }

    #[test]
    fn bind_rejects_unknown_placeholder() {
        let scenario = Scenario::new("checkout").step(Step::expect_text(Locator::css("#total"), "${price}"));
        let err = scenario.bind(&BTreeMap::new()).unwrap_err();
        assert!(matches!(err, ScenarioError::UnknownParam { ref name, .. } if name == "price"));
    }

    #[test]
    fn bind_rejects_unterminated_placeholder() {
        let scenario = Scenario::new("checkout").step(Step::navigate("/${path"));
        assert!(matches!(
            scenario.bind(&BTreeMap::new()),
            Err(ScenarioError::Invalid { .. })
        ));
    }

    #[test]
    fn slug_is_file_name_friendly() {
        assert_eq!(Scenario::new("Add mug to cart!").slug(), "add-mug-to-cart");
        assert_eq!(Scenario::new("€€").slug(), "scenario");
    }

    #[test]
    fn discovers_scenarios_recursively() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("nested")).unwrap();
        fs::create_dir_all(dir.path().join(".hidden")).unwrap();
        fs::write(dir.path().join("b.toml"), CHECKOUT).unwrap();
        fs::write(dir.path().join("nested/a.toml"), CHECKOUT).unwrap();
        fs::write(dir.path().join(".hidden/c.toml"), CHECKOUT).unwrap();
        fs::write(dir.path().join("uicheck.config.toml"), "").unwrap();
        fs::write(dir.path().join("notes.md"), "").unwrap();

        let found = discover(&[dir.path().to_path_buf()]).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(names, vec![PathBuf::from("b.toml"), PathBuf::from("nested/a.toml")]);

        let loaded = load_all(&[dir.path().to_path_buf()]).unwrap();
        assert_eq!(loaded.len(), 2);
    }

    #[test]
    fn from_file_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.toml");
        fs::write(&path, "name = ").unwrap();
        let err = Scenario::from_file(&path).unwrap_err();
        assert!(matches!(err, ScenarioError::Toml { .. }));
        assert!(err.to_string().contains("broken.toml"));

        let yaml = dir.path().join("scenario.yaml");
        fs::write(&yaml, "").unwrap();
        assert!(matches!(
            Scenario::from_file(&yaml),
            Err(ScenarioError::UnsupportedFormat(_))
        ));
    }
}
