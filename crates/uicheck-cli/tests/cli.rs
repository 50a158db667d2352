//! Command-line behaviour that does not need a browser.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn uicheck(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("uicheck").unwrap();
    cmd.current_dir(dir.path()).env("NO_COLOR", "1");
    cmd
}

#[test]
fn schema_prints_config_options() {
    let temp = TempDir::new().unwrap();
    uicheck(&temp)
        .arg("schema")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"baseUrl\""))
        .stdout(predicate::str::contains("\"scenarioTimeoutMs\""));
}

#[test]
fn init_then_check() {
    let temp = TempDir::new().unwrap();

    uicheck(&temp).arg("init").assert().success();
    assert!(temp.path().join("uicheck.config.toml").exists());
    assert!(temp.path().join("scenarios/checkout.toml").exists());

    uicheck(&temp)
        .args(["check", "scenarios"])
        .assert()
        .success()
        .stderr(predicate::str::contains("checkout (2 setup, 10 steps)"))
        .stderr(predicate::str::contains("1 scenario(s) are valid"));

    // A second init would clobber the user's edits
    uicheck(&temp)
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
}

#[test]
fn check_reports_unknown_parameters() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("search.toml"),
        r#"
name = "search"

[[steps]]
kind = "navigate"
url = "/search?q=${query}"
"#,
    )
    .unwrap();

    uicheck(&temp)
        .args(["check", "search.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown parameter 'query'"));

    uicheck(&temp)
        .args(["check", "search.toml", "--param", "query=mug"])
        .assert()
        .success();
}

#[test]
fn check_rejects_invalid_scenarios() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("empty.json"), r#"{ "name": "empty", "steps": [] }"#).unwrap();

    uicheck(&temp)
        .args(["check", "."])
        .assert()
        .failure()
        .stderr(predicate::str::contains("empty"));
}

#[test]
fn run_fails_on_missing_config_before_launching_chrome() {
    let temp = TempDir::new().unwrap();
    uicheck(&temp)
        .args(["run", "scenarios", "--config", "missing.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Config file not found"));
}

#[test]
fn run_rejects_invalid_config_values() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("uicheck.config.json"),
        r#"{ "baseUrl": "localhost:3000" }"#,
    )
    .unwrap();

    uicheck(&temp)
        .args(["run", "scenarios"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("baseUrl"));
}

#[test]
fn run_rejects_zero_jobs() {
    let temp = TempDir::new().unwrap();
    uicheck(&temp)
        .args(["run", "scenarios", "--jobs", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least 1"));
}
