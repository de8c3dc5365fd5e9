// ABOUTME: Integration tests for the labforge CLI commands.
// ABOUTME: Validates --help output, init, validate, plan, and rehearse behavior.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

fn labforge_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("labforge"))
}

/// Directory with a freshly initialized config.
fn initialized_dir() -> tempfile::TempDir {
    let temp_dir = tempfile::tempdir().unwrap();
    labforge_cmd()
        .current_dir(temp_dir.path())
        .args(["init", "--lab", "team-lab"])
        .assert()
        .success();
    temp_dir
}

#[test]
fn help_shows_commands() {
    labforge_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("validate"))
        .stdout(predicate::str::contains("plan"))
        .stdout(predicate::str::contains("rehearse"));
}

#[test]
fn init_creates_config_file() {
    let temp_dir = initialized_dir();
    let config_path = temp_dir.path().join("labforge.yml");

    assert!(config_path.exists(), "labforge.yml should be created");
    let content = fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("lab_name: team-lab"));
    assert!(content.contains("image_name:"));
}

#[test]
fn init_refuses_to_overwrite_existing_config() {
    let temp_dir = tempfile::tempdir().unwrap();
    fs::write(temp_dir.path().join("labforge.yml"), "existing: config").unwrap();

    labforge_cmd()
        .current_dir(temp_dir.path())
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn validate_accepts_template() {
    let temp_dir = initialized_dir();

    labforge_cmd()
        .current_dir(temp_dir.path())
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"));
}

#[test]
fn validate_without_config_fails() {
    let temp_dir = tempfile::tempdir().unwrap();

    labforge_cmd()
        .current_dir(temp_dir.path())
        .arg("validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn plan_lists_steps_in_order() {
    let temp_dir = initialized_dir();

    labforge_cmd()
        .current_dir(temp_dir.path())
        .arg("plan")
        .assert()
        .success()
        .stdout(predicate::str::contains("1. deploy"))
        .stdout(predicate::str::contains("4. delete"));
}

#[test]
fn rehearse_json_reports_artifact() {
    let temp_dir = initialized_dir();
    let config_path = temp_dir.path().join("labforge.yml");

    labforge_cmd()
        .args(["--json", "--config"])
        .arg(&config_path)
        .arg("rehearse")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""event":"result""#))
        .stdout(predicate::str::contains("my-image"));
}
