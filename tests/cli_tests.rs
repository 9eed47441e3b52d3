//! Binary tests for the study-pomodoro CLI.
//!
//! Only non-interactive commands are exercised here; `run` needs a
//! terminal and is covered through `PomodoroApp` in the session tests.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

// ============================================================================
// Test Helpers
// ============================================================================

/// Builds the command with config and data dirs pointed at `home`.
fn cli(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("study-pomodoro").unwrap();
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("XDG_DATA_HOME", home.join("data"))
        .env_remove("RUST_LOG");
    cmd
}

fn write_config(home: &Path, contents: &str) -> std::path::PathBuf {
    let path = home.join("custom.toml");
    std::fs::write(&path, contents).unwrap();
    path
}

// ============================================================================
// Help and completions
// ============================================================================

#[test]
fn test_help_lists_subcommands() {
    let home = tempfile::tempdir().unwrap();
    cli(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("history"))
        .stdout(predicate::str::contains("sounds"));
}

#[test]
fn test_completions_bash() {
    let home = tempfile::tempdir().unwrap();
    cli(home.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("study-pomodoro"));
}

// ============================================================================
// Sounds
// ============================================================================

#[test]
fn test_sounds_lists_catalog() {
    let home = tempfile::tempdir().unwrap();
    cli(home.path())
        .arg("sounds")
        .assert()
        .success()
        .stdout(predicate::str::contains("rain"))
        .stdout(predicate::str::contains("thunder"))
        .stdout(predicate::str::contains("* 0  none"));
}

#[test]
fn test_sounds_marks_configured_default_and_override() {
    let home = tempfile::tempdir().unwrap();
    let config = write_config(
        home.path(),
        "[sound]\ndefault_sound = \"forest\"\n\n[sound.overrides]\nforest = \"/srv/forest.ogg\"\n",
    );

    cli(home.path())
        .arg("--config")
        .arg(&config)
        .arg("sounds")
        .assert()
        .success()
        .stdout(predicate::str::contains("* 2  forest"))
        .stdout(predicate::str::contains("/srv/forest.ogg"));
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_run_rejects_zero_work_minutes() {
    let home = tempfile::tempdir().unwrap();
    cli(home.path())
        .args(["run", "--work", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--work"));
}

#[test]
fn test_missing_config_file_is_reported() {
    let home = tempfile::tempdir().unwrap();
    cli(home.path())
        .arg("--config")
        .arg(home.path().join("missing.toml"))
        .arg("sounds")
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot read config file"))
        .stderr(predicate::str::contains("hint:"));
}

#[test]
fn test_out_of_range_config_is_reported() {
    let home = tempfile::tempdir().unwrap();
    let config = write_config(home.path(), "[timer]\nbreak_minutes = 90\n");

    cli(home.path())
        .arg("--config")
        .arg(&config)
        .arg("sounds")
        .assert()
        .failure()
        .stderr(predicate::str::contains("break duration must be between 1 and 60"));
}

#[test]
fn test_history_without_backend_fails() {
    let home = tempfile::tempdir().unwrap();
    cli(home.path())
        .args(["history", "--socket"])
        .arg(home.path().join("absent.sock"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to fetch session history"))
        .stderr(predicate::str::contains("cannot connect to backend"));
}
