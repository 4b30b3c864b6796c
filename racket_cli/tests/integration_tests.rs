//! Integration tests for the racket binary.
//!
//! These tests verify end-to-end behavior including:
//! - Replaying recordings through the shot detector
//! - Saving, listing and clearing session history
//! - Configuration overrides

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// 2025-10-09 08:53:20 UTC
const START: i64 = 1_760_000_000_000;

const HEADER: &str = "timestamp_millis,gyro_x,gyro_y,gyro_z,heart_rate_bpm,accuracy";

/// Helper to create a test data directory
fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Helper to get the path to the CLI binary
fn cli() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("racket"))
}

/// One overhead smash: a steep downward swing with rising heart rate
fn write_smash_recording(dir: &Path) -> PathBuf {
    let swing = [
        (0.3, 0.5, -1.5),
        (0.5, 0.6, -4.0),
        (0.8, 1.1, -6.8),
        (0.6, 0.9, -5.4),
        (0.5, 0.7, -4.5),
        (0.4, 0.6, -2.8),
        (0.2, 0.4, -1.2),
    ];
    let mut contents = String::from(HEADER);
    for (i, (x, y, z)) in swing.iter().enumerate() {
        contents.push_str(&format!(
            "\n{},{},{},{},{},3",
            START + i as i64 * 40,
            x,
            y,
            z,
            118 + i
        ));
    }
    contents.push('\n');

    let path = dir.join("smash.csv");
    fs::write(&path, contents).expect("Failed to write recording");
    path
}

/// A few seconds of the racket at rest
fn write_quiet_recording(dir: &Path) -> PathBuf {
    let mut contents = String::from(HEADER);
    for i in 0..20 {
        contents.push_str(&format!("\n{},0.05,0.05,0.05,95,3", START + i * 100));
    }
    contents.push('\n');

    let path = dir.join("quiet.csv");
    fs::write(&path, contents).expect("Failed to write recording");
    path
}

#[test]
fn test_cli_help() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Racket swing detection and training sessions",
        ));
}

#[test]
fn test_replay_detects_smash() {
    let temp_dir = setup_test_dir();
    let recording = write_smash_recording(temp_dir.path());

    cli()
        .arg("replay")
        .arg(&recording)
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Smash"))
        .stdout(predicate::str::contains("Total shots: 1"));

    // Not saved without --save
    assert!(!temp_dir.path().join("training_sessions.json").exists());
}

#[test]
fn test_replay_json_output() {
    let temp_dir = setup_test_dir();
    let recording = write_smash_recording(temp_dir.path());

    let output = cli()
        .arg("replay")
        .arg(&recording)
        .arg("--json")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let session: serde_json::Value =
        serde_json::from_slice(&output).expect("stdout should be JSON");
    assert_eq!(session["started_at_millis"], START);
    assert_eq!(session["ended_at_millis"], START + 240);
    assert_eq!(session["summary"]["total_shots"], 1);
    assert_eq!(session["summary"]["shot_counts"]["smash"], 1);
    assert_eq!(session["shots"][0]["shot_type"], "smash");
}

#[test]
fn test_replay_save_then_history() {
    let temp_dir = setup_test_dir();
    let recording = write_smash_recording(temp_dir.path());

    cli()
        .arg("replay")
        .arg(&recording)
        .arg("--save")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Session saved"));

    let history_path = temp_dir.path().join("training_sessions.json");
    let contents = fs::read_to_string(&history_path).expect("Failed to read history");
    assert!(contents.contains("\"smash\""));

    cli()
        .arg("history")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("1 saved sessions"))
        .stdout(predicate::str::contains("2025-10-09 08:53:20"));
}

#[test]
fn test_short_quiet_session_not_saved() {
    let temp_dir = setup_test_dir();
    let recording = write_quiet_recording(temp_dir.path());

    cli()
        .arg("replay")
        .arg(&recording)
        .arg("--save")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Total shots: 0"))
        .stdout(predicate::str::contains("not saved"));

    cli()
        .arg("history")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No saved sessions"));
}

#[test]
fn test_clear_history() {
    let temp_dir = setup_test_dir();
    let recording = write_smash_recording(temp_dir.path());

    for _ in 0..2 {
        cli()
            .arg("replay")
            .arg(&recording)
            .arg("--save")
            .arg("--data-dir")
            .arg(temp_dir.path())
            .assert()
            .success();
    }

    cli()
        .arg("history")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("2 saved sessions"));

    cli()
        .arg("clear")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleared session history"));

    cli()
        .arg("history")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No saved sessions"));
}

#[test]
fn test_history_respects_max_sessions() {
    let temp_dir = setup_test_dir();
    let recording = write_smash_recording(temp_dir.path());
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "[history]\nmax_sessions = 2\n").unwrap();

    for _ in 0..3 {
        cli()
            .arg("replay")
            .arg(&recording)
            .arg("--save")
            .arg("--config")
            .arg(&config_path)
            .arg("--data-dir")
            .arg(temp_dir.path())
            .assert()
            .success();
    }

    cli()
        .arg("history")
        .arg("--config")
        .arg(&config_path)
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("2 saved sessions"));
}

#[test]
fn test_config_thresholds_apply() {
    let temp_dir = setup_test_dir();
    let recording = write_smash_recording(temp_dir.path());
    let config_path = temp_dir.path().join("config.toml");
    // Every rule now requires a far harder swing
    fs::write(
        &config_path,
        "[classifier]\nsmash_threshold = 40.0\nclear_threshold = 30.0\ndrive_threshold = 20.0\ndrop_threshold = 10.0\n",
    )
    .unwrap();

    cli()
        .arg("replay")
        .arg(&recording)
        .arg("--config")
        .arg(&config_path)
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Total shots: 0"));
}

#[test]
fn test_invalid_config_is_rejected() {
    let temp_dir = setup_test_dir();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "[session]\nmax_heart_rate = 40.0\n").unwrap();

    cli()
        .arg("history")
        .arg("--config")
        .arg(&config_path)
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("max_heart_rate"));
}

#[test]
fn test_missing_recording_fails() {
    let temp_dir = setup_test_dir();

    cli()
        .arg("replay")
        .arg(temp_dir.path().join("nope.csv"))
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .failure();
}
