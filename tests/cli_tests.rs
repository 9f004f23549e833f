mod support;

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

use support::config::write_config;

fn oddsfeed() -> Command {
    let mut cmd = Command::cargo_bin("oddsfeed").expect("binary built");
    cmd.env_remove("PORT");
    cmd
}

#[test]
fn check_config_accepts_valid_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), "[source]\nurl = \"https://example.com/live\"\n");

    oddsfeed()
        .args(["check", "config", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration file is valid"))
        .stdout(predicate::str::contains("https://example.com/live"));
}

#[test]
fn check_config_fails_on_invalid_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        dir.path(),
        "[source]\nurl = \"https://example.com\"\n\n[poller]\ninterval_ms = 0\n",
    );

    oddsfeed()
        .args(["check", "config", "-c"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("interval_ms"));
}

#[test]
fn inspect_prints_persisted_matches() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("odds_latest.json"),
        r#"{
  "timestamp": "2024-05-01T12:00:00Z",
  "updated": "2024-05-01 12:00:00",
  "matches": [
    {
      "id": "match_australia__vs__india",
      "team1": "India",
      "team2": "Australia",
      "in_play": true,
      "odds": {"back": [{"position": 0, "price": "1.50"}], "lay": []},
      "timestamp": "2024-05-01T12:00:00Z"
    }
  ]
}"#,
    )
    .unwrap();

    oddsfeed()
        .args(["inspect", "--config"])
        .arg(dir.path().join("absent.toml"))
        .arg("--data-dir")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("match_australia__vs__india"))
        .stdout(predicate::str::contains("India vs Australia"))
        .stdout(predicate::str::contains("1.50"));
}

#[test]
fn inspect_reports_corrupt_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("odds_latest.json"), "{broken").unwrap();

    oddsfeed()
        .args(["inspect", "-c"])
        .arg(dir.path().join("absent.toml"))
        .arg("--data-dir")
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid JSON"));
}

#[test]
fn inspect_without_snapshot_is_not_an_error() {
    let dir = tempfile::tempdir().unwrap();

    oddsfeed()
        .args(["inspect", "-c"])
        .arg(dir.path().join("absent.toml"))
        .arg("--data-dir")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No snapshot"));
}
