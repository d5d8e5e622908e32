//! CLI integration tests for schema-migrate.
//!
//! These verify argument parsing, help output, exit codes, and the SQLite
//! paths that need no external server.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

/// Get a command for the schema-migrate binary.
fn cmd() -> Command {
    Command::cargo_bin("schema-migrate").unwrap()
}

/// Write a config file pointing at a SQLite database under `dir`.
fn sqlite_config(dir: &tempfile::TempDir) -> std::path::PathBuf {
    let db_path = dir.path().join("app.db");
    let config_path = dir.path().join("config.yaml");
    let mut file = std::fs::File::create(&config_path).unwrap();
    writeln!(file, "database:").unwrap();
    writeln!(file, "  type: sqlite").unwrap();
    writeln!(file, "  path: {}", db_path.display()).unwrap();
    config_path
}

// =============================================================================
// Help and Version Tests
// =============================================================================

#[test]
fn test_help_shows_all_commands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("health-check"))
        .stdout(predicate::str::contains("prepare-db"));
}

#[test]
fn test_version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("schema-migrate"));
}

#[test]
fn test_status_subcommand_help() {
    cmd()
        .args(["status", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--output-json"));
}

// =============================================================================
// Error Handling Tests
// =============================================================================

#[test]
fn test_missing_config_file_fails() {
    cmd()
        .args(["--config", "/nonexistent/config.yaml", "status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_unknown_engine_type_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.yaml");
    std::fs::write(&config_path, "database:\n  type: oracle\n").unwrap();

    cmd()
        .args(["--config", config_path.to_str().unwrap(), "status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown database type"));
}

#[test]
fn test_prepare_db_refuses_without_yes() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = sqlite_config(&dir);

    cmd()
        .args(["--config", config_path.to_str().unwrap(), "prepare-db"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--yes"));
}

// =============================================================================
// SQLite End-to-End Tests
// =============================================================================

#[test]
fn test_health_check_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = sqlite_config(&dir);

    cmd()
        .args(["--config", config_path.to_str().unwrap(), "health-check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ok"));
}

#[test]
fn test_status_fresh_database_not_initialized() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = sqlite_config(&dir);

    cmd()
        .args(["--config", config_path.to_str().unwrap(), "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("not initialized"));
}

#[test]
fn test_status_output_json() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = sqlite_config(&dir);

    cmd()
        .args([
            "--config",
            config_path.to_str().unwrap(),
            "status",
            "--output-json",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"version\""));
}

#[test]
fn test_prepare_db_sqlite_removes_file() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = sqlite_config(&dir);
    let db_path = dir.path().join("app.db");
    std::fs::write(&db_path, b"stale").unwrap();

    cmd()
        .args([
            "--config",
            config_path.to_str().unwrap(),
            "prepare-db",
            "--yes",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("database recreated"));

    assert!(!db_path.exists());
}
