//! Integration tests for the postgoose CLI

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Get the postgoose binary, isolated from libpq environment variables
#[allow(deprecated)]
fn postgoose_cmd(cwd: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("postgoose").unwrap();
    cmd.current_dir(cwd.path())
        .env_remove("PGHOST")
        .env_remove("PGPORT")
        .env_remove("PGUSER")
        .env_remove("PGPASSWORD")
        .env_remove("PGDATABASE")
        .env_remove("POSTGOOSE_LOG_LEVEL");
    cmd
}

#[test]
fn test_help_command() {
    let cwd = TempDir::new().unwrap();
    postgoose_cmd(&cwd)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage: postgoose [OPTIONS] <DIRECTORY>"))
        .stdout(predicate::str::contains("--auto-apply-down"))
        .stdout(predicate::str::contains("--no-strict-digest-check"))
        .stdout(predicate::str::contains("--table"))
        .stdout(predicate::str::contains("--schema"));
}

#[test]
fn test_version_command() {
    let cwd = TempDir::new().unwrap();
    postgoose_cmd(&cwd)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("postgoose"))
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_missing_directory_argument() {
    let cwd = TempDir::new().unwrap();
    postgoose_cmd(&cwd)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("<DIRECTORY>"));
}

#[test]
fn test_nonexistent_directory() {
    let cwd = TempDir::new().unwrap();
    postgoose_cmd(&cwd)
        .arg("does-not-exist")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("is not a directory"));
}

#[test]
fn test_empty_directory_is_nothing_to_do() {
    let cwd = TempDir::new().unwrap();
    fs::create_dir(cwd.path().join("migrations")).unwrap();

    postgoose_cmd(&cwd)
        .arg("migrations")
        .assert()
        .code(6)
        .stderr(predicate::str::contains("No migrations found"));
}

#[test]
fn test_malformed_filename() {
    let cwd = TempDir::new().unwrap();
    let dir = cwd.path().join("migrations");
    fs::create_dir(&dir).unwrap();
    fs::write(dir.join("1_up.sql"), "CREATE TABLE a (id int);").unwrap();
    fs::write(dir.join("1_down.sql"), "DROP TABLE a;").unwrap();
    fs::write(dir.join("seed.sql"), "INSERT INTO a VALUES (1);").unwrap();

    postgoose_cmd(&cwd)
        .arg("migrations")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("seed.sql"));
}

#[test]
fn test_incomplete_migration() {
    let cwd = TempDir::new().unwrap();
    let dir = cwd.path().join("migrations");
    fs::create_dir(&dir).unwrap();
    fs::write(dir.join("1_up.sql"), "CREATE TABLE a (id int);").unwrap();
    fs::write(dir.join("1_down.sql"), "DROP TABLE a;").unwrap();
    fs::write(dir.join("2_up.sql"), "CREATE TABLE b (id int);").unwrap();

    postgoose_cmd(&cwd)
        .arg("migrations")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Migration 2"));
}

#[test]
fn test_unexpected_files() {
    let cwd = TempDir::new().unwrap();
    let dir = cwd.path().join("migrations");
    fs::create_dir(&dir).unwrap();
    fs::write(dir.join("1_up.sql"), "CREATE TABLE a (id int);").unwrap();
    fs::write(dir.join("1_down.sql"), "DROP TABLE a;").unwrap();
    fs::write(dir.join("1_up_extra.sql"), "SELECT 1;").unwrap();
    fs::write(dir.join("README.md"), "not a migration").unwrap();

    postgoose_cmd(&cwd)
        .arg("migrations")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("1_up_extra.sql"))
        .stderr(predicate::str::contains("README.md").not());
}

#[test]
fn test_invalid_config_file() {
    let cwd = TempDir::new().unwrap();
    fs::create_dir(cwd.path().join("migrations")).unwrap();
    fs::write(cwd.path().join("postgoose.toml"), "[database\nurl = 1").unwrap();

    postgoose_cmd(&cwd)
        .arg("migrations")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Configuration error"));
}

#[test]
fn test_config_file_is_used() {
    let cwd = TempDir::new().unwrap();
    fs::create_dir(cwd.path().join("migrations")).unwrap();
    fs::write(
        cwd.path().join("postgoose.toml"),
        "[migrations]\ntable = \"app_ledger\"\n",
    )
    .unwrap();

    postgoose_cmd(&cwd)
        .arg("migrations")
        .assert()
        .code(6)
        .stdout(predicate::str::contains("app_ledger"));
}
