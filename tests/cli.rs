//! CLI smoke tests.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_help_shows_usage() {
    let mut cmd = Command::cargo_bin("orchestrate-rs").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("research"))
        .stdout(predicate::str::contains("--max-results"));
}

#[test]
fn test_version_flag() {
    let mut cmd = Command::cargo_bin("orchestrate-rs").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("orchestrate-rs"));
}

#[test]
fn test_missing_query_fails() {
    let mut cmd = Command::cargo_bin("orchestrate-rs").unwrap();
    cmd.assert().failure();
}

#[test]
fn test_missing_credentials_fails_fast() {
    let mut cmd = Command::cargo_bin("orchestrate-rs").unwrap();
    cmd.env_remove("GROQ_API_KEY")
        .env_remove("OPENAI_API_KEY")
        .env_remove("GEMINI_API_KEY")
        .env_remove("TAVILY_API_KEY")
        .current_dir(tempfile::tempdir().unwrap().path())
        .arg("some query")
        .assert()
        .failure();
}
