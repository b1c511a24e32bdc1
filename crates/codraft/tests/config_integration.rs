//! Configuration integration tests.
//!
//! Discovery, format parsing and precedence checked through the compiled
//! binary, asserting on `info --json` output.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use tempfile::TempDir;

/// Returns a Command configured to run our binary.
#[allow(deprecated)]
fn cmd() -> Command {
    Command::cargo_bin(env!("CARGO_PKG_NAME")).unwrap()
}

/// A command with no CODRAFT_* settings leaking in from the environment.
fn clean_cmd() -> Command {
    let mut c = cmd();
    for var in [
        "CODRAFT_USER",
        "CODRAFT_DATA_DIR",
        "CODRAFT_LOG_LEVEL",
        "CODRAFT_LOG_DIR",
        "CODRAFT_LOG_PATH",
        "RUST_LOG",
    ] {
        c.env_remove(var);
    }
    c
}

/// Run `info --json` from a directory and parse the JSON output.
fn info_json(dir: &std::path::Path) -> Value {
    let output = clean_cmd()
        .args(["-C", dir.to_str().unwrap(), "info", "--json"])
        .output()
        .expect("failed to run command");
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("invalid JSON output")
}

// =============================================================================
// Discovery
// =============================================================================

#[test]
fn runs_without_config_file() {
    let tmp = TempDir::new().unwrap();
    let json = info_json(tmp.path());

    assert_eq!(json["config"]["log_level"], "info");
    assert_eq!(json["config"]["max_append_attempts"], 8);
    assert!(json["config"]["config_file"].is_null());
}

#[test]
fn discovers_dotfile_config() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".codraft.toml"), r#"log_level = "debug""#).unwrap();

    let json = info_json(tmp.path());

    assert_eq!(json["config"]["log_level"], "debug");
    assert!(
        json["config"]["config_file"]
            .as_str()
            .unwrap()
            .ends_with(".codraft.toml")
    );
}

#[test]
fn discovers_config_in_parent_directory() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("codraft.toml"), r#"user = "ada""#).unwrap();
    let nested = tmp.path().join("a").join("b");
    fs::create_dir_all(&nested).unwrap();

    let json = info_json(&nested);

    assert_eq!(json["config"]["user"], "ada");
}

#[test]
fn git_root_stops_the_search() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("codraft.toml"), r#"user = "outer""#).unwrap();
    let repo = tmp.path().join("repo");
    fs::create_dir_all(repo.join(".git")).unwrap();
    let sub = repo.join("docs");
    fs::create_dir_all(&sub).unwrap();

    let json = info_json(&sub);

    assert!(json["config"]["user"].is_null());
}

#[test]
fn yaml_and_json_configs_parse() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".codraft.yaml"), "max_append_attempts: 3\n").unwrap();
    assert_eq!(info_json(tmp.path())["config"]["max_append_attempts"], 3);

    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join(".codraft.json"),
        r#"{"default_limit": {"unit": "sentences", "quantity": 2}}"#,
    )
    .unwrap();
    assert_eq!(info_json(tmp.path())["config"]["default_limit"], "2 sentences");
}

#[test]
fn invalid_config_fails() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".codraft.toml"), "log_level = [").unwrap();

    clean_cmd()
        .args(["-C", tmp.path().to_str().unwrap(), "info"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load configuration"));
}

// =============================================================================
// Precedence
// =============================================================================

#[test]
fn explicit_config_file_wins_over_discovered() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".codraft.toml"), r#"user = "project""#).unwrap();
    let explicit = tmp.path().join("custom.toml");
    fs::write(&explicit, r#"user = "explicit""#).unwrap();

    let output = clean_cmd()
        .args([
            "-C",
            tmp.path().to_str().unwrap(),
            "--config",
            explicit.to_str().unwrap(),
            "--json",
            "info",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).unwrap();

    assert_eq!(json["config"]["user"], "explicit");
}

#[test]
fn environment_overrides_files() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".codraft.toml"), r#"user = "file""#).unwrap();

    let output = clean_cmd()
        .env("CODRAFT_USER", "env")
        .args(["-C", tmp.path().to_str().unwrap(), "--json", "info"])
        .output()
        .unwrap();
    let json: Value = serde_json::from_slice(&output.stdout).unwrap();

    assert_eq!(json["config"]["user"], "env");
}

// =============================================================================
// Settings that change behavior
// =============================================================================

#[test]
fn default_limit_applies_to_new_drafts() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join(".codraft.toml"),
        concat!(
            "user = \"ada\"\n",
            "data_dir = \"drafts-here\"\n",
            "\n[default_limit]\n",
            "unit = \"words\"\n",
            "quantity = 4\n",
        ),
    )
    .unwrap();

    let output = clean_cmd()
        .current_dir(tmp.path())
        .args(["--json", "new", "--title", "T", "--category", "c", "--text", "Go."])
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );
    let json: Value = serde_json::from_slice(&output.stdout).unwrap();

    assert_eq!(json["limit"], "4 words");
    assert!(tmp.path().join("drafts-here").join("drafts").is_dir());
}

#[test]
fn input_limit_rejects_large_text() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".codraft.toml"), "max_input_bytes = 8\n").unwrap();

    clean_cmd()
        .current_dir(tmp.path())
        .args(["metrics", "--text", "far more than eight bytes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("input too large"));
}

#[test]
fn log_dir_receives_jsonl() {
    let tmp = TempDir::new().unwrap();
    let logs = tmp.path().join("logs");

    clean_cmd()
        .current_dir(tmp.path())
        .env("CODRAFT_LOG_DIR", &logs)
        .args(["metrics", "--text", "One two."])
        .assert()
        .success();

    assert!(logs.join("codraft.jsonl").is_file());
}
