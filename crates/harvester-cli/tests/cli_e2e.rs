use std::path::Path;

use assert_cmd::Command;
use predicates::str::contains;
use tempfile::tempdir;

fn harvester_cmd(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("harvester").expect("binary builds");
    cmd.arg("--dir").arg(dir);
    cmd
}

#[test]
fn sources_lists_every_registered_source() {
    let dir = tempdir().unwrap();
    harvester_cmd(dir.path())
        .arg("sources")
        .assert()
        .success()
        .stdout(contains("- hn (aggregation"));
}

#[test]
fn sources_json_is_valid_json() {
    let dir = tempdir().unwrap();
    let output = harvester_cmd(dir.path()).arg("sources").arg("--json").output().unwrap();
    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert!(parsed.as_array().unwrap().iter().any(|v| v["id"] == "hn"));
}

#[test]
fn read_on_unknown_source_exits_nonzero() {
    let dir = tempdir().unwrap();
    harvester_cmd(dir.path())
        .args(["read", "does-not-exist", "some-item"])
        .assert()
        .failure();
}

#[test]
fn read_on_aggregation_source_exits_two() {
    let dir = tempdir().unwrap();
    let assert = harvester_cmd(dir.path()).args(["read", "hn", "some-item"]).assert();
    assert.code(2);
}

#[test]
fn query_source_on_empty_store_returns_empty_list() {
    let dir = tempdir().unwrap();
    let output = harvester_cmd(dir.path())
        .args(["query", "source", "hn", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(parsed.as_array().unwrap().len(), 0);
}

#[test]
fn query_archive_without_endpoints_fails() {
    let dir = tempdir().unwrap();
    harvester_cmd(dir.path())
        .args(["query", "archive", "--from", "2026-01-01"])
        .assert()
        .failure();
}

#[test]
fn sqlite_rebuild_creates_index_file() {
    let dir = tempdir().unwrap();
    harvester_cmd(dir.path())
        .args(["sqlite", "rebuild", "--json"])
        .assert()
        .success()
        .stdout(contains("\"records\""));
    assert!(dir.path().join("data/index.sqlite").exists());
}
