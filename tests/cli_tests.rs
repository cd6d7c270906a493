//! Tests for the `statusmigrate` binary
//!
//! Run with: cargo test --test cli_tests

use std::fs;
use std::process::Command;
use tempfile::tempdir;
use uuid::Uuid;

const BIN: &str = env!("CARGO_BIN_EXE_statusmigrate");

#[test]
fn test_summary_printed_when_store_cannot_be_opened() {
    let dir = tempdir().unwrap();
    let ids = dir.path().join("apps.txt");
    let store = dir.path().join("documents.json");
    let checkpoint = dir.path().join("prevSnapshot.txt");
    fs::write(&ids, format!("{}\n", Uuid::new_v4())).unwrap();
    fs::write(&store, "{\"version\": 1").unwrap();

    let output = Command::new(BIN)
        .arg("--application-ids-path")
        .arg(&ids)
        .arg("--prev-snapshot-file-path")
        .arg(&checkpoint)
        .arg("--store")
        .arg(&store)
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Total number of STATUS document found: 0"));
    assert!(stdout.contains("Total number of RESPONSE document created: 0"));
    assert!(!checkpoint.exists());
}

#[test]
fn test_successful_run_commits_watermark() {
    let dir = tempdir().unwrap();
    let ids = dir.path().join("apps.txt");
    let checkpoint = dir.path().join("prevSnapshot.txt");
    fs::write(&ids, format!("{}\n", Uuid::new_v4())).unwrap();

    let output = Command::new(BIN)
        .arg("--application-ids-path")
        .arg(&ids)
        .arg("--prev-snapshot-file-path")
        .arg(&checkpoint)
        .arg("--store")
        .arg(dir.path().join("documents.json"))
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Total number of RESPONSE document already present: 0"));
    assert!(checkpoint.exists());
}
