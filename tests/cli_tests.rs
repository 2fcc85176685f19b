//! Command-line tests for the clipdeck binary

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

fn clipdeck(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("clipdeck").unwrap();
    cmd.current_dir(dir)
        .env_remove("RUST_LOG")
        .env_remove("CLIPDECK_LOG_LEVEL")
        .env_remove("CLIPDECK_NUDGE_STEP");
    cmd
}

/// Write a two-clip list and assemble it into `session.json`
fn assembled_session() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("clips.json"),
        r#"[{"title": "Intro", "start": 0, "end": 5}, {"start": 5, "end": 9}]"#,
    )
    .unwrap();

    clipdeck(dir.path())
        .args(["assemble", "--clips", "clips.json", "--duration", "01:00", "--out", "session.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Assembled 2 clips"));
    dir
}

fn inspect_json(dir: &Path) -> Value {
    let output = clipdeck(dir)
        .args(["inspect", "--session", "session.json", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_help_lists_commands() {
    let dir = TempDir::new().unwrap();
    clipdeck(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("assemble").and(predicate::str::contains("ripple-delete")));
}

#[test]
fn test_assemble_then_inspect() {
    let dir = assembled_session();
    let report = inspect_json(dir.path());

    assert_eq!(report["mediaDuration"], 60.0);
    assert_eq!(report["clips"].as_array().unwrap().len(), 2);
    let items = report["assembly"]["tracks"][0]["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[1]["timelineStart"], 5.0);
    assert_eq!(report["span"], 9.0);
}

#[test]
fn test_assemble_refuses_to_overwrite() {
    let dir = assembled_session();
    clipdeck(dir.path())
        .args(["assemble", "--clips", "clips.json", "--duration", "60", "--out", "session.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    clipdeck(dir.path())
        .args(["assemble", "--clips", "clips.json", "--duration", "60", "--out", "session.json", "--force"])
        .assert()
        .success();
}

#[test]
fn test_assemble_rejects_bad_duration() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("clips.json"), "[]").unwrap();
    clipdeck(dir.path())
        .args(["assemble", "--clips", "clips.json", "--duration", "soon", "--out", "s.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid duration"));
}

#[test]
fn test_split_item_is_saved() {
    let dir = assembled_session();
    let report = inspect_json(dir.path());
    let item_id = report["assembly"]["tracks"][0]["items"][0]["id"].as_str().unwrap().to_string();

    clipdeck(dir.path())
        .args(["split", "--session", "session.json", "--item", &item_id, "--at", "2.5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Split created"));

    let report = inspect_json(dir.path());
    let items = report["assembly"]["tracks"][0]["items"].as_array().unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(items[0]["timelineEnd"], 2.5);
    assert_eq!(items[1]["sourceIn"], 2.5);
}

#[test]
fn test_split_requires_a_target() {
    let dir = assembled_session();
    clipdeck(dir.path())
        .args(["split", "--session", "session.json", "--at", "2"])
        .assert()
        .failure();
}

#[test]
fn test_split_at_edge_is_rejected() {
    let dir = assembled_session();
    let report = inspect_json(dir.path());
    let clip_id = report["clips"][0]["id"].as_str().unwrap().to_string();

    clipdeck(dir.path())
        .args(["split", "--session", "session.json", "--clip", &clip_id, "--at", "0.1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Edit rejected"));
}

#[test]
fn test_nudge_clip_moves_it() {
    let dir = assembled_session();
    let report = inspect_json(dir.path());
    let clip_id = report["clips"][1]["id"].as_str().unwrap().to_string();

    clipdeck(dir.path())
        .args(["--nudge-step", "0.5", "nudge", "--session", "session.json", "--clip", &clip_id, "--steps", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Nudged"));

    let report = inspect_json(dir.path());
    assert_eq!(report["clips"][1]["start"], 6.0);
}

#[test]
fn test_ripple_delete_unknown_clip_fails() {
    let dir = assembled_session();
    clipdeck(dir.path())
        .args(["ripple-delete", "--session", "session.json", "--clip", "clip-nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Clip not found"));
}

#[test]
fn test_ripple_delete_closes_gap() {
    let dir = assembled_session();
    let report = inspect_json(dir.path());
    let clip_id = report["clips"][0]["id"].as_str().unwrap().to_string();

    clipdeck(dir.path())
        .args(["ripple-delete", "--session", "session.json", "--clip", &clip_id])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 clips remain"));

    let report = inspect_json(dir.path());
    assert_eq!(report["clips"][0]["start"], 0.0);
    assert_eq!(report["clips"][0]["end"], 4.0);
}

#[test]
fn test_resolve_reports_source_time() {
    let dir = assembled_session();
    clipdeck(dir.path())
        .args(["resolve", "--session", "session.json", "--at", "6", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"sourceTime\": 6.0").and(predicate::str::contains("\"covering\": true")));
}

#[test]
fn test_missing_session_fails() {
    let dir = TempDir::new().unwrap();
    clipdeck(dir.path())
        .args(["inspect", "--session", "nowhere.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Session file not found"));
}

#[test]
fn test_cues_from_transcript() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("words.json"),
        r#"{"words": [
            {"text": "hello", "start": 0.0, "end": 0.4},
            {"text": "wonderful", "start": 0.5, "end": 0.9},
            {"text": "world.", "start": 1.0, "end": 1.4}
        ]}"#,
    )
    .unwrap();

    clipdeck(dir.path())
        .args(["cues", "--words", "words.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("00:00.000 --> 00:01.400").and(predicate::str::contains("hello wonderful world.")));

    clipdeck(dir.path())
        .args(["cues", "--words", "words.json", "--at", "0.6"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[wonderful]"));
}

#[test]
fn test_cues_with_oversized_box() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("words.json"),
        r#"[{"text": "tiny", "start": 0.0, "end": 0.4}, {"text": "captions", "start": 0.5, "end": 0.9}]"#,
    )
    .unwrap();

    clipdeck(dir.path())
        .args(["cues", "--words", "words.json", "--box-width", "1e20", "--box-height", "1e20"])
        .assert()
        .success()
        .stdout(predicate::str::contains("tiny captions"));
}

#[test]
fn test_bad_log_level_is_rejected() {
    let dir = TempDir::new().unwrap();
    clipdeck(dir.path())
        .args(["--log-level", "loud", "inspect", "--session", "s.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid log level"));
}
