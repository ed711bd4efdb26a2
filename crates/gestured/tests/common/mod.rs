#![allow(dead_code)] // Shared across integration test crates; each uses only a subset.
use gesture_core::{SnapshotRecord, VECTOR_DIM};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

/// Resolve the built `gestured` binary path for integration tests.
///
/// Some harnesses expose `CARGO_BIN_EXE_gestured` at runtime, others
/// only via compile-time `env!`. Prefer runtime if present; fall back
/// to compile-time.
pub fn gestured_exe() -> PathBuf {
    if let Ok(v) = std::env::var("CARGO_BIN_EXE_gestured") {
        return PathBuf::from(v);
    }
    PathBuf::from(env!("CARGO_BIN_EXE_gestured"))
}

/// Run one gestured command with an optional stdin body.
pub fn run_gestured(args: &[&str], stdin_body: Option<&str>) -> Output {
    let mut cmd = Command::new(gestured_exe());
    cmd.args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = cmd.spawn().expect("failed to spawn gestured");
    if let Some(body) = stdin_body {
        use std::io::Write;
        child
            .stdin
            .as_mut()
            .expect("stdin piped")
            .write_all(body.as_bytes())
            .expect("write stdin");
    }
    drop(child.stdin.take());
    child.wait_with_output().expect("failed to run gestured")
}

pub fn stdout_json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "stdout is not JSON ({}): {}",
            e,
            String::from_utf8_lossy(&output.stdout)
        )
    })
}

pub fn full_vector(seed: f32) -> Vec<f32> {
    (0..VECTOR_DIM).map(|i| seed + i as f32 * 0.01).collect()
}

pub fn snapshot_path(data_root: &Path) -> PathBuf {
    data_root.join("gesture_data.json")
}

pub fn write_snapshot(data_root: &Path, records: &[SnapshotRecord]) {
    fs::create_dir_all(data_root).expect("create data root");
    let bytes = serde_json::to_vec_pretty(records).expect("serialize snapshot");
    fs::write(snapshot_path(data_root), bytes).expect("write snapshot");
}

pub fn read_snapshot(data_root: &Path) -> Vec<SnapshotRecord> {
    let bytes = fs::read(snapshot_path(data_root)).expect("read snapshot");
    serde_json::from_slice(&bytes).expect("parse snapshot")
}

pub fn record(label: &str, seed: f32) -> SnapshotRecord {
    SnapshotRecord {
        label: label.to_string(),
        landmarks: full_vector(seed),
    }
}

pub fn events_log_path(data_root: &Path) -> PathBuf {
    data_root.join("logs").join("events.jsonl")
}

pub fn read_event_payloads(data_root: &Path) -> Vec<serde_json::Value> {
    gesture_event_log::read_events(events_log_path(data_root)).expect("read event log")
}

pub fn find_event(events: &[serde_json::Value], event_type: &str) -> serde_json::Value {
    for event in events {
        if event["event"]["event_type"].as_str() == Some(event_type) {
            return event.clone();
        }
    }
    panic!("missing {}", event_type);
}
