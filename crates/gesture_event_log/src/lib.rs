//! Hash-chained JSONL event log for the gesture service.
//!
//! Each line is a record carrying the event payload plus `prev_hash`
//! and `hash`, where `hash = sha256(canonical({prev_hash, event}))`.
//! Opening a log verifies the whole chain before appending, so a
//! truncated or edited log is detected at the next startup rather
//! than silently extended. Appenders in separate processes serialize
//! on a sibling `.lock` file and re-read the chain head under it, so
//! concurrent writers extend one chain instead of forking it.

use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use gesture_common::{canonical_json_bytes, sha256_ref, CanonError, LockFile};

/// Hash of the empty chain; the first record's `prev_hash`.
pub const GENESIS_HASH: &str = "sha256:";

const LOCK_RETRIES: u32 = 50;
const LOCK_WAIT: Duration = Duration::from_millis(10);

#[derive(Debug, thiserror::Error)]
pub enum EventLogError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("canon: {0}")]
    Canon(#[from] CanonError),
    #[error("hash chain broken at line {line}: expected {expected}, got {got}")]
    HashChainBroken {
        line: usize,
        expected: String,
        got: String,
    },
    #[error("log lock unavailable: {0}")]
    LockUnavailable(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub prev_hash: String,
    pub hash: String,
    pub event: serde_json::Value,
}

pub struct EventAppender {
    path: PathBuf,
    file: File,
    last_hash: String,
}

impl EventAppender {
    /// Open (or create) a log, verifying the existing chain first.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, EventLogError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Verify under the lock so a write in flight elsewhere is not
        // misread as a broken chain.
        let _lock = acquire_log_lock(&path)?;
        let last_hash = verify_log(&path)?;
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            path,
            file,
            last_hash,
        })
    }

    pub fn last_hash(&self) -> &str {
        &self.last_hash
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one event, returning the new chain head hash.
    ///
    /// The chain head is re-read from disk under the log lock, so an
    /// appender whose in-memory head went stale while another process
    /// wrote extends the chain instead of forking it.
    pub fn append<T: Serialize>(&mut self, event: &T) -> Result<String, EventLogError> {
        let event_value = serde_json::to_value(event)?;

        let _lock = acquire_log_lock(&self.path)?;
        self.last_hash = tail_hash(&self.path)?;

        let payload = serde_json::json!({
            "prev_hash": self.last_hash,
            "event": event_value
        });
        let canon = canonical_json_bytes(&payload)?;
        let new_hash = sha256_ref(&canon);

        let record = EventRecord {
            prev_hash: self.last_hash.clone(),
            hash: new_hash.clone(),
            event: event_value,
        };

        let mut line = serde_json::to_vec(&record)?;
        line.push(b'\n');
        self.file.write_all(&line)?;
        self.file.flush()?;

        self.last_hash = new_hash.clone();
        Ok(new_hash)
    }
}

fn acquire_log_lock(path: &Path) -> Result<LockFile, EventLogError> {
    LockFile::acquire(&lock_path(path), LOCK_RETRIES, LOCK_WAIT)
        .map_err(|e| EventLogError::LockUnavailable(e.to_string()))
}

fn lock_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "events".to_string());
    name.push_str(".lock");
    path.with_file_name(name)
}

/// Last recorded hash, without verifying the chain. `GENESIS_HASH`
/// for a missing or empty log.
fn tail_hash(path: &Path) -> Result<String, EventLogError> {
    if !path.exists() {
        return Ok(GENESIS_HASH.to_string());
    }

    let f = File::open(path)?;
    let rdr = BufReader::new(f);
    let mut last = GENESIS_HASH.to_string();
    for line in rdr.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: EventRecord = serde_json::from_str(&line)?;
        last = record.hash;
    }
    Ok(last)
}

/// Walk the whole log and verify the chain. Returns the last hash,
/// or [`GENESIS_HASH`] for a missing or empty log.
pub fn verify_log(path: impl AsRef<Path>) -> Result<String, EventLogError> {
    let path = path.as_ref();

    if !path.exists() {
        return Ok(GENESIS_HASH.to_string());
    }

    let f = File::open(path)?;
    let rdr = BufReader::new(f);

    let mut expected_prev = GENESIS_HASH.to_string();
    let mut last_hash = expected_prev.clone();

    for (i, line) in rdr.lines().enumerate() {
        let line_no = i + 1;
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let record: EventRecord = serde_json::from_str(&line)?;

        if record.prev_hash != expected_prev {
            return Err(EventLogError::HashChainBroken {
                line: line_no,
                expected: expected_prev,
                got: record.prev_hash,
            });
        }

        let payload = serde_json::json!({
            "prev_hash": record.prev_hash,
            "event": record.event
        });
        let canon = canonical_json_bytes(&payload)?;
        let recomputed = sha256_ref(&canon);

        if recomputed != record.hash {
            return Err(EventLogError::HashChainBroken {
                line: line_no,
                expected: recomputed,
                got: record.hash,
            });
        }

        expected_prev = record.hash.clone();
        last_hash = record.hash;
    }

    Ok(last_hash)
}

/// Read all event payloads from a log without verifying the chain.
pub fn read_events(path: impl AsRef<Path>) -> Result<Vec<serde_json::Value>, EventLogError> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(Vec::new());
    }

    let f = File::open(path)?;
    let rdr = BufReader::new(f);
    let mut events = Vec::new();
    for line in rdr.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: EventRecord = serde_json::from_str(&line)?;
        events.push(record.event);
    }
    Ok(events)
}
