//! Shared helpers for the gesture service: canonical JSON bytes,
//! sha256 refs, and the advisory lock file. Canonicalization sorts
//! object keys recursively so the same logical value always hashes to
//! the same ref, regardless of the key order a producer happened to
//! emit.

use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

#[derive(Debug)]
pub enum CanonError {
    Json(serde_json::Error),
}

impl fmt::Display for CanonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CanonError::Json(e) => write!(f, "json: {}", e),
        }
    }
}

impl std::error::Error for CanonError {}

impl From<serde_json::Error> for CanonError {
    fn from(value: serde_json::Error) -> Self {
        CanonError::Json(value)
    }
}

/// Compute sha256 of bytes, returning a "sha256:<hex>" ref string.
pub fn sha256_ref(bytes: &[u8]) -> String {
    let mut h = Sha256::new();
    h.update(bytes);
    format!("sha256:{}", hex::encode(h.finalize()))
}

/// Serialize a JSON value to canonical bytes: objects with keys sorted
/// lexicographically at every depth, compact separators.
pub fn canonical_json_bytes(v: &Value) -> Result<Vec<u8>, CanonError> {
    fn canonicalize_value(v: &Value) -> Value {
        match v {
            Value::Object(map) => {
                let mut keys: Vec<_> = map.iter().collect();
                keys.sort_by(|a, b| a.0.cmp(b.0));
                let mut out = serde_json::Map::new();
                for (k, v) in keys {
                    out.insert(k.clone(), canonicalize_value(v));
                }
                Value::Object(out)
            }
            Value::Array(arr) => Value::Array(arr.iter().map(canonicalize_value).collect()),
            _ => v.clone(),
        }
    }

    let canon = canonicalize_value(v);
    Ok(serde_json::to_vec(&canon)?)
}

#[derive(Debug)]
pub enum LockError {
    /// A live holder kept the lock through the whole retry budget.
    Held {
        path: PathBuf,
        holder: Option<u32>,
    },
    Io(io::Error),
}

impl fmt::Display for LockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockError::Held {
                path,
                holder: Some(pid),
            } => write!(f, "lock held at {} by pid {}", path.display(), pid),
            LockError::Held { path, holder: None } => {
                write!(f, "lock held at {}", path.display())
            }
            LockError::Io(e) => write!(f, "io: {}", e),
        }
    }
}

impl std::error::Error for LockError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LockError::Io(e) => Some(e),
            LockError::Held { .. } => None,
        }
    }
}

impl From<io::Error> for LockError {
    fn from(value: io::Error) -> Self {
        LockError::Io(value)
    }
}

/// Advisory lock file: `create_new` wins, the holder pid is recorded
/// inside, released on guard drop. A lock whose recorded holder is no
/// longer running is treated as abandoned and reclaimed, so a holder
/// killed without unwinding does not wedge every later writer.
#[derive(Debug)]
pub struct LockFile {
    path: PathBuf,
}

impl LockFile {
    /// Acquire `path`, retrying `retries` times with `wait` between
    /// attempts while a live holder keeps it.
    pub fn acquire(path: &Path, retries: u32, wait: Duration) -> Result<Self, LockError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut attempts = 0;
        loop {
            match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(path)
            {
                Ok(mut file) => {
                    // Best effort; an unreadable pid only disables
                    // stale-holder reclaim for this lock.
                    let _ = write!(file, "{}", std::process::id());
                    return Ok(Self {
                        path: path.to_path_buf(),
                    });
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    let holder = read_holder(path);
                    if let Some(pid) = holder {
                        if !holder_alive(pid) {
                            let _ = fs::remove_file(path);
                            continue;
                        }
                    }
                    if attempts >= retries {
                        return Err(LockError::Held {
                            path: path.to_path_buf(),
                            holder,
                        });
                    }
                    attempts += 1;
                    thread::sleep(wait);
                }
                Err(e) => return Err(LockError::Io(e)),
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

fn read_holder(path: &Path) -> Option<u32> {
    fs::read_to_string(path).ok()?.trim().parse().ok()
}

#[cfg(target_os = "linux")]
fn holder_alive(pid: u32) -> bool {
    Path::new("/proc").join(pid.to_string()).exists()
}

#[cfg(not(target_os = "linux"))]
fn holder_alive(_pid: u32) -> bool {
    // No portable liveness probe; rely on the retry budget.
    true
}
