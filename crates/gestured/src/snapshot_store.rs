//! Persistence gateway for the gesture snapshot.
//!
//! The snapshot file is the sole source of truth: a plain JSON array
//! of {label, landmarks} records, replaced wholesale on every save.
//! The backing medium sits behind [`SnapshotStore`] so merge logic
//! never touches the filesystem directly.

use crate::error::StorageError;
use gesture_common::{LockError, LockFile};
use gesture_core::SnapshotRecord;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub type Snapshot = Vec<SnapshotRecord>;

/// Durable load/save of the full snapshot. `save` then `load` must
/// reproduce the same labels and numeric values.
pub trait SnapshotStore {
    /// A missing storage resource is an empty snapshot, not an error.
    fn load(&self) -> Result<Snapshot, StorageError>;

    /// Atomic full overwrite; partial or merged writes do not exist at
    /// this layer.
    fn save(&self, snapshot: &Snapshot) -> Result<(), StorageError>;

    fn wipe(&self) -> Result<(), StorageError> {
        self.save(&Vec::new())
    }
}

/// Snapshot persistence over a single JSON file.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    path: PathBuf,
    lock_retries: u32,
    lock_wait: Duration,
}

impl FileSnapshotStore {
    pub fn new(path: PathBuf, lock_retries: u32, lock_wait: Duration) -> Self {
        Self {
            path,
            lock_retries,
            lock_wait,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Acquire the advisory lock serializing snapshot mutations.
    ///
    /// A sibling `.lock` file records the holder pid and is released
    /// on guard drop; a lock left behind by a dead holder is
    /// reclaimed. Mutating operations (merge, wipe) must hold this
    /// across their load-transform-save cycle so a slower writer
    /// cannot overwrite a faster one's update.
    pub fn lock(&self) -> Result<SnapshotLock, StorageError> {
        match LockFile::acquire(&self.lock_path(), self.lock_retries, self.lock_wait) {
            Ok(lock) => Ok(SnapshotLock { _lock: lock }),
            Err(e @ LockError::Held { .. }) => Err(StorageError::with_detail(
                "snapshot_lock_timeout",
                e.to_string(),
            )),
            Err(e) => Err(StorageError::with_detail(
                "snapshot_lock_failed",
                e.to_string(),
            )),
        }
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "snapshot".to_string());
        name.push_str(".lock");
        self.path.with_file_name(name)
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn load(&self) -> Result<Snapshot, StorageError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let bytes = fs::read(&self.path)
            .map_err(|e| StorageError::with_detail("snapshot_read_failed", e.to_string()))?;
        let snapshot: Snapshot = serde_json::from_slice(&bytes)
            .map_err(|e| StorageError::with_detail("snapshot_invalid", e.to_string()))?;
        Ok(snapshot)
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| StorageError::with_detail("snapshot_write_failed", e.to_string()))?;
        }

        let bytes = serde_json::to_vec_pretty(snapshot)
            .map_err(|e| StorageError::with_detail("snapshot_write_failed", e.to_string()))?;

        // Write-to-temp then rename: readers never observe a torn file.
        let tmp_path = self.path.with_extension("json.tmp");
        let mut file = fs::File::create(&tmp_path)
            .map_err(|e| StorageError::with_detail("snapshot_write_failed", e.to_string()))?;
        file.write_all(&bytes)
            .map_err(|e| StorageError::with_detail("snapshot_write_failed", e.to_string()))?;
        file.sync_all()
            .map_err(|e| StorageError::with_detail("snapshot_write_failed", e.to_string()))?;
        if let Err(e) = fs::rename(&tmp_path, &self.path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(StorageError::with_detail(
                "snapshot_write_failed",
                e.to_string(),
            ));
        }
        Ok(())
    }
}

/// Held while a snapshot mutation is in flight; releases on drop.
#[derive(Debug)]
pub struct SnapshotLock {
    _lock: LockFile,
}
