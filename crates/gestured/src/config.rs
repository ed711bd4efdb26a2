//! Service configuration: one JSON file under the data root, loaded
//! with defaults when absent.

use crate::error::StorageError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_SCHEMA: &str = "gestured.config.v1";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct ServiceConfig {
    pub schema: String,
    /// Snapshot file, relative to the data root.
    #[serde(default = "default_snapshot_file")]
    pub snapshot_file: String,
    /// Classifier artifact, relative to the data root.
    #[serde(default = "default_model_file")]
    pub model_file: String,
    /// Sidecar label table (JSON array, score-index order), relative
    /// to the data root.
    #[serde(default = "default_label_file")]
    pub label_file: String,
    /// Attempts to acquire the snapshot lock before giving up.
    #[serde(default = "default_lock_retries")]
    pub lock_retries: u32,
    /// Wait between lock attempts, milliseconds.
    #[serde(default = "default_lock_wait_ms")]
    pub lock_wait_ms: u64,
}

fn default_snapshot_file() -> String {
    "gesture_data.json".to_string()
}

fn default_model_file() -> String {
    "model/gesture_model.onnx".to_string()
}

fn default_label_file() -> String {
    "model/gesture_labels.json".to_string()
}

fn default_lock_retries() -> u32 {
    50
}

fn default_lock_wait_ms() -> u64 {
    20
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            schema: CONFIG_SCHEMA.to_string(),
            snapshot_file: default_snapshot_file(),
            model_file: default_model_file(),
            label_file: default_label_file(),
            lock_retries: default_lock_retries(),
            lock_wait_ms: default_lock_wait_ms(),
        }
    }
}

impl ServiceConfig {
    pub fn snapshot_path(&self, data_root: &Path) -> PathBuf {
        data_root.join(&self.snapshot_file)
    }

    pub fn model_path(&self, data_root: &Path) -> PathBuf {
        data_root.join(&self.model_file)
    }

    pub fn label_path(&self, data_root: &Path) -> PathBuf {
        data_root.join(&self.label_file)
    }
}

fn config_path(data_root: &Path) -> PathBuf {
    data_root.join("config.json")
}

/// Load the service config, falling back to defaults when the file
/// does not exist. Unparseable content or a schema mismatch is an
/// error, not a silent default.
pub fn load_config(data_root: &Path) -> Result<ServiceConfig, StorageError> {
    let path = config_path(data_root);
    if !path.exists() {
        return Ok(ServiceConfig::default());
    }
    let bytes = fs::read(&path)
        .map_err(|e| StorageError::with_detail("config_read_failed", e.to_string()))?;
    let config: ServiceConfig = serde_json::from_slice(&bytes)
        .map_err(|e| StorageError::with_detail("config_invalid", e.to_string()))?;
    if config.schema != CONFIG_SCHEMA {
        return Err(StorageError::with_detail(
            "config_invalid",
            format!("expected schema {}, got {}", CONFIG_SCHEMA, config.schema),
        ));
    }
    Ok(config)
}
