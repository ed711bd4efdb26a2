//! gestured — gesture sample store and recognition service.
//!
//! Four operations over one data root: classify a landmark payload
//! against a pre-trained classifier artifact, merge labeled samples
//! into the per-label gesture store, wipe the store, and list known
//! labels. The persisted snapshot is the single source of truth;
//! mutating operations serialize on an advisory lock around it.

pub mod classifier;
pub mod cli;
pub mod command;
pub mod config;
pub mod contract;
pub mod error;
pub mod events;
pub mod service;
pub mod snapshot_store;

pub use crate::classifier::{Classifier, ClassifierError, OnnxClassifier};
pub use crate::config::{load_config, ServiceConfig, CONFIG_SCHEMA};
pub use crate::contract::{
    ClassifyRequest, ClassifyResponse, ErrorResponse, MergeResponse, MessageResponse,
};
pub use crate::error::{ServiceError, StatusClass, StorageError};
pub use crate::events::{EventSink, ServiceEvent, EVENT_SCHEMA};
pub use crate::service::GestureService;
pub use crate::snapshot_store::{FileSnapshotStore, Snapshot, SnapshotLock, SnapshotStore};

pub fn run() -> std::process::ExitCode {
    cli::run()
}
