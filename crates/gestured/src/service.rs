//! Service operations: classify, merge, wipe, labels.
//!
//! Every operation is a single synchronous transaction. The gesture
//! store is rebuilt from the persisted snapshot at the start of each
//! operation and never cached across requests; merge and wipe hold the
//! snapshot lock across their whole load-transform-save cycle.

use crate::classifier::{Classifier, ClassifierError, OnnxClassifier};
use crate::config::{load_config, ServiceConfig};
use crate::contract::{ClassifyRequest, ClassifyResponse, MergeResponse, MessageResponse};
use crate::error::ServiceError;
use crate::events::{EventSink, ServiceEvent};
use crate::snapshot_store::{FileSnapshotStore, SnapshotStore};
use gesture_core::{ensure_vector_dim, flatten_payload, GestureStore};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

struct ArtifactPaths {
    model: PathBuf,
    labels: PathBuf,
}

pub struct GestureService {
    store: FileSnapshotStore,
    /// Artifact locations, resolved to a classifier on first
    /// inference. `None` when a classifier was injected directly.
    artifact: Option<ArtifactPaths>,
    /// The loaded classifier, or the load failure re-reported to
    /// every inference request until restart.
    classifier: OnceLock<Result<Box<dyn Classifier>, String>>,
    events: EventSink,
}

impl GestureService {
    /// Open the service over a data root: load config and bind the
    /// snapshot store. The classifier artifact is not touched here;
    /// it loads on the first inference, so store operations in a
    /// model-less deployment stay quiet.
    pub fn open(
        data_root: &Path,
        model_override: Option<&Path>,
        events: EventSink,
    ) -> Result<Self, ServiceError> {
        let config = load_config(data_root)?;
        let store = store_from_config(data_root, &config);

        let model = match model_override {
            Some(path) => path.to_path_buf(),
            None => config.model_path(data_root),
        };
        let artifact = ArtifactPaths {
            model,
            labels: config.label_path(data_root),
        };

        Ok(Self {
            store,
            artifact: Some(artifact),
            classifier: OnceLock::new(),
            events,
        })
    }

    /// Build a service with an injected classifier; the seam used by
    /// tests and by embedders that bring their own model runtime.
    pub fn with_classifier(
        data_root: &Path,
        config: &ServiceConfig,
        classifier: Box<dyn Classifier>,
        events: EventSink,
    ) -> Self {
        let slot = OnceLock::new();
        let _ = slot.set(Ok(classifier));
        Self {
            store: store_from_config(data_root, config),
            artifact: None,
            classifier: slot,
            events,
        }
    }

    /// Resolve the classifier, loading the artifact on first use. A
    /// load failure is logged once and re-reported to every later
    /// inference request.
    fn resolve_classifier(&self) -> &Result<Box<dyn Classifier>, String> {
        self.classifier.get_or_init(|| {
            let paths = match &self.artifact {
                Some(paths) => paths,
                None => return Err("no classifier configured".to_string()),
            };
            match OnnxClassifier::load(&paths.model, &paths.labels) {
                Ok(classifier) => Ok(Box::new(classifier) as Box<dyn Classifier>),
                Err(e) => {
                    let detail = e.to_string();
                    self.events.emit(&ServiceEvent::ClassifierUnavailable {
                        detail: detail.clone(),
                    });
                    Err(detail)
                }
            }
        })
    }

    /// Validate and flatten a landmark payload, run the classifier,
    /// return the label. No caching: every request is computed.
    pub fn classify(&self, request: &ClassifyRequest) -> Result<ClassifyResponse, ServiceError> {
        let result = self.classify_inner(request);
        match &result {
            Ok(response) => self.events.emit(&ServiceEvent::ClassifyCompleted {
                name: response.name.clone(),
            }),
            Err(e) => self.emit_failure("classify", e),
        }
        result
    }

    fn classify_inner(&self, request: &ClassifyRequest) -> Result<ClassifyResponse, ServiceError> {
        let classifier = match self.resolve_classifier() {
            Ok(classifier) => classifier.as_ref(),
            Err(detail) => return Err(ServiceError::Unavailable(detail.clone())),
        };

        let payload = request
            .landmarks
            .as_ref()
            .ok_or_else(|| ServiceError::Validation("missing landmarks in request".to_string()))?;

        let features = flatten_payload(payload)?;
        ensure_vector_dim(&features)?;

        let name = classifier.classify(&features).map_err(|e| match e {
            ClassifierError::Load(msg) => ServiceError::Unavailable(msg),
            ClassifierError::Run(msg) => ServiceError::Internal(msg),
        })?;

        Ok(ClassifyResponse { name })
    }

    /// Merge candidate samples into the store: load the whole
    /// snapshot, upsert per label (last write wins), write the whole
    /// snapshot back. Unusable candidates are skipped and counted.
    pub fn merge(&self, body: &serde_json::Value) -> Result<MergeResponse, ServiceError> {
        let result = self.merge_inner(body);
        match &result {
            Ok((response, total_labels)) => self.events.emit(&ServiceEvent::SamplesMerged {
                merged: response.merged,
                skipped: response.skipped,
                total_labels: *total_labels,
            }),
            Err(e) => self.emit_failure("merge", e),
        }
        result.map(|(response, _)| response)
    }

    fn merge_inner(
        &self,
        body: &serde_json::Value,
    ) -> Result<(MergeResponse, usize), ServiceError> {
        let candidates = body.as_array().ok_or_else(|| {
            ServiceError::Validation("invalid data format: expected a list of samples".to_string())
        })?;

        let _lock = self.store.lock()?;
        let mut store = GestureStore::from_snapshot(self.store.load()?);
        let outcome = store.merge(candidates);
        self.store.save(&store.to_snapshot())?;

        let response = MergeResponse {
            message: "Data saved successfully".to_string(),
            merged: outcome.merged,
            skipped: outcome.skipped,
        };
        Ok((response, store.len()))
    }

    /// Reset the snapshot to empty.
    pub fn wipe(&self) -> Result<MessageResponse, ServiceError> {
        let result = self.wipe_inner();
        match &result {
            Ok(_) => self.events.emit(&ServiceEvent::SnapshotWiped),
            Err(e) => self.emit_failure("wipe", e),
        }
        result
    }

    fn wipe_inner(&self) -> Result<MessageResponse, ServiceError> {
        let _lock = self.store.lock()?;
        self.store.wipe()?;
        Ok(MessageResponse {
            message: "Gesture data deleted successfully".to_string(),
        })
    }

    /// List the known labels. Missing or empty snapshot is an empty
    /// list, never an error.
    pub fn labels(&self) -> Result<Vec<String>, ServiceError> {
        let result = self
            .store
            .load()
            .map(|snapshot| GestureStore::from_snapshot(snapshot).labels())
            .map_err(ServiceError::from);
        match &result {
            Ok(labels) => self.events.emit(&ServiceEvent::LabelsListed {
                count: labels.len(),
            }),
            Err(e) => self.emit_failure("labels", e),
        }
        result
    }

    fn emit_failure(&self, operation: &'static str, error: &ServiceError) {
        self.events.emit(&ServiceEvent::OperationFailed {
            operation,
            code: error.code(),
            detail: error.to_string(),
        });
    }
}

fn store_from_config(data_root: &Path, config: &ServiceConfig) -> FileSnapshotStore {
    FileSnapshotStore::new(
        config.snapshot_path(data_root),
        config.lock_retries,
        Duration::from_millis(config.lock_wait_ms),
    )
}
