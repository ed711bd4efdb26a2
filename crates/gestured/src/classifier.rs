//! Classifier seam and its ONNX implementation.
//!
//! The artifact is an externally trained, opaque resource: it is
//! loaded at most once per process, on first inference, shared
//! immutably afterwards and never reloaded per request. A sidecar
//! JSON array pins
//! score-index -> label, since the artifact's internals are the
//! trainer's contract, not ours.

use std::fmt;
use std::path::Path;

#[cfg(feature = "onnx")]
use ort::session::{builder::GraphOptimizationLevel, Session};
#[cfg(feature = "onnx")]
use ort::value::Tensor as OrtTensor;

use gesture_core::VECTOR_DIM;

#[derive(Debug)]
pub enum ClassifierError {
    /// The artifact (or its label sidecar) could not be loaded at
    /// startup. Every classify call fails until restart.
    Load(String),
    /// Classification itself failed, e.g. an internal shape mismatch.
    Run(String),
}

impl fmt::Display for ClassifierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassifierError::Load(msg) => write!(f, "classifier not loaded: {}", msg),
            ClassifierError::Run(msg) => write!(f, "classification failed: {}", msg),
        }
    }
}

impl std::error::Error for ClassifierError {}

/// Maps one 63-value landmark vector to exactly one label. One query
/// per call; batching is never used.
pub trait Classifier: Send + Sync {
    fn labels(&self) -> &[String];
    fn classify(&self, features: &[f32]) -> Result<String, ClassifierError>;
}

/// Load the sidecar label table: a JSON array of strings in
/// score-index order.
fn load_label_table(label_path: &Path) -> Result<Vec<String>, ClassifierError> {
    let bytes = std::fs::read(label_path).map_err(|e| {
        ClassifierError::Load(format!(
            "label table not readable at {}: {}",
            label_path.display(),
            e
        ))
    })?;
    let labels: Vec<String> = serde_json::from_slice(&bytes)
        .map_err(|e| ClassifierError::Load(format!("label table invalid: {}", e)))?;
    if labels.is_empty() {
        return Err(ClassifierError::Load("label table is empty".to_string()));
    }
    Ok(labels)
}

/// ONNX-backed classifier.
///
/// The session sits behind a mutex only because `Session::run` takes
/// `&mut self`; semantically the model is immutable after load.
#[cfg(feature = "onnx")]
pub struct OnnxClassifier {
    session: std::sync::Mutex<Session>,
    labels: Vec<String>,
}

#[cfg(feature = "onnx")]
impl OnnxClassifier {
    pub fn load(model_path: &Path, label_path: &Path) -> Result<Self, ClassifierError> {
        if !model_path.exists() {
            return Err(ClassifierError::Load(format!(
                "model file not found: {}",
                model_path.display()
            )));
        }

        let labels = load_label_table(label_path)?;

        let session = Session::builder()
            .map_err(|e| ClassifierError::Load(format!("failed to create session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| ClassifierError::Load(format!("failed to set optimization level: {}", e)))?
            .commit_from_file(model_path)
            .map_err(|e| ClassifierError::Load(format!("failed to load model: {}", e)))?;

        Ok(Self {
            session: std::sync::Mutex::new(session),
            labels,
        })
    }
}

#[cfg(feature = "onnx")]
impl Classifier for OnnxClassifier {
    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn classify(&self, features: &[f32]) -> Result<String, ClassifierError> {
        let input = ndarray::Array2::from_shape_vec((1, VECTOR_DIM), features.to_vec())
            .map_err(|e| ClassifierError::Run(format!("input reshape failed: {}", e)))?;
        let input_tensor = OrtTensor::from_array(input)
            .map_err(|e| ClassifierError::Run(format!("failed to create input tensor: {}", e)))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| ClassifierError::Run("session lock poisoned".to_string()))?;
        let outputs = session
            .run(ort::inputs![input_tensor])
            .map_err(|e| ClassifierError::Run(format!("inference failed: {}", e)))?;

        let scores: ndarray::ArrayViewD<f32> = outputs[0]
            .try_extract_array()
            .map_err(|e| ClassifierError::Run(format!("failed to extract scores: {}", e)))?;

        let mut best: Option<(usize, f32)> = None;
        for (idx, &score) in scores.iter().enumerate() {
            match best {
                Some((_, s)) if score <= s => {}
                _ => best = Some((idx, score)),
            }
        }
        let (index, _) = best.ok_or_else(|| {
            ClassifierError::Run("model produced an empty score tensor".to_string())
        })?;

        self.labels.get(index).cloned().ok_or_else(|| {
            ClassifierError::Run(format!(
                "score index {} out of range for {} labels",
                index,
                self.labels.len()
            ))
        })
    }
}

/// Stub when ONNX support is not compiled in: loading always fails, so
/// the service reports the classifier as unavailable.
#[cfg(not(feature = "onnx"))]
pub struct OnnxClassifier;

#[cfg(not(feature = "onnx"))]
impl OnnxClassifier {
    pub fn load(model_path: &Path, label_path: &Path) -> Result<Self, ClassifierError> {
        // Surface the more actionable problem first.
        if !model_path.exists() {
            return Err(ClassifierError::Load(format!(
                "model file not found: {}",
                model_path.display()
            )));
        }
        let _ = load_label_table(label_path)?;
        Err(ClassifierError::Load(
            "onnx support not compiled; enable the 'onnx' feature".to_string(),
        ))
    }
}

#[cfg(not(feature = "onnx"))]
impl Classifier for OnnxClassifier {
    fn labels(&self) -> &[String] {
        &[]
    }

    fn classify(&self, _features: &[f32]) -> Result<String, ClassifierError> {
        Err(ClassifierError::Run(
            "onnx support not compiled; enable the 'onnx' feature".to_string(),
        ))
    }
}
