//! Classify through the binary exercises the unavailable-classifier
//! path (no artifact exists in a scratch root); the full inference
//! path runs against an injected classifier through the library seam.

use gestured::{
    Classifier, ClassifierError, ClassifyRequest, EventSink, GestureService, ServiceConfig,
    ServiceError, StatusClass,
};
use serde_json::json;

mod common;

#[test]
fn classify_without_artifact_is_server_error() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().to_string_lossy().to_string();

    let body = json!({ "landmarks": common::full_vector(0.5) }).to_string();
    let output = common::run_gestured(&["classify", "--data", &root], Some(&body));
    assert_eq!(output.status.code(), Some(1), "{:?}", output);

    let response = common::stdout_json(&output);
    assert!(response["error"].is_string());

    let events = common::read_event_payloads(dir.path());
    common::find_event(&events, "classifier_unavailable");
}

#[test]
fn classify_reads_body_from_input_file() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().to_string_lossy().to_string();
    let input_path = dir.path().join("request.json");
    std::fs::write(
        &input_path,
        json!({ "landmarks": common::full_vector(0.5) }).to_string(),
    )
    .unwrap();

    // Still unavailable (no artifact), but the body must be consumed
    // from the file: a bad path is a distinct, client-side failure.
    let output = common::run_gestured(
        &[
            "classify",
            "--data",
            &root,
            "--input",
            &input_path.to_string_lossy(),
        ],
        None,
    );
    assert_eq!(output.status.code(), Some(1), "{:?}", output);

    let missing = common::run_gestured(
        &["classify", "--data", &root, "--input", "no-such-file.json"],
        None,
    );
    assert_eq!(missing.status.code(), Some(2), "{:?}", missing);
}

/// Deterministic stand-in for the trained artifact.
struct FixedClassifier {
    labels: Vec<String>,
}

impl Classifier for FixedClassifier {
    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn classify(&self, features: &[f32]) -> Result<String, ClassifierError> {
        let idx = usize::from(features[0] < 0.0);
        Ok(self.labels[idx].clone())
    }
}

fn service_with_fixed_classifier(data_root: &std::path::Path) -> GestureService {
    GestureService::with_classifier(
        data_root,
        &ServiceConfig::default(),
        Box::new(FixedClassifier {
            labels: vec!["open".to_string(), "fist".to_string()],
        }),
        EventSink::new(data_root, "itest".to_string()),
    )
}

#[test]
fn classify_returns_label_from_known_set() {
    let dir = tempfile::tempdir().unwrap();
    let service = service_with_fixed_classifier(dir.path());

    let request = ClassifyRequest {
        landmarks: Some(json!(common::full_vector(0.5))),
    };
    let response = service.classify(&request).unwrap();
    assert!(["open", "fist"].contains(&response.name.as_str()));
}

#[test]
fn classify_wrong_length_names_expected_and_actual() {
    let dir = tempfile::tempdir().unwrap();
    let service = service_with_fixed_classifier(dir.path());

    let request = ClassifyRequest {
        landmarks: Some(json!(vec![1.0; 40])),
    };
    let err = service.classify(&request).unwrap_err();
    assert_eq!(err.status_class(), StatusClass::ClientError);
    let msg = err.to_string();
    assert!(msg.contains("63"), "{}", msg);
    assert!(msg.contains("40"), "{}", msg);
}

#[test]
fn classify_is_independent_of_stored_samples() {
    let dir = tempfile::tempdir().unwrap();
    let service = service_with_fixed_classifier(dir.path());

    service.wipe().unwrap();
    assert_eq!(service.labels().unwrap(), Vec::<String>::new());

    let request = ClassifyRequest {
        landmarks: Some(json!(common::full_vector(0.5))),
    };
    assert!(service.classify(&request).is_ok());
}

#[test]
fn classify_missing_landmarks_key_is_client_error() {
    let dir = tempfile::tempdir().unwrap();
    let service = service_with_fixed_classifier(dir.path());

    let err = service
        .classify(&ClassifyRequest { landmarks: None })
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}
