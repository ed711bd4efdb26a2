//! Request and response bodies of the external interface.
//!
//! The shapes (`{"name"}`, `{"message"}`, `{"error"}`) are the wire
//! contract with existing clients and are kept exactly as they are.

use serde::{Deserialize, Serialize};

/// Classify request: a landmark payload of arbitrary nested numeric
/// structure. Extra keys are tolerated; a missing `landmarks` key is a
/// validation error, reported by the service rather than serde.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifyRequest {
    #[serde(default)]
    pub landmarks: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifyResponse {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeResponse {
    pub message: String,
    pub merged: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
