//! Service error taxonomy and its mapping to a caller status class.

use gesture_core::LandmarkError;
use std::fmt;

/// Snapshot read/write failure: stable reason code plus the underlying
/// cause as free text.
#[derive(Debug)]
pub struct StorageError {
    reason: &'static str,
    detail: Option<String>,
}

impl StorageError {
    pub fn new(reason: &'static str) -> Self {
        Self {
            reason,
            detail: None,
        }
    }

    pub fn with_detail(reason: &'static str, detail: String) -> Self {
        Self {
            reason,
            detail: Some(detail),
        }
    }

    pub fn reason(&self) -> &'static str {
        self.reason
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.detail.as_ref() {
            Some(detail) => write!(f, "{}: {}", self.reason, detail),
            None => write!(f, "{}", self.reason),
        }
    }
}

impl std::error::Error for StorageError {}

/// Status class a failure maps to at the interface boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// Caller-caused; the request had no side effects.
    ClientError,
    /// Service-side; for mutating operations the snapshot's durability
    /// is undefined and the caller must treat the result as unknown.
    ServerError,
}

#[derive(Debug)]
pub enum ServiceError {
    /// Caller-caused: wrong landmark count, missing/empty label,
    /// non-list body. Reported verbatim.
    Validation(String),
    /// Classifier artifact not loaded at startup. Re-reported for
    /// every inference request until restart; never retried.
    Unavailable(String),
    /// Snapshot read/write failed.
    Storage(StorageError),
    /// Anything else, converted at the boundary with its message.
    Internal(String),
}

impl ServiceError {
    pub fn status_class(&self) -> StatusClass {
        match self {
            ServiceError::Validation(_) => StatusClass::ClientError,
            ServiceError::Unavailable(_) | ServiceError::Storage(_) | ServiceError::Internal(_) => {
                StatusClass::ServerError
            }
        }
    }

    /// Stable event-log code for this failure.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => "validation_error",
            ServiceError::Unavailable(_) => "resource_unavailable",
            ServiceError::Storage(_) => "storage_error",
            ServiceError::Internal(_) => "internal_error",
        }
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::Validation(msg) => write!(f, "{}", msg),
            ServiceError::Unavailable(msg) => write!(f, "{}", msg),
            ServiceError::Storage(e) => write!(f, "{}", e),
            ServiceError::Internal(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServiceError::Storage(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StorageError> for ServiceError {
    fn from(e: StorageError) -> Self {
        ServiceError::Storage(e)
    }
}

impl From<LandmarkError> for ServiceError {
    fn from(e: LandmarkError) -> Self {
        ServiceError::Validation(e.to_string())
    }
}
