//! Structured operation events, appended to the hash-chained log under
//! `<root>/logs/events.jsonl`.
//!
//! Emission is best effort: a failed append must never fail the
//! operation it describes, so sink errors go to stderr only.

use gesture_event_log::EventAppender;
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const EVENT_SCHEMA: &str = "gestured.events.v1";

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case", tag = "event_type")]
pub enum ServiceEvent {
    ClassifierUnavailable {
        detail: String,
    },
    ClassifyCompleted {
        name: String,
    },
    SamplesMerged {
        merged: usize,
        skipped: usize,
        total_labels: usize,
    },
    SnapshotWiped,
    LabelsListed {
        count: usize,
    },
    OperationFailed {
        operation: &'static str,
        code: &'static str,
        detail: String,
    },
}

#[derive(Debug, Serialize)]
struct EventEnvelope<'a> {
    schema: &'static str,
    request_id: &'a str,
    event: &'a ServiceEvent,
}

/// Appends envelope-wrapped events for one request.
pub struct EventSink {
    log_path: PathBuf,
    request_id: String,
}

impl EventSink {
    pub fn new(data_root: &Path, request_id: String) -> Self {
        Self {
            log_path: data_root.join("logs").join("events.jsonl"),
            request_id,
        }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn emit(&self, event: &ServiceEvent) {
        let envelope = EventEnvelope {
            schema: EVENT_SCHEMA,
            request_id: &self.request_id,
            event,
        };
        let result =
            EventAppender::open(&self.log_path).and_then(|mut appender| appender.append(&envelope));
        if let Err(e) = result {
            eprintln!("event log append failed: {}", e);
        }
    }
}
