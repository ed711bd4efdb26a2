//! Gesture store: label-keyed landmark vectors with last-write-wins
//! merge, and the snapshot records it persists to.

use crate::landmark::{ensure_vector_dim, flatten_points, LandmarkError, LandmarkPoint};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One persisted record of the snapshot: the full snapshot is a plain
/// JSON array of these, which is the on-disk compatibility contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub label: String,
    pub landmarks: Vec<f32>,
}

/// Landmarks as a client may submit them: either a flat numeric vector
/// or 21 {x,y,z} records. One normalization step resolves this to a
/// flat vector before the length invariant is enforced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LandmarkInput {
    Flat(Vec<f32>),
    Points(Vec<LandmarkPoint>),
}

impl LandmarkInput {
    /// Resolve to a flat vector. Empty input and wrong flattened
    /// length are both rejected.
    pub fn into_vector(self) -> Result<Vec<f32>, LandmarkError> {
        let flat = match self {
            LandmarkInput::Flat(v) => v,
            LandmarkInput::Points(points) => flatten_points(&points),
        };
        if flat.is_empty() {
            return Err(LandmarkError::Empty);
        }
        ensure_vector_dim(&flat)?;
        Ok(flat)
    }
}

/// A labeled landmark sample submitted for merging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GestureSample {
    pub label: String,
    pub landmarks: LandmarkInput,
}

/// Counts reported by a merge: entries upserted vs entries skipped as
/// unusable (missing label, missing/empty/malformed landmarks).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeOutcome {
    pub merged: usize,
    pub skipped: usize,
}

/// In-memory gesture store: label -> landmark vector. Map key
/// uniqueness enforces at most one sample per label. Materialized
/// fresh from a snapshot for every operation; never cached.
#[derive(Debug, Clone, Default)]
pub struct GestureStore {
    entries: BTreeMap<String, Vec<f32>>,
}

impl GestureStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted records. Duplicate labels in the file
    /// resolve last-write-wins, same as the merge protocol.
    pub fn from_snapshot(records: Vec<SnapshotRecord>) -> Self {
        let mut entries = BTreeMap::new();
        for record in records {
            entries.insert(record.label, record.landmarks);
        }
        Self { entries }
    }

    /// Serialize to the persisted record list.
    pub fn to_snapshot(&self) -> Vec<SnapshotRecord> {
        self.entries
            .iter()
            .map(|(label, landmarks)| SnapshotRecord {
                label: label.clone(),
                landmarks: landmarks.clone(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn labels(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn get(&self, label: &str) -> Option<&[f32]> {
        self.entries.get(label).map(|v| v.as_slice())
    }

    /// Upsert one validated sample. An incoming sample always
    /// overwrites an existing one with the same label.
    pub fn insert(&mut self, label: String, vector: Vec<f32>) -> Result<(), LandmarkError> {
        ensure_vector_dim(&vector)?;
        self.entries.insert(label, vector);
        Ok(())
    }

    /// Merge a list of candidate samples. Unusable entries are skipped
    /// and counted, never fatal: a bad candidate must not block the
    /// rest of the batch.
    pub fn merge(&mut self, candidates: &[serde_json::Value]) -> MergeOutcome {
        let mut outcome = MergeOutcome::default();

        for candidate in candidates {
            let sample: GestureSample = match serde_json::from_value(candidate.clone()) {
                Ok(sample) => sample,
                Err(_) => {
                    outcome.skipped += 1;
                    continue;
                }
            };

            if sample.label.trim().is_empty() {
                outcome.skipped += 1;
                continue;
            }

            let vector = match sample.landmarks.into_vector() {
                Ok(vector) => vector,
                Err(_) => {
                    outcome.skipped += 1;
                    continue;
                }
            };

            self.entries.insert(sample.label, vector);
            outcome.merged += 1;
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::VECTOR_DIM;
    use serde_json::json;

    fn full_vector(seed: f32) -> Vec<f32> {
        (0..VECTOR_DIM).map(|i| seed + i as f32 * 0.01).collect()
    }

    fn sample_value(label: &str, seed: f32) -> serde_json::Value {
        json!({ "label": label, "landmarks": full_vector(seed) })
    }

    #[test]
    fn merge_is_idempotent_per_label() {
        let mut store = GestureStore::new();
        let outcome = store.merge(&[sample_value("fist", 1.0), sample_value("fist", 1.0)]);
        assert_eq!(outcome.merged, 2);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("fist").unwrap(), full_vector(1.0).as_slice());
    }

    #[test]
    fn merge_is_last_write_wins() {
        let mut store = GestureStore::new();
        store.merge(&[sample_value("fist", 1.0), sample_value("open", 2.0)]);
        let before = store.len();

        store.merge(&[sample_value("fist", 3.0)]);
        assert_eq!(store.len(), before);
        assert_eq!(store.get("fist").unwrap(), full_vector(3.0).as_slice());
        assert_eq!(store.get("open").unwrap(), full_vector(2.0).as_slice());
    }

    #[test]
    fn merge_flattens_point_records() {
        let points: Vec<serde_json::Value> = (0..21)
            .map(|i| json!({ "x": i as f32, "y": i as f32 + 0.1, "z": i as f32 + 0.2 }))
            .collect();
        let mut store = GestureStore::new();
        let outcome = store.merge(&[json!({ "label": "peace", "landmarks": points })]);

        assert_eq!(outcome.merged, 1);
        let stored = store.get("peace").unwrap();
        assert_eq!(stored.len(), VECTOR_DIM);
        assert_eq!(&stored[..6], &[0.0, 0.1, 0.2, 1.0, 1.1, 1.2]);
    }

    #[test]
    fn merge_skips_unusable_entries() {
        let mut store = GestureStore::new();
        let outcome = store.merge(&[
            json!({ "landmarks": full_vector(1.0) }),           // no label
            json!({ "label": "", "landmarks": full_vector(1.0) }), // empty label
            json!({ "label": "fist" }),                         // no landmarks
            json!({ "label": "fist", "landmarks": [] }),        // empty landmarks
            json!({ "label": "fist", "landmarks": [1.0, 2.0] }), // wrong length
            json!("not an object"),
            sample_value("open", 2.0),
        ]);

        assert_eq!(outcome.merged, 1);
        assert_eq!(outcome.skipped, 6);
        assert_eq!(store.labels(), vec!["open".to_string()]);
    }

    #[test]
    fn whitespace_label_is_skipped() {
        let mut store = GestureStore::new();
        let outcome = store.merge(&[json!({ "label": "  ", "landmarks": full_vector(1.0) })]);
        assert_eq!(outcome.merged, 0);
        assert_eq!(outcome.skipped, 1);
    }

    #[test]
    fn snapshot_round_trip_preserves_values() {
        let mut store = GestureStore::new();
        store.merge(&[sample_value("fist", 1.0), sample_value("open", 2.0)]);

        let records = store.to_snapshot();
        assert_eq!(records.len(), 2);

        let restored = GestureStore::from_snapshot(records);
        assert_eq!(restored.get("fist"), store.get("fist"));
        assert_eq!(restored.get("open"), store.get("open"));
    }

    #[test]
    fn from_snapshot_resolves_duplicate_labels_last_wins() {
        let records = vec![
            SnapshotRecord {
                label: "fist".to_string(),
                landmarks: full_vector(1.0),
            },
            SnapshotRecord {
                label: "fist".to_string(),
                landmarks: full_vector(2.0),
            },
        ];
        let store = GestureStore::from_snapshot(records);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("fist").unwrap(), full_vector(2.0).as_slice());
    }

    #[test]
    fn labels_have_no_duplicates() {
        let mut store = GestureStore::new();
        store.merge(&[
            sample_value("open", 1.0),
            sample_value("fist", 2.0),
            sample_value("open", 3.0),
        ]);
        let labels = store.labels();
        assert_eq!(labels.len(), 2);
        assert!(labels.contains(&"open".to_string()));
        assert!(labels.contains(&"fist".to_string()));
    }

    #[test]
    fn insert_rejects_wrong_length() {
        let mut store = GestureStore::new();
        let err = store.insert("fist".to_string(), vec![1.0, 2.0]).unwrap_err();
        assert!(matches!(
            err,
            LandmarkError::WrongLength {
                expected: 63,
                got: 2
            }
        ));
    }

    #[test]
    fn flat_and_point_inputs_deserialize_untagged() {
        let flat: LandmarkInput = serde_json::from_value(json!([1.0, 2.0, 3.0])).unwrap();
        assert!(matches!(flat, LandmarkInput::Flat(_)));

        let points: LandmarkInput =
            serde_json::from_value(json!([{ "x": 1.0, "y": 2.0, "z": 3.0 }])).unwrap();
        assert!(matches!(points, LandmarkInput::Points(_)));
    }
}
