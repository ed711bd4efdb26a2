//! Gesture Core — hand-pose sample model and merge protocol.
//!
//! This crate is pure data, no I/O:
//! - 63-value landmark vectors (21 tracked points x x,y,z)
//! - normalization of the two accepted landmark shapes (flat vector,
//!   or 21 {x,y,z} records flattened point-major)
//! - the label-keyed gesture store with last-write-wins merge
//! - the persisted snapshot records

pub mod landmark;
pub mod store;

pub use landmark::{
    ensure_vector_dim, flatten_payload, flatten_points, LandmarkError, LandmarkPoint,
    LANDMARK_POINTS, VECTOR_DIM,
};
pub use store::{GestureSample, GestureStore, LandmarkInput, MergeOutcome, SnapshotRecord};
