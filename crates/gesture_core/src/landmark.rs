//! Landmark vectors: the 63-value feature layout and the flattening of
//! client payloads into it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Tracked hand keypoints per sample.
pub const LANDMARK_POINTS: usize = 21;

/// Feature vector length: 21 points x (x, y, z).
pub const VECTOR_DIM: usize = 63;

#[derive(Debug)]
pub enum LandmarkError {
    /// Flattened payload length is not [`VECTOR_DIM`].
    WrongLength { expected: usize, got: usize },
    /// Payload contains a node flattening cannot resolve (not a number
    /// and not an array).
    UnsupportedShape { found: &'static str },
    /// Payload is missing or empty.
    Empty,
}

impl fmt::Display for LandmarkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LandmarkError::WrongLength { expected, got } => {
                write!(
                    f,
                    "invalid landmark shape: expected {} values, got {}",
                    expected, got
                )
            }
            LandmarkError::UnsupportedShape { found } => {
                write!(f, "landmarks contain a non-numeric element: {}", found)
            }
            LandmarkError::Empty => write!(f, "landmarks are missing or empty"),
        }
    }
}

impl std::error::Error for LandmarkError {}

/// One 3D keypoint of a tracked hand pose.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LandmarkPoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Flatten point records point-major: x, y, z per point, point order.
pub fn flatten_points(points: &[LandmarkPoint]) -> Vec<f32> {
    let mut out = Vec::with_capacity(points.len() * 3);
    for p in points {
        out.push(p.x);
        out.push(p.y);
        out.push(p.z);
    }
    out
}

/// Flatten an arbitrarily nested numeric JSON payload into a single
/// sequence, preserving traversal order. Numbers are accepted, arrays
/// recursed; any other node rejects the payload.
pub fn flatten_payload(payload: &serde_json::Value) -> Result<Vec<f32>, LandmarkError> {
    fn walk(v: &serde_json::Value, out: &mut Vec<f32>) -> Result<(), LandmarkError> {
        match v {
            serde_json::Value::Number(n) => {
                let x = n.as_f64().ok_or(LandmarkError::UnsupportedShape {
                    found: "non-finite number",
                })?;
                out.push(x as f32);
                Ok(())
            }
            serde_json::Value::Array(items) => {
                for item in items {
                    walk(item, out)?;
                }
                Ok(())
            }
            serde_json::Value::Null => Err(LandmarkError::UnsupportedShape { found: "null" }),
            serde_json::Value::Bool(_) => Err(LandmarkError::UnsupportedShape { found: "bool" }),
            serde_json::Value::String(_) => {
                Err(LandmarkError::UnsupportedShape { found: "string" })
            }
            serde_json::Value::Object(_) => {
                Err(LandmarkError::UnsupportedShape { found: "object" })
            }
        }
    }

    let mut out = Vec::with_capacity(VECTOR_DIM);
    walk(payload, &mut out)?;
    Ok(out)
}

/// Enforce the vector-length invariant before any inference or store use.
pub fn ensure_vector_dim(vector: &[f32]) -> Result<(), LandmarkError> {
    if vector.len() != VECTOR_DIM {
        return Err(LandmarkError::WrongLength {
            expected: VECTOR_DIM,
            got: vector.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flatten_points_is_point_major() {
        let points = vec![
            LandmarkPoint {
                x: 1.0,
                y: 2.0,
                z: 3.0,
            },
            LandmarkPoint {
                x: 4.0,
                y: 5.0,
                z: 6.0,
            },
        ];
        assert_eq!(flatten_points(&points), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn flatten_payload_preserves_traversal_order() {
        let payload = json!([[1.0, 2.0], [3.0], 4.0]);
        assert_eq!(flatten_payload(&payload).unwrap(), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn flatten_payload_accepts_deep_nesting() {
        let payload = json!([[[1.0], [2.0]], [[3.0]]]);
        assert_eq!(flatten_payload(&payload).unwrap(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn flatten_payload_rejects_strings() {
        let payload = json!([1.0, "two", 3.0]);
        assert!(matches!(
            flatten_payload(&payload),
            Err(LandmarkError::UnsupportedShape { found: "string" })
        ));
    }

    #[test]
    fn flatten_payload_rejects_objects() {
        let payload = json!([{ "x": 1.0 }]);
        assert!(matches!(
            flatten_payload(&payload),
            Err(LandmarkError::UnsupportedShape { found: "object" })
        ));
    }

    #[test]
    fn wrong_length_reports_expected_and_actual() {
        let err = ensure_vector_dim(&[0.0; 10]).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("63"), "{}", msg);
        assert!(msg.contains("10"), "{}", msg);
    }

    #[test]
    fn full_vector_passes() {
        assert!(ensure_vector_dim(&[0.5; VECTOR_DIM]).is_ok());
    }

    #[test]
    fn point_records_flatten_to_vector_dim() {
        let points = vec![
            LandmarkPoint {
                x: 0.1,
                y: 0.2,
                z: 0.3
            };
            LANDMARK_POINTS
        ];
        let flat = flatten_points(&points);
        assert_eq!(flat.len(), VECTOR_DIM);
        assert!(ensure_vector_dim(&flat).is_ok());
    }
}
