//! Feature extraction for keypoint classification
//!
//! Converts one hand's raw landmark list into the translation- and
//! scale-invariant feature vector the pretrained classifier expects:
//! translate so the wrist is the origin, flatten to (x0,y0,x1,y1,...),
//! then divide by the max absolute value (with a zero guard).

use crate::landmarks::{Point2, LANDMARK_COUNT};

/// Feature vector length: two coordinates per keypoint.
pub const FEATURE_LEN: usize = 2 * LANDMARK_COUNT;

/// Fixed-length normalized landmark encoding fed to the classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector(pub [f32; FEATURE_LEN]);

impl FeatureVector {
    pub fn zeros() -> Self {
        Self([0.0; FEATURE_LEN])
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }
}

/// Compute the feature vector for one hand.
///
/// Pure function: identical input always yields identical output. Coordinates
/// are clamped to <= 1.0 before processing, matching what the provider is
/// allowed to emit. Short landmark lists are zero-padded so the output length
/// never varies.
pub fn feature_vector(landmarks: &[Point2]) -> FeatureVector {
    let mut flat = [0.0f32; FEATURE_LEN];

    let base = landmarks
        .first()
        .map(|p| (p.x.min(1.0), p.y.min(1.0)))
        .unwrap_or((0.0, 0.0));

    for (i, point) in landmarks.iter().take(LANDMARK_COUNT).enumerate() {
        flat[2 * i] = point.x.min(1.0) - base.0;
        flat[2 * i + 1] = point.y.min(1.0) - base.1;
    }

    let max_abs = flat.iter().fold(0.0f32, |acc, v| acc.max(v.abs()));
    if max_abs == 0.0 {
        return FeatureVector(flat);
    }

    for v in flat.iter_mut() {
        *v /= max_abs;
    }
    FeatureVector(flat)
}
