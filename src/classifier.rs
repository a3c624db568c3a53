//! Gesture classification
//!
//! Wraps the opaque pretrained keypoint classifier behind a narrow trait and
//! a never-failing adapter. The adapter's contract: whatever happens - model
//! missing, model load failure, inference error, out-of-range class index -
//! it returns a valid [`GestureState`], defaulting to `Open`. Classifier
//! availability must never stall the frame pipeline.

pub mod features;

use crate::landmarks::{Point2, INDEX_TIP, THUMB_TIP, WRIST};
use anyhow::Result;
use async_trait::async_trait;
use features::FeatureVector;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{trace, warn};

/// Discrete classified hand pose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GestureState {
    #[default]
    Open,
    Closed,
    Pointing,
}

impl GestureState {
    /// Fixed class table of the pretrained model: 0=open, 1=closed, 2=pointing.
    pub fn from_class_index(index: usize) -> Option<GestureState> {
        match index {
            0 => Some(Self::Open),
            1 => Some(Self::Closed),
            2 => Some(Self::Pointing),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Pointing => "pointing",
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

/// All semantic labels in class-index order.
pub const GESTURE_LABELS: [GestureState; 3] =
    [GestureState::Open, GestureState::Closed, GestureState::Pointing];

/// Opaque pretrained keypoint classifier.
///
/// Implementations may offload inference (GPU, external process); `infer` is
/// a suspension point for the pipeline.
#[async_trait]
pub trait KeyPointModel: Send + Sync {
    fn name(&self) -> &str;

    /// Classify a feature vector, returning the raw class index.
    async fn infer(&self, features: &FeatureVector) -> Result<usize>;
}

/// Adapter around the external classifier.
///
/// Built degraded (no model) when the model fails to load; stays degraded for
/// the session and classifies everything as `Open`.
pub struct ClassifierAdapter {
    model: Option<Arc<dyn KeyPointModel>>,
    degraded_logged: AtomicBool,
}

impl ClassifierAdapter {
    pub fn new(model: Arc<dyn KeyPointModel>) -> Self {
        Self {
            model: Some(model),
            degraded_logged: AtomicBool::new(false),
        }
    }

    /// Adapter with no usable model. Every classification yields `Open`.
    pub fn degraded() -> Self {
        Self {
            model: None,
            degraded_logged: AtomicBool::new(false),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.model.is_none()
    }

    /// Classify one hand's feature vector. Total: never fails, never panics.
    pub async fn classify(&self, features: &FeatureVector) -> GestureState {
        let model = match &self.model {
            Some(m) => m,
            None => {
                if !self.degraded_logged.swap(true, Ordering::Relaxed) {
                    warn!("Classifier model unavailable, all gestures default to open");
                }
                return GestureState::Open;
            }
        };

        match model.infer(features).await {
            Ok(index) => GestureState::from_class_index(index).unwrap_or_else(|| {
                trace!("Classifier returned unknown class {}, defaulting to open", index);
                GestureState::Open
            }),
            Err(e) => {
                warn!("Gesture inference failed: {}", e);
                GestureState::Open
            }
        }
    }
}

/// Built-in geometric stand-in for the pretrained model.
///
/// Classifies from fingertip distances in feature space: thumb and index tips
/// close together reads as closed (pinch), index extended with the other
/// fingers curled reads as pointing, anything else is open. Useful for replay
/// scripts and development without the real model.
pub struct HeuristicModel {
    /// Max thumb-to-index distance (feature space) still counted as a pinch.
    pub pinch_threshold: f32,
    /// Min tip-to-wrist distance (feature space) for a finger to be extended.
    pub extend_threshold: f32,
}

impl Default for HeuristicModel {
    fn default() -> Self {
        Self {
            pinch_threshold: 0.35,
            extend_threshold: 0.75,
        }
    }
}

impl HeuristicModel {
    fn point_at(features: &FeatureVector, landmark: usize) -> Point2 {
        Point2::new(features.0[2 * landmark], features.0[2 * landmark + 1])
    }

    fn distance(a: Point2, b: Point2) -> f32 {
        let dx = a.x - b.x;
        let dy = a.y - b.y;
        (dx * dx + dy * dy).sqrt()
    }
}

#[async_trait]
impl KeyPointModel for HeuristicModel {
    fn name(&self) -> &str {
        "heuristic"
    }

    async fn infer(&self, features: &FeatureVector) -> Result<usize> {
        let wrist = Self::point_at(features, WRIST);
        let thumb = Self::point_at(features, THUMB_TIP);
        let index = Self::point_at(features, INDEX_TIP);

        if Self::distance(thumb, index) < self.pinch_threshold {
            return Ok(1); // closed
        }

        // Middle/ring/little tips are landmarks 12, 16, 20.
        let others_curled = [12usize, 16, 20].iter().all(|&tip| {
            Self::distance(Self::point_at(features, tip), wrist) < self.extend_threshold
        });
        if Self::distance(index, wrist) >= self.extend_threshold && others_curled {
            return Ok(2); // pointing
        }

        Ok(0) // open
    }
}
