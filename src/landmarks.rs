//! Hand landmark wire types
//!
//! Types produced by the external landmark provider: per-frame sets of 21
//! ordered 2D keypoints plus a handedness tag. Frames are transient - they
//! are consumed by the tracker immediately and never persisted.

use serde::{Deserialize, Serialize};

/// Number of tracked keypoints per hand (MediaPipe-style hand skeleton).
pub const LANDMARK_COUNT: usize = 21;

/// Maximum number of hands tracked per frame.
pub const MAX_HANDS: usize = 2;

/// Wrist keypoint - used as the translation anchor for feature extraction.
pub const WRIST: usize = 0;

/// Thumb tip keypoint.
pub const THUMB_TIP: usize = 4;

/// Index fingertip keypoint.
pub const INDEX_TIP: usize = 8;

/// A 2D point in normalized capture coordinates ([0,1] on both axes).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f32,
    pub y: f32,
}

impl Point2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Midpoint between two points.
    pub fn midpoint(a: Point2, b: Point2) -> Point2 {
        Point2 {
            x: (a.x + b.x) / 2.0,
            y: (a.y + b.y) / 2.0,
        }
    }
}

/// Which hand the provider believes it detected.
///
/// Note: the capture feed is mirrored, so the pointer built from a detection
/// carries the *inverted* label (see `Handedness::mirrored`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Handedness {
    Left,
    Right,
}

impl Handedness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    /// Invert the label to compensate for the mirrored capture feed.
    pub fn mirrored(&self) -> Handedness {
        match self {
            Self::Left => Handedness::Right,
            Self::Right => Handedness::Left,
        }
    }
}

/// One detected hand: 21 ordered keypoints plus a handedness tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandDetection {
    pub landmarks: Vec<Point2>,
    pub handedness: Handedness,
}

impl HandDetection {
    pub fn new(landmarks: Vec<Point2>, handedness: Handedness) -> Self {
        Self {
            landmarks,
            handedness,
        }
    }

    /// Whether this detection carries the expected number of keypoints.
    pub fn is_complete(&self) -> bool {
        self.landmarks.len() == LANDMARK_COUNT
    }

    /// Keypoint by index, zero if the provider sent a short set.
    pub fn landmark(&self, index: usize) -> Point2 {
        self.landmarks.get(index).copied().unwrap_or_default()
    }

    /// Pointer anchor: midpoint of the thumb tip and index fingertip.
    pub fn pointer_anchor(&self) -> Point2 {
        Point2::midpoint(self.landmark(THUMB_TIP), self.landmark(INDEX_TIP))
    }
}

/// One capture frame's worth of detections (zero to two hands).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawLandmarkFrame {
    pub hands: Vec<HandDetection>,
}

impl RawLandmarkFrame {
    /// Build a frame, truncating anything beyond `MAX_HANDS`.
    pub fn new(mut hands: Vec<HandDetection>) -> Self {
        hands.truncate(MAX_HANDS);
        Self { hands }
    }

    pub fn is_empty(&self) -> bool {
        self.hands.is_empty()
    }
}
