//! Cursor tracker - virtual pointers derived from per-frame hand detections
//!
//! Consumes classified detections and rebuilds the pointer list wholesale on
//! every processed frame. Pointers are correlated to detections by array
//! position only; there is no persistent hand identity, so identities can
//! swap across missed frames. Independently of the per-frame list, the
//! tracker keeps a last-known-gesture slot per pointer index so a pose
//! transition is still observed when a frame between the two poses was
//! dropped.

use crate::classifier::GestureState;
use crate::landmarks::{HandDetection, Handedness, MAX_HANDS};
use std::time::{Duration, Instant};
use tracing::debug;

/// Maximum pointer age before consumers must treat it as absent.
pub const DEFAULT_FRESHNESS_MS: u64 = 100;

/// One hand detection plus its classified pose, as produced by the pipeline.
#[derive(Debug, Clone)]
pub struct ClassifiedHand {
    pub detection: HandDetection,
    pub gesture: GestureState,
}

/// A virtual pointer: the system's input device derived from one tracked hand.
#[derive(Debug, Clone)]
pub struct CursorPoint {
    /// Display-space x coordinate (pixels).
    pub x: f32,
    /// Display-space y coordinate (pixels).
    pub y: f32,
    pub gesture: GestureState,
    /// Mirrored relative to the provider label (the capture feed is mirrored).
    pub handedness: Handedness,
    pub updated_at: Instant,
}

impl CursorPoint {
    /// Freshness rule: a pointer older than the window is treated as absent.
    pub fn is_fresh(&self, now: Instant, window: Duration) -> bool {
        now.duration_since(self.updated_at) < window
    }

    /// Overlay color for the debug consumer (open vs closed styling).
    pub fn color(&self) -> &'static str {
        if self.gesture.is_closed() {
            "#8A2BE2"
        } else {
            "#00FF00"
        }
    }
}

/// Observed pose change for one pointer index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestureTransition {
    pub pointer: usize,
    pub from: GestureState,
    pub to: GestureState,
}

impl GestureTransition {
    /// The transition the animation effect manager reacts to.
    pub fn is_closed_transition(&self) -> bool {
        self.to.is_closed() && !self.from.is_closed()
    }
}

/// Tracks the current pointer list and per-index pose history.
pub struct CursorTracker {
    points: Vec<CursorPoint>,
    last_gesture: [GestureState; MAX_HANDS],
    display_width: f32,
    display_height: f32,
    freshness: Duration,
}

impl CursorTracker {
    pub fn new(display_width: f32, display_height: f32, freshness: Duration) -> Self {
        Self {
            points: Vec::with_capacity(MAX_HANDS),
            last_gesture: [GestureState::Open; MAX_HANDS],
            display_width,
            display_height,
            freshness,
        }
    }

    /// Replace the pointer list with this frame's detections.
    ///
    /// Returns the pose transitions observed against the last-known gesture
    /// array. Indices not present in this frame keep their stored pose, so a
    /// transition across a missed frame is still detected on the next one.
    pub fn apply_frame(&mut self, hands: &[ClassifiedHand], now: Instant) -> Vec<GestureTransition> {
        let mut transitions = Vec::new();

        self.points.clear();
        for (index, hand) in hands.iter().take(MAX_HANDS).enumerate() {
            let anchor = hand.detection.pointer_anchor();
            self.points.push(CursorPoint {
                x: anchor.x * self.display_width,
                y: anchor.y * self.display_height,
                gesture: hand.gesture,
                handedness: hand.detection.handedness.mirrored(),
                updated_at: now,
            });

            let previous = self.last_gesture[index];
            if previous != hand.gesture {
                debug!(
                    "Pointer {} gesture: {} -> {}",
                    index,
                    previous.as_str(),
                    hand.gesture.as_str()
                );
                transitions.push(GestureTransition {
                    pointer: index,
                    from: previous,
                    to: hand.gesture,
                });
                self.last_gesture[index] = hand.gesture;
            }
        }

        transitions
    }

    /// Current pointer list, positional, including stale entries.
    pub fn points(&self) -> &[CursorPoint] {
        &self.points
    }

    /// Pointers still inside the freshness window, with their positional index.
    pub fn fresh_points(&self, now: Instant) -> Vec<(usize, &CursorPoint)> {
        self.points
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_fresh(now, self.freshness))
            .collect()
    }

    pub fn freshness(&self) -> Duration {
        self.freshness
    }

    /// Apply new display/freshness settings (config hot reload).
    pub fn reconfigure(&mut self, display_width: f32, display_height: f32, freshness: Duration) {
        self.display_width = display_width;
        self.display_height = display_height;
        self.freshness = freshness;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::{Point2, INDEX_TIP, LANDMARK_COUNT, THUMB_TIP};

    fn hand_at(x: f32, y: f32, handedness: Handedness) -> HandDetection {
        let mut landmarks = vec![Point2::new(0.1, 0.1); LANDMARK_COUNT];
        landmarks[THUMB_TIP] = Point2::new(x, y);
        landmarks[INDEX_TIP] = Point2::new(x, y);
        HandDetection::new(landmarks, handedness)
    }

    fn classified(x: f32, y: f32, gesture: GestureState) -> ClassifiedHand {
        ClassifiedHand {
            detection: hand_at(x, y, Handedness::Left),
            gesture,
        }
    }

    fn tracker() -> CursorTracker {
        // Unit display scale keeps coordinates readable in assertions.
        CursorTracker::new(1000.0, 1000.0, Duration::from_millis(DEFAULT_FRESHNESS_MS))
    }

    #[test]
    fn test_two_detections_yield_two_pointers() {
        // Scenario: pointer 0 closed at (100,100) after being open, pointer 1
        // open at (400,300) - exactly two pointers, one closed transition.
        let mut tracker = tracker();
        let now = Instant::now();

        tracker.apply_frame(&[classified(0.1, 0.1, GestureState::Open)], now);

        let transitions = tracker.apply_frame(
            &[
                classified(0.1, 0.1, GestureState::Closed),
                classified(0.4, 0.3, GestureState::Open),
            ],
            now + Duration::from_millis(33),
        );

        let points = tracker.points();
        assert_eq!(points.len(), 2);
        assert!((points[0].x - 100.0).abs() < 1e-3);
        assert!((points[0].y - 100.0).abs() < 1e-3);
        assert_eq!(points[0].gesture, GestureState::Closed);
        assert!((points[1].x - 400.0).abs() < 1e-3);
        assert!((points[1].y - 300.0).abs() < 1e-3);
        assert_eq!(points[1].gesture, GestureState::Open);

        let closed: Vec<_> = transitions
            .iter()
            .filter(|t| t.is_closed_transition())
            .collect();
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].pointer, 0);
    }

    #[test]
    fn test_pointer_list_rebuilt_wholesale() {
        let mut tracker = tracker();
        let now = Instant::now();

        tracker.apply_frame(
            &[
                classified(0.1, 0.1, GestureState::Open),
                classified(0.4, 0.3, GestureState::Open),
            ],
            now,
        );
        assert_eq!(tracker.points().len(), 2);

        tracker.apply_frame(&[classified(0.5, 0.5, GestureState::Open)], now);
        assert_eq!(tracker.points().len(), 1);
    }

    #[test]
    fn test_transition_survives_missed_frame() {
        let mut tracker = tracker();
        let now = Instant::now();

        tracker.apply_frame(&[classified(0.2, 0.2, GestureState::Open)], now);

        // Pointer missing for a frame, returns closed: still one transition.
        tracker.apply_frame(&[], now + Duration::from_millis(33));
        let transitions = tracker.apply_frame(
            &[classified(0.2, 0.2, GestureState::Closed)],
            now + Duration::from_millis(66),
        );
        assert_eq!(transitions.len(), 1);
        assert!(transitions[0].is_closed_transition());
    }

    #[test]
    fn test_no_transition_when_pose_unchanged() {
        let mut tracker = tracker();
        let now = Instant::now();

        tracker.apply_frame(&[classified(0.2, 0.2, GestureState::Closed)], now);
        let transitions = tracker.apply_frame(
            &[classified(0.3, 0.3, GestureState::Closed)],
            now + Duration::from_millis(33),
        );
        assert!(transitions.is_empty());
    }

    #[test]
    fn test_handedness_mirrored() {
        let mut tracker = tracker();
        let hand = ClassifiedHand {
            detection: hand_at(0.5, 0.5, Handedness::Left),
            gesture: GestureState::Open,
        };
        tracker.apply_frame(&[hand], Instant::now());
        assert_eq!(tracker.points()[0].handedness, Handedness::Right);
    }

    #[test]
    fn test_freshness_window() {
        let mut tracker = tracker();
        let now = Instant::now();
        tracker.apply_frame(&[classified(0.2, 0.2, GestureState::Open)], now);

        assert_eq!(tracker.fresh_points(now + Duration::from_millis(99)).len(), 1);
        assert!(tracker.fresh_points(now + Duration::from_millis(100)).is_empty());
    }

    #[test]
    fn test_fresh_points_keep_positional_index() {
        let mut tracker = tracker();
        let now = Instant::now();

        tracker.apply_frame(
            &[
                classified(0.1, 0.1, GestureState::Open),
                classified(0.4, 0.3, GestureState::Closed),
            ],
            now,
        );

        let fresh = tracker.fresh_points(now + Duration::from_millis(10));
        assert_eq!(fresh.len(), 2);
        assert_eq!(fresh[1].0, 1);
        assert_eq!(fresh[1].1.gesture, GestureState::Closed);
    }
}
