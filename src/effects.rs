//! Animation effect manager
//!
//! Short-lived visual effects spawned when a pointer's pose transitions into
//! closed. Each effect is anchored to its owning pointer index and re-synced
//! to that pointer's latest position every tick so the ripple follows a
//! moving hand. Effects self-expire after a fixed lifetime and are
//! independent and unordered.

use crate::tracker::{CursorPoint, GestureTransition};
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::trace;

/// Fixed effect lifetime.
pub const DEFAULT_EFFECT_LIFETIME_MS: u64 = 400;

/// Ripple radius at progress 0 (pixels).
pub const BASE_RADIUS: f32 = 12.0;

/// How far the ripple expands over its lifetime (pixels).
pub const GROWTH_SPAN: f32 = 150.0;

/// A live effect owned by one pointer index.
#[derive(Debug, Clone)]
pub struct AnimationEffect {
    pub pointer: usize,
    pub x: f32,
    pub y: f32,
    pub started_at: Instant,
}

/// One effect's render parameters for the current tick.
#[derive(Debug, Clone, Serialize)]
pub struct EffectFrame {
    pub pointer: usize,
    pub x: f32,
    pub y: f32,
    /// Elapsed fraction of the lifetime, always in [0, 1).
    pub progress: f32,
    /// Monotonically growing ripple radius.
    pub radius: f32,
    /// Donut hole radius (the inner part fades first).
    pub inner_radius: f32,
    /// Front-loaded visibility with a fast late fade: (1 - progress)^1.5.
    pub opacity: f32,
}

/// Owns and prunes the live effects.
pub struct EffectManager {
    effects: Vec<AnimationEffect>,
    lifetime: Duration,
    base_radius: f32,
    growth_span: f32,
}

impl EffectManager {
    pub fn new(lifetime: Duration, base_radius: f32, growth_span: f32) -> Self {
        Self {
            effects: Vec::new(),
            lifetime,
            base_radius,
            growth_span,
        }
    }

    /// Spawn effects for this frame's closed transitions.
    ///
    /// `points` is the current positional pointer list; a transition whose
    /// pointer has no current position spawns nothing.
    pub fn on_transitions(
        &mut self,
        transitions: &[GestureTransition],
        points: &[CursorPoint],
        now: Instant,
    ) {
        for transition in transitions.iter().filter(|t| t.is_closed_transition()) {
            let Some(point) = points.get(transition.pointer) else {
                continue;
            };
            trace!("Spawning ripple for pointer {}", transition.pointer);
            self.effects.push(AnimationEffect {
                pointer: transition.pointer,
                x: point.x,
                y: point.y,
                started_at: now,
            });
        }
    }

    /// Advance all effects one tick.
    ///
    /// Re-anchors each effect to its owning pointer's latest position, drops
    /// everything at or past the lifetime, and returns render parameters for
    /// the survivors.
    pub fn tick(&mut self, points: &[CursorPoint], now: Instant) -> Vec<EffectFrame> {
        let lifetime = self.lifetime;
        let base_radius = self.base_radius;
        let growth_span = self.growth_span;
        self.effects
            .retain(|e| now.duration_since(e.started_at) < lifetime);

        self.effects
            .iter_mut()
            .map(|effect| {
                if let Some(point) = points.get(effect.pointer) {
                    effect.x = point.x;
                    effect.y = point.y;
                }

                let elapsed = now.duration_since(effect.started_at);
                let progress =
                    (elapsed.as_secs_f32() / lifetime.as_secs_f32()).clamp(0.0, 1.0);
                EffectFrame {
                    pointer: effect.pointer,
                    x: effect.x,
                    y: effect.y,
                    progress,
                    radius: base_radius + progress * growth_span,
                    inner_radius: progress * growth_span * 0.4,
                    opacity: (1.0 - progress).powf(1.5),
                }
            })
            .collect()
    }

    pub fn active_count(&self) -> usize {
        self.effects.len()
    }

    /// Apply new lifetime/geometry settings (config hot reload).
    pub fn reconfigure(&mut self, lifetime: Duration, base_radius: f32, growth_span: f32) {
        self.lifetime = lifetime;
        self.base_radius = base_radius;
        self.growth_span = growth_span;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::GestureState;
    use crate::landmarks::Handedness;

    fn point_at(x: f32, y: f32, now: Instant) -> CursorPoint {
        CursorPoint {
            x,
            y,
            gesture: GestureState::Closed,
            handedness: Handedness::Right,
            updated_at: now,
        }
    }

    fn closed_transition(pointer: usize) -> GestureTransition {
        GestureTransition {
            pointer,
            from: GestureState::Open,
            to: GestureState::Closed,
        }
    }

    fn manager() -> EffectManager {
        EffectManager::new(
            Duration::from_millis(DEFAULT_EFFECT_LIFETIME_MS),
            BASE_RADIUS,
            GROWTH_SPAN,
        )
    }

    #[test]
    fn test_spawn_on_closed_transition_only() {
        let mut manager = manager();
        let now = Instant::now();
        let points = vec![point_at(100.0, 100.0, now), point_at(400.0, 300.0, now)];

        let transitions = vec![
            closed_transition(0),
            GestureTransition {
                pointer: 1,
                from: GestureState::Closed,
                to: GestureState::Open,
            },
        ];
        manager.on_transitions(&transitions, &points, now);
        assert_eq!(manager.active_count(), 1);
    }

    #[test]
    fn test_expiry_boundary() {
        let mut manager = manager();
        let t0 = Instant::now();
        let points = vec![point_at(10.0, 10.0, t0)];
        manager.on_transitions(&[closed_transition(0)], &points, t0);

        let frames = manager.tick(&points, t0 + Duration::from_millis(399));
        assert_eq!(frames.len(), 1);

        let frames = manager.tick(&points, t0 + Duration::from_millis(400));
        assert!(frames.is_empty());
        assert_eq!(manager.active_count(), 0);
    }

    #[test]
    fn test_reanchors_to_moving_pointer() {
        let mut manager = manager();
        let t0 = Instant::now();
        manager.on_transitions(&[closed_transition(0)], &[point_at(10.0, 10.0, t0)], t0);

        let later = t0 + Duration::from_millis(100);
        let frames = manager.tick(&[point_at(250.0, 80.0, later)], later);
        assert!((frames[0].x - 250.0).abs() < 1e-6);
        assert!((frames[0].y - 80.0).abs() < 1e-6);
    }

    #[test]
    fn test_radius_grows_and_opacity_fades() {
        let mut manager = manager();
        let t0 = Instant::now();
        let points = vec![point_at(0.0, 0.0, t0)];
        manager.on_transitions(&[closed_transition(0)], &points, t0);

        let early = manager.tick(&points, t0 + Duration::from_millis(40))[0].clone();
        let late = manager.tick(&points, t0 + Duration::from_millis(360))[0].clone();

        assert!(late.radius > early.radius);
        assert!(late.opacity < early.opacity);
        assert!(early.progress < 1.0 && late.progress < 1.0);

        // progress 0.1 -> opacity (0.9)^1.5
        assert!((early.opacity - 0.9f32.powf(1.5)).abs() < 1e-3);
    }

    #[test]
    fn test_configured_geometry_drives_render_parameters() {
        let mut manager = EffectManager::new(Duration::from_millis(400), 20.0, 100.0);
        let t0 = Instant::now();
        let points = vec![point_at(0.0, 0.0, t0)];
        manager.on_transitions(&[closed_transition(0)], &points, t0);

        // progress 0.5 -> radius 20 + 0.5*100, inner 0.5*100*0.4
        let frame = manager.tick(&points, t0 + Duration::from_millis(200))[0].clone();
        assert!((frame.radius - 70.0).abs() < 1e-3);
        assert!((frame.inner_radius - 20.0).abs() < 1e-3);

        // Geometry changes apply to live effects on the next tick.
        manager.reconfigure(Duration::from_millis(400), 10.0, 50.0);
        let frame = manager.tick(&points, t0 + Duration::from_millis(200))[0].clone();
        assert!((frame.radius - 35.0).abs() < 1e-3);
    }

    #[test]
    fn test_transition_without_pointer_spawns_nothing() {
        let mut manager = manager();
        manager.on_transitions(&[closed_transition(1)], &[], Instant::now());
        assert_eq!(manager.active_count(), 0);
    }
}
