//! Dispatcher - debounced hit-test and activation synthesis
//!
//! Runs once per live pointer per tick. A pointer triggers when its pose is
//! closed, it is inside the freshness window, and its per-index debounce
//! window has elapsed. The trigger hit-tests the surface and branches on the
//! interaction mode:
//!
//! - View: secondary activation on the topmost element, mode unchanged.
//! - Edit: find the nearest actionable menu entry in the stack; activate it
//!   (press/release/activate plus a direct click fallback, and one deferred
//!   repeat on the next tick for primary controls), then reset to View. No
//!   target found also resets to View.
//!
//! The debounce registry is stamped on every trigger whether or not a target
//! was found, so a sustained closed pose cannot retrigger inside the window.

use crate::landmarks::MAX_HANDS;
use crate::mode::{InteractionMode, ModeController};
use crate::surface::{UiElement, UiSurface};
use crate::tracker::CursorPoint;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Minimum interval between dispatches for one pointer index.
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

/// Per-pointer-index timestamps of the last dispatch.
#[derive(Debug, Default)]
pub struct DebounceRegistry {
    last_dispatch: [Option<Instant>; MAX_HANDS],
}

impl DebounceRegistry {
    /// Whether this pointer index is past the debounce window.
    pub fn ready(&self, pointer: usize, now: Instant, window: Duration) -> bool {
        match self.last_dispatch.get(pointer).copied().flatten() {
            Some(last) => now.duration_since(last) > window,
            None => true,
        }
    }

    /// Stamp "now" for this pointer index.
    pub fn stamp(&mut self, pointer: usize, now: Instant) {
        if let Some(slot) = self.last_dispatch.get_mut(pointer) {
            *slot = Some(now);
        }
    }
}

/// What a trigger resolved to, for telemetry and the debug overlay.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DispatchOutcome {
    /// View mode: secondary activation issued on the topmost element.
    SecondaryActivated { element: String },
    /// Edit mode: a menu entry was activated.
    Activated { element: String, deferred_repeat: bool },
    /// Edit mode: no actionable element under the pointer.
    TargetMissing,
}

/// One dispatched trigger.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DispatchEvent {
    pub pointer: usize,
    pub outcome: DispatchOutcome,
}

/// Drives surface activations from the live pointer list.
pub struct Dispatcher {
    surface: Arc<dyn UiSurface>,
    mode: Arc<ModeController>,
    debounce: DebounceRegistry,
    debounce_window: Duration,
    freshness_window: Duration,
    /// Activations queued for one zero-delay follow-up on the next tick, for
    /// handlers that need a fresh scheduling turn.
    pending_repeats: Vec<UiElement>,
}

impl Dispatcher {
    pub fn new(
        surface: Arc<dyn UiSurface>,
        mode: Arc<ModeController>,
        debounce_window: Duration,
        freshness_window: Duration,
    ) -> Self {
        Self {
            surface,
            mode,
            debounce: DebounceRegistry::default(),
            debounce_window,
            freshness_window,
            pending_repeats: Vec::new(),
        }
    }

    /// Apply new window settings (config hot reload).
    pub fn reconfigure(&mut self, debounce_window: Duration, freshness_window: Duration) {
        self.debounce_window = debounce_window;
        self.freshness_window = freshness_window;
    }

    /// Run one dispatch pass over the positional pointer list.
    ///
    /// Drains the deferred-repeat queue first, then evaluates every pointer
    /// against the trigger preconditions.
    pub async fn run_tick(&mut self, points: &[CursorPoint], now: Instant) -> Vec<DispatchEvent> {
        for element in std::mem::take(&mut self.pending_repeats) {
            debug!("Deferred activation repeat for '{}'", element.id);
            if let Err(e) = self.surface.click(&element).await {
                warn!("Deferred activation failed for '{}': {}", element.id, e);
            }
        }

        let mut events = Vec::new();
        for (pointer, point) in points.iter().enumerate() {
            if !point.gesture.is_closed() {
                continue;
            }
            if !point.is_fresh(now, self.freshness_window) {
                continue;
            }
            if !self.debounce.ready(pointer, now, self.debounce_window) {
                continue;
            }

            // Sustained closed poses must not retrigger inside the window,
            // even when no target is found.
            self.debounce.stamp(pointer, now);

            let stack = match self.surface.elements_at(point.x, point.y).await {
                Ok(stack) => stack,
                Err(e) => {
                    warn!("Hit-test failed at ({:.1}, {:.1}): {}", point.x, point.y, e);
                    continue;
                }
            };

            let outcome = match self.mode.current() {
                InteractionMode::View => self.trigger_view(&stack).await,
                InteractionMode::Edit => self.trigger_edit(&stack).await,
            };
            if let Some(outcome) = outcome {
                events.push(DispatchEvent { pointer, outcome });
            }
        }
        events
    }

    async fn trigger_view(&self, stack: &[UiElement]) -> Option<DispatchOutcome> {
        let top = stack.first()?;
        debug!("View trigger: secondary activation on '{}'", top.id);
        if let Err(e) = self.surface.secondary_activate(top).await {
            warn!("Secondary activation failed on '{}': {}", top.id, e);
        }
        Some(DispatchOutcome::SecondaryActivated {
            element: top.id.clone(),
        })
    }

    async fn trigger_edit(&mut self, stack: &[UiElement]) -> Option<DispatchOutcome> {
        let target = stack.iter().find(|el| el.is_menu_entry());

        let Some(target) = target else {
            debug!("Edit trigger: no actionable element under pointer");
            self.mode.reset_to_view();
            return Some(DispatchOutcome::TargetMissing);
        };

        debug!("Edit trigger: activating '{}'", target.id);
        for step in [
            self.surface.press(target).await,
            self.surface.release(target).await,
            self.surface.activate(target).await,
            self.surface.click(target).await,
        ] {
            if let Err(e) = step {
                warn!("Activation step failed on '{}': {}", target.id, e);
            }
        }

        let deferred = target.is_primary_control();
        if deferred {
            self.pending_repeats.push(target.clone());
        }

        self.mode.reset_to_view();
        Some(DispatchOutcome::Activated {
            element: target.id.clone(),
            deferred_repeat: deferred,
        })
    }
}
