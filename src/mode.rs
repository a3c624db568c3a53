//! Interaction mode controller
//!
//! Process-wide View/Edit toggle consumed by the dispatcher. Modeled as an
//! explicit shared object injected into the pipeline and the API, not a
//! module-level global. All reads and writes go through one lock.

use parking_lot::RwLock;
use serde::Serialize;
use tracing::debug;

/// The two interaction modes. Default is View.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionMode {
    #[default]
    View,
    Edit,
}

impl InteractionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Edit => "edit",
        }
    }
}

/// Shared mode state. Clone the surrounding `Arc` to hand out references.
#[derive(Default)]
pub struct ModeController {
    mode: RwLock<InteractionMode>,
}

impl ModeController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> InteractionMode {
        *self.mode.read()
    }

    /// External secondary trigger: enter Edit mode.
    pub fn enter_edit(&self) {
        self.set(InteractionMode::Edit);
    }

    /// External cancel trigger: back to View mode.
    pub fn cancel(&self) {
        self.set(InteractionMode::View);
    }

    /// Dispatcher reset after handling an Edit-mode trigger.
    pub fn reset_to_view(&self) {
        self.set(InteractionMode::View);
    }

    fn set(&self, mode: InteractionMode) {
        let mut current = self.mode.write();
        if *current != mode {
            debug!("Interaction mode: {} -> {}", current.as_str(), mode.as_str());
            *current = mode;
        }
    }
}
