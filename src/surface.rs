//! External UI hit-test surface
//!
//! The dispatcher never touches a widget tree directly. It queries a
//! `UiSurface` for the ordered element stack under a point and drives the
//! surface's activation primitives. Element capabilities (menu entry,
//! primary control) are resolved generically from role/class/ancestor
//! metadata, not from any toolkit-specific marker.
//!
//! All trait methods take `&self` so implementations can be shared as
//! `Arc<dyn UiSurface>`; use interior mutability for state.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod console;

pub use console::ConsoleSurface;

/// Role marking an actionable menu entry.
pub const MENU_ENTRY_ROLE: &str = "menuitem";

/// Class marking an actionable menu entry.
pub const MENU_ENTRY_CLASS: &str = "context-menu-item";

/// Element kind that counts as a primary actionable control.
pub const PRIMARY_CONTROL_TAG: &str = "button";

/// One element in a hit-test stack, with inspectable metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UiElement {
    /// Stable identifier the surface understands in activation calls.
    pub id: String,
    /// Element kind as reported by the surface (e.g. "button", "div").
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub classes: Vec<String>,
    /// Roles found on ancestors, nearest first.
    #[serde(default)]
    pub ancestor_roles: Vec<String>,
    /// Classes found on ancestors, nearest first.
    #[serde(default)]
    pub ancestor_classes: Vec<String>,
}

impl UiElement {
    /// Whether this element is an actionable menu entry, by role, class, or
    /// ancestor match.
    pub fn is_menu_entry(&self) -> bool {
        self.role.as_deref() == Some(MENU_ENTRY_ROLE)
            || self.classes.iter().any(|c| c == MENU_ENTRY_CLASS)
            || self.ancestor_roles.iter().any(|r| r == MENU_ENTRY_ROLE)
            || self.ancestor_classes.iter().any(|c| c == MENU_ENTRY_CLASS)
    }

    /// Whether this element is a primary actionable control (gets the
    /// deferred activation repeat).
    pub fn is_primary_control(&self) -> bool {
        self.tag.eq_ignore_ascii_case(PRIMARY_CONTROL_TAG)
    }
}

/// UI surface the dispatcher drives.
#[async_trait]
pub trait UiSurface: Send + Sync {
    fn name(&self) -> &str;

    /// Ordered stack of elements under a display-space point, topmost first.
    async fn elements_at(&self, x: f32, y: f32) -> Result<Vec<UiElement>>;

    /// Synthesized pointer press on an element.
    async fn press(&self, element: &UiElement) -> Result<()>;

    /// Synthesized pointer release on an element.
    async fn release(&self, element: &UiElement) -> Result<()>;

    /// Synthesized activation event on an element.
    async fn activate(&self, element: &UiElement) -> Result<()>;

    /// Direct activation primitive (fallback path).
    async fn click(&self, element: &UiElement) -> Result<()>;

    /// Secondary activation (e.g. open a context menu) on an element.
    async fn secondary_activate(&self, element: &UiElement) -> Result<()>;
}
