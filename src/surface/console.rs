//! Console surface - logs all activations for testing and development
//!
//! Stands in for a real UI surface: returns a configurable element stack for
//! every hit-test and logs every activation primitive. Useful for validating
//! dispatch flow without a running UI.

use crate::surface::{UiElement, UiSurface};
use anyhow::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::info;

pub struct ConsoleSurface {
    name: String,
    /// Stack returned for every hit-test, topmost first.
    stack: RwLock<Vec<UiElement>>,
    activation_count: RwLock<u64>,
}

impl ConsoleSurface {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stack: RwLock::new(Vec::new()),
            activation_count: RwLock::new(0),
        }
    }

    /// Replace the scripted hit-test stack.
    pub fn set_stack(&self, stack: Vec<UiElement>) {
        *self.stack.write() = stack;
    }

    pub fn activation_count(&self) -> u64 {
        *self.activation_count.read()
    }

    fn bump(&self) {
        *self.activation_count.write() += 1;
    }
}

#[async_trait]
impl UiSurface for ConsoleSurface {
    fn name(&self) -> &str {
        &self.name
    }

    async fn elements_at(&self, x: f32, y: f32) -> Result<Vec<UiElement>> {
        let stack = self.stack.read().clone();
        info!(
            "ConsoleSurface '{}': hit-test at ({:.1}, {:.1}) -> {} element(s)",
            self.name,
            x,
            y,
            stack.len()
        );
        Ok(stack)
    }

    async fn press(&self, element: &UiElement) -> Result<()> {
        info!("ConsoleSurface '{}': press '{}'", self.name, element.id);
        Ok(())
    }

    async fn release(&self, element: &UiElement) -> Result<()> {
        info!("ConsoleSurface '{}': release '{}'", self.name, element.id);
        Ok(())
    }

    async fn activate(&self, element: &UiElement) -> Result<()> {
        self.bump();
        info!("ConsoleSurface '{}': activate '{}'", self.name, element.id);
        Ok(())
    }

    async fn click(&self, element: &UiElement) -> Result<()> {
        self.bump();
        info!("ConsoleSurface '{}': click '{}'", self.name, element.id);
        Ok(())
    }

    async fn secondary_activate(&self, element: &UiElement) -> Result<()> {
        self.bump();
        info!(
            "ConsoleSurface '{}': secondary activate '{}'",
            self.name, element.id
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_returns_scripted_stack() {
        let surface = ConsoleSurface::new("test");
        surface.set_stack(vec![UiElement {
            id: "root".to_string(),
            ..Default::default()
        }]);

        let stack = surface.elements_at(10.0, 20.0).await.unwrap();
        assert_eq!(stack.len(), 1);
        assert_eq!(stack[0].id, "root");
    }

    #[tokio::test]
    async fn test_counts_activations() {
        let surface = ConsoleSurface::new("test");
        let el = UiElement::default();
        surface.activate(&el).await.unwrap();
        surface.click(&el).await.unwrap();
        surface.secondary_activate(&el).await.unwrap();
        assert_eq!(surface.activation_count(), 3);
    }
}
