//! Configuration management for Gesture GW
//!
//! Handles loading, parsing, and hot-reloading of YAML configuration files.

pub mod watcher;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

pub use watcher::ConfigWatcher;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub effects: EffectsConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

/// Display-space dimensions pointers are scaled into
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DisplayConfig {
    #[serde(default = "default_display_width")]
    pub width: f32,
    #[serde(default = "default_display_height")]
    pub height: f32,
}

/// Pointer tracking parameters
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrackingConfig {
    /// Maximum pointer age (ms) before consumers treat it as absent
    #[serde(default = "default_freshness_ms")]
    pub freshness_ms: u64,
}

/// Dispatch parameters
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DispatchConfig {
    /// Minimum interval (ms) between dispatches for one pointer index
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

/// Animation effect parameters
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EffectsConfig {
    #[serde(default = "default_effect_lifetime_ms")]
    pub lifetime_ms: u64,
    /// Ripple radius (pixels) at progress 0
    #[serde(default = "default_effect_base_radius")]
    pub base_radius: f32,
    /// How far the ripple expands (pixels) over its lifetime
    #[serde(default = "default_effect_growth_span")]
    pub growth_span: f32,
}

/// Classifier model selection
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClassifierConfig {
    /// "heuristic" for the built-in geometric model, "none" to run degraded
    #[serde(default = "default_classifier_model")]
    pub model: String,
}

/// Capture source selection
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CaptureConfig {
    /// Path to a replay script; absent means no capture source is granted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replay_script: Option<String>,
}

/// Debug/telemetry API
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_api_port")]
    pub port: u16,
}

fn default_display_width() -> f32 {
    1920.0
}

fn default_display_height() -> f32 {
    1080.0
}

fn default_freshness_ms() -> u64 {
    crate::tracker::DEFAULT_FRESHNESS_MS
}

fn default_debounce_ms() -> u64 {
    crate::dispatch::DEFAULT_DEBOUNCE_MS
}

fn default_effect_lifetime_ms() -> u64 {
    crate::effects::DEFAULT_EFFECT_LIFETIME_MS
}

fn default_effect_base_radius() -> f32 {
    crate::effects::BASE_RADIUS
}

fn default_effect_growth_span() -> f32 {
    crate::effects::GROWTH_SPAN
}

fn default_classifier_model() -> String {
    "heuristic".to_string()
}

fn default_true() -> bool {
    true
}

fn default_api_port() -> u16 {
    crate::api::DEFAULT_API_PORT
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: default_display_width(),
            height: default_display_height(),
        }
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            freshness_ms: default_freshness_ms(),
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl Default for EffectsConfig {
    fn default() -> Self {
        Self {
            lifetime_ms: default_effect_lifetime_ms(),
            base_radius: default_effect_base_radius(),
            growth_span: default_effect_growth_span(),
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            model: default_classifier_model(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            port: default_api_port(),
        }
    }
}

impl AppConfig {
    /// Load and validate a configuration file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path))?;
        let config: AppConfig =
            serde_yaml::from_str(&content).context("Failed to parse config YAML")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.display.width <= 0.0 || self.display.height <= 0.0 {
            anyhow::bail!(
                "display dimensions must be positive (got {}x{})",
                self.display.width,
                self.display.height
            );
        }
        if self.tracking.freshness_ms == 0 {
            anyhow::bail!("tracking.freshness_ms must be non-zero");
        }
        if self.dispatch.debounce_ms == 0 {
            anyhow::bail!("dispatch.debounce_ms must be non-zero");
        }
        if self.effects.lifetime_ms == 0 {
            anyhow::bail!("effects.lifetime_ms must be non-zero");
        }
        if self.effects.base_radius <= 0.0 || self.effects.growth_span < 0.0 {
            anyhow::bail!(
                "effects radii must be positive (base {}, growth {})",
                self.effects.base_radius,
                self.effects.growth_span
            );
        }
        match self.classifier.model.as_str() {
            "heuristic" | "none" => {}
            other => anyhow::bail!("unknown classifier model '{}'", other),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.display.width, 1920.0);
        assert_eq!(config.tracking.freshness_ms, 100);
        assert_eq!(config.dispatch.debounce_ms, 500);
        assert_eq!(config.effects.lifetime_ms, 400);
        assert_eq!(config.effects.base_radius, crate::effects::BASE_RADIUS);
        assert_eq!(config.effects.growth_span, crate::effects::GROWTH_SPAN);
        assert_eq!(config.classifier.model, "heuristic");
        assert!(config.api.enabled);
        assert_eq!(config.api.port, crate::api::DEFAULT_API_PORT);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_override() {
        let yaml = r#"
display:
  width: 1280
  height: 720
dispatch:
  debounce_ms: 250
effects:
  base_radius: 8
  growth_span: 90
capture:
  replay_script: "demo.yaml"
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.display.width, 1280.0);
        assert_eq!(config.dispatch.debounce_ms, 250);
        assert_eq!(config.tracking.freshness_ms, 100);
        assert_eq!(config.effects.base_radius, 8.0);
        assert_eq!(config.effects.growth_span, 90.0);
        assert_eq!(config.effects.lifetime_ms, 400);
        assert_eq!(config.capture.replay_script.as_deref(), Some("demo.yaml"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.display.width = 0.0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.tracking.freshness_ms = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.effects.base_radius = 0.0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.classifier.model = "tfjs".to_string();
        assert!(config.validate().is_err());
    }
}
