//! Engine configuration.

use crate::geometry::{DEFAULT_ADAPTIVE_RADIUS, MAX_LAYER_SIZE, MIN_LAYER_SIZE, SizeLimits};
use kurbo::Size;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Tunables for a [`Scene`](crate::Scene) and the codec.
///
/// Every field has a default, so a config file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Smallest committed width/height of a box layer.
    pub min_layer_size: f64,
    /// Largest committed width/height of a box layer.
    pub max_layer_size: f64,
    /// Pointer slop for hit-testing, in world units.
    pub hit_tolerance: f64,
    /// Margin around the content when fitting the viewport.
    pub fit_padding: f64,
    /// Target content width when fitting for export.
    pub export_width: f64,
    /// Base radius for adaptive rounding.
    pub adaptive_radius: f64,
    /// Host viewport size in screen pixels.
    pub viewport_size: Size,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_layer_size: MIN_LAYER_SIZE,
            max_layer_size: MAX_LAYER_SIZE,
            hit_tolerance: 4.0,
            fit_padding: 32.0,
            export_width: 1920.0,
            adaptive_radius: DEFAULT_ADAPTIVE_RADIUS,
            viewport_size: Size::new(1280.0, 800.0),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON config.
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let positive = [
            ("min_layer_size", self.min_layer_size),
            ("max_layer_size", self.max_layer_size),
            ("export_width", self.export_width),
            ("viewport_size.width", self.viewport_size.width),
            ("viewport_size.height", self.viewport_size.height),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Invalid(format!("{name} must be a positive number, got {value}")));
            }
        }
        let non_negative = [
            ("hit_tolerance", self.hit_tolerance),
            ("fit_padding", self.fit_padding),
            ("adaptive_radius", self.adaptive_radius),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!("{name} must not be negative, got {value}")));
            }
        }
        if self.min_layer_size > self.max_layer_size {
            return Err(ConfigError::Invalid(format!(
                "min_layer_size {} exceeds max_layer_size {}",
                self.min_layer_size, self.max_layer_size
            )));
        }
        Ok(())
    }

    /// Size limits for committed layer dimensions.
    pub fn size_limits(&self) -> SizeLimits {
        SizeLimits::uniform(self.min_layer_size, self.max_layer_size)
    }
}
