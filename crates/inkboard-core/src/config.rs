//! Board configuration.
//!
//! Every field has a default, so a config file only needs to name what it
//! overrides.

use crate::color::Rgba;
use crate::pixel_grid::{MAX_PIXEL_SIZE, MIN_PIXEL_SIZE};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default canvas width in pixels.
pub const DEFAULT_WIDTH: u32 = 800;
/// Default canvas height in pixels.
pub const DEFAULT_HEIGHT: u32 = 600;
/// Largest canvas edge accepted.
pub const MAX_CANVAS_SIZE: u32 = 2048;
/// Key under which the stroke log is persisted.
pub const DEFAULT_STORAGE_KEY: &str = "whiteboardActions";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Tunables for a whiteboard session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub width: u32,
    pub height: u32,
    /// Maximum number of history entries kept.
    pub history_capacity: usize,
    /// Brush size used by the ink tools.
    pub tool_size: f64,
    /// Ink colour.
    pub color: Rgba,
    pub blur_radius: f64,
    pub smudge_radius: f64,
    pub font_family: String,
    pub font_size: f64,
    /// Initial pixel-grid cell size.
    pub pixel_size: u32,
    /// Initial pixel paint colour.
    pub pixel_color: Rgba,
    /// SVG character ceiling for minting.
    pub svg_max_chars: usize,
    /// SVG character count at which a warning is raised.
    pub svg_warning_chars: usize,
    /// Storage key for the stroke log.
    pub storage_key: String,
    /// TrueType/OpenType font used to rasterise text and emoji.
    pub font_path: Option<PathBuf>,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            history_capacity: 50,
            tool_size: 5.0,
            color: Rgba::black(),
            blur_radius: 10.0,
            smudge_radius: 20.0,
            font_family: "Arial".to_string(),
            font_size: 24.0,
            pixel_size: 20,
            pixel_color: Rgba::rgb(255, 0, 0),
            svg_max_chars: 50_000,
            svg_warning_chars: 40_000,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            font_path: None,
        }
    }
}

impl BoardConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Default configuration with a specific canvas size.
    pub fn with_size(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()
    }

    /// Load a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Reject unusable values and clamp the soft ones.
    pub fn validate(mut self) -> Result<Self, ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "canvas must be non-empty, got {}x{}",
                self.width, self.height
            )));
        }
        if self.width > MAX_CANVAS_SIZE || self.height > MAX_CANVAS_SIZE {
            return Err(ConfigError::Invalid(format!(
                "canvas exceeds {MAX_CANVAS_SIZE}px, got {}x{}",
                self.width, self.height
            )));
        }
        if self.history_capacity == 0 {
            return Err(ConfigError::Invalid("history capacity must be at least 1".to_string()));
        }
        for (name, radius) in [("blur_radius", self.blur_radius), ("smudge_radius", self.smudge_radius)] {
            if !radius.is_finite() || radius <= 0.0 {
                return Err(ConfigError::Invalid(format!("{name} must be a positive number, got {radius}")));
            }
        }
        if self.svg_warning_chars > self.svg_max_chars {
            log::warn!(
                "SVG warning threshold {} exceeds maximum {}, lowering it",
                self.svg_warning_chars,
                self.svg_max_chars
            );
            self.svg_warning_chars = self.svg_max_chars;
        }
        self.pixel_size = self.pixel_size.clamp(MIN_PIXEL_SIZE, MAX_PIXEL_SIZE);
        self.tool_size = self.tool_size.max(1.0);
        self.font_size = self.font_size.max(1.0);
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BoardConfig::default();
        assert_eq!(config.history_capacity, 50);
        assert_eq!(config.pixel_size, 20);
        assert_eq!(config.storage_key, "whiteboardActions");
        assert!((config.tool_size - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = BoardConfig::from_json(r##"{"width": 320, "color": "#00ff00"}"##).unwrap();
        assert_eq!(config.width, 320);
        assert_eq!(config.height, DEFAULT_HEIGHT);
        assert_eq!(config.color, Rgba::rgb(0, 255, 0));
    }

    #[test]
    fn test_rejects_empty_canvas() {
        let result = BoardConfig::from_json(r#"{"width": 0}"#);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_bad_effect_radii() {
        let result = BoardConfig::from_json(r#"{"smudge_radius": -4}"#);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));

        let config = BoardConfig {
            blur_radius: f64::NAN,
            ..BoardConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = BoardConfig {
            smudge_radius: f64::INFINITY,
            ..BoardConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_clamps_pixel_size() {
        let config = BoardConfig::from_json(r#"{"pixel_size": 400}"#).unwrap();
        assert_eq!(config.pixel_size, MAX_PIXEL_SIZE);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board.json");
        fs::write(&path, r#"{"height": 240, "history_capacity": 10}"#).unwrap();

        let config = BoardConfig::load(&path).unwrap();
        assert_eq!(config.height, 240);
        assert_eq!(config.history_capacity, 10);
    }
}
