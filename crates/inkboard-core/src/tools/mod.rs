//! Tool selection and per-tool settings.

use crate::color::Rgba;
use crate::config::BoardConfig;
use serde::{Deserialize, Serialize};

/// Number of dots scattered per spray step.
pub const SPRAY_DENSITY: usize = 50;

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    #[default]
    Pencil,
    Brush,
    Spray,
    Eraser,
    Blur,
    Smudge,
    Dotted,
    Text,
    /// Moves the element under the pointer.
    Crop,
    Resize,
}

impl Tool {
    /// All tools in toolbar order.
    pub const ALL: [Tool; 10] = [
        Tool::Pencil,
        Tool::Brush,
        Tool::Spray,
        Tool::Eraser,
        Tool::Blur,
        Tool::Smudge,
        Tool::Dotted,
        Tool::Text,
        Tool::Crop,
        Tool::Resize,
    ];

    /// The stroke kind this tool records, if it draws on the ink surface.
    pub fn stroke_kind(self) -> Option<StrokeKind> {
        match self {
            Tool::Pencil => Some(StrokeKind::Pencil),
            Tool::Brush => Some(StrokeKind::Brush),
            Tool::Spray => Some(StrokeKind::Spray),
            Tool::Eraser => Some(StrokeKind::Eraser),
            Tool::Blur => Some(StrokeKind::Blur),
            Tool::Smudge => Some(StrokeKind::Smudge),
            Tool::Dotted => Some(StrokeKind::Dotted),
            Tool::Text | Tool::Crop | Tool::Resize => None,
        }
    }

    /// Whether this tool manipulates existing elements.
    pub fn manipulates_elements(self) -> bool {
        matches!(self, Tool::Crop | Tool::Resize)
    }

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            Tool::Pencil => "Pencil",
            Tool::Brush => "Brush",
            Tool::Spray => "Spray",
            Tool::Eraser => "Eraser",
            Tool::Blur => "Blur",
            Tool::Smudge => "Smudge",
            Tool::Dotted => "Dotted",
            Tool::Text => "Text",
            Tool::Crop => "Crop",
            Tool::Resize => "Resize",
        }
    }
}

/// Ink-drawing stroke kinds recorded in the stroke log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrokeKind {
    Pencil,
    Brush,
    Spray,
    Eraser,
    Blur,
    Smudge,
    Dotted,
}

impl StrokeKind {
    /// Whether the SVG exporter can express this kind as a path.
    pub fn is_vector(self) -> bool {
        matches!(self, StrokeKind::Pencil | StrokeKind::Brush)
    }
}

/// Colour and size used by the ink tools.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BrushSettings {
    pub color: Rgba,
    pub size: f64,
}

impl BrushSettings {
    /// Settings with the size clamped to at least one pixel.
    pub fn new(color: Rgba, size: f64) -> Self {
        Self {
            color,
            size: size.max(1.0),
        }
    }
}

/// Radii for the two area-effect tools.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectRadii {
    pub blur: f64,
    pub smudge: f64,
}

impl Default for EffectRadii {
    fn default() -> Self {
        Self {
            blur: 10.0,
            smudge: 20.0,
        }
    }
}

/// Settings for the text tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSettings {
    /// Content placed on the next text-tool click. Empty means no-op.
    pub content: String,
    pub font_family: String,
    pub font_size: f64,
}

impl TextSettings {
    pub fn from_config(config: &BoardConfig) -> Self {
        Self {
            content: String::new(),
            font_family: config.font_family.clone(),
            font_size: config.font_size,
        }
    }
}

impl Default for TextSettings {
    fn default() -> Self {
        Self::from_config(&BoardConfig::default())
    }
}
