//! Scene elements drawn above the ink surface.
//!
//! Every element shares an [`ElementFrame`] (position, size, rotation and
//! scale about the centre) and carries a variant payload in [`ElementKind`].

mod image;
mod text;

pub use image::{GENERATED_MAX_FRACTION, ImageFormat, ImageProvenance, ImageSource};
pub use text::{ApproxTextMetrics, TextMetrics, TextPayload};

#[cfg(test)]
pub(crate) use image::tests::png_bytes;

use crate::color::Rgba;
use kurbo::{Affine, Point, Vec2};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Smallest width or height an element can be given.
pub const MIN_ELEMENT_SIZE: f64 = 10.0;
/// Smallest scale factor accepted.
pub const MIN_ELEMENT_SCALE: f64 = 0.1;
/// Edge length of a newly placed emoji.
pub const EMOJI_SIZE: f64 = 50.0;

/// Element errors.
#[derive(Debug, Error)]
pub enum ElementError {
    #[error("Unsupported image format")]
    UnsupportedFormat,
    #[error("Image decode failed: {0}")]
    Decode(String),
}

/// Unique identifier for elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(Uuid);

impl ElementId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Placement of an element on the canvas.
///
/// `(x, y)` is the top-left corner before transformation. Rotation and scale
/// are applied about the centre of the unscaled box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElementFrame {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Rotation in radians.
    pub rotation: f64,
    pub scale: f64,
}

impl ElementFrame {
    /// Unrotated, unscaled frame. Sizes are clamped to the minimum.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width: clamp_size(width),
            height: clamp_size(height),
            rotation: 0.0,
            scale: 1.0,
        }
    }

    /// Centre of the box in canvas space.
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Width and height after scaling.
    pub fn scaled_size(&self) -> (f64, f64) {
        (self.width * self.scale, self.height * self.scale)
    }

    /// Map from centre-origin local coordinates to canvas space:
    /// translate to centre, rotate, then scale.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.center().to_vec2()) * Affine::rotate(self.rotation) * Affine::scale(self.scale)
    }

    /// Express a canvas point relative to the centre in the element's rotated
    /// (but unscaled) axes.
    pub fn to_rotated_local(&self, point: Point) -> Vec2 {
        let d = point - self.center();
        let (sin, cos) = self.rotation.sin_cos();
        Vec2::new(d.x * cos + d.y * sin, -d.x * sin + d.y * cos)
    }

    /// Inverse of [`Self::to_rotated_local`].
    pub fn rotated_local_to_canvas(&self, local: Vec2) -> Point {
        let (sin, cos) = self.rotation.sin_cos();
        self.center() + Vec2::new(local.x * cos - local.y * sin, local.x * sin + local.y * cos)
    }

    /// Whether `point` lies in the scaled box, taking rotation into account.
    pub fn contains(&self, point: Point) -> bool {
        let local = self.to_rotated_local(point);
        let (w, h) = self.scaled_size();
        local.x.abs() <= w / 2.0 && local.y.abs() <= h / 2.0
    }

    /// Apply a partial update. Non-finite values are ignored and sizes are
    /// clamped to their minimums.
    pub fn apply(&mut self, patch: &ElementPatch) {
        let finite = |v: Option<f64>| v.filter(|v| v.is_finite());
        if let Some(x) = finite(patch.x) {
            self.x = x;
        }
        if let Some(y) = finite(patch.y) {
            self.y = y;
        }
        if let Some(width) = finite(patch.width) {
            self.width = clamp_size(width);
        }
        if let Some(height) = finite(patch.height) {
            self.height = clamp_size(height);
        }
        if let Some(rotation) = finite(patch.rotation) {
            self.rotation = rotation;
        }
        if let Some(scale) = finite(patch.scale) {
            self.scale = scale.max(MIN_ELEMENT_SCALE);
        }
    }
}

fn clamp_size(v: f64) -> f64 {
    if v.is_finite() { v.max(MIN_ELEMENT_SIZE) } else { MIN_ELEMENT_SIZE }
}

/// Partial transform update for [`crate::store::ElementStore::transform`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ElementPatch {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub rotation: Option<f64>,
    pub scale: Option<f64>,
}

impl ElementPatch {
    pub fn position(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    pub fn size(width: f64, height: f64) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            ..Self::default()
        }
    }

    pub fn rotation(rotation: f64) -> Self {
        Self {
            rotation: Some(rotation),
            ..Self::default()
        }
    }

    pub fn scale(scale: f64) -> Self {
        Self {
            scale: Some(scale),
            ..Self::default()
        }
    }
}

/// A small colour matrix drawn cell by cell inside a placeholder element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelSprite {
    pub columns: usize,
    pub rows: usize,
    /// Row-major cells; `None` is transparent.
    pub cells: Vec<Option<Rgba>>,
}

impl PixelSprite {
    /// Create a transparent sprite.
    pub fn new(columns: usize, rows: usize) -> Self {
        Self {
            columns,
            rows,
            cells: vec![None; columns * rows],
        }
    }

    /// Cell colour, or `None` when transparent or out of range.
    pub fn get(&self, col: usize, row: usize) -> Option<Rgba> {
        if col >= self.columns || row >= self.rows {
            return None;
        }
        self.cells.get(row * self.columns + col).copied().flatten()
    }

    /// Set a cell; out-of-range coordinates are ignored.
    pub fn set(&mut self, col: usize, row: usize, color: Option<Rgba>) {
        if col < self.columns && row < self.rows {
            self.cells[row * self.columns + col] = color;
        }
    }
}

/// Variant payload of an element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ElementKind {
    Image(ImageSource),
    Text(TextPayload),
    /// A single glyph drawn at the element's height.
    Emoji { glyph: String },
    PixelPlaceholder(PixelSprite),
}

impl ElementKind {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            ElementKind::Image(_) => "image",
            ElementKind::Text(_) => "text",
            ElementKind::Emoji { .. } => "emoji",
            ElementKind::PixelPlaceholder(_) => "pixel placeholder",
        }
    }
}

/// A positioned, transformable scene object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub(crate) id: ElementId,
    pub frame: ElementFrame,
    pub kind: ElementKind,
}

impl Element {
    /// Create an element with a fresh id.
    pub fn new(frame: ElementFrame, kind: ElementKind) -> Self {
        Self {
            id: ElementId::new(),
            frame,
            kind,
        }
    }

    /// Emoji centred on a canvas of the given size.
    pub fn emoji(glyph: impl Into<String>, canvas_width: f64, canvas_height: f64) -> Self {
        let frame = ElementFrame::new(
            canvas_width / 2.0 - EMOJI_SIZE / 2.0,
            canvas_height / 2.0 - EMOJI_SIZE / 2.0,
            EMOJI_SIZE,
            EMOJI_SIZE,
        );
        Self::new(frame, ElementKind::Emoji { glyph: glyph.into() })
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    /// Hit test against the element's rotated, scaled box.
    pub fn hit_test(&self, point: Point) -> bool {
        self.frame.contains(point)
    }
}
