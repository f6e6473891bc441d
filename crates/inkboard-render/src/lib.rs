//! Inkboard Render Library
//!
//! CPU rendering for Inkboard: a tiny-skia ink surface, the frame compositor
//! and PNG/JPEG export.

mod compositor;
pub mod export;
mod glyphs;
mod ink;

pub use compositor::{Compositor, DELETE_COLOR, FrameOptions, SELECTION_COLOR, decode_image, to_skia};
pub use export::RasterFormat;
pub use glyphs::GlyphPainter;
pub use ink::PixmapInk;

use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Invalid frame size: {0}x{1}")]
    InvalidSize(u32, u32),
    #[error("Font error: {0}")]
    Font(String),
    #[error("Image decode failed: {0}")]
    Decode(String),
    #[error("Export failed: {0}")]
    Export(String),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;
