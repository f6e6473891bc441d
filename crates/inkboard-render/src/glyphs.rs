//! Glyph rasterisation for text and emoji elements.

use crate::{RenderError, RenderResult};
use ab_glyph::{Font, FontArc, PxScale, ScaleFont};
use inkboard_core::{Rgba, TextMetrics};
use std::path::Path;
use tiny_skia::{IntSize, Pixmap};

/// Fonts tried when no font file is configured.
const SYSTEM_FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Largest edge of a rasterised text pixmap.
const MAX_RASTER_EDGE: u32 = 8192;

/// Lays out and rasterises single-line text with one font.
#[derive(Clone)]
pub struct GlyphPainter {
    font: FontArc,
}

impl std::fmt::Debug for GlyphPainter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlyphPainter").finish_non_exhaustive()
    }
}

impl GlyphPainter {
    pub fn from_bytes(data: Vec<u8>) -> RenderResult<Self> {
        let font = FontArc::try_from_vec(data).map_err(|e| RenderError::Font(e.to_string()))?;
        Ok(Self { font })
    }

    pub fn from_file(path: &Path) -> RenderResult<Self> {
        let data = std::fs::read(path).map_err(|e| RenderError::Font(format!("{}: {}", path.display(), e)))?;
        Self::from_bytes(data)
    }

    /// First usable font from the usual system locations.
    pub fn find_system_font() -> Option<Self> {
        SYSTEM_FONT_PATHS.iter().find_map(|path| {
            let path = Path::new(path);
            if !path.exists() {
                return None;
            }
            match Self::from_file(path) {
                Ok(painter) => {
                    log::debug!("Using system font {}", path.display());
                    Some(painter)
                }
                Err(e) => {
                    log::debug!("Skipping font: {}", e);
                    None
                }
            }
        })
    }

    /// Whether the font has an outline for `c`.
    pub fn has_glyph(&self, c: char) -> bool {
        self.font.glyph_id(c).0 != 0
    }

    /// Whether every visible character of `text` is covered.
    pub fn covers(&self, text: &str) -> bool {
        text.chars()
            .filter(|c| !c.is_whitespace() && !c.is_control() && *c != '\u{FE0F}')
            .all(|c| self.has_glyph(c))
    }

    /// Advance width of `text` at `size` pixels.
    pub fn text_width(&self, text: &str, size: f32) -> f32 {
        let scaled = self.font.as_scaled(PxScale::from(size));
        text.chars().map(|c| scaled.h_advance(scaled.glyph_id(c))).sum()
    }

    /// Rasterise `text` into a tight premultiplied pixmap whose height is one
    /// line. Returns `None` for empty or zero-sized text.
    pub fn rasterize(&self, text: &str, size: f32, color: Rgba) -> Option<Pixmap> {
        let scale = PxScale::from(size);
        let scaled = self.font.as_scaled(scale);
        let width = self.text_width(text, size).ceil() as u32;
        let height = (scaled.ascent() - scaled.descent()).ceil() as u32;
        if width == 0 || height == 0 {
            return None;
        }
        if width > MAX_RASTER_EDGE || height > MAX_RASTER_EDGE {
            log::debug!("Text of {}x{}px is too large to rasterise", width, height);
            return None;
        }
        let size = IntSize::from_wh(width, height)?;
        let (w, h) = (width as usize, height as usize);

        let mut rgba = vec![0u8; w.checked_mul(h)?.checked_mul(4)?];
        let baseline = scaled.ascent();
        let mut x_offset = 0.0f32;
        for c in text.chars() {
            let glyph_id = scaled.glyph_id(c);
            let glyph = glyph_id.with_scale_and_position(scale, ab_glyph::point(x_offset, baseline));
            if let Some(outlined) = scaled.outline_glyph(glyph) {
                let bounds = outlined.px_bounds();
                outlined.draw(|px, py, coverage| {
                    let x = bounds.min.x as i32 + px as i32;
                    let y = bounds.min.y as i32 + py as i32;
                    if x < 0 || y < 0 || x as usize >= w || y as usize >= h {
                        return;
                    }
                    let idx = (y as usize * w + x as usize) * 4;
                    let alpha = (coverage.clamp(0.0, 1.0) * color.a as f32) as u8;
                    if alpha > rgba[idx + 3] {
                        let premul = |v: u8| (v as u16 * alpha as u16 / 255) as u8;
                        rgba[idx] = premul(color.r);
                        rgba[idx + 1] = premul(color.g);
                        rgba[idx + 2] = premul(color.b);
                        rgba[idx + 3] = alpha;
                    }
                });
            }
            x_offset += scaled.h_advance(glyph_id);
        }

        Pixmap::from_vec(rgba, size)
    }
}

impl TextMetrics for GlyphPainter {
    fn measure(&self, content: &str, font_size: f64) -> f64 {
        self.text_width(content, font_size as f32) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_invalid_font() {
        assert!(matches!(GlyphPainter::from_bytes(vec![1, 2, 3]), Err(RenderError::Font(_))));
        assert!(GlyphPainter::from_file(Path::new("/nonexistent/font.ttf")).is_err());
    }

    #[test]
    fn test_system_font_rasterises() {
        let Some(painter) = GlyphPainter::find_system_font() else {
            // No fonts installed on this machine
            return;
        };
        assert!(painter.covers("Hello"));
        let narrow = painter.text_width("i", 24.0);
        let wide = painter.text_width("iiii", 24.0);
        assert!(wide > narrow * 3.5);
        assert!((painter.measure("iiii", 24.0) - wide as f64).abs() < 1e-3);

        let pixmap = painter.rasterize("Hi", 24.0, Rgba::black()).unwrap();
        assert!(pixmap.height() >= 24);
        assert!(pixmap.pixels().iter().any(|p| p.alpha() > 0));
        assert!(painter.rasterize("", 24.0, Rgba::black()).is_none());
        assert!(painter.rasterize("Hi", 1.0e7, Rgba::black()).is_none());
        assert!(painter.rasterize("Hi", f32::NAN, Rgba::black()).is_none());
    }
}
