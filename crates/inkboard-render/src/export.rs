//! Raster export of composited frames.

use crate::{RenderError, RenderResult};
use image::ImageEncoder;
use std::io::Cursor;
use std::path::Path;
use tiny_skia::Pixmap;

/// Default JPEG quality.
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Raster output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterFormat {
    Png,
    /// Lossy, flattened onto white.
    Jpeg { quality: u8 },
}

impl RasterFormat {
    /// Pick a format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "png" => Some(RasterFormat::Png),
            "jpg" | "jpeg" => Some(RasterFormat::Jpeg {
                quality: DEFAULT_JPEG_QUALITY,
            }),
            _ => None,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            RasterFormat::Png => "image/png",
            RasterFormat::Jpeg { .. } => "image/jpeg",
        }
    }
}

/// Straight-alpha RGBA bytes of a frame.
pub fn to_rgba(pixmap: &Pixmap) -> Vec<u8> {
    let mut out = Vec::with_capacity(pixmap.data().len());
    for px in pixmap.pixels() {
        let c = px.demultiply();
        out.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    out
}

/// Encode a frame.
pub fn encode(pixmap: &Pixmap, format: RasterFormat) -> RenderResult<Vec<u8>> {
    match format {
        RasterFormat::Png => encode_png(pixmap),
        RasterFormat::Jpeg { quality } => encode_jpeg(pixmap, quality),
    }
}

/// Encode as 8-bit RGBA PNG.
pub fn encode_png(pixmap: &Pixmap) -> RenderResult<Vec<u8>> {
    let rgba = to_rgba(pixmap);
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, pixmap.width(), pixmap.height());
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder
            .write_header()
            .map_err(|e| RenderError::Export(format!("PNG header: {}", e)))?;
        writer
            .write_image_data(&rgba)
            .map_err(|e| RenderError::Export(format!("PNG encoding failed: {}", e)))?;
        writer
            .finish()
            .map_err(|e| RenderError::Export(format!("PNG encoding failed: {}", e)))?;
    }
    Ok(out)
}

/// Encode as JPEG, compositing any transparency onto white.
pub fn encode_jpeg(pixmap: &Pixmap, quality: u8) -> RenderResult<Vec<u8>> {
    let (width, height) = (pixmap.width(), pixmap.height());
    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    for px in pixmap.pixels() {
        let c = px.demultiply();
        let alpha = f32::from(c.alpha()) / 255.0;
        let inv = 1.0 - alpha;
        for v in [c.red(), c.green(), c.blue()] {
            rgb.push(f32::from(v).mul_add(alpha, 255.0 * inv).round() as u8);
        }
    }

    let mut buf = Cursor::new(Vec::new());
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100));
    encoder
        .write_image(&rgb, width, height, image::ExtendedColorType::Rgb8)
        .map_err(|e| RenderError::Export(format!("JPEG encoding failed: {}", e)))?;
    Ok(buf.into_inner())
}

/// Encode and write a frame, choosing the format from the extension.
pub fn save(pixmap: &Pixmap, path: &Path) -> RenderResult<RasterFormat> {
    let format = RasterFormat::from_path(path)
        .ok_or_else(|| RenderError::Export(format!("Unsupported raster extension: {}", path.display())))?;
    let bytes = encode(pixmap, format)?;
    std::fs::write(path, bytes).map_err(|e| RenderError::Export(format!("{}: {}", path.display(), e)))?;
    log::info!("Wrote {} ({})", path.display(), format.mime_type());
    Ok(format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiny_skia::Color;

    fn frame() -> Pixmap {
        let mut pixmap = Pixmap::new(8, 4).unwrap();
        pixmap.fill(Color::from_rgba8(255, 0, 0, 255));
        pixmap
    }

    #[test]
    fn test_png_round_trips_through_image() {
        let bytes = encode_png(&frame()).unwrap();
        assert!(bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47]));
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (8, 4));
        assert_eq!(decoded.get_pixel(3, 2).0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_jpeg_flattens_on_white() {
        // Fully transparent frame
        let pixmap = Pixmap::new(16, 16).unwrap();
        let bytes = encode_jpeg(&pixmap, 95).unwrap();
        assert!(bytes.starts_with(&[0xFF, 0xD8, 0xFF]));
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgb8();
        let [r, g, b] = decoded.get_pixel(8, 8).0;
        assert!(r > 245 && g > 245 && b > 245);
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(RasterFormat::from_path(Path::new("a.PNG")), Some(RasterFormat::Png));
        assert!(matches!(
            RasterFormat::from_path(Path::new("b.jpeg")),
            Some(RasterFormat::Jpeg { .. })
        ));
        assert_eq!(RasterFormat::from_path(Path::new("c.svg")), None);
        assert_eq!(RasterFormat::from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_save_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        assert_eq!(save(&frame(), &path).unwrap(), RasterFormat::Png);
        assert!(std::fs::read(&path).unwrap().starts_with(&[0x89, 0x50]));
        assert!(save(&frame(), &dir.path().join("frame.bmp")).is_err());
    }
}
