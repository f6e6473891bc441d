//! Image payloads for scene elements.

use super::{ElementError, ElementFrame};
use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use std::io::Cursor;

/// Fraction of the canvas a generated image may occupy.
pub const GENERATED_MAX_FRACTION: f64 = 0.8;

/// Image format for stored image data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageFormat {
    /// PNG format.
    Png,
    /// JPEG format.
    Jpeg,
    /// WebP format.
    WebP,
    /// GIF format; only the first frame is drawn.
    Gif,
    /// BMP format.
    Bmp,
}

impl ImageFormat {
    /// Get MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::WebP => "image/webp",
            ImageFormat::Gif => "image/gif",
            ImageFormat::Bmp => "image/bmp",
        }
    }

    /// Detect format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            Some(ImageFormat::Png)
        } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(ImageFormat::Jpeg)
        } else if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            Some(ImageFormat::WebP)
        } else if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            Some(ImageFormat::Gif)
        } else if data.starts_with(b"BM") {
            Some(ImageFormat::Bmp)
        } else {
            None
        }
    }
}

/// Where an image came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ImageProvenance {
    /// Loaded from a user file.
    #[default]
    Upload,
    /// Produced by an image generator for the given prompt.
    Generated { prompt: String },
}

/// Encoded image bytes plus the header facts needed to place them.
///
/// The bytes stay encoded so history snapshots remain cheap to compare and
/// clone; renderers decode on demand.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageSource {
    pub format: ImageFormat,
    /// Original image width in pixels.
    pub source_width: u32,
    /// Original image height in pixels.
    pub source_height: u32,
    /// Image data as base64.
    pub data_base64: String,
    pub provenance: ImageProvenance,
}

impl ImageSource {
    /// Read the format and dimensions from raw file bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self, ElementError> {
        let format = ImageFormat::from_magic_bytes(data).ok_or(ElementError::UnsupportedFormat)?;
        let (source_width, source_height) = ::image::ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| ElementError::Decode(e.to_string()))?
            .into_dimensions()
            .map_err(|e| ElementError::Decode(e.to_string()))?;
        if source_width == 0 || source_height == 0 {
            return Err(ElementError::Decode("image has no pixels".to_string()));
        }

        Ok(Self {
            format,
            source_width,
            source_height,
            data_base64: STANDARD.encode(data),
            provenance: ImageProvenance::Upload,
        })
    }

    /// Mark this image as generated from `prompt`.
    pub fn generated(mut self, prompt: impl Into<String>) -> Self {
        self.provenance = ImageProvenance::Generated { prompt: prompt.into() };
        self
    }

    /// The encoded bytes.
    pub fn data(&self) -> Result<Vec<u8>, ElementError> {
        STANDARD
            .decode(&self.data_base64)
            .map_err(|e| ElementError::Decode(e.to_string()))
    }

    /// The image as a `data:` URL.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.format.mime_type(), self.data_base64)
    }

    /// Whether the image came from a generator.
    pub fn is_generated(&self) -> bool {
        matches!(self.provenance, ImageProvenance::Generated { .. })
    }

    /// Frame for an uploaded image: stretched over the whole canvas.
    pub fn upload_frame(canvas_width: f64, canvas_height: f64) -> ElementFrame {
        ElementFrame::new(0.0, 0.0, canvas_width, canvas_height)
    }

    /// Frame for a generated image: shrunk to fit 80% of the canvas if
    /// larger, aspect preserved, centred.
    pub fn generated_frame(&self, canvas_width: f64, canvas_height: f64) -> ElementFrame {
        let max_width = canvas_width * GENERATED_MAX_FRACTION;
        let max_height = canvas_height * GENERATED_MAX_FRACTION;
        let mut width = self.source_width as f64;
        let mut height = self.source_height as f64;

        if width > max_width || height > max_height {
            let scale = (max_width / width).min(max_height / height);
            width *= scale;
            height *= scale;
        }

        ElementFrame::new(
            (canvas_width - width) / 2.0,
            (canvas_height - height) / 2.0,
            width,
            height,
        )
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    fn encoded(width: u32, height: u32, format: ::image::ImageFormat) -> Vec<u8> {
        let img = ::image::RgbaImage::from_pixel(width, height, ::image::Rgba([200, 10, 10, 255]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, format).unwrap();
        out.into_inner()
    }

    /// Encode a solid-colour PNG for tests.
    pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        encoded(width, height, ::image::ImageFormat::Png)
    }

    /// A 1x1 GIF89a.
    const TINY_GIF: &[u8] = &[
        0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x01, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0x00, 0x00,
        0x00, 0x21, 0xF9, 0x04, 0x01, 0x00, 0x00, 0x00, 0x00, 0x2C, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00,
        0x00, 0x02, 0x02, 0x44, 0x01, 0x00, 0x3B,
    ];

    #[test]
    fn test_magic_bytes() {
        assert_eq!(ImageFormat::from_magic_bytes(&png_bytes(1, 1)), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::from_magic_bytes(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_magic_bytes(b"GIF87a"), Some(ImageFormat::Gif));
        assert_eq!(ImageFormat::from_magic_bytes(b"GIF90a"), None);
        assert_eq!(ImageFormat::from_magic_bytes(&[]), None);
    }

    #[test]
    fn test_gif_and_bmp_uploads() {
        let source = ImageSource::from_bytes(TINY_GIF).unwrap();
        assert_eq!(source.format, ImageFormat::Gif);
        assert_eq!((source.source_width, source.source_height), (1, 1));
        assert!(source.data_url().starts_with("data:image/gif;base64,"));

        let gif = ImageSource::from_bytes(&encoded(7, 3, ::image::ImageFormat::Gif)).unwrap();
        assert_eq!((gif.source_width, gif.source_height), (7, 3));

        let bmp = ImageSource::from_bytes(&encoded(4, 5, ::image::ImageFormat::Bmp)).unwrap();
        assert_eq!(bmp.format, ImageFormat::Bmp);
        assert_eq!((bmp.source_width, bmp.source_height), (4, 5));
    }

    #[test]
    fn test_from_bytes_reads_dimensions() {
        let source = ImageSource::from_bytes(&png_bytes(30, 12)).unwrap();
        assert_eq!(source.format, ImageFormat::Png);
        assert_eq!((source.source_width, source.source_height), (30, 12));
        assert!(!source.is_generated());
        assert!(source.data_url().starts_with("data:image/png;base64,"));
        assert_eq!(source.data().unwrap(), png_bytes(30, 12));
    }

    #[test]
    fn test_from_bytes_rejects_garbage() {
        assert!(matches!(ImageSource::from_bytes(b"hello world"), Err(ElementError::UnsupportedFormat)));
        // PNG signature followed by junk
        let mut bad = vec![0x89, 0x50, 0x4E, 0x47];
        bad.extend_from_slice(&[0; 16]);
        assert!(matches!(ImageSource::from_bytes(&bad), Err(ElementError::Decode(_))));
    }

    #[test]
    fn test_generated_frame_scales_down_and_centres() {
        let source = ImageSource::from_bytes(&png_bytes(1000, 500)).unwrap().generated("a cat");
        let frame = source.generated_frame(800.0, 600.0);
        // 0.8 * 800 = 640 wide limit wins
        assert!((frame.width - 640.0).abs() < 1e-9);
        assert!((frame.height - 320.0).abs() < 1e-9);
        assert!((frame.x - 80.0).abs() < 1e-9);
        assert!((frame.y - 140.0).abs() < 1e-9);
        assert!(source.is_generated());
    }

    #[test]
    fn test_generated_frame_keeps_small_images() {
        let source = ImageSource::from_bytes(&png_bytes(100, 50)).unwrap();
        let frame = source.generated_frame(800.0, 600.0);
        assert!((frame.width - 100.0).abs() < f64::EPSILON);
        assert!((frame.x - 350.0).abs() < f64::EPSILON);
    }
}
