//! Text payloads and measurement.

use crate::color::Rgba;
use serde::{Deserialize, Serialize};

/// Text drawn inside an element box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextPayload {
    pub content: String,
    pub font_family: String,
    pub font_size: f64,
    pub color: Rgba,
}

/// Measures rendered text width.
///
/// The renderer owns the real font, so it supplies the measurement used to
/// size text elements.
pub trait TextMetrics {
    /// Advance width of `content` at `font_size` pixels.
    fn measure(&self, content: &str, font_size: f64) -> f64;
}

/// Rough metrics for hosts without a font: 0.6 em per character.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproxTextMetrics;

impl TextMetrics for ApproxTextMetrics {
    fn measure(&self, content: &str, font_size: f64) -> f64 {
        content.chars().count() as f64 * font_size * 0.6
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approx_metrics() {
        let w = ApproxTextMetrics.measure("abcd", 10.0);
        assert!((w - 24.0).abs() < 1e-9);
        assert!(ApproxTextMetrics.measure("", 10.0).abs() < f64::EPSILON);
    }
}
