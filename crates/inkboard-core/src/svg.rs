//! Compact SVG export for on-chain storage.
//!
//! The markup is rebuilt from the stroke log (or from painted grid cells in
//! pixel mode), never from the raster. Images, emoji and the area-effect
//! tools have no vector form and are left out.

use crate::pixel_grid::PixelGrid;
use crate::stroke::{StrokeAction, TextStroke};
use serde::Serialize;
use std::fmt::Write;

/// Advice shown when the SVG is over the hard ceiling.
pub const ADVICE_TOO_LARGE: &str = "Simplify your artwork - remove some elements";
/// Advice shown when the SVG is over the warning threshold.
pub const ADVICE_LARGE: &str = "Consider simplifying to reduce gas costs";
/// Advice shown when the SVG is comfortably small.
pub const ADVICE_OK: &str = "Size is good for on-chain minting";

/// Build the SVG document for a board.
///
/// With a grid, only painted cells are emitted; otherwise pencil and brush
/// strokes become paths and text placements become `<text>`.
pub fn export_svg(width: u32, height: u32, log: &[StrokeAction], grid: Option<&PixelGrid>) -> String {
    let mut svg = String::new();
    // Writing to a String cannot fail
    let _ = write!(
        svg,
        r#"<svg width="{width}" height="{height}" xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {width} {height}">"#
    );
    svg.push_str(r#"<rect width="100%" height="100%" fill="white"/>"#);

    match grid {
        Some(grid) => write_grid(&mut svg, grid),
        None => {
            for action in log {
                write_action(&mut svg, action);
            }
        }
    }

    svg.push_str("</svg>");
    svg
}

fn write_grid(svg: &mut String, grid: &PixelGrid) {
    let size = grid.cell_size() as usize;
    for (row, col, color) in grid.painted_cells() {
        let _ = write!(
            svg,
            r#"<rect x="{}" y="{}" width="{size}" height="{size}" fill="{}"/>"#,
            col * size,
            row * size,
            color.to_hex()
        );
    }
}

fn write_action(svg: &mut String, action: &StrokeAction) {
    if let StrokeAction::Text(text) = action {
        write_text(svg, text);
        return;
    }
    let Some((kind, stroke)) = action.as_ink() else {
        return;
    };
    if !kind.is_vector() || stroke.points.len() < 2 {
        return;
    }

    let mut d = String::with_capacity(stroke.points.len() * 12);
    for (i, p) in stroke.points.iter().enumerate() {
        let cmd = if i == 0 { 'M' } else { 'L' };
        let _ = write!(d, "{cmd}{:.1},{:.1}", p.x, p.y);
    }
    let _ = write!(
        svg,
        r#"<path d="{d}" stroke="{}" stroke-width="{:.1}" fill="none" stroke-linecap="round" stroke-linejoin="round"/>"#,
        stroke.color.to_hex(),
        stroke.line_width(kind)
    );
}

fn write_text(svg: &mut String, text: &TextStroke) {
    if text.content.is_empty() {
        return;
    }
    let _ = write!(
        svg,
        r#"<text x="{:.1}" y="{:.1}" font-family="{}" font-size="{:.1}" fill="{}">{}</text>"#,
        text.x,
        text.y,
        escape(&text.font_family),
        text.font_size,
        text.color.to_hex(),
        escape(&text.content)
    );
}

/// Escape XML special characters.
pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Size report for an SVG against minting limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SvgSizeInfo {
    /// Character count of the markup.
    pub size: usize,
    pub max_size: usize,
    pub warning_size: usize,
    pub is_too_large: bool,
    pub is_large: bool,
    /// Size as a rounded percentage of `max_size`.
    pub percentage: u32,
    pub recommendation: &'static str,
}

impl SvgSizeInfo {
    /// Measure `svg` against the given ceilings.
    pub fn measure(svg: &str, max_size: usize, warning_size: usize) -> Self {
        let size = svg.chars().count();
        let is_too_large = size > max_size;
        let is_large = size > warning_size;
        let percentage = if max_size == 0 {
            100
        } else {
            (size as f64 / max_size as f64 * 100.0).round() as u32
        };
        let recommendation = if is_too_large {
            ADVICE_TOO_LARGE
        } else if is_large {
            ADVICE_LARGE
        } else {
            ADVICE_OK
        };

        Self {
            size,
            max_size,
            warning_size,
            is_too_large,
            is_large,
            percentage,
            recommendation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgba;
    use crate::stroke::InkStroke;
    use kurbo::Point;

    fn pencil(points: &[(f64, f64)]) -> StrokeAction {
        StrokeAction::Pencil(InkStroke {
            color: Rgba::black(),
            size: 5.0,
            points: points.iter().map(|&(x, y)| Point::new(x, y)).collect(),
        })
    }

    fn path_d(svg: &str) -> &str {
        let start = svg.find(r#"d=""#).unwrap() + 3;
        let end = start + svg[start..].find('"').unwrap();
        &svg[start..end]
    }

    #[test]
    fn test_single_pencil_stroke() {
        let svg = export_svg(100, 100, &[pencil(&[(0.0, 0.0), (10.0, 10.0)])], None);

        assert_eq!(svg.matches("<path").count(), 1);
        let d = path_d(&svg);
        assert!(d.starts_with("M0.0,0.0"));
        assert!(d.ends_with("L10.0,10.0"));
        assert!(!svg.contains("<image"));
        // Only the background rect
        assert_eq!(svg.matches("<rect").count(), 1);
        assert!(svg.starts_with(r#"<svg width="100" height="100""#));
        assert!(svg.ends_with("</svg>"));
    }

    #[test]
    fn test_rounds_to_one_decimal() {
        let svg = export_svg(10, 10, &[pencil(&[(1.26, 2.0), (3.0, 4.04)])], None);
        assert_eq!(path_d(&svg), "M1.3,2.0L3.0,4.0");
        assert!(svg.contains(r#"stroke-width="5.0""#));
    }

    #[test]
    fn test_skips_non_vector_and_short_strokes() {
        let spray = StrokeAction::Spray(InkStroke {
            color: Rgba::black(),
            size: 5.0,
            points: vec![Point::ZERO, Point::new(5.0, 5.0)],
        });
        let svg = export_svg(10, 10, &[spray, pencil(&[(1.0, 1.0)])], None);
        assert!(!svg.contains("<path"));
    }

    #[test]
    fn test_brush_width_doubles() {
        let brush = StrokeAction::Brush(InkStroke {
            color: Rgba::rgb(255, 0, 0),
            size: 3.0,
            points: vec![Point::ZERO, Point::new(5.0, 5.0)],
        });
        let svg = export_svg(10, 10, &[brush], None);
        assert!(svg.contains(r##"stroke="#FF0000" stroke-width="6.0""##));
    }

    #[test]
    fn test_text_escaped() {
        let text = StrokeAction::Text(TextStroke {
            x: 1.0,
            y: 2.0,
            font_family: "Arial".to_string(),
            font_size: 24.0,
            color: Rgba::black(),
            content: "a<b>&c".to_string(),
        });
        let svg = export_svg(10, 10, &[text], None);
        assert!(svg.contains(
            r##"<text x="1.0" y="2.0" font-family="Arial" font-size="24.0" fill="#000000">a&lt;b&gt;&amp;c</text>"##
        ));
    }

    #[test]
    fn test_grid_mode_ignores_log() {
        let mut grid = PixelGrid::new(40, 40, 20);
        grid.set_cell(1, 0, Rgba::rgb(0, 0, 255));
        let svg = export_svg(40, 40, &[pencil(&[(0.0, 0.0), (1.0, 1.0)])], Some(&grid));

        assert!(!svg.contains("<path"));
        assert_eq!(svg.matches("<rect").count(), 2);
        assert!(svg.contains(r##"<rect x="0" y="20" width="20" height="20" fill="#0000FF"/>"##));
    }

    #[test]
    fn test_size_info_thresholds() {
        let ok = SvgSizeInfo::measure(&"x".repeat(100), 1000, 800);
        assert!(!ok.is_large && !ok.is_too_large);
        assert_eq!(ok.percentage, 10);
        assert_eq!(ok.recommendation, ADVICE_OK);

        let large = SvgSizeInfo::measure(&"x".repeat(900), 1000, 800);
        assert!(large.is_large && !large.is_too_large);
        assert_eq!(large.recommendation, ADVICE_LARGE);

        let too_large = SvgSizeInfo::measure(&"x".repeat(1001), 1000, 800);
        assert!(too_large.is_too_large);
        assert_eq!(too_large.percentage, 100);
        assert_eq!(too_large.recommendation, ADVICE_TOO_LARGE);
    }
}
