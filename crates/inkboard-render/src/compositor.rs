//! Frame compositor: ink, elements, selection chrome and the pixel grid.

use crate::glyphs::GlyphPainter;
use crate::ink::PixmapInk;
use crate::{RenderError, RenderResult};
use inkboard_core::element::{ImageSource, PixelSprite, TextPayload};
use inkboard_core::handles::{self, HANDLE_DRAW_RADIUS, HandleKind};
use inkboard_core::pixel_grid::GRID_LINE_COLOR;
use inkboard_core::{Element, ElementFrame, ElementId, ElementKind, PixelGrid, Rgba, Whiteboard};
use kurbo::{Affine, Point};
use std::collections::{HashMap, HashSet};
use tiny_skia::{
    Color, FillRule, FilterQuality, Paint, PathBuilder, Pixmap, PixmapPaint, Rect, Stroke, StrokeDash, Transform,
};

/// Selection box, rotate handle and grid hover outline colour.
pub const SELECTION_COLOR: Rgba = Rgba::rgb(0x7b, 0x2f, 0xf2);
/// Delete handle colour.
pub const DELETE_COLOR: Rgba = Rgba::rgb(0xe7, 0x4c, 0x3c);
const PLACEHOLDER_FILL: Rgba = Rgba::rgb(200, 200, 200);
const PLACEHOLDER_STROKE: Rgba = Rgba::rgb(100, 100, 100);

/// What to draw on top of the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameOptions {
    /// Dashed selection box and handles.
    pub selection: bool,
    /// Hovered pixel-grid cell.
    pub hover: bool,
}

impl Default for FrameOptions {
    fn default() -> Self {
        Self {
            selection: true,
            hover: true,
        }
    }
}

impl FrameOptions {
    /// Scene only, as written to exported files.
    pub fn export() -> Self {
        Self {
            selection: false,
            hover: false,
        }
    }
}

/// Draws a whiteboard into a pixmap.
///
/// Decoded images are cached per element, so repeated frames and history
/// restores do not decode again. An element's image never changes after it
/// is created; entries for elements no longer on the board are dropped on
/// the next frame.
#[derive(Debug, Default)]
pub struct Compositor {
    glyphs: Option<GlyphPainter>,
    images: HashMap<ElementId, Pixmap>,
}

impl Compositor {
    pub fn new(glyphs: Option<GlyphPainter>) -> Self {
        if glyphs.is_none() {
            log::info!("No font available, text and emoji draw as placeholders");
        }
        Self {
            glyphs,
            images: HashMap::new(),
        }
    }

    /// Number of decoded images held.
    pub fn cached_images(&self) -> usize {
        self.images.len()
    }

    /// Render a full frame.
    pub fn render(&mut self, board: &Whiteboard<PixmapInk>, options: FrameOptions) -> RenderResult<Pixmap> {
        let ink = board.surface().pixmap();
        let mut frame =
            Pixmap::new(ink.width(), ink.height()).ok_or(RenderError::InvalidSize(ink.width(), ink.height()))?;

        frame.fill(Color::WHITE);
        frame.draw_pixmap(0, 0, ink.as_ref(), &PixmapPaint::default(), Transform::identity(), None);

        self.evict_images(board.store().elements());

        let selected = board.store().selected();
        for element in board.store().elements() {
            self.draw_element(&mut frame, element);
            if options.selection && selected == Some(element.id()) {
                draw_selection(&mut frame, &element.frame);
            }
        }

        if let Some(grid) = board.pixel_grid() {
            let hover = options.hover.then(|| grid.hover()).flatten();
            draw_grid(&mut frame, grid, hover.map(|cell| (cell, board.pixel_color())));
        }

        Ok(frame)
    }

    fn evict_images(&mut self, elements: &[Element]) {
        if self.images.is_empty() {
            return;
        }
        let live: HashSet<ElementId> = elements.iter().map(Element::id).collect();
        let before = self.images.len();
        self.images.retain(|id, _| live.contains(id));
        if self.images.len() < before {
            log::debug!("Dropped {} cached images", before - self.images.len());
        }
    }

    fn draw_element(&mut self, frame: &mut Pixmap, element: &Element) {
        let f = &element.frame;
        let transform = to_skia(f.transform());
        match &element.kind {
            ElementKind::Image(source) => match self.image(element.id(), source) {
                Some(image) => {
                    let sx = f.width / image.width() as f64;
                    let sy = f.height / image.height() as f64;
                    let local = Affine::translate((-f.width / 2.0, -f.height / 2.0)) * Affine::scale_non_uniform(sx, sy);
                    let paint = PixmapPaint {
                        quality: FilterQuality::Bilinear,
                        ..PixmapPaint::default()
                    };
                    frame.draw_pixmap(0, 0, image.as_ref(), &paint, to_skia(f.transform() * local), None);
                }
                None => draw_placeholder(frame, f, transform),
            },
            ElementKind::Text(text) => self.draw_text(frame, f, text),
            ElementKind::Emoji { glyph } => {
                let payload = TextPayload {
                    content: glyph.clone(),
                    font_family: String::new(),
                    font_size: f.height,
                    color: Rgba::black(),
                };
                self.draw_text(frame, f, &payload);
            }
            ElementKind::PixelPlaceholder(sprite) => draw_sprite(frame, f, sprite, transform),
        }
    }

    /// Decode (or fetch) an image. Failures are logged and not cached.
    fn image(&mut self, id: ElementId, source: &ImageSource) -> Option<&Pixmap> {
        if !self.images.contains_key(&id) {
            match decode_image(source) {
                Ok(pixmap) => {
                    self.images.insert(id, pixmap);
                }
                Err(e) => {
                    log::warn!("Drawing image placeholder: {}", e);
                    return None;
                }
            }
        }
        self.images.get(&id)
    }

    /// Text is centred on the element, as is emoji.
    fn draw_text(&self, frame: &mut Pixmap, f: &ElementFrame, text: &TextPayload) {
        let rendered = self
            .glyphs
            .as_ref()
            .filter(|glyphs| glyphs.covers(&text.content))
            .and_then(|glyphs| glyphs.rasterize(&text.content, text.font_size as f32, text.color));
        let Some(pixmap) = rendered else {
            draw_placeholder(frame, f, to_skia(f.transform()));
            return;
        };

        let local = Affine::translate((-(pixmap.width() as f64) / 2.0, -(pixmap.height() as f64) / 2.0));
        let paint = PixmapPaint {
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };
        frame.draw_pixmap(0, 0, pixmap.as_ref(), &paint, to_skia(f.transform() * local), None);
    }
}

/// Decode encoded image bytes into a premultiplied pixmap.
pub fn decode_image(source: &ImageSource) -> RenderResult<Pixmap> {
    let bytes = source.data().map_err(|e| RenderError::Decode(e.to_string()))?;
    let rgba = ::image::load_from_memory(&bytes)
        .map_err(|e| RenderError::Decode(e.to_string()))?
        .to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut pixmap = Pixmap::new(width, height).ok_or(RenderError::InvalidSize(width, height))?;
    for (out, px) in pixmap.pixels_mut().iter_mut().zip(rgba.pixels()) {
        let [r, g, b, a] = px.0;
        *out = tiny_skia::ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Ok(pixmap)
}

/// kurbo affine to tiny-skia transform.
pub fn to_skia(affine: Affine) -> Transform {
    let [a, b, c, d, e, f] = affine.as_coeffs();
    Transform::from_row(a as f32, b as f32, c as f32, d as f32, e as f32, f as f32)
}

fn paint(color: Rgba) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    paint.anti_alias = true;
    paint
}

/// Box centred on the local origin.
fn local_rect(f: &ElementFrame) -> Option<Rect> {
    Rect::from_xywh(
        (-f.width / 2.0) as f32,
        (-f.height / 2.0) as f32,
        f.width as f32,
        f.height as f32,
    )
}

fn draw_placeholder(frame: &mut Pixmap, f: &ElementFrame, transform: Transform) {
    let Some(rect) = local_rect(f) else {
        return;
    };
    let path = PathBuilder::from_rect(rect);
    frame.fill_path(&path, &paint(PLACEHOLDER_FILL), FillRule::Winding, transform, None);

    let mut pb = PathBuilder::new();
    pb.move_to(rect.left(), rect.top());
    pb.line_to(rect.right(), rect.bottom());
    pb.move_to(rect.right(), rect.top());
    pb.line_to(rect.left(), rect.bottom());
    let stroke = Stroke {
        width: 2.0,
        ..Default::default()
    };
    if let Some(cross) = pb.finish() {
        frame.stroke_path(&cross, &paint(PLACEHOLDER_STROKE), &stroke, transform, None);
    }
    frame.stroke_path(&path, &paint(PLACEHOLDER_STROKE), &stroke, transform, None);
}

fn draw_sprite(frame: &mut Pixmap, f: &ElementFrame, sprite: &PixelSprite, transform: Transform) {
    if sprite.columns == 0 || sprite.rows == 0 {
        return;
    }
    let cell_w = f.width / sprite.columns as f64;
    let cell_h = f.height / sprite.rows as f64;
    for row in 0..sprite.rows {
        for col in 0..sprite.columns {
            let Some(color) = sprite.get(col, row) else {
                continue;
            };
            let x = -f.width / 2.0 + col as f64 * cell_w;
            let y = -f.height / 2.0 + row as f64 * cell_h;
            if let Some(rect) = Rect::from_xywh(x as f32, y as f32, cell_w as f32, cell_h as f32) {
                frame.fill_rect(rect, &paint(color), transform, None);
            }
        }
    }
}

fn draw_selection(frame: &mut Pixmap, f: &ElementFrame) {
    // Drawn in the rotated but unscaled frame, sized to the scaled box
    let rotated = to_skia(Affine::translate(f.center().to_vec2()) * Affine::rotate(f.rotation));
    let (w, h) = f.scaled_size();
    if let Some(rect) = Rect::from_xywh((-w / 2.0) as f32, (-h / 2.0) as f32, w as f32, h as f32) {
        let stroke = Stroke {
            width: 2.0,
            dash: StrokeDash::new(vec![5.0, 5.0], 0.0),
            ..Default::default()
        };
        frame.stroke_path(&PathBuilder::from_rect(rect), &paint(SELECTION_COLOR), &stroke, rotated, None);
    }

    let stroke = Stroke {
        width: 2.0,
        ..Default::default()
    };
    for handle in handles::get_handles(f) {
        let outline = match handle.kind {
            HandleKind::Rotate => SELECTION_COLOR,
            HandleKind::Delete => DELETE_COLOR,
        };
        let Some(circle) = PathBuilder::from_circle(
            handle.position.x as f32,
            handle.position.y as f32,
            HANDLE_DRAW_RADIUS as f32,
        ) else {
            continue;
        };
        let identity = Transform::identity();
        frame.fill_path(&circle, &paint(Rgba::white()), FillRule::Winding, identity, None);
        frame.stroke_path(&circle, &paint(outline), &stroke, identity, None);
        draw_handle_glyph(frame, handle.kind, handle.position, outline);
    }
}

/// Small vector glyph inside a handle: an open arc for rotate, a cross for delete.
fn draw_handle_glyph(frame: &mut Pixmap, kind: HandleKind, at: Point, color: Rgba) {
    let r = (HANDLE_DRAW_RADIUS / 2.0) as f32;
    let (cx, cy) = (at.x as f32, at.y as f32);
    let mut pb = PathBuilder::new();
    match kind {
        HandleKind::Rotate => {
            // Three quarters of a circle
            let k = 0.552_284_8 * r;
            pb.move_to(cx + r, cy);
            pb.cubic_to(cx + r, cy + k, cx + k, cy + r, cx, cy + r);
            pb.cubic_to(cx - k, cy + r, cx - r, cy + k, cx - r, cy);
            pb.cubic_to(cx - r, cy - k, cx - k, cy - r, cx, cy - r);
        }
        HandleKind::Delete => {
            pb.move_to(cx - r, cy - r);
            pb.line_to(cx + r, cy + r);
            pb.move_to(cx + r, cy - r);
            pb.line_to(cx - r, cy + r);
        }
    }
    let stroke = Stroke {
        width: 2.0,
        line_cap: tiny_skia::LineCap::Round,
        ..Default::default()
    };
    if let Some(path) = pb.finish() {
        frame.stroke_path(&path, &paint(color), &stroke, Transform::identity(), None);
    }
}

/// Opaque grid over the whole frame, with an optional translucent hover cell.
fn draw_grid(frame: &mut Pixmap, grid: &PixelGrid, hover: Option<((usize, usize), Rgba)>) {
    let size = grid.cell_size() as f32;
    let identity = Transform::identity();
    let line = Stroke {
        width: 1.0,
        ..Default::default()
    };
    let line_paint = paint(GRID_LINE_COLOR);

    for row in 0..grid.rows() {
        for col in 0..grid.columns() {
            let Some(color) = grid.get(row, col) else {
                continue;
            };
            let Some(rect) = Rect::from_xywh(col as f32 * size, row as f32 * size, size, size) else {
                continue;
            };
            let mut fill = paint(color);
            fill.anti_alias = false;
            frame.fill_rect(rect, &fill, identity, None);
            frame.stroke_path(&PathBuilder::from_rect(rect), &line_paint, &line, identity, None);
        }
    }

    let Some(((row, col), color)) = hover else {
        return;
    };
    if let Some(rect) = Rect::from_xywh(col as f32 * size, row as f32 * size, size, size) {
        frame.fill_rect(rect, &paint(color.with_alpha(0.5)), identity, None);
        let outline = Stroke {
            width: 2.0,
            ..Default::default()
        };
        frame.stroke_path(&PathBuilder::from_rect(rect), &paint(SELECTION_COLOR), &outline, identity, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkboard_core::{BoardConfig, ElementPatch, InkSurface, MemoryStorage, Tool};
    use std::sync::Arc;

    fn board() -> Whiteboard<PixmapInk> {
        let ink = PixmapInk::new(120, 80).unwrap().with_seed(1);
        Whiteboard::new(BoardConfig::with_size(120, 80), ink, Arc::new(MemoryStorage::new())).unwrap()
    }

    fn px(pixmap: &Pixmap, x: u32, y: u32) -> (u8, u8, u8, u8) {
        let c = pixmap.pixel(x, y).unwrap().demultiply();
        (c.red(), c.green(), c.blue(), c.alpha())
    }

    fn png(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
        let img = ::image::RgbaImage::from_pixel(width, height, ::image::Rgba([rgb[0], rgb[1], rgb[2], 255]));
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, ::image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_blank_frame_is_white() {
        let mut compositor = Compositor::new(None);
        let frame = compositor.render(&board(), FrameOptions::default()).unwrap();
        assert_eq!((frame.width(), frame.height()), (120, 80));
        assert_eq!(px(&frame, 60, 40), (255, 255, 255, 255));
    }

    #[test]
    fn test_erased_ink_shows_white() {
        let mut board = board();
        board.set_tool(Tool::Eraser);
        board.pointer_down(kurbo::Point::new(10.0, 10.0));
        board.pointer_move(kurbo::Point::new(12.0, 10.0));
        board.pointer_up(kurbo::Point::new(12.0, 10.0));
        assert_eq!(board.surface().pixel(12, 10).map(|c| c.a), Some(0));

        let frame = Compositor::new(None).render(&board, FrameOptions::export()).unwrap();
        assert_eq!(px(&frame, 12, 10), (255, 255, 255, 255));
    }

    #[test]
    fn test_image_drawn_and_cached() {
        let mut board = board();
        let source = ImageSource::from_bytes(&png(4, 4, [0, 0, 255])).unwrap();
        board.add_uploaded_image(source);

        let mut compositor = Compositor::new(None);
        let frame = compositor.render(&board, FrameOptions::export()).unwrap();
        assert_eq!(px(&frame, 60, 40), (0, 0, 255, 255));
        compositor.render(&board, FrameOptions::export()).unwrap();
        assert_eq!(compositor.cached_images(), 1);
    }

    #[test]
    fn test_image_cache_follows_board() {
        let mut board = board();
        let first = board.add_uploaded_image(ImageSource::from_bytes(&png(4, 4, [0, 0, 255])).unwrap());
        board.add_uploaded_image(ImageSource::from_bytes(&png(2, 2, [0, 255, 0])).unwrap());

        let mut compositor = Compositor::new(None);
        compositor.render(&board, FrameOptions::export()).unwrap();
        assert_eq!(compositor.cached_images(), 2);

        assert!(board.delete_element(first));
        compositor.render(&board, FrameOptions::export()).unwrap();
        assert_eq!(compositor.cached_images(), 1);

        // Undo brings the element back with the same id
        board.undo();
        let frame = compositor.render(&board, FrameOptions::export()).unwrap();
        assert_eq!(compositor.cached_images(), 2);
        assert_eq!(px(&frame, 60, 40), (0, 255, 0, 255));

        board.clear();
        compositor.render(&board, FrameOptions::export()).unwrap();
        assert_eq!(compositor.cached_images(), 0);
    }

    #[test]
    fn test_gif_image_drawn() {
        let mut board = board();
        let img = ::image::RgbaImage::from_pixel(3, 3, ::image::Rgba([255, 0, 0, 255]));
        let mut gif = std::io::Cursor::new(Vec::new());
        img.write_to(&mut gif, ::image::ImageFormat::Gif).unwrap();
        board.add_uploaded_image(ImageSource::from_bytes(gif.get_ref()).unwrap());

        let frame = Compositor::new(None).render(&board, FrameOptions::export()).unwrap();
        let (r, g, b, a) = px(&frame, 60, 40);
        assert!(r > 240 && g < 16 && b < 16 && a == 255);
    }

    #[test]
    fn test_selection_chrome_only_when_requested() {
        let mut board = board();
        let source = ImageSource::from_bytes(&png(4, 4, [0, 0, 255])).unwrap();
        let frame = ElementFrame::new(40.0, 40.0, 20.0, 20.0);
        let id = board.add_element(Element::new(frame, ElementKind::Image(source)));
        board.select(Some(id));

        let mut compositor = Compositor::new(None);
        // Rotate handle centre: (50, 50 - 10 - 40)
        let with = compositor.render(&board, FrameOptions::default()).unwrap();
        let without = compositor.render(&board, FrameOptions::export()).unwrap();
        assert_ne!(px(&with, 50 + 12, 0), px(&without, 50 + 12, 0));
        assert_eq!(px(&without, 50 + 12, 0), (255, 255, 255, 255));
    }

    #[test]
    fn test_rotated_image_follows_transform() {
        let mut board = board();
        let source = ImageSource::from_bytes(&png(4, 4, [255, 0, 0])).unwrap();
        // 60x10 bar centred at (60, 40)
        let id = board.add_element(Element::new(
            ElementFrame::new(30.0, 35.0, 60.0, 10.0),
            ElementKind::Image(source),
        ));
        let mut compositor = Compositor::new(None);
        let flat = compositor.render(&board, FrameOptions::export()).unwrap();
        assert_eq!(px(&flat, 85, 40), (255, 0, 0, 255));

        board.transform_element(id, &ElementPatch::rotation(std::f64::consts::FRAC_PI_2));
        let turned = compositor.render(&board, FrameOptions::export()).unwrap();
        assert_eq!(px(&turned, 85, 40), (255, 255, 255, 255));
        assert_eq!(px(&turned, 60, 65), (255, 0, 0, 255));
    }

    #[test]
    fn test_undecodable_image_draws_placeholder() {
        let mut board = board();
        let mut source = ImageSource::from_bytes(&png(2, 2, [0, 0, 0])).unwrap();
        source.data_base64 = "AAAA".to_string();
        board.add_element(Element::new(
            ElementFrame::new(0.0, 0.0, 40.0, 40.0),
            ElementKind::Image(source),
        ));
        let mut compositor = Compositor::new(None);
        let frame = compositor.render(&board, FrameOptions::export()).unwrap();
        assert_eq!(px(&frame, 20, 5), (200, 200, 200, 255));
        assert_eq!(compositor.cached_images(), 0);
    }

    #[test]
    fn test_pixel_grid_overlay() {
        let mut board = board();
        board.enable_pixel_mode();
        board.set_pixel_color(Rgba::rgb(0, 128, 0));
        board.pointer_down(kurbo::Point::new(5.0, 5.0));
        board.pointer_move(kurbo::Point::new(45.0, 5.0));

        let mut compositor = Compositor::new(None);
        let frame = compositor.render(&board, FrameOptions::default()).unwrap();
        // Painted cell interior
        assert_eq!(px(&frame, 10, 10), (0, 128, 0, 255));
        // Hovered cell is half-tinted
        let (r, g, b, _) = px(&frame, 50, 10);
        assert!(r < 255 && g < 255 && b < 255 && g > r);

        let export = compositor.render(&board, FrameOptions::export()).unwrap();
        assert_eq!(px(&export, 50, 10), (255, 255, 255, 255));
        assert_eq!(board.surface().width(), 120);
    }

    #[test]
    fn test_to_skia_matches_kurbo() {
        let affine = Affine::translate((5.0, 7.0)) * Affine::rotate(0.3) * Affine::scale(2.0);
        let mut points = [tiny_skia::Point::from_xy(3.0, -2.0)];
        to_skia(affine).map_points(&mut points);
        let expected = affine * Point::new(3.0, -2.0);
        assert!((points[0].x as f64 - expected.x).abs() < 1e-4);
        assert!((points[0].y as f64 - expected.y).abs() < 1e-4);
    }
}
