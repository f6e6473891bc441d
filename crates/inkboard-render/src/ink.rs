//! Raster ink surface backed by a tiny-skia pixmap.

use fastrand::Rng;
use inkboard_core::{InkOp, InkSurface, Rgba, SurfaceError};
use kurbo::Point;
use std::f64::consts::TAU;
use tiny_skia::{
    BlendMode, Color, ColorU8, FillRule, LineCap, LineJoin, Paint, PathBuilder, Pixmap, PixmapPaint, Rect, Stroke,
    Transform,
};

/// Per-channel darkening applied by the smudge tool.
const SMUDGE_DARKEN: u8 = 10;
/// Alpha removed by the smudge tool.
const SMUDGE_FADE: u8 = 20;
/// Maximum displacement of a smudged patch, in pixels each way.
const SMUDGE_JITTER: f64 = 1.5;

/// The free-drawing layer as an RGBA pixmap.
///
/// Starts opaque white. Snapshots are PNG-encoded.
pub struct PixmapInk {
    pixmap: Pixmap,
    rng: Rng,
}

impl PixmapInk {
    /// Create a blank white surface.
    pub fn new(width: u32, height: u32) -> Result<Self, SurfaceError> {
        let mut pixmap = Pixmap::new(width, height).ok_or(SurfaceError::InvalidSize(width, height))?;
        pixmap.fill(Color::WHITE);
        Ok(Self { pixmap, rng: Rng::new() })
    }

    /// Seed the generator used by spray and smudge, for reproducible output.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Rng::with_seed(seed);
        self
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Straight-alpha colour of a pixel.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        let c = self.pixmap.pixel(x, y)?.demultiply();
        Some(Rgba::new(c.red(), c.green(), c.blue(), c.alpha()))
    }

    fn solid(color: Rgba) -> Paint<'static> {
        let mut paint = Paint::default();
        paint.set_color_rgba8(color.r, color.g, color.b, color.a);
        paint.anti_alias = true;
        paint
    }

    fn fill_circle(&mut self, center: Point, radius: f32, paint: &Paint) {
        if let Some(path) = PathBuilder::from_circle(center.x as f32, center.y as f32, radius) {
            self.pixmap
                .fill_path(&path, paint, FillRule::Winding, Transform::identity(), None);
        }
    }

    fn line(&mut self, from: Point, to: Point, color: Rgba, width: f64) {
        let mut pb = PathBuilder::new();
        pb.move_to(from.x as f32, from.y as f32);
        pb.line_to(to.x as f32, to.y as f32);
        let Some(path) = pb.finish() else {
            return;
        };
        let stroke = Stroke {
            width: width as f32,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Default::default()
        };
        self.pixmap
            .stroke_path(&path, &Self::solid(color), &stroke, Transform::identity(), None);
    }

    /// Droplets are single hard pixels.
    fn spray(&mut self, center: Point, radius: f64, color: Rgba, dots: usize) {
        let mut paint = Self::solid(color);
        paint.anti_alias = false;
        for _ in 0..dots {
            // sqrt keeps the droplets uniform over the disc
            let angle = self.rng.f64() * TAU;
            let distance = radius * self.rng.f64().sqrt();
            let (sin, cos) = angle.sin_cos();
            let x = (center.x + distance * cos).floor() as f32;
            let y = (center.y + distance * sin).floor() as f32;
            if let Some(rect) = Rect::from_xywh(x, y, 1.0, 1.0) {
                self.pixmap.fill_rect(rect, &paint, Transform::identity(), None);
            }
        }
    }

    fn erase(&mut self, center: Point, radius: f64) {
        let mut paint = Self::solid(Rgba::white());
        paint.blend_mode = BlendMode::DestinationOut;
        self.fill_circle(center, radius as f32, &paint);
    }

    /// Integer pixel window `[x0, x1) x [y0, y1)` around a disc, clipped.
    fn window(&self, center: Point, radius: f64) -> Option<(u32, u32, u32, u32)> {
        let x0 = (center.x - radius).floor().max(0.0);
        let y0 = (center.y - radius).floor().max(0.0);
        let x1 = (center.x + radius).ceil().min(self.pixmap.width() as f64);
        let y1 = (center.y + radius).ceil().min(self.pixmap.height() as f64);
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some((x0 as u32, y0 as u32, x1 as u32, y1 as u32))
    }

    fn blur(&mut self, center: Point, radius: f64) {
        if radius <= 0.0 {
            return;
        }
        let Some((x0, y0, x1, y1)) = self.window(center, radius) else {
            return;
        };
        let width = self.pixmap.width();
        let pixels = self.pixmap.pixels_mut();
        for y in y0..y1 {
            for x in x0..x1 {
                let distance = (x as f64 - center.x).hypot(y as f64 - center.y);
                if distance >= radius {
                    continue;
                }
                let factor = 1.0 - distance / radius;
                let idx = (y * width + x) as usize;
                let c = pixels[idx].demultiply();
                let lift = |v: u8| (v as f64 * (1.0 - factor) + 255.0 * factor).round() as u8;
                pixels[idx] = ColorU8::from_rgba(lift(c.red()), lift(c.green()), lift(c.blue()), c.alpha()).premultiply();
            }
        }
    }

    fn smudge(&mut self, center: Point, radius: f64) {
        let Some((x0, y0, x1, y1)) = self.window(center, radius) else {
            return;
        };
        let Some(mut patch) = Pixmap::new(x1 - x0, y1 - y0) else {
            return;
        };

        let width = self.pixmap.width();
        let source = self.pixmap.pixels();
        let patch_width = patch.width();
        for (i, out) in patch.pixels_mut().iter_mut().enumerate() {
            let px = x0 + i as u32 % patch_width;
            let py = y0 + i as u32 / patch_width;
            let c = source[(py * width + px) as usize].demultiply();
            if c.alpha() == 0 {
                continue;
            }
            *out = ColorU8::from_rgba(
                c.red().saturating_sub(SMUDGE_DARKEN),
                c.green().saturating_sub(SMUDGE_DARKEN),
                c.blue().saturating_sub(SMUDGE_DARKEN),
                c.alpha().saturating_sub(SMUDGE_FADE),
            )
            .premultiply();
        }

        let dx = (self.rng.f64() - 0.5) * 2.0 * SMUDGE_JITTER;
        let dy = (self.rng.f64() - 0.5) * 2.0 * SMUDGE_JITTER;
        let transform = Transform::from_translate((x0 as f64 + dx) as f32, (y0 as f64 + dy) as f32);
        self.pixmap
            .draw_pixmap(0, 0, patch.as_ref(), &PixmapPaint::default(), transform, None);
    }
}

impl InkSurface for PixmapInk {
    fn width(&self) -> u32 {
        self.pixmap.width()
    }

    fn height(&self) -> u32 {
        self.pixmap.height()
    }

    fn apply(&mut self, op: &InkOp) {
        match *op {
            InkOp::Line { from, to, color, width } => self.line(from, to, color, width),
            InkOp::Spray {
                center,
                radius,
                color,
                dots,
            } => self.spray(center, radius, color, dots),
            InkOp::Dot { center, radius, color } => self.fill_circle(center, radius as f32, &Self::solid(color)),
            InkOp::Erase { center, radius } => self.erase(center, radius),
            InkOp::Blur { center, radius } => self.blur(center, radius),
            InkOp::Smudge { center, radius } => self.smudge(center, radius),
        }
    }

    fn clear(&mut self) {
        self.pixmap.fill(Color::WHITE);
    }

    fn snapshot(&self) -> Result<Vec<u8>, SurfaceError> {
        self.pixmap
            .encode_png()
            .map_err(|e| SurfaceError::Encode(e.to_string()))
    }

    fn restore(&mut self, snapshot: &[u8]) -> Result<(), SurfaceError> {
        let pixmap = Pixmap::decode_png(snapshot).map_err(|e| SurfaceError::Decode(e.to_string()))?;
        if pixmap.width() != self.pixmap.width() || pixmap.height() != self.pixmap.height() {
            return Err(SurfaceError::Decode(format!(
                "snapshot is {}x{}, surface is {}x{}",
                pixmap.width(),
                pixmap.height(),
                self.pixmap.width(),
                self.pixmap.height()
            )));
        }
        self.pixmap = pixmap;
        Ok(())
    }
}
