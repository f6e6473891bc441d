//! Stroke recording.
//!
//! Pointer input is captured as [`StrokeAction`]s, independent of how the ink
//! is rasterised. The same [`Tessellator`] turns pointer steps into
//! [`InkOp`]s while drawing and when a persisted log is replayed.

use crate::color::Rgba;
use crate::surface::InkOp;
use crate::tools::{EffectRadii, SPRAY_DENSITY, StrokeKind};
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Points and parameters of one ink gesture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InkStroke {
    pub color: Rgba,
    /// Tool size at the time of the gesture.
    pub size: f64,
    /// Raw pointer trace, in order.
    pub points: Vec<Point>,
}

impl InkStroke {
    /// Painted line width for this kind (brush paints at twice the size).
    pub fn line_width(&self, kind: StrokeKind) -> f64 {
        line_width(kind, self.size)
    }
}

fn line_width(kind: StrokeKind, size: f64) -> f64 {
    match kind {
        StrokeKind::Brush => size * 2.0,
        _ => size,
    }
}

/// A text placement recorded for vector export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStroke {
    pub x: f64,
    pub y: f64,
    pub font_family: String,
    pub font_size: f64,
    pub color: Rgba,
    pub content: String,
}

/// One entry of the stroke log.
///
/// Serialises with a lowercase `type` tag so persisted logs look like
/// `{"type":"pencil","color":"#000000","size":5.0,"points":[...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StrokeAction {
    Pencil(InkStroke),
    Brush(InkStroke),
    Spray(InkStroke),
    Eraser(InkStroke),
    Blur(InkStroke),
    Smudge(InkStroke),
    Dotted(InkStroke),
    Text(TextStroke),
}

impl StrokeAction {
    /// Wrap an ink stroke under its kind's tag.
    pub fn from_ink(kind: StrokeKind, stroke: InkStroke) -> Self {
        match kind {
            StrokeKind::Pencil => StrokeAction::Pencil(stroke),
            StrokeKind::Brush => StrokeAction::Brush(stroke),
            StrokeKind::Spray => StrokeAction::Spray(stroke),
            StrokeKind::Eraser => StrokeAction::Eraser(stroke),
            StrokeKind::Blur => StrokeAction::Blur(stroke),
            StrokeKind::Smudge => StrokeAction::Smudge(stroke),
            StrokeKind::Dotted => StrokeAction::Dotted(stroke),
        }
    }

    /// The ink kind and stroke, or `None` for text.
    pub fn as_ink(&self) -> Option<(StrokeKind, &InkStroke)> {
        match self {
            StrokeAction::Pencil(s) => Some((StrokeKind::Pencil, s)),
            StrokeAction::Brush(s) => Some((StrokeKind::Brush, s)),
            StrokeAction::Spray(s) => Some((StrokeKind::Spray, s)),
            StrokeAction::Eraser(s) => Some((StrokeKind::Eraser, s)),
            StrokeAction::Blur(s) => Some((StrokeKind::Blur, s)),
            StrokeAction::Smudge(s) => Some((StrokeKind::Smudge, s)),
            StrokeAction::Dotted(s) => Some((StrokeKind::Dotted, s)),
            StrokeAction::Text(_) => None,
        }
    }

    fn ink_mut(&mut self) -> Option<&mut InkStroke> {
        match self {
            StrokeAction::Pencil(s)
            | StrokeAction::Brush(s)
            | StrokeAction::Spray(s)
            | StrokeAction::Eraser(s)
            | StrokeAction::Blur(s)
            | StrokeAction::Smudge(s)
            | StrokeAction::Dotted(s) => Some(s),
            StrokeAction::Text(_) => None,
        }
    }

    /// Re-derive the ink operations for this action.
    ///
    /// Spray and smudge are randomised by the surface, so replay is
    /// approximate for those kinds. Text produces nothing here.
    pub fn replay_ops(&self, radii: EffectRadii) -> Vec<InkOp> {
        let Some((kind, stroke)) = self.as_ink() else {
            return Vec::new();
        };
        let Some((&first, rest)) = stroke.points.split_first() else {
            return Vec::new();
        };

        let mut tess = Tessellator::new(kind, stroke.color, stroke.size, radii, first);
        rest.iter().flat_map(|&p| tess.step(p)).collect()
    }
}

/// Turns consecutive pointer positions into ink operations for one stroke.
#[derive(Debug, Clone)]
pub struct Tessellator {
    kind: StrokeKind,
    color: Rgba,
    size: f64,
    radii: EffectRadii,
    last: Point,
    /// Last emitted dot centre (dotted only).
    last_dot: Point,
}

impl Tessellator {
    pub fn new(kind: StrokeKind, color: Rgba, size: f64, radii: EffectRadii, start: Point) -> Self {
        Self {
            kind,
            color,
            size,
            radii,
            last: start,
            last_dot: start,
        }
    }

    /// Spacing between dotted-line dots.
    pub fn dot_spacing(size: f64) -> f64 {
        (size * 2.0).max(4.0)
    }

    /// Radius of dotted-line dots.
    pub fn dot_radius(size: f64) -> f64 {
        (size / 2.0).max(1.0)
    }

    /// Advance to `point`, returning the operations to apply.
    pub fn step(&mut self, point: Point) -> Vec<InkOp> {
        let from = self.last;
        self.last = point;

        match self.kind {
            StrokeKind::Pencil | StrokeKind::Brush => vec![InkOp::Line {
                from,
                to: point,
                color: self.color,
                width: line_width(self.kind, self.size),
            }],
            StrokeKind::Spray => vec![InkOp::Spray {
                center: point,
                radius: self.size * 2.0,
                color: self.color,
                dots: SPRAY_DENSITY,
            }],
            StrokeKind::Eraser => vec![InkOp::Erase {
                center: point,
                radius: self.size * 2.0,
            }],
            StrokeKind::Blur => vec![InkOp::Blur {
                center: point,
                radius: self.radii.blur,
            }],
            StrokeKind::Smudge => vec![InkOp::Smudge {
                center: point,
                radius: self.radii.smudge,
            }],
            StrokeKind::Dotted => self.dots_towards(point),
        }
    }

    fn dots_towards(&mut self, point: Point) -> Vec<InkOp> {
        let spacing = Self::dot_spacing(self.size);
        let radius = Self::dot_radius(self.size);
        let origin = self.last_dot;
        let delta = point - origin;
        let distance = delta.hypot();
        if distance == 0.0 {
            return Vec::new();
        }

        let steps = (distance / spacing).floor() as usize;
        let mut ops = Vec::with_capacity(steps);
        for i in 1..=steps {
            let t = i as f64 * spacing / distance;
            let center = origin + delta * t;
            ops.push(InkOp::Dot {
                center,
                radius,
                color: self.color,
            });
            self.last_dot = center;
        }
        ops
    }
}

/// Opaque reference to the action a gesture is appending to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActionHandle(usize);

#[derive(Debug, Clone)]
struct ActiveStroke {
    handle: ActionHandle,
    kind: StrokeKind,
    tessellator: Tessellator,
}

/// Records pointer gestures into an ordered stroke log.
#[derive(Debug, Clone, Default)]
pub struct StrokeRecorder {
    log: Vec<StrokeAction>,
    active: Option<ActiveStroke>,
    radii: EffectRadii,
}

impl StrokeRecorder {
    /// Create an empty recorder.
    pub fn new(radii: EffectRadii) -> Self {
        Self {
            log: Vec::new(),
            active: None,
            radii,
        }
    }

    /// Start a new ink action at `start`. Any unfinished gesture is ended first.
    pub fn begin_stroke(&mut self, kind: StrokeKind, color: Rgba, width: f64, start: Point) -> ActionHandle {
        if self.active.is_some() {
            self.abandon();
        }
        let handle = ActionHandle(self.log.len());
        self.log.push(StrokeAction::from_ink(
            kind,
            InkStroke {
                color,
                size: width,
                points: vec![start],
            },
        ));
        self.active = Some(ActiveStroke {
            handle,
            kind,
            tessellator: Tessellator::new(kind, color, width, self.radii, start),
        });
        handle
    }

    /// Append `point` to the active action and return the ink to paint.
    ///
    /// A handle that is not the active gesture is ignored. Dotted strokes drop
    /// repeated points since they would emit nothing.
    pub fn extend_stroke(&mut self, handle: ActionHandle, point: Point) -> Vec<InkOp> {
        let Some(active) = self.active.as_mut().filter(|a| a.handle == handle) else {
            log::debug!("Ignoring extend on inactive stroke {:?}", handle);
            return Vec::new();
        };
        let Some(stroke) = self.log.get_mut(handle.0).and_then(StrokeAction::ink_mut) else {
            return Vec::new();
        };

        if active.kind == StrokeKind::Dotted && stroke.points.last() == Some(&point) {
            return Vec::new();
        }
        stroke.points.push(point);
        active.tessellator.step(point)
    }

    /// Finalise the action. Returns `false` if `handle` was not active.
    pub fn end_stroke(&mut self, handle: ActionHandle) -> bool {
        match &self.active {
            Some(active) if active.handle == handle => {
                self.active = None;
                true
            }
            _ => false,
        }
    }

    /// Drop the in-progress gesture. Points already recorded stay in the log.
    pub fn abandon(&mut self) {
        self.active = None;
    }

    /// Handle of the gesture being recorded, if any.
    pub fn active_handle(&self) -> Option<ActionHandle> {
        self.active.as_ref().map(|a| a.handle)
    }

    /// Append a text placement.
    pub fn record_text(&mut self, text: TextStroke) {
        self.log.push(StrokeAction::Text(text));
    }

    /// The recorded actions in order.
    pub fn log(&self) -> &[StrokeAction] {
        &self.log
    }

    /// Replace the whole log (history restore, reload).
    pub fn replace_log(&mut self, log: Vec<StrokeAction>) {
        self.active = None;
        self.log = log;
    }

    /// Remove every action.
    pub fn clear(&mut self) {
        self.active = None;
        self.log.clear();
    }

    /// Serialize the log for durable storage.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.log)
    }

    /// Parse a persisted log.
    pub fn parse_log(json: &str) -> Result<Vec<StrokeAction>, serde_json::Error> {
        serde_json::from_str(json)
    }
}
