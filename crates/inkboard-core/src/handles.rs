//! Manipulation handles for the selected element.
//!
//! Handles sit at fixed offsets from the element centre in its rotated
//! frame, so they turn with the element while their local offset stays put.

use crate::element::ElementFrame;
use kurbo::{Point, Vec2};

/// Hit radius of a handle in canvas pixels.
pub const HANDLE_HIT_RADIUS: f64 = 16.0;
/// Drawn radius of a handle.
pub const HANDLE_DRAW_RADIUS: f64 = 12.0;
/// Distance from the top edge to the rotation handle.
pub const ROTATE_HANDLE_OFFSET: f64 = 40.0;
/// Diagonal offset of the delete handle from the top-right corner.
pub const DELETE_HANDLE_OFFSET: f64 = 10.0;

/// Type of selection handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleKind {
    Rotate,
    Delete,
}

/// A handle with its local offset and canvas position.
#[derive(Debug, Clone, Copy)]
pub struct Handle {
    pub kind: HandleKind,
    /// Offset from the element centre in the rotated frame.
    pub local: Vec2,
    /// Position in canvas coordinates.
    pub position: Point,
}

impl Handle {
    /// Build the handle of `kind` for an element frame.
    pub fn for_frame(frame: &ElementFrame, kind: HandleKind) -> Self {
        let local = local_offset(frame, kind);
        Self {
            kind,
            local,
            position: frame.rotated_local_to_canvas(local),
        }
    }

    /// Check if a canvas point hits this handle.
    pub fn hit_test(&self, point: Point) -> bool {
        let dx = point.x - self.position.x;
        let dy = point.y - self.position.y;
        dx * dx + dy * dy <= HANDLE_HIT_RADIUS * HANDLE_HIT_RADIUS
    }
}

/// Offset of a handle from the element centre, before rotation.
pub fn local_offset(frame: &ElementFrame, kind: HandleKind) -> Vec2 {
    let (w, h) = frame.scaled_size();
    match kind {
        HandleKind::Rotate => Vec2::new(0.0, -h / 2.0 - ROTATE_HANDLE_OFFSET),
        HandleKind::Delete => Vec2::new(w / 2.0 + DELETE_HANDLE_OFFSET, -h / 2.0 - DELETE_HANDLE_OFFSET),
    }
}

/// Both handles of an element.
pub fn get_handles(frame: &ElementFrame) -> [Handle; 2] {
    [
        Handle::for_frame(frame, HandleKind::Rotate),
        Handle::for_frame(frame, HandleKind::Delete),
    ]
}

/// Find which handle (if any) is hit at the given canvas point.
pub fn hit_test_handles(frame: &ElementFrame, point: Point) -> Option<HandleKind> {
    get_handles(frame).into_iter().find(|h| h.hit_test(point)).map(|h| h.kind)
}

/// Angle of `pointer` around the element centre.
pub fn pointer_angle(frame: &ElementFrame, pointer: Point) -> f64 {
    let c = frame.center();
    (pointer.y - c.y).atan2(pointer.x - c.x)
}

/// Offset captured when a rotation drag starts.
pub fn rotation_grab_offset(frame: &ElementFrame, pointer: Point) -> f64 {
    pointer_angle(frame, pointer) - frame.rotation
}

/// Rotation that keeps the element tracking the pointer angle.
pub fn rotation_for_pointer(frame: &ElementFrame, pointer: Point, grab_offset: f64) -> f64 {
    pointer_angle(frame, pointer) - grab_offset
}
