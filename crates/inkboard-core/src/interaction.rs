//! Pointer interaction state.
//!
//! Exactly one gesture can be in flight; the variants replace what would
//! otherwise be a set of independent boolean flags.

use crate::element::ElementId;
use crate::stroke::ActionHandle;
use kurbo::Vec2;

/// The gesture currently driven by pointer events.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Interaction {
    #[default]
    Idle,
    /// Recording an ink stroke.
    Drawing { handle: ActionHandle },
    /// Moving an element; `grab` is the pointer offset from its top-left.
    DraggingElement { id: ElementId, grab: Vec2 },
    /// Resizing an element from its top-left anchor.
    ResizingElement { id: ElementId },
    /// Rotating an element around its centre.
    RotatingElement { id: ElementId, grab_offset: f64 },
}

impl Interaction {
    pub fn is_idle(&self) -> bool {
        matches!(self, Interaction::Idle)
    }

    /// The element being manipulated, if any.
    pub fn element(&self) -> Option<ElementId> {
        match *self {
            Interaction::DraggingElement { id, .. }
            | Interaction::ResizingElement { id }
            | Interaction::RotatingElement { id, .. } => Some(id),
            Interaction::Idle | Interaction::Drawing { .. } => None,
        }
    }

    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Interaction::Idle => "idle",
            Interaction::Drawing { .. } => "drawing",
            Interaction::DraggingElement { .. } => "dragging",
            Interaction::ResizingElement { .. } => "resizing",
            Interaction::RotatingElement { .. } => "rotating",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_accessor() {
        let id = ElementId::new();
        assert_eq!(Interaction::ResizingElement { id }.element(), Some(id));
        assert_eq!(Interaction::Idle.element(), None);
        assert!(Interaction::default().is_idle());
    }
}
