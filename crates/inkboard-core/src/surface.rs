//! Ink surface abstraction.
//!
//! The free-drawing layer is a raster the core never touches directly: tools
//! emit [`InkOp`]s and history stores opaque snapshots produced by the
//! surface. `inkboard-render` provides the pixmap implementation.

use crate::color::Rgba;
use kurbo::Point;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Ink surface errors.
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("Invalid surface size: {0}x{1}")]
    InvalidSize(u32, u32),
    #[error("Snapshot encoding failed: {0}")]
    Encode(String),
    #[error("Snapshot decoding failed: {0}")]
    Decode(String),
}

/// A single raster operation on the ink layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InkOp {
    /// Round-capped segment (pencil and brush).
    Line {
        from: Point,
        to: Point,
        color: Rgba,
        width: f64,
    },
    /// Scatter of single-pixel-radius dots inside a disc.
    Spray {
        center: Point,
        radius: f64,
        color: Rgba,
        dots: usize,
    },
    /// Filled dot (dotted tool).
    Dot { center: Point, radius: f64, color: Rgba },
    /// Clear ink to transparent inside a disc.
    Erase { center: Point, radius: f64 },
    /// Lighten towards white, strongest at the centre.
    Blur { center: Point, radius: f64 },
    /// Darken and jitter painted pixels.
    Smudge { center: Point, radius: f64 },
}

/// The free-drawing raster layer.
///
/// A blank surface is opaque white. Snapshots are opaque byte blobs that
/// only the producing implementation needs to understand, but equal
/// contents must produce equal bytes so history can deduplicate.
pub trait InkSurface {
    /// Surface width in pixels.
    fn width(&self) -> u32;

    /// Surface height in pixels.
    fn height(&self) -> u32;

    /// Apply one operation.
    fn apply(&mut self, op: &InkOp);

    /// Reset to blank white.
    fn clear(&mut self);

    /// Encode the current contents.
    fn snapshot(&self) -> Result<Vec<u8>, SurfaceError>;

    /// Replace the contents with a previously taken snapshot.
    fn restore(&mut self, snapshot: &[u8]) -> Result<(), SurfaceError>;
}

/// Surface that records operations instead of rasterising them.
///
/// Useful for headless hosts that only need vector export, and for tests.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    width: u32,
    height: u32,
    ops: Vec<InkOp>,
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ops: Vec::new(),
        }
    }

    /// Operations applied since the last clear or restore.
    pub fn ops(&self) -> &[InkOp] {
        &self.ops
    }
}

impl InkSurface for RecordingSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn apply(&mut self, op: &InkOp) {
        self.ops.push(op.clone());
    }

    fn clear(&mut self) {
        self.ops.clear();
    }

    fn snapshot(&self) -> Result<Vec<u8>, SurfaceError> {
        serde_json::to_vec(&self.ops).map_err(|e| SurfaceError::Encode(e.to_string()))
    }

    fn restore(&mut self, snapshot: &[u8]) -> Result<(), SurfaceError> {
        self.ops = serde_json::from_slice(snapshot).map_err(|e| SurfaceError::Decode(e.to_string()))?;
        Ok(())
    }
}
