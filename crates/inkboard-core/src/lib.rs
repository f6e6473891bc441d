//! Inkboard Core Library
//!
//! Platform-agnostic state and logic for the Inkboard whiteboard: the stroke
//! log, scene elements, pixel grid, undo history and SVG export. Rasterising
//! is left to an [`InkSurface`] implementation supplied by the host.

pub mod board;
pub mod color;
pub mod config;
pub mod element;
pub mod handles;
pub mod history;
pub mod interaction;
pub mod pixel_grid;
pub mod shortcuts;
pub mod storage;
pub mod store;
pub mod stroke;
pub mod surface;
pub mod svg;
pub mod tools;

pub use board::{BoardError, ImageLoadTicket, ImagePlacement, KeyOutcome, Whiteboard};
pub use color::Rgba;
pub use config::{BoardConfig, ConfigError};
pub use element::{Element, ElementError, ElementFrame, ElementId, ElementKind, ElementPatch, ImageSource, TextMetrics};
pub use handles::{Handle, HandleKind};
pub use history::{History, Snapshot};
pub use interaction::Interaction;
pub use pixel_grid::{PIXEL_PALETTE, PixelGrid};
pub use shortcuts::{ShortcutAction, ShortcutRegistry};
pub use storage::{FileStorage, MemoryStorage, Storage, StorageError, StorageResult};
pub use store::ElementStore;
pub use stroke::{ActionHandle, StrokeAction, StrokeRecorder};
pub use surface::{InkOp, InkSurface, RecordingSurface, SurfaceError};
pub use svg::SvgSizeInfo;
pub use tools::{BrushSettings, StrokeKind, Tool};
