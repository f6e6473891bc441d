//! Pixel-grid drawing mode.
//!
//! A coarse matrix of coloured cells covering the canvas. Its SVG export is
//! one `<rect>` per painted cell, which keeps on-chain payloads small.

use crate::color::Rgba;
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Smallest cell edge in pixels.
pub const MIN_PIXEL_SIZE: u32 = 8;
/// Largest cell edge in pixels.
pub const MAX_PIXEL_SIZE: u32 = 50;
/// Change applied by the `+` / `-` shortcuts.
pub const PIXEL_SIZE_STEP: i32 = 2;
/// Colour of an unpainted cell.
pub const BACKGROUND: Rgba = Rgba::white();
/// Grid line colour.
pub const GRID_LINE_COLOR: Rgba = Rgba::rgb(0xE0, 0xE0, 0xE0);

/// Palette offered in pixel mode.
pub const PIXEL_PALETTE: [Rgba; 53] = [
    // Primary
    Rgba::rgb(0xFF, 0x00, 0x00),
    Rgba::rgb(0x00, 0xFF, 0x00),
    Rgba::rgb(0x00, 0x00, 0xFF),
    Rgba::rgb(0xFF, 0xFF, 0x00),
    Rgba::rgb(0xFF, 0x00, 0xFF),
    Rgba::rgb(0x00, 0xFF, 0xFF),
    // Secondary
    Rgba::rgb(0xFF, 0x80, 0x00),
    Rgba::rgb(0x80, 0x00, 0xFF),
    Rgba::rgb(0x00, 0x80, 0xFF),
    Rgba::rgb(0xFF, 0x00, 0x80),
    Rgba::rgb(0x80, 0xFF, 0x00),
    Rgba::rgb(0x00, 0xFF, 0x80),
    // Warm
    Rgba::rgb(0xFF, 0x40, 0x00),
    Rgba::rgb(0xFF, 0x60, 0x00),
    Rgba::rgb(0xFF, 0xA0, 0x00),
    Rgba::rgb(0xFF, 0xC0, 0x00),
    Rgba::rgb(0xFF, 0xE0, 0x00),
    Rgba::rgb(0xFF, 0xFF, 0x40),
    // Cool
    Rgba::rgb(0x00, 0x40, 0xFF),
    Rgba::rgb(0x00, 0x60, 0xFF),
    Rgba::rgb(0x00, 0x80, 0xFF),
    Rgba::rgb(0x00, 0xA0, 0xFF),
    Rgba::rgb(0x00, 0xC0, 0xFF),
    Rgba::rgb(0x00, 0xE0, 0xFF),
    // Pastels
    Rgba::rgb(0xFF, 0xB3, 0xB3),
    Rgba::rgb(0xB3, 0xFF, 0xB3),
    Rgba::rgb(0xB3, 0xB3, 0xFF),
    Rgba::rgb(0xFF, 0xFF, 0xB3),
    Rgba::rgb(0xFF, 0xB3, 0xFF),
    Rgba::rgb(0xB3, 0xFF, 0xFF),
    // Earth
    Rgba::rgb(0x8B, 0x45, 0x13),
    Rgba::rgb(0xA0, 0x52, 0x2D),
    Rgba::rgb(0xCD, 0x85, 0x3F),
    Rgba::rgb(0xDE, 0xB8, 0x87),
    Rgba::rgb(0xF5, 0xDE, 0xB3),
    Rgba::rgb(0xF5, 0xF5, 0xDC),
    // Grays
    Rgba::rgb(0xFF, 0xFF, 0xFF),
    Rgba::rgb(0xF0, 0xF0, 0xF0),
    Rgba::rgb(0xE0, 0xE0, 0xE0),
    Rgba::rgb(0xD0, 0xD0, 0xD0),
    Rgba::rgb(0xC0, 0xC0, 0xC0),
    Rgba::rgb(0xB0, 0xB0, 0xB0),
    Rgba::rgb(0xA0, 0xA0, 0xA0),
    Rgba::rgb(0x90, 0x90, 0x90),
    Rgba::rgb(0x80, 0x80, 0x80),
    Rgba::rgb(0x70, 0x70, 0x70),
    Rgba::rgb(0x60, 0x60, 0x60),
    Rgba::rgb(0x50, 0x50, 0x50),
    Rgba::rgb(0x40, 0x40, 0x40),
    Rgba::rgb(0x30, 0x30, 0x30),
    Rgba::rgb(0x20, 0x20, 0x20),
    Rgba::rgb(0x10, 0x10, 0x10),
    Rgba::rgb(0x00, 0x00, 0x00),
];

/// Named slices of [`PIXEL_PALETTE`].
pub const PALETTE_CATEGORIES: [(&str, Range<usize>); 7] = [
    ("Primary", 0..6),
    ("Secondary", 6..12),
    ("Warm", 12..18),
    ("Cool", 18..24),
    ("Pastels", 24..30),
    ("Earth", 30..36),
    ("Grays", 36..53),
];

/// The colour matrix and the cell size it was laid out for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelCells {
    pub cell_size: u32,
    pub columns: usize,
    pub rows: usize,
    /// Row-major colours.
    pub cells: Vec<Rgba>,
}

impl PixelCells {
    fn blank(canvas_width: u32, canvas_height: u32, cell_size: u32) -> Self {
        let columns = canvas_width.div_ceil(cell_size) as usize;
        let rows = canvas_height.div_ceil(cell_size) as usize;
        Self {
            cell_size,
            columns,
            rows,
            cells: vec![BACKGROUND; columns * rows],
        }
    }
}

/// Pixel-grid surface with transient hover state.
#[derive(Debug, Clone)]
pub struct PixelGrid {
    canvas_width: u32,
    canvas_height: u32,
    cells: PixelCells,
    /// Last hovered `(row, col)`.
    hover: Option<(usize, usize)>,
}

impl PixelGrid {
    /// Create a blank grid. The cell size is clamped to 8–50.
    pub fn new(canvas_width: u32, canvas_height: u32, cell_size: u32) -> Self {
        let cell_size = cell_size.clamp(MIN_PIXEL_SIZE, MAX_PIXEL_SIZE);
        Self {
            canvas_width,
            canvas_height,
            cells: PixelCells::blank(canvas_width, canvas_height, cell_size),
            hover: None,
        }
    }

    pub fn cell_size(&self) -> u32 {
        self.cells.cell_size
    }

    pub fn columns(&self) -> usize {
        self.cells.columns
    }

    pub fn rows(&self) -> usize {
        self.cells.rows
    }

    /// Colour of a cell, `None` outside the grid.
    pub fn get(&self, row: usize, col: usize) -> Option<Rgba> {
        if row >= self.rows() || col >= self.columns() {
            return None;
        }
        self.cells.cells.get(row * self.columns() + col).copied()
    }

    /// Paint a cell. Returns `false` (and does nothing) outside the grid.
    pub fn set_cell(&mut self, row: usize, col: usize, color: Rgba) -> bool {
        if row >= self.rows() || col >= self.columns() {
            return false;
        }
        let idx = row * self.columns() + col;
        self.cells.cells[idx] = color;
        true
    }

    /// Cell under a canvas point.
    pub fn cell_at(&self, point: Point) -> Option<(usize, usize)> {
        if !point.is_finite() || point.x < 0.0 || point.y < 0.0 {
            return None;
        }
        let size = self.cell_size() as f64;
        let row = (point.y / size).floor() as usize;
        let col = (point.x / size).floor() as usize;
        (row < self.rows() && col < self.columns()).then_some((row, col))
    }

    /// Reallocate for a new cell size. Previous colours are lost.
    /// Returns the size actually applied.
    pub fn resize(&mut self, cell_size: u32) -> u32 {
        let cell_size = cell_size.clamp(MIN_PIXEL_SIZE, MAX_PIXEL_SIZE);
        self.cells = PixelCells::blank(self.canvas_width, self.canvas_height, cell_size);
        self.hover = None;
        cell_size
    }

    /// Grow or shrink the cell size by `delta`. Returns `true` if it changed.
    pub fn step_size(&mut self, delta: i32) -> bool {
        let current = self.cell_size() as i32;
        let target = (current + delta).clamp(MIN_PIXEL_SIZE as i32, MAX_PIXEL_SIZE as i32);
        if target == current {
            return false;
        }
        self.resize(target as u32);
        true
    }

    /// Reset every cell to the background.
    pub fn clear(&mut self) {
        self.cells.cells.fill(BACKGROUND);
    }

    /// Track the hovered cell. Returns `true` if it changed.
    pub fn set_hover(&mut self, cell: Option<(usize, usize)>) -> bool {
        let changed = self.hover != cell;
        self.hover = cell;
        changed
    }

    pub fn hover(&self) -> Option<(usize, usize)> {
        self.hover
    }

    /// The colour matrix for snapshots.
    pub fn cells(&self) -> &PixelCells {
        &self.cells
    }

    /// Adopt a snapshotted matrix, including its cell size.
    pub fn restore(&mut self, cells: PixelCells) {
        let expected = PixelCells::blank(self.canvas_width, self.canvas_height, cells.cell_size);
        if cells.columns != expected.columns || cells.rows != expected.rows || cells.cells.len() != cells.columns * cells.rows {
            log::warn!(
                "Discarding pixel grid snapshot of {}x{} cells for a {}x{} layout",
                cells.columns,
                cells.rows,
                expected.columns,
                expected.rows
            );
            self.cells = expected;
        } else {
            self.cells = cells;
        }
        self.hover = None;
    }

    /// Painted cells as `(row, col, colour)` in row-major order.
    pub fn painted_cells(&self) -> impl Iterator<Item = (usize, usize, Rgba)> + '_ {
        let columns = self.columns();
        self.cells
            .cells
            .iter()
            .enumerate()
            .filter(|(_, c)| **c != BACKGROUND)
            .map(move |(i, c)| (i / columns, i % columns, *c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimensions_round_up() {
        let grid = PixelGrid::new(805, 600, 20);
        assert_eq!(grid.columns(), 41);
        assert_eq!(grid.rows(), 30);
    }

    #[test]
    fn test_set_cell_bounds() {
        let mut grid = PixelGrid::new(100, 100, 20);
        assert!(grid.set_cell(4, 4, Rgba::black()));
        assert!(!grid.set_cell(5, 0, Rgba::black()));
        assert_eq!(grid.get(4, 4), Some(Rgba::black()));
        assert_eq!(grid.get(5, 0), None);
    }

    #[test]
    fn test_resize_is_destructive() {
        let mut grid = PixelGrid::new(100, 100, 20);
        grid.set_cell(0, 0, Rgba::rgb(255, 0, 0));
        grid.resize(10);
        assert_eq!(grid.get(0, 0), Some(BACKGROUND));
        assert_eq!(grid.columns(), 10);
    }

    #[test]
    fn test_resize_clamps() {
        let mut grid = PixelGrid::new(100, 100, 20);
        assert_eq!(grid.resize(2), MIN_PIXEL_SIZE);
        assert_eq!(grid.resize(500), MAX_PIXEL_SIZE);
    }

    #[test]
    fn test_step_size_limits() {
        let mut grid = PixelGrid::new(100, 100, 48);
        assert!(grid.step_size(PIXEL_SIZE_STEP));
        assert_eq!(grid.cell_size(), 50);
        assert!(!grid.step_size(PIXEL_SIZE_STEP));

        let mut grid = PixelGrid::new(100, 100, 8);
        assert!(!grid.step_size(-PIXEL_SIZE_STEP));
    }

    #[test]
    fn test_cell_at() {
        let grid = PixelGrid::new(100, 100, 20);
        assert_eq!(grid.cell_at(Point::new(45.0, 21.0)), Some((1, 2)));
        assert_eq!(grid.cell_at(Point::new(-1.0, 5.0)), None);
        assert_eq!(grid.cell_at(Point::new(100.0, 5.0)), None);
        assert_eq!(grid.cell_at(Point::new(f64::NAN, 5.0)), None);
        assert_eq!(grid.cell_at(Point::new(5.0, f64::INFINITY)), None);
    }

    #[test]
    fn test_clear_and_painted_cells() {
        let mut grid = PixelGrid::new(40, 40, 20);
        grid.set_cell(1, 0, Rgba::black());
        let painted: Vec<_> = grid.painted_cells().collect();
        assert_eq!(painted, vec![(1, 0, Rgba::black())]);

        grid.clear();
        assert_eq!(grid.painted_cells().count(), 0);
    }

    #[test]
    fn test_restore_other_cell_size() {
        let mut grid = PixelGrid::new(100, 100, 20);
        grid.resize(10);
        grid.set_cell(9, 9, Rgba::black());
        let snapshot = grid.cells().clone();

        grid.resize(20);
        grid.restore(snapshot);
        assert_eq!(grid.cell_size(), 10);
        assert_eq!(grid.get(9, 9), Some(Rgba::black()));
    }

    #[test]
    fn test_palette_categories_cover_palette() {
        let total: usize = PALETTE_CATEGORIES.iter().map(|(_, r)| r.len()).sum();
        assert_eq!(total, PIXEL_PALETTE.len());
    }
}
