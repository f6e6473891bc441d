//! Linear, bounded undo history.

use crate::element::Element;
use crate::pixel_grid::PixelCells;
use crate::stroke::StrokeAction;
use std::collections::VecDeque;

/// Default number of entries kept.
pub const MAX_UNDO_HISTORY: usize = 50;

/// Immutable copy of the whole board.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Encoded ink surface.
    pub ink: Vec<u8>,
    pub elements: Vec<Element>,
    pub log: Vec<StrokeAction>,
    /// Grid colours, present only while pixel mode was active.
    pub grid: Option<PixelCells>,
}

/// Ordered snapshots with a cursor at the current one.
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<Snapshot>,
    cursor: usize,
    capacity: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(MAX_UNDO_HISTORY)
    }
}

impl History {
    /// Create an empty history holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            cursor: 0,
            capacity: capacity.max(1),
        }
    }

    /// Record a snapshot after the cursor.
    ///
    /// Entries after the cursor are discarded first. A snapshot equal to the
    /// current entry is not pushed. Returns `true` if an entry was added.
    pub fn commit(&mut self, snapshot: Snapshot) -> bool {
        if !self.entries.is_empty() {
            self.entries.truncate(self.cursor + 1);
        }
        if self.entries.back() == Some(&snapshot) {
            return false;
        }

        self.entries.push_back(snapshot);
        if self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
        self.cursor = self.entries.len() - 1;
        true
    }

    /// Step back. Returns the entry to restore, or `None` at the boundary.
    pub fn undo(&mut self) -> Option<&Snapshot> {
        if self.cursor == 0 || self.entries.is_empty() {
            return None;
        }
        self.cursor -= 1;
        self.entries.get(self.cursor)
    }

    /// Step forward. Returns the entry to restore, or `None` at the boundary.
    pub fn redo(&mut self) -> Option<&Snapshot> {
        if self.cursor + 1 >= self.entries.len() {
            return None;
        }
        self.cursor += 1;
        self.entries.get(self.cursor)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    /// The entry at the cursor.
    pub fn current(&self) -> Option<&Snapshot> {
        self.entries.get(self.cursor)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

}
