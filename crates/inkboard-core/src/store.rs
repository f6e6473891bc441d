//! Ordered element list with single selection.

use crate::element::{Element, ElementId, ElementPatch};
use kurbo::Point;

/// Scene elements in draw order (back to front) plus the current selection.
#[derive(Debug, Clone, Default)]
pub struct ElementStore {
    elements: Vec<Element>,
    selected: Option<ElementId>,
}

impl ElementStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an element on top and return its id.
    pub fn add(&mut self, element: Element) -> ElementId {
        let id = element.id();
        self.elements.push(element);
        id
    }

    /// Topmost element containing `point`.
    pub fn find_topmost_at(&self, point: Point) -> Option<ElementId> {
        // Reverse draw order: last drawn is hit first
        self.elements.iter().rev().find(|e| e.hit_test(point)).map(Element::id)
    }

    /// Select an element, or clear the selection with `None`.
    /// Unknown ids clear the selection.
    pub fn select(&mut self, id: Option<ElementId>) {
        self.selected = id.filter(|id| self.get(*id).is_some());
    }

    /// Clear the selection.
    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Currently selected element id.
    pub fn selected(&self) -> Option<ElementId> {
        self.selected
    }

    /// Currently selected element.
    pub fn selected_element(&self) -> Option<&Element> {
        self.selected.and_then(|id| self.get(id))
    }

    /// Check if an element is selected.
    pub fn is_selected(&self, id: ElementId) -> bool {
        self.selected == Some(id)
    }

    /// Remove an element, clearing the selection if it was selected.
    pub fn delete(&mut self, id: ElementId) -> Option<Element> {
        let pos = self.elements.iter().position(|e| e.id() == id)?;
        if self.selected == Some(id) {
            self.selected = None;
        }
        Some(self.elements.remove(pos))
    }

    /// Update an element's frame in place. Returns `false` if not found.
    pub fn transform(&mut self, id: ElementId, patch: &ElementPatch) -> bool {
        match self.get_mut(id) {
            Some(element) => {
                element.frame.apply(patch);
                true
            }
            None => false,
        }
    }

    /// Get an element by id.
    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| e.id() == id)
    }

    /// Get a mutable reference to an element by id.
    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.elements.iter_mut().find(|e| e.id() == id)
    }

    /// Elements in draw order.
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Replace every element. The selection survives only if its element does.
    pub fn replace(&mut self, elements: Vec<Element>) {
        self.elements = elements;
        if let Some(id) = self.selected {
            if self.get(id).is_none() {
                self.selected = None;
            }
        }
    }

    /// Remove all elements.
    pub fn clear(&mut self) {
        self.elements.clear();
        self.selected = None;
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{ElementFrame, ElementKind};

    fn emoji_at(x: f64, y: f64, size: f64) -> Element {
        Element::new(
            ElementFrame::new(x, y, size, size),
            ElementKind::Emoji {
                glyph: "⭐".to_string(),
            },
        )
    }

    #[test]
    fn test_hit_test() {
        let mut store = ElementStore::new();
        let id = store.add(emoji_at(10.0, 10.0, 50.0));

        assert_eq!(store.find_topmost_at(Point::new(30.0, 30.0)), Some(id));
        assert_eq!(store.find_topmost_at(Point::new(5.0, 5.0)), None);
    }

    #[test]
    fn test_z_order() {
        let mut store = ElementStore::new();
        let a = store.add(emoji_at(0.0, 0.0, 100.0));
        let b = store.add(emoji_at(50.0, 50.0, 100.0));

        // Overlap: front element wins
        assert_eq!(store.find_topmost_at(Point::new(75.0, 75.0)), Some(b));
        // Only under A
        assert_eq!(store.find_topmost_at(Point::new(25.0, 25.0)), Some(a));
    }

    #[test]
    fn test_delete_clears_selection() {
        let mut store = ElementStore::new();
        let a = store.add(emoji_at(0.0, 0.0, 20.0));
        let b = store.add(emoji_at(50.0, 0.0, 20.0));

        store.select(Some(a));
        store.delete(b);
        assert!(store.is_selected(a));

        store.delete(a);
        assert_eq!(store.selected(), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_select_unknown_clears() {
        let mut store = ElementStore::new();
        let a = store.add(emoji_at(0.0, 0.0, 20.0));
        store.select(Some(a));
        store.select(Some(ElementId::new()));
        assert_eq!(store.selected(), None);
    }

    #[test]
    fn test_transform() {
        let mut store = ElementStore::new();
        let a = store.add(emoji_at(0.0, 0.0, 20.0));
        assert!(store.transform(a, &ElementPatch::position(5.0, 6.0)));
        let frame = store.get(a).unwrap().frame;
        assert!((frame.x - 5.0).abs() < f64::EPSILON);
        assert!((frame.y - 6.0).abs() < f64::EPSILON);
        assert!(!store.transform(ElementId::new(), &ElementPatch::default()));
    }

    #[test]
    fn test_replace_drops_stale_selection() {
        let mut store = ElementStore::new();
        let a = store.add(emoji_at(0.0, 0.0, 20.0));
        let kept = store.elements().to_vec();
        let b = store.add(emoji_at(50.0, 0.0, 20.0));

        store.select(Some(a));
        store.replace(kept.clone());
        assert!(store.is_selected(a));

        store.select(Some(b));
        store.replace(kept);
        assert_eq!(store.selected(), None);
        assert_eq!(store.len(), 1);
    }
}
