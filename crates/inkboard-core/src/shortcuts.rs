//! Keyboard shortcut registry and documentation.

/// What a shortcut does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShortcutAction {
    Undo,
    Redo,
    /// Report the SVG size against minting limits.
    SvgSizeInfo,
    /// Grow the pixel-grid cell size (pixel mode only).
    PixelSizeUp,
    /// Shrink the pixel-grid cell size (pixel mode only).
    PixelSizeDown,
}

impl ShortcutAction {
    /// Whether the action is only active in pixel mode.
    pub fn requires_pixel_mode(self) -> bool {
        matches!(self, ShortcutAction::PixelSizeUp | ShortcutAction::PixelSizeDown)
    }
}

/// A keyboard shortcut definition.
#[derive(Debug, Clone)]
pub struct Shortcut {
    pub key: &'static str,
    pub ctrl: bool,
    pub shift: bool,
    pub action: ShortcutAction,
    pub description: &'static str,
}

impl Shortcut {
    pub const fn new(
        key: &'static str,
        ctrl: bool,
        shift: bool,
        action: ShortcutAction,
        description: &'static str,
    ) -> Self {
        Self {
            key,
            ctrl,
            shift,
            action,
            description,
        }
    }

    /// Format the shortcut for display (e.g., "Ctrl+Z").
    pub fn format(&self) -> String {
        let mut parts = Vec::new();
        if self.ctrl {
            parts.push("Ctrl");
        }
        if self.shift {
            parts.push("Shift");
        }
        parts.push(self.key);
        parts.join("+")
    }

    /// Whether a key press matches this shortcut. Letters match either case.
    pub fn matches(&self, key: &str, ctrl: bool, shift: bool) -> bool {
        self.ctrl == ctrl && self.shift == shift && self.key.eq_ignore_ascii_case(key)
    }
}

/// Registry of all keyboard shortcuts.
pub struct ShortcutRegistry;

impl ShortcutRegistry {
    /// Get all registered shortcuts.
    pub fn all() -> Vec<Shortcut> {
        vec![
            Shortcut::new("Z", true, false, ShortcutAction::Undo, "Undo"),
            Shortcut::new("Z", true, true, ShortcutAction::Redo, "Redo"),
            Shortcut::new("Y", true, false, ShortcutAction::Redo, "Redo"),
            Shortcut::new("S", true, true, ShortcutAction::SvgSizeInfo, "Show SVG size for minting"),
            Shortcut::new("+", false, false, ShortcutAction::PixelSizeUp, "Larger pixels (pixel mode)"),
            // '+' usually arrives as shifted '='
            Shortcut::new("+", false, true, ShortcutAction::PixelSizeUp, "Larger pixels (pixel mode)"),
            Shortcut::new("=", false, false, ShortcutAction::PixelSizeUp, "Larger pixels (pixel mode)"),
            Shortcut::new("-", false, false, ShortcutAction::PixelSizeDown, "Smaller pixels (pixel mode)"),
        ]
    }

    /// Resolve a key press. Pixel-size shortcuts only resolve in pixel mode.
    pub fn resolve(key: &str, ctrl: bool, shift: bool, pixel_mode: bool) -> Option<ShortcutAction> {
        Self::all()
            .into_iter()
            .find(|s| s.matches(key, ctrl, shift))
            .map(|s| s.action)
            .filter(|action| pixel_mode || !action.requires_pixel_mode())
    }

    /// Print all shortcuts to console.
    pub fn print_all() {
        println!("\n=== Keyboard Shortcuts ===");
        for shortcut in Self::all() {
            println!("  {:20} {}", shortcut.format(), shortcut.description);
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undo_redo_keys() {
        assert_eq!(ShortcutRegistry::resolve("z", true, false, false), Some(ShortcutAction::Undo));
        assert_eq!(ShortcutRegistry::resolve("Z", true, true, false), Some(ShortcutAction::Redo));
        assert_eq!(ShortcutRegistry::resolve("y", true, false, false), Some(ShortcutAction::Redo));
        assert_eq!(ShortcutRegistry::resolve("z", false, false, false), None);
    }

    #[test]
    fn test_svg_info_key() {
        assert_eq!(
            ShortcutRegistry::resolve("S", true, true, false),
            Some(ShortcutAction::SvgSizeInfo)
        );
        assert_eq!(ShortcutRegistry::resolve("s", true, false, false), None);
    }

    #[test]
    fn test_pixel_keys_need_pixel_mode() {
        assert_eq!(ShortcutRegistry::resolve("+", false, false, false), None);
        assert_eq!(ShortcutRegistry::resolve("=", false, false, true), Some(ShortcutAction::PixelSizeUp));
        assert_eq!(ShortcutRegistry::resolve("+", false, true, true), Some(ShortcutAction::PixelSizeUp));
        assert_eq!(ShortcutRegistry::resolve("-", false, false, true), Some(ShortcutAction::PixelSizeDown));
    }

    #[test]
    fn test_format() {
        let s = Shortcut::new("Z", true, true, ShortcutAction::Redo, "Redo");
        assert_eq!(s.format(), "Ctrl+Shift+Z");
    }
}
