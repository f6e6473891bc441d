//! A board with its compositor, opened from configuration and storage.

use crate::{AppError, AppResult};
use inkboard_core::{BoardConfig, InkSurface, Storage, SvgSizeInfo, Whiteboard};
use inkboard_render::{Compositor, FrameOptions, GlyphPainter, PixmapInk, export};
use std::path::Path;
use std::sync::Arc;

/// What an export produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Raster,
    Svg,
}

/// An open board ready for export.
pub struct Session {
    board: Whiteboard<PixmapInk>,
    compositor: Compositor,
}

impl Session {
    /// Open a board, replaying whatever stroke log `storage` holds.
    pub fn open(config: BoardConfig, storage: Arc<dyn Storage>, seed: Option<u64>) -> AppResult<Self> {
        let mut ink = PixmapInk::new(config.width, config.height)?;
        if let Some(seed) = seed {
            ink = ink.with_seed(seed);
        }

        let glyphs = match &config.font_path {
            Some(path) => match GlyphPainter::from_file(path) {
                Ok(glyphs) => Some(glyphs),
                Err(e) => {
                    log::warn!("{}, falling back to system fonts", e);
                    GlyphPainter::find_system_font()
                }
            },
            None => GlyphPainter::find_system_font(),
        };

        let mut board = Whiteboard::new(config, ink, storage)?;
        if let Some(glyphs) = glyphs.clone() {
            board = board.with_text_metrics(Box::new(glyphs));
        }
        log::info!(
            "Opened {}x{} board with {} stroke actions",
            board.surface().width(),
            board.surface().height(),
            board.actions().len()
        );

        Ok(Self {
            board,
            compositor: Compositor::new(glyphs),
        })
    }

    pub fn board(&self) -> &Whiteboard<PixmapInk> {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut Whiteboard<PixmapInk> {
        &mut self.board
    }

    /// Write the board to `path`; `.svg` gives vector output, `.png`/`.jpg`
    /// a composited frame.
    pub fn export(&mut self, path: &Path) -> AppResult<ExportKind> {
        self.board.begin_external_job()?;
        let result = self.write(path);
        self.board.finish_external_job();
        result
    }

    fn write(&mut self, path: &Path) -> AppResult<ExportKind> {
        let is_svg = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("svg"));
        if is_svg {
            std::fs::write(path, self.board.to_svg())?;
            log::info!("Wrote {}", path.display());
            return Ok(ExportKind::Svg);
        }

        if inkboard_render::RasterFormat::from_path(path).is_none() {
            return Err(AppError::UnsupportedOutput(path.to_path_buf()));
        }
        let frame = self.compositor.render(&self.board, FrameOptions::export())?;
        export::save(&frame, path)?;
        Ok(ExportKind::Raster)
    }

    pub fn svg_size_info(&self) -> SvgSizeInfo {
        self.board.svg_size_info()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkboard_core::{MemoryStorage, Tool};
    use kurbo::Point;

    fn session(storage: Arc<MemoryStorage>) -> Session {
        Session::open(BoardConfig::with_size(64, 48), storage, Some(3)).unwrap()
    }

    fn draw(session: &mut Session) {
        let board = session.board_mut();
        board.set_tool(Tool::Pencil);
        board.pointer_down(Point::new(4.0, 4.0));
        board.pointer_move(Point::new(40.0, 30.0));
        board.pointer_up(Point::new(40.0, 30.0));
    }

    #[test]
    fn test_reopened_session_replays_log() {
        let storage = Arc::new(MemoryStorage::new());
        let mut first = session(storage.clone());
        draw(&mut first);

        let second = session(storage);
        assert_eq!(second.board().actions().len(), 1);
        assert_eq!(
            second.board().surface().pixmap().data(),
            first.board().surface().pixmap().data()
        );
    }

    #[test]
    fn test_export_formats() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(Arc::new(MemoryStorage::new()));
        draw(&mut session);

        let svg = dir.path().join("board.svg");
        assert_eq!(session.export(&svg).unwrap(), ExportKind::Svg);
        assert!(std::fs::read_to_string(&svg).unwrap().contains("<path"));

        let png = dir.path().join("board.png");
        assert_eq!(session.export(&png).unwrap(), ExportKind::Raster);
        assert!(std::fs::read(&png).unwrap().starts_with(&[0x89, 0x50]));

        let bad = dir.path().join("board.gif");
        assert!(matches!(session.export(&bad), Err(AppError::UnsupportedOutput(_))));
        // The guard is released even after a failure
        assert!(!session.board().is_busy());
    }

    #[test]
    fn test_export_refused_mid_gesture() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(Arc::new(MemoryStorage::new()));
        session.board_mut().pointer_down(Point::new(1.0, 1.0));
        assert!(session.export(&dir.path().join("x.svg")).is_err());
    }
}
