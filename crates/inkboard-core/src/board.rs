//! The whiteboard context.
//!
//! [`Whiteboard`] owns every piece of board state and is the single object
//! hosts and collaborators talk to. Pointer and keyboard input never fail:
//! out-of-range input is clamped or ignored and logged.

use crate::color::Rgba;
use crate::config::BoardConfig;
use crate::element::{
    ApproxTextMetrics, Element, ElementFrame, ElementId, ElementKind, ElementPatch, ImageSource, TextMetrics,
    TextPayload,
};
use crate::handles::{self, HandleKind};
use crate::history::{History, Snapshot};
use crate::interaction::Interaction;
use crate::pixel_grid::{PIXEL_SIZE_STEP, PixelGrid};
use crate::shortcuts::{ShortcutAction, ShortcutRegistry};
use crate::storage::Storage;
use crate::store::ElementStore;
use crate::stroke::{StrokeAction, StrokeRecorder, TextStroke};
use crate::surface::{InkSurface, SurfaceError};
use crate::svg::{self, SvgSizeInfo};
use crate::tools::{BrushSettings, EffectRadii, TextSettings, Tool};
use kurbo::Point;
use std::sync::Arc;
use thiserror::Error;

/// Board errors.
#[derive(Debug, Error)]
pub enum BoardError {
    #[error("Invalid canvas size: {0}x{1}")]
    InvalidCanvas(u32, u32),
    #[error("Surface error: {0}")]
    Surface(#[from] SurfaceError),
    #[error("Another export is already running or a gesture is in progress")]
    Busy,
}

/// Where a loaded image should be placed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImagePlacement {
    /// Stretched over the canvas.
    Upload,
    /// Fitted into 80% of the canvas, with its prompt attached.
    Generated { prompt: String },
}

/// Proof that an image load was started against a particular scene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageLoadTicket {
    generation: u64,
    placement: ImagePlacement,
}

impl ImageLoadTicket {
    pub fn placement(&self) -> &ImagePlacement {
        &self.placement
    }
}

/// Result of a handled keyboard shortcut.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyOutcome {
    /// Undo ran; `false` when already at the oldest entry.
    Undo(bool),
    /// Redo ran; `false` when already at the newest entry.
    Redo(bool),
    SvgSize(SvgSizeInfo),
    /// New pixel-grid cell size.
    PixelSize(u32),
}

/// A whiteboard session: ink surface, elements, pixel grid, stroke log and
/// history, plus the active tool and gesture.
pub struct Whiteboard<S: InkSurface> {
    config: BoardConfig,
    surface: S,
    store: ElementStore,
    recorder: StrokeRecorder,
    grid: PixelGrid,
    pixel_mode: bool,
    pixel_color: Rgba,
    history: History,
    storage: Arc<dyn Storage>,
    metrics: Box<dyn TextMetrics>,
    tool: Tool,
    brush: BrushSettings,
    text: TextSettings,
    interaction: Interaction,
    /// Bumped whenever the scene is replaced wholesale.
    generation: u64,
    /// Images that finished loading mid-gesture, added once it ends.
    pending_images: Vec<Element>,
    external_job: bool,
}

impl<S: InkSurface> Whiteboard<S> {
    /// Start a session on `surface`.
    ///
    /// The persisted stroke log is loaded from `storage` and replayed onto
    /// the surface, then the initial history entry is taken.
    pub fn new(config: BoardConfig, surface: S, storage: Arc<dyn Storage>) -> Result<Self, BoardError> {
        let (width, height) = (surface.width(), surface.height());
        if width == 0 || height == 0 {
            return Err(BoardError::InvalidCanvas(width, height));
        }
        if (width, height) != (config.width, config.height) {
            log::warn!(
                "Surface is {}x{} but config asks for {}x{}, using the surface size",
                width,
                height,
                config.width,
                config.height
            );
        }

        let radii = EffectRadii {
            blur: config.blur_radius,
            smudge: config.smudge_radius,
        };
        let mut board = Self {
            store: ElementStore::new(),
            recorder: StrokeRecorder::new(radii),
            grid: PixelGrid::new(width, height, config.pixel_size),
            pixel_mode: false,
            pixel_color: config.pixel_color,
            history: History::new(config.history_capacity),
            storage,
            metrics: Box::new(ApproxTextMetrics),
            tool: Tool::default(),
            brush: BrushSettings::new(config.color, config.tool_size),
            text: TextSettings::from_config(&config),
            interaction: Interaction::Idle,
            generation: 0,
            pending_images: Vec::new(),
            external_job: false,
            surface,
            config,
        };

        board.load_log();
        board.commit();
        Ok(board)
    }

    /// Use real font metrics for sizing text elements.
    pub fn with_text_metrics(mut self, metrics: Box<dyn TextMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    fn load_log(&mut self) {
        let key = &self.config.storage_key;
        let json = match self.storage.get(key) {
            Ok(Some(json)) => json,
            Ok(None) => return,
            Err(e) => {
                log::warn!("Failed to read stroke log: {}", e);
                return;
            }
        };
        let log = match StrokeRecorder::parse_log(&json) {
            Ok(log) => log,
            Err(e) => {
                log::warn!("Ignoring unreadable stroke log: {}", e);
                return;
            }
        };

        let radii = EffectRadii {
            blur: self.config.blur_radius,
            smudge: self.config.smudge_radius,
        };
        for action in &log {
            for op in action.replay_ops(radii) {
                self.surface.apply(&op);
            }
        }
        log::info!("Restored {} stroke actions from storage", log.len());
        self.recorder.replace_log(log);
    }

    fn persist_log(&self) {
        match self.recorder.to_json() {
            Ok(json) => {
                if let Err(e) = self.storage.set(&self.config.storage_key, &json) {
                    log::warn!("Failed to persist stroke log: {}", e);
                }
            }
            Err(e) => log::warn!("Failed to serialize stroke log: {}", e),
        }
    }

    // --- Accessors ---

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    pub fn width(&self) -> u32 {
        self.surface.width()
    }

    pub fn height(&self) -> u32 {
        self.surface.height()
    }

    /// The ink surface.
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Elements and selection.
    pub fn store(&self) -> &ElementStore {
        &self.store
    }

    /// The stroke log.
    pub fn actions(&self) -> &[StrokeAction] {
        self.recorder.log()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn interaction(&self) -> Interaction {
        self.interaction
    }

    /// Scene generation, bumped on undo, redo and clear.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn brush(&self) -> BrushSettings {
        self.brush
    }

    pub fn text_settings(&self) -> &TextSettings {
        &self.text
    }

    pub fn is_pixel_mode(&self) -> bool {
        self.pixel_mode
    }

    /// The pixel grid while pixel mode is active.
    pub fn pixel_grid(&self) -> Option<&PixelGrid> {
        self.pixel_mode.then_some(&self.grid)
    }

    pub fn pixel_color(&self) -> Rgba {
        self.pixel_color
    }

    // --- Tools and settings ---

    /// Switch tools. Abandons any gesture and clears the selection.
    pub fn set_tool(&mut self, tool: Tool) {
        self.reset_gesture();
        self.add_pending_images();
        self.store.clear_selection();
        log::debug!("Tool: {}", tool.name());
        self.tool = tool;
    }

    pub fn set_color(&mut self, color: Rgba) {
        self.brush.color = color;
    }

    /// Set the tool size; values below 1 are clamped.
    pub fn set_size(&mut self, size: f64) {
        self.brush = BrushSettings::new(self.brush.color, size);
    }

    /// Text placed by the next text-tool click.
    pub fn set_text_content(&mut self, content: impl Into<String>) {
        self.text.content = content.into();
    }

    pub fn set_font_family(&mut self, family: impl Into<String>) {
        self.text.font_family = family.into();
    }

    pub fn set_font_size(&mut self, size: f64) {
        self.text.font_size = size.max(1.0);
    }

    fn reset_gesture(&mut self) {
        if !self.interaction.is_idle() {
            log::debug!("Abandoning {} gesture", self.interaction.name());
        }
        self.recorder.abandon();
        self.interaction = Interaction::Idle;
    }

    // --- Pointer input ---

    /// Pointer pressed at a canvas position.
    pub fn pointer_down(&mut self, point: Point) {
        if self.external_job {
            log::debug!("Ignoring pointer while an export is running");
            return;
        }
        if self.pixel_mode {
            self.paint_pixel(point);
            return;
        }
        if !self.interaction.is_idle() {
            // A press without a release: finish the old gesture first
            self.finish_gesture();
        }

        if let Some(selected) = self.store.selected_element() {
            let id = selected.id();
            let frame = selected.frame;
            match handles::hit_test_handles(&frame, point) {
                Some(HandleKind::Rotate) => {
                    self.interaction = Interaction::RotatingElement {
                        id,
                        grab_offset: handles::rotation_grab_offset(&frame, point),
                    };
                    return;
                }
                Some(HandleKind::Delete) => {
                    self.store.delete(id);
                    log::debug!("Deleted element {}", id);
                    self.commit();
                    return;
                }
                None => {}
            }
        }

        let hit = self.store.find_topmost_at(point);
        match hit {
            Some(id) if self.tool.manipulates_elements() => {
                self.store.select(Some(id));
                if self.tool == Tool::Resize {
                    self.interaction = Interaction::ResizingElement { id };
                } else if let Some(element) = self.store.get(id) {
                    let grab = point - Point::new(element.frame.x, element.frame.y);
                    self.interaction = Interaction::DraggingElement { id, grab };
                }
            }
            _ => {
                if hit.is_none() {
                    self.store.clear_selection();
                }
                if self.tool == Tool::Text {
                    self.place_text(point);
                } else if let Some(kind) = self.tool.stroke_kind() {
                    let handle = self.recorder.begin_stroke(kind, self.brush.color, self.brush.size, point);
                    self.interaction = Interaction::Drawing { handle };
                }
            }
        }
    }

    /// Pointer moved to a canvas position.
    pub fn pointer_move(&mut self, point: Point) {
        if self.pixel_mode {
            let cell = self.grid.cell_at(point);
            self.grid.set_hover(cell);
            return;
        }

        match self.interaction {
            Interaction::Idle => {}
            Interaction::Drawing { handle } => {
                let ops = self.recorder.extend_stroke(handle, point);
                for op in &ops {
                    self.surface.apply(op);
                }
                self.persist_log();
            }
            Interaction::DraggingElement { id, grab } => {
                let origin = point - grab;
                self.manipulate(id, &ElementPatch::position(origin.x, origin.y));
            }
            Interaction::ResizingElement { id } => {
                if let Some(element) = self.store.get(id) {
                    let patch = ElementPatch::size(point.x - element.frame.x, point.y - element.frame.y);
                    self.manipulate(id, &patch);
                }
            }
            Interaction::RotatingElement { id, grab_offset } => {
                if let Some(element) = self.store.get(id) {
                    let rotation = handles::rotation_for_pointer(&element.frame, point, grab_offset);
                    self.manipulate(id, &ElementPatch::rotation(rotation));
                }
            }
        }
    }

    fn manipulate(&mut self, id: ElementId, patch: &ElementPatch) {
        if !self.store.transform(id, patch) {
            log::debug!("Element {} vanished mid-gesture", id);
            self.interaction = Interaction::Idle;
        }
    }

    /// Pointer released. Commits whatever gesture was in progress.
    pub fn pointer_up(&mut self, _point: Point) {
        self.finish_gesture();
    }

    /// Pointer left the canvas. Ends the gesture and drops hover state.
    pub fn pointer_leave(&mut self) {
        self.finish_gesture();
        self.grid.set_hover(None);
    }

    fn finish_gesture(&mut self) {
        match std::mem::take(&mut self.interaction) {
            Interaction::Idle => {}
            Interaction::Drawing { handle } => {
                self.recorder.end_stroke(handle);
                self.commit();
            }
            Interaction::DraggingElement { .. }
            | Interaction::ResizingElement { .. }
            | Interaction::RotatingElement { .. } => {
                self.commit();
            }
        }
        self.add_pending_images();
    }

    /// Add images that arrived during the gesture as one history entry.
    fn add_pending_images(&mut self) {
        if self.pending_images.is_empty() {
            return;
        }
        for element in std::mem::take(&mut self.pending_images) {
            log::debug!("Adding deferred {} element", element.kind.name());
            self.store.add(element);
        }
        self.commit();
    }

    /// Mark the scene as replaced. Deferred images belong to the old scene.
    fn bump_generation(&mut self) {
        self.generation += 1;
        if !self.pending_images.is_empty() {
            log::info!("Discarding {} deferred image loads", self.pending_images.len());
            self.pending_images.clear();
        }
    }

    // --- Elements ---

    /// Append an element and commit.
    pub fn add_element(&mut self, element: Element) -> ElementId {
        log::debug!("Adding {} element", element.kind.name());
        let id = self.store.add(element);
        self.commit();
        id
    }

    /// Add an emoji centred on the canvas.
    pub fn add_emoji(&mut self, glyph: impl Into<String>) -> ElementId {
        let element = Element::emoji(glyph, self.width() as f64, self.height() as f64);
        self.add_element(element)
    }

    /// Add an uploaded image stretched over the canvas.
    pub fn add_uploaded_image(&mut self, source: ImageSource) -> ElementId {
        let element = self.image_element(source, &ImagePlacement::Upload);
        self.add_element(element)
    }

    /// Add a generated image, fitted and centred, tagged with its prompt.
    pub fn add_ai_generated_image(&mut self, source: ImageSource, prompt: &str) -> ElementId {
        let placement = ImagePlacement::Generated {
            prompt: prompt.to_string(),
        };
        let element = self.image_element(source, &placement);
        self.add_element(element)
    }

    fn image_element(&self, source: ImageSource, placement: &ImagePlacement) -> Element {
        let (width, height) = (self.width() as f64, self.height() as f64);
        match placement {
            ImagePlacement::Upload => {
                Element::new(ImageSource::upload_frame(width, height), ElementKind::Image(source))
            }
            ImagePlacement::Generated { prompt } => {
                let source = source.generated(prompt);
                let frame = source.generated_frame(width, height);
                Element::new(frame, ElementKind::Image(source))
            }
        }
    }

    /// Place the configured text at `point`. Empty text is a no-op.
    pub fn place_text(&mut self, point: Point) -> Option<ElementId> {
        if self.text.content.trim().is_empty() {
            log::debug!("No text to place");
            return None;
        }
        let content = std::mem::take(&mut self.text.content);
        let width = self.metrics.measure(&content, self.text.font_size);
        let frame = ElementFrame::new(point.x, point.y, width, self.text.font_size);

        self.recorder.record_text(TextStroke {
            x: point.x,
            y: point.y,
            font_family: self.text.font_family.clone(),
            font_size: self.text.font_size,
            color: self.brush.color,
            content: content.clone(),
        });
        let payload = TextPayload {
            content,
            font_family: self.text.font_family.clone(),
            font_size: self.text.font_size,
            color: self.brush.color,
        };
        Some(self.add_element(Element::new(frame, ElementKind::Text(payload))))
    }

    /// Select an element, or clear the selection.
    pub fn select(&mut self, id: Option<ElementId>) {
        self.store.select(id);
    }

    /// Delete an element and commit. Returns `false` if it did not exist.
    /// A gesture manipulating the element ends without a commit of its own.
    pub fn delete_element(&mut self, id: ElementId) -> bool {
        if self.interaction.element() == Some(id) {
            self.interaction = Interaction::Idle;
        }
        let removed = self.store.delete(id).is_some();
        if removed {
            self.commit();
        }
        removed
    }

    /// Transform an element and commit. Returns `false` if it did not exist.
    pub fn transform_element(&mut self, id: ElementId, patch: &ElementPatch) -> bool {
        let changed = self.store.transform(id, patch);
        if changed {
            self.commit();
        }
        changed
    }

    // --- Image loading ---

    /// Start loading an image; hand the ticket back with the bytes.
    pub fn begin_image_load(&self, placement: ImagePlacement) -> ImageLoadTicket {
        ImageLoadTicket {
            generation: self.generation,
            placement,
        }
    }

    /// Finish a load started with [`Self::begin_image_load`].
    ///
    /// Returns `None` when the scene was replaced in the meantime or the
    /// bytes do not decode; both cases are logged. If a gesture is in
    /// progress the element is added and committed when it ends.
    pub fn finish_image_load(&mut self, ticket: ImageLoadTicket, bytes: &[u8]) -> Option<ElementId> {
        if ticket.generation != self.generation {
            log::info!(
                "Discarding image load from generation {} (now {})",
                ticket.generation,
                self.generation
            );
            return None;
        }
        let source = match ImageSource::from_bytes(bytes) {
            Ok(source) => source,
            Err(e) => {
                log::warn!("Image load failed: {}", e);
                return None;
            }
        };
        let element = self.image_element(source, &ticket.placement);
        let id = element.id();
        if self.interaction.is_idle() {
            self.add_element(element);
        } else {
            log::debug!("Deferring image until the {} gesture ends", self.interaction.name());
            self.pending_images.push(element);
        }
        Some(id)
    }

    // --- Pixel mode ---

    /// Switch to pixel mode. The grid keeps whatever it held before.
    pub fn enable_pixel_mode(&mut self) {
        self.reset_gesture();
        self.add_pending_images();
        self.pixel_mode = true;
    }

    /// Back to free drawing. The grid is kept for the next time.
    pub fn disable_pixel_mode(&mut self) {
        self.grid.set_hover(None);
        self.pixel_mode = false;
    }

    pub fn set_pixel_color(&mut self, color: Rgba) {
        self.pixel_color = color;
    }

    /// Change the cell size (clamped to 8–50). Clears the grid.
    pub fn set_pixel_size(&mut self, size: u32) -> u32 {
        let applied = self.grid.resize(size);
        if self.pixel_mode {
            self.commit();
        }
        applied
    }

    fn step_pixel_size(&mut self, delta: i32) -> u32 {
        if self.grid.step_size(delta) && self.pixel_mode {
            self.commit();
        }
        self.grid.cell_size()
    }

    fn paint_pixel(&mut self, point: Point) {
        let Some((row, col)) = self.grid.cell_at(point) else {
            return;
        };
        if self.grid.set_cell(row, col, self.pixel_color) {
            self.commit();
        }
    }

    // --- History ---

    /// Snapshot the board into history. Returns `false` if the snapshot
    /// matched the current entry or the surface could not be encoded.
    pub fn commit(&mut self) -> bool {
        let ink = match self.surface.snapshot() {
            Ok(ink) => ink,
            Err(e) => {
                log::error!("Skipping history entry: {}", e);
                return false;
            }
        };
        let snapshot = Snapshot {
            ink,
            elements: self.store.elements().to_vec(),
            log: self.recorder.log().to_vec(),
            grid: self.pixel_mode.then(|| self.grid.cells().clone()),
        };
        let added = self.history.commit(snapshot);
        self.persist_log();
        added
    }

    /// Step back one entry. Returns `false` at the oldest entry.
    pub fn undo(&mut self) -> bool {
        self.reset_gesture();
        let Some(snapshot) = self.history.undo().cloned() else {
            log::debug!("Nothing to undo");
            return false;
        };
        self.restore(&snapshot);
        true
    }

    /// Step forward one entry. Returns `false` at the newest entry.
    pub fn redo(&mut self) -> bool {
        self.reset_gesture();
        let Some(snapshot) = self.history.redo().cloned() else {
            log::debug!("Nothing to redo");
            return false;
        };
        self.restore(&snapshot);
        true
    }

    /// Replace the board with a history entry. Pixel mode is not changed.
    pub fn restore(&mut self, snapshot: &Snapshot) {
        if let Err(e) = self.surface.restore(&snapshot.ink) {
            log::warn!("Ink surface not restored: {}", e);
        }
        self.store.replace(snapshot.elements.clone());
        self.recorder.replace_log(snapshot.log.clone());
        if self.pixel_mode {
            match &snapshot.grid {
                Some(cells) => self.grid.restore(cells.clone()),
                None => {
                    let size = self.grid.cell_size();
                    self.grid.resize(size);
                }
            }
        }
        self.bump_generation();
        self.persist_log();
    }

    /// Clear the board and commit.
    ///
    /// In pixel mode only the grid is cleared; otherwise the ink, elements
    /// and stroke log are.
    pub fn clear(&mut self) {
        self.reset_gesture();
        if self.pixel_mode {
            self.grid.clear();
        } else {
            self.surface.clear();
            self.store.clear();
            self.recorder.clear();
        }
        self.bump_generation();
        self.commit();
    }

    // --- Export ---

    /// The board as SVG: stroke log paths and text, or painted cells in
    /// pixel mode.
    pub fn to_svg(&self) -> String {
        svg::export_svg(self.width(), self.height(), self.recorder.log(), self.pixel_grid())
    }

    /// Size of [`Self::to_svg`] against the configured minting limits.
    pub fn svg_size_info(&self) -> SvgSizeInfo {
        SvgSizeInfo::measure(&self.to_svg(), self.config.svg_max_chars, self.config.svg_warning_chars)
    }

    /// Claim the board for an export. Fails while another export runs or a
    /// gesture is in flight.
    pub fn begin_external_job(&mut self) -> Result<(), BoardError> {
        if self.external_job || !self.interaction.is_idle() {
            return Err(BoardError::Busy);
        }
        self.external_job = true;
        Ok(())
    }

    /// Release the claim taken by [`Self::begin_external_job`].
    pub fn finish_external_job(&mut self) {
        self.external_job = false;
    }

    pub fn is_busy(&self) -> bool {
        self.external_job
    }

    // --- Keyboard ---

    /// Handle a key press. Returns `None` if no shortcut matched.
    pub fn handle_key(&mut self, key: &str, ctrl: bool, shift: bool) -> Option<KeyOutcome> {
        let action = ShortcutRegistry::resolve(key, ctrl, shift, self.pixel_mode)?;
        let outcome = match action {
            ShortcutAction::Undo => KeyOutcome::Undo(self.undo()),
            ShortcutAction::Redo => KeyOutcome::Redo(self.redo()),
            ShortcutAction::SvgSizeInfo => {
                let info = self.svg_size_info();
                log::info!("SVG size {} chars ({}%): {}", info.size, info.percentage, info.recommendation);
                KeyOutcome::SvgSize(info)
            }
            ShortcutAction::PixelSizeUp => KeyOutcome::PixelSize(self.step_pixel_size(PIXEL_SIZE_STEP)),
            ShortcutAction::PixelSizeDown => KeyOutcome::PixelSize(self.step_pixel_size(-PIXEL_SIZE_STEP)),
        };
        Some(outcome)
    }
}
