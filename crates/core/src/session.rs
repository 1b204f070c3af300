//! Editing session
//!
//! [`EditorSession`] owns every piece of editor state: the open document,
//! the scene graph, the undo log, the tool controller and the render
//! sequencer. All mutation goes through its methods, and every completed
//! user-level mutation records exactly one history snapshot.
//!
//! Failures are handled here: the scene and history are left untouched,
//! a notification is queued, and the error is returned to the caller.

use image::GenericImageView;
use pdf_engine::{LopdfEngine, OpenSource, PdfEngine, Rotation};

use crate::config::EditorConfig;
use crate::document::Document;
use crate::error::{EditorError, EditorResult};
use crate::export;
use crate::geometry::Point;
use crate::history::HistoryLog;
use crate::input::{KeyAction, KeyEvent, PointerEvent, PointerPhase};
use crate::notification::{Notification, NotificationCenter};
use crate::render::{PageRenderer, RenderSequencer, RenderTicket, RenderedPage};
use crate::scene::{Color, ObjectId, SceneGraph, SceneObject, ShapeKind, Style};
use crate::text_hit::PageText;
use crate::tools::{Cursor, ToolController, ToolMode, ToolOutcome, ToolSettings};

pub const PDF_MIME: &str = "application/pdf";

/// What happened to a finished render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderApplied {
    /// The page is now displayed. `new_page` is set when the scene was
    /// rebuilt for a different page rather than re-rendered in place.
    Applied { page: u32, new_page: bool },
    /// A newer request was issued before this one finished.
    Discarded,
}

pub struct EditorSession<E: PdfEngine = LopdfEngine> {
    engine: E,
    config: EditorConfig,
    document: Option<Document>,
    /// Ticket of the render currently on the canvas
    displayed: Option<RenderTicket>,
    scene: SceneGraph,
    history: HistoryLog,
    tools: ToolController,
    page_text: Option<PageText>,
    sequencer: RenderSequencer,
    notifications: NotificationCenter,
    editing: Option<ObjectId>,
}

impl Default for EditorSession<LopdfEngine> {
    fn default() -> Self {
        Self::new(LopdfEngine::new(), EditorConfig::default())
    }
}

impl<E: PdfEngine> EditorSession<E> {
    pub fn new(engine: E, config: EditorConfig) -> Self {
        Self {
            engine,
            history: HistoryLog::new(config.history_depth),
            tools: ToolController::new(ToolSettings::from(&config)),
            config,
            document: None,
            displayed: None,
            scene: SceneGraph::new(),
            page_text: None,
            sequencer: RenderSequencer::new(),
            notifications: NotificationCenter::new(),
            editing: None,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    pub fn page_text(&self) -> Option<&PageText> {
        self.page_text.as_ref()
    }

    /// Page number currently shown on the canvas.
    pub fn displayed_page(&self) -> Option<u32> {
        self.displayed.map(|t| t.page)
    }

    pub fn tool_mode(&self) -> ToolMode {
        self.tools.mode()
    }

    pub fn cursor(&self) -> Cursor {
        self.tools.cursor()
    }

    pub fn selection(&self) -> Option<ObjectId> {
        self.tools.selection()
    }

    pub fn pending_link_anchor(&self) -> Option<Point> {
        self.tools.link_anchor()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn is_editing_text(&self) -> bool {
        self.editing.is_some()
    }

    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        self.notifications.drain()
    }

    fn require_document(&self) -> EditorResult<&Document> {
        self.document.as_ref().ok_or(EditorError::NoDocument)
    }

    fn validation(&mut self, message: &str) -> EditorError {
        self.notifications.warn(message);
        EditorError::Validation(message.to_string())
    }

    /// Captures the scene after a completed mutation.
    fn record(&mut self) {
        match self.scene.serialize() {
            Ok(snapshot) => self.history.snapshot(snapshot),
            Err(err) => {
                tracing::warn!(error = %err, "failed to snapshot scene");
                self.notifications.warn("Change could not be added to undo history");
            }
        }
    }

    fn close_quietly(&mut self, handle: pdf_engine::DocumentHandle) {
        if let Err(err) = self.engine.close(handle) {
            tracing::warn!(error = %err, "failed to close document");
        }
    }

    // ---- document lifecycle ----

    /// Opens a PDF and displays its first page.
    ///
    /// Only `application/pdf` is accepted; the bytes are not sniffed. On
    /// failure the previously open document stays as it was.
    pub fn load_pdf(&mut self, bytes: Vec<u8>, mime_type: &str) -> EditorResult<()> {
        if mime_type != PDF_MIME {
            let err = EditorError::Load("Please upload a valid PDF file.".to_string());
            self.notifications.error(err.to_string());
            return Err(err);
        }

        match self.open_document(bytes) {
            Ok(page_count) => {
                tracing::info!(page_count, "document loaded");
                self.notifications.info(format!("Loaded document with {page_count} page(s)"));
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "document load failed");
                self.notifications.error(err.to_string());
                Err(err)
            }
        }
    }

    fn open_document(&mut self, bytes: Vec<u8>) -> EditorResult<u32> {
        let handle = self
            .engine
            .open(OpenSource::Bytes(bytes))
            .map_err(|e| EditorError::Load(e.to_string()))?;

        let page_count = match self.engine.page_count(handle) {
            Ok(count) if count > 0 => count,
            Ok(_) => {
                self.close_quietly(handle);
                return Err(EditorError::Load("document has no pages".to_string()));
            }
            Err(err) => {
                self.close_quietly(handle);
                return Err(EditorError::Load(err.to_string()));
            }
        };

        let document = Document::new(handle, page_count, &self.config);
        let ticket = self.sequencer.issue(1, document.zoom(), document.rotation());
        let rendered = match PageRenderer::render(&self.engine, handle, &ticket) {
            Ok(rendered) => rendered,
            Err(err) => {
                self.close_quietly(handle);
                return Err(err);
            }
        };

        if let Some(previous) = self.document.replace(document) {
            self.close_quietly(previous.handle());
        }
        self.displayed = None;
        self.editing = None;
        self.tools.activate(ToolMode::None, &mut self.scene);
        self.tools.cancel_link();
        self.apply_rendered(rendered);
        Ok(page_count)
    }

    // ---- rendering ----

    /// Issues a render request for the document's current view.
    pub fn begin_render(&mut self) -> EditorResult<RenderTicket> {
        let document = self.require_document()?;
        let (page, zoom, rotation) =
            (document.current_page(), document.zoom(), document.rotation());
        Ok(self.sequencer.issue(page, zoom, rotation))
    }

    /// Runs the engine for a ticket without touching session state.
    pub fn render_ticket(&self, ticket: &RenderTicket) -> EditorResult<RenderedPage> {
        let document = self.require_document()?;
        PageRenderer::render(&self.engine, document.handle(), ticket)
    }

    /// Applies a finished render.
    ///
    /// Results superseded by a newer ticket are dropped unless
    /// `discard_stale_renders` is off, in which case the last result to
    /// arrive wins. A failed render keeps the current page on screen and
    /// rolls the document view back to it.
    pub fn finish_render(
        &mut self,
        ticket: RenderTicket,
        result: EditorResult<RenderedPage>,
    ) -> EditorResult<RenderApplied> {
        if self.config.discard_stale_renders && !self.sequencer.is_current(&ticket) {
            tracing::debug!(
                token = ticket.token,
                latest = self.sequencer.latest(),
                page = ticket.page,
                "discarding stale render"
            );
            return Ok(RenderApplied::Discarded);
        }

        match result {
            Ok(rendered) => Ok(self.apply_rendered(rendered)),
            Err(err) => {
                tracing::warn!(page = ticket.page, error = %err, "page render failed");
                if let (Some(document), Some(shown)) = (self.document.as_mut(), self.displayed) {
                    document.restore_view(shown.page, shown.zoom, shown.rotation);
                }
                self.notifications.error(err.to_string());
                Err(err)
            }
        }
    }

    fn apply_rendered(&mut self, rendered: RenderedPage) -> RenderApplied {
        let page = rendered.ticket.page;
        let new_page = self.displayed_page() != Some(page);

        if new_page {
            self.scene.clear();
            self.history.reset();
            self.tools.reset_after_restore();
            self.editing = None;
        }
        self.scene.set_background(rendered.raster);
        self.page_text = Some(rendered.text);
        self.displayed = Some(rendered.ticket);
        // A re-render in place only swaps the view; undo keeps the shown raster
        if new_page {
            self.record();
        }

        tracing::debug!(page, new_page, "render applied");
        RenderApplied::Applied { page, new_page }
    }

    /// Renders the current view synchronously.
    pub fn render_current(&mut self) -> EditorResult<RenderApplied> {
        let ticket = self.begin_render()?;
        let result = self.render_ticket(&ticket);
        self.finish_render(ticket, result)
    }

    /// Moves to `page` and issues a render for it without running it.
    /// Returns `None` when the page is out of range or already current.
    pub fn request_page(&mut self, page: u32) -> EditorResult<Option<RenderTicket>> {
        let document = self.document.as_mut().ok_or(EditorError::NoDocument)?;
        if !document.go_to_page(page) {
            return Ok(None);
        }
        self.begin_render().map(Some)
    }

    fn change_view(&mut self, change: impl FnOnce(&mut Document) -> bool) -> EditorResult<bool> {
        let document = self.document.as_mut().ok_or(EditorError::NoDocument)?;
        if !change(document) {
            return Ok(false);
        }
        self.render_current()?;
        Ok(true)
    }

    pub fn next_page(&mut self) -> EditorResult<bool> {
        self.change_view(Document::next_page)
    }

    pub fn prev_page(&mut self) -> EditorResult<bool> {
        self.change_view(Document::prev_page)
    }

    pub fn go_to_page(&mut self, page: u32) -> EditorResult<bool> {
        self.change_view(|d| d.go_to_page(page))
    }

    pub fn zoom_in(&mut self) -> EditorResult<f32> {
        self.change_view(|d| {
            let before = d.zoom();
            d.zoom_in() != before
        })?;
        Ok(self.require_document()?.zoom())
    }

    pub fn zoom_out(&mut self) -> EditorResult<f32> {
        self.change_view(|d| {
            let before = d.zoom();
            d.zoom_out() != before
        })?;
        Ok(self.require_document()?.zoom())
    }

    pub fn rotate(&mut self) -> EditorResult<Rotation> {
        self.change_view(|d| {
            d.rotate();
            true
        })?;
        Ok(self.require_document()?.rotation())
    }

    // ---- tools and pointer input ----

    pub fn activate_tool(&mut self, mode: ToolMode) {
        self.tools.activate(mode, &mut self.scene);
    }

    pub fn toggle_tool(&mut self, mode: ToolMode) {
        self.tools.toggle(mode, &mut self.scene);
    }

    pub fn start_drawing_shape(&mut self, kind: ShapeKind) {
        self.activate_tool(ToolMode::DrawShape(kind));
    }

    /// Selects a selectable object, or clears the selection with `None`.
    pub fn select(&mut self, id: Option<ObjectId>) -> bool {
        match id {
            Some(id) if !self.scene.get(id).is_some_and(|o| o.selectable) => false,
            _ => {
                self.tools.select(id);
                true
            }
        }
    }

    fn on_canvas(&self, point: &Point) -> bool {
        self.scene.background().is_some_and(|bg| bg.bounds().contains(point))
    }

    /// Routes a pointer event to the active tool.
    ///
    /// Presses outside the page and events without a finite position are
    /// ignored.
    pub fn handle_pointer_event(&mut self, event: &PointerEvent) -> ToolOutcome {
        if self.document.is_none() {
            return ToolOutcome::Ignored;
        }
        if event.phase == PointerPhase::Down {
            match event.canvas_position() {
                Some(point) if self.on_canvas(&point) => {}
                _ => return ToolOutcome::Ignored,
            }
            self.editing = None;
        }

        let outcome =
            self.tools.handle_pointer_event(event, &mut self.scene, self.page_text.as_ref());
        if outcome.commits() {
            self.record();
        }
        outcome
    }

    /// Places a link at the anchor picked with the link tool.
    pub fn add_link(&mut self, text: &str, url: &str) -> EditorResult<ObjectId> {
        self.require_document()?;
        let (text, url) = (text.trim(), url.trim());
        if text.is_empty() || url.is_empty() {
            return Err(self.validation("Please enter both link text and URL"));
        }
        let Some(anchor) = self.tools.take_link_anchor() else {
            return Err(self.validation("Click on the page where the link should go"));
        };

        let id = self.scene.add(SceneObject::link(text, url, anchor));
        self.tools.select(Some(id));
        self.record();
        Ok(id)
    }

    pub fn cancel_link(&mut self) {
        self.tools.cancel_link();
    }

    /// Adds an uploaded image centered on the page, scaled so its longest
    /// side fits `max_image_size`.
    pub fn add_image(&mut self, bytes: &[u8], mime_type: &str) -> EditorResult<ObjectId> {
        let limit = self.config.max_image_size as f32;
        self.place_image(bytes, mime_type, |w, h| {
            let longest = w.max(h);
            if longest > limit {
                limit / longest
            } else {
                1.0
            }
        })
    }

    /// Adds a signature image centered on the page, narrowed to
    /// `max_signature_width`.
    pub fn add_signature_image(&mut self, bytes: &[u8], mime_type: &str) -> EditorResult<ObjectId> {
        let limit = self.config.max_signature_width as f32;
        self.place_image(bytes, mime_type, |w, _| if w > limit { limit / w } else { 1.0 })
    }

    fn place_image(
        &mut self,
        bytes: &[u8],
        mime_type: &str,
        scale_for: impl FnOnce(f32, f32) -> f32,
    ) -> EditorResult<ObjectId> {
        self.require_document()?;
        if !mime_type.starts_with("image/") {
            return Err(self.validation("Please choose an image file"));
        }
        let decoded = match image::load_from_memory(bytes) {
            Ok(decoded) => decoded,
            Err(err) => {
                let err = EditorError::Load(err.to_string());
                self.notifications.error(err.to_string());
                return Err(err);
            }
        };

        let (width, height) = decoded.dimensions();
        let scale = scale_for(width as f32, height as f32);
        let center = self
            .scene
            .background()
            .map(|bg| bg.bounds().center())
            .unwrap_or_default();
        let position = center.offset(-(width as f32) * scale / 2.0, -(height as f32) * scale / 2.0);

        let id = self.scene.add_image(decoded.to_rgba8(), position, scale);
        self.tools.select(Some(id));
        self.record();
        Ok(id)
    }

    /// Removes the selected object. Returns false if nothing was selected.
    pub fn delete_selected(&mut self) -> bool {
        let Some(id) = self.tools.selection() else {
            return false;
        };
        self.tools.select(None);
        self.editing = None;
        if self.scene.remove(id).is_none() {
            return false;
        }
        self.record();
        true
    }

    /// Restores the previous snapshot. Returns false at the first entry.
    ///
    /// Overlays come from the snapshot; the background stays the raster of
    /// the view currently displayed. If the snapshot cannot be restored the
    /// scene and the history cursor are left as they were.
    pub fn undo(&mut self) -> EditorResult<bool> {
        let Some(snapshot) = self.history.previous().cloned() else {
            return Ok(false);
        };
        let displayed = self.scene.background_layer();
        if let Err(err) = self.scene.restore(&snapshot) {
            tracing::warn!(error = %err, "failed to restore history entry");
            self.notifications.error("Undo failed");
            return Err(err.into());
        }
        self.history.undo();
        if let Some(layer) = displayed {
            self.scene.reinstall_background(layer);
        }
        self.tools.reset_after_restore();
        self.editing = None;
        tracing::debug!(cursor = ?self.history.cursor(), "undo applied");
        Ok(true)
    }

    pub fn handle_key_event(&mut self, event: &KeyEvent) -> EditorResult<Option<KeyAction>> {
        let Some(action) = event.action(self.editing.is_some()) else {
            return Ok(None);
        };
        match action {
            KeyAction::DeleteSelection => {
                self.delete_selected();
            }
            KeyAction::Undo => {
                self.undo()?;
            }
            KeyAction::PreviousPage if self.document.is_some() => {
                self.prev_page()?;
            }
            KeyAction::NextPage if self.document.is_some() => {
                self.next_page()?;
            }
            KeyAction::PreviousPage | KeyAction::NextPage => {}
        }
        Ok(Some(action))
    }

    // ---- text editing and formatting ----

    /// Enters in-place editing on the selected text-like object.
    pub fn begin_text_editing(&mut self) -> bool {
        let target = self
            .tools
            .selection()
            .filter(|id| self.scene.get(*id).is_some_and(SceneObject::is_text_like));
        self.editing = target;
        target.is_some()
    }

    /// Leaves editing mode, storing `content` into the edited object.
    pub fn commit_text(&mut self, content: &str) -> bool {
        let Some(id) = self.editing.take() else {
            return false;
        };
        let changed = match self.scene.get_mut(id) {
            Some(object) if object.text_content() != Some(content) => {
                object.set_text_content(content)
            }
            _ => false,
        };
        if changed {
            self.record();
        }
        changed
    }

    fn update_selected_style(&mut self, change: impl FnOnce(&mut Style)) -> bool {
        let Some(id) = self.tools.selection() else {
            return false;
        };
        let Some(object) = self.scene.get_mut(id).filter(|o| o.is_text_like()) else {
            return false;
        };
        change(&mut object.style);
        self.record();
        true
    }

    pub fn toggle_bold(&mut self) -> bool {
        self.update_selected_style(|s| s.font.bold = !s.font.bold)
    }

    pub fn toggle_italic(&mut self) -> bool {
        self.update_selected_style(|s| s.font.italic = !s.font.italic)
    }

    pub fn toggle_underline(&mut self) -> bool {
        self.update_selected_style(|s| s.font.underline = !s.font.underline)
    }

    pub fn set_font_size(&mut self, size: f32) -> EditorResult<bool> {
        if !(size.is_finite() && size > 0.0) {
            return Err(self.validation("Font size must be a positive number"));
        }
        Ok(self.update_selected_style(|s| s.font.size = size))
    }

    pub fn set_text_color(&mut self, color: Color) -> bool {
        self.update_selected_style(|s| s.fill = Some(color))
    }

    /// Colors used for annotations created from now on.
    pub fn set_annotation_colors(&mut self, text: Color, background: Color) {
        let settings = self.tools.settings_mut();
        settings.annotation_text = text;
        settings.annotation_background = background;
    }

    // ---- export ----

    /// Flattens the displayed page and its overlays into PNG bytes. The
    /// same image backs download, print and share.
    pub fn export_current_view_as_image(&self) -> EditorResult<Vec<u8>> {
        self.require_document()?;
        let image = export::compose(&self.scene)?;
        export::encode_png(&image)
    }
}
