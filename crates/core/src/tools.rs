//! Tool modes and pointer dispatch
//!
//! Exactly one mode is active at a time and every pointer event is routed
//! to that mode's handler only. Switching modes discards any half-finished
//! gesture (a shape being dragged out, a stroke being drawn) so that no
//! handler state leaks into the next mode.
//!
//! Text, annotation, link and signature tools are one-shot: they fall back
//! to [`ToolMode::None`] once their gesture completes. Shape drawing is
//! one-shot too unless `sticky_shapes` is set.

use serde::{Deserialize, Serialize};

use crate::config::EditorConfig;
use crate::geometry::Point;
use crate::input::{PointerEvent, PointerPhase};
use crate::scene::{
    Color, ObjectId, ObjectKind, SceneGraph, SceneObject, ShapeGeometry, ShapeKind, Style,
};
use crate::text_hit::{replace_with_editable, PageText, TextReplacement};

pub const DEFAULT_TEXT: &str = "Click to edit";
pub const DEFAULT_ANNOTATION: &str = "Add annotation...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", content = "shape", rename_all = "snake_case")]
pub enum ToolMode {
    /// Select and move objects, open links, pick page text
    #[default]
    None,
    AddText,
    AddLink,
    DrawShape(ShapeKind),
    Annotate,
    DrawSignature,
}

impl ToolMode {
    pub fn cursor(self) -> Cursor {
        match self {
            ToolMode::None => Cursor::Default,
            ToolMode::AddText => Cursor::Text,
            _ => Cursor::Crosshair,
        }
    }

    pub fn is_active(self) -> bool {
        self != ToolMode::None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cursor {
    #[default]
    Default,
    Text,
    Crosshair,
    /// Hovering a link
    Pointer,
    /// Hovering the selected link
    Move,
}

/// What a pointer event did to the scene.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    Ignored,
    Selected(Option<ObjectId>),
    Hovered(Option<ObjectId>),
    Added(ObjectId),
    /// The host should collect link text and URL for this anchor
    LinkRequested(Point),
    DraftStarted(ObjectId),
    DraftUpdated(ObjectId),
    ShapeCommitted(ObjectId),
    StrokeUpdated,
    StrokeCommitted(ObjectId),
    Dragged(ObjectId),
    Moved(ObjectId),
    /// A link was clicked; the host should open the URL
    OpenLink(String),
    TextReplaced(TextReplacement),
}

impl ToolOutcome {
    /// Whether the outcome completed a user-level mutation that belongs in
    /// the undo history.
    pub fn commits(&self) -> bool {
        matches!(
            self,
            ToolOutcome::Added(_)
                | ToolOutcome::ShapeCommitted(_)
                | ToolOutcome::StrokeCommitted(_)
                | ToolOutcome::Moved(_)
                | ToolOutcome::TextReplaced(_)
        )
    }
}

/// Defaults applied to objects created by the tools.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSettings {
    pub sticky_shapes: bool,
    pub link_click_ms: u64,
    pub hit_tolerance: f32,
    pub annotation_text: Color,
    pub annotation_background: Color,
}

impl From<&EditorConfig> for ToolSettings {
    fn from(config: &EditorConfig) -> Self {
        Self {
            sticky_shapes: config.sticky_shapes,
            link_click_ms: config.link_click_ms,
            hit_tolerance: config.hit_tolerance,
            annotation_text: config.annotation_text_color,
            annotation_background: config.annotation_background,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ShapeDraft {
    id: ObjectId,
    kind: ShapeKind,
    start: Point,
}

#[derive(Debug, Clone, Copy)]
struct DragState {
    id: ObjectId,
    last: Point,
    moved: bool,
    pressed_at: u64,
}

#[derive(Debug)]
pub struct ToolController {
    mode: ToolMode,
    cursor: Cursor,
    settings: ToolSettings,
    selection: Option<ObjectId>,
    hovered: Option<ObjectId>,
    drag: Option<DragState>,
    draft: Option<ShapeDraft>,
    stroke: Option<Vec<Point>>,
    link_anchor: Option<Point>,
}

impl ToolController {
    pub fn new(settings: ToolSettings) -> Self {
        Self {
            mode: ToolMode::None,
            cursor: Cursor::Default,
            settings,
            selection: None,
            hovered: None,
            drag: None,
            draft: None,
            stroke: None,
            link_anchor: None,
        }
    }

    pub fn mode(&self) -> ToolMode {
        self.mode
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn settings(&self) -> &ToolSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut ToolSettings {
        &mut self.settings
    }

    pub fn selection(&self) -> Option<ObjectId> {
        self.selection
    }

    pub fn select(&mut self, id: Option<ObjectId>) {
        self.selection = id;
    }

    pub fn hovered(&self) -> Option<ObjectId> {
        self.hovered
    }

    /// Whether a shape drag or signature stroke is in progress.
    pub fn has_pending_gesture(&self) -> bool {
        self.draft.is_some() || self.stroke.is_some()
    }

    pub fn link_anchor(&self) -> Option<Point> {
        self.link_anchor
    }

    pub fn take_link_anchor(&mut self) -> Option<Point> {
        self.link_anchor.take()
    }

    pub fn cancel_link(&mut self) {
        self.link_anchor = None;
    }

    /// Switches to `mode`, discarding any unfinished gesture of the
    /// previous mode. Activating the current mode is a no-op.
    pub fn activate(&mut self, mode: ToolMode, scene: &mut SceneGraph) {
        if self.mode == mode {
            return;
        }
        self.discard_gesture(scene);
        tracing::debug!(from = ?self.mode, to = ?mode, "tool mode changed");
        self.mode = mode;
        self.cursor = mode.cursor();
    }

    /// Activates `mode`, or returns to [`ToolMode::None`] if it is already
    /// active.
    pub fn toggle(&mut self, mode: ToolMode, scene: &mut SceneGraph) {
        let next = if self.mode == mode { ToolMode::None } else { mode };
        self.activate(next, scene);
    }

    /// Forgets selection and gesture state after the scene was replaced
    /// wholesale (undo or page change). The mode itself is kept.
    pub fn reset_after_restore(&mut self) {
        self.selection = None;
        self.hovered = None;
        self.drag = None;
        self.draft = None;
        self.stroke = None;
        self.cursor = self.mode.cursor();
    }

    fn discard_gesture(&mut self, scene: &mut SceneGraph) {
        if let Some(draft) = self.draft.take() {
            scene.remove(draft.id);
            if self.selection == Some(draft.id) {
                self.selection = None;
            }
            tracing::debug!(shape = ?draft.kind, "discarded unfinished shape");
        }
        self.stroke = None;
        self.drag = None;
    }

    fn finish_one_shot(&mut self) {
        self.mode = ToolMode::None;
        self.cursor = Cursor::Default;
    }

    pub fn handle_pointer_event(
        &mut self,
        event: &PointerEvent,
        scene: &mut SceneGraph,
        page_text: Option<&PageText>,
    ) -> ToolOutcome {
        let Some(point) = event.canvas_position() else {
            return ToolOutcome::Ignored;
        };

        match self.mode {
            ToolMode::None => self.handle_select(event, point, scene, page_text),
            ToolMode::AddText => self.handle_add_text(event.phase, point, scene),
            ToolMode::AddLink => self.handle_add_link(event.phase, point),
            ToolMode::DrawShape(kind) => self.handle_shape(event.phase, kind, point, scene),
            ToolMode::Annotate => self.handle_annotate(event.phase, point, scene),
            ToolMode::DrawSignature => self.handle_signature(event.phase, point, scene),
        }
    }

    fn handle_add_text(
        &mut self,
        phase: PointerPhase,
        point: Point,
        scene: &mut SceneGraph,
    ) -> ToolOutcome {
        if phase != PointerPhase::Down {
            return ToolOutcome::Ignored;
        }
        let id = scene.add(SceneObject::text(DEFAULT_TEXT, point, Style::text(20.0, Color::BLACK)));
        self.selection = Some(id);
        self.finish_one_shot();
        ToolOutcome::Added(id)
    }

    fn handle_annotate(
        &mut self,
        phase: PointerPhase,
        point: Point,
        scene: &mut SceneGraph,
    ) -> ToolOutcome {
        if phase != PointerPhase::Down {
            return ToolOutcome::Ignored;
        }
        let style =
            Style::annotation(self.settings.annotation_text, self.settings.annotation_background);
        let id = scene.add(SceneObject::annotation(DEFAULT_ANNOTATION, point, style));
        self.selection = Some(id);
        self.finish_one_shot();
        ToolOutcome::Added(id)
    }

    fn handle_add_link(&mut self, phase: PointerPhase, point: Point) -> ToolOutcome {
        if phase != PointerPhase::Down {
            return ToolOutcome::Ignored;
        }
        self.link_anchor = Some(point);
        self.finish_one_shot();
        ToolOutcome::LinkRequested(point)
    }

    fn handle_shape(
        &mut self,
        phase: PointerPhase,
        kind: ShapeKind,
        point: Point,
        scene: &mut SceneGraph,
    ) -> ToolOutcome {
        match (phase, self.draft) {
            (PointerPhase::Down, None) => {
                let (position, geometry) = ShapeGeometry::from_drag(kind, point, point);
                let id = scene.add(SceneObject::shape(geometry, position));
                self.draft = Some(ShapeDraft { id, kind, start: point });
                ToolOutcome::DraftStarted(id)
            }
            (PointerPhase::Move, Some(draft)) => {
                Self::fit_draft(&draft, point, scene);
                ToolOutcome::DraftUpdated(draft.id)
            }
            (PointerPhase::Up, Some(draft)) => {
                Self::fit_draft(&draft, point, scene);
                self.draft = None;
                self.selection = Some(draft.id);
                if !self.settings.sticky_shapes {
                    self.finish_one_shot();
                }
                ToolOutcome::ShapeCommitted(draft.id)
            }
            _ => ToolOutcome::Ignored,
        }
    }

    fn fit_draft(draft: &ShapeDraft, point: Point, scene: &mut SceneGraph) {
        let (position, geometry) = ShapeGeometry::from_drag(draft.kind, draft.start, point);
        if let Some(object) = scene.get_mut(draft.id) {
            object.position = position;
            object.kind = ObjectKind::Shape { geometry };
        }
    }

    fn handle_signature(
        &mut self,
        phase: PointerPhase,
        point: Point,
        scene: &mut SceneGraph,
    ) -> ToolOutcome {
        match phase {
            PointerPhase::Down => {
                self.stroke = Some(vec![point]);
                ToolOutcome::StrokeUpdated
            }
            PointerPhase::Move => match self.stroke.as_mut() {
                Some(points) => {
                    points.push(point);
                    ToolOutcome::StrokeUpdated
                }
                None => ToolOutcome::Ignored,
            },
            PointerPhase::Up => {
                let Some(mut points) = self.stroke.take() else {
                    return ToolOutcome::Ignored;
                };
                if points.last() != Some(&point) {
                    points.push(point);
                }
                let id = scene.add(SceneObject::signature_stroke(points));
                self.finish_one_shot();
                ToolOutcome::StrokeCommitted(id)
            }
        }
    }

    fn handle_select(
        &mut self,
        event: &PointerEvent,
        point: Point,
        scene: &mut SceneGraph,
        page_text: Option<&PageText>,
    ) -> ToolOutcome {
        match event.phase {
            PointerPhase::Down => {
                if let Some(target) = scene.query_at(&point, self.settings.hit_tolerance) {
                    let id = target.id;
                    self.selection = Some(id);
                    self.drag = Some(DragState {
                        id,
                        last: point,
                        moved: false,
                        pressed_at: event.timestamp_ms,
                    });
                    return ToolOutcome::Selected(Some(id));
                }

                if let Some(hit) = page_text.and_then(|text| text.hit(&point)) {
                    let replacement = replace_with_editable(scene, &hit);
                    self.selection = Some(replacement.added);
                    return ToolOutcome::TextReplaced(replacement);
                }

                self.selection = None;
                ToolOutcome::Selected(None)
            }
            PointerPhase::Move => match self.drag.as_mut() {
                Some(drag) => {
                    let (dx, dy) = (point.x - drag.last.x, point.y - drag.last.y);
                    if dx != 0.0 || dy != 0.0 {
                        scene.translate(drag.id, dx, dy);
                        drag.last = point;
                        drag.moved = true;
                    }
                    ToolOutcome::Dragged(drag.id)
                }
                None => self.update_hover(point, scene),
            },
            PointerPhase::Up => {
                let Some(drag) = self.drag.take() else {
                    return ToolOutcome::Ignored;
                };
                let (dx, dy) = (point.x - drag.last.x, point.y - drag.last.y);
                if dx != 0.0 || dy != 0.0 {
                    scene.translate(drag.id, dx, dy);
                    return ToolOutcome::Moved(drag.id);
                }
                if drag.moved {
                    return ToolOutcome::Moved(drag.id);
                }

                let elapsed = event.timestamp_ms.saturating_sub(drag.pressed_at);
                match scene.get(drag.id).and_then(SceneObject::link_url) {
                    Some(url) if elapsed < self.settings.link_click_ms => {
                        tracing::debug!(%url, elapsed, "link clicked");
                        ToolOutcome::OpenLink(url.to_string())
                    }
                    _ => ToolOutcome::Ignored,
                }
            }
        }
    }

    fn update_hover(&mut self, point: Point, scene: &SceneGraph) -> ToolOutcome {
        let hovered = scene
            .query_at(&point, self.settings.hit_tolerance)
            .filter(|o| o.link_url().is_some())
            .map(|o| o.id);

        self.cursor = match hovered {
            Some(id) if self.selection == Some(id) => Cursor::Move,
            Some(_) => Cursor::Pointer,
            None => Cursor::Default,
        };

        if hovered == self.hovered {
            return ToolOutcome::Ignored;
        }
        self.hovered = hovered;
        ToolOutcome::Hovered(hovered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> ToolController {
        ToolController::new(ToolSettings::from(&EditorConfig::default()))
    }

    fn shape_of(scene: &SceneGraph, id: ObjectId) -> (Point, ShapeGeometry) {
        let object = scene.get(id).unwrap();
        match object.kind {
            ObjectKind::Shape { geometry } => (object.position, geometry),
            ref other => panic!("not a shape: {other:?}"),
        }
    }

    #[test]
    fn test_modes_are_exclusive() {
        let mut tools = controller();
        let mut scene = SceneGraph::new();

        tools.activate(ToolMode::AddText, &mut scene);
        assert_eq!(tools.mode(), ToolMode::AddText);
        assert_eq!(tools.cursor(), Cursor::Text);

        tools.activate(ToolMode::DrawShape(ShapeKind::Circle), &mut scene);
        assert_eq!(tools.mode(), ToolMode::DrawShape(ShapeKind::Circle));
        assert_eq!(tools.cursor(), Cursor::Crosshair);

        // A click now draws, it does not add text
        tools.handle_pointer_event(&PointerEvent::down(5.0, 5.0), &mut scene, None);
        assert!(scene.text_objects_with_content(DEFAULT_TEXT).is_empty());
    }

    #[test]
    fn test_toggle_returns_to_none() {
        let mut tools = controller();
        let mut scene = SceneGraph::new();
        tools.toggle(ToolMode::Annotate, &mut scene);
        assert_eq!(tools.mode(), ToolMode::Annotate);
        tools.toggle(ToolMode::Annotate, &mut scene);
        assert_eq!(tools.mode(), ToolMode::None);
        assert_eq!(tools.cursor(), Cursor::Default);
    }

    #[test]
    fn test_add_text_is_one_shot() {
        let mut tools = controller();
        let mut scene = SceneGraph::new();
        tools.activate(ToolMode::AddText, &mut scene);

        let outcome = tools.handle_pointer_event(&PointerEvent::down(40.0, 60.0), &mut scene, None);
        let ToolOutcome::Added(id) = outcome else { panic!("unexpected {outcome:?}") };
        let object = scene.get(id).unwrap();
        assert_eq!(object.text_content(), Some(DEFAULT_TEXT));
        assert_eq!(object.position, Point::new(40.0, 60.0));
        assert_eq!(object.style.font.size, 20.0);
        assert_eq!(tools.mode(), ToolMode::None);
        assert_eq!(tools.selection(), Some(id));
    }

    #[test]
    fn test_annotation_uses_configured_colors() {
        let mut config = EditorConfig::default();
        config.annotation_background = Color::rgb(0xff, 0xf4, 0xb8);
        let mut tools = ToolController::new(ToolSettings::from(&config));
        let mut scene = SceneGraph::new();
        tools.activate(ToolMode::Annotate, &mut scene);

        let ToolOutcome::Added(id) =
            tools.handle_pointer_event(&PointerEvent::down(1.0, 2.0), &mut scene, None)
        else {
            panic!("annotation not added");
        };
        let style = &scene.get(id).unwrap().style;
        assert_eq!(style.background, Some(Color::rgb(0xff, 0xf4, 0xb8)));
        assert_eq!(style.padding, 10.0);
        assert_eq!(style.stroke, Some(Color::ANNOTATION_BORDER));
    }

    #[test]
    fn test_add_link_requests_details() {
        let mut tools = controller();
        let mut scene = SceneGraph::new();
        tools.activate(ToolMode::AddLink, &mut scene);

        let outcome = tools.handle_pointer_event(&PointerEvent::down(12.0, 34.0), &mut scene, None);
        assert_eq!(outcome, ToolOutcome::LinkRequested(Point::new(12.0, 34.0)));
        assert_eq!(tools.link_anchor(), Some(Point::new(12.0, 34.0)));
        assert!(scene.is_empty());
        assert_eq!(tools.mode(), ToolMode::None);
    }

    #[test]
    fn test_rectangle_drag_commits_on_release() {
        let mut tools = controller();
        let mut scene = SceneGraph::new();
        tools.activate(ToolMode::DrawShape(ShapeKind::Rectangle), &mut scene);

        let ToolOutcome::DraftStarted(id) =
            tools.handle_pointer_event(&PointerEvent::down(10.0, 10.0), &mut scene, None)
        else {
            panic!("no draft");
        };
        let drag = PointerEvent::moved(30.0, 20.0);
        assert!(!tools.handle_pointer_event(&drag, &mut scene, None).commits());
        let outcome = tools.handle_pointer_event(&PointerEvent::up(50.0, 40.0), &mut scene, None);

        assert_eq!(outcome, ToolOutcome::ShapeCommitted(id));
        assert!(outcome.commits());
        assert_eq!(
            shape_of(&scene, id),
            (Point::new(10.0, 10.0), ShapeGeometry::Rectangle { width: 40.0, height: 30.0 })
        );
        assert_eq!(tools.mode(), ToolMode::None);
    }

    #[test]
    fn test_sticky_shapes_keep_mode() {
        let config = EditorConfig::default().with_sticky_shapes(true);
        let mut tools = ToolController::new(ToolSettings::from(&config));
        let mut scene = SceneGraph::new();
        tools.activate(ToolMode::DrawShape(ShapeKind::Line), &mut scene);

        tools.handle_pointer_event(&PointerEvent::down(0.0, 0.0), &mut scene, None);
        tools.handle_pointer_event(&PointerEvent::up(10.0, 10.0), &mut scene, None);
        assert_eq!(tools.mode(), ToolMode::DrawShape(ShapeKind::Line));

        tools.handle_pointer_event(&PointerEvent::down(20.0, 0.0), &mut scene, None);
        tools.handle_pointer_event(&PointerEvent::up(30.0, 10.0), &mut scene, None);
        assert_eq!(scene.len(), 2);
    }

    #[test]
    fn test_switching_mode_mid_drag_discards_draft() {
        let mut tools = controller();
        let mut scene = SceneGraph::new();
        tools.activate(ToolMode::DrawShape(ShapeKind::Ellipse), &mut scene);
        tools.handle_pointer_event(&PointerEvent::down(0.0, 0.0), &mut scene, None);
        assert_eq!(scene.len(), 1);
        assert!(tools.has_pending_gesture());

        tools.activate(ToolMode::AddText, &mut scene);
        assert!(scene.is_empty());
        assert!(!tools.has_pending_gesture());

        // The release lands on the text tool and is ignored there
        let outcome = tools.handle_pointer_event(&PointerEvent::up(20.0, 20.0), &mut scene, None);
        assert_eq!(outcome, ToolOutcome::Ignored);
    }

    #[test]
    fn test_signature_ends_on_first_release() {
        let mut tools = controller();
        let mut scene = SceneGraph::new();
        tools.activate(ToolMode::DrawSignature, &mut scene);

        tools.handle_pointer_event(&PointerEvent::down(0.0, 0.0), &mut scene, None);
        tools.handle_pointer_event(&PointerEvent::moved(5.0, 2.0), &mut scene, None);
        let ToolOutcome::StrokeCommitted(id) =
            tools.handle_pointer_event(&PointerEvent::up(9.0, 4.0), &mut scene, None)
        else {
            panic!("stroke not committed");
        };

        match &scene.get(id).unwrap().kind {
            ObjectKind::SignatureStroke { points } => assert_eq!(points.len(), 3),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(tools.mode(), ToolMode::None);
    }

    #[test]
    fn test_missing_position_is_ignored() {
        let mut tools = controller();
        let mut scene = SceneGraph::new();
        tools.activate(ToolMode::AddText, &mut scene);
        let event = PointerEvent { phase: PointerPhase::Down, position: None, timestamp_ms: 0 };
        assert_eq!(tools.handle_pointer_event(&event, &mut scene, None), ToolOutcome::Ignored);
        assert!(scene.is_empty());
        assert_eq!(tools.mode(), ToolMode::AddText);
    }

    #[test]
    fn test_non_finite_positions_do_not_move_objects() {
        let mut tools = controller();
        let mut scene = SceneGraph::new();
        let id = scene.add(SceneObject::text("Note", Point::new(10.0, 10.0), Style::default()));

        tools.handle_pointer_event(&PointerEvent::down(15.0, 15.0), &mut scene, None);
        let moved =
            tools.handle_pointer_event(&PointerEvent::moved(f32::NAN, 20.0), &mut scene, None);
        let release = PointerEvent::up(f32::INFINITY, f32::NAN);
        let released = tools.handle_pointer_event(&release, &mut scene, None);

        assert_eq!(moved, ToolOutcome::Ignored);
        assert_eq!(released, ToolOutcome::Ignored);
        assert_eq!(scene.get(id).unwrap().position, Point::new(10.0, 10.0));
    }

    #[test]
    fn test_quick_link_click_opens_url() {
        let mut tools = controller();
        let mut scene = SceneGraph::new();
        scene.add(SceneObject::link("Site", "https://example.com", Point::new(10.0, 10.0)));

        tools.handle_pointer_event(&PointerEvent::down(15.0, 15.0).at(1_000), &mut scene, None);
        let outcome =
            tools.handle_pointer_event(&PointerEvent::up(15.0, 15.0).at(1_120), &mut scene, None);
        assert_eq!(outcome, ToolOutcome::OpenLink("https://example.com".to_string()));

        // A slow press only selects
        tools.handle_pointer_event(&PointerEvent::down(15.0, 15.0).at(2_000), &mut scene, None);
        let outcome =
            tools.handle_pointer_event(&PointerEvent::up(15.0, 15.0).at(2_500), &mut scene, None);
        assert_eq!(outcome, ToolOutcome::Ignored);
    }

    #[test]
    fn test_dragging_link_moves_instead_of_opening() {
        let mut tools = controller();
        let mut scene = SceneGraph::new();
        let id =
            scene.add(SceneObject::link("Site", "https://example.com", Point::new(10.0, 10.0)));

        tools.handle_pointer_event(&PointerEvent::down(15.0, 15.0), &mut scene, None);
        tools.handle_pointer_event(&PointerEvent::moved(25.0, 20.0), &mut scene, None);
        let outcome = tools.handle_pointer_event(&PointerEvent::up(25.0, 20.0), &mut scene, None);

        assert_eq!(outcome, ToolOutcome::Moved(id));
        assert_eq!(scene.get(id).unwrap().position, Point::new(20.0, 15.0));
    }

    #[test]
    fn test_hover_over_link_changes_cursor() {
        let mut tools = controller();
        let mut scene = SceneGraph::new();
        let id =
            scene.add(SceneObject::link("Site", "https://example.com", Point::new(10.0, 10.0)));

        assert_eq!(
            tools.handle_pointer_event(&PointerEvent::moved(15.0, 15.0), &mut scene, None),
            ToolOutcome::Hovered(Some(id))
        );
        assert_eq!(tools.cursor(), Cursor::Pointer);

        tools.handle_pointer_event(&PointerEvent::moved(500.0, 500.0), &mut scene, None);
        assert_eq!(tools.cursor(), Cursor::Default);
        assert_eq!(tools.hovered(), None);
    }

    #[test]
    fn test_click_on_empty_space_clears_selection() {
        let mut tools = controller();
        let mut scene = SceneGraph::new();
        let style = Style::text(20.0, Color::BLACK);
        let id = scene.add(SceneObject::text("x", Point::new(0.0, 0.0), style));
        tools.select(Some(id));

        let outcome =
            tools.handle_pointer_event(&PointerEvent::down(400.0, 400.0), &mut scene, None);
        assert_eq!(outcome, ToolOutcome::Selected(None));
        assert_eq!(tools.selection(), None);
    }
}
