//! Mapping canvas clicks onto the page's own text
//!
//! Each extracted text item is projected into canvas space through the
//! viewport transform. A click inside an item's padded box replaces that
//! run with an editable text object.

use pdf_engine::{TextItem, Viewport};

use crate::geometry::{Point, Rect};
use crate::scene::{Color, ObjectId, SceneGraph, SceneObject, Style};

/// Text items of the displayed page with the viewport they were placed in.
#[derive(Debug, Clone)]
pub struct PageText {
    pub items: Vec<TextItem>,
    pub viewport: Viewport,
}

impl PageText {
    pub fn new(items: Vec<TextItem>, viewport: Viewport) -> Self {
        Self { items, viewport }
    }

    /// Canvas placement of every item, in content order.
    pub fn placements(&self) -> impl Iterator<Item = TextPlacement> + '_ {
        self.items.iter().map(|item| TextPlacement::new(item, &self.viewport))
    }

    /// First item whose hit box contains `point`.
    pub fn hit(&self, point: &Point) -> Option<TextHit> {
        self.placements()
            .zip(self.items.iter())
            .find(|(placement, _)| placement.hit_box.contains(point))
            .map(|(placement, item)| TextHit { text: item.text.clone(), placement })
    }
}

/// A text item projected onto the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextPlacement {
    /// Baseline origin
    pub origin: Point,
    pub font_size: f32,
    pub hit_box: Rect,
}

impl TextPlacement {
    pub fn new(item: &TextItem, viewport: &Viewport) -> Self {
        let transform = viewport.transform.multiply(&item.transform);
        let origin = Point::new(transform.e, transform.f);
        let font_size = transform.scale_factor();
        let pad = font_size / 2.0;

        let width = item
            .width
            .map(|w| w * viewport.scale)
            .unwrap_or(font_size * item.text.chars().count() as f32);

        let hit_box = Rect::new(
            origin.x - pad,
            origin.y - font_size - pad,
            width + pad * 2.0,
            font_size + pad * 2.0,
        );

        Self { origin, font_size, hit_box }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextHit {
    pub text: String,
    pub placement: TextPlacement,
}

impl TextHit {
    /// Editable object covering the original run.
    pub fn editable_object(&self) -> SceneObject {
        let mut style = Style::text(self.placement.font_size, Color::BLACK);
        style.background = Some(Color::new(255, 255, 255, 204));
        SceneObject::text(
            self.text.clone(),
            self.placement.origin.offset(0.0, -self.placement.font_size),
            style,
        )
    }
}

/// Outcome of replacing a page text run.
#[derive(Debug, Clone, PartialEq)]
pub struct TextReplacement {
    pub added: ObjectId,
    pub removed: Vec<ObjectId>,
}

/// Removes every text-like object already carrying the hit's text, then
/// adds a fresh editable object for it.
pub fn replace_with_editable(scene: &mut SceneGraph, hit: &TextHit) -> TextReplacement {
    let removed = scene.text_objects_with_content(&hit.text);
    for id in &removed {
        scene.remove(*id);
    }
    let added = scene.add(hit.editable_object());
    tracing::debug!(
        text = %hit.text,
        removed = removed.len(),
        "replaced page text with editable object"
    );
    TextReplacement { added, removed }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdf_engine::{Matrix, Rotation};

    fn item(text: &str, size: f32, x: f32, y: f32) -> TextItem {
        TextItem {
            text: text.to_string(),
            transform: Matrix::new(size, 0.0, 0.0, size, x, y),
            width: None,
            font_size: size,
        }
    }

    fn identity_page(items: Vec<TextItem>) -> PageText {
        let mut viewport = Viewport::new([0.0, 0.0, 612.0, 792.0], 1.0, Rotation::Deg0);
        viewport.transform = Matrix::IDENTITY;
        PageText::new(items, viewport)
    }

    #[test]
    fn test_hit_box_around_baseline() {
        let page = identity_page(vec![item("Hello", 20.0, 100.0, 200.0)]);
        let placement = page.placements().next().unwrap();
        assert_eq!(placement.origin, Point::new(100.0, 200.0));
        assert_eq!(placement.font_size, 20.0);
        assert_eq!(placement.hit_box, Rect::new(90.0, 170.0, 120.0, 40.0));
    }

    #[test]
    fn test_measured_width_bounds_hit_box() {
        let mut measured = item("Hello", 20.0, 100.0, 200.0);
        measured.width = Some(30.0);
        let page = identity_page(vec![measured]);

        let placement = page.placements().next().unwrap();
        assert_eq!(placement.hit_box, Rect::new(90.0, 170.0, 50.0, 40.0));
        // Inside the estimated box, outside the measured one
        assert!(page.hit(&Point::new(150.0, 190.0)).is_none());
        assert!(page.hit(&Point::new(135.0, 190.0)).is_some());
    }

    #[test]
    fn test_click_inside_and_outside() {
        let page = identity_page(vec![item("Hello", 20.0, 100.0, 200.0)]);
        let hit = page.hit(&Point::new(105.0, 190.0)).unwrap();
        assert_eq!(hit.text, "Hello");
        assert!(page.hit(&Point::new(300.0, 300.0)).is_none());
    }

    #[test]
    fn test_viewport_flip_is_applied() {
        // Baseline at y=700 in PDF space lands near the top of the canvas
        let page = PageText::new(
            vec![item("Top", 12.0, 72.0, 700.0)],
            Viewport::new([0.0, 0.0, 612.0, 792.0], 1.0, Rotation::Deg0),
        );
        let placement = page.placements().next().unwrap();
        assert!((placement.origin.x - 72.0).abs() < 1e-3);
        assert!((placement.origin.y - 92.0).abs() < 1e-3);
        assert!((placement.font_size - 12.0).abs() < 1e-3);
    }

    #[test]
    fn test_editable_object_position() {
        let page = identity_page(vec![item("Hello", 20.0, 100.0, 200.0)]);
        let object = page.hit(&Point::new(105.0, 190.0)).unwrap().editable_object();
        assert_eq!(object.position, Point::new(100.0, 180.0));
        assert_eq!(object.style.font.size, 20.0);
        assert_eq!(object.style.font.family, "Arial");
        assert_eq!(object.text_content(), Some("Hello"));
    }

    #[test]
    fn test_replace_removes_duplicates() {
        let page = identity_page(vec![item("Hello", 20.0, 100.0, 200.0)]);
        let hit = page.hit(&Point::new(105.0, 190.0)).unwrap();
        let mut scene = SceneGraph::new();

        let first = replace_with_editable(&mut scene, &hit);
        assert!(first.removed.is_empty());

        let second = replace_with_editable(&mut scene, &hit);
        assert_eq!(second.removed, vec![first.added]);
        assert_eq!(scene.text_objects_with_content("Hello"), vec![second.added]);
    }
}
