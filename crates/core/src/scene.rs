//! Scene graph of the editable canvas
//!
//! The graph is an ordered list of objects painted back to front. After a
//! page has been rendered the first object is always the page background;
//! everything after it is an overlay added by the user.
//!
//! Raster pixels live in a side table keyed by [`RasterId`] so that the
//! serialized form of the graph stays small while snapshots still carry the
//! images they reference.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use pdf_engine::RgbaImage;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::{Point, Rect};
use crate::history::HistorySnapshot;

/// Stable identity of a scene object, preserved across snapshot restore.
pub type ObjectId = Uuid;

/// Key of a raster stored beside the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RasterId(Uuid);

impl RasterId {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

/// RGBA color, serialized as `#rrggbb` or `#rrggbbaa`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0, a: 255 };
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255, a: 255 };
    pub const LINK_BLUE: Color = Color { r: 0x00, g: 0x66, b: 0xcc, a: 255 };
    pub const ANNOTATION_BORDER: Color = Color { r: 0xff, g: 0xd6, b: 0x00, a: 255 };

    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parses `#rgb`, `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(hex: &str) -> Option<Color> {
        let digits = hex.trim().strip_prefix('#')?;
        if !digits.is_ascii() {
            return None;
        }
        let byte = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
        match digits.len() {
            3 => {
                let nibble =
                    |i: usize| u8::from_str_radix(&digits[i..i + 1], 16).ok().map(|v| v * 17);
                Some(Color::rgb(nibble(0)?, nibble(1)?, nibble(2)?))
            }
            6 => Some(Color::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Some(Color::new(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => None,
        }
    }

    pub fn is_transparent(&self) -> bool {
        self.a == 0
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)?;
        if self.a != 255 {
            write!(f, "{:02x}", self.a)?;
        }
        Ok(())
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Color::from_hex(s).ok_or_else(|| format!("invalid color '{s}'"))
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontStyle {
    pub family: String,
    pub size: f32,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

impl Default for FontStyle {
    fn default() -> Self {
        Self {
            family: "Arial".to_string(),
            size: 20.0,
            bold: false,
            italic: false,
            underline: false,
        }
    }
}

/// Paint attributes shared by every object kind.
///
/// For text-like objects `fill` is the glyph color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Style {
    pub fill: Option<Color>,
    pub stroke: Option<Color>,
    pub stroke_width: f32,
    pub background: Option<Color>,
    pub padding: f32,
    pub font: FontStyle,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            fill: None,
            stroke: None,
            stroke_width: 0.0,
            background: None,
            padding: 0.0,
            font: FontStyle::default(),
        }
    }
}

impl Style {
    /// Plain editable text.
    pub fn text(size: f32, color: Color) -> Self {
        Self {
            fill: Some(color),
            font: FontStyle { size, ..FontStyle::default() },
            ..Self::default()
        }
    }

    pub fn link() -> Self {
        let mut style = Self::text(16.0, Color::LINK_BLUE);
        style.font.underline = true;
        style
    }

    /// Sticky-note text on a filled, bordered box.
    pub fn annotation(text: Color, background: Color) -> Self {
        Self {
            stroke: Some(Color::ANNOTATION_BORDER),
            stroke_width: 1.0,
            background: Some(background),
            padding: 10.0,
            ..Self::text(16.0, text)
        }
    }

    /// Black, unfilled outline used for drawn shapes.
    pub fn outline() -> Self {
        Self { stroke: Some(Color::BLACK), stroke_width: 2.0, ..Self::default() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    Rectangle,
    Circle,
    Ellipse,
    Triangle,
    Line,
}

impl FromStr for ShapeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rectangle" | "rect" => Ok(ShapeKind::Rectangle),
            "circle" => Ok(ShapeKind::Circle),
            "ellipse" => Ok(ShapeKind::Ellipse),
            "triangle" => Ok(ShapeKind::Triangle),
            "line" => Ok(ShapeKind::Line),
            other => Err(format!("unknown shape '{other}'")),
        }
    }
}

/// Extent of a shape relative to its object position.
///
/// Box shapes are anchored at their top-left corner. A line starts at the
/// object position and ends at `end`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShapeGeometry {
    Rectangle { width: f32, height: f32 },
    Triangle { width: f32, height: f32 },
    Circle { radius: f32 },
    Ellipse { rx: f32, ry: f32 },
    Line { end: Point },
}

impl ShapeGeometry {
    pub fn kind(&self) -> ShapeKind {
        match self {
            ShapeGeometry::Rectangle { .. } => ShapeKind::Rectangle,
            ShapeGeometry::Triangle { .. } => ShapeKind::Triangle,
            ShapeGeometry::Circle { .. } => ShapeKind::Circle,
            ShapeGeometry::Ellipse { .. } => ShapeKind::Ellipse,
            ShapeGeometry::Line { .. } => ShapeKind::Line,
        }
    }

    /// Fits a shape of `kind` to a drag from `start` to `current`,
    /// returning the object position and geometry.
    pub fn from_drag(kind: ShapeKind, start: Point, current: Point) -> (Point, ShapeGeometry) {
        let dx = current.x - start.x;
        let dy = current.y - start.y;
        let corner = Point::new(start.x.min(current.x), start.y.min(current.y));

        match kind {
            ShapeKind::Rectangle => {
                (corner, ShapeGeometry::Rectangle { width: dx.abs(), height: dy.abs() })
            }
            ShapeKind::Triangle => {
                (corner, ShapeGeometry::Triangle { width: dx.abs(), height: dy.abs() })
            }
            ShapeKind::Ellipse => {
                (corner, ShapeGeometry::Ellipse { rx: dx.abs() / 2.0, ry: dy.abs() / 2.0 })
            }
            ShapeKind::Circle => {
                // Centered on the press point
                let radius = dx.hypot(dy) / 2.0;
                (start.offset(-radius, -radius), ShapeGeometry::Circle { radius })
            }
            ShapeKind::Line => (start, ShapeGeometry::Line { end: current }),
        }
    }

    fn bounds(&self, position: Point) -> Rect {
        match *self {
            ShapeGeometry::Rectangle { width, height }
            | ShapeGeometry::Triangle { width, height } => {
                Rect::new(position.x, position.y, width, height)
            }
            ShapeGeometry::Circle { radius } => {
                Rect::new(position.x, position.y, radius * 2.0, radius * 2.0)
            }
            ShapeGeometry::Ellipse { rx, ry } => {
                Rect::new(position.x, position.y, rx * 2.0, ry * 2.0)
            }
            ShapeGeometry::Line { end } => Rect::from_corners(position, end),
        }
    }
}

/// Payload of a scene object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ObjectKind {
    /// Rasterized PDF page
    Background { raster: RasterId, width: u32, height: u32 },
    Text { content: String },
    Shape { geometry: ShapeGeometry },
    Image { raster: RasterId, width: u32, height: u32, scale: f32 },
    Annotation { content: String },
    Link { text: String, url: String },
    /// Freehand polyline in canvas coordinates
    SignatureStroke { points: Vec<Point> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub id: ObjectId,
    pub kind: ObjectKind,
    /// Top-left anchor (start point for lines and strokes)
    pub position: Point,
    pub style: Style,
    pub selectable: bool,
}

impl SceneObject {
    pub fn new(kind: ObjectKind, position: Point, style: Style) -> Self {
        Self { id: Uuid::new_v4(), kind, position, style, selectable: true }
    }

    pub fn text(content: impl Into<String>, position: Point, style: Style) -> Self {
        Self::new(ObjectKind::Text { content: content.into() }, position, style)
    }

    pub fn annotation(content: impl Into<String>, position: Point, style: Style) -> Self {
        Self::new(ObjectKind::Annotation { content: content.into() }, position, style)
    }

    pub fn link(text: impl Into<String>, url: impl Into<String>, position: Point) -> Self {
        Self::new(ObjectKind::Link { text: text.into(), url: url.into() }, position, Style::link())
    }

    pub fn shape(geometry: ShapeGeometry, position: Point) -> Self {
        Self::new(ObjectKind::Shape { geometry }, position, Style::outline())
    }

    pub fn signature_stroke(points: Vec<Point>) -> Self {
        let position = points.first().copied().unwrap_or_default();
        Self::new(
            ObjectKind::SignatureStroke { points },
            position,
            Style { stroke: Some(Color::BLACK), stroke_width: 2.0, ..Style::default() },
        )
    }

    pub fn is_background(&self) -> bool {
        matches!(self.kind, ObjectKind::Background { .. })
    }

    /// Text, annotation and link objects carry editable text.
    pub fn is_text_like(&self) -> bool {
        self.text_content().is_some()
    }

    pub fn text_content(&self) -> Option<&str> {
        match &self.kind {
            ObjectKind::Text { content } | ObjectKind::Annotation { content } => Some(content),
            ObjectKind::Link { text, .. } => Some(text),
            _ => None,
        }
    }

    /// Replaces the text of a text-like object. Returns false for other kinds.
    pub fn set_text_content(&mut self, value: impl Into<String>) -> bool {
        match &mut self.kind {
            ObjectKind::Text { content } | ObjectKind::Annotation { content } => {
                *content = value.into();
                true
            }
            ObjectKind::Link { text, .. } => {
                *text = value.into();
                true
            }
            _ => false,
        }
    }

    pub fn link_url(&self) -> Option<&str> {
        match &self.kind {
            ObjectKind::Link { url, .. } => Some(url),
            _ => None,
        }
    }

    /// Canvas-space box of the object.
    ///
    /// Text extents are estimated from character count and font size since
    /// no glyph metrics are available.
    pub fn bounds(&self) -> Rect {
        match &self.kind {
            ObjectKind::Background { width, height, .. } => {
                Rect::new(self.position.x, self.position.y, *width as f32, *height as f32)
            }
            ObjectKind::Text { content } | ObjectKind::Annotation { content } => {
                self.text_bounds(content)
            }
            ObjectKind::Link { text, .. } => self.text_bounds(text),
            ObjectKind::Shape { geometry } => geometry.bounds(self.position),
            ObjectKind::Image { width, height, scale, .. } => Rect::new(
                self.position.x,
                self.position.y,
                *width as f32 * scale,
                *height as f32 * scale,
            ),
            ObjectKind::SignatureStroke { points } => {
                let origin = Rect::new(self.position.x, self.position.y, 0.0, 0.0);
                Rect::bounding(points).unwrap_or(origin)
            }
        }
    }

    fn text_bounds(&self, content: &str) -> Rect {
        let size = self.style.font.size;
        let longest = content.lines().map(|l| l.chars().count()).max().unwrap_or(0);
        let lines = content.lines().count().max(1);
        let (width, height) = (longest as f32 * size * 0.6, lines as f32 * size * 1.16);
        Rect::new(self.position.x, self.position.y, width, height).inflate(self.style.padding)
    }

    /// Whether `point` lands on the object, with `tolerance` extra reach for
    /// lines and strokes.
    pub fn contains(&self, point: &Point, tolerance: f32) -> bool {
        let reach = (self.style.stroke_width / 2.0).max(tolerance);
        match &self.kind {
            ObjectKind::Shape { geometry: ShapeGeometry::Line { end } } => {
                point.distance_to_segment(&self.position, end) <= reach
            }
            ObjectKind::SignatureStroke { points } => match points.as_slice() {
                [] => false,
                [only] => point.distance_to(only) <= reach,
                _ => points.windows(2).any(|w| point.distance_to_segment(&w[0], &w[1]) <= reach),
            },
            _ => self.bounds().contains(point),
        }
    }

    /// Moves the object by a canvas-space delta.
    pub fn translate(&mut self, dx: f32, dy: f32) {
        self.position = self.position.offset(dx, dy);
        match &mut self.kind {
            ObjectKind::Shape { geometry: ShapeGeometry::Line { end } } => {
                *end = end.offset(dx, dy);
            }
            ObjectKind::SignatureStroke { points } => {
                for p in points.iter_mut() {
                    *p = p.offset(dx, dy);
                }
            }
            _ => {}
        }
    }

    fn raster(&self) -> Option<RasterId> {
        match self.kind {
            ObjectKind::Background { raster, .. } | ObjectKind::Image { raster, .. } => {
                Some(raster)
            }
            _ => None,
        }
    }
}

/// Ordered, back-to-front list of canvas objects plus their rasters.
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    objects: Vec<SceneObject>,
    rasters: HashMap<RasterId, Arc<RgbaImage>>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn background(&self) -> Option<&SceneObject> {
        self.objects.first().filter(|o| o.is_background())
    }

    /// Every object except the page background.
    pub fn overlays(&self) -> impl Iterator<Item = &SceneObject> {
        self.objects.iter().filter(|o| !o.is_background())
    }

    pub fn get(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        self.objects.iter_mut().find(|o| o.id == id)
    }

    pub fn raster(&self, id: RasterId) -> Option<&Arc<RgbaImage>> {
        self.rasters.get(&id)
    }

    pub fn insert_raster(&mut self, image: RgbaImage) -> RasterId {
        let id = RasterId::generate();
        self.rasters.insert(id, Arc::new(image));
        id
    }

    /// Appends an object on top of the stack.
    pub fn add(&mut self, object: SceneObject) -> ObjectId {
        let id = object.id;
        self.objects.push(object);
        id
    }

    /// Adds an image object referencing a newly stored raster.
    pub fn add_image(&mut self, image: RgbaImage, position: Point, scale: f32) -> ObjectId {
        let (width, height) = image.dimensions();
        let raster = self.insert_raster(image);
        self.add(SceneObject::new(
            ObjectKind::Image { raster, width, height, scale },
            position,
            Style::default(),
        ))
    }

    /// Installs `image` as the non-selectable bottom-most object, replacing
    /// any previous background.
    pub fn set_background(&mut self, image: RgbaImage) -> ObjectId {
        let (width, height) = image.dimensions();
        let raster = self.insert_raster(image);
        let mut object = SceneObject::new(
            ObjectKind::Background { raster, width, height },
            Point::default(),
            Style::default(),
        );
        object.selectable = false;
        let id = object.id;
        self.put_background(object);
        id
    }

    /// Detached copy of the background object and the raster it shows.
    pub fn background_layer(&self) -> Option<(SceneObject, Arc<RgbaImage>)> {
        let object = self.background()?;
        match object.kind {
            ObjectKind::Background { raster, .. } => {
                Some((object.clone(), self.raster(raster)?.clone()))
            }
            _ => None,
        }
    }

    /// Puts back a layer taken with [`SceneGraph::background_layer`],
    /// replacing whatever background is installed.
    pub fn reinstall_background(&mut self, (object, image): (SceneObject, Arc<RgbaImage>)) {
        if let ObjectKind::Background { raster, .. } = object.kind {
            self.rasters.insert(raster, image);
            self.put_background(object);
        }
    }

    fn put_background(&mut self, object: SceneObject) {
        match self.objects.first_mut() {
            Some(first) if first.is_background() => *first = object,
            _ => self.objects.insert(0, object),
        }
        self.prune_rasters();
    }

    /// Removes an object by identity. Unknown ids are a no-op.
    pub fn remove(&mut self, id: ObjectId) -> Option<SceneObject> {
        let index = self.objects.iter().position(|o| o.id == id)?;
        let removed = self.objects.remove(index);
        self.prune_rasters();
        Some(removed)
    }

    pub fn clear(&mut self) {
        self.objects.clear();
        self.rasters.clear();
    }

    /// Moves an object by a delta. Returns false if the id is unknown.
    pub fn translate(&mut self, id: ObjectId, dx: f32, dy: f32) -> bool {
        match self.get_mut(id) {
            Some(object) => {
                object.translate(dx, dy);
                true
            }
            None => false,
        }
    }

    /// Topmost selectable object under `point`.
    pub fn query_at(&self, point: &Point, tolerance: f32) -> Option<&SceneObject> {
        self.objects.iter().rev().find(|o| o.selectable && o.contains(point, tolerance))
    }

    /// Ids of text-like objects whose text equals `content` exactly.
    pub fn text_objects_with_content(&self, content: &str) -> Vec<ObjectId> {
        self.objects
            .iter()
            .filter(|o| o.text_content() == Some(content))
            .map(|o| o.id)
            .collect()
    }

    /// Captures the full graph, including referenced rasters.
    pub fn serialize(&self) -> Result<HistorySnapshot, serde_json::Error> {
        let payload = serde_json::to_string(&self.objects)?;
        Ok(HistorySnapshot::new(payload, self.rasters.clone()))
    }

    /// Replaces the graph with the contents of a snapshot.
    ///
    /// On error the graph is left unchanged.
    pub fn restore(&mut self, snapshot: &HistorySnapshot) -> Result<(), serde_json::Error> {
        let objects: Vec<SceneObject> = serde_json::from_str(snapshot.payload())?;
        self.objects = objects;
        self.rasters = snapshot.rasters().clone();
        self.prune_rasters();
        Ok(())
    }

    fn prune_rasters(&mut self) {
        let live: Vec<RasterId> = self.objects.iter().filter_map(SceneObject::raster).collect();
        self.rasters.retain(|id, _| live.contains(id));
    }
}
