//! Flattening the scene into a PNG
//!
//! Objects are painted back to front onto a canvas the size of the page
//! background. Glyphs are not rasterized; text-like objects contribute
//! their background box, border and underline only.

use std::io::Cursor;

use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, Rgba};
use pdf_engine::RgbaImage;

use crate::error::{EditorError, EditorResult};
use crate::geometry::{Point, Rect};
use crate::scene::{Color, ObjectKind, SceneGraph, SceneObject, ShapeGeometry};

/// Paints every object of `scene` into a new raster.
pub fn compose(scene: &SceneGraph) -> EditorResult<RgbaImage> {
    let background = scene
        .background()
        .ok_or_else(|| EditorError::Export("scene has no page background".to_string()))?;
    let bounds = background.bounds();
    let mut canvas = RgbaImage::from_pixel(
        bounds.width.max(1.0) as u32,
        bounds.height.max(1.0) as u32,
        Rgba([255, 255, 255, 255]),
    );

    for object in scene.objects() {
        paint_object(&mut canvas, scene, object);
    }
    Ok(canvas)
}

/// Encodes a raster as PNG bytes.
pub fn encode_png(image: &RgbaImage) -> EditorResult<Vec<u8>> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(image.clone())
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| EditorError::Export(e.to_string()))?;
    Ok(bytes)
}

fn paint_object(canvas: &mut RgbaImage, scene: &SceneGraph, object: &SceneObject) {
    let style = &object.style;
    match &object.kind {
        ObjectKind::Background { raster, .. } => {
            if let Some(image) = scene.raster(*raster) {
                let (x, y) = (object.position.x as i64, object.position.y as i64);
                imageops::overlay(canvas, &**image, x, y);
            }
        }
        ObjectKind::Image { raster, width, height, scale } => {
            let Some(image) = scene.raster(*raster) else {
                return;
            };
            let w = ((*width as f32) * scale).round().max(1.0) as u32;
            let h = ((*height as f32) * scale).round().max(1.0) as u32;
            let scaled = imageops::resize(&**image, w, h, FilterType::Triangle);
            let (x, y) = (object.position.x.round() as i64, object.position.y.round() as i64);
            imageops::overlay(canvas, &scaled, x, y);
        }
        ObjectKind::Text { .. } | ObjectKind::Annotation { .. } | ObjectKind::Link { .. } => {
            let bounds = object.bounds();
            if let Some(background) = style.background {
                fill_rect(canvas, &bounds, background);
            }
            if let Some(stroke) = style.stroke {
                stroke_rect(canvas, &bounds, stroke, style.stroke_width);
            }
            if style.font.underline {
                let color = style.fill.unwrap_or(Color::BLACK);
                let inner = bounds.inflate(-style.padding);
                let y = inner.bottom() - 1.0;
                let (start, end) = (Point::new(inner.left, y), Point::new(inner.right(), y));
                stroke_segment(canvas, start, end, color, 1.0);
            }
        }
        ObjectKind::Shape { geometry } => paint_shape(canvas, object.position, geometry, object),
        ObjectKind::SignatureStroke { points } => {
            let color = style.stroke.unwrap_or(Color::BLACK);
            match points.as_slice() {
                [only] => stroke_segment(canvas, *only, *only, color, style.stroke_width),
                _ => {
                    for w in points.windows(2) {
                        stroke_segment(canvas, w[0], w[1], color, style.stroke_width);
                    }
                }
            }
        }
    }
}

fn paint_shape(
    canvas: &mut RgbaImage,
    position: Point,
    geometry: &ShapeGeometry,
    object: &SceneObject,
) {
    let style = &object.style;
    let bounds = object.bounds();
    let fill = style.fill.filter(|c| !c.is_transparent());
    let stroke = style.stroke.filter(|c| !c.is_transparent());

    match *geometry {
        ShapeGeometry::Rectangle { .. } => {
            if let Some(fill) = fill {
                fill_rect(canvas, &bounds, fill);
            }
            if let Some(stroke) = stroke {
                stroke_rect(canvas, &bounds, stroke, style.stroke_width);
            }
        }
        ShapeGeometry::Triangle { .. } => {
            let apex = Point::new(bounds.center().x, bounds.top);
            let right = Point::new(bounds.right(), bounds.bottom());
            let left = Point::new(bounds.left, bounds.bottom());
            if let Some(fill) = fill {
                fill_where(canvas, &bounds, fill, |p| in_triangle(p, apex, right, left));
            }
            if let Some(stroke) = stroke {
                for (a, b) in [(apex, right), (right, left), (left, apex)] {
                    stroke_segment(canvas, a, b, stroke, style.stroke_width);
                }
            }
        }
        ShapeGeometry::Circle { radius } => {
            paint_ellipse(canvas, &bounds, radius, radius, fill, stroke, style.stroke_width)
        }
        ShapeGeometry::Ellipse { rx, ry } => {
            paint_ellipse(canvas, &bounds, rx, ry, fill, stroke, style.stroke_width)
        }
        ShapeGeometry::Line { end } => {
            if let Some(stroke) = stroke {
                stroke_segment(canvas, position, end, stroke, style.stroke_width);
            }
        }
    }
}

fn paint_ellipse(
    canvas: &mut RgbaImage,
    bounds: &Rect,
    rx: f32,
    ry: f32,
    fill: Option<Color>,
    stroke: Option<Color>,
    stroke_width: f32,
) {
    let center = bounds.center();
    if let Some(fill) = fill {
        if rx > 0.0 && ry > 0.0 {
            fill_where(canvas, bounds, fill, |p| {
                let nx = (p.x - center.x) / rx;
                let ny = (p.y - center.y) / ry;
                nx * nx + ny * ny <= 1.0
            });
        }
    }
    if let Some(stroke) = stroke {
        let circumference = std::f32::consts::TAU * rx.max(ry);
        let steps = (circumference.ceil() as usize).clamp(8, 4096);
        let at = |i: usize| {
            let t = i as f32 / steps as f32 * std::f32::consts::TAU;
            Point::new(center.x + rx * t.cos(), center.y + ry * t.sin())
        };
        for i in 0..steps {
            stroke_segment(canvas, at(i), at(i + 1), stroke, stroke_width);
        }
    }
}

fn in_triangle(p: Point, a: Point, b: Point, c: Point) -> bool {
    let sign = |p1: Point, p2: Point, p3: Point| {
        (p1.x - p3.x) * (p2.y - p3.y) - (p2.x - p3.x) * (p1.y - p3.y)
    };
    let d1 = sign(p, a, b);
    let d2 = sign(p, b, c);
    let d3 = sign(p, c, a);
    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}

/// Blends `color` over the pixel at (x, y) if it is on the canvas.
fn blend(canvas: &mut RgbaImage, x: i64, y: i64, color: Color) {
    if x < 0 || y < 0 || x >= canvas.width() as i64 || y >= canvas.height() as i64 {
        return;
    }
    let pixel = canvas.get_pixel_mut(x as u32, y as u32);
    let alpha = color.a as f32 / 255.0;
    let src = [color.r, color.g, color.b];
    for (channel, value) in pixel.0.iter_mut().take(3).zip(src) {
        *channel = (value as f32 * alpha + *channel as f32 * (1.0 - alpha)).round() as u8;
    }
    pixel.0[3] = pixel.0[3].max(color.a);
}

fn fill_where<F: Fn(Point) -> bool>(
    canvas: &mut RgbaImage,
    bounds: &Rect,
    color: Color,
    inside: F,
) {
    // Only pixels on the canvas are visited; `as` saturates non-finite edges
    let x0 = (bounds.left.floor() as i64).max(0);
    let y0 = (bounds.top.floor() as i64).max(0);
    let x1 = (bounds.right().ceil() as i64).min(i64::from(canvas.width()));
    let y1 = (bounds.bottom().ceil() as i64).min(i64::from(canvas.height()));
    for y in y0..y1 {
        for x in x0..x1 {
            if inside(Point::new(x as f32 + 0.5, y as f32 + 0.5)) {
                blend(canvas, x, y, color);
            }
        }
    }
}

fn fill_rect(canvas: &mut RgbaImage, bounds: &Rect, color: Color) {
    fill_where(canvas, bounds, color, |p| bounds.contains(&p));
}

fn stroke_rect(canvas: &mut RgbaImage, bounds: &Rect, color: Color, width: f32) {
    let tl = Point::new(bounds.left, bounds.top);
    let tr = Point::new(bounds.right(), bounds.top);
    let br = Point::new(bounds.right(), bounds.bottom());
    let bl = Point::new(bounds.left, bounds.bottom());
    for (a, b) in [(tl, tr), (tr, br), (br, bl), (bl, tl)] {
        stroke_segment(canvas, a, b, color, width);
    }
}

/// Paints every pixel whose center lies within `width / 2` of the segment.
fn stroke_segment(canvas: &mut RgbaImage, a: Point, b: Point, color: Color, width: f32) {
    let reach = (width / 2.0).max(0.5);
    let area = Rect::from_corners(a, b).inflate(reach);
    fill_where(canvas, &area, color, |p| p.distance_to_segment(&a, &b) <= reach);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{SceneObject, Style};

    fn white_page(scene: &mut SceneGraph, width: u32, height: u32) {
        scene.set_background(RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255])));
    }

    #[test]
    fn test_compose_requires_background() {
        assert!(matches!(compose(&SceneGraph::new()), Err(EditorError::Export(_))));
    }

    #[test]
    fn test_rectangle_outline_is_painted() {
        let mut scene = SceneGraph::new();
        white_page(&mut scene, 100, 100);
        let geometry = ShapeGeometry::Rectangle { width: 40.0, height: 30.0 };
        scene.add(SceneObject::shape(geometry, Point::new(10.0, 10.0)));

        let image = compose(&scene).unwrap();
        assert_eq!(image.dimensions(), (100, 100));
        assert_eq!(image.get_pixel(10, 20), &Rgba([0, 0, 0, 255]));
        // Unfilled interior stays white
        assert_eq!(image.get_pixel(30, 25), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_annotation_background_is_painted() {
        let mut scene = SceneGraph::new();
        white_page(&mut scene, 200, 100);
        let style = Style::annotation(Color::BLACK, Color::rgb(0xff, 0xeb, 0x3b));
        scene.add(SceneObject::annotation("Note", Point::new(40.0, 40.0), style));

        let image = compose(&scene).unwrap();
        assert_eq!(image.get_pixel(50, 45), &Rgba([0xff, 0xeb, 0x3b, 255]));
    }

    #[test]
    fn test_image_is_scaled_into_place() {
        let mut scene = SceneGraph::new();
        white_page(&mut scene, 100, 100);
        let red = RgbaImage::from_pixel(40, 40, Rgba([255, 0, 0, 255]));
        scene.add_image(red, Point::new(20.0, 20.0), 0.5);

        let image = compose(&scene).unwrap();
        assert_eq!(image.get_pixel(30, 30), &Rgba([255, 0, 0, 255]));
        assert_eq!(image.get_pixel(45, 45), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_off_canvas_geometry_is_clipped() {
        let mut scene = SceneGraph::new();
        white_page(&mut scene, 100, 100);
        let end = Point::new(1.0e7, 1.0e7);
        scene.add(SceneObject::shape(ShapeGeometry::Line { end }, Point::new(10.0, 10.0)));
        scene.add(SceneObject::shape(
            ShapeGeometry::Rectangle { width: 40.0, height: 40.0 },
            Point::new(-1.0e7, -20.0),
        ));

        let image = compose(&scene).unwrap();
        assert_eq!(image.dimensions(), (100, 100));
        assert_eq!(image.get_pixel(50, 50), &Rgba([0, 0, 0, 255]));
        assert_eq!(image.get_pixel(80, 20), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_png_signature() {
        let mut scene = SceneGraph::new();
        white_page(&mut scene, 8, 8);
        let bytes = encode_png(&compose(&scene).unwrap()).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }
}
