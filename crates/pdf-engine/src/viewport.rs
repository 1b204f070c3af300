//! Page viewport geometry
//!
//! Maps PDF user space (origin bottom-left, y up) onto canvas pixels
//! (origin top-left, y down) for a given scale and rotation.

/// Six-element affine transform `[a b c d e f]`.
///
/// Points map as `x' = a*x + c*y + e`, `y' = b*x + d*y + f`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix { a: 1.0, b: 0.0, c: 0.0, d: 1.0, e: 0.0, f: 0.0 };

    pub fn new(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub fn translation(tx: f32, ty: f32) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    pub fn scaling(sx: f32, sy: f32) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// Compose so that `other` is applied first and `self` second.
    pub fn multiply(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            e: self.a * other.e + self.c * other.f + self.e,
            f: self.b * other.e + self.d * other.f + self.f,
        }
    }

    /// Map a point through this transform
    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (self.a * x + self.c * y + self.e, self.b * x + self.d * y + self.f)
    }

    /// Length of the transformed x unit vector.
    ///
    /// For a text rendering matrix this is the effective font size.
    pub fn scale_factor(&self) -> f32 {
        self.a.hypot(self.b)
    }

    pub fn as_array(&self) -> [f32; 6] {
        [self.a, self.b, self.c, self.d, self.e, self.f]
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<[f32; 6]> for Matrix {
    fn from(m: [f32; 6]) -> Self {
        Self::new(m[0], m[1], m[2], m[3], m[4], m[5])
    }
}

/// Clockwise page rotation in quarter turns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub fn degrees(self) -> u16 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    /// Normalizes any multiple of 90 (negative values included).
    pub fn from_degrees(degrees: i32) -> Option<Self> {
        if degrees % 90 != 0 {
            return None;
        }
        match degrees.rem_euclid(360) {
            0 => Some(Rotation::Deg0),
            90 => Some(Rotation::Deg90),
            180 => Some(Rotation::Deg180),
            _ => Some(Rotation::Deg270),
        }
    }

    /// Next quarter turn clockwise (270 wraps to 0)
    pub fn rotated(self) -> Self {
        match self {
            Rotation::Deg0 => Rotation::Deg90,
            Rotation::Deg90 => Rotation::Deg180,
            Rotation::Deg180 => Rotation::Deg270,
            Rotation::Deg270 => Rotation::Deg0,
        }
    }

    /// Whether width and height trade places
    pub fn is_sideways(self) -> bool {
        matches!(self, Rotation::Deg90 | Rotation::Deg270)
    }
}

/// Canvas viewport for one page at a given scale and rotation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Canvas width in pixels
    pub width: f32,

    /// Canvas height in pixels
    pub height: f32,

    pub scale: f32,

    pub rotation: Rotation,

    /// PDF user space to canvas pixels
    pub transform: Matrix,
}

impl Viewport {
    /// Build the viewport for a page box `[x0, y0, x1, y1]`.
    pub fn new(view_box: [f32; 4], scale: f32, rotation: Rotation) -> Self {
        let [x0, y0, x1, y1] = view_box;
        let center_x = (x0 + x1) / 2.0;
        let center_y = (y0 + y1) / 2.0;

        let (rotate_a, rotate_b, rotate_c, rotate_d) = match rotation {
            Rotation::Deg0 => (1.0, 0.0, 0.0, -1.0),
            Rotation::Deg90 => (0.0, 1.0, 1.0, 0.0),
            Rotation::Deg180 => (-1.0, 0.0, 0.0, 1.0),
            Rotation::Deg270 => (0.0, -1.0, -1.0, 0.0),
        };

        let (offset_x, offset_y, width, height) = if rotation.is_sideways() {
            (
                (center_y - y0).abs() * scale,
                (center_x - x0).abs() * scale,
                (y1 - y0).abs() * scale,
                (x1 - x0).abs() * scale,
            )
        } else {
            (
                (center_x - x0).abs() * scale,
                (center_y - y0).abs() * scale,
                (x1 - x0).abs() * scale,
                (y1 - y0).abs() * scale,
            )
        };

        let transform = Matrix::new(
            rotate_a * scale,
            rotate_b * scale,
            rotate_c * scale,
            rotate_d * scale,
            offset_x - rotate_a * scale * center_x - rotate_c * scale * center_y,
            offset_y - rotate_b * scale * center_x - rotate_d * scale * center_y,
        );

        Self { width, height, scale, rotation, transform }
    }

    /// Map a PDF user-space point to canvas pixels
    pub fn to_canvas(&self, x: f32, y: f32) -> (f32, f32) {
        self.transform.apply(x, y)
    }

    /// Raster size in whole pixels (at least 1x1)
    pub fn pixel_size(&self) -> (u32, u32) {
        (self.width.round().max(1.0) as u32, self.height.round().max(1.0) as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LETTER: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

    fn approx(a: (f32, f32), b: (f32, f32)) -> bool {
        (a.0 - b.0).abs() < 1e-3 && (a.1 - b.1).abs() < 1e-3
    }

    #[test]
    fn test_multiply_applies_right_operand_first() {
        let translate = Matrix::translation(10.0, 0.0);
        let scale = Matrix::scaling(2.0, 2.0);

        // scale, then translate
        assert_eq!(translate.multiply(&scale).apply(1.0, 1.0), (12.0, 2.0));
        // translate, then scale
        assert_eq!(scale.multiply(&translate).apply(1.0, 1.0), (22.0, 2.0));
    }

    #[test]
    fn test_scale_factor() {
        let m = Matrix::new(12.0, 16.0, -16.0, 12.0, 0.0, 0.0);
        assert!((m.scale_factor() - 20.0).abs() < 1e-4);
    }

    #[test]
    fn test_rotation_from_degrees() {
        assert_eq!(Rotation::from_degrees(0), Some(Rotation::Deg0));
        assert_eq!(Rotation::from_degrees(450), Some(Rotation::Deg90));
        assert_eq!(Rotation::from_degrees(-90), Some(Rotation::Deg270));
        assert_eq!(Rotation::from_degrees(45), None);
        assert_eq!(Rotation::Deg270.rotated(), Rotation::Deg0);
    }

    #[test]
    fn test_unrotated_viewport_flips_y() {
        let viewport = Viewport::new(LETTER, 1.5, Rotation::Deg0);
        assert_eq!(viewport.width, 918.0);
        assert_eq!(viewport.height, 1188.0);
        assert!(approx(viewport.to_canvas(0.0, 792.0), (0.0, 0.0)));
        assert!(approx(viewport.to_canvas(0.0, 0.0), (0.0, 1188.0)));
        assert!(approx(viewport.to_canvas(100.0, 692.0), (150.0, 150.0)));
    }

    #[test]
    fn test_quarter_turn_swaps_dimensions() {
        let viewport = Viewport::new(LETTER, 1.0, Rotation::Deg90);
        assert_eq!(viewport.width, 792.0);
        assert_eq!(viewport.height, 612.0);
        // Bottom-left corner of the page ends up top-left after a clockwise turn
        assert!(approx(viewport.to_canvas(0.0, 0.0), (0.0, 0.0)));
        assert!(approx(viewport.to_canvas(612.0, 792.0), (792.0, 612.0)));
    }

    #[test]
    fn test_half_turn_keeps_dimensions() {
        let viewport = Viewport::new(LETTER, 1.0, Rotation::Deg180);
        assert_eq!(viewport.pixel_size(), (612, 792));
        assert!(approx(viewport.to_canvas(0.0, 0.0), (612.0, 0.0)));
        assert!(approx(viewport.to_canvas(612.0, 792.0), (0.0, 792.0)));
    }

    #[test]
    fn test_three_quarter_turn() {
        let viewport = Viewport::new(LETTER, 1.0, Rotation::Deg270);
        assert_eq!(viewport.pixel_size(), (792, 612));
        assert!(approx(viewport.to_canvas(0.0, 0.0), (792.0, 612.0)));
        assert!(approx(viewport.to_canvas(612.0, 792.0), (0.0, 0.0)));
    }
}
