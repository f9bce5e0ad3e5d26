//! 2D transformation matrices for placing text in content streams.

use crate::units::*;
use crate::{OverlayError, Result};
use std::io::Write;

/// A transformation matrix in PDF content-stream space, where (0,0) is at the bottom-left.
///
/// The matrix is represented as [a, b, c, d, e, f] corresponding to:
/// ```text
/// | a  b  0 |
/// | c  d  0 |
/// | e  f  1 |
/// ```
///
/// # Composing transforms
///
/// Transforms can be chained using [`then`](Transform::then) or the builder methods
/// [`with_translate`](Transform::with_translate) and [`with_scale`](Transform::with_scale).
/// Operations are applied in the order they're chained.
///
/// ```
/// use ocr_overlay::{Transform, Pt};
///
/// // scale content to half size, then move it 72 points right and up
/// let transform = Transform::scale(0.5, 0.5)
///     .with_translate(Pt(72.0), Pt(72.0));
/// assert_eq!(transform.apply((Pt(10.0), Pt(10.0))), (Pt(77.0), Pt(77.0)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    /// Identity transform (no transformation)
    pub fn identity() -> Self {
        Transform {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
        }
    }

    /// Create a translation transform
    pub fn translate(x: Pt, y: Pt) -> Self {
        Transform {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: *x,
            f: *y,
        }
    }

    /// Create a scaling transform
    pub fn scale(sx: f32, sy: f32) -> Self {
        Transform {
            a: sx,
            b: 0.0,
            c: 0.0,
            d: sy,
            e: 0.0,
            f: 0.0,
        }
    }

    /// Create a rotation transform (angle in radians)
    pub fn rotate(angle: f32) -> Self {
        let cos = angle.cos();
        let sin = angle.sin();
        Transform {
            a: cos,
            b: sin,
            c: -sin,
            d: cos,
            e: 0.0,
            f: 0.0,
        }
    }

    /// Combine this transform with another (self * other)
    pub fn then(self, other: Transform) -> Self {
        Transform {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    /// Add a translation to this transform
    pub fn with_translate(self, x: Pt, y: Pt) -> Self {
        self.then(Transform::translate(x, y))
    }

    /// Add a scale to this transform
    pub fn with_scale(self, sx: f32, sy: f32) -> Self {
        self.then(Transform::scale(sx, sy))
    }

    /// The inverse transform, or [None] if the matrix is degenerate
    pub fn invert(&self) -> Option<Transform> {
        let det = self.a * self.d - self.b * self.c;
        if det.abs() < f32::EPSILON {
            return None;
        }
        let a = self.d / det;
        let b = -self.b / det;
        let c = -self.c / det;
        let d = self.a / det;
        Some(Transform {
            a,
            b,
            c,
            d,
            e: -(self.e * a + self.f * c),
            f: -(self.e * b + self.f * d),
        })
    }

    /// Map a point through this transform
    pub fn apply(&self, (x, y): (Pt, Pt)) -> (Pt, Pt) {
        (
            Pt(*x * self.a + *y * self.c + self.e),
            Pt(*x * self.b + *y * self.d + self.f),
        )
    }

    pub fn is_identity(&self) -> bool {
        *self == Transform::identity()
    }

    /// Write the transform as a `cm` operator
    pub fn write_cm<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        writeln!(
            w,
            "{} {} {} {} {} {} cm",
            self.a, self.b, self.c, self.d, self.e, self.f
        )
    }
}

/// The four orientations a line of text can be drawn in
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Rotation {
    /// Normal, left to right
    #[default]
    Identity,
    /// Rotated 90° counter-clockwise, reading bottom to top
    Ccw90,
    /// Upside down
    Flip180,
    /// Rotated 90° clockwise, reading top to bottom
    Cw90,
}

impl Rotation {
    /// Normalize a rotation in degrees. Any multiple of 90 is accepted, negative
    /// values included; anything else is a [OverlayError::Rotation].
    pub fn from_degrees(degrees: i32) -> Result<Rotation> {
        if degrees % 90 != 0 {
            return Err(OverlayError::Rotation(degrees));
        }
        Ok(match degrees.rem_euclid(360) {
            0 => Rotation::Identity,
            90 => Rotation::Ccw90,
            180 => Rotation::Flip180,
            _ => Rotation::Cw90,
        })
    }

    pub fn degrees(&self) -> i32 {
        match self {
            Rotation::Identity => 0,
            Rotation::Ccw90 => 90,
            Rotation::Flip180 => 180,
            Rotation::Cw90 => 270,
        }
    }

    /// Whether the text runs along the vertical axis of the page
    pub fn is_vertical(&self) -> bool {
        matches!(self, Rotation::Ccw90 | Rotation::Cw90)
    }

    pub fn matrix(&self) -> Transform {
        match self {
            Rotation::Identity => Transform::identity(),
            Rotation::Ccw90 => Transform {
                a: 0.0,
                b: 1.0,
                c: -1.0,
                d: 0.0,
                e: 0.0,
                f: 0.0,
            },
            Rotation::Flip180 => Transform {
                a: -1.0,
                b: 0.0,
                c: 0.0,
                d: -1.0,
                e: 0.0,
                f: 0.0,
            },
            Rotation::Cw90 => Transform {
                a: 0.0,
                b: -1.0,
                c: 1.0,
                d: 0.0,
                e: 0.0,
                f: 0.0,
            },
        }
    }
}

/// A morph: a matrix applied around a fixed point, both given in image space
/// (y grows downward from the top of the page).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Morph {
    pub fixpoint: (Pt, Pt),
    pub matrix: Transform,
}

impl Morph {
    pub fn new(fixpoint: (Pt, Pt), matrix: Transform) -> Morph {
        Morph { fixpoint, matrix }
    }

    /// The content-space transform for a page of the given height: move the fixed
    /// point to the origin, apply the matrix, and move it back
    pub fn to_content(&self, page_height: Pt) -> Transform {
        let (x, y) = self.fixpoint;
        let to_fixpoint = Transform::translate(x, page_height - y);
        let from_fixpoint = Transform::translate(-x, y - page_height);
        from_fixpoint.then(self.matrix).then(to_fixpoint)
    }
}
