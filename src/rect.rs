use crate::point::Point;
use crate::{OverlayError, Result};
use std::fmt;

/// An axis-aligned integer rectangle in image space, specified by its top-left
/// (`x0`, `y0`) and bottom-right (`x1`, `y1`) corners.
///
/// Producers are expected to keep `x0 <= x1` and `y0 <= y1`; the type itself does
/// not enforce it. Every operation returns a new rectangle.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl Rect {
    pub const fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Rect {
        Rect { x0, y0, x1, y1 }
    }

    /// Build a rectangle from floating point edges, rounding outward so the
    /// result always covers the input
    pub fn from_seq(x0: f64, y0: f64, x1: f64, y1: f64) -> Rect {
        Rect {
            x0: x0.floor() as i32,
            y0: y0.floor() as i32,
            x1: x1.ceil() as i32,
            y1: y1.ceil() as i32,
        }
    }

    /// Bounding box of a four-corner polygon. Corner order does not matter, and any
    /// rotation or skew of the polygon is discarded.
    pub fn from_quad(quad: [Point; 4]) -> Rect {
        let xs = quad.map(|p| p.x);
        let ys = quad.map(|p| p.y);
        Rect {
            x0: xs.into_iter().min().unwrap_or_default(),
            y0: ys.into_iter().min().unwrap_or_default(),
            x1: xs.into_iter().max().unwrap_or_default(),
            y1: ys.into_iter().max().unwrap_or_default(),
        }
    }

    pub fn w(&self) -> i32 {
        self.x1 - self.x0
    }

    pub fn h(&self) -> i32 {
        self.y1 - self.y0
    }

    pub fn size(&self) -> (i32, i32) {
        (self.w(), self.h())
    }

    pub fn p0(&self) -> Point {
        Point::new(self.x0, self.y0)
    }

    pub fn p1(&self) -> Point {
        Point::new(self.x1, self.y1)
    }

    pub fn tl(&self) -> Point {
        Point::new(self.x0, self.y0)
    }

    pub fn tr(&self) -> Point {
        Point::new(self.x1, self.y0)
    }

    pub fn bl(&self) -> Point {
        Point::new(self.x0, self.y1)
    }

    pub fn br(&self) -> Point {
        Point::new(self.x1, self.y1)
    }

    pub fn center_x(&self) -> i32 {
        ((self.x0 + self.x1) as f64 * 0.5).round() as i32
    }

    pub fn center_y(&self) -> i32 {
        ((self.y0 + self.y1) as f64 * 0.5).round() as i32
    }

    pub fn center(&self) -> Point {
        Point::new(self.center_x(), self.center_y())
    }

    pub fn area(&self) -> i64 {
        self.w() as i64 * self.h() as i64
    }

    /// A rectangle is empty when it has no width or no height
    pub fn empty(&self) -> bool {
        self.w() <= 0 || self.h() <= 0
    }

    /// Move the top-left corner to the given position, keeping the size.
    /// `None` keeps the current coordinate.
    pub fn moveto(&self, x0: Option<i32>, y0: Option<i32>) -> Rect {
        let x0 = x0.unwrap_or(self.x0);
        let y0 = y0.unwrap_or(self.y0);
        Rect::new(x0, y0, x0 + self.w(), y0 + self.h())
    }

    /// Translate by the given offsets
    pub fn move_by(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(self.x0 + dx, self.y0 + dy, self.x1 + dx, self.y1 + dy)
    }

    pub fn with_x0(&self, x0: i32) -> Rect {
        Rect { x0, ..*self }
    }

    pub fn with_y0(&self, y0: i32) -> Rect {
        Rect { y0, ..*self }
    }

    pub fn with_x1(&self, x1: i32) -> Rect {
        Rect { x1, ..*self }
    }

    pub fn with_y1(&self, y1: i32) -> Rect {
        Rect { y1, ..*self }
    }

    pub fn with_w(&self, w: i32) -> Rect {
        Rect {
            x1: self.x0 + w,
            ..*self
        }
    }

    pub fn with_h(&self, h: i32) -> Rect {
        Rect {
            y1: self.y0 + h,
            ..*self
        }
    }

    pub fn with_size(&self, w: i32, h: i32) -> Rect {
        Rect::new(self.x0, self.y0, self.x0 + w, self.y0 + h)
    }

    pub fn with_p0(&self, p0: Point) -> Rect {
        Rect::new(p0.x, p0.y, self.x1, self.y1)
    }

    pub fn with_p1(&self, p1: Point) -> Rect {
        Rect::new(self.x0, self.y0, p1.x, p1.y)
    }

    /// Replace any subset of the edges
    pub fn resize(
        &self,
        x0: Option<i32>,
        y0: Option<i32>,
        x1: Option<i32>,
        y1: Option<i32>,
    ) -> Rect {
        Rect::new(
            x0.unwrap_or(self.x0),
            y0.unwrap_or(self.y0),
            x1.unwrap_or(self.x1),
            y1.unwrap_or(self.y1),
        )
    }

    /// Grow each edge outward by its own delta
    pub fn expand(&self, dx0: i32, dy0: i32, dx1: i32, dy1: i32) -> Rect {
        Rect::new(self.x0 - dx0, self.y0 - dy0, self.x1 + dx1, self.y1 + dy1)
    }

    /// Pull each edge inward by its own delta
    pub fn shrink(&self, dx0: i32, dy0: i32, dx1: i32, dy1: i32) -> Rect {
        self.expand(-dx0, -dy0, -dx1, -dy1)
    }

    /// Express this rectangle in the coordinate system whose origin is `other`'s top-left corner
    pub fn relative_to(&self, other: &Rect) -> Rect {
        self.relative_to_point(other.p0())
    }

    pub fn relative_to_point(&self, origin: Point) -> Rect {
        self.move_by(-origin.x, -origin.y)
    }

    /// Component-wise intersection; the result may be empty
    pub fn intersect(&self, other: &Rect) -> Rect {
        Rect::new(
            self.x0.max(other.x0),
            self.y0.max(other.y0),
            self.x1.min(other.x1),
            self.y1.min(other.y1),
        )
    }

    pub fn union(&self, other: &Rect) -> Rect {
        Rect::new(
            self.x0.min(other.x0),
            self.y0.min(other.y0),
            self.x1.max(other.x1),
            self.y1.max(other.y1),
        )
    }

    pub fn union_xy(&self, x: i32, y: i32) -> Rect {
        Rect::new(self.x0.min(x), self.y0.min(y), self.x1.max(x), self.y1.max(y))
    }

    pub fn union_point(&self, point: Point) -> Rect {
        self.union_xy(point.x, point.y)
    }

    /// Inclusive on both ends
    pub fn contains_xy(&self, x: i32, y: i32) -> bool {
        self.x0 <= x && x <= self.x1 && self.y0 <= y && y <= self.y1
    }

    pub fn contains_point(&self, point: Point) -> bool {
        self.contains_xy(point.x, point.y)
    }

    pub fn contains(&self, other: &Rect) -> bool {
        self.contains_xy(other.x0, other.y0) && self.contains_xy(other.x1, other.y1)
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x0 < other.x1 && self.x1 > other.x0 && self.y0 < other.y1 && self.y1 > other.y0
    }

    /// Indexed access in `x0, y0, x1, y1` order
    pub fn get(&self, index: usize) -> Result<i32> {
        match index {
            0 => Ok(self.x0),
            1 => Ok(self.y0),
            2 => Ok(self.x1),
            3 => Ok(self.y1),
            _ => Err(OverlayError::Index { index, len: 4 }),
        }
    }

    pub fn iter(&self) -> std::array::IntoIter<i32, 4> {
        [self.x0, self.y0, self.x1, self.y1].into_iter()
    }
}

impl std::ops::Index<usize> for Rect {
    type Output = i32;

    fn index(&self, index: usize) -> &i32 {
        match index {
            0 => &self.x0,
            1 => &self.y0,
            2 => &self.x1,
            3 => &self.y1,
            _ => panic!("Rect index out of range: {index}"),
        }
    }
}

impl IntoIterator for Rect {
    type Item = i32;
    type IntoIter = std::array::IntoIter<i32, 4>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl std::ops::BitAnd for Rect {
    type Output = Rect;

    fn bitand(self, rhs: Rect) -> Rect {
        self.intersect(&rhs)
    }
}

impl std::ops::BitOr for Rect {
    type Output = Rect;

    fn bitor(self, rhs: Rect) -> Rect {
        self.union(&rhs)
    }
}

impl From<(i32, i32, i32, i32)> for Rect {
    fn from((x0, y0, x1, y1): (i32, i32, i32, i32)) -> Self {
        Rect { x0, y0, x1, y1 }
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Rect({}, {}, {}, {}, w={}, h={})",
            self.x0,
            self.y0,
            self.x1,
            self.y1,
            self.w(),
            self.h()
        )
    }
}

/// Edge coordinates are copied as-is; this is only meaningful for rectangles anchored
/// at the origin such as page boxes, where flipping the y axis changes nothing.
impl From<Rect> for pdf_writer::Rect {
    fn from(r: Rect) -> Self {
        pdf_writer::Rect {
            x1: r.x0 as f32,
            y1: r.y0 as f32,
            x2: r.x1 as f32,
            y2: r.y1 as f32,
        }
    }
}

impl From<&Rect> for pdf_writer::Rect {
    fn from(r: &Rect) -> Self {
        (*r).into()
    }
}
