use crate::point::Point;

/// A one-dimensional interval, used to reason about the horizontal or vertical
/// extent of boxes independently. `start <= end` is up to the caller.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Vector1D {
    pub start: i32,
    pub end: i32,
}

impl Vector1D {
    pub const fn new(start: i32, end: i32) -> Vector1D {
        Vector1D { start, end }
    }

    pub fn center(&self) -> i32 {
        ((self.start + self.end) as f64 * 0.5).round() as i32
    }

    pub fn intersects(&self, other: &Vector1D) -> bool {
        self.start < other.end && self.end > other.start
    }

    pub fn contains(&self, other: &Vector1D) -> bool {
        self.start <= other.start && other.start < other.end && other.end <= self.end
    }

    pub fn at_left_of(&self, other: &Vector1D) -> bool {
        self.end <= other.start
    }

    pub fn at_right_of(&self, other: &Vector1D) -> bool {
        self.start >= other.end
    }

    /// `other` starts inside this interval
    pub fn contains_left_of(&self, other: &Vector1D) -> bool {
        self.start < other.start && other.start < other.end
    }

    /// `other` ends inside this interval
    pub fn contains_right_of(&self, other: &Vector1D) -> bool {
        self.start < other.end && other.end < self.end
    }

    pub fn contains_by(&self, other: &Vector1D) -> bool {
        other.contains(self)
    }
}

/// A directed segment between two points
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Vector2D {
    pub start: Point,
    pub end: Point,
}

impl Vector2D {
    pub const fn new(start: Point, end: Point) -> Vector2D {
        Vector2D { start, end }
    }

    pub fn delta_x(&self) -> i32 {
        self.end.x - self.start.x
    }

    pub fn delta_y(&self) -> i32 {
        self.end.y - self.start.y
    }

    pub fn length(&self) -> f64 {
        (self.delta_x() as f64).hypot(self.delta_y() as f64)
    }

    /// Same end point, new start point
    pub fn moveto(&self, start: Point) -> Vector2D {
        Vector2D {
            start,
            end: self.end,
        }
    }

    pub fn moveto_xy(&self, x: i32, y: i32) -> Vector2D {
        self.moveto(Point::new(x, y))
    }

    /// Same start point, new end point
    pub fn direct_to(&self, end: Point) -> Vector2D {
        Vector2D {
            start: self.start,
            end,
        }
    }

    pub fn direct_to_xy(&self, x: i32, y: i32) -> Vector2D {
        self.direct_to(Point::new(x, y))
    }
}
