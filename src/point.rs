use crate::{OverlayError, Result};
use std::fmt;

/// An integer point in image space, where `y` grows downward from the top of the image.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Point {
        Point { x, y }
    }

    /// Indexed access, `0` is `x` and `1` is `y`
    pub fn get(&self, index: usize) -> Result<i32> {
        match index {
            0 => Ok(self.x),
            1 => Ok(self.y),
            _ => Err(OverlayError::Index { index, len: 2 }),
        }
    }

    pub fn len(&self) -> usize {
        2
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn iter(&self) -> std::array::IntoIter<i32, 2> {
        [self.x, self.y].into_iter()
    }
}

impl std::ops::Index<usize> for Point {
    type Output = i32;

    fn index(&self, index: usize) -> &i32 {
        match index {
            0 => &self.x,
            1 => &self.y,
            _ => panic!("Point index out of range: {index}"),
        }
    }
}

impl IntoIterator for Point {
    type Item = i32;
    type IntoIter = std::array::IntoIter<i32, 2>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Point { x, y }
    }
}

impl From<Point> for (i32, i32) {
    fn from(p: Point) -> Self {
        (p.x, p.y)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Point({}, {})", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indexed_access() {
        let p = Point::new(3, -4);
        assert_eq!(p[0], 3);
        assert_eq!(p[1], -4);
        assert_eq!(p.get(1).unwrap(), -4);
        assert!(matches!(
            p.get(2),
            Err(OverlayError::Index { index: 2, len: 2 })
        ));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn index_out_of_range_panics() {
        let p = Point::new(0, 0);
        let _ = p[2];
    }

    #[test]
    fn iterates_x_then_y() {
        let coords: Vec<i32> = Point::new(7, 9).into_iter().collect();
        assert_eq!(coords, vec![7, 9]);
    }
}
