//! Shared geometry utilities.
//!
//! Real-valued points and displacements are `kurbo::Point` and
//! `kurbo::Vec2`; this module adds the integer pixel-corner point, the
//! bounding-box fold, and the angle helpers the tracing stages share.

use std::ops::Sub;

use kurbo::{Point, Vec2};

/// Tolerance for comparing angles and coordinates that went through
/// floating-point arithmetic.
pub const REAL_EPSILON: f64 = 0.00001;

/// True if `a` and `b` are equal up to [`REAL_EPSILON`].
pub fn epsilon_equal(a: f64, b: f64) -> bool {
    a == b || (a - b).abs() <= REAL_EPSILON
}

/// A pixel-corner coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct IntPoint {
    pub x: i32,
    pub y: i32,
}

impl IntPoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Round a real point to the nearest pixel corner.
    pub fn from_point(p: Point) -> Self {
        Self {
            x: p.x.round() as i32,
            y: p.y.round() as i32,
        }
    }

    pub fn to_point(self) -> Point {
        Point::new(self.x as f64, self.y as f64)
    }
}

impl Sub for IntPoint {
    type Output = Vec2;

    fn sub(self, rhs: Self) -> Vec2 {
        Vec2::new((self.x - rhs.x) as f64, (self.y - rhs.y) as f64)
    }
}

/// Axis-aligned bounds in row/column terms.
///
/// Built by folding points in with [`BoundingBox::include`]; a fold over
/// nothing yields `None`, so a `BoundingBox` value always satisfies
/// `min_row <= max_row` and `min_col <= max_col`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox<T> {
    pub min_row: T,
    pub max_row: T,
    pub min_col: T,
    pub max_col: T,
}

impl<T: Copy + PartialOrd> BoundingBox<T> {
    /// A box covering the single cell `(row, col)`.
    pub fn at(row: T, col: T) -> Self {
        Self {
            min_row: row,
            max_row: row,
            min_col: col,
            max_col: col,
        }
    }

    /// Grow the box to cover `(row, col)`.
    pub fn include(mut self, row: T, col: T) -> Self {
        if row < self.min_row {
            self.min_row = row;
        }
        if row > self.max_row {
            self.max_row = row;
        }
        if col < self.min_col {
            self.min_col = col;
        }
        if col > self.max_col {
            self.max_col = col;
        }
        self
    }

    /// Fold `(row, col)` pairs into a box. `None` when the iterator is empty.
    pub fn from_cells<I>(cells: I) -> Option<Self>
    where
        I: IntoIterator<Item = (T, T)>,
    {
        cells.into_iter().fold(None, |acc, (row, col)| match acc {
            None => Some(Self::at(row, col)),
            Some(b) => Some(b.include(row, col)),
        })
    }
}

impl BoundingBox<i32> {
    /// Bounds of pixel-corner points, with `y` as the row and `x` as the column.
    pub fn from_int_points(points: &[IntPoint]) -> Option<Self> {
        Self::from_cells(points.iter().map(|p| (p.y, p.x)))
    }
}

impl BoundingBox<f64> {
    /// Bounds of real points, with `y` as the row and `x` as the column.
    pub fn from_points<I: IntoIterator<Item = Point>>(points: I) -> Option<Self> {
        Self::from_cells(points.into_iter().map(|p| (p.y, p.x)))
    }
}

impl BoundingBox<u32> {
    pub fn width(&self) -> u32 {
        self.max_col - self.min_col + 1
    }

    pub fn height(&self) -> u32 {
        self.max_row - self.min_row + 1
    }
}

/// Scale `v` to unit length. The zero vector stays zero.
pub fn normalize(v: Vec2) -> Vec2 {
    let m = v.hypot();
    if m > 0.0 {
        v / m
    } else {
        v
    }
}

/// Angle between two vectors in degrees, in [0, 180].
///
/// Both vectors are normalized first; a zero vector has no direction,
/// its dot product with anything is 0, and the angle comes out as 90.
pub fn angle_degrees(a: Vec2, b: Vec2) -> f64 {
    let cos = normalize(a).dot(normalize(b)).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}
