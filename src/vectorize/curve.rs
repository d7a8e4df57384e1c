//! Point sequences between corners.
//!
//! A [`Curve`] is the unit the filter smooths and the fitter turns into
//! splines. The curves of one outline form a [`CurveList`], a ring in
//! which the last curve is followed by the first.

use kurbo::{Point, Vec2};

use crate::geom::IntPoint;

/// A curve point and its parameter value along the fitted spline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurvePoint {
    pub point: Point,
    pub t: f64,
}

impl CurvePoint {
    pub fn new(point: Point) -> Self {
        Self { point, t: 0.0 }
    }
}

/// An ordered run of points, open between two corners or cyclic around a
/// corner-free outline.
#[derive(Debug, Clone, PartialEq)]
pub struct Curve {
    pub points: Vec<CurvePoint>,
    pub cyclic: bool,
    start_tangent: Option<Vec2>,
    end_tangent: Option<Vec2>,
}

impl Curve {
    pub fn new<I: IntoIterator<Item = Point>>(points: I, cyclic: bool) -> Self {
        Self {
            points: points.into_iter().map(CurvePoint::new).collect(),
            cyclic,
            start_tangent: None,
            end_tangent: None,
        }
    }

    pub fn from_int_points(points: &[IntPoint], cyclic: bool) -> Self {
        Self::new(points.iter().map(|p| p.to_point()), cyclic)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn point(&self, i: usize) -> Point {
        self.points[i].point
    }

    pub fn t(&self, i: usize) -> f64 {
        self.points[i].t
    }

    pub fn first(&self) -> Point {
        self.point(0)
    }

    pub fn last(&self) -> Point {
        self.point(self.len() - 1)
    }

    /// Coordinates only, in order.
    pub fn coordinates(&self) -> impl Iterator<Item = Point> + '_ {
        self.points.iter().map(|p| p.point)
    }

    pub fn push(&mut self, point: Point) {
        self.points.push(CurvePoint::new(point));
    }

    /// Replace the coordinates, resetting parameters and tangents.
    pub fn set_coordinates(&mut self, points: Vec<Point>) {
        self.points = points.into_iter().map(CurvePoint::new).collect();
        self.start_tangent = None;
        self.end_tangent = None;
    }

    pub fn start_tangent(&self) -> Option<Vec2> {
        self.start_tangent
    }

    pub fn end_tangent(&self) -> Option<Vec2> {
        self.end_tangent
    }

    pub(crate) fn set_start_tangent(&mut self, tangent: Vec2) {
        self.start_tangent = Some(tangent);
    }

    pub(crate) fn set_end_tangent(&mut self, tangent: Vec2) {
        self.end_tangent = Some(tangent);
    }

    /// Copy of `points[range]` as an open curve with no tangents yet.
    pub(crate) fn sub_curve(&self, range: std::ops::RangeInclusive<usize>) -> Self {
        Self {
            points: self.points[range].to_vec(),
            cyclic: false,
            start_tangent: None,
            end_tangent: None,
        }
    }
}

/// The curves of one outline, as a ring.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveList {
    pub curves: Vec<Curve>,
    pub clockwise: bool,
}

impl CurveList {
    pub fn new(clockwise: bool) -> Self {
        Self {
            curves: Vec::new(),
            clockwise,
        }
    }

    pub fn len(&self) -> usize {
        self.curves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }

    pub fn prev_index(&self, i: usize) -> usize {
        let n = self.curves.len();
        (i + n - 1) % n
    }

    pub fn next_index(&self, i: usize) -> usize {
        (i + 1) % self.curves.len()
    }
}
