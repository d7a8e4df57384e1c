//! Fitted spline model.

use kurbo::{CubicBez, Point};

/// How a spline is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Degree {
    Linear,
    /// Only produced as the hodograph of a cubic.
    Quadratic,
    Cubic,
}

/// A Bézier segment with up to four control points.
///
/// A cubic uses all of `v`, a quadratic `v[0..3]`, and a line runs from
/// `v[0]` to `v[3]`. A spline that the fitter turned into a line keeps its
/// fitted inner controls so it can be made cubic again.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spline {
    v: [Point; 4],
    degree: Degree,
    linearity: f64,
}

impl Spline {
    pub fn cubic(start: Point, control1: Point, control2: Point, end: Point) -> Self {
        Self {
            v: [start, control1, control2, end],
            degree: Degree::Cubic,
            linearity: 0.0,
        }
    }

    /// A straight line with linearity 0, so it is never reverted to a curve.
    pub fn line(start: Point, end: Point) -> Self {
        Self {
            v: [start, start, end, end],
            degree: Degree::Linear,
            linearity: 0.0,
        }
    }

    fn quadratic(v0: Point, v1: Point, v2: Point) -> Self {
        Self {
            v: [v0, v1, v2, v2],
            degree: Degree::Quadratic,
            linearity: 0.0,
        }
    }

    pub fn degree(&self) -> Degree {
        self.degree
    }

    pub(crate) fn set_degree(&mut self, degree: Degree) {
        self.degree = degree;
    }

    /// Mean distance of the fitted points from the chord, divided by the
    /// number of points. 0 for splines that were never tested.
    pub fn linearity(&self) -> f64 {
        self.linearity
    }

    pub(crate) fn set_linearity(&mut self, linearity: f64) {
        self.linearity = linearity;
    }

    pub fn start(&self) -> Point {
        self.v[0]
    }

    pub fn end(&self) -> Point {
        match self.degree {
            Degree::Quadratic => self.v[2],
            _ => self.v[3],
        }
    }

    pub fn control1(&self) -> Point {
        match self.degree {
            Degree::Linear => self.start(),
            _ => self.v[1],
        }
    }

    pub fn control2(&self) -> Point {
        match self.degree {
            Degree::Linear => self.end(),
            Degree::Quadratic => self.v[1],
            Degree::Cubic => self.v[2],
        }
    }

    pub(crate) fn start_mut(&mut self) -> &mut Point {
        &mut self.v[0]
    }

    pub(crate) fn end_mut(&mut self) -> &mut Point {
        match self.degree {
            Degree::Quadratic => &mut self.v[2],
            _ => &mut self.v[3],
        }
    }

    /// Point at parameter `t`. Values outside [0, 1] extrapolate.
    pub fn evaluate(&self, t: f64) -> Point {
        match self.degree {
            Degree::Linear => de_casteljau(&[self.v[0], self.v[3]], t),
            Degree::Quadratic => de_casteljau(&self.v[..3], t),
            Degree::Cubic => de_casteljau(&self.v, t),
        }
    }

    /// The hodograph: a cubic's derivative is a quadratic, a quadratic's a
    /// line. The derivative of a line is constant and returned as a
    /// degenerate line.
    pub fn derivative(&self) -> Spline {
        let [v0, v1, v2, v3] = self.v;
        let scaled = |a: Point, b: Point, k: f64| ((b - a) * k).to_point();
        match self.degree {
            Degree::Cubic => Spline::quadratic(
                scaled(v0, v1, 3.0),
                scaled(v1, v2, 3.0),
                scaled(v2, v3, 3.0),
            ),
            Degree::Quadratic => Spline::line(scaled(v0, v1, 2.0), scaled(v1, v2, 2.0)),
            Degree::Linear => {
                let d = scaled(v0, v3, 1.0);
                Spline::line(d, d)
            }
        }
    }

    pub fn to_cubic(&self) -> CubicBez {
        CubicBez::new(self.start(), self.control1(), self.control2(), self.end())
    }
}

/// Evaluate the Bézier curve with control points `points` at `t` by
/// repeated linear interpolation.
pub fn de_casteljau(points: &[Point], t: f64) -> Point {
    let mut work = points.to_vec();
    for level in (1..work.len()).rev() {
        for i in 0..level {
            work[i] = work[i].lerp(work[i + 1], t);
        }
    }
    work.first().copied().unwrap_or(Point::ZERO)
}

/// The splines fitted to one closed outline, end to end.
#[derive(Debug, Clone, PartialEq)]
pub struct SplineList {
    pub splines: Vec<Spline>,
    pub clockwise: bool,
}

impl SplineList {
    pub fn new(clockwise: bool) -> Self {
        Self {
            splines: Vec::new(),
            clockwise,
        }
    }

    pub fn len(&self) -> usize {
        self.splines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.splines.is_empty()
    }

    pub fn prev_index(&self, i: usize) -> usize {
        let n = self.splines.len();
        (i + n - 1) % n
    }

    pub fn next_index(&self, i: usize) -> usize {
        (i + 1) % self.splines.len()
    }

    /// True if the last spline ends where the first one starts.
    pub fn is_closed(&self) -> bool {
        match (self.splines.first(), self.splines.last()) {
            (Some(first), Some(last)) => last.end() == first.start(),
            _ => false,
        }
    }

    pub fn count(&self, degree: Degree) -> usize {
        self.splines.iter().filter(|s| s.degree() == degree).count()
    }
}

/// One spline list per traced outline, in outline order.
pub type SplineListArray = Vec<SplineList>;
