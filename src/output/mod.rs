//! Conversion of fitted spline lists to `kurbo` paths.

pub mod svg;

use kurbo::BezPath;

use crate::vectorize::spline::{Degree, SplineList, SplineListArray};

/// One closed path through the splines of a list.
///
/// Coordinates stay in the y-up frame the splines were fit in. An empty
/// list gives an empty path.
pub fn to_bezpath(list: &SplineList) -> BezPath {
    let mut path = BezPath::new();
    let Some(first) = list.splines.first() else {
        return path;
    };

    path.move_to(first.start());
    for spline in &list.splines {
        match spline.degree() {
            Degree::Linear => path.line_to(spline.end()),
            Degree::Quadratic => path.quad_to(spline.control1(), spline.end()),
            Degree::Cubic => path.curve_to(spline.control1(), spline.control2(), spline.end()),
        }
    }
    path.close_path();
    path
}

/// One path per spline list, in order.
pub fn to_bezpaths(lists: &SplineListArray) -> Vec<BezPath> {
    lists.iter().map(to_bezpath).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vectorize::spline::Spline;
    use approx::assert_relative_eq;
    use kurbo::{PathEl, Point};

    /// Shoelace area over the on-curve points of a path.
    fn on_curve_area(path: &BezPath) -> f64 {
        let points: Vec<Point> = path
            .elements()
            .iter()
            .filter_map(|el| match *el {
                PathEl::MoveTo(p)
                | PathEl::LineTo(p)
                | PathEl::QuadTo(_, p)
                | PathEl::CurveTo(_, _, p) => Some(p),
                PathEl::ClosePath => None,
            })
            .collect();
        let n = points.len();
        (0..n)
            .map(|i| {
                let (a, b) = (points[i], points[(i + 1) % n]);
                a.x * b.y - b.x * a.y
            })
            .sum::<f64>()
            / 2.0
    }

    #[test]
    fn square_list_becomes_closed_ccw_path() {
        let corners = [(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)].map(Point::from);
        let mut list = SplineList::new(false);
        for i in 0..4 {
            list.splines.push(Spline::line(corners[i], corners[(i + 1) % 4]));
        }
        let path = to_bezpath(&list);
        let els = path.elements();
        assert_eq!(els.len(), 6);
        assert_eq!(els[0], PathEl::MoveTo(corners[0]));
        assert_eq!(els[5], PathEl::ClosePath);
        assert_relative_eq!(on_curve_area(&path), 16.0);
    }

    #[test]
    fn cubic_keeps_controls() {
        let mut list = SplineList::new(false);
        let s = Spline::cubic(
            Point::new(0.0, 0.0),
            Point::new(1.0, 2.0),
            Point::new(3.0, 2.0),
            Point::new(4.0, 0.0),
        );
        list.splines.push(s);
        let path = to_bezpath(&list);
        assert_eq!(
            path.elements()[1],
            PathEl::CurveTo(s.control1(), s.control2(), s.end())
        );
        assert!(to_bezpath(&SplineList::new(true)).elements().is_empty());
    }

    #[test]
    fn traced_paths_wind_by_clockwise_flag() {
        let mask = crate::Bitmap::from_fn(30, 30, |r, c| {
            let outer = (2..28).contains(&r) && (2..28).contains(&c);
            let hole = (10..20).contains(&r) && (10..20).contains(&c);
            outer && !hole
        });
        let lists = crate::trace_mask(&mask, &crate::TracingConfig::default()).unwrap();
        let paths = to_bezpaths(&lists);
        assert_eq!(paths.len(), 2);
        for (list, path) in lists.iter().zip(&paths) {
            assert_eq!(list.clockwise, on_curve_area(path) < 0.0);
        }
    }
}
