//! SVG serialization of traced outlines.
//!
//! Traced outlines live in a y-up frame whose origin is the bottom-left
//! corner of the traced region. SVG is y-down with the origin at the top
//! left of the canvas, so every path is flipped and moved back to where
//! the region sits in the full image.

use kurbo::{Affine, BezPath};

use super::to_bezpath;
use crate::geom::BoundingBox;
use crate::vectorize::spline::SplineListArray;

/// Map from the y-up frame of `region` to image pixel coordinates.
pub fn placement(region: BoundingBox<u32>) -> Affine {
    let bottom = f64::from(region.min_row) + f64::from(region.height());
    Affine::translate((f64::from(region.min_col), bottom)) * Affine::FLIP_Y
}

/// The outlines as paths in image pixel coordinates.
pub fn placed_paths(lists: &SplineListArray, region: BoundingBox<u32>) -> Vec<BezPath> {
    let transform = placement(region);
    lists
        .iter()
        .map(|list| {
            let mut path = to_bezpath(list);
            path.apply_affine(transform);
            path
        })
        .collect()
}

/// A standalone SVG document of `width` × `height` pixels.
///
/// All outlines go into a single `<path>` so holes cut their outer
/// outline; outer and hole outlines wind in opposite directions, which
/// the default non-zero fill rule relies on.
pub fn document(
    lists: &SplineListArray,
    region: BoundingBox<u32>,
    width: u32,
    height: u32,
) -> String {
    let data: Vec<String> = placed_paths(lists, region)
        .iter()
        .map(BezPath::to_svg)
        .collect();

    let mut svg = String::new();
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">\n"
    ));
    if !data.is_empty() {
        svg.push_str(&format!(
            "  <path d=\"{}\" fill=\"black\" fill-rule=\"nonzero\"/>\n",
            data.join(" ")
        ));
    }
    svg.push_str("</svg>\n");
    svg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::{Bitmap, Crop};
    use crate::config::TracingConfig;
    use kurbo::{PathEl, Point};

    fn framed_square() -> Bitmap {
        Bitmap::from_fn(20, 20, |r, c| (5..15).contains(&r) && (5..15).contains(&c))
    }

    #[test]
    fn placement_flips_into_region() {
        let region = BoundingBox {
            min_row: 5,
            max_row: 14,
            min_col: 3,
            max_col: 12,
        };
        let t = placement(region);
        assert_eq!(t * Point::new(0.0, 0.0), Point::new(3.0, 15.0));
        assert_eq!(t * Point::new(10.0, 10.0), Point::new(13.0, 5.0));
    }

    #[test]
    fn cropped_square_lands_back_in_place() {
        let mask = framed_square();
        let crop = Crop::to_selection(&mask).unwrap();
        let lists = crate::trace_mask(&crop, &TracingConfig::default()).unwrap();
        let paths = placed_paths(&lists, crop.bounds());
        assert_eq!(paths.len(), 1);

        let mut corners: Vec<Point> = paths[0]
            .elements()
            .iter()
            .filter_map(|el| match el {
                PathEl::MoveTo(p) | PathEl::LineTo(p) => Some(*p),
                _ => None,
            })
            .collect();
        corners.sort_by(|a, b| (a.x, a.y).partial_cmp(&(b.x, b.y)).unwrap());
        corners.dedup();
        assert_eq!(
            corners,
            vec![
                Point::new(5.0, 5.0),
                Point::new(5.0, 15.0),
                Point::new(15.0, 5.0),
                Point::new(15.0, 15.0),
            ]
        );
    }

    #[test]
    fn document_has_one_path() {
        let mask = framed_square();
        let crop = Crop::to_selection(&mask).unwrap();
        let lists = crate::trace_mask(&crop, &TracingConfig::default()).unwrap();
        let svg = document(&lists, crop.bounds(), 20, 20);
        assert!(svg.starts_with("<svg xmlns=\"http://www.w3.org/2000/svg\""));
        assert!(svg.contains("viewBox=\"0 0 20 20\""));
        assert_eq!(svg.matches("<path").count(), 1);
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn empty_document_has_no_path() {
        let region = BoundingBox::at(0, 0);
        let svg = document(&Vec::new(), region, 4, 4);
        assert!(!svg.contains("<path"));
    }
}
