//! Corner detection and outline segmentation.
//!
//! A corner is a point where the outline coming in and the outline going
//! out meet at a sharp enough angle, judged over `corner_surround` points
//! on each side rather than the immediate neighbours, since consecutive
//! pixel-outline points always turn by 0° or 90°.

use kurbo::Vec2;

use super::curve::{Curve, CurveList};
use super::decompose::PixelOutline;
use crate::config::TracingConfig;
use crate::geom::{angle_degrees, epsilon_equal, IntPoint};

/// Sums of the offsets from point `index` to the `surround` points before
/// it (`in`) and after it (`out`), wrapping around the outline.
pub fn find_vectors(outline: &PixelOutline, index: usize, surround: usize) -> (Vec2, Vec2) {
    let n = outline.len();
    let candidate = outline.points[index];
    let offset = |i: usize| outline.points[i] - candidate;

    let mut v_in = Vec2::ZERO;
    let mut v_out = Vec2::ZERO;
    for k in 1..=surround {
        v_in += offset((index + n - k % n) % n);
        v_out += offset((index + k) % n);
    }
    (v_in, v_out)
}

fn corner_angle(outline: &PixelOutline, index: usize, surround: usize) -> f64 {
    let (v_in, v_out) = find_vectors(outline, index, surround);
    angle_degrees(v_in, v_out)
}

/// Indices of the corners of `outline`, sorted, with no two adjacent.
///
/// Each candidate (angle at most `corner_threshold`) starts a search over
/// the following points that keeps going until `corner_surround` points
/// past the sharpest candidate seen so far. The sharpest point, and any
/// just as sharp, become corners; a point at or below
/// `corner_always_threshold` is a corner regardless.
pub fn find_corners(outline: &PixelOutline, config: &TracingConfig) -> Vec<usize> {
    let n = outline.len();
    let surround = config.corner_surround;
    let mut corners = Vec::new();

    let mut p = 0;
    while p < n {
        let mut angle = corner_angle(outline, p, surround);
        if angle > config.corner_threshold {
            p += 1;
            continue;
        }

        let mut best_angle = angle;
        let mut best_index = p;
        let mut equally_good = Vec::new();
        let mut q = p;
        let mut i = p + 1;

        loop {
            if angle <= config.corner_always_threshold {
                corners.push(q);
            }
            if i >= best_index + surround || i >= n {
                break;
            }

            q = i;
            angle = corner_angle(outline, q, surround);
            if epsilon_equal(angle, best_angle) {
                equally_good.push(q);
            } else if angle < best_angle {
                best_angle = angle;
                best_index = q;
                i = q;
                equally_good.clear();
            }
            i += 1;
        }

        if best_angle > config.corner_always_threshold {
            corners.push(best_index);
            corners.extend(equally_good);
        }

        p = q + 1;
    }

    if !corners.is_empty() {
        remove_adjacent_corners(&mut corners, n - 1);
    }
    corners
}

/// Sort `corners` and drop the second of every adjacent pair, including
/// the pair formed by `last_index` and 0 around the wrap.
pub fn remove_adjacent_corners(corners: &mut Vec<usize>, last_index: usize) {
    corners.sort_unstable();
    corners.dedup();

    let Some(&last) = corners.last() else {
        return;
    };

    let mut kept = Vec::with_capacity(corners.len());
    let mut j = 0;
    while j + 1 < corners.len() {
        let current = corners[j];
        kept.push(current);
        if corners[j + 1] == current + 1 {
            j += 1;
        }
        j += 1;
    }

    let adjacent_to_kept = kept.last().is_some_and(|&k| last == k + 1);
    let wraps_to_first = last == last_index && corners[0] == 0;
    if kept.is_empty() || !(adjacent_to_kept || wraps_to_first) {
        kept.push(last);
    }

    *corners = kept;
}

/// Split one outline into curves at its corners.
///
/// With no corners the whole outline is one cyclic curve. Otherwise each
/// curve runs from one corner to the next, both included, and the last
/// one wraps from the final corner through the start of the outline to
/// the first corner.
pub fn split_at_corners(outline: &PixelOutline, config: &TracingConfig) -> CurveList {
    let corners = if outline.len() > 2 * config.corner_surround + 2 {
        find_corners(outline, config)
    } else {
        Vec::new()
    };
    split_at(outline, &corners)
}

fn split_at(outline: &PixelOutline, corners: &[usize]) -> CurveList {
    let mut list = CurveList::new(outline.clockwise);
    let points = &outline.points;

    let (Some(&first), Some(&last)) = (corners.first(), corners.last()) else {
        list.curves.push(Curve::from_int_points(points, true));
        return list;
    };

    for pair in corners.windows(2) {
        list.curves
            .push(Curve::from_int_points(&points[pair[0]..=pair[1]], false));
    }

    let wrap: Vec<IntPoint> = points[last..]
        .iter()
        .chain(&points[..=first])
        .copied()
        .collect();
    list.curves.push(Curve::from_int_points(&wrap, false));

    list
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::Bitmap;
    use crate::vectorize::decompose::decompose;
    use approx::assert_relative_eq;
    use kurbo::Point;

    fn square_outline(size: u32) -> PixelOutline {
        decompose(&Bitmap::from_fn(size, size, |_, _| true)).remove(0)
    }

    /// Counterclockwise outline through `vertices` in unit steps.
    fn walk(vertices: &[(i32, i32)]) -> PixelOutline {
        let mut points = Vec::new();
        for (i, &(x0, y0)) in vertices.iter().enumerate() {
            let (x1, y1) = vertices[(i + 1) % vertices.len()];
            let (dx, dy) = ((x1 - x0).signum(), (y1 - y0).signum());
            let (mut x, mut y) = (x0, y0);
            while (x, y) != (x1, y1) {
                points.push(IntPoint::new(x, y));
                x += dx;
                y += dy;
            }
        }
        PixelOutline {
            points,
            clockwise: false,
        }
    }

    #[test]
    fn straight_run_is_180_degrees() {
        let outline = square_outline(10);
        assert_relative_eq!(corner_angle(&outline, 6, 4), 180.0);
        assert_relative_eq!(corner_angle(&outline, 1, 4), 90.0);
    }

    #[test]
    fn square_has_four_corners() {
        let outline = square_outline(10);
        let corners = find_corners(&outline, &TracingConfig::default());
        assert_eq!(corners, vec![1, 11, 21, 31]);
    }

    #[test]
    fn sharp_spike_is_forced_in_before_sharper_neighbour() {
        // A one-pixel spike with a stepped tip; both tip points are under
        // the always-threshold and lie next to each other.
        let outline = walk(&[
            (12, 0),
            (12, 10),
            (8, 10),
            (8, 20),
            (7, 20),
            (7, 21),
            (6, 21),
            (6, 10),
            (0, 10),
            (0, 0),
        ]);
        assert_eq!(outline.points[26], IntPoint::new(7, 21));
        assert_eq!(outline.points[27], IntPoint::new(6, 21));
        assert!(corner_angle(&outline, 26, 4) <= 60.0);
        assert!(corner_angle(&outline, 27, 4) < corner_angle(&outline, 26, 4));

        let corners = find_corners(&outline, &TracingConfig::default());
        assert_eq!(corners, vec![0, 10, 14, 26, 38, 44, 54]);

        let sharpest_only = TracingConfig {
            corner_always_threshold: 0.0,
            ..TracingConfig::default()
        };
        let corners = find_corners(&outline, &sharpest_only);
        assert_eq!(corners, vec![0, 10, 14, 27, 38, 44, 54]);
    }

    #[test]
    fn equally_sharp_candidates_are_all_kept() {
        // A two-pixel-wide spike: its two tip corners have the same angle
        // and the point between them is slightly blunter.
        let outline = walk(&[
            (12, 0),
            (12, 10),
            (7, 10),
            (7, 20),
            (5, 20),
            (5, 10),
            (0, 10),
            (0, 0),
        ]);
        let left = corner_angle(&outline, 25, 4);
        let middle = corner_angle(&outline, 26, 4);
        let right = corner_angle(&outline, 27, 4);
        assert_relative_eq!(left, right, epsilon = 1e-9);
        assert!(middle > left);
        assert!(left > 60.0);

        let corners = find_corners(&outline, &TracingConfig::default());
        assert_eq!(corners, vec![0, 10, 15, 25, 27, 37, 42, 52]);
    }

    #[test]
    fn square_splits_into_four_sides() {
        let outline = square_outline(10);
        let list = split_at_corners(&outline, &TracingConfig::default());
        assert_eq!(list.len(), 4);
        assert!(list.curves.iter().all(|c| !c.cyclic && c.len() == 11));
        assert_eq!(list.curves[0].first(), Point::new(0.0, 10.0));
        assert_eq!(list.curves[0].last(), Point::new(0.0, 0.0));
        assert_eq!(list.curves[3].first(), Point::new(10.0, 10.0));
        assert_eq!(list.curves[3].last(), Point::new(0.0, 10.0));
        assert_eq!(list.curves.iter().map(Curve::len).sum::<usize>(), 44);
    }

    #[test]
    fn short_outline_is_one_cyclic_curve() {
        let outline = square_outline(2);
        let list = split_at_corners(&outline, &TracingConfig::default());
        assert_eq!(list.len(), 1);
        assert!(list.curves[0].cyclic);
        assert_eq!(list.curves[0].len(), 8);
    }

    #[test]
    fn adjacent_corners_are_merged() {
        let mut corners = vec![7, 3, 4, 12];
        remove_adjacent_corners(&mut corners, 20);
        assert_eq!(corners, vec![3, 7, 12]);

        let mut wrapping = vec![0, 5, 20];
        remove_adjacent_corners(&mut wrapping, 20);
        assert_eq!(wrapping, vec![0, 5]);

        let mut single = vec![9];
        remove_adjacent_corners(&mut single, 20);
        assert_eq!(single, vec![9]);
    }

    #[test]
    fn single_corner_wraps_whole_outline() {
        let outline = square_outline(10);
        let list = split_at(&outline, &[5]);
        assert_eq!(list.len(), 1);
        let curve = &list.curves[0];
        assert!(!curve.cyclic);
        assert_eq!(curve.len(), outline.len() + 1);
        assert_eq!(curve.first(), curve.last());
    }
}
