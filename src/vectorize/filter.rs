//! Curve smoothing: knee removal and neighbour averaging.
//!
//! Pixel outlines are staircases. Knees (the inner step of a one-pixel
//! stair) are dropped first, then every point is pulled towards the
//! average of its neighbourhood a few times over. The endpoints of an
//! open curve are corners and never move.

use kurbo::{Point, Vec2};

use super::curve::Curve;
use crate::config::TracingConfig;
use crate::geom::{angle_degrees, epsilon_equal, IntPoint};

/// Curves shorter than this would collapse under filtering.
const MIN_FILTER_LENGTH: usize = 5;

// ── Knees ────────────────────────────────────────────────

/// Non-zero along exactly one axis.
fn only_one_zero(v: Vec2) -> bool {
    (v.x == 0.0 && v.y != 0.0) || (v.y == 0.0 && v.x != 0.0)
}

fn clockwise_knee(prev: Vec2, next: Vec2) -> bool {
    (prev.x == -1.0 && next.y == 1.0)
        || (prev.y == 1.0 && next.x == 1.0)
        || (prev.x == 1.0 && next.y == -1.0)
        || (prev.y == -1.0 && next.x == -1.0)
}

fn counterclockwise_knee(prev: Vec2, next: Vec2) -> bool {
    (prev.y == 1.0 && next.x == -1.0)
        || (prev.x == 1.0 && next.y == 1.0)
        || (prev.y == -1.0 && next.x == 1.0)
        || (prev.x == -1.0 && next.y == -1.0)
}

/// Drop knee points from `curve`, judged on integer-rounded coordinates.
///
/// The test compares each point with the last point kept, not the last
/// point seen, so two knees in a row cannot both survive.
pub fn remove_knee_points(curve: &mut Curve, clockwise: bool) {
    let n = curve.len();
    if n < 3 {
        return;
    }
    let offset = usize::from(!curve.cyclic);
    let rounded = |i: usize| IntPoint::from_point(curve.point(i));

    let mut previous = rounded(if curve.cyclic { n - 1 } else { 0 });
    let mut kept = Vec::with_capacity(n);
    if !curve.cyclic {
        kept.push(previous);
    }

    for i in offset..n - offset {
        let current = rounded(i);
        let next = rounded((i + 1) % n);
        let prev_delta = previous - current;
        let next_delta = next - current;

        let knee = only_one_zero(prev_delta)
            && only_one_zero(next_delta)
            && if clockwise {
                clockwise_knee(prev_delta, next_delta)
            } else {
                counterclockwise_knee(prev_delta, next_delta)
            };

        if !knee {
            previous = current;
            kept.push(current);
        }
    }

    if !curve.cyclic {
        kept.push(rounded(n - 1));
    }

    curve.set_coordinates(kept.into_iter().map(IntPoint::to_point).collect());
}

// ── Filtering ────────────────────────────────────────────

/// Neighbourhood of point `index`: the summed offsets to up to `surround`
/// points before it and after it, and how many points each side used.
///
/// Cyclic curves wrap; open curves stop at their ends, and both sides are
/// cut to the shorter one.
pub fn find_curve_vectors(curve: &Curve, index: usize, surround: usize) -> (Vec2, Vec2, usize) {
    let n = curve.len();
    let candidate = curve.point(index);

    let (before, after) = if curve.cyclic {
        (surround, surround)
    } else {
        (index, n - 1 - index)
    };
    let count = surround.min(before).min(after);

    let mut v_in = Vec2::ZERO;
    let mut v_out = Vec2::ZERO;
    for k in 1..=count {
        v_in += curve.point((index + n - k % n) % n) - candidate;
        v_out += curve.point((index + k) % n) - candidate;
    }
    (v_in, v_out, count)
}

/// Angle between `in` and `out` folded into [0, 45] degrees, so a turn and
/// its right-angle complement look the same.
pub fn filter_angle(v_in: Vec2, v_out: Vec2) -> f64 {
    let angle = angle_degrees(v_in, v_out) % 90.0;
    if angle > 45.0 {
        90.0 - angle
    } else {
        angle
    }
}

struct Window {
    v_in: Vec2,
    v_out: Vec2,
    count: usize,
    angle: f64,
}

impl Window {
    fn new(curve: &Curve, index: usize, surround: usize) -> Self {
        let (v_in, v_out, count) = find_curve_vectors(curve, index, surround);
        Self {
            v_in,
            v_out,
            count,
            angle: filter_angle(v_in, v_out),
        }
    }

    fn sum(&self) -> Vec2 {
        self.v_in + self.v_out
    }
}

fn filtered_point(curve: &Curve, index: usize, config: &TracingConfig) -> Point {
    let mut window = Window::new(curve, index, config.filter_surround);

    let alt = Window::new(curve, index, config.filter_alternative_surround);
    let alt_sum = alt.sum();
    if alt.angle - window.angle >= config.filter_epsilon && alt_sum.x != 0.0 && alt_sum.y != 0.0
    {
        window = alt;
    }

    if config.filter_secondary_surround > 0 && epsilon_equal(window.angle, 0.0) {
        let secondary = Window::new(curve, index, config.filter_secondary_surround);
        if !epsilon_equal(secondary.angle, 0.0) {
            window = secondary;
        }
    }

    let old = curve.point(index);
    if window.count == 0 {
        return old;
    }
    old + window.sum() * (config.filter_percent / window.count as f64)
}

/// Smooth `curve` in place, `filter_iteration_count` times.
///
/// Each pass reads only the previous pass's points.
pub fn filter(curve: &mut Curve, config: &TracingConfig) {
    let n = curve.len();
    if n < MIN_FILTER_LENGTH {
        return;
    }
    let offset = usize::from(!curve.cyclic);

    for _ in 0..config.filter_iteration_count {
        let mut smoothed = Vec::with_capacity(n);
        if offset == 1 {
            smoothed.push(curve.first());
        }
        smoothed.extend((offset..n - offset).map(|i| filtered_point(curve, i, config)));
        if offset == 1 {
            smoothed.push(curve.last());
        }
        curve.set_coordinates(smoothed);
    }
}
