//! Per-outline aggregation: fit every curve of an outline, then make the
//! resulting spline list consistent as a whole.

use tracing::{debug, warn};

use super::curve::CurveList;
use super::filter::{filter, remove_knee_points};
use super::fit::fit_curve;
use super::spline::{Degree, SplineList};
use crate::config::TracingConfig;
use crate::geom::epsilon_equal;

/// Upper bound on alignment passes over one list.
const MAX_ALIGN_PASSES: usize = 1000;

/// Fit all curves of one outline into a single closed spline list.
///
/// Knees are removed and every curve is filtered before any fitting, so
/// tangents never see unfiltered neighbours. A curve that cannot be fit
/// is logged and left out.
pub fn fit_curve_list(mut curves: CurveList, config: &TracingConfig) -> SplineList {
    let clockwise = curves.clockwise;

    if !config.keep_knees {
        for curve in curves.curves.iter_mut() {
            remove_knee_points(curve, clockwise);
        }
    }
    for curve in curves.curves.iter_mut() {
        filter(curve, config);
    }

    // Close the loop so the list starts and ends on the same point.
    if let Some(first) = curves.curves.first_mut() {
        if first.cyclic && first.len() != 3 {
            let start = first.first();
            first.push(start);
        }
    }

    let mut list = SplineList::new(clockwise);
    for (i, curve) in curves.curves.iter_mut().enumerate() {
        match fit_curve(curve, config) {
            Ok(splines) => list.splines.extend(splines),
            Err(e) => warn!(curve = i, error = %e, "could not fit curve"),
        }
    }

    change_bad_lines(&mut list, config);
    align(&mut list, config);
    debug!(
        splines = list.len(),
        lines = list.count(Degree::Linear),
        clockwise,
        "fitted outline"
    );
    list
}

/// If the list holds any cubic, turn back into cubics the lines that were
/// not very straight to begin with.
pub fn change_bad_lines(list: &mut SplineList, config: &TracingConfig) {
    if !list.splines.iter().any(|s| s.degree() == Degree::Cubic) {
        return;
    }
    for spline in list.splines.iter_mut() {
        if spline.degree() == Degree::Linear && spline.linearity() > config.line_reversion_threshold
        {
            spline.set_degree(Degree::Cubic);
        }
    }
}

/// Snap spline endpoints that nearly line up on an axis.
///
/// For each spline whose start and end differ along an axis by a non-zero
/// amount no larger than `align_threshold`, that coordinate of its start,
/// its end, the previous spline's end and the next spline's start is set
/// to the average. Passes repeat until nothing changes.
pub fn align(list: &mut SplineList, config: &TracingConfig) {
    if list.is_empty() {
        return;
    }

    for _ in 0..MAX_ALIGN_PASSES {
        let mut changed = false;
        for i in 0..list.len() {
            let prev = list.prev_index(i);
            let next = list.next_index(i);

            for axis in [Axis::X, Axis::Y] {
                let start = axis.of(list.splines[i].start());
                let end = axis.of(list.splines[i].end());
                let delta = (end - start).abs();
                if epsilon_equal(delta, 0.0) || delta > config.align_threshold {
                    continue;
                }

                let mid = (start + end) / 2.0;
                axis.set(list.splines[i].start_mut(), mid);
                axis.set(list.splines[i].end_mut(), mid);
                axis.set(list.splines[prev].end_mut(), mid);
                axis.set(list.splines[next].start_mut(), mid);
                changed = true;
            }
        }
        if !changed {
            return;
        }
    }
    debug!("alignment did not settle");
}

#[derive(Clone, Copy)]
enum Axis {
    X,
    Y,
}

impl Axis {
    fn of(self, p: kurbo::Point) -> f64 {
        match self {
            Axis::X => p.x,
            Axis::Y => p.y,
        }
    }

    fn set(self, p: &mut kurbo::Point, value: f64) {
        match self {
            Axis::X => p.x = value,
            Axis::Y => p.y = value,
        }
    }
}
