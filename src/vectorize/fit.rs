//! Least-squares cubic fitting with reparameterization and subdivision.
//!
//! A curve is first fit with a single cubic whose inner controls lie on
//! the tangent half-lines at its endpoints. Newton-Raphson then moves
//! each point's parameter towards the closest point on the spline and the
//! fit is redone, for as long as that keeps helping. If the best fit is
//! still too far off, the curve is split near its worst point and both
//! halves are fit the same way.

use kurbo::Vec2;
use tracing::{trace, warn};

use super::curve::Curve;
use super::filter::find_curve_vectors;
use super::spline::{Degree, Spline};
use crate::config::TracingConfig;
use crate::error::FitError;
use crate::geom::epsilon_equal;

/// Upper bound on Newton-Raphson rounds for one curve.
const MAX_REPARAMETERIZE: usize = 100;

/// Fit `curve` with one or more splines.
///
/// Curves of two or three points become a straight line. Longer curves
/// get their endpoint tangents computed (unless already cached) and go
/// through least squares.
pub fn fit_curve(curve: &mut Curve, config: &TracingConfig) -> Result<Vec<Spline>, FitError> {
    fit_at_depth(curve, config, 0)
}

fn fit_at_depth(
    curve: &mut Curve,
    config: &TracingConfig,
    depth: usize,
) -> Result<Vec<Spline>, FitError> {
    match curve.len() {
        n if n < 2 => Err(FitError::TooShort(n)),
        n if n < 4 => Ok(vec![fit_with_line(curve)]),
        _ => fit_with_least_squares(curve, config, depth),
    }
}

/// A line through the curve's endpoints, never reverted to a cubic.
pub fn fit_with_line(curve: &Curve) -> Spline {
    Spline::line(curve.first(), curve.last())
}

// ── Tangents ─────────────────────────────────────────────

/// Sum of the chords from one endpoint to up to `surround` points along
/// the curve, pointing in the direction of travel, and the number of
/// points used.
pub fn find_half_tangent(curve: &Curve, at_start: bool, surround: usize) -> (Vec2, usize) {
    let n = curve.len();
    let used = surround.min(n.saturating_sub(1));
    let mut tangent = Vec2::ZERO;
    if at_start {
        let anchor = curve.first();
        for p in 1..=used {
            tangent += curve.point(p) - anchor;
        }
    } else {
        let anchor = curve.last();
        for p in 1..=used {
            tangent += anchor - curve.point(n - 1 - p);
        }
    }
    (tangent, used)
}

fn average(tangent: Vec2, count: usize) -> Vec2 {
    if count == 0 {
        tangent
    } else {
        tangent / count as f64
    }
}

/// Tangent shared by two curves that meet at `left`'s last point, which is
/// also `right`'s first.
pub fn join_tangent(left: &Curve, right: &Curve, surround: usize) -> Vec2 {
    let (incoming, n_in) = find_half_tangent(left, false, surround);
    let (outgoing, n_out) = find_half_tangent(right, true, surround);
    average(incoming + outgoing, n_in + n_out)
}

/// Fill in whichever endpoint tangents are not cached yet.
///
/// A cyclic curve meets itself at its first point, so both of its
/// tangents are computed across that point; if that cancels out to zero
/// the one-sided tangents are used.
fn find_tangents(curve: &mut Curve, surround: usize) {
    let (start, n_start) = find_half_tangent(curve, true, surround);
    let (end, n_end) = find_half_tangent(curve, false, surround);

    let (start_tangent, end_tangent) = if curve.cyclic {
        let across = average(start + end, n_start + n_end);
        if across == Vec2::ZERO {
            (average(start, n_start), average(end, n_end))
        } else {
            (across, across)
        }
    } else {
        (average(start, n_start), average(end, n_end))
    };

    if curve.start_tangent().is_none() {
        curve.set_start_tangent(start_tangent);
    }
    if curve.end_tangent().is_none() {
        curve.set_end_tangent(end_tangent);
    }
}

// ── Least squares ────────────────────────────────────────

/// Chord-length parameterization: each point's `t` is its distance along
/// the curve, normalized to [0, 1].
pub fn set_initial_parameter_values(curve: &mut Curve) -> Result<(), FitError> {
    let mut total = 0.0;
    let mut previous = curve.first();
    for cp in curve.points.iter_mut() {
        total += cp.point.distance(previous);
        previous = cp.point;
        cp.t = total;
    }
    if total == 0.0 {
        return Err(FitError::ZeroLength);
    }
    for cp in curve.points.iter_mut() {
        cp.t /= total;
    }
    Ok(())
}

fn bernstein(t: f64) -> [f64; 4] {
    let s = 1.0 - t;
    [s * s * s, 3.0 * t * s * s, 3.0 * t * t * s, t * t * t]
}

/// The cubic through the curve's endpoints whose controls, placed along
/// the cached tangents, minimize the squared distance to the points at
/// their `t` values.
pub fn fit_one_spline(curve: &Curve) -> Result<Spline, FitError> {
    let t1 = curve.start_tangent().unwrap_or(Vec2::ZERO);
    let t2 = curve.end_tangent().unwrap_or(Vec2::ZERO);
    let start = curve.first();
    let end = curve.last();

    let mut c = [[0.0; 2]; 2];
    let mut x = [0.0; 2];
    for cp in &curve.points {
        let b = bernstein(cp.t);
        let a0 = t1 * b[1];
        let a1 = t2 * b[2];

        c[0][0] += a0.dot(a0);
        c[0][1] += a0.dot(a1);
        c[1][1] += a1.dot(a1);

        let on_chord = start.to_vec2() * (b[0] + b[1]) + end.to_vec2() * (b[2] + b[3]);
        let residual = cp.point.to_vec2() - on_chord;
        x[0] += residual.dot(a0);
        x[1] += residual.dot(a1);
    }
    c[1][0] = c[0][1];

    let det = c[0][0] * c[1][1] - c[1][0] * c[0][1];
    if !det.is_finite() || det.abs() <= f64::EPSILON * (c[0][0] * c[1][1]).abs() {
        return Err(FitError::SingularSystem);
    }
    let alpha1 = (x[0] * c[1][1] - x[1] * c[0][1]) / det;
    let alpha2 = (c[0][0] * x[1] - c[0][1] * x[0]) / det;

    Ok(Spline::cubic(
        start,
        start + t1 * alpha1,
        end + t2 * alpha2,
        end,
    ))
}

/// Largest distance between a point and the spline at the point's `t`,
/// and that point's index.
pub fn find_error(curve: &Curve, spline: &Spline) -> (f64, usize) {
    curve
        .points
        .iter()
        .enumerate()
        .fold((0.0, 0), |(worst, worst_index), (i, cp)| {
            let error = cp.point.distance(spline.evaluate(cp.t));
            if error > worst {
                (error, i)
            } else {
                (worst, worst_index)
            }
        })
}

/// One Newton-Raphson step on every point's `t`, moving it towards the
/// nearest point of `spline`.
///
/// Returns false, leaving every `t` alone, if any step is undefined or
/// would move its point further away; the fit is then not good enough
/// for the iteration to converge.
pub fn reparameterize(curve: &mut Curve, spline: &Spline) -> bool {
    let first = spline.derivative();
    let second = first.derivative();

    let mut updated = Vec::with_capacity(curve.len());
    for cp in &curve.points {
        let s = spline.evaluate(cp.t);
        let s1 = first.evaluate(cp.t).to_vec2();
        let s2 = second.evaluate(cp.t).to_vec2();
        let d = s - cp.point;

        let numerator = d.dot(s1);
        let denominator = s1.hypot2() + d.dot(s2);
        if denominator == 0.0 {
            return false;
        }
        let t = cp.t - numerator / denominator;
        if !t.is_finite() {
            return false;
        }

        let old_distance = s.distance(cp.point);
        let new_distance = spline.evaluate(t).distance(cp.point);
        if new_distance > old_distance {
            return false;
        }
        updated.push(t);
    }

    set_parameters(curve, &updated);
    true
}

fn parameters(curve: &Curve) -> Vec<f64> {
    curve.points.iter().map(|cp| cp.t).collect()
}

fn set_parameters(curve: &mut Curve, ts: &[f64]) {
    for (cp, &t) in curve.points.iter_mut().zip(ts) {
        cp.t = t;
    }
}

// ── Linearity ────────────────────────────────────────────

/// Record how far `spline` strays from its chord and report whether it is
/// close enough to be drawn as a line.
///
/// The spline is sampled at the curve's `t` values; the mean distance
/// from the chord is compared with `line_threshold`, and that mean
/// divided once more by the number of points becomes the linearity.
pub fn spline_linear_enough(spline: &mut Spline, curve: &Curve, config: &TracingConfig) -> bool {
    let start = spline.start();
    let end = spline.end();

    let (a, b, c) = if epsilon_equal(start.x, end.x) {
        (1.0, 0.0, -start.x)
    } else {
        let slope = (end.y - start.y) / (end.x - start.x);
        (-slope, 1.0, slope * start.x - start.y)
    };
    let norm = (a * a + b * b).sqrt();

    let n = curve.len() as f64;
    let total: f64 = curve
        .points
        .iter()
        .map(|cp| {
            let p = spline.evaluate(cp.t);
            (a * p.x + b * p.y + c).abs() / norm
        })
        .sum();
    let average = total / n;

    spline.set_linearity(average / n);
    average < config.line_threshold
}

// ── Subdivision ──────────────────────────────────────────

/// Whether `index` is a join between a straight axis-aligned run and a
/// slanted one, and if so whether it beats `best`.
///
/// `best` holds the smallest near-zero component seen so far; it is only
/// lowered, and only a join that lowers it counts as better.
pub fn test_subdivision_point(
    curve: &Curve,
    index: usize,
    best: &mut Vec2,
    config: &TracingConfig,
) -> bool {
    let (v_in, v_out, count) = find_curve_vectors(curve, index, config.subdivide_surround);
    if count != config.subdivide_surround {
        return false;
    }

    let threshold = config.subdivide_threshold;
    let v_in = Vec2::new(v_in.x.abs(), v_in.y.abs());
    let v_out = Vec2::new(v_out.x.abs(), v_out.y.abs());

    let only_one_less = |v: Vec2| {
        (v.x < threshold && v.y > threshold) || (v.y < threshold && v.x > threshold)
    };
    let both_greater = |v: Vec2| v.x > threshold && v.y > threshold;
    let join = (only_one_less(v_in) && both_greater(v_out))
        || (only_one_less(v_out) && both_greater(v_in));
    if !join {
        return false;
    }

    let mut improved = false;
    for v in [v_in, v_out] {
        if v.x < threshold && v.x < best.x {
            best.x = v.x;
            improved = true;
        }
        if v.y < threshold && v.y < best.y {
            best.y = v.y;
            improved = true;
        }
    }
    improved
}

/// Where to split a curve whose worst point is `initial`.
///
/// Searches `subdivide_search * len` points backward from `initial`, then
/// forward, for the best join; falls back to `initial` itself.
pub fn find_subdivision(curve: &Curve, initial: usize, config: &TracingConfig) -> usize {
    let n = curve.len();
    let search = (config.subdivide_search * n as f64) as usize;
    let mut best = Vec2::new(f64::MAX, f64::MAX);
    let mut best_point = None;

    let mut i = initial;
    let mut done = 0;
    while i > 0 && done < search {
        if test_subdivision_point(curve, i, &mut best, config) {
            best_point = Some(i);
        }
        i -= 1;
        done += 1;
    }
    if let Some(found) = best_point {
        return found;
    }

    let mut i = initial + 1;
    let mut done = 0;
    while i + 1 < n && done < search {
        if test_subdivision_point(curve, i, &mut best, config) {
            best_point = Some(i);
        }
        i += 1;
        done += 1;
    }
    best_point.unwrap_or(initial)
}

// ── Driver ───────────────────────────────────────────────

fn fit_with_least_squares(
    curve: &mut Curve,
    config: &TracingConfig,
    depth: usize,
) -> Result<Vec<Spline>, FitError> {
    find_tangents(curve, config.tangent_surround);
    set_initial_parameter_values(curve)?;

    let mut spline = fit_one_spline(curve)?;
    let (mut error, mut worst) = find_error(curve, &spline);
    let mut best = (spline, error, worst);
    let mut best_t = parameters(curve);
    let mut previous_error = f64::MAX;

    for _ in 0..MAX_REPARAMETERIZE {
        let improvement = 1.0 - error / previous_error;
        if !(improvement >= config.reparameterize_improvement)
            || error > config.reparameterize_threshold
            || error == 0.0
        {
            break;
        }
        if !reparameterize(curve, &spline) {
            break;
        }
        previous_error = error;

        spline = match fit_one_spline(curve) {
            Ok(s) => s,
            Err(_) => break,
        };
        (error, worst) = find_error(curve, &spline);
        if error <= previous_error {
            best = (spline, error, worst);
            best_t = parameters(curve);
        }
    }

    // Leave the curve parameterized for the fit that is kept.
    set_parameters(curve, &best_t);
    let (mut spline, error, worst) = best;
    if error < config.error_threshold || depth >= config.max_subdivision_depth {
        if spline_linear_enough(&mut spline, curve, config) {
            spline.set_degree(Degree::Linear);
        }
        return Ok(vec![spline]);
    }

    subdivide(curve, worst, config, depth)
}

fn subdivide(
    curve: &Curve,
    worst: usize,
    config: &TracingConfig,
    depth: usize,
) -> Result<Vec<Spline>, FitError> {
    let last = curve.len() - 1;
    let index = find_subdivision(curve, worst, config).clamp(1, last - 1);
    trace!(index, depth, "subdividing curve of {} points", curve.len());

    let mut left = curve.sub_curve(0..=index);
    let mut right = curve.sub_curve(index..=last);
    if let Some(t) = curve.start_tangent() {
        left.set_start_tangent(t);
    }
    if let Some(t) = curve.end_tangent() {
        right.set_end_tangent(t);
    }
    let join = join_tangent(&left, &right, config.tangent_surround);
    left.set_end_tangent(join);
    right.set_start_tangent(join);

    let left_fit = fit_at_depth(&mut left, config, depth + 1);
    let right_fit = fit_at_depth(&mut right, config, depth + 1);

    match (left_fit, right_fit) {
        (Ok(mut l), Ok(r)) => {
            l.extend(r);
            Ok(l)
        }
        (Ok(l), Err(e)) => {
            warn!(error = %e, at = ?curve.point(index), "could not fit right half");
            Ok(l)
        }
        (Err(e), Ok(r)) => {
            warn!(error = %e, at = ?curve.point(index), "could not fit left half");
            Ok(r)
        }
        (Err(_), Err(_)) => Err(FitError::BothHalvesFailed),
    }
}
