//! Vectorization pipeline: mask → spline outlines.
//!
//! 1. Pixel-edge outline extraction
//! 2. Corner detection and segmentation into curves
//! 3. Knee removal and smoothing
//! 4. Least-squares spline fitting with subdivision
//! 5. Per-outline line reconsideration and endpoint alignment

pub mod align;
pub mod corners;
pub mod curve;
pub mod decompose;
pub mod filter;
pub mod fit;
pub mod spline;

use rayon::prelude::*;
use tracing::debug;

use crate::config::TracingConfig;
use decompose::{PixelOutline, PixelOutlineList};
use spline::{SplineList, SplineListArray};

/// Outlines with this many points or fewer are a lone pixel or a
/// one-pixel hole and carry no shape worth fitting.
const MIN_OUTLINE_POINTS: usize = 4;

/// Fit every outline, in parallel, keeping outline order.
///
/// Each outline becomes one spline list; outlines too small to fit, or
/// whose curves all failed, contribute nothing.
pub fn fitted_splines(outlines: &PixelOutlineList, config: &TracingConfig) -> SplineListArray {
    let lists: Vec<Option<SplineList>> = outlines
        .par_iter()
        .enumerate()
        .map(|(i, outline)| fit_outline(i, outline, config))
        .collect();

    let result: SplineListArray = lists.into_iter().flatten().collect();
    debug!(
        outlines = outlines.len(),
        lists = result.len(),
        splines = result.iter().map(SplineList::len).sum::<usize>(),
        "fitted outlines"
    );
    result
}

fn fit_outline(index: usize, outline: &PixelOutline, config: &TracingConfig) -> Option<SplineList> {
    if outline.len() <= MIN_OUTLINE_POINTS {
        debug!(outline = index, points = outline.len(), "skipping degenerate outline");
        return None;
    }

    let curves = corners::split_at_corners(outline, config);
    debug!(
        outline = index,
        points = outline.len(),
        curves = curves.len(),
        clockwise = outline.clockwise,
        "segmented outline"
    );

    let list = align::fit_curve_list(curves, config);
    (!list.is_empty()).then_some(list)
}
