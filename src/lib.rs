//! mask2bez: binary selection mask → closed bezier outlines.
//!
//! Traces the boundaries of the selected pixels of a mask and fits them
//! with lines and cubic beziers, one closed spline list per outline.
//! Outer outlines run counterclockwise and holes clockwise, in a y-up
//! frame with the origin at the bottom-left of the mask.
//!
//! # Example
//!
//! ```no_run
//! use mask2bez::{trace_mask, Bitmap, TracingConfig};
//!
//! let mask = Bitmap::from_fn(64, 64, |r, c| (8..56).contains(&r) && (8..56).contains(&c));
//! let lists = trace_mask(&mask, &TracingConfig::default())?;
//! let paths = mask2bez::output::to_bezpaths(&lists);
//! # Ok::<(), mask2bez::TraceError>(())
//! ```

#![forbid(unsafe_code)]

pub mod bitmap;
pub mod config;
pub mod error;
pub mod geom;
pub mod output;
pub mod vectorize;

// Re-export kurbo so downstream users get the same version
// used for points and paths.
pub use kurbo;

pub use bitmap::{Bitmap, Crop, Mask};
pub use config::{ThresholdMethod, TracingConfig};
pub use error::{FitError, TraceError};
pub use vectorize::fitted_splines;
pub use vectorize::spline::{Degree, Spline, SplineList, SplineListArray};

use tracing::debug;

/// Full pipeline: mask → one spline list per traced outline.
///
/// The configuration is validated first. A mask with no selected pixel
/// is an error; a mask whose outlines are all too small to fit gives an
/// empty array.
pub fn trace_mask<M: Mask>(mask: &M, config: &TracingConfig) -> Result<SplineListArray, TraceError> {
    config.validate()?;

    let outlines = vectorize::decompose::decompose(mask);
    if outlines.is_empty() {
        return Err(TraceError::EmptyMask);
    }
    debug!(
        width = mask.width(),
        height = mask.height(),
        outlines = outlines.len(),
        "traced mask"
    );

    Ok(fitted_splines(&outlines, config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_mask_is_an_error() {
        let mask = Bitmap::new(8, 8);
        let err = trace_mask(&mask, &TracingConfig::default()).unwrap_err();
        assert!(matches!(err, TraceError::EmptyMask));
    }

    #[test]
    fn invalid_config_is_rejected_before_tracing() {
        let mask = Bitmap::new(8, 8);
        let config = TracingConfig {
            filter_percent: 2.0,
            ..TracingConfig::default()
        };
        let err = trace_mask(&mask, &config).unwrap_err();
        assert!(matches!(err, TraceError::InvalidConfig(_)));
    }

    #[test]
    fn lone_pixel_gives_no_lists() {
        let mask = Bitmap::from_fn(3, 3, |r, c| r == 1 && c == 1);
        let lists = trace_mask(&mask, &TracingConfig::default()).unwrap();
        assert!(lists.is_empty());
    }

    #[test]
    fn gray_image_traces_like_bitmap() {
        let img = image::GrayImage::from_fn(12, 12, |x, y| {
            let inside = (2..10).contains(&x) && (3..9).contains(&y);
            image::Luma([if inside { 255 } else { 0 }])
        });
        let bitmap = Bitmap::from_gray(&img);
        let config = TracingConfig::default();
        assert_eq!(
            trace_mask(&img, &config).unwrap(),
            trace_mask(&bitmap, &config).unwrap()
        );
    }
}
