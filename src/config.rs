use serde::{Deserialize, Serialize};

use crate::error::TraceError;

/// All tracing parameters in one struct.
/// Serializable (for saving presets) and adjustable at runtime
/// (for dialog sliders). Call [`TracingConfig::validate`] before
/// handing a hand-built or deserialized value to the tracer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TracingConfig {
    // -- Corner detection --
    /// Number of points on either side of a point used to build the
    /// in/out vectors for the corner test.
    pub corner_surround: usize,
    /// A point whose in/out angle (degrees, 180 = straight) is at most
    /// this is a corner candidate. Range 0..=180.
    pub corner_threshold: f64,
    /// A candidate at or below this angle is a corner even when a
    /// sharper one lies within `corner_surround` points. Range 0..=180.
    pub corner_always_threshold: f64,

    // -- Filtering --
    /// Keep one-pixel staircase "knee" points instead of dropping them.
    pub keep_knees: bool,
    /// Number of smoothing passes over each curve.
    pub filter_iteration_count: usize,
    /// Neighbours on each side used for smoothing.
    pub filter_surround: usize,
    /// A second, usually smaller, neighbourhood that wins when it sees a
    /// sharper local feature.
    pub filter_alternative_surround: usize,
    /// Neighbourhood consulted when the chosen one sees a perfectly
    /// straight run. 0 disables it.
    pub filter_secondary_surround: usize,
    /// Degrees by which the alternative angle must exceed the primary one.
    pub filter_epsilon: f64,
    /// Fraction of the neighbour offset added to each point per pass.
    pub filter_percent: f64,

    // -- Fitting --
    /// Points on either side of an endpoint used for its tangent.
    pub tangent_surround: usize,
    /// Worst-point distance (pixels) below which a fit is accepted.
    pub error_threshold: f64,
    /// Stop reparameterizing once an iteration improves the error by less
    /// than this fraction.
    pub reparameterize_improvement: f64,
    /// Errors above this are too large for Newton-Raphson to fix; skip
    /// straight to subdivision.
    pub reparameterize_threshold: f64,
    /// Average distance (pixels) from the chord below which an accepted
    /// spline becomes a straight line.
    pub line_threshold: f64,
    /// Fraction of the curve length searched around the worst point for
    /// a better subdivision point.
    pub subdivide_search: f64,
    /// Points on either side used to test a subdivision candidate.
    pub subdivide_surround: usize,
    /// How far (pixels) a run may diverge from an axis and still count
    /// as straight when looking for a subdivision join.
    pub subdivide_threshold: f64,
    /// Maximum nesting of subdivisions; at the limit the best fit so far
    /// is accepted.
    pub max_subdivision_depth: usize,

    // -- Outline post-processing --
    /// Lines whose linearity exceeds this are turned back into curves
    /// when their outline also contains curves.
    pub line_reversion_threshold: f64,
    /// Spline endpoints closer than this on one axis are made equal.
    pub align_threshold: f64,
}

/// Threshold method for converting a grayscale image to a mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdMethod {
    /// Fixed brightness threshold (0-255).
    Fixed(u8),
    /// Otsu's method (automatic).
    Otsu,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            corner_surround: 4,
            corner_threshold: 100.0,
            corner_always_threshold: 60.0,
            keep_knees: false,
            filter_iteration_count: 4,
            filter_surround: 2,
            filter_alternative_surround: 1,
            filter_secondary_surround: 0,
            filter_epsilon: 10.0,
            filter_percent: 0.33,
            tangent_surround: 3,
            error_threshold: 0.4,
            reparameterize_improvement: 0.01,
            reparameterize_threshold: 1.0,
            line_threshold: 0.5,
            subdivide_search: 0.1,
            subdivide_surround: 4,
            subdivide_threshold: 0.03,
            max_subdivision_depth: 64,
            line_reversion_threshold: 0.01,
            align_threshold: 0.5,
        }
    }
}

impl TracingConfig {
    /// Reject out-of-range values before any tracing runs.
    pub fn validate(&self) -> Result<(), TraceError> {
        fn check(ok: bool, msg: &str) -> Result<(), TraceError> {
            if ok {
                Ok(())
            } else {
                Err(TraceError::InvalidConfig(msg.to_string()))
            }
        }
        fn finite_nonneg(v: f64) -> bool {
            v.is_finite() && v >= 0.0
        }

        check(self.corner_surround >= 1, "corner_surround must be at least 1")?;
        check(
            (0.0..=180.0).contains(&self.corner_threshold),
            "corner_threshold must be in 0..=180",
        )?;
        check(
            (0.0..=180.0).contains(&self.corner_always_threshold),
            "corner_always_threshold must be in 0..=180",
        )?;
        check(self.filter_surround >= 1, "filter_surround must be at least 1")?;
        check(
            self.filter_alternative_surround >= 1,
            "filter_alternative_surround must be at least 1",
        )?;
        check(finite_nonneg(self.filter_epsilon), "filter_epsilon must be >= 0")?;
        check(
            (0.0..=1.0).contains(&self.filter_percent),
            "filter_percent must be in 0..=1",
        )?;
        check(self.tangent_surround >= 1, "tangent_surround must be at least 1")?;
        check(
            self.error_threshold.is_finite() && self.error_threshold > 0.0,
            "error_threshold must be > 0",
        )?;
        check(
            (0.0..=1.0).contains(&self.reparameterize_improvement),
            "reparameterize_improvement must be in 0..=1",
        )?;
        check(
            finite_nonneg(self.reparameterize_threshold),
            "reparameterize_threshold must be >= 0",
        )?;
        check(finite_nonneg(self.line_threshold), "line_threshold must be >= 0")?;
        check(
            (0.0..=1.0).contains(&self.subdivide_search),
            "subdivide_search must be in 0..=1",
        )?;
        check(self.subdivide_surround >= 1, "subdivide_surround must be at least 1")?;
        check(
            finite_nonneg(self.subdivide_threshold),
            "subdivide_threshold must be >= 0",
        )?;
        check(
            self.max_subdivision_depth >= 1,
            "max_subdivision_depth must be at least 1",
        )?;
        check(
            finite_nonneg(self.line_reversion_threshold),
            "line_reversion_threshold must be >= 0",
        )?;
        check(finite_nonneg(self.align_threshold), "align_threshold must be >= 0")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(TracingConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_corner_threshold() {
        let config = TracingConfig {
            corner_threshold: 181.0,
            ..TracingConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("corner_threshold"));
    }

    #[test]
    fn rejects_zero_surround() {
        let config = TracingConfig {
            tangent_surround: 0,
            ..TracingConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn preset_fills_missing_fields_with_defaults() {
        let config: TracingConfig =
            serde_json::from_str(r#"{ "error_threshold": 0.8, "keep_knees": true }"#).unwrap();
        assert_eq!(config.error_threshold, 0.8);
        assert!(config.keep_knees);
        assert_eq!(config.corner_surround, 4);
    }
}
