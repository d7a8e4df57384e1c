use thiserror::Error;

/// Errors that can occur while tracing a mask.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TraceError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to load image: {0}")]
    ImageLoad(String),

    #[error("mask has no selected pixels")]
    EmptyMask,

    #[error("invalid preset: {0}")]
    Preset(#[from] serde_json::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a single curve could not be fit.
///
/// These never abort a trace: the curve is skipped and the rest of its
/// outline is still fit.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FitError {
    #[error("curve has {0} point(s), at least 2 are needed")]
    TooShort(usize),

    #[error("curve has zero length")]
    ZeroLength,

    #[error("least-squares system is singular")]
    SingularSystem,

    #[error("neither half of the subdivided curve could be fit")]
    BothHalvesFailed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        assert_eq!(TraceError::EmptyMask.to_string(), "mask has no selected pixels");
        assert!(FitError::TooShort(1).to_string().contains("1 point"));
    }
}
