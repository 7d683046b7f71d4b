//! Error types for sarreg.

use std::fmt;
use thiserror::Error;

/// Result alias for sarreg operations.
pub type RegistrationResult<T> = std::result::Result<T, RegistrationError>;

/// Pipeline stage that produced an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    /// Reading rasters or display images.
    Load,
    /// Radiometric normalization of the radar raster.
    Normalize,
    /// Luminance sharpening of the optical image.
    Enhance,
    /// External dense matcher invocation.
    Match,
    /// Correspondence validation.
    Filter,
    /// Robust homography estimation.
    Estimate,
    /// Warping and artifact rendering.
    Render,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Load => "load",
            Stage::Normalize => "normalize",
            Stage::Enhance => "enhance",
            Stage::Match => "match",
            Stage::Filter => "filter",
            Stage::Estimate => "estimate",
            Stage::Render => "render",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while registering a radar raster to an optical image.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum RegistrationError {
    /// An input image or raster could not be loaded.
    #[error("input unavailable: {reason}")]
    InputUnavailable { reason: String },
    /// An output artifact could not be written.
    #[error("output unavailable: {reason}")]
    OutputUnavailable { reason: String },
    /// Too few usable correspondences to fit a homography.
    #[error("{stage}: insufficient matches (found {found}, need {required})")]
    InsufficientMatches {
        stage: Stage,
        found: usize,
        required: usize,
    },
    /// No minimal sample in general position was found.
    #[error("{stage}: degenerate configuration: {reason}")]
    DegenerateConfiguration { stage: Stage, reason: &'static str },
    /// A guarded division or inversion would have produced NaN/inf.
    #[error("{stage}: numeric instability: {reason}")]
    NumericInstability { stage: Stage, reason: &'static str },
    /// The image dimensions are zero or overflow.
    #[error("invalid dimensions {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// The backing buffer does not match the declared dimensions.
    #[error("buffer size mismatch (need {needed}, got {got})")]
    BufferTooSmall { needed: usize, got: usize },
    /// The input data or parameters are invalid.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// The external matcher reported a failure.
    #[error("matcher failed: {reason}")]
    Matcher { reason: String },
}
