//! SarReg registers synthetic-aperture radar rasters onto optical reference
//! imagery.
//!
//! The crate covers everything around an external dense matcher: radiometric
//! normalization of the radar backscatter, edge enhancement of the optical
//! image, correspondence filtering, robust homography estimation and the
//! verification artifacts (inlier match drawing, perspective warp, overlay).
//! Color conversion, blurring and warping run in parallel with the `rayon`
//! feature; file loading and saving (including float TIFF rasters) is
//! available with `image-io`.
//!
//! ```no_run
//! use sarreg::{register, Determinism, PrecomputedMatcher, RegistrationConfig};
//! # fn run(radar: sarreg::RasterImage, optical: sarreg::DisplayImage,
//! #        matcher: PrecomputedMatcher) -> sarreg::RegistrationResult<()> {
//! let out = register(
//!     &radar,
//!     &optical,
//!     &matcher,
//!     &RegistrationConfig::default(),
//!     &Determinism::initialize(42),
//! )?;
//! println!("{} inliers", out.report.inliers);
//! # Ok(())
//! # }
//! ```

pub mod correspond;
pub mod enhance;
pub mod homography;
pub mod image;
pub mod pipeline;
pub mod radiometry;
pub mod render;
mod trace;
pub mod util;

pub use correspond::{
    filter_valid, to_pixel_pairs, CorrespondencePair, Matcher, NormalizedMatch, Point2,
    PrecomputedMatcher,
};
pub use enhance::{sharpen, SharpenConfig};
pub use homography::{
    estimate_homography, fit_homography, reprojection_error, Homography, HomographyEstimate,
    RansacConfig,
};
pub use self::image::{DisplayImage, RasterImage};
pub use pipeline::{
    register, Determinism, RegistrationConfig, RegistrationOutput, RegistrationReport,
};
pub use radiometry::{to_display_intensity, Compression, NormalizeConfig, RangeSelector};
pub use render::{
    match_color, render_matches, render_overlay, warp_perspective, MatchStyle, WarpedImage,
};
pub use util::{RegistrationError, RegistrationResult, Stage};
