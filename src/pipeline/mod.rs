//! End-to-end radar-to-optical registration.
//!
//! [`register`] runs the stages in order, each consuming the complete output
//! of its predecessor:
//!
//! 1. normalize the radar raster to 8-bit display intensity,
//! 2. sharpen the optical reference,
//! 3. query the matcher and convert its output to pixel correspondences,
//! 4. drop invalid correspondences,
//! 5. estimate the homography with RANSAC,
//! 6. render the inlier matches and the warped overlay.
//!
//! Any stage failure aborts the run; no partial artifacts are returned.

mod config;

pub use config::{Determinism, RegistrationConfig};

use crate::correspond::{filter_valid, to_pixel_pairs, Matcher, Point2};
use crate::enhance::sharpen;
use crate::homography::{estimate_homography, HomographyEstimate, RansacConfig};
use crate::image::{DisplayImage, RasterImage};
use crate::radiometry::to_display_intensity;
use crate::render::{render_matches, render_overlay, warp_perspective};
use crate::trace::{trace_event, trace_span, trace_warn};
use crate::util::RegistrationResult;

/// Inlier ratio below which a run is reported as suspicious.
pub const LOW_INLIER_RATIO: f64 = 0.1;

/// Match counts of a run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RegistrationReport {
    /// Correspondences returned by the matcher.
    pub total_matches: usize,
    /// Correspondences that survived filtering.
    pub valid_matches: usize,
    /// Correspondences consistent with the final homography.
    pub inliers: usize,
    /// `inliers / valid_matches`.
    pub inlier_ratio: f64,
}

/// Artifacts of a successful run.
#[derive(Clone, Debug)]
pub struct RegistrationOutput {
    /// Normalized radar image (single channel).
    pub radar_display: DisplayImage,
    /// Sharpened optical image (RGB).
    pub optical_display: DisplayImage,
    /// Side-by-side inlier visualization.
    pub matches_image: DisplayImage,
    /// Radar warped into the optical frame and blended over it.
    pub overlay: DisplayImage,
    /// Homography and inlier mask over the valid correspondences.
    pub estimate: HomographyEstimate,
    /// Match counts.
    pub report: RegistrationReport,
}

/// Registers `radar` onto `optical`.
///
/// `optical` may be gray or RGB; it is promoted to RGB before sharpening.
/// Fails with `InsufficientMatches` when fewer than four valid correspondences
/// remain and propagates every stage error unchanged.
pub fn register<M: Matcher + ?Sized>(
    radar: &RasterImage,
    optical: &DisplayImage,
    matcher: &M,
    cfg: &RegistrationConfig,
    determinism: &Determinism,
) -> RegistrationResult<RegistrationOutput> {
    cfg.validate()?;
    let _span = trace_span!("register", seed = determinism.seed()).entered();

    let radar_display = to_display_intensity(radar, &cfg.normalize)?;
    let optical_display = sharpen(&optical.to_rgb(), &cfg.sharpen)?;

    let matches = {
        let _span = trace_span!("match", samples = cfg.sample_count).entered();
        matcher.match_images(&radar_display.to_rgb(), &optical_display, cfg.sample_count)?
    };
    let source_size = (radar_display.width(), radar_display.height());
    let target_size = (optical_display.width(), optical_display.height());
    let raw = to_pixel_pairs(&matches, source_size, target_size);
    let pairs = filter_valid(&raw)?;

    let ransac = RansacConfig {
        seed: determinism.seed(),
        ..cfg.ransac.clone()
    };
    let estimate = estimate_homography(&pairs, &ransac)?;

    let report = RegistrationReport {
        total_matches: raw.len(),
        valid_matches: pairs.len(),
        inliers: estimate.inlier_count,
        inlier_ratio: estimate.inlier_ratio(),
    };
    trace_event!(
        "registration",
        total = report.total_matches,
        valid = report.valid_matches,
        inliers = report.inliers,
        ratio = report.inlier_ratio
    );
    if report.inlier_ratio < LOW_INLIER_RATIO {
        trace_warn!(
            "low_inlier_ratio",
            ratio = report.inlier_ratio,
            threshold = LOW_INLIER_RATIO
        );
    }

    let (pts_radar, pts_optical): (Vec<Point2>, Vec<Point2>) = estimate
        .inliers(&pairs)
        .map(|p| (p.source, p.target))
        .unzip();
    let matches_image = render_matches(
        &radar_display,
        &optical_display,
        &pts_radar,
        &pts_optical,
        cfg.max_shown,
        &cfg.style,
    )?;

    let warped = warp_perspective(
        &radar_display,
        &estimate.homography,
        optical_display.width(),
        optical_display.height(),
    )?;
    let overlay = render_overlay(&optical_display, &warped, cfg.overlay_alpha)?;

    Ok(RegistrationOutput {
        radar_display,
        optical_display,
        matches_image,
        overlay,
        estimate,
        report,
    })
}
