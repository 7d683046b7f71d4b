//! Seeded RANSAC for homography estimation.
//!
//! Each trial draws four distinct correspondences, rejects samples with three
//! collinear points in either image, solves the DLT and scores the candidate by
//! its consensus set. The best candidate has the most inliers, ties broken by
//! the lowest summed inlier error. A final least-squares fit over the consensus
//! set replaces the candidate unless it loses inliers.
//!
//! The trial count is fixed and the generator is seeded, so identical inputs
//! always produce identical models and masks.

use super::{dlt, pair_error, Homography};
use crate::correspond::{CorrespondencePair, MIN_CORRESPONDENCES};
use crate::trace::{trace_event, trace_span};
use crate::util::math::cross2;
use crate::util::{RegistrationError, RegistrationResult, Stage};
use nalgebra::Matrix3;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// RANSAC configuration for homography fitting.
#[derive(Clone, Debug, PartialEq)]
pub struct RansacConfig {
    /// Inlier threshold on the reprojection error, in target pixels.
    pub reprojection_threshold: f64,
    /// Number of minimal samples drawn.
    pub max_iterations: usize,
    /// Seed of the sampling generator.
    pub seed: u64,
}

impl Default for RansacConfig {
    fn default() -> Self {
        Self {
            reprojection_threshold: 3.0,
            max_iterations: 2000,
            seed: 42,
        }
    }
}

impl RansacConfig {
    /// Checks that the parameters are usable.
    pub fn validate(&self) -> RegistrationResult<()> {
        if !self.reprojection_threshold.is_finite() || self.reprojection_threshold <= 0.0 {
            return Err(RegistrationError::InvalidInput(
                "reprojection threshold must be positive",
            ));
        }
        if self.max_iterations == 0 {
            return Err(RegistrationError::InvalidInput(
                "max_iterations must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Result of robust homography fitting.
#[derive(Clone, Debug, PartialEq)]
pub struct HomographyEstimate {
    /// Fitted source-to-target transform.
    pub homography: Homography,
    /// `true` for correspondences consistent with `homography`; parallel to the
    /// input slice.
    pub inlier_mask: Vec<bool>,
    /// Number of `true` entries in `inlier_mask`.
    pub inlier_count: usize,
    /// Mean reprojection error over inliers, in pixels.
    pub mean_inlier_error: f64,
    /// Number of RANSAC trials performed.
    pub iterations: usize,
    /// Whether the least-squares refit replaced the minimal-sample model.
    pub refined: bool,
}

impl HomographyEstimate {
    /// Fraction of correspondences that are inliers.
    pub fn inlier_ratio(&self) -> f64 {
        if self.inlier_mask.is_empty() {
            return 0.0;
        }
        self.inlier_count as f64 / self.inlier_mask.len() as f64
    }

    /// Returns the inlier subset of `pairs`, in input order.
    ///
    /// `pairs` must be the slice the estimate was computed from.
    pub fn inliers<'a>(
        &'a self,
        pairs: &'a [CorrespondencePair],
    ) -> impl Iterator<Item = &'a CorrespondencePair> + 'a {
        pairs
            .iter()
            .zip(&self.inlier_mask)
            .filter(|&(_, &inlier)| inlier)
            .map(|(p, _)| p)
    }
}

struct Consensus {
    h: Matrix3<f64>,
    mask: Vec<bool>,
    count: usize,
    total_error: f64,
}

impl Consensus {
    fn beats(&self, other: &Consensus) -> bool {
        self.count > other.count
            || (self.count == other.count && self.total_error < other.total_error)
    }
}

fn score(h: Matrix3<f64>, src: &[[f64; 2]], dst: &[[f64; 2]], threshold: f64) -> Consensus {
    let mut mask = vec![false; src.len()];
    let mut count = 0usize;
    let mut total_error = 0.0f64;
    for (i, (s, d)) in src.iter().zip(dst).enumerate() {
        let err = pair_error(&h, *s, *d);
        if err < threshold {
            mask[i] = true;
            count += 1;
            total_error += err;
        }
    }
    Consensus {
        h,
        mask,
        count,
        total_error,
    }
}

fn collinear(a: [f64; 2], b: [f64; 2], c: [f64; 2]) -> bool {
    let d2 = |p: [f64; 2], q: [f64; 2]| (p[0] - q[0]).powi(2) + (p[1] - q[1]).powi(2);
    let scale = d2(a, b).max(d2(a, c)).max(d2(b, c));
    scale < 1e-12 || cross2(a, b, c).abs() <= 1e-6 * scale
}

/// Returns `true` if any three of the four points are collinear.
fn sample_is_degenerate(pts: &[[f64; 2]; 4]) -> bool {
    const TRIPLES: [[usize; 3]; 4] = [[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]];
    TRIPLES
        .iter()
        .any(|t| collinear(pts[t[0]], pts[t[1]], pts[t[2]]))
}

/// Fits a homography to `pairs` with outlier rejection.
///
/// Fails with `InsufficientMatches` for fewer than four pairs and with
/// `DegenerateConfiguration` when no sample in general position yields a model.
pub fn estimate_homography(
    pairs: &[CorrespondencePair],
    cfg: &RansacConfig,
) -> RegistrationResult<HomographyEstimate> {
    let n = pairs.len();
    if n < MIN_CORRESPONDENCES {
        return Err(RegistrationError::InsufficientMatches {
            stage: Stage::Estimate,
            found: n,
            required: MIN_CORRESPONDENCES,
        });
    }
    cfg.validate()?;
    let _span = trace_span!("ransac", pairs = n, iterations = cfg.max_iterations).entered();

    let src: Vec<[f64; 2]> = pairs.iter().map(|p| p.source.to_array()).collect();
    let dst: Vec<[f64; 2]> = pairs.iter().map(|p| p.target.to_array()).collect();
    let threshold = cfg.reprojection_threshold;

    let mut rng = StdRng::seed_from_u64(cfg.seed);
    let mut best: Option<Consensus> = None;
    let mut degenerate = 0usize;

    for _ in 0..cfg.max_iterations {
        let idx = rand::seq::index::sample(&mut rng, n, MIN_CORRESPONDENCES);
        let mut s4 = [[0.0f64; 2]; 4];
        let mut d4 = [[0.0f64; 2]; 4];
        for (k, i) in idx.iter().enumerate() {
            s4[k] = src[i];
            d4[k] = dst[i];
        }
        if sample_is_degenerate(&s4) || sample_is_degenerate(&d4) {
            degenerate += 1;
            continue;
        }
        let Some(h) = dlt::solve_dlt(&s4, &d4) else {
            degenerate += 1;
            continue;
        };

        let candidate = score(h, &src, &dst, threshold);
        if best.as_ref().map_or(true, |b| candidate.beats(b)) {
            best = Some(candidate);
        }
    }

    let best = best.ok_or(RegistrationError::DegenerateConfiguration {
        stage: Stage::Estimate,
        reason: "no minimal sample in general position",
    })?;
    trace_event!(
        "ransac_best",
        inliers = best.count,
        degenerate_samples = degenerate
    );

    let inlier_src: Vec<[f64; 2]> = src
        .iter()
        .zip(&best.mask)
        .filter(|&(_, &m)| m)
        .map(|(p, _)| *p)
        .collect();
    let inlier_dst: Vec<[f64; 2]> = dst
        .iter()
        .zip(&best.mask)
        .filter(|&(_, &m)| m)
        .map(|(p, _)| *p)
        .collect();

    let refit = dlt::solve_dlt(&inlier_src, &inlier_dst)
        .map(|h| score(h, &src, &dst, threshold))
        .filter(|r| r.count >= best.count);
    let (chosen, refined) = match refit {
        Some(r) => (r, true),
        None => (best, false),
    };

    let homography = Homography::from_matrix(chosen.h)?;
    let mean_inlier_error = if chosen.count > 0 {
        chosen.total_error / chosen.count as f64
    } else {
        0.0
    };
    trace_event!(
        "ransac_final",
        inliers = chosen.count,
        total = n,
        refined = refined,
        mean_error = mean_inlier_error
    );

    Ok(HomographyEstimate {
        homography,
        inlier_mask: chosen.mask,
        inlier_count: chosen.count,
        mean_inlier_error,
        iterations: cfg.max_iterations,
        refined,
    })
}
