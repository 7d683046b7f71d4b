//! Planar projective transforms between the radar and optical frames.
//!
//! Provides:
//! - [`Homography`], a 3x3 matrix mapping source pixels to target pixels.
//! - Least-squares fitting from correspondences ([`fit_homography`]).
//! - Seeded RANSAC with a final refit on the consensus set
//!   ([`estimate_homography`]).

mod dlt;
mod ransac;

pub use ransac::{estimate_homography, HomographyEstimate, RansacConfig};

use crate::correspond::{CorrespondencePair, Point2, MIN_CORRESPONDENCES};
use crate::util::{RegistrationError, RegistrationResult, Stage};
use nalgebra::{Matrix2, Matrix3, Vector3};

/// Projective transform `target ~ H * [x, y, 1]^T`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Homography {
    m: Matrix3<f64>,
}

impl Homography {
    /// The identity transform.
    pub fn identity() -> Self {
        Self {
            m: Matrix3::identity(),
        }
    }

    /// Wraps a matrix, rejecting non-finite or singular input.
    ///
    /// The matrix is rescaled so `h[2][2] = 1` when that entry is non-zero.
    pub fn from_matrix(m: Matrix3<f64>) -> RegistrationResult<Self> {
        if !m.iter().all(|v| v.is_finite()) {
            return Err(RegistrationError::NumericInstability {
                stage: Stage::Estimate,
                reason: "homography has non-finite entries",
            });
        }
        if m.determinant().abs() < 1e-15 {
            return Err(RegistrationError::NumericInstability {
                stage: Stage::Estimate,
                reason: "homography is singular",
            });
        }
        let scale = m[(2, 2)];
        let m = if scale.abs() > 1e-12 { m / scale } else { m };
        Ok(Self { m })
    }

    /// Builds a homography from row-major entries.
    pub fn from_row_slice(values: &[f64; 9]) -> RegistrationResult<Self> {
        Self::from_matrix(Matrix3::from_row_slice(values))
    }

    /// Returns the underlying matrix.
    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.m
    }

    /// Returns the entries in row-major order.
    pub fn to_row_major(&self) -> [f64; 9] {
        let m = &self.m;
        [
            m[(0, 0)],
            m[(0, 1)],
            m[(0, 2)],
            m[(1, 0)],
            m[(1, 1)],
            m[(1, 2)],
            m[(2, 0)],
            m[(2, 1)],
            m[(2, 2)],
        ]
    }

    /// Maps a source point to the target frame.
    ///
    /// Returns `None` when the point lands on the line at infinity.
    pub fn project(&self, p: Point2) -> Option<Point2> {
        project(&self.m, p.to_array()).map(|[x, y]| Point2::new(x, y))
    }

    /// Returns the inverse transform (target to source).
    pub fn inverse(&self) -> RegistrationResult<Self> {
        let inv = self
            .m
            .try_inverse()
            .ok_or(RegistrationError::NumericInstability {
                stage: Stage::Estimate,
                reason: "homography is not invertible",
            })?;
        Self::from_matrix(inv)
    }

    /// Largest absolute entry-wise difference to `other` after both are scaled
    /// to `h[2][2] = 1`.
    pub fn max_abs_diff(&self, other: &Homography) -> f64 {
        self.m
            .iter()
            .zip(other.m.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max)
    }
}

impl Default for Homography {
    fn default() -> Self {
        Self::identity()
    }
}

pub(crate) fn project(h: &Matrix3<f64>, p: [f64; 2]) -> Option<[f64; 2]> {
    let q = h * Vector3::new(p[0], p[1], 1.0);
    if q[2].abs() < 1e-15 {
        return None;
    }
    let out = [q[0] / q[2], q[1] / q[2]];
    if out[0].is_finite() && out[1].is_finite() {
        Some(out)
    } else {
        None
    }
}

/// Euclidean distance between `H * source` and `target` in target pixels.
///
/// Points projected to infinity have an infinite error.
pub fn reprojection_error(h: &Homography, pair: &CorrespondencePair) -> f64 {
    pair_error(&h.m, pair.source.to_array(), pair.target.to_array())
}

pub(crate) fn pair_error(h: &Matrix3<f64>, src: [f64; 2], dst: [f64; 2]) -> f64 {
    match project(h, src) {
        Some(p) => ((p[0] - dst[0]).powi(2) + (p[1] - dst[1]).powi(2)).sqrt(),
        None => f64::INFINITY,
    }
}

/// Returns `true` if all points lie (numerically) on a single line.
pub(crate) fn all_collinear(pts: &[[f64; 2]]) -> bool {
    let n = pts.len() as f64;
    if pts.is_empty() {
        return true;
    }
    let cx = pts.iter().map(|p| p[0]).sum::<f64>() / n;
    let cy = pts.iter().map(|p| p[1]).sum::<f64>() / n;
    let mut cov = Matrix2::<f64>::zeros();
    for p in pts {
        let dx = p[0] - cx;
        let dy = p[1] - cy;
        cov[(0, 0)] += dx * dx;
        cov[(0, 1)] += dx * dy;
        cov[(1, 1)] += dy * dy;
    }
    cov[(1, 0)] = cov[(0, 1)];
    let eig = cov.symmetric_eigenvalues();
    let (lo, hi) = (eig[0].min(eig[1]), eig[0].max(eig[1]));
    hi <= 1e-12 || lo <= 1e-10 * hi
}

/// Least-squares homography over every pair in `pairs`.
///
/// Fails with `InsufficientMatches` below four pairs and with
/// `DegenerateConfiguration` when either point set is collinear or no unique
/// solution exists.
pub fn fit_homography(pairs: &[CorrespondencePair]) -> RegistrationResult<Homography> {
    if pairs.len() < MIN_CORRESPONDENCES {
        return Err(RegistrationError::InsufficientMatches {
            stage: Stage::Estimate,
            found: pairs.len(),
            required: MIN_CORRESPONDENCES,
        });
    }
    let src: Vec<[f64; 2]> = pairs.iter().map(|p| p.source.to_array()).collect();
    let dst: Vec<[f64; 2]> = pairs.iter().map(|p| p.target.to_array()).collect();
    if all_collinear(&src) || all_collinear(&dst) {
        return Err(RegistrationError::DegenerateConfiguration {
            stage: Stage::Estimate,
            reason: "correspondences are collinear",
        });
    }
    let m = dlt::solve_dlt(&src, &dst).ok_or(RegistrationError::DegenerateConfiguration {
        stage: Stage::Estimate,
        reason: "no unique homography for the given points",
    })?;
    Homography::from_matrix(m)
}
