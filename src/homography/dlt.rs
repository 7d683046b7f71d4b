//! Direct Linear Transform with Hartley normalization.

use nalgebra::{DMatrix, Matrix3, SVD};

/// Translates the centroid to the origin and scales so the mean distance to it
/// is `sqrt(2)`. Returns `None` when all points coincide.
fn normalize_points(pts: &[[f64; 2]]) -> Option<(Matrix3<f64>, Vec<[f64; 2]>)> {
    let n = pts.len() as f64;
    let cx = pts.iter().map(|p| p[0]).sum::<f64>() / n;
    let cy = pts.iter().map(|p| p[1]).sum::<f64>() / n;
    let mean_dist = pts
        .iter()
        .map(|p| ((p[0] - cx).powi(2) + (p[1] - cy).powi(2)).sqrt())
        .sum::<f64>()
        / n;
    if !mean_dist.is_finite() || mean_dist < 1e-12 {
        return None;
    }
    let s = std::f64::consts::SQRT_2 / mean_dist;
    let t = Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0);
    let normalized = pts
        .iter()
        .map(|p| [s * (p[0] - cx), s * (p[1] - cy)])
        .collect();
    Some((t, normalized))
}

/// Least-squares homography `dst ~ H * src` from at least four pairs.
///
/// Builds the `2n x 9` design matrix on normalized points and takes the right
/// singular vector of the smallest singular value. The result is scaled so
/// `h[2][2] = 1` when that entry is not vanishing. Returns `None` for fewer than
/// four points, coincident points, or a non-finite/singular solution.
pub(crate) fn solve_dlt(src: &[[f64; 2]], dst: &[[f64; 2]]) -> Option<Matrix3<f64>> {
    let n = src.len();
    if n < 4 || dst.len() != n {
        return None;
    }
    let (t_src, src_n) = normalize_points(src)?;
    let (t_dst, dst_n) = normalize_points(dst)?;

    // Pad to at least 9 rows so the thin SVD still exposes the null vector.
    let rows = (2 * n).max(9);
    let mut a = DMatrix::<f64>::zeros(rows, 9);
    for i in 0..n {
        let [sx, sy] = src_n[i];
        let [dx, dy] = dst_n[i];
        let r = 2 * i;
        a[(r, 0)] = -sx;
        a[(r, 1)] = -sy;
        a[(r, 2)] = -1.0;
        a[(r, 6)] = dx * sx;
        a[(r, 7)] = dx * sy;
        a[(r, 8)] = dx;
        a[(r + 1, 3)] = -sx;
        a[(r + 1, 4)] = -sy;
        a[(r + 1, 5)] = -1.0;
        a[(r + 1, 6)] = dy * sx;
        a[(r + 1, 7)] = dy * sy;
        a[(r + 1, 8)] = dy;
    }

    let svd = SVD::new(a, false, true);
    let v_t = svd.v_t?;
    let (min_idx, _) = svd
        .singular_values
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.total_cmp(b.1))?;
    let h = v_t.row(min_idx);
    let h_norm = Matrix3::new(h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], h[8]);

    let h = t_dst.try_inverse()? * h_norm * t_src;
    let scale = h[(2, 2)];
    let h = if scale.abs() > 1e-12 {
        h / scale
    } else {
        h / h.norm()
    };
    if !h.iter().all(|v| v.is_finite()) || h.determinant().abs() < 1e-12 {
        return None;
    }
    Some(h)
}
