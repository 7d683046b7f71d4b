//! Gaussian blur of a single 8-bit plane.
//!
//! The plane is widened to `f32`, blurred with `imageproc`'s separable
//! Gaussian (edge samples replicated at the border) and rounded once.

use crate::image::buffer_dims;
use crate::util::math::saturate_u8;
use crate::util::{RegistrationError, RegistrationResult};
use image::{ImageBuffer, Luma};

/// Blurs a row-major `width x height` plane with a Gaussian of `sigma`.
pub(crate) fn gaussian_blur_u8(
    plane: &[u8],
    width: usize,
    height: usize,
    sigma: f32,
) -> RegistrationResult<Vec<u8>> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(RegistrationError::InvalidInput("sigma must be positive"));
    }
    let needed = width * height;
    if plane.len() != needed {
        return Err(RegistrationError::BufferTooSmall {
            needed,
            got: plane.len(),
        });
    }
    let (w, h) = buffer_dims(width, height)?;
    let samples: Vec<f32> = plane.iter().map(|&v| f32::from(v)).collect();
    let buf = ImageBuffer::<Luma<f32>, Vec<f32>>::from_raw(w, h, samples).ok_or(
        RegistrationError::BufferTooSmall {
            needed,
            got: plane.len(),
        },
    )?;
    let blurred = imageproc::filter::gaussian_blur_f32(&buf, sigma);
    Ok(blurred.into_raw().into_iter().map(saturate_u8).collect())
}

#[cfg(test)]
mod tests {
    use super::gaussian_blur_u8;
    use crate::util::RegistrationError;

    #[test]
    fn constant_plane_is_unchanged() {
        let plane = vec![77u8; 9 * 6];
        let out = gaussian_blur_u8(&plane, 9, 6, 1.5).unwrap();
        assert!(out.iter().all(|&v| v == 77));
    }

    #[test]
    fn impulse_spreads_symmetrically() {
        let mut plane = vec![0u8; 11 * 11];
        plane[5 * 11 + 5] = 255;
        let out = gaussian_blur_u8(&plane, 11, 11, 1.0).unwrap();
        assert!(out[5 * 11 + 5] < 255);
        assert!(out[5 * 11 + 4] > 0);
        assert!(out[5 * 11 + 4].abs_diff(out[5 * 11 + 6]) <= 1);
        assert!(out[4 * 11 + 5].abs_diff(out[6 * 11 + 5]) <= 1);
        assert_eq!(out[0], 0);
    }

    #[test]
    fn rejects_bad_sigma_and_length() {
        assert_eq!(
            gaussian_blur_u8(&[0; 4], 2, 2, 0.0).unwrap_err(),
            RegistrationError::InvalidInput("sigma must be positive")
        );
        assert_eq!(
            gaussian_blur_u8(&[0; 3], 2, 2, 1.0).unwrap_err(),
            RegistrationError::BufferTooSmall { needed: 4, got: 3 }
        );
    }
}
