//! Luminance unsharp masking for the optical reference.
//!
//! Structure in the optical image is boosted before matching so the dense
//! matcher latches on edges rather than on flat color regions. Only the
//! lightness plane is modified; chroma passes through untouched.

mod blur;
mod lab;

use crate::image::DisplayImage;
use crate::trace::trace_span;
use crate::util::math::saturate_u8;
use crate::util::{RegistrationError, RegistrationResult};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Unsharp-mask parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SharpenConfig {
    /// Standard deviation of the Gaussian blur in pixels.
    pub sigma: f32,
    /// Weight of the original lightness; values above 1 sharpen.
    pub strength: f32,
}

impl Default for SharpenConfig {
    fn default() -> Self {
        Self {
            sigma: 1.0,
            strength: 1.1,
        }
    }
}

impl SharpenConfig {
    /// Checks that the parameters are usable.
    pub fn validate(&self) -> RegistrationResult<()> {
        if !self.sigma.is_finite() || self.sigma <= 0.0 {
            return Err(RegistrationError::InvalidInput("sigma must be positive"));
        }
        if !self.strength.is_finite() {
            return Err(RegistrationError::InvalidInput("strength must be finite"));
        }
        Ok(())
    }
}

/// Sharpens the lightness of an RGB image.
///
/// `L' = clip(strength * L + (1 - strength) * gauss(L, sigma), 0, 255)`
pub fn sharpen(image: &DisplayImage, cfg: &SharpenConfig) -> RegistrationResult<DisplayImage> {
    cfg.validate()?;
    if image.channels() != 3 {
        return Err(RegistrationError::InvalidInput(
            "sharpening requires a three-channel image",
        ));
    }
    let _span = trace_span!("sharpen", sigma = cfg.sigma, strength = cfg.strength).entered();

    let width = image.width();
    let height = image.height();
    let to_lab = |px: &[u8]| lab::rgb_to_lab8([px[0], px[1], px[2]]);
    #[cfg(feature = "rayon")]
    let lab: Vec<[u8; 3]> = image.data().par_chunks_exact(3).map(to_lab).collect();
    #[cfg(not(feature = "rayon"))]
    let lab: Vec<[u8; 3]> = image.data().chunks_exact(3).map(to_lab).collect();

    let lightness: Vec<u8> = lab.iter().map(|px| px[0]).collect();
    let blurred = blur::gaussian_blur_u8(&lightness, width, height, cfg.sigma)?;

    let recombine = |(px, &b): (&[u8; 3], &u8)| {
        let sharpened = cfg.strength * f32::from(px[0]) + (1.0 - cfg.strength) * f32::from(b);
        lab::lab8_to_rgb([saturate_u8(sharpened), px[1], px[2]])
    };
    #[cfg(feature = "rayon")]
    let rgb: Vec<[u8; 3]> = lab.par_iter().zip(blurred.par_iter()).map(recombine).collect();
    #[cfg(not(feature = "rayon"))]
    let rgb: Vec<[u8; 3]> = lab.iter().zip(&blurred).map(recombine).collect();

    let out = rgb.into_iter().flatten().collect();
    DisplayImage::rgb(out, width, height)
}
