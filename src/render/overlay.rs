//! Alpha blending of a warped image over the optical reference.

use super::warp::WarpedImage;
use crate::image::DisplayImage;
use crate::util::math::saturate_u8;
use crate::util::{RegistrationError, RegistrationResult};

/// Blends `warped` over `base` with weight `alpha` on the warped image.
///
/// Pixels flagged valid in `warped` become
/// `round(alpha * warped + (1 - alpha) * base)` per channel; the others keep
/// the base value. A single-channel warped image is replicated across the
/// channels of `base`. The output has the size and channel count of `base`.
pub fn render_overlay(
    base: &DisplayImage,
    warped: &WarpedImage,
    alpha: f32,
) -> RegistrationResult<DisplayImage> {
    if !(0.0..=1.0).contains(&alpha) {
        return Err(RegistrationError::InvalidInput(
            "overlay alpha must lie in [0, 1]",
        ));
    }
    let top = warped.image();
    if top.width() != base.width() || top.height() != base.height() {
        return Err(RegistrationError::InvalidInput(
            "warped image size differs from the base image",
        ));
    }
    if top.channels() != 1 && top.channels() != base.channels() {
        return Err(RegistrationError::InvalidInput(
            "warped image channels are incompatible with the base image",
        ));
    }

    let mut out = base.clone();
    let bc = base.channels();
    let tc = top.channels();
    let beta = 1.0 - alpha;
    for ((dst, src), &valid) in out
        .data_mut()
        .chunks_exact_mut(bc)
        .zip(top.data().chunks_exact(tc))
        .zip(warped.valid())
    {
        if !valid {
            continue;
        }
        for (ch, d) in dst.iter_mut().enumerate() {
            let w = src[if tc == 1 { 0 } else { ch }];
            *d = saturate_u8(alpha * f32::from(w) + beta * f32::from(*d));
        }
    }
    Ok(out)
}
