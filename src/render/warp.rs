//! Perspective warping of display images into the optical frame.
//!
//! Samples are carried through `imageproc` as `[0, 1]` floats with an extra
//! coverage channel set to 1. Output pixels whose pre-image has no complete
//! bilinear neighbourhood in the source come back with coverage 0.

use crate::homography::Homography;
use crate::image::{buffer_dims, DisplayImage};
use crate::trace::trace_span;
use crate::util::math::saturate_u8;
use crate::util::{RegistrationError, RegistrationResult, Stage};
use image::{ImageBuffer, LumaA, Pixel, Rgba};
use imageproc::geometric_transformations::{warp_into, Interpolation, Projection};

/// Warped image plus the pixels that received source data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WarpedImage {
    image: DisplayImage,
    valid: Vec<bool>,
}

impl WarpedImage {
    /// Pairs an image with its row-major validity flags.
    ///
    /// Fails unless there is exactly one flag per pixel.
    pub fn new(image: DisplayImage, valid: Vec<bool>) -> RegistrationResult<Self> {
        if valid.len() != image.width() * image.height() {
            return Err(RegistrationError::InvalidInput(
                "validity mask length differs from the pixel count",
            ));
        }
        Ok(Self { image, valid })
    }

    /// Warped samples; pixels outside the source footprint are 0.
    pub fn image(&self) -> &DisplayImage {
        &self.image
    }

    /// Row-major flags, `true` where the pixel carries source data.
    pub fn valid(&self) -> &[bool] {
        &self.valid
    }

    /// Returns whether pixel `(x, y)` carries source data.
    pub fn is_valid(&self, x: usize, y: usize) -> bool {
        x < self.image.width()
            && y < self.image.height()
            && self.valid[y * self.image.width() + x]
    }

    /// Number of pixels that carry source data.
    pub fn valid_count(&self) -> usize {
        self.valid.iter().filter(|&&v| v).count()
    }
}

fn warp_with_coverage<P>(
    src: &DisplayImage,
    projection: &Projection,
    width: u32,
    height: u32,
) -> RegistrationResult<(Vec<u8>, Vec<bool>)>
where
    P: Pixel<Subpixel = f32> + Send + Sync,
{
    let channels = src.channels();
    let (src_w, src_h) = buffer_dims(src.width(), src.height())?;
    let mut samples = Vec::with_capacity(src.width() * src.height() * (channels + 1));
    for px in src.data().chunks_exact(channels) {
        samples.extend(px.iter().map(|&v| f32::from(v) / 255.0));
        samples.push(1.0);
    }
    let needed = samples.len();
    let input = ImageBuffer::<P, Vec<f32>>::from_raw(src_w, src_h, samples).ok_or(
        RegistrationError::BufferTooSmall {
            needed,
            got: src.data().len(),
        },
    )?;

    let empty = [0.0f32; 4];
    let mut output = ImageBuffer::<P, Vec<f32>>::new(width, height);
    warp_into(
        &input,
        projection,
        Interpolation::Bilinear,
        *P::from_slice(&empty[..channels + 1]),
        &mut output,
    );

    let mut data = Vec::with_capacity(output.len() / (channels + 1) * channels);
    let mut valid = Vec::with_capacity(output.len() / (channels + 1));
    for px in output.pixels() {
        let values = px.channels();
        let covered = values[channels] > 0.5;
        valid.push(covered);
        for &v in &values[..channels] {
            data.push(if covered { saturate_u8(v * 255.0) } else { 0 });
        }
    }
    Ok((data, valid))
}

/// Warps `src` by `h` (source to target) into a `out_width x out_height` frame.
///
/// Each output pixel is mapped back through `h^-1` and sampled bilinearly.
/// Pixels that map outside `src` are set to 0 and flagged invalid. The output
/// has the same channel count as `src`.
pub fn warp_perspective(
    src: &DisplayImage,
    h: &Homography,
    out_width: usize,
    out_height: usize,
) -> RegistrationResult<WarpedImage> {
    let _span = trace_span!("warp", width = out_width, height = out_height).entered();
    h.inverse()?;
    let (width, height) = buffer_dims(out_width, out_height)?;
    let forward = h.to_row_major().map(|v| v as f32);
    let projection = Projection::from_matrix(forward).ok_or(
        RegistrationError::NumericInstability {
            stage: Stage::Render,
            reason: "homography is not invertible in single precision",
        },
    )?;

    let (data, valid) = match src.channels() {
        1 => warp_with_coverage::<LumaA<f32>>(src, &projection, width, height)?,
        _ => warp_with_coverage::<Rgba<f32>>(src, &projection, width, height)?,
    };
    let image = DisplayImage::new(data, out_width, out_height, src.channels())?;
    WarpedImage::new(image, valid)
}
