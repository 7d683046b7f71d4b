//! Owned raster and display image buffers.
//!
//! `RasterImage` holds single-band floating-point samples (radar backscatter).
//! `DisplayImage` holds 8-bit samples with one or three interleaved channels
//! (RGB order). Both are contiguous, row-major and immutable once built; every
//! stage returns a newly allocated image.

use crate::util::{RegistrationError, RegistrationResult};

#[cfg(feature = "image-io")]
pub mod io;

/// Single-band floating-point raster.
#[derive(Clone, Debug, PartialEq)]
pub struct RasterImage {
    data: Vec<f32>,
    width: usize,
    height: usize,
}

impl RasterImage {
    /// Creates a raster from row-major samples.
    pub fn new(data: Vec<f32>, width: usize, height: usize) -> RegistrationResult<Self> {
        check_len(data.len(), width, height, 1)?;
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Creates a raster by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(
        width: usize,
        height: usize,
        mut f: impl FnMut(usize, usize) -> f32,
    ) -> RegistrationResult<Self> {
        let len = required_len(width, height, 1)?;
        let mut data = Vec::with_capacity(len);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self::new(data, width, height)
    }

    /// Returns the raster width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the raster height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the row-major samples.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Returns the sample at `(x, y)` if it is within bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y * self.width + x).copied()
    }

    /// Returns a left-right mirrored copy.
    ///
    /// Some SAR products are delivered in a look direction that is mirrored
    /// relative to the optical reference; callers normalize that here before
    /// registration.
    pub fn flipped_horizontal(&self) -> Self {
        let mut data = Vec::with_capacity(self.data.len());
        for row in self.data.chunks_exact(self.width) {
            data.extend(row.iter().rev());
        }
        Self {
            data,
            width: self.width,
            height: self.height,
        }
    }
}

/// 8-bit image with one (gray) or three (RGB) interleaved channels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayImage {
    data: Vec<u8>,
    width: usize,
    height: usize,
    channels: usize,
}

impl DisplayImage {
    /// Creates an image from interleaved row-major samples.
    pub fn new(
        data: Vec<u8>,
        width: usize,
        height: usize,
        channels: usize,
    ) -> RegistrationResult<Self> {
        if channels != 1 && channels != 3 {
            return Err(RegistrationError::InvalidInput(
                "display images have 1 or 3 channels",
            ));
        }
        check_len(data.len(), width, height, channels)?;
        Ok(Self {
            data,
            width,
            height,
            channels,
        })
    }

    /// Creates a single-channel image.
    pub fn gray(data: Vec<u8>, width: usize, height: usize) -> RegistrationResult<Self> {
        Self::new(data, width, height, 1)
    }

    /// Creates a three-channel RGB image.
    pub fn rgb(data: Vec<u8>, width: usize, height: usize) -> RegistrationResult<Self> {
        Self::new(data, width, height, 3)
    }

    /// Creates an image with every sample set to `value`.
    pub fn filled(
        width: usize,
        height: usize,
        channels: usize,
        value: u8,
    ) -> RegistrationResult<Self> {
        let len = required_len(width, height, channels)?;
        Self::new(vec![value; len], width, height, channels)
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the number of interleaved channels (1 or 3).
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Returns the interleaved samples.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the image and returns the interleaved samples.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Returns the channel samples of pixel `(x, y)` if it is within bounds.
    pub fn pixel(&self, x: usize, y: usize) -> Option<&[u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let start = (y * self.width + x) * self.channels;
        self.data.get(start..start + self.channels)
    }

    /// Returns the interleaved samples of row `y`.
    pub fn row(&self, y: usize) -> Option<&[u8]> {
        if y >= self.height {
            return None;
        }
        let stride = self.width * self.channels;
        let start = y * stride;
        self.data.get(start..start + stride)
    }

    /// Returns an RGB copy, replicating the gray channel when needed.
    pub fn to_rgb(&self) -> DisplayImage {
        if self.channels == 3 {
            return self.clone();
        }
        let mut data = Vec::with_capacity(self.data.len() * 3);
        for &v in &self.data {
            data.extend_from_slice(&[v, v, v]);
        }
        DisplayImage {
            data,
            width: self.width,
            height: self.height,
            channels: 3,
        }
    }

    pub(crate) fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Moves the samples into an `image::RgbImage`, promoting gray first.
    pub(crate) fn into_rgb_buffer(self) -> RegistrationResult<image::RgbImage> {
        let rgb = if self.channels == 3 { self } else { self.to_rgb() };
        let (width, height) = buffer_dims(rgb.width, rgb.height)?;
        image::RgbImage::from_raw(width, height, rgb.data).ok_or(
            RegistrationError::InvalidDimensions {
                width: rgb.width,
                height: rgb.height,
            },
        )
    }

    /// Wraps the samples of an `image::RgbImage`.
    pub(crate) fn from_rgb_buffer(buf: image::RgbImage) -> RegistrationResult<Self> {
        let width = buf.width() as usize;
        let height = buf.height() as usize;
        Self::rgb(buf.into_raw(), width, height)
    }
}

/// Converts dimensions to the `u32` pair used by `image` buffers.
pub(crate) fn buffer_dims(width: usize, height: usize) -> RegistrationResult<(u32, u32)> {
    match (u32::try_from(width), u32::try_from(height)) {
        (Ok(w), Ok(h)) => Ok((w, h)),
        _ => Err(RegistrationError::InvalidDimensions { width, height }),
    }
}

fn required_len(width: usize, height: usize, channels: usize) -> RegistrationResult<usize> {
    if width == 0 || height == 0 {
        return Err(RegistrationError::InvalidDimensions { width, height });
    }
    width
        .checked_mul(height)
        .and_then(|v| v.checked_mul(channels))
        .ok_or(RegistrationError::InvalidDimensions { width, height })
}

fn check_len(len: usize, width: usize, height: usize, channels: usize) -> RegistrationResult<()> {
    let needed = required_len(width, height, channels)?;
    if len != needed {
        return Err(RegistrationError::BufferTooSmall { needed, got: len });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{DisplayImage, RasterImage};
    use crate::util::RegistrationError;

    #[test]
    fn raster_flip_mirrors_rows() {
        let raster = RasterImage::new(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 3, 2).unwrap();
        let flipped = raster.flipped_horizontal();
        assert_eq!(flipped.data(), &[3.0, 2.0, 1.0, 6.0, 5.0, 4.0]);
        assert_eq!(flipped.get(0, 1), Some(6.0));
        assert!(flipped.get(3, 0).is_none());
    }

    #[test]
    fn display_rejects_bad_channel_count() {
        let err = DisplayImage::new(vec![0; 8], 2, 2, 2).unwrap_err();
        assert_eq!(
            err,
            RegistrationError::InvalidInput("display images have 1 or 3 channels")
        );
    }

    #[test]
    fn display_gray_promotes_to_rgb() {
        let gray = DisplayImage::gray(vec![10, 20], 2, 1).unwrap();
        let rgb = gray.to_rgb();
        assert_eq!(rgb.channels(), 3);
        assert_eq!(rgb.data(), &[10, 10, 10, 20, 20, 20]);
        assert_eq!(rgb.pixel(1, 0), Some(&[20u8, 20, 20][..]));
    }

    #[test]
    fn rgb_buffer_keeps_layout() {
        let gray = DisplayImage::gray(vec![1, 2, 3, 4, 5, 6], 3, 2).unwrap();
        let buf = gray.clone().into_rgb_buffer().unwrap();
        assert_eq!(buf.dimensions(), (3, 2));
        assert_eq!(buf.get_pixel(2, 1).0, [6, 6, 6]);
        assert_eq!(DisplayImage::from_rgb_buffer(buf).unwrap(), gray.to_rgb());
    }
}
