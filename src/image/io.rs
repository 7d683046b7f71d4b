//! Convenience helpers for loading and saving images.
//!
//! TIFF rasters are decoded with the `tiff` crate so 32/64-bit float and
//! 16/32-bit integer backscatter survives unscaled; everything else goes through
//! the `image` crate. Available when the `image-io` feature is enabled.

use crate::image::{DisplayImage, RasterImage};
use crate::util::{RegistrationError, RegistrationResult};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};

/// Creates a raster from the luminance of a dynamic image, scaled to `[0, 1]`.
pub fn raster_from_dynamic_image(img: &image::DynamicImage) -> RegistrationResult<RasterImage> {
    let gray = img.to_luma32f();
    let width = gray.width() as usize;
    let height = gray.height() as usize;
    RasterImage::new(gray.into_raw(), width, height)
}

/// Creates an RGB display image from a dynamic image.
pub fn display_from_dynamic_image(img: &image::DynamicImage) -> RegistrationResult<DisplayImage> {
    let rgb = img.to_rgb8();
    let width = rgb.width() as usize;
    let height = rgb.height() as usize;
    DisplayImage::rgb(rgb.into_raw(), width, height)
}

/// Loads a single-band raster such as a 32-bit float SAR TIFF.
///
/// `.tif`/`.tiff` files keep their raw sample values; for multi-sample pixels
/// the first sample is used. Other formats are converted to luminance and
/// scaled to `[0, 1]` by the `image` crate.
pub fn load_raster<P: AsRef<Path>>(path: P) -> RegistrationResult<RasterImage> {
    let path = path.as_ref();
    if is_tiff(path) {
        return load_tiff_raster(path);
    }
    let img = open(path)?;
    raster_from_dynamic_image(&img)
}

fn is_tiff(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("tif") || ext.eq_ignore_ascii_case("tiff"))
}

fn load_tiff_raster(path: &Path) -> RegistrationResult<RasterImage> {
    let unavailable = |reason: String| RegistrationError::InputUnavailable {
        reason: format!("{}: {reason}", path.display()),
    };
    let file = File::open(path).map_err(|err| unavailable(err.to_string()))?;
    let mut decoder =
        Decoder::new(BufReader::new(file)).map_err(|err| unavailable(err.to_string()))?;
    let (width, height) = decoder
        .dimensions()
        .map_err(|err| unavailable(err.to_string()))?;
    let samples_per_pixel = match decoder
        .colortype()
        .map_err(|err| unavailable(err.to_string()))?
    {
        tiff::ColorType::Gray(_) => 1,
        tiff::ColorType::GrayA(_) => 2,
        tiff::ColorType::RGB(_) => 3,
        tiff::ColorType::RGBA(_) | tiff::ColorType::CMYK(_) => 4,
        other => return Err(unavailable(format!("unsupported color type {other:?}"))),
    };
    let decoded = decoder
        .read_image()
        .map_err(|err| unavailable(err.to_string()))?;
    let samples = first_samples(decoded, samples_per_pixel)
        .ok_or_else(|| unavailable("unsupported sample format".to_string()))?;
    RasterImage::new(samples, width as usize, height as usize)
}

/// Picks every `stride`-th sample starting at the first, widened to `f32`.
fn first_samples(decoded: DecodingResult, stride: usize) -> Option<Vec<f32>> {
    fn pick<T: Copy>(buf: &[T], stride: usize, cast: impl Fn(T) -> f32) -> Vec<f32> {
        buf.iter().step_by(stride).map(|&v| cast(v)).collect()
    }
    let samples = match decoded {
        DecodingResult::F32(buf) => pick(&buf, stride, |v| v),
        DecodingResult::F64(buf) => pick(&buf, stride, |v| v as f32),
        DecodingResult::U8(buf) => pick(&buf, stride, f32::from),
        DecodingResult::U16(buf) => pick(&buf, stride, f32::from),
        DecodingResult::U32(buf) => pick(&buf, stride, |v| v as f32),
        DecodingResult::I8(buf) => pick(&buf, stride, f32::from),
        DecodingResult::I16(buf) => pick(&buf, stride, f32::from),
        DecodingResult::I32(buf) => pick(&buf, stride, |v| v as f32),
        _ => return None,
    };
    Some(samples)
}

/// Loads a three-channel 8-bit image.
pub fn load_rgb<P: AsRef<Path>>(path: P) -> RegistrationResult<DisplayImage> {
    let img = open(path.as_ref())?;
    display_from_dynamic_image(&img)
}

/// Saves a display image; the format is chosen from the file extension.
pub fn save_display<P: AsRef<Path>>(img: &DisplayImage, path: P) -> RegistrationResult<()> {
    let color = match img.channels() {
        1 => image::ExtendedColorType::L8,
        _ => image::ExtendedColorType::Rgb8,
    };
    image::save_buffer(
        path.as_ref(),
        img.data(),
        img.width() as u32,
        img.height() as u32,
        color,
    )
    .map_err(|err| RegistrationError::OutputUnavailable {
        reason: format!("{}: {err}", path.as_ref().display()),
    })
}

fn open(path: &Path) -> RegistrationResult<image::DynamicImage> {
    image::open(path).map_err(|err| RegistrationError::InputUnavailable {
        reason: format!("{}: {err}", path.display()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gray_dynamic_image_becomes_rgb_display() {
        let gray = image::GrayImage::from_raw(2, 1, vec![10, 200]).unwrap();
        let img = image::DynamicImage::ImageLuma8(gray);
        let display = display_from_dynamic_image(&img).unwrap();
        assert_eq!(display.channels(), 3);
        assert_eq!(display.data(), &[10, 10, 10, 200, 200, 200]);
        let raster = raster_from_dynamic_image(&img).unwrap();
        assert!((raster.data()[1] - 200.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn float_tiff_keeps_raw_backscatter() {
        use tiff::encoder::{colortype, TiffEncoder};

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sar_float32.tif");
        let samples = vec![0.0f32, 1e-4, 0.25, 3.5, 120.0, -0.5];
        let file = File::create(&path).unwrap();
        TiffEncoder::new(file)
            .unwrap()
            .write_image::<colortype::Gray32Float>(3, 2, &samples)
            .unwrap();

        let raster = load_raster(&path).unwrap();
        assert_eq!((raster.width(), raster.height()), (3, 2));
        assert_eq!(raster.data(), &samples[..]);
    }

    #[test]
    fn rgb_tiff_uses_first_sample() {
        use tiff::encoder::{colortype, TiffEncoder};

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("three_band.TIFF");
        let file = File::create(&path).unwrap();
        TiffEncoder::new(file)
            .unwrap()
            .write_image::<colortype::RGB16>(2, 1, &[100, 7, 7, 4000, 9, 9])
            .unwrap();

        let raster = load_raster(&path).unwrap();
        assert_eq!(raster.data(), &[100.0f32, 4000.0]);
    }

    #[test]
    fn corrupt_tiff_is_input_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.tif");
        std::fs::write(&path, b"not a tiff").unwrap();
        let err = load_raster(&path).unwrap_err();
        assert!(matches!(err, RegistrationError::InputUnavailable { .. }));
    }

    #[test]
    fn missing_file_is_input_unavailable() {
        let err = load_raster("does/not/exist.tif").unwrap_err();
        assert!(matches!(err, RegistrationError::InputUnavailable { .. }));
    }
}
