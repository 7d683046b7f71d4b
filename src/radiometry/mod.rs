//! Radiometric normalization of radar rasters into 8-bit display intensity.
//!
//! Radar backscatter spans several orders of magnitude and is dominated by a
//! few bright scatterers, so samples are first compressed to decibels and the
//! display window is taken from robust percentiles rather than the min/max.
//! The mapping is
//!
//! `out = round(clip((db - vmin) / (vmax - vmin), 0, 1) * 255)`
//!
//! and a degenerate window (`vmax <= vmin`) yields an all-zero image.

use crate::image::{DisplayImage, RasterImage};
use crate::trace::{trace_event, trace_span};
use crate::util::math::{percentile_sorted, saturate_u8};
use crate::util::{RegistrationError, RegistrationResult, Stage};

/// Offset added before taking the logarithm so zero-valued samples stay finite.
pub const DB_EPSILON: f32 = 1e-10;

/// Intensity compression applied before windowing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Compression {
    /// `10 * log10(max(value, 0) + DB_EPSILON)`.
    #[default]
    Decibel,
    /// Samples are windowed as-is.
    Linear,
}

/// Strategy for choosing the `[vmin, vmax]` display window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RangeSelector {
    /// Percentiles (in percent) of the compressed finite samples.
    Percentiles { low: f64, high: f64 },
    /// Explicit window in compressed units.
    Fixed { vmin: f64, vmax: f64 },
}

impl Default for RangeSelector {
    fn default() -> Self {
        Self::Percentiles {
            low: 2.0,
            high: 98.0,
        }
    }
}

impl RangeSelector {
    /// Checks that the selector describes a usable window.
    pub fn validate(&self) -> RegistrationResult<()> {
        match *self {
            RangeSelector::Percentiles { low, high } => {
                if !(0.0..=100.0).contains(&low) || !(0.0..=100.0).contains(&high) {
                    return Err(RegistrationError::InvalidInput(
                        "percentiles must lie in [0, 100]",
                    ));
                }
                if low >= high {
                    return Err(RegistrationError::InvalidInput(
                        "low percentile must be below the high percentile",
                    ));
                }
            }
            RangeSelector::Fixed { vmin, vmax } => {
                if !vmin.is_finite() || !vmax.is_finite() {
                    return Err(RegistrationError::InvalidInput(
                        "fixed window bounds must be finite",
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Normalization parameters.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NormalizeConfig {
    /// Compression applied to raw samples.
    pub compression: Compression,
    /// Display window selection.
    pub range: RangeSelector,
}

/// Display window resolved for a particular raster.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisplayWindow {
    /// Lower bound in compressed units (maps to 0).
    pub vmin: f64,
    /// Upper bound in compressed units (maps to 255).
    pub vmax: f64,
}

impl DisplayWindow {
    /// Returns `true` when the window has no usable extent.
    pub fn is_degenerate(&self) -> bool {
        let span = self.vmax - self.vmin;
        !(span.is_finite() && span > 0.0)
    }
}

/// Compresses a single raw sample.
#[inline]
pub fn compress(value: f32, compression: Compression) -> f32 {
    match compression {
        Compression::Decibel => 10.0 * (value.max(0.0) + DB_EPSILON).log10(),
        Compression::Linear => value,
    }
}

/// Resolves the display window of `raster` without producing an image.
pub fn display_window(
    raster: &RasterImage,
    cfg: &NormalizeConfig,
) -> RegistrationResult<DisplayWindow> {
    cfg.range.validate()?;
    match cfg.range {
        RangeSelector::Fixed { vmin, vmax } => Ok(DisplayWindow { vmin, vmax }),
        RangeSelector::Percentiles { low, high } => {
            let mut samples: Vec<f32> = raster
                .data()
                .iter()
                .filter(|v| v.is_finite())
                .map(|&v| compress(v, cfg.compression))
                .filter(|v| v.is_finite())
                .collect();
            samples.sort_unstable_by(f32::total_cmp);
            let vmin = percentile_sorted(&samples, low);
            let vmax = percentile_sorted(&samples, high);
            match (vmin, vmax) {
                (Some(vmin), Some(vmax)) => Ok(DisplayWindow { vmin, vmax }),
                _ => Err(RegistrationError::NumericInstability {
                    stage: Stage::Normalize,
                    reason: "raster has no finite samples",
                }),
            }
        }
    }
}

/// Converts a radar raster to a single-channel 8-bit display image.
///
/// The output always has the raster's dimensions. Non-finite samples map to 0.
pub fn to_display_intensity(
    raster: &RasterImage,
    cfg: &NormalizeConfig,
) -> RegistrationResult<DisplayImage> {
    let _span = trace_span!(
        "normalize",
        width = raster.width(),
        height = raster.height()
    )
    .entered();

    let window = display_window(raster, cfg)?;
    trace_event!("display_window", vmin = window.vmin, vmax = window.vmax);

    let data = if window.is_degenerate() {
        vec![0u8; raster.data().len()]
    } else {
        let scale = 1.0 / (window.vmax - window.vmin);
        raster
            .data()
            .iter()
            .map(|&v| {
                let c = f64::from(compress(v, cfg.compression));
                if !c.is_finite() {
                    return 0;
                }
                let t = ((c - window.vmin) * scale).clamp(0.0, 1.0);
                saturate_u8((t * 255.0) as f32)
            })
            .collect()
    };

    DisplayImage::gray(data, raster.width(), raster.height())
}
