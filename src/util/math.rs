//! Numeric helpers shared by the normalization, rendering and estimation stages.

/// Rounds to the nearest integer and saturates to the `u8` range.
///
/// NaN maps to 0.
#[inline]
pub(crate) fn saturate_u8(value: f32) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, 255.0) as u8
}

/// Percentile of an ascending-sorted slice with linear interpolation between
/// neighbouring order statistics. `p` is in percent, `[0, 100]`.
///
/// Returns `None` for an empty slice.
pub(crate) fn percentile_sorted(sorted: &[f32], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let p = p.clamp(0.0, 100.0);
    let pos = p / 100.0 * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    let a = f64::from(sorted[lo]);
    let b = f64::from(sorted[hi.min(sorted.len() - 1)]);
    Some(a + (b - a) * frac)
}

/// Converts an HSV triple (hue in degrees, saturation and value in `[0, 1]`)
/// to 8-bit RGB.
pub(crate) fn hsv_to_rgb(hue_deg: f32, saturation: f32, value: f32) -> [u8; 3] {
    let h = hue_deg.rem_euclid(360.0) / 60.0;
    let c = value * saturation;
    let x = c * (1.0 - ((h % 2.0) - 1.0).abs());
    let m = value - c;
    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    [
        saturate_u8((r + m) * 255.0),
        saturate_u8((g + m) * 255.0),
        saturate_u8((b + m) * 255.0),
    ]
}

/// Twice the signed area of the triangle `(a, b, c)`.
#[inline]
pub(crate) fn cross2(a: [f64; 2], b: [f64; 2], c: [f64; 2]) -> f64 {
    (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0])
}
