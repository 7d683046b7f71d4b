//! sRGB <-> CIE L*a*b* conversion in the common 8-bit encoding.
//!
//! D65 white point, sRGB transfer curve. 8-bit Lab stores `L * 255 / 100` and
//! offsets `a`, `b` by 128 so all three planes fit in `u8`.

use crate::util::math::saturate_u8;

const XN: f32 = 0.950_456;
const ZN: f32 = 1.088_754;
const LAB_T: f32 = 0.008_856;
const LAB_K: f32 = 903.3;

#[inline]
fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.040_45 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[inline]
fn linear_to_srgb(c: f32) -> f32 {
    if c <= 0.003_130_8 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

#[inline]
fn lab_f(t: f32) -> f32 {
    if t > LAB_T {
        t.cbrt()
    } else {
        7.787 * t + 16.0 / 116.0
    }
}

#[inline]
fn lab_f_inv(f: f32) -> f32 {
    let t = f * f * f;
    if t > LAB_T {
        t
    } else {
        (f - 16.0 / 116.0) / 7.787
    }
}

/// Converts one RGB pixel to 8-bit Lab.
pub(crate) fn rgb_to_lab8(rgb: [u8; 3]) -> [u8; 3] {
    let r = srgb_to_linear(f32::from(rgb[0]) / 255.0);
    let g = srgb_to_linear(f32::from(rgb[1]) / 255.0);
    let b = srgb_to_linear(f32::from(rgb[2]) / 255.0);

    let x = (0.412_453 * r + 0.357_580 * g + 0.180_423 * b) / XN;
    let y = 0.212_671 * r + 0.715_160 * g + 0.072_169 * b;
    let z = (0.019_334 * r + 0.119_193 * g + 0.950_227 * b) / ZN;

    let fx = lab_f(x);
    let fy = lab_f(y);
    let fz = lab_f(z);
    let l = if y > LAB_T {
        116.0 * fy - 16.0
    } else {
        LAB_K * y
    };
    let a = 500.0 * (fx - fy);
    let bb = 200.0 * (fy - fz);

    [
        saturate_u8(l * 255.0 / 100.0),
        saturate_u8(a + 128.0),
        saturate_u8(bb + 128.0),
    ]
}

/// Converts one 8-bit Lab pixel back to RGB.
pub(crate) fn lab8_to_rgb(lab: [u8; 3]) -> [u8; 3] {
    let l = f32::from(lab[0]) * 100.0 / 255.0;
    let a = f32::from(lab[1]) - 128.0;
    let b = f32::from(lab[2]) - 128.0;

    let (y, fy) = if l > LAB_K * LAB_T {
        let fy = (l + 16.0) / 116.0;
        (fy * fy * fy, fy)
    } else {
        let y = l / LAB_K;
        (y, 7.787 * y + 16.0 / 116.0)
    };
    let x = lab_f_inv(fy + a / 500.0) * XN;
    let z = lab_f_inv(fy - b / 200.0) * ZN;

    let r = 3.240_479 * x - 1.537_150 * y - 0.498_535 * z;
    let g = -0.969_256 * x + 1.875_991 * y + 0.041_556 * z;
    let bl = 0.055_648 * x - 0.204_043 * y + 1.057_311 * z;

    [
        saturate_u8(linear_to_srgb(r.clamp(0.0, 1.0)) * 255.0),
        saturate_u8(linear_to_srgb(g.clamp(0.0, 1.0)) * 255.0),
        saturate_u8(linear_to_srgb(bl.clamp(0.0, 1.0)) * 255.0),
    ]
}

#[cfg(test)]
mod tests {
    use super::{lab8_to_rgb, rgb_to_lab8};

    #[test]
    fn gray_has_neutral_chroma() {
        for v in [0u8, 17, 128, 200, 255] {
            let lab = rgb_to_lab8([v, v, v]);
            assert!((i32::from(lab[1]) - 128).abs() <= 1, "a for {v}: {}", lab[1]);
            assert!((i32::from(lab[2]) - 128).abs() <= 1, "b for {v}: {}", lab[2]);
        }
        assert_eq!(rgb_to_lab8([255, 255, 255])[0], 255);
        assert_eq!(rgb_to_lab8([0, 0, 0])[0], 0);
    }

    #[test]
    fn round_trip_is_close() {
        for rgb in [[12u8, 200, 90], [255, 0, 0], [40, 40, 40], [180, 160, 20]] {
            let back = lab8_to_rgb(rgb_to_lab8(rgb));
            for c in 0..3 {
                let diff = (i32::from(back[c]) - i32::from(rgb[c])).abs();
                assert!(diff <= 6, "{rgb:?} -> {back:?}");
            }
        }
    }
}
