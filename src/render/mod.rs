//! Verification artifacts: match visualizations, perspective warps and
//! overlays.
//!
//! Everything here is a pure function of its inputs. Colors come from
//! [`match_color`], so the same inlier set always renders identically.

mod draw;
mod overlay;
mod warp;

pub use overlay::render_overlay;
pub use warp::{warp_perspective, WarpedImage};

use crate::correspond::Point2;
use crate::image::{buffer_dims, DisplayImage};
use crate::trace::trace_span;
use crate::util::math::hsv_to_rgb;
use crate::util::{RegistrationError, RegistrationResult};
use image::{imageops, Rgb, RgbImage};
use imageproc::drawing::draw_filled_circle_mut;

/// Drawing parameters for [`render_matches`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchStyle {
    /// Line thickness in pixels.
    pub line_width: usize,
    /// Radius of the endpoint discs in pixels.
    pub radius: usize,
    /// Horizontal offset of the index label from the source endpoint.
    pub label_offset: usize,
    /// Pixel size of one glyph cell of the index label.
    pub label_scale: usize,
}

impl Default for MatchStyle {
    fn default() -> Self {
        Self {
            line_width: 3,
            radius: 5,
            label_offset: 10,
            label_scale: 2,
        }
    }
}

/// Color of match `index` out of `total`, sweeping the hue circle at full
/// saturation and value.
pub fn match_color(index: usize, total: usize) -> [u8; 3] {
    let total = total.max(1);
    let hue = 360.0 * index as f64 / total as f64;
    hsv_to_rgb(hue as f32, 1.0, 1.0)
}

fn to_pixel(p: Point2) -> (i32, i32) {
    (p.x.round() as i32, p.y.round() as i32)
}

/// Draws `img_a` and `img_b` side by side and connects corresponding points.
///
/// The canvas is `(w_a + w_b) x max(h_a, h_b)` RGB on black; `pts_b` is shifted
/// right by `w_a`. Only the first `max_shown` pairs are drawn, each labelled
/// with its 1-based index next to the point in `img_a`.
pub fn render_matches(
    img_a: &DisplayImage,
    img_b: &DisplayImage,
    pts_a: &[Point2],
    pts_b: &[Point2],
    max_shown: usize,
    style: &MatchStyle,
) -> RegistrationResult<DisplayImage> {
    if pts_a.len() != pts_b.len() {
        return Err(RegistrationError::InvalidInput(
            "match point lists differ in length",
        ));
    }
    let _span = trace_span!("render_matches", points = pts_a.len(), max_shown).entered();

    let offset = img_a.width();
    let (width, height) = buffer_dims(
        offset + img_b.width(),
        img_a.height().max(img_b.height()),
    )?;
    let mut canvas = RgbImage::new(width, height);
    imageops::replace(&mut canvas, &img_a.clone().into_rgb_buffer()?, 0, 0);
    imageops::replace(&mut canvas, &img_b.clone().into_rgb_buffer()?, offset as i64, 0);

    let shown = max_shown.min(pts_a.len());
    let radius = style.radius as i32;
    let scale = style.label_scale.max(1) as u32;
    let half_glyph = 5 * scale as i32 / 2;
    for (i, (pa, pb)) in pts_a.iter().zip(pts_b).take(shown).enumerate() {
        let color = Rgb(match_color(i, shown));
        let (xa, ya) = to_pixel(*pa);
        let (xb, yb) = to_pixel(*pb);
        let xb = xb + offset as i32;
        draw::draw_thick_line(&mut canvas, (xa, ya), (xb, yb), color, style.line_width);
        draw_filled_circle_mut(&mut canvas, (xa, ya), radius, color);
        draw_filled_circle_mut(&mut canvas, (xb, yb), radius, color);
        let label_x = xa + style.label_offset as i32;
        draw::draw_number(&mut canvas, label_x, ya - half_glyph, i + 1, scale, color);
    }
    DisplayImage::from_rgb_buffer(canvas)
}
