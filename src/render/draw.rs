//! Raster primitives for diagnostic images: thick lines, filled discs and
//! small bitmap digits.
//!
//! Everything draws onto an `image::RgbImage` through `imageproc`, which clips
//! silently at the image border.

use image::{Rgb, RgbImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_filled_rect_mut, draw_line_segment_mut, BresenhamLineIter,
};
use imageproc::rect::Rect;

/// 3x5 glyphs for `0`..=`9`, one row per entry, most significant bit leftmost.
const DIGITS: [[u8; 5]; 10] = [
    [0b111, 0b101, 0b101, 0b101, 0b111],
    [0b010, 0b110, 0b010, 0b010, 0b111],
    [0b111, 0b001, 0b111, 0b100, 0b111],
    [0b111, 0b001, 0b111, 0b001, 0b111],
    [0b101, 0b101, 0b111, 0b001, 0b001],
    [0b111, 0b100, 0b111, 0b001, 0b111],
    [0b111, 0b100, 0b111, 0b101, 0b111],
    [0b111, 0b001, 0b010, 0b010, 0b010],
    [0b111, 0b101, 0b111, 0b101, 0b111],
    [0b111, 0b101, 0b111, 0b001, 0b111],
];

/// Draws a line of `thickness` pixels; thicker lines stamp a disc at each
/// Bresenham step.
pub(crate) fn draw_thick_line(
    canvas: &mut RgbImage,
    start: (i32, i32),
    end: (i32, i32),
    color: Rgb<u8>,
    thickness: usize,
) {
    let start = (start.0 as f32, start.1 as f32);
    let end = (end.0 as f32, end.1 as f32);
    let radius = (thickness.max(1) as i32 - 1) / 2;
    if radius == 0 {
        draw_line_segment_mut(canvas, start, end, color);
        return;
    }
    for center in BresenhamLineIter::new(start, end) {
        draw_filled_circle_mut(canvas, center, radius, color);
    }
}

/// Writes the decimal representation of `value` with its top-left corner at
/// `(x, y)`. Each glyph cell is `scale` pixels wide.
pub(crate) fn draw_number(
    canvas: &mut RgbImage,
    x: i32,
    y: i32,
    value: usize,
    scale: u32,
    color: Rgb<u8>,
) {
    let scale = scale.max(1);
    let step = scale as i32;
    for (i, ch) in value.to_string().bytes().enumerate() {
        let glyph = &DIGITS[usize::from(ch - b'0')];
        let ox = x + i as i32 * 4 * step;
        for (row, bits) in glyph.iter().enumerate() {
            for col in 0..3 {
                if bits & (0b100 >> col) == 0 {
                    continue;
                }
                let cell = Rect::at(ox + col * step, y + row as i32 * step).of_size(scale, scale);
                draw_filled_rect_mut(canvas, cell, color);
            }
        }
    }
}
