//! Operator overlay: a coloured border and a status label.
//!
//! Pure rendering.  What the operator sees never feeds back into the
//! verdict or the PLC write.

use image::{Rgb, RgbImage};

use crate::verdict::Verdict;

use super::Frame;

pub const OK_COLOUR: Rgb<u8> = Rgb([0, 255, 0]);
pub const DEFECT_COLOUR: Rgb<u8> = Rgb([255, 0, 0]);
pub const OK_BORDER: u32 = 5;
pub const DEFECT_BORDER: u32 = 10;
pub const OK_LABEL: &str = "PRODUCT OK";
pub const DEFECT_LABEL: &str = "DEFECT: SURFACE STAIN";

/// Distance of the border's centre line from the frame edge.
pub const BORDER_INSET: u32 = 10;

const GLYPH_SCALE: u32 = 3;
const GLYPH_HEIGHT: u32 = 7 * GLYPH_SCALE;
/// Bottom-left corner of the label, like a text baseline.
const LABEL_ORIGIN: (u32, u32) = (50, 50);

/// A frame with its verdict drawn on top.
#[derive(Debug, Clone)]
pub struct AnnotatedFrame {
    pub image: RgbImage,
    pub verdict: Verdict,
    pub label: &'static str,
}

/// Draw the verdict onto a copy of `frame`.
pub fn render(frame: &Frame, verdict: &Verdict) -> AnnotatedFrame {
    let (colour, border, label) = if verdict.is_defect() {
        (DEFECT_COLOUR, DEFECT_BORDER, DEFECT_LABEL)
    } else {
        (OK_COLOUR, OK_BORDER, OK_LABEL)
    };

    let mut image = frame.image().clone();
    draw_border(&mut image, border, colour);
    draw_label(
        &mut image,
        LABEL_ORIGIN.0,
        LABEL_ORIGIN.1 - GLYPH_HEIGHT,
        label,
        colour,
    );

    AnnotatedFrame {
        image,
        verdict: *verdict,
        label,
    }
}

/// Rectangle from `(inset, inset)` to `(w - inset, h - inset)`, the
/// stroke centred on that outline.
fn draw_border(image: &mut RgbImage, thickness: u32, colour: Rgb<u8>) {
    let (w, h) = image.dimensions();
    let t = i64::from(thickness);
    let near = i64::from(BORDER_INSET) - t / 2;
    let far_x = i64::from(w) - i64::from(BORDER_INSET) - t / 2;
    let far_y = i64::from(h) - i64::from(BORDER_INSET) - t / 2;

    let on_stroke = |v: i64, far: i64| (near..near + t).contains(&v) || (far..far + t).contains(&v);
    let in_box = |v: i64, far: i64| (near..far + t).contains(&v);

    for y in 0..h {
        for x in 0..w {
            let (x_, y_) = (i64::from(x), i64::from(y));
            if in_box(x_, far_x) && in_box(y_, far_y) && (on_stroke(x_, far_x) || on_stroke(y_, far_y)) {
                image.put_pixel(x, y, colour);
            }
        }
    }
}

fn draw_label(image: &mut RgbImage, mut x: u32, y: u32, text: &str, colour: Rgb<u8>) {
    let (w, h) = image.dimensions();
    for ch in text.chars() {
        if let Some(glyph) = glyph_bits(ch) {
            for (row, pattern) in glyph.iter().enumerate() {
                for col in 0..5u32 {
                    if (pattern >> (4 - col)) & 1 == 0 {
                        continue;
                    }
                    for dy in 0..GLYPH_SCALE {
                        for dx in 0..GLYPH_SCALE {
                            let px = x + col * GLYPH_SCALE + dx;
                            let py = y + row as u32 * GLYPH_SCALE + dy;
                            if px < w && py < h {
                                image.put_pixel(px, py, colour);
                            }
                        }
                    }
                }
            }
        }
        x += 6 * GLYPH_SCALE;
    }
}

/// 5x7 bitmaps for the characters the two labels use.
fn glyph_bits(ch: char) -> Option<[u8; 7]> {
    match ch {
        'A' => Some([0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001]),
        'C' => Some([0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110]),
        'D' => Some([0b11110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b11110]),
        'E' => Some([0b11111, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000, 0b11111]),
        'F' => Some([0b11111, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000, 0b10000]),
        'I' => Some([0b01110, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110]),
        'K' => Some([0b10001, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010, 0b10001]),
        'N' => Some([0b10001, 0b11001, 0b10101, 0b10101, 0b10011, 0b10001, 0b10001]),
        'O' => Some([0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110]),
        'P' => Some([0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000]),
        'R' => Some([0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001]),
        'S' => Some([0b01111, 0b10000, 0b01110, 0b00001, 0b00001, 0b10001, 0b01110]),
        'T' => Some([0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100]),
        'U' => Some([0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110]),
        ':' => Some([0, 0b00110, 0b00110, 0, 0b00110, 0b00110, 0]),
        _ => None,
    }
}
