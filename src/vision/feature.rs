//! Red-stain feature extractor.
//!
//! The score is the number of pixels whose HSV value falls inside either
//! of two red bands.  Hue wraps at 180 on the 8-bit scale used here
//! (H 0..=180, S and V 0..=255), so red needs a low band and a high band.

use image::Rgb;

use crate::app::ports::FeatureExtractor;

use super::Frame;

/// Inclusive HSV box on the 8-bit scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HsvBand {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl HsvBand {
    pub const fn new(lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self { lower, upper }
    }

    fn contains(&self, hsv: [u8; 3]) -> bool {
        (0..3).all(|i| self.lower[i] <= hsv[i] && hsv[i] <= self.upper[i])
    }
}

pub const RED_LOW: HsvBand = HsvBand::new([0, 100, 100], [10, 255, 255]);
pub const RED_HIGH: HsvBand = HsvBand::new([170, 100, 100], [180, 255, 255]);

/// Counts pixels inside the union of two HSV bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedMaskExtractor {
    bands: [HsvBand; 2],
}

impl Default for RedMaskExtractor {
    fn default() -> Self {
        Self {
            bands: [RED_LOW, RED_HIGH],
        }
    }
}

impl RedMaskExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bands(low: HsvBand, high: HsvBand) -> Self {
        Self { bands: [low, high] }
    }

    pub fn bands(&self) -> &[HsvBand; 2] {
        &self.bands
    }
}

impl FeatureExtractor for RedMaskExtractor {
    fn extract(&self, frame: &Frame) -> u32 {
        let hits = frame
            .image()
            .pixels()
            .filter(|px| {
                let hsv = rgb_to_hsv(**px);
                self.bands.iter().any(|b| b.contains(hsv))
            })
            .count();
        u32::try_from(hits).unwrap_or(u32::MAX)
    }
}

/// RGB8 → HSV on the 8-bit scale: H in 0..=180, S and V in 0..=255.
pub fn rgb_to_hsv(Rgb([r, g, b]): Rgb<u8>) -> [u8; 3] {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = f32::from(max - min);

    let v = max;
    if max == 0 {
        return [0, 0, 0];
    }
    let s = (255.0 * delta / f32::from(max)).round() as u8;
    if delta == 0.0 {
        return [0, s, v];
    }

    let (rf, gf, bf) = (f32::from(r), f32::from(g), f32::from(b));
    let mut h = if max == r {
        60.0 * (gf - bf) / delta
    } else if max == g {
        120.0 + 60.0 * (bf - rf) / delta
    } else {
        240.0 + 60.0 * (rf - gf) / delta
    };
    if h < 0.0 {
        h += 360.0;
    }
    [(h / 2.0).round() as u8, s, v]
}
