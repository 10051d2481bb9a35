//! Frames, the default feature extractor and the operator overlay.

pub mod feature;
pub mod overlay;

use image::RgbImage;

/// One captured frame, RGB8, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    image: RgbImage,
}

impl Frame {
    pub fn new(image: RgbImage) -> Self {
        Self { image }
    }

    /// Build a frame from packed BGR bytes as delivered by capture devices.
    ///
    /// Returns `None` when `data` does not hold `width * height * 3` bytes.
    pub fn from_bgr(width: u32, height: u32, data: &[u8]) -> Option<Self> {
        if data.len() != (width as usize) * (height as usize) * 3 {
            return None;
        }
        let rgb: Vec<u8> = data
            .chunks_exact(3)
            .flat_map(|px| [px[2], px[1], px[0]])
            .collect();
        RgbImage::from_raw(width, height, rgb).map(Self::new)
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn into_image(self) -> RgbImage {
        self.image
    }
}

impl From<RgbImage> for Frame {
    fn from(image: RgbImage) -> Self {
        Self::new(image)
    }
}
