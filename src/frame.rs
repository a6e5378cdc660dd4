//! In-memory frame container.
//!
//! - `Frame`: one decoded RGB image, owned for the duration of one pipeline call.
//! - `Crop`: an owned copy of a rectangular part of a frame, tagged with the
//!   (clamped) box it was cut from, in frame coordinates.
//!
//! Every crop is clamped to the frame bounds; a box that falls entirely outside
//! the frame produces no crop at all rather than an error.

use anyhow::{anyhow, Result};
use image::{imageops, RgbImage};

use crate::geometry::BoundingBox;
use crate::ingest::normalize::{normalize_to_rgb, PixelFormat};

/// A decoded RGB frame.
#[derive(Clone, Debug)]
pub struct Frame {
    image: RgbImage,
}

impl Frame {
    /// Wrap a packed RGB24 buffer. The length must be `width * height * 3`.
    pub fn from_rgb(pixels: Vec<u8>, width: u32, height: u32) -> Result<Self> {
        let got = pixels.len();
        let image = RgbImage::from_raw(width, height, pixels).ok_or_else(|| {
            anyhow!(
                "RGB frame length mismatch for {}x{}: got {} bytes",
                width,
                height,
                got
            )
        })?;
        Ok(Self { image })
    }

    /// Normalize a buffer in any supported pixel layout into an RGB frame.
    pub fn from_pixels(pixels: &[u8], width: u32, height: u32, format: PixelFormat) -> Result<Self> {
        let rgb = normalize_to_rgb(pixels, width, height, format)?;
        Self::from_rgb(rgb, width, height)
    }

    pub fn from_image(image: RgbImage) -> Self {
        Self { image }
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

    /// Copy out the part of the frame covered by `bbox`, clamped to the frame.
    ///
    /// Returns `None` when the clamped region is empty.
    pub fn crop(&self, bbox: &BoundingBox) -> Option<Crop> {
        let clamped = bbox.clamp_to(self.width(), self.height())?;
        let image = imageops::crop_imm(
            &self.image,
            clamped.x1() as u32,
            clamped.y1() as u32,
            clamped.width() as u32,
            clamped.height() as u32,
        )
        .to_image();
        Some(Crop {
            bbox: clamped,
            image,
        })
    }
}

/// Owned copy of a frame region.
#[derive(Clone, Debug)]
pub struct Crop {
    /// Where the crop came from, in frame coordinates (already clamped).
    pub bbox: BoundingBox,
    pub image: RgbImage,
}
