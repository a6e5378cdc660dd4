//! Per-pixel color conversions and HSV band membership.
//!
//! Conversions follow the 8-bit OpenCV conventions the thresholds were tuned
//! against: hue in `0..180` (degrees halved), saturation and value in `0..=255`,
//! and grayscale with the BT.601 weights in 14-bit fixed point.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// `[hue, saturation, value]`, hue in `0..180`.
pub type Hsv = [u8; 3];

pub const HUE_MAX: u8 = 180;

const GRAY_SHIFT: u32 = 14;
const GRAY_R: u32 = 4899;
const GRAY_G: u32 = 9617;
const GRAY_B: u32 = 1868;

/// BT.601 luma: `0.299 R + 0.587 G + 0.114 B`, rounded.
pub fn rgb_to_gray(rgb: [u8; 3]) -> u8 {
    let [r, g, b] = rgb.map(u32::from);
    ((r * GRAY_R + g * GRAY_G + b * GRAY_B + (1 << (GRAY_SHIFT - 1))) >> GRAY_SHIFT) as u8
}

pub fn rgb_to_hsv(rgb: [u8; 3]) -> Hsv {
    let [r, g, b] = rgb.map(i32::from);
    let v = r.max(g).max(b);
    let min = r.min(g).min(b);
    let diff = v - min;

    let s = if v == 0 {
        0
    } else {
        (255.0 * diff as f32 / v as f32).round() as i32
    };

    let h = if diff == 0 {
        0
    } else {
        let degrees = if v == r {
            60.0 * (g - b) as f32 / diff as f32
        } else if v == g {
            120.0 + 60.0 * (b - r) as f32 / diff as f32
        } else {
            240.0 + 60.0 * (r - g) as f32 / diff as f32
        };
        let degrees = if degrees < 0.0 { degrees + 360.0 } else { degrees };
        let half = (degrees / 2.0).round() as i32;
        if half >= HUE_MAX as i32 {
            half - HUE_MAX as i32
        } else {
            half
        }
    };

    [h as u8, s as u8, v as u8]
}

/// Inclusive HSV box, e.g. one skin tone band or one mask material color.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HsvRange {
    pub name: String,
    pub lower: Hsv,
    pub upper: Hsv,
}

impl HsvRange {
    pub fn new(name: &str, lower: Hsv, upper: Hsv) -> Self {
        Self {
            name: name.to_string(),
            lower,
            upper,
        }
    }

    pub fn contains(&self, hsv: Hsv) -> bool {
        (0..3).all(|i| self.lower[i] <= hsv[i] && hsv[i] <= self.upper[i])
    }

    pub fn validate(&self) -> Result<()> {
        if self.upper[0] > HUE_MAX {
            return Err(anyhow!(
                "HSV range '{}': hue bound {} exceeds {}",
                self.name,
                self.upper[0],
                HUE_MAX
            ));
        }
        if (0..3).any(|i| self.lower[i] > self.upper[i]) {
            return Err(anyhow!(
                "HSV range '{}': lower {:?} exceeds upper {:?}",
                self.name,
                self.lower,
                self.upper
            ));
        }
        Ok(())
    }
}

/// True when any band in `ranges` contains `hsv`.
pub fn in_any(ranges: &[HsvRange], hsv: Hsv) -> bool {
    ranges.iter().any(|range| range.contains(hsv))
}
