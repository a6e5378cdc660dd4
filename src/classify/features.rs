//! Pixel statistics over the lower part of a face region.
//!
//! The analysis window is the bottom slice of the region (nose and mouth);
//! eyes and forehead stay visible whatever the mask, so they carry no signal.
//! All features are fractions of window pixels or grayscale dispersion.

use image::{imageops, GrayImage, RgbImage};
use imageproc::edges::canny;
use serde::{Deserialize, Serialize};

use crate::classify::color::{in_any, rgb_to_gray, rgb_to_hsv, HsvRange};

/// Canny needs a 3x3 neighbourhood; smaller windows report no edges.
const MIN_EDGE_WINDOW: u32 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub skin_ratio: f64,
    pub non_skin_ratio: f64,
    pub mask_color_ratio: f64,
    pub edge_density: f64,
    pub color_variance: f64,
    pub texture_std: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Fraction of the region height skipped from the top before analysis.
    pub analysis_window_ratio: f64,
    pub canny_low: f32,
    pub canny_high: f32,
    pub skin_ranges: Vec<HsvRange>,
    pub mask_color_ranges: Vec<HsvRange>,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            analysis_window_ratio: 0.5,
            canny_low: 15.0,
            canny_high: 60.0,
            skin_ranges: vec![
                HsvRange::new("skin_warm", [0, 40, 70], [20, 255, 255]),
                HsvRange::new("skin_yellow", [20, 50, 70], [30, 255, 255]),
            ],
            mask_color_ranges: vec![
                HsvRange::new("white", [0, 0, 180], [180, 40, 255]),
                HsvRange::new("black", [0, 0, 0], [180, 255, 80]),
                HsvRange::new("blue", [100, 40, 40], [130, 255, 255]),
                HsvRange::new("green", [40, 40, 40], [80, 255, 255]),
                HsvRange::new("pink", [140, 40, 40], [170, 255, 255]),
                HsvRange::new("red", [0, 40, 100], [10, 255, 255]),
                HsvRange::new("red_wrap", [170, 40, 100], [180, 255, 255]),
                HsvRange::new("yellow", [20, 40, 100], [40, 255, 255]),
            ],
        }
    }
}

/// Bottom slice of `region`, starting at `floor(height * ratio)`.
///
/// `None` when the slice is empty.
pub fn analysis_window(region: &RgbImage, ratio: f64) -> Option<RgbImage> {
    let (width, height) = region.dimensions();
    let start = ((height as f64 * ratio).floor() as u32).min(height);
    if width == 0 || start >= height {
        return None;
    }
    Some(imageops::crop_imm(region, 0, start, width, height - start).to_image())
}

/// Compute the six features over an analysis window. `None` if it is empty.
pub fn extract_features(window: &RgbImage, config: &FeatureConfig) -> Option<FeatureVector> {
    let (width, height) = window.dimensions();
    let total = width as usize * height as usize;
    if total == 0 {
        return None;
    }

    let mut gray = Vec::with_capacity(total);
    let mut skin = 0usize;
    let mut mask_colored = 0usize;
    for pixel in window.pixels() {
        let rgb = pixel.0;
        gray.push(rgb_to_gray(rgb));
        let hsv = rgb_to_hsv(rgb);
        if in_any(&config.skin_ranges, hsv) {
            skin += 1;
        }
        if in_any(&config.mask_color_ranges, hsv) {
            mask_colored += 1;
        }
    }

    let (color_variance, texture_std) = dispersion(&gray);
    let gray_image = GrayImage::from_raw(width, height, gray)?;
    let edge_density = edge_density(&gray_image, config.canny_low, config.canny_high);

    let skin_ratio = skin as f64 / total as f64;
    Some(FeatureVector {
        skin_ratio,
        non_skin_ratio: 1.0 - skin_ratio,
        mask_color_ratio: mask_colored as f64 / total as f64,
        edge_density,
        color_variance,
        texture_std,
    })
}

/// Fraction of pixels marked as edges by Canny at `(low, high)`.
pub fn edge_density(gray: &GrayImage, low: f32, high: f32) -> f64 {
    let (width, height) = gray.dimensions();
    if width < MIN_EDGE_WINDOW || height < MIN_EDGE_WINDOW {
        return 0.0;
    }
    let edges = canny(gray, low, high);
    let marked = edges.pixels().filter(|p| p.0[0] > 0).count();
    marked as f64 / (width as usize * height as usize) as f64
}

/// Population variance and standard deviation of grayscale intensities.
fn dispersion(values: &[u8]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let count = values.len() as f64;
    let mean = values.iter().map(|&v| v as f64).sum::<f64>() / count;
    let variance = values
        .iter()
        .map(|&v| (v as f64 - mean).powi(2))
        .sum::<f64>()
        / count;
    (variance, variance.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn window_is_lower_half() {
        let region = RgbImage::from_fn(4, 10, |_, y| Rgb([y as u8, 0, 0]));
        let window = analysis_window(&region, 0.5).expect("non-empty");
        assert_eq!(window.dimensions(), (4, 5));
        assert_eq!(window.get_pixel(0, 0), &Rgb([5, 0, 0]));

        let odd = RgbImage::new(4, 7);
        assert_eq!(analysis_window(&odd, 0.5).map(|w| w.dimensions()), Some((4, 4)));
    }

    #[test]
    fn degenerate_windows_are_absent() {
        assert!(analysis_window(&RgbImage::new(0, 10), 0.5).is_none());
        assert!(analysis_window(&RgbImage::new(4, 0), 0.5).is_none());
        assert!(analysis_window(&RgbImage::new(4, 1), 1.0).is_none());
        assert!(extract_features(&RgbImage::new(0, 0), &FeatureConfig::default()).is_none());
    }

    #[test]
    fn uniform_skin_window() {
        let window = RgbImage::from_pixel(20, 10, Rgb([224, 172, 140]));
        let features = extract_features(&window, &FeatureConfig::default()).expect("features");
        assert_eq!(features.skin_ratio, 1.0);
        assert_eq!(features.non_skin_ratio, 0.0);
        assert_eq!(features.edge_density, 0.0);
        assert_eq!(features.color_variance, 0.0);
        assert_eq!(features.texture_std, 0.0);
    }

    #[test]
    fn uniform_surgical_blue_window() {
        let window = RgbImage::from_pixel(20, 10, Rgb([90, 140, 200]));
        let features = extract_features(&window, &FeatureConfig::default()).expect("features");
        assert_eq!(features.skin_ratio, 0.0);
        assert_eq!(features.non_skin_ratio, 1.0);
        assert_eq!(features.mask_color_ratio, 1.0);
    }

    #[test]
    fn split_window_has_edges_and_spread() {
        // Left half black, right half white: one strong vertical edge.
        let window = RgbImage::from_fn(20, 20, |x, _| {
            if x < 10 {
                Rgb([0, 0, 0])
            } else {
                Rgb([255, 255, 255])
            }
        });
        let features = extract_features(&window, &FeatureConfig::default()).expect("features");
        assert!(features.edge_density > 0.0);
        assert!(features.edge_density < 0.5);
        assert!((features.color_variance - 127.5f64.powi(2)).abs() < 1e-9);
        assert!((features.texture_std - 127.5).abs() < 1e-9);
        // Both halves are mask colors (black and white bands).
        assert_eq!(features.mask_color_ratio, 1.0);
    }

    #[test]
    fn tiny_windows_have_no_edges() {
        let gray = GrayImage::from_raw(2, 2, vec![0, 255, 0, 255]).unwrap();
        assert_eq!(edge_density(&gray, 15.0, 60.0), 0.0);
    }
}
