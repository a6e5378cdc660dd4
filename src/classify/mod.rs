//! Face-region classification.
//!
//! A region is cropped from the frame, narrowed to its lower half, reduced to
//! six pixel features, scored against the rule tables and finally labelled.
//! Every step is deterministic; no state survives between regions.

pub mod color;
pub mod features;
pub mod locate;
pub mod scoring;

use serde::Serialize;

use crate::detect::{Detection, FaceFinder};
use crate::frame::Frame;
use crate::geometry::BoundingBox;

pub use color::{rgb_to_gray, rgb_to_hsv, Hsv, HsvRange};
pub use features::{analysis_window, extract_features, FeatureConfig, FeatureVector};
pub use locate::{
    estimate_face_box, locate_faces, regions_from_faces, FaceRegion, LocatorConfig, RegionSource,
};
pub use scoring::{
    decide, score_features, Criterion, DecisionConfig, MaskLabel, ScoreBreakdown, ScoreRule,
    ScoringConfig,
};

/// Outcome for one face region.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ClassificationResult {
    pub bbox: BoundingBox,
    pub confidence: f32,
    pub source: RegionSource,
    pub label: MaskLabel,
    pub score: i32,
    /// `None` when the region held no pixels to analyse.
    pub features: Option<FeatureVector>,
}

/// Classifier settings plus the locate/score/decide pipeline over them.
#[derive(Clone, Debug, Default)]
pub struct RegionClassifier {
    pub locator: LocatorConfig,
    pub features: FeatureConfig,
    pub scoring: ScoringConfig,
    pub decision: DecisionConfig,
}

impl RegionClassifier {
    pub fn new(
        locator: LocatorConfig,
        features: FeatureConfig,
        scoring: ScoringConfig,
        decision: DecisionConfig,
    ) -> Self {
        Self {
            locator,
            features,
            scoring,
            decision,
        }
    }

    /// Score and label a feature vector.
    pub fn decide_features(&self, features: &FeatureVector) -> (ScoreBreakdown, MaskLabel) {
        let breakdown = score_features(features, &self.scoring);
        let label = decide(breakdown.total, features.skin_ratio, &self.decision);
        (breakdown, label)
    }

    /// Classify one face region of `frame`.
    ///
    /// A region that clamps to nothing, or whose analysis window is empty,
    /// is `Unknown` with score 0 and no features.
    pub fn classify_region(&self, frame: &Frame, region: &FaceRegion) -> ClassificationResult {
        let features = frame
            .crop(&region.bbox)
            .and_then(|crop| analysis_window(&crop.image, self.features.analysis_window_ratio))
            .and_then(|window| extract_features(&window, &self.features));

        let Some(features) = features else {
            log::debug!("classifier: region {:?} is empty, label UNKNOWN", region.bbox);
            return ClassificationResult {
                bbox: region.bbox,
                confidence: region.confidence,
                source: region.source,
                label: MaskLabel::Unknown,
                score: 0,
                features: None,
            };
        };

        let (breakdown, label) = self.decide_features(&features);
        log::debug!(
            "classifier: region {:?} score {} {:?} -> {}",
            region.bbox,
            breakdown.total,
            breakdown.contributions,
            label
        );
        ClassificationResult {
            bbox: region.bbox,
            confidence: region.confidence,
            source: region.source,
            label,
            score: breakdown.total,
            features: Some(features),
        }
    }

    /// Locate the face regions of one person and classify each of them.
    pub fn classify_person(
        &self,
        frame: &Frame,
        person: &Detection,
        finder: &mut dyn FaceFinder,
    ) -> Vec<ClassificationResult> {
        locate_faces(frame, person, finder, &self.locator)
            .iter()
            .map(|region| self.classify_region(frame, region))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::NoFaceFinder;
    use image::{Rgb, RgbImage};

    fn region(x1: i32, y1: i32, x2: i32, y2: i32) -> FaceRegion {
        FaceRegion {
            bbox: BoundingBox::new(x1, y1, x2, y2).unwrap(),
            confidence: 0.9,
            source: RegionSource::Located,
        }
    }

    #[test]
    fn region_outside_frame_is_unknown() {
        let frame = Frame::from_image(RgbImage::new(64, 64));
        let result = RegionClassifier::default().classify_region(&frame, &region(100, 100, 140, 140));
        assert_eq!(result.label, MaskLabel::Unknown);
        assert_eq!(result.score, 0);
        assert!(result.features.is_none());
    }

    #[test]
    fn one_pixel_high_region_is_unknown() {
        // With a ratio of 1.0 the window starts past the last row.
        let frame = Frame::from_image(RgbImage::new(64, 64));
        let mut classifier = RegionClassifier::default();
        classifier.features.analysis_window_ratio = 1.0;
        let result = classifier.classify_region(&frame, &region(0, 0, 10, 1));
        assert_eq!(result.label, MaskLabel::Unknown);
        assert!(result.features.is_none());
    }

    #[test]
    fn bare_skin_face_is_mask_absent() {
        let frame = Frame::from_image(RgbImage::from_pixel(80, 80, Rgb([224, 172, 140])));
        let result = RegionClassifier::default().classify_region(&frame, &region(10, 10, 70, 70));
        // skin 1.0 -> -5, non-skin 0 -> 0, mask 0 -> 0, edges 0 -> -1,
        // variance 0 -> +2, texture 0 -> +2.
        assert_eq!(result.score, -2);
        assert_eq!(result.label, MaskLabel::MaskAbsent);
        assert_eq!(result.features.map(|f| f.skin_ratio), Some(1.0));
    }

    #[test]
    fn uniform_blue_lower_face_is_mask_present() {
        // Skin on top, surgical blue on the bottom half of the face region.
        let image = RgbImage::from_fn(80, 80, |_, y| {
            if y < 40 {
                Rgb([224, 172, 140])
            } else {
                Rgb([90, 140, 200])
            }
        });
        let frame = Frame::from_image(image);
        let result = RegionClassifier::default().classify_region(&frame, &region(0, 0, 80, 80));
        // skin 0 -> +5, non-skin 1 -> +4, mask 1 -> +2, edges 0 -> -1,
        // variance 0 -> +2, texture 0 -> +2.
        assert_eq!(result.score, 14);
        assert_eq!(result.label, MaskLabel::MaskPresent);
    }

    #[test]
    fn classify_person_without_faces_uses_estimate() {
        let frame = Frame::from_image(RgbImage::from_pixel(200, 400, Rgb([224, 172, 140])));
        let person = Detection::new(BoundingBox::new(0, 0, 200, 400).unwrap(), 0.9).unwrap();
        let results = RegionClassifier::default().classify_person(&frame, &person, &mut NoFaceFinder);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].source, RegionSource::Estimated);
        assert_eq!(results[0].bbox, BoundingBox::new(20, 0, 180, 100).unwrap());
        assert_eq!(results[0].label, MaskLabel::MaskAbsent);
    }
}
