//! Box reduction: validation plus confidence-priority non-max suppression.
//!
//! `reduce` turns the raw detections of one frame into a `ValidatedDetections`
//! set: sorted by confidence (descending, ties keep input order), every box
//! within the configured size/shape limits, and no two boxes overlapping by
//! more than the IoU threshold. The set can only be built here, so holding one
//! means those invariants hold.

use serde::{Deserialize, Serialize};

use crate::detect::Detection;
use crate::geometry::BoundingBox;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReducerConfig {
    /// Boxes overlapping an accepted box by more than this IoU are duplicates.
    pub iou_threshold: f64,
    /// Minimum box area in square pixels.
    pub min_area: i64,
    pub min_aspect_ratio: f64,
    pub max_aspect_ratio: f64,
}

impl Default for ReducerConfig {
    fn default() -> Self {
        Self {
            iou_threshold: 0.3,
            min_area: 2000,
            min_aspect_ratio: 0.3,
            max_aspect_ratio: 2.0,
        }
    }
}

/// Why a detection did not make it into the validated set.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Rejection {
    TooSmall { area: i64 },
    AspectRatio { ratio: f64 },
    /// Overlaps the accepted detection at `accepted_index` by `iou`.
    Duplicate { accepted_index: usize, iou: f64 },
}

/// Confidence-ordered, pairwise near-disjoint detections for one frame.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidatedDetections {
    detections: Vec<Detection>,
}

impl ValidatedDetections {
    pub fn len(&self) -> usize {
        self.detections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Detection> {
        self.detections.iter()
    }

    pub fn as_slice(&self) -> &[Detection] {
        &self.detections
    }

    pub fn into_vec(self) -> Vec<Detection> {
        self.detections
    }
}

impl<'a> IntoIterator for &'a ValidatedDetections {
    type Item = &'a Detection;
    type IntoIter = std::slice::Iter<'a, Detection>;

    fn into_iter(self) -> Self::IntoIter {
        self.detections.iter()
    }
}

/// Check one box against the size and shape limits.
pub fn check_shape(bbox: &BoundingBox, config: &ReducerConfig) -> Result<(), Rejection> {
    let area = bbox.area();
    if area < config.min_area {
        return Err(Rejection::TooSmall { area });
    }
    let ratio = bbox.aspect_ratio();
    if ratio < config.min_aspect_ratio || ratio > config.max_aspect_ratio {
        return Err(Rejection::AspectRatio { ratio });
    }
    Ok(())
}

/// Reduce raw detections to the validated set. O(n^2) in accepted boxes.
pub fn reduce(detections: &[Detection], config: &ReducerConfig) -> ValidatedDetections {
    let mut ordered: Vec<&Detection> = detections.iter().collect();
    // `sort_by` is stable: equal confidences keep their input order.
    ordered.sort_by(|a, b| b.confidence().total_cmp(&a.confidence()));

    let mut accepted: Vec<Detection> = Vec::with_capacity(ordered.len());
    for detection in ordered {
        let bbox = detection.bbox();
        let verdict = check_shape(&bbox, config)
            .and_then(|()| find_duplicate(&bbox, &accepted, config.iou_threshold));
        match verdict {
            Ok(()) => accepted.push(*detection),
            Err(reason) => log::debug!(
                "reducer: rejected {:?} (confidence {:.3}): {:?}",
                bbox,
                detection.confidence(),
                reason
            ),
        }
    }

    ValidatedDetections {
        detections: accepted,
    }
}

fn find_duplicate(
    bbox: &BoundingBox,
    accepted: &[Detection],
    iou_threshold: f64,
) -> Result<(), Rejection> {
    for (accepted_index, kept) in accepted.iter().enumerate() {
        let iou = bbox.iou(&kept.bbox());
        if iou > iou_threshold {
            return Err(Rejection::Duplicate {
                accepted_index,
                iou,
            });
        }
    }
    Ok(())
}

/// Greedy overlap suppression in the given order, without shape checks.
///
/// Used for face boxes, which carry no confidence of their own: the first box
/// of an overlapping group wins.
pub fn suppress_overlaps(boxes: Vec<BoundingBox>, iou_threshold: f64) -> Vec<BoundingBox> {
    let mut kept: Vec<BoundingBox> = Vec::with_capacity(boxes.len());
    for candidate in boxes {
        if !kept.iter().any(|k| candidate.iou(k) > iou_threshold) {
            kept.push(candidate);
        }
    }
    kept
}
