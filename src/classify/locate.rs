//! Face region localization inside a validated person box.
//!
//! The face finder runs on the person crop. Its boxes come back in crop
//! coordinates and are mapped back to the frame here. When it finds nothing
//! (or fails) the face is assumed to sit centred at the top of the person box,
//! with a confidence penalty marking the guess.

use serde::{Deserialize, Serialize};

use crate::detect::{Detection, FaceFinder};
use crate::frame::Frame;
use crate::geometry::BoundingBox;
use crate::reduce::suppress_overlaps;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocatorConfig {
    /// Overlap above which two found faces are the same face.
    pub face_iou_threshold: f64,
    /// Estimated face width as a fraction of the person width.
    pub face_width_ratio: f64,
    /// Estimated face height as a fraction of the person height.
    pub face_height_ratio: f64,
    /// Multiplier applied to the person confidence for estimated regions.
    pub estimated_confidence_penalty: f32,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            face_iou_threshold: 0.3,
            face_width_ratio: 0.8,
            face_height_ratio: 0.25,
            estimated_confidence_penalty: 0.7,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionSource {
    /// Reported by the face finder.
    Located,
    /// Derived from person-box proportions.
    Estimated,
}

/// One face region to classify, in frame coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct FaceRegion {
    pub bbox: BoundingBox,
    pub confidence: f32,
    pub source: RegionSource,
}

/// Heuristic face box for a person: horizontally centred, anchored at the top.
///
/// Width and height are rounded and never below one pixel, so the result is
/// always a valid box inside `person`.
pub fn estimate_face_box(person: &BoundingBox, config: &LocatorConfig) -> BoundingBox {
    let person_width = person.width();
    let person_height = person.height();
    let face_width = scaled(person_width, config.face_width_ratio);
    let face_height = scaled(person_height, config.face_height_ratio);
    let x_offset = (person_width - face_width) / 2;
    BoundingBox::with_size(person.x1() + x_offset, person.y1(), face_width, face_height)
        .unwrap_or(*person)
}

fn scaled(extent: i32, ratio: f64) -> i32 {
    let value = (extent as f64 * ratio).round();
    if value.is_nan() {
        return 1;
    }
    (value as i32).clamp(1, extent)
}

/// Turn face-finder output into face regions for `person`.
///
/// `faces` are in the coordinates of the crop whose top-left corner is
/// `crop_origin`. They are translated, clipped to the person box and
/// de-duplicated in the order given. An empty outcome falls back to one
/// estimated region, so the result is never empty.
pub fn regions_from_faces(
    person: &Detection,
    crop_origin: (i32, i32),
    faces: &[BoundingBox],
    config: &LocatorConfig,
) -> Vec<FaceRegion> {
    let person_box = person.bbox();
    let in_frame: Vec<BoundingBox> = faces
        .iter()
        .filter_map(|face| face.translated(crop_origin.0, crop_origin.1))
        .filter_map(|face| face.intersect(&person_box))
        .collect();
    let distinct = suppress_overlaps(in_frame, config.face_iou_threshold);

    if distinct.is_empty() {
        return vec![estimated_region(person, config)];
    }
    distinct
        .into_iter()
        .map(|bbox| FaceRegion {
            bbox,
            confidence: person.confidence(),
            source: RegionSource::Located,
        })
        .collect()
}

pub fn estimated_region(person: &Detection, config: &LocatorConfig) -> FaceRegion {
    FaceRegion {
        bbox: estimate_face_box(&person.bbox(), config),
        confidence: person.confidence() * config.estimated_confidence_penalty,
        source: RegionSource::Estimated,
    }
}

/// Crop the person, ask `finder` for faces and build the face regions.
///
/// A finder error is logged and treated as "no faces found".
pub fn locate_faces(
    frame: &Frame,
    person: &Detection,
    finder: &mut dyn FaceFinder,
    config: &LocatorConfig,
) -> Vec<FaceRegion> {
    let Some(crop) = frame.crop(&person.bbox()) else {
        log::debug!(
            "locator: person {:?} lies outside the {}x{} frame, estimating",
            person.bbox(),
            frame.width(),
            frame.height()
        );
        return vec![estimated_region(person, config)];
    };

    let faces = match finder.find_faces(&crop) {
        Ok(faces) => faces,
        Err(err) => {
            log::warn!(
                "face finder '{}' failed on {:?}: {:#}",
                finder.name(),
                crop.bbox,
                err
            );
            Vec::new()
        }
    };
    let origin = (crop.bbox.x1(), crop.bbox.y1());
    let regions = regions_from_faces(person, origin, &faces, config);
    log::debug!(
        "locator: person {:?} -> {} region(s) ({} from '{}')",
        person.bbox(),
        regions.len(),
        faces.len(),
        finder.name()
    );
    regions
}
