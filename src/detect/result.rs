use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::geometry::BoundingBox;

/// COCO class id for "person", the class the mask pipeline targets by default.
pub const PERSON_CLASS_ID: u32 = 0;

/// Detector output exactly as an external backend reports it.
///
/// Nothing here is validated yet; the pipeline converts it with
/// [`RawDetection::to_detection`] and drops what fails.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    /// `[x1, y1, x2, y2]` in pixels of the source frame.
    pub bbox: [f32; 4],
    pub class_id: u32,
    pub confidence: f32,
}

impl RawDetection {
    pub fn new(bbox: [f32; 4], class_id: u32, confidence: f32) -> Self {
        Self {
            bbox,
            class_id,
            confidence,
        }
    }

    pub fn to_detection(&self) -> Result<Detection> {
        Detection::new(BoundingBox::from_xyxy(self.bbox)?, self.confidence)
    }
}

/// A validated detection: a non-degenerate box and a confidence in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Detection {
    bbox: BoundingBox,
    confidence: f32,
}

impl Detection {
    pub fn new(bbox: BoundingBox, confidence: f32) -> Result<Self> {
        if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
            return Err(anyhow!(
                "detection confidence must be within [0, 1], got {}",
                confidence
            ));
        }
        // Fold -0.0 into 0.0 so equal confidences sort as ties.
        Ok(Self {
            bbox,
            confidence: confidence + 0.0,
        })
    }

    pub fn bbox(&self) -> BoundingBox {
        self.bbox
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_confidence() {
        let bbox = BoundingBox::new(0, 0, 10, 10).unwrap();
        assert!(Detection::new(bbox, 1.5).is_err());
        assert!(Detection::new(bbox, -0.1).is_err());
        assert!(Detection::new(bbox, f32::NAN).is_err());
        assert!(Detection::new(bbox, 0.0).is_ok());
        assert!(Detection::new(bbox, 1.0).is_ok());
    }

    #[test]
    fn negative_zero_confidence_is_stored_as_zero() -> Result<()> {
        let det = Detection::new(BoundingBox::new(0, 0, 10, 10)?, -0.0)?;
        assert!(det.confidence().is_sign_positive());
        assert_eq!(det.confidence().to_bits(), 0.0f32.to_bits());
        Ok(())
    }

    #[test]
    fn raw_detection_truncates_coordinates() -> Result<()> {
        let raw = RawDetection::new([10.9, 20.2, 110.7, 220.0], PERSON_CLASS_ID, 0.8);
        let det = raw.to_detection()?;
        assert_eq!(det.bbox(), BoundingBox::new(10, 20, 110, 220)?);
        assert_eq!(det.confidence(), 0.8);
        Ok(())
    }

    #[test]
    fn raw_detection_deserializes_from_json() -> Result<()> {
        let raw: RawDetection =
            serde_json::from_str(r#"{"bbox": [1, 2, 30, 40], "class_id": 0, "confidence": 0.9}"#)?;
        assert_eq!(raw.class_id, 0);
        assert_eq!(raw.bbox, [1.0, 2.0, 30.0, 40.0]);
        Ok(())
    }
}
