use anyhow::Result;

use crate::detect::backend::DetectorBackend;
use crate::detect::result::{RawDetection, PERSON_CLASS_ID};
use crate::frame::Frame;

/// Backend that reports the whole frame as a single person detection.
///
/// Useful when the input is already a tight crop of one person, and in tests.
pub struct FullFrameBackend {
    confidence: f32,
}

impl FullFrameBackend {
    pub fn new() -> Self {
        Self { confidence: 1.0 }
    }

    /// Override the confidence attached to the full-frame detection.
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }
}

impl Default for FullFrameBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectorBackend for FullFrameBackend {
    fn name(&self) -> &'static str {
        "full_frame"
    }

    fn detect(&mut self, frame: &Frame) -> Result<Vec<RawDetection>> {
        Ok(vec![RawDetection::new(
            [0.0, 0.0, frame.width() as f32, frame.height() as f32],
            PERSON_CLASS_ID,
            self.confidence,
        )])
    }
}
