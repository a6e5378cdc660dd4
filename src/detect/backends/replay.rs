use std::path::Path;

use anyhow::{Context, Result};

use crate::detect::backend::DetectorBackend;
use crate::detect::result::RawDetection;
use crate::frame::Frame;

/// Backend that replays detections recorded from an external detector.
///
/// The file format is a JSON array of `RawDetection` objects:
/// `[{"bbox": [x1, y1, x2, y2], "class_id": 0, "confidence": 0.9}]`.
pub struct ReplayBackend {
    detections: Vec<RawDetection>,
}

impl ReplayBackend {
    pub fn new(detections: Vec<RawDetection>) -> Self {
        Self { detections }
    }

    /// Load recorded detections from a local JSON file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read detections file {}", path.display()))?;
        let detections: Vec<RawDetection> = serde_json::from_str(&raw)
            .with_context(|| format!("invalid detections file {}", path.display()))?;
        log::info!(
            "ReplayBackend: loaded {} detections from {}",
            detections.len(),
            path.display()
        );
        Ok(Self::new(detections))
    }
}

impl DetectorBackend for ReplayBackend {
    fn name(&self) -> &'static str {
        "replay"
    }

    fn detect(&mut self, _frame: &Frame) -> Result<Vec<RawDetection>> {
        Ok(self.detections.clone())
    }
}
