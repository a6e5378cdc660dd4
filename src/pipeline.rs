//! Per-frame orchestration.
//!
//! raw detections -> class/confidence gate -> validation -> box reduction ->
//! face localization -> classification -> `FrameReport`.
//!
//! The pipeline holds configuration only. Frames, detections and finder state
//! are passed in per call and nothing is retained between frames.

use anyhow::{anyhow, Result};

use crate::classify::RegionClassifier;
use crate::config::EngineConfig;
use crate::detect::{BackendRegistry, Detection, DetectorBackend, FaceFinder, RawDetection};
use crate::frame::Frame;
use crate::reduce::{reduce, ValidatedDetections};
use crate::report::{FrameReport, PersonReport};

pub struct FramePipeline {
    config: EngineConfig,
    classifier: RegionClassifier,
}

impl FramePipeline {
    /// Build a pipeline from a configuration, rejecting incoherent settings.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let classifier = RegionClassifier::new(
            config.locator.clone(),
            config.features.clone(),
            config.scoring.clone(),
            config.decision.clone(),
        );
        Ok(Self { config, classifier })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn classifier(&self) -> &RegionClassifier {
        &self.classifier
    }

    /// Keep detections of the target class at or above the confidence floor.
    ///
    /// Malformed detections (degenerate box, non-finite values) are dropped
    /// with a warning.
    pub fn gate(&self, raw: &[RawDetection]) -> Vec<Detection> {
        let settings = &self.config.detector;
        let mut kept = Vec::with_capacity(raw.len());
        for detection in raw {
            if detection.class_id != settings.target_class_id {
                log::debug!(
                    "gate: skipping class {} (target {})",
                    detection.class_id,
                    settings.target_class_id
                );
                continue;
            }
            if detection.confidence < settings.min_detector_confidence {
                log::debug!(
                    "gate: skipping confidence {:.3} below {:.3}",
                    detection.confidence,
                    settings.min_detector_confidence
                );
                continue;
            }
            match detection.to_detection() {
                Ok(valid) => kept.push(valid),
                Err(err) => log::warn!("dropping malformed detection {:?}: {:#}", detection, err),
            }
        }
        kept
    }

    /// Gate and reduce raw detector output for one frame.
    pub fn validate_detections(&self, raw: &[RawDetection]) -> ValidatedDetections {
        reduce(&self.gate(raw), &self.config.reducer)
    }

    /// Classify every person in `frame` given the detector's raw output.
    pub fn process(
        &self,
        frame: &Frame,
        raw: &[RawDetection],
        finder: &mut dyn FaceFinder,
    ) -> FrameReport {
        let persons = self.validate_detections(raw);
        let reports: Vec<PersonReport> = persons
            .iter()
            .map(|person| PersonReport {
                detection: *person,
                regions: self.classifier.classify_person(frame, person, finder),
            })
            .collect();

        let report = FrameReport::new(frame.width(), frame.height(), reports);
        let summary = &report.summary;
        log::info!(
            "frame {}x{}: {} raw detection(s), {} person(s), {} region(s): {} with mask, {} without, {} unknown",
            frame.width(),
            frame.height(),
            raw.len(),
            persons.len(),
            summary.regions,
            summary.with_mask,
            summary.without_mask,
            summary.unknown
        );
        report
    }

    /// Run `detector` on the frame, then `process` its output.
    pub fn run(
        &self,
        frame: &Frame,
        detector: &mut dyn DetectorBackend,
        finder: &mut dyn FaceFinder,
    ) -> Result<FrameReport> {
        let raw = detector
            .detect(frame)
            .map_err(|e| anyhow!("detector '{}' failed: {:#}", detector.name(), e))?;
        Ok(self.process(frame, &raw, finder))
    }

    /// Run the registry's default backend, then `process` its output.
    pub fn run_with_registry(
        &self,
        frame: &Frame,
        registry: &BackendRegistry,
        finder: &mut dyn FaceFinder,
    ) -> Result<FrameReport> {
        let raw = registry.detect_with_default(frame)?;
        Ok(self.process(frame, &raw, finder))
    }
}
