//! Mask Kernel
//!
//! Per-frame face-mask classification on top of an external person detector.
//!
//! # Architecture
//!
//! For each frame the engine:
//!
//! 1. **Gates** raw detector output to the person class above a confidence floor.
//! 2. **Reduces** the survivors: size and aspect-ratio checks, then greedy
//!    confidence-priority non-max suppression. The result is a
//!    `ValidatedDetections` set that only `reduce` can build.
//! 3. **Locates** face regions inside every kept person box, through an
//!    external face finder or, failing that, a geometric estimate.
//! 4. **Classifies** each region as `MASK_PRESENT`, `MASK_ABSENT` or `UNKNOWN`
//!    from six pixel statistics of its lower half, scored against rule tables.
//!
//! The detector and the face finder are collaborators behind traits; the
//! engine itself is deterministic and keeps no state across frames.
//!
//! # Module Structure
//!
//! - `geometry`: `BoundingBox`, IoU
//! - `detect`: detector / face-finder seams, raw and validated detections
//! - `frame`: owned RGB frames and bounded crops
//! - `ingest`: pixel-format normalization, local image files
//! - `reduce`: box reducer
//! - `classify`: localization, features, scoring, decision
//! - `config`: `EngineConfig` and its loader
//! - `pipeline`: per-frame orchestration
//! - `report`: frame reports, diagnostic table, overlays

pub mod classify;
pub mod config;
pub mod detect;
pub mod frame;
pub mod geometry;
pub mod ingest;
pub mod pipeline;
pub mod reduce;
pub mod report;

pub use classify::{
    ClassificationResult, FaceRegion, FeatureVector, MaskLabel, RegionClassifier, RegionSource,
};
pub use config::{DetectorSettings, EngineConfig};
pub use detect::{
    BackendRegistry, Detection, DetectorBackend, FaceFinder, RawDetection, PERSON_CLASS_ID,
};
pub use frame::{Crop, Frame};
pub use geometry::{iou, BoundingBox};
pub use ingest::{load_frame, FileConfig, FileSource, PixelFormat};
pub use pipeline::FramePipeline;
pub use reduce::{reduce, ReducerConfig, ValidatedDetections};
pub use report::{diagnostic_table, draw_overlay, FrameReport, LabelCounts, PersonReport};
