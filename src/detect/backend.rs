use anyhow::Result;

use crate::detect::result::RawDetection;
use crate::frame::{Crop, Frame};
use crate::geometry::BoundingBox;

/// Object detector backend trait.
///
/// The neural detector itself lives outside this crate. A backend is the
/// adapter that turns its output into `RawDetection`s for one frame; the
/// pipeline does class gating, validation and reduction afterwards.
pub trait DetectorBackend: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Run detection on a frame.
    ///
    /// Implementations must treat the frame as read-only and must not keep
    /// references to it beyond the call.
    fn detect(&mut self, frame: &Frame) -> Result<Vec<RawDetection>>;

    /// Optional warm-up hook.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Face finder run over one cropped person region.
///
/// Returned boxes are in crop coordinates (origin at the crop's top-left
/// corner). An empty vector means "no face found" and triggers estimation.
pub trait FaceFinder {
    fn name(&self) -> &'static str;

    fn find_faces(&mut self, crop: &Crop) -> Result<Vec<BoundingBox>>;
}
