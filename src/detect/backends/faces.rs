use std::path::Path;

use anyhow::{Context, Result};

use crate::detect::backend::FaceFinder;
use crate::frame::Crop;
use crate::geometry::BoundingBox;

/// Face finder that never finds anything, forcing the geometric estimate.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoFaceFinder;

impl FaceFinder for NoFaceFinder {
    fn name(&self) -> &'static str {
        "none"
    }

    fn find_faces(&mut self, _crop: &Crop) -> Result<Vec<BoundingBox>> {
        Ok(Vec::new())
    }
}

/// Face finder that replays face boxes recorded in full-frame coordinates.
///
/// For each crop it returns the recorded faces overlapping the crop, clipped
/// to it and expressed in crop coordinates, in recording order.
#[derive(Clone, Debug, Default)]
pub struct ReplayFaceFinder {
    faces: Vec<BoundingBox>,
}

impl ReplayFaceFinder {
    pub fn new(faces: Vec<BoundingBox>) -> Self {
        Self { faces }
    }

    /// Load a JSON array of `[x1, y1, x2, y2]` face boxes.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read faces file {}", path.display()))?;
        let coords: Vec<[f32; 4]> = serde_json::from_str(&raw)
            .with_context(|| format!("invalid faces file {}", path.display()))?;
        let faces = coords
            .into_iter()
            .map(BoundingBox::from_xyxy)
            .collect::<Result<Vec<_>>>()
            .with_context(|| format!("invalid face box in {}", path.display()))?;
        Ok(Self::new(faces))
    }
}

impl FaceFinder for ReplayFaceFinder {
    fn name(&self) -> &'static str {
        "replay"
    }

    fn find_faces(&mut self, crop: &Crop) -> Result<Vec<BoundingBox>> {
        let origin = crop.bbox;
        Ok(self
            .faces
            .iter()
            .filter_map(|face| face.intersect(&origin))
            .filter_map(|face| face.translated(-origin.x1(), -origin.y1()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Frame;

    #[test]
    fn replayed_faces_are_relative_to_the_crop() -> Result<()> {
        let frame = Frame::from_rgb(vec![0u8; 100 * 100 * 3], 100, 100)?;
        let crop = frame
            .crop(&BoundingBox::new(20, 10, 80, 90)?)
            .expect("crop inside frame");

        let mut finder = ReplayFaceFinder::new(vec![
            BoundingBox::new(30, 15, 50, 35)?,
            BoundingBox::new(0, 0, 10, 10)?,
        ]);
        let faces = finder.find_faces(&crop)?;
        assert_eq!(faces, vec![BoundingBox::new(10, 5, 30, 25)?]);

        assert!(NoFaceFinder.find_faces(&crop)?.is_empty());
        Ok(())
    }
}
