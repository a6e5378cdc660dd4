//! Per-frame results: what the pipeline hands back to callers.
//!
//! `FrameReport` is plain serializable data. The diagnostic table and the
//! overlay are two renderings of it, one for terminals and one for images.

use std::fmt::Write as _;

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use serde::Serialize;

use crate::classify::{ClassificationResult, MaskLabel};
use crate::detect::Detection;
use crate::geometry::BoundingBox;

const PRESENT_COLOR: Rgb<u8> = Rgb([0, 200, 0]);
const ABSENT_COLOR: Rgb<u8> = Rgb([220, 0, 0]);
const UNKNOWN_COLOR: Rgb<u8> = Rgb([255, 140, 0]);
const PERSON_COLOR: Rgb<u8> = Rgb([128, 128, 128]);

/// One validated person and the classified regions found inside it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PersonReport {
    pub detection: Detection,
    pub regions: Vec<ClassificationResult>,
}

/// Region totals per label.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LabelCounts {
    pub regions: usize,
    pub with_mask: usize,
    pub without_mask: usize,
    pub unknown: usize,
}

impl LabelCounts {
    pub fn tally<'a, I>(results: I) -> Self
    where
        I: IntoIterator<Item = &'a ClassificationResult>,
    {
        let mut counts = Self::default();
        for result in results {
            counts.regions += 1;
            match result.label {
                MaskLabel::MaskPresent => counts.with_mask += 1,
                MaskLabel::MaskAbsent => counts.without_mask += 1,
                MaskLabel::Unknown => counts.unknown += 1,
            }
        }
        counts
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FrameReport {
    pub width: u32,
    pub height: u32,
    pub persons: Vec<PersonReport>,
    pub summary: LabelCounts,
}

impl FrameReport {
    pub fn new(width: u32, height: u32, persons: Vec<PersonReport>) -> Self {
        let summary = LabelCounts::tally(persons.iter().flat_map(|p| p.regions.iter()));
        Self {
            width,
            height,
            persons,
            summary,
        }
    }

    /// All classified regions, person by person.
    pub fn regions(&self) -> impl Iterator<Item = &ClassificationResult> {
        self.persons.iter().flat_map(|p| p.regions.iter())
    }
}

/// Fixed-width feature table, one row per region.
pub fn diagnostic_table(report: &FrameReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>3} {:>6} {:>8} {:>6} {:>6} {:>9} {:>8} {:>6}  {}",
        "#", "skin", "non-skin", "color", "edges", "variance", "texture", "score", "label"
    );
    for (index, result) in report.regions().enumerate() {
        match &result.features {
            Some(f) => {
                let _ = writeln!(
                    out,
                    "{:>3} {:>6.3} {:>8.3} {:>6.3} {:>6.3} {:>9.1} {:>8.2} {:>6}  {}",
                    index + 1,
                    f.skin_ratio,
                    f.non_skin_ratio,
                    f.mask_color_ratio,
                    f.edge_density,
                    f.color_variance,
                    f.texture_std,
                    result.score,
                    result.label
                );
            }
            None => {
                let _ = writeln!(
                    out,
                    "{:>3} {:>6} {:>8} {:>6} {:>6} {:>9} {:>8} {:>6}  {}",
                    index + 1,
                    "-",
                    "-",
                    "-",
                    "-",
                    "-",
                    "-",
                    result.score,
                    result.label
                );
            }
        }
    }
    let s = &report.summary;
    let _ = writeln!(
        out,
        "regions: {}  with mask: {}  without mask: {}  unknown: {}",
        s.regions, s.with_mask, s.without_mask, s.unknown
    );
    out
}

pub fn label_color(label: MaskLabel) -> Rgb<u8> {
    match label {
        MaskLabel::MaskPresent => PRESENT_COLOR,
        MaskLabel::MaskAbsent => ABSENT_COLOR,
        MaskLabel::Unknown => UNKNOWN_COLOR,
    }
}

/// Draw person boxes (gray) and region boxes (colored by label) onto `image`.
pub fn draw_overlay(image: &mut RgbImage, report: &FrameReport) {
    for person in &report.persons {
        draw_box(image, &person.detection.bbox(), PERSON_COLOR);
        for region in &person.regions {
            draw_box(image, &region.bbox, label_color(region.label));
        }
    }
}

fn draw_box(image: &mut RgbImage, bbox: &BoundingBox, color: Rgb<u8>) {
    let rect = Rect::at(bbox.x1(), bbox.y1()).of_size(bbox.width() as u32, bbox.height() as u32);
    draw_hollow_rect_mut(image, rect, color);
}
