//! Pixel-space rectangle geometry.
//!
//! `BoundingBox` is the axis-aligned rectangle every other layer exchanges.
//! Coordinates are integer pixels with `x2 > x1` and `y2 > y1`; the constructor
//! is the only way to build one, so a box in hand is never degenerate.

use anyhow::{anyhow, Result};
use serde::Serialize;

/// Axis-aligned rectangle `(x1, y1, x2, y2)` in pixel coordinates.
///
/// `x1`/`y1` are inclusive, `x2`/`y2` exclusive, matching slice semantics
/// when the box is used to crop a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct BoundingBox {
    x1: i32,
    y1: i32,
    x2: i32,
    y2: i32,
}

impl BoundingBox {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Result<Self> {
        if x2 <= x1 || y2 <= y1 {
            return Err(anyhow!(
                "degenerate box ({}, {}, {}, {}): requires x2 > x1 and y2 > y1",
                x1,
                y1,
                x2,
                y2
            ));
        }
        if x2.checked_sub(x1).is_none() || y2.checked_sub(y1).is_none() {
            return Err(anyhow!(
                "box ({}, {}, {}, {}) is too large: width and height must fit in i32",
                x1,
                y1,
                x2,
                y2
            ));
        }
        Ok(Self { x1, y1, x2, y2 })
    }

    /// Build a box from floating-point detector output, truncating toward zero.
    pub fn from_xyxy(coords: [f32; 4]) -> Result<Self> {
        if coords.iter().any(|c| !c.is_finite()) {
            return Err(anyhow!("box coordinates must be finite: {:?}", coords));
        }
        Self::new(
            coords[0] as i32,
            coords[1] as i32,
            coords[2] as i32,
            coords[3] as i32,
        )
    }

    /// Box with its top-left corner at `(x1, y1)`. `None` for a non-positive
    /// size or coordinate overflow.
    pub fn with_size(x1: i32, y1: i32, width: i32, height: i32) -> Option<Self> {
        if width <= 0 || height <= 0 {
            return None;
        }
        Some(Self {
            x1,
            y1,
            x2: x1.checked_add(width)?,
            y2: y1.checked_add(height)?,
        })
    }

    pub fn x1(&self) -> i32 {
        self.x1
    }

    pub fn y1(&self) -> i32 {
        self.y1
    }

    pub fn x2(&self) -> i32 {
        self.x2
    }

    pub fn y2(&self) -> i32 {
        self.y2
    }

    pub fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> i32 {
        self.y2 - self.y1
    }

    pub fn area(&self) -> i64 {
        self.width() as i64 * self.height() as i64
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.width() as f64 / self.height() as f64
    }

    /// Overlapping rectangle, or `None` when the boxes only touch or are apart.
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        let x1 = self.x1.max(other.x1);
        let y1 = self.y1.max(other.y1);
        let x2 = self.x2.min(other.x2);
        let y2 = self.y2.min(other.y2);
        if x2 <= x1 || y2 <= y1 {
            return None;
        }
        Some(Self { x1, y1, x2, y2 })
    }

    pub fn intersection_area(&self, other: &Self) -> i64 {
        self.intersect(other).map(|b| b.area()).unwrap_or(0)
    }

    /// Intersection over union. Disjoint boxes and an empty union both yield 0.
    pub fn iou(&self, other: &Self) -> f64 {
        let intersection = self.intersection_area(other);
        if intersection == 0 {
            return 0.0;
        }
        let union = self.area() + other.area() - intersection;
        if union <= 0 {
            return 0.0;
        }
        intersection as f64 / union as f64
    }

    /// Shift the box by `(dx, dy)`. `None` on coordinate overflow.
    pub fn translated(&self, dx: i32, dy: i32) -> Option<Self> {
        Some(Self {
            x1: self.x1.checked_add(dx)?,
            y1: self.y1.checked_add(dy)?,
            x2: self.x2.checked_add(dx)?,
            y2: self.y2.checked_add(dy)?,
        })
    }

    /// Clip the box to a `width x height` image. `None` if nothing remains.
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<Self> {
        let bounds = Self {
            x1: 0,
            y1: 0,
            x2: i32::try_from(width).unwrap_or(i32::MAX),
            y2: i32::try_from(height).unwrap_or(i32::MAX),
        };
        if bounds.x2 == 0 || bounds.y2 == 0 {
            return None;
        }
        self.intersect(&bounds)
    }
}

/// Intersection over union of two boxes. Symmetric; `iou(b, b) == 1.0`.
pub fn iou(a: &BoundingBox, b: &BoundingBox) -> f64 {
    a.iou(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bb(x1: i32, y1: i32, x2: i32, y2: i32) -> BoundingBox {
        BoundingBox::new(x1, y1, x2, y2).unwrap()
    }

    #[test]
    fn rejects_degenerate_boxes() {
        assert!(BoundingBox::new(10, 10, 10, 20).is_err());
        assert!(BoundingBox::new(10, 10, 20, 5).is_err());
        assert!(BoundingBox::from_xyxy([0.0, 0.0, f32::NAN, 4.0]).is_err());
    }

    #[test]
    fn rejects_boxes_wider_than_i32() {
        assert!(BoundingBox::new(i32::MIN, 0, i32::MAX, 100).is_err());
        assert!(BoundingBox::new(0, -10, 10, i32::MAX).is_err());
        // Saturating float casts land on the extremes.
        assert!(BoundingBox::from_xyxy([-3.0e9, 0.0, 3.0e9, 100.0]).is_err());
        let widest = BoundingBox::new(-1, 0, i32::MAX - 1, 1).unwrap();
        assert_eq!(widest.width(), i32::MAX);
    }

    #[test]
    fn derived_measurements() {
        let b = bb(10, 20, 60, 120);
        assert_eq!(b.width(), 50);
        assert_eq!(b.height(), 100);
        assert_eq!(b.area(), 5000);
        assert!((b.aspect_ratio() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn iou_of_box_with_itself_is_one() {
        let b = bb(3, 7, 40, 90);
        assert_eq!(iou(&b, &b), 1.0);
    }

    #[test]
    fn iou_is_symmetric_and_zero_when_disjoint() {
        let a = bb(0, 0, 100, 100);
        let b = bb(5, 5, 105, 105);
        assert_eq!(iou(&a, &b), iou(&b, &a));
        let expected = 9025.0 / (10000.0 + 10000.0 - 9025.0);
        assert!((iou(&a, &b) - expected).abs() < 1e-12);

        let far = bb(200, 200, 210, 210);
        assert_eq!(iou(&a, &far), 0.0);
        // Touching edges do not overlap.
        let touching = bb(100, 0, 150, 100);
        assert_eq!(iou(&a, &touching), 0.0);
    }

    #[test]
    fn clamp_and_translate() {
        let b = bb(-10, -10, 50, 50);
        assert_eq!(b.clamp_to(40, 30), Some(bb(0, 0, 40, 30)));
        assert_eq!(bb(100, 100, 120, 120).clamp_to(40, 30), None);
        assert_eq!(b.clamp_to(0, 30), None);

        assert_eq!(bb(1, 2, 3, 4).translated(10, 20), Some(bb(11, 22, 13, 24)));
        assert_eq!(bb(1, 2, 3, 4).translated(i32::MAX, 0), None);
    }
}
