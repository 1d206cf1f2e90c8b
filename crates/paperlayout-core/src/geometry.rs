//! Page-space geometry shared by every pipeline stage.

/// Bounding box with top-left origin coordinate system.
///
/// Coordinates are PDF points measured from the top-left corner of the page:
/// - `x0`: left edge
/// - `top`: top edge (distance from top of page)
/// - `x1`: right edge
/// - `bottom`: bottom edge (distance from top of page)
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BBox {
    pub x0: f64,
    pub top: f64,
    pub x1: f64,
    pub bottom: f64,
}

impl BBox {
    pub fn new(x0: f64, top: f64, x1: f64, bottom: f64) -> Self {
        Self {
            x0,
            top,
            x1,
            bottom,
        }
    }

    /// Width of the bounding box.
    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    /// Height of the bounding box.
    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    /// Area of the bounding box (zero for inverted boxes).
    pub fn area(&self) -> f64 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    /// Whether all coordinates are finite and the box has positive area.
    pub fn is_valid(&self) -> bool {
        [self.x0, self.top, self.x1, self.bottom]
            .iter()
            .all(|v| v.is_finite())
            && self.x0 < self.x1
            && self.top < self.bottom
    }

    /// Horizontal center.
    pub fn center_x(&self) -> f64 {
        (self.x0 + self.x1) / 2.0
    }

    /// Vertical center.
    pub fn center_y(&self) -> f64 {
        (self.top + self.bottom) / 2.0
    }

    /// Compute the union of two bounding boxes.
    pub fn union(&self, other: &BBox) -> BBox {
        BBox {
            x0: self.x0.min(other.x0),
            top: self.top.min(other.top),
            x1: self.x1.max(other.x1),
            bottom: self.bottom.max(other.bottom),
        }
    }

    /// Intersection of two boxes, or `None` when they do not overlap.
    pub fn intersection(&self, other: &BBox) -> Option<BBox> {
        let x0 = self.x0.max(other.x0);
        let top = self.top.max(other.top);
        let x1 = self.x1.min(other.x1);
        let bottom = self.bottom.min(other.bottom);
        if x0 < x1 && top < bottom {
            Some(BBox::new(x0, top, x1, bottom))
        } else {
            None
        }
    }

    /// Intersection-over-union in `[0, 1]`.
    pub fn iou(&self, other: &BBox) -> f64 {
        let inter = self.intersection(other).map_or(0.0, |b| b.area());
        if inter <= 0.0 {
            return 0.0;
        }
        let union = self.area() + other.area() - inter;
        if union <= 0.0 { 0.0 } else { inter / union }
    }

    /// Length of the overlap of the two boxes' x-extents.
    pub fn horizontal_overlap(&self, other: &BBox) -> f64 {
        (self.x1.min(other.x1) - self.x0.max(other.x0)).max(0.0)
    }

    /// Whether a point lies inside the box (edges inclusive).
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.x0 && x <= self.x1 && y >= self.top && y <= self.bottom
    }

    /// Shortest distance between the two boxes' edges; zero when they touch or overlap.
    pub fn gap_distance(&self, other: &BBox) -> f64 {
        let dx = (other.x0 - self.x1).max(self.x0 - other.x1).max(0.0);
        let dy = (other.top - self.bottom).max(self.top - other.bottom).max(0.0);
        (dx * dx + dy * dy).sqrt()
    }

    /// Grow the box by `pad` on every side.
    pub fn expand(&self, pad: f64) -> BBox {
        BBox::new(
            self.x0 - pad,
            self.top - pad,
            self.x1 + pad,
            self.bottom + pad,
        )
    }

    /// Clamp the box to the page rectangle `[0, width] x [0, height]`.
    pub fn clamp_to(&self, width: f64, height: f64) -> BBox {
        BBox::new(
            self.x0.clamp(0.0, width),
            self.top.clamp(0.0, height),
            self.x1.clamp(0.0, width),
            self.bottom.clamp(0.0, height),
        )
    }

    /// Multiply every coordinate by `factor` (e.g. image pixels to points).
    pub fn scale(&self, factor: f64) -> BBox {
        BBox::new(
            self.x0 * factor,
            self.top * factor,
            self.x1 * factor,
            self.bottom * factor,
        )
    }
}

/// An RGB color with components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rgb(pub f64, pub f64, pub f64);

impl Rgb {
    pub const WHITE: Rgb = Rgb(1.0, 1.0, 1.0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bbox_dimensions() {
        let bbox = BBox::new(10.0, 20.0, 50.0, 60.0);
        assert_eq!(bbox.width(), 40.0);
        assert_eq!(bbox.height(), 40.0);
        assert_eq!(bbox.area(), 1600.0);
    }

    #[test]
    fn test_bbox_union() {
        let a = BBox::new(10.0, 20.0, 30.0, 40.0);
        let b = BBox::new(5.0, 25.0, 35.0, 45.0);
        assert_eq!(a.union(&b), BBox::new(5.0, 20.0, 35.0, 45.0));
    }

    #[test]
    fn test_validity() {
        assert!(BBox::new(0.0, 0.0, 1.0, 1.0).is_valid());
        assert!(!BBox::new(5.0, 0.0, 5.0, 1.0).is_valid());
        assert!(!BBox::new(0.0, 3.0, 1.0, 2.0).is_valid());
        assert!(!BBox::new(0.0, 0.0, f64::NAN, 1.0).is_valid());
    }

    #[test]
    fn test_intersection_disjoint() {
        let a = BBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BBox::new(20.0, 0.0, 30.0, 10.0);
        assert!(a.intersection(&b).is_none());
        assert_eq!(a.iou(&b), 0.0);
    }

    #[test]
    fn test_iou_identical_and_partial() {
        let a = BBox::new(0.0, 0.0, 10.0, 10.0);
        assert!((a.iou(&a) - 1.0).abs() < 1e-12);
        let b = BBox::new(5.0, 0.0, 15.0, 10.0);
        // intersection 50, union 150
        assert!((a.iou(&b) - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_gap_distance() {
        let a = BBox::new(0.0, 0.0, 10.0, 10.0);
        let below = BBox::new(0.0, 14.0, 10.0, 20.0);
        assert_eq!(a.gap_distance(&below), 4.0);
        let diagonal = BBox::new(13.0, 14.0, 20.0, 20.0);
        assert_eq!(a.gap_distance(&diagonal), 5.0);
        assert_eq!(a.gap_distance(&a), 0.0);
    }

    #[test]
    fn test_clamp_and_expand() {
        let b = BBox::new(1.0, 1.0, 99.0, 99.0).expand(2.0).clamp_to(100.0, 100.0);
        assert_eq!(b, BBox::new(0.0, 0.0, 100.0, 100.0));
    }
}
