//! Duplicate region merging.
//!
//! Detectors sometimes emit two overlapping proposals for one element, or
//! split one element across two proposals. Same-class regions whose boxes
//! overlap beyond an IoU threshold are collapsed into one region that keeps
//! the stronger detection and covers both boxes.

use crate::region::Region;

/// Options for duplicate region merging.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DedupeOptions {
    /// IoU above which two same-class regions are merged. Default: `0.5`.
    pub iou_threshold: f64,
}

impl Default for DedupeOptions {
    fn default() -> Self {
        Self { iou_threshold: 0.5 }
    }
}

/// Returns whether `a` wins over `b` when the two are merged.
///
/// Higher confidence wins; ties go to the larger box, then to the earlier
/// detection.
fn outranks(a: &Region, b: &Region) -> bool {
    if a.confidence() != b.confidence() {
        return a.confidence() > b.confidence();
    }
    let (area_a, area_b) = (a.bbox().area(), b.bbox().area());
    if area_a != area_b {
        return area_a > area_b;
    }
    a.id() < b.id()
}

/// Find the same-class pair with the highest IoU above the threshold.
fn best_pair(regions: &[Region], threshold: f64) -> Option<(usize, usize)> {
    let mut best: Option<(usize, usize, f64)> = None;
    for i in 0..regions.len() {
        for j in (i + 1)..regions.len() {
            if regions[i].class() != regions[j].class() {
                continue;
            }
            let iou = regions[i].bbox().iou(regions[j].bbox());
            if iou > threshold && best.is_none_or(|(_, _, b)| iou > b) {
                best = Some((i, j, iou));
            }
        }
    }
    best.map(|(i, j, _)| (i, j))
}

/// Merge overlapping same-class regions of one page.
///
/// Repeatedly collapses the most-overlapping same-class pair whose IoU
/// exceeds `options.iou_threshold`: the winner (see ordering above) keeps its
/// id and class, its box becomes the union of both boxes and its confidence
/// the maximum of both. Regions of different classes are never merged.
///
/// The result is sorted by region id and contains no same-class pair above
/// the threshold, so running this again on its output is a no-op.
pub fn dedupe_regions(regions: Vec<Region>, options: &DedupeOptions) -> Vec<Region> {
    let mut regions = regions;
    regions.sort_by_key(|r| r.id());

    while let Some((i, j)) = best_pair(&regions, options.iou_threshold) {
        let (keep, drop) = if outranks(&regions[i], &regions[j]) {
            (i, j)
        } else {
            (j, i)
        };
        let absorbed = regions.remove(drop);
        let keep = if drop < keep { keep - 1 } else { keep };
        regions[keep].absorb(&absorbed);
    }

    regions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::BBox;
    use crate::region::{RegionClass, RegionId};

    fn region(seq: usize, class: RegionClass, bbox: BBox, confidence: f64) -> Region {
        Region::new(RegionId { page: 0, seq }, bbox, class, confidence).unwrap()
    }

    #[test]
    fn near_duplicates_merge_into_union_with_max_confidence() {
        // IoU = 80 / 100 = 0.8
        let a = region(0, RegionClass::PlainText, BBox::new(0.0, 0.0, 100.0, 10.0), 0.6);
        let b = region(1, RegionClass::PlainText, BBox::new(10.0, 0.0, 90.0, 10.0), 0.9);
        assert!((a.bbox().iou(b.bbox()) - 0.8).abs() < 1e-9);

        let out = dedupe_regions(vec![a, b], &DedupeOptions::default());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id(), RegionId { page: 0, seq: 1 });
        assert_eq!(out[0].confidence(), 0.9);
        assert_eq!(*out[0].bbox(), BBox::new(0.0, 0.0, 100.0, 10.0));
    }

    #[test]
    fn cross_class_overlap_is_kept() {
        let fig = region(0, RegionClass::Figure, BBox::new(0.0, 0.0, 100.0, 100.0), 0.9);
        let cap = region(1, RegionClass::FigureCaption, BBox::new(0.0, 0.0, 100.0, 100.0), 0.9);
        let out = dedupe_regions(vec![fig, cap], &DedupeOptions::default());
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn low_overlap_is_kept() {
        let a = region(0, RegionClass::Table, BBox::new(0.0, 0.0, 100.0, 100.0), 0.9);
        let b = region(1, RegionClass::Table, BBox::new(60.0, 0.0, 160.0, 100.0), 0.8);
        let out = dedupe_regions(vec![a, b], &DedupeOptions::default());
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn confidence_tie_breaks_by_area() {
        let small = region(0, RegionClass::Title, BBox::new(0.0, 0.0, 90.0, 10.0), 0.7);
        let large = region(1, RegionClass::Title, BBox::new(0.0, 0.0, 100.0, 10.0), 0.7);
        let out = dedupe_regions(vec![small, large], &DedupeOptions::default());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id(), RegionId { page: 0, seq: 1 });
    }

    #[test]
    fn chained_merges_collapse_to_one() {
        let a = region(0, RegionClass::PlainText, BBox::new(0.0, 0.0, 100.0, 10.0), 0.5);
        let b = region(1, RegionClass::PlainText, BBox::new(5.0, 0.0, 105.0, 10.0), 0.8);
        let c = region(2, RegionClass::PlainText, BBox::new(10.0, 0.0, 110.0, 10.0), 0.6);
        let out = dedupe_regions(vec![c, a, b], &DedupeOptions::default());
        assert_eq!(out.len(), 1);
        assert_eq!(*out[0].bbox(), BBox::new(0.0, 0.0, 110.0, 10.0));
        assert_eq!(out[0].confidence(), 0.8);
    }

    #[test]
    fn dedupe_is_idempotent() {
        let regions = vec![
            region(0, RegionClass::PlainText, BBox::new(0.0, 0.0, 100.0, 20.0), 0.9),
            region(1, RegionClass::PlainText, BBox::new(2.0, 1.0, 98.0, 21.0), 0.4),
            region(2, RegionClass::Figure, BBox::new(0.0, 30.0, 100.0, 90.0), 0.8),
            region(3, RegionClass::Figure, BBox::new(0.0, 50.0, 100.0, 120.0), 0.85),
            region(4, RegionClass::Table, BBox::new(0.0, 200.0, 50.0, 250.0), 0.7),
        ];
        let once = dedupe_regions(regions, &DedupeOptions::default());
        let twice = dedupe_regions(once.clone(), &DedupeOptions::default());
        assert_eq!(once, twice);
    }

    #[test]
    fn empty_input() {
        assert!(dedupe_regions(Vec::new(), &DedupeOptions::default()).is_empty());
    }
}
