//! Reading-order reconstruction for single- and two-column pages.
//!
//! Column structure is inferred from the horizontal extents of text regions.
//! Regions spanning (almost) the whole page width split the page into
//! vertical bands; inside a band regions are read column by column, top to
//! bottom. Pages whose text does not cluster into one or two columns fall
//! back to plain top-to-bottom order.

use std::cmp::Ordering;

use crate::document::Page;
use crate::geometry::BBox;
use crate::region::{Region, RegionClass};

/// Options for reading-order reconstruction.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct OrderOptions {
    /// Regions wider than this fraction of the page width are full-width
    /// band delimiters. Default: `0.8`.
    pub full_width_ratio: f64,
    /// Minimum horizontal gap between column extents, as a fraction of page
    /// width, that signals a column break. Default: `0.02`.
    pub column_gap_ratio: f64,
    /// Minimum number of column-forming text regions needed to trust column
    /// detection. Default: `2`.
    pub min_column_regions: usize,
    /// Text regions at most this fraction of the page width can reveal a
    /// gutter that a wider block (a centred abstract, an author list)
    /// bridges. Default: `0.5`.
    pub max_column_width_ratio: f64,
}

impl Default for OrderOptions {
    fn default() -> Self {
        Self {
            full_width_ratio: 0.8,
            column_gap_ratio: 0.02,
            min_column_regions: 2,
            max_column_width_ratio: 0.5,
        }
    }
}

/// How a page was ordered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OrderStrategy {
    /// One text column; top to bottom.
    SingleColumn,
    /// Two text columns separated at x = `split`.
    TwoColumn { split: f64 },
    /// Column detection was inconclusive; ordered by (top, x0).
    Fallback,
}

impl OrderStrategy {
    pub fn is_fallback(&self) -> bool {
        matches!(self, OrderStrategy::Fallback)
    }
}

/// Result of column detection on one page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColumnLayout {
    Single,
    Split(f64),
    Inconclusive,
}

fn is_full_width(bbox: &BBox, page_width: f64, options: &OrderOptions) -> bool {
    bbox.width() > page_width * options.full_width_ratio
}

/// Merge x extents whose gap is at most `min_gap`, left to right.
fn gap_clusters<'a>(boxes: impl IntoIterator<Item = &'a BBox>, min_gap: f64) -> Vec<(f64, f64)> {
    let mut extents: Vec<(f64, f64)> = boxes.into_iter().map(|b| (b.x0, b.x1)).collect();
    extents.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut clusters: Vec<(f64, f64)> = Vec::new();
    for (x0, x1) in extents {
        match clusters.last_mut() {
            Some(last) if x0 - last.1 <= min_gap => last.1 = last.1.max(x1),
            _ => clusters.push((x0, x1)),
        }
    }
    clusters
}

/// Detect whether the page's text regions form one or two columns.
///
/// Only non-full-width Title and PlainText regions take part. Their x
/// extents are merged whenever the gap between them is at most
/// `column_gap_ratio * page_width`; one merged extent is a single column,
/// two are a two-column layout split at the middle of the gap, anything
/// else (or too few regions) is inconclusive. When everything merges into
/// one extent, the gap test is repeated on the column-sized regions alone
/// (at most `max_column_width_ratio` of the page width), so a block
/// spanning the gutter does not hide the columns beneath it.
pub fn detect_column_layout(
    regions: &[Region],
    page_width: f64,
    options: &OrderOptions,
) -> ColumnLayout {
    let text: Vec<&BBox> = regions
        .iter()
        .filter(|r| matches!(r.class(), RegionClass::Title | RegionClass::PlainText))
        .map(|r| r.bbox())
        .filter(|b| !is_full_width(b, page_width, options))
        .collect();

    if text.is_empty() || text.len() < options.min_column_regions {
        return ColumnLayout::Inconclusive;
    }

    let min_gap = page_width * options.column_gap_ratio;
    match gap_clusters(text.iter().copied(), min_gap).as_slice() {
        [_] => {
            let narrow: Vec<&BBox> = text
                .iter()
                .copied()
                .filter(|b| b.width() <= page_width * options.max_column_width_ratio)
                .collect();
            if narrow.len() >= options.min_column_regions {
                if let [left, right] = gap_clusters(narrow, min_gap).as_slice() {
                    return ColumnLayout::Split((left.1 + right.0) / 2.0);
                }
            }
            ColumnLayout::Single
        }
        [left, right] => ColumnLayout::Split((left.1 + right.0) / 2.0),
        _ => ColumnLayout::Inconclusive,
    }
}

fn top_then_left(a: &Region, b: &Region) -> Ordering {
    a.bbox()
        .top
        .total_cmp(&b.bbox().top)
        .then(a.bbox().x0.total_cmp(&b.bbox().x0))
        .then(a.id().cmp(&b.id()))
}

/// Column (0 = left, 1 = right) a region overlaps most.
fn column_of(bbox: &BBox, split: f64, page_width: f64) -> usize {
    let left = (bbox.x1.min(split) - bbox.x0.max(0.0)).max(0.0);
    let right = (bbox.x1.min(page_width.max(split)) - bbox.x0.max(split)).max(0.0);
    if right > left { 1 } else { 0 }
}

/// Whether a region reaches more than `tolerance` into both columns.
fn straddles(bbox: &BBox, split: f64, tolerance: f64) -> bool {
    (split - bbox.x0).min(bbox.x1 - split) > tolerance
}

/// Order two-column content: bands delimited by full-width regions and by
/// regions straddling the gutter, each band read left column then right
/// column.
fn two_column_order<'a>(
    regions: &'a [Region],
    split: f64,
    page_width: f64,
    options: &OrderOptions,
) -> Vec<&'a Region> {
    let tolerance = page_width * options.column_gap_ratio;
    let (mut delimiters, rest): (Vec<&Region>, Vec<&Region>) =
        regions.iter().partition(|r| {
            is_full_width(r.bbox(), page_width, options) || straddles(r.bbox(), split, tolerance)
        });
    delimiters.sort_by(|a, b| top_then_left(a, b));

    let band_count = delimiters.len() + 1;
    let mut bands: Vec<Vec<(usize, &Region)>> = vec![Vec::new(); band_count];
    for region in rest {
        let cy = region.bbox().center_y();
        let band = delimiters.iter().filter(|d| d.bbox().top <= cy).count();
        bands[band].push((column_of(region.bbox(), split, page_width), region));
    }

    let mut ordered = Vec::with_capacity(regions.len());
    for (index, mut band) in bands.into_iter().enumerate() {
        band.sort_by(|(ca, a), (cb, b)| ca.cmp(cb).then_with(|| top_then_left(a, b)));
        ordered.extend(band.into_iter().map(|(_, r)| r));
        if let Some(delimiter) = delimiters.get(index) {
            ordered.push(delimiter);
        }
    }
    ordered
}

/// Assign page-local `order_index` values (0, 1, 2, ...) to every region.
///
/// Returns the strategy used so callers can record a fallback.
pub fn order_page(page: &mut Page, options: &OrderOptions) -> OrderStrategy {
    let layout = detect_column_layout(&page.regions, page.width, options);

    let order: Vec<_> = match layout {
        ColumnLayout::Split(split) => two_column_order(&page.regions, split, page.width, options)
            .into_iter()
            .map(|r| r.id())
            .collect(),
        ColumnLayout::Single | ColumnLayout::Inconclusive => {
            let mut sorted: Vec<&Region> = page.regions.iter().collect();
            sorted.sort_by(|a, b| top_then_left(a, b));
            sorted.into_iter().map(|r| r.id()).collect()
        }
    };

    for (index, id) in order.into_iter().enumerate() {
        if let Some(region) = page.regions.iter_mut().find(|r| r.id() == id) {
            region.set_order_index(index);
        }
    }

    match layout {
        ColumnLayout::Single => OrderStrategy::SingleColumn,
        ColumnLayout::Split(split) => OrderStrategy::TwoColumn { split },
        ColumnLayout::Inconclusive => OrderStrategy::Fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::RegionId;

    const W: f64 = 612.0;
    const H: f64 = 792.0;

    fn page(specs: &[(RegionClass, f64, f64, f64, f64)]) -> Page {
        let mut page = Page::new(0, W, H);
        page.regions = specs
            .iter()
            .enumerate()
            .map(|(seq, &(class, x0, top, x1, bottom))| {
                Region::new(RegionId { page: 0, seq }, BBox::new(x0, top, x1, bottom), class, 0.9)
                    .unwrap()
            })
            .collect();
        page
    }

    fn order_of(page: &Page) -> Vec<usize> {
        page.ordered().iter().map(|r| r.id().seq).collect()
    }

    #[test]
    fn single_column_top_to_bottom() {
        let mut p = page(&[
            (RegionClass::PlainText, 72.0, 120.0, 540.0, 160.0),
            (RegionClass::Title, 72.0, 10.0, 540.0, 40.0),
            (RegionClass::PlainText, 72.0, 60.0, 540.0, 100.0),
        ]);
        order_page(&mut p, &OrderOptions::default());
        let by_seq: Vec<Option<usize>> = p.regions.iter().map(|r| r.order_index()).collect();
        assert_eq!(by_seq, vec![Some(2), Some(0), Some(1)]);
    }

    #[test]
    fn two_columns_left_before_right() {
        let mut p = page(&[
            (RegionClass::PlainText, 320.0, 100.0, 600.0, 200.0),
            (RegionClass::PlainText, 10.0, 150.0, 300.0, 250.0),
            (RegionClass::PlainText, 320.0, 260.0, 600.0, 400.0),
            (RegionClass::PlainText, 10.0, 300.0, 300.0, 420.0),
            (RegionClass::PlainText, 10.0, 80.0, 300.0, 140.0),
        ]);
        let strategy = order_page(&mut p, &OrderOptions::default());
        assert!(matches!(strategy, OrderStrategy::TwoColumn { split } if split == 310.0));
        assert_eq!(order_of(&p), vec![4, 1, 3, 0, 2]);
    }

    #[test]
    fn full_width_region_delimits_bands() {
        let mut p = page(&[
            (RegionClass::Title, 20.0, 10.0, 590.0, 50.0),
            (RegionClass::PlainText, 320.0, 60.0, 600.0, 200.0),
            (RegionClass::PlainText, 10.0, 60.0, 300.0, 200.0),
            (RegionClass::Figure, 20.0, 220.0, 590.0, 400.0),
            (RegionClass::PlainText, 320.0, 420.0, 600.0, 600.0),
            (RegionClass::PlainText, 10.0, 420.0, 300.0, 600.0),
        ]);
        let strategy = order_page(&mut p, &OrderOptions::default());
        assert!(matches!(strategy, OrderStrategy::TwoColumn { .. }));
        assert_eq!(order_of(&p), vec![0, 2, 1, 3, 5, 4]);
    }

    #[test]
    fn centred_abstract_above_two_columns() {
        let mut p = page(&[
            (RegionClass::PlainText, 320.0, 300.0, 560.0, 400.0),
            (RegionClass::PlainText, 110.0, 60.0, 500.0, 150.0),
            (RegionClass::PlainText, 50.0, 180.0, 300.0, 280.0),
            (RegionClass::PlainText, 320.0, 180.0, 560.0, 280.0),
            (RegionClass::PlainText, 50.0, 300.0, 300.0, 400.0),
        ]);
        let strategy = order_page(&mut p, &OrderOptions::default());
        assert_eq!(strategy, OrderStrategy::TwoColumn { split: 310.0 });
        assert_eq!(order_of(&p), vec![1, 2, 4, 3, 0]);
    }

    #[test]
    fn wide_block_between_two_column_bands() {
        let mut p = page(&[
            (RegionClass::PlainText, 50.0, 60.0, 300.0, 200.0),
            (RegionClass::PlainText, 320.0, 60.0, 560.0, 200.0),
            (RegionClass::PlainText, 100.0, 220.0, 480.0, 300.0),
            (RegionClass::PlainText, 320.0, 320.0, 560.0, 450.0),
            (RegionClass::PlainText, 50.0, 320.0, 300.0, 450.0),
        ]);
        let strategy = order_page(&mut p, &OrderOptions::default());
        assert!(matches!(strategy, OrderStrategy::TwoColumn { .. }));
        assert_eq!(order_of(&p), vec![0, 1, 2, 4, 3]);
    }

    #[test]
    fn single_narrow_block_keeps_single_column() {
        let regions = page(&[
            (RegionClass::PlainText, 72.0, 100.0, 540.0, 400.0),
            (RegionClass::PlainText, 250.0, 760.0, 360.0, 780.0),
        ])
        .regions;
        assert_eq!(
            detect_column_layout(&regions, W, &OrderOptions::default()),
            ColumnLayout::Single
        );
    }

    #[test]
    fn figures_follow_the_column_they_sit_in() {
        let mut p = page(&[
            (RegionClass::PlainText, 10.0, 60.0, 300.0, 200.0),
            (RegionClass::PlainText, 320.0, 60.0, 600.0, 200.0),
            (RegionClass::Figure, 20.0, 210.0, 290.0, 300.0),
            (RegionClass::FigureCaption, 20.0, 305.0, 290.0, 320.0),
        ]);
        order_page(&mut p, &OrderOptions::default());
        assert_eq!(order_of(&p), vec![0, 2, 3, 1]);
    }

    #[test]
    fn too_few_text_regions_fall_back() {
        let mut p = page(&[
            (RegionClass::Figure, 320.0, 50.0, 600.0, 200.0),
            (RegionClass::PlainText, 10.0, 100.0, 300.0, 200.0),
            (RegionClass::Table, 10.0, 40.0, 300.0, 90.0),
        ]);
        let strategy = order_page(&mut p, &OrderOptions::default());
        assert!(strategy.is_fallback());
        assert_eq!(order_of(&p), vec![2, 0, 1]);
    }

    #[test]
    fn three_columns_fall_back() {
        let mut p = page(&[
            (RegionClass::PlainText, 10.0, 100.0, 190.0, 200.0),
            (RegionClass::PlainText, 210.0, 50.0, 390.0, 200.0),
            (RegionClass::PlainText, 410.0, 80.0, 600.0, 200.0),
        ]);
        let strategy = order_page(&mut p, &OrderOptions::default());
        assert_eq!(strategy, OrderStrategy::Fallback);
        assert_eq!(order_of(&p), vec![1, 2, 0]);
    }

    #[test]
    fn abandon_does_not_form_a_column() {
        let regions = page(&[
            (RegionClass::PlainText, 72.0, 100.0, 400.0, 200.0),
            (RegionClass::PlainText, 72.0, 220.0, 400.0, 300.0),
            (RegionClass::Abandon, 500.0, 10.0, 600.0, 20.0),
        ])
        .regions;
        assert_eq!(
            detect_column_layout(&regions, W, &OrderOptions::default()),
            ColumnLayout::Single
        );
    }

    #[test]
    fn order_indices_are_contiguous() {
        let mut p = page(&[
            (RegionClass::PlainText, 10.0, 400.0, 300.0, 500.0),
            (RegionClass::PlainText, 320.0, 100.0, 600.0, 200.0),
            (RegionClass::Abandon, 10.0, 760.0, 600.0, 780.0),
            (RegionClass::Figure, 320.0, 300.0, 600.0, 380.0),
            (RegionClass::PlainText, 10.0, 100.0, 300.0, 380.0),
        ]);
        order_page(&mut p, &OrderOptions::default());
        let mut indices: Vec<usize> = p.regions.iter().filter_map(|r| r.order_index()).collect();
        indices.sort();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn empty_page_is_inconclusive() {
        let mut p = Page::new(0, W, H);
        assert!(order_page(&mut p, &OrderOptions::default()).is_fallback());
    }
}
