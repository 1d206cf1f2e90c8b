//! Caption and footnote association.
//!
//! Links each Figure, Table and Formula to the nearest unclaimed caption (and
//! for tables, footnote) of the matching kind. Captions split onto the top
//! of the following page are found when the parent's own page has none.

use std::collections::HashSet;

use crate::document::Document;
use crate::geometry::BBox;
use crate::region::{RegionClass, RegionId};

/// Options for caption association.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AssociationOptions {
    /// Maximum edge-to-edge distance between a parent and its caption, as a
    /// fraction of page height. Default: `0.15`.
    pub max_distance_ratio: f64,
}

impl Default for AssociationOptions {
    fn default() -> Self {
        Self {
            max_distance_ratio: 0.15,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    id: RegionId,
    class: RegionClass,
    bbox: BBox,
    order: usize,
}

/// Link parents to captions/footnotes across the whole document.
///
/// Existing links are cleared first, and parents are visited in reading
/// order, so the result depends only on the regions themselves. Returns the
/// number of links created.
pub fn associate_captions(document: &mut Document, options: &AssociationOptions) -> usize {
    for page in &mut document.pages {
        for region in &mut page.regions {
            region.clear_links();
        }
    }

    let pages: Vec<(usize, f64, Vec<Slot>)> = document
        .pages
        .iter()
        .map(|page| {
            let slots = page
                .ordered()
                .into_iter()
                .map(|r| Slot {
                    id: r.id(),
                    class: r.class(),
                    bbox: *r.bbox(),
                    order: r.order_index().unwrap_or(usize::MAX),
                })
                .collect();
            (page.index, page.height, slots)
        })
        .collect();

    let mut taken: HashSet<RegionId> = HashSet::new();
    let mut links: Vec<(RegionId, RegionClass, RegionId)> = Vec::new();

    for (position, (page_index, page_height, slots)) in pages.iter().enumerate() {
        let max_distance = page_height * options.max_distance_ratio;
        let next_page = pages
            .get(position + 1)
            .filter(|(index, _, _)| *index == page_index + 1);

        for parent in slots {
            for &child_class in parent.class.attachment_classes() {
                let nearest = |candidates: &[Slot], distance: &dyn Fn(&BBox) -> f64| {
                    candidates
                        .iter()
                        .filter(|c| c.class == child_class && !taken.contains(&c.id))
                        .map(|c| (distance(&c.bbox), c.order, c.id))
                        .filter(|(d, _, _)| *d <= max_distance)
                        .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)).then(a.2.cmp(&b.2)))
                        .map(|(_, _, id)| id)
                };

                let same_page =
                    nearest(slots.as_slice(), &|bbox: &BBox| parent.bbox.gap_distance(bbox));
                let found = same_page.or_else(|| {
                    next_page.and_then(|(_, _, next_slots)| {
                        nearest(next_slots.as_slice(), &|bbox: &BBox| {
                            (page_height - parent.bbox.bottom).max(0.0) + bbox.top.max(0.0)
                        })
                    })
                });

                if let Some(child) = found {
                    taken.insert(child);
                    links.push((parent.id, child_class, child));
                }
            }
        }
    }

    for &(parent, child_class, child) in &links {
        if let Some(region) = document.region_mut(parent) {
            region.link_attachment(child_class, child);
        }
        if let Some(region) = document.region_mut(child) {
            region.link_parent(parent);
        }
    }
    links.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Page;
    use crate::order::{OrderOptions, order_page};
    use crate::region::Region;

    fn region(page: usize, seq: usize, class: RegionClass, top: f64, bottom: f64) -> Region {
        Region::new(
            RegionId { page, seq },
            BBox::new(72.0, top, 540.0, bottom),
            class,
            0.9,
        )
        .unwrap()
    }

    fn doc(pages: Vec<Vec<Region>>) -> Document {
        let mut d = Document::new(
            pages
                .into_iter()
                .enumerate()
                .map(|(i, regions)| {
                    let mut p = Page::new(i, 612.0, 792.0);
                    p.regions = regions;
                    order_page(&mut p, &OrderOptions::default());
                    p
                })
                .collect(),
        );
        d.assign_global_order();
        d
    }

    fn id(page: usize, seq: usize) -> RegionId {
        RegionId { page, seq }
    }

    #[test]
    fn figure_links_nearest_caption() {
        let mut d = doc(vec![vec![
            region(0, 0, RegionClass::Figure, 100.0, 300.0),
            region(0, 1, RegionClass::FigureCaption, 310.0, 330.0),
            region(0, 2, RegionClass::FigureCaption, 500.0, 520.0),
        ]]);
        assert_eq!(associate_captions(&mut d, &AssociationOptions::default()), 1);
        assert_eq!(d.region(id(0, 0)).unwrap().associated_caption(), Some(id(0, 1)));
        assert_eq!(d.region(id(0, 1)).unwrap().associated_parent(), Some(id(0, 0)));
        assert_eq!(d.region(id(0, 2)).unwrap().associated_parent(), None);
    }

    #[test]
    fn table_links_caption_and_footnote() {
        let mut d = doc(vec![vec![
            region(0, 0, RegionClass::TableCaption, 80.0, 95.0),
            region(0, 1, RegionClass::Table, 100.0, 300.0),
            region(0, 2, RegionClass::TableFootnote, 305.0, 320.0),
        ]]);
        associate_captions(&mut d, &AssociationOptions::default());
        let table = d.region(id(0, 1)).unwrap();
        assert_eq!(table.associated_caption(), Some(id(0, 0)));
        assert_eq!(table.associated_footnote(), Some(id(0, 2)));
    }

    #[test]
    fn caption_is_claimed_once() {
        let mut d = doc(vec![vec![
            region(0, 0, RegionClass::Figure, 100.0, 200.0),
            region(0, 1, RegionClass::FigureCaption, 205.0, 220.0),
            region(0, 2, RegionClass::Figure, 225.0, 300.0),
        ]]);
        associate_captions(&mut d, &AssociationOptions::default());
        assert_eq!(d.region(id(0, 0)).unwrap().associated_caption(), Some(id(0, 1)));
        assert_eq!(d.region(id(0, 2)).unwrap().associated_caption(), None);
    }

    #[test]
    fn caption_on_next_page_is_found() {
        let mut d = doc(vec![
            vec![region(0, 0, RegionClass::Table, 500.0, 780.0)],
            vec![region(1, 0, RegionClass::TableCaption, 20.0, 40.0)],
        ]);
        associate_captions(&mut d, &AssociationOptions::default());
        assert_eq!(d.region(id(0, 0)).unwrap().associated_caption(), Some(id(1, 0)));
    }

    #[test]
    fn distant_caption_is_ignored() {
        let mut d = doc(vec![vec![
            region(0, 0, RegionClass::Figure, 50.0, 100.0),
            region(0, 1, RegionClass::FigureCaption, 600.0, 620.0),
        ]]);
        assert_eq!(associate_captions(&mut d, &AssociationOptions::default()), 0);
    }

    #[test]
    fn association_is_deterministic() {
        let mut d = doc(vec![vec![
            region(0, 0, RegionClass::Figure, 100.0, 200.0),
            region(0, 1, RegionClass::FigureCaption, 205.0, 220.0),
            region(0, 2, RegionClass::Formula, 300.0, 340.0),
            region(0, 3, RegionClass::FormulaCaption, 345.0, 360.0),
        ]]);
        associate_captions(&mut d, &AssociationOptions::default());
        let first = d.clone();
        associate_captions(&mut d, &AssociationOptions::default());
        assert_eq!(first, d);
    }
}
