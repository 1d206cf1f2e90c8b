//! Content vs. noise classification.
//!
//! Running headers and footers are found by cross-page analysis: a region
//! inside the top or bottom margin band is noise when its masked text recurs
//! on other pages at about the same relative height. Regions the detector
//! itself labelled `abandon` are always noise.

use std::collections::{HashMap, HashSet};

use unicode_normalization::UnicodeNormalization;

use crate::document::Document;
use crate::region::{RegionClass, RegionId, Relevance};

/// Configuration for header/footer detection.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RelevanceOptions {
    /// Fraction of page height scanned for headers (from top). Default: 0.08.
    pub header_margin: f64,
    /// Fraction of page height scanned for footers (from bottom). Default: 0.08.
    pub footer_margin: f64,
    /// Minimum number of distinct pages a text must recur on. Default: 2.
    pub min_pages: usize,
    /// Maximum difference in relative vertical position (fraction of page
    /// height) for two occurrences to count as the same slot. Default: 0.02.
    pub position_tolerance: f64,
}

impl Default for RelevanceOptions {
    fn default() -> Self {
        Self {
            header_margin: 0.08,
            footer_margin: 0.08,
            min_pages: 2,
            position_tolerance: 0.02,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Margin {
    Header,
    Footer,
}

/// Normalize margin text for fuzzy comparison.
///
/// Applies NFKC, lowercases, replaces each run of digits with `#` and drops
/// whitespace, so "Page 3 of 12" and "page 4 of 12" compare equal.
pub fn mask_variable_elements(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut in_digit_run = false;

    for ch in text.nfkc().flat_map(char::to_lowercase) {
        if ch.is_numeric() {
            if !in_digit_run {
                result.push('#');
                in_digit_run = true;
            }
        } else {
            in_digit_run = false;
            if !ch.is_whitespace() {
                result.push(ch);
            }
        }
    }

    result
}

struct Candidate {
    id: RegionId,
    page: usize,
    position: f64,
}

/// Assign `relevance` to every region of the document.
///
/// Returns the number of regions classified as noise.
pub fn classify_relevance(document: &mut Document, options: &RelevanceOptions) -> usize {
    let mut groups: HashMap<(Margin, String), Vec<Candidate>> = HashMap::new();

    for page in &document.pages {
        if page.height <= 0.0 {
            continue;
        }
        for region in &page.regions {
            if region.class() == RegionClass::Abandon {
                continue;
            }
            let position = region.bbox().center_y() / page.height;
            let margin = if position < options.header_margin {
                Margin::Header
            } else if position > 1.0 - options.footer_margin {
                Margin::Footer
            } else {
                continue;
            };
            let key = region.text().map(mask_variable_elements).unwrap_or_default();
            if key.is_empty() {
                continue;
            }
            groups.entry((margin, key)).or_default().push(Candidate {
                id: region.id(),
                page: page.index,
                position,
            });
        }
    }

    let mut noise: HashSet<RegionId> = HashSet::new();
    for candidates in groups.values() {
        for candidate in candidates {
            let pages: HashSet<usize> = candidates
                .iter()
                .filter(|other| (other.position - candidate.position).abs() <= options.position_tolerance)
                .map(|other| other.page)
                .collect();
            if pages.len() >= options.min_pages {
                noise.insert(candidate.id);
            }
        }
    }

    let mut count = 0;
    for page in &mut document.pages {
        for region in &mut page.regions {
            let relevance = if region.class() == RegionClass::Abandon || noise.contains(&region.id())
            {
                count += 1;
                Relevance::Noise
            } else {
                Relevance::Content
            };
            region.set_relevance(relevance);
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Page;
    use crate::geometry::BBox;
    use crate::region::{Payload, Region};

    const H: f64 = 792.0;

    fn text_region(page: usize, seq: usize, top: f64, text: &str) -> Region {
        let mut r = Region::new(
            RegionId { page, seq },
            BBox::new(72.0, top, 540.0, top + 12.0),
            RegionClass::PlainText,
            0.9,
        )
        .unwrap();
        r.set_payload(Payload::Text(text.to_string()));
        r
    }

    fn doc(pages: Vec<Vec<Region>>) -> Document {
        Document::new(
            pages
                .into_iter()
                .enumerate()
                .map(|(i, regions)| {
                    let mut p = Page::new(i, 612.0, H);
                    p.regions = regions;
                    p
                })
                .collect(),
        )
    }

    #[test]
    fn mask_digits_case_and_whitespace() {
        assert_eq!(mask_variable_elements("Page 3 of 12"), "page#of#");
        assert_eq!(
            mask_variable_elements("Journal  of X, 2023"),
            mask_variable_elements("journal of x, 2024")
        );
        assert_eq!(mask_variable_elements("ﬁgure"), "figure");
    }

    #[test]
    fn recurring_footer_is_noise() {
        let pages = (0..5)
            .map(|p| {
                vec![
                    text_region(p, 0, 300.0, &format!("Body text of page {p} differs")),
                    text_region(p, 1, 760.0, &format!("Preprint – page {}", p + 1)),
                ]
            })
            .collect();
        let mut d = doc(pages);
        let noise = classify_relevance(&mut d, &RelevanceOptions::default());
        assert_eq!(noise, 5);
        for page in &d.pages {
            assert_eq!(page.regions[0].relevance(), Some(Relevance::Content));
            assert_eq!(page.regions[1].relevance(), Some(Relevance::Noise));
        }
    }

    #[test]
    fn single_margin_occurrence_is_content() {
        let mut d = doc(vec![
            vec![text_region(0, 0, 760.0, "Corresponding author: a@b.org")],
            vec![text_region(1, 0, 300.0, "Corresponding author: a@b.org")],
            vec![],
        ]);
        classify_relevance(&mut d, &RelevanceOptions::default());
        assert_eq!(d.pages[0].regions[0].relevance(), Some(Relevance::Content));
        assert_eq!(d.pages[1].regions[0].relevance(), Some(Relevance::Content));
    }

    #[test]
    fn recurrence_at_different_height_is_content() {
        let mut d = doc(vec![
            vec![text_region(0, 0, 5.0, "Running head")],
            vec![text_region(1, 0, 40.0, "Running head")],
        ]);
        classify_relevance(&mut d, &RelevanceOptions::default());
        assert!(d.pages.iter().all(|p| p.regions[0].relevance() == Some(Relevance::Content)));
    }

    #[test]
    fn abandon_is_always_noise() {
        let abandon = Region::new(
            RegionId { page: 0, seq: 0 },
            BBox::new(100.0, 400.0, 200.0, 420.0),
            RegionClass::Abandon,
            0.8,
        )
        .unwrap();
        let mut d = doc(vec![vec![abandon]]);
        assert_eq!(classify_relevance(&mut d, &RelevanceOptions::default()), 1);
        assert_eq!(d.pages[0].regions[0].relevance(), Some(Relevance::Noise));
    }

    #[test]
    fn margin_region_without_text_is_content() {
        let figure = Region::new(
            RegionId { page: 0, seq: 0 },
            BBox::new(100.0, 770.0, 200.0, 790.0),
            RegionClass::Figure,
            0.8,
        )
        .unwrap();
        let mut d = doc(vec![vec![figure]]);
        classify_relevance(&mut d, &RelevanceOptions::default());
        assert_eq!(d.pages[0].regions[0].relevance(), Some(Relevance::Content));
    }
}
