//! The owning aggregate: pages and their regions.

use crate::error::Diagnostic;
use crate::region::{Region, RegionId};

/// One page with its region collection.
///
/// Region storage order is insertion order and carries no meaning; use
/// [`Page::ordered`] for reading order.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Page {
    /// Page number (0-indexed).
    pub index: usize,
    /// Page width in points.
    pub width: f64,
    /// Page height in points.
    pub height: f64,
    /// Regions detected on this page.
    pub regions: Vec<Region>,
}

impl Page {
    /// Create a page with no regions.
    pub fn new(index: usize, width: f64, height: f64) -> Self {
        Self {
            index,
            width,
            height,
            regions: Vec::new(),
        }
    }

    /// Regions sorted by `order_index`; unordered regions trail in id order.
    pub fn ordered(&self) -> Vec<&Region> {
        let mut regions: Vec<&Region> = self.regions.iter().collect();
        regions.sort_by_key(|r| (r.order_index().unwrap_or(usize::MAX), r.id()));
        regions
    }
}

/// A whole analyzed document.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Document {
    /// Pages in page-index order.
    pub pages: Vec<Page>,
    /// Non-fatal conditions collected while building the document.
    pub diagnostics: Vec<Diagnostic>,
}

impl Document {
    /// Build a document from pages, sorting them by page index.
    pub fn new(mut pages: Vec<Page>) -> Self {
        pages.sort_by_key(|p| p.index);
        Self {
            pages,
            diagnostics: Vec::new(),
        }
    }

    /// Look up a page by its index.
    pub fn page(&self, index: usize) -> Option<&Page> {
        self.pages.iter().find(|p| p.index == index)
    }

    /// Look up a region by id.
    pub fn region(&self, id: RegionId) -> Option<&Region> {
        self.page(id.page)?.regions.iter().find(|r| r.id() == id)
    }

    /// Mutable lookup of a region by id.
    pub fn region_mut(&mut self, id: RegionId) -> Option<&mut Region> {
        self.pages
            .iter_mut()
            .find(|p| p.index == id.page)?
            .regions
            .iter_mut()
            .find(|r| r.id() == id)
    }

    /// All regions in global reading order.
    pub fn ordered_regions(&self) -> Vec<&Region> {
        self.pages.iter().flat_map(|p| p.ordered()).collect()
    }

    /// Total number of regions across all pages.
    pub fn region_count(&self) -> usize {
        self.pages.iter().map(|p| p.regions.len()).sum()
    }

    pub fn push_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Rebase page-local order indices into one document-wide sequence.
    ///
    /// Each page's regions must already carry page-local indices (as set by
    /// [`order_page`](crate::order::order_page)); after this call the indices
    /// of page N+1 all exceed those of page N and the whole sequence is
    /// contiguous from zero.
    pub fn assign_global_order(&mut self) {
        let mut next = 0;
        for page in &mut self.pages {
            let mut ids: Vec<(usize, RegionId)> = page
                .regions
                .iter()
                .map(|r| (r.order_index().unwrap_or(usize::MAX), r.id()))
                .collect();
            ids.sort();
            for (_, id) in ids {
                if let Some(region) = page.regions.iter_mut().find(|r| r.id() == id) {
                    region.set_order_index(next);
                    next += 1;
                }
            }
        }
    }
}
