//! The region model: one detected document element.
//!
//! A [`Region`] is created from a detector proposal and progressively
//! enriched by later stages (reading order, relevance, extracted payload,
//! caption links). Construction validates the box and confidence; the
//! enrichment fields start unset.

use std::fmt;

use crate::error::LayoutError;
use crate::geometry::{BBox, Rgb};

/// Class label of a detected element.
///
/// Variants mirror the DocStructBench label set the detector is trained on,
/// including `Abandon` for page furniture the detector itself flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RegionClass {
    Title,
    PlainText,
    Abandon,
    Figure,
    FigureCaption,
    Table,
    TableCaption,
    TableFootnote,
    Formula,
    FormulaCaption,
}

impl RegionClass {
    /// Every class, in detector class-id order.
    pub const ALL: [RegionClass; 10] = [
        RegionClass::Title,
        RegionClass::PlainText,
        RegionClass::Abandon,
        RegionClass::Figure,
        RegionClass::FigureCaption,
        RegionClass::Table,
        RegionClass::TableCaption,
        RegionClass::TableFootnote,
        RegionClass::Formula,
        RegionClass::FormulaCaption,
    ];

    /// Map a detector class id (0-9) to a class.
    pub fn from_class_id(id: u32) -> Option<Self> {
        Self::ALL.get(id as usize).copied()
    }

    /// The detector class id of this class.
    pub fn class_id(self) -> u32 {
        match self {
            RegionClass::Title => 0,
            RegionClass::PlainText => 1,
            RegionClass::Abandon => 2,
            RegionClass::Figure => 3,
            RegionClass::FigureCaption => 4,
            RegionClass::Table => 5,
            RegionClass::TableCaption => 6,
            RegionClass::TableFootnote => 7,
            RegionClass::Formula => 8,
            RegionClass::FormulaCaption => 9,
        }
    }

    /// The detector's label for this class.
    pub fn label(self) -> &'static str {
        match self {
            RegionClass::Title => "title",
            RegionClass::PlainText => "plain text",
            RegionClass::Abandon => "abandon",
            RegionClass::Figure => "figure",
            RegionClass::FigureCaption => "figure_caption",
            RegionClass::Table => "table",
            RegionClass::TableCaption => "table_caption",
            RegionClass::TableFootnote => "table_footnote",
            RegionClass::Formula => "isolate_formula",
            RegionClass::FormulaCaption => "formula_caption",
        }
    }

    /// Parse a detector label. Accepts the canonical labels plus
    /// underscore/space variants and the short name `formula`.
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized = label.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "title" => Some(RegionClass::Title),
            "plain_text" | "text" => Some(RegionClass::PlainText),
            "abandon" => Some(RegionClass::Abandon),
            "figure" => Some(RegionClass::Figure),
            "figure_caption" => Some(RegionClass::FigureCaption),
            "table" => Some(RegionClass::Table),
            "table_caption" => Some(RegionClass::TableCaption),
            "table_footnote" => Some(RegionClass::TableFootnote),
            "isolate_formula" | "formula" => Some(RegionClass::Formula),
            "formula_caption" => Some(RegionClass::FormulaCaption),
            _ => None,
        }
    }

    /// Annotation color for this class.
    pub fn color(self) -> Rgb {
        match self {
            RegionClass::Title => Rgb(1.0, 0.0, 0.0),
            RegionClass::PlainText => Rgb(0.0, 0.5, 0.0),
            RegionClass::Abandon => Rgb(0.5, 0.5, 0.5),
            RegionClass::Figure => Rgb(0.0, 0.0, 1.0),
            RegionClass::FigureCaption => Rgb(1.0, 0.5, 0.0),
            RegionClass::Table => Rgb(0.5, 0.0, 0.5),
            RegionClass::TableCaption => Rgb(0.0, 0.5, 0.5),
            RegionClass::TableFootnote => Rgb(1.0, 0.0, 1.0),
            RegionClass::Formula => Rgb(0.7, 0.3, 0.0),
            RegionClass::FormulaCaption => Rgb(0.0, 0.7, 0.7),
        }
    }

    /// Classes whose payload is text.
    pub fn is_textual(self) -> bool {
        !matches!(
            self,
            RegionClass::Figure | RegionClass::Table | RegionClass::Abandon
        )
    }

    /// Classes whose payload is a pixel crop.
    pub fn is_visual(self) -> bool {
        matches!(self, RegionClass::Figure | RegionClass::Table)
    }

    /// Caption-like classes a parent of this class may link to.
    pub fn attachment_classes(self) -> &'static [RegionClass] {
        match self {
            RegionClass::Figure => &[RegionClass::FigureCaption],
            RegionClass::Table => &[RegionClass::TableCaption, RegionClass::TableFootnote],
            RegionClass::Formula => &[RegionClass::FormulaCaption],
            _ => &[],
        }
    }

    /// Whether this class is a caption or footnote attached to a parent.
    pub fn is_attachment(self) -> bool {
        matches!(
            self,
            RegionClass::FigureCaption
                | RegionClass::TableCaption
                | RegionClass::TableFootnote
                | RegionClass::FormulaCaption
        )
    }
}

impl fmt::Display for RegionClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Stable identifier of a region: its page plus its detection sequence
/// number on that page. Survives deduplication and ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RegionId {
    pub page: usize,
    pub seq: usize,
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}#{}", self.page, self.seq)
    }
}

/// Relevance of a region to the document body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Relevance {
    Content,
    Noise,
}

/// A cropped image of a region, PNG encoded.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ImagePayload {
    /// PNG bytes.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Page the crop was taken from (0-indexed), used for naming.
    pub page_index: usize,
    /// Text found under the crop, one line per row with cells separated by
    /// tabs. Only filled for tables.
    pub text_layer: Option<String>,
}

/// Extracted content of a region.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Payload {
    Text(String),
    Image(ImagePayload),
    Empty,
}

/// One detected document element.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Region {
    id: RegionId,
    bbox: BBox,
    class: RegionClass,
    confidence: f64,
    order_index: Option<usize>,
    relevance: Option<Relevance>,
    payload: Option<Payload>,
    extraction_failed: bool,
    associated_caption: Option<RegionId>,
    associated_footnote: Option<RegionId>,
    associated_parent: Option<RegionId>,
}

impl Region {
    /// Create a region, validating the box and the confidence.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::InvalidRegion`] if the box is degenerate
    /// (zero or negative area, non-finite coordinates) or the confidence is
    /// outside `[0, 1]`.
    pub fn new(
        id: RegionId,
        bbox: BBox,
        class: RegionClass,
        confidence: f64,
    ) -> Result<Self, LayoutError> {
        if !bbox.is_valid() {
            return Err(LayoutError::InvalidRegion {
                reason: format!(
                    "degenerate bbox ({:.2}, {:.2}, {:.2}, {:.2}) for {class}",
                    bbox.x0, bbox.top, bbox.x1, bbox.bottom
                ),
            });
        }
        if !(0.0..=1.0).contains(&confidence) {
            return Err(LayoutError::InvalidRegion {
                reason: format!("confidence {confidence} outside [0, 1] for {class}"),
            });
        }
        Ok(Self {
            id,
            bbox,
            class,
            confidence,
            order_index: None,
            relevance: None,
            payload: None,
            extraction_failed: false,
            associated_caption: None,
            associated_footnote: None,
            associated_parent: None,
        })
    }

    pub fn id(&self) -> RegionId {
        self.id
    }

    /// Zero-based page number.
    pub fn page_index(&self) -> usize {
        self.id.page
    }

    pub fn bbox(&self) -> &BBox {
        &self.bbox
    }

    pub fn class(&self) -> RegionClass {
        self.class
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Reading-order position; `None` until ordering has run.
    pub fn order_index(&self) -> Option<usize> {
        self.order_index
    }

    /// Relevance; `None` until classification has run.
    pub fn relevance(&self) -> Option<Relevance> {
        self.relevance
    }

    /// Extracted content; `None` until extraction has run.
    pub fn payload(&self) -> Option<&Payload> {
        self.payload.as_ref()
    }

    /// Text payload, if this region holds one.
    pub fn text(&self) -> Option<&str> {
        match &self.payload {
            Some(Payload::Text(text)) => Some(text),
            _ => None,
        }
    }

    /// Image payload, if this region holds one.
    pub fn image(&self) -> Option<&ImagePayload> {
        match &self.payload {
            Some(Payload::Image(image)) => Some(image),
            _ => None,
        }
    }

    /// Whether the content collaborator failed to read this region.
    pub fn extraction_failed(&self) -> bool {
        self.extraction_failed
    }

    /// Linked caption (FigureCaption / TableCaption / FormulaCaption) of a parent.
    pub fn associated_caption(&self) -> Option<RegionId> {
        self.associated_caption
    }

    /// Linked TableFootnote of a table.
    pub fn associated_footnote(&self) -> Option<RegionId> {
        self.associated_footnote
    }

    /// Linked parent of a caption or footnote.
    pub fn associated_parent(&self) -> Option<RegionId> {
        self.associated_parent
    }

    /// Whether this region counts as document content (unclassified regions do).
    pub fn is_content(&self) -> bool {
        self.relevance != Some(Relevance::Noise)
    }

    pub(crate) fn absorb(&mut self, other: &Region) {
        self.bbox = self.bbox.union(&other.bbox);
        self.confidence = self.confidence.max(other.confidence);
    }

    pub(crate) fn set_order_index(&mut self, index: usize) {
        self.order_index = Some(index);
    }

    pub(crate) fn set_relevance(&mut self, relevance: Relevance) {
        self.relevance = Some(relevance);
    }

    /// Store an extracted payload.
    pub fn set_payload(&mut self, payload: Payload) {
        self.payload = Some(payload);
    }

    /// Record a failed extraction: empty payload plus the failure flag.
    pub fn mark_extraction_failed(&mut self) {
        self.payload = Some(Payload::Empty);
        self.extraction_failed = true;
    }

    /// Record a partly failed extraction, keeping the payload already stored.
    pub fn flag_extraction_failed(&mut self) {
        self.extraction_failed = true;
    }

    pub(crate) fn clear_links(&mut self) {
        self.associated_caption = None;
        self.associated_footnote = None;
        self.associated_parent = None;
    }

    pub(crate) fn link_attachment(&mut self, class: RegionClass, id: RegionId) {
        if class == RegionClass::TableFootnote {
            self.associated_footnote = Some(id);
        } else {
            self.associated_caption = Some(id);
        }
    }

    pub(crate) fn link_parent(&mut self, id: RegionId) {
        self.associated_parent = Some(id);
    }
}
