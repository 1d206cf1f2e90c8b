//! paperlayout-core: Backend-independent region model and layout algorithms.
//!
//! This crate turns per-page detector output into an ordered, deduplicated,
//! classified document structure and renders that structure as text. It
//! performs no I/O and does not log; non-fatal conditions are reported as
//! [`Diagnostic`] values.
//!
//! Stages, in pipeline order:
//!
//! - [`dedupe_regions`]: merge overlapping same-class detections
//! - [`order_page`] / [`Document::assign_global_order`]: reading order
//! - [`associate_captions`]: link figures/tables/formulas to captions
//! - [`classify_relevance`]: content vs. running headers/footers
//! - [`render_transcript`] / [`render_markdown`] / [`extract_section`]

pub mod association;
pub mod dedupe;
pub mod document;
pub mod error;
pub mod geometry;
pub mod markdown;
pub mod order;
pub mod region;
pub mod relevance;
pub mod sections;
pub mod text;

pub use association::{AssociationOptions, associate_captions};
pub use dedupe::{DedupeOptions, dedupe_regions};
pub use document::{Document, Page};
pub use error::{Artifact, Diagnostic, DiagnosticCode, LayoutError};
pub use geometry::{BBox, Rgb};
pub use markdown::{
    MarkdownImage, MarkdownOptions, RenderedMarkdown, caption_slug, render_markdown,
    render_transcript, table_text_to_gfm, visual_file_names,
};
pub use order::{ColumnLayout, OrderOptions, OrderStrategy, detect_column_layout, order_page};
pub use region::{ImagePayload, Payload, Region, RegionClass, RegionId, Relevance};
pub use relevance::{RelevanceOptions, classify_relevance, mask_variable_elements};
pub use sections::{
    SectionKind, extract_section, remove_duplicate_paragraphs, remove_references_section,
};
pub use text::{TextSpan, collapse_whitespace, spans_to_table_text, spans_to_text};
