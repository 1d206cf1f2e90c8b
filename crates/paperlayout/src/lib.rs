//! paperlayout: reconstruct the structure of scientific PDFs from layout
//! detections.
//!
//! Given per-page detections (boxes with class labels and confidences) and
//! the PDF itself, the [`Engine`] merges duplicate detections, infers the
//! reading order of single- and two-column pages, separates running
//! headers/footers from content, links captions to their figures, tables
//! and formulas, extracts each region's text or pixels, and assembles the
//! result into artifacts: annotated and cleaned PDFs, figure/table
//! archives, transcripts, Markdown, section excerpts and detections CSVs.
//!
//! # Architecture
//!
//! - **paperlayout-core**: region model and layout algorithms (no I/O)
//! - **paperlayout-pdf**: PDF reading, text spans, editing, rendering
//! - **paperlayout** (this crate): collaborator traits, pipeline, assembler
//!
//! # Example
//!
//! ```no_run
//! use paperlayout::{CsvDetections, Engine, DEFAULT_CSV_DPI};
//!
//! let detections = CsvDetections::from_path("paper.csv", DEFAULT_CSV_DPI)?;
//! let engine = Engine::new(detections);
//! let pdf = std::fs::read("paper.pdf")?;
//! let transcript = engine.transcript(&pdf)?;
//! for warning in &transcript.diagnostics {
//!     eprintln!("warning: {warning}");
//! }
//! println!("{}", transcript.value);
//! # Ok::<(), paperlayout::EngineError>(())
//! ```

pub use paperlayout_core;
pub use paperlayout_pdf;

mod archive;
mod assembler;
mod detector;
pub mod error;
mod extract;
mod options;
mod pipeline;
mod provider;

pub use assembler::{Assembler, MarkdownBundle};
pub use detector::{CsvDetections, DEFAULT_CSV_DPI, Detection, LayoutDetector, PageView};
pub use error::EngineError;
pub use extract::extract_page;
pub use options::{DetectionFilter, EngineOptions, ExtractOptions};
pub use pipeline::Engine;
pub use provider::{ContentProvider, PageEditor, PdfContent, crop_image, encode_png};

pub use paperlayout_core::{
    Artifact, BBox, Diagnostic, DiagnosticCode, Document, Page, Region, RegionClass, RegionId,
    Relevance, Rgb, SectionKind, TextSpan,
};
