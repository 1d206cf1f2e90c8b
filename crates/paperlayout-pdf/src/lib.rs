//! PDF access for paperlayout, built on [`lopdf`].
//!
//! Provides what the layout engine needs from a PDF file:
//!
//! - [`PdfSource`]: parsing, page sizes and text spans with positions
//! - [`PdfEditor`]: text redaction, region outlines and labels
//! - `raster` (feature `pdfium`): page rendering to bitmaps
//!
//! Coordinates exchanged with the rest of the workspace are in PDF points
//! with the origin at the top-left corner of the page's media box.

mod editor;
pub mod error;
mod fonts;
mod interpreter;
mod page;
#[cfg(feature = "pdfium")]
pub mod raster;
mod source;

pub use editor::PdfEditor;
pub use error::BackendError;
pub use page::PageGeometry;
pub use source::PdfSource;
