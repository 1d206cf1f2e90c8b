//! Error types for the PDF access layer.
//!
//! Uses [`thiserror`] for ergonomic error derivation. Provides [`BackendError`]
//! that wraps lopdf/pdfium failures and converts them to [`LayoutError`].

use paperlayout_core::LayoutError;
use thiserror::Error;

/// Error type for PDF reading, editing and rendering.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Error from PDF parsing (structure, syntax, object resolution).
    #[error("PDF parse error: {0}")]
    Parse(String),

    /// The document is encrypted.
    #[error("encrypted PDFs are not supported")]
    Encrypted,

    /// A page index past the end of the document.
    #[error("page index {index} out of range (0..{count})")]
    PageOutOfRange { index: usize, count: usize },

    /// Error writing the edited document.
    #[error("PDF write error: {0}")]
    Write(String),

    /// Page rasterization failed or is unavailable.
    #[error("render error: {0}")]
    Render(String),

    /// Error reading or writing PDF data.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<BackendError> for LayoutError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Parse(msg) => LayoutError::UnparseablePdf(msg),
            BackendError::Encrypted => LayoutError::UnparseablePdf(err.to_string()),
            BackendError::Io(e) => LayoutError::Io(e.to_string()),
            other => LayoutError::Other(other.to_string()),
        }
    }
}

impl From<lopdf::Error> for BackendError {
    fn from(err: lopdf::Error) -> Self {
        BackendError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_error_parse() {
        let err = BackendError::Parse("invalid xref table".to_string());
        assert_eq!(err.to_string(), "PDF parse error: invalid xref table");
    }

    #[test]
    fn parse_error_becomes_unparseable() {
        let layout: LayoutError = BackendError::Parse("bad header".to_string()).into();
        assert_eq!(layout, LayoutError::UnparseablePdf("bad header".to_string()));
        let layout: LayoutError = BackendError::Encrypted.into();
        assert!(matches!(layout, LayoutError::UnparseablePdf(_)));
    }

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: BackendError = io_err.into();
        assert!(matches!(err, BackendError::Io(_)));
        let layout: LayoutError = err.into();
        assert!(matches!(layout, LayoutError::Io(msg) if msg.contains("file missing")));
    }

    #[test]
    fn render_error_is_other() {
        let layout: LayoutError = BackendError::Render("no pdfium".to_string()).into();
        assert_eq!(layout, LayoutError::Other("render error: no pdfium".to_string()));
    }
}
