//! Engine error type.
//!
//! Only conditions that stop an operation are errors. Everything the
//! pipeline can work around is recorded as a
//! [`Diagnostic`](paperlayout_core::Diagnostic) instead.

use paperlayout_core::LayoutError;
use paperlayout_pdf::BackendError;
use thiserror::Error;

/// Error returned by the engine and its collaborators.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The source PDF cannot be opened. Raised before any pipeline stage.
    #[error("unparseable PDF: {0}")]
    UnparseablePdf(String),

    /// The detector failed on a page.
    #[error("detection failed on page {}: {reason}", .page + 1)]
    Detection { page: usize, reason: String },

    /// An artifact could not be assembled.
    #[error("artifact error: {0}")]
    Artifact(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] LayoutError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    /// Classify an error raised while opening the source.
    ///
    /// Parse and encryption failures become [`EngineError::UnparseablePdf`];
    /// anything else is passed through.
    pub(crate) fn on_open(err: BackendError) -> Self {
        match err {
            BackendError::Parse(msg) => EngineError::UnparseablePdf(msg),
            BackendError::Encrypted => EngineError::UnparseablePdf(err.to_string()),
            other => EngineError::Backend(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detection_error_uses_one_based_page() {
        let err = EngineError::Detection {
            page: 0,
            reason: "model timeout".to_string(),
        };
        assert_eq!(err.to_string(), "detection failed on page 1: model timeout");
    }

    #[test]
    fn open_errors_become_unparseable() {
        let err = EngineError::on_open(BackendError::Parse("bad xref".to_string()));
        assert!(matches!(err, EngineError::UnparseablePdf(ref m) if m == "bad xref"));
        let err = EngineError::on_open(BackendError::Encrypted);
        assert!(matches!(err, EngineError::UnparseablePdf(_)));
        let err = EngineError::on_open(BackendError::Write("x".to_string()));
        assert!(matches!(err, EngineError::Backend(_)));
    }

    #[test]
    fn core_errors_are_transparent() {
        let err: EngineError = LayoutError::InvalidRegion {
            reason: "zero area".to_string(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            LayoutError::InvalidRegion {
                reason: "zero area".to_string()
            }
            .to_string()
        );
    }
}
