//! Error and diagnostic types for paperlayout.
//!
//! Provides [`LayoutError`] for fatal errors that stop processing,
//! [`Diagnostic`] for non-fatal issues that allow best-effort continuation,
//! and [`Artifact`] for pairing a produced value with the diagnostics of the
//! document it was produced from.

use std::fmt;

use crate::region::RegionId;

/// Fatal and per-item error types.
///
/// `InvalidRegion` and `ExtractionFailed` are raised by individual operations
/// and downgraded to [`Diagnostic`]s by the pipeline; `UnparseablePdf` aborts
/// a request before any stage runs.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutError {
    /// Malformed detector output (degenerate box, confidence out of range,
    /// unknown class label).
    InvalidRegion {
        /// What was wrong with the detection.
        reason: String,
    },
    /// The source PDF cannot be opened or rendered at all.
    UnparseablePdf(String),
    /// The content collaborator could not read a region's content.
    ExtractionFailed {
        /// Page the region lives on (0-indexed).
        page: usize,
        /// Collaborator failure description.
        reason: String,
    },
    /// I/O error while producing an artifact.
    Io(String),
    /// Any other error not covered by specific variants.
    Other(String),
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutError::InvalidRegion { reason } => write!(f, "invalid region: {reason}"),
            LayoutError::UnparseablePdf(msg) => write!(f, "unparseable PDF: {msg}"),
            LayoutError::ExtractionFailed { page, reason } => {
                write!(f, "extraction failed on page {page}: {reason}")
            }
            LayoutError::Io(msg) => write!(f, "I/O error: {msg}"),
            LayoutError::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for LayoutError {}

impl From<std::io::Error> for LayoutError {
    fn from(err: std::io::Error) -> Self {
        LayoutError::Io(err.to_string())
    }
}

/// Machine-readable code for categorizing non-fatal conditions.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "type", content = "detail")
)]
pub enum DiagnosticCode {
    /// A detection was dropped because it could not form a valid region.
    InvalidRegion,
    /// A region kept an empty payload because its content could not be read.
    ExtractionFailed,
    /// Column detection was inconclusive; the page was ordered top-to-bottom.
    OrderingFallback,
    /// A table could not be rendered as markdown and was embedded as an image.
    TableMarkdownFallback,
    /// The detector failed on a page; the page has no regions.
    DetectionFailed,
    /// Any other condition not covered by specific variants.
    Other(String),
}

impl DiagnosticCode {
    /// Returns the string tag for this code.
    pub fn as_str(&self) -> &str {
        match self {
            DiagnosticCode::InvalidRegion => "INVALID_REGION",
            DiagnosticCode::ExtractionFailed => "EXTRACTION_FAILED",
            DiagnosticCode::OrderingFallback => "ORDERING_FALLBACK",
            DiagnosticCode::TableMarkdownFallback => "TABLE_MARKDOWN_FALLBACK",
            DiagnosticCode::DetectionFailed => "DETECTION_FAILED",
            DiagnosticCode::Other(_) => "OTHER",
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A non-fatal condition recorded while processing a document.
///
/// Diagnostics travel with the document and are returned alongside every
/// artifact so callers can surface partial-quality warnings.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Diagnostic {
    /// Machine-readable code.
    pub code: DiagnosticCode,
    /// Human-readable description.
    pub description: String,
    /// Page the condition occurred on (0-indexed), if applicable.
    pub page: Option<usize>,
    /// Region the condition concerns, if applicable.
    pub region: Option<RegionId>,
}

impl Diagnostic {
    /// Create a diagnostic with a code and description.
    pub fn new(code: DiagnosticCode, description: impl Into<String>) -> Self {
        Self {
            code,
            description: description.into(),
            page: None,
            region: None,
        }
    }

    /// Create a diagnostic with page context.
    pub fn on_page(code: DiagnosticCode, description: impl Into<String>, page: usize) -> Self {
        Self {
            page: Some(page),
            ..Self::new(code, description)
        }
    }

    /// Create a diagnostic attached to a region (page taken from the id).
    pub fn for_region(code: DiagnosticCode, description: impl Into<String>, id: RegionId) -> Self {
        Self {
            page: Some(id.page),
            region: Some(id),
            ..Self::new(code, description)
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.description)?;
        if let Some(page) = self.page {
            write!(f, " (page {})", page + 1)?;
        }
        if let Some(id) = self.region {
            write!(f, " [region {id}]")?;
        }
        Ok(())
    }
}

/// A produced artifact paired with the document's diagnostics.
#[derive(Debug, Clone)]
pub struct Artifact<T> {
    /// The produced value.
    pub value: T,
    /// Non-fatal conditions collected while producing the value.
    pub diagnostics: Vec<Diagnostic>,
}

impl<T> Artifact<T> {
    /// Create an artifact with diagnostics.
    pub fn with_diagnostics(value: T, diagnostics: Vec<Diagnostic>) -> Self {
        Self { value, diagnostics }
    }

    /// Returns true if there are no diagnostics.
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Transform the value while preserving diagnostics.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Artifact<U> {
        Artifact {
            value: f(self.value),
            diagnostics: self.diagnostics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_error_display() {
        let err = LayoutError::InvalidRegion {
            reason: "zero area".to_string(),
        };
        assert_eq!(err.to_string(), "invalid region: zero area");
        let err = LayoutError::UnparseablePdf("bad xref".to_string());
        assert_eq!(err.to_string(), "unparseable PDF: bad xref");
        let err = LayoutError::ExtractionFailed {
            page: 3,
            reason: "corrupt stream".to_string(),
        };
        assert_eq!(err.to_string(), "extraction failed on page 3: corrupt stream");
    }

    #[test]
    fn layout_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: LayoutError = io.into();
        assert!(matches!(err, LayoutError::Io(_)));
    }

    #[test]
    fn layout_error_implements_std_error() {
        let err: Box<dyn std::error::Error> = Box::new(LayoutError::Other("boom".to_string()));
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn diagnostic_display_with_region() {
        let id = RegionId { page: 1, seq: 4 };
        let d = Diagnostic::for_region(DiagnosticCode::ExtractionFailed, "no text layer", id);
        assert_eq!(
            d.to_string(),
            "[EXTRACTION_FAILED] no text layer (page 2) [region p1#4]"
        );
    }

    #[test]
    fn diagnostic_code_tags() {
        assert_eq!(DiagnosticCode::OrderingFallback.as_str(), "ORDERING_FALLBACK");
        assert_eq!(DiagnosticCode::Other("x".into()).as_str(), "OTHER");
    }

    #[test]
    fn artifact_map_keeps_diagnostics() {
        let a = Artifact::with_diagnostics(
            2,
            vec![Diagnostic::new(DiagnosticCode::InvalidRegion, "dropped")],
        );
        let b = a.map(|v| v * 10);
        assert_eq!(b.value, 20);
        assert_eq!(b.diagnostics.len(), 1);
        assert!(!b.is_clean());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn diagnostic_serializes_with_tagged_code() {
        let d = Diagnostic::on_page(DiagnosticCode::OrderingFallback, "irregular", 0);
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["code"]["type"], "OrderingFallback");
        assert_eq!(json["page"], 0);
    }
}
