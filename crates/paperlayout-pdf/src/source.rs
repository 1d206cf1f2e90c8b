//! Loaded PDF documents and their text spans.

use lopdf::{Document, ObjectId};
use paperlayout_core::TextSpan;
use tracing::debug;

use crate::editor::PdfEditor;
use crate::error::BackendError;
use crate::interpreter::{ShowEvent, show_events};
use crate::page::{PageGeometry, page_geometry, page_operations, page_resources};

/// A parsed, unencrypted PDF with at least one page.
#[derive(Debug, Clone)]
pub struct PdfSource {
    inner: Document,
    page_ids: Vec<ObjectId>,
}

impl PdfSource {
    /// Parse a PDF from bytes.
    ///
    /// # Errors
    ///
    /// [`BackendError::Parse`] when the bytes are not a PDF or the document
    /// has no pages, [`BackendError::Encrypted`] for encrypted documents.
    pub fn open(bytes: &[u8]) -> Result<Self, BackendError> {
        let inner = Document::load_mem(bytes)
            .map_err(|e| BackendError::Parse(format!("failed to parse PDF: {e}")))?;
        if inner.is_encrypted() {
            return Err(BackendError::Encrypted);
        }
        // get_pages is keyed by 1-based page number
        let page_ids: Vec<ObjectId> = inner.get_pages().values().copied().collect();
        if page_ids.is_empty() {
            return Err(BackendError::Parse("document has no pages".to_string()));
        }
        debug!(pages = page_ids.len(), "opened PDF");
        Ok(Self { inner, page_ids })
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    fn page_id(&self, index: usize) -> Result<ObjectId, BackendError> {
        self.page_ids
            .get(index)
            .copied()
            .ok_or(BackendError::PageOutOfRange {
                index,
                count: self.page_ids.len(),
            })
    }

    /// Media box of the page at `index` (0-based).
    pub fn page_geometry(&self, index: usize) -> Result<PageGeometry, BackendError> {
        page_geometry(&self.inner, self.page_id(index)?)
    }

    /// `(width, height)` of the page in points.
    pub fn page_size(&self, index: usize) -> Result<(f64, f64), BackendError> {
        let g = self.page_geometry(index)?;
        Ok((g.width(), g.height()))
    }

    pub(crate) fn show_events(
        &self,
        index: usize,
    ) -> Result<(Vec<lopdf::content::Operation>, Vec<ShowEvent>), BackendError> {
        show_events_for(&self.inner, self.page_id(index)?)
    }

    /// Text spans of the page in content-stream order, in top-left page
    /// coordinates. Blank spans are dropped.
    pub fn page_spans(&self, index: usize) -> Result<Vec<TextSpan>, BackendError> {
        let (_, events) = self.show_events(index)?;
        let spans: Vec<TextSpan> = events
            .into_iter()
            .filter(|event| !event.text.trim().is_empty())
            .map(|event| TextSpan::new(event.text, event.bbox))
            .collect();
        debug!(page = index, spans = spans.len(), "extracted text spans");
        Ok(spans)
    }

    /// Start an edit session over a copy of this document.
    pub fn editor(&self) -> PdfEditor {
        PdfEditor::new(self.inner.clone(), self.page_ids.clone())
    }
}

pub(crate) fn show_events_for(
    doc: &Document,
    page_id: ObjectId,
) -> Result<(Vec<lopdf::content::Operation>, Vec<ShowEvent>), BackendError> {
    let geometry = page_geometry(doc, page_id)?;
    let operations = page_operations(doc, page_id)?;
    let resources = page_resources(doc, page_id)?;
    let events = show_events(doc, &operations, resources, &geometry);
    Ok((operations, events))
}
