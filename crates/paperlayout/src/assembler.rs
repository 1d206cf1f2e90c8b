//! The Document Assembler: artifacts from an analyzed document.
//!
//! Each artifact is produced independently and only reads the document.
//! Every result carries the document's diagnostics plus whatever the
//! artifact itself had to work around.

use paperlayout_core::{
    Artifact, BBox, Diagnostic, DiagnosticCode, Document, MarkdownOptions, RegionClass,
    SectionKind, extract_section, remove_duplicate_paragraphs, render_markdown,
    render_transcript, visual_file_names,
};
use tracing::info;

use crate::archive::zip_entries;
use crate::detector::DetectionRecord;
use crate::error::EngineError;
use crate::provider::ContentProvider;

/// Margin, in points, between a region and its annotation outline.
const OUTLINE_PADDING: f64 = 1.0;

/// Markdown text plus the images it links to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkdownBundle {
    pub markdown: String,
    /// `(relative path, PNG bytes)` for every linked image.
    pub images: Vec<(String, Vec<u8>)>,
}

/// Produces artifacts from an analyzed [`Document`] and its source.
pub struct Assembler<'a> {
    document: &'a Document,
    provider: &'a dyn ContentProvider,
    markdown: MarkdownOptions,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl<'a> Assembler<'a> {
    pub fn new(document: &'a Document, provider: &'a dyn ContentProvider) -> Self {
        Self {
            document,
            provider,
            markdown: MarkdownOptions::default(),
        }
    }

    pub fn with_markdown_options(mut self, options: MarkdownOptions) -> Self {
        self.markdown = options;
        self
    }

    fn artifact<T>(&self, value: T, extra: Vec<Diagnostic>) -> Artifact<T> {
        let mut diagnostics = self.document.diagnostics.clone();
        diagnostics.extend(extra);
        Artifact::with_diagnostics(value, diagnostics)
    }

    /// The source with every region outlined in its class color and
    /// labelled `"{n}. {label} ({confidence}%)"`, `n` counting in reading
    /// order within the page.
    pub fn annotated_pdf(&self) -> Result<Artifact<Vec<u8>>, EngineError> {
        let mut editor = self.provider.open_editor()?;
        for page in &self.document.pages {
            for (n, region) in page.ordered().into_iter().enumerate() {
                let outline = region
                    .bbox()
                    .expand(OUTLINE_PADDING)
                    .clamp_to(page.width, page.height);
                let color = region.class().color();
                let label = format!(
                    "{}. {} ({:.0}%)",
                    n + 1,
                    region.class().label(),
                    region.confidence() * 100.0
                );
                editor.draw_box(page.index, &outline, color)?;
                editor.draw_label(page.index, &outline, &label, color)?;
            }
        }
        let bytes = editor.save()?;
        info!(bytes = bytes.len(), "annotated PDF written");
        Ok(self.artifact(bytes, Vec::new()))
    }

    /// The source with every noise region redacted.
    ///
    /// When nothing is noise the source bytes are returned unchanged.
    pub fn cleaned_pdf(&self) -> Result<Artifact<Vec<u8>>, EngineError> {
        let noise: Vec<(usize, BBox)> = self
            .document
            .pages
            .iter()
            .flat_map(|page| page.regions.iter())
            .filter(|region| !region.is_content())
            .map(|region| (region.page_index(), *region.bbox()))
            .collect();
        if noise.is_empty() {
            return Ok(self.artifact(self.provider.source().to_vec(), Vec::new()));
        }

        let mut editor = self.provider.open_editor()?;
        for (page, bbox) in &noise {
            editor.redact(*page, bbox)?;
        }
        let bytes = editor.save()?;
        info!(redacted = noise.len(), bytes = bytes.len(), "cleaned PDF written");
        Ok(self.artifact(bytes, Vec::new()))
    }

    fn visual_archive(&self, stem: &str, class: RegionClass) -> Result<Artifact<Vec<u8>>, EngineError> {
        let mut skipped = Vec::new();
        let mut entries: Vec<(String, &[u8])> = Vec::new();
        for (id, name) in visual_file_names(self.document, stem, class) {
            match self.document.region(id).and_then(|r| r.image()) {
                Some(image) if !image.png.is_empty() => entries.push((name, image.png.as_slice())),
                _ => skipped.push(Diagnostic::for_region(
                    DiagnosticCode::ExtractionFailed,
                    format!("{name} left out of the archive: no image"),
                    id,
                )),
            }
        }
        let bytes = zip_entries(entries.iter().map(|(name, png)| (name.as_str(), *png)))?;
        info!(%class, entries = entries.len(), bytes = bytes.len(), "archive written");
        Ok(self.artifact(bytes, skipped))
    }

    /// Zip of one PNG per content figure.
    pub fn figure_archive(&self, stem: &str) -> Result<Artifact<Vec<u8>>, EngineError> {
        self.visual_archive(stem, RegionClass::Figure)
    }

    /// Zip of one PNG per content table.
    pub fn table_archive(&self, stem: &str) -> Result<Artifact<Vec<u8>>, EngineError> {
        self.visual_archive(stem, RegionClass::Table)
    }

    /// Content text in reading order, one blank line between regions.
    pub fn transcript(&self) -> Artifact<String> {
        self.artifact(render_transcript(self.document), Vec::new())
    }

    /// The transcript as `{"text": ..., "diagnostics": [...]}`.
    pub fn transcript_json(&self) -> Result<Artifact<String>, EngineError> {
        let transcript = self.transcript();
        let json = serde_json::to_string_pretty(&serde_json::json!({
            "text": transcript.value,
            "diagnostics": transcript.diagnostics,
        }))?;
        Ok(Artifact::with_diagnostics(json, transcript.diagnostics))
    }

    /// Markdown for the document plus the images it references.
    pub fn markdown(&self, stem: &str) -> Artifact<MarkdownBundle> {
        let rendered = render_markdown(self.document, stem, &self.markdown);
        let images = rendered
            .images
            .iter()
            .filter_map(|image| {
                let png = &self.document.region(image.region)?.image()?.png;
                Some((image.path.clone(), png.clone()))
            })
            .collect();
        let bundle = MarkdownBundle {
            markdown: rendered.markdown,
            images,
        };
        info!(chars = bundle.markdown.len(), images = bundle.images.len(), "markdown rendered");
        self.artifact(bundle, rendered.diagnostics)
    }

    /// All regions as a detections CSV, `order` being the 1-based reading
    /// position within the page and coordinates pixels at `dpi`.
    pub fn detections_csv(&self, dpi: f64) -> Result<Artifact<String>, EngineError> {
        let to_pixels = |v: f64| round2(v * dpi / 72.0);
        let mut writer = csv::Writer::from_writer(Vec::new());
        for page in &self.document.pages {
            for (k, region) in page.ordered().into_iter().enumerate() {
                let b = region.bbox();
                writer.serialize(DetectionRecord {
                    page_number: page.index + 1,
                    order: Some(k + 1),
                    class_id: region.class().class_id(),
                    confidence: region.confidence(),
                    x0: to_pixels(b.x0),
                    y0: to_pixels(b.top),
                    x1: to_pixels(b.x1),
                    y1: to_pixels(b.bottom),
                })?;
            }
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| EngineError::Artifact(format!("failed to flush CSV: {e}")))?;
        let csv = String::from_utf8(bytes)
            .map_err(|e| EngineError::Artifact(format!("CSV is not UTF-8: {e}")))?;
        Ok(self.artifact(csv, Vec::new()))
    }

    /// Requested sections of the transcript, in request order. An empty
    /// request means [`SectionKind::DEFAULT`].
    pub fn sections(&self, kinds: &[SectionKind]) -> Artifact<Vec<(SectionKind, String)>> {
        let text = remove_duplicate_paragraphs(&render_transcript(self.document));
        let kinds = if kinds.is_empty() {
            &SectionKind::DEFAULT[..]
        } else {
            kinds
        };
        let sections = kinds
            .iter()
            .map(|&kind| (kind, extract_section(&text, kind)))
            .collect();
        self.artifact(sections, Vec::new())
    }
}
