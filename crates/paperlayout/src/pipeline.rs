//! The engine: detections in, enriched [`Document`] and artifacts out.
//!
//! Pages are processed independently (detection, region validation,
//! deduplication, page ordering, extraction), in parallel with the
//! `parallel` feature. A single sequential pass then stitches the pages
//! into a document: global order, caption association and the cross-page
//! relevance classification.

use paperlayout_core::{
    Artifact, Diagnostic, DiagnosticCode, Document, Page, Region, RegionClass, RegionId,
    SectionKind, associate_captions, classify_relevance, dedupe_regions, order_page,
};
use tracing::{debug, info, warn};

use crate::assembler::{Assembler, MarkdownBundle};
use crate::detector::{LayoutDetector, PageView};
use crate::error::EngineError;
use crate::extract::extract_page;
use crate::options::EngineOptions;
use crate::provider::{ContentProvider, PdfContent};

/// Output of the per-page phase.
struct PageOutcome {
    page: Page,
    diagnostics: Vec<Diagnostic>,
}

/// Layout reconstruction engine over a detector `D`.
#[derive(Debug, Clone)]
pub struct Engine<D> {
    detector: D,
    options: EngineOptions,
}

impl<D: LayoutDetector> Engine<D> {
    /// Create an engine with default options.
    pub fn new(detector: D) -> Self {
        Self::with_options(detector, EngineOptions::default())
    }

    pub fn with_options(detector: D, options: EngineOptions) -> Self {
        Self { detector, options }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }

    /// Open PDF bytes as a content provider.
    ///
    /// # Errors
    ///
    /// [`EngineError::UnparseablePdf`] if the bytes cannot be parsed.
    pub fn open(&self, pdf: &[u8]) -> Result<PdfContent, EngineError> {
        PdfContent::open(pdf.to_vec(), self.options.extract.render_dpi)
    }

    /// Run the whole pipeline over PDF bytes.
    pub fn analyze(&self, pdf: &[u8]) -> Result<Document, EngineError> {
        let content = self.open(pdf)?;
        self.analyze_with(&content)
    }

    /// Run the whole pipeline against any content provider.
    pub fn analyze_with(&self, provider: &dyn ContentProvider) -> Result<Document, EngineError> {
        let outcomes = self.run_pages(provider)?;

        let mut diagnostics = Vec::new();
        let mut pages = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            let outcome = outcome?;
            diagnostics.extend(outcome.diagnostics);
            pages.push(outcome.page);
        }

        let mut document = Document::new(pages);
        document.diagnostics = diagnostics;
        document.assign_global_order();
        let links = associate_captions(&mut document, &self.options.association);
        let noise = classify_relevance(&mut document, &self.options.relevance);
        info!(
            pages = document.pages.len(),
            regions = document.region_count(),
            links,
            noise,
            diagnostics = document.diagnostics.len(),
            "document analyzed"
        );
        Ok(document)
    }

    #[cfg(feature = "parallel")]
    fn run_pages(
        &self,
        provider: &dyn ContentProvider,
    ) -> Result<Vec<Result<PageOutcome, EngineError>>, EngineError> {
        use rayon::prelude::*;

        let work = || {
            (0..provider.page_count())
                .into_par_iter()
                .map(|index| self.process_page(index, provider))
                .collect::<Vec<_>>()
        };
        match self.options.threads {
            Some(threads) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| EngineError::Io(std::io::Error::other(e)))?;
                Ok(pool.install(work))
            }
            None => Ok(work()),
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn run_pages(
        &self,
        provider: &dyn ContentProvider,
    ) -> Result<Vec<Result<PageOutcome, EngineError>>, EngineError> {
        Ok((0..provider.page_count())
            .map(|index| self.process_page(index, provider))
            .collect())
    }

    fn process_page(
        &self,
        index: usize,
        provider: &dyn ContentProvider,
    ) -> Result<PageOutcome, EngineError> {
        let size = provider.page_size(index)?;
        let mut diagnostics = Vec::new();

        let view = PageView::new(index, size, provider, self.options.extract.render_dpi);
        let detections = match self.detector.detect(&view) {
            Ok(detections) => detections,
            Err(err) => {
                warn!(page = index, error = %err, "detection failed");
                diagnostics.push(Diagnostic::on_page(
                    DiagnosticCode::DetectionFailed,
                    err.to_string(),
                    index,
                ));
                Vec::new()
            }
        };
        debug!(page = index, detections = detections.len(), "detections received");

        let min_confidence = self.options.detection.min_confidence;
        let mut candidates = Vec::with_capacity(detections.len());
        for (seq, detection) in detections.into_iter().enumerate() {
            if detection.confidence < min_confidence {
                debug!(page = index, seq, confidence = detection.confidence, "below confidence floor");
                continue;
            }
            let id = RegionId { page: index, seq };
            let region = RegionClass::from_label(&detection.label)
                .ok_or_else(|| format!("unknown class label {:?}", detection.label))
                .and_then(|class| {
                    Region::new(id, detection.bbox, class, detection.confidence)
                        .map_err(|e| e.to_string())
                });
            match region {
                Ok(region) => candidates.push(region),
                Err(reason) => {
                    warn!(region = %id, %reason, "dropping invalid detection");
                    diagnostics.push(Diagnostic::for_region(
                        DiagnosticCode::InvalidRegion,
                        reason,
                        id,
                    ));
                }
            }
        }

        let mut page = Page::new(index, size.0, size.1);
        page.regions = dedupe_regions(candidates, &self.options.dedupe);

        let strategy = order_page(&mut page, &self.options.order);
        if strategy.is_fallback() && !page.regions.is_empty() {
            debug!(page = index, "column detection inconclusive, ordering top to bottom");
            diagnostics.push(Diagnostic::on_page(
                DiagnosticCode::OrderingFallback,
                "column layout inconclusive; ordered top to bottom",
                index,
            ));
        }

        diagnostics.extend(extract_page(&mut page, provider, &self.options.extract));
        Ok(PageOutcome { page, diagnostics })
    }

    fn assemble<T>(
        &self,
        pdf: &[u8],
        produce: impl FnOnce(&Assembler<'_>) -> Result<Artifact<T>, EngineError>,
    ) -> Result<Artifact<T>, EngineError> {
        let content = self.open(pdf)?;
        let document = self.analyze_with(&content)?;
        let assembler =
            Assembler::new(&document, &content).with_markdown_options(self.options.markdown.clone());
        produce(&assembler)
    }

    pub fn annotated_pdf(&self, pdf: &[u8]) -> Result<Artifact<Vec<u8>>, EngineError> {
        self.assemble(pdf, |a| a.annotated_pdf())
    }

    pub fn cleaned_pdf(&self, pdf: &[u8]) -> Result<Artifact<Vec<u8>>, EngineError> {
        self.assemble(pdf, |a| a.cleaned_pdf())
    }

    /// Figure archive; entry names start with `stem`.
    pub fn figure_archive(&self, pdf: &[u8], stem: &str) -> Result<Artifact<Vec<u8>>, EngineError> {
        self.assemble(pdf, |a| a.figure_archive(stem))
    }

    /// Table archive; entry names start with `stem`.
    pub fn table_archive(&self, pdf: &[u8], stem: &str) -> Result<Artifact<Vec<u8>>, EngineError> {
        self.assemble(pdf, |a| a.table_archive(stem))
    }

    pub fn transcript(&self, pdf: &[u8]) -> Result<Artifact<String>, EngineError> {
        self.assemble(pdf, |a| Ok(a.transcript()))
    }

    pub fn transcript_json(&self, pdf: &[u8]) -> Result<Artifact<String>, EngineError> {
        self.assemble(pdf, |a| a.transcript_json())
    }

    /// Markdown bundle; image file names start with `stem`.
    pub fn markdown(&self, pdf: &[u8], stem: &str) -> Result<Artifact<MarkdownBundle>, EngineError> {
        self.assemble(pdf, |a| Ok(a.markdown(stem)))
    }

    /// Detections CSV with coordinates at `dpi`.
    pub fn detections_csv(&self, pdf: &[u8], dpi: f64) -> Result<Artifact<String>, EngineError> {
        self.assemble(pdf, |a| a.detections_csv(dpi))
    }

    pub fn sections(
        &self,
        pdf: &[u8],
        kinds: &[SectionKind],
    ) -> Result<Artifact<Vec<(SectionKind, String)>>, EngineError> {
        self.assemble(pdf, |a| Ok(a.sections(kinds)))
    }
}
