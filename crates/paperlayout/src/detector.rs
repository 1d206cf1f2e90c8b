//! The detection collaborator.
//!
//! A [`LayoutDetector`] turns a page into `(bbox, label, confidence)`
//! tuples. The engine treats it as a black box; [`CsvDetections`] replays
//! detections persisted by an earlier run.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use image::DynamicImage;
use paperlayout_core::{BBox, RegionClass};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::EngineError;
use crate::provider::ContentProvider;

/// One raw detector output.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Box in page points, top-left origin.
    pub bbox: BBox,
    /// Detector class label (`"title"`, `"plain text"`, `"figure"`, ...).
    pub label: String,
    pub confidence: f64,
}

impl Detection {
    pub fn new(bbox: BBox, label: impl Into<String>, confidence: f64) -> Self {
        Self {
            bbox,
            label: label.into(),
            confidence,
        }
    }
}

/// What a detector sees of a page: its size, and its image on demand.
pub struct PageView<'a> {
    /// Page number (0-indexed).
    pub index: usize,
    /// Page width in points.
    pub width: f64,
    /// Page height in points.
    pub height: f64,
    provider: &'a dyn ContentProvider,
    dpi: f32,
}

impl<'a> PageView<'a> {
    pub(crate) fn new(
        index: usize,
        (width, height): (f64, f64),
        provider: &'a dyn ContentProvider,
        dpi: f32,
    ) -> Self {
        Self {
            index,
            width,
            height,
            provider,
            dpi,
        }
    }

    /// Render the page. Detectors that need no pixels never call this.
    pub fn render(&self) -> Result<DynamicImage, EngineError> {
        self.provider.render_page(self.index, self.dpi)
    }

    /// Resolution used by [`PageView::render`].
    pub fn dpi(&self) -> f32 {
        self.dpi
    }
}

/// Produces layout detections for a page.
///
/// Called from worker threads, one page per call.
pub trait LayoutDetector: Sync {
    /// Detect regions on a page. An empty list is a valid answer.
    fn detect(&self, page: &PageView<'_>) -> Result<Vec<Detection>, EngineError>;
}

impl<T: LayoutDetector + ?Sized> LayoutDetector for &T {
    fn detect(&self, page: &PageView<'_>) -> Result<Vec<Detection>, EngineError> {
        (**self).detect(page)
    }
}

impl<T: LayoutDetector + ?Sized> LayoutDetector for Box<T> {
    fn detect(&self, page: &PageView<'_>) -> Result<Vec<Detection>, EngineError> {
        (**self).detect(page)
    }
}

/// One row of a detections CSV.
///
/// `page_number` is 1-based; coordinates are pixels of a page image rendered
/// at the file's DPI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct DetectionRecord {
    pub page_number: usize,
    pub order: Option<usize>,
    pub class_id: u32,
    pub confidence: f64,
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

/// Resolution detection CSVs are written at unless told otherwise.
pub const DEFAULT_CSV_DPI: f64 = 300.0;

/// Detections replayed from a CSV file.
///
/// The `order` column is ignored; the engine reconstructs reading order
/// itself. Class ids outside the known label set are kept under a
/// placeholder label and rejected later as invalid regions.
#[derive(Debug, Clone, Default)]
pub struct CsvDetections {
    pages: BTreeMap<usize, Vec<Detection>>,
}

impl CsvDetections {
    /// Read detections whose pixel coordinates were measured at `dpi`.
    pub fn from_reader<R: Read>(reader: R, dpi: f64) -> Result<Self, EngineError> {
        let to_points = |v: f64| v * 72.0 / dpi;
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut pages: BTreeMap<usize, Vec<Detection>> = BTreeMap::new();
        for record in rdr.deserialize() {
            let record: DetectionRecord = record?;
            let Some(page) = record.page_number.checked_sub(1) else {
                return Err(EngineError::Detection {
                    page: 0,
                    reason: "detections CSV page numbers start at 1".to_string(),
                });
            };
            let label = RegionClass::from_class_id(record.class_id)
                .map(|class| class.label().to_string())
                .unwrap_or_else(|| format!("class {}", record.class_id));
            let bbox = BBox::new(
                to_points(record.x0),
                to_points(record.y0),
                to_points(record.x1),
                to_points(record.y1),
            );
            pages
                .entry(page)
                .or_default()
                .push(Detection::new(bbox, label, record.confidence));
        }
        debug!(pages = pages.len(), "loaded detections CSV");
        Ok(Self { pages })
    }

    pub fn from_path(path: impl AsRef<Path>, dpi: f64) -> Result<Self, EngineError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, dpi)
    }

    /// Total number of detections across pages.
    pub fn len(&self) -> usize {
        self.pages.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LayoutDetector for CsvDetections {
    fn detect(&self, page: &PageView<'_>) -> Result<Vec<Detection>, EngineError> {
        Ok(self.pages.get(&page.index).cloned().unwrap_or_default())
    }
}
