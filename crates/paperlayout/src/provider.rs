//! The PDF content collaborator.
//!
//! [`ContentProvider`] is the read side (sizes, text spans, pixels) and
//! [`PageEditor`] the write side (redact, draw, save). [`PdfContent`] backs
//! both with `paperlayout-pdf`.

use std::io::Cursor;
use std::sync::OnceLock;

use image::{DynamicImage, ImageFormat};
use paperlayout_core::{BBox, LayoutError, Rgb, TextSpan};
use paperlayout_pdf::{BackendError, PdfEditor, PdfSource};
use tracing::debug;

use crate::error::EngineError;

/// Line width of region outlines, in points.
const OUTLINE_WIDTH: f64 = 1.0;

/// Read access to the source PDF.
///
/// Shared by the per-page workers, so implementations must be `Sync`.
pub trait ContentProvider: Sync {
    /// The source PDF bytes, unmodified.
    fn source(&self) -> &[u8];

    fn page_count(&self) -> usize;

    /// `(width, height)` of a page in points.
    fn page_size(&self, page: usize) -> Result<(f64, f64), EngineError>;

    /// Render a whole page at `dpi`.
    fn render_page(&self, page: usize, dpi: f32) -> Result<DynamicImage, EngineError>;

    /// Text spans whose center lies inside `bbox`, in content order.
    fn extract_text(&self, page: usize, bbox: &BBox) -> Result<Vec<TextSpan>, EngineError>;

    /// Pixels of `bbox` at `dpi`. Defaults to cropping a full-page render.
    fn crop_pixels(&self, page: usize, bbox: &BBox, dpi: f32) -> Result<DynamicImage, EngineError> {
        let size = self.page_size(page)?;
        let image = self.render_page(page, dpi)?;
        crop_image(&image, bbox, size).ok_or_else(|| {
            EngineError::Core(LayoutError::ExtractionFailed {
                page,
                reason: "crop box lies outside the page".to_string(),
            })
        })
    }

    /// Start editing a copy of the source.
    fn open_editor(&self) -> Result<Box<dyn PageEditor>, EngineError>;
}

/// Write access to a copy of the source PDF.
pub trait PageEditor {
    /// Remove the content under `bbox` and paint it white.
    fn redact(&mut self, page: usize, bbox: &BBox) -> Result<(), EngineError>;

    /// Outline `bbox` in `color`.
    fn draw_box(&mut self, page: usize, bbox: &BBox, color: Rgb) -> Result<(), EngineError>;

    /// Put a small text tag on a `color` background above `anchor`.
    fn draw_label(
        &mut self,
        page: usize,
        anchor: &BBox,
        text: &str,
        color: Rgb,
    ) -> Result<(), EngineError>;

    /// Serialize the edited document.
    fn save(self: Box<Self>) -> Result<Vec<u8>, EngineError>;
}

/// Crop the part of a page image covered by `bbox` (page points).
///
/// Returns `None` when the box does not overlap the page.
pub fn crop_image(image: &DynamicImage, bbox: &BBox, (width, height): (f64, f64)) -> Option<DynamicImage> {
    if width <= 0.0 || height <= 0.0 {
        return None;
    }
    let sx = f64::from(image.width()) / width;
    let sy = f64::from(image.height()) / height;
    let b = bbox.clamp_to(width, height);

    let x0 = (b.x0 * sx).floor() as u32;
    let y0 = (b.top * sy).floor() as u32;
    let x1 = ((b.x1 * sx).ceil() as u32).min(image.width());
    let y1 = ((b.bottom * sy).ceil() as u32).min(image.height());
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some(image.crop_imm(x0, y0, x1 - x0, y1 - y0))
}

/// Encode an image as PNG.
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, EngineError> {
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}

/// [`ContentProvider`] over PDF bytes.
///
/// Text spans are extracted once per page and cached. Page renders at the
/// configured resolution are cached as well, so cropping several regions of
/// a page renders it once.
pub struct PdfContent {
    bytes: Vec<u8>,
    source: PdfSource,
    render_dpi: f32,
    spans: Vec<OnceLock<Result<Vec<TextSpan>, String>>>,
    renders: Vec<OnceLock<Result<DynamicImage, String>>>,
}

impl std::fmt::Debug for PdfContent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfContent")
            .field("bytes", &self.bytes.len())
            .field("pages", &self.source.page_count())
            .field("render_dpi", &self.render_dpi)
            .finish()
    }
}

impl PdfContent {
    /// Open PDF bytes.
    ///
    /// # Errors
    ///
    /// [`EngineError::UnparseablePdf`] if the bytes cannot be parsed.
    pub fn open(bytes: Vec<u8>, render_dpi: f32) -> Result<Self, EngineError> {
        let source = PdfSource::open(&bytes).map_err(EngineError::on_open)?;
        let pages = source.page_count();
        Ok(Self {
            bytes,
            source,
            render_dpi,
            spans: (0..pages).map(|_| OnceLock::new()).collect(),
            renders: (0..pages).map(|_| OnceLock::new()).collect(),
        })
    }

    fn check_page(&self, page: usize) -> Result<(), EngineError> {
        if page < self.source.page_count() {
            Ok(())
        } else {
            Err(BackendError::PageOutOfRange {
                index: page,
                count: self.source.page_count(),
            }
            .into())
        }
    }

    fn page_spans(&self, page: usize) -> Result<&[TextSpan], EngineError> {
        self.check_page(page)?;
        let cached = self.spans[page]
            .get_or_init(|| self.source.page_spans(page).map_err(|e| e.to_string()));
        match cached {
            Ok(spans) => Ok(spans),
            Err(reason) => Err(EngineError::Core(LayoutError::ExtractionFailed {
                page,
                reason: reason.clone(),
            })),
        }
    }

    fn render_uncached(&self, page: usize, dpi: f32) -> Result<DynamicImage, EngineError> {
        rasterize(&self.bytes, page, dpi)
    }
}

#[cfg(feature = "pdfium")]
fn rasterize(pdf: &[u8], page: usize, dpi: f32) -> Result<DynamicImage, EngineError> {
    Ok(paperlayout_pdf::raster::render_page(pdf, page, dpi)?)
}

#[cfg(not(feature = "pdfium"))]
fn rasterize(_pdf: &[u8], page: usize, _dpi: f32) -> Result<DynamicImage, EngineError> {
    Err(BackendError::Render(format!(
        "cannot render page {}: built without the `pdfium` feature",
        page + 1
    ))
    .into())
}

impl ContentProvider for PdfContent {
    fn source(&self) -> &[u8] {
        &self.bytes
    }

    fn page_count(&self) -> usize {
        self.source.page_count()
    }

    fn page_size(&self, page: usize) -> Result<(f64, f64), EngineError> {
        Ok(self.source.page_size(page)?)
    }

    fn render_page(&self, page: usize, dpi: f32) -> Result<DynamicImage, EngineError> {
        self.check_page(page)?;
        if (dpi - self.render_dpi).abs() > f32::EPSILON {
            return self.render_uncached(page, dpi);
        }
        let cached = self.renders[page]
            .get_or_init(|| self.render_uncached(page, dpi).map_err(|e| e.to_string()));
        match cached {
            Ok(image) => Ok(image.clone()),
            Err(reason) => Err(BackendError::Render(reason.clone()).into()),
        }
    }

    fn extract_text(&self, page: usize, bbox: &BBox) -> Result<Vec<TextSpan>, EngineError> {
        let spans: Vec<TextSpan> = self
            .page_spans(page)?
            .iter()
            .filter(|span| bbox.contains_point(span.bbox.center_x(), span.bbox.center_y()))
            .cloned()
            .collect();
        debug!(page, spans = spans.len(), "spans inside region");
        Ok(spans)
    }

    fn open_editor(&self) -> Result<Box<dyn PageEditor>, EngineError> {
        Ok(Box::new(self.source.editor()))
    }
}

impl PageEditor for PdfEditor {
    fn redact(&mut self, page: usize, bbox: &BBox) -> Result<(), EngineError> {
        Ok(PdfEditor::redact(self, page, *bbox)?)
    }

    fn draw_box(&mut self, page: usize, bbox: &BBox, color: Rgb) -> Result<(), EngineError> {
        Ok(PdfEditor::draw_box(self, page, *bbox, color, OUTLINE_WIDTH)?)
    }

    fn draw_label(
        &mut self,
        page: usize,
        anchor: &BBox,
        text: &str,
        color: Rgb,
    ) -> Result<(), EngineError> {
        Ok(PdfEditor::draw_label(self, page, *anchor, text, color)?)
    }

    fn save(self: Box<Self>) -> Result<Vec<u8>, EngineError> {
        Ok(PdfEditor::save(*self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn page_image() -> DynamicImage {
        // 2 px per point on a 100 x 50 pt page
        DynamicImage::ImageRgb8(RgbImage::new(200, 100))
    }

    #[test]
    fn crop_scales_points_to_pixels() {
        let crop = crop_image(&page_image(), &BBox::new(10.0, 5.0, 30.0, 25.0), (100.0, 50.0)).unwrap();
        assert_eq!((crop.width(), crop.height()), (40, 40));
    }

    #[test]
    fn crop_clamps_to_page() {
        let crop = crop_image(&page_image(), &BBox::new(90.0, 40.0, 120.0, 80.0), (100.0, 50.0)).unwrap();
        assert_eq!((crop.width(), crop.height()), (20, 20));
    }

    #[test]
    fn crop_outside_page_is_none() {
        assert!(crop_image(&page_image(), &BBox::new(150.0, 0.0, 200.0, 10.0), (100.0, 50.0)).is_none());
    }

    #[test]
    fn png_encoding_has_signature() {
        let png = encode_png(&page_image()).unwrap();
        assert_eq!(&png[..4], b"\x89PNG");
    }

    #[test]
    fn garbage_is_unparseable() {
        assert!(matches!(
            PdfContent::open(b"%PDF-garbage".to_vec(), 150.0),
            Err(EngineError::UnparseablePdf(_))
        ));
    }
}
