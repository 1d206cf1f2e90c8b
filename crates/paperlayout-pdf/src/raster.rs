//! Page rasterization through pdfium.
//!
//! The pdfium library is bound per call; bindings are not thread-safe, so
//! every call holds a process-wide lock.

use std::sync::Mutex;

use image::DynamicImage;
use pdfium_render::prelude::*;
use tracing::debug;

use crate::error::BackendError;

static PDFIUM: Mutex<()> = Mutex::new(());

fn bind() -> Result<Pdfium, BackendError> {
    let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| Pdfium::bind_to_system_library())
        .map_err(|e| BackendError::Render(format!("failed to bind pdfium library: {e}")))?;
    Ok(Pdfium::new(bindings))
}

/// Render page `index` (0-based) of `pdf` at `dpi`.
pub fn render_page(pdf: &[u8], index: usize, dpi: f32) -> Result<DynamicImage, BackendError> {
    let _guard = PDFIUM
        .lock()
        .map_err(|_| BackendError::Render("pdfium lock poisoned".to_string()))?;
    let pdfium = bind()?;
    let document = pdfium
        .load_pdf_from_byte_slice(pdf, None)
        .map_err(|e| BackendError::Render(format!("failed to load PDF: {e}")))?;
    let pages = document.pages();
    let count = pages.len() as usize;
    let page = pages
        .iter()
        .nth(index)
        .ok_or(BackendError::PageOutOfRange { index, count })?;

    let scale = dpi / 72.0;
    let width = (page.width().value * scale).round() as i32;
    let height = (page.height().value * scale).round() as i32;
    let bitmap = page
        .render_with_config(
            &PdfRenderConfig::new()
                .set_target_width(width)
                .set_target_height(height)
                .render_annotations(true),
        )
        .map_err(|e| BackendError::Render(format!("failed to render page {index}: {e}")))?;
    debug!(page = index, width, height, "rendered page");
    Ok(bitmap.as_image())
}
