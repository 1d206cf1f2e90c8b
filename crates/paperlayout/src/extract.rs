//! Content extraction: fill each region's payload from the PDF.

use paperlayout_core::{
    Diagnostic, DiagnosticCode, ImagePayload, Page, Payload, Region, RegionClass, spans_to_table_text,
    spans_to_text,
};
use tracing::warn;

use crate::error::EngineError;
use crate::options::ExtractOptions;
use crate::provider::{ContentProvider, encode_png};

/// Extract every region of `page`.
///
/// A region whose content cannot be read gets an empty payload and the
/// extraction-failed flag; the failure is returned as a diagnostic and the
/// other regions are still processed. A table whose crop fails keeps its
/// text layer as a text payload.
pub fn extract_page(
    page: &mut Page,
    provider: &dyn ContentProvider,
    options: &ExtractOptions,
) -> Vec<Diagnostic> {
    let (width, height) = (page.width, page.height);
    let mut diagnostics = Vec::new();
    for region in &mut page.regions {
        if let Err(err) = extract_region(region, provider, options, (width, height)) {
            warn!(region = %region.id(), error = %err, "extraction failed");
            if region.payload().is_some() {
                region.flag_extraction_failed();
            } else {
                region.mark_extraction_failed();
            }
            diagnostics.push(Diagnostic::for_region(
                DiagnosticCode::ExtractionFailed,
                format!("{} region: {err}", region.class()),
                region.id(),
            ));
        }
    }
    diagnostics
}

fn extract_region(
    region: &mut Region,
    provider: &dyn ContentProvider,
    options: &ExtractOptions,
    (width, height): (f64, f64),
) -> Result<(), EngineError> {
    let page = region.page_index();
    let bbox = *region.bbox();
    let payload = match region.class() {
        RegionClass::Abandon => Payload::Empty,
        class if class.is_visual() => {
            // a table's text layer needs no pixels, so it survives a failed crop
            let text_layer = if class == RegionClass::Table {
                provider
                    .extract_text(page, &bbox)
                    .ok()
                    .map(|spans| spans_to_table_text(&spans))
                    .filter(|text| !text.trim().is_empty())
            } else {
                None
            };
            let crop_box = bbox.expand(options.crop_padding).clamp_to(width, height);
            let image = match provider.crop_pixels(page, &crop_box, options.render_dpi) {
                Ok(image) => image,
                Err(err) => {
                    if let Some(text) = text_layer {
                        region.set_payload(Payload::Text(text));
                    }
                    return Err(err);
                }
            };
            Payload::Image(ImagePayload {
                png: encode_png(&image)?,
                width: image.width(),
                height: image.height(),
                page_index: page,
                text_layer,
            })
        }
        _ => {
            let spans = provider.extract_text(page, &bbox)?;
            Payload::Text(spans_to_text(&spans, options.paragraph_gap_ratio))
        }
    };
    region.set_payload(payload);
    Ok(())
}
