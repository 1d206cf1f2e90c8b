//! In-place PDF editing: text redaction and annotation overlays.
//!
//! Edits are queued per page and applied by [`PdfEditor::save`]. Redaction
//! removes the text-showing operators whose span center falls inside a
//! redacted box (keeping the text position consistent for what follows)
//! and paints the box white. Outlines and labels are drawn in an overlay
//! appended after the original content, which is wrapped in `q ... Q` so
//! its graphics state cannot leak into the overlay.

use std::collections::BTreeMap;

use encoding_rs::WINDOWS_1252;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, StringFormat, dictionary};
use paperlayout_core::{BBox, Rgb};
use tracing::debug;

use crate::error::BackendError;
use crate::fonts::resolve;
use crate::interpreter::ShowEvent;
use crate::page::{PageGeometry, page_geometry, page_resources};
use crate::source::show_events_for;

/// Resource name of the font used for labels.
const LABEL_FONT: &str = "PLLabel";
const LABEL_FONT_SIZE: f64 = 7.0;
/// Average Helvetica advance, in ems, used to size label backgrounds.
const LABEL_CHAR_WIDTH: f64 = 0.55;
const LABEL_PADDING: f64 = 1.5;

#[derive(Debug, Clone)]
struct Outline {
    bbox: BBox,
    color: Rgb,
    line_width: f64,
}

#[derive(Debug, Clone)]
struct Label {
    anchor: BBox,
    text: String,
    background: Rgb,
}

#[derive(Debug, Clone, Default)]
struct PageEdits {
    redactions: Vec<BBox>,
    outlines: Vec<Outline>,
    labels: Vec<Label>,
}

/// A document being edited. Created by [`PdfSource::editor`](crate::PdfSource::editor).
#[derive(Debug)]
pub struct PdfEditor {
    doc: Document,
    page_ids: Vec<ObjectId>,
    edits: BTreeMap<usize, PageEdits>,
}

fn real(value: f64) -> Object {
    Object::Real(value as f32)
}

fn op(operator: &str, operands: &[f64]) -> Operation {
    Operation::new(operator, operands.iter().copied().map(real).collect())
}

fn set_fill(color: Rgb) -> Operation {
    op("rg", &[color.0, color.1, color.2])
}

fn rect(geometry: &PageGeometry, bbox: &BBox) -> Operation {
    op("re", &geometry.to_pdf_rect(bbox))
}

/// Black on light backgrounds, white on dark ones.
fn label_ink(background: Rgb) -> Rgb {
    let luminance = 0.299 * background.0 + 0.587 * background.1 + 0.114 * background.2;
    if luminance > 0.5 {
        Rgb(0.0, 0.0, 0.0)
    } else {
        Rgb::WHITE
    }
}

impl PdfEditor {
    pub(crate) fn new(doc: Document, page_ids: Vec<ObjectId>) -> Self {
        Self {
            doc,
            page_ids,
            edits: BTreeMap::new(),
        }
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    fn page_edits(&mut self, page: usize) -> Result<&mut PageEdits, BackendError> {
        if page >= self.page_ids.len() {
            return Err(BackendError::PageOutOfRange {
                index: page,
                count: self.page_ids.len(),
            });
        }
        Ok(self.edits.entry(page).or_default())
    }

    /// Remove the text inside `bbox` and paint it white.
    pub fn redact(&mut self, page: usize, bbox: BBox) -> Result<(), BackendError> {
        self.page_edits(page)?.redactions.push(bbox);
        Ok(())
    }

    /// Stroke the outline of `bbox`.
    pub fn draw_box(
        &mut self,
        page: usize,
        bbox: BBox,
        color: Rgb,
        line_width: f64,
    ) -> Result<(), BackendError> {
        self.page_edits(page)?.outlines.push(Outline {
            bbox,
            color,
            line_width,
        });
        Ok(())
    }

    /// Draw `text` on a filled tag just above the top-left corner of
    /// `anchor` (inside it when there is no room above).
    pub fn draw_label(
        &mut self,
        page: usize,
        anchor: BBox,
        text: &str,
        background: Rgb,
    ) -> Result<(), BackendError> {
        self.page_edits(page)?.labels.push(Label {
            anchor,
            text: text.to_string(),
            background,
        });
        Ok(())
    }

    /// Apply all queued edits and serialize the document.
    pub fn save(mut self) -> Result<Vec<u8>, BackendError> {
        let edits = std::mem::take(&mut self.edits);
        for (index, page_edits) in edits {
            let page_id = self.page_ids[index];
            self.apply(page_id, &page_edits)?;
        }
        let mut buffer = Vec::new();
        self.doc
            .save_to(&mut buffer)
            .map_err(|e| BackendError::Write(format!("failed to save PDF: {e}")))?;
        Ok(buffer)
    }

    fn apply(&mut self, page_id: ObjectId, edits: &PageEdits) -> Result<(), BackendError> {
        let geometry = page_geometry(&self.doc, page_id)?;
        let (operations, events) = show_events_for(&self.doc, page_id)?;
        let (mut kept, removed) = redact_operations(operations, &events, &edits.redactions);
        debug!(removed, redactions = edits.redactions.len(), "redacted text operators");

        let mut ops = Vec::with_capacity(kept.len() + 16);
        ops.push(op("q", &[]));
        ops.append(&mut kept);
        ops.push(op("Q", &[]));
        ops.extend(overlay(&geometry, edits));

        if !edits.labels.is_empty() {
            self.install_label_font(page_id)?;
        }

        let bytes = Content { operations: ops }
            .encode()
            .map_err(|e| BackendError::Write(format!("failed to encode content stream: {e}")))?;
        self.doc
            .change_page_content(page_id, bytes)
            .map_err(|e| BackendError::Write(format!("failed to replace page content: {e}")))?;
        Ok(())
    }

    /// Give the page its own `/Resources` with the label font added.
    fn install_label_font(&mut self, page_id: ObjectId) -> Result<(), BackendError> {
        let mut resources = page_resources(&self.doc, page_id)?
            .cloned()
            .unwrap_or_default();
        let mut fonts = resources
            .get(b"Font")
            .ok()
            .map(|obj| resolve(&self.doc, obj))
            .and_then(|obj| obj.as_dict().ok())
            .cloned()
            .unwrap_or_default();

        let font_id = self.doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        fonts.set(LABEL_FONT, Object::Reference(font_id));
        resources.set("Font", Object::Dictionary(fonts));

        let page = self
            .doc
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .map_err(|e| BackendError::Write(format!("failed to get page dictionary: {e}")))?;
        page.set("Resources", Object::Dictionary(resources));
        Ok(())
    }
}

/// Drop the text operators whose span center lies in a redaction box.
///
/// Each dropped operator is replaced by a `TJ` that moves the text position
/// by the same amount, so later text on the line stays put. Returns the new
/// operation list and the number of operators dropped.
fn redact_operations(
    operations: Vec<Operation>,
    events: &[ShowEvent],
    redactions: &[BBox],
) -> (Vec<Operation>, usize) {
    if redactions.is_empty() {
        return (operations, 0);
    }
    let redacted: BTreeMap<usize, &ShowEvent> = events
        .iter()
        .filter(|event| {
            let (cx, cy) = (event.bbox.center_x(), event.bbox.center_y());
            redactions.iter().any(|r| r.contains_point(cx, cy))
        })
        .map(|event| (event.op_index, event))
        .collect();

    let removed = redacted.len();
    let mut out = Vec::with_capacity(operations.len());
    for (index, operation) in operations.into_iter().enumerate() {
        let Some(event) = redacted.get(&index) else {
            out.push(operation);
            continue;
        };
        match operation.operator.as_str() {
            "'" => out.push(op("T*", &[])),
            "\"" => {
                let mut operands = operation.operands.into_iter();
                if let (Some(aw), Some(ac)) = (operands.next(), operands.next()) {
                    out.push(Operation::new("Tw", vec![aw]));
                    out.push(Operation::new("Tc", vec![ac]));
                }
                out.push(op("T*", &[]));
            }
            _ => {}
        }
        let scale = event.font_size * event.h_scale;
        if scale.abs() > f64::EPSILON && event.advance != 0.0 {
            let shift = -event.advance * 1000.0 / scale;
            out.push(Operation::new("TJ", vec![Object::Array(vec![real(shift)])]));
        }
    }
    (out, removed)
}

fn overlay(geometry: &PageGeometry, edits: &PageEdits) -> Vec<Operation> {
    let mut ops = vec![op("q", &[])];

    if !edits.redactions.is_empty() {
        ops.push(set_fill(Rgb::WHITE));
        for bbox in &edits.redactions {
            ops.push(rect(geometry, bbox));
        }
        ops.push(op("f", &[]));
    }

    for outline in &edits.outlines {
        let Rgb(r, g, b) = outline.color;
        ops.push(op("RG", &[r, g, b]));
        ops.push(op("w", &[outline.line_width]));
        ops.push(rect(geometry, &outline.bbox));
        ops.push(op("S", &[]));
    }

    for label in &edits.labels {
        let height = LABEL_FONT_SIZE + 2.0 * LABEL_PADDING;
        let width =
            label.text.chars().count() as f64 * LABEL_CHAR_WIDTH * LABEL_FONT_SIZE + 2.0 * LABEL_PADDING;
        let anchor = &label.anchor;
        let top = if anchor.top >= height {
            anchor.top - height
        } else {
            anchor.top
        };
        let tag = BBox::new(anchor.x0, top, anchor.x0 + width, top + height);

        ops.push(set_fill(label.background));
        ops.push(rect(geometry, &tag));
        ops.push(op("f", &[]));

        let (x, y) = geometry.to_pdf_point(tag.x0 + LABEL_PADDING, tag.bottom - LABEL_PADDING - 0.2 * LABEL_FONT_SIZE);
        let (encoded, _, _) = WINDOWS_1252.encode(&label.text);
        ops.push(set_fill(label_ink(label.background)));
        ops.push(op("BT", &[]));
        ops.push(Operation::new(
            "Tf",
            vec![Object::Name(LABEL_FONT.as_bytes().to_vec()), real(LABEL_FONT_SIZE)],
        ));
        ops.push(op("Td", &[x, y]));
        ops.push(Operation::new(
            "Tj",
            vec![Object::String(encoded.into_owned(), StringFormat::Literal)],
        ));
        ops.push(op("ET", &[]));
    }

    ops.push(op("Q", &[]));
    ops
}
