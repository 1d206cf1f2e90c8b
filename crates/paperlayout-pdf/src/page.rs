//! Page-level access: geometry, inherited attributes and content bytes.

use lopdf::{Dictionary, Document, Object, ObjectId};
use paperlayout_core::BBox;

use crate::error::BackendError;
use crate::fonts::{object_to_f64, resolve};

/// US Letter, used when a page carries no usable `/MediaBox`.
const DEFAULT_MEDIA_BOX: [f64; 4] = [0.0, 0.0, 612.0, 792.0];

/// A page's media box in PDF user space.
///
/// Converts between PDF space (origin bottom-left, y up) and page space
/// (origin at the top-left corner of the media box, y down), which is the
/// space regions and spans live in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    llx: f64,
    lly: f64,
    urx: f64,
    ury: f64,
}

impl PageGeometry {
    /// Build from two corners, normalizing their order.
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            llx: x0.min(x1),
            lly: y0.min(y1),
            urx: x0.max(x1),
            ury: y0.max(y1),
        }
    }

    pub fn width(&self) -> f64 {
        self.urx - self.llx
    }

    pub fn height(&self) -> f64 {
        self.ury - self.lly
    }

    /// Map a PDF-space point into page space.
    pub fn to_page_space(&self, x: f64, y: f64) -> (f64, f64) {
        (x - self.llx, self.ury - y)
    }

    /// Map a page-space box to a PDF `re` rectangle `[x, y, width, height]`.
    pub fn to_pdf_rect(&self, bbox: &BBox) -> [f64; 4] {
        [
            bbox.x0 + self.llx,
            self.ury - bbox.bottom,
            bbox.width(),
            bbox.height(),
        ]
    }

    /// Map a page-space point into PDF space.
    pub fn to_pdf_point(&self, x: f64, top: f64) -> (f64, f64) {
        (x + self.llx, self.ury - top)
    }

    fn from_object(obj: &Object) -> Option<Self> {
        let arr = obj.as_array().ok()?;
        if arr.len() != 4 {
            return None;
        }
        let v: Option<Vec<f64>> = arr.iter().map(object_to_f64).collect();
        let v = v?;
        let geometry = Self::new(v[0], v[1], v[2], v[3]);
        (geometry.width() > 0.0 && geometry.height() > 0.0).then_some(geometry)
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        let [x0, y0, x1, y1] = DEFAULT_MEDIA_BOX;
        Self::new(x0, y0, x1, y1)
    }
}

/// Look up a page attribute, walking `/Parent` links for inherited keys.
pub(crate) fn resolve_inherited<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> Result<Option<&'a Object>, BackendError> {
    let mut current = page_id;
    // Bounded walk; a cyclic /Parent chain must not hang.
    for _ in 0..64 {
        let dict = doc
            .get_object(current)
            .and_then(Object::as_dict)
            .map_err(|e| BackendError::Parse(format!("failed to get page dictionary: {e}")))?;
        if let Ok(value) = dict.get(key) {
            return Ok(Some(resolve(doc, value)));
        }
        match dict.get(b"Parent") {
            Ok(parent) => {
                current = parent
                    .as_reference()
                    .map_err(|e| BackendError::Parse(format!("invalid /Parent reference: {e}")))?;
            }
            Err(_) => return Ok(None),
        }
    }
    Ok(None)
}

pub(crate) fn page_geometry(doc: &Document, page_id: ObjectId) -> Result<PageGeometry, BackendError> {
    let media_box = resolve_inherited(doc, page_id, b"MediaBox")?;
    Ok(media_box
        .and_then(PageGeometry::from_object)
        .unwrap_or_default())
}

pub(crate) fn page_resources(
    doc: &Document,
    page_id: ObjectId,
) -> Result<Option<&Dictionary>, BackendError> {
    Ok(resolve_inherited(doc, page_id, b"Resources")?.and_then(|o| o.as_dict().ok()))
}

fn decode_stream(stream: &lopdf::Stream) -> Result<Vec<u8>, BackendError> {
    if stream.dict.get(b"Filter").is_ok() {
        stream
            .decompressed_content()
            .map_err(|e| BackendError::Parse(format!("failed to decompress content stream: {e}")))
    } else {
        Ok(stream.content.clone())
    }
}

/// Concatenated, decompressed bytes of a page's `/Contents`.
pub(crate) fn page_content_bytes(doc: &Document, page_id: ObjectId) -> Result<Vec<u8>, BackendError> {
    let page = doc
        .get_object(page_id)
        .and_then(Object::as_dict)
        .map_err(|e| BackendError::Parse(format!("failed to get page dictionary: {e}")))?;
    let Ok(contents) = page.get(b"Contents") else {
        return Ok(Vec::new());
    };
    match resolve(doc, contents) {
        Object::Stream(stream) => decode_stream(stream),
        Object::Array(parts) => {
            let mut bytes = Vec::new();
            for part in parts {
                let stream = resolve(doc, part)
                    .as_stream()
                    .map_err(|e| BackendError::Parse(format!("/Contents item is not a stream: {e}")))?;
                bytes.extend(decode_stream(stream)?);
                bytes.push(b'\n');
            }
            Ok(bytes)
        }
        _ => Err(BackendError::Parse("/Contents is not a stream".to_string())),
    }
}

pub(crate) fn page_operations(
    doc: &Document,
    page_id: ObjectId,
) -> Result<Vec<lopdf::content::Operation>, BackendError> {
    let bytes = page_content_bytes(doc, page_id)?;
    if bytes.is_empty() {
        return Ok(Vec::new());
    }
    lopdf::content::Content::decode(&bytes)
        .map(|content| content.operations)
        .map_err(|e| BackendError::Parse(format!("failed to decode content stream: {e}")))
}
