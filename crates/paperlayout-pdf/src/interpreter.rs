//! A small content-stream interpreter that locates shown text.
//!
//! Tracks the graphics state (`q`/`Q`/`cm`), the text state (`Tc`, `Tw`,
//! `Tz`, `TL`, `Tf`, `Ts`) and the text/line matrices, and emits one
//! [`ShowEvent`] per text-showing operator (`Tj`, `TJ`, `'`, `"`). Glyph
//! outlines are not consulted; a span's height is derived from the
//! effective font size.

use std::collections::HashMap;

use lopdf::content::Operation;
use lopdf::{Dictionary, Document, Object};
use paperlayout_core::BBox;

use crate::fonts::{FontInfo, object_to_f64, resolve};
use crate::page::PageGeometry;

/// Fraction of the font size above the baseline covered by a span.
const ASCENT: f64 = 0.8;
/// Fraction of the font size below the baseline covered by a span.
const DESCENT: f64 = 0.2;
/// `TJ` adjustment (thousandths of an em, negative = move right) treated as
/// a word break.
const TJ_SPACE_THRESHOLD: f64 = -200.0;

/// Affine matrix `[a b c d e f]` in the PDF row-vector convention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Matrix {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    e: f64,
    f: f64,
}

impl Matrix {
    pub(crate) const IDENTITY: Matrix = Matrix::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);

    pub(crate) const fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    fn translate(tx: f64, ty: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    /// `self × other`: apply `self` first, then `other`.
    pub(crate) fn then(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    pub(crate) fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    fn vertical_scale(&self) -> f64 {
        self.c.hypot(self.d)
    }
}

/// Text state parameters saved and restored by `q`/`Q`.
#[derive(Debug, Clone)]
struct TextParams {
    char_spacing: f64,
    word_spacing: f64,
    /// Horizontal scaling as a fraction (1.0 = 100%).
    h_scale: f64,
    leading: f64,
    font: Option<Vec<u8>>,
    size: f64,
    rise: f64,
}

impl Default for TextParams {
    fn default() -> Self {
        Self {
            char_spacing: 0.0,
            word_spacing: 0.0,
            h_scale: 1.0,
            leading: 0.0,
            font: None,
            size: 0.0,
            rise: 0.0,
        }
    }
}

/// One text-showing operator and where its text landed.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ShowEvent {
    /// Index of the operator in the decoded operation list.
    pub op_index: usize,
    /// Decoded text.
    pub text: String,
    /// Span box in top-left page coordinates.
    pub bbox: BBox,
    /// Horizontal text-space displacement caused by the operator.
    pub advance: f64,
    /// Font size in effect.
    pub font_size: f64,
    /// Horizontal scaling in effect (fraction).
    pub h_scale: f64,
}

fn number(operands: &[Object], index: usize) -> Option<f64> {
    operands.get(index).and_then(object_to_f64)
}

fn string_bytes(obj: &Object) -> Option<&[u8]> {
    match obj {
        Object::String(bytes, _) => Some(bytes),
        _ => None,
    }
}

struct Interpreter<'a> {
    doc: &'a Document,
    fonts_dict: Option<&'a Dictionary>,
    fonts: HashMap<Vec<u8>, FontInfo>,
    geometry: PageGeometry,
    ctm: Matrix,
    params: TextParams,
    stack: Vec<(Matrix, TextParams)>,
    text_matrix: Matrix,
    line_matrix: Matrix,
    events: Vec<ShowEvent>,
}

impl<'a> Interpreter<'a> {
    fn font(&mut self) -> FontInfo {
        let Some(name) = self.params.font.clone() else {
            return FontInfo::default();
        };
        if let Some(info) = self.fonts.get(&name) {
            return info.clone();
        }
        let info = self
            .fonts_dict
            .and_then(|fonts| fonts.get(&name).ok())
            .map(|obj| resolve(self.doc, obj))
            .and_then(|obj| obj.as_dict().ok())
            .map(|dict| FontInfo::load(self.doc, dict))
            .unwrap_or_default();
        self.fonts.insert(name, info.clone());
        info
    }

    fn next_line(&mut self, tx: f64, ty: f64) {
        self.line_matrix = Matrix::translate(tx, ty).then(&self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    /// Advance over one string, appending its text. Returns the text-space
    /// displacement.
    fn show_bytes(&self, font: &FontInfo, bytes: &[u8], text: &mut String) -> f64 {
        let p = &self.params;
        let mut advance = 0.0;
        for code in font.codes(bytes) {
            let word_spacing = if !font.is_two_byte() && code == 32 {
                p.word_spacing
            } else {
                0.0
            };
            advance += (font.width(code) / 1000.0 * p.size + p.char_spacing + word_spacing)
                * p.h_scale;
            text.push_str(&font.decode(code));
        }
        advance
    }

    fn emit(&mut self, op_index: usize, text: String, advance: f64) {
        let rendering = self.text_matrix.then(&self.ctm);
        let rise = self.params.rise;
        let (x0, y0) = rendering.apply(0.0, rise);
        let (x1, y1) = rendering.apply(advance, rise);
        let size = self.params.size * rendering.vertical_scale();

        let g = &self.geometry;
        let (left, top) = g.to_page_space(x0.min(x1), y0.max(y1) + ASCENT * size);
        let (right, bottom) = g.to_page_space(x0.max(x1), y0.min(y1) - DESCENT * size);

        self.events.push(ShowEvent {
            op_index,
            text,
            bbox: BBox::new(left, top, right, bottom),
            advance,
            font_size: self.params.size,
            h_scale: self.params.h_scale,
        });
        self.text_matrix = Matrix::translate(advance, 0.0).then(&self.text_matrix);
    }

    fn show_string(&mut self, op_index: usize, operand: Option<&Object>) {
        let font = self.font();
        let mut text = String::new();
        let advance = operand
            .and_then(string_bytes)
            .map(|bytes| self.show_bytes(&font, bytes, &mut text))
            .unwrap_or(0.0);
        self.emit(op_index, text, advance);
    }

    fn show_array(&mut self, op_index: usize, operand: Option<&Object>) {
        let font = self.font();
        let Some(items) = operand.and_then(|o| o.as_array().ok()) else {
            return;
        };
        let mut text = String::new();
        let mut advance = 0.0;
        for item in items {
            if let Some(bytes) = string_bytes(item) {
                advance += self.show_bytes(&font, bytes, &mut text);
            } else if let Some(adjust) = object_to_f64(item) {
                advance -= adjust / 1000.0 * self.params.size * self.params.h_scale;
                if adjust < TJ_SPACE_THRESHOLD && !text.is_empty() && !text.ends_with(' ') {
                    text.push(' ');
                }
            }
        }
        self.emit(op_index, text, advance);
    }

    fn run(&mut self, operations: &[Operation]) {
        for (index, op) in operations.iter().enumerate() {
            let operands = &op.operands;
            match op.operator.as_str() {
                "q" => self.stack.push((self.ctm, self.params.clone())),
                "Q" => {
                    if let Some((ctm, params)) = self.stack.pop() {
                        self.ctm = ctm;
                        self.params = params;
                    }
                }
                "cm" => {
                    let m: Option<Vec<f64>> = (0..6).map(|i| number(operands, i)).collect();
                    if let Some(m) = m {
                        let matrix = Matrix::new(m[0], m[1], m[2], m[3], m[4], m[5]);
                        self.ctm = matrix.then(&self.ctm);
                    }
                }
                "BT" => {
                    self.text_matrix = Matrix::IDENTITY;
                    self.line_matrix = Matrix::IDENTITY;
                }
                "Tc" => self.params.char_spacing = number(operands, 0).unwrap_or(0.0),
                "Tw" => self.params.word_spacing = number(operands, 0).unwrap_or(0.0),
                "Tz" => self.params.h_scale = number(operands, 0).unwrap_or(100.0) / 100.0,
                "TL" => self.params.leading = number(operands, 0).unwrap_or(0.0),
                "Ts" => self.params.rise = number(operands, 0).unwrap_or(0.0),
                "Tf" => {
                    self.params.font = operands
                        .first()
                        .and_then(|o| o.as_name().ok())
                        .map(<[u8]>::to_vec);
                    self.params.size = number(operands, 1).unwrap_or(0.0);
                }
                "Td" => {
                    let tx = number(operands, 0).unwrap_or(0.0);
                    let ty = number(operands, 1).unwrap_or(0.0);
                    self.next_line(tx, ty);
                }
                "TD" => {
                    let tx = number(operands, 0).unwrap_or(0.0);
                    let ty = number(operands, 1).unwrap_or(0.0);
                    self.params.leading = -ty;
                    self.next_line(tx, ty);
                }
                "Tm" => {
                    let m: Option<Vec<f64>> = (0..6).map(|i| number(operands, i)).collect();
                    if let Some(m) = m {
                        self.line_matrix = Matrix::new(m[0], m[1], m[2], m[3], m[4], m[5]);
                        self.text_matrix = self.line_matrix;
                    }
                }
                "T*" => self.next_line(0.0, -self.params.leading),
                "Tj" => self.show_string(index, operands.first()),
                "TJ" => self.show_array(index, operands.first()),
                "'" => {
                    self.next_line(0.0, -self.params.leading);
                    self.show_string(index, operands.first());
                }
                "\"" => {
                    self.params.word_spacing = number(operands, 0).unwrap_or(0.0);
                    self.params.char_spacing = number(operands, 1).unwrap_or(0.0);
                    self.next_line(0.0, -self.params.leading);
                    self.show_string(index, operands.get(2));
                }
                _ => {}
            }
        }
    }
}

/// Interpret a page's operations and return its text-showing events in
/// content-stream order.
pub(crate) fn show_events(
    doc: &Document,
    operations: &[Operation],
    resources: Option<&Dictionary>,
    geometry: &PageGeometry,
) -> Vec<ShowEvent> {
    let fonts_dict = resources
        .and_then(|r| r.get(b"Font").ok())
        .map(|o| resolve(doc, o))
        .and_then(|o| o.as_dict().ok());

    let mut interpreter = Interpreter {
        doc,
        fonts_dict,
        fonts: HashMap::new(),
        geometry: *geometry,
        ctm: Matrix::IDENTITY,
        params: TextParams::default(),
        stack: Vec::new(),
        text_matrix: Matrix::IDENTITY,
        line_matrix: Matrix::IDENTITY,
        events: Vec::new(),
    };
    interpreter.run(operations);
    interpreter.events
}
