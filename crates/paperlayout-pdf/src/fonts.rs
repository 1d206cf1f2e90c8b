//! Font metrics and text decoding for the span interpreter.
//!
//! Only what is needed to place and decode shown strings: glyph widths
//! (`/Widths` for simple fonts, `/W` for composite fonts), the code width
//! (one or two bytes) and a `/ToUnicode` map when the font has one.

use std::collections::HashMap;

use encoding_rs::WINDOWS_1252;
use lopdf::{Dictionary, Document, Object};

/// Width used for glyphs without metrics, in thousandths of an em.
const FALLBACK_WIDTH: f64 = 500.0;

/// Dereference an indirect object, returning the object itself otherwise.
pub(crate) fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

/// Convert a lopdf numeric object (Integer or Real) to f64.
pub(crate) fn object_to_f64(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(f) => Some(*f as f64),
        _ => None,
    }
}

/// Character code → Unicode mapping parsed from a `/ToUnicode` CMap.
#[derive(Debug, Clone, Default)]
pub(crate) struct ToUnicodeMap {
    mappings: HashMap<u32, String>,
}

fn hex_code(token: &str) -> Option<u32> {
    u32::from_str_radix(token, 16).ok()
}

fn utf16_hex(token: &str) -> Option<String> {
    let padded = if token.len() % 4 == 2 {
        format!("00{token}")
    } else {
        token.to_string()
    };
    let units: Option<Vec<u16>> = padded
        .as_bytes()
        .chunks(4)
        .map(|chunk| {
            std::str::from_utf8(chunk)
                .ok()
                .and_then(|s| u16::from_str_radix(s, 16).ok())
        })
        .collect();
    String::from_utf16(&units?).ok()
}

#[derive(Debug, PartialEq)]
enum Token<'a> {
    Hex(&'a str),
    Open,
    Close,
    Word(&'a str),
}

fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut rest = text;
    while let Some(ch) = rest.chars().next() {
        match ch {
            '<' => {
                let end = rest.find('>').unwrap_or(rest.len());
                tokens.push(Token::Hex(rest[1..end].trim()));
                rest = rest.get(end + 1..).unwrap_or("");
            }
            '[' => {
                tokens.push(Token::Open);
                rest = &rest[1..];
            }
            ']' => {
                tokens.push(Token::Close);
                rest = &rest[1..];
            }
            c if c.is_whitespace() => rest = &rest[c.len_utf8()..],
            _ => {
                let end = rest
                    .find(|c: char| c.is_whitespace() || matches!(c, '<' | '[' | ']'))
                    .unwrap_or(rest.len());
                tokens.push(Token::Word(&rest[..end]));
                rest = &rest[end..];
            }
        }
    }
    tokens
}

impl ToUnicodeMap {
    /// Parse the `bfchar` and `bfrange` sections of a CMap stream.
    pub(crate) fn parse(data: &[u8]) -> Self {
        let text = String::from_utf8_lossy(data);
        let tokens = tokenize(&text);
        let mut mappings = HashMap::new();
        let mut i = 0;
        let mut section: Option<&str> = None;

        while i < tokens.len() {
            match (&tokens[i], section) {
                (Token::Word(w), _) if *w == "beginbfchar" || *w == "beginbfrange" => {
                    section = Some(if *w == "beginbfchar" { "char" } else { "range" });
                    i += 1;
                }
                (Token::Word(w), _) if w.starts_with("endbf") => {
                    section = None;
                    i += 1;
                }
                (Token::Hex(src), Some("char")) => {
                    if let (Some(code), Some(Token::Hex(dst))) = (hex_code(src), tokens.get(i + 1))
                    {
                        if let Some(s) = utf16_hex(dst) {
                            mappings.insert(code, s);
                        }
                    }
                    i += 2;
                }
                (Token::Hex(lo), Some("range")) => {
                    let hi = match tokens.get(i + 1) {
                        Some(Token::Hex(hi)) => hex_code(hi),
                        _ => None,
                    };
                    let (Some(lo), Some(hi)) = (hex_code(lo), hi) else {
                        i += 1;
                        continue;
                    };
                    match tokens.get(i + 2) {
                        Some(Token::Hex(dst)) => {
                            let start = hex_code(dst).unwrap_or(0);
                            for offset in 0..=hi.saturating_sub(lo) {
                                if let Some(ch) = char::from_u32(start + offset) {
                                    mappings.insert(lo + offset, ch.to_string());
                                }
                            }
                            i += 3;
                        }
                        Some(Token::Open) => {
                            let mut j = i + 3;
                            let mut code = lo;
                            while let Some(Token::Hex(dst)) = tokens.get(j) {
                                if code <= hi {
                                    if let Some(s) = utf16_hex(dst) {
                                        mappings.insert(code, s);
                                    }
                                }
                                code += 1;
                                j += 1;
                            }
                            i = j + 1;
                        }
                        _ => i += 2,
                    }
                }
                _ => i += 1,
            }
        }

        Self { mappings }
    }

    pub(crate) fn get(&self, code: u32) -> Option<&str> {
        self.mappings.get(&code).map(String::as_str)
    }
}

/// Metrics and decoding information for one font resource.
#[derive(Debug, Clone)]
pub(crate) struct FontInfo {
    two_byte: bool,
    first_char: u32,
    widths: Vec<f64>,
    cid_widths: HashMap<u32, f64>,
    default_width: f64,
    to_unicode: Option<ToUnicodeMap>,
}

impl Default for FontInfo {
    fn default() -> Self {
        Self {
            two_byte: false,
            first_char: 0,
            widths: Vec::new(),
            cid_widths: HashMap::new(),
            default_width: FALLBACK_WIDTH,
            to_unicode: None,
        }
    }
}

fn number_array(doc: &Document, obj: Option<&Object>) -> Vec<f64> {
    obj.map(|o| resolve(doc, o))
        .and_then(|o| o.as_array().ok())
        .map(|arr| {
            arr.iter()
                .map(|o| object_to_f64(resolve(doc, o)).unwrap_or(0.0))
                .collect()
        })
        .unwrap_or_default()
}

/// Parse a composite font `/W` array: `c [w1 w2 ...]` or `c_first c_last w`.
fn parse_cid_widths(doc: &Document, array: &[Object]) -> HashMap<u32, f64> {
    let mut widths = HashMap::new();
    let mut i = 0;
    while i < array.len() {
        let Some(first) = object_to_f64(resolve(doc, &array[i])) else {
            i += 1;
            continue;
        };
        let first = first as u32;
        match array.get(i + 1).map(|o| resolve(doc, o)) {
            Some(Object::Array(list)) => {
                for (offset, w) in list.iter().enumerate() {
                    if let Some(w) = object_to_f64(resolve(doc, w)) {
                        widths.insert(first + offset as u32, w);
                    }
                }
                i += 2;
            }
            Some(last) => {
                let last = object_to_f64(last).unwrap_or(first as f64) as u32;
                if let Some(w) = array.get(i + 2).and_then(|o| object_to_f64(resolve(doc, o))) {
                    for code in first..=last {
                        widths.insert(code, w);
                    }
                }
                i += 3;
            }
            None => break,
        }
    }
    widths
}

impl FontInfo {
    /// Load metrics from a font dictionary.
    pub(crate) fn load(doc: &Document, font: &Dictionary) -> Self {
        let mut info = FontInfo::default();

        let subtype = font.get(b"Subtype").ok().and_then(|o| o.as_name().ok());
        if subtype == Some(b"Type0".as_slice()) {
            info.two_byte = true;
            info.default_width = 1000.0;
            let descendant = font
                .get(b"DescendantFonts")
                .ok()
                .map(|o| resolve(doc, o))
                .and_then(|o| o.as_array().ok())
                .and_then(|arr| arr.first())
                .map(|o| resolve(doc, o))
                .and_then(|o| o.as_dict().ok());
            if let Some(cid_font) = descendant {
                if let Some(dw) = cid_font.get(b"DW").ok().and_then(object_to_f64) {
                    info.default_width = dw;
                }
                if let Some(w) = cid_font
                    .get(b"W")
                    .ok()
                    .map(|o| resolve(doc, o))
                    .and_then(|o| o.as_array().ok())
                {
                    info.cid_widths = parse_cid_widths(doc, w);
                }
            }
        } else {
            info.first_char = font
                .get(b"FirstChar")
                .ok()
                .and_then(object_to_f64)
                .unwrap_or(0.0) as u32;
            info.widths = number_array(doc, font.get(b"Widths").ok());
            if let Some(missing) = font
                .get(b"FontDescriptor")
                .ok()
                .map(|o| resolve(doc, o))
                .and_then(|o| o.as_dict().ok())
                .and_then(|d| d.get(b"MissingWidth").ok())
                .and_then(object_to_f64)
                .filter(|w| *w > 0.0)
            {
                info.default_width = missing;
            }
        }

        info.to_unicode = font
            .get(b"ToUnicode")
            .ok()
            .map(|o| resolve(doc, o))
            .and_then(|o| o.as_stream().ok())
            .and_then(|s| s.decompressed_content().ok().or_else(|| Some(s.content.clone())))
            .map(|data| ToUnicodeMap::parse(&data));

        info
    }

    pub(crate) fn is_two_byte(&self) -> bool {
        self.two_byte
    }

    /// Split a shown string into character codes.
    pub(crate) fn codes(&self, bytes: &[u8]) -> Vec<u32> {
        if self.two_byte {
            bytes
                .chunks(2)
                .map(|pair| match pair {
                    [hi, lo] => (u32::from(*hi) << 8) | u32::from(*lo),
                    [single] => u32::from(*single),
                    _ => 0,
                })
                .collect()
        } else {
            bytes.iter().map(|b| u32::from(*b)).collect()
        }
    }

    /// Glyph width in thousandths of an em.
    pub(crate) fn width(&self, code: u32) -> f64 {
        if self.two_byte {
            return self.cid_widths.get(&code).copied().unwrap_or(self.default_width);
        }
        code.checked_sub(self.first_char)
            .and_then(|i| self.widths.get(i as usize))
            .copied()
            .filter(|w| *w > 0.0)
            .unwrap_or(self.default_width)
    }

    /// Unicode text for one character code.
    pub(crate) fn decode(&self, code: u32) -> String {
        if let Some(s) = self.to_unicode.as_ref().and_then(|m| m.get(code)) {
            return s.to_string();
        }
        if self.two_byte {
            return char::from_u32(code)
                .filter(|c| !c.is_control())
                .map(String::from)
                .unwrap_or_else(|| "\u{FFFD}".to_string());
        }
        let byte = [code as u8];
        let (text, _, _) = WINDOWS_1252.decode(&byte);
        text.into_owned()
    }
}
