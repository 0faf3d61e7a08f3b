//! Engine that rebuilds reading order from glyph positions.
//!
//! The page content stream is walked with lopdf and every text-showing
//! operator becomes a span anchored at the current text-line origin, mapped
//! to page space through the text and graphics matrices. Spans are then
//! sorted top-to-bottom and left-to-right, spans sharing a line are joined
//! with a single space and lines are separated by a newline. A vertical gap
//! noticeably larger than the font size starts a new paragraph (blank line),
//! which the section patterns rely on.
//!
//! String operands are decoded with the font selected by `Tf`: ToUnicode
//! maps first (two-byte codes for composite fonts), then `Differences`
//! overrides and the font's base encoding, with WinAnsi as the last resort.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Encoding, Object, ObjectId};
use std::collections::BTreeMap;
use std::path::Path;

use super::{check_page, guard_panics, EngineError, PdfDocument, PdfEngine};

const ENGINE_ID: &str = "layout";

/// Line gap, in multiples of the font size, that starts a new paragraph
const PARAGRAPH_GAP: f32 = 1.6;

/// TJ adjustments below this (thousandths of an em) are rendered as a space
const WORD_GAP: f32 = -200.0;

/// Position-sorting engine built on lopdf content streams
#[derive(Debug, Clone, Default)]
pub struct LayoutEngine;

impl LayoutEngine {
    pub fn new() -> Self {
        Self
    }
}

impl PdfEngine for LayoutEngine {
    fn id(&self) -> &str {
        ENGINE_ID
    }

    fn name(&self) -> &str {
        "Layout (position sorted)"
    }

    fn open(&self, path: &Path) -> Result<Box<dyn PdfDocument>, EngineError> {
        let doc = guard_panics(ENGINE_ID, || {
            Document::load(path).map_err(|e| EngineError::Open(e.to_string()))
        })?;
        Ok(Box::new(LayoutDocument::new(doc)))
    }
}

struct LayoutDocument {
    doc: Document,
    page_ids: Vec<ObjectId>,
}

impl LayoutDocument {
    fn new(doc: Document) -> Self {
        let page_ids = doc.get_pages().values().copied().collect();
        Self { doc, page_ids }
    }
}

impl PdfDocument for LayoutDocument {
    fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    fn page_text(&self, index: usize) -> Result<String, EngineError> {
        check_page(index, self.page_ids.len())?;
        let page_id = self.page_ids[index];

        guard_panics(ENGINE_ID, || {
            let data = self
                .doc
                .get_page_content(page_id)
                .map_err(|e| EngineError::decode(index, e))?;
            let content = Content::decode(&data).map_err(|e| EngineError::decode(index, e))?;
            let fonts = page_fonts(&self.doc, page_id);
            Ok(render_spans(collect_spans(&content.operations, &fonts)))
        })
    }
}

/// Decoders for every font resource of a page, keyed by resource name
fn page_fonts(doc: &Document, page_id: ObjectId) -> BTreeMap<Vec<u8>, FontDecoder<'_>> {
    match doc.get_page_fonts(page_id) {
        Ok(fonts) => fonts
            .into_iter()
            .map(|(name, font)| (name, FontDecoder::new(doc, font)))
            .collect(),
        Err(e) => {
            tracing::debug!("No font resources for page {:?}: {}", page_id, e);
            BTreeMap::new()
        }
    }
}

/// Turns string operands shown with one font into text
struct FontDecoder<'a> {
    encoding: Option<Encoding<'a>>,
    two_byte: bool,
    differences: BTreeMap<u8, String>,
}

impl<'a> FontDecoder<'a> {
    fn new(doc: &'a Document, font: &'a Dictionary) -> Self {
        let two_byte = font.get(b"Subtype").and_then(Object::as_name).ok() == Some(&b"Type0"[..]);
        let encoding = if font.type_is(b"Font") {
            font.get_font_encoding(doc)
                .map_err(|e| tracing::debug!("Unsupported font encoding: {}", e))
                .ok()
        } else {
            None
        };

        Self {
            encoding,
            two_byte,
            differences: differences(doc, font),
        }
    }

    fn decode(&self, bytes: &[u8]) -> String {
        if self.two_byte {
            return self.decode_composite(bytes);
        }

        let mut out = String::new();
        for &byte in bytes {
            if let Some(text) = self.differences.get(&byte) {
                out.push_str(text);
                continue;
            }
            match &self.encoding {
                Some(Encoding::UnicodeMapEncoding(cmap)) => match cmap.get(byte as u16) {
                    Some(units) => out.push_str(&String::from_utf16_lossy(&units)),
                    None => out.push_str(&decode_win_ansi(&[byte])),
                },
                Some(Encoding::OneByteEncoding(table)) => match table[byte as usize] {
                    Some(unit) => out.push_str(&String::from_utf16_lossy(&[unit])),
                    None => out.push_str(&decode_win_ansi(&[byte])),
                },
                _ => out.push_str(&decode_win_ansi(&[byte])),
            }
        }
        out
    }

    /// Two-byte character codes; codes without a Unicode mapping are dropped
    fn decode_composite(&self, bytes: &[u8]) -> String {
        match &self.encoding {
            Some(Encoding::UnicodeMapEncoding(cmap)) => {
                let units: Vec<u16> = bytes
                    .chunks_exact(2)
                    .filter_map(|pair| cmap.get(u16::from_be_bytes([pair[0], pair[1]])))
                    .flatten()
                    .collect();
                String::from_utf16_lossy(&units)
            }
            Some(encoding) => encoding.bytes_to_string(bytes).unwrap_or_default(),
            None => String::new(),
        }
    }
}

/// Code to text overrides from an `/Encoding << /Differences [...] >>` dictionary
fn differences(doc: &Document, font: &Dictionary) -> BTreeMap<u8, String> {
    let mut table = BTreeMap::new();
    let Ok(entries) = font
        .get_deref(b"Encoding", doc)
        .and_then(Object::as_dict)
        .and_then(|encoding| encoding.get(b"Differences"))
        .and_then(Object::as_array)
    else {
        return table;
    };

    let mut code: Option<u8> = None;
    for entry in entries {
        match entry {
            Object::Integer(start) => code = u8::try_from(*start).ok(),
            Object::Name(name) => {
                if let Some(current) = code {
                    if let Some(text) = glyph_text(&String::from_utf8_lossy(name)) {
                        table.insert(current, text);
                    }
                    code = current.checked_add(1);
                }
            }
            _ => {}
        }
    }
    table
}

/// Text for a glyph name (`A`, `uni00E9`, `fi`, `endash`, ...)
fn glyph_text(name: &str) -> Option<String> {
    // Variant suffixes ("a.sc", "one.oldstyle") name the same character
    let name = name.split('.').next().filter(|base| !base.is_empty())?;

    if name.len() == 1 && name.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Some(name.to_string());
    }
    if let Some(hex) = name.strip_prefix("uni") {
        if hex.is_ascii() && hex.len() % 4 == 0 && !hex.is_empty() {
            let units: Option<Vec<u16>> = (0..hex.len())
                .step_by(4)
                .map(|i| u16::from_str_radix(&hex[i..i + 4], 16).ok())
                .collect();
            return units.map(|units| String::from_utf16_lossy(&units));
        }
    }
    if let Some(hex) = name.strip_prefix('u') {
        if (4..=6).contains(&hex.len()) {
            if let Some(c) = u32::from_str_radix(hex, 16).ok().and_then(char::from_u32) {
                return Some(c.to_string());
            }
        }
    }

    let text = match name {
        "space" | "nbspace" => " ",
        "zero" => "0",
        "one" => "1",
        "two" => "2",
        "three" => "3",
        "four" => "4",
        "five" => "5",
        "six" => "6",
        "seven" => "7",
        "eight" => "8",
        "nine" => "9",
        "period" => ".",
        "comma" => ",",
        "colon" => ":",
        "semicolon" => ";",
        "hyphen" | "minus" => "-",
        "endash" => "–",
        "emdash" => "—",
        "exclam" => "!",
        "question" => "?",
        "parenleft" => "(",
        "parenright" => ")",
        "bracketleft" => "[",
        "bracketright" => "]",
        "slash" => "/",
        "quotesingle" => "'",
        "quoteright" => "’",
        "quoteleft" => "‘",
        "quotedbl" => "\"",
        "quotedblleft" => "“",
        "quotedblright" => "”",
        "percent" => "%",
        "ampersand" => "&",
        "plus" => "+",
        "equal" => "=",
        "asterisk" => "*",
        "bullet" => "•",
        "fi" => "fi",
        "fl" => "fl",
        "ff" => "ff",
        "ffi" => "ffi",
        "ffl" => "ffl",
        _ => return None,
    };
    Some(text.to_string())
}

/// Affine transform `[a b c d e f]` as used by `cm` and `Tm`
#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix([f32; 6]);

impl Matrix {
    const IDENTITY: Matrix = Matrix([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    fn translate(tx: f32, ty: f32) -> Self {
        Matrix([1.0, 0.0, 0.0, 1.0, tx, ty])
    }

    fn from_operands(operands: &[Object]) -> Option<Self> {
        let mut values = [0.0; 6];
        for (slot, operand) in values.iter_mut().zip(operands) {
            *slot = number(operand)?;
        }
        (operands.len() >= 6).then_some(Matrix(values))
    }

    /// `self` applied first, then `other`
    fn then(&self, other: &Matrix) -> Matrix {
        let [a, b, c, d, e, f] = self.0;
        let [a2, b2, c2, d2, e2, f2] = other.0;
        Matrix([
            a * a2 + b * c2,
            a * b2 + b * d2,
            c * a2 + d * c2,
            c * b2 + d * d2,
            e * a2 + f * c2 + e2,
            e * b2 + f * d2 + f2,
        ])
    }

    fn origin(&self) -> (f32, f32) {
        (self.0[4], self.0[5])
    }

    fn vertical_scale(&self) -> f32 {
        self.0[2].hypot(self.0[3])
    }
}

/// A run of text anchored at a text-line origin, in page space
#[derive(Debug, Clone, PartialEq)]
struct Span {
    x: f32,
    y: f32,
    size: f32,
    text: String,
}

/// Graphics and text state tracked while walking a content stream
#[derive(Debug)]
struct TextState {
    ctm: Matrix,
    saved: Vec<Matrix>,
    text_matrix: Matrix,
    line_matrix: Matrix,
    leading: f32,
    size: f32,
    font: Option<Vec<u8>>,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            ctm: Matrix::IDENTITY,
            saved: Vec::new(),
            text_matrix: Matrix::IDENTITY,
            line_matrix: Matrix::IDENTITY,
            leading: 0.0,
            size: 0.0,
            font: None,
        }
    }
}

impl TextState {
    fn move_line(&mut self, tx: f32, ty: f32) {
        self.line_matrix = Matrix::translate(tx, ty).then(&self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        self.move_line(0.0, -self.leading);
    }

    fn span(&self, text: String) -> Span {
        let placed = self.text_matrix.then(&self.ctm);
        let (x, y) = placed.origin();
        Span {
            x,
            y,
            size: self.size * placed.vertical_scale(),
            text,
        }
    }
}

fn collect_spans(
    operations: &[Operation],
    fonts: &BTreeMap<Vec<u8>, FontDecoder<'_>>,
) -> Vec<Span> {
    let mut state = TextState::default();
    let mut spans = Vec::new();

    for op in operations {
        let operands = &op.operands;
        let decoder = state.font.as_ref().and_then(|name| fonts.get(name));
        match op.operator.as_str() {
            "q" => state.saved.push(state.ctm),
            "Q" => {
                if let Some(ctm) = state.saved.pop() {
                    state.ctm = ctm;
                }
            }
            "cm" => {
                if let Some(matrix) = Matrix::from_operands(operands) {
                    state.ctm = matrix.then(&state.ctm);
                }
            }
            "BT" => {
                state.text_matrix = Matrix::IDENTITY;
                state.line_matrix = Matrix::IDENTITY;
            }
            "Tf" => {
                state.font = operands.first().and_then(|o| o.as_name().ok()).map(<[u8]>::to_vec);
                if let Some(size) = operands.get(1).and_then(number) {
                    state.size = size.abs();
                }
            }
            "TL" => {
                if let Some(leading) = operands.first().and_then(number) {
                    state.leading = leading;
                }
            }
            "Td" | "TD" => {
                let tx = operands.first().and_then(number).unwrap_or(0.0);
                let ty = operands.get(1).and_then(number).unwrap_or(0.0);
                if op.operator == "TD" {
                    state.leading = -ty;
                }
                state.move_line(tx, ty);
            }
            "Tm" => {
                if let Some(matrix) = Matrix::from_operands(operands) {
                    state.text_matrix = matrix;
                    state.line_matrix = matrix;
                }
            }
            "T*" => state.next_line(),
            "Tj" | "TJ" => {
                push_span(&mut spans, &state, operands.first().map(|o| show_text(o, decoder)));
            }
            "'" => {
                state.next_line();
                push_span(&mut spans, &state, operands.first().map(|o| show_text(o, decoder)));
            }
            "\"" => {
                state.next_line();
                push_span(&mut spans, &state, operands.get(2).map(|o| show_text(o, decoder)));
            }
            _ => {}
        }
    }

    spans
}

fn push_span(spans: &mut Vec<Span>, state: &TextState, text: Option<String>) {
    let Some(text) = text else { return };
    if text.is_empty() {
        return;
    }
    spans.push(state.span(text));
}

/// Decode the operand of a text-showing operator (string or TJ array)
fn show_text(object: &Object, font: Option<&FontDecoder<'_>>) -> String {
    let decode = |bytes: &[u8]| match font {
        Some(font) => font.decode(bytes),
        None => decode_bytes(bytes),
    };

    match object {
        Object::String(bytes, _) => decode(bytes),
        Object::Array(items) => {
            let mut out = String::new();
            for item in items {
                match item {
                    Object::String(bytes, _) => out.push_str(&decode(bytes)),
                    other => {
                        if number(other).is_some_and(|n| n < WORD_GAP) && !out.ends_with(' ') {
                            out.push(' ');
                        }
                    }
                }
            }
            out
        }
        _ => String::new(),
    }
}

/// Decode a string shown with an unknown font: UTF-16BE with a byte-order mark, else WinAnsi
fn decode_bytes(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let (text, _) = encoding_rs::UTF_16BE.decode_without_bom_handling(rest);
        text.into_owned()
    } else {
        decode_win_ansi(bytes)
    }
}

fn decode_win_ansi(bytes: &[u8]) -> String {
    let (text, _) = encoding_rs::WINDOWS_1252.decode_without_bom_handling(bytes);
    text.into_owned()
}

fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

/// Sort key in whole units: rows top-down (PDF y grows upwards), then columns
fn sort_key(span: &Span) -> (i64, i64) {
    (-(span.y.ceil() as i64), span.x.ceil() as i64)
}

fn render_spans(mut spans: Vec<Span>) -> String {
    // Stable sort keeps content-stream order for spans at the same origin
    spans.sort_by_key(sort_key);

    let mut out = String::new();
    let mut current_row: Option<i64> = None;
    let mut previous_y = 0.0_f32;

    for span in &spans {
        let row = sort_key(span).0;
        match current_row {
            Some(r) if r == row => {
                if !out.ends_with(' ') && !span.text.starts_with(' ') {
                    out.push(' ');
                }
            }
            Some(_) => {
                out.push('\n');
                let gap = previous_y - span.y;
                if gap > PARAGRAPH_GAP * span.size.max(1.0) {
                    out.push('\n');
                }
            }
            None => {}
        }
        out.push_str(&span.text);
        current_row = Some(row);
        previous_y = span.y;
    }

    if !out.is_empty() {
        out.push('\n');
    }
    out
}
