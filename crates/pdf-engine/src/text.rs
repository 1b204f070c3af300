//! Positioned text extraction from page content streams
//!
//! Walks the text operators of a decoded content stream and reports each
//! shown string with its text rendering matrix. When the active font
//! carries a `/Widths` table the advance is measured from it; otherwise the
//! width is left unset and the pen advance is estimated.

use std::collections::HashMap;

use crate::viewport::Matrix;
use lopdf::content::Content;
use lopdf::Object;

/// Estimated advance per character, in text space units (em fraction)
const ESTIMATED_CHAR_ADVANCE: f32 = 0.5;

/// `TJ` adjustments below this (thousandths of an em) read as a word gap
const TJ_SPACE_THRESHOLD: f32 = -250.0;

/// One shown string on a page
#[derive(Debug, Clone, PartialEq)]
pub struct TextItem {
    /// Decoded string
    pub text: String,

    /// Text rendering matrix in PDF user space (font size folded in)
    pub transform: Matrix,

    /// Advance width in user space, when glyph metrics are known
    pub width: Option<f32>,

    /// Size operand of the active `Tf`
    pub font_size: f32,
}

/// Simple-font glyph widths, in thousandths of an em
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FontMetrics {
    pub first_char: u32,
    pub widths: Vec<f32>,
    pub missing_width: f32,
}

impl FontMetrics {
    /// Advance of `text` in em units. Each char is read as a one-byte code.
    pub fn advance(&self, text: &str) -> f32 {
        text.chars()
            .map(|c| {
                (c as u32)
                    .checked_sub(self.first_char)
                    .and_then(|i| self.widths.get(i as usize).copied())
                    .unwrap_or(self.missing_width)
            })
            .sum::<f32>()
            / 1000.0
    }
}

/// Page fonts keyed by resource name (`F1`)
pub type FontTable = HashMap<Vec<u8>, FontMetrics>;

#[derive(Debug, Clone)]
struct TextState {
    ctm: Matrix,
    text_matrix: Matrix,
    line_matrix: Matrix,
    font: Option<Vec<u8>>,
    font_size: f32,
    leading: f32,
    rise: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            ctm: Matrix::IDENTITY,
            text_matrix: Matrix::IDENTITY,
            line_matrix: Matrix::IDENTITY,
            font: None,
            font_size: 0.0,
            leading: 0.0,
            rise: 0.0,
        }
    }
}

impl TextState {
    fn move_line(&mut self, tx: f32, ty: f32) {
        self.line_matrix = self.line_matrix.multiply(&Matrix::translation(tx, ty));
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        self.move_line(0.0, -self.leading);
    }

    fn rendering_matrix(&self) -> Matrix {
        let font = Matrix::new(self.font_size, 0.0, 0.0, self.font_size, 0.0, self.rise);
        self.ctm.multiply(&self.text_matrix.multiply(&font))
    }

    fn show(&mut self, text: String, fonts: &FontTable, items: &mut Vec<TextItem>) {
        if text.is_empty() {
            return;
        }
        let measured = self
            .font
            .as_ref()
            .and_then(|name| fonts.get(name))
            .map(|metrics| metrics.advance(&text));
        let em_advance =
            measured.unwrap_or(text.chars().count() as f32 * ESTIMATED_CHAR_ADVANCE);
        let transform = self.rendering_matrix();
        items.push(TextItem {
            text,
            transform,
            width: measured.map(|em| em * transform.scale_factor()),
            font_size: self.font_size,
        });
        let advance = em_advance * self.font_size;
        self.text_matrix = self.text_matrix.multiply(&Matrix::translation(advance, 0.0));
    }
}

/// Extract text items from raw (already decompressed) content stream bytes.
pub fn extract_text_items(content: &[u8]) -> Result<Vec<TextItem>, lopdf::Error> {
    extract_text_items_with_fonts(content, &FontTable::new())
}

/// Like [`extract_text_items`], measuring widths with the page's fonts.
pub fn extract_text_items_with_fonts(
    content: &[u8],
    fonts: &FontTable,
) -> Result<Vec<TextItem>, lopdf::Error> {
    let content = Content::decode(content)?;
    let mut items = Vec::new();
    let mut state = TextState::default();
    let mut saved: Vec<Matrix> = Vec::new();

    for operation in &content.operations {
        let operands = &operation.operands;
        match operation.operator.as_str() {
            "q" => saved.push(state.ctm),
            "Q" => {
                if let Some(ctm) = saved.pop() {
                    state.ctm = ctm;
                }
            }
            "cm" => {
                if let Some(m) = matrix_operand(operands) {
                    state.ctm = state.ctm.multiply(&m);
                }
            }
            "BT" => {
                state.text_matrix = Matrix::IDENTITY;
                state.line_matrix = Matrix::IDENTITY;
            }
            "Tf" => {
                if let Some(Object::Name(name)) = operands.first() {
                    state.font = Some(name.clone());
                }
                if let Some(size) = operands.get(1).and_then(number) {
                    state.font_size = size;
                }
            }
            "TL" => {
                if let Some(leading) = operands.first().and_then(number) {
                    state.leading = leading;
                }
            }
            "Ts" => {
                if let Some(rise) = operands.first().and_then(number) {
                    state.rise = rise;
                }
            }
            "Td" | "TD" => {
                let tx = operands.first().and_then(number).unwrap_or(0.0);
                let ty = operands.get(1).and_then(number).unwrap_or(0.0);
                if operation.operator == "TD" {
                    state.leading = -ty;
                }
                state.move_line(tx, ty);
            }
            "Tm" => {
                if let Some(m) = matrix_operand(operands) {
                    state.line_matrix = m;
                    state.text_matrix = m;
                }
            }
            "T*" => state.next_line(),
            "Tj" => {
                if let Some(text) = operands.first().and_then(string_operand) {
                    state.show(text, fonts, &mut items);
                }
            }
            "'" => {
                state.next_line();
                if let Some(text) = operands.first().and_then(string_operand) {
                    state.show(text, fonts, &mut items);
                }
            }
            "\"" => {
                state.next_line();
                if let Some(text) = operands.get(2).and_then(string_operand) {
                    state.show(text, fonts, &mut items);
                }
            }
            "TJ" => {
                if let Some(Object::Array(parts)) = operands.first() {
                    state.show(join_tj_array(parts), fonts, &mut items);
                }
            }
            _ => {}
        }
    }

    Ok(items)
}

fn join_tj_array(parts: &[Object]) -> String {
    let mut text = String::new();
    for part in parts {
        match part {
            Object::String(bytes, _) => text.push_str(&decode_pdf_string(bytes)),
            other => {
                if let Some(adjust) = number(other) {
                    if adjust < TJ_SPACE_THRESHOLD && !text.ends_with(' ') {
                        text.push(' ');
                    }
                }
            }
        }
    }
    text
}

fn number(object: &Object) -> Option<f32> {
    object.as_float().ok()
}

fn matrix_operand(operands: &[Object]) -> Option<Matrix> {
    if operands.len() != 6 {
        return None;
    }
    let mut values = [0.0f32; 6];
    for (slot, operand) in values.iter_mut().zip(operands) {
        *slot = number(operand)?;
    }
    Some(Matrix::from(values))
}

fn string_operand(object: &Object) -> Option<String> {
    match object {
        Object::String(bytes, _) => Some(decode_pdf_string(bytes)),
        _ => None,
    }
}

/// UTF-16BE when BOM-prefixed, otherwise a byte-per-char Latin-1 reading.
fn decode_pdf_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    bytes.iter().map(|&b| b as char).collect()
}
