//! Positioned text runs read from a page content stream.
//!
//! Only the text state needed for placement is tracked: the CTM (`q`/`Q`/`cm`),
//! the text and line matrices, font size and leading. Glyph widths are not
//! read from font programs; a run advances by half the font size per
//! character, which is close enough to separate table columns.

use lopdf::Object;
use lopdf::content::Operation;

/// Average glyph advance as a fraction of the font size.
const GLYPH_ADVANCE: f32 = 0.5;

/// `TJ` adjustments below this (thousandths of an em) count as a space.
const TJ_SPACE_THRESHOLD: f32 = -200.0;

/// A string shown at one position on the page.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    /// Left edge in user space.
    pub x: f32,
    /// Baseline in user space (grows upwards).
    pub y: f32,
    /// Estimated width in user space.
    pub width: f32,
    /// Effective font size in user space.
    pub size: f32,
    pub text: String,
}

impl TextRun {
    pub fn end(&self) -> f32 {
        self.x + self.width
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix([f32; 6]);

impl Matrix {
    const IDENTITY: Matrix = Matrix([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    fn translate(tx: f32, ty: f32) -> Self {
        Matrix([1.0, 0.0, 0.0, 1.0, tx, ty])
    }

    fn from_operands(operands: &[Object]) -> Option<Self> {
        let values: Vec<f32> = operands.iter().filter_map(number).collect();
        let values: [f32; 6] = values.try_into().ok()?;
        Some(Matrix(values))
    }

    /// `self × other`, i.e. apply `self` first.
    fn then(self, other: Matrix) -> Matrix {
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

    fn origin(self) -> (f32, f32) {
        (self.0[4], self.0[5])
    }

    fn scale(self) -> f32 {
        self.0[0].hypot(self.0[1])
    }
}

fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

/// UTF-16BE when marked with a BOM, otherwise one byte per character.
fn decode_string(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    bytes.iter().map(|&b| b as char).collect()
}

#[derive(Debug)]
struct TextState {
    ctm: Matrix,
    saved: Vec<Matrix>,
    tm: Matrix,
    tlm: Matrix,
    font_size: f32,
    leading: f32,
    runs: Vec<TextRun>,
}

impl TextState {
    fn new() -> Self {
        Self {
            ctm: Matrix::IDENTITY,
            saved: Vec::new(),
            tm: Matrix::IDENTITY,
            tlm: Matrix::IDENTITY,
            font_size: 0.0,
            leading: 0.0,
            runs: Vec::new(),
        }
    }

    fn move_line(&mut self, tx: f32, ty: f32) {
        self.tlm = Matrix::translate(tx, ty).then(self.tlm);
        self.tm = self.tlm;
    }

    fn next_line(&mut self) {
        self.move_line(0.0, -self.leading);
    }

    fn advance(&mut self, tx: f32) {
        self.tm = Matrix::translate(tx, 0.0).then(self.tm);
    }

    /// Show `parts`: strings advance by their estimated width, numbers are
    /// `TJ` adjustments.
    fn show(&mut self, parts: &[Object]) {
        let start = self.tm.then(self.ctm);
        let mut text = String::new();

        for part in parts {
            match part {
                Object::String(bytes, _) => {
                    let decoded = decode_string(bytes);
                    self.advance(decoded.chars().count() as f32 * self.font_size * GLYPH_ADVANCE);
                    text.push_str(&decoded);
                }
                other => {
                    if let Some(adjust) = number(other) {
                        if adjust < TJ_SPACE_THRESHOLD && !text.ends_with(' ') {
                            text.push(' ');
                        }
                        self.advance(-adjust / 1000.0 * self.font_size);
                    }
                }
            }
        }

        if text.trim().is_empty() {
            return;
        }
        let (x, y) = start.origin();
        let (end_x, _) = self.tm.then(self.ctm).origin();
        self.runs.push(TextRun {
            x,
            y,
            width: (end_x - x).abs(),
            size: self.font_size * start.scale(),
            text,
        });
    }

    fn apply(&mut self, op: &Operation) {
        let operands = op.operands.as_slice();
        let num = |i: usize| operands.get(i).and_then(number);

        match op.operator.as_str() {
            "q" => self.saved.push(self.ctm),
            "Q" => self.ctm = self.saved.pop().unwrap_or(Matrix::IDENTITY),
            "cm" => {
                if let Some(m) = Matrix::from_operands(operands) {
                    self.ctm = m.then(self.ctm);
                }
            }
            "BT" => {
                self.tm = Matrix::IDENTITY;
                self.tlm = Matrix::IDENTITY;
            }
            "Tf" => {
                if let Some(size) = num(1) {
                    self.font_size = size;
                }
            }
            "TL" => {
                if let Some(leading) = num(0) {
                    self.leading = leading;
                }
            }
            "Td" | "TD" => {
                if let (Some(tx), Some(ty)) = (num(0), num(1)) {
                    if op.operator == "TD" {
                        self.leading = -ty;
                    }
                    self.move_line(tx, ty);
                }
            }
            "T*" => self.next_line(),
            "Tm" => {
                if let Some(m) = Matrix::from_operands(operands) {
                    self.tm = m;
                    self.tlm = m;
                }
            }
            "Tj" => self.show(operands),
            "'" => {
                self.next_line();
                self.show(operands);
            }
            "\"" => {
                self.next_line();
                self.show(operands.get(2..).unwrap_or(&[]));
            }
            "TJ" => {
                if let Some(Object::Array(parts)) = operands.first() {
                    self.show(parts);
                }
            }
            _ => {}
        }
    }
}

/// Text runs of one decoded content stream, in drawing order.
pub fn text_runs(operations: &[Operation]) -> Vec<TextRun> {
    let mut state = TextState::new();
    for op in operations {
        state.apply(op);
    }
    state.runs
}
