//! Content stream interpretation
//!
//! Walks the decoded operations of a page once and records every shown
//! string as a [`TextSpan`] with its effective font size, boldness, fill
//! color and text-space origin. Text shown inside a marked-content sequence
//! carrying an `/MCID` is also collected per MCID so the structure tree can
//! be resolved back to text.

use std::collections::{BTreeMap, HashMap};

use lopdf::content::Operation;
use lopdf::Object;
use serde::{Deserialize, Serialize};

use crate::text::text_from_operand;

/// A run of text shown by one text-showing operator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSpan {
    pub text: String,
    /// Effective size in points
    pub font_size: f64,
    pub bold: bool,
    /// Fill color packed as `0xRRGGBB`
    pub color: u32,
    pub x: f64,
    pub y: f64,
}

impl TextSpan {
    pub fn new(text: impl Into<String>, font_size: f64) -> Self {
        Self {
            text: text.into(),
            font_size,
            bold: false,
            color: 0,
            x: 0.0,
            y: 0.0,
        }
    }

    pub fn with_bold(mut self, bold: bool) -> Self {
        self.bold = bold;
        self
    }

    pub fn with_color(mut self, color: u32) -> Self {
        self.color = color;
        self
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        self
    }
}

/// Page resources the interpreter needs to resolve names
#[derive(Debug, Default)]
pub(crate) struct ContentResources {
    /// Font resource name -> bold
    pub fonts: HashMap<Vec<u8>, bool>,
    /// Properties resource name -> MCID
    pub properties: HashMap<Vec<u8>, Option<u32>>,
}

/// Everything extracted from one page's content
#[derive(Debug, Default)]
pub(crate) struct PageText {
    pub spans: Vec<TextSpan>,
    pub marked_content: BTreeMap<u32, String>,
}

type Matrix = [f64; 6];

const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// Average glyph width as a fraction of the font size, used to advance the
/// pen between consecutive strings on a line
const APPROX_GLYPH_WIDTH: f64 = 0.5;

struct Interpreter<'a> {
    resources: &'a ContentResources,
    text_matrix: Matrix,
    line_matrix: Matrix,
    leading: f64,
    font_size: f64,
    bold: bool,
    fill: u32,
    fill_stack: Vec<u32>,
    marked: Vec<Option<u32>>,
    out: PageText,
}

pub(crate) fn interpret(operations: &[Operation], resources: &ContentResources) -> PageText {
    let mut interpreter = Interpreter {
        resources,
        text_matrix: IDENTITY,
        line_matrix: IDENTITY,
        leading: 0.0,
        font_size: 0.0,
        bold: false,
        fill: 0,
        fill_stack: Vec::new(),
        marked: Vec::new(),
        out: PageText::default(),
    };

    for op in operations {
        interpreter.apply(op);
    }

    interpreter.out
}

impl Interpreter<'_> {
    fn apply(&mut self, op: &Operation) {
        let operands = &op.operands;
        match op.operator.as_str() {
            "q" => self.fill_stack.push(self.fill),
            "Q" => {
                if let Some(fill) = self.fill_stack.pop() {
                    self.fill = fill;
                }
            }
            "BT" => {
                self.text_matrix = IDENTITY;
                self.line_matrix = IDENTITY;
            }
            "Tf" => {
                if let Some(Object::Name(name)) = operands.first() {
                    self.bold = self.resources.fonts.get(name).copied().unwrap_or(false);
                }
                if let Some(size) = operands.get(1).and_then(number) {
                    self.font_size = size;
                }
            }
            "TL" => {
                if let Some(leading) = operands.first().and_then(number) {
                    self.leading = leading;
                }
            }
            "Td" => {
                if let Some((tx, ty)) = pair(operands) {
                    self.move_line(tx, ty);
                }
            }
            "TD" => {
                if let Some((tx, ty)) = pair(operands) {
                    self.leading = -ty;
                    self.move_line(tx, ty);
                }
            }
            "T*" => self.move_line(0.0, -self.leading),
            "Tm" => {
                let values: Vec<f64> = operands.iter().filter_map(number).collect();
                if values.len() == 6 {
                    let matrix = [
                        values[0], values[1], values[2], values[3], values[4], values[5],
                    ];
                    self.text_matrix = matrix;
                    self.line_matrix = matrix;
                }
            }
            "Tj" | "TJ" => {
                if let Some(text) = operands.first().and_then(text_from_operand) {
                    self.show(text);
                }
            }
            "'" => {
                self.move_line(0.0, -self.leading);
                if let Some(text) = operands.first().and_then(text_from_operand) {
                    self.show(text);
                }
            }
            "\"" => {
                self.move_line(0.0, -self.leading);
                if let Some(text) = operands.get(2).and_then(text_from_operand) {
                    self.show(text);
                }
            }
            "g" => {
                if let Some(gray) = operands.first().and_then(number) {
                    self.fill = pack_rgb(gray, gray, gray);
                }
            }
            "rg" => self.fill_from_components(operands),
            "k" => self.fill_from_components(operands),
            "sc" | "scn" => self.fill_from_components(operands),
            "cs" => self.fill = 0,
            "BMC" => self.marked.push(None),
            "BDC" => {
                let mcid = match operands.get(1) {
                    Some(Object::Dictionary(props)) => props.get(b"MCID").ok().and_then(mcid_of),
                    Some(Object::Name(name)) => {
                        self.resources.properties.get(name).copied().flatten()
                    }
                    _ => None,
                };
                self.marked.push(mcid);
            }
            "EMC" => {
                self.marked.pop();
            }
            _ => {}
        }
    }

    fn move_line(&mut self, tx: f64, ty: f64) {
        let m = self.line_matrix;
        self.line_matrix = [
            m[0],
            m[1],
            m[2],
            m[3],
            m[4] + tx * m[0] + ty * m[2],
            m[5] + tx * m[1] + ty * m[3],
        ];
        self.text_matrix = self.line_matrix;
    }

    fn fill_from_components(&mut self, operands: &[Object]) {
        let values: Vec<f64> = operands.iter().filter_map(number).collect();
        self.fill = match values.as_slice() {
            [gray] => pack_rgb(*gray, *gray, *gray),
            [r, g, b] => pack_rgb(*r, *g, *b),
            [c, m, y, k] => pack_rgb(
                (1.0 - c) * (1.0 - k),
                (1.0 - m) * (1.0 - k),
                (1.0 - y) * (1.0 - k),
            ),
            _ => self.fill,
        };
    }

    fn show(&mut self, text: String) {
        let m = self.text_matrix;
        let scale = (m[1] * m[1] + m[3] * m[3]).sqrt();
        let size = if scale > 0.0 {
            self.font_size * scale
        } else {
            self.font_size
        };

        if let Some(mcid) = self.marked.iter().rev().find_map(|mcid| *mcid) {
            self.out
                .marked_content
                .entry(mcid)
                .or_default()
                .push_str(&text);
        }

        let advance = text.chars().count() as f64 * self.font_size * APPROX_GLYPH_WIDTH;
        self.out.spans.push(TextSpan {
            text,
            font_size: size,
            bold: self.bold,
            color: self.fill,
            x: m[4],
            y: m[5],
        });
        self.text_matrix[4] += advance * m[0];
        self.text_matrix[5] += advance * m[1];
    }
}

fn number(object: &Object) -> Option<f64> {
    match object {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

fn pair(operands: &[Object]) -> Option<(f64, f64)> {
    Some((number(operands.first()?)?, number(operands.get(1)?)?))
}

/// MCID value of a marked-content property; negative values are invalid
pub(crate) fn mcid_of(object: &Object) -> Option<u32> {
    match object {
        Object::Integer(i) => u32::try_from(*i).ok(),
        _ => None,
    }
}

/// Pack 0..1 color components into `0xRRGGBB`
pub fn pack_rgb(r: f64, g: f64, b: f64) -> u32 {
    let channel = |c: f64| (c.clamp(0.0, 1.0) * 255.0).round() as u32;
    (channel(r) << 16) | (channel(g) << 8) | channel(b)
}
