//! Paragraph and table styling.

use super::fonts::Font;

/// An sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(0xff, 0xff, 0xff);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` (the leading `#` is optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 || !digits.is_ascii() {
            return None;
        }
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&digits[range], 16).ok();
        Some(Self::rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    /// Components scaled to the `0.0..=1.0` range PDF operators expect.
    pub fn components(&self) -> [f32; 3] {
        [
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
        ]
    }
}

/// Horizontal alignment of a paragraph or an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
    /// Stretch every line but the last to the frame width.
    Justify,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParagraphStyle {
    pub font: Font,
    pub size: f32,
    pub leading: f32,
    pub color: Color,
    pub align: Align,
    pub space_before: f32,
    pub space_after: f32,
}

impl ParagraphStyle {
    /// Black, left-aligned text with a leading of 1.2 times the font size.
    pub fn new(font: Font, size: f32) -> Self {
        Self {
            font,
            size,
            leading: size * 1.2,
            color: Color::BLACK,
            align: Align::Left,
            space_before: 0.0,
            space_after: 0.0,
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn aligned(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    pub fn spaced(mut self, before: f32, after: f32) -> Self {
        self.space_before = before;
        self.space_after = after;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Padding {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Padding {
    pub const fn new(top: f32, right: f32, bottom: f32, left: f32) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }
}

/// A stroked line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rule {
    pub width: f32,
    pub color: Color,
}

impl Rule {
    pub const fn new(width: f32, color: Color) -> Self {
        Self { width, color }
    }
}

/// Styling of a key/value table: the first column holds the keys.
#[derive(Debug, Clone, PartialEq)]
pub struct TableStyle {
    pub key_font: Font,
    pub value_font: Font,
    pub size: f32,
    pub leading: f32,
    pub text_color: Color,
    pub padding: Padding,
    pub key_background: Option<Color>,
    pub grid: Option<Rule>,
    /// Rules drawn along the bottom edge of single cells, as `(row, column, rule)`.
    pub rules_below: Vec<(usize, usize, Rule)>,
}

impl TableStyle {
    pub fn new(key_font: Font, value_font: Font, size: f32) -> Self {
        Self {
            key_font,
            value_font,
            size,
            leading: size * 1.2,
            text_color: Color::BLACK,
            padding: Padding::default(),
            key_background: None,
            grid: None,
            rules_below: Vec::new(),
        }
    }

    pub fn font_for_column(&self, column: usize) -> Font {
        if column == 0 {
            self.key_font
        } else {
            self.value_font
        }
    }
}
