//! Flowable layout.
//!
//! Places a story top to bottom inside the frame of a [`PageTemplate`],
//! starting a new page whenever the next line, table row or image does not fit
//! in what is left of the current one.

use lopdf::content::Operation;
use lopdf::{Object, StringFormat};

use super::flowable::{Flowable, ImageBlock, RasterImage, Table};
use super::fonts::{encode_win_ansi, Font};
use super::style::{Align, Color, ParagraphStyle, Rule};

/// Helvetica's descender, as a fraction of the font size.
const DESCENT: f32 = 0.207;

/// A4 in points.
pub const A4: (f32, f32) = (595.2756, 841.8898);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageTemplate {
    pub width: f32,
    pub height: f32,
    pub margins: Margins,
}

impl PageTemplate {
    pub fn a4(margins: Margins) -> Self {
        Self {
            width: A4.0,
            height: A4.1,
            margins,
        }
    }

    pub fn frame_left(&self) -> f32 {
        self.margins.left
    }

    pub fn frame_width(&self) -> f32 {
        self.width - self.margins.left - self.margins.right
    }

    pub fn frame_top(&self) -> f32 {
        self.height - self.margins.top
    }

    pub fn frame_bottom(&self) -> f32 {
        self.margins.bottom
    }
}

/// Content operations of one page. Images are referenced as `Im<index>`
/// into [`Layout::images`].
#[derive(Debug, Default)]
pub struct LaidOutPage {
    pub operations: Vec<Operation>,
}

#[derive(Debug, Default)]
pub struct Layout {
    pub pages: Vec<LaidOutPage>,
    pub images: Vec<RasterImage>,
}

/// Resource name of the image at `index`.
pub fn image_resource_name(index: usize) -> String {
    format!("Im{index}")
}

/// Lay out `story` on as many pages of `template` as it needs.
pub fn lay_out(story: Vec<Flowable>, template: &PageTemplate) -> Layout {
    let mut frame = Frame::new(template);
    for flowable in story {
        match flowable {
            Flowable::Paragraph { text, style } => frame.paragraph(&text, &style),
            Flowable::Spacer(height) => frame.spacer(height),
            Flowable::Table(table) => frame.table(&table),
            Flowable::Image(block) => frame.image(block),
        }
    }
    frame.finish()
}

/// Greedy word wrap of whitespace-collapsed `text`.
///
/// A word wider than `max_width` on its own is broken between characters.
pub fn wrap_text(text: &str, font: Font, size: f32, max_width: f32) -> Vec<String> {
    let space = font.text_width(" ", size);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_width = 0.0;

    for word in text.split_whitespace() {
        let word_width = font.text_width(word, size);
        if !current.is_empty() && current_width + space + word_width <= max_width {
            current.push(' ');
            current.push_str(word);
            current_width += space + word_width;
            continue;
        }
        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if word_width <= max_width {
            current.push_str(word);
            current_width = word_width;
            continue;
        }

        let mut pieces = split_long_word(word, font, size, max_width);
        let last = pieces.pop().unwrap_or_default();
        lines.extend(pieces);
        current_width = font.text_width(&last, size);
        current = last;
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn split_long_word(word: &str, font: Font, size: f32, max_width: f32) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut piece = String::new();
    for ch in word.chars() {
        piece.push(ch);
        if piece.chars().count() > 1 && font.text_width(&piece, size) > max_width {
            piece.pop();
            pieces.push(std::mem::take(&mut piece));
            piece.push(ch);
        }
    }
    pieces.push(piece);
    pieces
}

/// Lines of a table cell: explicit newlines are kept, each line is wrapped.
fn cell_lines(text: &str, font: Font, size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    for raw_line in text.lines() {
        let wrapped = wrap_text(raw_line, font, size, max_width);
        if wrapped.is_empty() {
            lines.push(String::new());
        } else {
            lines.extend(wrapped);
        }
    }
    lines
}

fn real(value: f32) -> Object {
    Object::Real(value)
}

fn set_fill(operations: &mut Vec<Operation>, color: Color) {
    let [r, g, b] = color.components();
    operations.push(Operation::new("rg", vec![real(r), real(g), real(b)]));
}

fn stroke_line(operations: &mut Vec<Operation>, rule: Rule, from: (f32, f32), to: (f32, f32)) {
    let [r, g, b] = rule.color.components();
    operations.push(Operation::new("q", vec![]));
    operations.push(Operation::new("RG", vec![real(r), real(g), real(b)]));
    operations.push(Operation::new("w", vec![real(rule.width)]));
    operations.push(Operation::new("m", vec![real(from.0), real(from.1)]));
    operations.push(Operation::new("l", vec![real(to.0), real(to.1)]));
    operations.push(Operation::new("S", vec![]));
    operations.push(Operation::new("Q", vec![]));
}

struct TextRun<'a> {
    font: Font,
    size: f32,
    color: Color,
    word_spacing: f32,
    text: &'a str,
}

fn show_text(operations: &mut Vec<Operation>, run: TextRun<'_>, x: f32, baseline: f32) {
    operations.push(Operation::new("BT", vec![]));
    operations.push(Operation::new(
        "Tf",
        vec![
            Object::Name(run.font.resource_name().as_bytes().to_vec()),
            real(run.size),
        ],
    ));
    set_fill(operations, run.color);
    operations.push(Operation::new("Tw", vec![real(run.word_spacing)]));
    operations.push(Operation::new("Td", vec![real(x), real(baseline)]));
    operations.push(Operation::new(
        "Tj",
        vec![Object::String(
            encode_win_ansi(run.text),
            StringFormat::Literal,
        )],
    ));
    operations.push(Operation::new("ET", vec![]));
}

struct Frame<'a> {
    template: &'a PageTemplate,
    cursor: f32,
    current: Vec<Operation>,
    pages: Vec<LaidOutPage>,
    images: Vec<RasterImage>,
}

impl<'a> Frame<'a> {
    fn new(template: &'a PageTemplate) -> Self {
        Self {
            template,
            cursor: template.frame_top(),
            current: Vec::new(),
            pages: Vec::new(),
            images: Vec::new(),
        }
    }

    fn remaining(&self) -> f32 {
        self.cursor - self.template.frame_bottom()
    }

    fn at_top(&self) -> bool {
        self.cursor >= self.template.frame_top() - f32::EPSILON
    }

    fn new_page(&mut self) {
        let operations = std::mem::take(&mut self.current);
        self.pages.push(LaidOutPage { operations });
        self.cursor = self.template.frame_top();
    }

    /// Break the page unless `height` still fits. An image taller than a whole
    /// frame is placed at the top of a fresh page and allowed to overflow.
    fn reserve(&mut self, height: f32) {
        if height > self.remaining() && !self.at_top() {
            self.new_page();
        }
    }

    /// Move down, never past the bottom of the frame.
    fn advance(&mut self, height: f32) {
        self.cursor = (self.cursor - height).max(self.template.frame_bottom());
    }

    fn spacer(&mut self, height: f32) {
        if self.at_top() {
            return;
        }
        if height >= self.remaining() {
            self.new_page();
        } else {
            self.advance(height);
        }
    }

    fn paragraph(&mut self, text: &str, style: &ParagraphStyle) {
        let width = self.template.frame_width();
        let lines = wrap_text(text, style.font, style.size, width);
        if !self.at_top() {
            self.advance(style.space_before);
        }

        let last_index = lines.len().saturating_sub(1);
        for (index, line) in lines.iter().enumerate() {
            self.reserve(style.leading);
            let line_width = style.font.text_width(line, style.size);
            let spaces = line.matches(' ').count();
            let (offset, word_spacing) = match style.align {
                Align::Left => (0.0, 0.0),
                Align::Center => ((width - line_width) / 2.0, 0.0),
                Align::Right => (width - line_width, 0.0),
                Align::Justify if index < last_index && spaces > 0 => {
                    (0.0, (width - line_width) / spaces as f32)
                }
                Align::Justify => (0.0, 0.0),
            };
            let baseline = self.cursor - style.leading + DESCENT * style.size;
            show_text(
                &mut self.current,
                TextRun {
                    font: style.font,
                    size: style.size,
                    color: style.color,
                    word_spacing,
                    text: line,
                },
                self.template.frame_left() + offset.max(0.0),
                baseline,
            );
            self.cursor -= style.leading;
        }

        self.advance(style.space_after);
    }

    fn table(&mut self, table: &Table) {
        let style = &table.style;
        let left = self.template.frame_left()
            + ((self.template.frame_width() - table.width()) / 2.0).max(0.0);
        let padding = style.padding.top + style.padding.bottom;
        let frame_height = self.template.frame_top() - self.template.frame_bottom();

        for (row_index, row) in table.rows.iter().enumerate() {
            let cells: Vec<Vec<String>> = row
                .iter()
                .zip(&table.col_widths)
                .enumerate()
                .map(|(column, (text, column_width))| {
                    let inner = column_width - style.padding.left - style.padding.right;
                    cell_lines(text, style.font_for_column(column), style.size, inner)
                })
                .collect();
            let line_count = cells.iter().map(Vec::len).max().unwrap_or(0).max(1);
            let row_height = padding + line_count as f32 * style.leading;

            if row_height <= frame_height {
                self.reserve(row_height);
                let slices: Vec<&[String]> = cells.iter().map(Vec::as_slice).collect();
                self.table_row(table, left, row_index, &slices, line_count, true);
                continue;
            }

            // A row taller than a whole frame is split between its lines and
            // continued at the top of the following pages.
            let mut start = 0;
            while start < line_count {
                if !self.at_top() && self.remaining() < padding + style.leading {
                    self.new_page();
                }
                let fit = (((self.remaining() - padding) / style.leading).floor() as usize).max(1);
                let end = (start + fit).min(line_count);
                let slices: Vec<&[String]> = cells
                    .iter()
                    .map(|lines| &lines[start.min(lines.len())..end.min(lines.len())])
                    .collect();
                let last = end == line_count;
                self.table_row(table, left, row_index, &slices, end - start, last);
                if !last {
                    self.new_page();
                }
                start = end;
            }
        }
    }

    /// Draw one row, or one page's share of a split row, at the cursor.
    /// `rules_below` are only stroked under the final part of a row.
    fn table_row(
        &mut self,
        table: &Table,
        left: f32,
        row_index: usize,
        cells: &[&[String]],
        line_count: usize,
        last: bool,
    ) {
        let style = &table.style;
        let row_height =
            style.padding.top + line_count as f32 * style.leading + style.padding.bottom;
        let top = self.cursor;
        let bottom = top - row_height;

        if let (Some(background), Some(key_width)) =
            (style.key_background, table.col_widths.first())
        {
            set_fill(&mut self.current, background);
            self.current.push(Operation::new(
                "re",
                vec![real(left), real(bottom), real(*key_width), real(row_height)],
            ));
            self.current.push(Operation::new("f", vec![]));
        }

        let mut column_left = left;
        for (column, (lines, column_width)) in cells.iter().zip(&table.col_widths).enumerate() {
            // Vertically centred inside the padded cell.
            let block_height = lines.len() as f32 * style.leading;
            let inner_height = row_height - style.padding.top - style.padding.bottom;
            let block_top = top - style.padding.top - (inner_height - block_height) / 2.0;
            for (line_index, line) in lines.iter().enumerate() {
                if line.is_empty() {
                    continue;
                }
                let baseline =
                    block_top - (line_index + 1) as f32 * style.leading + DESCENT * style.size;
                show_text(
                    &mut self.current,
                    TextRun {
                        font: style.font_for_column(column),
                        size: style.size,
                        color: style.text_color,
                        word_spacing: 0.0,
                        text: line,
                    },
                    column_left + style.padding.left,
                    baseline,
                );
            }

            if last {
                for (rule_row, rule_column, rule) in &style.rules_below {
                    if *rule_row == row_index && *rule_column == column {
                        stroke_line(
                            &mut self.current,
                            *rule,
                            (column_left, bottom),
                            (column_left + column_width, bottom),
                        );
                    }
                }
            }
            column_left += column_width;
        }

        if let Some(grid) = style.grid {
            let right = left + table.width();
            stroke_line(&mut self.current, grid, (left, top), (right, top));
            stroke_line(&mut self.current, grid, (left, bottom), (right, bottom));
            let mut x = left;
            stroke_line(&mut self.current, grid, (x, top), (x, bottom));
            for column_width in &table.col_widths {
                x += column_width;
                stroke_line(&mut self.current, grid, (x, top), (x, bottom));
            }
        }

        self.cursor = bottom;
    }

    fn image(&mut self, block: ImageBlock) {
        self.reserve(block.height);
        let free = self.template.frame_width() - block.width;
        let offset = match block.align {
            Align::Left | Align::Justify => 0.0,
            Align::Center => free / 2.0,
            Align::Right => free,
        };
        let x = self.template.frame_left() + offset.max(0.0);
        let y = self.cursor - block.height;
        let name = image_resource_name(self.images.len());
        self.images.push(block.image);

        self.current.push(Operation::new("q", vec![]));
        self.current.push(Operation::new(
            "cm",
            vec![
                real(block.width),
                real(0.0),
                real(0.0),
                real(block.height),
                real(x),
                real(y),
            ],
        ));
        self.current
            .push(Operation::new("Do", vec![Object::Name(name.into_bytes())]));
        self.current.push(Operation::new("Q", vec![]));
        self.advance(block.height);
    }

    fn finish(mut self) -> Layout {
        if !self.current.is_empty() || self.pages.is_empty() {
            self.new_page();
        }
        Layout {
            pages: self.pages,
            images: self.images,
        }
    }
}
