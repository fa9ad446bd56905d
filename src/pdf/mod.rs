//! Page layout layer - flowables laid out on a page template and written with lopdf.
//!
//! This module knows nothing about agreements:
//! - `fonts` - standard-14 Helvetica metrics and WinAnsi encoding
//! - `style` - colors, paragraph and table styles
//! - `flowable` - the content blocks of a story
//! - `layout` - frame placement and page breaking
//! - `writer` - PDF object graph and serialization

pub mod flowable;
pub mod fonts;
pub mod layout;
pub mod style;
pub mod writer;

pub use flowable::{Flowable, ImageBlock, RasterImage, Table};
pub use fonts::Font;
pub use layout::{lay_out, Margins, PageTemplate};
pub use style::{Align, Color, Padding, ParagraphStyle, Rule, TableStyle};
pub use writer::{write_pdf, DocumentInfo};

use thiserror::Error;

/// Errors raised while turning a layout into PDF bytes.
#[derive(Debug, Error)]
pub enum PdfError {
    #[error("failed to encode page content: {0}")]
    EncodeContent(String),
    #[error("failed to serialize PDF document: {0}")]
    Save(String),
}

/// Lay out `story` on `template` and serialize the result.
pub fn render_story(
    story: Vec<Flowable>,
    template: &PageTemplate,
    info: &DocumentInfo,
) -> Result<Vec<u8>, PdfError> {
    write_pdf(lay_out(story, template), template, info)
}
