//! Content blocks placed on the page in story order.

use image::{ImageFormat, RgbImage};

use super::style::{Align, ParagraphStyle, TableStyle};

/// Decoded 8-bit RGB pixels, ready to be embedded as an image XObject.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

impl RasterImage {
    /// Decode a PNG.
    pub fn from_png(bytes: &[u8]) -> Result<Self, image::ImageError> {
        let decoded = image::load_from_memory_with_format(bytes, ImageFormat::Png)?;
        Ok(Self::from(decoded.to_rgb8()))
    }
}

impl From<RgbImage> for RasterImage {
    fn from(image: RgbImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            rgb: image.into_raw(),
        }
    }
}

/// An image scaled into a `width` by `height` point box.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBlock {
    pub image: RasterImage,
    pub width: f32,
    pub height: f32,
    pub align: Align,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub rows: Vec<Vec<String>>,
    pub col_widths: Vec<f32>,
    pub style: TableStyle,
}

impl Table {
    pub fn width(&self) -> f32 {
        self.col_widths.iter().sum()
    }

    /// Text of the cell at `row`, `column`, if present.
    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Flowable {
    Paragraph { text: String, style: ParagraphStyle },
    Spacer(f32),
    Table(Table),
    Image(ImageBlock),
}

impl Flowable {
    pub fn paragraph(text: impl Into<String>, style: ParagraphStyle) -> Self {
        Self::Paragraph {
            text: text.into(),
            style,
        }
    }

    pub fn image(image: RasterImage, width: f32, height: f32, align: Align) -> Self {
        Self::Image(ImageBlock {
            image,
            width,
            height,
            align,
        })
    }
}
