//! Serializes a [`Layout`] into a PDF document with lopdf.

use chrono::{DateTime, Local};
use lopdf::content::Content;
use lopdf::{dictionary, Dictionary, Document, Object, Stream};

use super::fonts::Font;
use super::layout::{image_resource_name, Layout, PageTemplate};
use super::PdfError;

/// Entries of the document information dictionary.
#[derive(Debug, Clone)]
pub struct DocumentInfo {
    pub title: String,
    pub producer: String,
    pub created_at: DateTime<Local>,
}

impl DocumentInfo {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            producer: concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION")).to_string(),
            created_at: Local::now(),
        }
    }
}

/// `D:YYYYMMDDHHmmSS+HH'mm'`
fn pdf_date(timestamp: &DateTime<Local>) -> String {
    let offset = timestamp.format("%z").to_string();
    let (hours, minutes) = offset.split_at(offset.len().saturating_sub(2));
    format!("D:{}{}'{}'", timestamp.format("%Y%m%d%H%M%S"), hours, minutes)
}

fn font_dictionary(font: Font) -> Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => font.base_font(),
        "Encoding" => "WinAnsiEncoding",
    }
}

/// Render `layout` into the bytes of a complete PDF file.
pub fn write_pdf(
    layout: Layout,
    template: &PageTemplate,
    info: &DocumentInfo,
) -> Result<Vec<u8>, PdfError> {
    let mut document = Document::with_version("1.5");
    let pages_id = document.new_object_id();

    let mut fonts = Dictionary::new();
    for font in Font::ALL {
        let font_id = document.add_object(font_dictionary(font));
        fonts.set(font.resource_name(), font_id);
    }

    let mut xobjects = Dictionary::new();
    for (index, image) in layout.images.into_iter().enumerate() {
        // Left compressible; `Document::compress` deflates it below.
        let stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => i64::from(image.width),
                "Height" => i64::from(image.height),
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8_i64,
            },
            image.rgb,
        );
        let image_id = document.add_object(stream);
        xobjects.set(image_resource_name(index), image_id);
    }

    let resources_id = document.add_object(dictionary! {
        "Font" => fonts,
        "XObject" => xobjects,
    });

    let mut kids = Vec::with_capacity(layout.pages.len());
    for page in layout.pages {
        let content = Content {
            operations: page.operations,
        };
        let encoded = content
            .encode()
            .map_err(|error| PdfError::EncodeContent(error.to_string()))?;
        // Page contents stay uncompressed so they remain inspectable.
        let content_id =
            document.add_object(Stream::new(Dictionary::new(), encoded).with_compression(false));
        let page_id = document.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    let page_count = kids.len() as i64;
    document.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(template.width),
                Object::Real(template.height),
            ],
        }),
    );

    let info_id = document.add_object(dictionary! {
        "Title" => Object::string_literal(info.title.as_str()),
        "Producer" => Object::string_literal(info.producer.as_str()),
        "CreationDate" => Object::string_literal(pdf_date(&info.created_at)),
    });
    let catalog_id = document.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    document.trailer.set("Root", catalog_id);
    document.trailer.set("Info", info_id);
    document.compress();

    let mut bytes = Vec::new();
    document
        .save_to(&mut bytes)
        .map_err(|error| PdfError::Save(error.to_string()))?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::flowable::{Flowable, RasterImage};
    use crate::pdf::layout::{lay_out, Margins};
    use crate::pdf::style::{Align, ParagraphStyle};
    use chrono::TimeZone;

    fn template() -> PageTemplate {
        PageTemplate::a4(Margins {
            left: 72.0,
            right: 72.0,
            top: 100.0,
            bottom: 72.0,
        })
    }

    #[test]
    fn test_pdf_date_format() {
        let timestamp = Local.with_ymd_and_hms(2026, 10, 18, 9, 5, 3).unwrap();
        let formatted = pdf_date(&timestamp);
        assert!(formatted.starts_with("D:20261018090503"));
        assert!(formatted.ends_with('\''));
    }

    #[test]
    fn test_written_pdf_reloads() {
        let story = vec![
            Flowable::image(
                RasterImage {
                    width: 2,
                    height: 2,
                    rgb: vec![255; 12],
                },
                72.0,
                72.0,
                Align::Center,
            ),
            Flowable::paragraph("Hello world", ParagraphStyle::new(Font::Helvetica, 11.0)),
        ];
        let layout = lay_out(story, &template());
        let bytes = write_pdf(layout, &template(), &DocumentInfo::new("Test")).unwrap();

        assert!(bytes.starts_with(b"%PDF-1.5"));
        let reloaded = Document::load_mem(&bytes).unwrap();
        assert_eq!(reloaded.get_pages().len(), 1);
        let haystack = String::from_utf8_lossy(&bytes);
        assert!(haystack.contains("(Hello world) Tj"));
    }
}
