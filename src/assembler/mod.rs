//! Assembler module - turns an agreement into a finished PDF on disk.
//!
//! - `assets` - placeholder logo and verification QR code
//! - `story` - the ordered blocks of the agreement document
//! - `traits` - the `Generator` seam used by the session controller

pub mod assets;
pub mod story;
pub mod traits;

pub use story::{build_story, Story};
pub use traits::Generator;

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use thiserror::Error;

use crate::agreement::format::{default_output_dir, new_agreement_id, output_filename, today_long};
use crate::agreement::Agreement;
use crate::pdf::{render_story, DocumentInfo, Margins, PageTemplate, PdfError};

/// Errors that can occur while assembling an agreement.
#[derive(Debug, Error)]
pub enum AssemblerError {
    #[error("failed to create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to render agreement: {0}")]
    Render(#[from] PdfError),
    #[error("failed to write agreement to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Optional document parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssemblyOptions {
    pub include_logo: bool,
    pub include_qr: bool,
}

impl Default for AssemblyOptions {
    fn default() -> Self {
        Self {
            include_logo: true,
            include_qr: true,
        }
    }
}

/// Values fixed once per generation and shared by every block that prints them.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderContext {
    pub agreement_id: String,
    /// Long-form local date, e.g. "October 18, 2026".
    pub generated_at: String,
}

impl RenderContext {
    pub fn fresh() -> Self {
        Self {
            agreement_id: new_agreement_id(),
            generated_at: today_long(),
        }
    }
}

/// PDF bytes that have not been written anywhere yet.
#[derive(Debug)]
pub struct RenderedAgreement {
    pub pdf: Vec<u8>,
    pub agreement_id: String,
    pub warnings: Vec<String>,
}

/// Result of a successful assembly.
#[derive(Debug, Clone)]
pub struct AssembledAgreement {
    pub path: PathBuf,
    pub filename: String,
    pub agreement_id: String,
    pub warnings: Vec<String>,
}

/// Page template of every agreement: A4 with a deeper top margin.
pub fn agreement_template() -> PageTemplate {
    PageTemplate::a4(Margins {
        left: 72.0,
        right: 72.0,
        top: 100.0,
        bottom: 72.0,
    })
}

/// Builds agreement PDFs into one output directory.
#[derive(Debug, Clone)]
pub struct AgreementAssembler {
    output_dir: PathBuf,
    options: AssemblyOptions,
}

impl Default for AgreementAssembler {
    fn default() -> Self {
        Self::new(default_output_dir())
    }
}

impl AgreementAssembler {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            options: AssemblyOptions::default(),
        }
    }

    pub fn with_options(mut self, options: AssemblyOptions) -> Self {
        self.options = options;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn options(&self) -> AssemblyOptions {
        self.options
    }

    /// Render `agreement` in memory using the given context.
    pub fn render_with(
        &self,
        agreement: &Agreement,
        context: &RenderContext,
    ) -> Result<RenderedAgreement, AssemblerError> {
        let story = build_story(agreement, context, self.options);
        let info = DocumentInfo::new(format!("Client Service Agreement {}", context.agreement_id));
        let pdf = render_story(story.flowables, &agreement_template(), &info)?;

        Ok(RenderedAgreement {
            pdf,
            agreement_id: context.agreement_id.clone(),
            warnings: story.warnings,
        })
    }

    /// Render `agreement` in memory with a fresh identifier and today's date.
    pub fn render(&self, agreement: &Agreement) -> Result<RenderedAgreement, AssemblerError> {
        self.render_with(agreement, &RenderContext::fresh())
    }

    /// Write `agreement` to a freshly named file in the output directory.
    pub fn assemble(&self, agreement: &Agreement) -> Result<AssembledAgreement, AssemblerError> {
        let filename = output_filename(&Local::now());
        let path = self.output_dir.join(&filename);
        self.assemble_to(agreement, &path)
    }

    /// Write `agreement` to `path`, creating missing parent directories.
    pub fn assemble_to(
        &self,
        agreement: &Agreement,
        path: &Path,
    ) -> Result<AssembledAgreement, AssemblerError> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| AssemblerError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let rendered = self.render(agreement)?;
        fs::write(path, &rendered.pdf).map_err(|source| AssemblerError::Write {
            path: path.to_path_buf(),
            source,
        })?;

        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        log::info!(
            "Generated agreement {} at {} ({} bytes)",
            rendered.agreement_id,
            path.display(),
            rendered.pdf.len()
        );

        Ok(AssembledAgreement {
            path: path.to_path_buf(),
            filename,
            agreement_id: rendered.agreement_id,
            warnings: rendered.warnings,
        })
    }
}

impl Generator<Agreement> for AgreementAssembler {
    fn generate(&self, request: &Agreement) -> Result<AssembledAgreement, AssemblerError> {
        self.assemble(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agreement::format::is_agreement_id;
    use crate::agreement::SignatureSource;
    use lopdf::content::Content;
    use lopdf::{Document, Object};
    use std::io::Cursor;
    use tempfile::tempdir;

    fn contains(haystack: &[u8], needle: &str) -> bool {
        haystack
            .windows(needle.len())
            .any(|window| window == needle.as_bytes())
    }

    fn image_count(pdf: &[u8]) -> usize {
        let document = Document::load_mem(pdf).unwrap();
        document
            .objects
            .values()
            .filter(|object| match object {
                Object::Stream(stream) => matches!(
                    stream.dict.get(b"Subtype"),
                    Ok(Object::Name(name)) if name.as_slice() == b"Image"
                ),
                _ => false,
            })
            .count()
    }

    /// Baselines of every shown string, page by page.
    fn text_positions(pdf: &[u8]) -> Vec<(String, f32)> {
        let document = Document::load_mem(pdf).unwrap();
        let mut positions = Vec::new();
        for page_id in document.get_pages().values() {
            let content = Content::decode(&document.get_page_content(*page_id).unwrap()).unwrap();
            let mut baseline = None;
            for operation in content.operations {
                match operation.operator.as_str() {
                    "Td" => baseline = operation.operands.get(1).and_then(|y| y.as_float().ok()),
                    "Tj" => {
                        if let (Some(Object::String(bytes, _)), Some(y)) =
                            (operation.operands.first(), baseline)
                        {
                            positions.push((String::from_utf8_lossy(bytes).into_owned(), y));
                        }
                    }
                    _ => {}
                }
            }
        }
        positions
    }

    fn drawn_signature() -> SignatureSource {
        let canvas = image::RgbImage::from_pixel(400, 150, image::Rgb([255, 255, 255]));
        let mut png = Cursor::new(Vec::new());
        canvas.write_to(&mut png, image::ImageFormat::Png).unwrap();
        SignatureSource::Drawing(png.into_inner())
    }

    #[test]
    fn test_assemble_writes_file() {
        let dir = tempdir().unwrap();
        let assembler = AgreementAssembler::new(dir.path().join("client_agreements"));

        let assembled = assembler.assemble(&Agreement::sample()).unwrap();
        assert!(assembled.path.exists());
        assert!(fs::metadata(&assembled.path).unwrap().len() > 0);
        assert!(assembled.filename.starts_with("agreement_"));
        assert!(assembled.filename.ends_with(".pdf"));
        assert!(is_agreement_id(&assembled.agreement_id));
        assert!(assembled.warnings.is_empty());

        let bytes = fs::read(&assembled.path).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
    }

    #[test]
    fn test_sample_document_contents() {
        let assembler = AgreementAssembler::default();
        let rendered = assembler.render(&Agreement::sample()).unwrap();

        let document = Document::load_mem(&rendered.pdf).unwrap();
        assert!(!document.get_pages().is_empty());

        assert!(contains(&rendered.pdf, "(CLIENT SERVICE AGREEMENT) Tj"));
        assert!(contains(&rendered.pdf, "(Client Name:) Tj"));
        assert!(contains(&rendered.pdf, "(John Smith) Tj"));
        assert!(contains(&rendered.pdf, "(Agreement Amount:) Tj"));
        assert!(contains(&rendered.pdf, "($5,000.00) Tj"));
        assert!(contains(&rendered.pdf, "(Scan QR code for verification) Tj"));
    }

    #[test]
    fn test_consecutive_calls_are_distinct() {
        let dir = tempdir().unwrap();
        let assembler = AgreementAssembler::new(dir.path());

        let first = assembler.assemble(&Agreement::sample()).unwrap();
        let second = assembler.assemble(&Agreement::sample()).unwrap();
        assert_ne!(first.filename, second.filename);
        assert_ne!(first.agreement_id, second.agreement_id);
        assert!(first.path.exists() && second.path.exists());
    }

    #[test]
    fn test_one_identifier_per_call() {
        let context = RenderContext::fresh();
        let agreement = Agreement::sample();

        let story = build_story(&agreement, &context, AssemblyOptions::default());
        let details = story.tables().next().unwrap();
        assert_eq!(details.cell(4, 1), Some(context.agreement_id.as_str()));
        assert!(story::verification_text(&agreement, &context)
            .starts_with(&format!("Agreement ID: {}\n", context.agreement_id)));

        let rendered = AgreementAssembler::default()
            .render_with(&agreement, &context)
            .unwrap();
        assert_eq!(rendered.agreement_id, context.agreement_id);
        assert!(contains(&rendered.pdf, &format!("({}) Tj", context.agreement_id)));
    }

    #[test]
    fn test_signature_is_not_drawn() {
        let assembler = AgreementAssembler::default();
        let unsigned = assembler.render(&Agreement::sample()).unwrap();
        let signed = assembler
            .render(&Agreement::sample().with_signature(drawn_signature()))
            .unwrap();

        assert_eq!(image_count(&unsigned.pdf), 2);
        assert_eq!(image_count(&signed.pdf), image_count(&unsigned.pdf));
    }

    #[test]
    fn test_options_drop_images() {
        let assembler = AgreementAssembler::default().with_options(AssemblyOptions {
            include_logo: false,
            include_qr: true,
        });
        let rendered = assembler.render(&Agreement::sample()).unwrap();
        assert_eq!(image_count(&rendered.pdf), 1);
    }

    #[test]
    fn test_assemble_to_explicit_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sample_output").join("sample_agreement.pdf");

        let assembled = AgreementAssembler::default()
            .assemble_to(&Agreement::sample(), &path)
            .unwrap();
        assert_eq!(assembled.path, path);
        assert_eq!(assembled.filename, "sample_agreement.pdf");
        assert!(path.exists());
    }

    #[test]
    fn test_unwritable_output_dir() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("not_a_directory");
        fs::write(&blocker, b"occupied").unwrap();

        let assembler = AgreementAssembler::new(blocker.join("client_agreements"));
        let error = assembler.assemble(&Agreement::sample()).unwrap_err();
        assert!(matches!(error, AssemblerError::CreateDir { .. }));
    }

    #[test]
    fn test_long_terms_spill_onto_more_pages() {
        let mut agreement = Agreement::sample();
        agreement.notes_terms = "The consultant will deliver weekly reports. ".repeat(300);

        let rendered = AgreementAssembler::default().render(&agreement).unwrap();
        let document = Document::load_mem(&rendered.pdf).unwrap();
        assert!(document.get_pages().len() > 1);
    }

    #[test]
    fn test_long_address_is_kept_inside_the_margins() {
        let mut agreement = Agreement::sample();
        agreement.client_address = (0..80)
            .map(|index| format!("Line {index}"))
            .collect::<Vec<_>>()
            .join("\n");

        let rendered = AgreementAssembler::default().render(&agreement).unwrap();
        let template = agreement_template();
        let positions = text_positions(&rendered.pdf);
        assert!(positions.iter().all(|(_, y)| *y >= template.frame_bottom()));

        let address: Vec<&str> = positions
            .iter()
            .map(|(text, _)| text.as_str())
            .filter(|text| text.starts_with("Line "))
            .collect();
        assert_eq!(address.len(), 80);
        assert_eq!(address.first(), Some(&"Line 0"));
        assert_eq!(address.last(), Some(&"Line 79"));
        assert!(positions.iter().any(|(text, _)| text == "Scan QR code for verification"));
    }

    #[test]
    fn test_qr_failure_still_produces_the_document() {
        let mut agreement = Agreement::sample();
        agreement.client_name = "N".repeat(8000);

        let rendered = AgreementAssembler::default().render(&agreement).unwrap();
        assert_eq!(rendered.warnings.len(), 1);
        assert!(rendered.warnings[0].starts_with("Error adding QR code: "));
        assert!(rendered.warnings[0].contains("data too long"));

        assert!(rendered.pdf.starts_with(b"%PDF-"));
        assert_eq!(image_count(&rendered.pdf), 1);
        assert!(!contains(&rendered.pdf, "(Scan QR code for verification) Tj"));
        assert!(contains(&rendered.pdf, "(CLIENT SERVICE AGREEMENT) Tj"));
    }

    #[test]
    fn test_qr_failure_is_reported_by_assemble() {
        let dir = tempdir().unwrap();
        let mut agreement = Agreement::sample();
        agreement.client_name = "N".repeat(8000);

        let assembled = AgreementAssembler::new(dir.path()).assemble(&agreement).unwrap();
        assert!(assembled.path.exists());
        assert_eq!(assembled.warnings.len(), 1);
        assert!(assembled.warnings[0].starts_with("Error adding QR code: "));
    }
}
