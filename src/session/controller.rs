//! Session state and the pure transitions applied to it by the handlers.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::agreement::{Agreement, SampleData, ValidationErrors, Validator};
use crate::assembler::{AssemblerError, Generator};

pub const PDF_MIME: &str = "application/pdf";

/// Per-session values that survive between requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SessionState {
    /// Successful generations in this session.
    pub pdf_count: u64,
    /// Set once "Load Sample Data" has been used.
    pub sample: Option<SampleData>,
}

impl SessionState {
    /// Store the sample fixture, replacing whatever was there.
    pub fn load_sample(self) -> Self {
        Self {
            sample: Some(SampleData::fixture()),
            ..self
        }
    }

    pub fn record_generation(self) -> Self {
        Self {
            pdf_count: self.pdf_count + 1,
            ..self
        }
    }

    /// Initial form values: the loaded sample, or empty fields.
    pub fn form_defaults(&self) -> FormDefaults {
        match &self.sample {
            Some(sample) => FormDefaults {
                client_name: sample.client_name.clone(),
                client_address: sample.client_address.clone(),
                agreement_amount: sample.agreement_amount,
                notes_terms: sample.notes_terms.clone(),
            },
            None => FormDefaults::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormDefaults {
    pub client_name: String,
    pub client_address: String,
    pub agreement_amount: f64,
    pub notes_terms: String,
}

/// Whether the generate action is available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormStatus {
    Complete,
    Incomplete,
}

impl FormStatus {
    pub fn of(agreement: &Agreement) -> Self {
        if agreement.is_valid() {
            Self::Complete
        } else {
            Self::Incomplete
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::Complete => "All required fields completed",
            Self::Incomplete => "Please fill in all required fields marked with *",
        }
    }
}

/// A generated agreement ready to hand to the browser.
#[derive(Debug, Clone)]
pub struct DownloadablePdf {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub agreement_id: String,
    pub warnings: Vec<String>,
}

impl DownloadablePdf {
    pub fn mime(&self) -> &'static str {
        PDF_MIME
    }

    /// Size in kilobytes with one decimal, e.g. "3.4".
    pub fn size_kb(&self) -> String {
        format!("{:.1}", self.bytes.len() as f64 / 1024.0)
    }
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("invalid agreement: {0}")]
    Invalid(#[from] ValidationErrors),
    #[error(transparent)]
    Assembly(#[from] AssemblerError),
    #[error("failed to read generated agreement {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Validate and generate one agreement.
///
/// The returned state counts the generation only when a document was
/// produced; on any failure it is `state` unchanged.
pub fn generate<G: Generator<Agreement>>(
    state: SessionState,
    agreement: &Agreement,
    generator: &G,
) -> (SessionState, Result<DownloadablePdf, GenerationError>) {
    if let Err(errors) = agreement.validate() {
        return (state, Err(errors.into()));
    }

    let assembled = match generator.generate(agreement) {
        Ok(assembled) => assembled,
        Err(e) => {
            log::error!("Error generating PDF: {}", e);
            return (state, Err(e.into()));
        }
    };

    match fs::read(&assembled.path) {
        Ok(bytes) => {
            let pdf = DownloadablePdf {
                filename: assembled.filename,
                bytes,
                agreement_id: assembled.agreement_id,
                warnings: assembled.warnings,
            };
            (state.record_generation(), Ok(pdf))
        }
        Err(source) => {
            log::error!(
                "Generated agreement could not be read back from {}: {}",
                assembled.path.display(),
                source
            );
            (
                state,
                Err(GenerationError::Read {
                    path: assembled.path,
                    source,
                }),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::{AgreementAssembler, AssembledAgreement};
    use tempfile::tempdir;

    struct MissingFile;

    impl Generator<Agreement> for MissingFile {
        fn generate(&self, _request: &Agreement) -> Result<AssembledAgreement, AssemblerError> {
            Ok(AssembledAgreement {
                path: PathBuf::from("/nonexistent/agreement_deadbeef_20260101_000000.pdf"),
                filename: "agreement_deadbeef_20260101_000000.pdf".to_string(),
                agreement_id: "AGR-DEADBEEF".to_string(),
                warnings: Vec::new(),
            })
        }
    }

    #[test]
    fn test_load_sample_overwrites() {
        let state = SessionState {
            pdf_count: 4,
            sample: Some(SampleData {
                client_name: "Someone Else".to_string(),
                client_address: "Elsewhere".to_string(),
                agreement_amount: 1.0,
                notes_terms: "Other".to_string(),
            }),
        };

        let loaded = state.load_sample();
        assert_eq!(loaded.sample, Some(SampleData::fixture()));
        assert_eq!(loaded.pdf_count, 4);
        assert_eq!(loaded.clone().load_sample(), loaded);
    }

    #[test]
    fn test_form_defaults() {
        let empty = SessionState::default().form_defaults();
        assert_eq!(empty, FormDefaults::default());

        let filled = SessionState::default().load_sample().form_defaults();
        assert_eq!(filled.client_name, "John Smith");
        assert_eq!(filled.agreement_amount, 5000.0);
    }

    #[test]
    fn test_form_status() {
        assert_eq!(FormStatus::of(&Agreement::sample()), FormStatus::Complete);
        assert_eq!(FormStatus::of(&Agreement::default()), FormStatus::Incomplete);
        assert_eq!(
            FormStatus::Incomplete.message(),
            "Please fill in all required fields marked with *"
        );
    }

    #[test]
    fn test_generate_counts_success() {
        let dir = tempdir().unwrap();
        let assembler = AgreementAssembler::new(dir.path());

        let (state, result) = generate(SessionState::default(), &Agreement::sample(), &assembler);
        let pdf = result.unwrap();
        assert_eq!(state.pdf_count, 1);
        assert_eq!(pdf.mime(), "application/pdf");
        assert!(pdf.bytes.starts_with(b"%PDF-"));
        assert!(pdf.filename.starts_with("agreement_"));

        let (state, result) = generate(state, &Agreement::sample(), &assembler);
        assert!(result.is_ok());
        assert_eq!(state.pdf_count, 2);
    }

    #[test]
    fn test_generate_rejects_invalid_agreement() {
        let dir = tempdir().unwrap();
        let assembler = AgreementAssembler::new(dir.path());
        let mut agreement = Agreement::sample();
        agreement.agreement_amount = 0.0;

        let (state, result) = generate(SessionState::default(), &agreement, &assembler);
        assert!(matches!(result, Err(GenerationError::Invalid(_))));
        assert_eq!(state.pdf_count, 0);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_generate_failure_keeps_state() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();
        let assembler = AgreementAssembler::new(blocker.join("out"));

        let before = SessionState::default().load_sample();
        let (after, result) = generate(before.clone(), &Agreement::sample(), &assembler);
        assert!(matches!(result, Err(GenerationError::Assembly(_))));
        assert_eq!(after, before);
    }

    #[test]
    fn test_generate_unreadable_output() {
        let (state, result) = generate(SessionState::default(), &Agreement::sample(), &MissingFile);
        assert!(matches!(result, Err(GenerationError::Read { .. })));
        assert_eq!(state.pdf_count, 0);
    }

    #[test]
    fn test_size_kb() {
        let pdf = DownloadablePdf {
            filename: "a.pdf".to_string(),
            bytes: vec![0; 3482],
            agreement_id: "AGR-00000000".to_string(),
            warnings: Vec::new(),
        };
        assert_eq!(pdf.size_kb(), "3.4");
    }
}
