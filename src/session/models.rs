use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::agreement::{Agreement, SampleData, SignatureSource, ValidationError, ValidationErrors};
use crate::assembler::AssemblyOptions;

use super::controller::SessionState;

fn default_true() -> bool {
    true
}

/// JSON body of `POST /api/sessions/{id}/agreements`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AgreementRequest {
    #[schema(example = "John Smith")]
    pub client_name: String,
    #[schema(example = "123 Main Street\nAnytown, ST 12345\nUnited States")]
    pub client_address: String,
    #[schema(example = 5000.0)]
    pub agreement_amount: f64,
    pub notes_terms: String,
    #[serde(default)]
    pub signature: Option<SignaturePayload>,
    #[serde(default = "default_true")]
    pub include_logo: bool,
    #[serde(default = "default_true")]
    pub include_qr: bool,
}

/// A signature image sent as base64, with or without a `data:` URL prefix.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(tag = "method", rename_all = "lowercase")]
pub enum SignaturePayload {
    /// PNG exported from the drawing canvas.
    Draw { data: String },
    Upload { data: String, filename: String },
}

/// A decoded request: the agreement plus the document options.
#[derive(Debug, Clone, PartialEq)]
pub struct AgreementSubmission {
    pub agreement: Agreement,
    pub options: AssemblyOptions,
}

fn decode_base64(data: &str) -> Result<Vec<u8>, ValidationError> {
    let encoded = match data.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => data,
    };
    STANDARD
        .decode(encoded.trim())
        .map_err(|e| ValidationError::invalid_signature("signature", format!("Invalid base64 data: {}", e)))
}

impl SignaturePayload {
    pub fn decode(&self) -> Result<SignatureSource, ValidationError> {
        match self {
            Self::Draw { data } => Ok(SignatureSource::Drawing(decode_base64(data)?)),
            Self::Upload { data, filename } => Ok(SignatureSource::Upload {
                bytes: decode_base64(data)?,
                filename: sanitize_filename::sanitize(filename),
            }),
        }
    }
}

impl AgreementRequest {
    pub fn into_submission(self) -> Result<AgreementSubmission, ValidationErrors> {
        let signature = match &self.signature {
            Some(payload) => payload.decode()?,
            None => SignatureSource::None,
        };

        Ok(AgreementSubmission {
            agreement: Agreement::new(
                self.client_name,
                self.client_address,
                self.agreement_amount,
                self.notes_terms,
            )
            .with_signature(signature),
            options: AssemblyOptions {
                include_logo: self.include_logo,
                include_qr: self.include_qr,
            },
        })
    }
}

/// Session as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub pdf_count: u64,
    pub sample: Option<SampleData>,
}

impl SessionResponse {
    pub fn new(session_id: Uuid, state: SessionState) -> Self {
        Self {
            session_id,
            pdf_count: state.pdf_count,
            sample: state.sample,
        }
    }
}

/// Multipart body of `POST /api/sessions/{id}/agreements/form`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AgreementFormUpload {
    #[allow(unused)]
    pub client_name: String,
    #[allow(unused)]
    pub client_address: String,
    #[allow(unused)]
    pub agreement_amount: String,
    #[allow(unused)]
    pub notes_terms: String,
    /// `none`, `draw` or `upload`.
    #[allow(unused)]
    pub signature_method: Option<String>,
    #[allow(unused)]
    pub include_logo: Option<bool>,
    #[allow(unused)]
    pub include_qr: Option<bool>,
    #[allow(unused)]
    #[schema(value_type = Option<String>, format = Binary)]
    pub signature_drawing: Option<Vec<u8>>,
    #[allow(unused)]
    #[schema(value_type = Option<String>, format = Binary)]
    pub signature_upload: Option<Vec<u8>>,
}
