use std::fmt::Display;

use actix_multipart::{Field, Multipart};
use actix_web::web::Bytes;
use actix_web::HttpResponse;
use futures_util::{Stream, StreamExt};
use sanitize_filename::sanitize;

use crate::agreement::validation::MAX_SIGNATURE_BYTES;
use crate::agreement::{
    Agreement, SignatureMethod, SignatureSource, ValidationError, ValidationErrors,
};
use crate::assembler::AssemblyOptions;
use crate::ErrorResponse;

use super::models::AgreementSubmission;

/// Raw values of the agreement form, before validation.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ParsedAgreementForm {
    pub client_name: String,
    pub client_address: String,
    pub agreement_amount: String,
    pub notes_terms: String,
    pub signature_method: String,
    pub include_logo: Option<String>,
    pub include_qr: Option<String>,
    pub signature_drawing: Option<Vec<u8>>,
    /// Uploaded bytes and the sanitized client file name.
    pub signature_upload: Option<(Vec<u8>, String)>,
}

#[derive(Debug, thiserror::Error)]
pub enum MultipartParseError {
    #[error("Multipart field error: {0}")]
    FieldError(String),
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Invalid UTF-8 data: {0}")]
    Utf8Error(String),
    #[error("Field '{field}' is larger than {limit} bytes")]
    TooLarge { field: String, limit: usize },
}

/// Largest accepted plain text field.
pub const MAX_TEXT_FIELD_BYTES: usize = 64 * 1024;

impl From<MultipartParseError> for HttpResponse {
    fn from(error: MultipartParseError) -> Self {
        match error {
            MultipartParseError::FieldError(_) | MultipartParseError::Utf8Error(_) => {
                HttpResponse::BadRequest().json(ErrorResponse::bad_request(&error.to_string()))
            }
            MultipartParseError::TooLarge { .. } => HttpResponse::PayloadTooLarge()
                .json(ErrorResponse::new("PayloadTooLarge", &error.to_string())),
            MultipartParseError::IoError(_) => HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error(&error.to_string())),
        }
    }
}

fn parse_flag(value: Option<&str>) -> bool {
    match value.map(|v| v.trim().to_ascii_lowercase()) {
        None => true,
        Some(v) => matches!(v.as_str(), "true" | "on" | "1" | "yes"),
    }
}

/// Parse the amount field. Blank counts as zero so it fails the amount check.
fn parse_amount(value: &str) -> Result<f64, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(0.0);
    }
    trimmed
        .replace(',', "")
        .parse::<f64>()
        .map_err(|_| ValidationError::invalid_number("agreement_amount", trimmed))
}

impl ParsedAgreementForm {
    /// Turn the raw form into an agreement and its options.
    ///
    /// Only the file matching the chosen signature method is kept.
    pub fn into_submission(self) -> Result<AgreementSubmission, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let amount = parse_amount(&self.agreement_amount).unwrap_or_else(|error| {
            errors.add(error);
            f64::NAN
        });

        let signature = match SignatureMethod::parse(&self.signature_method) {
            Some(SignatureMethod::None) => SignatureSource::None,
            Some(SignatureMethod::Draw) => match self.signature_drawing {
                Some(bytes) if !bytes.is_empty() => SignatureSource::Drawing(bytes),
                _ => {
                    errors.add(ValidationError::invalid_signature(
                        "signature",
                        "Signature method is 'draw' but no drawing was sent",
                    ));
                    SignatureSource::None
                }
            },
            Some(SignatureMethod::Upload) => match self.signature_upload {
                Some((bytes, filename)) if !bytes.is_empty() => {
                    SignatureSource::Upload { bytes, filename }
                }
                _ => {
                    errors.add(ValidationError::invalid_signature(
                        "signature",
                        "Signature method is 'upload' but no file was sent",
                    ));
                    SignatureSource::None
                }
            },
            None => {
                errors.add(ValidationError::new(
                    "signature_method",
                    format!("Unknown signature method '{}'", self.signature_method),
                ));
                SignatureSource::None
            }
        };

        errors.into_result()?;

        Ok(AgreementSubmission {
            agreement: Agreement::new(
                self.client_name,
                self.client_address,
                amount,
                self.notes_terms,
            )
            .with_signature(signature),
            options: AssemblyOptions {
                include_logo: parse_flag(self.include_logo.as_deref()),
                include_qr: parse_flag(self.include_qr.as_deref()),
            },
        })
    }
}

/// Buffer a field, giving up as soon as it grows past `limit` bytes.
async fn read_bytes<S, E>(
    field: &mut S,
    name: &str,
    limit: usize,
) -> Result<Vec<u8>, MultipartParseError>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: Display,
{
    let mut buffer = Vec::new();
    while let Some(chunk) = field.next().await {
        let data = chunk.map_err(|e| MultipartParseError::IoError(e.to_string()))?;
        if buffer.len() + data.len() > limit {
            return Err(MultipartParseError::TooLarge {
                field: name.to_string(),
                limit,
            });
        }
        buffer.extend_from_slice(&data);
    }
    Ok(buffer)
}

async fn read_text(field: &mut Field, name: &str) -> Result<String, MultipartParseError> {
    let bytes = read_bytes(field, name, MAX_TEXT_FIELD_BYTES).await?;
    String::from_utf8(bytes).map_err(|e| MultipartParseError::Utf8Error(e.to_string()))
}

pub struct MultipartParser;

impl MultipartParser {
    pub async fn parse_agreement_multipart(
        mut multipart: Multipart,
    ) -> Result<ParsedAgreementForm, MultipartParseError> {
        let mut form = ParsedAgreementForm::default();

        while let Some(item) = multipart.next().await {
            let mut field = item.map_err(|e| MultipartParseError::FieldError(e.to_string()))?;
            let content_disposition = field.content_disposition().ok_or_else(|| {
                MultipartParseError::FieldError("Content disposition not found".to_string())
            })?;
            let name = content_disposition
                .get_name()
                .ok_or_else(|| MultipartParseError::FieldError("Field name not found".to_string()))?
                .to_string();
            let maybe_filename = content_disposition.get_filename().map(|s| s.to_string());

            match name.as_str() {
                "client_name" => form.client_name = read_text(&mut field, &name).await?,
                "client_address" => form.client_address = read_text(&mut field, &name).await?,
                "agreement_amount" => {
                    form.agreement_amount = read_text(&mut field, &name).await?
                }
                "notes_terms" => form.notes_terms = read_text(&mut field, &name).await?,
                "signature_method" => {
                    form.signature_method = read_text(&mut field, &name).await?
                }
                "include_logo" => form.include_logo = Some(read_text(&mut field, &name).await?),
                "include_qr" => form.include_qr = Some(read_text(&mut field, &name).await?),
                "signature_drawing" => {
                    let bytes = read_bytes(&mut field, &name, MAX_SIGNATURE_BYTES).await?;
                    if !bytes.is_empty() {
                        form.signature_drawing = Some(bytes);
                    }
                }
                "signature_upload" => {
                    let bytes = read_bytes(&mut field, &name, MAX_SIGNATURE_BYTES).await?;
                    if !bytes.is_empty() {
                        let filename = maybe_filename
                            .map(sanitize)
                            .unwrap_or_else(|| "signature.dat".to_string());
                        form.signature_upload = Some((bytes, filename));
                    }
                }
                other => {
                    log::debug!("Ignoring unexpected multipart field '{}'", other);
                    read_bytes(&mut field, other, MAX_TEXT_FIELD_BYTES).await?;
                }
            }
        }

        Ok(form)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_form() -> ParsedAgreementForm {
        ParsedAgreementForm {
            client_name: "John Smith".to_string(),
            client_address: "123 Main Street".to_string(),
            agreement_amount: "5,000.00".to_string(),
            notes_terms: "Consulting".to_string(),
            signature_method: "none".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_complete_form() {
        let submission = complete_form().into_submission().unwrap();
        assert_eq!(submission.agreement.agreement_amount, 5000.0);
        assert_eq!(submission.options, AssemblyOptions::default());
    }

    #[test]
    fn test_flags() {
        let mut form = complete_form();
        form.include_logo = Some("false".to_string());
        form.include_qr = Some("on".to_string());
        let submission = form.into_submission().unwrap();
        assert!(!submission.options.include_logo);
        assert!(submission.options.include_qr);
    }

    #[test]
    fn test_bad_amount() {
        let mut form = complete_form();
        form.agreement_amount = "five thousand".to_string();
        let errors = form.into_submission().unwrap_err();
        assert!(errors.has_field("agreement_amount"));
    }

    #[test]
    fn test_blank_amount_becomes_zero() {
        let mut form = complete_form();
        form.agreement_amount = "  ".to_string();
        let submission = form.into_submission().unwrap();
        assert_eq!(submission.agreement.agreement_amount, 0.0);
    }

    #[test]
    fn test_method_selects_file() {
        let mut form = complete_form();
        form.signature_drawing = Some(vec![1, 2, 3]);
        form.signature_upload = Some((vec![4, 5], "sig.png".to_string()));

        let none = form.clone().into_submission().unwrap();
        assert_eq!(none.agreement.signature, SignatureSource::None);

        form.signature_method = "upload".to_string();
        let upload = form.into_submission().unwrap();
        assert_eq!(
            upload.agreement.signature,
            SignatureSource::Upload {
                bytes: vec![4, 5],
                filename: "sig.png".to_string()
            }
        );
    }

    #[test]
    fn test_missing_drawing() {
        let mut form = complete_form();
        form.signature_method = "draw".to_string();
        let errors = form.into_submission().unwrap_err();
        assert!(errors.has_field("signature"));
    }

    #[test]
    fn test_unknown_method() {
        let mut form = complete_form();
        form.signature_method = "stamp".to_string();
        let errors = form.into_submission().unwrap_err();
        assert!(errors.has_field("signature_method"));
    }

    fn chunks(sizes: &[usize]) -> impl Stream<Item = Result<Bytes, std::io::Error>> + Unpin {
        let chunks: Vec<Result<Bytes, std::io::Error>> = sizes
            .iter()
            .map(|size| Ok(Bytes::from(vec![b'a'; *size])))
            .collect();
        futures_util::stream::iter(chunks)
    }

    #[actix_web::test]
    async fn test_read_bytes_within_limit() {
        let bytes = read_bytes(&mut chunks(&[10, 20, 34]), "notes_terms", 64)
            .await
            .unwrap();
        assert_eq!(bytes.len(), 64);
    }

    #[actix_web::test]
    async fn test_read_bytes_stops_past_limit() {
        let error = read_bytes(&mut chunks(&[40, 40, 40]), "signature_upload", 64)
            .await
            .unwrap_err();
        assert!(matches!(
            &error,
            MultipartParseError::TooLarge { field, limit: 64 } if field == "signature_upload"
        ));
        assert_eq!(error.to_string(), "Field 'signature_upload' is larger than 64 bytes");
    }

    #[actix_web::test]
    async fn test_read_bytes_reports_stream_errors() {
        let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from_static(b"ok")),
            Err(std::io::Error::new(std::io::ErrorKind::Other, "connection reset")),
        ];
        let error = read_bytes(&mut futures_util::stream::iter(chunks), "client_name", 64)
            .await
            .unwrap_err();
        assert!(matches!(error, MultipartParseError::IoError(_)));
    }

    #[test]
    fn test_too_large_is_payload_too_large() {
        let response = HttpResponse::from(MultipartParseError::TooLarge {
            field: "signature_upload".to_string(),
            limit: MAX_SIGNATURE_BYTES,
        });
        assert_eq!(response.status(), actix_web::http::StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn test_parse_error_display() {
        let error = MultipartParseError::FieldError("field error".to_string());
        assert_eq!(error.to_string(), "Multipart field error: field error");
    }
}
