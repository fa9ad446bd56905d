//! Agreement module - the transient record of one generation request.
//!
//! - `format` - currency, date, identifier and file name formatting
//! - `sample` - the fixed sample fixture
//! - `validation` - field validation with user-facing messages

pub mod format;
pub mod sample;
pub mod validation;

pub use sample::SampleData;
pub use validation::{ValidationError, ValidationErrors};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Trait for validating request objects.
pub trait Validator {
    /// Validate the state of the object.
    fn validate(&self) -> Result<(), ValidationErrors>;

    fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

/// How the client chose to provide a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SignatureMethod {
    #[default]
    None,
    Draw,
    Upload,
}

impl SignatureMethod {
    /// Parse the value of the form's radio group.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Some(Self::None),
            "draw" => Some(Self::Draw),
            "upload" => Some(Self::Upload),
            _ => None,
        }
    }
}

/// A captured signature.
///
/// The signature is kept with the agreement but the assembler does not draw it:
/// the signature block always shows an empty line to sign by hand.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SignatureSource {
    #[default]
    None,
    /// PNG exported from the drawing canvas.
    Drawing(Vec<u8>),
    Upload { bytes: Vec<u8>, filename: String },
}

impl SignatureSource {
    pub fn method(&self) -> SignatureMethod {
        match self {
            Self::None => SignatureMethod::None,
            Self::Drawing(_) => SignatureMethod::Draw,
            Self::Upload { .. } => SignatureMethod::Upload,
        }
    }
}

/// Field values of one agreement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Agreement {
    pub client_name: String,
    pub client_address: String,
    pub agreement_amount: f64,
    pub notes_terms: String,
    pub signature: SignatureSource,
}

impl Agreement {
    pub fn new(
        client_name: impl Into<String>,
        client_address: impl Into<String>,
        agreement_amount: f64,
        notes_terms: impl Into<String>,
    ) -> Self {
        Self {
            client_name: client_name.into(),
            client_address: client_address.into(),
            agreement_amount,
            notes_terms: notes_terms.into(),
            signature: SignatureSource::None,
        }
    }

    pub fn with_signature(mut self, signature: SignatureSource) -> Self {
        self.signature = signature;
        self
    }

    /// The sample fixture as an agreement without a signature.
    pub fn sample() -> Self {
        Self::from(SampleData::fixture())
    }
}

impl From<SampleData> for Agreement {
    fn from(sample: SampleData) -> Self {
        Self::new(
            sample.client_name,
            sample.client_address,
            sample.agreement_amount,
            sample.notes_terms,
        )
    }
}

impl Validator for Agreement {
    /// All of name, address and notes present, amount above zero, and any
    /// signature in an accepted image format.
    fn validate(&self) -> Result<(), ValidationErrors> {
        use validation::*;

        let mut errors = ValidationErrors::new();

        validate_required(&self.client_name, "client_name", "Client Name", &mut errors);
        validate_required(
            &self.client_address,
            "client_address",
            "Client Address",
            &mut errors,
        );
        validate_positive_amount(self.agreement_amount, "agreement_amount", &mut errors);
        validate_required(&self.notes_terms, "notes_terms", "Notes / Terms", &mut errors);

        match &self.signature {
            SignatureSource::None => {}
            SignatureSource::Drawing(bytes) => {
                validate_signature_drawing(bytes, "signature", &mut errors)
            }
            SignatureSource::Upload { bytes, filename } => {
                validate_signature_upload(bytes, filename, "signature", &mut errors)
            }
        }

        errors.into_result()
    }
}
