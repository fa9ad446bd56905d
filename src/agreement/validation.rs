//! Input validation for agreement requests.
//!
//! Errors carry the field path, a message and an optional suggestion so the
//! same values can be shown in the form and returned from the JSON API.

use std::fmt;

use image::ImageFormat;

/// Largest signature image accepted, in bytes.
pub const MAX_SIGNATURE_BYTES: usize = 5 * 1024 * 1024;

/// Validation error with a user-facing message.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// The field that failed validation
    pub field: String,
    pub message: String,
    /// Suggestion for how to fix the error
    pub suggestion: Option<String>,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Create error for empty required field
    pub fn empty_field(field: &str, label: &str) -> Self {
        Self::new(field, format!("{} must not be empty", label))
            .with_suggestion(format!("Please enter the {}", label.to_lowercase()))
    }

    pub fn non_positive_amount(field: &str) -> Self {
        Self::new(field, "Agreement amount must be greater than zero")
            .with_suggestion("Enter the total amount for the agreement, e.g. 5000.00")
    }

    pub fn invalid_number(field: &str, value: &str) -> Self {
        Self::new(field, format!("'{}' is not a valid amount", value))
            .with_suggestion("Use digits with an optional decimal point, e.g. 5000.00")
    }

    pub fn invalid_signature(field: &str, reason: impl Into<String>) -> Self {
        Self::new(field, reason).with_suggestion("Upload a clear PNG or JPEG image of the signature")
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.field, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, ". {}", suggestion)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Collection of validation errors with formatted output.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    pub fn add(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter()
    }

    /// Whether any error concerns `field`.
    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|error| error.field == field)
    }

    /// Numbered, multi-line summary of every error.
    pub fn to_message(&self) -> String {
        if self.errors.is_empty() {
            return String::new();
        }

        let mut parts = vec![format!(
            "Validation failed: {} error(s) found\n",
            self.errors.len()
        )];

        for (i, error) in self.errors.iter().enumerate() {
            parts.push(format!("{}. {}", i + 1, error));
        }

        parts.push(String::new());
        parts.push("Please fill in all required fields marked with *".to_string());

        parts.join("\n")
    }

    /// Ok if no errors were collected.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl From<ValidationError> for ValidationErrors {
    fn from(error: ValidationError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_message())
    }
}

impl std::error::Error for ValidationErrors {}

// ============================================================================
// Validation functions
// ============================================================================

/// Validate that a string is not empty after trimming
pub fn validate_required(value: &str, field: &str, label: &str, errors: &mut ValidationErrors) {
    if value.trim().is_empty() {
        errors.add(ValidationError::empty_field(field, label));
    }
}

/// Validate that an amount is a finite number above zero
pub fn validate_positive_amount(value: f64, field: &str, errors: &mut ValidationErrors) {
    if !value.is_finite() || value <= 0.0 {
        errors.add(ValidationError::non_positive_amount(field));
    }
}

/// Validate a drawn signature: it must be a PNG.
pub fn validate_signature_drawing(bytes: &[u8], field: &str, errors: &mut ValidationErrors) {
    if bytes.len() > MAX_SIGNATURE_BYTES {
        errors.add(ValidationError::invalid_signature(field, "Signature image is too large"));
        return;
    }
    if !matches!(image::guess_format(bytes), Ok(ImageFormat::Png)) {
        errors.add(ValidationError::invalid_signature(
            field,
            "Drawn signature must be a PNG image",
        ));
    }
}

/// Validate an uploaded signature: png/jpg/jpeg by name and by content.
pub fn validate_signature_upload(
    bytes: &[u8],
    filename: &str,
    field: &str,
    errors: &mut ValidationErrors,
) {
    if bytes.len() > MAX_SIGNATURE_BYTES {
        errors.add(ValidationError::invalid_signature(field, "Signature image is too large"));
        return;
    }

    let by_name = mime_guess::from_path(filename).first_raw();
    if !matches!(by_name, Some("image/png") | Some("image/jpeg")) {
        errors.add(ValidationError::invalid_signature(
            field,
            format!("'{}' is not a png, jpg or jpeg file", filename),
        ));
        return;
    }

    if !matches!(
        image::guess_format(bytes),
        Ok(ImageFormat::Png) | Ok(ImageFormat::Jpeg)
    ) {
        errors.add(ValidationError::invalid_signature(
            field,
            "Uploaded signature content is not a PNG or JPEG image",
        ));
    }
}
