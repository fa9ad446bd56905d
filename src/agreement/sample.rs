//! Fixed agreements: the form's "Load Sample Data" fixture and the longer demo
//! written by the `generate_sample` binary.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const SAMPLE_CLIENT_NAME: &str = "John Smith";
pub const SAMPLE_CLIENT_ADDRESS: &str = "123 Main Street\nAnytown, ST 12345\nUnited States";
pub const SAMPLE_AGREEMENT_AMOUNT: f64 = 5000.00;
pub const SAMPLE_NOTES_TERMS: &str = "This agreement covers consulting services for a period \
of 6 months. Services include strategic planning, market analysis, and implementation \
support. Payment terms: 50% upfront, 50% upon completion.";

/// Terms of the demo document, with its list of deliverables.
pub const DEMO_NOTES_TERMS: &str = "This agreement covers comprehensive consulting services for \
a period of 6 months. Services include strategic planning, market analysis, competitive research, \
and implementation support.

Deliverables include:
\u{2022} Monthly strategic reports
\u{2022} Market analysis documentation
\u{2022} Implementation roadmap
\u{2022} Ongoing consultation sessions

Payment terms: 50% upfront payment required, remaining 50% due upon project completion. All work \
will be completed according to the agreed timeline and quality standards.";

/// Values pre-filled into the form after loading the sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SampleData {
    #[schema(example = "John Smith")]
    pub client_name: String,
    #[schema(example = "123 Main Street\nAnytown, ST 12345\nUnited States")]
    pub client_address: String,
    #[schema(example = 5000.0)]
    pub agreement_amount: f64,
    pub notes_terms: String,
}

impl SampleData {
    /// The fixture. Always the same values.
    pub fn fixture() -> Self {
        Self {
            client_name: SAMPLE_CLIENT_NAME.to_string(),
            client_address: SAMPLE_CLIENT_ADDRESS.to_string(),
            agreement_amount: SAMPLE_AGREEMENT_AMOUNT,
            notes_terms: SAMPLE_NOTES_TERMS.to_string(),
        }
    }

    /// The fixture with the demo's longer terms.
    pub fn demo() -> Self {
        Self {
            notes_terms: DEMO_NOTES_TERMS.to_string(),
            ..Self::fixture()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_is_deterministic() {
        assert_eq!(SampleData::fixture(), SampleData::fixture());
    }

    #[test]
    fn test_fixture_values() {
        let sample = SampleData::fixture();
        assert_eq!(sample.client_name, "John Smith");
        assert_eq!(sample.client_address.lines().count(), 3);
        assert_eq!(sample.agreement_amount, 5000.0);
        assert!(sample.notes_terms.starts_with("This agreement covers consulting services"));
        assert!(sample.notes_terms.ends_with("50% upon completion."));
        assert!(!sample.notes_terms.contains("  "));
    }

    #[test]
    fn test_demo_lists_deliverables() {
        let demo = SampleData::demo();
        assert_eq!(demo.client_name, SAMPLE_CLIENT_NAME);
        assert_eq!(demo.agreement_amount, SAMPLE_AGREEMENT_AMOUNT);
        assert!(demo.notes_terms.starts_with("This agreement covers comprehensive consulting"));

        let bullets: Vec<&str> = demo
            .notes_terms
            .lines()
            .filter_map(|line| line.strip_prefix("\u{2022} "))
            .collect();
        assert_eq!(
            bullets,
            vec![
                "Monthly strategic reports",
                "Market analysis documentation",
                "Implementation roadmap",
                "Ongoing consultation sessions",
            ]
        );
        assert!(demo.notes_terms.ends_with("agreed timeline and quality standards."));
    }
}
