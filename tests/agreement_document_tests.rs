use client_agreement::agreement::format::is_agreement_id;
use client_agreement::agreement::{Agreement, SampleData, Validator};
use client_agreement::assembler::{AgreementAssembler, Generator};
use client_agreement::session::{generate, SessionState};
use lopdf::Document;

#[cfg(test)]
mod agreement_document_tests {
    use super::*;

    fn page_text(document: &Document) -> String {
        let mut text = String::new();
        for page_id in document.get_pages().values() {
            let content = document.get_page_content(*page_id).unwrap();
            text.push_str(&String::from_utf8_lossy(&content));
        }
        text
    }

    #[test]
    fn test_sample_fixture_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let assembler = AgreementAssembler::new(dir.path());
        let agreement = Agreement::from(SampleData::fixture());
        assert!(agreement.is_valid());

        let assembled = assembler.generate(&agreement).unwrap();
        assert!(is_agreement_id(&assembled.agreement_id));

        let document = Document::load(&assembled.path).unwrap();
        assert!(!document.get_pages().is_empty());

        let text = page_text(&document);
        let name_key = text.find("(Client Name:) Tj").unwrap();
        let name_value = text.find("(John Smith) Tj").unwrap();
        assert!(name_key < name_value);
        let amount_key = text.find("(Agreement Amount:) Tj").unwrap();
        let amount_value = text.find("($5,000.00) Tj").unwrap();
        assert!(amount_key < amount_value);
        assert!(text.contains(&format!("({}) Tj", assembled.agreement_id)));
        assert!(text.contains("(TERMS AND CONDITIONS) Tj"));
        assert!(text.contains("(STANDARD PROVISIONS) Tj"));
        assert!(text.contains("(Client Signature:) Tj"));
    }

    #[test]
    fn test_document_info_title() {
        let assembler = AgreementAssembler::default();
        let rendered = assembler.render(&Agreement::sample()).unwrap();
        let document = Document::load_mem(&rendered.pdf).unwrap();

        let info_id = document
            .trailer
            .get(b"Info")
            .and_then(|info| info.as_reference())
            .unwrap();
        let info = document.get_dictionary(info_id).unwrap();
        let title = info.get(b"Title").and_then(|t| t.as_str()).unwrap();
        assert_eq!(
            String::from_utf8_lossy(title),
            format!("Client Service Agreement {}", rendered.agreement_id)
        );
    }

    #[test]
    fn test_session_counter_tracks_successes() {
        let dir = tempfile::tempdir().unwrap();
        let assembler = AgreementAssembler::new(dir.path());

        let mut state = SessionState::default().load_sample();
        let mut invalid = Agreement::sample();
        invalid.notes_terms.clear();

        for agreement in [Agreement::sample(), invalid, Agreement::sample()] {
            let (next, _) = generate(state, &agreement, &assembler);
            state = next;
        }
        assert_eq!(state.pdf_count, 2);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
    }
}
