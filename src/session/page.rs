//! The HTML agreement form, prefilled from a session.

use uuid::Uuid;

use crate::agreement::Agreement;

use super::controller::{FormStatus, SessionState};

const FORM_TEMPLATE: &str = include_str!("../../static/form.html");

/// Escape text for use in element content and quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Render the form page for `session_id`.
pub fn render_form(session_id: Uuid, state: &SessionState) -> String {
    let defaults = state.form_defaults();
    let prefilled = Agreement::new(
        defaults.client_name.as_str(),
        defaults.client_address.as_str(),
        defaults.agreement_amount,
        defaults.notes_terms.as_str(),
    );
    let status = FormStatus::of(&prefilled);
    let amount = if defaults.agreement_amount > 0.0 {
        format!("{:.2}", defaults.agreement_amount)
    } else {
        String::new()
    };

    FORM_TEMPLATE
        .replace("{{SESSION_ID}}", &session_id.to_string())
        .replace("{{PDF_COUNT}}", &state.pdf_count.to_string())
        .replace("{{CLIENT_NAME}}", &escape_html(&defaults.client_name))
        .replace("{{CLIENT_ADDRESS}}", &escape_html(&defaults.client_address))
        .replace("{{AGREEMENT_AMOUNT}}", &amount)
        .replace("{{NOTES_TERMS}}", &escape_html(&defaults.notes_terms))
        .replace("{{FORM_STATUS}}", status.message())
        .replace(
            "{{FORM_STATUS_CLASS}}",
            match status {
                FormStatus::Complete => "complete",
                FormStatus::Incomplete => "incomplete",
            },
        )
}
