//! Formatting helpers shared by the assembler and the controller.

use chrono::{DateTime, Local, NaiveDate, TimeZone};
use std::path::PathBuf;
use uuid::Uuid;

/// Name of the folder created inside the system temp directory.
pub const OUTPUT_FOLDER: &str = "client_agreements";

/// Format a date the long way, e.g. "October 18, 2026".
pub fn format_long_date(date: NaiveDate) -> String {
    date.format("%B %d, %Y").to_string()
}

/// Format an amount as US dollars with thousands separators, e.g. "$5,000.00".
pub fn format_currency(amount: f64) -> String {
    let rounded = format!("{:.2}", amount.abs());
    let (whole, cents) = rounded.split_once('.').unwrap_or((rounded.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (index, digit) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount.is_sign_negative() && rounded != "0.00" {
        "-"
    } else {
        ""
    };
    format!("${}{}.{}", sign, grouped, cents)
}

/// First eight lowercase hex digits of a fresh random UUID.
pub fn random_hex8() -> String {
    let mut hex = Uuid::new_v4().simple().to_string();
    hex.truncate(8);
    hex
}

/// A new agreement identifier, `AGR-` followed by eight uppercase hex digits.
pub fn new_agreement_id() -> String {
    format!("AGR-{}", random_hex8().to_uppercase())
}

/// Whether `value` has the shape of an agreement identifier.
pub fn is_agreement_id(value: &str) -> bool {
    value.strip_prefix("AGR-").is_some_and(|hex| {
        hex.len() == 8
            && hex
                .chars()
                .all(|ch| ch.is_ascii_digit() || ('A'..='F').contains(&ch))
    })
}

/// File name of a generated agreement, `agreement_<8-hex>_<YYYYMMDD_HHMMSS>.pdf`.
pub fn output_filename<Tz: TimeZone>(timestamp: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!(
        "agreement_{}_{}.pdf",
        random_hex8(),
        timestamp.format("%Y%m%d_%H%M%S")
    )
}

/// Default folder for generated agreements, `<system temp>/client_agreements`.
pub fn default_output_dir() -> PathBuf {
    std::env::temp_dir().join(OUTPUT_FOLDER)
}

/// Today's date in local time, formatted with [`format_long_date`].
pub fn today_long() -> String {
    format_long_date(Local::now().date_naive())
}
