use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Booking reference printed on tickets: `CH` followed by six uppercase
/// hex characters.
pub fn generate_reference() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("CH{}", id[..6].to_uppercase())
}

pub fn is_reference(value: &str) -> bool {
    value.len() == 8
        && value.starts_with("CH")
        && value[2..].chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
}

/// File name for a receipt saved instead of printed.
pub fn receipt_file_name(reference: &str, at: DateTime<Utc>, extension: &str) -> String {
    let safe: String = reference
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    format!("receipt-{}-{}.{}", safe, at.format("%Y%m%d%H%M%S"), extension)
}
