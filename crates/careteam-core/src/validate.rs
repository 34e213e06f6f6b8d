//! Field-shape checks shared by registration and profile edits.

use chrono::NaiveDate;

use crate::error::ValidationError;

/// Length of a contact phone number.
pub const PHONE_DIGITS: usize = 10;

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_address_char(c: char) -> bool {
    is_word(c) || c == '.' || c == '-'
}

/// `local@host.tld`, where the top-level label has at least two word characters.
pub fn email(address: &str) -> Result<(), ValidationError> {
    let ok = address.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty()
            && local.chars().all(is_address_char)
            && domain.rsplit_once('.').is_some_and(|(host, tld)| {
                !host.is_empty()
                    && host.chars().all(is_address_char)
                    && tld.chars().count() >= 2
                    && tld.chars().all(is_word)
            })
    });

    if ok {
        Ok(())
    } else {
        Err(ValidationError::EmailShape(address.to_string()))
    }
}

pub fn phone(number: &str) -> Result<(), ValidationError> {
    if number.len() == PHONE_DIGITS && number.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::PhoneShape)
    }
}

/// Trimmed, non-empty text for a required field.
pub fn required<'a>(value: &'a str, field: &'static str) -> Result<&'a str, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ValidationError::MissingField(field))
    } else {
        Ok(trimmed)
    }
}

/// Optional text: blank collapses to `None`.
pub fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Parse an ISO `YYYY-MM-DD` date.
pub fn date(raw: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| ValidationError::DateShape(raw.to_string()))
}
