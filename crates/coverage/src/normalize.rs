//! Comparison keys for identifiers and keywords.
//!
//! Both sides of a comparison (dataset rows and desired targets) go through the
//! same functions, so equality on the normalized form is the only match rule.

/// Number of alphanumeric characters kept from a product identifier.
pub const IDENTIFIER_LEN: usize = 10;

/// First ten alphanumeric characters, lower-cased.
pub fn normalize_identifier(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphanumeric())
        .take(IDENTIFIER_LEN)
        .flat_map(char::to_lowercase)
        .collect()
}

pub fn normalize_keyword(raw: &str) -> String {
    raw.trim().to_lowercase()
}
