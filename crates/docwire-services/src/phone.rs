//! Phone number normalization.
//!
//! Heuristic normalization for a single-country default, not general E.164
//! parsing: numbers already bearing a different country code pass through
//! unmodified as long as they land on 10-15 digits.

use crate::gateway::DeliveryError;
use docwire_core::constants::DEFAULT_COUNTRY_PREFIX;

/// Normalize a raw user-entered number to international format.
///
/// Strips non-digits, drops one leading zero, prepends the default country
/// prefix to bare 10-digit numbers, and truncates anything beyond 15 digits.
pub fn normalize(raw: &str) -> Result<String, DeliveryError> {
    let mut cleaned: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();

    if cleaned.starts_with('0') {
        cleaned.remove(0);
    }

    if cleaned.len() == 10 && !cleaned.starts_with(DEFAULT_COUNTRY_PREFIX) {
        cleaned = format!("{}{}", DEFAULT_COUNTRY_PREFIX, cleaned);
    }

    if cleaned.len() < 10 {
        return Err(DeliveryError::InvalidPhoneNumber(
            "Phone number too short".to_string(),
        ));
    }

    cleaned.truncate(15);

    Ok(cleaned)
}

/// Looser admission check used at the HTTP boundary: any string whose
/// digit-only form has 10-15 digits is accepted. Normalization happens later,
/// inside the dispatcher.
pub fn is_plausible_number(raw: &str) -> bool {
    let digits = raw.chars().filter(|c| c.is_ascii_digit()).count();
    (10..=15).contains(&digits)
}
