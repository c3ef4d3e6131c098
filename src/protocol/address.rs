//! Recipient address normalization.

use crate::error::ChatBridgeError;
use crate::Result;

/// Default addressing domain of the messaging network.
pub const DEFAULT_DOMAIN: &str = "s.whatsapp.net";

/// Normalize a caller-supplied recipient into the protocol's addressing
/// form.
///
/// Inputs that already contain an `@` separator are passed through
/// unchanged (group and broadcast addresses carry their own domain).
/// Anything else is treated as a phone number: every non-digit character
/// is stripped and `@<domain>` is appended. An input with no digits at
/// all is rejected.
pub fn normalize_recipient(input: &str, domain: &str) -> Result<String> {
    if input.contains('@') {
        return Ok(input.to_string());
    }

    let digits: String = input.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return Err(ChatBridgeError::InvalidRecipient(input.to_string()));
    }

    Ok(format!("{}@{}", digits, domain))
}
