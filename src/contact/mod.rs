//! Outbound messaging links for contacting a supplier.

use crate::errors::AppError;
use crate::validation::digits_only;

const WHATSAPP_BASE: &str = "https://wa.me";
const BRAZIL_COUNTRY_CODE: &str = "55";

/// Phone in international digits-only form, or `None` when unusable.
///
/// Local numbers (area code plus 8 or 9 digits) get the Brazilian country code.
pub fn international_phone(phone: &str) -> Option<String> {
    let digits = digits_only(phone);
    let digits = digits.trim_start_matches('0');
    match digits.len() {
        10 | 11 => Some(format!("{}{}", BRAZIL_COUNTRY_CODE, digits)),
        12 | 13 if digits.starts_with(BRAZIL_COUNTRY_CODE) => Some(digits.to_string()),
        _ => None,
    }
}

/// `wa.me` link opening a chat with `phone`, prefilled with `message` when given.
pub fn whatsapp_link(phone: &str, message: Option<&str>) -> Result<String, AppError> {
    let number = international_phone(phone)
        .ok_or_else(|| AppError::Validation(format!("Phone {} cannot be contacted", phone)))?;

    let mut url = format!("{}/{}", WHATSAPP_BASE, number);
    if let Some(text) = message.map(str::trim).filter(|t| !t.is_empty()) {
        url.push_str("?text=");
        url.push_str(&urlencoding::encode(text));
    }
    Ok(url)
}
