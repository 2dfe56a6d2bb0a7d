//! Pre-write validation of submitted records.
//!
//! Checks are superficial: required fields are non-blank and registration
//! numbers have their fixed length. Each helper returns the normalized value
//! that gets stored.

use chrono::{Datelike, Utc};

use crate::errors::AppError;
use crate::geo;

/// Length of a CNPJ once punctuation is removed.
pub const CNPJ_LEN: usize = 14;
/// Length of a CEP once punctuation is removed.
pub const CEP_LEN: usize = 8;
/// Length of a Mercosul or legacy plate without the hyphen.
pub const PLATE_LEN: usize = 7;
/// Length of a VIN.
pub const CHASSIS_LEN: usize = 17;

/// Trimmed value of a required text field.
pub fn required(field: &str, value: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

/// Blank strings collapse to `None`, everything else is trimmed.
pub fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Outcome of a partial update: an absent field keeps `existing`, a present
/// one (`null` and blank included) goes through `check` and replaces it.
pub fn patch<T, F>(
    change: Option<Option<T>>,
    existing: Option<T>,
    check: F,
) -> Result<Option<T>, AppError>
where
    F: FnOnce(Option<T>) -> Result<Option<T>, AppError>,
{
    match change {
        Some(value) => check(value),
        None => Ok(existing),
    }
}

/// [`patch`] for free-text fields.
pub fn patch_text(change: &Option<Option<String>>, existing: Option<String>) -> Option<String> {
    match change {
        Some(value) => optional(value.clone()),
        None => existing,
    }
}

pub fn digits_only(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

fn fixed_digits(field: &str, value: &str, len: usize) -> Result<String, AppError> {
    let digits = digits_only(value);
    if digits.len() != len {
        return Err(AppError::Validation(format!(
            "{} must have {} digits",
            field, len
        )));
    }
    Ok(digits)
}

pub fn cnpj(value: &str) -> Result<String, AppError> {
    fixed_digits("CNPJ", value, CNPJ_LEN)
}

pub fn optional_cnpj(value: Option<String>) -> Result<Option<String>, AppError> {
    optional(value).map(|v| cnpj(&v)).transpose()
}

pub fn optional_zip_code(value: Option<String>) -> Result<Option<String>, AppError> {
    optional(value)
        .map(|v| fixed_digits("CEP", &v, CEP_LEN))
        .transpose()
}

/// Upper-cased two-letter state code, checked against the known UFs.
pub fn optional_state(value: Option<String>) -> Result<Option<String>, AppError> {
    optional(value)
        .map(|v| {
            let uf = v.to_uppercase();
            if geo::is_valid_uf(&uf) {
                Ok(uf)
            } else {
                Err(AppError::Validation(format!("Unknown state (UF): {}", v)))
            }
        })
        .transpose()
}

pub fn optional_email(value: Option<String>) -> Result<Option<String>, AppError> {
    optional(value)
        .map(|v| {
            if v.contains('@') && !v.starts_with('@') && !v.ends_with('@') {
                Ok(v)
            } else {
                Err(AppError::Validation(format!("Invalid email: {}", v)))
            }
        })
        .transpose()
}

/// Plate without separators, upper-cased, exactly seven letters or digits.
pub fn plate(value: &str) -> Result<String, AppError> {
    let normalized: String = value
        .chars()
        .filter(|c| !matches!(c, '-' | ' '))
        .collect::<String>()
        .to_uppercase();
    if normalized.is_empty() {
        return Err(AppError::Validation("Plate is required".to_string()));
    }
    if normalized.len() != PLATE_LEN || !normalized.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(AppError::Validation(format!(
            "Plate must have {} letters or digits",
            PLATE_LEN
        )));
    }
    Ok(normalized)
}

pub fn optional_chassis(value: Option<String>) -> Result<Option<String>, AppError> {
    optional(value)
        .map(|v| {
            let upper = v.to_uppercase();
            if upper.len() == CHASSIS_LEN && upper.chars().all(|c| c.is_ascii_alphanumeric()) {
                Ok(upper)
            } else {
                Err(AppError::Validation(format!(
                    "Chassis must have {} characters",
                    CHASSIS_LEN
                )))
            }
        })
        .transpose()
}

pub fn optional_year(value: Option<i32>) -> Result<Option<i32>, AppError> {
    let max = Utc::now().year() + 1;
    match value {
        Some(year) if !(1900..=max).contains(&year) => Err(AppError::Validation(format!(
            "Year must be between 1900 and {}",
            max
        ))),
        other => Ok(other),
    }
}

pub fn quantity(value: i64) -> Result<i64, AppError> {
    if value < 1 {
        return Err(AppError::Validation(
            "Quantity must be at least 1".to_string(),
        ));
    }
    Ok(value)
}

pub fn price(field: &str, value: f64) -> Result<f64, AppError> {
    if !value.is_finite() || value < 0.0 {
        return Err(AppError::Validation(format!(
            "{} must be a non-negative number",
            field
        )));
    }
    Ok(value)
}
