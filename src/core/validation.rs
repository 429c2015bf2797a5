//! Input validation for manifest fields.
//!
//! Validates Kubernetes object names and ConfigMap data keys before they
//! reach the manifest.

use crate::error::{Result, ValidationError};

/// Maximum length of a DNS-1123 label.
const MAX_LABEL_LEN: usize = 63;

/// Maximum length of a ConfigMap data key.
const MAX_DATA_KEY_LEN: usize = 253;

fn invalid(kind: &'static str, value: &str, reason: impl Into<String>) -> crate::error::Error {
    ValidationError::InvalidName {
        kind,
        value: value.to_string(),
        reason: reason.into(),
    }
    .into()
}

/// Validate a resource name or namespace as a DNS-1123 label.
///
/// - Only a-z, 0-9, and `-`
/// - Must start and end with an alphanumeric character
/// - At most 63 characters
///
/// # Errors
///
/// Returns `ValidationError` if the name is invalid.
pub fn validate_resource_name(kind: &'static str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(invalid(kind, name, "cannot be empty"));
    }

    if name.len() > MAX_LABEL_LEN {
        return Err(invalid(
            kind,
            name,
            format!("longer than {} characters", MAX_LABEL_LEN),
        ));
    }

    for (i, ch) in name.chars().enumerate() {
        if !ch.is_ascii_lowercase() && !ch.is_ascii_digit() && ch != '-' {
            return Err(invalid(
                kind,
                name,
                format!(
                    "invalid character '{}' at position {}. Only a-z, 0-9, and '-' are allowed",
                    ch,
                    i + 1
                ),
            ));
        }
    }

    if name.starts_with('-') || name.ends_with('-') {
        return Err(invalid(kind, name, "must start and end with a letter or digit"));
    }

    Ok(())
}

/// Validate a ConfigMap data key.
///
/// Keys may contain alphanumerics, `-`, `_` and `.`, and cannot be `.` or `..`.
///
/// # Errors
///
/// Returns `ValidationError` if the key is invalid.
pub fn validate_data_key(key: &str) -> Result<()> {
    const KIND: &str = "data key";

    if key.is_empty() {
        return Err(invalid(KIND, key, "cannot be empty"));
    }

    if key.len() > MAX_DATA_KEY_LEN {
        return Err(invalid(
            KIND,
            key,
            format!("longer than {} characters", MAX_DATA_KEY_LEN),
        ));
    }

    if key == "." || key == ".." {
        return Err(invalid(KIND, key, "cannot be '.' or '..'"));
    }

    if let Some(ch) = key
        .chars()
        .find(|ch| !ch.is_ascii_alphanumeric() && !matches!(ch, '-' | '_' | '.'))
    {
        return Err(invalid(
            KIND,
            key,
            format!("invalid character '{}'", ch),
        ));
    }

    Ok(())
}
