//! SQL identifier validator.
//!
//! The fixed statements splice the configured table and column names into
//! their text; values always travel as bound parameters. This module keeps
//! those identifiers to a conservative character set.

use crate::errors::AppError;

/// Validates SQL identifiers before they are placed in a statement.
pub struct SqlValidator;

/// Keywords that may never appear as an identifier segment.
const FORBIDDEN_KEYWORDS: [&str; 6] = ["DROP", "TRUNCATE", "DELETE", "ALTER", "INSERT", "UPDATE"];

impl SqlValidator {
    /// Validates a possibly schema-qualified identifier such as `SMS.SMS`.
    ///
    /// Each dot-separated segment must be non-empty, start with a letter or
    /// underscore, and contain only ASCII letters, digits and underscores.
    ///
    /// # Errors
    /// Returns `AppError::UnsafeSql` naming the offending identifier.
    pub fn validate_identifier(ident: &str) -> Result<(), AppError> {
        if ident.is_empty() {
            return Err(AppError::UnsafeSql("empty identifier".into()));
        }
        for segment in ident.split('.') {
            let mut chars = segment.chars();
            let valid_start = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
            if !valid_start || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(AppError::UnsafeSql(format!("invalid identifier: {}", ident)));
            }
            let upper = segment.to_ascii_uppercase();
            if FORBIDDEN_KEYWORDS.contains(&upper.as_str()) {
                return Err(AppError::UnsafeSql(format!(
                    "forbidden keyword in identifier: {}",
                    ident
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_and_qualified_are_allowed() {
        assert!(SqlValidator::validate_identifier("sms").is_ok());
        assert!(SqlValidator::validate_identifier("SMS.SMS").is_ok());
        assert!(SqlValidator::validate_identifier("_audit.event_log2").is_ok());
    }

    #[test]
    fn test_injection_is_rejected() {
        assert!(SqlValidator::validate_identifier("sms; DROP TABLE sms").is_err());
        assert!(SqlValidator::validate_identifier("sms--").is_err());
        assert!(SqlValidator::validate_identifier("\"sms\"").is_err());
    }

    #[test]
    fn test_malformed_segments_are_rejected() {
        assert!(SqlValidator::validate_identifier("").is_err());
        assert!(SqlValidator::validate_identifier("SMS.").is_err());
        assert!(SqlValidator::validate_identifier("1sms").is_err());
        assert!(SqlValidator::validate_identifier("drop").is_err());
    }
}
