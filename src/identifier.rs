//! Table name sanitization
//!
//! Table names arrive from users and from file stems, and are interpolated
//! directly into SQL text (`CREATE OR REPLACE TABLE <name> ...`,
//! `DESCRIBE <name>`). Every name goes through [`sanitize_table_name`] first.

use crate::{LoaderError, Result};

/// Prefix added to names that would otherwise start with a digit
pub const DIGIT_PREFIX: &str = "t_";

/// Turn an arbitrary string into a safe SQL identifier.
///
/// Surrounding whitespace is trimmed, then every character that is not an
/// ASCII letter, digit or underscore becomes `_`. A result starting with a
/// digit gets [`DIGIT_PREFIX`].
///
/// # Errors
///
/// Returns [`LoaderError::InvalidIdentifier`] if nothing is left after trimming.
///
/// # Example
///
/// ```
/// use duckdb_loader::sanitize_table_name;
///
/// assert_eq!(sanitize_table_name("my table!").unwrap(), "my_table_");
/// assert_eq!(sanitize_table_name("123x").unwrap(), "t_123x");
/// assert!(sanitize_table_name("   ").is_err());
/// ```
pub fn sanitize_table_name(name: &str) -> Result<String> {
    let clean: String = name
        .trim()
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                ch
            } else {
                '_'
            }
        })
        .collect();

    match clean.chars().next() {
        None => Err(LoaderError::InvalidIdentifier(name.to_string())),
        Some(first) if first.is_ascii_digit() => Ok(format!("{}{}", DIGIT_PREFIX, clean)),
        Some(_) => Ok(clean),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_replaces_unsafe_characters() {
        assert_eq!(sanitize_table_name("my table!").unwrap(), "my_table_");
        assert_eq!(sanitize_table_name("sales-2024.q1").unwrap(), "sales_2024_q1");
        assert_eq!(sanitize_table_name("already_ok").unwrap(), "already_ok");
    }

    #[test]
    fn test_trims_before_cleaning() {
        assert_eq!(sanitize_table_name("  data  ").unwrap(), "data");
        assert_eq!(sanitize_table_name("\tdata\n").unwrap(), "data");
    }

    #[test]
    fn test_leading_digit_is_prefixed() {
        assert_eq!(sanitize_table_name("123x").unwrap(), "t_123x");
        assert_eq!(sanitize_table_name(" 9 lives").unwrap(), "t_9_lives");
    }

    #[test]
    fn test_empty_is_rejected() {
        for input in ["", "   ", "\t\n"] {
            let err = sanitize_table_name(input).unwrap_err();
            assert!(matches!(err, LoaderError::InvalidIdentifier(_)));
        }
    }

    #[test]
    fn test_non_ascii_becomes_underscore() {
        assert_eq!(sanitize_table_name("café").unwrap(), "caf_");
        assert_eq!(sanitize_table_name("日本").unwrap(), "__");
    }

    proptest! {
        #[test]
        fn prop_output_is_safe_identifier(input in "\\PC*") {
            match sanitize_table_name(&input) {
                Ok(name) => {
                    prop_assert!(!input.trim().is_empty());
                    prop_assert!(name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
                    prop_assert!(!name.starts_with(|c: char| c.is_ascii_digit()));
                }
                Err(_) => prop_assert!(input.trim().is_empty()),
            }
        }

        #[test]
        fn prop_digit_start_gets_prefix(digit in 0u8..10, rest in "[a-z0-9_]{0,12}") {
            let input = format!("{}{}", digit, rest);
            let name = sanitize_table_name(&input).unwrap();
            prop_assert_eq!(name, format!("t_{}", input));
        }

        #[test]
        fn prop_sanitizing_is_idempotent(input in "[ -~]{1,24}") {
            if let Ok(once) = sanitize_table_name(&input) {
                prop_assert_eq!(sanitize_table_name(&once).unwrap(), once);
            }
        }
    }
}
