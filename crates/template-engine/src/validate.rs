//! Template validation
//!
//! The brace check is a raw count of `{{` against `}}`, not a parser.
//! Balanced nonsense such as `}} {{` passes it.

use serde::Serialize;

use crate::errors::TemplateError;
use crate::patterns::{CLOSE, EMPTY_PLACEHOLDER, OPEN};

pub const EMPTY_CONTENT: &str = "Template content cannot be empty";
pub const UNMATCHED_BRACES: &str = "Unmatched template braces detected";
pub const EMPTY_PLACEHOLDERS: &str = "Empty variable placeholders found";

/// Outcome of validating template content
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    /// Failure reasons in check order; empty exactly when valid
    pub errors: Vec<String>,
}

impl ValidationReport {
    pub fn into_result(self) -> Result<(), TemplateError> {
        if self.is_valid {
            Ok(())
        } else {
            Err(TemplateError::Invalid(self.errors))
        }
    }
}

/// Run every check against `content` and collect all failures.
pub fn validate(content: &str) -> ValidationReport {
    let mut errors = Vec::new();

    if content.trim().is_empty() {
        errors.push(EMPTY_CONTENT.to_string());
    }

    if content.matches(OPEN).count() != content.matches(CLOSE).count() {
        errors.push(UNMATCHED_BRACES.to_string());
    }

    if EMPTY_PLACEHOLDER.is_match(content) {
        errors.push(EMPTY_PLACEHOLDERS.to_string());
    }

    ValidationReport {
        is_valid: errors.is_empty(),
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_valid_template() {
        let report = validate("Office Order {{order_number}} dated {{date}}");
        assert!(report.is_valid);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn test_empty_and_whitespace_content() {
        assert_eq!(validate("").errors, vec![EMPTY_CONTENT]);
        assert_eq!(validate(" \n\t ").errors, vec![EMPTY_CONTENT]);
    }

    #[test]
    fn test_empty_placeholder_is_balanced() {
        let report = validate("Dear {{}},");
        assert!(!report.is_valid);
        assert_eq!(report.errors, vec![EMPTY_PLACEHOLDERS]);
    }

    #[test]
    fn test_whitespace_placeholder() {
        assert_eq!(validate("Dear {{   }},").errors, vec![EMPTY_PLACEHOLDERS]);
    }

    #[test]
    fn test_unbalanced_open() {
        let report = validate("Dear {{name,");
        assert!(!report.is_valid);
        assert_eq!(report.errors, vec![UNMATCHED_BRACES]);
    }

    #[test]
    fn test_single_close_brace_is_still_unbalanced() {
        assert_eq!(validate("Dear {{name},").errors, vec![UNMATCHED_BRACES]);
    }

    #[test]
    fn test_count_based_check_accepts_reversed_braces() {
        assert!(validate("}} {{").is_valid);
    }

    #[test]
    fn test_all_errors_reported_together() {
        let report = validate("{{ }} {{");
        assert_eq!(report.errors, vec![UNMATCHED_BRACES, EMPTY_PLACEHOLDERS]);
    }

    #[test]
    fn test_into_result() {
        assert!(validate("{{x}}").into_result().is_ok());
        assert_eq!(
            validate("{{}}").into_result(),
            Err(TemplateError::Invalid(vec![EMPTY_PLACEHOLDERS.to_string()]))
        );
    }
}
