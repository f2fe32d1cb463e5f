//! Placeholder template engine
//!
//! Office document templates are plain text with `{{variable}}`
//! placeholders. This crate provides the three operations every caller
//! shares:
//! - Variable extraction (ordered, deduplicated, trimmed names)
//! - Template validation (all failing checks reported together)
//! - Substitution of a value map, degrading unfilled placeholders to
//!   the `[___]` sentinel
//!
//! Everything here is pure and synchronous. No function in this crate
//! performs I/O or touches shared mutable state.

pub mod errors;
pub mod extract;
mod patterns;
pub mod render;
pub mod validate;

use std::collections::HashMap;

pub use errors::TemplateError;
pub use extract::extract_variables;
pub use render::{missing_variables, render, SENTINEL};
pub use validate::{validate, ValidationReport};

/// User-supplied values keyed by variable name
pub type ValueMap = HashMap<String, String>;

/// Template content that passed validation, with its extracted variables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedTemplate {
    pub content: String,
    pub variables: Vec<String>,
}

/// Validate `content` and extract its variables.
///
/// This is the gate Template Management runs before every create or
/// update. A failing validation aborts the write with every collected
/// reason.
pub fn prepare(content: &str) -> Result<PreparedTemplate, TemplateError> {
    validate(content).into_result()?;

    Ok(PreparedTemplate {
        content: content.to_string(),
        variables: extract_variables(content),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn prepare_extracts_variables_of_valid_content() {
        let prepared = prepare("Dear {{ name }}, order {{order_number}} for {{name}}").unwrap();
        assert_eq!(prepared.variables, vec!["name", "order_number"]);
    }

    #[test]
    fn prepare_rejects_with_every_reason() {
        let err = prepare("   {{ }} }}").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Template validation failed: Unmatched template braces detected, Empty variable placeholders found"
        );
    }

    #[test]
    fn prepare_rejects_empty_content() {
        let err = prepare("").unwrap_err();
        assert_eq!(err.reasons(), ["Template content cannot be empty"]);
    }
}
