//! Error types for template operations

use thiserror::Error;

/// Template errors
///
/// Extraction and rendering are total, so validation failure is the only
/// error this crate produces.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Template validation failed: {}", .0.join(", "))]
    Invalid(Vec<String>),
}

impl TemplateError {
    /// The individual failure reasons, in check order
    pub fn reasons(&self) -> &[String] {
        match self {
            TemplateError::Invalid(reasons) => reasons,
        }
    }
}
