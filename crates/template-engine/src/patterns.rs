//! Placeholder patterns shared by extraction, validation and rendering

use lazy_static::lazy_static;
use regex::Regex;

/// Opening delimiter
pub const OPEN: &str = "{{";

/// Closing delimiter
pub const CLOSE: &str = "}}";

lazy_static! {
    /// `{{name}}` where the name holds no brace. Stops at the first `}}`,
    /// so adjacent placeholders never merge.
    pub static ref PLACEHOLDER: Regex = Regex::new(r"\{\{([^{}]+)\}\}").unwrap();

    /// `{{}}` or a placeholder holding only whitespace
    pub static ref EMPTY_PLACEHOLDER: Regex = Regex::new(r"\{\{\s*\}\}").unwrap();
}
