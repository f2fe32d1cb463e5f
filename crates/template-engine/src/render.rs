//! Template substitution
//!
//! Rendering runs in two passes:
//! 1. Every placeholder whose trimmed name is non-blank and a key of the
//!    value map is replaced with the value verbatim. Inserted values are
//!    not rescanned during this pass.
//! 2. The sweep replaces every placeholder left anywhere in the result
//!    with [`SENTINEL`]. This includes placeholder-looking text that came
//!    from a substituted value.
//!
//! The output never contains a placeholder, and rendering never fails.

use regex::{Captures, NoExpand};

use crate::extract::extract_variables;
use crate::patterns::PLACEHOLDER;
use crate::ValueMap;

/// Stand-in for a placeholder with no value
pub const SENTINEL: &str = "[___]";

/// Substitute `values` into `content`.
pub fn render(content: &str, values: &ValueMap) -> String {
    let substituted = PLACEHOLDER.replace_all(content, |caps: &Captures<'_>| {
        let name = caps[1].trim();
        match values.get(name) {
            Some(value) if !name.is_empty() => value.clone(),
            _ => caps[0].to_string(),
        }
    });

    sweep(substituted.into_owned())
}

/// Variables of `content` that `values` does not cover, in extraction order
pub fn missing_variables(content: &str, values: &ValueMap) -> Vec<String> {
    extract_variables(content)
        .into_iter()
        .filter(|name| !values.contains_key(name))
        .collect()
}

fn sweep(mut text: String) -> String {
    // Each replacement removes two `{` and adds none, so this terminates.
    // More than one round is only needed for nested input like `{{{{a}}}}`.
    while PLACEHOLDER.is_match(&text) {
        text = PLACEHOLDER
            .replace_all(&text, NoExpand(SENTINEL))
            .into_owned();
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn values(pairs: &[(&str, &str)]) -> ValueMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_missing_value_becomes_sentinel() {
        let rendered = render(
            "Order {{order_number}} dated {{date}}",
            &values(&[("order_number", "ORD-2024-0001")]),
        );
        assert_eq!(rendered, "Order ORD-2024-0001 dated [___]");
    }

    #[test]
    fn test_every_occurrence_is_replaced() {
        let rendered = render(
            "{{name}} / {{ name }} / {{name }}",
            &values(&[("name", "Ana")]),
        );
        assert_eq!(rendered, "Ana / Ana / Ana");
    }

    #[test]
    fn test_extra_keys_are_ignored() {
        let rendered = render("Hi {{name}}", &values(&[("name", "Bo"), ("unused", "x")]));
        assert_eq!(rendered, "Hi Bo");
    }

    #[test]
    fn test_values_are_verbatim() {
        let rendered = render("Amount: {{amount}}", &values(&[("amount", "$1 & <b>$2</b>")]));
        assert_eq!(rendered, "Amount: $1 & <b>$2</b>");
    }

    #[test]
    fn test_value_introduced_placeholder_is_swept() {
        let rendered = render("Hi {{name}}", &values(&[("name", "{{x}}")]));
        assert_eq!(rendered, "Hi [___]");
    }

    #[test]
    fn test_value_introduced_placeholder_is_not_expanded() {
        let rendered = render(
            "Hi {{name}}",
            &values(&[("name", "{{other}}"), ("other", "expanded")]),
        );
        assert_eq!(rendered, "Hi [___]");
    }

    #[test]
    fn test_blank_placeholder_ignores_empty_key() {
        let rendered = render("A {{ }} B", &values(&[("", "filled")]));
        assert_eq!(rendered, "A [___] B");
    }

    #[test]
    fn test_nested_braces_leave_no_placeholder() {
        let rendered = render("{{{{a}}}}", &ValueMap::new());
        assert_eq!(rendered, SENTINEL);
    }

    #[test]
    fn test_empty_placeholder_is_left_alone() {
        assert_eq!(render("Dear {{}},", &ValueMap::new()), "Dear {{}},");
    }

    #[test]
    fn test_no_placeholders() {
        assert_eq!(render("Plain text", &values(&[("a", "b")])), "Plain text");
    }

    #[test]
    fn test_unicode_values_and_names() {
        let rendered = render(
            "{{ nombre }} – {{名前}}",
            &values(&[("nombre", "Søren"), ("名前", "太郎")]),
        );
        assert_eq!(rendered, "Søren – 太郎");
    }

    #[test]
    fn test_missing_variables() {
        let missing = missing_variables(
            "{{a}} {{b}} {{c}} {{a}}",
            &values(&[("b", "filled")]),
        );
        assert_eq!(missing, vec!["a", "c"]);
    }
}
