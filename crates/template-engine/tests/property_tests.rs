//! Property-based tests for template-engine
//!
//! Exercises extraction, validation and rendering over generated
//! template text using proptest.

use proptest::prelude::*;
use template_engine::{
    extract_variables, missing_variables, prepare, render, validate, ValueMap, SENTINEL,
};

// ============================================================
// Strategies
// ============================================================

/// Variable names as template authors write them
fn variable_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,11}"
}

/// Literal text with no braces
fn literal_text() -> impl Strategy<Value = String> {
    "[A-Za-z0-9 ,.:;\n-]{0,20}"
}

/// Arbitrary text biased towards brace-heavy input
fn brace_soup() -> impl Strategy<Value = String> {
    proptest::collection::vec(
        prop_oneof![
            Just("{".to_string()),
            Just("}".to_string()),
            Just("{{".to_string()),
            Just("}}".to_string()),
            Just(" ".to_string()),
            "[a-z]{1,4}",
            "\\PC{1,3}",
        ],
        0..30,
    )
    .prop_map(|parts| parts.concat())
}

/// A well-formed template and the names it uses, in order of appearance
fn well_formed_template() -> impl Strategy<Value = (String, Vec<String>)> {
    proptest::collection::vec((literal_text(), variable_name(), 0usize..3), 1..8).prop_map(
        |segments| {
            let mut content = String::new();
            let mut names = Vec::new();
            for (text, name, padding) in segments {
                content.push_str(&text);
                content.push_str("{{");
                content.push_str(&" ".repeat(padding));
                content.push_str(&name);
                content.push_str(&" ".repeat(padding));
                content.push_str("}}");
                names.push(name);
            }
            content.push('.');
            (content, names)
        },
    )
}

fn value_map() -> impl Strategy<Value = ValueMap> {
    proptest::collection::hash_map(variable_name(), "\\PC{0,12}", 0..6)
}

fn has_placeholder(text: &str) -> bool {
    regex::Regex::new(r"\{\{[^{}]+\}\}").unwrap().is_match(text)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    // ============================================================
    // Extraction
    // ============================================================

    #[test]
    fn extraction_is_idempotent(content in brace_soup()) {
        prop_assert_eq!(extract_variables(&content), extract_variables(&content));
    }

    #[test]
    fn extraction_is_deduplicated_and_trimmed(content in brace_soup()) {
        let vars = extract_variables(&content);
        let mut seen = std::collections::HashSet::new();
        for var in &vars {
            prop_assert!(!var.is_empty());
            prop_assert_eq!(var.trim(), var.as_str());
            prop_assert!(!var.contains('{') && !var.contains('}'), "brace in {:?}", var);
            prop_assert!(seen.insert(var.clone()), "duplicate variable {}", var);
        }
    }

    #[test]
    fn extraction_follows_first_appearance((content, names) in well_formed_template()) {
        let mut expected: Vec<String> = Vec::new();
        for name in names {
            if !expected.contains(&name) {
                expected.push(name);
            }
        }
        prop_assert_eq!(extract_variables(&content), expected);
    }

    // ============================================================
    // Validation
    // ============================================================

    #[test]
    fn well_formed_templates_validate((content, _names) in well_formed_template()) {
        let report = validate(&content);
        prop_assert!(report.is_valid, "unexpected errors: {:?}", report.errors);
        prop_assert!(prepare(&content).is_ok());
    }

    #[test]
    fn validity_matches_error_list(content in brace_soup()) {
        let report = validate(&content);
        prop_assert_eq!(report.is_valid, report.errors.is_empty());
        prop_assert!(report.errors.len() <= 3);
    }

    #[test]
    fn dangling_open_brace_is_reported((content, _names) in well_formed_template()) {
        let broken = format!("{} {{{{", content);
        let report = validate(&broken);
        prop_assert!(report.errors.iter().any(|e| e == "Unmatched template braces detected"));
    }

    // ============================================================
    // Rendering
    // ============================================================

    #[test]
    fn render_resolves_every_placeholder(content in brace_soup(), values in value_map()) {
        let rendered = render(&content, &values);
        prop_assert!(!has_placeholder(&rendered), "unresolved placeholder in {:?}", rendered);
    }

    #[test]
    fn render_is_deterministic(content in brace_soup(), values in value_map()) {
        prop_assert_eq!(render(&content, &values), render(&content, &values));
    }

    #[test]
    fn render_with_no_values_uses_sentinel((content, names) in well_formed_template()) {
        let rendered = render(&content, &ValueMap::new());
        prop_assert_eq!(rendered.matches(SENTINEL).count(), names.len());
    }

    #[test]
    fn render_with_all_values_has_no_sentinel(
        (content, names) in well_formed_template(),
        value in "[A-Za-z0-9 ]{0,10}",
    ) {
        let values: ValueMap = names.iter().map(|n| (n.clone(), value.clone())).collect();
        let rendered = render(&content, &values);
        prop_assert!(!rendered.contains(SENTINEL));
        prop_assert!(missing_variables(&content, &values).is_empty());
    }

    #[test]
    fn text_without_braces_is_untouched(text in "[^{}]{0,64}", values in value_map()) {
        prop_assert_eq!(render(&text, &values), text);
    }
}

// ============================================================
// Unit Tests (non-property)
// ============================================================

#[cfg(test)]
mod unit_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_order_template_round_trip() {
        let content = "OFFICE ORDER No. {{order_number}}\nDate: {{date}}\n\n{{ body }}\n\n{{signatory}}";
        let prepared = prepare(content).unwrap();
        assert_eq!(
            prepared.variables,
            vec!["order_number", "date", "body", "signatory"]
        );

        let mut values = ValueMap::new();
        values.insert("order_number".into(), "ORD-2024-0001".into());
        values.insert("date".into(), "2024-03-01".into());
        values.insert("body".into(), "You are hereby assigned.".into());

        assert_eq!(
            render(content, &values),
            "OFFICE ORDER No. ORD-2024-0001\nDate: 2024-03-01\n\nYou are hereby assigned.\n\n[___]"
        );
        assert_eq!(missing_variables(content, &values), vec!["signatory"]);
    }

    #[test]
    fn test_trim_equivalence_across_operations() {
        let mut values = ValueMap::new();
        values.insert("foo".into(), "bar".into());
        assert_eq!(extract_variables("{{ foo }}"), extract_variables("{{foo}}"));
        assert_eq!(render("{{ foo }}|{{foo}}", &values), "bar|bar");
    }
}
