//! Variable extraction

use std::collections::HashSet;

use crate::patterns::PLACEHOLDER;

/// Extract the distinct variable names referenced by `{{name}}` placeholders.
///
/// Names are trimmed before deduplication, so `{{ foo }}` and `{{foo}}`
/// are the same variable. The result keeps first-occurrence order.
/// Placeholders whose name is blank are skipped; validation reports them.
pub fn extract_variables(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut variables = Vec::new();

    for caps in PLACEHOLDER.captures_iter(content) {
        let name = caps.get(1).map_or("", |m| m.as_str()).trim();
        if name.is_empty() {
            continue;
        }
        if seen.insert(name) {
            variables.push(name.to_string());
        }
    }

    variables
}
