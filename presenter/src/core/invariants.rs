//! Semantic invariants of a loaded rule catalog.

use std::collections::HashSet;

use crate::core::types::SchematronConfig;

/// Check catalog invariants the rule parser does not guarantee by shape alone:
/// - No empty assertion ids
/// - No duplicate assertion ids
/// - No untitled assertion views
///
/// Group entries pointing at unknown ids are allowed; the report drops them.
pub fn validate_config(config: &SchematronConfig) -> Vec<String> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for (index, assertion) in config.schematron_asserts.iter().enumerate() {
        if assertion.id.trim().is_empty() {
            errors.push(format!("schematronAsserts[{}]: empty assertion id", index));
            continue;
        }
        if !seen.insert(assertion.id.as_str()) {
            errors.push(format!(
                "duplicate assertion id '{}' at schematronAsserts[{}]",
                assertion.id, index
            ));
        }
    }

    for (index, view) in config.assertion_views.iter().enumerate() {
        if view.title.trim().is_empty() {
            errors.push(format!("assertionViews[{}]: title must not be empty", index));
        }
    }

    errors
}
