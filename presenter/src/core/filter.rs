//! Role/text filtering over the assertion catalog.

use std::collections::{BTreeSet, HashMap};

use crate::core::types::{
    ALL_ROLES, Assertion, AssertionViewId, FilterOptions, SchematronConfig, ViewOption,
};

/// True if `assertion` passes the role and text filters.
///
/// `role == "all"` disables the role filter; an empty `text` disables the
/// case-insensitive substring match on the message.
pub fn matches(assertion: &Assertion, role: &str, text: &str) -> bool {
    let role_ok = role == ALL_ROLES || assertion.role == role;
    let text_ok =
        text.is_empty() || assertion.message.to_lowercase().contains(&text.to_lowercase());
    role_ok && text_ok
}

/// Filter the catalog, preserving catalog order.
pub fn filter_assertions(catalog: &[Assertion], role: &str, text: &str) -> Vec<Assertion> {
    catalog
        .iter()
        .filter(|assertion| matches(assertion, role, text))
        .cloned()
        .collect()
}

/// Positions of the filtered assertions, keyed by assertion id.
pub fn index_by_id(filtered: &[Assertion]) -> HashMap<String, usize> {
    filtered
        .iter()
        .enumerate()
        .map(|(position, assertion)| (assertion.id.clone(), position))
        .collect()
}

/// Filter choices derived from the unfiltered config.
///
/// Views are numbered from `1` so that `0` stays free as the "no view" id.
pub fn filter_options(config: &SchematronConfig) -> FilterOptions {
    let assertion_views = config
        .assertion_views
        .iter()
        .zip(1..)
        .map(|(view, id): (_, AssertionViewId)| ViewOption {
            id,
            title: view.title.clone(),
        })
        .collect();

    let distinct: BTreeSet<&str> = config
        .schematron_asserts
        .iter()
        .map(|assertion| assertion.role.as_str())
        .collect();
    let mut roles = Vec::with_capacity(distinct.len() + 1);
    roles.push(ALL_ROLES.to_string());
    roles.extend(distinct.into_iter().map(str::to_string));

    FilterOptions {
        assertion_views,
        roles,
    }
}

/// True if `role` may be stored in the filter for this catalog.
pub fn is_known_role(config: &SchematronConfig, role: &str) -> bool {
    role == ALL_ROLES
        || config
            .schematron_asserts
            .iter()
            .any(|assertion| assertion.role == role)
}
