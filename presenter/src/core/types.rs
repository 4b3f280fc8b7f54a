//! Shared deterministic types for the presenter core.
//!
//! These types define stable contracts between core components and the JSON
//! inputs produced by the rule-parsing and document-validation collaborators.
//! They carry no I/O and must serialize identically across runs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Role value that disables role filtering.
pub const ALL_ROLES: &str = "all";

/// A single Schematron assertion (one compliance rule check).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assertion {
    pub id: String,
    pub message: String,
    /// Classification used by the role filter. Absent roles load as `""`.
    #[serde(default)]
    pub role: String,
    /// `true` for `sch:report` rules, `false` for `sch:assert` rules.
    #[serde(default)]
    pub is_report: bool,
    /// XPath test expression of the rule, when the parser kept it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test: Option<String>,
    /// Link to supporting guidance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub see: Option<String>,
}

/// Titled section of an assertion view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssertionGroup {
    pub title: String,
    /// May reference ids that are filtered out or unknown.
    pub assertion_ids: Vec<String>,
}

/// Curated grouping of assertions for presentation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionView {
    pub title: String,
    pub groups: Vec<AssertionGroup>,
}

impl AssertionView {
    /// View used when no view is selected or the selected id is unknown.
    pub fn placeholder() -> Self {
        Self::default()
    }
}

/// Rule metadata delivered once by the config-load event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchematronConfig {
    #[serde(default)]
    pub assertion_views: Vec<AssertionView>,
    #[serde(default)]
    pub schematron_asserts: Vec<Assertion>,
}

/// Identifier of an assertion view. `0` means "no view selected"; views are
/// numbered from `1` in config order.
pub type AssertionViewId = u32;

/// User-controlled filter state. Mutated only through presenter events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    pub role: String,
    pub text: String,
    pub assertion_view_id: AssertionViewId,
}

impl Default for Filter {
    fn default() -> Self {
        Self {
            role: ALL_ROLES.to_string(),
            text: String::new(),
            assertion_view_id: 0,
        }
    }
}

/// Selectable assertion view entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewOption {
    pub id: AssertionViewId,
    pub title: String,
}

/// Choices offered to the filter controls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub assertion_views: Vec<ViewOption>,
    /// `"all"` followed by the sorted distinct catalog roles.
    pub roles: Vec<String>,
}

/// One recorded violation of an assertion at a document location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedAssert {
    /// Id of the assertion that fired.
    pub id: String,
    /// Document path of the offending node.
    pub location: String,
    /// Rendered diagnostic text.
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub see: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostic_references: Vec<String>,
}

/// Output of one document validation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub failed_asserts: Vec<FailedAssert>,
}

/// Violations indexed by assertion id. Absent or empty means the assertion passes.
pub type FiredAssertions = BTreeMap<String, Vec<FailedAssert>>;
