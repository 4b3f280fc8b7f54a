//! Grouped report built from the filtered catalog and validator output.
//!
//! Missing data never fails a report: an unknown view id selects an empty
//! placeholder, and group entries that are filtered out or unknown are dropped.
//! Visual treatment of [`CheckStatus`] and [`SummaryColor`] is left to the
//! renderer.

use std::collections::HashMap;

use serde::Serialize;

use crate::core::types::{
    Assertion, AssertionView, AssertionViewId, FailedAssert, FilterOptions, SchematronConfig,
};
use crate::core::validator::ValidatorSnapshot;

/// Display status of one assertion in the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    /// No completed validation run yet.
    Pending,
    Pass,
    Fail,
}

/// Status of an assertion given whether validation completed and how often it fired.
pub fn check_status(validated: bool, violation_count: usize) -> CheckStatus {
    match (validated, violation_count) {
        (false, _) => CheckStatus::Pending,
        (true, 0) => CheckStatus::Pass,
        (true, _) => CheckStatus::Fail,
    }
}

/// Semantic color of a group summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryColor {
    Pass,
    Fail,
}

/// Titles used for the top-level summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLabels {
    pub title: String,
    /// Appended to `title` until a validation run completes.
    pub unprocessed_suffix: String,
}

impl Default for ReportLabels {
    fn default() -> Self {
        Self {
            title: "FedRAMP Package Concerns".to_string(),
            unprocessed_suffix: "(unprocessed)".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportCheck {
    #[serde(flatten)]
    pub assertion: Assertion,
    pub status: CheckStatus,
    /// Violations of this assertion; empty unless validated.
    pub fired: Vec<FailedAssert>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupChecks {
    pub summary: String,
    pub summary_color: SummaryColor,
    pub checks: Vec<ReportCheck>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportGroup {
    pub title: String,
    pub checks: GroupChecks,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportCounts {
    pub assertions: usize,
    pub reports: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub title: String,
    pub counts: ReportCounts,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchematronReport {
    pub summary: ReportSummary,
    pub groups: Vec<ReportGroup>,
}

/// Resolve the active view. `0` and ids missing from `options` give the placeholder.
pub fn select_view(
    config: &SchematronConfig,
    options: &FilterOptions,
    view_id: AssertionViewId,
) -> AssertionView {
    if view_id == 0 || !options.assertion_views.iter().any(|view| view.id == view_id) {
        return AssertionView::placeholder();
    }
    usize::try_from(view_id - 1)
        .ok()
        .and_then(|index| config.assertion_views.get(index))
        .cloned()
        .unwrap_or_else(AssertionView::placeholder)
}

/// Build the report for the active view.
///
/// `by_id` maps assertion ids to positions in `filtered`.
pub fn build_report(
    filtered: &[Assertion],
    by_id: &HashMap<String, usize>,
    view: &AssertionView,
    validator: &ValidatorSnapshot,
    labels: &ReportLabels,
) -> SchematronReport {
    let validated = validator.is_validated();
    let reports = filtered.iter().filter(|assertion| assertion.is_report).count();
    let title = if validated {
        labels.title.clone()
    } else {
        format!("{} {}", labels.title, labels.unprocessed_suffix)
    };

    let groups = view
        .groups
        .iter()
        .map(|group| {
            let checks: Vec<ReportCheck> = group
                .assertion_ids
                .iter()
                .filter_map(|id| by_id.get(id).and_then(|position| filtered.get(*position)))
                .map(|assertion| {
                    let fired = if validated {
                        validator
                            .fired
                            .get(&assertion.id)
                            .cloned()
                            .unwrap_or_default()
                    } else {
                        Vec::new()
                    };
                    ReportCheck {
                        assertion: assertion.clone(),
                        status: check_status(validated, fired.len()),
                        fired,
                    }
                })
                .collect();
            let fired_count = checks.iter().filter(|check| !check.fired.is_empty()).count();
            let summary = if validated {
                format!("{} / {} triggered", fired_count, checks.len())
            } else {
                format!("{} checks", checks.len())
            };
            ReportGroup {
                title: group.title.clone(),
                checks: GroupChecks {
                    summary,
                    summary_color: if fired_count == 0 {
                        SummaryColor::Pass
                    } else {
                        SummaryColor::Fail
                    },
                    checks,
                },
            }
        })
        .collect();

    SchematronReport {
        summary: ReportSummary {
            title,
            counts: ReportCounts {
                assertions: filtered.len() - reports,
                reports,
            },
        },
        groups,
    }
}

impl SchematronReport {
    /// Number of checks across all groups that fired at least once.
    pub fn fired_checks(&self) -> usize {
        self.groups
            .iter()
            .flat_map(|group| &group.checks.checks)
            .filter(|check| check.status == CheckStatus::Fail)
            .count()
    }
}

/// Catalog assertions with at least one violation in a completed run.
///
/// Independent of the filter and the selected view.
pub fn fired_assertions(catalog: &[Assertion], validator: &ValidatorSnapshot) -> usize {
    if !validator.is_validated() {
        return 0;
    }
    catalog
        .iter()
        .filter(|assertion| {
            validator
                .fired
                .get(&assertion.id)
                .is_some_and(|fired| !fired.is_empty())
        })
        .count()
}
