//! Test-only builders for catalogs, views and validator output.

use crate::core::types::{
    Assertion, AssertionGroup, AssertionView, FailedAssert, FiredAssertions, SchematronConfig,
};
use crate::core::validator::{ValidatorPhase, ValidatorProjection};

/// Create an `sch:assert` assertion with deterministic defaults.
pub fn assertion(id: &str, role: &str, message: &str) -> Assertion {
    Assertion {
        id: id.to_string(),
        message: message.to_string(),
        role: role.to_string(),
        is_report: false,
        test: None,
        see: None,
    }
}

/// Create an `sch:report` assertion.
pub fn report_assertion(id: &str, role: &str, message: &str) -> Assertion {
    Assertion {
        is_report: true,
        ..assertion(id, role, message)
    }
}

pub fn group(title: &str, ids: &[&str]) -> AssertionGroup {
    AssertionGroup {
        title: title.to_string(),
        assertion_ids: ids.iter().map(|id| id.to_string()).collect(),
    }
}

pub fn view(title: &str, groups: Vec<AssertionGroup>) -> AssertionView {
    AssertionView {
        title: title.to_string(),
        groups,
    }
}

pub fn config(asserts: Vec<Assertion>, views: Vec<AssertionView>) -> SchematronConfig {
    SchematronConfig {
        assertion_views: views,
        schematron_asserts: asserts,
    }
}

/// Create a violation of `id` at `location`.
pub fn failed(id: &str, location: &str) -> FailedAssert {
    FailedAssert {
        id: id.to_string(),
        location: location.to_string(),
        text: format!("{} fired", id),
        role: None,
        see: None,
        diagnostic_references: Vec::new(),
    }
}

/// Validator whose projection is set directly by the test.
#[derive(Debug, Clone)]
pub struct StubValidator {
    pub phase: ValidatorPhase,
    pub fired: FiredAssertions,
}

impl StubValidator {
    pub fn new(phase: ValidatorPhase) -> Self {
        Self {
            phase,
            fired: FiredAssertions::new(),
        }
    }

    /// Record a violation under its assertion id.
    pub fn fire(&mut self, failed: FailedAssert) {
        self.fired.entry(failed.id.clone()).or_default().push(failed);
    }
}

impl ValidatorProjection for StubValidator {
    fn current(&self) -> ValidatorPhase {
        self.phase
    }

    fn assertions_by_id(&self) -> &FiredAssertions {
        &self.fired
    }
}
