//! Single dispatch point for presenter events.
//!
//! [`Presenter`] owns the machine state, the validator handle and the derived
//! values. Every dispatch runs the pure transition, marks the base inputs that
//! changed, recomputes stale derived values in dependency order and publishes a
//! new [`Snapshot`] before returning. `&mut self` keeps dispatches serialized.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::core::filter::{filter_assertions, filter_options, index_by_id};
use crate::core::graph::{DependencyGraph, GraphError};
use crate::core::machine::{
    BaseState, MachinePhase, MachineState, PresenterEvent, TransitionError, transition,
};
use crate::core::report::{ReportLabels, SchematronReport, build_report, select_view};
use crate::core::types::{Assertion, AssertionView, Filter, FilterOptions};
use crate::core::validator::{ValidatorMachine, ValidatorProjection, ValidatorSnapshot};

/// Nodes of the presenter's value graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Slot {
    Config,
    FilterRole,
    FilterText,
    FilterView,
    Validator,
    FilterOptions,
    FilteredAsserts,
    AssertsById,
    AssertionView,
    Report,
}

const BASE_SLOTS: &[Slot] = &[
    Slot::Config,
    Slot::FilterRole,
    Slot::FilterText,
    Slot::FilterView,
    Slot::Validator,
];

const DERIVED_SLOTS: &[(Slot, &[Slot])] = &[
    (Slot::FilterOptions, &[Slot::Config]),
    (
        Slot::FilteredAsserts,
        &[Slot::Config, Slot::FilterRole, Slot::FilterText],
    ),
    (Slot::AssertsById, &[Slot::FilteredAsserts]),
    (
        Slot::AssertionView,
        &[Slot::Config, Slot::FilterView, Slot::FilterOptions],
    ),
    (
        Slot::Report,
        &[
            Slot::FilteredAsserts,
            Slot::AssertsById,
            Slot::AssertionView,
            Slot::Validator,
        ],
    ),
];

/// Read-only view handed to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub current: MachinePhase,
    pub filter: Filter,
    pub filter_options: Arc<FilterOptions>,
    pub assertion_view: Arc<AssertionView>,
    pub schematron_report: Arc<SchematronReport>,
}

/// Current derived values. Empty until the first refresh.
#[derive(Debug, Clone, Default)]
struct Derived {
    filter_options: Arc<FilterOptions>,
    filtered: Arc<Vec<Assertion>>,
    by_id: Arc<HashMap<String, usize>>,
    assertion_view: Arc<AssertionView>,
    report: Arc<SchematronReport>,
}

pub struct Presenter<V: ValidatorProjection = ValidatorMachine> {
    state: MachineState,
    validator: V,
    consumed: ValidatorSnapshot,
    labels: ReportLabels,
    graph: DependencyGraph<Slot>,
    derived: Derived,
    snapshot: Snapshot,
    last_recomputed: Vec<Slot>,
}

impl Presenter<ValidatorMachine> {
    /// Presenter with a fresh [`ValidatorMachine`] and default labels.
    pub fn with_default_validator() -> Result<Self, GraphError<Slot>> {
        Self::new(ValidatorMachine::new(), ReportLabels::default())
    }
}

impl<V: ValidatorProjection> Presenter<V> {
    /// Create an UNINITIALIZED presenter. Every slot starts stale, so the first
    /// refresh computes each derived value exactly once.
    pub fn new(validator: V, labels: ReportLabels) -> Result<Self, GraphError<Slot>> {
        let graph = DependencyGraph::build(BASE_SLOTS, DERIVED_SLOTS)?;
        let state = MachineState::default();
        let consumed = ValidatorSnapshot::capture(&validator);
        let derived = Derived::default();
        let snapshot = publish(&state, &derived);
        let mut presenter = Self {
            state,
            validator,
            consumed,
            labels,
            graph,
            derived,
            snapshot,
            last_recomputed: Vec::new(),
        };
        presenter.refresh();
        Ok(presenter)
    }

    /// Apply one event. Rejected events change nothing.
    pub fn dispatch(&mut self, event: PresenterEvent) -> Result<&Snapshot, TransitionError> {
        let tag = event.tag();
        let next = match transition(&self.state, event) {
            Ok(next) => next,
            Err(err) => {
                warn!(event = %tag, state = %self.state.phase(), error = %err, "event rejected");
                return Err(err);
            }
        };
        for slot in changed_inputs(self.state.base(), next.base()) {
            self.graph.touch(slot);
        }
        self.state = next;
        self.refresh();
        debug!(
            event = %tag,
            state = %self.state.phase(),
            recomputed = ?self.last_recomputed,
            "event applied"
        );
        Ok(&self.snapshot)
    }

    /// Let the host evolve the validator, then re-read its projection.
    ///
    /// The presenter itself never calls into the validator beyond
    /// [`ValidatorProjection`]; `drive` is host code routed through this
    /// dispatch point so the snapshot is fresh when it returns.
    pub fn drive_validator<R>(&mut self, drive: impl FnOnce(&mut V) -> R) -> R {
        let result = drive(&mut self.validator);
        if self.consumed.matches(&self.validator) {
            self.last_recomputed.clear();
            return result;
        }
        self.consumed = ValidatorSnapshot::capture(&self.validator);
        self.graph.touch(Slot::Validator);
        self.refresh();
        debug!(
            phase = %self.consumed.phase,
            recomputed = ?self.last_recomputed,
            "validator projection changed"
        );
        result
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn state(&self) -> &MachineState {
        &self.state
    }

    pub fn validator(&self) -> &V {
        &self.validator
    }

    /// Derived slots recomputed by the most recent dispatch, in evaluation order.
    pub fn last_recomputed(&self) -> &[Slot] {
        &self.last_recomputed
    }

    fn refresh(&mut self) {
        self.last_recomputed.clear();
        for slot in self.graph.plan().to_vec() {
            if !self.graph.is_stale(slot) {
                continue;
            }
            let changed = self.compute(slot);
            self.graph.settle(slot, changed);
            self.last_recomputed.push(slot);
        }
        self.snapshot = publish(&self.state, &self.derived);
    }

    /// Recompute one derived slot; true if its value changed.
    fn compute(&mut self, slot: Slot) -> bool {
        let base = self.state.base();
        let derived = &mut self.derived;
        match slot {
            Slot::FilterOptions => {
                replace_if_changed(&mut derived.filter_options, filter_options(&base.config))
            }
            Slot::FilteredAsserts => replace_if_changed(
                &mut derived.filtered,
                filter_assertions(
                    &base.config.schematron_asserts,
                    &base.filter.role,
                    &base.filter.text,
                ),
            ),
            Slot::AssertsById => {
                let next = index_by_id(&derived.filtered);
                replace_if_changed(&mut derived.by_id, next)
            }
            Slot::AssertionView => {
                let next = select_view(
                    &base.config,
                    &derived.filter_options,
                    base.filter.assertion_view_id,
                );
                replace_if_changed(&mut derived.assertion_view, next)
            }
            Slot::Report => {
                let next = build_report(
                    &derived.filtered,
                    &derived.by_id,
                    &derived.assertion_view,
                    &self.consumed,
                    &self.labels,
                );
                replace_if_changed(&mut derived.report, next)
            }
            Slot::Config
            | Slot::FilterRole
            | Slot::FilterText
            | Slot::FilterView
            | Slot::Validator => false,
        }
    }
}

/// Base slots whose value differs between two machine states.
fn changed_inputs(prev: &BaseState, next: &BaseState) -> Vec<Slot> {
    let mut changed = Vec::new();
    if !Arc::ptr_eq(&prev.config, &next.config) {
        changed.push(Slot::Config);
    }
    if prev.filter.role != next.filter.role {
        changed.push(Slot::FilterRole);
    }
    if prev.filter.text != next.filter.text {
        changed.push(Slot::FilterText);
    }
    if prev.filter.assertion_view_id != next.filter.assertion_view_id {
        changed.push(Slot::FilterView);
    }
    changed
}

fn replace_if_changed<T: PartialEq>(current: &mut Arc<T>, next: T) -> bool {
    if **current == next {
        return false;
    }
    *current = Arc::new(next);
    true
}

fn publish(state: &MachineState, derived: &Derived) -> Snapshot {
    Snapshot {
        current: state.phase(),
        filter: state.base().filter.clone(),
        filter_options: Arc::clone(&derived.filter_options),
        assertion_view: Arc::clone(&derived.assertion_view),
        schematron_report: Arc::clone(&derived.report),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::machine::EventTag;
    use crate::core::report::{CheckStatus, SummaryColor};
    use crate::core::types::ValidationReport;
    use crate::core::validator::{ValidatorEvent, ValidatorPhase};
    use crate::test_support::{
        StubValidator, assertion, config, failed, group, report_assertion, view,
    };

    fn sample_config() -> crate::core::types::SchematronConfig {
        config(
            vec![
                assertion("a1", "a", "some foo bar"),
                assertion("a2", "a", "second"),
                report_assertion("b1", "b", "third"),
            ],
            vec![
                view("By role", vec![group("Role a", &["a1", "a2"]), group("Role b", &["b1"])]),
                view("Other", vec![group("Mixed", &["b1", "a1", "unknown"])]),
            ],
        )
    }

    fn loaded() -> Presenter {
        let mut presenter = Presenter::with_default_validator().expect("presenter");
        presenter
            .dispatch(PresenterEvent::ConfigLoaded {
                config: sample_config(),
            })
            .expect("load");
        presenter
    }

    /// The declared slots form an acyclic graph.
    #[test]
    fn slot_graph_builds() {
        let graph = DependencyGraph::build(BASE_SLOTS, DERIVED_SLOTS).expect("acyclic");
        assert_eq!(graph.plan().len(), DERIVED_SLOTS.len());
    }

    #[test]
    fn new_presenter_is_uninitialized_with_empty_report() {
        let presenter = Presenter::with_default_validator().expect("presenter");
        let snapshot = presenter.snapshot();
        assert_eq!(snapshot.current, MachinePhase::Uninitialized);
        assert_eq!(snapshot.filter, Filter::default());
        assert_eq!(snapshot.filter_options.roles, vec!["all"]);
        assert!(snapshot.schematron_report.groups.is_empty());
    }

    /// Construction evaluates each derived slot once, in plan order.
    #[test]
    fn new_presenter_computes_each_slot_once() {
        let presenter = Presenter::with_default_validator().expect("presenter");
        let graph = DependencyGraph::build(BASE_SLOTS, DERIVED_SLOTS).expect("acyclic");
        assert_eq!(presenter.last_recomputed(), graph.plan());
        assert_eq!(
            presenter.snapshot().schematron_report.summary.title,
            "FedRAMP Package Concerns (unprocessed)"
        );
    }

    /// Config load recomputes every derived slot.
    #[test]
    fn config_load_recomputes_everything() {
        let presenter = loaded();
        assert_eq!(presenter.last_recomputed().len(), DERIVED_SLOTS.len());
        assert_eq!(presenter.snapshot().filter_options.roles, vec!["all", "a", "b"]);
        assert_eq!(
            presenter.snapshot().schematron_report.summary.counts.assertions,
            2
        );
    }

    /// Text edits leave filter options and the selected view untouched.
    #[test]
    fn text_change_skips_unrelated_slots() {
        let mut presenter = loaded();
        let options_before = Arc::clone(&presenter.snapshot().filter_options);
        presenter
            .dispatch(PresenterEvent::FilterTextChanged {
                text: "FOO".to_string(),
            })
            .expect("text");

        let recomputed = presenter.last_recomputed();
        assert!(!recomputed.contains(&Slot::FilterOptions));
        assert!(!recomputed.contains(&Slot::AssertionView));
        assert!(recomputed.contains(&Slot::FilteredAsserts));
        assert!(Arc::ptr_eq(&options_before, &presenter.snapshot().filter_options));
        assert_eq!(
            presenter.snapshot().schematron_report.summary.counts,
            crate::core::report::ReportCounts {
                assertions: 1,
                reports: 0
            }
        );
    }

    /// A filter edit that selects the same assertions stops before the report.
    #[test]
    fn equal_filter_result_cuts_off_report() {
        let mut presenter = loaded();
        presenter
            .dispatch(PresenterEvent::FilterTextChanged {
                text: "e".to_string(),
            })
            .expect("text");
        presenter
            .dispatch(PresenterEvent::FilterTextChanged {
                text: "E".to_string(),
            })
            .expect("text");
        assert_eq!(presenter.last_recomputed(), &[Slot::FilteredAsserts]);
    }

    #[test]
    fn view_selection_populates_report_groups() {
        let mut presenter = loaded();
        presenter
            .dispatch(PresenterEvent::FilterAssertionViewChanged {
                assertion_view_id: 2,
            })
            .expect("view");
        let snapshot = presenter.snapshot();
        assert_eq!(snapshot.assertion_view.title, "Other");
        let checks = &snapshot.schematron_report.groups[0].checks.checks;
        let ids: Vec<&str> = checks.iter().map(|c| c.assertion.id.as_str()).collect();
        assert_eq!(ids, vec!["b1", "a1"]);

        presenter
            .dispatch(PresenterEvent::FilterAssertionViewChanged {
                assertion_view_id: 0,
            })
            .expect("view");
        assert!(presenter.snapshot().assertion_view.groups.is_empty());
        assert!(presenter.snapshot().schematron_report.groups.is_empty());
    }

    /// Rejected events keep state, snapshot and config.
    #[test]
    fn rejected_events_change_nothing() {
        let mut presenter = loaded();
        let before = presenter.snapshot().clone();
        let err = presenter
            .dispatch(PresenterEvent::ConfigLoaded {
                config: config(Vec::new(), Vec::new()),
            })
            .expect_err("second load");
        assert!(matches!(
            err,
            TransitionError::Rejected {
                event: EventTag::ConfigLoaded,
                ..
            }
        ));
        assert_eq!(presenter.snapshot(), &before);
        assert_eq!(presenter.state().base().config.schematron_asserts.len(), 3);
    }

    /// Validator progress flows into the report through the projection only.
    #[test]
    fn validator_completion_updates_report() {
        let mut presenter = loaded();
        presenter
            .dispatch(PresenterEvent::FilterAssertionViewChanged {
                assertion_view_id: 1,
            })
            .expect("view");
        assert_eq!(
            presenter.snapshot().schematron_report.groups[0].checks.summary,
            "2 checks"
        );

        presenter
            .drive_validator(|validator| {
                validator.dispatch(ValidatorEvent::ProcessFile {
                    file_name: "ssp.xml".to_string(),
                })
            })
            .expect("process");
        presenter
            .drive_validator(|validator| {
                validator.dispatch(ValidatorEvent::Completed {
                    report: ValidationReport {
                        failed_asserts: vec![failed("a2", "/a"), failed("a2", "/b")],
                    },
                })
            })
            .expect("complete");

        let report = &presenter.snapshot().schematron_report;
        assert_eq!(report.summary.title, "FedRAMP Package Concerns");
        let group = &report.groups[0];
        assert_eq!(group.checks.summary, "1 / 2 triggered");
        assert_eq!(group.checks.summary_color, SummaryColor::Fail);
        assert_eq!(group.checks.checks[1].status, CheckStatus::Fail);
        assert_eq!(group.checks.checks[1].fired.len(), 2);
        assert_eq!(report.groups[1].checks.summary_color, SummaryColor::Pass);
    }

    /// An unchanged projection does not recompute anything.
    #[test]
    fn identical_projection_is_ignored() {
        let mut presenter = Presenter::new(
            StubValidator::new(ValidatorPhase::Untested),
            ReportLabels::default(),
        )
        .expect("presenter");
        presenter
            .dispatch(PresenterEvent::ConfigLoaded {
                config: sample_config(),
            })
            .expect("load");
        presenter.drive_validator(|_| ());
        assert!(presenter.last_recomputed().is_empty());

        presenter.drive_validator(|stub| stub.phase = ValidatorPhase::Validated);
        assert_eq!(presenter.last_recomputed(), &[Slot::Report]);
    }

    /// Violations present before validation completes do not change statuses.
    #[test]
    fn pending_ignores_present_violations() {
        let mut stub = StubValidator::new(ValidatorPhase::Processing);
        stub.fire(failed("a1", "/x"));
        let mut presenter = Presenter::new(stub, ReportLabels::default()).expect("presenter");
        presenter
            .dispatch(PresenterEvent::ConfigLoaded {
                config: sample_config(),
            })
            .expect("load");
        presenter
            .dispatch(PresenterEvent::FilterAssertionViewChanged {
                assertion_view_id: 1,
            })
            .expect("view");

        let report = &presenter.snapshot().schematron_report;
        assert!(report.summary.title.ends_with("(unprocessed)"));
        for group in &report.groups {
            assert_eq!(group.checks.summary_color, SummaryColor::Pass);
            assert!(
                group
                    .checks
                    .checks
                    .iter()
                    .all(|check| check.status == CheckStatus::Pending)
            );
        }
    }

    /// Config load does not reset the validator.
    #[test]
    fn parent_events_leave_validator_alone() {
        let mut presenter = Presenter::with_default_validator().expect("presenter");
        presenter
            .drive_validator(|validator| {
                validator.dispatch(ValidatorEvent::ProcessFile {
                    file_name: "ssp.xml".to_string(),
                })
            })
            .expect("process");
        presenter
            .dispatch(PresenterEvent::ConfigLoaded {
                config: sample_config(),
            })
            .expect("load");
        assert_eq!(presenter.validator().current(), ValidatorPhase::Processing);
    }
}
