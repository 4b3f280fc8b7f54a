//! Document validator sub-machine and the read-only view the presenter uses.
//!
//! The presenter depends only on [`ValidatorProjection`]. [`ValidatorMachine`]
//! is the stock implementation: it records where a validation run came from
//! and indexes the violations reported by the rule-execution engine.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::core::types::{FiredAssertions, ValidationReport};

/// Read capability the presenter holds on its validator.
pub trait ValidatorProjection {
    /// Current phase of the validator.
    fn current(&self) -> ValidatorPhase;

    /// Violations of the last completed run, by assertion id.
    fn assertions_by_id(&self) -> &FiredAssertions;
}

/// Coarse phase exposed through [`ValidatorProjection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidatorPhase {
    Untested,
    Processing,
    Validated,
    ValidationError,
}

impl ValidatorPhase {
    /// Only a completed run counts as validated.
    pub fn is_validated(self) -> bool {
        self == ValidatorPhase::Validated
    }
}

impl fmt::Display for ValidatorPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ValidatorPhase::Untested => "UNTESTED",
            ValidatorPhase::Processing => "PROCESSING",
            ValidatorPhase::Validated => "VALIDATED",
            ValidatorPhase::ValidationError => "VALIDATION_ERROR",
        })
    }
}

/// Where the document under validation came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSource {
    File(String),
    Url(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ValidatorState {
    #[default]
    Untested,
    Processing { source: DocumentSource },
    Validated { source: DocumentSource, failed: usize },
    ValidationError { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidatorEvent {
    ProcessFile { file_name: String },
    ProcessUrl { url: String },
    Completed { report: ValidationReport },
    Failed { message: String },
    Reset,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidatorError {
    #[error("validator event {event} is not accepted in phase {phase}")]
    Rejected {
        phase: ValidatorPhase,
        event: &'static str,
    },
}

/// Stock validator sub-machine.
#[derive(Debug, Clone, Default)]
pub struct ValidatorMachine {
    state: ValidatorState,
    fired: FiredAssertions,
}

impl ValidatorMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ValidatorState {
        &self.state
    }

    /// Apply `event`. Rejected events leave the machine unchanged.
    pub fn dispatch(&mut self, event: ValidatorEvent) -> Result<(), ValidatorError> {
        let (state, fired) = advance(&self.state, event)?;
        self.state = state;
        if let Some(fired) = fired {
            self.fired = fired;
        }
        Ok(())
    }
}

/// Next state plus, when it changes, the new violation index.
fn advance(
    state: &ValidatorState,
    event: ValidatorEvent,
) -> Result<(ValidatorState, Option<FiredAssertions>), ValidatorError> {
    match (state, event) {
        (
            ValidatorState::Untested
            | ValidatorState::Validated { .. }
            | ValidatorState::ValidationError { .. },
            ValidatorEvent::ProcessFile { file_name },
        ) => Ok((
            ValidatorState::Processing {
                source: DocumentSource::File(file_name),
            },
            None,
        )),
        (
            ValidatorState::Untested
            | ValidatorState::Validated { .. }
            | ValidatorState::ValidationError { .. },
            ValidatorEvent::ProcessUrl { url },
        ) => Ok((
            ValidatorState::Processing {
                source: DocumentSource::Url(url),
            },
            None,
        )),
        (ValidatorState::Processing { source }, ValidatorEvent::Completed { report }) => Ok((
            ValidatorState::Validated {
                source: source.clone(),
                failed: report.failed_asserts.len(),
            },
            Some(index_failed_asserts(report)),
        )),
        (ValidatorState::Processing { .. }, ValidatorEvent::Failed { message }) => Ok((
            ValidatorState::ValidationError { message },
            Some(FiredAssertions::new()),
        )),
        (_, ValidatorEvent::Reset) => Ok((ValidatorState::Untested, Some(FiredAssertions::new()))),
        (
            ValidatorState::Processing { .. },
            event @ (ValidatorEvent::ProcessFile { .. } | ValidatorEvent::ProcessUrl { .. }),
        )
        | (
            ValidatorState::Untested
            | ValidatorState::Validated { .. }
            | ValidatorState::ValidationError { .. },
            event @ (ValidatorEvent::Completed { .. } | ValidatorEvent::Failed { .. }),
        ) => Err(ValidatorError::Rejected {
            phase: phase_of(state),
            event: event_name(&event),
        }),
    }
}

fn phase_of(state: &ValidatorState) -> ValidatorPhase {
    match state {
        ValidatorState::Untested => ValidatorPhase::Untested,
        ValidatorState::Processing { .. } => ValidatorPhase::Processing,
        ValidatorState::Validated { .. } => ValidatorPhase::Validated,
        ValidatorState::ValidationError { .. } => ValidatorPhase::ValidationError,
    }
}

impl ValidatorProjection for ValidatorMachine {
    fn current(&self) -> ValidatorPhase {
        phase_of(&self.state)
    }

    fn assertions_by_id(&self) -> &FiredAssertions {
        &self.fired
    }
}

/// Copy of a projection as last consumed by the presenter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorSnapshot {
    pub phase: ValidatorPhase,
    pub fired: Arc<FiredAssertions>,
}

impl ValidatorSnapshot {
    pub fn capture<V: ValidatorProjection + ?Sized>(validator: &V) -> Self {
        Self {
            phase: validator.current(),
            fired: Arc::new(validator.assertions_by_id().clone()),
        }
    }

    /// True if `validator` still projects exactly this phase and mapping.
    pub fn matches<V: ValidatorProjection + ?Sized>(&self, validator: &V) -> bool {
        self.phase == validator.current() && *self.fired == *validator.assertions_by_id()
    }

    pub fn is_validated(&self) -> bool {
        self.phase.is_validated()
    }
}

/// Group violations by assertion id, keeping report order within each id.
pub fn index_failed_asserts(report: ValidationReport) -> FiredAssertions {
    let mut fired = FiredAssertions::new();
    for failed in report.failed_asserts {
        fired.entry(failed.id.clone()).or_default().push(failed);
    }
    fired
}

fn event_name(event: &ValidatorEvent) -> &'static str {
    match event {
        ValidatorEvent::ProcessFile { .. } => "PROCESS_FILE",
        ValidatorEvent::ProcessUrl { .. } => "PROCESS_URL",
        ValidatorEvent::Completed { .. } => "COMPLETED",
        ValidatorEvent::Failed { .. } => "FAILED",
        ValidatorEvent::Reset => "RESET",
    }
}
