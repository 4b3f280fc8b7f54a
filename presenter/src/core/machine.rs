//! Presenter lifecycle: `UNINITIALIZED -> INITIALIZED`.
//!
//! [`transition`] is pure. It only reads its arguments and returns a new state
//! that shares the loaded config with the previous one by `Arc`.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::core::filter::is_known_role;
use crate::core::invariants::validate_config;
use crate::core::types::{AssertionViewId, Filter, SchematronConfig};

/// Fields every machine state carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseState {
    pub config: Arc<SchematronConfig>,
    pub filter: Filter,
}

impl Default for BaseState {
    fn default() -> Self {
        Self {
            config: Arc::new(SchematronConfig::default()),
            filter: Filter::default(),
        }
    }
}

/// Presenter machine state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MachineState {
    /// No config yet. Holds an empty config and the default filter.
    Uninitialized(BaseState),
    /// Config loaded. Terminal: only filter fields change from here on.
    Initialized(BaseState),
}

impl Default for MachineState {
    fn default() -> Self {
        MachineState::Uninitialized(BaseState::default())
    }
}

impl MachineState {
    pub fn base(&self) -> &BaseState {
        match self {
            MachineState::Uninitialized(base) | MachineState::Initialized(base) => base,
        }
    }

    pub fn phase(&self) -> MachinePhase {
        match self {
            MachineState::Uninitialized(_) => MachinePhase::Uninitialized,
            MachineState::Initialized(_) => MachinePhase::Initialized,
        }
    }
}

/// Tag of a [`MachineState`], used in snapshots and errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MachinePhase {
    Uninitialized,
    Initialized,
}

impl fmt::Display for MachinePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MachinePhase::Uninitialized => "UNINITIALIZED",
            MachinePhase::Initialized => "INITIALIZED",
        })
    }
}

/// Events accepted by the presenter dispatch point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenterEvent {
    ConfigLoaded { config: SchematronConfig },
    FilterTextChanged { text: String },
    FilterRoleChanged { role: String },
    FilterAssertionViewChanged { assertion_view_id: AssertionViewId },
}

impl PresenterEvent {
    pub fn tag(&self) -> EventTag {
        match self {
            PresenterEvent::ConfigLoaded { .. } => EventTag::ConfigLoaded,
            PresenterEvent::FilterTextChanged { .. } => EventTag::FilterTextChanged,
            PresenterEvent::FilterRoleChanged { .. } => EventTag::FilterRoleChanged,
            PresenterEvent::FilterAssertionViewChanged { .. } => {
                EventTag::FilterAssertionViewChanged
            }
        }
    }
}

/// Payload-free event discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventTag {
    ConfigLoaded,
    FilterTextChanged,
    FilterRoleChanged,
    FilterAssertionViewChanged,
}

impl fmt::Display for EventTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EventTag::ConfigLoaded => "CONFIG_LOADED",
            EventTag::FilterTextChanged => "FILTER_TEXT_CHANGED",
            EventTag::FilterRoleChanged => "FILTER_ROLE_CHANGED",
            EventTag::FilterAssertionViewChanged => "FILTER_ASSERTION_VIEW_CHANGED",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// The current state declares no handler for the event.
    #[error("event {event} is not accepted in state {state}")]
    Rejected { state: MachinePhase, event: EventTag },
    #[error("config rejected: {}", .0.join("; "))]
    InvalidConfig(Vec<String>),
    #[error("unknown role '{role}': not present in the loaded catalog")]
    UnknownRole { role: String },
}

/// Compute the state that follows `state` after `event`.
///
/// Errors leave nothing half-applied: the caller keeps `state` as it was.
pub fn transition(
    state: &MachineState,
    event: PresenterEvent,
) -> Result<MachineState, TransitionError> {
    match (state, event) {
        (MachineState::Uninitialized(_), PresenterEvent::ConfigLoaded { config }) => {
            let errors = validate_config(&config);
            if !errors.is_empty() {
                return Err(TransitionError::InvalidConfig(errors));
            }
            Ok(MachineState::Initialized(BaseState {
                config: Arc::new(config),
                filter: Filter::default(),
            }))
        }
        (MachineState::Initialized(base), PresenterEvent::FilterTextChanged { text }) => {
            Ok(MachineState::Initialized(BaseState {
                config: Arc::clone(&base.config),
                filter: Filter {
                    text,
                    ..base.filter.clone()
                },
            }))
        }
        (MachineState::Initialized(base), PresenterEvent::FilterRoleChanged { role }) => {
            if !is_known_role(&base.config, &role) {
                return Err(TransitionError::UnknownRole { role });
            }
            Ok(MachineState::Initialized(BaseState {
                config: Arc::clone(&base.config),
                filter: Filter {
                    role,
                    ..base.filter.clone()
                },
            }))
        }
        (
            MachineState::Initialized(base),
            PresenterEvent::FilterAssertionViewChanged { assertion_view_id },
        ) => Ok(MachineState::Initialized(BaseState {
            config: Arc::clone(&base.config),
            filter: Filter {
                assertion_view_id,
                ..base.filter.clone()
            },
        })),
        (
            MachineState::Uninitialized(_),
            event @ (PresenterEvent::FilterTextChanged { .. }
            | PresenterEvent::FilterRoleChanged { .. }
            | PresenterEvent::FilterAssertionViewChanged { .. }),
        )
        | (MachineState::Initialized(_), event @ PresenterEvent::ConfigLoaded { .. }) => {
            Err(TransitionError::Rejected {
                state: state.phase(),
                event: event.tag(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{assertion, config, view};

    fn loaded() -> MachineState {
        let cfg = config(
            vec![assertion("a1", "a", "foo"), assertion("b1", "b", "bar")],
            vec![view("View", Vec::new())],
        );
        transition(
            &MachineState::default(),
            PresenterEvent::ConfigLoaded { config: cfg },
        )
        .expect("load config")
    }

    /// Config load moves UNINITIALIZED to INITIALIZED with the default filter.
    #[test]
    fn config_load_initializes() {
        let state = loaded();
        assert_eq!(state.phase(), MachinePhase::Initialized);
        assert_eq!(state.base().filter, Filter::default());
        assert_eq!(state.base().config.schematron_asserts.len(), 2);
    }

    /// A second config load is rejected; the caller keeps the loaded config.
    #[test]
    fn second_config_load_is_rejected() {
        let state = loaded();
        let err = transition(
            &state,
            PresenterEvent::ConfigLoaded {
                config: SchematronConfig::default(),
            },
        )
        .expect_err("expected rejection");
        assert_eq!(
            err,
            TransitionError::Rejected {
                state: MachinePhase::Initialized,
                event: EventTag::ConfigLoaded,
            }
        );
        assert_eq!(state.base().config.schematron_asserts.len(), 2);
    }

    /// Filter events before config load are programming errors.
    #[test]
    fn filter_events_rejected_while_uninitialized() {
        let state = MachineState::default();
        for event in [
            PresenterEvent::FilterTextChanged {
                text: "x".to_string(),
            },
            PresenterEvent::FilterRoleChanged {
                role: "all".to_string(),
            },
            PresenterEvent::FilterAssertionViewChanged {
                assertion_view_id: 1,
            },
        ] {
            let tag = event.tag();
            let err = transition(&state, event).expect_err("expected rejection");
            assert_eq!(
                err,
                TransitionError::Rejected {
                    state: MachinePhase::Uninitialized,
                    event: tag,
                }
            );
        }
    }

    /// Each filter event replaces exactly one field and shares the config.
    #[test]
    fn filter_events_replace_one_field() {
        let state = loaded();
        let next = transition(
            &state,
            PresenterEvent::FilterTextChanged {
                text: "foo".to_string(),
            },
        )
        .expect("text");
        let next = transition(
            &next,
            PresenterEvent::FilterRoleChanged {
                role: "b".to_string(),
            },
        )
        .expect("role");
        let next = transition(
            &next,
            PresenterEvent::FilterAssertionViewChanged {
                assertion_view_id: 7,
            },
        )
        .expect("view");

        assert_eq!(
            next.base().filter,
            Filter {
                role: "b".to_string(),
                text: "foo".to_string(),
                assertion_view_id: 7,
            }
        );
        assert!(Arc::ptr_eq(&state.base().config, &next.base().config));
        assert_eq!(state.base().filter, Filter::default());
    }

    #[test]
    fn role_outside_catalog_is_rejected() {
        let state = loaded();
        let err = transition(
            &state,
            PresenterEvent::FilterRoleChanged {
                role: "zzz".to_string(),
            },
        )
        .expect_err("expected unknown role");
        assert!(err.to_string().contains("zzz"));
    }

    /// Catalog invariant violations keep the machine uninitialized.
    #[test]
    fn invalid_config_is_rejected() {
        let cfg = config(
            vec![assertion("dup", "a", "x"), assertion("dup", "a", "y")],
            Vec::new(),
        );
        let err = transition(
            &MachineState::default(),
            PresenterEvent::ConfigLoaded { config: cfg },
        )
        .expect_err("expected invalid config");
        assert!(matches!(err, TransitionError::InvalidConfig(ref errors) if errors.len() == 1));
    }
}
