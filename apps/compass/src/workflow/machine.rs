//! Workflow state machine — the single source of truth for which view a session
//! shows and which actions it accepts.
//!
//! All changes go through `Workflow::apply`. An event that is not valid for the
//! current state is rejected and leaves the state untouched.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::models::analysis::{AnalysisResult, InputMethod};

/// Ticket handed out on each submit. Completion events must quote it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SubmissionId(pub u64);

#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowState {
    Idle,
    MethodSelected {
        method: InputMethod,
    },
    Submitting {
        method: InputMethod,
        submission: SubmissionId,
    },
    Succeeded {
        method: InputMethod,
        result: AnalysisResult,
    },
    Failed {
        method: InputMethod,
        message: String,
    },
}

impl WorkflowState {
    pub fn name(&self) -> &'static str {
        match self {
            WorkflowState::Idle => "idle",
            WorkflowState::MethodSelected { .. } => "method_selected",
            WorkflowState::Submitting { .. } => "submitting",
            WorkflowState::Succeeded { .. } => "succeeded",
            WorkflowState::Failed { .. } => "failed",
        }
    }

    pub fn method(&self) -> Option<InputMethod> {
        match self {
            WorkflowState::Idle => None,
            WorkflowState::MethodSelected { method }
            | WorkflowState::Submitting { method, .. }
            | WorkflowState::Succeeded { method, .. }
            | WorkflowState::Failed { method, .. } => Some(*method),
        }
    }
}

#[derive(Debug, Clone)]
pub enum WorkflowEvent {
    SelectMethod(InputMethod),
    ChooseDifferentMethod,
    /// Input for `method` passed validation.
    Submit(InputMethod),
    /// Input failed validation; no request is started.
    Reject(String),
    Complete {
        submission: SubmissionId,
        result: AnalysisResult,
    },
    Fail {
        submission: SubmissionId,
        message: String,
    },
}

impl WorkflowEvent {
    pub fn name(&self) -> &'static str {
        match self {
            WorkflowEvent::SelectMethod(_) => "select_method",
            WorkflowEvent::ChooseDifferentMethod => "choose_different_method",
            WorkflowEvent::Submit(_) => "submit",
            WorkflowEvent::Reject(_) => "reject",
            WorkflowEvent::Complete { .. } => "complete",
            WorkflowEvent::Fail { .. } => "fail",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("cannot {event} while {state}")]
    InvalidTransition {
        state: &'static str,
        event: &'static str,
    },

    #[error("an analysis is already in progress")]
    AlreadySubmitting,

    #[error("input method {given} does not match selected method {selected}")]
    MethodMismatch {
        selected: &'static str,
        given: &'static str,
    },

    #[error("submission {given} is stale (current is {current:?})")]
    StaleSubmission { given: u64, current: Option<u64> },
}

#[derive(Debug, Clone)]
pub struct Workflow {
    state: WorkflowState,
    last_submission: u64,
    updated_at: DateTime<Utc>,
}

impl Default for Workflow {
    fn default() -> Self {
        Self::new()
    }
}

impl Workflow {
    pub fn new() -> Self {
        Self {
            state: WorkflowState::Idle,
            last_submission: 0,
            updated_at: Utc::now(),
        }
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Whether a submit with `method` would be accepted right now.
    pub fn check_submit(&self, method: InputMethod) -> Result<(), TransitionError> {
        match &self.state {
            WorkflowState::Submitting { .. } => Err(TransitionError::AlreadySubmitting),
            WorkflowState::Idle => Err(TransitionError::InvalidTransition {
                state: self.state.name(),
                event: "submit",
            }),
            WorkflowState::MethodSelected { method: selected }
            | WorkflowState::Succeeded {
                method: selected, ..
            }
            | WorkflowState::Failed {
                method: selected, ..
            } => {
                if *selected == method {
                    Ok(())
                } else {
                    Err(TransitionError::MethodMismatch {
                        selected: selected.as_str(),
                        given: method.as_str(),
                    })
                }
            }
        }
    }

    /// Whether the submit control should be enabled.
    pub fn can_submit(&self) -> bool {
        self.state
            .method()
            .is_some_and(|m| self.check_submit(m).is_ok())
    }

    /// Applies a `Submit` and returns the ticket of the cycle it opened.
    pub fn begin_submission(&mut self, method: InputMethod) -> Result<SubmissionId, TransitionError> {
        self.apply(WorkflowEvent::Submit(method))?;
        Ok(SubmissionId(self.last_submission))
    }

    /// Applies `event`, returning the new state. On error the state is unchanged.
    pub fn apply(&mut self, event: WorkflowEvent) -> Result<&WorkflowState, TransitionError> {
        let next = self.next_state(event)?;
        self.state = next;
        self.updated_at = Utc::now();
        Ok(&self.state)
    }

    fn next_state(&mut self, event: WorkflowEvent) -> Result<WorkflowState, TransitionError> {
        use WorkflowEvent as E;
        use WorkflowState as S;

        let invalid = |state: &S, event: &E| TransitionError::InvalidTransition {
            state: state.name(),
            event: event.name(),
        };

        match (&self.state, event) {
            (S::Idle, E::SelectMethod(method)) => Ok(S::MethodSelected { method }),

            // navigating back from a finished cycle clears result and error
            (S::Succeeded { .. } | S::Failed { .. }, E::SelectMethod(method)) => {
                Ok(S::MethodSelected { method })
            }

            (
                S::MethodSelected { .. } | S::Succeeded { .. } | S::Failed { .. },
                E::ChooseDifferentMethod,
            ) => Ok(S::Idle),

            (_, E::Submit(method)) => {
                self.check_submit(method)?;
                self.last_submission += 1;
                Ok(S::Submitting {
                    method,
                    submission: SubmissionId(self.last_submission),
                })
            }

            (
                S::MethodSelected { method } | S::Succeeded { method, .. } | S::Failed { method, .. },
                E::Reject(message),
            ) => Ok(S::Failed {
                method: *method,
                message,
            }),

            (
                S::Submitting { method, submission },
                E::Complete {
                    submission: given,
                    result,
                },
            ) => {
                check_ticket(*submission, given)?;
                Ok(S::Succeeded {
                    method: *method,
                    result,
                })
            }

            (
                S::Submitting { method, submission },
                E::Fail {
                    submission: given,
                    message,
                },
            ) => {
                check_ticket(*submission, given)?;
                Ok(S::Failed {
                    method: *method,
                    message,
                })
            }

            (S::Submitting { .. }, E::Reject(_)) => Err(TransitionError::AlreadySubmitting),

            (
                _,
                E::Complete {
                    submission: given, ..
                }
                | E::Fail {
                    submission: given, ..
                },
            ) => Err(TransitionError::StaleSubmission {
                given: given.0,
                current: None,
            }),

            (state, event) => Err(invalid(state, &event)),
        }
    }
}

fn check_ticket(current: SubmissionId, given: SubmissionId) -> Result<(), TransitionError> {
    if current == given {
        Ok(())
    } else {
        Err(TransitionError::StaleSubmission {
            given: given.0,
            current: Some(current.0),
        })
    }
}
