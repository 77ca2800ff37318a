// Workflow / status state machines.
// Every status change in the service goes through `Transition::transition`;
// handlers never assign a status directly. A rejected transition returns the
// error and leaves the caller's state untouched.

pub mod applicant;
pub mod fellow;
pub mod placement;
pub mod submission;

use serde::Serialize;
use thiserror::Error;

pub use applicant::{ApplicantEvent, ApplicantStatus, DecisionSource};
pub use fellow::{FellowEvent, FellowStanding, FellowStatus};
pub use placement::{PlacementEvent, PlacementStatus};
pub use submission::{SubmissionEvent, SubmissionState};

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{machine}: cannot apply {event} in state {from}: {reason}")]
pub struct InvalidTransitionError {
    pub machine: &'static str,
    pub from: String,
    pub event: String,
    pub reason: String,
}

impl InvalidTransitionError {
    pub(crate) fn new(
        machine: &'static str,
        from: impl ToString,
        event: &impl std::fmt::Debug,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            machine,
            from: from.to_string(),
            event: format!("{event:?}"),
            reason: reason.into(),
        }
    }
}

/// `transition(state, event) -> Result<State, Error>`; implementors are values,
/// so a failed transition cannot have mutated anything.
pub trait Transition: Sized {
    type Event: std::fmt::Debug;

    fn transition(&self, event: &Self::Event) -> Result<Self, InvalidTransitionError>;
}
