use serde::{Deserialize, Serialize};

use super::{InvalidTransitionError, Transition};
use crate::labels::text_enum;

text_enum! {
    pub enum ApplicantStatus {
        Applied => "applied",
        Screening => "screening",
        MicroshipPending => "microship_pending",
        MicroshipCompleted => "microship_completed",
        Accepted => "accepted",
        Rejected => "rejected",
        Withdrawn => "withdrawn",
    }
}

impl ApplicantStatus {
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            ApplicantStatus::Accepted | ApplicantStatus::Rejected | ApplicantStatus::Withdrawn
        )
    }
}

/// Who produced a decision. Only a human reviewer may move an applicant
/// out of a screening-adjacent state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionSource {
    Human,
    Automatic,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplicantEvent {
    BeginScreening,
    /// A microship evaluation was stored; repeatable while completed.
    MicroshipScored,
    /// Approval (or rejection) of the pending evaluation.
    Decide {
        accepted: bool,
        source: DecisionSource,
    },
    Withdraw,
}

const MACHINE: &str = "applicant";

impl Transition for ApplicantStatus {
    type Event = ApplicantEvent;

    fn transition(&self, event: &ApplicantEvent) -> Result<Self, InvalidTransitionError> {
        use ApplicantStatus::*;

        let reject = |reason: &str| Err(InvalidTransitionError::new(MACHINE, self, event, reason));

        if self.is_terminal() {
            return reject("applicant is in a terminal state");
        }

        match (*self, event) {
            (_, ApplicantEvent::Withdraw) => Ok(Withdrawn),

            (Applied, ApplicantEvent::BeginScreening) => Ok(Screening),
            // Re-screening replaces the pending evaluation.
            (Screening, ApplicantEvent::BeginScreening) => Ok(Screening),

            (MicroshipPending | MicroshipCompleted, ApplicantEvent::MicroshipScored) => {
                Ok(MicroshipCompleted)
            }

            (
                Screening | MicroshipCompleted,
                ApplicantEvent::Decide {
                    source: DecisionSource::Automatic,
                    ..
                },
            ) => reject("decisions on screened applicants require human approval"),

            (Screening, ApplicantEvent::Decide { accepted: true, .. }) => Ok(MicroshipPending),
            (Screening, ApplicantEvent::Decide { accepted: false, .. }) => Ok(Rejected),
            (MicroshipCompleted, ApplicantEvent::Decide { accepted: true, .. }) => Ok(Accepted),
            (MicroshipCompleted, ApplicantEvent::Decide { accepted: false, .. }) => Ok(Rejected),

            _ => reject("event not allowed in this state"),
        }
    }
}
