use serde::Serialize;

use super::{InvalidTransitionError, Transition};
use crate::labels::text_enum;

/// Issued warnings allowed before an explicit removal decision is required.
pub const MAX_WARNINGS: i32 = 2;

text_enum! {
    pub enum FellowStatus {
        Onboarded => "onboarded",
        Active => "active",
        WarnedOnce => "warned_once",
        WarnedTwice => "warned_twice",
        Removed => "removed",
        Completed => "completed",
        Placed => "placed",
    }
}

impl FellowStatus {
    pub const fn in_program(self) -> bool {
        matches!(
            self,
            FellowStatus::Active | FellowStatus::WarnedOnce | FellowStatus::WarnedTwice
        )
    }
}

/// Status plus the warning counter it is derived from; they only move together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FellowStanding {
    pub status: FellowStatus,
    pub warnings_count: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FellowEvent {
    Activate,
    /// A warning was actually sent (drafts never reach the state machine).
    IssueWarning,
    Remove,
    Complete,
    Place,
}

const MACHINE: &str = "fellow";

impl Transition for FellowStanding {
    type Event = FellowEvent;

    fn transition(&self, event: &FellowEvent) -> Result<Self, InvalidTransitionError> {
        use FellowStatus::*;

        let reject =
            |reason: &str| Err(InvalidTransitionError::new(MACHINE, self.status, event, reason));
        let to = |status: FellowStatus| {
            Ok(FellowStanding {
                status,
                warnings_count: self.warnings_count,
            })
        };

        match (self.status, event) {
            (Onboarded, FellowEvent::Activate) => to(Active),

            (Active | WarnedOnce, FellowEvent::IssueWarning) => {
                let warnings_count = self.warnings_count + 1;
                let status = if warnings_count >= MAX_WARNINGS {
                    WarnedTwice
                } else {
                    WarnedOnce
                };
                Ok(FellowStanding {
                    status,
                    warnings_count,
                })
            }
            (WarnedTwice, FellowEvent::IssueWarning) => reject(
                "warning limit reached; an explicit removal decision is required",
            ),

            (Onboarded | Active | WarnedOnce | WarnedTwice, FellowEvent::Remove) => to(Removed),
            (Active | WarnedOnce | WarnedTwice, FellowEvent::Complete) => to(Completed),
            (Active | WarnedOnce | WarnedTwice | Completed, FellowEvent::Place) => to(Placed),

            (Removed | Placed, _) => reject("fellow has left the program"),
            _ => reject("event not allowed in this state"),
        }
    }
}
