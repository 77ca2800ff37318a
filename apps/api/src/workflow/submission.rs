use serde::Serialize;

use super::{InvalidTransitionError, Transition};
use crate::scoring::Outcome;

/// A microship submission is either waiting for its first score or carries
/// the outcome of the most recent one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "outcome", rename_all = "snake_case")]
pub enum SubmissionState {
    Unscored,
    Scored(Outcome),
}

impl SubmissionState {
    pub fn from_stored(outcome: Option<&str>) -> Result<Self, crate::labels::UnknownLabel> {
        match outcome {
            None => Ok(SubmissionState::Unscored),
            Some(label) => Ok(SubmissionState::Scored(label.parse()?)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionEvent {
    Score(Outcome),
}

impl Transition for SubmissionState {
    type Event = SubmissionEvent;

    // Scoring is always permitted; re-scoring overwrites the previous outcome.
    fn transition(&self, event: &SubmissionEvent) -> Result<Self, InvalidTransitionError> {
        match event {
            SubmissionEvent::Score(outcome) => Ok(SubmissionState::Scored(*outcome)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rescore_overwrites() {
        let s = SubmissionState::Unscored
            .transition(&SubmissionEvent::Score(Outcome::Borderline))
            .unwrap();
        assert_eq!(s, SubmissionState::Scored(Outcome::Borderline));
        let s = s
            .transition(&SubmissionEvent::Score(Outcome::Progress))
            .unwrap();
        assert_eq!(s, SubmissionState::Scored(Outcome::Progress));
    }

    #[test]
    fn test_from_stored_labels() {
        assert_eq!(
            SubmissionState::from_stored(None).unwrap(),
            SubmissionState::Unscored
        );
        assert_eq!(
            SubmissionState::from_stored(Some("do_not_progress")).unwrap(),
            SubmissionState::Scored(Outcome::DoNotProgress)
        );
        assert!(SubmissionState::from_stored(Some("maybe")).is_err());
    }
}
