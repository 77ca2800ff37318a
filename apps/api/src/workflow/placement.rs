use super::{InvalidTransitionError, Transition};
use crate::labels::text_enum;

text_enum! {
    pub enum PlacementStatus {
        Proposed => "proposed",
        IntroductionSent => "introduction_sent",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementEvent {
    SendIntroduction,
}

impl Transition for PlacementStatus {
    type Event = PlacementEvent;

    fn transition(&self, event: &PlacementEvent) -> Result<Self, InvalidTransitionError> {
        match (self, event) {
            (PlacementStatus::Proposed, PlacementEvent::SendIntroduction) => {
                Ok(PlacementStatus::IntroductionSent)
            }
            (PlacementStatus::IntroductionSent, _) => Err(InvalidTransitionError::new(
                "placement_match",
                self,
                event,
                "introduction already sent",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_introduction_is_one_way() {
        let s = PlacementStatus::Proposed
            .transition(&PlacementEvent::SendIntroduction)
            .unwrap();
        assert_eq!(s, PlacementStatus::IntroductionSent);
        let err = s.transition(&PlacementEvent::SendIntroduction).unwrap_err();
        assert_eq!(err.from, "introduction_sent");
    }
}
