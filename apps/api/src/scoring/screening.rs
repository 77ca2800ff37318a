use serde::{Deserialize, Serialize};

use super::{check, InvalidScoreError, PERCENT};
use crate::labels::text_enum;

const W_COMPLETENESS: f64 = 0.20;
const W_PORTFOLIO: f64 = 0.35;
const W_ROLE_FIT: f64 = 0.25;
const W_COMMITMENT: f64 = 0.20;

pub const ELIGIBLE_THRESHOLD: f64 = 65.0;
pub const REVIEW_THRESHOLD: f64 = 50.0;

/// Application rubric, each dimension on the 0–100 scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ApplicationScores {
    pub completeness: f64,
    pub portfolio_quality: f64,
    pub role_fit: f64,
    pub commitment_signals: f64,
}

text_enum! {
    pub enum Eligibility {
        Eligible => "eligible",
        Review => "review",
        NotEligible => "not_eligible",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ApplicationVerdict {
    pub overall_score: f64,
    pub eligibility: Eligibility,
}

impl ApplicationScores {
    pub fn validate(&self) -> Result<(), InvalidScoreError> {
        check("completeness", self.completeness, PERCENT)?;
        check("portfolio_quality", self.portfolio_quality, PERCENT)?;
        check("role_fit", self.role_fit, PERCENT)?;
        check("commitment_signals", self.commitment_signals, PERCENT)?;
        Ok(())
    }

    pub fn overall(&self) -> f64 {
        W_COMPLETENESS * self.completeness
            + W_PORTFOLIO * self.portfolio_quality
            + W_ROLE_FIT * self.role_fit
            + W_COMMITMENT * self.commitment_signals
    }
}

/// Eligibility is advisory only: whatever it says, moving the applicant on
/// still takes a human decision.
pub fn score_application(
    scores: &ApplicationScores,
    flags: &[String],
    time_commitment: bool,
) -> Result<ApplicationVerdict, InvalidScoreError> {
    scores.validate()?;
    let overall_score = scores.overall();
    let flagged = flags.iter().any(|f| !f.trim().is_empty());

    let eligibility = if overall_score < REVIEW_THRESHOLD || !time_commitment {
        Eligibility::NotEligible
    } else if overall_score < ELIGIBLE_THRESHOLD || flagged {
        Eligibility::Review
    } else {
        Eligibility::Eligible
    };

    Ok(ApplicationVerdict {
        overall_score,
        eligibility,
    })
}
