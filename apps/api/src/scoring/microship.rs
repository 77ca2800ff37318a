use serde::{Deserialize, Serialize};

use super::{check, InvalidScoreError, Outcome, SUB_SCORE};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MicroshipWeights {
    pub technical_execution: f64,
    pub execution_discipline: f64,
    pub professional_behavior: f64,
    pub instruction_following: f64,
}

pub const WEIGHTS: MicroshipWeights = MicroshipWeights {
    technical_execution: 0.40,
    execution_discipline: 0.25,
    professional_behavior: 0.25,
    instruction_following: 0.10,
};

/// τ_progress: weighted scores at or above this progress.
pub const PROGRESS_THRESHOLD: f64 = 3.0;
/// τ_borderline: weighted scores in [2.5, 3.0) are borderline.
pub const BORDERLINE_THRESHOLD: f64 = 2.5;

/// The four rubric dimensions, each on the 0–4 scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubScores {
    pub technical_execution: f64,
    pub execution_discipline: f64,
    pub professional_behavior: f64,
    pub instruction_following: f64,
}

impl SubScores {
    pub fn validate(&self) -> Result<(), InvalidScoreError> {
        check("technical_execution", self.technical_execution, SUB_SCORE)?;
        check("execution_discipline", self.execution_discipline, SUB_SCORE)?;
        check(
            "professional_behavior",
            self.professional_behavior,
            SUB_SCORE,
        )?;
        check(
            "instruction_following",
            self.instruction_following,
            SUB_SCORE,
        )?;
        Ok(())
    }

    /// 0.40·technical + 0.25·discipline + 0.25·professional + 0.10·instructions
    pub fn weighted(&self, w: &MicroshipWeights) -> f64 {
        w.technical_execution * self.technical_execution
            + w.execution_discipline * self.execution_discipline
            + w.professional_behavior * self.professional_behavior
            + w.instruction_following * self.instruction_following
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MicroshipScore {
    pub weighted_score: f64,
    pub outcome: Outcome,
}

pub fn outcome_for(weighted_score: f64, disqualified: bool) -> Outcome {
    if disqualified {
        Outcome::DoNotProgress
    } else if weighted_score >= PROGRESS_THRESHOLD {
        Outcome::Progress
    } else if weighted_score >= BORDERLINE_THRESHOLD {
        Outcome::Borderline
    } else {
        Outcome::DoNotProgress
    }
}

/// Scores a microship submission. Any non-empty disqualifier short-circuits the
/// numeric mapping to `do_not_progress`.
pub fn score_microship(
    scores: &SubScores,
    disqualifiers: &[String],
) -> Result<MicroshipScore, InvalidScoreError> {
    scores.validate()?;
    let weighted_score = scores.weighted(&WEIGHTS);
    let disqualified = disqualifiers.iter().any(|d| !d.trim().is_empty());
    Ok(MicroshipScore {
        weighted_score,
        outcome: outcome_for(weighted_score, disqualified),
    })
}
