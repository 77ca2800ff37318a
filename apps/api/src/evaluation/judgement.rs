//! Evaluator output, raw and validated.
//!
//! The `*Judgement` / `*Draft` structs mirror the JSON the model is asked for.
//! Required fields have no serde default, so a missing one fails
//! deserialisation and the call is reported as a malformed payload. The
//! `validate` methods turn them into value objects and reject anything out of
//! range with `InvalidScoreError`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::scoring::{
    check, score_application, score_microship, ApplicationScores, Eligibility, InvalidScoreError,
    Outcome, RiskLevel, SubScores, MATCH_SCORE, SENTIMENT, SUB_SCORE, UNIT,
};

// ────────────────────────────────────────────────────────────────────────────
// Application screening
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationScreening {
    pub scores: ApplicationScores,
    /// Model's own arithmetic; range-checked, never stored.
    #[serde(default)]
    pub overall_score: Option<f64>,
    pub reasoning: String,
    #[serde(default)]
    pub flags: Vec<String>,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScreeningEvaluation {
    pub scores: ApplicationScores,
    pub overall_score: f64,
    pub eligibility: Eligibility,
    pub reasoning: String,
    pub flags: Vec<String>,
    pub confidence: f64,
    pub requires_human_review: bool,
}

impl ApplicationScreening {
    pub fn validate(
        self,
        time_commitment: bool,
        review_confidence: f64,
    ) -> Result<ScreeningEvaluation, InvalidScoreError> {
        let verdict = score_application(&self.scores, &self.flags, time_commitment)?;
        let confidence = check("confidence", self.confidence, UNIT)?;
        if let Some(reported) = self.overall_score {
            check("overall_score", reported, crate::scoring::PERCENT)?;
        }

        let requires_human_review =
            confidence < review_confidence || verdict.eligibility == Eligibility::Review;

        Ok(ScreeningEvaluation {
            scores: self.scores,
            overall_score: verdict.overall_score,
            eligibility: verdict.eligibility,
            reasoning: self.reasoning,
            flags: self.flags,
            confidence,
            requires_human_review,
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Microship evaluation
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MicroshipJudgement {
    pub scores: SubScores,
    #[serde(default)]
    pub evidence: BTreeMap<String, String>,
    /// The model may send `null` for "none".
    #[serde(default)]
    pub disqualifiers: Option<Vec<String>>,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub concerns: Vec<String>,
    pub confidence: f64,
    pub reasoning: String,
    /// Reported aggregates; models use either name, sometimes both. Each is
    /// range-checked, and the computed score is canonical.
    #[serde(default)]
    pub weighted_score: Option<f64>,
    #[serde(default)]
    pub overall_score: Option<f64>,
    #[serde(default)]
    pub outcome: Option<Outcome>,
    #[serde(default)]
    pub requires_human_review: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MicroshipEvaluation {
    pub scores: SubScores,
    pub weighted_score: f64,
    pub outcome: Outcome,
    pub evidence: BTreeMap<String, String>,
    pub disqualifiers: Vec<String>,
    pub strengths: Vec<String>,
    pub concerns: Vec<String>,
    pub confidence: f64,
    pub reasoning: String,
    pub requires_human_review: bool,
}

impl MicroshipJudgement {
    pub fn validate(
        self,
        review_confidence: f64,
    ) -> Result<MicroshipEvaluation, InvalidScoreError> {
        let disqualifiers: Vec<String> = self
            .disqualifiers
            .unwrap_or_default()
            .into_iter()
            .filter(|d| !d.trim().is_empty())
            .collect();

        let computed = score_microship(&self.scores, &disqualifiers)?;
        let confidence = check("confidence", self.confidence, UNIT)?;
        if let Some(reported) = self.weighted_score {
            check("weighted_score", reported, SUB_SCORE)?;
        }
        if let Some(reported) = self.overall_score {
            check("overall_score", reported, SUB_SCORE)?;
        }

        match self.outcome {
            Some(reported) if !disqualifiers.is_empty() && reported != Outcome::DoNotProgress => {
                return Err(InvalidScoreError::conflict("outcome"));
            }
            Some(reported) if reported != computed.outcome => {
                warn!(
                    reported = %reported,
                    computed = %computed.outcome,
                    weighted_score = computed.weighted_score,
                    "model outcome superseded by computed outcome"
                );
            }
            _ => {}
        }

        let requires_human_review = self.requires_human_review.unwrap_or(false)
            || confidence < review_confidence
            || computed.outcome == Outcome::Borderline;

        Ok(MicroshipEvaluation {
            scores: self.scores,
            weighted_score: computed.weighted_score,
            outcome: computed.outcome,
            evidence: self.evidence,
            disqualifiers,
            strengths: self.strengths,
            concerns: self.concerns,
            confidence,
            reasoning: self.reasoning,
            requires_human_review,
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Check-in analysis
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckInJudgement {
    pub sentiment_score: f64,
    pub risk_contribution: f64,
    #[serde(default)]
    pub blockers_extracted: Vec<String>,
    #[serde(default)]
    pub action_items: Vec<String>,
    #[serde(default)]
    pub themes: Vec<String>,
    #[serde(default)]
    pub concerns: Vec<String>,
    #[serde(default)]
    pub positive_signals: Vec<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    pub summary: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckInAnalysis {
    pub sentiment_score: f64,
    pub risk_contribution: f64,
    pub risk_label: RiskLevel,
    pub blockers_extracted: Vec<String>,
    pub action_items: Vec<String>,
    pub themes: Vec<String>,
    pub concerns: Vec<String>,
    pub positive_signals: Vec<String>,
    pub confidence: Option<f64>,
    pub summary: String,
}

impl CheckInJudgement {
    pub fn validate(self) -> Result<CheckInAnalysis, InvalidScoreError> {
        let sentiment_score = check("sentiment_score", self.sentiment_score, SENTIMENT)?;
        let risk_contribution = check("risk_contribution", self.risk_contribution, UNIT)?;
        let confidence = self
            .confidence
            .map(|c| check("confidence", c, UNIT))
            .transpose()?;

        Ok(CheckInAnalysis {
            sentiment_score,
            risk_contribution,
            risk_label: RiskLevel::from_score(risk_contribution)?,
            blockers_extracted: self.blockers_extracted,
            action_items: self.action_items,
            themes: self.themes,
            concerns: self.concerns,
            positive_signals: self.positive_signals,
            confidence,
            summary: self.summary,
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Placement
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileSkill {
    pub name: String,
    #[serde(default)]
    pub proficiency: Option<String>,
    #[serde(default)]
    pub evidence: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileDraft {
    pub headline: String,
    pub summary: String,
    pub skills: Vec<ProfileSkill>,
    #[serde(default)]
    pub linkedin_summary: Option<String>,
}

impl ProfileDraft {
    pub fn skill_names(&self) -> Vec<String> {
        self.skills
            .iter()
            .map(|s| s.name.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchJudgement {
    /// Must echo one of the opportunity ids that were sent.
    pub opportunity_id: Uuid,
    pub match_score: f64,
    pub reasoning: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub gaps: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidatedMatch {
    pub opportunity_id: Uuid,
    pub match_score: i32,
    pub reasoning: String,
    pub skill_gaps: Vec<String>,
}

impl MatchJudgement {
    pub fn validate(self) -> Result<ValidatedMatch, InvalidScoreError> {
        let score = check("match_score", self.match_score, MATCH_SCORE)?;
        Ok(ValidatedMatch {
            opportunity_id: self.opportunity_id,
            match_score: score.round() as i32,
            reasoning: self.reasoning,
            skill_gaps: self.gaps,
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Warnings
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarningDraft {
    pub message: String,
    #[serde(default)]
    pub tone: Option<String>,
    #[serde(default)]
    pub key_points: Vec<String>,
    pub requirements: Vec<String>,
    #[serde(default)]
    pub timeline: Option<String>,
    #[serde(default)]
    pub recommended_followup: Option<String>,
}
