// Scoring & Risk Engine.
// Pure functions only: no store access, no LLM calls. Every numeric input is
// range-checked and rejected with `InvalidScoreError` rather than clamped.

pub mod dashboard;
pub mod microship;
pub mod risk;
pub mod screening;

use serde::Serialize;
use thiserror::Error;

use crate::labels::text_enum;

pub use dashboard::{build_risk_dashboard, RiskDashboard};
pub use microship::{score_microship, SubScores};
pub use risk::{assess_risk, RiskAssessmentResult, RiskSignals};
pub use screening::{score_application, ApplicationScores, Eligibility};

/// Closed interval a score field must fall into.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

pub const SUB_SCORE: Bounds = Bounds { min: 0.0, max: 4.0 };
pub const UNIT: Bounds = Bounds { min: 0.0, max: 1.0 };
pub const SENTIMENT: Bounds = Bounds {
    min: -1.0,
    max: 1.0,
};
pub const PERCENT: Bounds = Bounds {
    min: 0.0,
    max: 100.0,
};
pub const MATCH_SCORE: Bounds = PERCENT;
pub const ENERGY: Bounds = Bounds {
    min: 1.0,
    max: 10.0,
};

#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[error("{field} = {value} is outside [{min}, {max}]")]
pub struct InvalidScoreError {
    pub field: String,
    pub value: f64,
    pub min: f64,
    pub max: f64,
}

impl InvalidScoreError {
    /// A non-numeric conflict on a scored field (e.g. outcome vs disqualifiers).
    pub fn conflict(field: &str) -> Self {
        Self {
            field: field.to_string(),
            value: f64::NAN,
            min: f64::NAN,
            max: f64::NAN,
        }
    }
}

/// Returns `value` unchanged when it lies in `bounds`, otherwise names the field.
/// NaN is never in range.
pub fn check(field: &str, value: f64, bounds: Bounds) -> Result<f64, InvalidScoreError> {
    if value >= bounds.min && value <= bounds.max {
        Ok(value)
    } else {
        Err(InvalidScoreError {
            field: field.to_string(),
            value,
            min: bounds.min,
            max: bounds.max,
        })
    }
}

text_enum! {
    /// Microship verdict derived from the weighted score.
    pub enum Outcome {
        Progress => "progress",
        Borderline => "borderline",
        DoNotProgress => "do_not_progress",
    }
}

text_enum! {
    /// Four-bucket risk classification shared by check-ins and assessments.
    pub enum RiskLevel {
        OnTrack => "on_track",
        Monitor => "monitor",
        AtRisk => "at_risk",
        Critical => "critical",
    }
}

text_enum! {
    pub enum RecommendedAction {
        None => "none",
        CheckIn => "check_in",
        Warning => "warning",
        Escalate => "escalate",
    }
}

pub const MONITOR_THRESHOLD: f64 = 0.2;
pub const AT_RISK_THRESHOLD: f64 = 0.4;
pub const CRITICAL_THRESHOLD: f64 = 0.6;

impl RiskLevel {
    /// Monotone step function over [0, 1] with cut points at 0.2, 0.4 and 0.6.
    pub fn from_score(score: f64) -> Result<Self, InvalidScoreError> {
        let score = check("risk_score", score, UNIT)?;
        Ok(if score < MONITOR_THRESHOLD {
            RiskLevel::OnTrack
        } else if score < AT_RISK_THRESHOLD {
            RiskLevel::Monitor
        } else if score < CRITICAL_THRESHOLD {
            RiskLevel::AtRisk
        } else {
            RiskLevel::Critical
        })
    }
}

impl RecommendedAction {
    pub const fn for_level(level: RiskLevel) -> Self {
        match level {
            RiskLevel::OnTrack => RecommendedAction::None,
            RiskLevel::Monitor => RecommendedAction::CheckIn,
            RiskLevel::AtRisk => RecommendedAction::Warning,
            RiskLevel::Critical => RecommendedAction::Escalate,
        }
    }
}
