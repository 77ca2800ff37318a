use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::labels::text_enum;

text_enum! {
    pub enum SelfAssessment {
        Exceeded => "exceeded",
        Met => "met",
        Below => "below",
    }
}

text_enum! {
    pub enum CollaborationRating {
        Great => "great",
        Good => "good",
        Okay => "okay",
        Struggling => "struggling",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CohortRow {
    pub id: Uuid,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FellowRow {
    pub id: Uuid,
    pub applicant_id: Uuid,
    pub cohort_id: Uuid,
    pub name: String,
    pub role: String,
    pub status: String,
    pub current_risk_level: Option<String>,
    pub current_risk_score: Option<f64>,
    pub warnings_count: i32,
    pub microship_score: Option<f64>,
    pub milestone_1_score: Option<f64>,
    pub milestone_2_score: Option<f64>,
    pub milestone_3_score: Option<f64>,
    pub portfolio_url: Option<String>,
    pub github_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FellowRow {
    pub fn milestone_scores(&self) -> Vec<f64> {
        [
            self.milestone_1_score,
            self.milestone_2_score,
            self.milestone_3_score,
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CheckInRow {
    pub id: Uuid,
    pub fellow_id: Uuid,
    pub week: i32,
    pub accomplishments: Option<String>,
    pub next_focus: Option<String>,
    pub blockers: Option<String>,
    pub needs_help: Option<String>,
    pub self_assessment: Option<String>,
    pub collaboration_rating: Option<String>,
    pub energy_level: Option<i32>,
    pub submitted_at: DateTime<Utc>,
    // Populated by analysis; re-analysis overwrites.
    pub analysis: Option<Value>,
    pub sentiment_score: Option<f64>,
    pub risk_contribution: Option<f64>,
    pub risk_label: Option<String>,
    pub blockers_extracted: Vec<String>,
    pub action_items: Vec<String>,
    pub themes: Vec<String>,
    pub concerns: Vec<String>,
    pub analyzed_at: Option<DateTime<Utc>>,
}

/// Append-only: each assessment call produces a new row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RiskAssessmentRow {
    pub id: Uuid,
    pub fellow_id: Uuid,
    pub week: i32,
    pub risk_score: f64,
    pub risk_level: String,
    pub recommended_action: String,
    pub contributing_factors: Value,
    pub concerns: Value,
    pub signals: Value,
    pub action_taken: Option<String>,
    pub actioned_at: Option<DateTime<Utc>>,
    pub assessed_at: DateTime<Utc>,
}

/// A draft until `sent`; only sending assigns `warning_number` and counts
/// against the fellow.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WarningRow {
    pub id: Uuid,
    pub fellow_id: Uuid,
    pub warning_number: Option<i32>,
    pub concerns: Vec<String>,
    pub requirements: Vec<String>,
    pub message: String,
    pub sent: bool,
    pub sent_at: Option<DateTime<Utc>>,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
