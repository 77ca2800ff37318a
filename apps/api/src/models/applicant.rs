use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::labels::text_enum;

text_enum! {
    pub enum ApplicantRole {
        ProductManager => "product_manager",
        ProductDesigner => "product_designer",
        Frontend => "frontend",
        Backend => "backend",
        Qa => "qa",
    }
}

text_enum! {
    pub enum EvaluationKind {
        Application => "application",
        Microship => "microship",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ApplicantRow {
    pub id: Uuid,
    pub cohort_id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub status: String,
    pub portfolio_url: Option<String>,
    pub github_url: Option<String>,
    pub project_description: Option<String>,
    pub time_commitment: bool,
    pub applied_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One take-home submission. Re-evaluation overwrites the scored columns in place.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MicroshipSubmissionRow {
    pub id: Uuid,
    pub applicant_id: Uuid,
    pub submission_url: Option<String>,
    pub submission_type: Option<String>,
    pub content: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub deadline: Option<DateTime<Utc>>,
    pub on_time: Option<bool>,
    pub communication_log: Value,
    pub raw_analysis: Option<Value>,
    pub weighted_score: Option<f64>,
    pub outcome: Option<String>,
    pub evaluated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// An AI judgement on an applicant awaiting (or having received) human review.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EvaluationRow {
    pub id: Uuid,
    pub applicant_id: Uuid,
    pub submission_id: Option<Uuid>,
    pub kind: String,
    pub scores: Value,
    pub weighted_score: Option<f64>,
    pub outcome: Option<String>,
    pub reasoning: Option<String>,
    pub evidence: Option<Value>,
    pub disqualifiers: Vec<String>,
    pub flags: Vec<String>,
    pub confidence: f64,
    pub requires_human_review: bool,
    pub model_used: Option<String>,
    pub human_reviewed: bool,
    pub approved: Option<bool>,
    pub reviewer_feedback: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    /// Set when a later evaluation of the same kind replaces this one.
    pub superseded: bool,
    pub created_at: DateTime<Utc>,
}
