//! Entity Store contract.
//!
//! Services talk to persistence only through `EntityStore`, held in `AppState`
//! as `Arc<dyn EntityStore>`. Every method that writes more than one row does
//! so atomically; a failed call leaves nothing behind.

pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::labels::UnknownLabel;
use crate::models::applicant::{
    ApplicantRole, ApplicantRow, EvaluationKind, EvaluationRow, MicroshipSubmissionRow,
};
use crate::models::fellow::{CheckInRow, CohortRow, FellowRow, RiskAssessmentRow, WarningRow};
use crate::models::placement::{OpportunityRow, PlacementMatchRow, ProfileRow};
use crate::scoring::{Outcome, RecommendedAction, RiskLevel};
use crate::workflow::{ApplicantStatus, FellowStanding, FellowStatus, PlacementStatus};

pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("{0}")]
    Conflict(String),

    #[error("stored value is invalid: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        StoreError::NotFound { entity, id }
    }
}

impl From<UnknownLabel> for StoreError {
    fn from(e: UnknownLabel) -> Self {
        StoreError::Corrupt(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Corrupt(e.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

// ────────────────────────────────────────────────────────────────────────────
// Write models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct NewEvaluation {
    pub applicant_id: Uuid,
    pub submission_id: Option<Uuid>,
    pub kind: EvaluationKind,
    pub scores: Value,
    pub weighted_score: f64,
    /// `Outcome` label for microship evaluations, `Eligibility` label for screenings.
    pub outcome: String,
    pub reasoning: String,
    pub evidence: Option<Value>,
    pub disqualifiers: Vec<String>,
    pub flags: Vec<String>,
    pub confidence: f64,
    pub requires_human_review: bool,
    pub model_used: String,
}

/// The scored columns written back onto a submission.
#[derive(Debug, Clone)]
pub struct SubmissionScore {
    pub raw_analysis: Value,
    pub weighted_score: f64,
    pub outcome: Outcome,
}

#[derive(Debug, Clone)]
pub struct NewCheckIn {
    pub fellow_id: Uuid,
    pub week: i32,
    pub accomplishments: Option<String>,
    pub next_focus: Option<String>,
    pub blockers: Option<String>,
    pub needs_help: Option<String>,
    pub self_assessment: Option<String>,
    pub collaboration_rating: Option<String>,
    pub energy_level: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct CheckInAnalysisUpdate {
    pub analysis: Value,
    pub sentiment_score: f64,
    pub risk_contribution: f64,
    pub risk_label: RiskLevel,
    pub blockers_extracted: Vec<String>,
    pub action_items: Vec<String>,
    pub themes: Vec<String>,
    pub concerns: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct NewRiskAssessment {
    pub fellow_id: Uuid,
    pub week: i32,
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    pub recommended_action: RecommendedAction,
    pub contributing_factors: Value,
    pub concerns: Value,
    pub signals: Value,
}

/// Warning text and context. A warning gets its number when it is sent.
#[derive(Debug, Clone)]
pub struct NewWarning {
    pub fellow_id: Uuid,
    pub concerns: Vec<String>,
    pub requirements: Vec<String>,
    pub message: String,
}

/// Reviewer edits to an unsent warning; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct WarningEdit {
    pub message: Option<String>,
    pub concerns: Option<Vec<String>>,
    pub requirements: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct NewProfile {
    pub fellow_id: Uuid,
    pub headline: String,
    pub summary: String,
    pub skills: Vec<String>,
    pub linkedin_summary: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewMatch {
    pub opportunity_id: Uuid,
    pub match_score: i32,
    pub match_reasoning: String,
    pub skill_gaps: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct NewCohort {
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: String,
}

#[derive(Debug, Clone)]
pub struct NewApplicant {
    pub cohort_id: Uuid,
    pub name: String,
    pub email: String,
    pub role: ApplicantRole,
    pub portfolio_url: Option<String>,
    pub github_url: Option<String>,
    pub project_description: Option<String>,
    pub time_commitment: bool,
}

#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub applicant_id: Uuid,
    pub submission_url: Option<String>,
    pub submission_type: Option<String>,
    pub content: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub deadline: Option<DateTime<Utc>>,
    pub on_time: Option<bool>,
    pub communication_log: Value,
}

#[derive(Debug, Clone)]
pub struct NewFellow {
    pub applicant_id: Uuid,
    pub cohort_id: Uuid,
    pub name: String,
    pub role: String,
    pub microship_score: Option<f64>,
    pub portfolio_url: Option<String>,
    pub github_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewOpportunity {
    pub employer_name: String,
    pub title: String,
    pub description: Option<String>,
    pub requirements: Vec<String>,
    pub preferred_skills: Vec<String>,
    pub experience_level: Option<String>,
    pub location: Option<String>,
    pub remote_ok: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait EntityStore: Send + Sync {
    // Cohorts
    async fn create_cohort(&self, cohort: NewCohort) -> StoreResult<CohortRow>;
    async fn get_cohort(&self, id: Uuid) -> StoreResult<CohortRow>;
    async fn list_cohorts(&self) -> StoreResult<Vec<CohortRow>>;

    // Applicants and evaluations
    /// `Conflict` if the cohort already has an applicant with that email.
    async fn create_applicant(&self, applicant: NewApplicant) -> StoreResult<ApplicantRow>;
    async fn get_applicant(&self, id: Uuid) -> StoreResult<ApplicantRow>;
    async fn list_applicants(&self, cohort_id: Option<Uuid>) -> StoreResult<Vec<ApplicantRow>>;

    /// Writes the new status only if the applicant is still in `expected`.
    async fn set_applicant_status(
        &self,
        id: Uuid,
        expected: ApplicantStatus,
        status: ApplicantStatus,
    ) -> StoreResult<ApplicantRow>;

    /// `Conflict` if the applicant already has a submission.
    async fn create_submission(
        &self,
        submission: NewSubmission,
    ) -> StoreResult<MicroshipSubmissionRow>;
    async fn get_submission(&self, id: Uuid) -> StoreResult<MicroshipSubmissionRow>;
    async fn list_submissions(
        &self,
        applicant_id: Option<Uuid>,
    ) -> StoreResult<Vec<MicroshipSubmissionRow>>;

    async fn get_evaluation(&self, id: Uuid) -> StoreResult<EvaluationRow>;
    /// Newest first.
    async fn list_evaluations(&self, applicant_id: Uuid) -> StoreResult<Vec<EvaluationRow>>;

    /// Appends the evaluation, supersedes earlier ones of the same kind and
    /// moves the applicant from `expected` to `status`.
    async fn record_screening(
        &self,
        evaluation: NewEvaluation,
        expected: ApplicantStatus,
        status: ApplicantStatus,
    ) -> StoreResult<EvaluationRow>;

    /// Overwrites the submission's scored columns, appends the evaluation
    /// (superseding earlier microship evaluations) and moves the applicant
    /// from `expected` to `status`.
    async fn record_microship_evaluation(
        &self,
        submission_id: Uuid,
        score: SubmissionScore,
        evaluation: NewEvaluation,
        expected: ApplicantStatus,
        status: ApplicantStatus,
    ) -> StoreResult<(MicroshipSubmissionRow, EvaluationRow)>;

    /// Stores the reviewer's decision and the applicant status it produced.
    /// `Conflict` if the evaluation was already reviewed or superseded, or the
    /// applicant has left `expected`.
    async fn record_review(
        &self,
        evaluation_id: Uuid,
        approved: bool,
        feedback: Option<String>,
        expected: ApplicantStatus,
        status: ApplicantStatus,
    ) -> StoreResult<EvaluationRow>;

    // Fellows
    /// `Conflict` if the applicant already became a fellow.
    async fn create_fellow(&self, fellow: NewFellow) -> StoreResult<FellowRow>;
    async fn get_fellow(&self, id: Uuid) -> StoreResult<FellowRow>;
    /// Ordered by name.
    async fn list_fellows(&self, cohort_id: Option<Uuid>) -> StoreResult<Vec<FellowRow>>;

    /// Writes the new status only if the fellow is still in `expected`.
    async fn set_fellow_status(
        &self,
        id: Uuid,
        expected: FellowStatus,
        status: FellowStatus,
    ) -> StoreResult<FellowRow>;

    // Check-ins
    async fn get_check_in(&self, id: Uuid) -> StoreResult<CheckInRow>;
    /// `Conflict` if the fellow already has a check-in for that week.
    async fn insert_check_in(&self, check_in: NewCheckIn) -> StoreResult<CheckInRow>;
    /// Check-ins with `after_week < week <= up_to_week`, ascending by week.
    async fn check_ins_in_window(
        &self,
        fellow_id: Uuid,
        after_week: i32,
        up_to_week: i32,
    ) -> StoreResult<Vec<CheckInRow>>;
    async fn save_check_in_analysis(
        &self,
        id: Uuid,
        analysis: CheckInAnalysisUpdate,
    ) -> StoreResult<CheckInRow>;

    // Risk
    /// Appends the assessment and copies its score and level onto the fellow.
    async fn record_risk_assessment(
        &self,
        assessment: NewRiskAssessment,
    ) -> StoreResult<RiskAssessmentRow>;
    /// Newest first.
    async fn risk_history(&self, fellow_id: Uuid) -> StoreResult<Vec<RiskAssessmentRow>>;
    async fn cohort_assessments(
        &self,
        cohort_id: Uuid,
        up_to_week: i32,
    ) -> StoreResult<Vec<RiskAssessmentRow>>;
    async fn get_risk_assessment(&self, id: Uuid) -> StoreResult<RiskAssessmentRow>;
    async fn record_risk_action(
        &self,
        id: Uuid,
        action: String,
    ) -> StoreResult<RiskAssessmentRow>;

    // Warnings
    /// Stores an unsent draft. The fellow's standing is untouched.
    async fn create_warning(&self, warning: NewWarning) -> StoreResult<WarningRow>;
    async fn get_warning(&self, id: Uuid) -> StoreResult<WarningRow>;
    /// `Conflict` once the warning has been sent.
    async fn edit_warning(&self, id: Uuid, edit: WarningEdit) -> StoreResult<WarningRow>;
    /// Marks a draft sent with number `next.warnings_count` and writes `next`
    /// onto the fellow, provided the draft is still unsent and the fellow's
    /// `warnings_count` still equals `expected_count`. A lost race is a
    /// `Conflict`.
    async fn send_warning(
        &self,
        id: Uuid,
        expected_count: i32,
        next: FellowStanding,
    ) -> StoreResult<(FellowRow, WarningRow)>;
    /// `create_warning` and `send_warning` in one step.
    async fn issue_warning(
        &self,
        warning: NewWarning,
        expected_count: i32,
        next: FellowStanding,
    ) -> StoreResult<(FellowRow, WarningRow)>;
    /// Sent warnings by number, then drafts by creation time.
    async fn list_warnings(&self, fellow_id: Uuid) -> StoreResult<Vec<WarningRow>>;
    async fn acknowledge_warning(&self, id: Uuid) -> StoreResult<WarningRow>;

    // Placement
    async fn latest_profile(&self, fellow_id: Uuid) -> StoreResult<Option<ProfileRow>>;
    /// Stores a new profile version (previous version + 1).
    async fn save_profile(&self, profile: NewProfile) -> StoreResult<ProfileRow>;
    async fn create_opportunity(&self, opportunity: NewOpportunity)
        -> StoreResult<OpportunityRow>;
    async fn get_opportunity(&self, id: Uuid) -> StoreResult<OpportunityRow>;
    /// Newest first; `open_only` restricts to opportunities still taking matches.
    async fn list_opportunities(&self, open_only: bool) -> StoreResult<Vec<OpportunityRow>>;
    /// One match per (fellow, opportunity): re-matching refreshes the score
    /// and keeps the introduction status.
    async fn upsert_matches(
        &self,
        fellow_id: Uuid,
        matches: Vec<NewMatch>,
    ) -> StoreResult<Vec<PlacementMatchRow>>;
    async fn get_match(&self, id: Uuid) -> StoreResult<PlacementMatchRow>;
    /// Highest score first.
    async fn list_matches(&self, fellow_id: Uuid) -> StoreResult<Vec<PlacementMatchRow>>;
    async fn set_match_status(
        &self,
        id: Uuid,
        status: PlacementStatus,
    ) -> StoreResult<PlacementMatchRow>;
}
