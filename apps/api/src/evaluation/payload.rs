//! What gets sent to the evaluator. Built from stored rows by the services;
//! enum-typed fields are parsed before a payload exists.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::models::applicant::{ApplicantRole, ApplicantRow, MicroshipSubmissionRow};
use crate::models::fellow::{CheckInRow, FellowRow};
use crate::models::placement::{OpportunityRow, ProfileRow};
use crate::scoring::RiskLevel;

#[derive(Debug, Clone, Serialize)]
pub struct ApplicationPayload {
    pub applicant_id: Uuid,
    pub name: String,
    pub role: ApplicantRole,
    pub portfolio_url: Option<String>,
    pub github_url: Option<String>,
    pub project_description: Option<String>,
    pub time_commitment: bool,
}

impl ApplicationPayload {
    pub fn new(applicant: &ApplicantRow, role: ApplicantRole) -> Self {
        Self {
            applicant_id: applicant.id,
            name: applicant.name.clone(),
            role,
            portfolio_url: applicant.portfolio_url.clone(),
            github_url: applicant.github_url.clone(),
            project_description: applicant.project_description.clone(),
            time_commitment: applicant.time_commitment,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MicroshipPayload {
    pub submission_id: Uuid,
    pub applicant_id: Uuid,
    pub role: ApplicantRole,
    pub submission_url: Option<String>,
    pub submission_type: Option<String>,
    pub content: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub deadline: Option<DateTime<Utc>>,
    pub on_time: Option<bool>,
    /// `[{timestamp, type, content}]` as recorded on the submission.
    pub communication_log: Value,
}

impl MicroshipPayload {
    pub fn new(submission: &MicroshipSubmissionRow, role: ApplicantRole) -> Self {
        Self {
            submission_id: submission.id,
            applicant_id: submission.applicant_id,
            role,
            submission_url: submission.submission_url.clone(),
            submission_type: submission.submission_type.clone(),
            content: submission.content.clone(),
            submitted_at: submission.submitted_at,
            deadline: submission.deadline,
            on_time: submission.on_time,
            communication_log: submission.communication_log.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckInPayload {
    pub check_in_id: Uuid,
    pub fellow_name: String,
    pub role: String,
    pub week: i32,
    pub accomplishments: Option<String>,
    pub next_focus: Option<String>,
    pub blockers: Option<String>,
    pub needs_help: Option<String>,
    pub self_assessment: Option<String>,
    pub collaboration_rating: Option<String>,
    pub energy_level: Option<i32>,
}

impl CheckInPayload {
    pub fn new(fellow: &FellowRow, check_in: &CheckInRow) -> Self {
        Self {
            check_in_id: check_in.id,
            fellow_name: fellow.name.clone(),
            role: fellow.role.clone(),
            week: check_in.week,
            accomplishments: check_in.accomplishments.clone(),
            next_focus: check_in.next_focus.clone(),
            blockers: check_in.blockers.clone(),
            needs_help: check_in.needs_help.clone(),
            self_assessment: check_in.self_assessment.clone(),
            collaboration_rating: check_in.collaboration_rating.clone(),
            energy_level: check_in.energy_level,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfilePayload {
    pub fellow_id: Uuid,
    pub fellow_name: String,
    pub role: String,
    pub microship_score: Option<f64>,
    pub milestone_scores: Vec<f64>,
    pub portfolio_url: Option<String>,
    pub github_url: Option<String>,
    /// Themes from analysed check-ins, most recent week first.
    pub themes: Vec<String>,
    pub accomplishments: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchPayload {
    pub fellow_id: Uuid,
    pub fellow_name: String,
    pub role: String,
    pub profile: ProfileRow,
    pub opportunities: Vec<OpportunityRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WarningPayload {
    pub fellow_id: Uuid,
    pub fellow_name: String,
    pub role: String,
    /// The number this warning would carry if issued.
    pub warning_number: i32,
    pub risk_level: Option<RiskLevel>,
    pub risk_score: Option<f64>,
    pub concerns: Vec<String>,
    pub recent_blockers: Vec<String>,
}
