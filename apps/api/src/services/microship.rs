use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::evaluation::{MicroshipEvaluation, MicroshipPayload};
use crate::models::applicant::{EvaluationKind, EvaluationRow, MicroshipSubmissionRow};
use crate::state::AppState;
use crate::store::{NewEvaluation, NewSubmission, SubmissionScore};
use crate::workflow::{
    ApplicantEvent, ApplicantStatus, SubmissionEvent, SubmissionState, Transition,
};

#[derive(Debug, Deserialize)]
pub struct SubmissionRequest {
    pub applicant_id: Uuid,
    #[serde(default)]
    pub submission_url: Option<String>,
    #[serde(default)]
    pub submission_type: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub communication_log: Vec<Value>,
}

/// Stores an invited applicant's microship. `on_time` is derived when both
/// timestamps are known; a missing `submitted_at` means now.
pub async fn create_submission(
    state: &AppState,
    req: SubmissionRequest,
) -> Result<MicroshipSubmissionRow, AppError> {
    if req.submission_url.is_none() && req.content.is_none() {
        return Err(AppError::Validation(
            "a submission needs a submission_url or content".into(),
        ));
    }
    let applicant = state.store.get_applicant(req.applicant_id).await?;
    let status: ApplicantStatus = applicant.status.parse()?;
    if status != ApplicantStatus::MicroshipPending {
        return Err(AppError::Conflict(format!(
            "applicant {} is {status}; only {} applicants submit a microship",
            applicant.id,
            ApplicantStatus::MicroshipPending
        )));
    }

    let submitted_at = req.submitted_at.unwrap_or_else(Utc::now);
    let on_time = req.deadline.map(|deadline| submitted_at <= deadline);
    let row = state
        .store
        .create_submission(NewSubmission {
            applicant_id: applicant.id,
            submission_url: req.submission_url,
            submission_type: req.submission_type,
            content: req.content,
            submitted_at: Some(submitted_at),
            deadline: req.deadline,
            on_time,
            communication_log: Value::Array(req.communication_log),
        })
        .await?;

    info!(
        submission_id = %row.id,
        applicant_id = %applicant.id,
        ?on_time,
        "microship submitted"
    );
    Ok(row)
}

pub async fn get_submission(
    state: &AppState,
    id: Uuid,
) -> Result<MicroshipSubmissionRow, AppError> {
    Ok(state.store.get_submission(id).await?)
}

pub async fn list_submissions(
    state: &AppState,
    applicant_id: Uuid,
) -> Result<Vec<MicroshipSubmissionRow>, AppError> {
    state.store.get_applicant(applicant_id).await?;
    Ok(state.store.list_submissions(Some(applicant_id)).await?)
}

#[derive(Debug, Serialize)]
pub struct MicroshipResult {
    pub submission: MicroshipSubmissionRow,
    pub evaluation: EvaluationRow,
    pub result: MicroshipEvaluation,
    pub applicant_status: ApplicantStatus,
}

/// Evaluates (or re-evaluates) a microship submission. The submission row is
/// overwritten in place; each call appends one evaluation awaiting review.
pub async fn evaluate_submission(
    state: &AppState,
    submission_id: Uuid,
) -> Result<MicroshipResult, AppError> {
    let submission = state.store.get_submission(submission_id).await?;
    let applicant = state.store.get_applicant(submission.applicant_id).await?;

    let status: ApplicantStatus = applicant.status.parse()?;
    let next_status = status.transition(&ApplicantEvent::MicroshipScored)?;
    let scored = SubmissionState::from_stored(submission.outcome.as_deref())?;

    let payload = MicroshipPayload::new(&submission, applicant.role.parse()?);
    let result = state
        .evaluator
        .evaluate_microship(&payload)
        .await?
        .validate(state.config.human_review_confidence)?;

    let outcome = match scored.transition(&SubmissionEvent::Score(result.outcome))? {
        SubmissionState::Scored(outcome) => outcome,
        SubmissionState::Unscored => result.outcome,
    };

    let evaluation = NewEvaluation {
        applicant_id: applicant.id,
        submission_id: Some(submission_id),
        kind: EvaluationKind::Microship,
        scores: serde_json::to_value(result.scores)?,
        weighted_score: result.weighted_score,
        outcome: outcome.as_str().to_string(),
        reasoning: result.reasoning.clone(),
        evidence: Some(serde_json::to_value(&result.evidence)?),
        disqualifiers: result.disqualifiers.clone(),
        flags: result.concerns.clone(),
        confidence: result.confidence,
        requires_human_review: result.requires_human_review,
        model_used: state.evaluator.model_name().to_string(),
    };
    let score = SubmissionScore {
        raw_analysis: serde_json::to_value(&result)?,
        weighted_score: result.weighted_score,
        outcome,
    };

    let (submission, evaluation) = state
        .store
        .record_microship_evaluation(submission_id, score, evaluation, status, next_status)
        .await?;

    info!(
        %submission_id,
        applicant_id = %applicant.id,
        weighted_score = result.weighted_score,
        outcome = %outcome,
        requires_human_review = result.requires_human_review,
        rescored = matches!(scored, SubmissionState::Scored(_)),
        "microship evaluated"
    );

    Ok(MicroshipResult {
        submission,
        evaluation,
        result,
        applicant_status: next_status,
    })
}
