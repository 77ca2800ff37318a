use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::evaluation::{ApplicationPayload, ScreeningEvaluation};
use crate::models::applicant::{ApplicantRole, ApplicantRow, EvaluationKind, EvaluationRow};
use crate::state::AppState;
use crate::store::{NewApplicant, NewEvaluation};
use crate::workflow::{
    ApplicantEvent, ApplicantStatus, DecisionSource, InvalidTransitionError, Transition,
};

#[derive(Debug, Deserialize)]
pub struct ApplicationRequest {
    pub cohort_id: Uuid,
    pub name: String,
    pub email: String,
    pub role: ApplicantRole,
    #[serde(default)]
    pub portfolio_url: Option<String>,
    #[serde(default)]
    pub github_url: Option<String>,
    #[serde(default)]
    pub project_description: Option<String>,
    #[serde(default)]
    pub time_commitment: bool,
}

/// Registers an application in `applied`. One application per email per cohort.
pub async fn create_applicant(
    state: &AppState,
    req: ApplicationRequest,
) -> Result<ApplicantRow, AppError> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("name is required".into()));
    }
    let email = req.email.trim().to_lowercase();
    if !email.contains('@') {
        return Err(AppError::Validation(format!(
            "'{email}' is not an email address"
        )));
    }
    state.store.get_cohort(req.cohort_id).await?;

    let row = state
        .store
        .create_applicant(NewApplicant {
            cohort_id: req.cohort_id,
            name: name.to_string(),
            email,
            role: req.role,
            portfolio_url: req.portfolio_url,
            github_url: req.github_url,
            project_description: req.project_description,
            time_commitment: req.time_commitment,
        })
        .await?;

    info!(
        applicant_id = %row.id,
        cohort_id = %row.cohort_id,
        role = %req.role,
        "application received"
    );
    Ok(row)
}

pub async fn get_applicant(state: &AppState, id: Uuid) -> Result<ApplicantRow, AppError> {
    Ok(state.store.get_applicant(id).await?)
}

#[derive(Debug, Default, Deserialize)]
pub struct ApplicantFilter {
    pub cohort_id: Option<Uuid>,
    pub status: Option<ApplicantStatus>,
}

pub async fn list_applicants(
    state: &AppState,
    filter: ApplicantFilter,
) -> Result<Vec<ApplicantRow>, AppError> {
    let mut rows = state.store.list_applicants(filter.cohort_id).await?;
    if let Some(status) = filter.status {
        rows.retain(|a| a.status == status.as_str());
    }
    Ok(rows)
}

/// Every evaluation of the applicant, newest first, superseded ones included.
pub async fn list_evaluations(
    state: &AppState,
    applicant_id: Uuid,
) -> Result<Vec<EvaluationRow>, AppError> {
    state.store.get_applicant(applicant_id).await?;
    Ok(state.store.list_evaluations(applicant_id).await?)
}

#[derive(Debug, Serialize)]
pub struct ScreeningResult {
    pub evaluation: EvaluationRow,
    pub screening: ScreeningEvaluation,
    pub applicant_status: ApplicantStatus,
}

/// AI screening of an application. Moves the applicant into `screening`;
/// leaving it again always takes a reviewer's decision.
pub async fn screen_application(
    state: &AppState,
    applicant_id: Uuid,
) -> Result<ScreeningResult, AppError> {
    let applicant = state.store.get_applicant(applicant_id).await?;
    let status: ApplicantStatus = applicant.status.parse()?;
    let next = status.transition(&ApplicantEvent::BeginScreening)?;

    let payload = ApplicationPayload::new(&applicant, applicant.role.parse()?);
    let screening = state
        .evaluator
        .screen_application(&payload)
        .await?
        .validate(
            applicant.time_commitment,
            state.config.human_review_confidence,
        )?;

    let evaluation = state
        .store
        .record_screening(
            NewEvaluation {
                applicant_id,
                submission_id: None,
                kind: EvaluationKind::Application,
                scores: serde_json::to_value(screening.scores)?,
                weighted_score: screening.overall_score,
                outcome: screening.eligibility.as_str().to_string(),
                reasoning: screening.reasoning.clone(),
                evidence: None,
                disqualifiers: Vec::new(),
                flags: screening.flags.clone(),
                confidence: screening.confidence,
                requires_human_review: screening.requires_human_review,
                model_used: state.evaluator.model_name().to_string(),
            },
            status,
            next,
        )
        .await?;

    info!(
        %applicant_id,
        overall_score = screening.overall_score,
        eligibility = %screening.eligibility,
        "application screened"
    );

    Ok(ScreeningResult {
        evaluation,
        screening,
        applicant_status: next,
    })
}

pub async fn withdraw_applicant(
    state: &AppState,
    applicant_id: Uuid,
) -> Result<ApplicantRow, AppError> {
    let applicant = state.store.get_applicant(applicant_id).await?;
    let status: ApplicantStatus = applicant.status.parse()?;
    let next = status.transition(&ApplicantEvent::Withdraw)?;
    let row = state
        .store
        .set_applicant_status(applicant_id, status, next)
        .await?;
    info!(%applicant_id, from = %status, "applicant withdrew");
    Ok(row)
}

#[derive(Debug, Serialize)]
pub struct ReviewResult {
    pub evaluation: EvaluationRow,
    pub applicant_status: ApplicantStatus,
}

/// A reviewer's decision on an evaluation. This is the only path from a
/// screened state to `microship_pending`, `accepted` or `rejected`.
pub async fn approve_evaluation(
    state: &AppState,
    evaluation_id: Uuid,
    approved: bool,
    feedback: Option<String>,
) -> Result<ReviewResult, AppError> {
    let evaluation = state.store.get_evaluation(evaluation_id).await?;
    if evaluation.human_reviewed {
        return Err(AppError::Conflict(format!(
            "evaluation {evaluation_id} has already been reviewed"
        )));
    }
    if evaluation.superseded {
        return Err(AppError::Conflict(format!(
            "evaluation {evaluation_id} has been superseded by a newer evaluation"
        )));
    }

    let applicant = state.store.get_applicant(evaluation.applicant_id).await?;
    let status: ApplicantStatus = applicant.status.parse()?;
    let kind: EvaluationKind = evaluation.kind.parse()?;
    let event = ApplicantEvent::Decide {
        accepted: approved,
        source: DecisionSource::Human,
    };

    // An evaluation only decides the stage it was produced for.
    let stage_matches = matches!(
        (kind, status),
        (EvaluationKind::Application, ApplicantStatus::Screening)
            | (EvaluationKind::Microship, ApplicantStatus::MicroshipCompleted)
    );
    if !stage_matches {
        return Err(InvalidTransitionError::new(
            "applicant",
            status,
            &event,
            format!("a {kind} evaluation cannot decide an applicant in {status}"),
        )
        .into());
    }

    let next = status.transition(&event)?;
    let feedback = feedback.filter(|f| !f.trim().is_empty());
    let evaluation = state
        .store
        .record_review(evaluation_id, approved, feedback, status, next)
        .await?;

    info!(
        %evaluation_id,
        applicant_id = %applicant.id,
        approved,
        from = %status,
        to = %next,
        "evaluation reviewed"
    );

    Ok(ReviewResult {
        evaluation,
        applicant_status: next,
    })
}

#[derive(Debug, Serialize)]
pub struct ScreeningQueue {
    pub cohort_id: Option<Uuid>,
    /// Every status is present, zero or not.
    pub counts: BTreeMap<ApplicantStatus, usize>,
    /// Applicants whose latest evaluation is waiting on a reviewer.
    pub awaiting_decision: Vec<Uuid>,
}

pub async fn screening_queue(
    state: &AppState,
    cohort_id: Option<Uuid>,
) -> Result<ScreeningQueue, AppError> {
    let applicants = state.store.list_applicants(cohort_id).await?;

    let mut counts: BTreeMap<ApplicantStatus, usize> =
        ApplicantStatus::ALL.iter().map(|s| (*s, 0)).collect();
    let mut awaiting_decision = Vec::new();

    for applicant in &applicants {
        let status: ApplicantStatus = applicant.status.parse()?;
        *counts.entry(status).or_default() += 1;
        if matches!(
            status,
            ApplicantStatus::Screening | ApplicantStatus::MicroshipCompleted
        ) {
            awaiting_decision.push(applicant.id);
        }
    }

    Ok(ScreeningQueue {
        cohort_id,
        counts,
        awaiting_decision,
    })
}
