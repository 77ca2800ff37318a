use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::applicant::{ApplicantRow, EvaluationRow, MicroshipSubmissionRow};
use crate::models::fellow::{CheckInRow, CohortRow, FellowRow, RiskAssessmentRow, WarningRow};
use crate::models::placement::{OpportunityRow, PlacementMatchRow, ProfileRow};
use crate::scoring::RiskDashboard;
use crate::services::analytics::{self, ConversionFunnel};
use crate::services::applicants::{
    self, ApplicantFilter, ApplicationRequest, ReviewResult, ScreeningQueue, ScreeningResult,
};
use crate::services::bulk::{self, BulkItem, BulkRequest};
use crate::services::check_ins::{self, CheckInAnalysisResult, CheckInRequest};
use crate::services::cohorts::{self, CohortRequest};
use crate::services::fellows::{self, EnrolmentRequest, FellowFilter, StatusChangeRequest};
use crate::services::microship::{self, MicroshipResult, SubmissionRequest};
use crate::services::placement::{self, OpportunityRequest};
use crate::services::risk::{self, RiskResult};
use crate::services::warnings::{
    self, DraftedWarning, IssueWarningRequest, IssuedWarning, WarningEditRequest,
};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct WeekQuery {
    pub week: Option<i32>,
}

#[derive(Deserialize)]
pub struct CohortQuery {
    pub cohort_id: Option<Uuid>,
}

#[derive(Deserialize)]
pub struct OpportunityQuery {
    #[serde(default)]
    pub open_only: bool,
}

// ── Cohorts ─────────────────────────────────────────────────────────────────

/// POST /api/v1/cohorts
pub async fn handle_create_cohort(
    State(state): State<AppState>,
    Json(req): Json<CohortRequest>,
) -> Result<(StatusCode, Json<CohortRow>), AppError> {
    let row = cohorts::create_cohort(&state, req).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// GET /api/v1/cohorts
pub async fn handle_list_cohorts(
    State(state): State<AppState>,
) -> Result<Json<Vec<CohortRow>>, AppError> {
    Ok(Json(cohorts::list_cohorts(&state).await?))
}

/// GET /api/v1/cohorts/:id
pub async fn handle_get_cohort(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CohortRow>, AppError> {
    Ok(Json(cohorts::get_cohort(&state, id).await?))
}

// ── Applicants ──────────────────────────────────────────────────────────────

/// POST /api/v1/applicants
pub async fn handle_create_applicant(
    State(state): State<AppState>,
    Json(req): Json<ApplicationRequest>,
) -> Result<(StatusCode, Json<ApplicantRow>), AppError> {
    let row = applicants::create_applicant(&state, req).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// GET /api/v1/applicants
pub async fn handle_list_applicants(
    State(state): State<AppState>,
    Query(filter): Query<ApplicantFilter>,
) -> Result<Json<Vec<ApplicantRow>>, AppError> {
    Ok(Json(applicants::list_applicants(&state, filter).await?))
}

/// GET /api/v1/applicants/:id
pub async fn handle_get_applicant(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApplicantRow>, AppError> {
    Ok(Json(applicants::get_applicant(&state, id).await?))
}

/// GET /api/v1/applicants/:id/evaluations
pub async fn handle_list_evaluations(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<EvaluationRow>>, AppError> {
    Ok(Json(applicants::list_evaluations(&state, id).await?))
}

/// GET /api/v1/applicants/:id/submissions
pub async fn handle_list_submissions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<MicroshipSubmissionRow>>, AppError> {
    Ok(Json(microship::list_submissions(&state, id).await?))
}

/// POST /api/v1/applicants/:id/screen
pub async fn handle_screen_application(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ScreeningResult>, AppError> {
    Ok(Json(applicants::screen_application(&state, id).await?))
}

/// POST /api/v1/applicants/:id/withdraw
pub async fn handle_withdraw(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApplicantRow>, AppError> {
    Ok(Json(applicants::withdraw_applicant(&state, id).await?))
}

/// GET /api/v1/screening/queue
pub async fn handle_screening_queue(
    State(state): State<AppState>,
    Query(params): Query<CohortQuery>,
) -> Result<Json<ScreeningQueue>, AppError> {
    let queue = applicants::screening_queue(&state, params.cohort_id).await?;
    Ok(Json(queue))
}

#[derive(Deserialize)]
pub struct ApprovalRequest {
    pub approved: bool,
    #[serde(default)]
    pub feedback: Option<String>,
}

/// POST /api/v1/evaluations/:id/approve
pub async fn handle_approve_evaluation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ApprovalRequest>,
) -> Result<Json<ReviewResult>, AppError> {
    let result = applicants::approve_evaluation(&state, id, req.approved, req.feedback).await?;
    Ok(Json(result))
}

// ── Microship ───────────────────────────────────────────────────────────────

/// POST /api/v1/microship/submissions
pub async fn handle_create_submission(
    State(state): State<AppState>,
    Json(req): Json<SubmissionRequest>,
) -> Result<(StatusCode, Json<MicroshipSubmissionRow>), AppError> {
    let row = microship::create_submission(&state, req).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// GET /api/v1/microship/submissions/:id
pub async fn handle_get_submission(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MicroshipSubmissionRow>, AppError> {
    Ok(Json(microship::get_submission(&state, id).await?))
}

/// POST /api/v1/microship/:id/evaluate
pub async fn handle_evaluate_submission(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MicroshipResult>, AppError> {
    Ok(Json(microship::evaluate_submission(&state, id).await?))
}

/// POST /api/v1/bulk/microship/evaluate
pub async fn handle_bulk_evaluate(
    State(state): State<AppState>,
    Json(req): Json<BulkRequest>,
) -> Result<Json<Vec<BulkItem>>, AppError> {
    let items = bulk::bulk_evaluate(&state, &req.submission_ids).await?;
    Ok(Json(items))
}

// ── Check-ins ───────────────────────────────────────────────────────────────

/// POST /api/v1/check-ins
pub async fn handle_submit_check_in(
    State(state): State<AppState>,
    Json(req): Json<CheckInRequest>,
) -> Result<(StatusCode, Json<CheckInRow>), AppError> {
    let row = check_ins::submit_check_in(&state, req).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// GET /api/v1/check-ins/:id
pub async fn handle_get_check_in(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CheckInRow>, AppError> {
    Ok(Json(check_ins::get_check_in(&state, id).await?))
}

/// GET /api/v1/fellows/:id/check-ins
pub async fn handle_list_check_ins(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<CheckInRow>>, AppError> {
    Ok(Json(check_ins::list_check_ins(&state, id).await?))
}

/// POST /api/v1/check-ins/:id/analyze
pub async fn handle_analyze_check_in(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CheckInAnalysisResult>, AppError> {
    Ok(Json(check_ins::analyze_check_in(&state, id).await?))
}

// ── Risk ────────────────────────────────────────────────────────────────────

/// POST /api/v1/fellows/:id/risk
pub async fn handle_assess_risk(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<WeekQuery>,
) -> Result<Json<RiskResult>, AppError> {
    Ok(Json(risk::assess_risk(&state, id, params.week).await?))
}

/// GET /api/v1/fellows/:id/risk
pub async fn handle_risk_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<RiskAssessmentRow>>, AppError> {
    Ok(Json(risk::risk_history(&state, id).await?))
}

/// GET /api/v1/risk/:id
pub async fn handle_get_assessment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RiskAssessmentRow>, AppError> {
    Ok(Json(risk::get_assessment(&state, id).await?))
}

#[derive(Deserialize)]
pub struct ActionRequest {
    pub action: String,
}

/// POST /api/v1/risk/:id/action
pub async fn handle_record_action(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ActionRequest>,
) -> Result<Json<RiskAssessmentRow>, AppError> {
    Ok(Json(risk::record_action(&state, id, &req.action).await?))
}

/// GET /api/v1/cohorts/:id/risk-dashboard
pub async fn handle_risk_dashboard(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<WeekQuery>,
) -> Result<Json<RiskDashboard>, AppError> {
    Ok(Json(risk::risk_dashboard(&state, id, params.week).await?))
}

// ── Fellows and warnings ────────────────────────────────────────────────────

/// POST /api/v1/fellows
pub async fn handle_create_fellow(
    State(state): State<AppState>,
    Json(req): Json<EnrolmentRequest>,
) -> Result<(StatusCode, Json<FellowRow>), AppError> {
    let row = fellows::create_fellow(&state, req.applicant_id).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// GET /api/v1/fellows
pub async fn handle_list_fellows(
    State(state): State<AppState>,
    Query(filter): Query<FellowFilter>,
) -> Result<Json<Vec<FellowRow>>, AppError> {
    Ok(Json(fellows::list_fellows(&state, filter).await?))
}

/// GET /api/v1/fellows/:id
pub async fn handle_get_fellow(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FellowRow>, AppError> {
    Ok(Json(fellows::get_fellow(&state, id).await?))
}

/// POST /api/v1/fellows/:id/status
pub async fn handle_change_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<StatusChangeRequest>,
) -> Result<Json<FellowRow>, AppError> {
    Ok(Json(fellows::change_status(&state, id, req.action).await?))
}

/// POST /api/v1/fellows/:id/warnings/draft
pub async fn handle_draft_warning(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<DraftedWarning>), AppError> {
    let drafted = warnings::draft_warning(&state, id).await?;
    Ok((StatusCode::CREATED, Json(drafted)))
}

/// GET /api/v1/warnings/:id
pub async fn handle_get_warning(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<WarningRow>, AppError> {
    Ok(Json(warnings::get_warning(&state, id).await?))
}

/// PUT /api/v1/warnings/:id
pub async fn handle_edit_warning(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<WarningEditRequest>,
) -> Result<Json<WarningRow>, AppError> {
    Ok(Json(warnings::edit_warning(&state, id, req).await?))
}

/// POST /api/v1/warnings/:id/issue
pub async fn handle_send_warning(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<IssuedWarning>, AppError> {
    Ok(Json(warnings::send_warning(&state, id).await?))
}

/// POST /api/v1/fellows/:id/warnings
pub async fn handle_issue_warning(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<IssueWarningRequest>,
) -> Result<(StatusCode, Json<IssuedWarning>), AppError> {
    let issued = warnings::issue_warning(&state, id, req).await?;
    Ok((StatusCode::CREATED, Json(issued)))
}

/// GET /api/v1/fellows/:id/warnings
pub async fn handle_list_warnings(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<WarningRow>>, AppError> {
    Ok(Json(warnings::list_warnings(&state, id).await?))
}

/// POST /api/v1/warnings/:id/acknowledge
pub async fn handle_acknowledge_warning(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<WarningRow>, AppError> {
    Ok(Json(warnings::acknowledge_warning(&state, id).await?))
}

// ── Placement ───────────────────────────────────────────────────────────────

/// POST /api/v1/fellows/:id/profile
pub async fn handle_generate_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProfileRow>, AppError> {
    Ok(Json(placement::generate_profile(&state, id).await?))
}

/// POST /api/v1/fellows/:id/matches
pub async fn handle_match_opportunities(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<PlacementMatchRow>>, AppError> {
    Ok(Json(placement::match_opportunities(&state, id).await?))
}

/// GET /api/v1/fellows/:id/profile
pub async fn handle_latest_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProfileRow>, AppError> {
    Ok(Json(placement::latest_profile(&state, id).await?))
}

/// GET /api/v1/fellows/:id/matches
pub async fn handle_list_matches(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<PlacementMatchRow>>, AppError> {
    Ok(Json(placement::list_matches(&state, id).await?))
}

/// POST /api/v1/opportunities
pub async fn handle_create_opportunity(
    State(state): State<AppState>,
    Json(req): Json<OpportunityRequest>,
) -> Result<(StatusCode, Json<OpportunityRow>), AppError> {
    let row = placement::create_opportunity(&state, req).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// GET /api/v1/opportunities
pub async fn handle_list_opportunities(
    State(state): State<AppState>,
    Query(params): Query<OpportunityQuery>,
) -> Result<Json<Vec<OpportunityRow>>, AppError> {
    let rows = placement::list_opportunities(&state, params.open_only).await?;
    Ok(Json(rows))
}

/// GET /api/v1/opportunities/:id
pub async fn handle_get_opportunity(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<OpportunityRow>, AppError> {
    Ok(Json(placement::get_opportunity(&state, id).await?))
}

/// POST /api/v1/matches/:id/introduction
pub async fn handle_send_introduction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PlacementMatchRow>, AppError> {
    Ok(Json(placement::send_introduction(&state, id).await?))
}

// ── Analytics ───────────────────────────────────────────────────────────────

/// GET /api/v1/analytics/funnel
pub async fn handle_conversion_funnel(
    State(state): State<AppState>,
    Query(params): Query<CohortQuery>,
) -> Result<Json<ConversionFunnel>, AppError> {
    let funnel = analytics::conversion_funnel(&state, params.cohort_id).await?;
    Ok(Json(funnel))
}
