//! Test doubles and row builders shared by unit tests.
//!
//! `MemoryStore` keeps the same guarantees `PgStore` gets from its constraints:
//! unique (fellow, week) check-ins, guarded status and warning updates,
//! one match per (fellow, opportunity).

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::config::Config;
use crate::evaluation::judgement::ProfileSkill;
use crate::evaluation::{
    AdapterError, ApplicationPayload, ApplicationScreening, CheckInJudgement, CheckInPayload,
    Evaluator, MatchJudgement, MatchPayload, MicroshipJudgement, MicroshipPayload, ProfileDraft,
    ProfilePayload, WarningDraft, WarningPayload,
};
use crate::models::applicant::{ApplicantRow, EvaluationRow, MicroshipSubmissionRow};
use crate::models::fellow::{CheckInRow, CohortRow, FellowRow, RiskAssessmentRow, WarningRow};
use crate::models::placement::{OpportunityRow, PlacementMatchRow, ProfileRow};
use crate::scoring::{ApplicationScores, RecommendedAction, RiskLevel, SubScores};
use crate::services::check_ins::CheckInRequest;
use crate::state::AppState;
use crate::store::{
    CheckInAnalysisUpdate, EntityStore, NewApplicant, NewCheckIn, NewCohort, NewEvaluation,
    NewFellow, NewMatch, NewOpportunity, NewProfile, NewRiskAssessment, NewSubmission, NewWarning,
    StoreError, StoreResult, SubmissionScore, WarningEdit,
};
use crate::workflow::{ApplicantStatus, FellowStanding, FellowStatus, PlacementStatus};

// ────────────────────────────────────────────────────────────────────────────
// Context
// ────────────────────────────────────────────────────────────────────────────

pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub evaluator: Arc<ScriptedEvaluator>,
}

impl TestContext {
    pub fn new() -> Self {
        Self {
            store: Arc::new(MemoryStore::default()),
            evaluator: Arc::new(ScriptedEvaluator::default()),
        }
    }

    pub fn state(&self) -> AppState {
        AppState {
            store: self.store.clone(),
            evaluator: self.evaluator.clone(),
            config: Config::for_tests(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// In-memory store
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Tables {
    cohorts: Vec<CohortRow>,
    applicants: Vec<ApplicantRow>,
    submissions: Vec<MicroshipSubmissionRow>,
    evaluations: Vec<EvaluationRow>,
    fellows: Vec<FellowRow>,
    check_ins: Vec<CheckInRow>,
    assessments: Vec<RiskAssessmentRow>,
    warnings: Vec<WarningRow>,
    profiles: Vec<ProfileRow>,
    opportunities: Vec<OpportunityRow>,
    matches: Vec<PlacementMatchRow>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

fn find<'a, T>(
    rows: &'a mut [T],
    entity: &'static str,
    id: Uuid,
    key: impl Fn(&T) -> Uuid,
) -> StoreResult<&'a mut T> {
    rows.iter_mut()
        .find(|r| key(r) == id)
        .ok_or_else(|| StoreError::not_found(entity, id))
}

impl MemoryStore {
    pub fn seed_cohort(&self, row: CohortRow) -> CohortRow {
        self.tables.lock().unwrap().cohorts.push(row.clone());
        row
    }

    pub fn seed_applicant(&self, row: ApplicantRow) -> ApplicantRow {
        self.tables.lock().unwrap().applicants.push(row.clone());
        row
    }

    pub fn seed_submission(&self, row: MicroshipSubmissionRow) -> MicroshipSubmissionRow {
        self.tables.lock().unwrap().submissions.push(row.clone());
        row
    }

    pub fn seed_fellow(&self, mut row: FellowRow, status: FellowStatus) -> FellowRow {
        row.status = status.as_str().to_string();
        row.warnings_count = match status {
            FellowStatus::WarnedOnce => 1,
            FellowStatus::WarnedTwice => 2,
            _ => 0,
        };
        self.tables.lock().unwrap().fellows.push(row.clone());
        row
    }

    pub fn seed_check_in(&self, row: CheckInRow) -> CheckInRow {
        self.tables.lock().unwrap().check_ins.push(row.clone());
        row
    }

    pub fn seed_opportunity(&self, row: OpportunityRow) -> OpportunityRow {
        self.tables.lock().unwrap().opportunities.push(row.clone());
        row
    }

    /// Unguarded status write, as another process would make it.
    pub fn overwrite_applicant_status(&self, id: Uuid, status: ApplicantStatus) {
        let mut t = self.tables.lock().unwrap();
        if let Some(a) = t.applicants.iter_mut().find(|a| a.id == id) {
            a.status = status.as_str().to_string();
        }
    }

    pub fn applicant(&self, id: Uuid) -> ApplicantRow {
        let t = self.tables.lock().unwrap();
        t.applicants.iter().find(|a| a.id == id).cloned().unwrap()
    }

    pub fn submission(&self, id: Uuid) -> MicroshipSubmissionRow {
        let t = self.tables.lock().unwrap();
        t.submissions.iter().find(|s| s.id == id).cloned().unwrap()
    }

    pub fn fellow(&self, id: Uuid) -> FellowRow {
        let t = self.tables.lock().unwrap();
        t.fellows.iter().find(|f| f.id == id).cloned().unwrap()
    }

    pub fn check_in(&self, id: Uuid) -> CheckInRow {
        let t = self.tables.lock().unwrap();
        t.check_ins.iter().find(|c| c.id == id).cloned().unwrap()
    }

    pub fn submission_count(&self) -> usize {
        self.tables.lock().unwrap().submissions.len()
    }

    pub fn evaluation_count(&self) -> usize {
        self.tables.lock().unwrap().evaluations.len()
    }

    pub fn check_in_count(&self, fellow_id: Uuid) -> usize {
        let t = self.tables.lock().unwrap();
        t.check_ins.iter().filter(|c| c.fellow_id == fellow_id).count()
    }

    pub fn match_count(&self) -> usize {
        self.tables.lock().unwrap().matches.len()
    }
}

fn evaluation_row(e: NewEvaluation) -> EvaluationRow {
    EvaluationRow {
        id: Uuid::new_v4(),
        applicant_id: e.applicant_id,
        submission_id: e.submission_id,
        kind: e.kind.as_str().to_string(),
        scores: e.scores,
        weighted_score: Some(e.weighted_score),
        outcome: Some(e.outcome),
        reasoning: Some(e.reasoning),
        evidence: e.evidence,
        disqualifiers: e.disqualifiers,
        flags: e.flags,
        confidence: e.confidence,
        requires_human_review: e.requires_human_review,
        model_used: Some(e.model_used),
        human_reviewed: false,
        approved: None,
        reviewer_feedback: None,
        reviewed_at: None,
        superseded: false,
        created_at: Utc::now(),
    }
}

fn warning_row(w: NewWarning) -> WarningRow {
    let now = Utc::now();
    WarningRow {
        id: Uuid::new_v4(),
        fellow_id: w.fellow_id,
        warning_number: None,
        concerns: w.concerns,
        requirements: w.requirements,
        message: w.message,
        sent: false,
        sent_at: None,
        acknowledged_at: None,
        created_at: now,
        updated_at: now,
    }
}

/// Fails without touching anything unless the applicant is still in `expected`.
fn check_applicant(t: &Tables, id: Uuid, expected: ApplicantStatus) -> StoreResult<()> {
    let applicant = t
        .applicants
        .iter()
        .find(|a| a.id == id)
        .ok_or_else(|| StoreError::not_found("applicant", id))?;
    if applicant.status != expected.as_str() {
        return Err(StoreError::Conflict(format!(
            "applicant {id} is no longer {expected}"
        )));
    }
    Ok(())
}

fn move_applicant(
    t: &mut Tables,
    id: Uuid,
    expected: ApplicantStatus,
    status: ApplicantStatus,
) -> StoreResult<ApplicantRow> {
    check_applicant(t, id, expected)?;
    let applicant = find(&mut t.applicants, "applicant", id, |a| a.id)?;
    applicant.status = status.as_str().to_string();
    applicant.updated_at = Utc::now();
    Ok(applicant.clone())
}

fn append_evaluation(t: &mut Tables, e: NewEvaluation) -> EvaluationRow {
    for earlier in t
        .evaluations
        .iter_mut()
        .filter(|x| x.applicant_id == e.applicant_id && x.kind == e.kind.as_str())
    {
        earlier.superseded = true;
    }
    let row = evaluation_row(e);
    t.evaluations.push(row.clone());
    row
}

fn check_standing(t: &Tables, fellow_id: Uuid, expected_count: i32) -> StoreResult<()> {
    let fellow = t
        .fellows
        .iter()
        .find(|f| f.id == fellow_id)
        .ok_or_else(|| StoreError::not_found("fellow", fellow_id))?;
    if fellow.warnings_count != expected_count {
        return Err(StoreError::Conflict(format!(
            "fellow {fellow_id} was warned concurrently; re-read and retry"
        )));
    }
    if t
        .warnings
        .iter()
        .any(|x| x.fellow_id == fellow_id && x.warning_number == Some(expected_count + 1))
    {
        return Err(StoreError::Conflict(format!(
            "warning #{} already exists for fellow {fellow_id}",
            expected_count + 1
        )));
    }
    Ok(())
}

fn write_standing(t: &mut Tables, fellow_id: Uuid, next: FellowStanding) -> StoreResult<FellowRow> {
    let fellow = find(&mut t.fellows, "fellow", fellow_id, |f| f.id)?;
    fellow.status = next.status.as_str().to_string();
    fellow.warnings_count = next.warnings_count;
    fellow.updated_at = Utc::now();
    Ok(fellow.clone())
}

fn mark_sent(row: &mut WarningRow, number: i32) {
    let now = Utc::now();
    row.sent = true;
    row.sent_at = Some(now);
    row.warning_number = Some(number);
    row.updated_at = now;
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn create_cohort(&self, c: NewCohort) -> StoreResult<CohortRow> {
        let row = CohortRow {
            id: Uuid::new_v4(),
            name: c.name,
            start_date: c.start_date,
            end_date: c.end_date,
            status: c.status,
        };
        self.tables.lock().unwrap().cohorts.push(row.clone());
        Ok(row)
    }

    async fn get_cohort(&self, id: Uuid) -> StoreResult<CohortRow> {
        let mut t = self.tables.lock().unwrap();
        find(&mut t.cohorts, "cohort", id, |c| c.id).map(|c| c.clone())
    }

    async fn list_cohorts(&self) -> StoreResult<Vec<CohortRow>> {
        let mut rows = self.tables.lock().unwrap().cohorts.clone();
        rows.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        Ok(rows)
    }

    async fn create_applicant(&self, a: NewApplicant) -> StoreResult<ApplicantRow> {
        let mut t = self.tables.lock().unwrap();
        find(&mut t.cohorts, "cohort", a.cohort_id, |c| c.id)?;
        if t
            .applicants
            .iter()
            .any(|x| x.cohort_id == a.cohort_id && x.email == a.email)
        {
            return Err(StoreError::Conflict(format!(
                "{} has already applied to cohort {}",
                a.email, a.cohort_id
            )));
        }
        let now = Utc::now();
        let row = ApplicantRow {
            id: Uuid::new_v4(),
            cohort_id: a.cohort_id,
            name: a.name,
            email: a.email,
            role: a.role.as_str().to_string(),
            status: ApplicantStatus::Applied.as_str().to_string(),
            portfolio_url: a.portfolio_url,
            github_url: a.github_url,
            project_description: a.project_description,
            time_commitment: a.time_commitment,
            applied_at: now,
            updated_at: now,
        };
        t.applicants.push(row.clone());
        Ok(row)
    }

    async fn get_applicant(&self, id: Uuid) -> StoreResult<ApplicantRow> {
        let mut t = self.tables.lock().unwrap();
        find(&mut t.applicants, "applicant", id, |a| a.id).map(|a| a.clone())
    }

    async fn list_applicants(&self, cohort_id: Option<Uuid>) -> StoreResult<Vec<ApplicantRow>> {
        let t = self.tables.lock().unwrap();
        Ok(t.applicants
            .iter()
            .filter(|a| cohort_id.map_or(true, |c| a.cohort_id == c))
            .cloned()
            .collect())
    }

    async fn set_applicant_status(
        &self,
        id: Uuid,
        expected: ApplicantStatus,
        status: ApplicantStatus,
    ) -> StoreResult<ApplicantRow> {
        let mut t = self.tables.lock().unwrap();
        move_applicant(&mut t, id, expected, status)
    }

    async fn create_submission(&self, s: NewSubmission) -> StoreResult<MicroshipSubmissionRow> {
        let mut t = self.tables.lock().unwrap();
        find(&mut t.applicants, "applicant", s.applicant_id, |a| a.id)?;
        if t.submissions.iter().any(|x| x.applicant_id == s.applicant_id) {
            return Err(StoreError::Conflict(format!(
                "applicant {} already has a submission",
                s.applicant_id
            )));
        }
        let mut row = submission_row(s.applicant_id);
        row.submission_url = s.submission_url;
        row.submission_type = s.submission_type;
        row.content = s.content;
        row.submitted_at = s.submitted_at;
        row.deadline = s.deadline;
        row.on_time = s.on_time;
        row.communication_log = s.communication_log;
        t.submissions.push(row.clone());
        Ok(row)
    }

    async fn get_submission(&self, id: Uuid) -> StoreResult<MicroshipSubmissionRow> {
        let mut t = self.tables.lock().unwrap();
        find(&mut t.submissions, "microship submission", id, |s| s.id).map(|s| s.clone())
    }

    async fn list_submissions(
        &self,
        applicant_id: Option<Uuid>,
    ) -> StoreResult<Vec<MicroshipSubmissionRow>> {
        let t = self.tables.lock().unwrap();
        Ok(t.submissions
            .iter()
            .filter(|s| applicant_id.map_or(true, |a| s.applicant_id == a))
            .cloned()
            .collect())
    }

    async fn get_evaluation(&self, id: Uuid) -> StoreResult<EvaluationRow> {
        let mut t = self.tables.lock().unwrap();
        find(&mut t.evaluations, "evaluation", id, |e| e.id).map(|e| e.clone())
    }

    async fn list_evaluations(&self, applicant_id: Uuid) -> StoreResult<Vec<EvaluationRow>> {
        let t = self.tables.lock().unwrap();
        Ok(t.evaluations
            .iter()
            .rev()
            .filter(|e| e.applicant_id == applicant_id)
            .cloned()
            .collect())
    }

    async fn record_screening(
        &self,
        evaluation: NewEvaluation,
        expected: ApplicantStatus,
        status: ApplicantStatus,
    ) -> StoreResult<EvaluationRow> {
        let mut t = self.tables.lock().unwrap();
        move_applicant(&mut t, evaluation.applicant_id, expected, status)?;
        Ok(append_evaluation(&mut t, evaluation))
    }

    async fn record_microship_evaluation(
        &self,
        submission_id: Uuid,
        score: SubmissionScore,
        evaluation: NewEvaluation,
        expected: ApplicantStatus,
        status: ApplicantStatus,
    ) -> StoreResult<(MicroshipSubmissionRow, EvaluationRow)> {
        let mut t = self.tables.lock().unwrap();
        if !t
            .submissions
            .iter()
            .any(|s| s.id == submission_id && s.applicant_id == evaluation.applicant_id)
        {
            return Err(StoreError::not_found("microship submission", submission_id));
        }
        move_applicant(&mut t, evaluation.applicant_id, expected, status)?;

        let submission = find(
            &mut t.submissions,
            "microship submission",
            submission_id,
            |s| s.id,
        )?;
        submission.raw_analysis = Some(score.raw_analysis);
        submission.weighted_score = Some(score.weighted_score);
        submission.outcome = Some(score.outcome.as_str().to_string());
        submission.evaluated_at = Some(Utc::now());
        let submission = submission.clone();

        Ok((submission, append_evaluation(&mut t, evaluation)))
    }

    async fn record_review(
        &self,
        evaluation_id: Uuid,
        approved: bool,
        feedback: Option<String>,
        expected: ApplicantStatus,
        status: ApplicantStatus,
    ) -> StoreResult<EvaluationRow> {
        let mut t = self.tables.lock().unwrap();
        let evaluation = find(&mut t.evaluations, "evaluation", evaluation_id, |e| e.id)?;
        if evaluation.human_reviewed || evaluation.superseded {
            return Err(StoreError::Conflict(format!(
                "evaluation {evaluation_id} was already reviewed or has been superseded"
            )));
        }
        let applicant_id = evaluation.applicant_id;
        move_applicant(&mut t, applicant_id, expected, status)?;

        let evaluation = find(&mut t.evaluations, "evaluation", evaluation_id, |e| e.id)?;
        evaluation.human_reviewed = true;
        evaluation.approved = Some(approved);
        evaluation.reviewer_feedback = feedback;
        evaluation.reviewed_at = Some(Utc::now());
        Ok(evaluation.clone())
    }

    async fn create_fellow(&self, f: NewFellow) -> StoreResult<FellowRow> {
        let mut t = self.tables.lock().unwrap();
        if t.fellows.iter().any(|x| x.applicant_id == f.applicant_id) {
            return Err(StoreError::Conflict(format!(
                "applicant {} is already a fellow",
                f.applicant_id
            )));
        }
        let mut row = fellow_row(f.cohort_id, &f.name);
        row.applicant_id = f.applicant_id;
        row.role = f.role;
        row.status = FellowStatus::Onboarded.as_str().to_string();
        row.microship_score = f.microship_score;
        row.portfolio_url = f.portfolio_url;
        row.github_url = f.github_url;
        t.fellows.push(row.clone());
        Ok(row)
    }

    async fn get_fellow(&self, id: Uuid) -> StoreResult<FellowRow> {
        let mut t = self.tables.lock().unwrap();
        find(&mut t.fellows, "fellow", id, |f| f.id).map(|f| f.clone())
    }

    async fn list_fellows(&self, cohort_id: Option<Uuid>) -> StoreResult<Vec<FellowRow>> {
        let t = self.tables.lock().unwrap();
        let mut rows: Vec<FellowRow> = t
            .fellows
            .iter()
            .filter(|f| cohort_id.map_or(true, |c| f.cohort_id == c))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn set_fellow_status(
        &self,
        id: Uuid,
        expected: FellowStatus,
        status: FellowStatus,
    ) -> StoreResult<FellowRow> {
        let mut t = self.tables.lock().unwrap();
        let fellow = find(&mut t.fellows, "fellow", id, |f| f.id)?;
        if fellow.status != expected.as_str() {
            return Err(StoreError::Conflict(format!(
                "fellow {id} is no longer {expected}"
            )));
        }
        fellow.status = status.as_str().to_string();
        fellow.updated_at = Utc::now();
        Ok(fellow.clone())
    }

    async fn get_check_in(&self, id: Uuid) -> StoreResult<CheckInRow> {
        let mut t = self.tables.lock().unwrap();
        find(&mut t.check_ins, "check-in", id, |c| c.id).map(|c| c.clone())
    }

    async fn insert_check_in(&self, c: NewCheckIn) -> StoreResult<CheckInRow> {
        let mut t = self.tables.lock().unwrap();
        find(&mut t.fellows, "fellow", c.fellow_id, |f| f.id)?;
        if t
            .check_ins
            .iter()
            .any(|x| x.fellow_id == c.fellow_id && x.week == c.week)
        {
            return Err(StoreError::Conflict(format!(
                "fellow {} already checked in for week {}",
                c.fellow_id, c.week
            )));
        }
        let mut row = check_in_row(c.fellow_id, c.week);
        row.accomplishments = c.accomplishments;
        row.next_focus = c.next_focus;
        row.blockers = c.blockers;
        row.needs_help = c.needs_help;
        row.self_assessment = c.self_assessment;
        row.collaboration_rating = c.collaboration_rating;
        row.energy_level = c.energy_level;
        t.check_ins.push(row.clone());
        Ok(row)
    }

    async fn check_ins_in_window(
        &self,
        fellow_id: Uuid,
        after_week: i32,
        up_to_week: i32,
    ) -> StoreResult<Vec<CheckInRow>> {
        let t = self.tables.lock().unwrap();
        let mut rows: Vec<CheckInRow> = t
            .check_ins
            .iter()
            .filter(|c| c.fellow_id == fellow_id && c.week > after_week && c.week <= up_to_week)
            .cloned()
            .collect();
        rows.sort_by_key(|c| c.week);
        Ok(rows)
    }

    async fn save_check_in_analysis(
        &self,
        id: Uuid,
        a: CheckInAnalysisUpdate,
    ) -> StoreResult<CheckInRow> {
        let mut t = self.tables.lock().unwrap();
        let row = find(&mut t.check_ins, "check-in", id, |c| c.id)?;
        row.analysis = Some(a.analysis);
        row.sentiment_score = Some(a.sentiment_score);
        row.risk_contribution = Some(a.risk_contribution);
        row.risk_label = Some(a.risk_label.as_str().to_string());
        row.blockers_extracted = a.blockers_extracted;
        row.action_items = a.action_items;
        row.themes = a.themes;
        row.concerns = a.concerns;
        row.analyzed_at = Some(Utc::now());
        Ok(row.clone())
    }

    async fn record_risk_assessment(
        &self,
        a: NewRiskAssessment,
    ) -> StoreResult<RiskAssessmentRow> {
        let mut t = self.tables.lock().unwrap();
        let fellow = find(&mut t.fellows, "fellow", a.fellow_id, |f| f.id)?;
        fellow.current_risk_score = Some(a.risk_score);
        fellow.current_risk_level = Some(a.risk_level.as_str().to_string());
        fellow.updated_at = Utc::now();

        let row = RiskAssessmentRow {
            id: Uuid::new_v4(),
            fellow_id: a.fellow_id,
            week: a.week,
            risk_score: a.risk_score,
            risk_level: a.risk_level.as_str().to_string(),
            recommended_action: a.recommended_action.as_str().to_string(),
            contributing_factors: a.contributing_factors,
            concerns: a.concerns,
            signals: a.signals,
            action_taken: None,
            actioned_at: None,
            assessed_at: Utc::now(),
        };
        t.assessments.push(row.clone());
        Ok(row)
    }

    async fn risk_history(&self, fellow_id: Uuid) -> StoreResult<Vec<RiskAssessmentRow>> {
        let t = self.tables.lock().unwrap();
        // Insertion order breaks ties where timestamps collide.
        let mut rows: Vec<(usize, RiskAssessmentRow)> = t
            .assessments
            .iter()
            .filter(|a| a.fellow_id == fellow_id)
            .cloned()
            .enumerate()
            .collect();
        rows.sort_by(|(i, a), (j, b)| (b.week, j).cmp(&(a.week, i)));
        Ok(rows.into_iter().map(|(_, r)| r).collect())
    }

    async fn cohort_assessments(
        &self,
        cohort_id: Uuid,
        up_to_week: i32,
    ) -> StoreResult<Vec<RiskAssessmentRow>> {
        let t = self.tables.lock().unwrap();
        Ok(t.assessments
            .iter()
            .filter(|a| a.week <= up_to_week)
            .filter(|a| {
                t.fellows
                    .iter()
                    .any(|f| f.id == a.fellow_id && f.cohort_id == cohort_id)
            })
            .cloned()
            .collect())
    }

    async fn get_risk_assessment(&self, id: Uuid) -> StoreResult<RiskAssessmentRow> {
        let mut t = self.tables.lock().unwrap();
        find(&mut t.assessments, "risk assessment", id, |a| a.id).map(|a| a.clone())
    }

    async fn record_risk_action(
        &self,
        id: Uuid,
        action: String,
    ) -> StoreResult<RiskAssessmentRow> {
        let mut t = self.tables.lock().unwrap();
        let row = find(&mut t.assessments, "risk assessment", id, |a| a.id)?;
        row.action_taken = Some(action);
        row.actioned_at = Some(Utc::now());
        Ok(row.clone())
    }

    async fn create_warning(&self, w: NewWarning) -> StoreResult<WarningRow> {
        let mut t = self.tables.lock().unwrap();
        find(&mut t.fellows, "fellow", w.fellow_id, |f| f.id)?;
        let row = warning_row(w);
        t.warnings.push(row.clone());
        Ok(row)
    }

    async fn get_warning(&self, id: Uuid) -> StoreResult<WarningRow> {
        let mut t = self.tables.lock().unwrap();
        find(&mut t.warnings, "warning", id, |w| w.id).map(|w| w.clone())
    }

    async fn edit_warning(&self, id: Uuid, edit: WarningEdit) -> StoreResult<WarningRow> {
        let mut t = self.tables.lock().unwrap();
        let row = find(&mut t.warnings, "warning", id, |w| w.id)?;
        if row.sent {
            return Err(StoreError::Conflict(format!(
                "warning {id} has been sent and can no longer be edited"
            )));
        }
        if let Some(message) = edit.message {
            row.message = message;
        }
        if let Some(concerns) = edit.concerns {
            row.concerns = concerns;
        }
        if let Some(requirements) = edit.requirements {
            row.requirements = requirements;
        }
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn send_warning(
        &self,
        id: Uuid,
        expected_count: i32,
        next: FellowStanding,
    ) -> StoreResult<(FellowRow, WarningRow)> {
        let mut t = self.tables.lock().unwrap();
        let draft = find(&mut t.warnings, "warning", id, |w| w.id)?.clone();
        if draft.sent {
            return Err(StoreError::Conflict(format!(
                "warning {id} was already sent"
            )));
        }
        check_standing(&t, draft.fellow_id, expected_count)?;
        let fellow = write_standing(&mut t, draft.fellow_id, next)?;
        let row = find(&mut t.warnings, "warning", id, |w| w.id)?;
        mark_sent(row, next.warnings_count);
        Ok((fellow, row.clone()))
    }

    async fn issue_warning(
        &self,
        w: NewWarning,
        expected_count: i32,
        next: FellowStanding,
    ) -> StoreResult<(FellowRow, WarningRow)> {
        let mut t = self.tables.lock().unwrap();
        check_standing(&t, w.fellow_id, expected_count)?;
        let fellow = write_standing(&mut t, w.fellow_id, next)?;
        let mut row = warning_row(w);
        mark_sent(&mut row, next.warnings_count);
        t.warnings.push(row.clone());
        Ok((fellow, row))
    }

    async fn list_warnings(&self, fellow_id: Uuid) -> StoreResult<Vec<WarningRow>> {
        let t = self.tables.lock().unwrap();
        let mut rows: Vec<WarningRow> = t
            .warnings
            .iter()
            .filter(|w| w.fellow_id == fellow_id)
            .cloned()
            .collect();
        // Sent by number, drafts after them; the sort is stable.
        rows.sort_by_key(|w| w.warning_number.unwrap_or(i32::MAX));
        Ok(rows)
    }

    async fn acknowledge_warning(&self, id: Uuid) -> StoreResult<WarningRow> {
        let mut t = self.tables.lock().unwrap();
        let row = find(&mut t.warnings, "warning", id, |w| w.id)?;
        if !row.sent {
            return Err(StoreError::Conflict(format!(
                "warning {id} has not been sent yet"
            )));
        }
        row.acknowledged_at.get_or_insert_with(Utc::now);
        Ok(row.clone())
    }

    async fn latest_profile(&self, fellow_id: Uuid) -> StoreResult<Option<ProfileRow>> {
        let t = self.tables.lock().unwrap();
        Ok(t.profiles
            .iter()
            .filter(|p| p.fellow_id == fellow_id)
            .max_by_key(|p| p.version)
            .cloned())
    }

    async fn save_profile(&self, p: NewProfile) -> StoreResult<ProfileRow> {
        let mut t = self.tables.lock().unwrap();
        let version = t
            .profiles
            .iter()
            .filter(|x| x.fellow_id == p.fellow_id)
            .map(|x| x.version)
            .max()
            .unwrap_or(0)
            + 1;
        let row = ProfileRow {
            id: Uuid::new_v4(),
            fellow_id: p.fellow_id,
            headline: p.headline,
            summary: p.summary,
            skills: p.skills,
            linkedin_summary: p.linkedin_summary,
            version,
            generated_at: Utc::now(),
        };
        t.profiles.push(row.clone());
        Ok(row)
    }

    async fn create_opportunity(&self, o: NewOpportunity) -> StoreResult<OpportunityRow> {
        let mut row = opportunity_row(&o.employer_name);
        row.title = o.title;
        row.description = o.description;
        row.requirements = o.requirements;
        row.preferred_skills = o.preferred_skills;
        row.experience_level = o.experience_level;
        row.location = o.location;
        row.remote_ok = o.remote_ok;
        self.tables.lock().unwrap().opportunities.push(row.clone());
        Ok(row)
    }

    async fn get_opportunity(&self, id: Uuid) -> StoreResult<OpportunityRow> {
        let mut t = self.tables.lock().unwrap();
        find(&mut t.opportunities, "opportunity", id, |o| o.id).map(|o| o.clone())
    }

    async fn list_opportunities(&self, open_only: bool) -> StoreResult<Vec<OpportunityRow>> {
        let t = self.tables.lock().unwrap();
        Ok(t.opportunities
            .iter()
            .rev()
            .filter(|o| !open_only || o.status == "open")
            .cloned()
            .collect())
    }

    async fn upsert_matches(
        &self,
        fellow_id: Uuid,
        matches: Vec<NewMatch>,
    ) -> StoreResult<Vec<PlacementMatchRow>> {
        let mut t = self.tables.lock().unwrap();
        let mut rows = Vec::with_capacity(matches.len());
        for m in matches {
            let existing = t
                .matches
                .iter()
                .position(|x| x.fellow_id == fellow_id && x.opportunity_id == m.opportunity_id);
            let row = match existing {
                Some(i) => {
                    let row = &mut t.matches[i];
                    row.match_score = m.match_score;
                    row.match_reasoning = Some(m.match_reasoning);
                    row.skill_gaps = m.skill_gaps;
                    row.clone()
                }
                None => {
                    let row = PlacementMatchRow {
                        id: Uuid::new_v4(),
                        fellow_id,
                        opportunity_id: m.opportunity_id,
                        match_score: m.match_score,
                        match_reasoning: Some(m.match_reasoning),
                        skill_gaps: m.skill_gaps,
                        status: PlacementStatus::Proposed.as_str().to_string(),
                        introduction_sent_at: None,
                        created_at: Utc::now(),
                    };
                    t.matches.push(row.clone());
                    row
                }
            };
            rows.push(row);
        }
        rows.sort_by(|a, b| b.match_score.cmp(&a.match_score));
        Ok(rows)
    }

    async fn get_match(&self, id: Uuid) -> StoreResult<PlacementMatchRow> {
        let mut t = self.tables.lock().unwrap();
        find(&mut t.matches, "placement match", id, |m| m.id).map(|m| m.clone())
    }

    async fn list_matches(&self, fellow_id: Uuid) -> StoreResult<Vec<PlacementMatchRow>> {
        let t = self.tables.lock().unwrap();
        let mut rows: Vec<PlacementMatchRow> = t
            .matches
            .iter()
            .filter(|m| m.fellow_id == fellow_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.match_score.cmp(&a.match_score));
        Ok(rows)
    }

    async fn set_match_status(
        &self,
        id: Uuid,
        status: PlacementStatus,
    ) -> StoreResult<PlacementMatchRow> {
        let mut t = self.tables.lock().unwrap();
        let row = find(&mut t.matches, "placement match", id, |m| m.id)?;
        row.status = status.as_str().to_string();
        if status == PlacementStatus::IntroductionSent {
            row.introduction_sent_at = Some(Utc::now());
        }
        Ok(row.clone())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Scripted evaluator
// ────────────────────────────────────────────────────────────────────────────

type Script<T> = Mutex<VecDeque<Result<T, AdapterError>>>;

/// Replays queued responses per method. An empty queue answers with a
/// malformed-payload error so an unexpected call fails loudly.
#[derive(Default)]
pub struct ScriptedEvaluator {
    screenings: Script<ApplicationScreening>,
    microships: Script<MicroshipJudgement>,
    check_ins: Script<CheckInJudgement>,
    profiles: Script<ProfileDraft>,
    matches: Script<Vec<MatchJudgement>>,
    warnings: Script<WarningDraft>,
    interleaved: Mutex<Option<Box<dyn FnOnce() + Send>>>,
    calls: AtomicUsize,
}

impl ScriptedEvaluator {
    pub fn push_screening(&self, r: Result<ApplicationScreening, AdapterError>) {
        self.screenings.lock().unwrap().push_back(r);
    }

    pub fn push_microship(&self, r: Result<MicroshipJudgement, AdapterError>) {
        self.microships.lock().unwrap().push_back(r);
    }

    pub fn push_check_in(&self, r: Result<CheckInJudgement, AdapterError>) {
        self.check_ins.lock().unwrap().push_back(r);
    }

    pub fn push_profile(&self, r: Result<ProfileDraft, AdapterError>) {
        self.profiles.lock().unwrap().push_back(r);
    }

    pub fn push_matches(&self, r: Result<Vec<MatchJudgement>, AdapterError>) {
        self.matches.lock().unwrap().push_back(r);
    }

    pub fn push_warning(&self, r: Result<WarningDraft, AdapterError>) {
        self.warnings.lock().unwrap().push_back(r);
    }

    /// Runs `f` during the next call, before it answers. Stands in for a
    /// second writer acting while the model is thinking.
    pub fn interleave(&self, f: impl FnOnce() + Send + 'static) {
        *self.interleaved.lock().unwrap() = Some(Box::new(f));
    }

    /// Total calls across all methods.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next<T>(&self, script: &Script<T>, action: &str) -> Result<T, AdapterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(f) = self.interleaved.lock().unwrap().take() {
            f();
        }
        script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AdapterError::malformed(format!("no scripted {action}"))))
    }
}

#[async_trait]
impl Evaluator for ScriptedEvaluator {
    fn model_name(&self) -> &str {
        "scripted"
    }

    async fn screen_application(
        &self,
        _: &ApplicationPayload,
    ) -> Result<ApplicationScreening, AdapterError> {
        self.next(&self.screenings, "screening")
    }

    async fn evaluate_microship(
        &self,
        _: &MicroshipPayload,
    ) -> Result<MicroshipJudgement, AdapterError> {
        self.next(&self.microships, "microship evaluation")
    }

    async fn analyze_check_in(&self, _: &CheckInPayload) -> Result<CheckInJudgement, AdapterError> {
        self.next(&self.check_ins, "check-in analysis")
    }

    async fn generate_profile(&self, _: &ProfilePayload) -> Result<ProfileDraft, AdapterError> {
        self.next(&self.profiles, "profile")
    }

    async fn match_opportunities(
        &self,
        _: &MatchPayload,
    ) -> Result<Vec<MatchJudgement>, AdapterError> {
        self.next(&self.matches, "matches")
    }

    async fn draft_warning(&self, _: &WarningPayload) -> Result<WarningDraft, AdapterError> {
        self.next(&self.warnings, "warning draft")
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Row builders
// ────────────────────────────────────────────────────────────────────────────

pub fn cohort_row() -> CohortRow {
    CohortRow {
        id: Uuid::new_v4(),
        name: "Cohort 4".into(),
        start_date: NaiveDate::from_ymd_opt(2026, 1, 12).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2026, 4, 3).unwrap(),
        status: "active".into(),
    }
}

pub fn applicant_row(status: ApplicantStatus) -> ApplicantRow {
    let now = Utc::now();
    ApplicantRow {
        id: Uuid::new_v4(),
        cohort_id: Uuid::new_v4(),
        name: "Grace Hopper".into(),
        email: "grace@example.com".into(),
        role: "backend".into(),
        status: status.as_str().to_string(),
        portfolio_url: Some("https://example.com/grace".into()),
        github_url: Some("https://github.com/grace".into()),
        project_description: Some("Built a compiler.".into()),
        time_commitment: true,
        applied_at: now,
        updated_at: now,
    }
}

pub fn submission_row(applicant_id: Uuid) -> MicroshipSubmissionRow {
    MicroshipSubmissionRow {
        id: Uuid::new_v4(),
        applicant_id,
        submission_url: Some("https://github.com/grace/microship".into()),
        submission_type: Some("github".into()),
        content: Some("README and service code".into()),
        submitted_at: Some(Utc::now()),
        deadline: Some(Utc::now()),
        on_time: Some(true),
        communication_log: json!([]),
        raw_analysis: None,
        weighted_score: None,
        outcome: None,
        evaluated_at: None,
        created_at: Utc::now(),
    }
}

pub fn fellow_row(cohort_id: Uuid, name: &str) -> FellowRow {
    let now = Utc::now();
    FellowRow {
        id: Uuid::new_v4(),
        applicant_id: Uuid::new_v4(),
        cohort_id,
        name: name.to_string(),
        role: "backend".into(),
        status: FellowStatus::Active.as_str().to_string(),
        current_risk_level: None,
        current_risk_score: None,
        warnings_count: 0,
        microship_score: Some(3.4),
        milestone_1_score: None,
        milestone_2_score: None,
        milestone_3_score: None,
        portfolio_url: None,
        github_url: None,
        created_at: now,
        updated_at: now,
    }
}

fn check_in_row(fellow_id: Uuid, week: i32) -> CheckInRow {
    CheckInRow {
        id: Uuid::new_v4(),
        fellow_id,
        week,
        accomplishments: None,
        next_focus: None,
        blockers: None,
        needs_help: None,
        self_assessment: None,
        collaboration_rating: None,
        energy_level: None,
        submitted_at: Utc::now(),
        analysis: None,
        sentiment_score: None,
        risk_contribution: None,
        risk_label: None,
        blockers_extracted: Vec::new(),
        action_items: Vec::new(),
        themes: Vec::new(),
        concerns: Vec::new(),
        analyzed_at: None,
    }
}

pub fn analysed_check_in(fellow_id: Uuid, week: i32, sentiment: f64, risk: f64) -> CheckInRow {
    let mut row = check_in_row(fellow_id, week);
    row.accomplishments = Some(format!("week {week} work"));
    row.sentiment_score = Some(sentiment);
    row.risk_contribution = Some(risk);
    row.risk_label = RiskLevel::from_score(risk).ok().map(|l| l.as_str().to_string());
    row.themes = vec!["api design".into()];
    row.analyzed_at = Some(Utc::now());
    row
}

pub fn check_in_request(fellow_id: Uuid, week: i32) -> CheckInRequest {
    CheckInRequest {
        fellow_id,
        week,
        accomplishments: Some("Shipped the billing endpoint".into()),
        next_focus: Some("Tests".into()),
        blockers: None,
        needs_help: None,
        self_assessment: Some("met".into()),
        collaboration_rating: Some("good".into()),
        energy_level: Some(7),
    }
}

pub fn assessment_row(fellow_id: Uuid, week: i32, score: f64) -> RiskAssessmentRow {
    let level = RiskLevel::from_score(score).unwrap();
    RiskAssessmentRow {
        id: Uuid::new_v4(),
        fellow_id,
        week,
        risk_score: score,
        risk_level: level.as_str().to_string(),
        recommended_action: RecommendedAction::for_level(level).as_str().to_string(),
        contributing_factors: json!({}),
        concerns: json!({}),
        signals: json!({}),
        action_taken: None,
        actioned_at: None,
        assessed_at: Utc::now(),
    }
}

pub fn opportunity_row(employer: &str) -> OpportunityRow {
    OpportunityRow {
        id: Uuid::new_v4(),
        employer_name: employer.to_string(),
        title: "Backend Engineer".into(),
        description: None,
        requirements: vec!["Rust".into()],
        preferred_skills: vec!["Postgres".into()],
        experience_level: Some("junior".into()),
        location: None,
        remote_ok: true,
        status: "open".into(),
        created_at: Utc::now(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Judgement builders
// ────────────────────────────────────────────────────────────────────────────

/// Every dimension set to `score`.
pub fn screening_judgement(score: f64, confidence: f64) -> ApplicationScreening {
    ApplicationScreening {
        scores: ApplicationScores {
            completeness: score,
            portfolio_quality: score,
            role_fit: score,
            commitment_signals: score,
        },
        overall_score: None,
        reasoning: "Clear portfolio and relevant project.".into(),
        flags: Vec::new(),
        confidence,
    }
}

/// Scores in rubric order: technical, discipline, behaviour, instructions.
pub fn microship_judgement(scores: [f64; 4], confidence: f64) -> MicroshipJudgement {
    MicroshipJudgement {
        scores: SubScores {
            technical_execution: scores[0],
            execution_discipline: scores[1],
            professional_behavior: scores[2],
            instruction_following: scores[3],
        },
        evidence: BTreeMap::from([(
            "technical_execution".to_string(),
            "tests pass".to_string(),
        )]),
        disqualifiers: None,
        strengths: vec!["clean code".into()],
        concerns: Vec::new(),
        confidence,
        reasoning: "Solid submission.".into(),
        weighted_score: None,
        overall_score: None,
        outcome: None,
        requires_human_review: None,
    }
}

pub fn check_in_judgement(sentiment: f64, risk: f64) -> CheckInJudgement {
    CheckInJudgement {
        sentiment_score: sentiment,
        risk_contribution: risk,
        blockers_extracted: vec!["waiting on API keys".into()],
        action_items: Vec::new(),
        themes: vec!["integration".into()],
        concerns: Vec::new(),
        positive_signals: Vec::new(),
        confidence: Some(0.8),
        summary: "Steady week.".into(),
    }
}

pub fn profile_draft(headline: &str) -> ProfileDraft {
    ProfileDraft {
        headline: headline.to_string(),
        summary: "Builds reliable services.".into(),
        skills: vec![ProfileSkill {
            name: "Rust".into(),
            proficiency: Some("intermediate".into()),
            evidence: None,
        }],
        linkedin_summary: None,
    }
}

pub fn match_judgement(opportunity_id: Uuid, score: f64) -> MatchJudgement {
    MatchJudgement {
        opportunity_id,
        match_score: score,
        reasoning: "Stack overlap.".into(),
        strengths: vec!["Rust".into()],
        gaps: vec!["Kubernetes".into()],
    }
}

pub fn warning_draft(message: &str) -> WarningDraft {
    WarningDraft {
        message: message.to_string(),
        tone: Some("supportive".into()),
        key_points: Vec::new(),
        requirements: vec!["Submit check-ins every week".into()],
        timeline: Some("two weeks".into()),
        recommended_followup: None,
    }
}
