use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::{
    CheckInAnalysisUpdate, EntityStore, NewApplicant, NewCheckIn, NewCohort, NewEvaluation,
    NewFellow, NewMatch, NewOpportunity, NewProfile, NewRiskAssessment, NewSubmission, NewWarning,
    StoreError, StoreResult, SubmissionScore, WarningEdit,
};
use crate::models::applicant::{ApplicantRow, EvaluationRow, MicroshipSubmissionRow};
use crate::models::fellow::{CheckInRow, CohortRow, FellowRow, RiskAssessmentRow, WarningRow};
use crate::models::placement::{OpportunityRow, PlacementMatchRow, ProfileRow};
use crate::workflow::{ApplicantStatus, FellowStanding, FellowStatus, PlacementStatus};

/// PostgreSQL-backed store. Queries are checked at runtime (no offline
/// metadata); row types map column-for-column onto migrations/0001_init.sql.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Unique violations become `Conflict`; everything else stays a database error.
fn conflict_on_unique(e: sqlx::Error, message: impl FnOnce() -> String) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Conflict(message()),
        _ => StoreError::Database(e),
    }
}

const INSERT_EVALUATION: &str = r#"
    INSERT INTO evaluations
        (applicant_id, submission_id, kind, scores, weighted_score, outcome, reasoning,
         evidence, disqualifiers, flags, confidence, requires_human_review, model_used)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
    RETURNING *
"#;

macro_rules! bind_evaluation {
    ($query:expr, $e:expr) => {
        $query
            .bind($e.applicant_id)
            .bind($e.submission_id)
            .bind($e.kind.as_str())
            .bind(&$e.scores)
            .bind($e.weighted_score)
            .bind(&$e.outcome)
            .bind(&$e.reasoning)
            .bind(&$e.evidence)
            .bind(&$e.disqualifiers)
            .bind(&$e.flags)
            .bind($e.confidence)
            .bind($e.requires_human_review)
            .bind(&$e.model_used)
    };
}


/// Moves an applicant from `expected` to `status`. Someone else having moved
/// the applicant first is a `Conflict`.
async fn move_applicant(
    conn: &mut PgConnection,
    id: Uuid,
    expected: ApplicantStatus,
    status: ApplicantStatus,
) -> StoreResult<ApplicantRow> {
    let row = sqlx::query_as::<_, ApplicantRow>(
        r#"
        UPDATE applicants SET status = $1, updated_at = now()
        WHERE id = $2 AND status = $3
        RETURNING *
        "#,
    )
    .bind(status.as_str())
    .bind(id)
    .bind(expected.as_str())
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(row) = row {
        return Ok(row);
    }
    let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM applicants WHERE id = $1)")
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;
    if exists {
        Err(StoreError::Conflict(format!(
            "applicant {id} is no longer {expected}"
        )))
    } else {
        Err(StoreError::not_found("applicant", id))
    }
}

/// Appends an evaluation after marking every earlier one of its kind superseded.
async fn append_evaluation(
    conn: &mut PgConnection,
    evaluation: &NewEvaluation,
) -> StoreResult<EvaluationRow> {
    sqlx::query(
        r#"
        UPDATE evaluations SET superseded = TRUE
        WHERE applicant_id = $1 AND kind = $2 AND NOT superseded
        "#,
    )
    .bind(evaluation.applicant_id)
    .bind(evaluation.kind.as_str())
    .execute(&mut *conn)
    .await?;

    Ok(
        bind_evaluation!(
            sqlx::query_as::<_,
            EvaluationRow>(INSERT_EVALUATION),
            evaluation
        )
            .fetch_one(&mut *conn)
            .await?,
    )
}

/// Writes a warned fellow's new standing if nobody else warned them since
/// `expected_count` was read.
async fn write_standing(
    conn: &mut PgConnection,
    fellow_id: Uuid,
    expected_count: i32,
    next: FellowStanding,
) -> StoreResult<FellowRow> {
    let row = sqlx::query_as::<_, FellowRow>(
        r#"
        UPDATE fellows SET status = $1, warnings_count = $2, updated_at = now()
        WHERE id = $3 AND warnings_count = $4
        RETURNING *
        "#,
    )
    .bind(next.status.as_str())
    .bind(next.warnings_count)
    .bind(fellow_id)
    .bind(expected_count)
    .fetch_optional(&mut *conn)
    .await?;

    row.ok_or_else(|| {
        StoreError::Conflict(format!(
            "fellow {fellow_id} was warned concurrently; re-read and retry"
        ))
    })
}

#[async_trait]
impl EntityStore for PgStore {
    // ── Cohorts ────────────────────────────────────────────────────────────

    async fn create_cohort(&self, c: NewCohort) -> StoreResult<CohortRow> {
        Ok(sqlx::query_as::<_, CohortRow>(
            r#"
            INSERT INTO cohorts (name, start_date, end_date, status)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&c.name)
        .bind(c.start_date)
        .bind(c.end_date)
        .bind(&c.status)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn get_cohort(&self, id: Uuid) -> StoreResult<CohortRow> {
        sqlx::query_as::<_, CohortRow>("SELECT * FROM cohorts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found("cohort", id))
    }

    async fn list_cohorts(&self) -> StoreResult<Vec<CohortRow>> {
        Ok(
            sqlx::query_as::<_, CohortRow>("SELECT * FROM cohorts ORDER BY start_date DESC")
                .fetch_all(&self.pool)
                .await?,
        )
    }

    // ── Applicants and evaluations ─────────────────────────────────────────

    async fn create_applicant(&self, a: NewApplicant) -> StoreResult<ApplicantRow> {
        sqlx::query_as::<_, ApplicantRow>(
            r#"
            INSERT INTO applicants
                (cohort_id, name, email, role, status, portfolio_url, github_url,
                 project_description, time_commitment)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(a.cohort_id)
        .bind(&a.name)
        .bind(&a.email)
        .bind(a.role.as_str())
        .bind(ApplicantStatus::Applied.as_str())
        .bind(&a.portfolio_url)
        .bind(&a.github_url)
        .bind(&a.project_description)
        .bind(a.time_commitment)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            conflict_on_unique(e, || {
                format!("{} has already applied to cohort {}", a.email, a.cohort_id)
            })
        })
    }

    async fn get_applicant(&self, id: Uuid) -> StoreResult<ApplicantRow> {
        sqlx::query_as::<_, ApplicantRow>("SELECT * FROM applicants WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found("applicant", id))
    }

    async fn list_applicants(&self, cohort_id: Option<Uuid>) -> StoreResult<Vec<ApplicantRow>> {
        Ok(sqlx::query_as::<_, ApplicantRow>(
            r#"
            SELECT * FROM applicants
            WHERE ($1::uuid IS NULL OR cohort_id = $1)
            ORDER BY applied_at
            "#,
        )
        .bind(cohort_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn set_applicant_status(
        &self,
        id: Uuid,
        expected: ApplicantStatus,
        status: ApplicantStatus,
    ) -> StoreResult<ApplicantRow> {
        let mut conn = self.pool.acquire().await?;
        move_applicant(&mut conn, id, expected, status).await
    }

    async fn create_submission(&self, s: NewSubmission) -> StoreResult<MicroshipSubmissionRow> {
        sqlx::query_as::<_, MicroshipSubmissionRow>(
            r#"
            INSERT INTO microship_submissions
                (applicant_id, submission_url, submission_type, content, submitted_at,
                 deadline, on_time, communication_log)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(s.applicant_id)
        .bind(&s.submission_url)
        .bind(&s.submission_type)
        .bind(&s.content)
        .bind(s.submitted_at)
        .bind(s.deadline)
        .bind(s.on_time)
        .bind(&s.communication_log)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            conflict_on_unique(e, || {
                format!("applicant {} already has a submission", s.applicant_id)
            })
        })
    }

    async fn get_submission(&self, id: Uuid) -> StoreResult<MicroshipSubmissionRow> {
        sqlx::query_as::<_, MicroshipSubmissionRow>(
            "SELECT * FROM microship_submissions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::not_found("microship submission", id))
    }

    async fn list_submissions(
        &self,
        applicant_id: Option<Uuid>,
    ) -> StoreResult<Vec<MicroshipSubmissionRow>> {
        Ok(sqlx::query_as::<_, MicroshipSubmissionRow>(
            r#"
            SELECT * FROM microship_submissions
            WHERE ($1::uuid IS NULL OR applicant_id = $1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(applicant_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn get_evaluation(&self, id: Uuid) -> StoreResult<EvaluationRow> {
        sqlx::query_as::<_, EvaluationRow>("SELECT * FROM evaluations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found("evaluation", id))
    }

    async fn list_evaluations(&self, applicant_id: Uuid) -> StoreResult<Vec<EvaluationRow>> {
        Ok(sqlx::query_as::<_, EvaluationRow>(
            "SELECT * FROM evaluations WHERE applicant_id = $1 ORDER BY created_at DESC",
        )
        .bind(applicant_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn record_screening(
        &self,
        evaluation: NewEvaluation,
        expected: ApplicantStatus,
        status: ApplicantStatus,
    ) -> StoreResult<EvaluationRow> {
        let mut tx = self.pool.begin().await?;
        move_applicant(&mut tx, evaluation.applicant_id, expected, status).await?;
        let row = append_evaluation(&mut tx, &evaluation).await?;
        tx.commit().await?;
        Ok(row)
    }

    async fn record_microship_evaluation(
        &self,
        submission_id: Uuid,
        score: SubmissionScore,
        evaluation: NewEvaluation,
        expected: ApplicantStatus,
        status: ApplicantStatus,
    ) -> StoreResult<(MicroshipSubmissionRow, EvaluationRow)> {
        let mut tx = self.pool.begin().await?;

        move_applicant(&mut tx, evaluation.applicant_id, expected, status).await?;

        let submission = sqlx::query_as::<_, MicroshipSubmissionRow>(
            r#"
            UPDATE microship_submissions
            SET raw_analysis = $1, weighted_score = $2, outcome = $3, evaluated_at = now()
            WHERE id = $4 AND applicant_id = $5
            RETURNING *
            "#,
        )
        .bind(&score.raw_analysis)
        .bind(score.weighted_score)
        .bind(score.outcome.as_str())
        .bind(submission_id)
        .bind(evaluation.applicant_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| StoreError::not_found("microship submission", submission_id))?;

        let row = append_evaluation(&mut tx, &evaluation).await?;

        tx.commit().await?;
        Ok((submission, row))
    }

    async fn record_review(
        &self,
        evaluation_id: Uuid,
        approved: bool,
        feedback: Option<String>,
        expected: ApplicantStatus,
        status: ApplicantStatus,
    ) -> StoreResult<EvaluationRow> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, EvaluationRow>(
            r#"
            UPDATE evaluations
            SET human_reviewed = TRUE, approved = $1, reviewer_feedback = $2, reviewed_at = now()
            WHERE id = $3 AND NOT human_reviewed AND NOT superseded
            RETURNING *
            "#,
        )
        .bind(approved)
        .bind(feedback)
        .bind(evaluation_id)
        .fetch_optional(&mut *tx)
        .await?;

        let row = match row {
            Some(row) => row,
            None => {
                let exists: bool =
                    sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM evaluations WHERE id = $1)")
                        .bind(evaluation_id)
                        .fetch_one(&mut *tx)
                        .await?;
                return Err(if exists {
                    StoreError::Conflict(format!(
                        "evaluation {evaluation_id} was already reviewed or has been superseded"
                    ))
                } else {
                    StoreError::not_found("evaluation", evaluation_id)
                });
            }
        };

        move_applicant(&mut tx, row.applicant_id, expected, status).await?;

        tx.commit().await?;
        Ok(row)
    }

    // ── Fellows ────────────────────────────────────────────────────────────

    async fn create_fellow(&self, f: NewFellow) -> StoreResult<FellowRow> {
        sqlx::query_as::<_, FellowRow>(
            r#"
            INSERT INTO fellows
                (applicant_id, cohort_id, name, role, status, microship_score,
                 portfolio_url, github_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(f.applicant_id)
        .bind(f.cohort_id)
        .bind(&f.name)
        .bind(&f.role)
        .bind(FellowStatus::Onboarded.as_str())
        .bind(f.microship_score)
        .bind(&f.portfolio_url)
        .bind(&f.github_url)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            conflict_on_unique(e, || {
                format!("applicant {} is already a fellow", f.applicant_id)
            })
        })
    }

    async fn get_fellow(&self, id: Uuid) -> StoreResult<FellowRow> {
        sqlx::query_as::<_, FellowRow>("SELECT * FROM fellows WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found("fellow", id))
    }

    async fn list_fellows(&self, cohort_id: Option<Uuid>) -> StoreResult<Vec<FellowRow>> {
        Ok(sqlx::query_as::<_, FellowRow>(
            r#"
            SELECT * FROM fellows
            WHERE ($1::uuid IS NULL OR cohort_id = $1)
            ORDER BY name
            "#,
        )
        .bind(cohort_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn set_fellow_status(
        &self,
        id: Uuid,
        expected: FellowStatus,
        status: FellowStatus,
    ) -> StoreResult<FellowRow> {
        let row = sqlx::query_as::<_, FellowRow>(
            r#"
            UPDATE fellows SET status = $1, updated_at = now()
            WHERE id = $2 AND status = $3
            RETURNING *
            "#,
        )
        .bind(status.as_str())
        .bind(id)
        .bind(expected.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(row),
            None => {
                // Distinguish a missing fellow from one whose status moved underneath us.
                self.get_fellow(id).await?;
                Err(StoreError::Conflict(format!(
                    "fellow {id} is no longer {expected}"
                )))
            }
        }
    }
    // ── Check-ins ──────────────────────────────────────────────────────────

    async fn get_check_in(&self, id: Uuid) -> StoreResult<CheckInRow> {
        sqlx::query_as::<_, CheckInRow>("SELECT * FROM check_ins WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found("check-in", id))
    }

    async fn insert_check_in(&self, c: NewCheckIn) -> StoreResult<CheckInRow> {
        sqlx::query_as::<_, CheckInRow>(
            r#"
            INSERT INTO check_ins
                (fellow_id, week, accomplishments, next_focus, blockers, needs_help,
                 self_assessment, collaboration_rating, energy_level)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(c.fellow_id)
        .bind(c.week)
        .bind(&c.accomplishments)
        .bind(&c.next_focus)
        .bind(&c.blockers)
        .bind(&c.needs_help)
        .bind(&c.self_assessment)
        .bind(&c.collaboration_rating)
        .bind(c.energy_level)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            conflict_on_unique(e, || {
                format!(
                    "fellow {} already checked in for week {}",
                    c.fellow_id, c.week
                )
            })
        })
    }

    async fn check_ins_in_window(
        &self,
        fellow_id: Uuid,
        after_week: i32,
        up_to_week: i32,
    ) -> StoreResult<Vec<CheckInRow>> {
        Ok(sqlx::query_as::<_, CheckInRow>(
            r#"
            SELECT * FROM check_ins
            WHERE fellow_id = $1 AND week > $2 AND week <= $3
            ORDER BY week
            "#,
        )
        .bind(fellow_id)
        .bind(after_week)
        .bind(up_to_week)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn save_check_in_analysis(
        &self,
        id: Uuid,
        a: CheckInAnalysisUpdate,
    ) -> StoreResult<CheckInRow> {
        sqlx::query_as::<_, CheckInRow>(
            r#"
            UPDATE check_ins
            SET analysis = $1, sentiment_score = $2, risk_contribution = $3, risk_label = $4,
                blockers_extracted = $5, action_items = $6, themes = $7, concerns = $8,
                analyzed_at = now()
            WHERE id = $9
            RETURNING *
            "#,
        )
        .bind(&a.analysis)
        .bind(a.sentiment_score)
        .bind(a.risk_contribution)
        .bind(a.risk_label.as_str())
        .bind(&a.blockers_extracted)
        .bind(&a.action_items)
        .bind(&a.themes)
        .bind(&a.concerns)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::not_found("check-in", id))
    }

    // ── Risk ───────────────────────────────────────────────────────────────

    async fn record_risk_assessment(
        &self,
        a: NewRiskAssessment,
    ) -> StoreResult<RiskAssessmentRow> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE fellows
            SET current_risk_score = $1, current_risk_level = $2, updated_at = now()
            WHERE id = $3
            "#,
        )
        .bind(a.risk_score)
        .bind(a.risk_level.as_str())
        .bind(a.fellow_id)
        .execute(&mut *tx)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(StoreError::not_found("fellow", a.fellow_id));
        }

        let row = sqlx::query_as::<_, RiskAssessmentRow>(
            r#"
            INSERT INTO risk_assessments
                (fellow_id, week, risk_score, risk_level, recommended_action,
                 contributing_factors, concerns, signals)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(a.fellow_id)
        .bind(a.week)
        .bind(a.risk_score)
        .bind(a.risk_level.as_str())
        .bind(a.recommended_action.as_str())
        .bind(&a.contributing_factors)
        .bind(&a.concerns)
        .bind(&a.signals)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row)
    }

    async fn risk_history(&self, fellow_id: Uuid) -> StoreResult<Vec<RiskAssessmentRow>> {
        Ok(sqlx::query_as::<_, RiskAssessmentRow>(
            r#"
            SELECT * FROM risk_assessments
            WHERE fellow_id = $1
            ORDER BY week DESC, assessed_at DESC
            "#,
        )
        .bind(fellow_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn cohort_assessments(
        &self,
        cohort_id: Uuid,
        up_to_week: i32,
    ) -> StoreResult<Vec<RiskAssessmentRow>> {
        Ok(sqlx::query_as::<_, RiskAssessmentRow>(
            r#"
            SELECT r.* FROM risk_assessments r
            JOIN fellows f ON f.id = r.fellow_id
            WHERE f.cohort_id = $1 AND r.week <= $2
            "#,
        )
        .bind(cohort_id)
        .bind(up_to_week)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn get_risk_assessment(&self, id: Uuid) -> StoreResult<RiskAssessmentRow> {
        sqlx::query_as::<_, RiskAssessmentRow>("SELECT * FROM risk_assessments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found("risk assessment", id))
    }

    async fn record_risk_action(
        &self,
        id: Uuid,
        action: String,
    ) -> StoreResult<RiskAssessmentRow> {
        sqlx::query_as::<_, RiskAssessmentRow>(
            r#"
            UPDATE risk_assessments SET action_taken = $1, actioned_at = now()
            WHERE id = $2
            RETURNING *
            "#,
        )
        .bind(action)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::not_found("risk assessment", id))
    }

    // ── Warnings ───────────────────────────────────────────────────────────

    async fn create_warning(&self, w: NewWarning) -> StoreResult<WarningRow> {
        Ok(sqlx::query_as::<_, WarningRow>(
            r#"
            INSERT INTO warnings (fellow_id, concerns, requirements, message)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(w.fellow_id)
        .bind(&w.concerns)
        .bind(&w.requirements)
        .bind(&w.message)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn get_warning(&self, id: Uuid) -> StoreResult<WarningRow> {
        sqlx::query_as::<_, WarningRow>("SELECT * FROM warnings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found("warning", id))
    }

    async fn edit_warning(&self, id: Uuid, edit: WarningEdit) -> StoreResult<WarningRow> {
        let row = sqlx::query_as::<_, WarningRow>(
            r#"
            UPDATE warnings
            SET message = COALESCE($1, message),
                concerns = COALESCE($2, concerns),
                requirements = COALESCE($3, requirements),
                updated_at = now()
            WHERE id = $4 AND NOT sent
            RETURNING *
            "#,
        )
        .bind(edit.message)
        .bind(edit.concerns)
        .bind(edit.requirements)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(row),
            None => {
                self.get_warning(id).await?;
                Err(StoreError::Conflict(format!(
                    "warning {id} has been sent and can no longer be edited"
                )))
            }
        }
    }

    async fn send_warning(
        &self,
        id: Uuid,
        expected_count: i32,
        next: FellowStanding,
    ) -> StoreResult<(FellowRow, WarningRow)> {
        let mut tx = self.pool.begin().await?;

        let draft =
            sqlx::query_as::<_, WarningRow>("SELECT * FROM warnings WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| StoreError::not_found("warning", id))?;
        if draft.sent {
            return Err(StoreError::Conflict(format!(
                "warning {id} was already sent"
            )));
        }

        let fellow = write_standing(&mut tx, draft.fellow_id, expected_count, next).await?;

        let warning = sqlx::query_as::<_, WarningRow>(
            r#"
            UPDATE warnings
            SET sent = TRUE, sent_at = now(), warning_number = $1, updated_at = now()
            WHERE id = $2
            RETURNING *
            "#,
        )
        .bind(next.warnings_count)
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            conflict_on_unique(e, || {
                format!(
                    "warning #{} already exists for fellow {}",
                    next.warnings_count, draft.fellow_id
                )
            })
        })?;

        tx.commit().await?;
        Ok((fellow, warning))
    }

    async fn issue_warning(
        &self,
        w: NewWarning,
        expected_count: i32,
        next: FellowStanding,
    ) -> StoreResult<(FellowRow, WarningRow)> {
        let mut tx = self.pool.begin().await?;

        let fellow = write_standing(&mut tx, w.fellow_id, expected_count, next).await?;

        let warning = sqlx::query_as::<_, WarningRow>(
            r#"
            INSERT INTO warnings
                (fellow_id, warning_number, concerns, requirements, message, sent, sent_at)
            VALUES ($1, $2, $3, $4, $5, TRUE, now())
            RETURNING *
            "#,
        )
        .bind(w.fellow_id)
        .bind(next.warnings_count)
        .bind(&w.concerns)
        .bind(&w.requirements)
        .bind(&w.message)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            conflict_on_unique(e, || {
                format!(
                    "warning #{} already exists for fellow {}",
                    next.warnings_count, w.fellow_id
                )
            })
        })?;

        tx.commit().await?;
        Ok((fellow, warning))
    }

    async fn list_warnings(&self, fellow_id: Uuid) -> StoreResult<Vec<WarningRow>> {
        Ok(sqlx::query_as::<_, WarningRow>(
            r#"
            SELECT * FROM warnings
            WHERE fellow_id = $1
            ORDER BY warning_number NULLS LAST, created_at
            "#,
        )
        .bind(fellow_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn acknowledge_warning(&self, id: Uuid) -> StoreResult<WarningRow> {
        let row = sqlx::query_as::<_, WarningRow>(
            r#"
            UPDATE warnings SET acknowledged_at = COALESCE(acknowledged_at, now())
            WHERE id = $1 AND sent
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(row),
            None => {
                self.get_warning(id).await?;
                Err(StoreError::Conflict(format!(
                    "warning {id} has not been sent yet"
                )))
            }
        }
    }

    // ── Placement ──────────────────────────────────────────────────────────

    async fn latest_profile(&self, fellow_id: Uuid) -> StoreResult<Option<ProfileRow>> {
        Ok(sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT * FROM fellow_profiles
            WHERE fellow_id = $1
            ORDER BY version DESC
            LIMIT 1
            "#,
        )
        .bind(fellow_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn save_profile(&self, p: NewProfile) -> StoreResult<ProfileRow> {
        let mut tx = self.pool.begin().await?;

        let current: Option<i32> =
            sqlx::query_scalar(
                "SELECT MAX(version) FROM fellow_profiles WHERE fellow_id = $1",
            )
                .bind(p.fellow_id)
                .fetch_one(&mut *tx)
                .await?;
        let version = current.unwrap_or(0) + 1;

        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            INSERT INTO fellow_profiles
                (fellow_id, headline, summary, skills, linkedin_summary, version)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(p.fellow_id)
        .bind(&p.headline)
        .bind(&p.summary)
        .bind(&p.skills)
        .bind(&p.linkedin_summary)
        .bind(version)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            conflict_on_unique(e, || {
                format!(
                    "profile version {version} for fellow {} already exists",
                    p.fellow_id
                )
            })
        })?;

        tx.commit().await?;
        Ok(row)
    }

    async fn create_opportunity(&self, o: NewOpportunity) -> StoreResult<OpportunityRow> {
        Ok(sqlx::query_as::<_, OpportunityRow>(
            r#"
            INSERT INTO job_opportunities
                (employer_name, title, description, requirements, preferred_skills,
                 experience_level, location, remote_ok)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(&o.employer_name)
        .bind(&o.title)
        .bind(&o.description)
        .bind(&o.requirements)
        .bind(&o.preferred_skills)
        .bind(&o.experience_level)
        .bind(&o.location)
        .bind(o.remote_ok)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn get_opportunity(&self, id: Uuid) -> StoreResult<OpportunityRow> {
        sqlx::query_as::<_, OpportunityRow>("SELECT * FROM job_opportunities WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found("opportunity", id))
    }

    async fn list_opportunities(&self, open_only: bool) -> StoreResult<Vec<OpportunityRow>> {
        Ok(sqlx::query_as::<_, OpportunityRow>(
            r#"
            SELECT * FROM job_opportunities
            WHERE (NOT $1 OR status = 'open')
            ORDER BY created_at DESC
            "#,
        )
        .bind(open_only)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn upsert_matches(
        &self,
        fellow_id: Uuid,
        matches: Vec<NewMatch>,
    ) -> StoreResult<Vec<PlacementMatchRow>> {
        let mut tx = self.pool.begin().await?;
        let mut rows = Vec::with_capacity(matches.len());

        for m in matches {
            let row = sqlx::query_as::<_, PlacementMatchRow>(
                r#"
                INSERT INTO placement_matches
                    (fellow_id, opportunity_id, match_score, match_reasoning, skill_gaps, status)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (fellow_id, opportunity_id) DO UPDATE
                SET match_score = EXCLUDED.match_score,
                    match_reasoning = EXCLUDED.match_reasoning,
                    skill_gaps = EXCLUDED.skill_gaps
                RETURNING *
                "#,
            )
            .bind(fellow_id)
            .bind(m.opportunity_id)
            .bind(m.match_score)
            .bind(&m.match_reasoning)
            .bind(&m.skill_gaps)
            .bind(PlacementStatus::Proposed.as_str())
            .fetch_one(&mut *tx)
            .await?;
            rows.push(row);
        }

        tx.commit().await?;
        rows.sort_by(|a, b| b.match_score.cmp(&a.match_score));
        Ok(rows)
    }

    async fn get_match(&self, id: Uuid) -> StoreResult<PlacementMatchRow> {
        sqlx::query_as::<_, PlacementMatchRow>("SELECT * FROM placement_matches WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found("placement match", id))
    }

    async fn list_matches(&self, fellow_id: Uuid) -> StoreResult<Vec<PlacementMatchRow>> {
        Ok(sqlx::query_as::<_, PlacementMatchRow>(
            r#"
            SELECT * FROM placement_matches
            WHERE fellow_id = $1
            ORDER BY match_score DESC, created_at
            "#,
        )
        .bind(fellow_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn set_match_status(
        &self,
        id: Uuid,
        status: PlacementStatus,
    ) -> StoreResult<PlacementMatchRow> {
        let sent = status == PlacementStatus::IntroductionSent;
        sqlx::query_as::<_, PlacementMatchRow>(
            r#"
            UPDATE placement_matches
            SET status = $1,
                introduction_sent_at = CASE WHEN $2 THEN now() ELSE introduction_sent_at END
            WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(status.as_str())
        .bind(sent)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::not_found("placement match", id))
    }
}
