use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::fellow::{CheckInRow, CollaborationRating, RiskAssessmentRow, SelfAssessment};
use crate::scoring::{self, build_risk_dashboard, RiskAssessmentResult, RiskDashboard, RiskSignals};
use crate::scoring::risk::CheckInSignal;
use crate::state::AppState;
use crate::store::NewRiskAssessment;

/// Prior assessments considered when deciding whether risk is rising.
const TREND_WINDOW: usize = 2;

#[derive(Debug, Serialize)]
pub struct RiskResult {
    pub assessment: RiskAssessmentRow,
    pub result: RiskAssessmentResult,
}

fn signal(row: &CheckInRow) -> Result<CheckInSignal, AppError> {
    let collaboration = row
        .collaboration_rating
        .as_deref()
        .map(str::parse::<CollaborationRating>)
        .transpose()?;
    let self_assessment = row
        .self_assessment
        .as_deref()
        .map(str::parse::<SelfAssessment>)
        .transpose()?;

    Ok(CheckInSignal {
        week: row.week,
        sentiment_score: row.sentiment_score,
        risk_contribution: row.risk_contribution,
        energy_level: row.energy_level,
        collaboration_struggling: collaboration.map(|c| c == CollaborationRating::Struggling),
        below_expectations: self_assessment.map(|s| s == SelfAssessment::Below),
        concerns: row.concerns.clone(),
    })
}

/// Scores a fellow for `week` (default: the latest week they checked in) and
/// appends the assessment. Earlier assessments are never modified.
pub async fn assess_risk(
    state: &AppState,
    fellow_id: Uuid,
    week: Option<i32>,
) -> Result<RiskResult, AppError> {
    let fellow = state.store.get_fellow(fellow_id).await?;

    let week = match week {
        Some(w) if w < 1 => return Err(AppError::Validation("week must be 1 or later".into())),
        Some(w) => w,
        None => state
            .store
            .check_ins_in_window(fellow_id, 0, i32::MAX)
            .await?
            .last()
            .map(|c| c.week)
            .ok_or_else(|| {
                AppError::Validation("fellow has no check-ins; specify a week".into())
            })?,
    };

    let lookback = state.config.check_in_lookback_weeks;
    let window = state
        .store
        .check_ins_in_window(fellow_id, week - lookback as i32, week)
        .await?;
    let signals: Vec<CheckInSignal> = window.iter().map(signal).collect::<Result<_, _>>()?;

    let prior_scores: Vec<f64> = state
        .store
        .risk_history(fellow_id)
        .await?
        .iter()
        .filter(|a| a.week <= week)
        .take(TREND_WINDOW)
        .map(|a| a.risk_score)
        .collect();

    // Early weeks cannot have a full window of check-ins.
    let expected = lookback.min(week as u32);
    let gathered = RiskSignals::gather(
        &signals,
        expected,
        &fellow.milestone_scores(),
        fellow.warnings_count.max(0) as u32,
        &prior_scores,
    )?;
    let result = scoring::assess_risk(gathered)?;

    let assessment = state
        .store
        .record_risk_assessment(NewRiskAssessment {
            fellow_id,
            week,
            risk_score: result.risk_score,
            risk_level: result.risk_level,
            recommended_action: result.recommended_action,
            contributing_factors: serde_json::to_value(&result.contributing_factors)?,
            concerns: serde_json::to_value(&result.concerns)?,
            signals: serde_json::to_value(&result.signals)?,
        })
        .await?;

    info!(
        %fellow_id,
        week,
        risk_score = result.risk_score,
        risk_level = %result.risk_level,
        rising = result.signals.risk_increasing,
        "risk assessed"
    );

    Ok(RiskResult { assessment, result })
}

pub async fn risk_history(
    state: &AppState,
    fellow_id: Uuid,
) -> Result<Vec<RiskAssessmentRow>, AppError> {
    state.store.get_fellow(fellow_id).await?;
    Ok(state.store.risk_history(fellow_id).await?)
}

pub async fn get_assessment(
    state: &AppState,
    assessment_id: Uuid,
) -> Result<RiskAssessmentRow, AppError> {
    Ok(state.store.get_risk_assessment(assessment_id).await?)
}

/// Notes what a coordinator did about an assessment.
pub async fn record_action(
    state: &AppState,
    assessment_id: Uuid,
    action: &str,
) -> Result<RiskAssessmentRow, AppError> {
    let action = action.trim();
    if action.is_empty() {
        return Err(AppError::Validation("action must not be empty".into()));
    }
    let row = state
        .store
        .record_risk_action(assessment_id, action.to_string())
        .await?;
    info!(%assessment_id, fellow_id = %row.fellow_id, "risk action recorded");
    Ok(row)
}

/// Cohort view as of `week`; without a week, as of the latest assessed week.
pub async fn risk_dashboard(
    state: &AppState,
    cohort_id: Uuid,
    week: Option<i32>,
) -> Result<RiskDashboard, AppError> {
    state.store.get_cohort(cohort_id).await?;
    let fellows = state.store.list_fellows(Some(cohort_id)).await?;
    let up_to = week.unwrap_or(i32::MAX);
    let assessments = state.store.cohort_assessments(cohort_id, up_to).await?;
    let week = week.unwrap_or_else(|| assessments.iter().map(|a| a.week).max().unwrap_or(0));

    let dashboard = build_risk_dashboard(cohort_id, week, &fellows, &assessments)?;
    Ok(dashboard)
}
