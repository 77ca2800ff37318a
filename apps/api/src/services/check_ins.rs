use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::evaluation::{CheckInAnalysis, CheckInPayload};
use crate::models::fellow::{CheckInRow, CollaborationRating, SelfAssessment};
use crate::scoring::{check, ENERGY};
use crate::state::AppState;
use crate::store::{CheckInAnalysisUpdate, NewCheckIn};

#[derive(Debug, Clone, Deserialize)]
pub struct CheckInRequest {
    pub fellow_id: Uuid,
    pub week: i32,
    #[serde(default)]
    pub accomplishments: Option<String>,
    #[serde(default)]
    pub next_focus: Option<String>,
    #[serde(default)]
    pub blockers: Option<String>,
    #[serde(default)]
    pub needs_help: Option<String>,
    #[serde(default)]
    pub self_assessment: Option<String>,
    #[serde(default)]
    pub collaboration_rating: Option<String>,
    #[serde(default)]
    pub energy_level: Option<i32>,
}

/// Stores a weekly check-in. One per fellow per week.
pub async fn submit_check_in(
    state: &AppState,
    req: CheckInRequest,
) -> Result<CheckInRow, AppError> {
    if req.week < 1 {
        return Err(AppError::Validation("week must be 1 or later".into()));
    }
    if let Some(energy) = req.energy_level {
        check("energy_level", f64::from(energy), ENERGY)?;
    }
    if let Some(label) = &req.self_assessment {
        label
            .parse::<SelfAssessment>()
            .map_err(|e| AppError::Validation(e.to_string()))?;
    }
    if let Some(label) = &req.collaboration_rating {
        label
            .parse::<CollaborationRating>()
            .map_err(|e| AppError::Validation(e.to_string()))?;
    }

    // 404 before 409.
    state.store.get_fellow(req.fellow_id).await?;

    let row = state
        .store
        .insert_check_in(NewCheckIn {
            fellow_id: req.fellow_id,
            week: req.week,
            accomplishments: req.accomplishments,
            next_focus: req.next_focus,
            blockers: req.blockers,
            needs_help: req.needs_help,
            self_assessment: req.self_assessment,
            collaboration_rating: req.collaboration_rating,
            energy_level: req.energy_level,
        })
        .await?;

    info!(fellow_id = %row.fellow_id, week = row.week, "check-in submitted");
    Ok(row)
}

#[derive(Debug, Serialize)]
pub struct CheckInAnalysisResult {
    pub check_in: CheckInRow,
    pub analysis: CheckInAnalysis,
}

/// Runs (or re-runs) analysis; the stored analysis is replaced.
pub async fn analyze_check_in(
    state: &AppState,
    check_in_id: Uuid,
) -> Result<CheckInAnalysisResult, AppError> {
    let check_in = state.store.get_check_in(check_in_id).await?;
    let fellow = state.store.get_fellow(check_in.fellow_id).await?;

    let payload = CheckInPayload::new(&fellow, &check_in);
    let analysis = state.evaluator.analyze_check_in(&payload).await?.validate()?;

    let check_in = state
        .store
        .save_check_in_analysis(
            check_in_id,
            CheckInAnalysisUpdate {
                analysis: serde_json::to_value(&analysis)?,
                sentiment_score: analysis.sentiment_score,
                risk_contribution: analysis.risk_contribution,
                risk_label: analysis.risk_label,
                blockers_extracted: analysis.blockers_extracted.clone(),
                action_items: analysis.action_items.clone(),
                themes: analysis.themes.clone(),
                concerns: analysis.concerns.clone(),
            },
        )
        .await?;

    info!(
        %check_in_id,
        fellow_id = %fellow.id,
        week = check_in.week,
        sentiment = analysis.sentiment_score,
        risk_contribution = analysis.risk_contribution,
        "check-in analysed"
    );

    Ok(CheckInAnalysisResult { check_in, analysis })
}

pub async fn get_check_in(state: &AppState, id: Uuid) -> Result<CheckInRow, AppError> {
    Ok(state.store.get_check_in(id).await?)
}

/// All of a fellow's check-ins, oldest week first.
pub async fn list_check_ins(
    state: &AppState,
    fellow_id: Uuid,
) -> Result<Vec<CheckInRow>, AppError> {
    state.store.get_fellow(fellow_id).await?;
    let rows = state.store.check_ins_in_window(fellow_id, 0, i32::MAX).await?;
    Ok(rows)
}
