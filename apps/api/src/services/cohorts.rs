use chrono::NaiveDate;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::fellow::CohortRow;
use crate::state::AppState;
use crate::store::NewCohort;

const COHORT_STATUSES: [&str; 3] = ["upcoming", "active", "completed"];

fn default_status() -> String {
    "upcoming".to_string()
}

#[derive(Debug, Deserialize)]
pub struct CohortRequest {
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default = "default_status")]
    pub status: String,
}

pub async fn create_cohort(state: &AppState, req: CohortRequest) -> Result<CohortRow, AppError> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("name is required".into()));
    }
    if req.end_date < req.start_date {
        return Err(AppError::Validation("end_date is before start_date".into()));
    }
    if !COHORT_STATUSES.contains(&req.status.as_str()) {
        return Err(AppError::Validation(format!(
            "unknown cohort status '{}'",
            req.status
        )));
    }

    let row = state
        .store
        .create_cohort(NewCohort {
            name: name.to_string(),
            start_date: req.start_date,
            end_date: req.end_date,
            status: req.status,
        })
        .await?;

    info!(cohort_id = %row.id, name = %row.name, "cohort created");
    Ok(row)
}

pub async fn get_cohort(state: &AppState, id: Uuid) -> Result<CohortRow, AppError> {
    Ok(state.store.get_cohort(id).await?)
}

/// Latest start first.
pub async fn list_cohorts(state: &AppState) -> Result<Vec<CohortRow>, AppError> {
    Ok(state.store.list_cohorts().await?)
}
