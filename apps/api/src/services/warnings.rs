use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::evaluation::{WarningDraft, WarningPayload};
use crate::models::fellow::{FellowRow, WarningRow};
use crate::scoring::RiskLevel;
use crate::state::AppState;
use crate::store::{NewWarning, WarningEdit};
use crate::workflow::{FellowEvent, FellowStanding, Transition};

fn standing(fellow: &FellowRow) -> Result<FellowStanding, AppError> {
    Ok(FellowStanding {
        status: fellow.status.parse()?,
        warnings_count: fellow.warnings_count,
    })
}

/// Latest risk concerns and recent blockers, for the warning text.
async fn warning_context(
    state: &AppState,
    fellow: &FellowRow,
    warning_number: i32,
) -> Result<WarningPayload, AppError> {
    let latest = state.store.risk_history(fellow.id).await?.into_iter().next();
    let (risk_level, risk_score, concerns) = match &latest {
        Some(a) => {
            let level: RiskLevel = a.risk_level.parse()?;
            let concerns = match &a.concerns {
                Value::Object(map) => map
                    .values()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect(),
                _ => Vec::new(),
            };
            (Some(level), Some(a.risk_score), concerns)
        }
        None => (None, None, Vec::new()),
    };

    let lookback = state.config.check_in_lookback_weeks as usize;
    let check_ins = state.store.check_ins_in_window(fellow.id, 0, i32::MAX).await?;
    let recent_blockers = check_ins
        .iter()
        .rev()
        .take(lookback)
        .flat_map(|c| c.blockers_extracted.iter().cloned())
        .collect();

    Ok(WarningPayload {
        fellow_id: fellow.id,
        fellow_name: fellow.name.clone(),
        role: fellow.role.clone(),
        warning_number,
        risk_level,
        risk_score,
        concerns,
        recent_blockers,
    })
}

#[derive(Debug, Serialize)]
pub struct DraftedWarning {
    /// The stored draft, unsent and unnumbered.
    pub warning: WarningRow,
    /// The number the warning will carry if it is sent next.
    pub next_warning_number: i32,
    pub draft: WarningDraft,
}

/// Drafts the next warning and stores it unsent for a reviewer to edit. The
/// fellow's standing is unchanged; drafting is refused when issuing would be.
pub async fn draft_warning(state: &AppState, fellow_id: Uuid) -> Result<DraftedWarning, AppError> {
    let fellow = state.store.get_fellow(fellow_id).await?;
    let next = standing(&fellow)?.transition(&FellowEvent::IssueWarning)?;

    let payload = warning_context(state, &fellow, next.warnings_count).await?;
    let draft = state.evaluator.draft_warning(&payload).await?;

    let warning = state
        .store
        .create_warning(NewWarning {
            fellow_id,
            concerns: payload.concerns,
            requirements: draft.requirements.clone(),
            message: draft.message.clone(),
        })
        .await?;

    info!(%fellow_id, warning_id = %warning.id, "warning drafted");

    Ok(DraftedWarning {
        warning,
        next_warning_number: next.warnings_count,
        draft,
    })
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WarningEditRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub concerns: Option<Vec<String>>,
    #[serde(default)]
    pub requirements: Option<Vec<String>>,
}

/// Reviewer edits to a draft. Sent warnings are immutable.
pub async fn edit_warning(
    state: &AppState,
    warning_id: Uuid,
    req: WarningEditRequest,
) -> Result<WarningRow, AppError> {
    if req.message.as_deref().is_some_and(|m| m.trim().is_empty()) {
        return Err(AppError::Validation("message cannot be blank".into()));
    }
    let row = state
        .store
        .edit_warning(
            warning_id,
            WarningEdit {
                message: req.message,
                concerns: req.concerns,
                requirements: req.requirements,
            },
        )
        .await?;
    info!(%warning_id, fellow_id = %row.fellow_id, "warning draft edited");
    Ok(row)
}

pub async fn get_warning(state: &AppState, warning_id: Uuid) -> Result<WarningRow, AppError> {
    Ok(state.store.get_warning(warning_id).await?)
}

#[derive(Debug, Serialize)]
pub struct IssuedWarning {
    pub fellow: FellowRow,
    pub warning: WarningRow,
}

/// Sends a stored draft. Only here does the warning get its number and count
/// against the fellow, guarded on the count this call started from.
pub async fn send_warning(state: &AppState, warning_id: Uuid) -> Result<IssuedWarning, AppError> {
    let draft = state.store.get_warning(warning_id).await?;
    if draft.sent {
        return Err(AppError::Conflict(format!(
            "warning {warning_id} was already sent"
        )));
    }
    let fellow = state.store.get_fellow(draft.fellow_id).await?;
    let current = standing(&fellow)?;
    let next = current.transition(&FellowEvent::IssueWarning)?;

    let (fellow, warning) = state
        .store
        .send_warning(warning_id, current.warnings_count, next)
        .await?;

    info!(
        fellow_id = %fellow.id,
        %warning_id,
        warning_number = next.warnings_count,
        status = %next.status,
        "warning issued"
    );

    Ok(IssuedWarning { fellow, warning })
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IssueWarningRequest {
    /// Reviewed text. Drafted by the evaluator when absent.
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub concerns: Vec<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
}

/// Writes and sends a warning in one step, drafting the text when none is
/// given. The warning row and the fellow's new standing are written together.
pub async fn issue_warning(
    state: &AppState,
    fellow_id: Uuid,
    req: IssueWarningRequest,
) -> Result<IssuedWarning, AppError> {
    let fellow = state.store.get_fellow(fellow_id).await?;
    let current = standing(&fellow)?;
    let next = current.transition(&FellowEvent::IssueWarning)?;

    let message = req.message.filter(|m| !m.trim().is_empty());
    let (message, concerns, requirements) = match message {
        Some(message) => (message, req.concerns, req.requirements),
        None => {
            let payload = warning_context(state, &fellow, next.warnings_count).await?;
            let draft = state.evaluator.draft_warning(&payload).await?;
            let concerns = if req.concerns.is_empty() {
                payload.concerns
            } else {
                req.concerns
            };
            let requirements = if req.requirements.is_empty() {
                draft.requirements
            } else {
                req.requirements
            };
            (draft.message, concerns, requirements)
        }
    };

    let (fellow, warning) = state
        .store
        .issue_warning(
            NewWarning {
                fellow_id,
                concerns,
                requirements,
                message,
            },
            current.warnings_count,
            next,
        )
        .await?;

    info!(
        %fellow_id,
        warning_id = %warning.id,
        warning_number = next.warnings_count,
        status = %next.status,
        "warning issued"
    );

    Ok(IssuedWarning { fellow, warning })
}

pub async fn list_warnings(state: &AppState, fellow_id: Uuid) -> Result<Vec<WarningRow>, AppError> {
    state.store.get_fellow(fellow_id).await?;
    Ok(state.store.list_warnings(fellow_id).await?)
}

/// Only a sent warning can be acknowledged; repeating keeps the first time.
pub async fn acknowledge_warning(
    state: &AppState,
    warning_id: Uuid,
) -> Result<WarningRow, AppError> {
    let row = state.store.acknowledge_warning(warning_id).await?;
    info!(%warning_id, fellow_id = %row.fellow_id, "warning acknowledged");
    Ok(row)
}
