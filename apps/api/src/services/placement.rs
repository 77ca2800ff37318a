use std::collections::HashSet;

use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::evaluation::{AdapterError, MatchPayload, ProfilePayload};
use crate::models::placement::{OpportunityRow, PlacementMatchRow, ProfileRow};
use crate::state::AppState;
use crate::store::{NewMatch, NewOpportunity, NewProfile};
use crate::workflow::{PlacementEvent, PlacementStatus, Transition};

/// Generates a new profile version from the fellow's record and analysed
/// check-ins. Earlier versions are kept.
pub async fn generate_profile(state: &AppState, fellow_id: Uuid) -> Result<ProfileRow, AppError> {
    let fellow = state.store.get_fellow(fellow_id).await?;
    let check_ins = state.store.check_ins_in_window(fellow_id, 0, i32::MAX).await?;

    let mut themes: Vec<String> = Vec::new();
    for theme in check_ins.iter().rev().flat_map(|c| c.themes.iter()) {
        if !themes.contains(theme) {
            themes.push(theme.clone());
        }
    }
    let accomplishments = check_ins
        .iter()
        .rev()
        .filter_map(|c| c.accomplishments.clone())
        .filter(|a| !a.trim().is_empty())
        .collect();

    let payload = ProfilePayload {
        fellow_id,
        fellow_name: fellow.name.clone(),
        role: fellow.role.clone(),
        microship_score: fellow.microship_score,
        milestone_scores: fellow.milestone_scores(),
        portfolio_url: fellow.portfolio_url.clone(),
        github_url: fellow.github_url.clone(),
        themes,
        accomplishments,
    };
    let draft = state.evaluator.generate_profile(&payload).await?;
    if draft.headline.trim().is_empty() || draft.summary.trim().is_empty() {
        return Err(
            AdapterError::malformed("profile headline and summary are required").into(),
        );
    }

    let profile = state
        .store
        .save_profile(NewProfile {
            fellow_id,
            headline: draft.headline.trim().to_string(),
            summary: draft.summary.trim().to_string(),
            skills: draft.skill_names(),
            linkedin_summary: draft.linkedin_summary,
        })
        .await?;

    info!(%fellow_id, version = profile.version, "profile generated");
    Ok(profile)
}

/// Scores the fellow's latest profile against open opportunities and stores one
/// match per opportunity, best first.
pub async fn match_opportunities(
    state: &AppState,
    fellow_id: Uuid,
) -> Result<Vec<PlacementMatchRow>, AppError> {
    let fellow = state.store.get_fellow(fellow_id).await?;
    let profile = state.store.latest_profile(fellow_id).await?.ok_or_else(|| {
        AppError::NotFound(format!(
            "fellow {fellow_id} has no profile; generate one first"
        ))
    })?;

    let opportunities = state.store.list_opportunities(true).await?;
    if opportunities.is_empty() {
        info!(%fellow_id, "no open opportunities to match");
        return Ok(Vec::new());
    }
    let known: HashSet<Uuid> = opportunities.iter().map(|o| o.id).collect();

    let payload = MatchPayload {
        fellow_id,
        fellow_name: fellow.name.clone(),
        role: fellow.role.clone(),
        profile,
        opportunities,
    };
    let judgements = state.evaluator.match_opportunities(&payload).await?;

    let mut seen = HashSet::new();
    let mut matches = Vec::with_capacity(judgements.len());
    for judgement in judgements {
        let id = judgement.opportunity_id;
        if !known.contains(&id) {
            return Err(
                AdapterError::malformed(format!("unknown opportunity {id}")).into(),
            );
        }
        if !seen.insert(id) {
            return Err(
                AdapterError::malformed(format!("opportunity {id} matched twice")).into(),
            );
        }
        let validated = judgement.validate()?;
        matches.push(NewMatch {
            opportunity_id: id,
            match_score: validated.match_score,
            match_reasoning: validated.reasoning,
            skill_gaps: validated.skill_gaps,
        });
    }

    let mut rows = state.store.upsert_matches(fellow_id, matches).await?;
    rows.sort_by(|a, b| b.match_score.cmp(&a.match_score));

    info!(%fellow_id, matched = rows.len(), "opportunities matched");
    Ok(rows)
}

pub async fn send_introduction(
    state: &AppState,
    match_id: Uuid,
) -> Result<PlacementMatchRow, AppError> {
    let row = state.store.get_match(match_id).await?;
    let status: PlacementStatus = row.status.parse()?;
    let next = status.transition(&PlacementEvent::SendIntroduction)?;
    let row = state.store.set_match_status(match_id, next).await?;
    info!(%match_id, fellow_id = %row.fellow_id, "introduction sent");
    Ok(row)
}

/// The current (highest) profile version.
pub async fn latest_profile(state: &AppState, fellow_id: Uuid) -> Result<ProfileRow, AppError> {
    state.store.get_fellow(fellow_id).await?;
    state
        .store
        .latest_profile(fellow_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("fellow {fellow_id} has no profile")))
}

pub async fn list_matches(
    state: &AppState,
    fellow_id: Uuid,
) -> Result<Vec<PlacementMatchRow>, AppError> {
    state.store.get_fellow(fellow_id).await?;
    Ok(state.store.list_matches(fellow_id).await?)
}

#[derive(Debug, Deserialize)]
pub struct OpportunityRequest {
    pub employer_name: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub preferred_skills: Vec<String>,
    #[serde(default)]
    pub experience_level: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub remote_ok: bool,
}

/// Opens a role for matching.
pub async fn create_opportunity(
    state: &AppState,
    req: OpportunityRequest,
) -> Result<OpportunityRow, AppError> {
    let employer_name = req.employer_name.trim();
    let title = req.title.trim();
    if employer_name.is_empty() || title.is_empty() {
        return Err(AppError::Validation(
            "employer_name and title are required".into(),
        ));
    }

    let row = state
        .store
        .create_opportunity(NewOpportunity {
            employer_name: employer_name.to_string(),
            title: title.to_string(),
            description: req.description,
            requirements: req.requirements,
            preferred_skills: req.preferred_skills,
            experience_level: req.experience_level,
            location: req.location,
            remote_ok: req.remote_ok,
        })
        .await?;

    info!(opportunity_id = %row.id, employer = %row.employer_name, "opportunity created");
    Ok(row)
}

pub async fn get_opportunity(state: &AppState, id: Uuid) -> Result<OpportunityRow, AppError> {
    Ok(state.store.get_opportunity(id).await?)
}

pub async fn list_opportunities(
    state: &AppState,
    open_only: bool,
) -> Result<Vec<OpportunityRow>, AppError> {
    Ok(state.store.list_opportunities(open_only).await?)
}
