use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProfileRow {
    pub id: Uuid,
    pub fellow_id: Uuid,
    pub headline: String,
    pub summary: String,
    pub skills: Vec<String>,
    pub linkedin_summary: Option<String>,
    pub version: i32,
    pub generated_at: DateTime<Utc>,
}

/// Externally sourced; read-mostly.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OpportunityRow {
    pub id: Uuid,
    pub employer_name: String,
    pub title: String,
    pub description: Option<String>,
    pub requirements: Vec<String>,
    pub preferred_skills: Vec<String>,
    pub experience_level: Option<String>,
    pub location: Option<String>,
    pub remote_ok: bool,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PlacementMatchRow {
    pub id: Uuid,
    pub fellow_id: Uuid,
    pub opportunity_id: Uuid,
    pub match_score: i32,
    pub match_reasoning: Option<String>,
    pub skill_gaps: Vec<String>,
    pub status: String,
    pub introduction_sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
