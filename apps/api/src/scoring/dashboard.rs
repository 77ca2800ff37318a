use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use uuid::Uuid;

use super::{RecommendedAction, RiskLevel};
use crate::labels::UnknownLabel;
use crate::models::fellow::{FellowRow, RiskAssessmentRow};

#[derive(Debug, Clone, Serialize)]
pub struct FellowRiskRow {
    pub fellow_id: Uuid,
    pub name: String,
    pub role: String,
    pub warnings_count: i32,
    pub risk_level: Option<RiskLevel>,
    pub risk_score: Option<f64>,
    pub assessed_week: Option<i32>,
    pub recommended_action: Option<RecommendedAction>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RiskDashboard {
    pub cohort_id: Uuid,
    pub week: i32,
    /// Always carries all four levels, zero-filled.
    pub summary: BTreeMap<RiskLevel, usize>,
    pub not_assessed: Vec<Uuid>,
    pub fellows: Vec<FellowRiskRow>,
}

/// Groups a cohort's fellows by the level of their latest assessment at or
/// before `week`. Fellows with no such assessment are listed in `not_assessed`
/// and excluded from the level counts.
pub fn build_risk_dashboard(
    cohort_id: Uuid,
    week: i32,
    fellows: &[FellowRow],
    assessments: &[RiskAssessmentRow],
) -> Result<RiskDashboard, UnknownLabel> {
    let mut latest: HashMap<Uuid, &RiskAssessmentRow> = HashMap::new();
    for a in assessments.iter().filter(|a| a.week <= week) {
        latest
            .entry(a.fellow_id)
            .and_modify(|current| {
                if (a.week, a.assessed_at) > (current.week, current.assessed_at) {
                    *current = a;
                }
            })
            .or_insert(a);
    }

    let mut summary: BTreeMap<RiskLevel, usize> =
        RiskLevel::ALL.iter().map(|level| (*level, 0)).collect();
    let mut not_assessed = Vec::new();
    let mut rows = Vec::with_capacity(fellows.len());

    for fellow in fellows.iter().filter(|f| f.cohort_id == cohort_id) {
        let row = match latest.get(&fellow.id) {
            Some(assessment) => {
                let level: RiskLevel = assessment.risk_level.parse()?;
                *summary.entry(level).or_default() += 1;
                FellowRiskRow {
                    fellow_id: fellow.id,
                    name: fellow.name.clone(),
                    role: fellow.role.clone(),
                    warnings_count: fellow.warnings_count,
                    risk_level: Some(level),
                    risk_score: Some(assessment.risk_score),
                    assessed_week: Some(assessment.week),
                    recommended_action: Some(RecommendedAction::for_level(level)),
                }
            }
            None => {
                not_assessed.push(fellow.id);
                FellowRiskRow {
                    fellow_id: fellow.id,
                    name: fellow.name.clone(),
                    role: fellow.role.clone(),
                    warnings_count: fellow.warnings_count,
                    risk_level: None,
                    risk_score: None,
                    assessed_week: None,
                    recommended_action: None,
                }
            }
        };
        rows.push(row);
    }

    rows.sort_by(|a, b| match (a.risk_score, b.risk_score) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.name.cmp(&b.name),
    });

    Ok(RiskDashboard {
        cohort_id,
        week,
        summary,
        not_assessed,
        fellows: rows,
    })
}
