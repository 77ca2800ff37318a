//! Fellow risk aggregation.
//!
//! Signals are combined as a weighted mean over whichever signals are present,
//! renormalised by the weight actually used, so a fellow with no check-ins yet is
//! scored on milestones and warnings alone instead of being treated as zero risk.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{
    check, InvalidScoreError, RecommendedAction, RiskLevel, ENERGY, SENTIMENT, SUB_SCORE, UNIT,
};

const W_FREQUENCY: f64 = 0.15;
const W_CHECK_IN_RISK: f64 = 0.25;
const W_SENTIMENT: f64 = 0.15;
const W_ENERGY: f64 = 0.10;
const W_MILESTONES: f64 = 0.20;
const W_COLLABORATION: f64 = 0.05;
const W_BELOW_EXPECTATIONS: f64 = 0.05;
const W_WARNINGS: f64 = 0.05;
const W_CONCERNS: f64 = 0.05;

/// Warning count at which the warnings signal saturates (the issuance cap).
const WARNING_SATURATION: f64 = 2.0;
/// Qualitative concern count at which the concerns signal saturates.
const CONCERN_SATURATION: f64 = 3.0;
/// Latest prior score must exceed the earlier mean by this factor to count as rising.
const TREND_FACTOR: f64 = 1.1;
const TREND_AMPLIFIER: f64 = 1.2;

/// One analysed (or not yet analysed) check-in inside the lookback window.
#[derive(Debug, Clone, Default)]
pub struct CheckInSignal {
    pub week: i32,
    pub sentiment_score: Option<f64>,
    pub risk_contribution: Option<f64>,
    pub energy_level: Option<i32>,
    pub collaboration_struggling: Option<bool>,
    pub below_expectations: Option<bool>,
    pub concerns: Vec<String>,
}

/// Normalised inputs to the aggregate score; persisted alongside each assessment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskSignals {
    pub check_in_frequency: f64,
    pub latest_check_in_risk: Option<f64>,
    pub avg_sentiment: Option<f64>,
    pub avg_energy: Option<f64>,
    pub milestone_avg: Option<f64>,
    pub milestone_count: usize,
    pub collaboration_issues: f64,
    pub below_expectations_rate: f64,
    pub warnings_count: u32,
    pub qualitative_concerns: Vec<String>,
    /// Earlier assessment scores, most recent first.
    pub prior_scores: Vec<f64>,
    pub risk_increasing: bool,
}

impl RiskSignals {
    /// Validates raw inputs and reduces them to signals.
    ///
    /// `check_ins` must already be restricted to the lookback window;
    /// `expected_check_ins` is the window length in weeks.
    pub fn gather(
        check_ins: &[CheckInSignal],
        expected_check_ins: u32,
        milestone_scores: &[f64],
        warnings_count: u32,
        prior_scores: &[f64],
    ) -> Result<Self, InvalidScoreError> {
        for ci in check_ins {
            if let Some(s) = ci.sentiment_score {
                check("sentiment_score", s, SENTIMENT)?;
            }
            if let Some(r) = ci.risk_contribution {
                check("risk_contribution", r, UNIT)?;
            }
            if let Some(e) = ci.energy_level {
                check("energy_level", e as f64, ENERGY)?;
            }
        }
        for (i, m) in milestone_scores.iter().enumerate() {
            check(&format!("milestone_{}_score", i + 1), *m, SUB_SCORE)?;
        }
        for p in prior_scores {
            check("prior_risk_score", *p, UNIT)?;
        }

        let expected = expected_check_ins.max(1) as f64;
        let check_in_frequency = (check_ins.len() as f64 / expected).min(1.0);

        let latest_check_in_risk = check_ins
            .iter()
            .filter(|ci| ci.risk_contribution.is_some())
            .max_by_key(|ci| ci.week)
            .and_then(|ci| ci.risk_contribution);

        let qualitative_concerns = check_ins
            .iter()
            .filter(|ci| ci.risk_contribution.is_some())
            .max_by_key(|ci| ci.week)
            .map(|ci| ci.concerns.clone())
            .unwrap_or_default();

        let risk_increasing = is_rising(prior_scores);

        Ok(Self {
            check_in_frequency,
            latest_check_in_risk,
            avg_sentiment: mean(check_ins.iter().filter_map(|ci| ci.sentiment_score)),
            avg_energy: mean(
                check_ins
                    .iter()
                    .filter_map(|ci| ci.energy_level.map(f64::from)),
            ),
            milestone_avg: mean(milestone_scores.iter().copied()),
            milestone_count: milestone_scores.len(),
            collaboration_issues: rate(
                check_ins.iter().filter_map(|ci| ci.collaboration_struggling),
            ),
            below_expectations_rate: rate(check_ins.iter().filter_map(|ci| ci.below_expectations)),
            warnings_count,
            qualitative_concerns,
            prior_scores: prior_scores.to_vec(),
            risk_increasing,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RiskAssessmentResult {
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    pub recommended_action: RecommendedAction,
    pub contributing_factors: BTreeMap<String, f64>,
    pub concerns: BTreeMap<String, String>,
    pub signals: RiskSignals,
}

pub fn assess_risk(signals: RiskSignals) -> Result<RiskAssessmentResult, InvalidScoreError> {
    let frequency_risk = if signals.check_in_frequency < 1.0 / 3.0 {
        0.8
    } else if signals.check_in_frequency < 2.0 / 3.0 {
        0.4
    } else {
        0.0
    };

    let mut parts: Vec<(&str, f64, f64)> =
        vec![("check_in_frequency", frequency_risk, W_FREQUENCY)];
    if let Some(r) = signals.latest_check_in_risk {
        parts.push(("check_in_risk", r, W_CHECK_IN_RISK));
    }
    if let Some(s) = signals.avg_sentiment {
        parts.push(("sentiment", 1.0 - (s + 1.0) / 2.0, W_SENTIMENT));
    }
    if let Some(e) = signals.avg_energy {
        parts.push(("energy", 1.0 - e / 10.0, W_ENERGY));
    }
    if let Some(m) = signals.milestone_avg {
        parts.push(("milestones", 1.0 - m / 4.0, W_MILESTONES));
    }
    parts.push((
        "collaboration",
        signals.collaboration_issues,
        W_COLLABORATION,
    ));
    parts.push((
        "below_expectations",
        signals.below_expectations_rate,
        W_BELOW_EXPECTATIONS,
    ));
    parts.push((
        "warnings",
        (signals.warnings_count as f64 / WARNING_SATURATION).min(1.0),
        W_WARNINGS,
    ));
    parts.push((
        "qualitative_concerns",
        (signals.qualitative_concerns.len() as f64 / CONCERN_SATURATION).min(1.0),
        W_CONCERNS,
    ));

    let weight_total: f64 = parts.iter().map(|(_, _, w)| w).sum();
    let mut contributing_factors = BTreeMap::new();
    let mut score = 0.0;
    for (name, risk, weight) in &parts {
        let share = risk * weight / weight_total;
        score += share;
        contributing_factors.insert(name.to_string(), round2(share));
    }

    if signals.risk_increasing {
        score = (score * TREND_AMPLIFIER).min(1.0);
    }
    let risk_score = round2(score);
    let risk_level = RiskLevel::from_score(risk_score)?;

    Ok(RiskAssessmentResult {
        risk_score,
        risk_level,
        recommended_action: RecommendedAction::for_level(risk_level),
        contributing_factors,
        concerns: identify_concerns(&signals),
        signals,
    })
}

fn identify_concerns(s: &RiskSignals) -> BTreeMap<String, String> {
    let mut concerns = BTreeMap::new();
    if s.check_in_frequency < 2.0 / 3.0 {
        concerns.insert(
            "check_in_compliance".to_string(),
            format!("Low check-in rate: {:.0}%", s.check_in_frequency * 100.0),
        );
    }
    if let Some(sentiment) = s.avg_sentiment.filter(|v| *v < -0.3) {
        concerns.insert(
            "low_morale".to_string(),
            format!("Negative sentiment: {sentiment:.2}"),
        );
    }
    if let Some(energy) = s.avg_energy.filter(|v| *v < 4.0) {
        concerns.insert(
            "low_energy".to_string(),
            format!("Low energy levels: {energy:.1}/10"),
        );
    }
    if s.collaboration_issues > 0.3 {
        concerns.insert(
            "collaboration".to_string(),
            "Struggling with team collaboration".to_string(),
        );
    }
    if let Some(m) = s.milestone_avg.filter(|v| *v < 2.5) {
        concerns.insert(
            "performance".to_string(),
            format!("Below target milestone performance: {m:.2}/4"),
        );
    }
    if s.warnings_count > 0 {
        concerns.insert(
            "warnings".to_string(),
            format!("{} warning(s) issued", s.warnings_count),
        );
    }
    if !s.qualitative_concerns.is_empty() {
        concerns.insert("check_in".to_string(), s.qualitative_concerns.join("; "));
    }
    if s.risk_increasing {
        concerns.insert("trend".to_string(), "Risk score is increasing".to_string());
    }
    concerns
}

fn is_rising(prior_most_recent_first: &[f64]) -> bool {
    match prior_most_recent_first.split_first() {
        Some((latest, earlier)) if !earlier.is_empty() => {
            let earlier_mean = earlier.iter().sum::<f64>() / earlier.len() as f64;
            *latest > earlier_mean * TREND_FACTOR
        }
        _ => false,
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

fn rate(flags: impl Iterator<Item = bool>) -> f64 {
    let (hits, n) = flags.fold((0usize, 0usize), |(h, n), f| (h + f as usize, n + 1));
    if n == 0 {
        0.0
    } else {
        hits as f64 / n as f64
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
