use std::collections::BTreeMap;

use serde::Serialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::workflow::ApplicantStatus;

#[derive(Debug, Serialize)]
pub struct ConversionFunnel {
    pub cohort_id: Option<Uuid>,
    pub total_applicants: usize,
    /// Every status is present, zero or not.
    pub by_status: BTreeMap<ApplicantStatus, usize>,
    /// Applicants that got past screening, whatever happened after.
    pub invited_to_microship: usize,
    pub accepted: usize,
    pub enrolled_fellows: usize,
    /// Accepted as a percentage of all applicants, two decimals. Zero when
    /// there are no applicants.
    pub conversion_rate: f64,
}

fn rate(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    (part as f64 / whole as f64 * 10_000.0).round() / 100.0
}

pub async fn conversion_funnel(
    state: &AppState,
    cohort_id: Option<Uuid>,
) -> Result<ConversionFunnel, AppError> {
    if let Some(id) = cohort_id {
        state.store.get_cohort(id).await?;
    }
    let applicants = state.store.list_applicants(cohort_id).await?;
    let fellows = state.store.list_fellows(cohort_id).await?;

    let mut by_status: BTreeMap<ApplicantStatus, usize> =
        ApplicantStatus::ALL.iter().map(|s| (*s, 0)).collect();
    for applicant in &applicants {
        let status: ApplicantStatus = applicant.status.parse()?;
        *by_status.entry(status).or_default() += 1;
    }

    let accepted = by_status[&ApplicantStatus::Accepted];
    let invited_to_microship = by_status[&ApplicantStatus::MicroshipPending]
        + by_status[&ApplicantStatus::MicroshipCompleted]
        + accepted;

    Ok(ConversionFunnel {
        cohort_id,
        total_applicants: applicants.len(),
        by_status,
        invited_to_microship,
        accepted,
        enrolled_fellows: fellows.len(),
        conversion_rate: rate(accepted, applicants.len()),
    })
}
