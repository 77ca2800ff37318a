use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::fellow::FellowRow;
use crate::state::AppState;
use crate::store::NewFellow;
use crate::workflow::{ApplicantStatus, FellowEvent, FellowStanding, FellowStatus, Transition};

#[derive(Debug, Deserialize)]
pub struct EnrolmentRequest {
    pub applicant_id: Uuid,
}

/// Enrols an accepted applicant as an `onboarded` fellow, carrying over the
/// application details and the microship score.
pub async fn create_fellow(state: &AppState, applicant_id: Uuid) -> Result<FellowRow, AppError> {
    let applicant = state.store.get_applicant(applicant_id).await?;
    let status: ApplicantStatus = applicant.status.parse()?;
    if status != ApplicantStatus::Accepted {
        return Err(AppError::Conflict(format!(
            "applicant {applicant_id} is {status}; only accepted applicants become fellows"
        )));
    }

    let microship_score = state
        .store
        .list_submissions(Some(applicant_id))
        .await?
        .into_iter()
        .find_map(|s| s.weighted_score);

    let row = state
        .store
        .create_fellow(NewFellow {
            applicant_id,
            cohort_id: applicant.cohort_id,
            name: applicant.name,
            role: applicant.role,
            microship_score,
            portfolio_url: applicant.portfolio_url,
            github_url: applicant.github_url,
        })
        .await?;

    info!(fellow_id = %row.id, %applicant_id, cohort_id = %row.cohort_id, "fellow enrolled");
    Ok(row)
}

pub async fn get_fellow(state: &AppState, id: Uuid) -> Result<FellowRow, AppError> {
    Ok(state.store.get_fellow(id).await?)
}

#[derive(Debug, Default, Deserialize)]
pub struct FellowFilter {
    pub cohort_id: Option<Uuid>,
    pub status: Option<FellowStatus>,
}

pub async fn list_fellows(
    state: &AppState,
    filter: FellowFilter,
) -> Result<Vec<FellowRow>, AppError> {
    let mut rows = state.store.list_fellows(filter.cohort_id).await?;
    if let Some(status) = filter.status {
        rows.retain(|f| f.status == status.as_str());
    }
    Ok(rows)
}

/// Lifecycle decisions a coordinator can take. Warnings have their own path.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusAction {
    Activate,
    Remove,
    Complete,
    Place,
}

impl From<StatusAction> for FellowEvent {
    fn from(action: StatusAction) -> Self {
        match action {
            StatusAction::Activate => FellowEvent::Activate,
            StatusAction::Remove => FellowEvent::Remove,
            StatusAction::Complete => FellowEvent::Complete,
            StatusAction::Place => FellowEvent::Place,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusChangeRequest {
    pub action: StatusAction,
}

pub async fn change_status(
    state: &AppState,
    fellow_id: Uuid,
    action: StatusAction,
) -> Result<FellowRow, AppError> {
    let fellow = state.store.get_fellow(fellow_id).await?;
    let current = FellowStanding {
        status: fellow.status.parse()?,
        warnings_count: fellow.warnings_count,
    };
    let next = current.transition(&action.into())?;

    let row = state
        .store
        .set_fellow_status(fellow_id, current.status, next.status)
        .await?;

    info!(%fellow_id, from = %current.status, to = %next.status, "fellow status changed");
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{applicant_row, fellow_row, submission_row, TestContext};

    #[tokio::test]
    async fn test_removal_after_second_warning() {
        let ctx = TestContext::new();
        let fellow = ctx
            .store
            .seed_fellow(fellow_row(Uuid::new_v4(), "Ada"), FellowStatus::WarnedTwice);

        let row = change_status(&ctx.state(), fellow.id, StatusAction::Remove)
            .await
            .unwrap();
        assert_eq!(row.status, "removed");

        let again = change_status(&ctx.state(), fellow.id, StatusAction::Activate).await;
        assert!(matches!(again, Err(AppError::InvalidTransition(_))));
        assert_eq!(ctx.store.fellow(fellow.id).status, "removed");
    }

    #[tokio::test]
    async fn test_onboarded_cannot_complete() {
        let ctx = TestContext::new();
        let fellow = ctx
            .store
            .seed_fellow(fellow_row(Uuid::new_v4(), "Bo"), FellowStatus::Onboarded);

        assert!(matches!(
            change_status(&ctx.state(), fellow.id, StatusAction::Complete).await,
            Err(AppError::InvalidTransition(_))
        ));
        let row = change_status(&ctx.state(), fellow.id, StatusAction::Activate)
            .await
            .unwrap();
        assert_eq!(row.status, "active");
    }

    #[test]
    fn test_action_labels() {
        let req: StatusChangeRequest = serde_json::from_str(r#"{"action":"place"}"#).unwrap();
        assert!(matches!(req.action, StatusAction::Place));
        assert!(
            serde_json::from_str::<StatusChangeRequest>(r#"{"action":"warn"}"#).is_err()
        );
    }

    #[tokio::test]
    async fn test_accepted_applicant_is_enrolled_once() {
        let ctx = TestContext::new();
        let applicant = ctx.store.seed_applicant(applicant_row(ApplicantStatus::Accepted));
        let mut submission = submission_row(applicant.id);
        submission.weighted_score = Some(3.55);
        ctx.store.seed_submission(submission);

        let fellow = create_fellow(&ctx.state(), applicant.id).await.unwrap();

        assert_eq!(fellow.status, "onboarded");
        assert_eq!(fellow.name, applicant.name);
        assert_eq!(fellow.cohort_id, applicant.cohort_id);
        assert_eq!(fellow.microship_score, Some(3.55));
        assert_eq!(fellow.warnings_count, 0);
        assert_eq!(
            get_fellow(&ctx.state(), fellow.id).await.unwrap().id,
            fellow.id
        );

        let again = create_fellow(&ctx.state(), applicant.id).await;
        assert!(matches!(again, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_undecided_applicant_cannot_be_enrolled() {
        let ctx = TestContext::new();
        let applicant = ctx
            .store
            .seed_applicant(applicant_row(ApplicantStatus::MicroshipCompleted));

        let err = create_fellow(&ctx.state(), applicant.id).await.unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_list_fellows_by_cohort_and_status() {
        let ctx = TestContext::new();
        let cohort = Uuid::new_v4();
        ctx.store.seed_fellow(fellow_row(cohort, "Bo"), FellowStatus::Active);
        ctx.store.seed_fellow(fellow_row(cohort, "Ada"), FellowStatus::WarnedOnce);
        ctx.store.seed_fellow(fellow_row(Uuid::new_v4(), "Cy"), FellowStatus::Active);

        let all = list_fellows(
            &ctx.state(),
            FellowFilter {
                cohort_id: Some(cohort),
                status: None,
            },
        )
        .await
        .unwrap();
        let names: Vec<&str> = all.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Ada", "Bo"]);

        let active = list_fellows(
            &ctx.state(),
            FellowFilter {
                cohort_id: None,
                status: Some(FellowStatus::Active),
            },
        )
        .await
        .unwrap();
        assert_eq!(active.len(), 2);
    }
}
