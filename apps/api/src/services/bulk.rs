use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::services::microship::evaluate_submission;
use crate::state::AppState;

pub const MAX_BULK_ITEMS: usize = 100;

#[derive(Debug, Deserialize)]
pub struct BulkRequest {
    pub submission_ids: Vec<Uuid>,
}

/// Per-entity outcome. Exactly one of `result` and `error` is set.
#[derive(Debug, Serialize)]
pub struct BulkItem {
    pub id: Uuid,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

/// Evaluates each submission independently, in order. A failure is recorded
/// against its id and the run continues.
pub async fn bulk_evaluate(
    state: &AppState,
    submission_ids: &[Uuid],
) -> Result<Vec<BulkItem>, AppError> {
    if submission_ids.is_empty() {
        return Err(AppError::Validation(
            "submission_ids must not be empty".into(),
        ));
    }
    if submission_ids.len() > MAX_BULK_ITEMS {
        return Err(AppError::Validation(format!(
            "at most {MAX_BULK_ITEMS} submissions per request"
        )));
    }

    let mut items = Vec::with_capacity(submission_ids.len());
    for &id in submission_ids {
        let item = match evaluate_submission(state, id).await {
            Ok(done) => BulkItem {
                id,
                ok: true,
                result: Some(serde_json::to_value(&done)?),
                error: None,
            },
            Err(e) => {
                warn!(submission_id = %id, code = e.code(), "bulk item failed");
                BulkItem {
                    id,
                    ok: false,
                    result: None,
                    error: Some(e.body()),
                }
            }
        };
        items.push(item);
    }

    let failed = items.iter().filter(|i| !i.ok).count();
    info!(total = items.len(), failed, "bulk microship evaluation finished");
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::AdapterError;
    use crate::testing::{applicant_row, microship_judgement, submission_row, TestContext};
    use crate::workflow::ApplicantStatus;

    #[tokio::test]
    async fn test_one_failure_does_not_abort_the_rest() {
        let ctx = TestContext::new();
        let mut ids = Vec::new();
        for _ in 0..3 {
            let applicant = ctx
                .store
                .seed_applicant(applicant_row(ApplicantStatus::MicroshipPending));
            ids.push(ctx.store.seed_submission(submission_row(applicant.id)).id);
        }
        ctx.evaluator
            .push_microship(Ok(microship_judgement([4.0, 4.0, 3.0, 2.0], 0.9)));
        ctx.evaluator
            .push_microship(Err(AdapterError::Timeout { secs: 5 }));
        ctx.evaluator
            .push_microship(Ok(microship_judgement([3.0, 3.0, 3.0, 3.0], 0.9)));

        let items = bulk_evaluate(&ctx.state(), &ids).await.unwrap();

        assert_eq!(items.len(), 3);
        assert!(items[0].ok);
        assert!(!items[1].ok);
        assert!(items[2].ok);
        let error = items[1].error.as_ref().unwrap();
        assert_eq!(error["code"], "ADAPTER_ERROR");
        assert_eq!(error["retryable"], true);
        assert_eq!(ctx.store.evaluation_count(), 2);
    }

    #[tokio::test]
    async fn test_unknown_id_is_reported_per_item() {
        let ctx = TestContext::new();
        let missing = Uuid::new_v4();

        let items = bulk_evaluate(&ctx.state(), &[missing]).await.unwrap();

        assert_eq!(items[0].id, missing);
        assert_eq!(items[0].error.as_ref().unwrap()["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_request_size_is_bounded() {
        let ctx = TestContext::new();
        assert!(matches!(
            bulk_evaluate(&ctx.state(), &[]).await,
            Err(AppError::Validation(_))
        ));
        let too_many: Vec<Uuid> = (0..=MAX_BULK_ITEMS).map(|_| Uuid::new_v4()).collect();
        assert!(matches!(
            bulk_evaluate(&ctx.state(), &too_many).await,
            Err(AppError::Validation(_))
        ));
    }
}
