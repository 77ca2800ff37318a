//! Evaluation Adapter: the boundary to the external reasoning service.
//!
//! `AppState` holds an `Arc<dyn Evaluator>`. `LlmEvaluator` is the production
//! backend; tests use a scripted one. Implementations return typed judgements
//! (missing required fields are a malformed payload); range checks happen in
//! `judgement`, so a bad score surfaces as `InvalidScoreError`, not as an
//! adapter failure.

pub mod judgement;
pub mod llm;
pub mod payload;
pub mod prompts;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::llm_client::LlmError;

pub use judgement::{
    ApplicationScreening, CheckInAnalysis, CheckInJudgement, MatchJudgement, MicroshipEvaluation,
    MicroshipJudgement, ProfileDraft, ScreeningEvaluation, WarningDraft,
};
pub use llm::LlmEvaluator;
pub use payload::{
    ApplicationPayload, CheckInPayload, MatchPayload, MicroshipPayload, ProfilePayload,
    WarningPayload,
};

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AdapterError {
    #[error("evaluation timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("evaluation service unreachable: {message}")]
    Transport { message: String },

    #[error("evaluation service returned {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("malformed evaluation payload: {message}")]
    Malformed { message: String },
}

impl AdapterError {
    pub fn malformed(message: impl Into<String>) -> Self {
        AdapterError::Malformed {
            message: message.into(),
        }
    }

    /// Whether the same request may succeed later. Nothing in this service
    /// retries on its own; the flag is reported to the caller.
    pub fn retryable(&self) -> bool {
        match self {
            AdapterError::Timeout { .. } | AdapterError::Transport { .. } => true,
            AdapterError::Upstream { status, .. } => *status == 429 || *status >= 500,
            AdapterError::Malformed { .. } => false,
        }
    }
}

impl From<LlmError> for AdapterError {
    fn from(e: LlmError) -> Self {
        match e {
            LlmError::Timeout(d) => AdapterError::Timeout {
                secs: d.as_secs(),
            },
            LlmError::Http(e) => AdapterError::Transport {
                message: e.to_string(),
            },
            LlmError::Api { status, message } => AdapterError::Upstream { status, message },
            LlmError::Parse(e) => AdapterError::malformed(e.to_string()),
            LlmError::EmptyContent => AdapterError::malformed("empty response"),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// One request/response per call, bounded by the backend's timeout. A failure
/// means nothing was produced; callers must not persist partial results.
#[async_trait]
pub trait Evaluator: Send + Sync {
    /// Recorded as `model_used` on stored evaluations.
    fn model_name(&self) -> &str;

    async fn screen_application(
        &self,
        payload: &ApplicationPayload,
    ) -> Result<ApplicationScreening, AdapterError>;

    async fn evaluate_microship(
        &self,
        payload: &MicroshipPayload,
    ) -> Result<MicroshipJudgement, AdapterError>;

    async fn analyze_check_in(
        &self,
        payload: &CheckInPayload,
    ) -> Result<CheckInJudgement, AdapterError>;

    async fn generate_profile(&self, payload: &ProfilePayload)
        -> Result<ProfileDraft, AdapterError>;

    async fn match_opportunities(
        &self,
        payload: &MatchPayload,
    ) -> Result<Vec<MatchJudgement>, AdapterError>;

    async fn draft_warning(&self, payload: &WarningPayload) -> Result<WarningDraft, AdapterError>;
}
