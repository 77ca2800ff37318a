//! Production `Evaluator` backed by the Anthropic Messages API.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, warn};

use super::judgement::{
    ApplicationScreening, CheckInJudgement, MatchJudgement, MicroshipJudgement, ProfileDraft,
    WarningDraft,
};
use super::payload::{
    ApplicationPayload, CheckInPayload, MatchPayload, MicroshipPayload, ProfilePayload,
    WarningPayload,
};
use super::{prompts, AdapterError, Evaluator};
use crate::llm_client::{LlmClient, MODEL};

pub struct LlmEvaluator {
    llm: LlmClient,
}

impl LlmEvaluator {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }

    async fn ask<T: serde::de::DeserializeOwned>(
        &self,
        action: &'static str,
        prompt: String,
        system: &str,
    ) -> Result<T, AdapterError> {
        let system = prompts::with_json_only(system);
        match self.llm.call_json::<T>(&prompt, &system).await {
            Ok(value) => {
                info!(action, "evaluation completed");
                Ok(value)
            }
            Err(e) => {
                let err = AdapterError::from(e);
                warn!(action, retryable = err.retryable(), error = %err, "evaluation failed");
                Err(err)
            }
        }
    }
}

#[derive(Deserialize)]
struct MatchEnvelope {
    matches: Vec<MatchJudgement>,
}

#[async_trait]
impl Evaluator for LlmEvaluator {
    fn model_name(&self) -> &str {
        MODEL
    }

    async fn screen_application(
        &self,
        payload: &ApplicationPayload,
    ) -> Result<ApplicationScreening, AdapterError> {
        self.ask(
            "application_screening",
            prompts::screening_prompt(payload),
            prompts::SCREENING_SYSTEM,
        )
        .await
    }

    async fn evaluate_microship(
        &self,
        payload: &MicroshipPayload,
    ) -> Result<MicroshipJudgement, AdapterError> {
        self.ask(
            "microship_evaluation",
            prompts::microship_prompt(payload),
            prompts::MICROSHIP_SYSTEM,
        )
        .await
    }

    async fn analyze_check_in(
        &self,
        payload: &CheckInPayload,
    ) -> Result<CheckInJudgement, AdapterError> {
        self.ask(
            "check_in_analysis",
            prompts::check_in_prompt(payload),
            prompts::CHECK_IN_SYSTEM,
        )
        .await
    }

    async fn generate_profile(
        &self,
        payload: &ProfilePayload,
    ) -> Result<ProfileDraft, AdapterError> {
        self.ask(
            "profile_generation",
            prompts::profile_prompt(payload),
            prompts::PROFILE_SYSTEM,
        )
        .await
    }

    async fn match_opportunities(
        &self,
        payload: &MatchPayload,
    ) -> Result<Vec<MatchJudgement>, AdapterError> {
        let envelope: MatchEnvelope = self
            .ask(
                "job_matching",
                prompts::matching_prompt(payload),
                prompts::MATCHING_SYSTEM,
            )
            .await?;
        Ok(envelope.matches)
    }

    async fn draft_warning(&self, payload: &WarningPayload) -> Result<WarningDraft, AdapterError> {
        self.ask(
            "warning_draft",
            prompts::warning_prompt(payload),
            prompts::warning_system(payload.warning_number),
        )
        .await
    }
}
