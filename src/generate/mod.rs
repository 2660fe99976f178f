//! Generation client: turns (household size, dish description, language)
//! into a validated [`Plan`] by calling a generative text service under a
//! fixed output schema.
//!
//! Failures reach the caller only as a [`GenerationErrorKind`] and a short
//! message; provider detail is logged here and not forwarded. Nothing is
//! retried.

pub mod language;
pub mod prompt;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::Instrument;

use crate::llm::openai::{LlmClient, OpenAiClient, OpenAiClientConfig, OpenAiError};
use crate::plan::Plan;
use crate::telemetry;
use crate::telemetry::ops::generate::Phase as GeneratePhase;

pub use language::Language;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationErrorKind {
    Configuration,
    Service,
    Validation,
    InvalidRequest,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// Credential or endpoint unavailable; the service was not called.
    #[error("generation service is not configured: {0}")]
    Configuration(String),
    /// Transport failure, timeout, error status or missing payload.
    #[error("generation service failed: {0}")]
    Service(String),
    /// The payload cannot be trusted as a plan.
    #[error("generated plan is malformed: {0}")]
    Validation(String),
    #[error("invalid plan request: {0}")]
    InvalidRequest(String),
}

impl GenerationError {
    pub fn kind(&self) -> GenerationErrorKind {
        match self {
            GenerationError::Configuration(_) => GenerationErrorKind::Configuration,
            GenerationError::Service(_) => GenerationErrorKind::Service,
            GenerationError::Validation(_) => GenerationErrorKind::Validation,
            GenerationError::InvalidRequest(_) => GenerationErrorKind::InvalidRequest,
        }
    }

    fn from_client(err: &OpenAiError) -> Self {
        if err.is_configuration() {
            GenerationError::Configuration(err.to_string())
        } else {
            match err {
                OpenAiError::Timeout => GenerationError::Service("request timed out".into()),
                OpenAiError::Api { status, .. } => {
                    GenerationError::Service(format!("service answered {status}"))
                }
                _ => GenerationError::Service("request failed".into()),
            }
        }
    }
}

/// Check caller-supplied inputs before anything leaves the process.
pub fn check_request(household_size: u32, dish_description: &str) -> Result<(), GenerationError> {
    if household_size == 0 {
        return Err(GenerationError::InvalidRequest(
            "household size must be at least 1".into(),
        ));
    }
    if dish_description.trim().is_empty() {
        return Err(GenerationError::InvalidRequest(
            "dish description is empty".into(),
        ));
    }
    Ok(())
}

/// Produces plans. Implementations are not required to be deterministic.
#[async_trait]
pub trait PlanGenerator: Send + Sync {
    async fn generate(
        &self,
        household_size: u32,
        dish_description: &str,
        language: Language,
    ) -> Result<Plan, GenerationError>;
}

/// Generator backed by an OpenAI-compatible chat completions endpoint.
pub struct LlmPlanGenerator<C = OpenAiClient> {
    client: C,
    model: Option<String>,
}

impl LlmPlanGenerator<OpenAiClient> {
    pub fn from_env() -> Result<Self, GenerationError> {
        let cfg = OpenAiClientConfig::from_env();
        let model = cfg.default_model.clone();
        let client = OpenAiClient::new(cfg)
            .map_err(|e| GenerationError::Configuration(e.to_string()))?;
        Ok(Self::new(client).with_model(model))
    }
}

impl<C: LlmClient> LlmPlanGenerator<C> {
    pub fn new(client: C) -> Self {
        Self { client, model: None }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// Parse and validate the raw structured payload.
pub fn parse_plan(payload: &str, household_size: u32) -> Result<Plan, GenerationError> {
    let plan: Plan = serde_json::from_str(payload)
        .map_err(|e| GenerationError::Validation(format!("payload does not match schema: {e}")))?;
    plan.validate()
        .map_err(|e| GenerationError::Validation(e.to_string()))?;
    if plan.portion_size != household_size {
        return Err(GenerationError::Validation(format!(
            "portion size {} does not match requested household size {household_size}",
            plan.portion_size
        )));
    }
    Ok(plan)
}

#[async_trait]
impl<C: LlmClient> PlanGenerator for LlmPlanGenerator<C> {
    async fn generate(
        &self,
        household_size: u32,
        dish_description: &str,
        language: Language,
    ) -> Result<Plan, GenerationError> {
        let log = telemetry::generate();
        let root = log.root_span_kv([
            ("household_size", household_size.to_string()),
            ("language", language.to_string()),
            ("model", format!("{:?}", self.model)),
        ]);
        self.run(household_size, dish_description, language)
            .instrument(root)
            .await
    }
}

impl<C: LlmClient> LlmPlanGenerator<C> {
    async fn run(
        &self,
        household_size: u32,
        dish_description: &str,
        language: Language,
    ) -> Result<Plan, GenerationError> {
        let log = telemetry::generate();
        check_request(household_size, dish_description)?;

        let request = {
            let _s = log.span(&GeneratePhase::Prepare).entered();
            prompt::build_request(household_size, dish_description, language, self.model.as_deref())
        };

        let call = self
            .client
            .chat_completion(request)
            .instrument(log.span(&GeneratePhase::CallLlm));
        let response = match call.await {
            Ok(resp) => resp,
            Err(err) => {
                log.error_kv(
                    "generation call failed",
                    [("error", err.to_string()), ("debug", format!("{err:?}"))],
                );
                return Err(GenerationError::from_client(&err));
            }
        };

        if let Some(usage) = &response.usage {
            log.debug_kv(
                "token usage",
                [
                    ("prompt", format!("{:?}", usage.prompt_tokens)),
                    ("completion", format!("{:?}", usage.completion_tokens)),
                    ("total", format!("{:?}", usage.total_tokens)),
                ],
            );
        }

        let Some(payload) = response.content else {
            log.error_kv(
                "generation returned no payload",
                [("refusal", format!("{:?}", response.refusal))],
            );
            return Err(GenerationError::Service("no payload returned".into()));
        };

        let _s = log.span(&GeneratePhase::Validate).entered();
        match parse_plan(&payload, household_size) {
            Ok(plan) => {
                log.info_kv(
                    "plan generated",
                    [
                        ("dishes", plan.dishes.len().to_string()),
                        ("common", plan.common_ingredients.len().to_string()),
                    ],
                );
                Ok(plan)
            }
            Err(err) => {
                log.error_kv(
                    "generated payload rejected",
                    [("error", err.to_string()), ("payload", payload)],
                );
                Err(err)
            }
        }
    }
}
