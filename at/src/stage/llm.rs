//! LLM-backed stages
//!
//! One [`LlmStage`] per role: it renders the role's prompt from its input,
//! makes a single completion call and returns the text. Retries on transient
//! transport errors happen inside the client.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use super::{
    CodeInput, CodeStage, PlanInput, PlanStage, ReviewInput, ReviewOutcome, ReviewStage, StageError, Stages,
    TestInput, TestStage,
};
use crate::config::Config;
use crate::domain::Role;
use crate::llm::{CompletionRequest, LlmClient, LlmError};
use crate::prompts::{PromptContext, PromptLoader};

impl From<LlmError> for StageError {
    fn from(err: LlmError) -> Self {
        StageError::Generation(err.to_string())
    }
}

/// A role played by a language model
pub struct LlmStage {
    role: Role,
    client: Arc<dyn LlmClient>,
    prompts: Arc<PromptLoader>,
    temperature: f32,
    model: Option<String>,
    max_tokens: u32,
    history_window: usize,
}

impl LlmStage {
    pub fn new(role: Role, client: Arc<dyn LlmClient>, prompts: Arc<PromptLoader>) -> Self {
        debug!(%role, "LlmStage::new: called");
        Self {
            role,
            client,
            prompts,
            temperature: 0.5,
            model: None,
            max_tokens: 4096,
            history_window: 6,
        }
    }

    /// Stage configured from the role's section of the config
    pub fn from_config(role: Role, config: &Config, client: Arc<dyn LlmClient>, prompts: Arc<PromptLoader>) -> Self {
        Self {
            temperature: config.roles.temperature(role),
            model: config.roles.get(role).model.clone(),
            max_tokens: config.llm.max_tokens,
            history_window: config.team.history_window,
            ..Self::new(role, client, prompts)
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Render the prompt, call the model and return non-empty text
    async fn generate(&self, context: &PromptContext) -> Result<String, StageError> {
        debug!(role = %self.role, "LlmStage::generate: called");
        let system = self
            .prompts
            .system_prompt(self.role)
            .map_err(|e| StageError::Prompt(e.to_string()))?;
        let user = self
            .prompts
            .render_role(self.role, context)
            .map_err(|e| StageError::Prompt(e.to_string()))?;

        let request = CompletionRequest::new(system, user, self.max_tokens)
            .with_temperature(self.temperature)
            .with_model(self.model.clone());

        let response = self.client.complete(request).await?;
        let text = response.content.unwrap_or_default();
        if text.trim().is_empty() {
            debug!(role = %self.role, "LlmStage::generate: empty completion");
            return Err(StageError::EmptyOutput);
        }

        info!(
            role = %self.role,
            chars = text.len(),
            output_tokens = response.usage.output_tokens,
            "Agent output received"
        );
        Ok(text)
    }
}

#[async_trait]
impl PlanStage for LlmStage {
    async fn plan(&self, input: PlanInput) -> Result<String, StageError> {
        self.generate(&PromptContext::for_plan(&input)).await
    }
}

#[async_trait]
impl CodeStage for LlmStage {
    async fn code(&self, input: CodeInput) -> Result<String, StageError> {
        self.generate(&PromptContext::for_code(&input, self.history_window)).await
    }
}

#[async_trait]
impl TestStage for LlmStage {
    async fn test(&self, input: TestInput) -> Result<String, StageError> {
        self.generate(&PromptContext::for_test(&input)).await
    }
}

#[async_trait]
impl ReviewStage for LlmStage {
    async fn review(&self, input: ReviewInput) -> Result<ReviewOutcome, StageError> {
        let text = self.generate(&PromptContext::for_review(&input)).await?;
        Ok(ReviewOutcome::from_verdict_text(text))
    }
}

/// Build the four LLM stages over one shared client
pub fn llm_stages(config: &Config, client: Arc<dyn LlmClient>) -> Stages {
    debug!("llm_stages: called");
    let prompts = Arc::new(PromptLoader::from_dir(config.team.prompts_dir.as_deref()));
    let stage = |role| Arc::new(LlmStage::from_config(role, config, client.clone(), prompts.clone()));
    Stages::new(
        stage(Role::Plan),
        stage(Role::Code),
        stage(Role::Test),
        stage(Role::Review),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RoleConfig;
    use crate::llm::client::mock::MockLlmClient;
    use crate::stage::Revision;

    fn stage(role: Role, client: Arc<MockLlmClient>) -> LlmStage {
        LlmStage::new(role, client, Arc::new(PromptLoader::embedded_only()))
    }

    #[tokio::test]
    async fn test_plan_stage_sends_requirement() {
        let client = Arc::new(MockLlmClient::with_texts(&["1. do it"]));
        let plan = stage(Role::Plan, client.clone())
            .with_temperature(0.7)
            .plan(PlanInput {
                requirement: "palindrome checker".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(plan, "1. do it");
        let request = &client.requests()[0];
        assert_eq!(request.temperature, Some(0.7));
        assert!(request.system_prompt.contains("planning agent"));
        assert!(request.messages[0].content.contains("palindrome checker"));
    }

    #[tokio::test]
    async fn test_code_stage_passes_revision_context() {
        let client = Arc::new(MockLlmClient::with_texts(&["fn v2() {}"]));
        stage(Role::Code, client.clone())
            .code(CodeInput {
                plan: "plan".to_string(),
                revision: Some(Revision {
                    previous_code: "fn v1() {}".to_string(),
                    review: "NEEDS_REVISION\nhandle empty input".to_string(),
                }),
                history: vec![],
            })
            .await
            .unwrap();

        let prompt = &client.requests()[0].messages[0].content;
        assert!(prompt.contains("fn v1() {}"));
        assert!(prompt.contains("handle empty input"));
    }

    #[tokio::test]
    async fn test_review_stage_parses_verdict() {
        let client = Arc::new(MockLlmClient::with_texts(&["NEEDS_REVISION\n- no tests for empty string", "APPROVED"]));
        let reviewer = stage(Role::Review, client);
        let input = ReviewInput {
            plan: "p".to_string(),
            code: "c".to_string(),
            tests: "t".to_string(),
        };

        let first = reviewer.review(input.clone()).await.unwrap();
        assert!(first.needs_revision);
        let second = reviewer.review(input).await.unwrap();
        assert!(!second.needs_revision);
    }

    #[tokio::test]
    async fn test_blank_completion_is_empty_output() {
        let client = Arc::new(MockLlmClient::with_texts(&["  \n "]));
        let err = stage(Role::Test, client)
            .test(TestInput {
                plan: "p".to_string(),
                code: "c".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StageError::EmptyOutput));
    }

    #[tokio::test]
    async fn test_client_error_becomes_generation_error() {
        let client = Arc::new(MockLlmClient::new(vec![]));
        let err = stage(Role::Plan, client)
            .plan(PlanInput {
                requirement: "r".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StageError::Generation(_)));
    }

    #[tokio::test]
    async fn test_from_config_applies_role_settings() {
        let mut config = Config::default();
        config.roles.coder = RoleConfig {
            model: Some("qwen-max".to_string()),
            temperature: None,
        };
        config.llm.max_tokens = 1234;
        let client = Arc::new(MockLlmClient::with_texts(&["code"]));
        let coder = LlmStage::from_config(
            Role::Code,
            &config,
            client.clone(),
            Arc::new(PromptLoader::embedded_only()),
        );
        coder
            .code(CodeInput {
                plan: "p".to_string(),
                revision: None,
                history: vec![],
            })
            .await
            .unwrap();

        let request = &client.requests()[0];
        assert_eq!(request.model.as_deref(), Some("qwen-max"));
        assert_eq!(request.temperature, Some(0.3));
        assert_eq!(request.max_tokens, 1234);
    }
}
