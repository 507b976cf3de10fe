//! Stage interface
//!
//! Each role is a separate capability trait taking a role-specific input
//! struct. The input struct carries exactly the bundle fields the role is
//! allowed to read, so a stage cannot observe anything outside its read set.
//! Outputs are plain text (plus the revision verdict for reviews); the
//! orchestrator writes them back into the bundle.
//!
//! Stages own their retry policy. The orchestrator calls each stage once per
//! slot and treats an error or an empty output as fatal to the run.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::domain::{HistoryEntry, Role};
use crate::orchestrator::ConfigurationError;

pub mod llm;

pub use llm::{LlmStage, llm_stages};

/// Errors a stage reports when it cannot produce output
#[derive(Debug, Error)]
pub enum StageError {
    #[error("generation failed: {0}")]
    Generation(String),

    #[error("stage produced no output")]
    EmptyOutput,

    #[error("prompt rendering failed: {0}")]
    Prompt(String),
}

/// Input of the Plan stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanInput {
    pub requirement: String,
}

/// Previous cycle's code and the review that rejected it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Revision {
    pub previous_code: String,
    pub review: String,
}

/// Input of the Code stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeInput {
    pub plan: String,

    /// Present on revision passes only
    pub revision: Option<Revision>,

    /// Plan, code and review entries of the history log, oldest first
    pub history: Vec<HistoryEntry>,
}

impl CodeInput {
    pub fn is_revision(&self) -> bool {
        self.revision.is_some()
    }
}

/// Input of the Test stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestInput {
    pub plan: String,
    pub code: String,
}

/// Input of the Review stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewInput {
    pub plan: String,
    pub code: String,
    pub tests: String,
}

/// Output of the Review stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewOutcome {
    pub content: String,
    pub needs_revision: bool,
}

impl ReviewOutcome {
    pub fn approved(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            needs_revision: false,
        }
    }

    pub fn needs_revision(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            needs_revision: true,
        }
    }

    /// Derive the verdict from review text whose first line is either
    /// `APPROVED` or `NEEDS_REVISION`. Anything that does not ask for a
    /// revision counts as approval.
    pub fn from_verdict_text(content: impl Into<String>) -> Self {
        let content = content.into();
        let headline = content
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or_default()
            .trim_start_matches(['*', '#', '-', ' '])
            .to_uppercase();
        let needs_revision = headline.starts_with("NEEDS_REVISION") || headline.starts_with("NEEDS REVISION");
        debug!(%needs_revision, "ReviewOutcome::from_verdict_text: parsed verdict");
        Self {
            content,
            needs_revision,
        }
    }
}

#[async_trait]
pub trait PlanStage: Send + Sync {
    async fn plan(&self, input: PlanInput) -> Result<String, StageError>;
}

#[async_trait]
pub trait CodeStage: Send + Sync {
    async fn code(&self, input: CodeInput) -> Result<String, StageError>;
}

#[async_trait]
pub trait TestStage: Send + Sync {
    async fn test(&self, input: TestInput) -> Result<String, StageError>;
}

#[async_trait]
pub trait ReviewStage: Send + Sync {
    async fn review(&self, input: ReviewInput) -> Result<ReviewOutcome, StageError>;
}

/// The four stage implementations a run needs
#[derive(Clone)]
pub struct Stages {
    pub(crate) plan: Arc<dyn PlanStage>,
    pub(crate) code: Arc<dyn CodeStage>,
    pub(crate) test: Arc<dyn TestStage>,
    pub(crate) review: Arc<dyn ReviewStage>,
}

impl Stages {
    pub fn new(
        plan: Arc<dyn PlanStage>,
        code: Arc<dyn CodeStage>,
        test: Arc<dyn TestStage>,
        review: Arc<dyn ReviewStage>,
    ) -> Self {
        Self {
            plan,
            code,
            test,
            review,
        }
    }

    pub fn builder() -> StagesBuilder {
        StagesBuilder::default()
    }
}

/// Collects stage implementations one at a time
#[derive(Default)]
pub struct StagesBuilder {
    plan: Option<Arc<dyn PlanStage>>,
    code: Option<Arc<dyn CodeStage>>,
    test: Option<Arc<dyn TestStage>>,
    review: Option<Arc<dyn ReviewStage>>,
}

impl StagesBuilder {
    pub fn plan(mut self, stage: Arc<dyn PlanStage>) -> Self {
        self.plan = Some(stage);
        self
    }

    pub fn code(mut self, stage: Arc<dyn CodeStage>) -> Self {
        self.code = Some(stage);
        self
    }

    pub fn test(mut self, stage: Arc<dyn TestStage>) -> Self {
        self.test = Some(stage);
        self
    }

    pub fn review(mut self, stage: Arc<dyn ReviewStage>) -> Self {
        self.review = Some(stage);
        self
    }

    /// Fails with the first role that has no implementation
    pub fn build(self) -> Result<Stages, ConfigurationError> {
        debug!(
            plan = self.plan.is_some(),
            code = self.code.is_some(),
            test = self.test.is_some(),
            review = self.review.is_some(),
            "StagesBuilder::build: called"
        );
        Ok(Stages {
            plan: self.plan.ok_or(ConfigurationError::MissingStage(Role::Plan))?,
            code: self.code.ok_or(ConfigurationError::MissingStage(Role::Code))?,
            test: self.test.ok_or(ConfigurationError::MissingStage(Role::Test))?,
            review: self.review.ok_or(ConfigurationError::MissingStage(Role::Review))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl PlanStage for Echo {
        async fn plan(&self, input: PlanInput) -> Result<String, StageError> {
            Ok(input.requirement)
        }
    }

    #[async_trait]
    impl CodeStage for Echo {
        async fn code(&self, input: CodeInput) -> Result<String, StageError> {
            Ok(input.plan)
        }
    }

    #[test]
    fn test_verdict_needs_revision() {
        let outcome = ReviewOutcome::from_verdict_text("NEEDS_REVISION\n- missing input validation");
        assert!(outcome.needs_revision);
        assert!(outcome.content.contains("missing input validation"));
    }

    #[test]
    fn test_verdict_tolerates_case_and_markdown() {
        assert!(ReviewOutcome::from_verdict_text("\n  **needs revision**\nfix it").needs_revision);
        assert!(ReviewOutcome::from_verdict_text("## Needs_Revision").needs_revision);
    }

    #[test]
    fn test_verdict_approved() {
        assert!(!ReviewOutcome::from_verdict_text("APPROVED\nClean code").needs_revision);
        assert!(!ReviewOutcome::from_verdict_text("Overall this looks fine").needs_revision);
        assert!(!ReviewOutcome::from_verdict_text("").needs_revision);
    }

    #[test]
    fn test_builder_reports_missing_stage() {
        let echo = Arc::new(Echo);
        let result = Stages::builder().plan(echo.clone()).code(echo).build();
        match result {
            Err(ConfigurationError::MissingStage(role)) => assert_eq!(role, Role::Test),
            _ => panic!("Expected MissingStage"),
        }
    }

    #[test]
    fn test_builder_requires_plan_first() {
        let result = Stages::builder().build();
        assert!(matches!(result, Err(ConfigurationError::MissingStage(Role::Plan))));
    }
}
