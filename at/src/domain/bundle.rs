//! ArtifactBundle - the per-run state threaded through every stage
//!
//! The bundle has a closed field set. Stages never touch it directly: the
//! orchestrator projects it into a role-specific input (see [`crate::stage`])
//! and writes the role's output back through the `record_*` methods, each of
//! which appends to the history log.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Role;
use crate::stage::{CodeInput, PlanInput, ReviewInput, Revision, TestInput};

/// One entry in the append-only history log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Role that produced the content
    pub role: Role,

    /// Cycle the entry belongs to (0 for the plan, 1-based afterwards)
    pub cycle: u32,

    /// Full stage output
    pub content: String,
}

/// Mutable state of a single run
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactBundle {
    requirement: String,
    plan: Option<String>,
    code: Option<String>,
    tests: Option<String>,
    review: Option<String>,
    needs_revision: bool,
    iteration_count: u32,
    history: Vec<HistoryEntry>,
}

impl ArtifactBundle {
    /// Create a bundle holding only the requirement
    pub fn new(requirement: impl Into<String>) -> Self {
        let requirement = requirement.into();
        debug!(requirement_len = requirement.len(), "ArtifactBundle::new: called");
        Self {
            requirement,
            plan: None,
            code: None,
            tests: None,
            review: None,
            needs_revision: false,
            iteration_count: 0,
            history: Vec::new(),
        }
    }

    pub fn requirement(&self) -> &str {
        &self.requirement
    }

    pub fn plan(&self) -> Option<&str> {
        self.plan.as_deref()
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    pub fn tests(&self) -> Option<&str> {
        self.tests.as_deref()
    }

    pub fn review(&self) -> Option<&str> {
        self.review.as_deref()
    }

    /// Verdict of the latest review; `false` until a review has run this cycle
    pub fn needs_revision(&self) -> bool {
        self.needs_revision
    }

    /// Number of completed Code→Test→Review cycles
    pub fn iteration_count(&self) -> u32 {
        self.iteration_count
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Cycle currently in flight (or about to start)
    pub fn current_cycle(&self) -> u32 {
        self.iteration_count + 1
    }

    /// Input for the Plan stage
    pub(crate) fn plan_input(&self) -> PlanInput {
        debug!("ArtifactBundle::plan_input: called");
        PlanInput {
            requirement: self.requirement.clone(),
        }
    }

    /// Input for the Code stage; `None` until the plan exists
    ///
    /// The history carries only plan, code and review entries: test output
    /// is outside the coder's read set.
    pub(crate) fn code_input(&self, revision: Option<Revision>) -> Option<CodeInput> {
        debug!(has_revision = revision.is_some(), "ArtifactBundle::code_input: called");
        let plan = self.plan.clone()?;
        let history = self
            .history
            .iter()
            .filter(|e| matches!(e.role, Role::Plan | Role::Code | Role::Review))
            .cloned()
            .collect();
        Some(CodeInput {
            plan,
            revision,
            history,
        })
    }

    /// Input for the Test stage; `None` unless plan and code exist
    pub(crate) fn test_input(&self) -> Option<TestInput> {
        debug!("ArtifactBundle::test_input: called");
        Some(TestInput {
            plan: self.plan.clone()?,
            code: self.code.clone()?,
        })
    }

    /// Input for the Review stage; `None` unless plan, code and tests exist
    pub(crate) fn review_input(&self) -> Option<ReviewInput> {
        debug!("ArtifactBundle::review_input: called");
        Some(ReviewInput {
            plan: self.plan.clone()?,
            code: self.code.clone()?,
            tests: self.tests.clone()?,
        })
    }

    /// Store the plan. The plan is written once per run.
    pub(crate) fn record_plan(&mut self, content: String) {
        debug!(content_len = content.len(), "ArtifactBundle::record_plan: called");
        debug_assert!(self.plan.is_none(), "plan is written once per run");
        self.push_history(Role::Plan, 0, &content);
        self.plan = Some(content);
    }

    /// Start a new cycle.
    ///
    /// Captures the revision context from the previous cycle (if any), then
    /// clears every field owned by Code, Test and Review so a stage that fails
    /// in this cycle leaves its own field unset.
    pub(crate) fn begin_cycle(&mut self) -> Option<Revision> {
        debug!(cycle = self.current_cycle(), "ArtifactBundle::begin_cycle: called");
        let revision = match (self.code.take(), self.review.take()) {
            (Some(previous_code), Some(review)) if self.iteration_count > 0 => {
                debug!("ArtifactBundle::begin_cycle: revision pass");
                Some(Revision { previous_code, review })
            }
            _ => {
                debug!("ArtifactBundle::begin_cycle: first pass");
                None
            }
        };
        self.tests = None;
        self.needs_revision = false;
        revision
    }

    pub(crate) fn record_code(&mut self, content: String) {
        debug!(content_len = content.len(), "ArtifactBundle::record_code: called");
        self.push_history(Role::Code, self.current_cycle(), &content);
        self.code = Some(content);
    }

    pub(crate) fn record_tests(&mut self, content: String) {
        debug!(content_len = content.len(), "ArtifactBundle::record_tests: called");
        self.push_history(Role::Test, self.current_cycle(), &content);
        self.tests = Some(content);
    }

    pub(crate) fn record_review(&mut self, content: String, needs_revision: bool) {
        debug!(content_len = content.len(), needs_revision, "ArtifactBundle::record_review: called");
        self.push_history(Role::Review, self.current_cycle(), &content);
        self.review = Some(content);
        self.needs_revision = needs_revision;
    }

    /// Mark the in-flight cycle complete and return the new iteration count
    pub(crate) fn complete_cycle(&mut self) -> u32 {
        self.iteration_count += 1;
        debug!(iteration_count = self.iteration_count, "ArtifactBundle::complete_cycle: called");
        self.iteration_count
    }

    fn push_history(&mut self, role: Role, cycle: u32, content: &str) {
        self.history.push(HistoryEntry {
            role,
            cycle,
            content: content.to_string(),
        });
    }
}
