//! TeamResult - the finalized projection of a run
//!
//! This is the only artifact exposed past the orchestrator boundary. It is
//! built once, when the run reaches its terminal state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ArtifactBundle, HistoryEntry, Role, RunId};

/// Terminal status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// The reviewer accepted the code
    Approved,
    /// The iteration cap stopped the run before approval
    MaxIterationsReached,
    /// A stage failed (or the run was cancelled)
    Failed,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Approved => write!(f, "approved"),
            Self::MaxIterationsReached => write!(f, "max_iterations_reached"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Why a run ended in [`RunStatus::Failed`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunFailure {
    /// Stage that was running (or about to run) when the run stopped
    pub role: Role,

    /// Cycle in flight (0 for the plan stage)
    pub cycle: u32,

    /// Human readable cause
    pub message: String,
}

impl std::fmt::Display for RunFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.cycle == 0 {
            write!(f, "{} stage failed: {}", self.role, self.message)
        } else {
            write!(f, "{} stage failed on cycle {}: {}", self.role, self.cycle, self.message)
        }
    }
}

/// Finalized, immutable outcome of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamResult {
    pub run_id: String,
    pub requirement: String,
    pub plan: Option<String>,
    pub code: Option<String>,
    pub tests: Option<String>,
    pub review: Option<String>,

    /// Completed Code→Test→Review cycles
    pub iterations: u32,

    pub status: RunStatus,

    /// Present only when `status` is `failed`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RunFailure>,

    /// Every stage output in causal order
    pub history: Vec<HistoryEntry>,

    pub finished_at: DateTime<Utc>,
}

impl TeamResult {
    /// Freeze a bundle into a result
    pub(crate) fn from_bundle(
        run_id: &RunId,
        bundle: ArtifactBundle,
        status: RunStatus,
        error: Option<RunFailure>,
    ) -> Self {
        debug!(%run_id, %status, iterations = bundle.iteration_count(), "TeamResult::from_bundle: called");
        let iterations = bundle.iteration_count();
        let history = bundle.history().to_vec();
        Self {
            run_id: run_id.to_string(),
            requirement: bundle.requirement().to_string(),
            plan: bundle.plan().map(str::to_string),
            code: bundle.code().map(str::to_string),
            tests: bundle.tests().map(str::to_string),
            review: bundle.review().map(str::to_string),
            iterations,
            status,
            error,
            history,
            finished_at: Utc::now(),
        }
    }

    /// First line of the review, which carries the verdict
    pub fn review_headline(&self) -> Option<&str> {
        self.review.as_deref().and_then(|r| r.lines().find(|l| !l.trim().is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&RunStatus::MaxIterationsReached).unwrap(),
            "\"max_iterations_reached\""
        );
        assert_eq!(RunStatus::MaxIterationsReached.to_string(), "max_iterations_reached");
        assert_eq!(RunStatus::Approved.to_string(), "approved");
        assert_eq!(RunStatus::Failed.to_string(), "failed");
    }

    #[test]
    fn test_error_omitted_when_absent() {
        let mut bundle = ArtifactBundle::new("req");
        bundle.record_plan("plan".to_string());
        let result = TeamResult::from_bundle(&RunId::new("req"), bundle, RunStatus::Approved, None);
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("error").is_none());
        assert_eq!(json["status"], "approved");
        assert_eq!(json["plan"], "plan");
        assert!(json["code"].is_null());
    }

    #[test]
    fn test_failure_display() {
        let failure = RunFailure {
            role: Role::Test,
            cycle: 2,
            message: "boom".to_string(),
        };
        assert_eq!(failure.to_string(), "test stage failed on cycle 2: boom");

        let failure = RunFailure {
            role: Role::Plan,
            cycle: 0,
            message: "empty".to_string(),
        };
        assert_eq!(failure.to_string(), "plan stage failed: empty");
    }

    #[test]
    fn test_review_headline_skips_blank_lines() {
        let mut bundle = ArtifactBundle::new("req");
        bundle.record_plan("plan".to_string());
        bundle.begin_cycle();
        bundle.record_code("code".to_string());
        bundle.record_tests("tests".to_string());
        bundle.record_review("\n\nAPPROVED\nLooks good".to_string(), false);
        bundle.complete_cycle();

        let result = TeamResult::from_bundle(&RunId::new("req"), bundle, RunStatus::Approved, None);
        assert_eq!(result.review_headline(), Some("APPROVED"));
    }
}
