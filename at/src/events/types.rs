//! Event types for run activity streaming
//!
//! These events describe everything observable about a run:
//! - Run lifecycle (started, finished)
//! - Stage progress (started, completed, failed)
//! - Cycle outcomes (review verdicts)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Role, RunStatus};

/// Longest summary carried by a `StageCompleted` event
pub const SUMMARY_MAX_CHARS: usize = 200;

/// Core event enum - the vocabulary of run activity
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RunEvent {
    /// A run has started
    RunStarted {
        run_id: String,
        requirement: String,
        max_iterations: u32,
    },
    /// A stage has been invoked
    StageStarted { run_id: String, role: Role, cycle: u32 },
    /// A stage produced output
    StageCompleted {
        run_id: String,
        role: Role,
        cycle: u32,
        content_len: usize,
        /// First characters of the output
        summary: String,
    },
    /// A stage failed, ending the run
    StageFailed {
        run_id: String,
        role: Role,
        cycle: u32,
        message: String,
    },
    /// A Code→Test→Review cycle completed
    CycleCompleted {
        run_id: String,
        cycle: u32,
        needs_revision: bool,
    },
    /// The run reached its terminal state
    RunFinished {
        run_id: String,
        status: RunStatus,
        iterations: u32,
    },
}

impl RunEvent {
    /// Get the run ID for this event
    pub fn run_id(&self) -> &str {
        match self {
            RunEvent::RunStarted { run_id, .. }
            | RunEvent::StageStarted { run_id, .. }
            | RunEvent::StageCompleted { run_id, .. }
            | RunEvent::StageFailed { run_id, .. }
            | RunEvent::CycleCompleted { run_id, .. }
            | RunEvent::RunFinished { run_id, .. } => run_id,
        }
    }

    /// Get the event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            RunEvent::RunStarted { .. } => "RunStarted",
            RunEvent::StageStarted { .. } => "StageStarted",
            RunEvent::StageCompleted { .. } => "StageCompleted",
            RunEvent::StageFailed { .. } => "StageFailed",
            RunEvent::CycleCompleted { .. } => "CycleCompleted",
            RunEvent::RunFinished { .. } => "RunFinished",
        }
    }

    /// Whether this is the last event of a run
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunEvent::RunFinished { .. })
    }
}

/// Truncate stage output for event summaries
pub fn summarize(content: &str) -> String {
    let flat = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= SUMMARY_MAX_CHARS {
        return flat;
    }
    let mut summary: String = flat.chars().take(SUMMARY_MAX_CHARS).collect();
    summary.push_str("...");
    summary
}

/// A timestamped event log entry for file persistence
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EventLogEntry {
    /// Timestamp of the event
    #[serde(rename = "ts")]
    pub timestamp: DateTime<Utc>,
    /// The event
    pub event: RunEvent,
}

impl EventLogEntry {
    /// Create a new log entry with current timestamp
    pub fn new(event: RunEvent) -> Self {
        Self {
            timestamp: Utc::now(),
            event,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_run_id() {
        let event = RunEvent::StageStarted {
            run_id: "run-123".to_string(),
            role: Role::Code,
            cycle: 1,
        };
        assert_eq!(event.run_id(), "run-123");
        assert_eq!(event.event_type(), "StageStarted");
        assert!(!event.is_terminal());
    }

    #[test]
    fn test_event_serialization() {
        let event = RunEvent::RunFinished {
            run_id: "run-123".to_string(),
            status: RunStatus::MaxIterationsReached,
            iterations: 3,
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("RunFinished"));
        assert!(json.contains("max_iterations_reached"));

        let parsed: RunEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.run_id(), "run-123");
        assert!(parsed.is_terminal());
    }

    #[test]
    fn test_summarize_flattens_and_truncates() {
        assert_eq!(summarize("def f():\n    return 1"), "def f(): return 1");

        let long = "x".repeat(SUMMARY_MAX_CHARS + 50);
        let summary = summarize(&long);
        assert!(summary.ends_with("..."));
        assert_eq!(summary.chars().count(), SUMMARY_MAX_CHARS + 3);
    }

    #[test]
    fn test_event_log_entry() {
        let entry = EventLogEntry::new(RunEvent::RunStarted {
            run_id: "run-123".to_string(),
            requirement: "Test".to_string(),
            max_iterations: 3,
        });

        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"ts\""));
        assert!(json.contains("RunStarted"));
    }
}
