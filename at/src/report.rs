//! Human-readable progress lines and run summaries for the CLI

use colored::*;
use tracing::debug;

use crate::domain::{Role, RunStatus, TeamResult};
use crate::events::RunEvent;

/// One progress line for an event, or `None` for events not worth showing
pub fn describe_event(event: &RunEvent) -> Option<String> {
    debug!(event_type = event.event_type(), "describe_event: called");
    match event {
        RunEvent::RunStarted {
            run_id, max_iterations, ..
        } => Some(format!(
            "{} run {} (max {} iterations)",
            "▶".cyan(),
            run_id.cyan(),
            max_iterations
        )),
        RunEvent::StageStarted { role, cycle, .. } => Some(match role {
            Role::Plan => format!("  [{}] analyzing requirement...", role.agent_name().to_uppercase()),
            _ => format!("  [{}] cycle {}...", role.agent_name().to_uppercase(), cycle),
        }),
        RunEvent::StageCompleted { role, content_len, .. } => Some(format!(
            "  {} {} produced {} chars",
            "✓".green(),
            role.agent_name(),
            content_len
        )),
        RunEvent::StageFailed { role, message, .. } => {
            Some(format!("  {} {} failed: {}", "✗".red(), role.agent_name(), message))
        }
        RunEvent::CycleCompleted {
            cycle, needs_revision, ..
        } => Some(if *needs_revision {
            format!("  cycle {}: {}", cycle, "NEEDS REVISION".yellow())
        } else {
            format!("  cycle {}: {}", cycle, "APPROVED".green())
        }),
        RunEvent::RunFinished { .. } => None,
    }
}

fn status_label(status: RunStatus) -> ColoredString {
    match status {
        RunStatus::Approved => "APPROVED".green().bold(),
        RunStatus::MaxIterationsReached => "MAX ITERATIONS REACHED".yellow().bold(),
        RunStatus::Failed => "FAILED".red().bold(),
    }
}

/// Multi-line summary printed after a run
pub fn summarize_result(result: &TeamResult) -> String {
    debug!(run_id = %result.run_id, "summarize_result: called");
    let mut out = String::new();
    out.push_str(&format!("Status: {}\n", status_label(result.status)));
    out.push_str(&format!("Run: {}\n", result.run_id));
    out.push_str(&format!("Iterations: {}\n", result.iterations));
    if let Some(headline) = result.review_headline() {
        out.push_str(&format!("Review: {}\n", headline.trim()));
    }
    if let Some(error) = &result.error {
        out.push_str(&format!("Error: {}\n", error));
    }
    out.push_str(&format!("History: {} entries\n", result.history.len()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RunFailure;
    use chrono::Utc;

    fn plain() {
        colored::control::set_override(false);
    }

    #[test]
    fn test_describe_cycle_verdicts() {
        plain();
        let revise = RunEvent::CycleCompleted {
            run_id: "r".to_string(),
            cycle: 1,
            needs_revision: true,
        };
        assert_eq!(describe_event(&revise).unwrap(), "  cycle 1: NEEDS REVISION");

        let failed = RunEvent::StageFailed {
            run_id: "r".to_string(),
            role: Role::Test,
            cycle: 2,
            message: "timeout".to_string(),
        };
        assert_eq!(describe_event(&failed).unwrap(), "  ✗ testing agent failed: timeout");
    }

    #[test]
    fn test_run_finished_is_silent() {
        let finished = RunEvent::RunFinished {
            run_id: "r".to_string(),
            status: RunStatus::Approved,
            iterations: 1,
        };
        assert!(describe_event(&finished).is_none());
    }

    #[test]
    fn test_summary_includes_error() {
        plain();
        let result = TeamResult {
            run_id: "abc-req".to_string(),
            requirement: "req".to_string(),
            plan: Some("p".to_string()),
            code: None,
            tests: None,
            review: None,
            iterations: 0,
            status: RunStatus::Failed,
            error: Some(RunFailure {
                role: Role::Code,
                cycle: 1,
                message: "boom".to_string(),
            }),
            history: vec![],
            finished_at: Utc::now(),
        };
        let summary = summarize_result(&result);
        assert!(summary.contains("Status: FAILED"));
        assert!(summary.contains("Error: code stage failed on cycle 1: boom"));
        assert!(!summary.contains("Review:"));
    }
}
