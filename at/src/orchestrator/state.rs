//! Orchestrator state machine states

use crate::domain::Role;

/// Where a run is in the pipeline
///
/// ```text
/// START → PLANNING → CODING → TESTING → REVIEWING → DECIDING ─┬─▶ DONE
///                      ▲                                     │
///                      └──────────────── continue ───────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorState {
    Start,
    Planning,
    Coding,
    Testing,
    Reviewing,
    Deciding,
    Done,
}

impl OrchestratorState {
    /// Stage invoked in this state, if any
    pub fn role(&self) -> Option<Role> {
        match self {
            Self::Planning => Some(Role::Plan),
            Self::Coding => Some(Role::Code),
            Self::Testing => Some(Role::Test),
            Self::Reviewing => Some(Role::Review),
            Self::Start | Self::Deciding | Self::Done => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }
}

impl std::fmt::Display for OrchestratorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Start => "START",
            Self::Planning => "PLANNING",
            Self::Coding => "CODING",
            Self::Testing => "TESTING",
            Self::Reviewing => "REVIEWING",
            Self::Deciding => "DECIDING",
            Self::Done => "DONE",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_states_map_to_roles() {
        assert_eq!(OrchestratorState::Planning.role(), Some(Role::Plan));
        assert_eq!(OrchestratorState::Coding.role(), Some(Role::Code));
        assert_eq!(OrchestratorState::Testing.role(), Some(Role::Test));
        assert_eq!(OrchestratorState::Reviewing.role(), Some(Role::Review));
        assert_eq!(OrchestratorState::Deciding.role(), None);
    }

    #[test]
    fn test_only_done_is_terminal() {
        assert!(OrchestratorState::Done.is_terminal());
        assert!(!OrchestratorState::Deciding.is_terminal());
        assert_eq!(OrchestratorState::Done.to_string(), "DONE");
    }
}
