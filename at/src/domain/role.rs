//! Team roles

use serde::{Deserialize, Serialize};
use tracing::debug;

/// One of the four generation roles in the team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Turns the requirement into a technical plan
    Plan,
    /// Implements (and revises) the code
    Code,
    /// Writes tests for the current code
    Test,
    /// Reviews code and tests, deciding whether a revision is needed
    Review,
}

impl Role {
    /// All roles in pipeline order
    pub const ALL: [Role; 4] = [Role::Plan, Role::Code, Role::Test, Role::Review];

    /// Name of the agent playing this role, as shown in progress output
    pub fn agent_name(&self) -> &'static str {
        debug!(?self, "Role::agent_name: called");
        match self {
            Self::Plan => "planning agent",
            Self::Code => "coding agent",
            Self::Test => "testing agent",
            Self::Review => "reviewing agent",
        }
    }

    /// Name of the prompt template used for this role
    pub fn template_name(&self) -> &'static str {
        match self {
            Self::Plan => "plan",
            Self::Code => "code",
            Self::Test => "test",
            Self::Review => "review",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plan => write!(f, "plan"),
            Self::Code => write!(f, "code"),
            Self::Test => write!(f, "test"),
            Self::Review => write!(f, "review"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "Role::from_str: called");
        match s.to_lowercase().as_str() {
            "plan" | "planner" => Ok(Self::Plan),
            "code" | "coder" => Ok(Self::Code),
            "test" | "tester" => Ok(Self::Test),
            "review" | "reviewer" => Ok(Self::Review),
            other => Err(format!(
                "Unknown role '{}'. Valid values: plan, code, test, review",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_display_matches_serde() {
        for role in Role::ALL {
            let json = serde_json::to_string(&role).unwrap();
            assert_eq!(json, format!("\"{}\"", role));
        }
    }

    #[test]
    fn test_role_from_str_accepts_agent_aliases() {
        assert_eq!("planner".parse::<Role>().unwrap(), Role::Plan);
        assert_eq!("CODE".parse::<Role>().unwrap(), Role::Code);
        assert_eq!("tester".parse::<Role>().unwrap(), Role::Test);
        assert_eq!("review".parse::<Role>().unwrap(), Role::Review);
        assert!("deploy".parse::<Role>().is_err());
    }

    #[test]
    fn test_pipeline_order() {
        assert_eq!(Role::ALL[0], Role::Plan);
        assert_eq!(Role::ALL[3], Role::Review);
    }
}
