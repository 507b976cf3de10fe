//! Orchestrator error types

use thiserror::Error;

use crate::domain::Role;

/// Problems that reject a run before it starts
///
/// Stage failures are not errors at this level: they end the run with
/// status `failed` and are reported inside the result.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("max_iterations must be at least 1, got {0}")]
    InvalidMaxIterations(u32),

    #[error("no implementation supplied for the {0} stage")]
    MissingStage(Role),

    #[error("requirement is empty")]
    EmptyRequirement,
}
