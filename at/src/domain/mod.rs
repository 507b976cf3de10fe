//! Domain types for agentteam
//!
//! - [`ArtifactBundle`]: the mutable state threaded through one run
//! - [`TeamResult`]: the frozen projection handed back to callers
//! - [`Role`]: the four generation roles
//! - [`RunId`]: time-ordered run identifier

mod bundle;
mod id;
mod result;
mod role;

pub use bundle::{ArtifactBundle, HistoryEntry};
pub use id::RunId;
pub use result::{RunFailure, RunStatus, TeamResult};
pub use role::Role;
