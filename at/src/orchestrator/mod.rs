//! Orchestrator - sequences the four roles over a shared artifact bundle
//!
//! ```text
//! requirement ─▶ Plan ─▶ Code ─▶ Test ─▶ Review ─▶ Decide ─┬─▶ TeamResult
//!                          ▲                               │
//!                          └────────── needs revision ─────┘
//! ```

mod engine;
mod error;
mod state;

pub use engine::{DEFAULT_MAX_ITERATIONS, Orchestrator, OrchestratorConfig, run};
pub use error::ConfigurationError;
pub use state::OrchestratorState;
