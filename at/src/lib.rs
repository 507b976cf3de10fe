//! AgentTeam - a four-agent software team
//!
//! A requirement goes through a planning agent once, then through repeated
//! coding → testing → reviewing cycles until the reviewer approves or the
//! iteration cap is reached.
//!
//! # Core Concepts
//!
//! - **Artifact bundle**: per-run state threaded through the stages; only the
//!   orchestrator writes to it
//! - **Stages**: one capability trait per role, each taking an input struct
//!   that holds exactly what the role may read
//! - **Bounded loop**: the orchestrator owns the iteration count and stops at
//!   the cap whatever the decision policy says
//! - **No I/O in the core**: LLM calls live in stage implementations, files
//!   in the export sink
//!
//! # Modules
//!
//! - [`orchestrator`] - state machine driving a run
//! - [`stage`] - stage traits and the LLM-backed implementation
//! - [`decision`] - revision decision policy
//! - [`domain`] - bundle, result and run identifiers
//! - [`events`] - event bus for progress and JSONL logs
//! - [`llm`] - LLM client trait and OpenAI-compatible implementation
//! - [`prompts`] - role prompt templates
//! - [`export`] - writes results to disk
//! - [`config`] - configuration types and loading
//! - [`cli`] - command-line interface

pub mod cli;
pub mod config;
pub mod decision;
pub mod domain;
pub mod events;
pub mod export;
pub mod llm;
pub mod orchestrator;
pub mod prompts;
pub mod report;
pub mod stage;

// Re-export commonly used types
pub use config::{Config, LlmConfig};
pub use decision::{Decision, DecisionPolicy, ReviewGate, StopReason, decide};
pub use domain::{ArtifactBundle, HistoryEntry, Role, RunFailure, RunId, RunStatus, TeamResult};
pub use events::{EventBus, EventEmitter, EventLogEntry, EventLogger, RunEvent, create_event_bus, spawn_event_logger};
pub use export::{ExportOptions, ExportedRun, write_result};
pub use llm::{CompletionRequest, CompletionResponse, LlmClient, LlmError, OpenAIClient, create_client};
pub use orchestrator::{ConfigurationError, Orchestrator, OrchestratorConfig, OrchestratorState, run};
pub use stage::{
    CodeInput, CodeStage, LlmStage, PlanInput, PlanStage, ReviewInput, ReviewOutcome, ReviewStage, Revision,
    StageError, Stages, StagesBuilder, TestInput, TestStage, llm_stages,
};
