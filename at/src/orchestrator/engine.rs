//! Orchestrator - drives one run from requirement to result
//!
//! Plan runs once, then Code → Test → Review → Decide repeats until the
//! decision policy stops the run or the iteration cap is hit. The
//! orchestrator owns the iteration count and applies the cap itself, so a
//! misbehaving stage or policy cannot keep the loop going.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::{ConfigurationError, OrchestratorState};
use crate::config::TeamConfig;
use crate::decision::{Decision, DecisionPolicy, ReviewGate, StopReason};
use crate::domain::{ArtifactBundle, Role, RunFailure, RunId, RunStatus, TeamResult};
use crate::events::{EventBus, EventEmitter};
use crate::stage::{StageError, Stages};

/// Default cap on Code→Test→Review cycles
pub const DEFAULT_MAX_ITERATIONS: u32 = 3;

/// Run-level settings, passed explicitly at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorConfig {
    pub max_iterations: u32,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl OrchestratorConfig {
    pub fn with_max_iterations(max_iterations: u32) -> Self {
        Self { max_iterations }
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.max_iterations < 1 {
            return Err(ConfigurationError::InvalidMaxIterations(self.max_iterations));
        }
        Ok(())
    }
}

impl From<&TeamConfig> for OrchestratorConfig {
    fn from(team: &TeamConfig) -> Self {
        Self {
            max_iterations: team.max_iterations,
        }
    }
}

/// Drives runs over a fixed set of stages
///
/// An orchestrator holds no per-run state; every call to [`Orchestrator::run`]
/// owns its own bundle, so independent runs may execute concurrently.
pub struct Orchestrator {
    stages: Stages,
    config: OrchestratorConfig,
    policy: Arc<dyn DecisionPolicy>,
    events: Option<Arc<EventBus>>,
    cancel: Option<watch::Receiver<bool>>,
}

impl Orchestrator {
    /// Create an orchestrator, rejecting an invalid configuration
    pub fn new(stages: Stages, config: OrchestratorConfig) -> Result<Self, ConfigurationError> {
        debug!(max_iterations = config.max_iterations, "Orchestrator::new: called");
        config.validate()?;
        Ok(Self {
            stages,
            config,
            policy: Arc::new(ReviewGate),
            events: None,
            cancel: None,
        })
    }

    /// Replace the default [`ReviewGate`] decision policy
    pub fn with_policy(mut self, policy: Arc<dyn DecisionPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Emit run events on the given bus
    pub fn with_events(mut self, bus: Arc<EventBus>) -> Self {
        self.events = Some(bus);
        self
    }

    /// Stop runs once the watched flag turns `true`
    ///
    /// The flag is checked at stage boundaries only; an in-flight stage is
    /// always allowed to finish.
    pub fn with_cancellation(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Run the team on a requirement under a freshly generated run ID
    pub async fn run(&self, requirement: &str) -> Result<TeamResult, ConfigurationError> {
        let run_id = RunId::new(requirement);
        self.run_with_id(&run_id, requirement).await
    }

    /// Run the team on a requirement under a caller-chosen run ID
    pub async fn run_with_id(&self, run_id: &RunId, requirement: &str) -> Result<TeamResult, ConfigurationError> {
        debug!(%run_id, requirement_len = requirement.len(), "Orchestrator::run_with_id: called");
        if requirement.trim().is_empty() {
            debug!("Orchestrator::run_with_id: empty requirement");
            return Err(ConfigurationError::EmptyRequirement);
        }

        let emitter = self.events.as_ref().map(|bus| bus.emitter_for(run_id.as_str()));
        let mut run = Run {
            bundle: ArtifactBundle::new(requirement),
            emitter,
        };

        info!(%run_id, max_iterations = self.config.max_iterations, "Starting run");
        run.notify(|e| e.run_started(requirement, self.config.max_iterations));

        let (status, failure) = match self.drive(&mut run).await {
            Ok(reason) => (RunStatus::from(reason), None),
            Err(failure) => {
                warn!(%run_id, %failure, "Run failed");
                (RunStatus::Failed, Some(failure))
            }
        };

        let iterations = run.bundle.iteration_count();
        info!(%run_id, %status, iterations, "Run finished");
        run.notify(|e| e.run_finished(status, iterations));

        Ok(TeamResult::from_bundle(run_id, run.bundle, status, failure))
    }

    /// Walk the state machine until DONE
    async fn drive(&self, run: &mut Run) -> Result<StopReason, RunFailure> {
        let max = self.config.max_iterations;
        let mut state = OrchestratorState::Start;
        let mut stop_reason = StopReason::MaxIterationsReached;

        while !state.is_terminal() {
            if let Some(role) = state.role()
                && self.is_cancelled()
            {
                debug!(%state, "drive: cancellation requested at stage boundary");
                return Err(run.failure(role, "run cancelled".to_string()));
            }

            let next = match state {
                OrchestratorState::Start => OrchestratorState::Planning,
                OrchestratorState::Planning => {
                    let input = run.bundle.plan_input();
                    run.started(Role::Plan);
                    let content = run.check(Role::Plan, self.stages.plan.plan(input).await)?;
                    run.bundle.record_plan(content);
                    OrchestratorState::Coding
                }
                OrchestratorState::Coding => {
                    let revision = run.bundle.begin_cycle();
                    let input = run
                        .bundle
                        .code_input(revision)
                        .ok_or_else(|| run.failure(Role::Code, "plan is missing".to_string()))?;
                    info!(cycle = run.bundle.current_cycle(), revision = input.is_revision(), "Cycle started");
                    run.started(Role::Code);
                    let content = run.check(Role::Code, self.stages.code.code(input).await)?;
                    run.bundle.record_code(content);
                    OrchestratorState::Testing
                }
                OrchestratorState::Testing => {
                    let input = run
                        .bundle
                        .test_input()
                        .ok_or_else(|| run.failure(Role::Test, "code is missing".to_string()))?;
                    run.started(Role::Test);
                    let content = run.check(Role::Test, self.stages.test.test(input).await)?;
                    run.bundle.record_tests(content);
                    OrchestratorState::Reviewing
                }
                OrchestratorState::Reviewing => {
                    let input = run
                        .bundle
                        .review_input()
                        .ok_or_else(|| run.failure(Role::Review, "tests are missing".to_string()))?;
                    run.started(Role::Review);
                    let outcome = self.stages.review.review(input).await;
                    let (content, needs_revision) = match outcome {
                        Ok(o) => (Ok(o.content), o.needs_revision),
                        Err(e) => (Err(e), false),
                    };
                    let content = run.check(Role::Review, content)?;
                    run.bundle.record_review(content, needs_revision);
                    let cycle = run.bundle.complete_cycle();
                    run.notify(|e| e.cycle_completed(cycle, needs_revision));
                    OrchestratorState::Deciding
                }
                OrchestratorState::Deciding => {
                    let decision = self.policy.decide(&run.bundle, max);
                    debug!(?decision, iteration_count = run.bundle.iteration_count(), "drive: decision");
                    match decision {
                        Decision::Continue if run.bundle.iteration_count() >= max => {
                            warn!(max, "Decision policy asked to continue past the cap; stopping");
                            stop_reason = if run.bundle.needs_revision() {
                                StopReason::MaxIterationsReached
                            } else {
                                StopReason::Approved
                            };
                            OrchestratorState::Done
                        }
                        Decision::Continue => {
                            info!(cycle = run.bundle.iteration_count(), "Revision needed");
                            OrchestratorState::Coding
                        }
                        Decision::Stop(reason) => {
                            stop_reason = reason;
                            OrchestratorState::Done
                        }
                    }
                }
                OrchestratorState::Done => OrchestratorState::Done,
            };

            debug!(from = %state, to = %next, "drive: transition");
            state = next;
        }

        Ok(stop_reason)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|rx| *rx.borrow())
    }
}

/// Per-run mutable state
struct Run {
    bundle: ArtifactBundle,
    emitter: Option<EventEmitter>,
}

impl Run {
    fn notify(&self, f: impl FnOnce(&EventEmitter)) {
        if let Some(emitter) = &self.emitter {
            f(emitter);
        }
    }

    /// Cycle a stage of the given role belongs to
    fn cycle_for(&self, role: Role) -> u32 {
        match role {
            Role::Plan => 0,
            _ => self.bundle.current_cycle(),
        }
    }

    fn started(&self, role: Role) {
        let cycle = self.cycle_for(role);
        debug!(%role, cycle, "Run::started");
        self.notify(|e| e.stage_started(role, cycle));
    }

    fn failure(&self, role: Role, message: String) -> RunFailure {
        let cycle = self.cycle_for(role);
        self.notify(|e| e.stage_failed(role, cycle, &message));
        RunFailure { role, cycle, message }
    }

    /// Accept a stage's output, treating errors and blank output as fatal
    fn check(&self, role: Role, output: Result<String, StageError>) -> Result<String, RunFailure> {
        let output = output.and_then(|content| {
            if content.trim().is_empty() {
                Err(StageError::EmptyOutput)
            } else {
                Ok(content)
            }
        });
        match output {
            Ok(content) => {
                let cycle = self.cycle_for(role);
                debug!(%role, cycle, content_len = content.len(), "Run::check: stage succeeded");
                self.notify(|e| e.stage_completed(role, cycle, &content));
                Ok(content)
            }
            Err(e) => {
                debug!(%role, error = %e, "Run::check: stage failed");
                Err(self.failure(role, e.to_string()))
            }
        }
    }
}

/// Run the team once with the default decision policy
pub async fn run(stages: Stages, requirement: &str, max_iterations: u32) -> Result<TeamResult, ConfigurationError> {
    Orchestrator::new(stages, OrchestratorConfig::with_max_iterations(max_iterations))?
        .run(requirement)
        .await
}
