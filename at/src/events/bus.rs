//! Event Bus - pub/sub for run events
//!
//! The EventBus uses a tokio broadcast channel to deliver events to all
//! subscribers. The orchestrator emits, consumers (CLI progress, file logger)
//! subscribe.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::debug;

use super::types::{RunEvent, summarize};
use crate::domain::{Role, RunStatus};

/// Default channel capacity (events)
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1_024;

/// Central event bus for run activity
pub struct EventBus {
    tx: broadcast::Sender<RunEvent>,
}

impl EventBus {
    /// Create a new event bus with the given capacity
    pub fn new(capacity: usize) -> Self {
        debug!(capacity, "EventBus::new: creating event bus");
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Create a new event bus with default capacity
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Emit an event to all subscribers
    ///
    /// Fire-and-forget: with no subscribers the event is dropped.
    pub fn emit(&self, event: RunEvent) {
        debug!(event_type = event.event_type(), run_id = event.run_id(), "EventBus::emit");
        let _ = self.tx.send(event);
    }

    /// Subscribe to events emitted from now on
    pub fn subscribe(&self) -> broadcast::Receiver<RunEvent> {
        debug!("EventBus::subscribe: new subscriber");
        self.tx.subscribe()
    }

    /// Create an emitter bound to one run
    pub fn emitter_for(&self, run_id: impl Into<String>) -> EventEmitter {
        let run_id = run_id.into();
        debug!(%run_id, "EventBus::emitter_for: creating emitter");
        EventEmitter {
            tx: self.tx.clone(),
            run_id,
        }
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

/// Handle for emitting events of a single run
///
/// Cheap to clone; every event carries the bound run ID.
#[derive(Clone)]
pub struct EventEmitter {
    tx: broadcast::Sender<RunEvent>,
    run_id: String,
}

impl EventEmitter {
    /// Get the run ID this emitter is bound to
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Emit a raw event
    pub fn emit(&self, event: RunEvent) {
        debug!(event_type = event.event_type(), "EventEmitter::emit");
        let _ = self.tx.send(event);
    }

    pub fn run_started(&self, requirement: &str, max_iterations: u32) {
        self.emit(RunEvent::RunStarted {
            run_id: self.run_id.clone(),
            requirement: requirement.to_string(),
            max_iterations,
        });
    }

    pub fn stage_started(&self, role: Role, cycle: u32) {
        self.emit(RunEvent::StageStarted {
            run_id: self.run_id.clone(),
            role,
            cycle,
        });
    }

    pub fn stage_completed(&self, role: Role, cycle: u32, content: &str) {
        self.emit(RunEvent::StageCompleted {
            run_id: self.run_id.clone(),
            role,
            cycle,
            content_len: content.len(),
            summary: summarize(content),
        });
    }

    pub fn stage_failed(&self, role: Role, cycle: u32, message: &str) {
        self.emit(RunEvent::StageFailed {
            run_id: self.run_id.clone(),
            role,
            cycle,
            message: message.to_string(),
        });
    }

    pub fn cycle_completed(&self, cycle: u32, needs_revision: bool) {
        self.emit(RunEvent::CycleCompleted {
            run_id: self.run_id.clone(),
            cycle,
            needs_revision,
        });
    }

    pub fn run_finished(&self, status: RunStatus, iterations: u32) {
        self.emit(RunEvent::RunFinished {
            run_id: self.run_id.clone(),
            status,
            iterations,
        });
    }
}

/// Create an event bus wrapped in an Arc for shared ownership
pub fn create_event_bus() -> Arc<EventBus> {
    Arc::new(EventBus::with_default_capacity())
}
