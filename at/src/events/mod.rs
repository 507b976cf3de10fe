//! Event bus for live run observability
//!
//! The orchestrator emits an event at every stage boundary. Consumers (CLI
//! progress output, the JSONL file logger) subscribe to the bus.
//!
//! ```text
//!   Orchestrator ──emit──▶ EventBus (tokio broadcast) ──▶ CLI progress
//!                                                     └──▶ events.jsonl
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! let bus = Arc::new(EventBus::with_default_capacity());
//! let mut rx = bus.subscribe();
//! let orchestrator = Orchestrator::new(stages, config)?.with_events(bus.clone());
//! ```

mod bus;
mod logger;
mod types;

pub use bus::{DEFAULT_CHANNEL_CAPACITY, EventBus, EventEmitter, create_event_bus};
pub use logger::{EVENTS_FILE, EventLogger, read_run_events, spawn_event_logger};
pub use types::{EventLogEntry, RunEvent, SUMMARY_MAX_CHARS, summarize};
