//! Event Logger - persists events to JSONL files
//!
//! The EventLogger consumes a bus subscription and appends every event to
//! `{runs_dir}/{run-id}/events.jsonl`, next to the exported artifacts.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tokio::sync::broadcast;
use tracing::{debug, error, warn};

use super::types::{EventLogEntry, RunEvent};

/// Name of the per-run event log
pub const EVENTS_FILE: &str = "events.jsonl";

/// Event logger that writes events to JSONL files
pub struct EventLogger {
    /// Base directory holding one subdirectory per run
    runs_dir: PathBuf,
    /// Open file writers per run
    writers: HashMap<String, BufWriter<File>>,
}

impl EventLogger {
    /// Create a new event logger
    pub fn new(runs_dir: impl AsRef<Path>) -> Self {
        let runs_dir = runs_dir.as_ref().to_path_buf();
        debug!(?runs_dir, "EventLogger::new: creating logger");
        Self {
            runs_dir,
            writers: HashMap::new(),
        }
    }

    /// Write an event to its run's log file
    pub fn write_event(&mut self, event: &RunEvent) -> eyre::Result<()> {
        let run_id = event.run_id().to_string();
        debug!(%run_id, event_type = event.event_type(), "EventLogger::write_event");

        if !self.writers.contains_key(&run_id) {
            let run_dir = self.runs_dir.join(&run_id);
            fs::create_dir_all(&run_dir)?;

            let log_path = run_dir.join(EVENTS_FILE);
            debug!(?log_path, "EventLogger: creating new log file");

            let file = OpenOptions::new().create(true).append(true).open(&log_path)?;
            self.writers.insert(run_id.clone(), BufWriter::new(file));
        }

        if let Some(writer) = self.writers.get_mut(&run_id) {
            let entry = EventLogEntry::new(event.clone());
            let json = serde_json::to_string(&entry)?;
            writeln!(writer, "{}", json)?;
            writer.flush()?;
        }

        Ok(())
    }

    /// Close the writer for a run
    pub fn close_run(&mut self, run_id: &str) {
        debug!(%run_id, "EventLogger::close_run");
        if let Some(mut writer) = self.writers.remove(run_id) {
            let _ = writer.flush();
        }
    }

    /// Consume events until every sender is gone
    pub async fn run(mut self, mut rx: broadcast::Receiver<RunEvent>) {
        debug!("EventLogger::run: starting event logger");

        loop {
            match rx.recv().await {
                Ok(event) => {
                    let run_id = event.run_id().to_string();
                    if let Err(e) = self.write_event(&event) {
                        error!(%run_id, error = %e, "EventLogger: failed to write event");
                    }
                    if event.is_terminal() {
                        self.close_run(&run_id);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(missed = n, "EventLogger: lagged behind, missed events");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("EventLogger: channel closed, shutting down");
                    break;
                }
            }
        }

        for (run_id, mut writer) in self.writers.drain() {
            debug!(%run_id, "EventLogger: flushing writer on shutdown");
            let _ = writer.flush();
        }
    }
}

/// Read events from a run's log file
pub fn read_run_events(runs_dir: impl AsRef<Path>, run_id: &str) -> eyre::Result<Vec<EventLogEntry>> {
    let log_path = runs_dir.as_ref().join(run_id).join(EVENTS_FILE);
    debug!(?log_path, "read_run_events: reading log file");

    if !log_path.exists() {
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(&log_path)?;
    let mut entries = Vec::new();

    for line in content.lines() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<EventLogEntry>(line) {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                warn!(line, error = %e, "read_run_events: failed to parse line");
            }
        }
    }

    debug!(count = entries.len(), "read_run_events: loaded entries");
    Ok(entries)
}

/// Spawn the event logger as a background task
pub fn spawn_event_logger(runs_dir: impl AsRef<Path>, rx: broadcast::Receiver<RunEvent>) -> tokio::task::JoinHandle<()> {
    let logger = EventLogger::new(runs_dir);
    tokio::spawn(async move {
        logger.run(rx).await;
    })
}
