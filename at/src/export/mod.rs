//! Export sink - writes a finished run to disk
//!
//! The orchestrator never touches the filesystem; the CLI hands the final
//! [`TeamResult`](crate::domain::TeamResult) to this module instead.

mod clean;
mod writer;

pub use clean::{Language, clean_code};
pub use writer::{ExportOptions, ExportedRun, PLAN_FILE, RESULT_FILE, REVIEW_FILE, write_result};
