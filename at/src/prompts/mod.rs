//! Prompt Template System
//!
//! Loads and renders `.pmt` (prompt template) files, one per role plus a
//! shared system prompt.
//!
//! Template loading chain:
//! 1. `{team.prompts-dir}/{name}.pmt` (user override)
//! 2. Embedded fallback compiled into the binary
//!
//! Templates use Handlebars syntax for variable substitution.

pub mod embedded;
mod loader;

pub use loader::{HistoryView, PromptContext, PromptLoader};
