//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time.

use tracing::debug;

/// Planning agent prompt
pub const PLAN: &str = include_str!("../../prompts/plan.pmt");

/// Coding agent prompt, covering first drafts and revisions
pub const CODE: &str = include_str!("../../prompts/code.pmt");

/// Testing agent prompt
pub const TEST: &str = include_str!("../../prompts/test.pmt");

/// Reviewing agent prompt; asks for the verdict on the first line
pub const REVIEW: &str = include_str!("../../prompts/review.pmt");

/// System prompt shared by all agents
pub const SYSTEM: &str = include_str!("../../prompts/system.pmt");

/// Names of every embedded template
pub const NAMES: [&str; 5] = ["plan", "code", "test", "review", "system"];

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "plan" => Some(PLAN),
        "code" => Some(CODE),
        "test" => Some(TEST),
        "review" => Some(REVIEW),
        "system" => Some(SYSTEM),
        _ => {
            debug!("get_embedded: no match found");
            None
        }
    }
}
