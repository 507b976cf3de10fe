//! Prompt Loader
//!
//! Loads prompt templates from an override directory or falls back to the
//! embedded defaults, then renders them with Handlebars.

use std::path::{Path, PathBuf};

use eyre::{Result, eyre};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::debug;

use super::embedded;
use crate::domain::{HistoryEntry, Role};
use crate::stage::{CodeInput, PlanInput, ReviewInput, TestInput};

/// One history entry as seen by a template
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HistoryView {
    pub role: String,
    pub cycle: u32,
    pub content: String,
}

impl From<&HistoryEntry> for HistoryView {
    fn from(entry: &HistoryEntry) -> Self {
        Self {
            role: entry.role.agent_name().to_string(),
            cycle: entry.cycle,
            content: entry.content.clone(),
        }
    }
}

/// Context for rendering prompt templates
///
/// Each constructor only fills what its role's input carries, so a template
/// cannot reach artifacts its stage was not given.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct PromptContext {
    pub requirement: Option<String>,
    pub plan: Option<String>,
    pub code: Option<String>,
    pub tests: Option<String>,
    pub is_revision: bool,
    pub previous_code: Option<String>,
    pub review_feedback: Option<String>,
    pub history: Vec<HistoryView>,
}

impl PromptContext {
    pub fn for_plan(input: &PlanInput) -> Self {
        debug!(requirement_len = input.requirement.len(), "PromptContext::for_plan: called");
        Self {
            requirement: Some(input.requirement.clone()),
            ..Self::default()
        }
    }

    /// Context for the coding agent, keeping the last `history_window` entries
    pub fn for_code(input: &CodeInput, history_window: usize) -> Self {
        debug!(
            is_revision = input.is_revision(),
            history_len = input.history.len(),
            history_window,
            "PromptContext::for_code: called"
        );
        let skip = input.history.len().saturating_sub(history_window);
        let history = input.history.iter().skip(skip).map(HistoryView::from).collect();
        let (previous_code, review_feedback) = match &input.revision {
            Some(r) => (Some(r.previous_code.clone()), Some(r.review.clone())),
            None => (None, None),
        };
        Self {
            plan: Some(input.plan.clone()),
            is_revision: input.is_revision(),
            previous_code,
            review_feedback,
            history,
            ..Self::default()
        }
    }

    pub fn for_test(input: &TestInput) -> Self {
        debug!("PromptContext::for_test: called");
        Self {
            plan: Some(input.plan.clone()),
            code: Some(input.code.clone()),
            ..Self::default()
        }
    }

    pub fn for_review(input: &ReviewInput) -> Self {
        debug!("PromptContext::for_review: called");
        Self {
            plan: Some(input.plan.clone()),
            code: Some(input.code.clone()),
            tests: Some(input.tests.clone()),
            ..Self::default()
        }
    }
}

#[derive(Serialize)]
struct SystemContext<'a> {
    agent: &'a str,
}

/// Loads and renders prompt templates
pub struct PromptLoader {
    /// Handlebars template engine
    hbs: Handlebars<'static>,
    /// Override directory holding `{name}.pmt` files
    override_dir: Option<PathBuf>,
}

impl PromptLoader {
    /// Create a loader that prefers templates found in `dir`
    pub fn new(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        let exists = dir.is_dir();
        debug!(?dir, %exists, "PromptLoader::new: called");
        Self {
            hbs: Self::engine(),
            override_dir: exists.then(|| dir.to_path_buf()),
        }
    }

    /// Create a loader that only uses embedded prompts
    pub fn embedded_only() -> Self {
        debug!("PromptLoader::embedded_only: called");
        Self {
            hbs: Self::engine(),
            override_dir: None,
        }
    }

    /// Loader for an optional override directory
    pub fn from_dir(dir: Option<&Path>) -> Self {
        match dir {
            Some(dir) => Self::new(dir),
            None => Self::embedded_only(),
        }
    }

    fn engine() -> Handlebars<'static> {
        let mut hbs = Handlebars::new();
        // Prompts are plain text, not HTML
        hbs.register_escape_fn(handlebars::no_escape);
        hbs
    }

    /// Load a template by name
    ///
    /// Checks the override directory first, then the embedded defaults.
    pub fn load_template(&self, name: &str) -> Result<String> {
        debug!(%name, "PromptLoader::load_template: called");
        if let Some(ref dir) = self.override_dir {
            let path = dir.join(format!("{}.pmt", name));
            if path.exists() {
                debug!(?path, "PromptLoader::load_template: found override");
                return std::fs::read_to_string(&path)
                    .map_err(|e| eyre!("Failed to read prompt {}: {}", path.display(), e));
            }
            debug!(?path, "PromptLoader::load_template: no override");
        }

        if let Some(content) = embedded::get_embedded(name) {
            debug!(%name, "PromptLoader::load_template: found in embedded");
            return Ok(content.to_string());
        }

        debug!(%name, "PromptLoader::load_template: not found anywhere");
        Err(eyre!("Prompt template not found: {}", name))
    }

    /// Render a template with the given context
    pub fn render(&self, template_name: &str, context: &impl Serialize) -> Result<String> {
        debug!(%template_name, "PromptLoader::render: called");
        let template = self.load_template(template_name)?;
        self.hbs
            .render_template(&template, context)
            .map_err(|e| eyre!("Failed to render template {}: {}", template_name, e))
    }

    /// Render the user prompt for a role
    pub fn render_role(&self, role: Role, context: &PromptContext) -> Result<String> {
        self.render(role.template_name(), context)
    }

    /// Render the system prompt for a role
    pub fn system_prompt(&self, role: Role) -> Result<String> {
        self.render(
            "system",
            &SystemContext {
                agent: role.agent_name(),
            },
        )
    }
}
