//! Result export
//!
//! Projects a [`TeamResult`] into a directory of plain files:
//!
//! ```text
//! {output}/{run_id}/
//!   result.json     full result, including history
//!   plan.md
//!   code.{ext}      cleaned, extension from the detected language
//!   tests.{ext}
//!   review.md
//! ```
//!
//! Artifacts that are absent (for example after a failed run) are skipped.

use std::fs;
use std::path::{Path, PathBuf};

use eyre::{Context, Result};
use tracing::{debug, info};

use super::clean::{Language, clean_code};
use crate::domain::TeamResult;

pub const RESULT_FILE: &str = "result.json";
pub const PLAN_FILE: &str = "plan.md";
pub const REVIEW_FILE: &str = "review.md";

/// Options controlling an export
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Base directory; the run directory is created inside it
    pub base_dir: PathBuf,

    /// Strip fences and chatter from the code and test files
    pub clean_code: bool,
}

impl ExportOptions {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            clean_code: true,
        }
    }

    pub fn with_clean_code(mut self, clean_code: bool) -> Self {
        self.clean_code = clean_code;
        self
    }
}

/// What an export wrote
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedRun {
    /// The per-run directory
    pub dir: PathBuf,

    /// Every file written, in write order
    pub files: Vec<PathBuf>,

    /// Language detected from the code artifact
    pub language: Language,
}

/// Write a result into `{base_dir}/{run_id}/`
pub fn write_result(result: &TeamResult, options: &ExportOptions) -> Result<ExportedRun> {
    debug!(run_id = %result.run_id, base_dir = ?options.base_dir, "write_result: called");
    let dir = options.base_dir.join(&result.run_id);
    fs::create_dir_all(&dir).context(format!("Failed to create output directory {}", dir.display()))?;

    let mut files = Vec::new();

    let json = serde_json::to_string_pretty(result).context("Failed to serialize result")?;
    files.push(write_file(&dir, RESULT_FILE, &json)?);

    if let Some(plan) = &result.plan {
        files.push(write_file(&dir, PLAN_FILE, plan)?);
    }

    let language = result.code.as_deref().map(Language::detect).unwrap_or(Language::Unknown);
    debug!(?language, "write_result: detected language");

    let source = |raw: &str| {
        if options.clean_code {
            clean_code(raw)
        } else {
            raw.to_string()
        }
    };

    if let Some(code) = &result.code {
        let name = format!("code.{}", language.extension());
        files.push(write_file(&dir, &name, &source(code))?);
    }

    if let Some(tests) = &result.tests {
        let test_language = match Language::detect(tests) {
            Language::Unknown => language,
            detected => detected,
        };
        let name = format!("tests.{}", test_language.extension());
        files.push(write_file(&dir, &name, &source(tests))?);
    }

    if let Some(review) = &result.review {
        files.push(write_file(&dir, REVIEW_FILE, review)?);
    }

    info!(dir = %dir.display(), files = files.len(), "Exported run");
    Ok(ExportedRun { dir, files, language })
}

fn write_file(dir: &Path, name: &str, content: &str) -> Result<PathBuf> {
    let path = dir.join(name);
    debug!(path = %path.display(), bytes = content.len(), "write_file: called");
    let mut content = content.to_string();
    if !content.ends_with('\n') {
        content.push('\n');
    }
    fs::write(&path, content).context(format!("Failed to write {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{HistoryEntry, Role, RunFailure, RunStatus};
    use chrono::Utc;
    use tempfile::TempDir;

    fn result(status: RunStatus) -> TeamResult {
        TeamResult {
            run_id: "0192f0c3a1b2-palindrome-checker".to_string(),
            requirement: "palindrome checker".to_string(),
            plan: Some("1. normalize\n2. compare".to_string()),
            code: Some("Here's the code:\n```python\ndef is_palindrome(s):\n    return s == s[::-1]\n```".to_string()),
            tests: Some("```python\ndef test_empty():\n    assert is_palindrome('')\n```".to_string()),
            review: Some("APPROVED\nLooks good".to_string()),
            iterations: 1,
            status,
            error: None,
            history: vec![HistoryEntry {
                role: Role::Plan,
                cycle: 0,
                content: "1. normalize\n2. compare".to_string(),
            }],
            finished_at: Utc::now(),
        }
    }

    #[test]
    fn test_writes_all_artifacts() {
        let tmp = TempDir::new().unwrap();
        let exported = write_result(&result(RunStatus::Approved), &ExportOptions::new(tmp.path())).unwrap();

        assert_eq!(exported.dir, tmp.path().join("0192f0c3a1b2-palindrome-checker"));
        assert_eq!(exported.language, Language::Python);
        let names: Vec<String> = exported
            .files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["result.json", "plan.md", "code.py", "tests.py", "review.md"]);

        let code = fs::read_to_string(exported.dir.join("code.py")).unwrap();
        assert_eq!(code, "def is_palindrome(s):\n    return s == s[::-1]\n");

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(exported.dir.join(RESULT_FILE)).unwrap()).unwrap();
        assert_eq!(json["status"], "approved");
        assert_eq!(json["iterations"], 1);
    }

    #[test]
    fn test_raw_code_kept_without_cleaning() {
        let tmp = TempDir::new().unwrap();
        let options = ExportOptions::new(tmp.path()).with_clean_code(false);
        let exported = write_result(&result(RunStatus::Approved), &options).unwrap();
        let code = fs::read_to_string(exported.dir.join("code.py")).unwrap();
        assert!(code.starts_with("Here's the code:"));
    }

    #[test]
    fn test_failed_run_skips_missing_artifacts() {
        let tmp = TempDir::new().unwrap();
        let mut failed = result(RunStatus::Failed);
        failed.tests = None;
        failed.review = None;
        failed.error = Some(RunFailure {
            role: Role::Test,
            cycle: 1,
            message: "timeout".to_string(),
        });

        let exported = write_result(&failed, &ExportOptions::new(tmp.path())).unwrap();
        assert_eq!(exported.files.len(), 3);
        assert!(!exported.dir.join(REVIEW_FILE).exists());

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(exported.dir.join(RESULT_FILE)).unwrap()).unwrap();
        assert_eq!(json["error"]["role"], "test");
    }
}
