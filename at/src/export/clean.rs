//! Code cleaning and language detection
//!
//! Model output usually wraps code in markdown fences and surrounds it with
//! chatter. Cleaning keeps only what should land in a source file.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

static FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?ms)^[ \t]*```[ \t]*([\w+#.-]*)[^\n]*\n(.*?)^[ \t]*```[ \t]*$").unwrap());

static PREAMBLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^[ \t]*(here's|here is|below is|as an? |i will|i'll)[^\n]*\n?").unwrap()
});

static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*##+[ \t]+[^\n]*\n?").unwrap());

static FILE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(//|#)[ \t]*(filename|file):[ \t]*[\w./-]+[ \t]*\n?").unwrap()
});

static BLANK_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t]*\n([ \t]*\n)+").unwrap());

/// Source language of a generated artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Rust,
    Python,
    JavaScript,
    TypeScript,
    Go,
    Java,
    CSharp,
    Unknown,
}

impl Language {
    /// File extension without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Rust => "rs",
            Self::Python => "py",
            Self::JavaScript => "js",
            Self::TypeScript => "ts",
            Self::Go => "go",
            Self::Java => "java",
            Self::CSharp => "cs",
            Self::Unknown => "txt",
        }
    }

    /// Parse a markdown fence info string such as `python` or `c#`
    pub fn from_fence_tag(tag: &str) -> Option<Self> {
        match tag.to_lowercase().as_str() {
            "rust" | "rs" => Some(Self::Rust),
            "python" | "py" | "python3" => Some(Self::Python),
            "javascript" | "js" | "node" => Some(Self::JavaScript),
            "typescript" | "ts" => Some(Self::TypeScript),
            "go" | "golang" => Some(Self::Go),
            "java" => Some(Self::Java),
            "csharp" | "cs" | "c#" => Some(Self::CSharp),
            _ => None,
        }
    }

    /// Guess the language of raw model output
    ///
    /// A fence tag wins; otherwise keyword heuristics are applied.
    pub fn detect(text: &str) -> Self {
        if let Some(lang) = FENCE
            .captures_iter(text)
            .find_map(|c| c.get(1).and_then(|m| Self::from_fence_tag(m.as_str())))
        {
            debug!(?lang, "Language::detect: from fence tag");
            return lang;
        }

        let lang = if text.contains("fn ") && (text.contains("let ") || text.contains("pub ") || text.contains("impl "))
        {
            Self::Rust
        } else if text.contains("namespace ") || text.contains("using System") || text.contains("static void Main") {
            Self::CSharp
        } else if text.contains("public static void main") || (text.contains("public class ") && text.contains("import java")) {
            Self::Java
        } else if text.contains("package main") || text.contains("func ") {
            Self::Go
        } else if text.contains("def ") || text.contains("import pytest") {
            Self::Python
        } else if text.contains("interface ") && text.contains(": string") {
            Self::TypeScript
        } else if text.contains("function ") || text.contains("const ") || text.contains("=> ") {
            Self::JavaScript
        } else {
            Self::Unknown
        };
        debug!(?lang, "Language::detect: from heuristics");
        lang
    }
}

/// Drop the prose lines (preamble, markdown headings, blanks) before the
/// first line of code
fn strip_leading_prose(text: &str) -> &str {
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        if line.trim().is_empty() || PREAMBLE.is_match(line) || HEADING.is_match(line) {
            offset += line.len();
        } else {
            break;
        }
    }
    &text[offset..]
}

/// Strip markdown and chatter from generated code
///
/// When the text contains fenced blocks, their bodies are kept and joined;
/// everything outside the fences is discarded. Otherwise the leading prose
/// is dropped and file markers are removed; `##` lines inside the code stay.
pub fn clean_code(text: &str) -> String {
    debug!(text_len = text.len(), "clean_code: called");
    let blocks: Vec<&str> = FENCE
        .captures_iter(text)
        .filter_map(|c| c.get(2).map(|m| m.as_str()))
        .collect();

    let code = if blocks.is_empty() {
        FILE_MARKER.replace_all(strip_leading_prose(text), "").into_owned()
    } else {
        debug!(blocks = blocks.len(), "clean_code: extracting fenced blocks");
        let joined = blocks.join("\n");
        FILE_MARKER.replace_all(&joined, "").into_owned()
    };

    BLANK_RUNS.replace_all(&code, "\n\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_fenced_block() {
        let raw = "Here's the implementation:\n\n```python\ndef is_palindrome(s):\n    return s == s[::-1]\n```\n\nThis handles empty strings.";
        assert_eq!(clean_code(raw), "def is_palindrome(s):\n    return s == s[::-1]");
        assert_eq!(Language::detect(raw), Language::Python);
    }

    #[test]
    fn test_joins_multiple_blocks() {
        let raw = "```rust\nfn a() {}\n```\nthen\n```rust\nfn b() {}\n```";
        assert_eq!(clean_code(raw), "fn a() {}\n\nfn b() {}");
    }

    #[test]
    fn test_unfenced_text_loses_preamble_and_headings() {
        let raw = "Below is the code.\n## main.py\n# a python comment\nprint('hi')\n\n\n\nprint('bye')\n";
        assert_eq!(clean_code(raw), "# a python comment\nprint('hi')\n\nprint('bye')");
    }

    #[test]
    fn test_section_comments_inside_unfenced_code_survive() {
        let raw = "Here is the module:\n## Overview\nimport sys\n\n## Helpers\ndef helper():\n    ## inner note\n    return 1\n";
        assert_eq!(
            clean_code(raw),
            "import sys\n\n## Helpers\ndef helper():\n    ## inner note\n    return 1"
        );
    }

    #[test]
    fn test_file_markers_removed() {
        let raw = "```csharp\n// File: Program.cs\nusing System;\n```";
        assert_eq!(clean_code(raw), "using System;");
        assert_eq!(Language::detect(raw), Language::CSharp);
    }

    #[test]
    fn test_heuristic_detection() {
        assert_eq!(Language::detect("pub fn add(a: i32) -> i32 { a }"), Language::Rust);
        assert_eq!(Language::detect("package main\nfunc main() {}"), Language::Go);
        assert_eq!(Language::detect("const add = (a, b) => a + b;"), Language::JavaScript);
        assert_eq!(Language::detect("just some prose"), Language::Unknown);
        assert_eq!(Language::Unknown.extension(), "txt");
    }

    #[test]
    fn test_fence_tags() {
        assert_eq!(Language::from_fence_tag("C#"), Some(Language::CSharp));
        assert_eq!(Language::from_fence_tag("py"), Some(Language::Python));
        assert_eq!(Language::from_fence_tag("text"), None);
    }
}
