//! Run ID generation
//!
//! Run IDs use the format: `{12-char-hex}-{slug}`
//! Example: `0192f3a1b2c4-palindrome-checker`
//!
//! The hex prefix is the millisecond timestamp of a UUIDv7, so IDs sort in
//! creation order.

use tracing::debug;

/// Longest slug kept in an ID
const MAX_SLUG_LEN: usize = 50;

/// Slugify a title for use in IDs
fn slugify(title: &str) -> String {
    let slug = title
        .to_lowercase()
        .chars()
        // Strip apostrophes entirely, replace other non-alphanumeric with hyphens
        .filter_map(|c| {
            if c.is_alphanumeric() {
                Some(c)
            } else if c == '\'' || c == '\u{2019}' || c == '\u{2018}' {
                None
            } else {
                Some('-')
            }
        })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-");

    if slug.chars().count() <= MAX_SLUG_LEN {
        return slug;
    }
    let truncated: String = slug.chars().take(MAX_SLUG_LEN).collect();
    truncated.trim_end_matches('-').to_string()
}

/// Identifier of a single run, also used as its output directory name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RunId(String);

impl RunId {
    /// Create a new run ID from the requirement text
    pub fn new(requirement: &str) -> Self {
        let uuid = uuid::Uuid::now_v7().simple().to_string();
        let slug = slugify(requirement);
        let id = if slug.is_empty() {
            format!("{}-run", &uuid[..12])
        } else {
            format!("{}-{}", &uuid[..12], slug)
        };
        debug!(%id, "RunId::new: generated");
        Self(id)
    }

    /// Get the full ID string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for RunId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
