//! `(tag, title)` key resolution and filesystem-safe naming.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::DefaultsConfig;

/// Everything outside ASCII alphanumerics, `_`, `-` and CJK U+4E00..=U+9FA5.
static UNSAFE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9\x{4e00}-\x{9fa5}_-]").expect("valid regex"));

/// Replace every character that is unsafe in a file name with `_`.
pub fn sanitize(raw: &str) -> String {
    UNSAFE_CHARS.replace_all(raw, "_").into_owned()
}

/// A resolved note key: caller-facing tag/title plus their sanitized forms.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NoteKey {
    tag: String,
    title: String,
    safe_tag: String,
    safe_title: String,
}

impl NoteKey {
    /// Resolve a key, substituting the configured defaults for empty parts.
    pub fn new(tag: &str, title: &str, defaults: &DefaultsConfig) -> Self {
        let tag = if tag.is_empty() { &defaults.tag } else { tag };
        let title = if title.is_empty() {
            &defaults.title
        } else {
            title
        };

        Self {
            safe_tag: sanitize(tag),
            safe_title: sanitize(title),
            tag: tag.to_string(),
            title: title.to_string(),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn safe_tag(&self) -> &str {
        &self.safe_tag
    }

    pub fn safe_title(&self) -> &str {
        &self.safe_title
    }

    /// Identifier used for the per-key cache file stem.
    pub fn cache_stem(&self) -> String {
        format!("session_{}_{}", self.safe_tag, self.safe_title)
    }
}

impl std::fmt::Display for NoteKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.tag, self.title)
    }
}
